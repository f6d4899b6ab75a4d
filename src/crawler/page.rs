use crate::crawler::traits::BrowserSession;
use crate::model::{JobOffer, PageOutcome, PageTask};
use crate::parser::SiteAdapter;
use chrono::Utc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Readiness waits for one page task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageTimeouts {
    pub overview: Duration,
    pub detail: Duration,
}

impl Default for PageTimeouts {
    fn default() -> Self {
        Self {
            overview: Duration::from_millis(2000),
            detail: Duration::from_millis(5000),
        }
    }
}

/// Drives one adapter through one listing page.
pub struct PageScraper<'a> {
    adapter: &'a dyn SiteAdapter,
    timeouts: PageTimeouts,
}

impl<'a> PageScraper<'a> {
    pub fn new(adapter: &'a dyn SiteAdapter, timeouts: PageTimeouts) -> Self {
        Self { adapter, timeouts }
    }

    pub async fn scrape(&self, session: &mut dyn BrowserSession, task: &PageTask) -> PageOutcome {
        let service = self.adapter.service_name();

        if task.page_number > 1 {
            match session.render(&task.url, None, self.timeouts.overview).await {
                Ok(html) if self.adapter.is_next_page_available(&html) => {}
                Ok(_) => {
                    info!("[{}] page {} is not available", service, task.page_number);
                    return PageOutcome::NotAvailable;
                }
                Err(e) => {
                    warn!("[{}] page {} availability check failed: {}", service, task.page_number, e);
                    return PageOutcome::Failed(e.to_string());
                }
            }
        }

        let schema = self.adapter.overview_schema();
        debug!("[{}] extracting page {} with {}", session.id(), task.page_number, schema.name);
        let cards = match session
            .extract(
                &task.url,
                schema,
                self.adapter.ready_selector(),
                self.timeouts.overview,
            )
            .await
        {
            Ok(cards) => cards,
            Err(e) => {
                warn!("[{}] overview of page {} failed: {}", service, task.page_number, e);
                return PageOutcome::Failed(e.to_string());
            }
        };

        // An empty listing is an empty page; only the availability check ends pagination
        if cards.is_empty() {
            info!("[{}] page {}: no offers found", service, task.page_number);
            return PageOutcome::Offers(Vec::new());
        }

        let mut offers = Vec::with_capacity(cards.len());
        for card in &cards {
            let mut offer = JobOffer::from_overview(&card.fields, Utc::now());
            self.enrich(session, task, card.index, &mut offer).await;
            offers.push(offer);
        }

        info!(
            "[{}] page {}: {} offers",
            service,
            task.page_number,
            offers.len()
        );
        PageOutcome::Offers(offers)
    }

    /// Opens the detail view of the card at DOM position `index` and merges it into `offer`.
    /// Failures leave `details` empty.
    async fn enrich(
        &self,
        session: &mut dyn BrowserSession,
        task: &PageTask,
        index: usize,
        offer: &mut JobOffer,
    ) {
        let service = self.adapter.service_name();
        let action = self.adapter.detail_trigger(index);

        let html = match session.perform(&task.url, &action, self.timeouts.detail).await {
            Ok(html) => html,
            Err(e) => {
                warn!(
                    "[{}] page {} offer {}: detail view failed: {}",
                    service, task.page_number, index, e
                );
                return;
            }
        };

        offer.scraped_at = Utc::now();
        offer.offer_id = self.adapter.extract_offer_id(&html);

        match self.adapter.extract_detail(&html) {
            Ok(detail) => {
                debug!("[{}] page {} offer {} enriched", service, task.page_number, index);
                offer.details = Some(detail);
            }
            Err(e) => warn!(
                "[{}] page {} offer {}: {}",
                service, task.page_number, index, e
            ),
        }
    }
}
