use crate::crawler::page::{PageScraper, PageTimeouts};
use crate::crawler::traits::SessionFactory;
use crate::model::{CrawlError, JobOffer, PageOutcome, PageTask, RunReport, StorageError};
use crate::normalizer::normalize_all;
use crate::parser::SiteAdapter;
use crate::storage::ResultSink;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};
use url::Url;

const PAGE_PLACEHOLDER: &str = "{page_num}";

/// Everything one crawl of one site produced.
#[derive(Debug, Clone)]
pub struct CrawlRun {
    pub service_name: String,
    pub started_at: DateTime<Utc>,
    pub offers: Vec<JobOffer>,
    pub report: RunReport,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// Location reported by the sink.
    Written(String),
    NoResults,
}

struct PageRun {
    outcome: PageOutcome,
    open_failed: bool,
}

pub struct Orchestrator {
    factory: Arc<dyn SessionFactory>,
    timeouts: PageTimeouts,
}

impl Orchestrator {
    pub fn new(factory: Arc<dyn SessionFactory>, timeouts: PageTimeouts) -> Self {
        Self { factory, timeouts }
    }

    /// Launches one task per candidate page, at most `max_concurrency` of them
    /// holding a session at any time, and keeps offers up to the first page
    /// that is not available.
    pub async fn run(
        &self,
        adapter: Arc<dyn SiteAdapter>,
        base_url: &str,
        url_pattern: &str,
        max_pages: u32,
        max_concurrency: usize,
    ) -> Result<CrawlRun, CrawlError> {
        if max_concurrency == 0 {
            return Err(CrawlError::InvalidSettings(
                "max_concurrency must be at least 1".into(),
            ));
        }
        let tasks = page_tasks(base_url, url_pattern, max_pages)?;

        let service = adapter.service_name().to_string();
        let started_at = Utc::now();
        info!(
            "[{}] Launching {} page tasks (concurrency {})",
            service,
            tasks.len(),
            max_concurrency
        );

        let semaphore = Arc::new(Semaphore::new(max_concurrency));
        let handles: Vec<_> = tasks
            .into_iter()
            .map(|task| {
                tokio::spawn(run_page(
                    self.factory.clone(),
                    adapter.clone(),
                    semaphore.clone(),
                    self.timeouts,
                    task,
                ))
            })
            .collect();

        let mut open_failures = 0;
        let mut last_open_error = String::new();
        let outcomes: Vec<PageOutcome> = join_all(handles)
            .await
            .into_iter()
            .enumerate()
            .map(|(i, joined)| match joined {
                Ok(page) => {
                    if page.open_failed {
                        open_failures += 1;
                        if let PageOutcome::Failed(reason) = &page.outcome {
                            last_open_error = reason.clone();
                        }
                    }
                    page.outcome
                }
                Err(e) => {
                    error!("[{}] page {} task crashed: {}", service, i + 1, e);
                    PageOutcome::Failed(e.to_string())
                }
            })
            .collect();

        if open_failures == outcomes.len() {
            return Err(CrawlError::SessionUnavailable(last_open_error));
        }

        let (mut offers, report) = aggregate(outcomes);
        let failures = normalize_all(&mut offers, adapter.as_ref());
        if failures > 0 {
            warn!("[{}] {} fields could not be normalized", service, failures);
        }

        info!(
            "[{}] Processed {}/{} pages ({} failed), {} offers, {} duplicates dropped",
            service,
            report.pages_processed,
            report.pages_launched,
            report.pages_failed,
            report.total_offers,
            report.duplicates_dropped
        );

        Ok(CrawlRun {
            service_name: service,
            started_at,
            offers,
            report,
        })
    }
}

/// One page task: permit, then session, then scrape. The session is closed
/// (or dropped) before the permit is released on every path.
async fn run_page(
    factory: Arc<dyn SessionFactory>,
    adapter: Arc<dyn SiteAdapter>,
    semaphore: Arc<Semaphore>,
    timeouts: PageTimeouts,
    task: PageTask,
) -> PageRun {
    let _permit = match semaphore.acquire_owned().await {
        Ok(permit) => permit,
        Err(e) => {
            return PageRun {
                outcome: PageOutcome::Failed(e.to_string()),
                open_failed: false,
            };
        }
    };

    let label = format!("{}_page{}", adapter.service_name(), task.page_number);
    let mut session = match factory.open(&label).await {
        Ok(session) => session,
        Err(e) => {
            warn!("{}", e);
            return PageRun {
                outcome: PageOutcome::Failed(e.to_string()),
                open_failed: true,
            };
        }
    };

    info!("[{}] Scraping page {}", session.id(), task.page_number);
    let outcome = PageScraper::new(adapter.as_ref(), timeouts)
        .scrape(session.as_mut(), &task)
        .await;
    session.close().await;

    PageRun {
        outcome,
        open_failed: false,
    }
}

/// Page 1 is `base_url` verbatim, later pages substitute `{page_num}`.
pub fn page_tasks(
    base_url: &str,
    url_pattern: &str,
    max_pages: u32,
) -> Result<Vec<PageTask>, CrawlError> {
    if max_pages == 0 {
        return Err(CrawlError::InvalidSettings("max_pages must be at least 1".into()));
    }
    if !url_pattern.contains(PAGE_PLACEHOLDER) {
        return Err(CrawlError::InvalidUrlPattern(url_pattern.to_string()));
    }
    Url::parse(base_url).map_err(|_| CrawlError::InvalidUrlPattern(base_url.to_string()))?;
    Url::parse(&url_pattern.replace(PAGE_PLACEHOLDER, "2"))
        .map_err(|_| CrawlError::InvalidUrlPattern(url_pattern.to_string()))?;

    Ok((1..=max_pages)
        .map(|page_number| PageTask {
            page_number,
            url: if page_number == 1 {
                base_url.to_string()
            } else {
                url_pattern.replace(PAGE_PLACEHOLDER, &page_number.to_string())
            },
        })
        .collect())
}

/// Walks outcomes in page order. The first `NotAvailable` page ends the
/// sequence; failed pages count as empty. Later duplicates of an `offer_id`
/// are dropped.
pub fn aggregate(outcomes: Vec<PageOutcome>) -> (Vec<JobOffer>, RunReport) {
    let mut report = RunReport {
        pages_launched: outcomes.len() as u32,
        ..Default::default()
    };
    let mut offers = Vec::new();
    let mut seen_ids = HashSet::new();

    for (page_number, outcome) in (1u32..).zip(outcomes) {
        match outcome {
            PageOutcome::Offers(page_offers) => {
                report.pages_processed += 1;
                for offer in page_offers {
                    if let Some(id) = &offer.offer_id {
                        if !seen_ids.insert(id.clone()) {
                            warn!("Duplicate offer {} on page {}, dropped", id, page_number);
                            report.duplicates_dropped += 1;
                            continue;
                        }
                    }
                    offers.push(offer);
                }
            }
            PageOutcome::Failed(reason) => {
                report.pages_processed += 1;
                report.pages_failed += 1;
                warn!("Page {} failed: {}", page_number, reason);
            }
            PageOutcome::NotAvailable => {
                report.truncated_at = Some(page_number);
                break;
            }
        }
    }

    report.total_offers = offers.len();
    (offers, report)
}

/// Hands a non-empty run to `sink`. Empty runs write nothing.
pub fn deliver(run: &CrawlRun, sink: &dyn ResultSink) -> Result<Delivery, StorageError> {
    if run.offers.is_empty() {
        info!("[{}] No results, nothing written to {}", run.service_name, sink.name());
        return Ok(Delivery::NoResults);
    }

    let location = sink.store(&run.service_name, run.started_at, &run.offers)?;
    Ok(Delivery::Written(location))
}
