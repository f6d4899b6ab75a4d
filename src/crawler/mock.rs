// Scripted sessions for crawler tests
use crate::crawler::traits::{BrowserSession, SessionFactory};
use crate::model::{ExtractError, FetchError, JobOfferDetail, SessionError};
use crate::normalizer::{DateNormalizer, NumberExtraction, SalaryNormalizer};
use crate::parser::schema::{element_text, parse_selector};
use crate::parser::{FieldSchema, PageAction, SiteAdapter};
use scraper::Html;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

#[derive(Debug, Clone)]
pub enum MockPage {
    Listing {
        records: usize,
        delay: Duration,
        /// Card indices whose detail view never renders.
        failing_details: Vec<usize>,
        /// Card indices rendered without any overview field.
        blank_cards: Vec<usize>,
    },
    /// Renders, but without any listing.
    Missing,
    /// The rendering service rejects the page.
    Broken,
    /// Rendering panics inside the page task.
    Panicking,
}

pub fn listing(records: usize) -> MockPage {
    MockPage::Listing {
        records,
        delay: Duration::ZERO,
        failing_details: Vec::new(),
        blank_cards: Vec::new(),
    }
}

pub fn slow_listing(records: usize, delay: Duration) -> MockPage {
    MockPage::Listing {
        records,
        delay,
        failing_details: Vec::new(),
        blank_cards: Vec::new(),
    }
}

#[derive(Debug, Default)]
pub struct Counters {
    pub open_now: AtomicUsize,
    pub peak: AtomicUsize,
    pub opened: AtomicUsize,
    pub closed: AtomicUsize,
}

#[derive(Default)]
pub struct MockFactory {
    pages: Arc<HashMap<u32, MockPage>>,
    pub counters: Arc<Counters>,
    fail_open: bool,
}

impl MockFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, page_number: u32, page: MockPage) -> Self {
        Arc::make_mut(&mut self.pages).insert(page_number, page);
        self
    }

    pub fn failing_open() -> Self {
        Self {
            fail_open: true,
            ..Self::default()
        }
    }
}

#[async_trait::async_trait]
impl SessionFactory for MockFactory {
    async fn open(&self, label: &str) -> Result<Box<dyn BrowserSession>, SessionError> {
        if self.fail_open {
            return Err(SessionError::Open {
                id: label.to_string(),
                reason: "connection refused".to_string(),
            });
        }

        let now = self.counters.open_now.fetch_add(1, Ordering::SeqCst) + 1;
        self.counters.peak.fetch_max(now, Ordering::SeqCst);
        self.counters.opened.fetch_add(1, Ordering::SeqCst);

        Ok(Box::new(MockSession {
            id: label.to_string(),
            pages: self.pages.clone(),
            counters: self.counters.clone(),
            closed: false,
        }))
    }
}

pub struct MockSession {
    id: String,
    pages: Arc<HashMap<u32, MockPage>>,
    counters: Arc<Counters>,
    closed: bool,
}

/// `?p=N` selects page N; the bare listing URL is page 1.
fn page_number(url: &str) -> u32 {
    url.split_once("?p=")
        .and_then(|(_, n)| n.parse().ok())
        .unwrap_or(1)
}

/// Card index clicked by a `detail_trigger` script (`...[N].click();`).
fn clicked_card(action: &PageAction) -> Option<usize> {
    let (_, tail) = action.script.rsplit_once('[')?;
    let (index, _) = tail.split_once(']')?;
    index.parse().ok()
}

impl MockSession {
    fn page(&self, url: &str) -> (u32, MockPage) {
        let number = page_number(url);
        let page = self.pages.get(&number).cloned().unwrap_or(MockPage::Missing);
        (number, page)
    }

    fn release(&mut self) {
        if !self.closed {
            self.closed = true;
            self.counters.open_now.fetch_sub(1, Ordering::SeqCst);
            self.counters.closed.fetch_add(1, Ordering::SeqCst);
        }
    }
}

#[async_trait::async_trait]
impl BrowserSession for MockSession {
    fn id(&self) -> &str {
        &self.id
    }

    async fn render(
        &mut self,
        url: &str,
        _wait_for: Option<&str>,
        timeout: Duration,
    ) -> Result<String, FetchError> {
        match self.page(url) {
            (
                number,
                MockPage::Listing {
                    records,
                    delay,
                    blank_cards,
                    ..
                },
            ) => {
                tokio::time::sleep(delay).await;
                let cards: String = (0..records)
                    .map(|i| {
                        if blank_cards.contains(&i) {
                            return "<div class='card'><img src='ad.png'></div>".to_string();
                        }
                        format!(
                            "<div class='card'><h2 class='title'>Job {number}-{i}</h2>\
                             <span class='company'>Acme</span>\
                             <span class='date'>hace 2 horas</span></div>"
                        )
                    })
                    .collect();
                Ok(format!("<div class='listing'>{cards}</div>"))
            }
            (_, MockPage::Missing) => Ok("<div class='empty'></div>".to_string()),
            (_, MockPage::Broken) => Err(FetchError::Timeout(timeout)),
            (number, MockPage::Panicking) => panic!("renderer crashed on page {number}"),
        }
    }

    async fn perform(
        &mut self,
        url: &str,
        action: &PageAction,
        timeout: Duration,
    ) -> Result<String, FetchError> {
        let Some(index) = clicked_card(action) else {
            return Err(FetchError::Rejected(format!("unexpected script {}", action.script)));
        };

        match self.page(url) {
            (_, MockPage::Listing { failing_details, .. }) if failing_details.contains(&index) => {
                Err(FetchError::Timeout(timeout))
            }
            (number, MockPage::Listing { .. }) => Ok(format!(
                "<div class='detail' data-id='{number}-{index}'>\
                 <p class='desc'>Offer {number}-{index}</p>\
                 <p class='salary'>$15,000 mensual</p></div>"
            )),
            _ => Err(FetchError::Rejected("no listing loaded".to_string())),
        }
    }

    async fn close(&mut self) {
        self.release();
    }
}

impl Drop for MockSession {
    fn drop(&mut self) {
        self.release();
    }
}

pub struct TestAdapter {
    schema: FieldSchema,
    dates: DateNormalizer,
    salaries: SalaryNormalizer,
}

impl Default for TestAdapter {
    fn default() -> Self {
        Self {
            schema: FieldSchema::new(
                "mock",
                ".card",
                &[
                    ("title", ".title"),
                    ("company", ".company"),
                    ("relative_date", ".date"),
                ],
            ),
            dates: DateNormalizer::spanish(NumberExtraction::Token),
            salaries: SalaryNormalizer::spanish(NumberExtraction::Token),
        }
    }
}

impl SiteAdapter for TestAdapter {
    fn service_name(&self) -> &str {
        "mock"
    }

    fn base_url(&self) -> &str {
        "https://jobs.test/listing"
    }

    fn url_pattern(&self) -> &str {
        "https://jobs.test/listing?p={page_num}"
    }

    fn overview_schema(&self) -> &FieldSchema {
        &self.schema
    }

    fn ready_selector(&self) -> &str {
        ".listing"
    }

    fn detail_selector(&self) -> &str {
        ".detail"
    }

    fn extract_detail(&self, html: &str) -> Result<JobOfferDetail, ExtractError> {
        let document = Html::parse_document(html);
        let detail = document
            .select(&parse_selector(".detail")?)
            .next()
            .ok_or_else(|| ExtractError::SchemaMismatch(".detail".into()))?;

        Ok(JobOfferDetail {
            description: detail
                .select(&parse_selector(".desc")?)
                .next()
                .map(element_text)
                .unwrap_or_default(),
            raw_salary: detail
                .select(&parse_selector(".salary")?)
                .next()
                .map(element_text),
            ..Default::default()
        })
    }

    fn extract_offer_id(&self, html: &str) -> Option<String> {
        let document = Html::parse_document(html);
        let selector = parse_selector(".detail").ok()?;
        document
            .select(&selector)
            .next()
            .and_then(|d| d.value().attr("data-id"))
            .map(str::to_string)
    }

    fn is_next_page_available(&self, html: &str) -> bool {
        let document = Html::parse_document(html);
        parse_selector(".listing .card")
            .map(|card| document.select(&card).next().is_some())
            .unwrap_or(false)
    }

    fn date_normalizer(&self) -> &DateNormalizer {
        &self.dates
    }

    fn salary_normalizer(&self) -> &SalaryNormalizer {
        &self.salaries
    }
}
