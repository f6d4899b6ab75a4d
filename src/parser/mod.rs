// Per-site adapters: everything that depends on a job board's markup lives here.

pub mod computrabajo_parser;
pub mod occ_parser;
pub mod schema;

pub use computrabajo_parser::CompuTrabajoAdapter;
pub use occ_parser::OccAdapter;
pub use schema::FieldSchema;

use crate::model::{ExtractError, JobOfferDetail};
use crate::normalizer::{DateNormalizer, NumberExtraction, SalaryNormalizer};
use schema::{element_text, parse_selector};
use scraper::ElementRef;
use std::sync::Arc;

pub const SUPPORTED_SITES: &[&str] = &["compu_trabajo", "occ"];

/// In-page action replayed inside the session that rendered the overview.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageAction {
    pub script: String,
    /// Selector whose appearance marks the action as done.
    pub wait_for: String,
}

/// Sidebar fields labelled by an icon class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IconField {
    Time,
    Location,
    Place,
    Salary,
}

/// Site-specific extraction and pagination contract.
pub trait SiteAdapter: Send + Sync {
    /// Stable identifier, used in output file names.
    fn service_name(&self) -> &str;

    /// First listing page.
    fn base_url(&self) -> &str;

    /// Listing URL for pages ≥ 2, with a `{page_num}` placeholder.
    fn url_pattern(&self) -> &str;

    fn overview_schema(&self) -> &FieldSchema;

    /// Selector that marks the overview as rendered.
    fn ready_selector(&self) -> &str;

    /// Selector that marks a detail view as rendered.
    fn detail_selector(&self) -> &str;

    fn extract_detail(&self, html: &str) -> Result<JobOfferDetail, ExtractError>;

    fn extract_offer_id(&self, html: &str) -> Option<String>;

    fn is_next_page_available(&self, html: &str) -> bool;

    /// Clicks the `index`-th listing card so its detail view renders.
    fn detail_trigger(&self, index: usize) -> PageAction {
        let selector = serde_json::Value::String(self.overview_schema().base_selector.clone());
        PageAction {
            script: format!("document.querySelectorAll({selector})[{index}].click();"),
            wait_for: self.detail_selector().to_string(),
        }
    }

    fn date_normalizer(&self) -> &DateNormalizer;

    fn salary_normalizer(&self) -> &SalaryNormalizer;
}

/// Looks up the adapter registered under `name`.
pub fn adapter_for(name: &str, extraction: NumberExtraction) -> Option<Arc<dyn SiteAdapter>> {
    match name {
        "compu_trabajo" => Some(Arc::new(CompuTrabajoAdapter::new(extraction))),
        "occ" => Some(Arc::new(OccAdapter::new(extraction))),
        _ => None,
    }
}

/// Copies the text of every `<p>` whose first `<span>` carries a known icon class.
/// Later paragraphs overwrite earlier ones for the same field.
pub(crate) fn apply_icon_labels(
    container: ElementRef,
    icons: &[(&str, IconField)],
    detail: &mut JobOfferDetail,
) -> Result<(), ExtractError> {
    let paragraph = parse_selector("p")?;
    let span = parse_selector("span")?;

    for p in container.select(&paragraph) {
        let Some(class) = p
            .select(&span)
            .next()
            .and_then(|s| s.value().attr("class"))
        else {
            continue;
        };

        let Some((_, field)) = icons.iter().find(|(icon, _)| class.contains(*icon)) else {
            continue;
        };

        let text = Some(element_text(p));
        match field {
            IconField::Time => detail.time = text,
            IconField::Location => detail.location = text,
            IconField::Place => detail.place = text,
            IconField::Salary => detail.raw_salary = text,
        }
    }

    Ok(())
}
