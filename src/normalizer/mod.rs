// Field normalization: relative dates and salary strings into canonical values.

pub mod date;
pub mod salary;

pub use date::DateNormalizer;
pub use salary::SalaryNormalizer;

use crate::model::JobOffer;
use crate::parser::SiteAdapter;
use serde::Deserialize;
use tracing::warn;

/// How a magnitude is pulled out of free text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NumberExtraction {
    /// The numeric token next to the unit word, else the first numeric token.
    #[default]
    Token,
    /// Every digit in the string concatenated. Kept for comparing against stored data.
    Legacy,
}

/// Applies the adapter's date and salary normalizers to every offer.
/// Returns how many fields could not be normalized.
pub fn normalize_all(offers: &mut [JobOffer], adapter: &dyn SiteAdapter) -> usize {
    offers
        .iter_mut()
        .map(|offer| normalize_offer(offer, adapter))
        .sum()
}

fn normalize_offer(offer: &mut JobOffer, adapter: &dyn SiteAdapter) -> usize {
    let mut failures = 0;

    match adapter
        .date_normalizer()
        .normalize(&offer.relative_date, offer.scraped_at)
    {
        Ok(date) => offer.absolute_date = Some(date),
        Err(e) => {
            warn!("[{}] {}", adapter.service_name(), e);
            offer.absolute_date = None;
            failures += 1;
        }
    }

    if let Some(details) = offer.details.as_mut() {
        match adapter
            .salary_normalizer()
            .normalize(details.raw_salary.as_deref())
        {
            Ok(salary) => details.normalized_salary = Some(salary),
            Err(e) => {
                warn!("[{}] {}", adapter.service_name(), e);
                details.normalized_salary = None;
                failures += 1;
            }
        }
    }

    failures
}
