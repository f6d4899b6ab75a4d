use super::NumberExtraction;
use crate::model::{NormalizeError, NormalizedSalary};
use crate::utils::{concat_digits, first_numeric_token};

/// Amounts arrive with two implied decimal digits.
const DECIMAL_PLACES: f64 = 100.0;

#[derive(Debug, Clone)]
pub struct SalaryLocale {
    pub monthly: Vec<&'static str>,
    pub hourly: Vec<&'static str>,
    pub commission: Vec<&'static str>,
}

impl SalaryLocale {
    pub fn spanish() -> Self {
        Self {
            monthly: vec!["mensual"],
            hourly: vec!["hora"],
            commission: vec!["comisión", "comision"],
        }
    }
}

#[derive(Debug, Clone)]
pub struct SalaryNormalizer {
    locale: SalaryLocale,
    extraction: NumberExtraction,
}

impl SalaryNormalizer {
    pub fn new(locale: SalaryLocale, extraction: NumberExtraction) -> Self {
        Self { locale, extraction }
    }

    pub fn spanish(extraction: NumberExtraction) -> Self {
        Self::new(SalaryLocale::spanish(), extraction)
    }

    pub fn normalize(&self, raw: Option<&str>) -> Result<NormalizedSalary, NormalizeError> {
        let text = raw.unwrap_or_default().trim().to_lowercase();
        if text.is_empty() {
            return Ok(NormalizedSalary::default());
        }

        let has_commission = contains_any(&text, &self.locale.commission);
        let periodic =
            contains_any(&text, &self.locale.monthly) || contains_any(&text, &self.locale.hourly);

        let base = if periodic {
            let amount = self.amount(&text).ok_or_else(|| {
                NormalizeError::UnparseableSalary(raw.unwrap_or_default().to_string())
            })?;
            amount as f64 / DECIMAL_PLACES
        } else {
            0.0
        };

        Ok(NormalizedSalary {
            base,
            has_commission,
        })
    }

    fn amount(&self, text: &str) -> Option<u64> {
        match self.extraction {
            NumberExtraction::Legacy => concat_digits(text).parse().ok(),
            NumberExtraction::Token => first_numeric_token(text),
        }
    }
}

fn contains_any(text: &str, markers: &[&str]) -> bool {
    markers.iter().any(|m| text.contains(m))
}
