// Declarative overview extraction: one record per listing card
use crate::model::{ExtractError, ListingCard, OverviewRecord};
use crate::utils::collapse_whitespace;
use scraper::{ElementRef, Html, Selector};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldLocator {
    pub name: String,
    pub selector: String,
}

/// Output field name → CSS locator, evaluated inside every element matching `base_selector`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSchema {
    pub name: String,
    pub base_selector: String,
    pub fields: Vec<FieldLocator>,
}

impl FieldSchema {
    pub fn new(name: impl Into<String>, base_selector: &str, fields: &[(&str, &str)]) -> Self {
        Self {
            name: name.into(),
            base_selector: base_selector.to_string(),
            fields: fields
                .iter()
                .map(|(name, selector)| FieldLocator {
                    name: name.to_string(),
                    selector: selector.to_string(),
                })
                .collect(),
        }
    }

    /// Fields with no match are left out; cards with no fields at all are skipped.
    /// Kept cards carry their DOM index so detail clicks land on the right card.
    pub fn extract(&self, html: &str) -> Result<Vec<ListingCard>, ExtractError> {
        let document = Html::parse_document(html);
        let base = parse_selector(&self.base_selector)?;
        let fields = self
            .fields
            .iter()
            .map(|field| Ok((field.name.as_str(), parse_selector(&field.selector)?)))
            .collect::<Result<Vec<_>, ExtractError>>()?;

        let mut cards = Vec::new();
        for (index, card) in document.select(&base).enumerate() {
            let mut record = OverviewRecord::new();
            for (name, selector) in &fields {
                if let Some(node) = card.select(selector).next() {
                    let text = element_text(node);
                    if !text.is_empty() {
                        record.insert(name.to_string(), text);
                    }
                }
            }
            if !record.is_empty() {
                cards.push(ListingCard {
                    index,
                    fields: record,
                });
            }
        }

        Ok(cards)
    }
}

pub fn parse_selector(css: &str) -> Result<Selector, ExtractError> {
    Selector::parse(css).map_err(|_| ExtractError::InvalidSelector(css.to_string()))
}

/// Visible text of an element with whitespace collapsed.
pub fn element_text(element: ElementRef) -> String {
    collapse_whitespace(&element.text().collect::<Vec<_>>().join(" "))
}
