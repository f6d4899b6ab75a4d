// OCC-specific HTML parsing
use crate::model::{ExtractError, JobOfferDetail};
use crate::normalizer::{DateNormalizer, NumberExtraction, SalaryNormalizer};
use crate::parser::schema::{element_text, parse_selector};
use crate::parser::{FieldSchema, IconField, SiteAdapter, apply_icon_labels};
use scraper::{ElementRef, Html};

const SERVICE_NAME: &str = "occ";
const BASE_URL: &str = "https://www.occ.com.mx";
const JOB_PATH: &str = "/empleos/de-python/";
const KEY_CSS_SELECTOR: &str = "aside.col-span-12";
const DETAIL_CSS_SELECTOR: &str = "#job-detail-container";
const BASE_SELECTOR: &str = "div.bg-bg-surface-default";
const NEXT_PAGE_SELECTOR: &str = "#btn-next-offer";

const DESCRIPTION_LABEL: &str = "descripción";
const REQUIREMENTS_LABEL: &str = "requisitos";
const OFFER_ID_LABEL: &str = "id:";

pub struct OccAdapter {
    base_url: String,
    url_pattern: String,
    schema: FieldSchema,
    icons: Vec<(&'static str, IconField)>,
    dates: DateNormalizer,
    salaries: SalaryNormalizer,
}

impl OccAdapter {
    pub fn new(extraction: NumberExtraction) -> Self {
        let base_url = format!("{BASE_URL}{JOB_PATH}");
        let url_pattern = format!("{base_url}?page={{page_num}}");

        Self {
            base_url,
            url_pattern,
            schema: FieldSchema::new(
                format!("{SERVICE_NAME} Job Scraper"),
                BASE_SELECTOR,
                &[
                    ("title", "h2.text-grey-900"),
                    ("company", "span.line-clamp-title"),
                    ("location", "div.no-alter-loc-text.mt-1 > p"),
                    (
                        "relative_date",
                        "div > div.flex.items-center.justify-between.mb-2 > div > span",
                    ),
                ],
            ),
            // Salary sits in a span whose parent is not always a <p>; see `salary`.
            icons: vec![
                ("i_clock", IconField::Time),
                ("i_find", IconField::Location),
                ("i_company", IconField::Place),
                ("i_home", IconField::Place),
            ],
            dates: DateNormalizer::spanish(extraction),
            salaries: SalaryNormalizer::spanish(extraction),
        }
    }

    fn salary(container: ElementRef) -> Result<Option<String>, ExtractError> {
        let span = parse_selector("span")?;
        Ok(container
            .select(&span)
            .find(|s| s.value().classes().any(|c| c == "i_money"))
            .and_then(|s| s.parent().and_then(ElementRef::wrap))
            .map(element_text))
    }

    /// First paragraph whose text contains `label`, case-insensitively.
    fn labelled_paragraph<'a>(
        container: ElementRef<'a>,
        label: &str,
    ) -> Result<Option<ElementRef<'a>>, ExtractError> {
        let paragraph = parse_selector("p")?;
        Ok(container
            .select(&paragraph)
            .find(|p| element_text(*p).to_lowercase().contains(label)))
    }

    fn offer_id_in(container: ElementRef) -> Result<Option<String>, ExtractError> {
        Ok(Self::labelled_paragraph(container, OFFER_ID_LABEL)?
            .and_then(|p| element_text(p).split_whitespace().last().map(str::to_string)))
    }
}

impl SiteAdapter for OccAdapter {
    fn service_name(&self) -> &str {
        SERVICE_NAME
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url_pattern(&self) -> &str {
        &self.url_pattern
    }

    fn overview_schema(&self) -> &FieldSchema {
        &self.schema
    }

    fn ready_selector(&self) -> &str {
        KEY_CSS_SELECTOR
    }

    fn detail_selector(&self) -> &str {
        DETAIL_CSS_SELECTOR
    }

    fn extract_detail(&self, html: &str) -> Result<JobOfferDetail, ExtractError> {
        let document = Html::parse_document(html);
        let container = document
            .select(&parse_selector(DETAIL_CSS_SELECTOR)?)
            .next()
            .ok_or_else(|| ExtractError::SchemaMismatch(DETAIL_CSS_SELECTOR.into()))?;

        let description = Self::labelled_paragraph(container, DESCRIPTION_LABEL)?
            .and_then(|p| p.parent().and_then(ElementRef::wrap))
            .map(element_text)
            .unwrap_or_default();

        let requirements = Self::labelled_paragraph(container, REQUIREMENTS_LABEL)?
            .and_then(|p| p.next_siblings().find_map(ElementRef::wrap))
            .map(element_text)
            .filter(|text| !text.is_empty());

        let job_url = Self::offer_id_in(container)?
            .map(|id| format!("{BASE_URL}/empleo/oferta/{id}/"));

        let mut detail = JobOfferDetail {
            description,
            requirements,
            raw_salary: Self::salary(container)?,
            job_url,
            ..Default::default()
        };

        apply_icon_labels(container, &self.icons, &mut detail)?;

        Ok(detail)
    }

    fn extract_offer_id(&self, html: &str) -> Option<String> {
        let document = Html::parse_document(html);
        let selector = parse_selector(DETAIL_CSS_SELECTOR).ok()?;
        let container = document.select(&selector).next()?;
        Self::offer_id_in(container).ok().flatten()
    }

    fn is_next_page_available(&self, html: &str) -> bool {
        let document = Html::parse_document(html);
        parse_selector(NEXT_PAGE_SELECTOR)
            .map(|next| document.select(&next).next().is_some())
            .unwrap_or(false)
    }

    fn date_normalizer(&self) -> &DateNormalizer {
        &self.dates
    }

    fn salary_normalizer(&self) -> &SalaryNormalizer {
        &self.salaries
    }
}
