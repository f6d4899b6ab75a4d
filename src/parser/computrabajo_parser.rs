// CompuTrabajo-specific HTML parsing
use crate::model::{ExtractError, JobOfferDetail};
use crate::normalizer::{DateNormalizer, NumberExtraction, SalaryNormalizer};
use crate::parser::schema::{element_text, parse_selector};
use crate::parser::{FieldSchema, IconField, SiteAdapter, apply_icon_labels};
use scraper::Html;

const SERVICE_NAME: &str = "compu_trabajo";
const BASE_URL: &str = "https://mx.computrabajo.com";
const JOB_PATH: &str = "/trabajo-de-python";
const KEY_CSS_SELECTOR: &str = "#offersGridOfferContainer";
const DETAIL_CSS_SELECTOR: &str = "div.box_detail";
const BASE_SELECTOR: &str = "article.box_offer";

pub struct CompuTrabajoAdapter {
    base_url: String,
    url_pattern: String,
    schema: FieldSchema,
    icons: Vec<(&'static str, IconField)>,
    dates: DateNormalizer,
    salaries: SalaryNormalizer,
}

impl CompuTrabajoAdapter {
    pub fn new(extraction: NumberExtraction) -> Self {
        let base_url = format!("{BASE_URL}{JOB_PATH}");
        let url_pattern = format!("{base_url}?p={{page_num}}");

        Self {
            base_url,
            url_pattern,
            schema: FieldSchema::new(
                format!("{SERVICE_NAME} Job Scraper"),
                BASE_SELECTOR,
                &[
                    ("title", "a.js-o-link"),
                    ("company", "p.dFlex"),
                    ("location", "p:nth-child(3)"),
                    ("relative_date", "p.fs13.fc_aux.mt15"),
                ],
            ),
            icons: vec![
                ("i_clock", IconField::Time),
                ("i_find", IconField::Location),
                ("i_company", IconField::Place),
                ("i_money", IconField::Salary),
                ("i_home", IconField::Place),
            ],
            dates: DateNormalizer::spanish(extraction),
            salaries: SalaryNormalizer::spanish(extraction),
        }
    }
}

impl SiteAdapter for CompuTrabajoAdapter {
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

        let box_detail = document
            .select(&parse_selector(DETAIL_CSS_SELECTOR)?)
            .next()
            .ok_or_else(|| ExtractError::SchemaMismatch(DETAIL_CSS_SELECTOR.into()))?;
        let sidebar = box_detail
            .select(&parse_selector("div.fs14")?)
            .next()
            .ok_or_else(|| ExtractError::SchemaMismatch("div.box_detail div.fs14".into()))?;

        let mut detail = JobOfferDetail {
            description: box_detail
                .select(&parse_selector("div.t_word_wrap")?)
                .next()
                .map(element_text)
                .unwrap_or_default(),
            requirements: box_detail
                .select(&parse_selector("ul.disc")?)
                .next()
                .map(element_text)
                .filter(|text| !text.is_empty()),
            job_url: box_detail
                .select(&parse_selector("div.opt_bubble")?)
                .next()
                .and_then(|bubble| bubble.value().attr("data-url"))
                .map(|path| format!("{BASE_URL}{path}")),
            ..Default::default()
        };

        apply_icon_labels(sidebar, &self.icons, &mut detail)?;

        Ok(detail)
    }

    fn extract_offer_id(&self, html: &str) -> Option<String> {
        let document = Html::parse_document(html);
        let selector = parse_selector("#IdOffer").ok()?;
        document
            .select(&selector)
            .next()
            .and_then(|input| input.value().attr("value"))
            .map(str::to_string)
    }

    fn is_next_page_available(&self, html: &str) -> bool {
        let document = Html::parse_document(html);
        let (Ok(container), Ok(card)) = (
            parse_selector(KEY_CSS_SELECTOR),
            parse_selector(BASE_SELECTOR),
        ) else {
            return false;
        };

        document.select(&container).next().is_some() && document.select(&card).next().is_some()
    }

    fn date_normalizer(&self) -> &DateNormalizer {
        &self.dates
    }

    fn salary_normalizer(&self) -> &SalaryNormalizer {
        &self.salaries
    }
}
