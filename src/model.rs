// Core structs: JobOffer, JobOfferDetail, PageTask, PageOutcome, RunReport and error types
use crate::summarizer::JobSummary;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

/// One flat key → text record produced by overview extraction.
pub type OverviewRecord = HashMap<String, String>;

/// A listing card's overview record, tagged with the card's position among
/// all elements matching the schema's base selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingCard {
    pub index: usize,
    pub fields: OverviewRecord,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobOffer {
    pub title: String,
    pub company: String,
    pub location: String,
    pub relative_date: String,
    pub absolute_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<JobOfferDetail>,
    pub offer_id: Option<String>,
    pub scraped_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<JobSummary>,
}

impl JobOffer {
    /// Builds a partial offer from an overview record. Missing keys become empty strings.
    pub fn from_overview(record: &OverviewRecord, scraped_at: DateTime<Utc>) -> Self {
        let field = |key: &str| record.get(key).cloned().unwrap_or_default();

        Self {
            title: field("title"),
            company: field("company"),
            location: field("location"),
            relative_date: field("relative_date"),
            absolute_date: None,
            details: None,
            offer_id: None,
            scraped_at,
            summary: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobOfferDetail {
    pub description: String,
    pub requirements: Option<String>,
    pub raw_salary: Option<String>,
    pub normalized_salary: Option<NormalizedSalary>,
    pub job_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub place: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizedSalary {
    pub base: f64,
    pub has_commission: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageTask {
    pub page_number: u32,
    pub url: String,
}

/// What one page task produced.
#[derive(Debug, Clone)]
pub enum PageOutcome {
    Offers(Vec<JobOffer>),
    /// Pagination has run out. Not an error.
    NotAvailable,
    /// Site or session error; counts as an empty page.
    Failed(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub pages_launched: u32,
    pub pages_processed: u32,
    pub pages_failed: u32,
    pub truncated_at: Option<u32>,
    pub total_offers: usize,
    pub duplicates_dropped: usize,
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("rendering service responded with status {0}")]
    Status(u16),
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("render failed: {0}")]
    Rejected(String),
    #[error("extraction failed: {0}")]
    Extraction(#[from] ExtractError),
}

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("markup does not match locator `{0}`")]
    SchemaMismatch(String),
    #[error("invalid selector `{0}`")]
    InvalidSelector(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("unparseable date: {0:?}")]
    UnparseableDate(String),
    #[error("unparseable salary: {0:?}")]
    UnparseableSalary(String),
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("could not open session {id}: {reason}")]
    Open { id: String, reason: String },
}

#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("invalid URL pattern {0:?}")]
    InvalidUrlPattern(String),
    #[error("invalid crawl settings: {0}")]
    InvalidSettings(String),
    #[error("no browsing session could be opened: {0}")]
    SessionUnavailable(String),
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}

#[derive(Debug, Error)]
pub enum SummarizeError {
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("LLM endpoint responded with status {0}")]
    Status(u16),
    #[error("response is not a valid summary: {0}")]
    Parse(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("cannot parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}
