pub mod json;
pub mod sqlite;

pub use json::JsonFileSink;
pub use sqlite::SqliteSink;

use crate::model::{JobOffer, StorageError};
use chrono::{DateTime, Utc};

/// Durable destination for the offers of one scrape run.
pub trait ResultSink {
    fn name(&self) -> &str;

    /// Persists `offers` and returns where they went.
    fn store(
        &self,
        service_name: &str,
        run_started: DateTime<Utc>,
        offers: &[JobOffer],
    ) -> Result<String, StorageError>;
}
