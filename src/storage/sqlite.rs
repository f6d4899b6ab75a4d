use crate::model::{JobOffer, StorageError};
use crate::storage::ResultSink;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, params};
use tracing::info;

pub struct SqliteSink {
    conn: Connection,
    path: String,
}

impl SqliteSink {
    /// Opens the database and runs the migrations.
    pub fn new(db_path: &str) -> Result<Self, StorageError> {
        let conn = Connection::open(db_path)?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS job_offers (
                service TEXT NOT NULL,
                offer_key TEXT NOT NULL,
                offer_id TEXT,
                title TEXT NOT NULL,
                company TEXT NOT NULL,
                location TEXT NOT NULL,
                relative_date TEXT NOT NULL,
                absolute_date TEXT,
                scraped_at TEXT NOT NULL,
                run_started TEXT NOT NULL,
                PRIMARY KEY (service, offer_key)
            );
            ",
        )?;

        // Columns added after the first release
        Self::migrate_add_column_if_missing(&conn, "job_offers", "details", "TEXT")?;
        Self::migrate_add_column_if_missing(&conn, "job_offers", "summary", "TEXT")?;

        Ok(Self {
            conn,
            path: db_path.to_string(),
        })
    }

    fn migrate_add_column_if_missing(
        conn: &Connection,
        table: &str,
        column: &str,
        column_def: &str,
    ) -> Result<(), StorageError> {
        let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table))?;
        let existing_columns: Vec<String> = stmt
            .query_map([], |row| row.get::<_, String>(1))?
            .collect::<Result<_, _>>()?;

        if !existing_columns.iter().any(|c| c == column) {
            conn.execute(
                &format!("ALTER TABLE {} ADD COLUMN {} {}", table, column, column_def),
                [],
            )?;
        }

        Ok(())
    }

    /// Rows already stored for one service.
    pub fn count_offers(&self, service_name: &str) -> Result<usize, StorageError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM job_offers WHERE service = ?1",
            params![service_name],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}

/// Offers without a site id are keyed by what the listing card shows.
pub fn offer_key(offer: &JobOffer) -> String {
    match &offer.offer_id {
        Some(id) => id.clone(),
        None => format!("{}|{}|{}", offer.title, offer.company, offer.relative_date),
    }
}

impl ResultSink for SqliteSink {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn store(
        &self,
        service_name: &str,
        run_started: DateTime<Utc>,
        offers: &[JobOffer],
    ) -> Result<String, StorageError> {
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT OR REPLACE INTO job_offers (
                    service, offer_key, offer_id, title, company, location,
                    relative_date, absolute_date, scraped_at, run_started,
                    details, summary
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            )?;

            for offer in offers {
                let details = offer
                    .details
                    .as_ref()
                    .map(serde_json::to_string)
                    .transpose()?;
                let summary = offer
                    .summary
                    .as_ref()
                    .map(serde_json::to_string)
                    .transpose()?;

                stmt.execute(params![
                    service_name,
                    offer_key(offer),
                    &offer.offer_id,
                    &offer.title,
                    &offer.company,
                    &offer.location,
                    &offer.relative_date,
                    offer.absolute_date.map(|d| d.to_rfc3339()),
                    offer.scraped_at.to_rfc3339(),
                    run_started.to_rfc3339(),
                    details,
                    summary,
                ])?;
            }
        }
        tx.commit()?;

        info!(
            "Upserted {} offers into {} ({} stored for {})",
            offers.len(),
            self.path,
            self.count_offers(service_name)?,
            service_name
        );
        Ok(self.path.clone())
    }
}
