use crate::model::{JobOffer, StorageError};
use crate::storage::ResultSink;
use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Writes one pretty-printed JSON array per run.
pub struct JsonFileSink {
    output_dir: PathBuf,
}

impl JsonFileSink {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// `{service}_job_offers_{YYYYmmdd_HH}_00.json`: runs in the same hour share a file.
    pub fn file_path(&self, service_name: &str, run_started: DateTime<Utc>) -> PathBuf {
        self.output_dir.join(format!(
            "{}_job_offers_{}_00.json",
            service_name,
            run_started.format("%Y%m%d_%H")
        ))
    }
}

impl ResultSink for JsonFileSink {
    fn name(&self) -> &str {
        "json"
    }

    fn store(
        &self,
        service_name: &str,
        run_started: DateTime<Utc>,
        offers: &[JobOffer],
    ) -> Result<String, StorageError> {
        fs::create_dir_all(&self.output_dir)?;

        let path = self.file_path(service_name, run_started);
        let body = serde_json::to_string_pretty(offers)?;
        fs::write(&path, body)?;

        let location = path_string(&path);
        info!("Saved {} offers to {}", offers.len(), location);
        Ok(location)
    }
}

fn path_string(path: &Path) -> String {
    path.display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{JobOfferDetail, NormalizedSalary};
    use chrono::TimeZone;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "job_sniper_{}_{}",
            name,
            rand::random::<u32>()
        ));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    fn offer() -> JobOffer {
        let scraped_at = Utc.with_ymd_and_hms(2025, 6, 10, 14, 5, 0).unwrap();
        JobOffer {
            title: "Desarrollador Python".into(),
            company: "ACME".into(),
            location: "CDMX".into(),
            relative_date: "Hace 3 horas".into(),
            absolute_date: Some(Utc.with_ymd_and_hms(2025, 6, 10, 11, 5, 0).unwrap()),
            details: Some(JobOfferDetail {
                description: "APIs".into(),
                raw_salary: Some("$15,000 mensual".into()),
                normalized_salary: Some(NormalizedSalary {
                    base: 150.0,
                    has_commission: false,
                }),
                ..Default::default()
            }),
            offer_id: Some("ABC123".into()),
            scraped_at,
            summary: None,
        }
    }

    #[test]
    fn file_name_is_truncated_to_the_hour() {
        let sink = JsonFileSink::new("data");
        let started = Utc.with_ymd_and_hms(2025, 6, 10, 14, 59, 30).unwrap();

        assert_eq!(
            sink.file_path("occ", started),
            Path::new("data").join("occ_job_offers_20250610_14_00.json")
        );
    }

    #[test]
    fn writes_offers_with_stable_field_names() {
        let dir = temp_dir("json_sink");
        let sink = JsonFileSink::new(&dir);
        let started = Utc.with_ymd_and_hms(2025, 6, 10, 14, 0, 0).unwrap();

        let written = sink.store("compu_trabajo", started, &[offer()]).unwrap();

        let content = fs::read_to_string(&written).unwrap();
        let value: serde_json::Value = serde_json::from_str(&content).unwrap();
        let record = &value[0];
        assert_eq!(record["title"], "Desarrollador Python");
        assert_eq!(record["relative_date"], "Hace 3 horas");
        assert_eq!(record["offer_id"], "ABC123");
        assert_eq!(record["details"]["normalized_salary"]["base"], 150.0);
        assert!(record.get("summary").is_none());

        let back: Vec<JobOffer> = serde_json::from_str(&content).unwrap();
        assert_eq!(back[0].absolute_date, offer().absolute_date);

        fs::remove_dir_all(dir).unwrap();
    }
}
