// LLM summaries of offer descriptions into a fixed schema.

pub mod ollama;

pub use ollama::OllamaSummarizer;

use crate::model::{JobOffer, SummarizeError};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSummary {
    pub position: String,
    pub work_mode: WorkMode,
    pub job_type: Vec<String>,
    pub technologies: Technologies,
    pub experience_required: Experience,
    pub skills: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkMode {
    #[serde(rename = "type")]
    pub kind: String,
    pub on_site_days_per_week: u32,
    pub location: String,
    #[serde(default)]
    pub salary: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Technologies {
    #[serde(default)]
    pub cloud: Option<Vec<String>>,
    #[serde(default)]
    pub frameworks: Option<Vec<String>>,
    #[serde(default)]
    pub languages: Option<Vec<String>>,
    #[serde(default)]
    pub databases: Option<Vec<String>>,
    #[serde(default)]
    pub big_data: Option<Vec<String>>,
    #[serde(default)]
    pub architectures: Option<Vec<String>>,
    #[serde(default)]
    pub others: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Experience {
    pub minimum_years: u32,
    pub areas: Vec<String>,
}

/// Text-to-structured-JSON capability.
#[async_trait::async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(
        &self,
        description: &str,
        requirements: Option<&str>,
    ) -> Result<JobSummary, SummarizeError>;
}

/// JSON schema embedded in the prompt.
pub fn summary_schema() -> serde_json::Value {
    let strings = json!({ "type": "array", "items": { "type": "string" } });
    let optional_strings = json!({
        "anyOf": [strings.clone(), { "type": "null" }]
    });

    json!({
        "title": "JobOfferSchema",
        "type": "object",
        "properties": {
            "position": { "type": "string" },
            "work_mode": {
                "type": "object",
                "properties": {
                    "type": { "type": "string" },
                    "on_site_days_per_week": { "type": "integer" },
                    "location": { "type": "string" },
                    "salary": { "anyOf": [{ "type": "number" }, { "type": "null" }] }
                },
                "required": ["type", "on_site_days_per_week", "location", "salary"]
            },
            "job_type": strings,
            "technologies": {
                "type": "object",
                "properties": {
                    "cloud": optional_strings,
                    "frameworks": optional_strings,
                    "languages": optional_strings,
                    "databases": optional_strings,
                    "big_data": optional_strings,
                    "architectures": optional_strings,
                    "others": optional_strings
                }
            },
            "experience_required": {
                "type": "object",
                "properties": {
                    "minimum_years": { "type": "integer" },
                    "areas": strings
                },
                "required": ["minimum_years", "areas"]
            },
            "skills": strings
        },
        "required": [
            "position",
            "work_mode",
            "job_type",
            "technologies",
            "experience_required",
            "skills"
        ]
    })
}

pub fn build_prompt(description: &str, requirements: Option<&str>) -> String {
    format!(
        "Con la descripción y los requerimientos, resume la siguiente oferta laboral. \
         Ignora el nombre de la empresa, su misión y visión; lo que importa son las \
         tecnologías necesarias y el tipo de trabajo (remoto, presencial, híbrido). \
         Responde solo con un documento JSON con la siguiente estructura:\n\n\
         ```json\n{}\n```\n\n\
         <description>\n{}\n</description>\n\n\
         <requirements>\n{}\n</requirements>\n",
        summary_schema(),
        description.trim(),
        requirements.unwrap_or_default().trim()
    )
}

/// Accepts bare JSON or JSON inside a fenced code block.
pub fn parse_summary(payload: &str) -> Result<JobSummary, SummarizeError> {
    let body = strip_code_fence(payload.trim());
    serde_json::from_str(body).map_err(|e| SummarizeError::Parse(e.to_string()))
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop the info string ("json") up to the end of the opening line.
    let rest = rest.split_once('\n').map_or("", |(_, body)| body);
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

/// Attaches a summary to every offer with details. Returns how many succeeded.
pub async fn summarize_offers(offers: &mut [JobOffer], summarizer: &dyn Summarizer) -> usize {
    let mut summarized = 0;

    for offer in offers.iter_mut() {
        let Some(details) = &offer.details else {
            continue;
        };

        match summarizer
            .summarize(&details.description, details.requirements.as_deref())
            .await
        {
            Ok(summary) => {
                offer.summary = Some(summary);
                summarized += 1;
            }
            Err(e) => warn!("Summary failed for {:?}: {}", offer.title, e),
        }
    }

    info!("Summarized {}/{} offers", summarized, offers.len());
    summarized
}
