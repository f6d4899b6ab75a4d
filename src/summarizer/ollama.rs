use crate::model::SummarizeError;
use crate::summarizer::{JobSummary, Summarizer, build_prompt, parse_summary};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
    format: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: String,
}

/// Summaries from a local Ollama server through `/api/chat`.
pub struct OllamaSummarizer {
    client: Client,
    endpoint: String,
    model: String,
}

impl OllamaSummarizer {
    pub fn new(endpoint: &str, model: &str, timeout: Duration) -> Result<Self, SummarizeError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SummarizeError::Http(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model: model.to_string(),
        })
    }
}

#[async_trait::async_trait]
impl Summarizer for OllamaSummarizer {
    async fn summarize(
        &self,
        description: &str,
        requirements: Option<&str>,
    ) -> Result<JobSummary, SummarizeError> {
        let prompt = build_prompt(description, requirements);
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: &prompt,
            }],
            stream: false,
            format: "json",
        };

        let url = format!("{}/api/chat", self.endpoint);
        debug!("Asking {} for a summary", self.model);
        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| SummarizeError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SummarizeError::Status(status.as_u16()));
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| SummarizeError::Parse(e.to_string()))?;

        parse_summary(&chat.message.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn summarizer(server: &MockServer) -> OllamaSummarizer {
        OllamaSummarizer::new(&server.uri(), "gemma3", Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn reads_summary_from_message_content() {
        let server = MockServer::start().await;
        let content = r#"```json
{"position": "Data Engineer",
 "work_mode": {"type": "remoto", "on_site_days_per_week": 0, "location": "México"},
 "job_type": ["tiempo completo"],
 "technologies": {"big_data": ["Spark"]},
 "experience_required": {"minimum_years": 2, "areas": ["ETL"]},
 "skills": []}
```"#;

        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .and(body_partial_json(serde_json::json!({
                "model": "gemma3",
                "stream": false,
                "format": "json",
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "model": "gemma3",
                "message": { "role": "assistant", "content": content },
                "done": true,
            })))
            .expect(1)
            .mount(&server)
            .await;

        let summary = summarizer(&server)
            .summarize("Pipelines de datos", Some("Spark"))
            .await
            .unwrap();

        assert_eq!(summary.position, "Data Engineer");
        assert_eq!(summary.work_mode.salary, None);
        assert_eq!(summary.technologies.big_data, Some(vec!["Spark".to_string()]));
    }

    #[tokio::test]
    async fn non_json_content_is_a_parse_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "message": { "role": "assistant", "content": "No encontré información." },
            })))
            .mount(&server)
            .await;

        let result = summarizer(&server).summarize("x", None).await;

        assert!(matches!(result, Err(SummarizeError::Parse(_))));
    }

    #[tokio::test]
    async fn missing_model_is_a_status_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let result = summarizer(&server).summarize("x", None).await;

        assert!(matches!(result, Err(SummarizeError::Status(404))));
    }
}
