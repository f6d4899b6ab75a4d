// Browser sessions backed by a remote rendering service
use crate::crawler::traits::{BrowserSession, SessionFactory};
use crate::model::{FetchError, SessionError};
use crate::parser::PageAction;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Serialize)]
struct RenderRequest<'a> {
    session_id: &'a str,
    url: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    wait_for: Option<&'a str>,
    wait_for_timeout_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    js_code: Option<&'a str>,
    js_only: bool,
}

#[derive(Debug, Deserialize)]
struct RenderResponse {
    success: bool,
    #[serde(default)]
    html: String,
    #[serde(default)]
    error_message: Option<String>,
}

pub struct RemoteSessionFactory {
    client: Client,
    base_url: String,
    /// Budget for navigation on top of each readiness wait.
    navigation_timeout: Duration,
}

impl RemoteSessionFactory {
    pub fn new(base_url: &str, navigation_timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(concat!("job-sniper/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::Http(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            navigation_timeout,
        })
    }
}

#[async_trait::async_trait]
impl SessionFactory for RemoteSessionFactory {
    async fn open(&self, label: &str) -> Result<Box<dyn BrowserSession>, SessionError> {
        let id = format!("{label}_{:08x}", rand::random::<u32>());
        let endpoint = format!("{}/sessions", self.base_url);
        let open_failed = |reason: String| SessionError::Open {
            id: id.clone(),
            reason,
        };

        let response = self
            .client
            .post(&endpoint)
            .timeout(self.navigation_timeout)
            .json(&serde_json::json!({ "session_id": id }))
            .send()
            .await
            .map_err(|e| open_failed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(open_failed(format!("status {}", response.status())));
        }

        debug!("Opened session {}", id);
        Ok(Box::new(RemoteSession {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            navigation_timeout: self.navigation_timeout,
            id,
            closed: false,
        }))
    }
}

pub struct RemoteSession {
    client: Client,
    base_url: String,
    navigation_timeout: Duration,
    id: String,
    closed: bool,
}

impl RemoteSession {
    async fn post_render(
        &self,
        request: &RenderRequest<'_>,
        wait: Duration,
    ) -> Result<String, FetchError> {
        let endpoint = format!("{}/render", self.base_url);
        let deadline = wait + self.navigation_timeout;

        debug!("[{}] render {} (js_only={})", self.id, request.url, request.js_only);
        let response = match self
            .client
            .post(&endpoint)
            .timeout(deadline)
            .json(request)
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) if e.is_timeout() => return Err(FetchError::Timeout(deadline)),
            Err(e) => return Err(FetchError::Http(e.to_string())),
        };

        if !response.status().is_success() {
            return Err(FetchError::Status(response.status().as_u16()));
        }

        let body: RenderResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout(deadline)
            } else {
                FetchError::Http(e.to_string())
            }
        })?;

        if !body.success {
            return Err(FetchError::Rejected(
                body.error_message
                    .unwrap_or_else(|| "unknown error".to_string()),
            ));
        }

        Ok(body.html)
    }
}

#[async_trait::async_trait]
impl BrowserSession for RemoteSession {
    fn id(&self) -> &str {
        &self.id
    }

    async fn render(
        &mut self,
        url: &str,
        wait_for: Option<&str>,
        timeout: Duration,
    ) -> Result<String, FetchError> {
        let request = RenderRequest {
            session_id: &self.id,
            url,
            wait_for,
            wait_for_timeout_ms: timeout.as_millis() as u64,
            js_code: None,
            js_only: false,
        };
        self.post_render(&request, timeout).await
    }

    async fn perform(
        &mut self,
        url: &str,
        action: &PageAction,
        timeout: Duration,
    ) -> Result<String, FetchError> {
        let request = RenderRequest {
            session_id: &self.id,
            url,
            wait_for: Some(&action.wait_for),
            wait_for_timeout_ms: timeout.as_millis() as u64,
            js_code: Some(&action.script),
            js_only: true,
        };
        self.post_render(&request, timeout).await
    }

    async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        let endpoint = format!("{}/sessions/{}", self.base_url, self.id);
        match self.client.delete(&endpoint).send().await {
            Ok(resp) if resp.status().is_success() => debug!("Closed session {}", self.id),
            Ok(resp) => warn!("Closing session {} returned {}", self.id, resp.status()),
            Err(e) => warn!("Error closing session {}: {}", self.id, e),
        }
    }
}

impl Drop for RemoteSession {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        // Dropped mid-task (panic or early return): release the remote context anyway.
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            return;
        };
        let client = self.client.clone();
        let endpoint = format!("{}/sessions/{}", self.base_url, self.id);
        let id = self.id.clone();
        handle.spawn(async move {
            if let Err(e) = client.delete(&endpoint).send().await {
                warn!("Error closing session {} during drop: {}", id, e);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path, path_regex};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn open_session(server: &MockServer) -> Box<dyn BrowserSession> {
        Mock::given(method("POST"))
            .and(path("/sessions"))
            .respond_with(ResponseTemplate::new(201))
            .mount(server)
            .await;

        let factory = RemoteSessionFactory::new(&server.uri(), Duration::from_secs(5)).unwrap();
        factory.open("occ_page2").await.unwrap()
    }

    #[tokio::test]
    async fn render_returns_html_on_success() {
        let server = MockServer::start().await;
        let mut session = open_session(&server).await;
        assert!(session.id().starts_with("occ_page2_"));

        Mock::given(method("POST"))
            .and(path("/render"))
            .and(body_partial_json(serde_json::json!({
                "url": "https://www.occ.com.mx/empleos/de-python/?page=2",
                "wait_for": "aside.col-span-12",
                "wait_for_timeout_ms": 2000,
                "js_only": false,
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "html": "<aside class='col-span-12'></aside>",
            })))
            .mount(&server)
            .await;

        let html = session
            .render(
                "https://www.occ.com.mx/empleos/de-python/?page=2",
                Some("aside.col-span-12"),
                Duration::from_secs(2),
            )
            .await
            .unwrap();

        assert_eq!(html, "<aside class='col-span-12'></aside>");
    }

    #[tokio::test]
    async fn perform_sends_js_only_action() {
        let server = MockServer::start().await;
        let mut session = open_session(&server).await;

        Mock::given(method("POST"))
            .and(path("/render"))
            .and(body_partial_json(serde_json::json!({
                "js_code": "document.querySelectorAll(\"article\")[0].click();",
                "js_only": true,
                "wait_for": "div.box_detail",
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true,
                "html": "<div class='box_detail'></div>",
            })))
            .mount(&server)
            .await;

        let action = PageAction {
            script: "document.querySelectorAll(\"article\")[0].click();".to_string(),
            wait_for: "div.box_detail".to_string(),
        };
        let html = session
            .perform("https://example.test/jobs", &action, Duration::from_secs(5))
            .await
            .unwrap();

        assert!(html.contains("box_detail"));
    }

    #[tokio::test]
    async fn service_failure_is_reported() {
        let server = MockServer::start().await;
        let mut session = open_session(&server).await;

        Mock::given(method("POST"))
            .and(path("/render"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": false,
                "error_message": "Wait condition failed: Timeout after 2000ms",
            })))
            .mount(&server)
            .await;

        let err = session
            .render("https://example.test/jobs", None, Duration::from_secs(2))
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::Rejected(msg) if msg.contains("Timeout after 2000ms")));
    }

    #[tokio::test]
    async fn http_errors_and_slow_responses() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/sessions"))
            .respond_with(ResponseTemplate::new(201))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/render"))
            .and(body_partial_json(serde_json::json!({ "url": "https://example.test/500" })))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/render"))
            .and(body_partial_json(serde_json::json!({ "url": "https://example.test/slow" })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_delay(Duration::from_secs(2))
                    .set_body_json(serde_json::json!({ "success": true, "html": "" })),
            )
            .mount(&server)
            .await;

        let factory =
            RemoteSessionFactory::new(&server.uri(), Duration::from_millis(100)).unwrap();
        let mut session = factory.open("compu_trabajo_page1").await.unwrap();

        let err = session
            .render("https://example.test/500", None, Duration::ZERO)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Status(500)));

        let err = session
            .render("https://example.test/slow", None, Duration::ZERO)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Timeout(_)));
    }

    #[tokio::test]
    async fn open_failure_is_a_session_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/sessions"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let factory = RemoteSessionFactory::new(&server.uri(), Duration::from_secs(1)).unwrap();
        let result = factory.open("occ_page1").await;

        assert!(matches!(result, Err(SessionError::Open { .. })));
    }

    #[tokio::test]
    async fn close_deletes_the_remote_session_once() {
        let server = MockServer::start().await;
        let mut session = open_session(&server).await;

        Mock::given(method("DELETE"))
            .and(path_regex(r"^/sessions/occ_page2_[0-9a-f]{8}$"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        session.close().await;
        session.close().await;
        drop(session);
    }
}
