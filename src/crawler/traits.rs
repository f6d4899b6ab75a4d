use crate::model::{FetchError, ListingCard, SessionError};
use crate::parser::{FieldSchema, PageAction};
use std::time::Duration;

/// One isolated browsing context. Methods take `&mut self`: a session is driven
/// by exactly one task at a time.
#[async_trait::async_trait]
pub trait BrowserSession: Send {
    fn id(&self) -> &str;

    /// Navigates to `url` and returns the rendered markup once `wait_for`
    /// matches, or fails when `timeout` elapses first.
    async fn render(
        &mut self,
        url: &str,
        wait_for: Option<&str>,
        timeout: Duration,
    ) -> Result<String, FetchError>;

    /// Renders `url` and turns every listing card into a flat record.
    async fn extract(
        &mut self,
        url: &str,
        schema: &FieldSchema,
        wait_for: &str,
        timeout: Duration,
    ) -> Result<Vec<ListingCard>, FetchError> {
        let html = self.render(url, Some(wait_for), timeout).await?;
        Ok(schema.extract(&html)?)
    }

    /// Replays `action` against the page already loaded in this session.
    async fn perform(
        &mut self,
        url: &str,
        action: &PageAction,
        timeout: Duration,
    ) -> Result<String, FetchError>;

    async fn close(&mut self);
}

#[async_trait::async_trait]
pub trait SessionFactory: Send + Sync {
    async fn open(&self, label: &str) -> Result<Box<dyn BrowserSession>, SessionError>;
}
