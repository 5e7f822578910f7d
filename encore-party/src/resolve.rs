use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::VideoReference;

/// Resolves a display title for a video reference. Best effort: `None`
/// means the caller has to supply a title instead, it never blocks a
/// submission.
#[async_trait]
pub trait TitleResolver: Send + Sync {
    async fn resolve(&self, reference: &VideoReference) -> Option<String>;
}

pub type BoxedTitleResolver = Box<dyn TitleResolver>;

const NOEMBED_ENDPOINT: &str = "https://noembed.com/embed";
const RESOLVE_TIMEOUT: Duration = Duration::from_secs(5);

/// Title lookup through the noembed oEmbed proxy. Requires no API key.
pub struct NoembedResolver {
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct NoembedResponse {
    title: Option<String>,
}

impl NoembedResolver {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(RESOLVE_TIMEOUT)
            .build()
            .expect("http client is built");

        Self { client }
    }
}

impl Default for NoembedResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TitleResolver for NoembedResolver {
    async fn resolve(&self, reference: &VideoReference) -> Option<String> {
        let response = self
            .client
            .get(NOEMBED_ENDPOINT)
            .query(&[("url", reference.watch_url())])
            .send()
            .await
            .ok()?;

        let body: NoembedResponse = response.json().await.ok()?;

        body.title.filter(|title| !title.is_empty())
    }
}
