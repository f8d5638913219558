use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

/// Decides whether a flag image URL is loadable. Never fails: problems read as `false`.
/// Only headers are fetched; the image itself is not downloaded.
#[async_trait]
pub trait FlagValidator: Send + Sync {
    async fn validate(&self, url: &str) -> bool;
}

pub struct HttpFlagValidator {
    http: Client,
}

impl HttpFlagValidator {
    pub fn new(http: Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl FlagValidator for HttpFlagValidator {
    async fn validate(&self, url: &str) -> bool {
        match self.http.head(url).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                debug!("flag check failed for {}: {}", url, e);
                false
            }
        }
    }
}
