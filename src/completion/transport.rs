use anyhow::Context;
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::CONTENT_TYPE;
use tracing::{debug, warn};

/// Sends one JSON request to the completion backend and buffers the reply body.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn post_json(&self, url: &str, api_key: &str, body: Vec<u8>) -> anyhow::Result<Bytes>;
}

/// `reqwest`-backed transport. No timeout beyond the client defaults.
#[derive(Clone, Default)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ChatTransport for HttpTransport {
    async fn post_json(&self, url: &str, api_key: &str, body: Vec<u8>) -> anyhow::Result<Bytes> {
        let res = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .bearer_auth(api_key)
            .body(body)
            .send()
            .await
            .with_context(|| format!("POST {}", url))?;

        // The status is not acted on: error bodies carry no choices and fail later.
        let status = res.status();
        if status.is_success() {
            debug!(%status, "completion backend responded");
        } else {
            warn!(%status, "completion backend returned non-success status");
        }

        res.bytes().await.context("read completion response body")
    }
}
