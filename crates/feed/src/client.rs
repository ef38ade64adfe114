//! Feed transport.
//!
//! Transport and HTTP-level failures abort the run (the caller never
//! sees a half-fetched snapshot), but a 200 whose body does not parse
//! degrades to an empty product list so one bad deploy upstream turns
//! into not-found rows instead of a crash loop.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use tracing::{debug, warn};

use crate::error::{FeedError, Result};
use crate::snapshot::FeedSnapshot;

#[async_trait]
pub trait FeedClient: Send + Sync {
    async fn fetch(&self) -> Result<FeedSnapshot>;
}

/// Feed client backed by the remote availability endpoint.
pub struct HttpFeedClient {
    client: Client,
    endpoint: String,
}

impl HttpFeedClient {
    pub fn new(endpoint: impl Into<String>, timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl FeedClient for HttpFeedClient {
    async fn fetch(&self) -> Result<FeedSnapshot> {
        let response = self.client.get(&self.endpoint).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(FeedError::Api(format!("{status}: {body}")));
        }

        let body = response.text().await?;
        match serde_json::from_str::<FeedSnapshot>(&body) {
            Ok(snapshot) => {
                debug!(
                    products = snapshot.len(),
                    time = %snapshot.time,
                    "fetched feed snapshot"
                );
                Ok(snapshot)
            }
            Err(err) => {
                warn!(error = %err, "feed body did not parse, treating as empty");
                Ok(FeedSnapshot::empty(Utc::now()))
            }
        }
    }
}
