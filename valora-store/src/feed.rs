use async_trait::async_trait;
use std::time::Duration;

use valora_pricing::competitor::{CompetitorFeed, CompetitorQuote, FeedError};

/// Competitor feed over HTTP, expecting a JSON array of quotes.
pub struct HttpCompetitorFeed {
    client: reqwest::Client,
    url: String,
}

impl HttpCompetitorFeed {
    pub fn new(url: &str, timeout_secs: u64) -> Result<Self, FeedError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| FeedError::Request(e.to_string()))?;

        Ok(Self {
            client,
            url: url.to_string(),
        })
    }
}

#[async_trait]
impl CompetitorFeed for HttpCompetitorFeed {
    async fn fetch_quotes(&self) -> Result<Vec<CompetitorQuote>, FeedError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| FeedError::Request(e.to_string()))?
            .error_for_status()
            .map_err(|e| FeedError::Request(e.to_string()))?;

        response
            .json::<Vec<CompetitorQuote>>()
            .await
            .map_err(|e| FeedError::InvalidPayload(e.to_string()))
    }
}
