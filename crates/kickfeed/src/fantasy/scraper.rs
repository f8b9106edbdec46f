use std::time::Duration;

use reqwest::blocking::Client;
use serde_json::Value;

use super::flatten::flatten_records;
use crate::types::{DataTable, FetchMeta};

#[derive(Debug, thiserror::Error)]
pub enum ScraperError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("bootstrap payload has no '{0}' array")]
    MissingArray(&'static str),
}

/// Fetches the fantasy bootstrap API and flattens the player elements.
#[derive(Debug, Clone)]
pub struct WebScraper {
    client: Client,
    url: String,
}

impl WebScraper {
    pub fn new() -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(format!(
                "{}/{}",
                env!("CARGO_PKG_NAME"),
                env!("CARGO_PKG_VERSION")
            ))
            .build()?;

        Ok(Self {
            client,
            url: super::SOURCE_URL.to_string(),
        })
    }

    /// Fetch the bootstrap payload and flatten its `elements` array into the
    /// full-fidelity player table.
    pub fn fetch_elements(&self) -> Result<(DataTable, FetchMeta), ScraperError> {
        log::info!("Fetching bootstrap data from {}...", self.url);

        let payload: Value = self
            .client
            .get(&self.url)
            .send()
            .inspect_err(|e| log::error!("HTTP error: {e:?}"))?
            .error_for_status()?
            .json()?;

        let elements = payload
            .get("elements")
            .and_then(Value::as_array)
            .ok_or(ScraperError::MissingArray("elements"))?;
        log::debug!("Payload carries {} player element(s)", elements.len());

        let table = flatten_records(elements);
        let meta = FetchMeta::now(self.url.clone(), table.row_count());
        Ok((table, meta))
    }
}
