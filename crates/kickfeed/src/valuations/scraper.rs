use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{ACCEPT_LANGUAGE, HeaderMap, HeaderValue, REFERER};

use super::parser::{self, ExtractError};
use crate::table::parse_tables;
use crate::types::{DataTable, FetchMeta};

#[derive(Debug, thiserror::Error)]
pub enum ScraperError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Extraction failed: {0}")]
    Extract(#[from] ExtractError),
}

/// Fetches the club valuation page and hands it to the pure extractor.
#[derive(Debug, Clone)]
pub struct WebScraper {
    client: Client,
    url: String,
}

impl WebScraper {
    pub fn new() -> Result<Self, ScraperError> {
        // The source serves a consent wall to anonymous-looking clients, so
        // the request carries browser-shaped headers.
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-GB,en;q=0.9"));
        headers.insert(
            REFERER,
            HeaderValue::from_static("https://www.transfermarkt.co.uk/"),
        );

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("Mozilla/5.0")
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            url: super::SOURCE_URL.to_string(),
        })
    }

    /// Fetch and extract the current club valuation table, plus the run's
    /// diagnostics. Non-2xx responses and extraction failures are fatal.
    pub fn fetch_club_values(&self) -> Result<(DataTable, FetchMeta), ScraperError> {
        log::info!("Fetching club valuations from {}...", self.url);

        let response = self
            .client
            .get(&self.url)
            .send()
            .inspect_err(|e| log::error!("HTTP error: {e:?}"))?
            .error_for_status()?;
        let status = response.status().as_u16();
        let html = response.text()?;

        let title = parser::parse_page_title(&html);
        let tables = parse_tables(&html);
        log::debug!("Document contains {} table(s)", tables.len());

        let table = parser::extract_club_values(&tables)?;
        log::info!("Extracted {} club rows", table.row_count());

        let meta =
            FetchMeta::now(self.url.clone(), table.row_count()).with_http(status, title);
        Ok((table, meta))
    }
}
