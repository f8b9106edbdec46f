mod flatten;
pub mod scraper;

pub use scraper::{ScraperError, WebScraper};

use crate::output::FeedFiles;

pub(crate) const SOURCE_URL: &str = "https://fantasy.premierleague.com/api/bootstrap-static/";

/// Staged and public artifact names for the fantasy bootstrap feed.
pub const FILES: FeedFiles = FeedFiles {
    stage_csv: "fpl_api_elements.csv",
    public_json: "fpl_api_elements.json",
    meta_json: "meta.json",
};
