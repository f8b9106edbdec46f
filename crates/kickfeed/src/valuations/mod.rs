mod parser;
pub mod scraper;
pub mod types;

pub use parser::ExtractError;
pub use scraper::{ScraperError, WebScraper};

use crate::output::FeedFiles;

pub(crate) const SOURCE_URL: &str =
    "https://www.transfermarkt.co.uk/premier-league/marktwerteverein/wettbewerb/GB1";

/// Staged and public artifact names for the club valuation feed.
pub const FILES: FeedFiles = FeedFiles {
    stage_csv: "transfermarkt_club_values_gb1.csv",
    public_json: "transfermarkt_club_values.json",
    meta_json: "transfermarkt_meta.json",
};
