mod config;
mod crawler;
mod driver;
mod error;
mod listing;
mod pagination;
mod record;
mod search;
mod webdriver;

pub use config::{CrawlerConfig, OnError, PageSelectors, TRED_URL};
pub use crawler::{check_site, crawl_site, scrap_single_listing};
pub use driver::{BrowserDriver, DriverError, Locator, PageElement};
pub use error::CrawlError;
pub use listing::{
    clean_label, collapse_lines, extract_name, scrap_listing, RowKind, RowSection,
    OPTIONS_MARKER, SUMMARY_MARKER,
};
pub use pagination::{collect_listings, SCROLL_HEIGHT, SCROLL_TO_BOTTOM};
pub use record::{Price, Record, SummaryEntry, TabularWriter, SOLD};
pub use search::{parse_limit, parse_zip, validate_radius, SearchFilter, Zip};
pub use webdriver::{WebDriverSession, WebElement};

pub use anyhow;
pub use async_trait::async_trait;
