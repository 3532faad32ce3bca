use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::driver::Locator;

pub const TRED_URL: &str = "https://www.tred.com/buy?body_style=&distance=50&exterior_color_id=&make=&miles_max=100000&miles_min=0&model=&page_size=24&price_max=100000&price_min=0&query=&requestingPage=buy&sort=desc&sort_field=updated&status=active&year_end=2022&year_start=1998&zip=";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlerConfig {
    #[serde(default = "default_search_url")]
    pub search_url: String,

    #[serde(default = "default_driver_path")]
    pub driver_path: PathBuf,

    #[serde(default = "default_driver_port")]
    pub driver_port: u16,

    #[serde(default = "default_headless")]
    pub headless: bool,

    #[serde(default = "default_load_images")]
    pub load_images: bool,

    /// Seconds, used both as the scroll settle delay and the readiness timeout
    #[serde(default = "default_wait_time")]
    pub wait_time: u64,

    /// Which `#summary-table` match holds the visible summary
    #[serde(default = "default_summary_table_index")]
    pub summary_table_index: usize,

    #[serde(default = "default_on_listing_error")]
    pub on_listing_error: OnError,

    #[serde(default)]
    pub selectors: PageSelectors,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            search_url: default_search_url(),
            driver_path: default_driver_path(),
            driver_port: default_driver_port(),
            headless: default_headless(),
            load_images: default_load_images(),
            wait_time: default_wait_time(),
            summary_table_index: default_summary_table_index(),
            on_listing_error: default_on_listing_error(),
            selectors: PageSelectors::default(),
        }
    }
}

impl CrawlerConfig {
    pub fn wait_time(&self) -> Duration {
        Duration::from_secs(self.wait_time)
    }

    pub fn webdriver_url(&self) -> String {
        format!("http://localhost:{}", self.driver_port)
    }
}

fn default_search_url() -> String {
    String::from(TRED_URL)
}

fn default_driver_path() -> PathBuf {
    PathBuf::from("chromedriver")
}

fn default_driver_port() -> u16 {
    9515
}

fn default_headless() -> bool {
    true
}

fn default_load_images() -> bool {
    false
}

fn default_wait_time() -> u64 {
    2
}

fn default_summary_table_index() -> usize {
    1
}

fn default_on_listing_error() -> OnError {
    OnError::Fail
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum OnError {
    Fail,
    SkipAndLog,
}

/// Structural vocabulary used to find things on the search and listing pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PageSelectors {
    pub landmark: Locator,
    pub radius_select: Locator,
    pub radius_option: Locator,
    pub zip_input: Locator,
    pub listing_anchor: Locator,
    pub title: Locator,
    pub price: Locator,
    pub summary_table: Locator,
    pub options_table: Locator,
    pub table_row: Locator,
    pub label_cell: Locator,
    pub value_cell: Locator,
}

impl Default for PageSelectors {
    fn default() -> Self {
        Self {
            landmark: Locator::id("main-logo"),
            radius_select: Locator::xpath("//div[contains(@class, 'radius')]/select"),
            radius_option: Locator::xpath("./option"),
            zip_input: Locator::xpath("//div[contains(@class, 'zip')]/input"),
            listing_anchor: Locator::xpath(
                "//div[contains(@class, 'card') and not(@class='card promotion')]/div/a",
            ),
            title: Locator::css(".bigger"),
            price: Locator::xpath("//div[contains(@class, 'price-box')]/h2"),
            summary_table: Locator::id("summary-table"),
            options_table: Locator::id("options-table"),
            table_row: Locator::xpath(".//tbody/tr"),
            label_cell: Locator::xpath(".//th"),
            value_cell: Locator::xpath(".//td"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_keeps_defaults() {
        let conf: CrawlerConfig =
            serde_json::from_str(r#"{"waitTime": 5, "onListingError": "SkipAndLog"}"#).unwrap();

        assert_eq!(Duration::from_secs(5), conf.wait_time());
        assert_eq!(OnError::SkipAndLog, conf.on_listing_error);
        assert_eq!(TRED_URL, conf.search_url);
        assert_eq!(1, conf.summary_table_index);
        assert_eq!(PageSelectors::default(), conf.selectors);
    }

    #[test]
    fn promotion_cards_excluded() {
        let anchor = PageSelectors::default().listing_anchor;
        assert!(anchor.to_string().contains("not(@class='card promotion')"), "{anchor}");
    }

    #[test]
    fn selector_override() {
        let conf: CrawlerConfig =
            serde_json::from_str(r#"{"selectors": {"title": {"css": "h1.title"}}}"#).unwrap();

        assert_eq!(Locator::css("h1.title"), conf.selectors.title);
        assert_eq!(Locator::id("main-logo"), conf.selectors.landmark);
    }
}
