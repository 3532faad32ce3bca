use lazy_static::lazy_static;
use regex::Regex;

use crate::config::CrawlerConfig;
use crate::crawler::confirm_page_load;
use crate::driver::{BrowserDriver, PageElement};
use crate::error::CrawlError;
use crate::record::{Price, Record, SummaryEntry};

pub const SUMMARY_MARKER: &str = "Summary";
pub const OPTIONS_MARKER: &str = "Options";

lazy_static! {
    // Tried in order, the first one capturing a non-empty name wins.
    static ref TITLE_PATTERNS: Vec<Regex> = vec![
        Regex::new(r"['’]s(.*)For Sale").unwrap(),
        Regex::new(r"(.*)For Sale").unwrap(),
    ];
}

/// Extracts the vehicle name from a listing title such as
/// `Dealer's Toyota Camry For Sale` or `Toyota Camry For Sale`.
pub fn extract_name(title: &str) -> Option<String> {
    TITLE_PATTERNS.iter().find_map(|re| {
        re.captures(title)
            .and_then(|caps| caps.get(1))
            .map(|name| name.as_str().trim())
            .filter(|name| !name.is_empty())
            .map(str::to_string)
    })
}

pub fn clean_label(label: &str) -> String {
    label.trim().trim_end_matches(':').trim_end().to_string()
}

/// Joins the lines of a cell text into a single line.
pub fn collapse_lines(text: &str) -> String {
    text.chars().filter(|c| !is_line_break(*c)).collect()
}

fn is_line_break(c: char) -> bool {
    matches!(
        c,
        '\n' | '\r' | '\x0b' | '\x0c' | '\x1c' | '\x1d' | '\x1e' | '\u{85}' | '\u{2028}' | '\u{2029}'
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowSection {
    BeforeSection,
    InSection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    Preamble,
    Marker,
    Data,
}

impl RowSection {
    /// Classifies a row of the options table by its text. Only an exact
    /// `Options` row opens the section.
    pub fn classify(&mut self, row_text: &str) -> RowKind {
        if row_text.trim() == OPTIONS_MARKER {
            *self = Self::InSection;
            return RowKind::Marker;
        }
        match self {
            Self::BeforeSection => RowKind::Preamble,
            Self::InSection => RowKind::Data,
        }
    }
}

/// Navigates to one listing and parses it into a [`Record`].
pub async fn scrap_listing<D>(
    driver: &D,
    config: &CrawlerConfig,
    url: &str,
) -> Result<Record, CrawlError>
where
    D: BrowserDriver,
{
    log::debug!("Visiting {url}");
    driver
        .navigate(url)
        .await
        .map_err(CrawlError::navigation(url))?;
    confirm_page_load(driver, config, url).await?;

    let name = scrap_name(driver, config, url).await?;
    let price = scrap_price(driver, config, url).await?;
    let summary = scrap_summary(driver, config, url).await?;
    let options = scrap_options(driver, config, url).await?;

    Ok(Record::new(name, price, summary, options))
}

async fn scrap_name<D: BrowserDriver>(
    driver: &D,
    config: &CrawlerConfig,
    url: &str,
) -> Result<String, CrawlError> {
    let locator = &config.selectors.title;
    let title = match driver
        .find_element(locator)
        .await
        .map_err(CrawlError::navigation(url))?
    {
        Some(title) => title.text().await.map_err(CrawlError::navigation(url))?,
        None => return Err(CrawlError::extraction(url, format!("no title at {locator}"))),
    };

    extract_name(&title)
        .ok_or_else(|| CrawlError::extraction(url, format!("unrecognized title {title:?}")))
}

async fn scrap_price<D: BrowserDriver>(
    driver: &D,
    config: &CrawlerConfig,
    url: &str,
) -> Result<Price, CrawlError> {
    // Sold vehicles have no price box
    match driver
        .find_element(&config.selectors.price)
        .await
        .map_err(CrawlError::navigation(url))?
    {
        Some(price) => {
            let text = price.text().await.map_err(CrawlError::navigation(url))?;
            Ok(Price::Listed(text.trim().to_string()))
        }
        None => Ok(Price::Sold),
    }
}

async fn scrap_summary<D: BrowserDriver>(
    driver: &D,
    config: &CrawlerConfig,
    url: &str,
) -> Result<Vec<SummaryEntry>, CrawlError> {
    let selectors = &config.selectors;
    let mut tables = driver
        .find_elements(&selectors.summary_table)
        .await
        .map_err(CrawlError::navigation(url))?;

    if tables.is_empty() {
        log::warn!("No summary table on {url}");
        return Ok(Vec::new());
    }
    let index = config.summary_table_index.min(tables.len() - 1);
    let table = tables.swap_remove(index);

    let rows = table
        .find_elements(&selectors.table_row)
        .await
        .map_err(CrawlError::navigation(url))?;

    let mut summary = Vec::with_capacity(rows.len());
    for row in rows {
        let text = row.text().await.map_err(CrawlError::navigation(url))?;
        if text.trim() == SUMMARY_MARKER {
            continue;
        }

        let label = row
            .find_element(&selectors.label_cell)
            .await
            .map_err(CrawlError::navigation(url))?;
        let value = row
            .find_element(&selectors.value_cell)
            .await
            .map_err(CrawlError::navigation(url))?;
        let (label, value) = match (label, value) {
            (Some(label), Some(value)) => (label, value),
            _ => {
                log::warn!("Skipping summary row {text:?} on {url}");
                continue;
            }
        };

        let key = label.text().await.map_err(CrawlError::navigation(url))?;
        let value = value.text().await.map_err(CrawlError::navigation(url))?;
        summary.push(SummaryEntry::new(clean_label(&key), collapse_lines(&value)));
    }

    Ok(summary)
}

async fn scrap_options<D: BrowserDriver>(
    driver: &D,
    config: &CrawlerConfig,
    url: &str,
) -> Result<Vec<String>, CrawlError> {
    let selectors = &config.selectors;
    let table = match driver
        .find_element(&selectors.options_table)
        .await
        .map_err(CrawlError::navigation(url))?
    {
        Some(table) => table,
        None => return Ok(Vec::new()),
    };

    let rows = table
        .find_elements(&selectors.table_row)
        .await
        .map_err(CrawlError::navigation(url))?;

    let mut section = RowSection::BeforeSection;
    let mut options = Vec::new();
    for row in rows {
        let text = row.text().await.map_err(CrawlError::navigation(url))?;
        if section.classify(&text) != RowKind::Data {
            continue;
        }

        match row
            .find_element(&selectors.value_cell)
            .await
            .map_err(CrawlError::navigation(url))?
        {
            Some(cell) => {
                let option = cell.text().await.map_err(CrawlError::navigation(url))?;
                options.push(collapse_lines(&option));
            }
            None => log::warn!("Skipping option row {text:?} on {url}"),
        }
    }

    Ok(options)
}
