use anyhow::Context;

use crate::config::{CrawlerConfig, OnError};
use crate::driver::{require, BrowserDriver, DriverError, PageElement};
use crate::error::CrawlError;
use crate::listing::scrap_listing;
use crate::pagination::collect_listings;
use crate::record::{Record, TabularWriter};
use crate::search::{validate_radius, SearchFilter, Zip};

/// Runs a full search on `driver` and hands the records to `writer`.
///
/// The session is consumed and quit exactly once, whatever the outcome.
/// `writer` only runs once the session is closed cleanly, so a failed run
/// never leaves an output behind.
pub async fn crawl_site<D, W>(
    driver: D,
    config: &CrawlerConfig,
    filter: &SearchFilter,
    writer: &mut W,
) -> Result<Vec<Record>, CrawlError>
where
    D: BrowserDriver,
    W: TabularWriter + ?Sized,
{
    let outcome = crawl_session(&driver, config, filter).await;
    let records = close_session(outcome, driver.quit().await)?;

    writer
        .write(&records)
        .with_context(|| format!("{} records", records.len()))
        .map_err(CrawlError::Output)?;
    log::info!("Wrote {} records", records.len());

    Ok(records)
}

/// Opens the search page once to make sure the browser and the site respond.
pub async fn check_site<D>(driver: D, config: &CrawlerConfig) -> Result<(), CrawlError>
where
    D: BrowserDriver,
{
    let outcome = open_search(&driver, config).await;
    close_session(outcome, driver.quit().await)
}

pub async fn scrap_single_listing<D>(
    driver: D,
    config: &CrawlerConfig,
    url: &str,
) -> Result<Record, CrawlError>
where
    D: BrowserDriver,
{
    let outcome = scrap_listing(&driver, config, url).await;
    close_session(outcome, driver.quit().await)
}

fn close_session<T>(
    outcome: Result<T, CrawlError>,
    closed: Result<(), DriverError>,
) -> Result<T, CrawlError> {
    match (outcome, closed) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(e)) => Err(CrawlError::Connectivity(e)),
        (Err(e), Ok(())) => Err(e),
        (Err(e), Err(quit_err)) => {
            log::warn!("Couldn't close browser session: {quit_err}");
            Err(e)
        }
    }
}

async fn crawl_session<D: BrowserDriver>(
    driver: &D,
    config: &CrawlerConfig,
    filter: &SearchFilter,
) -> Result<Vec<Record>, CrawlError> {
    open_search(driver, config).await?;

    if let Some((radius, zip)) = filter.location() {
        tokio::time::sleep(config.wait_time()).await;
        apply_location(driver, config, radius, zip).await?;
    }

    tokio::time::sleep(config.wait_time()).await;
    let limit = filter.limit();
    let links = collect_listings(driver, config, limit).await?;

    scrap_listings(driver, config, &links, limit).await
}

async fn open_search<D: BrowserDriver>(driver: &D, config: &CrawlerConfig) -> Result<(), CrawlError> {
    let url = config.search_url.as_str();
    log::info!("Opening {url}");
    driver
        .navigate(url)
        .await
        .map_err(CrawlError::Connectivity)?;
    confirm_page_load(driver, config, url).await
}

async fn apply_location<D: BrowserDriver>(
    driver: &D,
    config: &CrawlerConfig,
    radius: &str,
    zip: &Zip,
) -> Result<(), CrawlError> {
    let url = config.search_url.as_str();
    let selectors = &config.selectors;

    let radius_select = require(driver, &selectors.radius_select)
        .await
        .map_err(CrawlError::navigation(url))?;
    let zip_input = require(driver, &selectors.zip_input)
        .await
        .map_err(CrawlError::navigation(url))?;

    let mut available = Vec::new();
    for option in radius_select
        .find_elements(&selectors.radius_option)
        .await
        .map_err(CrawlError::navigation(url))?
    {
        let text = option.text().await.map_err(CrawlError::navigation(url))?;
        let text = text.trim();
        if !text.is_empty() {
            available.push(text.to_string());
        }
    }
    log::debug!("Available radius options: {available:?}");
    validate_radius(radius, &available)?;

    radius_select
        .select_by_text(radius)
        .await
        .map_err(CrawlError::navigation(url))?;
    zip_input
        .send_keys(zip.as_str())
        .await
        .map_err(CrawlError::navigation(url))?;

    log::info!("Filtering within {radius} of {zip}");
    Ok(())
}

async fn scrap_listings<D: BrowserDriver>(
    driver: &D,
    config: &CrawlerConfig,
    links: &[String],
    limit: usize,
) -> Result<Vec<Record>, CrawlError> {
    let mut records = Vec::with_capacity(links.len().min(limit));

    for link in links.iter().take(limit) {
        match scrap_listing(driver, config, link).await {
            Ok(record) => {
                log::debug!("{record}");
                records.push(record);
            }
            Err(e) => match config.on_listing_error {
                OnError::SkipAndLog if !e.is_session_failure() => {
                    log::error!("Skipping listing {link} got: {e}");
                }
                _ => return Err(e),
            },
        }
    }

    Ok(records)
}

/// Waits for the landmark element that shows the page finished loading.
pub(crate) async fn confirm_page_load<D: BrowserDriver>(
    driver: &D,
    config: &CrawlerConfig,
    url: &str,
) -> Result<(), CrawlError> {
    let timeout = config.wait_time();
    match driver.wait_for(&config.selectors.landmark, timeout).await {
        Ok(true) => Ok(()),
        Ok(false) => Err(CrawlError::PageLoadTimeout {
            url: url.to_string(),
            timeout,
        }),
        Err(e) => Err(CrawlError::Connectivity(e)),
    }
}
