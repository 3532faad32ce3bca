use crate::config::CrawlerConfig;
use crate::driver::{BrowserDriver, DriverError, PageElement};
use crate::error::CrawlError;

pub const SCROLL_HEIGHT: &str = "return document.body.scrollHeight;";
pub const SCROLL_TO_BOTTOM: &str = "window.scrollTo(0, document.body.scrollHeight);";

/// Scrolls the current results page until `limit` listing anchors are
/// visible or the content height stops growing, then returns their links in
/// page order.
pub async fn collect_listings<D>(
    driver: &D,
    config: &CrawlerConfig,
    limit: usize,
) -> Result<Vec<String>, CrawlError>
where
    D: BrowserDriver,
{
    let url = config.search_url.as_str();
    let anchor = &config.selectors.listing_anchor;

    let mut previous_height = scroll_height(driver)
        .await
        .map_err(CrawlError::navigation(url))?;
    let mut anchors = driver
        .find_elements(anchor)
        .await
        .map_err(CrawlError::navigation(url))?;

    let mut scrolls = 0;
    while anchors.len() < limit {
        driver
            .execute_script(SCROLL_TO_BOTTOM)
            .await
            .map_err(CrawlError::navigation(url))?;
        tokio::time::sleep(config.wait_time()).await;
        scrolls += 1;

        let current_height = scroll_height(driver)
            .await
            .map_err(CrawlError::navigation(url))?;
        anchors = driver
            .find_elements(anchor)
            .await
            .map_err(CrawlError::navigation(url))?;
        log::debug!(
            "Scroll {scrolls}: height {previous_height} -> {current_height}, {} listings",
            anchors.len()
        );

        if current_height == previous_height {
            break;
        }
        previous_height = current_height;
    }

    let mut links = Vec::with_capacity(anchors.len());
    for anchor in anchors {
        match anchor
            .attr("href")
            .await
            .map_err(CrawlError::navigation(url))?
        {
            Some(href) if !href.trim().is_empty() => links.push(href),
            _ => log::warn!("Skipping listing card without link"),
        }
    }

    log::info!("Found {} listings after {scrolls} scrolls", links.len());
    Ok(links)
}

async fn scroll_height<D: BrowserDriver>(driver: &D) -> Result<u64, DriverError> {
    let value = driver.execute_script(SCROLL_HEIGHT).await?;
    value
        .as_u64()
        .or_else(|| value.as_f64().filter(|h| *h >= 0.0).map(|h| h as u64))
        .ok_or(DriverError::ScriptValue(value))
}
