use std::process::{Child, Command, Stdio};
use std::time::Duration;

use async_trait::async_trait;
use fantoccini::elements::Element;
use fantoccini::error::CmdError;
use fantoccini::{Client, ClientBuilder};
use serde_json::json;

use crate::config::CrawlerConfig;
use crate::driver::{BrowserDriver, DriverError, Locator, PageElement};

const CONNECT_ATTEMPTS: usize = 20;
const CONNECT_BACKOFF: Duration = Duration::from_millis(250);

/// Chrome session driven through a chromedriver child process.
pub struct WebDriverSession {
    client: Client,
    driver: Option<Child>,
}

impl WebDriverSession {
    pub async fn launch(config: &CrawlerConfig) -> Result<Self, DriverError> {
        log::info!(
            "Starting {} on port {}",
            config.driver_path.display(),
            config.driver_port
        );
        let mut driver = Command::new(&config.driver_path)
            .arg(format!("--port={}", config.driver_port))
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| DriverError::Launch {
                path: config.driver_path.clone(),
                source,
            })?;

        match connect(config).await {
            Ok(client) => {
                log::info!("Browser session opened");
                Ok(Self {
                    client,
                    driver: Some(driver),
                })
            }
            Err(e) => {
                driver.kill().ok();
                driver.wait().ok();
                Err(e)
            }
        }
    }
}

async fn connect(config: &CrawlerConfig) -> Result<Client, DriverError> {
    let mut args = vec!["--disable-gpu", "--window-size=1920,1080"];
    if config.headless {
        args.push("--headless=new");
    }
    let mut prefs = serde_json::Map::new();
    if !config.load_images {
        prefs.insert(
            "profile.managed_default_content_settings.images".into(),
            json!(2),
        );
    }

    let mut caps = serde_json::Map::new();
    caps.insert(
        "goog:chromeOptions".into(),
        json!({ "args": args, "prefs": prefs }),
    );

    let url = config.webdriver_url();
    let mut attempt = 1;
    loop {
        let mut builder = ClientBuilder::native();
        builder.capabilities(caps.clone());
        match builder.connect(&url).await {
            Ok(client) => return Ok(client),
            Err(e) if attempt < CONNECT_ATTEMPTS => {
                log::debug!("Webdriver not ready at {url} (attempt {attempt}): {e}");
                attempt += 1;
                tokio::time::sleep(CONNECT_BACKOFF).await;
            }
            Err(e) => return Err(e.into()),
        }
    }
}

fn wd_locator(locator: &Locator) -> fantoccini::Locator<'_> {
    match locator {
        Locator::Css(s) => fantoccini::Locator::Css(s),
        Locator::Id(s) => fantoccini::Locator::Id(s),
        Locator::XPath(s) => fantoccini::Locator::XPath(s),
    }
}

#[async_trait]
impl BrowserDriver for WebDriverSession {
    type Element = WebElement;

    async fn navigate(&self, url: &str) -> Result<(), DriverError> {
        self.client.goto(url).await?;
        Ok(())
    }

    async fn find_element(&self, locator: &Locator) -> Result<Option<WebElement>, DriverError> {
        Ok(self.find_elements(locator).await?.into_iter().next())
    }

    async fn find_elements(&self, locator: &Locator) -> Result<Vec<WebElement>, DriverError> {
        let found = self.client.find_all(wd_locator(locator)).await?;
        Ok(found.into_iter().map(WebElement).collect())
    }

    async fn execute_script(&self, script: &str) -> Result<serde_json::Value, DriverError> {
        Ok(self.client.execute(script, vec![]).await?)
    }

    async fn wait_for(&self, locator: &Locator, timeout: Duration) -> Result<bool, DriverError> {
        match self
            .client
            .wait()
            .at_most(timeout)
            .for_element(wd_locator(locator))
            .await
        {
            Ok(_) => Ok(true),
            Err(CmdError::WaitTimeout) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn quit(mut self) -> Result<(), DriverError> {
        let closed = self.client.clone().close().await;
        if let Some(mut driver) = self.driver.take() {
            driver.kill().ok();
            driver.wait().ok();
        }
        log::info!("Browser session closed");
        Ok(closed?)
    }
}

impl Drop for WebDriverSession {
    fn drop(&mut self) {
        if let Some(mut driver) = self.driver.take() {
            log::warn!("Browser session dropped without quit, killing driver");
            driver.kill().ok();
            driver.wait().ok();
        }
    }
}

pub struct WebElement(Element);

#[async_trait]
impl PageElement for WebElement {
    async fn text(&self) -> Result<String, DriverError> {
        Ok(self.0.text().await?)
    }

    async fn attr(&self, name: &str) -> Result<Option<String>, DriverError> {
        Ok(self.0.attr(name).await?)
    }

    async fn find_element(&self, locator: &Locator) -> Result<Option<WebElement>, DriverError> {
        Ok(self.find_elements(locator).await?.into_iter().next())
    }

    async fn find_elements(&self, locator: &Locator) -> Result<Vec<WebElement>, DriverError> {
        let found = self.0.find_all(wd_locator(locator)).await?;
        Ok(found.into_iter().map(WebElement).collect())
    }

    async fn select_by_text(&self, text: &str) -> Result<(), DriverError> {
        self.0.select_by_label(text).await?;
        Ok(())
    }

    async fn send_keys(&self, text: &str) -> Result<(), DriverError> {
        self.0.send_keys(text).await?;
        Ok(())
    }
}
