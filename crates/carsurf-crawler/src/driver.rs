use std::fmt;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Locator {
    Css(String),
    Id(String),
    #[serde(rename = "xpath")]
    XPath(String),
}

impl Locator {
    pub fn css(selector: &str) -> Self {
        Self::Css(selector.to_string())
    }

    pub fn id(id: &str) -> Self {
        Self::Id(id.to_string())
    }

    pub fn xpath(path: &str) -> Self {
        Self::XPath(path.to_string())
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Css(s) => write!(f, "css `{s}`"),
            Self::Id(s) => write!(f, "id `{s}`"),
            Self::XPath(s) => write!(f, "xpath `{s}`"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error("couldn't launch browser driver {path:?}: {source}")]
    Launch { path: PathBuf, source: io::Error },
    #[error("couldn't open browser session: {0}")]
    Session(#[from] fantoccini::error::NewSessionError),
    #[error("browser command failed: {0}")]
    Command(#[from] fantoccini::error::CmdError),
    #[error("no element matches {0}")]
    NoSuchElement(Locator),
    #[error("unexpected script result: {0}")]
    ScriptValue(serde_json::Value),
    #[error("{0}")]
    Unavailable(String),
}

impl DriverError {
    /// Whether the browser session itself is gone, so no later command can work.
    pub fn is_session_lost(&self) -> bool {
        use fantoccini::error::{CmdError, ErrorStatus};

        match self {
            Self::Launch { .. } | Self::Session(_) => true,
            Self::Command(CmdError::Lost(_)) => true,
            Self::Command(CmdError::Standard(e)) => matches!(
                e.error,
                ErrorStatus::InvalidSessionId | ErrorStatus::NoSuchWindow
            ),
            _ => false,
        }
    }
}

/// A DOM-capable browser session.
///
/// Implementations are driven strictly sequentially: the crawler awaits every
/// call before issuing the next one. `quit` consumes the session so it can
/// only be closed once.
#[async_trait]
pub trait BrowserDriver: Send + Sync + Sized {
    type Element: PageElement;

    async fn navigate(&self, url: &str) -> Result<(), DriverError>;

    async fn find_element(&self, locator: &Locator) -> Result<Option<Self::Element>, DriverError>;

    async fn find_elements(&self, locator: &Locator) -> Result<Vec<Self::Element>, DriverError>;

    async fn execute_script(&self, script: &str) -> Result<serde_json::Value, DriverError>;

    /// Waits until `locator` matches something, `Ok(false)` on timeout.
    async fn wait_for(&self, locator: &Locator, timeout: Duration) -> Result<bool, DriverError>;

    async fn quit(self) -> Result<(), DriverError>;
}

#[async_trait]
pub trait PageElement: Send + Sync + Sized {
    async fn text(&self) -> Result<String, DriverError>;

    async fn attr(&self, name: &str) -> Result<Option<String>, DriverError>;

    async fn find_element(&self, locator: &Locator) -> Result<Option<Self>, DriverError>;

    async fn find_elements(&self, locator: &Locator) -> Result<Vec<Self>, DriverError>;

    /// Picks the `<option>` whose visible text is `text` (for `<select>` elements).
    async fn select_by_text(&self, text: &str) -> Result<(), DriverError>;

    async fn send_keys(&self, text: &str) -> Result<(), DriverError>;
}

pub async fn require<D: BrowserDriver>(
    driver: &D,
    locator: &Locator,
) -> Result<D::Element, DriverError> {
    driver
        .find_element(locator)
        .await?
        .ok_or_else(|| DriverError::NoSuchElement(locator.clone()))
}
