use std::time::Duration;

use crate::driver::DriverError;

#[derive(Debug, thiserror::Error)]
pub enum CrawlError {
    #[error("Browser connectivity issue: {0}")]
    Connectivity(#[source] DriverError),

    #[error("Service is unavailable at the moment: {url} not ready after {timeout:?}")]
    PageLoadTimeout { url: String, timeout: Duration },

    #[error("Invalid radius {radius:?}, available: {available:?}")]
    InvalidRadius {
        radius: String,
        available: Vec<String>,
    },

    #[error("Invalid {field} {value:?}: {reason}")]
    InvalidInput {
        field: &'static str,
        value: String,
        reason: &'static str,
    },

    #[error("Couldn't extract listing {url}: {reason}")]
    Extraction { url: String, reason: String },

    #[error("Navigation failed on {url}: {source}")]
    Navigation { url: String, source: DriverError },

    #[error("Couldn't write records: {0}")]
    Output(anyhow::Error),
}

impl CrawlError {
    pub(crate) fn navigation(url: &str) -> impl FnOnce(DriverError) -> Self + '_ {
        move |source| Self::Navigation {
            url: url.to_string(),
            source,
        }
    }

    pub(crate) fn extraction(url: &str, reason: impl Into<String>) -> Self {
        Self::Extraction {
            url: url.to_string(),
            reason: reason.into(),
        }
    }

    /// Whether the failure is tied to the browser session rather than one page.
    pub fn is_session_failure(&self) -> bool {
        match self {
            Self::Connectivity(_) => true,
            Self::Navigation { source, .. } => source.is_session_lost(),
            _ => false,
        }
    }
}
