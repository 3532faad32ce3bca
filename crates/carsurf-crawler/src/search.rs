use std::fmt;
use std::num::NonZeroUsize;
use std::str::FromStr;

use crate::error::CrawlError;

/// Zip code as typed by the user, digits only so leading zeros survive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Zip(String);

impl Zip {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Zip {
    type Err = CrawlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if !s.is_empty() && s.chars().all(|c| c.is_ascii_digit()) {
            Ok(Self(s.to_string()))
        } else {
            Err(CrawlError::InvalidInput {
                field: "zip",
                value: s.to_string(),
                reason: "zip code must be an integer",
            })
        }
    }
}

impl fmt::Display for Zip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub fn parse_zip(s: &str) -> Result<Zip, CrawlError> {
    s.parse()
}

pub fn parse_limit(s: &str) -> Result<NonZeroUsize, CrawlError> {
    let s = s.trim();
    let invalid = |reason| CrawlError::InvalidInput {
        field: "limit",
        value: s.to_string(),
        reason,
    };
    let n: i128 = s.parse().map_err(|_| invalid("limit must be an integer"))?;
    usize::try_from(n)
        .ok()
        .and_then(NonZeroUsize::new)
        .ok_or_else(|| invalid("limit must be a positive integer"))
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchFilter {
    radius: Option<String>,
    zip: Option<Zip>,
    limit: Option<NonZeroUsize>,
}

impl SearchFilter {
    pub fn new(radius: Option<String>, zip: Option<Zip>, limit: Option<NonZeroUsize>) -> Self {
        let radius = radius
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty());
        Self { radius, zip, limit }
    }

    /// Builds a filter from free-text prompt answers.
    ///
    /// A zip or limit that isn't a number counts as not supplied. A limit that
    /// is a number but not positive is still rejected.
    pub fn from_answers(radius: &str, zip: &str, limit: &str) -> Result<Self, CrawlError> {
        let zip = match parse_zip(zip) {
            Ok(zip) => Some(zip),
            Err(e) => {
                if !zip.trim().is_empty() {
                    log::warn!("Ignoring zip: {e}");
                }
                None
            }
        };
        let limit = match parse_limit(limit) {
            Ok(limit) => Some(limit),
            Err(_) if limit.trim().parse::<i128>().is_err() => {
                if !limit.trim().is_empty() {
                    log::warn!("Ignoring non-numeric limit {:?}, results are unbounded", limit.trim());
                }
                None
            }
            Err(e) => return Err(e),
        };
        Ok(Self::new(Some(radius.to_string()), zip, limit))
    }

    pub fn radius(&self) -> Option<&str> {
        self.radius.as_deref()
    }

    pub fn zip(&self) -> Option<&Zip> {
        self.zip.as_ref()
    }

    /// Radius and zip, when both were supplied.
    pub fn location(&self) -> Option<(&str, &Zip)> {
        self.radius().zip(self.zip())
    }

    /// Maximum number of listings to visit, `usize::MAX` when unbounded.
    pub fn limit(&self) -> usize {
        self.limit.map_or(usize::MAX, NonZeroUsize::get)
    }
}

pub fn validate_radius(radius: &str, available: &[String]) -> Result<(), CrawlError> {
    if available.iter().any(|r| r == radius) {
        Ok(())
    } else {
        Err(CrawlError::InvalidRadius {
            radius: radius.to_string(),
            available: available.to_vec(),
        })
    }
}
