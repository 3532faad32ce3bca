use std::fmt;

use serde::{Serialize, Serializer};

pub const SOLD: &str = "Sold";

/// One vehicle listing, built once by the page parser and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record {
    name: String,
    price: Price,
    summary: Vec<SummaryEntry>,
    options: Vec<String>,
}

impl Record {
    pub fn new(name: String, price: Price, summary: Vec<SummaryEntry>, options: Vec<String>) -> Self {
        Self {
            name,
            price,
            summary,
            options,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn price(&self) -> &Price {
        &self.price
    }

    pub fn summary(&self) -> &[SummaryEntry] {
        &self.summary
    }

    pub fn options(&self) -> &[String] {
        &self.options
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name: {}, Price: {}", self.name, self.price)
    }
}

/// Listed price text, or [`Price::Sold`] when the page has no price control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Price {
    Listed(String),
    Sold,
}

impl Price {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Listed(text) => text,
            Self::Sold => SOLD,
        }
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryEntry {
    pub key: String,
    pub value: String,
}

impl SummaryEntry {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Destination for the records of a finished crawl.
pub trait TabularWriter {
    fn write(&mut self, records: &[Record]) -> anyhow::Result<()>;
}

impl TabularWriter for Vec<Record> {
    fn write(&mut self, records: &[Record]) -> anyhow::Result<()> {
        self.extend_from_slice(records);
        Ok(())
    }
}
