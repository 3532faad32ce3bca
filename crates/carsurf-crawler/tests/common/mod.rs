#![allow(dead_code)]

use std::collections::HashMap;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use carsurf_crawler::{
    async_trait, BrowserDriver, CrawlerConfig, DriverError, Locator, PageElement, PageSelectors,
    SCROLL_HEIGHT, SCROLL_TO_BOTTOM,
};
use fantoccini::error::CmdError;
use serde_json::json;

pub const SEARCH_URL: &str = "https://cars.test/buy";

pub fn config() -> CrawlerConfig {
    CrawlerConfig {
        search_url: SEARCH_URL.to_string(),
        wait_time: 0,
        ..Default::default()
    }
}

pub fn selectors() -> PageSelectors {
    PageSelectors::default()
}

pub fn listing_url(i: usize) -> String {
    format!("https://cars.test/listing/{i}")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Navigate(String),
    Scroll,
    Select(String),
    Type(String),
}

#[derive(Debug, Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<Action>>>);

impl Journal {
    fn push(&self, action: Action) {
        self.0.lock().unwrap().push(action);
    }

    pub fn actions(&self) -> Vec<Action> {
        self.0.lock().unwrap().clone()
    }

    pub fn visits(&self) -> Vec<String> {
        self.actions()
            .into_iter()
            .filter_map(|a| match a {
                Action::Navigate(url) if url != SEARCH_URL => Some(url),
                _ => None,
            })
            .collect()
    }

    pub fn scrolls(&self) -> usize {
        self.actions()
            .iter()
            .filter(|a| **a == Action::Scroll)
            .count()
    }
}

#[derive(Debug, Clone, Default)]
pub struct MockElement {
    text: String,
    attrs: HashMap<String, String>,
    children: HashMap<Locator, Vec<MockElement>>,
    journal: Journal,
}

impl MockElement {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            ..Default::default()
        }
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.insert(name.to_string(), value.to_string());
        self
    }

    pub fn child(mut self, locator: &Locator, child: MockElement) -> Self {
        self.children.entry(locator.clone()).or_default().push(child);
        self
    }

    fn journaled(&self, journal: &Journal) -> Self {
        Self {
            journal: journal.clone(),
            ..self.clone()
        }
    }
}

#[async_trait]
impl PageElement for MockElement {
    async fn text(&self) -> Result<String, DriverError> {
        Ok(self.text.clone())
    }

    async fn attr(&self, name: &str) -> Result<Option<String>, DriverError> {
        Ok(self.attrs.get(name).cloned())
    }

    async fn find_element(&self, locator: &Locator) -> Result<Option<Self>, DriverError> {
        Ok(self.find_elements(locator).await?.into_iter().next())
    }

    async fn find_elements(&self, locator: &Locator) -> Result<Vec<Self>, DriverError> {
        Ok(self
            .children
            .get(locator)
            .map(|found| found.iter().map(|c| c.journaled(&self.journal)).collect())
            .unwrap_or_default())
    }

    async fn select_by_text(&self, text: &str) -> Result<(), DriverError> {
        self.journal.push(Action::Select(text.to_string()));
        Ok(())
    }

    async fn send_keys(&self, text: &str) -> Result<(), DriverError> {
        self.journal.push(Action::Type(text.to_string()));
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct MockPage {
    ready: bool,
    elements: HashMap<Locator, Vec<MockElement>>,
}

impl MockPage {
    pub fn ready() -> Self {
        Self {
            ready: true,
            elements: HashMap::new(),
        }
    }

    /// A page whose landmark never shows up.
    pub fn stalled() -> Self {
        Self {
            ready: false,
            elements: HashMap::new(),
        }
    }

    pub fn with(mut self, locator: &Locator, element: MockElement) -> Self {
        self.elements.entry(locator.clone()).or_default().push(element);
        self
    }
}

/// Search page carrying the radius and zip controls.
pub fn search_page(radii: &[&str]) -> MockPage {
    let s = selectors();
    let select = radii.iter().fold(MockElement::new(""), |select, r| {
        select.child(&s.radius_option, MockElement::new(r))
    });
    MockPage::ready()
        .with(&s.radius_select, select)
        .with(&s.zip_input, MockElement::new(""))
}

#[derive(Debug, Clone, Default)]
pub struct ListingPage<'a> {
    pub title: &'a str,
    pub price: Option<&'a str>,
    pub summary: &'a [(&'a str, &'a str)],
    pub options: Option<&'a [&'a str]>,
}

impl ListingPage<'_> {
    pub fn build(&self) -> MockPage {
        let s = selectors();
        let mut page = MockPage::ready().with(&s.title, MockElement::new(self.title));

        if let Some(price) = self.price {
            page = page.with(&s.price, MockElement::new(price));
        }

        // The first summary table match is a hidden duplicate
        let decoy = MockElement::new("").child(
            &s.table_row,
            MockElement::new("Decoy: hidden")
                .child(&s.label_cell, MockElement::new("Decoy:"))
                .child(&s.value_cell, MockElement::new("hidden")),
        );
        let mut summary = MockElement::new("").child(
            &s.table_row,
            MockElement::new("Summary").child(&s.label_cell, MockElement::new("Summary")),
        );
        for (key, value) in self.summary {
            summary = summary.child(
                &s.table_row,
                MockElement::new(&format!("{key} {value}"))
                    .child(&s.label_cell, MockElement::new(key))
                    .child(&s.value_cell, MockElement::new(value)),
            );
        }
        page = page.with(&s.summary_table, decoy).with(&s.summary_table, summary);

        if let Some(options) = self.options {
            let mut table = MockElement::new("")
                .child(
                    &s.table_row,
                    MockElement::new("Vehicle Options")
                        .child(&s.value_cell, MockElement::new("Vehicle Options")),
                )
                .child(&s.table_row, MockElement::new("Options"));
            for option in options {
                table = table.child(
                    &s.table_row,
                    MockElement::new(option).child(&s.value_cell, MockElement::new(option)),
                );
            }
            page = page.with(&s.options_table, table);
        }

        page
    }
}

/// What the results page shows after each scroll.
#[derive(Debug, Clone, Default)]
pub struct ResultsFeed {
    /// Content height after `i` scrolls, the last one repeats.
    pub heights: Vec<u64>,
    /// Number of visible listings after `i` scrolls, the last one repeats.
    pub visible: Vec<usize>,
    pub links: Vec<String>,
}

impl ResultsFeed {
    pub fn new(heights: &[u64], visible: &[usize], links: usize) -> Self {
        Self {
            heights: heights.to_vec(),
            visible: visible.to_vec(),
            links: (0..links).map(listing_url).collect(),
        }
    }
}

fn at<T: Copy + Default>(steps: &[T], i: usize) -> T {
    steps
        .get(i)
        .or_else(|| steps.last())
        .copied()
        .unwrap_or_default()
}

#[derive(Debug, Default)]
struct State {
    current: Option<String>,
    scrolls: usize,
}

pub struct MockDriver {
    pages: HashMap<String, MockPage>,
    feed: ResultsFeed,
    anchor: Locator,
    landmark: Locator,
    broken: bool,
    lost: bool,
    quit_fails: bool,
    state: Mutex<State>,
    journal: Journal,
    quits: Arc<AtomicUsize>,
}

pub struct Probe {
    pub journal: Journal,
    quits: Arc<AtomicUsize>,
}

impl Probe {
    pub fn quits(&self) -> usize {
        self.quits.load(Ordering::SeqCst)
    }
}

impl MockDriver {
    pub fn new(search: MockPage, feed: ResultsFeed) -> Self {
        let s = selectors();
        let mut pages = HashMap::new();
        pages.insert(SEARCH_URL.to_string(), search);
        Self {
            pages,
            feed,
            anchor: s.listing_anchor,
            landmark: s.landmark,
            broken: false,
            lost: false,
            quit_fails: false,
            state: Mutex::new(State::default()),
            journal: Journal::default(),
            quits: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn listing(mut self, url: &str, page: MockPage) -> Self {
        self.pages.insert(url.to_string(), page);
        self
    }

    /// Readiness waits fail at the transport level.
    pub fn broken(mut self) -> Self {
        self.broken = true;
        self
    }

    /// The browser goes away as soon as a listing is opened.
    pub fn lost(mut self) -> Self {
        self.lost = true;
        self
    }

    /// Closing the session fails, after being counted.
    pub fn quit_fails(mut self) -> Self {
        self.quit_fails = true;
        self
    }

    pub fn probe(&self) -> Probe {
        Probe {
            journal: self.journal.clone(),
            quits: self.quits.clone(),
        }
    }

    fn current_page(&self) -> Option<MockPage> {
        let state = self.state.lock().unwrap();
        state
            .current
            .as_ref()
            .and_then(|url| self.pages.get(url))
            .cloned()
    }
}

#[async_trait]
impl BrowserDriver for MockDriver {
    type Element = MockElement;

    async fn navigate(&self, url: &str) -> Result<(), DriverError> {
        self.journal.push(Action::Navigate(url.to_string()));
        if self.lost && url != SEARCH_URL {
            return Err(DriverError::Command(CmdError::Lost(io::Error::new(
                io::ErrorKind::ConnectionReset,
                "browser went away",
            ))));
        }
        if !self.pages.contains_key(url) {
            return Err(DriverError::Unavailable(format!("no route to {url}")));
        }
        let mut state = self.state.lock().unwrap();
        state.current = Some(url.to_string());
        Ok(())
    }

    async fn find_element(&self, locator: &Locator) -> Result<Option<MockElement>, DriverError> {
        Ok(self.find_elements(locator).await?.into_iter().next())
    }

    async fn find_elements(&self, locator: &Locator) -> Result<Vec<MockElement>, DriverError> {
        let on_search = {
            let state = self.state.lock().unwrap();
            state.current.as_deref() == Some(SEARCH_URL)
        };
        if on_search && *locator == self.anchor {
            let scrolls = self.state.lock().unwrap().scrolls;
            let visible = at(&self.feed.visible, scrolls).min(self.feed.links.len());
            return Ok(self.feed.links[..visible]
                .iter()
                .map(|href| MockElement::new("").attr("href", href))
                .collect());
        }

        Ok(self
            .current_page()
            .and_then(|page| page.elements.get(locator).cloned())
            .map(|found| found.iter().map(|e| e.journaled(&self.journal)).collect())
            .unwrap_or_default())
    }

    async fn execute_script(&self, script: &str) -> Result<serde_json::Value, DriverError> {
        let mut state = self.state.lock().unwrap();
        match script {
            SCROLL_HEIGHT => Ok(json!(at(&self.feed.heights, state.scrolls))),
            SCROLL_TO_BOTTOM => {
                state.scrolls += 1;
                self.journal.push(Action::Scroll);
                Ok(serde_json::Value::Null)
            }
            other => Err(DriverError::Unavailable(format!("unknown script {other}"))),
        }
    }

    async fn wait_for(&self, locator: &Locator, _timeout: Duration) -> Result<bool, DriverError> {
        if self.broken {
            return Err(DriverError::Unavailable("connection reset".into()));
        }
        Ok(*locator == self.landmark && self.current_page().map_or(false, |p| p.ready))
    }

    async fn quit(self) -> Result<(), DriverError> {
        self.quits.fetch_add(1, Ordering::SeqCst);
        if self.quit_fails {
            return Err(DriverError::Unavailable("session already gone".into()));
        }
        Ok(())
    }
}
