//! Test utilities: mock implementations of all core traits.
//!
//! Handwritten mocks for dependency injection in unit tests.
//! All mocks use `Arc<Mutex<_>>` for interior mutability, allowing
//! test assertions on recorded calls.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::NaiveDate;

use crate::browser::{BrowserSession, SessionLauncher};
use crate::error::AppError;
use crate::models::{JobRecord, SourceKind};
use crate::traits::{Cleaner, Fetcher, JobSource, LetterWriter};

// ---------------------------------------------------------------------------
// MockFetcher
// ---------------------------------------------------------------------------

/// Mock fetcher that returns a configurable response.
#[derive(Clone)]
pub struct MockFetcher {
    /// Queue of responses. Each call pops the first element.
    /// If empty, returns an empty JSON array.
    responses: Arc<Mutex<Vec<Result<String, AppError>>>>,
    pub requested: Arc<Mutex<Vec<String>>>,
}

impl MockFetcher {
    pub fn new(body: &str) -> Self {
        Self::with_responses(vec![Ok(body.to_string())])
    }

    pub fn with_error(error: AppError) -> Self {
        Self::with_responses(vec![Err(error)])
    }

    pub fn with_responses(responses: Vec<Result<String, AppError>>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses)),
            requested: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl Fetcher for MockFetcher {
    async fn fetch(&self, url: &str) -> Result<String, AppError> {
        self.requested.lock().unwrap().push(url.to_string());
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            Ok("[]".to_string())
        } else {
            responses.remove(0)
        }
    }
}

// ---------------------------------------------------------------------------
// MockCleaner
// ---------------------------------------------------------------------------

/// Mock cleaner that returns its input unchanged, or a configured error.
#[derive(Clone)]
pub struct MockCleaner {
    error: Arc<Mutex<Option<AppError>>>,
}

impl MockCleaner {
    pub fn passthrough() -> Self {
        Self {
            error: Arc::new(Mutex::new(None)),
        }
    }

    /// Creates a cleaner that fails once with `error`.
    pub fn with_error(error: AppError) -> Self {
        Self {
            error: Arc::new(Mutex::new(Some(error))),
        }
    }
}

impl Cleaner for MockCleaner {
    fn clean(&self, html: &str) -> Result<String, AppError> {
        if let Some(e) = self.error.lock().unwrap().take() {
            return Err(e);
        }
        Ok(html.to_string())
    }
}

// ---------------------------------------------------------------------------
// MockSource
// ---------------------------------------------------------------------------

/// Mock job source that hands out a fixed list of records.
pub struct MockSource {
    kind: SourceKind,
    records: Vec<JobRecord>,
    pub queries: Arc<Mutex<Vec<(String, String)>>>,
}

impl MockSource {
    pub fn new(kind: SourceKind, records: Vec<JobRecord>) -> Self {
        Self {
            kind,
            records,
            queries: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl JobSource for MockSource {
    fn kind(&self) -> SourceKind {
        self.kind
    }

    async fn scrape(&mut self, query: &str, location: &str) -> Vec<JobRecord> {
        self.queries
            .lock()
            .unwrap()
            .push((query.to_string(), location.to_string()));
        self.records.clone()
    }
}

// ---------------------------------------------------------------------------
// MockLetterWriter
// ---------------------------------------------------------------------------

/// Mock letter writer. Fails for any record whose company is listed in
/// `failing_companies`, otherwise returns a letter naming the posting.
#[derive(Clone, Default)]
pub struct MockLetterWriter {
    failing_companies: Vec<String>,
    pub written_for: Arc<Mutex<Vec<String>>>,
}

impl MockLetterWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_for(mut self, company: &str) -> Self {
        self.failing_companies.push(company.to_string());
        self
    }
}

impl LetterWriter for MockLetterWriter {
    async fn write_letter(&self, record: &JobRecord) -> Result<String, AppError> {
        self.written_for
            .lock()
            .unwrap()
            .push(record.url().to_string());
        if self.failing_companies.iter().any(|c| c == record.company()) {
            return Err(AppError::LlmError {
                message: "service unavailable".into(),
                status_code: 503,
            });
        }
        Ok(format!("Dear {}, about {}", record.company(), record.title()))
    }
}

// ---------------------------------------------------------------------------
// MockSession / MockLauncher
// ---------------------------------------------------------------------------

/// Element on a scripted page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockElement {
    pub id: String,
    pub text: String,
    pub attributes: HashMap<String, String>,
}

impl MockElement {
    pub fn new(id: &str, text: &str) -> Self {
        Self {
            id: id.to_string(),
            text: text.to_string(),
            attributes: HashMap::new(),
        }
    }

    pub fn with_attribute(mut self, name: &str, value: &str) -> Self {
        self.attributes.insert(name.to_string(), value.to_string());
        self
    }
}

#[derive(Default)]
struct PageState {
    /// Page-level elements by selector.
    elements: HashMap<String, Vec<MockElement>>,
    /// Descendants keyed by (parent id, selector).
    children: HashMap<(String, String), MockElement>,
    /// Elements that only appear after a given element was clicked,
    /// keyed by (clicked id, selector).
    panels: HashMap<(String, String), MockElement>,
    heights: Vec<u64>,
    height_reads: usize,
    failing_height: bool,
    failing_navigation: Option<String>,
    navigations: Vec<String>,
    clicks: Vec<String>,
    typed: Vec<(String, String)>,
    scrolls: usize,
    closed: bool,
}

/// Scripted browser session. Clones share state, so a test can keep a
/// handle and inspect what the scraper did after the session was closed.
#[derive(Clone, Default)]
pub struct MockSession {
    state: Arc<Mutex<PageState>>,
}

impl MockSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Successive `page_height` results. The last value repeats once the
    /// sequence is exhausted.
    pub fn with_heights(self, heights: Vec<u64>) -> Self {
        self.state.lock().unwrap().heights = heights;
        self
    }

    pub fn with_element(self, selector: &str, element: MockElement) -> Self {
        self.state
            .lock()
            .unwrap()
            .elements
            .entry(selector.to_string())
            .or_default()
            .push(element);
        self
    }

    pub fn with_child(self, parent_id: &str, selector: &str, element: MockElement) -> Self {
        self.state
            .lock()
            .unwrap()
            .children
            .insert((parent_id.to_string(), selector.to_string()), element);
        self
    }

    pub fn with_panel(self, clicked_id: &str, selector: &str, element: MockElement) -> Self {
        self.state
            .lock()
            .unwrap()
            .panels
            .insert((clicked_id.to_string(), selector.to_string()), element);
        self
    }

    pub fn failing_height(self) -> Self {
        self.state.lock().unwrap().failing_height = true;
        self
    }

    /// Make navigation fail for any URL starting with `prefix`.
    pub fn failing_navigation(self, prefix: &str) -> Self {
        self.state.lock().unwrap().failing_navigation = Some(prefix.to_string());
        self
    }

    pub fn navigations(&self) -> Vec<String> {
        self.state.lock().unwrap().navigations.clone()
    }

    pub fn clicks(&self) -> Vec<String> {
        self.state.lock().unwrap().clicks.clone()
    }

    pub fn typed(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().typed.clone()
    }

    pub fn scroll_count(&self) -> usize {
        self.state.lock().unwrap().scrolls
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().unwrap().closed
    }

    fn not_found(selector: &str) -> AppError {
        AppError::BrowserError(format!("No element matches '{selector}'"))
    }
}

impl BrowserSession for MockSession {
    type Element = MockElement;

    async fn navigate(&self, url: &str) -> Result<(), AppError> {
        let mut state = self.state.lock().unwrap();
        if let Some(prefix) = &state.failing_navigation {
            if url.starts_with(prefix.as_str()) {
                return Err(AppError::BrowserError(format!("net::ERR_FAILED at {url}")));
            }
        }
        state.navigations.push(url.to_string());
        Ok(())
    }

    async fn wait_for_element(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<MockElement, AppError> {
        let state = self.state.lock().unwrap();
        if let Some(clicked) = state.clicks.last() {
            if let Some(el) = state.panels.get(&(clicked.clone(), selector.to_string())) {
                return Ok(el.clone());
            }
        }
        state
            .elements
            .get(selector)
            .and_then(|els| els.first().cloned())
            .ok_or(AppError::Timeout(timeout.as_secs()))
    }

    async fn find_elements(&self, selector: &str) -> Result<Vec<MockElement>, AppError> {
        let state = self.state.lock().unwrap();
        Ok(state.elements.get(selector).cloned().unwrap_or_default())
    }

    async fn find_within(
        &self,
        parent: &MockElement,
        selector: &str,
    ) -> Result<MockElement, AppError> {
        let state = self.state.lock().unwrap();
        state
            .children
            .get(&(parent.id.clone(), selector.to_string()))
            .cloned()
            .ok_or_else(|| Self::not_found(selector))
    }

    async fn click(&self, element: &MockElement) -> Result<(), AppError> {
        self.state.lock().unwrap().clicks.push(element.id.clone());
        Ok(())
    }

    async fn type_text(&self, element: &MockElement, text: &str) -> Result<(), AppError> {
        self.state
            .lock()
            .unwrap()
            .typed
            .push((element.id.clone(), text.to_string()));
        Ok(())
    }

    async fn read_text(&self, element: &MockElement) -> Result<String, AppError> {
        Ok(element.text.clone())
    }

    async fn read_attribute(
        &self,
        element: &MockElement,
        name: &str,
    ) -> Result<Option<String>, AppError> {
        Ok(element.attributes.get(name).cloned())
    }

    async fn scroll_to_bottom(&self) -> Result<(), AppError> {
        self.state.lock().unwrap().scrolls += 1;
        Ok(())
    }

    async fn page_height(&self) -> Result<u64, AppError> {
        let mut state = self.state.lock().unwrap();
        if state.failing_height {
            return Err(AppError::BrowserError("Runtime.evaluate failed".into()));
        }
        let idx = state.height_reads.min(state.heights.len().saturating_sub(1));
        state.height_reads += 1;
        Ok(state.heights.get(idx).copied().unwrap_or(0))
    }

    async fn close(self) -> Result<(), AppError> {
        self.state.lock().unwrap().closed = true;
        Ok(())
    }
}

/// Launcher that hands out clones of one scripted session.
#[derive(Clone)]
pub struct MockLauncher {
    session: MockSession,
    fail: bool,
    pub launches: Arc<Mutex<usize>>,
}

impl MockLauncher {
    pub fn new(session: MockSession) -> Self {
        Self {
            session,
            fail: false,
            launches: Arc::new(Mutex::new(0)),
        }
    }

    pub fn failing() -> Self {
        Self {
            session: MockSession::new(),
            fail: true,
            launches: Arc::new(Mutex::new(0)),
        }
    }

    pub fn launch_count(&self) -> usize {
        *self.launches.lock().unwrap()
    }
}

impl SessionLauncher for MockLauncher {
    type Session = MockSession;

    async fn launch(&self) -> Result<MockSession, AppError> {
        *self.launches.lock().unwrap() += 1;
        if self.fail {
            return Err(AppError::BrowserError("Failed to launch browser".into()));
        }
        Ok(self.session.clone())
    }
}

// ---------------------------------------------------------------------------
// Test helpers
// ---------------------------------------------------------------------------

/// Fixed run date used by tests.
pub fn test_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 15).unwrap_or_default()
}

/// Create a dummy record for testing.
pub fn make_test_record(source: SourceKind, title: &str, company: &str) -> JobRecord {
    let slug = title.to_lowercase().replace(' ', "-");
    JobRecord::new(
        source,
        title,
        format!("https://jobs.example.com/{slug}"),
        test_date(),
    )
    .with_company(company)
    .with_location("Warsaw, PL")
    .with_description(format!("{title} at {company}"))
}
