//! LinkedIn adapter: drives a browser through login, search, infinite
//! scroll and per-card side panels.

use chrono::{Local, NaiveDate};
use jobscout_core::browser::{BrowserSession, SessionLauncher, scroll_until_stable};
use jobscout_core::config::LinkedInSettings;
use jobscout_core::error::AppError;
use jobscout_core::models::{JobRecord, SourceKind};
use jobscout_core::traits::JobSource;
use url::Url;

/// Site login. Never logged.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Browser-automation adapter.
///
/// The session is launched on the first [`JobSource::scrape`] call and held
/// in `session` while that call runs. Every call ends by closing it, whether
/// scraping succeeded or not, so the next call starts with a fresh browser.
pub struct LinkedInScraper<L: SessionLauncher> {
    launcher: L,
    session: Option<L::Session>,
    settings: LinkedInSettings,
    credentials: Option<Credentials>,
}

impl<L: SessionLauncher> LinkedInScraper<L> {
    pub fn new(launcher: L, settings: LinkedInSettings) -> Self {
        Self {
            launcher,
            session: None,
            settings,
            credentials: None,
        }
    }

    pub fn with_credentials(mut self, credentials: Option<Credentials>) -> Self {
        self.credentials = credentials;
        self
    }

    /// True while a browser session is held.
    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    async fn run(&mut self, query: &str, location: &str) -> Result<Vec<JobRecord>, AppError> {
        if self.session.is_none() {
            tracing::info!("Launching browser session");
            self.session = Some(self.launcher.launch().await?);
        }
        let session = self
            .session
            .as_ref()
            .ok_or_else(|| AppError::BrowserError("Browser session unavailable".into()))?;
        let today = Local::now().date_naive();

        if let Some(credentials) = &self.credentials {
            if let Err(e) = login(session, &self.settings, credentials).await {
                tracing::warn!(error = %e, "Login failed, continuing without it");
            }
        }

        let search_url = build_search_url(&self.settings, query, location)?;
        tracing::info!(url = %search_url, "Opening search results");
        session.navigate(search_url.as_str()).await?;
        session
            .wait_for_element(
                &self.settings.selectors.results_container,
                self.settings.element_timeout(),
            )
            .await?;

        let scrolls = scroll_until_stable(
            session,
            self.settings.scroll_settle(),
            self.settings.max_scroll_rounds,
        )
        .await?;

        let cards = session
            .find_elements(&self.settings.selectors.result_card)
            .await?;
        tracing::info!(cards = cards.len(), scrolls, "Loaded search results");

        let mut records = Vec::with_capacity(cards.len());
        for (index, card) in cards.iter().enumerate() {
            match extract_card(session, &self.settings, card, today).await {
                Ok(record) => records.push(record),
                Err(e) => tracing::warn!(index, error = %e, "Skipping result card"),
            }
        }
        Ok(records)
    }

    /// Close the held session, if any, and forget it.
    async fn teardown(&mut self) {
        if let Some(session) = self.session.take() {
            if let Err(e) = session.close().await {
                tracing::warn!(error = %e, "Failed to close browser session");
            }
        }
    }
}

impl<L: SessionLauncher> JobSource for LinkedInScraper<L> {
    fn kind(&self) -> SourceKind {
        SourceKind::LinkedIn
    }

    async fn scrape(&mut self, query: &str, location: &str) -> Vec<JobRecord> {
        let result = self.run(query, location).await;
        self.teardown().await;

        match result {
            Ok(records) => records,
            Err(e) => {
                tracing::error!(error = %e, "LinkedIn scrape failed");
                Vec::new()
            }
        }
    }
}

/// Fill and submit the login form, then give the site time to redirect.
async fn login<S: BrowserSession>(
    session: &S,
    settings: &LinkedInSettings,
    credentials: &Credentials,
) -> Result<(), AppError> {
    let sel = &settings.selectors;
    tracing::info!(username = %credentials.username, "Logging in");

    session.navigate(&settings.login_url).await?;
    let username = session
        .wait_for_element(&sel.username_field, settings.element_timeout())
        .await?;
    session.type_text(&username, &credentials.username).await?;

    let password = session
        .wait_for_element(&sel.password_field, settings.element_timeout())
        .await?;
    session.type_text(&password, &credentials.password).await?;

    let submit = session
        .wait_for_element(&sel.login_submit, settings.element_timeout())
        .await?;
    session.click(&submit).await?;

    tokio::time::sleep(settings.login_settle()).await;
    Ok(())
}

/// Search URL for `query` near `location`, restricted to recent postings
/// and sorted newest first.
pub fn build_search_url(
    settings: &LinkedInSettings,
    query: &str,
    location: &str,
) -> Result<Url, AppError> {
    Url::parse_with_params(
        &settings.search_url,
        &[
            ("keywords", query),
            ("location", location),
            ("f_TPR", settings.posted_within.as_str()),
            ("sortBy", settings.sort_by.as_str()),
        ],
    )
    .map_err(|e| AppError::ConfigError(format!("Invalid LinkedIn search URL: {e}")))
}

/// Posting links carry tracking parameters; the path alone identifies it.
fn canonical_posting_url(href: &str) -> String {
    match Url::parse(href) {
        Ok(mut url) => {
            url.set_query(None);
            url.set_fragment(None);
            url.to_string()
        }
        Err(_) => href.trim().to_string(),
    }
}

async fn extract_card<S: BrowserSession>(
    session: &S,
    settings: &LinkedInSettings,
    card: &S::Element,
    today: NaiveDate,
) -> Result<JobRecord, AppError> {
    let sel = &settings.selectors;

    session.click(card).await?;
    tokio::time::sleep(settings.card_settle()).await;

    let title_el = session.find_within(card, &sel.card_title).await?;
    let title = session.read_text(&title_el).await?.trim().to_string();
    if title.is_empty() {
        return Err(AppError::ExtractionError("card has an empty title".into()));
    }

    let company_el = session.find_within(card, &sel.card_company).await?;
    let company = session.read_text(&company_el).await?.trim().to_string();

    let location_el = session.find_within(card, &sel.card_location).await?;
    let location = session.read_text(&location_el).await?.trim().to_string();

    let panel = session
        .wait_for_element(&sel.description_panel, settings.description_timeout())
        .await?;
    let description = session.read_text(&panel).await?.trim().to_string();

    let link = session.find_within(card, &sel.card_title_link).await?;
    let href = session
        .read_attribute(&link, "href")
        .await?
        .filter(|h| !h.trim().is_empty())
        .ok_or_else(|| AppError::ExtractionError(format!("'{title}' has no posting link")))?;

    let salary = match session.find_within(card, &sel.card_salary).await {
        Ok(el) => session.read_text(&el).await.ok(),
        Err(_) => None,
    };

    Ok(
        JobRecord::new(SourceKind::LinkedIn, title, canonical_posting_url(&href), today)
            .with_company(company)
            .with_location(location)
            .with_description(description)
            .with_salary(salary),
    )
}
