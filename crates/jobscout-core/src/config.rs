//! Run configuration, read from a JSON file.
//!
//! Every section has defaults, so a file only needs the keys it overrides.
//! Secrets (API key, site credentials) never live here; the CLI reads them
//! from the environment.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::AppError;
use crate::filter::FilterCriteria;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub search: SearchConfig,
    /// HTTP headers sent by the source adapters.
    pub headers: BTreeMap<String, String>,
    pub filters: FilterCriteria,
    pub sources: SourcesConfig,
    pub cover_letter: CoverLetterConfig,
}

impl Config {
    /// Read and validate a config file.
    pub fn from_file(path: &Path) -> Result<Self, AppError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            AppError::ConfigError(format!("Failed to read {}: {e}", path.display()))
        })?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, AppError> {
        let config: Config = serde_json::from_str(raw)
            .map_err(|e| AppError::ConfigError(format!("Invalid config JSON: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if !self.sources.justjoin.enabled && !self.sources.linkedin.enabled {
            return Err(AppError::ConfigError(
                "At least one source must be enabled".into(),
            ));
        }
        check_http_url("sources.justjoin.api_url", &self.sources.justjoin.api_url)?;
        check_http_url(
            "sources.justjoin.offer_base_url",
            &self.sources.justjoin.offer_base_url,
        )?;
        check_http_url("sources.linkedin.login_url", &self.sources.linkedin.login_url)?;
        check_http_url("sources.linkedin.search_url", &self.sources.linkedin.search_url)?;
        if self.sources.linkedin.page_load_timeout_secs == 0 {
            return Err(AppError::ConfigError(
                "sources.linkedin.page_load_timeout_secs must be at least 1".into(),
            ));
        }
        if self.sources.linkedin.max_scroll_rounds == 0 {
            return Err(AppError::ConfigError(
                "sources.linkedin.max_scroll_rounds must be at least 1".into(),
            ));
        }

        let letter = &self.cover_letter;
        check_http_url("cover_letter.base_url", &letter.base_url)?;
        if letter.model.trim().is_empty() {
            return Err(AppError::ConfigError("cover_letter.model must not be empty".into()));
        }
        if letter.max_tokens == 0 {
            return Err(AppError::ConfigError(
                "cover_letter.max_tokens must be at least 1".into(),
            ));
        }
        if !(0.0..=2.0).contains(&letter.temperature) {
            return Err(AppError::ConfigError(format!(
                "cover_letter.temperature {} is outside 0.0..=2.0",
                letter.temperature
            )));
        }
        Ok(())
    }

    /// Header value by name, ignoring ASCII case.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

fn check_http_url(field: &str, value: &str) -> Result<(), AppError> {
    let parsed = Url::parse(value)
        .map_err(|e| AppError::ConfigError(format!("{field} is not a valid URL '{value}': {e}")))?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => {
            return Err(AppError::ConfigError(format!(
                "{field} must be an http(s) URL, got scheme '{scheme}'"
            )));
        }
    }

    match parsed.host_str() {
        Some(host) if !host.is_empty() => Ok(()),
        _ => Err(AppError::ConfigError(format!("{field} has no host: '{value}'"))),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub query: String,
    /// Empty means no location constraint.
    pub location: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    pub justjoin: JustJoinSettings,
    pub linkedin: LinkedInSettings,
}

/// Settings for the JSON job-board adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JustJoinSettings {
    pub enabled: bool,
    /// Endpoint returning every current offer as one JSON array.
    pub api_url: String,
    /// Offer URLs are `{offer_base_url}/{id}`.
    pub offer_base_url: String,
    pub timeout_secs: u64,
    pub default_title: String,
    pub default_company: String,
    pub default_city: String,
    pub default_country_code: String,
}

impl Default for JustJoinSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            api_url: "https://justjoin.it/api/offers".into(),
            offer_base_url: "https://justjoin.it/offers".into(),
            timeout_secs: 30,
            default_title: "Data Engineer".into(),
            default_company: String::new(),
            default_city: "Poland".into(),
            default_country_code: "PL".into(),
        }
    }
}

impl JustJoinSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Settings for the browser-driven professional-network adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkedInSettings {
    pub enabled: bool,
    pub headless: bool,
    pub login_url: String,
    /// Search page; `keywords`, `location`, `f_TPR` and `sortBy` are appended.
    pub search_url: String,
    /// `f_TPR` value. `r86400` restricts to the last 24 hours.
    pub posted_within: String,
    /// `sortBy` value. `DD` sorts by date.
    pub sort_by: String,
    pub selectors: LinkedInSelectors,
    /// Upper bound on a single browser navigation or protocol request.
    pub page_load_timeout_secs: u64,
    pub element_timeout_secs: u64,
    pub description_timeout_secs: u64,
    pub login_settle_secs: u64,
    pub scroll_settle_millis: u64,
    pub card_settle_millis: u64,
    pub max_scroll_rounds: usize,
}

impl Default for LinkedInSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            headless: true,
            login_url: "https://www.linkedin.com/login".into(),
            search_url: "https://www.linkedin.com/jobs/search/".into(),
            posted_within: "r86400".into(),
            sort_by: "DD".into(),
            selectors: LinkedInSelectors::default(),
            page_load_timeout_secs: 30,
            element_timeout_secs: 10,
            description_timeout_secs: 5,
            login_settle_secs: 5,
            scroll_settle_millis: 2000,
            card_settle_millis: 1000,
            max_scroll_rounds: 50,
        }
    }
}

impl LinkedInSettings {
    pub fn page_load_timeout(&self) -> Duration {
        Duration::from_secs(self.page_load_timeout_secs)
    }

    pub fn element_timeout(&self) -> Duration {
        Duration::from_secs(self.element_timeout_secs)
    }

    pub fn description_timeout(&self) -> Duration {
        Duration::from_secs(self.description_timeout_secs)
    }

    pub fn login_settle(&self) -> Duration {
        Duration::from_secs(self.login_settle_secs)
    }

    pub fn scroll_settle(&self) -> Duration {
        Duration::from_millis(self.scroll_settle_millis)
    }

    pub fn card_settle(&self) -> Duration {
        Duration::from_millis(self.card_settle_millis)
    }

    /// Zero every pause and shorten every wait. Used by tests.
    pub fn without_delays(mut self) -> Self {
        self.element_timeout_secs = 0;
        self.description_timeout_secs = 0;
        self.login_settle_secs = 0;
        self.scroll_settle_millis = 0;
        self.card_settle_millis = 0;
        self
    }
}

/// CSS selectors for the search and login pages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkedInSelectors {
    pub username_field: String,
    pub password_field: String,
    pub login_submit: String,
    pub results_container: String,
    pub result_card: String,
    pub card_title: String,
    /// Anchor inside the card whose `href` is the posting URL.
    pub card_title_link: String,
    pub card_company: String,
    pub card_location: String,
    pub card_salary: String,
    /// Side panel filled in after a card is clicked.
    pub description_panel: String,
}

impl Default for LinkedInSelectors {
    fn default() -> Self {
        Self {
            username_field: "#username".into(),
            password_field: "#password".into(),
            login_submit: "button[type='submit']".into(),
            results_container: ".jobs-search__results-list".into(),
            result_card: ".jobs-search__results-list > li".into(),
            card_title: ".base-search-card__title".into(),
            card_title_link: "a.base-card__full-link".into(),
            card_company: ".base-search-card__subtitle".into(),
            card_location: ".job-search-card__location".into(),
            card_salary: ".job-search-card__salary-info".into(),
            description_panel: ".show-more-less-html__markup".into(),
        }
    }
}

/// Settings for the cover-letter step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoverLetterConfig {
    pub enabled: bool,
    pub model: String,
    /// OpenAI-compatible API base URL.
    pub base_url: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout_secs: u64,
    /// Descriptions longer than this are cut before prompting.
    pub max_description_chars: usize,
    pub system_prompt: Option<String>,
    pub applicant: Option<ApplicantProfile>,
}

impl Default for CoverLetterConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            model: "gpt-4o-mini".into(),
            base_url: "https://api.openai.com/v1".into(),
            max_tokens: 500,
            temperature: 0.7,
            timeout_secs: 120,
            max_description_chars: 6000,
            system_prompt: None,
            applicant: None,
        }
    }
}

impl CoverLetterConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Who the letters are written for.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicantProfile {
    pub name: String,
    /// Free-form background: skills, experience, what you are looking for.
    pub summary: String,
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_empty_object_yields_defaults() {
        let config = Config::from_json("{}").unwrap();
        assert_eq!(config, Config::default());
        assert!(config.sources.justjoin.enabled);
        assert_eq!(config.sources.linkedin.posted_within, "r86400");
        assert_eq!(config.sources.linkedin.sort_by, "DD");
        assert_eq!(config.cover_letter.max_tokens, 500);
        assert_eq!(
            config.sources.linkedin.page_load_timeout(),
            Duration::from_secs(30)
        );
        assert!(config.filters.blocked_company.is_none());
    }

    #[test]
    fn test_partial_override() {
        let config = Config::from_json(
            r#"{
                "search": {"query": "rust", "location": "Warsaw"},
                "headers": {"User-Agent": "jobscout/0.1"},
                "filters": {"blocked_company": "Acme Corp"},
                "sources": {"linkedin": {"enabled": false, "selectors": {"result_card": "li.card"}}}
            }"#,
        )
        .unwrap();

        assert_eq!(config.search.query, "rust");
        assert_eq!(config.filters.blocked_company.as_deref(), Some("Acme Corp"));
        assert!(!config.sources.linkedin.enabled);
        assert_eq!(config.sources.linkedin.selectors.result_card, "li.card");
        assert_eq!(config.sources.linkedin.selectors.username_field, "#username");
        assert_eq!(config.header("user-agent"), Some("jobscout/0.1"));
    }

    #[test]
    fn test_rejects_all_sources_disabled() {
        let err = Config::from_json(
            r#"{"sources": {"justjoin": {"enabled": false}, "linkedin": {"enabled": false}}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, AppError::ConfigError(_)));
        assert!(err.to_string().contains("At least one source"));
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(Config::from_json(r#"{"cover_letter": {"temperature": 3.5}}"#).is_err());
        assert!(Config::from_json(r#"{"cover_letter": {"max_tokens": 0}}"#).is_err());
        assert!(Config::from_json(r#"{"sources": {"justjoin": {"api_url": "ftp://x"}}}"#).is_err());
        assert!(Config::from_json(r#"{"cover_letter": {"base_url": "localhost:8080"}}"#).is_err());
        assert!(
            Config::from_json(r#"{"sources": {"linkedin": {"max_scroll_rounds": 0}}}"#).is_err()
        );
        assert!(
            Config::from_json(r#"{"sources": {"linkedin": {"page_load_timeout_secs": 0}}}"#)
                .is_err()
        );
        assert!(Config::from_json("not json").is_err());
    }

    #[test]
    fn test_rejects_url_without_host() {
        for field in [
            r#"{"sources": {"linkedin": {"search_url": "https://"}}}"#,
            r#"{"sources": {"linkedin": {"login_url": "http://"}}}"#,
            r#"{"sources": {"justjoin": {"offer_base_url": "https://"}}}"#,
            r#"{"cover_letter": {"base_url": "http://"}}"#,
        ] {
            let err = Config::from_json(field).unwrap_err();
            assert!(matches!(err, AppError::ConfigError(_)), "{field}: {err}");
        }
    }

    #[test]
    fn test_accepts_url_with_port_and_path() {
        let config = Config::from_json(
            r#"{"cover_letter": {"base_url": "http://localhost:11434/v1"}}"#,
        )
        .unwrap();
        assert_eq!(config.cover_letter.base_url, "http://localhost:11434/v1");
    }

    #[test]
    fn test_justjoin_placeholder_defaults() {
        let settings = JustJoinSettings::default();
        assert_eq!(settings.default_title, "Data Engineer");
        assert_eq!(settings.default_company, "");
        assert_eq!(settings.default_city, "Poland");
        assert_eq!(settings.default_country_code, "PL");
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"search": {{"query": "engineer"}}}}"#).unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.search.query, "engineer");
        assert_eq!(config.search.location, "");
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let err = Config::from_file(Path::new("/nonexistent/jobscout.json")).unwrap_err();
        assert!(matches!(err, AppError::ConfigError(_)));
    }
}
