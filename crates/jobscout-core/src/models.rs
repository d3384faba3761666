use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

/// Rendered in place of a salary whenever the source does not publish one.
pub const SALARY_NOT_SPECIFIED: &str = "Not specified";

/// Which adapter produced a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SourceKind {
    #[serde(rename = "JustJoin.it")]
    JustJoin,
    #[serde(rename = "LinkedIn")]
    LinkedIn,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::JustJoin => "JustJoin.it",
            SourceKind::LinkedIn => "LinkedIn",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One normalized job posting.
///
/// Records are only built inside a source adapter and are read-only
/// afterwards: every field is private and exposed through an accessor.
/// `(source, url)` identifies a posting, but nothing enforces uniqueness.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobRecord {
    title: String,
    company: String,
    location: String,
    description: String,
    salary: String,
    url: String,
    source: SourceKind,
    date_found: NaiveDate,
}

impl JobRecord {
    /// Start a record with its required fields. Everything else starts
    /// empty, and the salary starts as [`SALARY_NOT_SPECIFIED`].
    pub fn new(
        source: SourceKind,
        title: impl Into<String>,
        url: impl Into<String>,
        date_found: NaiveDate,
    ) -> Self {
        Self {
            title: title.into(),
            company: String::new(),
            location: String::new(),
            description: String::new(),
            salary: SALARY_NOT_SPECIFIED.to_string(),
            url: url.into(),
            source,
            date_found,
        }
    }

    pub fn with_company(mut self, company: impl Into<String>) -> Self {
        self.company = company.into();
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the salary text. `None` or blank text keeps the sentinel.
    pub fn with_salary(mut self, salary: Option<String>) -> Self {
        self.salary = match salary {
            Some(s) if !s.trim().is_empty() => s.trim().to_string(),
            _ => SALARY_NOT_SPECIFIED.to_string(),
        };
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn company(&self) -> &str {
        &self.company
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn salary(&self) -> &str {
        &self.salary
    }

    pub fn has_salary(&self) -> bool {
        self.salary != SALARY_NOT_SPECIFIED
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn source(&self) -> SourceKind {
        self.source
    }

    pub fn date_found(&self) -> NaiveDate {
        self.date_found
    }

    /// Natural identity of a posting.
    pub fn identity(&self) -> (SourceKind, &str) {
        (self.source, &self.url)
    }
}

/// A record that survived filtering, paired with its generated cover letter.
///
/// `cover_letter` is `None` when generation failed or was skipped.
#[derive(Debug, Clone, Serialize)]
pub struct Application {
    pub record: JobRecord,
    pub cover_letter: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 15).unwrap()
    }

    #[test]
    fn test_new_record_defaults() {
        let r = JobRecord::new(SourceKind::LinkedIn, "Rust Engineer", "https://x/1", today());
        assert_eq!(r.title(), "Rust Engineer");
        assert_eq!(r.company(), "");
        assert_eq!(r.salary(), SALARY_NOT_SPECIFIED);
        assert!(!r.has_salary());
        assert_eq!(r.date_found(), today());
    }

    #[test]
    fn test_blank_salary_keeps_sentinel() {
        let r = JobRecord::new(SourceKind::JustJoin, "t", "u", today())
            .with_salary(Some("   ".into()));
        assert_eq!(r.salary(), SALARY_NOT_SPECIFIED);

        let r = r.with_salary(Some(" 10000-15000 PLN ".into()));
        assert_eq!(r.salary(), "10000-15000 PLN");
        assert!(r.has_salary());
    }

    #[test]
    fn test_identity_is_source_and_url() {
        let a = JobRecord::new(SourceKind::JustJoin, "a", "https://x/1", today());
        let b = JobRecord::new(SourceKind::JustJoin, "b", "https://x/1", today());
        let c = JobRecord::new(SourceKind::LinkedIn, "a", "https://x/1", today());
        assert_eq!(a.identity(), b.identity());
        assert_ne!(a.identity(), c.identity());
    }

    #[test]
    fn test_source_kind_serializes_as_display_name() {
        let json = serde_json::to_string(&SourceKind::JustJoin).unwrap();
        assert_eq!(json, "\"JustJoin.it\"");
        assert_eq!(SourceKind::LinkedIn.to_string(), "LinkedIn");
    }
}
