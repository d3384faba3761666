//! JustJoin.it adapter: one bulk JSON listing, filtered client-side.

use std::collections::BTreeMap;

use chrono::{Local, NaiveDate};
use jobscout_core::config::JustJoinSettings;
use jobscout_core::error::AppError;
use jobscout_core::models::{JobRecord, SALARY_NOT_SPECIFIED, SourceKind};
use jobscout_core::traits::{Cleaner, Fetcher, JobSource};
use serde::Deserialize;
use serde_json::Value;

use crate::cleaner::HtmdCleaner;
use crate::fetcher::ReqwestFetcher;

/// One offer as published by the board. Only `id` is mandatory.
#[derive(Debug, Deserialize)]
struct Offer {
    id: IdValue,
    title: Option<String>,
    body: Option<String>,
    company_name: Option<String>,
    city: Option<String>,
    country_code: Option<String>,
    salary: Option<Value>,
}

/// Offer ids are slugs on the current API and integers on older dumps.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum IdValue {
    Text(String),
    Number(u64),
}

impl IdValue {
    fn into_string(self) -> Result<String, AppError> {
        let id = match self {
            IdValue::Text(s) => s.trim().to_string(),
            IdValue::Number(n) => n.to_string(),
        };
        if id.is_empty() {
            return Err(AppError::ExtractionError("offer has an empty id".into()));
        }
        Ok(id)
    }
}

/// Format an optional `{from, to, currency}` salary object.
///
/// Anything missing or unreadable renders as [`SALARY_NOT_SPECIFIED`].
pub fn format_salary(salary: Option<&Value>) -> String {
    let Some(Value::Object(salary)) = salary else {
        return SALARY_NOT_SPECIFIED.to_string();
    };
    let from = salary.get("from").and_then(amount);
    let to = salary.get("to").and_then(amount);
    let currency = salary
        .get("currency")
        .and_then(Value::as_str)
        .map(str::trim)
        .unwrap_or_default();

    let text = match (from, to) {
        (Some(from), Some(to)) => format!("{from}-{to} {currency}"),
        (Some(from), None) => format!("From {from} {currency}"),
        (None, Some(to)) => format!("Up to {to} {currency}"),
        (None, None) => return SALARY_NOT_SPECIFIED.to_string(),
    };
    text.trim_end().to_string()
}

/// Render a salary bound. Integral numbers drop their fraction.
fn amount(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => Some(i.to_string()),
            (None, Some(f)) if f.fract() == 0.0 => Some(format!("{f:.0}")),
            (None, Some(f)) => Some(f.to_string()),
            (None, None) => None,
        },
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    }
}

fn contains_ignore_case(haystack: &str, needle_lower: &str) -> bool {
    haystack.to_lowercase().contains(needle_lower)
}

/// Job-board adapter backed by a single unauthenticated JSON endpoint.
///
/// The endpoint takes no search parameters; every offer is downloaded and
/// matched locally against the query and location.
pub struct JustJoinScraper<F: Fetcher = ReqwestFetcher, C: Cleaner = HtmdCleaner> {
    fetcher: F,
    cleaner: C,
    settings: JustJoinSettings,
}

impl JustJoinScraper {
    /// Build a scraper with an HTTP client carrying `headers`.
    pub fn from_settings(
        settings: JustJoinSettings,
        headers: &BTreeMap<String, String>,
    ) -> Result<Self, AppError> {
        let fetcher = ReqwestFetcher::with_headers(headers, settings.timeout())?;
        Ok(Self::new(fetcher, HtmdCleaner::new(), settings))
    }
}

impl<F: Fetcher, C: Cleaner> JustJoinScraper<F, C> {
    pub fn new(fetcher: F, cleaner: C, settings: JustJoinSettings) -> Self {
        Self {
            fetcher,
            cleaner,
            settings,
        }
    }

    async fn fetch_offers(&self) -> Result<Vec<Value>, AppError> {
        let body = self.fetcher.fetch(&self.settings.api_url).await?;
        let offers: Vec<Value> = serde_json::from_str(&body)?;
        Ok(offers)
    }

    /// Match and normalize raw offers. Offers that fail to decode are
    /// logged and skipped.
    pub fn records_from_offers(
        &self,
        offers: Vec<Value>,
        query: &str,
        location: &str,
        today: NaiveDate,
    ) -> Vec<JobRecord> {
        let query = query.to_lowercase();
        let location = location.trim().to_lowercase();
        let mut records = Vec::new();

        for (index, raw) in offers.into_iter().enumerate() {
            let offer: Offer = match serde_json::from_value(raw) {
                Ok(offer) => offer,
                Err(e) => {
                    tracing::warn!(index, error = %e, "Skipping malformed offer");
                    continue;
                }
            };

            if !self.matches(&offer, &query, &location) {
                continue;
            }

            match self.to_record(offer, today) {
                Ok(record) => records.push(record),
                Err(e) => tracing::warn!(index, error = %e, "Skipping offer"),
            }
        }

        records
    }

    fn matches(&self, offer: &Offer, query: &str, location: &str) -> bool {
        let title = offer
            .title
            .as_deref()
            .unwrap_or(&self.settings.default_title);
        let in_title = contains_ignore_case(title, query);
        let in_body = offer
            .body
            .as_deref()
            .is_some_and(|b| contains_ignore_case(b, query));
        if !(in_title || in_body) {
            return false;
        }

        location.is_empty()
            || offer
                .city
                .as_deref()
                .is_some_and(|c| contains_ignore_case(c, location))
    }

    fn to_record(&self, offer: Offer, today: NaiveDate) -> Result<JobRecord, AppError> {
        let s = &self.settings;
        let id = offer.id.into_string()?;
        let url = format!("{}/{}", s.offer_base_url.trim_end_matches('/'), id);

        let description = match offer.body.as_deref() {
            Some(html) => self.cleaner.clean(html)?,
            None => String::new(),
        };
        let location = format!(
            "{}, {}",
            offer.city.as_deref().unwrap_or(&s.default_city),
            offer
                .country_code
                .as_deref()
                .unwrap_or(&s.default_country_code)
        );

        Ok(JobRecord::new(
            SourceKind::JustJoin,
            offer.title.unwrap_or_else(|| s.default_title.clone()),
            url,
            today,
        )
        .with_company(
            offer
                .company_name
                .unwrap_or_else(|| s.default_company.clone()),
        )
        .with_location(location)
        .with_description(description)
        .with_salary(Some(format_salary(offer.salary.as_ref()))))
    }
}

impl<F: Fetcher, C: Cleaner> JobSource for JustJoinScraper<F, C> {
    fn kind(&self) -> SourceKind {
        SourceKind::JustJoin
    }

    async fn scrape(&mut self, query: &str, location: &str) -> Vec<JobRecord> {
        let today = Local::now().date_naive();

        let offers = match self.fetch_offers().await {
            Ok(offers) => offers,
            Err(e) => {
                tracing::error!(
                    url = %self.settings.api_url,
                    transport = e.is_transport(),
                    error = %e,
                    "Failed to fetch job board listing"
                );
                return Vec::new();
            }
        };

        tracing::info!(offers = offers.len(), "Fetched job board listing");
        self.records_from_offers(offers, query, location, today)
    }
}
