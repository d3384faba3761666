//! Exclusion filtering of aggregated records.
//!
//! A record is kept only if no configured [`RecordFilter`] excludes it.
//! New criteria are added as new predicates; sources and aggregation are
//! unaffected.

use serde::{Deserialize, Serialize};

use crate::models::JobRecord;

/// User-configured filter criteria. Every criterion is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterCriteria {
    /// Drop postings whose company equals this name exactly.
    pub blocked_company: Option<String>,
    /// Additional exact company names to drop.
    pub blocked_companies: Vec<String>,
    /// Drop postings whose title contains any of these (case-insensitive).
    pub blocked_title_keywords: Vec<String>,
    /// Drop postings without a published salary.
    pub require_salary: bool,
}

/// A single exclusion predicate.
pub trait RecordFilter: Send + Sync {
    /// Short label used in logs.
    fn name(&self) -> &'static str;

    fn excludes(&self, record: &JobRecord) -> bool;
}

/// Excludes records from one exact company name.
pub struct BlockedCompany(pub String);

impl RecordFilter for BlockedCompany {
    fn name(&self) -> &'static str {
        "blocked_company"
    }

    fn excludes(&self, record: &JobRecord) -> bool {
        record.company() == self.0
    }
}

/// Excludes records whose title mentions a keyword, ignoring case.
pub struct BlockedTitleKeyword {
    keyword: String,
}

impl BlockedTitleKeyword {
    pub fn new(keyword: &str) -> Self {
        Self {
            keyword: keyword.to_lowercase(),
        }
    }
}

impl RecordFilter for BlockedTitleKeyword {
    fn name(&self) -> &'static str {
        "blocked_title_keyword"
    }

    fn excludes(&self, record: &JobRecord) -> bool {
        record.title().to_lowercase().contains(&self.keyword)
    }
}

/// Excludes records that only carry the salary sentinel.
pub struct RequireSalary;

impl RecordFilter for RequireSalary {
    fn name(&self) -> &'static str {
        "require_salary"
    }

    fn excludes(&self, record: &JobRecord) -> bool {
        !record.has_salary()
    }
}

/// The set of active predicates, combined with OR: any match excludes.
#[derive(Default)]
pub struct FilterSet {
    filters: Vec<Box<dyn RecordFilter>>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_criteria(criteria: &FilterCriteria) -> Self {
        let mut set = Self::new();
        for company in criteria
            .blocked_company
            .iter()
            .chain(criteria.blocked_companies.iter())
        {
            set = set.with(BlockedCompany(company.clone()));
        }
        for keyword in criteria
            .blocked_title_keywords
            .iter()
            .filter(|k| !k.trim().is_empty())
        {
            set = set.with(BlockedTitleKeyword::new(keyword.trim()));
        }
        if criteria.require_salary {
            set = set.with(RequireSalary);
        }
        set
    }

    pub fn with(mut self, filter: impl RecordFilter + 'static) -> Self {
        self.filters.push(Box::new(filter));
        self
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Name of the first predicate that excludes `record`, if any.
    pub fn exclusion_reason(&self, record: &JobRecord) -> Option<&'static str> {
        self.filters
            .iter()
            .find(|f| f.excludes(record))
            .map(|f| f.name())
    }

    /// Keep the records no predicate excludes, preserving order.
    pub fn apply(&self, records: Vec<JobRecord>) -> Vec<JobRecord> {
        records
            .into_iter()
            .filter(|record| match self.exclusion_reason(record) {
                Some(reason) => {
                    tracing::debug!(
                        title = record.title(),
                        company = record.company(),
                        reason,
                        "Filtered out posting"
                    );
                    false
                }
                None => true,
            })
            .collect()
    }
}

/// Keep the records not excluded by `criteria`.
pub fn filter(records: Vec<JobRecord>, criteria: &FilterCriteria) -> Vec<JobRecord> {
    FilterSet::from_criteria(criteria).apply(records)
}
