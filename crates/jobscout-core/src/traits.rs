use std::future::Future;

use crate::error::AppError;
use crate::models::{JobRecord, SourceKind};

/// Fetches a raw response body from a URL.
pub trait Fetcher: Send + Sync + Clone {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<String, AppError>> + Send;
}

/// Converts raw HTML into clean Markdown text.
pub trait Cleaner: Send + Sync + Clone {
    fn clean(&self, html: &str) -> Result<String, AppError>;
}

/// A job source that normalizes its postings into [`JobRecord`]s.
///
/// `scrape` never fails: transport problems yield an empty list and
/// malformed postings are skipped. Both are logged by the implementation.
pub trait JobSource: Send {
    fn kind(&self) -> SourceKind;

    fn scrape(
        &mut self,
        query: &str,
        location: &str,
    ) -> impl Future<Output = Vec<JobRecord>> + Send;
}

/// Writes a cover letter for a single posting using a text-generation service.
pub trait LetterWriter: Send + Sync {
    fn write_letter(
        &self,
        record: &JobRecord,
    ) -> impl Future<Output = Result<String, AppError>> + Send;
}
