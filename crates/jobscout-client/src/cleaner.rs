use std::sync::Arc;

use htmd::HtmlToMarkdown;
use jobscout_core::error::AppError;
use jobscout_core::traits::Cleaner;

/// HTML-to-Markdown cleaner using htmd.
///
/// Job-board descriptions arrive as HTML fragments; this turns them into
/// readable text for the record and the cover-letter prompt.
#[derive(Clone)]
pub struct HtmdCleaner {
    converter: Arc<HtmlToMarkdown>,
}

impl HtmdCleaner {
    pub fn new() -> Self {
        let converter = HtmlToMarkdown::builder()
            .skip_tags(vec!["script", "style", "noscript", "iframe", "svg", "img"])
            .build();

        Self {
            converter: Arc::new(converter),
        }
    }
}

impl Default for HtmdCleaner {
    fn default() -> Self {
        Self::new()
    }
}

impl Cleaner for HtmdCleaner {
    fn clean(&self, html: &str) -> Result<String, AppError> {
        self.converter
            .convert(html)
            .map(|md| md.trim().to_string())
            .map_err(|e| AppError::CleanerError(e.to_string()))
    }
}
