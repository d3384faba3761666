pub mod cleaner;
pub mod fetcher;
pub mod justjoin;
pub mod linkedin;
pub mod llm;
pub mod source;

#[cfg(feature = "browser")]
pub mod chromium;

#[cfg(feature = "browser")]
pub use chromium::{ChromiumLauncher, ChromiumSession};
pub use cleaner::HtmdCleaner;
pub use fetcher::ReqwestFetcher;
pub use justjoin::{JustJoinScraper, format_salary};
pub use linkedin::{Credentials, LinkedInScraper};
pub use llm::OpenAiLetterWriter;
pub use source::Source;
