pub mod browser;
pub mod config;
pub mod error;
pub mod filter;
pub mod models;
pub mod pipeline;
pub mod testutil;
pub mod traits;

pub use config::Config;
pub use error::AppError;
pub use filter::{FilterCriteria, FilterSet, filter};
pub use models::{Application, JobRecord, SALARY_NOT_SPECIFIED, SourceKind};
pub use pipeline::{Pipeline, RunReport, generate};
pub use traits::{Cleaner, Fetcher, JobSource, LetterWriter};
