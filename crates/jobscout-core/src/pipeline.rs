use crate::filter::FilterSet;
use crate::models::{Application, JobRecord, SourceKind};
use crate::traits::{JobSource, LetterWriter};

/// Turns a record into a cover letter, or `None` on any failure.
///
/// Failures are logged and never propagated, so one bad response from the
/// completion service does not halt the batch.
pub async fn generate<W: LetterWriter>(writer: &W, record: &JobRecord) -> Option<String> {
    match writer.write_letter(record).await {
        Ok(letter) => Some(letter),
        Err(e) => {
            tracing::error!(
                title = record.title(),
                company = record.company(),
                url = record.url(),
                error = %e,
                "Cover letter generation failed"
            );
            None
        }
    }
}

/// Per-source record count for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceCount {
    pub source: SourceKind,
    pub records: usize,
}

/// Outcome of one run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub scraped: Vec<SourceCount>,
    pub filtered_out: usize,
    pub applications: Vec<Application>,
}

impl RunReport {
    pub fn total_scraped(&self) -> usize {
        self.scraped.iter().map(|s| s.records).sum()
    }

    pub fn letters_written(&self) -> usize {
        self.applications
            .iter()
            .filter(|a| a.cover_letter.is_some())
            .count()
    }
}

/// Orchestrates one run: scrape → aggregate → filter → generate.
///
/// Sources run one after another, in the order given. Letter generation is
/// optional; without a writer every application carries `None`.
pub struct Pipeline<W: LetterWriter> {
    filters: FilterSet,
    writer: Option<W>,
}

impl<W: LetterWriter> Pipeline<W> {
    /// Create a pipeline that only scrapes and filters.
    pub fn new(filters: FilterSet) -> Self {
        Self {
            filters,
            writer: None,
        }
    }

    /// Create a pipeline that also writes a cover letter per kept record.
    pub fn with_writer(filters: FilterSet, writer: W) -> Self {
        Self {
            filters,
            writer: Some(writer),
        }
    }

    /// Concatenate the records of every source, in source order.
    pub async fn aggregate<S: JobSource>(
        sources: &mut [S],
        query: &str,
        location: &str,
    ) -> (Vec<JobRecord>, Vec<SourceCount>) {
        let mut records = Vec::new();
        let mut counts = Vec::with_capacity(sources.len());

        for source in sources.iter_mut() {
            let kind = source.kind();
            tracing::info!(source = %kind, query, location, "Scraping source");
            let batch = source.scrape(query, location).await;
            tracing::info!(source = %kind, count = batch.len(), "Source finished");
            counts.push(SourceCount {
                source: kind,
                records: batch.len(),
            });
            records.extend(batch);
        }

        (records, counts)
    }

    pub async fn run<S: JobSource>(
        &self,
        sources: &mut [S],
        query: &str,
        location: &str,
    ) -> RunReport {
        let (records, scraped) = Self::aggregate(sources, query, location).await;
        let total = records.len();

        let kept = self.filters.apply(records);
        let filtered_out = total - kept.len();
        tracing::info!(total, kept = kept.len(), filtered_out, "Filtered postings");

        let mut applications = Vec::with_capacity(kept.len());
        for record in kept {
            let cover_letter = match &self.writer {
                Some(writer) => {
                    tracing::info!(
                        title = record.title(),
                        company = record.company(),
                        "Writing cover letter"
                    );
                    generate(writer, &record).await
                }
                None => None,
            };
            applications.push(Application {
                record,
                cover_letter,
            });
        }

        RunReport {
            scraped,
            filtered_out,
            applications,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{FilterCriteria, FilterSet};
    use crate::testutil::*;

    fn blocking(company: &str) -> FilterSet {
        FilterSet::from_criteria(&FilterCriteria {
            blocked_company: Some(company.into()),
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn test_generate_returns_letter() {
        let record = make_test_record(SourceKind::JustJoin, "Rust Dev", "Other Inc");
        let letter = generate(&MockLetterWriter::new(), &record).await;
        assert_eq!(letter.as_deref(), Some("Dear Other Inc, about Rust Dev"));
    }

    #[tokio::test]
    async fn test_generate_failure_yields_none() {
        let record = make_test_record(SourceKind::JustJoin, "Rust Dev", "Flaky Ltd");
        let writer = MockLetterWriter::new().failing_for("Flaky Ltd");
        assert!(generate(&writer, &record).await.is_none());
    }

    #[tokio::test]
    async fn test_run_aggregates_in_source_order_and_filters() {
        let mut sources = vec![
            MockSource::new(
                SourceKind::JustJoin,
                vec![
                    make_test_record(SourceKind::JustJoin, "Data Engineer", "Acme Corp"),
                    make_test_record(SourceKind::JustJoin, "Rust Engineer", "Other Inc"),
                ],
            ),
            MockSource::new(
                SourceKind::LinkedIn,
                vec![make_test_record(SourceKind::LinkedIn, "Platform Engineer", "Initech")],
            ),
        ];
        let queries = sources[1].queries.clone();

        let pipeline = Pipeline::with_writer(blocking("Acme Corp"), MockLetterWriter::new());
        let report = pipeline.run(&mut sources, "engineer", "Warsaw").await;

        assert_eq!(report.total_scraped(), 3);
        assert_eq!(
            report.scraped,
            vec![
                SourceCount {
                    source: SourceKind::JustJoin,
                    records: 2
                },
                SourceCount {
                    source: SourceKind::LinkedIn,
                    records: 1
                },
            ]
        );
        assert_eq!(report.filtered_out, 1);
        let companies: Vec<_> = report
            .applications
            .iter()
            .map(|a| a.record.company())
            .collect();
        assert_eq!(companies, vec!["Other Inc", "Initech"]);
        assert_eq!(report.letters_written(), 2);
        assert_eq!(
            queries.lock().unwrap().as_slice(),
            &[("engineer".to_string(), "Warsaw".to_string())]
        );
    }

    #[tokio::test]
    async fn test_run_continues_past_failed_letter() {
        let mut sources = vec![MockSource::new(
            SourceKind::JustJoin,
            vec![
                make_test_record(SourceKind::JustJoin, "A", "Flaky Ltd"),
                make_test_record(SourceKind::JustJoin, "B", "Other Inc"),
            ],
        )];
        let writer = MockLetterWriter::new().failing_for("Flaky Ltd");
        let written = writer.written_for.clone();

        let report = Pipeline::with_writer(FilterSet::new(), writer)
            .run(&mut sources, "", "")
            .await;

        assert_eq!(report.applications.len(), 2);
        assert!(report.applications[0].cover_letter.is_none());
        assert!(report.applications[1].cover_letter.is_some());
        assert_eq!(written.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_run_without_writer_skips_generation() {
        let mut sources = vec![MockSource::new(
            SourceKind::LinkedIn,
            vec![make_test_record(SourceKind::LinkedIn, "A", "Other Inc")],
        )];

        let report = Pipeline::<MockLetterWriter>::new(FilterSet::new())
            .run(&mut sources, "a", "")
            .await;

        assert_eq!(report.applications.len(), 1);
        assert_eq!(report.letters_written(), 0);
    }

    #[tokio::test]
    async fn test_run_with_empty_sources() {
        let mut sources: Vec<MockSource> = vec![MockSource::new(SourceKind::JustJoin, vec![])];
        let report = Pipeline::<MockLetterWriter>::new(blocking("Acme Corp"))
            .run(&mut sources, "rust", "")
            .await;
        assert_eq!(report.total_scraped(), 0);
        assert!(report.applications.is_empty());
    }
}
