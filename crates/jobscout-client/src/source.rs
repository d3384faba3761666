use jobscout_core::browser::SessionLauncher;
use jobscout_core::models::{JobRecord, SourceKind};
use jobscout_core::traits::JobSource;

use crate::justjoin::JustJoinScraper;
use crate::linkedin::LinkedInScraper;

/// Any of the supported sources, so a run can hold them in one list.
pub enum Source<L: SessionLauncher> {
    JustJoin(JustJoinScraper),
    LinkedIn(LinkedInScraper<L>),
}

impl<L: SessionLauncher> JobSource for Source<L> {
    fn kind(&self) -> SourceKind {
        match self {
            Source::JustJoin(s) => s.kind(),
            Source::LinkedIn(s) => s.kind(),
        }
    }

    async fn scrape(&mut self, query: &str, location: &str) -> Vec<JobRecord> {
        match self {
            Source::JustJoin(s) => s.scrape(query, location).await,
            Source::LinkedIn(s) => s.scrape(query, location).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use jobscout_core::config::{JustJoinSettings, LinkedInSettings};
    use jobscout_core::testutil::MockLauncher;

    use super::*;

    #[tokio::test]
    async fn test_dispatches_to_wrapped_source() {
        let launcher = MockLauncher::failing();
        let mut sources: Vec<Source<MockLauncher>> = vec![
            Source::JustJoin(
                JustJoinScraper::from_settings(
                    JustJoinSettings {
                        api_url: "http://127.0.0.1:1/offers".into(),
                        ..Default::default()
                    },
                    &Default::default(),
                )
                .unwrap(),
            ),
            Source::LinkedIn(LinkedInScraper::new(
                launcher.clone(),
                LinkedInSettings::default().without_delays(),
            )),
        ];

        assert_eq!(sources[0].kind(), SourceKind::JustJoin);
        assert_eq!(sources[1].kind(), SourceKind::LinkedIn);
        for source in sources.iter_mut() {
            assert!(source.scrape("rust", "").await.is_empty());
        }
        assert_eq!(launcher.launch_count(), 1);
    }
}
