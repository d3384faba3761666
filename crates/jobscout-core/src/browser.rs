//! The narrow set of browser actions a scraper is allowed to drive, plus the
//! scroll-until-stable loop built on top of them.
//!
//! Keeping the driver behind [`BrowserSession`] lets the scraping logic run
//! against a scripted fake in tests and against Chromium in production.

use std::future::Future;
use std::time::Duration;

use crate::error::AppError;

/// One live, driver-controlled browser tab.
pub trait BrowserSession: Send + Sync {
    /// Handle to an element on the current page.
    type Element: Send + Sync;

    fn navigate(&self, url: &str) -> impl Future<Output = Result<(), AppError>> + Send;

    /// Wait until `selector` matches an element, or fail with
    /// [`AppError::Timeout`] once `timeout` has elapsed.
    fn wait_for_element(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> impl Future<Output = Result<Self::Element, AppError>> + Send;

    fn find_elements(
        &self,
        selector: &str,
    ) -> impl Future<Output = Result<Vec<Self::Element>, AppError>> + Send;

    /// Find the first descendant of `parent` matching `selector`.
    fn find_within(
        &self,
        parent: &Self::Element,
        selector: &str,
    ) -> impl Future<Output = Result<Self::Element, AppError>> + Send;

    fn click(&self, element: &Self::Element) -> impl Future<Output = Result<(), AppError>> + Send;

    fn type_text(
        &self,
        element: &Self::Element,
        text: &str,
    ) -> impl Future<Output = Result<(), AppError>> + Send;

    fn read_text(
        &self,
        element: &Self::Element,
    ) -> impl Future<Output = Result<String, AppError>> + Send;

    fn read_attribute(
        &self,
        element: &Self::Element,
        name: &str,
    ) -> impl Future<Output = Result<Option<String>, AppError>> + Send;

    fn scroll_to_bottom(&self) -> impl Future<Output = Result<(), AppError>> + Send;

    fn page_height(&self) -> impl Future<Output = Result<u64, AppError>> + Send;

    /// Release the session and everything it owns.
    fn close(self) -> impl Future<Output = Result<(), AppError>> + Send;
}

/// Starts new browser sessions.
pub trait SessionLauncher: Send + Sync {
    type Session: BrowserSession;

    fn launch(&self) -> impl Future<Output = Result<Self::Session, AppError>> + Send;
}

/// Scroll to the bottom until the page height stops growing.
///
/// Each round reads the height, scrolls, waits `settle` and reads the height
/// again. The loop ends on the first round where the height did not increase,
/// or after `max_rounds` scrolls. Returns the number of scroll actions taken.
pub async fn scroll_until_stable<S: BrowserSession>(
    session: &S,
    settle: Duration,
    max_rounds: usize,
) -> Result<usize, AppError> {
    let mut height = session.page_height().await?;
    let mut scrolls = 0;

    while scrolls < max_rounds {
        session.scroll_to_bottom().await?;
        scrolls += 1;
        tokio::time::sleep(settle).await;

        let new_height = session.page_height().await?;
        tracing::debug!(scrolls, height, new_height, "Scrolled results page");
        if new_height <= height {
            return Ok(scrolls);
        }
        height = new_height;
    }

    tracing::warn!(max_rounds, "Scroll limit reached before page height settled");
    Ok(scrolls)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::MockSession;

    #[tokio::test]
    async fn test_scroll_stops_when_height_settles() {
        let session = MockSession::new().with_heights(vec![100, 200, 200]);
        let scrolls = scroll_until_stable(&session, Duration::ZERO, 50)
            .await
            .unwrap();
        assert_eq!(scrolls, 2);
        assert_eq!(session.scroll_count(), 2);
    }

    #[tokio::test]
    async fn test_scroll_once_when_page_is_static() {
        let session = MockSession::new().with_heights(vec![300, 300]);
        let scrolls = scroll_until_stable(&session, Duration::ZERO, 50)
            .await
            .unwrap();
        assert_eq!(scrolls, 1);
    }

    #[tokio::test]
    async fn test_scroll_treats_shrinking_page_as_settled() {
        let session = MockSession::new().with_heights(vec![500, 400]);
        let scrolls = scroll_until_stable(&session, Duration::ZERO, 50)
            .await
            .unwrap();
        assert_eq!(scrolls, 1);
    }

    #[tokio::test]
    async fn test_scroll_respects_round_limit() {
        let session = MockSession::new().with_heights((1..=100).map(|h| h * 100).collect());
        let scrolls = scroll_until_stable(&session, Duration::ZERO, 5)
            .await
            .unwrap();
        assert_eq!(scrolls, 5);
        assert_eq!(session.scroll_count(), 5);
    }

    #[tokio::test]
    async fn test_scroll_propagates_driver_error() {
        let session = MockSession::new().failing_height();
        let err = scroll_until_stable(&session, Duration::ZERO, 5)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BrowserError(_)));
    }
}
