use std::path::PathBuf;
use std::time::Duration;

use chromiumoxide::{Browser, BrowserConfig, Element, Page};
use futures::StreamExt;
use jobscout_core::browser::{BrowserSession, SessionLauncher};
use jobscout_core::error::AppError;
use tokio::task::JoinHandle;

const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Launches Chromium sessions via the Chrome DevTools Protocol.
///
/// Requires a Chromium / Chrome binary reachable via `$PATH` (or the
/// default locations checked by `chromiumoxide`), or `CHROME_BIN`.
#[derive(Debug, Clone)]
pub struct ChromiumLauncher {
    headless: bool,
    user_agent: Option<String>,
    request_timeout: Duration,
}

impl ChromiumLauncher {
    pub fn new(headless: bool) -> Self {
        Self {
            headless,
            user_agent: None,
            request_timeout: Duration::from_secs(30),
        }
    }

    pub fn with_user_agent(mut self, user_agent: Option<String>) -> Self {
        self.user_agent = user_agent;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Tries to locate the real Chrome/Chromium binary.
    ///
    /// The snap wrapper at `/snap/bin/chromium` strips unknown CLI flags,
    /// breaking headless mode, so the binary inside the snap is tried first.
    /// `None` lets `chromiumoxide` do its own lookup.
    fn find_chrome_binary() -> Option<PathBuf> {
        let candidates: &[&str] = &[
            "/snap/chromium/current/usr/lib/chromium-browser/chrome",
            "/var/lib/flatpak/exports/bin/org.chromium.Chromium",
            "/usr/bin/google-chrome-stable",
            "/usr/bin/google-chrome",
            "/usr/bin/chromium",
            "/usr/bin/chromium-browser",
        ];

        if let Ok(p) = std::env::var("CHROME_BIN") {
            let path = PathBuf::from(&p);
            if path.exists() {
                return Some(path);
            }
        }

        candidates.iter().map(PathBuf::from).find(|p| p.exists())
    }

    fn config(&self) -> Result<BrowserConfig, AppError> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .disable_default_args()
            .request_timeout(self.request_timeout);

        if let Some(bin) = Self::find_chrome_binary() {
            tracing::info!("Using Chrome binary: {}", bin.display());
            builder = builder.chrome_executable(bin);
        }

        builder = if self.headless {
            builder.arg("--headless=new")
        } else {
            builder.with_head()
        };
        if let Some(ua) = &self.user_agent {
            builder = builder.arg(format!("--user-agent={ua}"));
        }

        builder
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions")
            .arg("--disable-popup-blocking")
            .arg("--disable-translate")
            .arg("--no-first-run")
            .build()
            .map_err(|e| AppError::BrowserError(format!("Browser config error: {e}")))
    }
}

impl SessionLauncher for ChromiumLauncher {
    type Session = ChromiumSession;

    async fn launch(&self) -> Result<ChromiumSession, AppError> {
        let (browser, mut handler) = Browser::launch(self.config()?)
            .await
            .map_err(|e| AppError::BrowserError(format!("Failed to launch browser: {e}")))?;

        // The CDP handler must be polled continuously for the connection to work.
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    tracing::warn!("Browser CDP handler error: {event:?}");
                    break;
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                handler.abort();
                return Err(AppError::BrowserError(format!("Failed to open tab: {e}")));
            }
        };

        Ok(ChromiumSession {
            browser,
            page,
            handler,
        })
    }
}

/// One Chromium process with a single tab.
pub struct ChromiumSession {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
}

fn driver_error(action: &str, e: impl std::fmt::Display) -> AppError {
    AppError::BrowserError(format!("{action}: {e}"))
}

impl BrowserSession for ChromiumSession {
    type Element = Element;

    async fn navigate(&self, url: &str) -> Result<(), AppError> {
        self.page
            .goto(url)
            .await
            .map_err(|e| driver_error(&format!("Failed to navigate to {url}"), e))?;
        Ok(())
    }

    async fn wait_for_element(&self, selector: &str, timeout: Duration) -> Result<Element, AppError> {
        let poll = async {
            loop {
                if let Ok(element) = self.page.find_element(selector).await {
                    return element;
                }
                tokio::time::sleep(POLL_INTERVAL).await;
            }
        };
        tokio::time::timeout(timeout, poll)
            .await
            .map_err(|_| AppError::Timeout(timeout.as_secs()))
    }

    async fn find_elements(&self, selector: &str) -> Result<Vec<Element>, AppError> {
        self.page
            .find_elements(selector)
            .await
            .map_err(|e| driver_error(&format!("Lookup of '{selector}' failed"), e))
    }

    async fn find_within(&self, parent: &Element, selector: &str) -> Result<Element, AppError> {
        parent
            .find_element(selector)
            .await
            .map_err(|e| driver_error(&format!("No element matches '{selector}'"), e))
    }

    async fn click(&self, element: &Element) -> Result<(), AppError> {
        element
            .click()
            .await
            .map_err(|e| driver_error("Click failed", e))?;
        Ok(())
    }

    async fn type_text(&self, element: &Element, text: &str) -> Result<(), AppError> {
        element
            .click()
            .await
            .map_err(|e| driver_error("Focus failed", e))?
            .type_str(text)
            .await
            .map_err(|e| driver_error("Typing failed", e))?;
        Ok(())
    }

    async fn read_text(&self, element: &Element) -> Result<String, AppError> {
        element
            .inner_text()
            .await
            .map(Option::unwrap_or_default)
            .map_err(|e| driver_error("Reading text failed", e))
    }

    async fn read_attribute(&self, element: &Element, name: &str) -> Result<Option<String>, AppError> {
        element
            .attribute(name)
            .await
            .map_err(|e| driver_error(&format!("Reading attribute '{name}' failed"), e))
    }

    async fn scroll_to_bottom(&self) -> Result<(), AppError> {
        self.page
            .evaluate("window.scrollTo(0, document.body.scrollHeight)")
            .await
            .map_err(|e| driver_error("Scroll failed", e))?;
        Ok(())
    }

    async fn page_height(&self) -> Result<u64, AppError> {
        self.page
            .evaluate("document.body.scrollHeight")
            .await
            .map_err(|e| driver_error("Reading page height failed", e))?
            .into_value::<u64>()
            .map_err(|e| driver_error("Page height is not a number", e))
    }

    async fn close(self) -> Result<(), AppError> {
        let ChromiumSession {
            mut browser,
            page,
            handler,
        } = self;

        let _ = page.close().await;
        let result = browser
            .close()
            .await
            .map(|_| ())
            .map_err(|e| driver_error("Failed to close browser", e));
        let _ = browser.wait().await;
        handler.abort();
        result
    }
}
