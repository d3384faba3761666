/// Smoke-test for `LinkedInScraper` against a real headless Chromium.
///
/// Searches the public (logged-out) LinkedIn job search and prints what
/// came back. Set `LINKEDIN_USERNAME` / `LINKEDIN_PASSWORD` to exercise the
/// login step too.
///
/// Run with:
///   cargo run --example linkedin_smoke --features browser -- "rust developer" "Warsaw"
use jobscout_client::{ChromiumLauncher, Credentials, LinkedInScraper};
use jobscout_core::config::LinkedInSettings;
use jobscout_core::traits::JobSource;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let mut args = std::env::args().skip(1);
    let query = args.next().unwrap_or_else(|| "rust developer".to_string());
    let location = args.next().unwrap_or_default();

    let credentials = match (
        std::env::var("LINKEDIN_USERNAME"),
        std::env::var("LINKEDIN_PASSWORD"),
    ) {
        (Ok(username), Ok(password)) => Some(Credentials { username, password }),
        _ => None,
    };

    let settings = LinkedInSettings::default();
    let mut scraper = LinkedInScraper::new(ChromiumLauncher::new(settings.headless), settings)
        .with_credentials(credentials);

    println!("Searching for {query:?} in {location:?}...");
    let records = scraper.scrape(&query, &location).await;

    anyhow::ensure!(!scraper.has_session(), "Browser session was not released");

    for r in &records {
        println!(
            "- {} @ {} ({}) [{}] {}",
            r.title(),
            r.company(),
            r.location(),
            r.salary(),
            r.url()
        );
    }
    println!("OK: got {} postings", records.len());
    Ok(())
}
