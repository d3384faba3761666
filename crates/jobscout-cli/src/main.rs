use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use jobscout_client::{
    ChromiumLauncher, Credentials, JustJoinScraper, LinkedInScraper, OpenAiLetterWriter, Source,
};
use jobscout_core::{Config, FilterSet, Pipeline, RunReport};

mod output;

#[derive(Parser)]
#[command(
    name = "jobscout",
    version,
    about = "Job posting aggregator with tailored cover letters"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape every enabled source, filter the postings, and write cover letters
    Run {
        /// Path to the JSON config file
        #[arg(short, long, env = "JOBSCOUT_CONFIG", default_value = "jobscout.json")]
        config: PathBuf,

        /// Search query (overrides search.query from the config file)
        #[arg(short, long)]
        query: Option<String>,

        /// Location filter (overrides search.location from the config file)
        #[arg(short, long)]
        location: Option<String>,

        /// API key for the completion service
        #[arg(long, env = "JOBSCOUT_API_KEY", hide_env_values = true)]
        api_key: Option<String>,

        /// LinkedIn login (optional; scraping works logged out with fewer results)
        #[arg(long, env = "LINKEDIN_USERNAME")]
        linkedin_username: Option<String>,

        /// LinkedIn password
        #[arg(long, env = "LINKEDIN_PASSWORD", hide_env_values = true)]
        linkedin_password: Option<String>,

        /// Skip cover-letter generation
        #[arg(long, default_value_t = false)]
        no_letters: bool,

        /// Write the kept postings to a CSV file
        #[arg(long)]
        output_csv: Option<PathBuf>,

        /// Write one Markdown file per generated cover letter into this directory
        #[arg(long)]
        letters_dir: Option<PathBuf>,

        /// Print the results as JSON instead of a summary
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Validate a config file and print the effective settings
    CheckConfig {
        /// Path to the JSON config file
        #[arg(short, long, env = "JOBSCOUT_CONFIG", default_value = "jobscout.json")]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("jobscout=info".parse()?))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            query,
            location,
            api_key,
            linkedin_username,
            linkedin_password,
            no_letters,
            output_csv,
            letters_dir,
            json,
        } => {
            let mut config = load_config(&config)?;
            if let Some(query) = query {
                config.search.query = query;
            }
            if let Some(location) = location {
                config.search.location = location;
            }
            let credentials = credentials(linkedin_username, linkedin_password);
            if credentials.is_none() && config.sources.linkedin.enabled {
                tracing::warn!(
                    "LinkedIn credentials not provided, some postings might not be visible"
                );
            }
            let api_key = if no_letters || !config.cover_letter.enabled {
                None
            } else {
                let api_key = non_blank(api_key);
                if api_key.is_none() {
                    tracing::warn!("JOBSCOUT_API_KEY not set, cover letters will be skipped");
                }
                api_key
            };

            let report = cmd_run(&config, credentials, api_key.as_deref()).await?;

            if let Some(path) = &output_csv {
                output::write_csv(path, &report.applications)?;
                tracing::info!("Wrote {} postings to {}", report.applications.len(), path.display());
            }
            if let Some(dir) = &letters_dir {
                let written = output::write_letters(dir, &report.applications)?;
                tracing::info!("Wrote {} cover letters to {}", written, dir.display());
            }
            if json {
                println!("{}", serde_json::to_string_pretty(&report.applications)?);
            } else {
                output::print_summary(&report);
            }
        }
        Commands::CheckConfig { config } => {
            let config = load_config(&config)?;
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }

    Ok(())
}

fn load_config(path: &Path) -> Result<Config> {
    Config::from_file(path).with_context(|| format!("Failed to load config {}", path.display()))
}

/// Empty or whitespace-only values count as unset.
fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Login is attempted only when both parts are present.
fn credentials(username: Option<String>, password: Option<String>) -> Option<Credentials> {
    match (non_blank(username), non_blank(password)) {
        (Some(username), Some(password)) => Some(Credentials { username, password }),
        _ => None,
    }
}

/// Build the enabled sources in their fixed order: LinkedIn first, then the job board.
fn build_sources(
    config: &Config,
    credentials: Option<Credentials>,
) -> Result<Vec<Source<ChromiumLauncher>>> {
    let mut sources = Vec::new();

    if config.sources.linkedin.enabled {
        let settings = config.sources.linkedin.clone();
        let launcher = ChromiumLauncher::new(settings.headless)
            .with_user_agent(config.header("User-Agent").map(str::to_string))
            .with_request_timeout(settings.page_load_timeout());
        sources.push(Source::LinkedIn(
            LinkedInScraper::new(launcher, settings).with_credentials(credentials),
        ));
    }

    if config.sources.justjoin.enabled {
        let scraper = JustJoinScraper::from_settings(config.sources.justjoin.clone(), &config.headers)
            .context("Failed to create job board client")?;
        sources.push(Source::JustJoin(scraper));
    }

    Ok(sources)
}

async fn cmd_run(
    config: &Config,
    credentials: Option<Credentials>,
    api_key: Option<&str>,
) -> Result<RunReport> {
    let mut sources = build_sources(config, credentials)?;
    let filters = FilterSet::from_criteria(&config.filters);
    let query = config.search.query.as_str();
    let location = config.search.location.as_str();

    let report = match api_key {
        Some(key) => {
            let writer = OpenAiLetterWriter::from_config(key, &config.cover_letter)
                .context("Failed to create completion client")?;
            tracing::info!("Writing cover letters with model {}", config.cover_letter.model);
            Pipeline::with_writer(filters, writer)
                .run(&mut sources, query, location)
                .await
        }
        None => {
            Pipeline::<OpenAiLetterWriter>::new(filters)
                .run(&mut sources, query, location)
                .await
        }
    };

    tracing::info!(
        scraped = report.total_scraped(),
        kept = report.applications.len(),
        letters = report.letters_written(),
        "Run complete"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_sources_respects_enabled_flags() {
        let config = Config::from_json(r#"{"sources": {"linkedin": {"enabled": false}}}"#).unwrap();
        let sources = build_sources(&config, None).unwrap();
        assert_eq!(sources.len(), 1);
        assert!(matches!(sources[0], Source::JustJoin(_)));

        let config = Config::default();
        let sources = build_sources(&config, None).unwrap();
        assert_eq!(sources.len(), 2);
        assert!(matches!(sources[0], Source::LinkedIn(_)));
        assert!(matches!(sources[1], Source::JustJoin(_)));
    }

    #[test]
    fn test_blank_credentials_are_ignored() {
        let some = |v: &str| Some(v.to_string());

        assert!(credentials(some(""), some("secret")).is_none());
        assert!(credentials(some("me@example.com"), some("   ")).is_none());
        assert!(credentials(None, some("secret")).is_none());

        let creds = credentials(some("me@example.com"), some("secret")).unwrap();
        assert_eq!(creds.username, "me@example.com");
        assert_eq!(creds.password, "secret");
    }

    #[test]
    fn test_blank_api_key_is_unset() {
        assert_eq!(non_blank(Some(String::new())), None);
        assert_eq!(non_blank(Some(" \t".into())), None);
        assert_eq!(non_blank(None), None);
        assert_eq!(non_blank(Some("sk-test".into())).as_deref(), Some("sk-test"));
    }

    #[test]
    fn test_build_sources_rejects_bad_header() {
        let config = Config::from_json(r#"{"headers": {"Bad Header": "x"}}"#).unwrap();
        assert!(build_sources(&config, None).is_err());
    }

    #[test]
    fn test_cli_parses_run_flags() {
        let cli = Cli::try_parse_from([
            "jobscout",
            "run",
            "--config",
            "my.json",
            "--query",
            "rust",
            "--no-letters",
            "--letters-dir",
            "out",
        ])
        .unwrap();
        match cli.command {
            Commands::Run {
                config,
                query,
                no_letters,
                letters_dir,
                ..
            } => {
                assert_eq!(config, PathBuf::from("my.json"));
                assert_eq!(query.as_deref(), Some("rust"));
                assert!(no_letters);
                assert_eq!(letters_dir, Some(PathBuf::from("out")));
            }
            Commands::CheckConfig { .. } => panic!("expected run"),
        }
    }
}
