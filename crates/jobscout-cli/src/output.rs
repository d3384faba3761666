use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use jobscout_core::{Application, RunReport};

/// Print per-source counts and one line per kept posting.
pub fn print_summary(report: &RunReport) {
    for count in &report.scraped {
        println!("{:<12} {} postings", count.source.as_str(), count.records);
    }
    println!(
        "Kept {} of {} ({} filtered out), {} cover letters\n",
        report.applications.len(),
        report.total_scraped(),
        report.filtered_out,
        report.letters_written()
    );

    for app in &report.applications {
        let r = &app.record;
        let letter = if app.cover_letter.is_some() { "letter" } else { "-" };
        println!(
            "  [{}] {} @ {} ({}) | {} | {} | {}",
            r.source(),
            r.title(),
            if r.company().is_empty() { "?" } else { r.company() },
            r.location(),
            r.salary(),
            letter,
            r.url()
        );
    }
}

/// Write every kept record as one CSV row.
pub fn write_csv(path: &Path, applications: &[Application]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    for app in applications {
        writer
            .serialize(&app.record)
            .context("Failed to write CSV row")?;
    }
    writer.flush().context("Failed to flush CSV")?;
    Ok(())
}

/// Lowercase ASCII slug for file names; runs of other characters become `-`.
fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug = slug.trim_matches('-');
    if slug.is_empty() {
        "posting".to_string()
    } else {
        slug.chars().take(60).collect()
    }
}

fn letter_path(dir: &Path, index: usize, app: &Application) -> PathBuf {
    let r = &app.record;
    dir.join(format!(
        "{:03}-{}-{}.md",
        index + 1,
        slugify(r.company()),
        slugify(r.title())
    ))
}

/// Write each generated letter to its own Markdown file. Returns how many
/// were written; applications without a letter are skipped.
pub fn write_letters(dir: &Path, applications: &[Application]) -> Result<usize> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;

    let mut written = 0;
    for (index, app) in applications.iter().enumerate() {
        let Some(letter) = &app.cover_letter else {
            continue;
        };
        let r = &app.record;
        let content = format!(
            "# {} at {}\n\n- Location: {}\n- Salary: {}\n- Source: {}\n- Found: {}\n- URL: {}\n\n---\n\n{}\n",
            r.title(),
            r.company(),
            r.location(),
            r.salary(),
            r.source(),
            r.date_found(),
            r.url(),
            letter
        );
        let path = letter_path(dir, index, app);
        std::fs::write(&path, content)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        written += 1;
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use jobscout_core::SourceKind;
    use jobscout_core::testutil::make_test_record;

    use super::*;

    fn applications() -> Vec<Application> {
        vec![
            Application {
                record: make_test_record(SourceKind::JustJoin, "Rust Engineer", "Other Inc")
                    .with_salary(Some("From 20000 PLN".into())),
                cover_letter: Some("Dear Other Inc,".into()),
            },
            Application {
                record: make_test_record(SourceKind::LinkedIn, "Data Engineer", "Initech"),
                cover_letter: None,
            },
        ]
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Senior Rust Engineer (m/f/d)"), "senior-rust-engineer-m-f-d");
        assert_eq!(slugify("  Ąćę  "), "posting");
        assert_eq!(slugify(""), "posting");
        assert_eq!(slugify(&"a".repeat(100)).len(), 60);
    }

    #[test]
    fn test_write_letters_skips_missing() {
        let dir = tempfile::tempdir().unwrap();
        let written = write_letters(dir.path(), &applications()).unwrap();
        assert_eq!(written, 1);

        let path = dir.path().join("001-other-inc-rust-engineer.md");
        let content = std::fs::read_to_string(path).unwrap();
        assert!(content.starts_with("# Rust Engineer at Other Inc"));
        assert!(content.contains("- Salary: From 20000 PLN"));
        assert!(content.contains("- Source: JustJoin.it"));
        assert!(content.trim_end().ends_with("Dear Other Inc,"));
    }

    #[test]
    fn test_write_csv_has_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jobs.csv");
        write_csv(&path, &applications()).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let mut lines = content.lines();
        assert_eq!(
            lines.next(),
            Some("title,company,location,description,salary,url,source,date_found")
        );
        let first = lines.next().unwrap();
        assert!(first.starts_with("Rust Engineer,Other Inc,"));
        assert!(first.contains("JustJoin.it"));
        assert!(first.ends_with("2026-10-15"));
        assert_eq!(lines.count(), 1);
    }
}
