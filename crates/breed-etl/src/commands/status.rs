//! `breed-etl status` command implementation
//!
//! Shows run counts per status and the latest entries of `pipeline_logs`.

use crate::config::DatabaseConfig;
use crate::repository::{PgBreedRepository, StatusCount};
use anyhow::Result;
use breed_common::{RunLogEntry, RunStatus};
use colored::Colorize;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Table};

const MAX_ERROR_WIDTH: usize = 60;

pub async fn run(config: DatabaseConfig, days: i32, recent: i64) -> Result<()> {
    let repository = PgBreedRepository::new(config);
    let summary = repository.run_summary(days).await?;
    let runs = repository.recent_runs(recent).await?;

    println!("{}", format!("Runs in the last {} days:", days).cyan().bold());
    print_summary(&summary);
    println!();

    if runs.is_empty() {
        println!("No pipeline runs recorded.");
        println!("Run 'breed-etl run' to load the catalog.");
        return Ok(());
    }

    println!("{}", "Latest runs:".cyan().bold());
    println!("{}", runs_table(&runs));
    Ok(())
}

fn print_summary(summary: &[StatusCount]) {
    let count = |status: RunStatus| {
        summary
            .iter()
            .find(|c| c.status == status)
            .map_or(0, |c| c.runs)
    };
    println!("  {}: {}", "SUCCESS".green(), count(RunStatus::Success));
    println!("  {}:  {}", "FAILED".red(), count(RunStatus::Failed));
}

fn runs_table(runs: &[RunLogEntry]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec!["ID", "Run time", "Status", "Records", "Error"]);

    for entry in runs {
        table.add_row(vec![
            entry.id.to_string(),
            entry.run_time.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            entry.status.to_string(),
            entry
                .records_processed
                .map_or_else(|| "-".to_string(), |n| n.to_string()),
            entry
                .error_message
                .as_deref()
                .map_or_else(|| "-".to_string(), |e| truncate(e, MAX_ERROR_WIDTH)),
        ]);
    }
    table
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let kept: String = s.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", kept)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghijkl", 8), "abcde...");
    }

    #[test]
    fn test_runs_table_shows_missing_values_as_dash() {
        let runs = vec![RunLogEntry {
            id: 4,
            run_time: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
            status: RunStatus::Failed,
            records_processed: None,
            error_message: Some("Extraction failed: HTTP error 503".to_string()),
        }];

        let rendered = runs_table(&runs).to_string();
        assert!(rendered.contains("FAILED"));
        assert!(rendered.contains("2024-05-01 12:00:00 UTC"));
        assert!(rendered.contains(" - "));
    }
}
