//! Console output for benchmark runs
//!
//! System header, progress bar and the results table.

use colored::*;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, CellAlignment, ContentArrangement, Table};
use indicatif::{ProgressBar, ProgressStyle};
use sysinfo::{CpuRefreshKind, RefreshKind, System};

use crate::suite::CaseOutcome;
use crate::utils::helpers::format_elapsed;

const WIDTH: usize = 60;

/// Layout of the results section
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Table with one row per case
    #[default]
    Table,
    /// One `<case> <elapsed>` line per case
    Lines,
}

pub fn print_header() {
    let separator = "=".repeat(WIDTH);
    println!("\n{}", separator);
    println!("{:^60}", "Benchmark Harness".bold().cyan());
    println!("{}\n", separator);

    println!("{}", "System Information".bold().yellow());
    println!("━━━━━━━━━━━━━━━━━━━");
    println!("OS:  {}", os_info::get());

    let system = System::new_with_specifics(RefreshKind::nothing().with_cpu(CpuRefreshKind::everything()));
    let brand = system
        .cpus()
        .first()
        .map(|cpu| cpu.brand().trim().to_string())
        .filter(|brand| !brand.is_empty())
        .unwrap_or_else(|| "Unknown".to_string());
    println!("CPU: {} ({} logical cores)", brand, system.cpus().len());
    println!();
}

/// Progress bar over the cases of a suite.
pub fn progress_bar(len: u64) -> ProgressBar {
    let pb = ProgressBar::new(len);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} cases {wide_msg}")
        .map(|style| style.progress_chars("##-"))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    pb.set_style(style);
    pb
}

pub fn results_table(outcomes: &[CaseOutcome]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Case", "Mode", "Runs", "Elapsed", "Last result"]);

    for outcome in outcomes {
        table.add_row(vec![
            Cell::new(&outcome.name),
            Cell::new(outcome.mode),
            Cell::new(outcome.runs).set_alignment(CellAlignment::Right),
            Cell::new(format_elapsed(outcome.elapsed())).set_alignment(CellAlignment::Right),
            Cell::new(outcome.measurement.last_result().map(String::as_str).unwrap_or("-")),
        ]);
    }
    table
}

pub fn print_results(outcomes: &[CaseOutcome], format: OutputFormat) {
    println!("\n{}", "Results".bold().yellow());
    println!("━━━━━━━");
    match format {
        OutputFormat::Table => println!("{}", results_table(outcomes)),
        OutputFormat::Lines => {
            for outcome in outcomes {
                outcome.measurement.report(&outcome.name);
            }
        }
    }
    println!("\n{}", "✅ Benchmark complete".bold().green());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CaseConfig, Mode, Workload};
    use crate::suite::run_case;

    #[tokio::test]
    async fn table_has_row_per_outcome() {
        let mut outcomes = Vec::new();
        for (name, mode) in [("seq", Mode::Sequential), ("cap", Mode::Capture)] {
            let case = CaseConfig {
                name: name.to_string(),
                mode,
                runs: 2,
                workload: Workload::Counter,
            };
            outcomes.push(run_case(&case).await.unwrap());
        }

        let table = results_table(&outcomes);
        assert_eq!(table.row_iter().count(), 2);
        let rendered = table.to_string();
        assert!(rendered.contains("seq"));
        assert!(rendered.contains("capture"));
        assert!(rendered.contains("Last result"));
    }
}
