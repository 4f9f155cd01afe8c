use anyhow::Result;
use chrono::Utc;
use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;
use std::io::Write;
use std::time::Duration;

use crate::simulate::SimulationResult;
use crate::validate::{Severity, ValidationReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Console,
    Json,
    Markdown,
}

#[derive(Serialize)]
struct Envelope<'a, T: Serialize> {
    generated_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    total_duration_ms: Option<u128>,
    report: &'a T,
}

fn write_json<T: Serialize>(out: &mut dyn Write, report: &T, total: Option<Duration>) -> Result<()> {
    let envelope = Envelope {
        generated_at: Utc::now().to_rfc3339(),
        total_duration_ms: total.map(|d| d.as_millis()),
        report,
    };
    serde_json::to_writer_pretty(&mut *out, &envelope)?;
    writeln!(out)?;
    Ok(())
}

pub fn write_validation_report(
    out: &mut dyn Write,
    format: ReportFormat,
    report: &ValidationReport,
) -> Result<()> {
    match format {
        ReportFormat::Console => validation_console(out, report),
        ReportFormat::Json => write_json(out, report, None),
        ReportFormat::Markdown => validation_markdown(out, report),
    }
}

fn validation_console(out: &mut dyn Write, report: &ValidationReport) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "🔎 Data Validation".bright_cyan().bold())?;
    writeln!(out, "{}", "==================".cyan())?;
    writeln!(out, "Source: {}", report.source)?;
    writeln!(out, "Scenario nodes: {}", report.node_count)?;
    match report.network_node_count {
        Some(count) => writeln!(out, "Network nodes: {count}")?,
        None => writeln!(out, "Network nodes: {}", "none".dimmed())?,
    }
    writeln!(out, "Accepted semantic ids: {}", report.accepted_ids)?;
    writeln!(out)?;

    if report.issues.is_empty() {
        writeln!(out, "{}", "✅ No issues found".green())?;
        return Ok(());
    }
    for issue in &report.issues {
        let tag = match issue.severity {
            Severity::Error => format!("❌ {}", issue.code).red(),
            Severity::Warning => format!("⚠️  {}", issue.code).yellow(),
        };
        writeln!(out, "{tag}: {}", issue.message)?;
    }
    writeln!(out)?;
    let errors = report.errors().count();
    let warnings = report.warnings().count();
    let verdict = if report.passed() {
        "PASS".green().bold()
    } else {
        "FAIL".red().bold()
    };
    writeln!(out, "{verdict}: {errors} errors, {warnings} warnings")?;
    Ok(())
}

fn validation_markdown(out: &mut dyn Write, report: &ValidationReport) -> Result<()> {
    writeln!(out, "# HistQuiz Data Validation\n")?;
    writeln!(out, "_Generated {}_\n", Utc::now().format("%Y-%m-%d %H:%M:%S UTC"))?;
    writeln!(out, "- **Source**: {}", report.source)?;
    writeln!(out, "- **Scenario nodes**: {}", report.node_count)?;
    if let Some(count) = report.network_node_count {
        writeln!(out, "- **Network nodes**: {count}")?;
    }
    writeln!(out, "- **Accepted semantic ids**: {}", report.accepted_ids)?;
    writeln!(
        out,
        "- **Result**: {}\n",
        if report.passed() { "✅ pass" } else { "❌ fail" }
    )?;

    if report.issues.is_empty() {
        writeln!(out, "_No issues found._")?;
        return Ok(());
    }
    writeln!(out, "| Severity | Code | Node | Message |")?;
    writeln!(out, "|----------|------|------|---------|")?;
    for issue in &report.issues {
        writeln!(
            out,
            "| {} | `{}` | {} | {} |",
            issue.severity,
            issue.code,
            issue.node_id.as_deref().unwrap_or("-"),
            issue.message.replace('|', "\\|")
        )?;
    }
    Ok(())
}

pub fn write_simulation_report(
    out: &mut dyn Write,
    format: ReportFormat,
    results: &[SimulationResult],
    total_duration: Duration,
) -> Result<()> {
    match format {
        ReportFormat::Console => simulation_console(out, results, total_duration),
        ReportFormat::Json => write_json(out, &results, Some(total_duration)),
        ReportFormat::Markdown => simulation_markdown(out, results),
    }
}

fn simulation_console(
    out: &mut dyn Write,
    results: &[SimulationResult],
    total_duration: Duration,
) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "📊 Simulation Results Summary".bright_cyan().bold())?;
    writeln!(out, "{}", "=============================".cyan())?;

    let passed = results.iter().filter(|r| r.passed).count();
    writeln!(out, "Total runs: {}", results.len())?;
    writeln!(out, "Passed: {}", passed.to_string().green())?;
    writeln!(out, "Failed: {}", (results.len() - passed).to_string().red())?;
    writeln!(out, "Total time: {total_duration:?}")?;
    writeln!(out)?;

    for result in results {
        let status = if result.passed {
            "✅ PASS".green()
        } else {
            "❌ FAIL".red()
        };
        writeln!(
            out,
            "{status} {} (seed {})",
            result.strategy.label().bold(),
            result.seed
        )?;
        writeln!(
            out,
            "   Cleared: {}/{} ({:.1}%), game over: {}",
            result.cleared,
            result.iterations_run,
            result.clear_rate(),
            result.game_over
        )?;
        writeln!(
            out,
            "   Path length: {:.1} avg, {} max",
            result.average_path, result.longest_path
        )?;
        writeln!(out, "   Average time: {:?}", result.average_duration)?;
        if !result.failures.is_empty() {
            writeln!(out, "   Failures:")?;
            for failure in &result.failures {
                writeln!(out, "     • {}", failure.red())?;
            }
        }
        writeln!(out)?;
    }
    Ok(())
}

fn simulation_markdown(out: &mut dyn Write, results: &[SimulationResult]) -> Result<()> {
    writeln!(out, "# HistQuiz Simulation Results\n")?;
    writeln!(out, "_Generated {}_\n", Utc::now().format("%Y-%m-%d %H:%M:%S UTC"))?;

    if results.is_empty() {
        writeln!(out, "_No simulations executed._")?;
        return Ok(());
    }
    writeln!(out, "| Result | Strategy | Seed | Cleared | Game over | Avg path | Max path |")?;
    writeln!(out, "|--------|----------|------|---------|-----------|----------|----------|")?;
    for result in results {
        writeln!(
            out,
            "| {} | {} | {} | {}/{} | {} | {:.1} | {} |",
            if result.passed { "✅" } else { "❌" },
            result.strategy,
            result.seed,
            result.cleared,
            result.iterations_run,
            result.game_over,
            result.average_path,
            result.longest_path
        )?;
    }

    let failing: Vec<_> = results.iter().filter(|r| !r.failures.is_empty()).collect();
    if !failing.is_empty() {
        writeln!(out, "\n## Failures\n")?;
        for result in failing {
            writeln!(out, "### {} seed {}\n", result.strategy, result.seed)?;
            for failure in &result.failures {
                writeln!(out, "- {failure}")?;
            }
            writeln!(out)?;
        }
    }
    Ok(())
}
