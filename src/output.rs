use crate::models::{AggregateSummary, EvaluationReport};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Output format options
#[derive(Debug, Clone, ValueEnum, Serialize, Deserialize)]
pub enum OutputFormat {
    Plain,
    Json,
}

/// Print evaluation reports in the specified format
pub fn print_reports(reports: &[EvaluationReport], format: OutputFormat) {
    match format {
        OutputFormat::Plain => print_reports_plain(reports),
        OutputFormat::Json => print_json(&reports),
    }
}

/// Print grouped summaries in the specified format (analyze mode)
pub fn print_summaries(summaries: &[AggregateSummary], format: OutputFormat) {
    match format {
        OutputFormat::Plain => print_summary_table(summaries),
        OutputFormat::Json => print_json(&summaries),
    }
}

fn print_reports_plain(reports: &[EvaluationReport]) {
    for (i, report) in reports.iter().enumerate() {
        println!("=== {} ===", report.title);
        println!();

        if !report.failures.is_empty() {
            println!("FAILURES");
            println!("--------");
            for failure in &report.failures {
                println!(
                    "  pair {} (temperature {}, top_p {}): {}",
                    failure.pair_index + 1,
                    failure.temperature,
                    failure.top_p,
                    failure.reason
                );
            }
            println!();
        }

        println!("SCORED RECORDS");
        println!("--------------");
        for record in &report.records {
            println!(
                "temperature {} / top_p {} ({})",
                record.temperature, record.top_p, record.model
            );
            println!("  response: {}", record.response);
            println!(
                "  lexical_diversity {:.2}  query_coverage {:.2}  fk_grade {:.2}  repetition {:.2}",
                record.metrics.lexical_diversity,
                record.metrics.query_coverage,
                record.metrics.flesch_kincaid_grade,
                record.metrics.repetition_penalty
            );
        }
        println!();

        println!("SUMMARY (normalized, higher is better)");
        println!("--------------------------------------");
        print_summary_table(&report.summaries);

        if i < reports.len() - 1 {
            println!();
            println!("{}", "=".repeat(50));
            println!();
        }
    }
}

fn print_summary_table(summaries: &[AggregateSummary]) {
    if summaries.is_empty() {
        println!("No records to summarize.");
        return;
    }

    println!(
        "{:<12} {:<6} {:<10} {:<10} {:<10} {:<10}",
        "Group", "Count", "Lexical", "Coverage", "FkGrade", "Repetition"
    );
    println!("{}", "-".repeat(60));

    for summary in summaries {
        println!(
            "{:<12} {:<6} {:<10.2} {:<10.2} {:<10.2} {:<10.2}",
            summary.key.to_string(),
            summary.count,
            summary.mean.lexical_diversity,
            summary.mean.query_coverage,
            summary.mean.flesch_kincaid_grade,
            summary.mean.repetition_penalty
        );
    }
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error serializing results to JSON: {}", e),
    }
}
