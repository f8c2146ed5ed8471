//! Human-readable upload summary

use colored::*;
use zigzag_core::domain::job::{JobFailure, JobKind};
use zigzag_core::util::{format_duration, format_pid};
use zigzag_uploader::{JobOutcome, RunSummary};

/// Print the summary to stdout; `verbose` adds one line per job
pub fn print_summary(summary: &RunSummary, verbose: bool) {
    println!("{}", "Upload Summary:".bold());
    println!("  Run:        {}", summary.run_name.cyan());
    if let Some(run_id) = summary.run_id {
        println!("  Run ID:     {}", format_pid("TR", run_id).dimmed());
    }
    println!(
        "  Tests:      {} total, {} passed, {} failed, {} errors, {} skipped",
        summary.tests.total(),
        summary.tests.passed.to_string().green(),
        summary.tests.failed.to_string().red(),
        summary.tests.errors.to_string().red(),
        summary.tests.skipped.to_string().yellow()
    );
    println!(
        "  Jobs:       {} total, {} succeeded, {} rejected, {} exhausted, {} skipped",
        summary.jobs.len(),
        summary.succeeded.to_string().green(),
        summary.rejected.to_string().red(),
        summary.exhausted.to_string().yellow(),
        summary.cascaded.to_string().dimmed()
    );
    println!("  Duration:   {}", format_duration(summary.elapsed));

    if verbose {
        println!("\n{}", "Jobs:".bold());
        for job in &summary.jobs {
            print_job(job);
        }
    }

    let failures: Vec<&JobOutcome> = summary
        .failures()
        .filter(|job| verbose || !job.failure.as_ref().is_some_and(JobFailure::is_cascade))
        .collect();
    if !failures.is_empty() {
        println!("\n{}", "Failures:".bold());
        for job in failures {
            print_failure(job);
        }
    }

    if !summary.case_errors.is_empty() {
        println!("\n{}", "Cases not uploaded:".bold());
        for error in &summary.case_errors {
            println!("  {} {}", error.case.to_string().cyan(), error.message.red());
        }
    }

    if !summary.warnings.is_empty() {
        println!("\n{}", "Warnings:".bold());
        for warning in &summary.warnings {
            println!("  {}", warning.yellow());
        }
    }

    println!();
    if summary.is_success() {
        println!("{} {}", "✓".green(), "All results uploaded".green());
    } else {
        println!("{} {}", "✗".red(), "Upload finished with failures".red());
    }
}

fn print_job(job: &JobOutcome) {
    let status = match &job.failure {
        None => "ok".green(),
        Some(JobFailure::Cascade { .. }) => "skipped".dimmed(),
        Some(JobFailure::Exhausted { .. }) => "exhausted".yellow(),
        Some(JobFailure::Rejected { .. }) => "rejected".red(),
    };
    println!(
        "  {:>5} {:<14} {:<9} {} {}",
        job.id.to_string().dimmed(),
        job.kind.to_string(),
        status,
        job.label,
        format!("({} attempt(s))", job.attempts).dimmed()
    );
}

fn print_failure(job: &JobOutcome) {
    let Some(failure) = &job.failure else {
        return;
    };
    println!("  {} [{}] {}", subject(job).cyan(), job.kind, job.label);
    println!("    {}", failure.to_string().red());
}

/// What a failed job was about: its case, or the module or run it creates
fn subject(job: &JobOutcome) -> &str {
    match (&job.case, job.kind) {
        (Some(case), _) => case,
        (None, JobKind::CreateModule) => "module",
        (None, _) => "run",
    }
}
