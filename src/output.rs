use std::io::{self, Write};
use std::path::PathBuf;

use serde::Serialize;

use crate::error::{CurateError, Result};
use crate::runner::{CleanResult, CollectResult};
use crate::scanner::ScanReport;

pub fn print_collect(format: &str, result: &CollectResult) -> Result<()> {
    match format {
        "text" => print_collect_text(result),
        "json" => print_json(&CollectJson {
            sources: &result.reports,
            artifacts: &result.artifacts,
        }),
        other => Err(unknown_format(other)),
    }
}

pub fn print_clean(format: &str, result: &CleanResult) -> Result<()> {
    match format {
        "text" => print_clean_text(result),
        "json" => print_json(result),
        other => Err(unknown_format(other)),
    }
}

fn unknown_format(other: &str) -> CurateError {
    CurateError::InvalidArg(format!("Unknown output format: {other}"))
}

#[derive(Serialize)]
struct CollectJson<'a> {
    sources: &'a [ScanReport],
    artifacts: &'a [PathBuf],
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let out = serde_json::to_string_pretty(value)?;
    println!("{out}");
    Ok(())
}

fn print_collect_text(result: &CollectResult) -> Result<()> {
    let mut out = io::stdout();
    writeln!(out, "Collection completed")?;
    writeln!(out)?;
    for (report, path) in result.reports.iter().zip(&result.artifacts) {
        writeln!(
            out,
            "{:<10} seen {:>6}  processed {:>6}  relevant {:>6}  discarded {:>6}  skipped {:>6}  failed {:>6}",
            report.source.to_string(),
            report.seen,
            report.processed,
            report.relevant,
            report.discarded,
            report.skipped,
            report.failed,
        )?;
        writeln!(out, "           -> {}", path.display())?;
    }
    writeln!(out)?;
    writeln!(
        out,
        "Next: review the discard lists, delete rows for items to keep, then run `vqa-curate clean`."
    )?;
    Ok(())
}

fn print_clean_text(result: &CleanResult) -> Result<()> {
    let mut out = io::stdout();
    writeln!(out, "Cleaning completed")?;
    writeln!(out)?;
    writeln!(out, "Validation ids to discard: {}", result.validation_discard_ids)?;
    writeln!(out, "Training ids to discard:   {}", result.training_discard_ids)?;
    writeln!(out, "Records processed:         {}", result.stats.seen)?;
    writeln!(out, "Records eliminated:        {}", result.stats.eliminated)?;
    writeln!(out, "Records retained:          {}", result.stats.retained)?;
    writeln!(out, "Nested references pruned:  {}", result.stats.pruned_references)?;
    if result.stats.blank_lines > 0 {
        writeln!(out, "Blank lines skipped:       {}", result.stats.blank_lines)?;
    }
    writeln!(out)?;
    writeln!(out, "Cleaned file: {}", result.output.display())?;
    Ok(())
}
