use crate::analyzer::AnalysisResult;
use colored::*;
use std::io::{self, Write};

pub const NOTHING_FOUND: &str = "clang-tidy did not find a single thing in your code!";

/// Writes the human-readable report.
///
/// Files are listed in sorted order; files without findings are skipped.
pub fn write_human<W: Write>(out: &mut W, result: &AnalysisResult) -> io::Result<()> {
    for (file, findings) in &result.findings {
        if findings.is_empty() {
            continue;
        }
        writeln!(out, "{}", format!("{}:", file).bold())?;
        for finding in findings {
            writeln!(out, "  {}: {}", finding.line, finding.text)?;
        }
    }

    if !result.has_findings() {
        writeln!(out, "{}", NOTHING_FOUND)?;
    }

    Ok(())
}

/// Writes the whole result as pretty-printed JSON.
pub fn write_json<W: Write>(out: &mut W, result: &AnalysisResult) -> anyhow::Result<()> {
    writeln!(out, "{}", serde_json::to_string_pretty(result)?)?;
    Ok(())
}
