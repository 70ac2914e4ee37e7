use regex::Regex;
use serde::Serialize;
use tracing::debug;

lazy_static::lazy_static! {
    // `path:line:col: message`. The greedy prefix lets paths contain colons;
    // the last `:<n>:<n>: ` on the line wins.
    static ref DIAGNOSTIC_RE: Regex = Regex::new(r"^.*:(\d+):\d+: (.*)").unwrap();
}

/// A single diagnostic reported by clang-tidy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    /// Line number (1-indexed).
    pub line: usize,
    /// Diagnostic message, including its severity prefix and check name.
    pub text: String,
}

/// Extracts findings from raw clang-tidy output.
///
/// Every line is matched on its own. Source snippets, caret markers and blank
/// lines carry no diagnostic and are skipped. Repeated diagnostics are all
/// kept, in output order. A diagnostic whose line number does not fit in a
/// `usize` is dropped and logged at debug level.
pub fn parse_clang_output(output: &str) -> Vec<Finding> {
    output
        .lines()
        .filter_map(|raw| {
            let caps = DIAGNOSTIC_RE.captures(raw)?;
            let line = match caps[1].parse::<usize>() {
                Ok(line) => line,
                Err(e) => {
                    debug!("Dropping diagnostic with unusable line number `{}`: {}", raw, e);
                    return None;
                }
            };
            Some(Finding {
                line,
                text: caps[2].to_string(),
            })
        })
        .collect()
}
