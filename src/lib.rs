// Lib file to expose modules for testing and external usage.
// This file serves as the root for the library crate.

/// Module containing the scan driver.
/// This includes the `TidyScan` struct that builds the compile database and runs clang-tidy.
pub mod analyzer;

/// Module containing compile database sanitizing, merging and JSON I/O.
pub mod compile_db;

/// Module defining the JSON configuration file.
pub mod config;

/// Module defining typed library errors.
pub mod error;

/// Module parsing clang-tidy output into `Finding`s.
pub mod findings;

/// Module reporting findings as GitHub check-run annotations.
pub mod github;

/// Module printing human and JSON reports.
pub mod report;

/// Module selecting which tracked files get analyzed.
pub mod selector;
