use crate::compile_db::CompileCommandEntry;
use std::path::Path;

/// Extensions clang-tidy can analyze on its own.
pub const ANALYZABLE_EXTENSIONS: &[&str] = &[".c", ".cpp", ".cxx"];

/// Extracts paths from `git ls-tree --full-tree -r HEAD` output.
///
/// Each line is `<mode> <type> <object>\t<path>`; lines without a tab are ignored.
pub fn parse_ls_tree(listing: &str) -> Vec<String> {
    listing
        .lines()
        .filter_map(|line| line.split_once('\t'))
        .map(|(_, path)| path.to_string())
        .collect()
}

/// Returns only the files that can be used by clang-tidy, in input order.
pub fn analyzable_files(files: &[String]) -> Vec<String> {
    files
        .iter()
        .filter(|f| ANALYZABLE_EXTENSIONS.iter().any(|ext| f.ends_with(*ext)))
        .cloned()
        .collect()
}

/// Returns true if some database entry's `file`, or its path resolved
/// against `directory`, ends with `path`.
///
/// Matching is done on whole path components, so `hal.c` does not cover
/// `myhal.c`.
pub fn is_covered(path: &str, db: &[CompileCommandEntry]) -> bool {
    db.iter().any(|entry| {
        Path::new(&entry.file).ends_with(path) || entry.resolved_path().ends_with(path)
    })
}

/// Keeps the files that have a compile command, in input order.
pub fn covered_files(files: &[String], db: &[CompileCommandEntry]) -> Vec<String> {
    files.iter().filter(|f| is_covered(f, db)).cloned().collect()
}
