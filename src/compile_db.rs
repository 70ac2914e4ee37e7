use crate::error::ConfigError;
use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// Flags kept by default when sanitizing a compile database.
///
/// The lone `-o` and the `.*\.o` pattern together keep the `-o <object>` pair.
pub const DEFAULT_ARGUMENT_WHITELIST: &[&str] = &["-c", "-D.*", "-W.*", "-I.*", "-o", r".*\.o"];

/// Include flag appended to every sanitized entry unless configured otherwise.
pub const DEFAULT_EXTRA_INCLUDE: &str = "-I~/.local/arm/arm-none-eabi/include/";

lazy_static::lazy_static! {
    static ref DEFAULT_WHITELIST: ArgumentWhitelist =
        ArgumentWhitelist::new(DEFAULT_ARGUMENT_WHITELIST)
            .expect("default whitelist patterns are valid");
}

/// One record of a compilation database.
///
/// Field order matches the interchange format so written databases read
/// the same way the build tools emit them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompileCommandEntry {
    /// Compiler executable followed by its flags.
    pub arguments: Vec<String>,
    /// Working directory of the compiler invocation.
    pub directory: String,
    /// Source file, possibly relative to `directory`.
    pub file: String,
}

impl CompileCommandEntry {
    /// Absolute location of the source file, normalized without touching the
    /// filesystem. Two entries naming the same file through different
    /// directories resolve to the same path.
    pub fn resolved_path(&self) -> PathBuf {
        normalize_path(&Path::new(&self.directory).join(&self.file))
    }
}

/// Ordered set of patterns describing which compiler flags survive sanitizing.
///
/// Patterns only anchor at the start of an argument, so `-W.*` keeps
/// `-Wa,-alms=out.lst` and `-c` keeps anything starting with `-c`.
#[derive(Debug, Clone)]
pub struct ArgumentWhitelist {
    patterns: Vec<Regex>,
}

impl ArgumentWhitelist {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self, ConfigError> {
        let patterns = patterns
            .iter()
            .map(|p| {
                let p = p.as_ref();
                Regex::new(&format!("^(?:{})", p)).map_err(|source| {
                    ConfigError::InvalidPattern {
                        pattern: p.to_string(),
                        source,
                    }
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    /// Returns true if any pattern matches the argument.
    pub fn is_allowed(&self, arg: &str) -> bool {
        self.patterns.iter().any(|re| re.is_match(arg))
    }
}

impl Default for ArgumentWhitelist {
    fn default() -> Self {
        DEFAULT_WHITELIST.clone()
    }
}

/// Rewrites compile database entries down to the flags clang-tidy needs.
#[derive(Debug, Clone)]
pub struct Sanitizer {
    pub whitelist: ArgumentWhitelist,
    pub extra_include: String,
}

impl Default for Sanitizer {
    fn default() -> Self {
        Self::new(ArgumentWhitelist::default(), DEFAULT_EXTRA_INCLUDE)
    }
}

impl Sanitizer {
    pub fn new(whitelist: ArgumentWhitelist, extra_include: impl Into<String>) -> Self {
        Self {
            whitelist,
            extra_include: extra_include.into(),
        }
    }

    /// Sanitizes a single entry.
    ///
    /// The compiler name is always kept. Every following argument is kept if it
    /// is whitelisted or is the entry's source file, in input order. The extra
    /// include flag is appended on every call, so sanitizing an already
    /// sanitized entry appends it a second time.
    pub fn sanitize_entry(&self, entry: &CompileCommandEntry) -> CompileCommandEntry {
        let mut arguments = Vec::with_capacity(entry.arguments.len() + 1);

        if let Some((compiler, rest)) = entry.arguments.split_first() {
            arguments.push(compiler.clone());
            arguments.extend(
                rest.iter()
                    .filter(|arg| self.whitelist.is_allowed(arg) || **arg == entry.file)
                    .cloned(),
            );
        }

        arguments.push(self.extra_include.clone());

        CompileCommandEntry {
            arguments,
            directory: entry.directory.clone(),
            file: entry.file.clone(),
        }
    }

    /// Sanitizes every entry of a database, preserving order.
    pub fn sanitize(&self, db: &[CompileCommandEntry]) -> Vec<CompileCommandEntry> {
        db.iter().map(|entry| self.sanitize_entry(entry)).collect()
    }
}

/// Merges several databases so each physical source file appears once.
///
/// Databases are taken in priority order: the first occurrence of a resolved
/// path wins and later duplicates are dropped.
pub fn merge_databases<I>(dbs: I) -> Vec<CompileCommandEntry>
where
    I: IntoIterator<Item = Vec<CompileCommandEntry>>,
{
    let mut accepted: HashSet<PathBuf> = HashSet::new();
    let mut result = Vec::new();

    for db in dbs {
        for entry in db {
            let resolved = entry.resolved_path();
            if accepted.insert(resolved) {
                result.push(entry);
            } else {
                debug!("Skipping duplicate compile command for {}", entry.file);
            }
        }
    }

    result
}

/// Reads a compile database from disk.
///
/// Entries missing `arguments`, `directory` or `file` make the whole load fail.
pub fn load_database(path: &Path) -> Result<Vec<CompileCommandEntry>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read compile database {}", path.display()))?;
    let db = serde_json::from_str(&content)
        .with_context(|| format!("Malformed compile database {}", path.display()))?;
    Ok(db)
}

/// Writes a compile database as pretty-printed JSON.
pub fn write_database(path: &Path, db: &[CompileCommandEntry]) -> Result<()> {
    let content = serde_json::to_string_pretty(db)?;
    fs::write(path, content)
        .with_context(|| format!("Failed to write compile database {}", path.display()))?;
    Ok(())
}

/// Lexically normalizes a path: drops `.` and folds `..` into its parent.
/// `..` at the root stays at the root; leading `..` of a relative path is kept.
fn normalize_path(path: &Path) -> PathBuf {
    let mut out: Vec<Component> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.last() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(component),
            },
            other => out.push(other),
        }
    }
    out.iter().collect()
}
