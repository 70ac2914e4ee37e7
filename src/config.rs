//! JSON configuration for a scan.
//!
//! The config file lists the build commands that produce compile databases
//! and optionally the compilers to shadow while those commands run. Every
//! other key falls back to a built-in default when absent.

use crate::compile_db::{ArgumentWhitelist, Sanitizer, DEFAULT_EXTRA_INCLUDE};
use crate::error::ConfigError;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Analyzer executable used when the config does not name one.
pub const DEFAULT_CLANG_TIDY: &str = "clang-tidy";

/// A build command that dumps a compile database.
#[derive(Debug, Clone, Deserialize)]
pub struct CompileCommandsSource {
    /// Shell command run with `bash -c` from the repository root.
    pub command: String,
    /// Where the command leaves its database, relative to the repository root.
    pub path: PathBuf,
}

/// Root configuration loaded from the `--config` file.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct Config {
    pub compilation_commands_sources: Vec<CompileCommandsSource>,
    /// Compiler names shadowed by `fake_compiler` while build commands run.
    #[serde(default)]
    pub fake_compilers: Vec<String>,
    pub fake_compiler: Option<PathBuf>,
    pub extra_include: Option<String>,
    pub argument_whitelist: Option<Vec<String>>,
    pub clang_tidy: Option<String>,
}

impl Config {
    /// Loads the configuration from a JSON file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_json(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }

    /// Builds the sanitizer described by this config.
    pub fn sanitizer(&self) -> Result<Sanitizer, ConfigError> {
        let whitelist = match &self.argument_whitelist {
            Some(patterns) => ArgumentWhitelist::new(patterns.as_slice())?,
            None => ArgumentWhitelist::default(),
        };
        let extra_include = self
            .extra_include
            .as_deref()
            .unwrap_or(DEFAULT_EXTRA_INCLUDE);
        Ok(Sanitizer::new(whitelist, extra_include))
    }

    pub fn clang_tidy(&self) -> &str {
        self.clang_tidy.as_deref().unwrap_or(DEFAULT_CLANG_TIDY)
    }

    /// Program the fake compiler symlinks point at.
    ///
    /// Defaults to a `fake_compiler` executable next to the running binary.
    pub fn fake_compiler_path(&self) -> Option<PathBuf> {
        if let Some(path) = &self.fake_compiler {
            return Some(path.clone());
        }
        let exe = std::env::current_exe().ok()?;
        Some(exe.parent()?.join("fake_compiler"))
    }
}
