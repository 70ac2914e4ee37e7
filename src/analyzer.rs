use crate::compile_db::{self, CompileCommandEntry, Sanitizer};
use crate::config::Config;
use crate::error::ConfigError;
use crate::findings::{parse_clang_output, Finding};
use crate::selector;
use anyhow::{anyhow, bail, Context, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;
use tracing::{debug, info, warn};

/// Holds the results of a scan.
/// This struct is serialized to JSON if requested.
#[derive(Debug, Serialize)]
pub struct AnalysisResult {
    /// Findings per repository path, sorted by path.
    /// Files whose clang-tidy run failed are absent.
    pub findings: BTreeMap<String, Vec<Finding>>,
    pub analysis_summary: AnalysisSummary,
}

/// Summary statistics for the scan.
#[derive(Debug, Serialize)]
pub struct AnalysisSummary {
    /// Number of files selected for analysis.
    pub total_files: usize,
    /// Number of files clang-tidy ran on successfully.
    pub analyzed_files: usize,
    /// Number of files skipped because clang-tidy failed.
    pub failed_files: usize,
    /// Total number of findings across all files.
    pub findings_count: usize,
}

impl AnalysisResult {
    /// Collects per-file findings and derives the summary.
    pub fn new(findings: BTreeMap<String, Vec<Finding>>, total_files: usize) -> Self {
        let analyzed_files = findings.len();
        let findings_count = findings.values().map(Vec::len).sum();
        Self {
            findings,
            analysis_summary: AnalysisSummary {
                total_files,
                analyzed_files,
                failed_files: total_files.saturating_sub(analyzed_files),
                findings_count,
            },
        }
    }

    pub fn has_findings(&self) -> bool {
        self.findings.values().any(|f| !f.is_empty())
    }
}

/// The scan driver.
///
/// Nothing here mutates process-wide state: build commands get their working
/// directory and search path explicitly.
pub struct TidyScan {
    pub config: Config,
    pub sanitizer: Sanitizer,
    /// Directories searched before the inherited `PATH` when spawning build commands.
    pub search_path: Vec<PathBuf>,
}

impl TidyScan {
    /// Creates a new `TidyScan` from a loaded configuration.
    pub fn new(config: Config) -> Result<Self, ConfigError> {
        let sanitizer = config.sanitizer()?;
        Ok(Self {
            config,
            sanitizer,
            search_path: Vec::new(),
        })
    }

    pub fn with_search_path(mut self, dirs: Vec<PathBuf>) -> Self {
        self.search_path = dirs;
        self
    }

    /// Runs the whole scan on a repository.
    ///
    /// 1. Shadows the configured compilers.
    /// 2. Builds the merged, sanitized compile database and writes it to a temp dir.
    /// 3. Lists tracked files and keeps the analyzable ones the database covers.
    /// 4. Runs clang-tidy per file. A failing file is logged and left out.
    pub fn analyze(&self, repo: &Path) -> Result<AnalysisResult> {
        // Shadow the configured compilers for the build commands only.
        // The directory must outlive every build command, so it is held until we return.
        let fake_compilers = self.install_fake_compilers()?;
        let mut search_path: Vec<PathBuf> = fake_compilers
            .iter()
            .map(|dir| dir.path().to_path_buf())
            .collect();
        search_path.extend(self.search_path.iter().cloned());

        // Run the build commands and merge what they dump, earlier sources first.
        let db = self.generate_compile_commands(repo, &search_path)?;

        // clang-tidy reads the merged database from disk.
        let db_dir = TempDir::new().context("Failed to create compile database directory")?;
        let db_path = db_dir.path().join("compile_commands.json");
        compile_db::write_database(&db_path, &db)?;
        info!("Merged compile database has {} entries", db.len());

        // Only tracked C/C++ sources that have a compile command are analyzed.
        let files = self.find_repo_files(repo)?;
        let files = selector::analyzable_files(&files);
        let files = selector::covered_files(&files, &db);

        // Analyze file by file. One failing file does not stop the batch;
        // it is simply absent from the findings map.
        let mut findings = BTreeMap::new();
        for file in &files {
            match self.analyze_file(repo, file, &db_path) {
                Ok(file_findings) => {
                    findings.insert(file.clone(), file_findings);
                }
                Err(e) => warn!("Skipping {}: {:#}", file, e),
            }
        }

        Ok(AnalysisResult::new(findings, files.len()))
    }

    /// Symlinks every configured fake compiler name to the wrapper program.
    ///
    /// Returns `None` when no compilers are configured. The links live as long
    /// as the returned directory.
    pub fn install_fake_compilers(&self) -> Result<Option<TempDir>> {
        if self.config.fake_compilers.is_empty() {
            return Ok(None);
        }

        let target = self
            .config
            .fake_compiler_path()
            .ok_or_else(|| anyhow!("Cannot locate the fake compiler program"))?;
        if !target.exists() {
            bail!(
                "Fake compiler program {} does not exist (set `fake_compiler` in the config)",
                target.display()
            );
        }

        let dir = TempDir::new().context("Failed to create fake compiler directory")?;
        for cc in &self.config.fake_compilers {
            let link = dir.path().join(cc);
            link_program(&target, &link).with_context(|| {
                format!("Failed to install fake compiler {}", link.display())
            })?;
            debug!("Installed fake compiler {} -> {}", link.display(), target.display());
        }

        Ok(Some(dir))
    }

    /// Runs every configured build command and merges what they dump.
    ///
    /// Sources are merged in config order, so earlier sources win on
    /// duplicate files.
    pub fn generate_compile_commands(
        &self,
        repo: &Path,
        search_path: &[PathBuf],
    ) -> Result<Vec<CompileCommandEntry>> {
        let mut dbs = Vec::new();

        for src in &self.config.compilation_commands_sources {
            info!("Running `{}`", src.command);
            let mut cmd = Command::new("bash");
            // Build chatter goes to stderr so JSON reports stay clean.
            cmd.arg("-c")
                .arg(&src.command)
                .current_dir(repo)
                .stdout(std::io::stderr());
            if let Some(path) = joined_search_path(search_path)? {
                cmd.env("PATH", path);
            }

            match cmd.status() {
                Ok(status) if !status.success() => {
                    warn!("`{}` exited with {}", src.command, status)
                }
                Ok(_) => {}
                Err(e) => warn!("Failed to run `{}`: {}", src.command, e),
            }

            let db = compile_db::load_database(&repo.join(&src.path))?;
            dbs.push(self.sanitizer.sanitize(&db));
        }

        Ok(compile_db::merge_databases(dbs))
    }

    /// Lists every file tracked at `HEAD`.
    pub fn find_repo_files(&self, repo: &Path) -> Result<Vec<String>> {
        let output = Command::new("git")
            .args(["ls-tree", "--full-tree", "-r", "HEAD"])
            .current_dir(repo)
            .output()
            .context("Failed to run git ls-tree")?;

        if !output.status.success() {
            bail!(
                "git ls-tree failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        Ok(selector::parse_ls_tree(&String::from_utf8_lossy(
            &output.stdout,
        )))
    }

    /// Runs clang-tidy on one file and parses its diagnostics.
    pub fn analyze_file(&self, repo: &Path, file: &str, db_path: &Path) -> Result<Vec<Finding>> {
        let clang_tidy = self.config.clang_tidy();
        info!("{} {} -p {}", clang_tidy, file, db_path.display());

        let output = Command::new(clang_tidy)
            .arg(file)
            .arg("-p")
            .arg(db_path)
            .current_dir(repo)
            .output()
            .with_context(|| format!("Failed to run {}", clang_tidy))?;

        if !output.status.success() {
            bail!("{} exited with {}", clang_tidy, output.status);
        }

        Ok(parse_clang_output(&String::from_utf8_lossy(&output.stdout)))
    }
}

/// Prepends `dirs` to the inherited `PATH`. `None` means inherit unchanged.
fn joined_search_path(dirs: &[PathBuf]) -> Result<Option<OsString>> {
    if dirs.is_empty() {
        return Ok(None);
    }
    let inherited = std::env::var_os("PATH").unwrap_or_default();
    let all = dirs
        .iter()
        .cloned()
        .chain(std::env::split_paths(&inherited));
    Ok(Some(std::env::join_paths(all)?))
}

#[cfg(unix)]
fn link_program(target: &Path, link: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(not(unix))]
fn link_program(target: &Path, link: &Path) -> std::io::Result<()> {
    std::fs::copy(target, link).map(|_| ())
}
