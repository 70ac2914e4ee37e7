//! GitHub check-run reporting.
//!
//! Findings become warning annotations on a neutral, completed check run.
//! Uses ureq (sync HTTP), no async runtime needed.

use crate::error::ReportError;
use crate::findings::Finding;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::info;

pub const GITHUB_API_URL: &str = "https://api.github.com";

const CHECK_NAME: &str = "clang-tidy";

/// Where and as whom findings are reported.
#[derive(Debug, Clone)]
pub struct GithubContext {
    /// `owner/name` of the repository.
    pub repository: String,
    /// Commit the check run is attached to.
    pub sha: String,
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct CheckRun {
    pub name: String,
    pub head_sha: String,
    pub status: String,
    pub conclusion: String,
    pub output: CheckRunOutput,
}

#[derive(Debug, Serialize)]
pub struct CheckRunOutput {
    pub title: String,
    pub summary: String,
    pub annotations: Vec<Annotation>,
}

#[derive(Debug, Serialize)]
pub struct Annotation {
    pub path: String,
    pub annotation_level: String,
    pub start_line: usize,
    pub end_line: usize,
    pub message: String,
}

/// Builds the check-run payload, one annotation per finding.
pub fn build_check_run(sha: &str, findings: &BTreeMap<String, Vec<Finding>>) -> CheckRun {
    let annotations: Vec<Annotation> = findings
        .iter()
        .flat_map(|(path, file_findings)| {
            file_findings.iter().map(move |f| Annotation {
                path: path.clone(),
                annotation_level: "warning".to_string(),
                start_line: f.line,
                end_line: f.line,
                message: f.text.clone(),
            })
        })
        .collect();

    CheckRun {
        name: CHECK_NAME.to_string(),
        head_sha: sha.to_string(),
        status: "completed".to_string(),
        conclusion: "neutral".to_string(),
        output: CheckRunOutput {
            title: CHECK_NAME.to_string(),
            summary: format!("Found {} item", annotations.len()),
            annotations,
        },
    }
}

pub fn check_runs_url(api_url: &str, repository: &str) -> String {
    format!("{}/repos/{}/check-runs", api_url.trim_end_matches('/'), repository)
}

/// Posts check runs to the GitHub REST API.
pub struct GithubReporter {
    api_url: String,
    agent: ureq::Agent,
}

impl Default for GithubReporter {
    fn default() -> Self {
        Self::new(GITHUB_API_URL)
    }
}

impl GithubReporter {
    pub fn new(api_url: impl Into<String>) -> Self {
        let agent = ureq::config::Config::builder()
            .http_status_as_error(false)
            .timeout_global(Some(std::time::Duration::from_secs(30)))
            .build()
            .new_agent();
        Self {
            api_url: api_url.into(),
            agent,
        }
    }

    /// Creates a check run annotating every finding.
    pub fn report(
        &self,
        ctx: &GithubContext,
        findings: &BTreeMap<String, Vec<Finding>>,
    ) -> Result<(), ReportError> {
        info!(
            "Logging annotations to github ({}, {})",
            ctx.repository, ctx.sha
        );
        let url = check_runs_url(&self.api_url, &ctx.repository);
        let check_run = build_check_run(&ctx.sha, findings);

        let response = self
            .agent
            .post(url.as_str())
            .header("Content-Type", "application/json")
            .header("Accept", "application/vnd.github.antiope-preview+json")
            .header("Authorization", &format!("Bearer {}", ctx.token))
            .send_json(&check_run)
            .map_err(|e| ReportError::RequestFailed(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .into_body()
            .read_to_string()
            .map_err(|e| ReportError::RequestFailed(format!("failed to read response: {}", e)))?;
        if status >= 400 {
            return Err(ReportError::ApiError {
                status,
                message: body,
            });
        }

        info!("GitHub answered {}: {}", status, body);
        Ok(())
    }
}
