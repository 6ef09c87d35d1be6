// ABOUTME: Generic runner that verifies one scenario against a fresh sandbox
// ABOUTME: Acquire, run checks in order with fail-fast, then release exactly once

use crate::providers::{ExecResult, Provider, ProviderError};
use crate::scenario::{Scenario, StagedScript};
use crate::session::SandboxSession;
use crate::template::TemplateRef;
use futures::FutureExt;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tplcheck_config::constants;
use tracing::{debug, info, warn};

/// Confirmation printed when every check of a scenario passed
pub const SUCCESS_MESSAGE: &str = "All checks passed.";

#[derive(Error, Debug)]
pub enum VerifyError {
    #[error("Failed to provision sandbox for {template}: {source}")]
    Provisioning {
        template: String,
        #[source]
        source: ProviderError,
    },

    #[error("{label} check failed: {stderr}")]
    CheckFailed {
        label: String,
        command: String,
        exit_code: i64,
        stderr: String,
    },

    #[error("{label} check failed: {source}")]
    Transport {
        label: String,
        #[source]
        source: ProviderError,
    },

    #[error("Failed to read staged script {}: {source}", .path.display())]
    Staging {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl VerifyError {
    /// Label of the check that failed, if a check was reached
    pub fn failed_label(&self) -> Option<&str> {
        match self {
            VerifyError::CheckFailed { label, .. } | VerifyError::Transport { label, .. } => {
                Some(label)
            }
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, VerifyError>;

/// Outcome of one command inside a session
#[derive(Debug, Clone, PartialEq)]
pub struct CheckResult {
    pub command: String,
    pub exit_code: i64,
    pub stdout: String,
    pub stderr: String,
}

impl CheckResult {
    pub fn new(command: &str, result: ExecResult) -> Self {
        Self {
            command: command.to_string(),
            exit_code: result.exit_code,
            stdout: result.stdout_lossy(),
            stderr: result.stderr_lossy(),
        }
    }

    pub fn passed(&self) -> bool {
        self.exit_code == 0
    }

    fn into_failure(self, label: &str) -> VerifyError {
        VerifyError::CheckFailed {
            label: label.to_string(),
            command: self.command,
            exit_code: self.exit_code,
            stderr: self.stderr.trim_end().to_string(),
        }
    }
}

/// Successful verification of a scenario
#[derive(Debug, Clone)]
pub struct VerificationReport {
    pub scenario: String,
    pub template: TemplateRef,
    pub passed: Vec<CheckResult>,
    /// Combined stdout and stderr of the staged script, when there is one
    pub staged_output: Option<String>,
}

impl fmt::Display for VerificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(output) = &self.staged_output {
            let output = output.trim_end();
            if !output.is_empty() {
                writeln!(f, "{}", output)?;
            }
        }
        write!(f, "{}", SUCCESS_MESSAGE)
    }
}

/// Runs scenarios against sandboxes created through a provider
pub struct Verifier {
    provider: Arc<dyn Provider>,
    templates_dir: PathBuf,
    tag: Option<String>,
}

impl Verifier {
    pub fn new(provider: Arc<dyn Provider>) -> Self {
        Self {
            provider,
            templates_dir: PathBuf::from(constants::DEFAULT_TEMPLATES_DIR),
            tag: None,
        }
    }

    pub fn with_templates_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.templates_dir = dir.into();
        self
    }

    pub fn with_tag(mut self, tag: Option<String>) -> Self {
        self.tag = tag;
        self
    }

    /// Verify `scenario`. The sandbox, once created, is released exactly once
    /// whatever the outcome. A panicking check is re-raised after release.
    pub async fn run(&self, scenario: &Scenario) -> Result<VerificationReport> {
        let staged = match &scenario.staged {
            Some(script) => Some((script, self.read_staged(script)?)),
            None => None,
        };

        let template = scenario.template_ref(self.tag.as_deref());
        info!("Verifying {} on template {}", scenario.name, template);

        let mut session = SandboxSession::acquire(
            Arc::clone(&self.provider),
            template.clone(),
            scenario.timeout_secs,
        )
        .await
        .map_err(|source| VerifyError::Provisioning {
            template: template.to_string(),
            source,
        })?;

        let outcome = AssertUnwindSafe(run_checks(&mut session, scenario, staged))
            .catch_unwind()
            .await;

        match outcome {
            Ok(outcome) => {
                session.finish(outcome.is_ok());
                session.release().await;
                outcome
            }
            Err(panic) => {
                warn!("Check panicked in {}, releasing sandbox", scenario.name);
                session.finish(false);
                session.release().await;
                std::panic::resume_unwind(panic)
            }
        }
    }

    fn read_staged(&self, script: &StagedScript) -> Result<Vec<u8>> {
        let path = self.templates_dir.join(&script.local_path);
        std::fs::read(&path).map_err(|source| VerifyError::Staging { path, source })
    }
}

async fn run_checks(
    session: &mut SandboxSession,
    scenario: &Scenario,
    staged: Option<(&StagedScript, Vec<u8>)>,
) -> Result<VerificationReport> {
    let mut report = VerificationReport {
        scenario: scenario.name.clone(),
        template: session.template().clone(),
        passed: Vec::with_capacity(scenario.command_count()),
        staged_output: None,
    };

    for check in &scenario.checks {
        let result = run_one(session, &check.command, &check.label).await?;
        report.passed.push(result);
    }

    if let Some((script, contents)) = staged {
        session
            .write_file(&script.remote_path, &contents)
            .await
            .map_err(|source| VerifyError::Transport {
                label: script.label.clone(),
                source,
            })?;
        debug!("Staged {} bytes at {}", contents.len(), script.remote_path);

        let result = run_one(session, &script.command(), &script.label).await?;
        report.staged_output = Some(format!("{}{}", result.stdout, result.stderr));
        report.passed.push(result);
    }

    Ok(report)
}

async fn run_one(session: &mut SandboxSession, command: &str, label: &str) -> Result<CheckResult> {
    let result = session
        .run(command)
        .await
        .map_err(|source| VerifyError::Transport {
            label: label.to_string(),
            source,
        })?;

    let result = CheckResult::new(command, result);
    if !result.passed() {
        return Err(result.into_failure(label));
    }

    debug!("{} check passed: {}", label, result.stdout.trim_end());
    Ok(result)
}
