// ABOUTME: Scoped ownership of one remote sandbox with guaranteed single release
// ABOUTME: Explicit release is the normal path; Drop schedules termination if the future is cancelled

use crate::providers::{ExecResult, Provider, Result, SandboxInfo};
use crate::template::TemplateRef;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Lifecycle of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Created,
    /// Running the check at this zero-based position
    Checking(usize),
    Passed,
    Failed,
    Released,
}

/// An exclusively owned sandbox. Call [`SandboxSession::release`] when done.
pub struct SandboxSession {
    provider: Arc<dyn Provider>,
    sandbox: SandboxInfo,
    template: TemplateRef,
    state: SessionState,
    commands_run: usize,
}

impl SandboxSession {
    /// Create a sandbox for `template`. Nothing needs releasing if this fails.
    pub async fn acquire(
        provider: Arc<dyn Provider>,
        template: TemplateRef,
        timeout_secs: u64,
    ) -> Result<Self> {
        let sandbox = provider
            .create_sandbox(&template.to_string(), timeout_secs)
            .await?;
        debug!("Session for {} holds sandbox {}", template, sandbox.sandbox_id);

        Ok(Self {
            provider,
            sandbox,
            template,
            state: SessionState::Created,
            commands_run: 0,
        })
    }

    pub fn template(&self) -> &TemplateRef {
        &self.template
    }

    /// Run one command, blocking the session until it completes
    pub async fn run(&mut self, command: &str) -> Result<ExecResult> {
        self.state = SessionState::Checking(self.commands_run);
        self.commands_run += 1;
        self.provider.exec_command(&self.sandbox, command).await
    }

    pub async fn write_file(&self, path: &str, contents: &[u8]) -> Result<()> {
        self.provider.write_file(&self.sandbox, path, contents).await
    }

    /// Record the verdict before release
    pub fn finish(&mut self, passed: bool) {
        self.state = if passed {
            SessionState::Passed
        } else {
            SessionState::Failed
        };
    }

    /// Terminate the sandbox. Failures are logged, never returned, so they
    /// cannot mask the verification outcome.
    pub async fn release(mut self) {
        let verdict = std::mem::replace(&mut self.state, SessionState::Released);
        match self.provider.kill_sandbox(&self.sandbox.sandbox_id).await {
            Ok(()) => info!(
                "Released sandbox {} ({}) in state {:?}",
                self.sandbox.sandbox_id, self.template, verdict
            ),
            Err(e) => warn!(
                "Failed to release sandbox {} ({}): {}",
                self.sandbox.sandbox_id, self.template, e
            ),
        }
    }
}

impl Drop for SandboxSession {
    fn drop(&mut self) {
        let state = std::mem::replace(&mut self.state, SessionState::Released);
        if state == SessionState::Released {
            return;
        }

        let sandbox_id = self.sandbox.sandbox_id.clone();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                warn!(
                    "Session dropped in state {:?} without release, killing sandbox {}",
                    state, sandbox_id
                );
                let provider = Arc::clone(&self.provider);
                handle.spawn(async move {
                    if let Err(e) = provider.kill_sandbox(&sandbox_id).await {
                        warn!("Failed to release sandbox {}: {}", sandbox_id, e);
                    }
                });
            }
            Err(_) => warn!(
                "Session dropped outside a runtime, sandbox {} left to expire",
                sandbox_id
            ),
        }
    }
}
