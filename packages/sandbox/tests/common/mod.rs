// ABOUTME: Scripted in-memory provider shared by the integration tests
// ABOUTME: Records every call so tests can assert on ordering and release counts

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;
use tplcheck_sandbox::providers::{ExecResult, Provider, ProviderError, Result, SandboxInfo};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Create { template: String, timeout_secs: u64 },
    Exec(String),
    Write { path: String, contents: Vec<u8> },
    Kill(String),
    AssignTags { target: String, tags: Vec<String> },
}

#[derive(Default)]
pub struct FakeProvider {
    calls: Mutex<Vec<Call>>,
    failures: HashMap<String, (i64, String)>,
    transport_failures: HashSet<String>,
    panics: HashSet<String>,
    hangs: HashSet<String>,
    create_fails: bool,
    write_fails: bool,
    kill_fails: bool,
    kill_delay: Option<Duration>,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `command` exit with `exit_code` and print `stderr`
    pub fn failing(mut self, command: &str, exit_code: i64, stderr: &str) -> Self {
        self.failures
            .insert(command.to_string(), (exit_code, stderr.to_string()));
        self
    }

    /// Make the exec call for `command` itself fail
    pub fn unreachable_on(mut self, command: &str) -> Self {
        self.transport_failures.insert(command.to_string());
        self
    }

    pub fn panicking_on(mut self, command: &str) -> Self {
        self.panics.insert(command.to_string());
        self
    }

    /// Make `command` never complete
    pub fn hanging_on(mut self, command: &str) -> Self {
        self.hangs.insert(command.to_string());
        self
    }

    pub fn without_capacity(mut self) -> Self {
        self.create_fails = true;
        self
    }

    pub fn with_failing_kill(mut self) -> Self {
        self.kill_fails = true;
        self
    }

    /// Make every file upload fail
    pub fn failing_write(mut self) -> Self {
        self.write_fails = true;
        self
    }

    /// Wait before recording a kill, like a real DELETE round trip
    pub fn with_slow_kill(mut self, delay: Duration) -> Self {
        self.kill_delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn executed(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Exec(command) => Some(command),
                _ => None,
            })
            .collect()
    }

    pub fn created(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Create { template, .. } => Some(template),
                _ => None,
            })
            .collect()
    }

    pub fn kills(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, Call::Kill(_)))
            .count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl Provider for FakeProvider {
    async fn create_sandbox(&self, template_ref: &str, timeout_secs: u64) -> Result<SandboxInfo> {
        self.record(Call::Create {
            template: template_ref.to_string(),
            timeout_secs,
        });
        if self.create_fails {
            return Err(ProviderError::Timeout(timeout_secs));
        }

        Ok(SandboxInfo {
            sandbox_id: format!("sbx-{}", template_ref.replace(':', "-")),
            template_id: template_ref.to_string(),
            client_id: None,
            envd_version: Some("0.2.0".to_string()),
            envd_access_token: None,
            domain: None,
        })
    }

    async fn exec_command(&self, _sandbox: &SandboxInfo, command: &str) -> Result<ExecResult> {
        self.record(Call::Exec(command.to_string()));

        if self.panics.contains(command) {
            panic!("scripted panic on {}", command);
        }
        if self.hangs.contains(command) {
            std::future::pending::<()>().await;
        }
        if self.transport_failures.contains(command) {
            return Err(ProviderError::Connection("connection reset".to_string()));
        }
        if let Some((exit_code, stderr)) = self.failures.get(command) {
            return Ok(ExecResult {
                exit_code: *exit_code,
                stdout: Vec::new(),
                stderr: stderr.as_bytes().to_vec(),
            });
        }

        Ok(ExecResult {
            exit_code: 0,
            stdout: format!("{} ok\n", command).into_bytes(),
            stderr: Vec::new(),
        })
    }

    async fn write_file(&self, _sandbox: &SandboxInfo, path: &str, contents: &[u8]) -> Result<()> {
        self.record(Call::Write {
            path: path.to_string(),
            contents: contents.to_vec(),
        });
        if self.write_fails {
            return Err(ProviderError::Connection("upload interrupted".to_string()));
        }
        Ok(())
    }

    async fn kill_sandbox(&self, sandbox_id: &str) -> Result<()> {
        if let Some(delay) = self.kill_delay {
            tokio::time::sleep(delay).await;
        }
        self.record(Call::Kill(sandbox_id.to_string()));
        if self.kill_fails {
            return Err(ProviderError::Api {
                status: 500,
                message: "internal error".to_string(),
            });
        }
        Ok(())
    }

    async fn assign_tags(&self, target: &str, tags: &[String]) -> Result<Vec<String>> {
        self.record(Call::AssignTags {
            target: target.to_string(),
            tags: tags.to_vec(),
        });
        Ok(tags.to_vec())
    }
}
