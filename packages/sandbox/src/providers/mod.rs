// ABOUTME: Provider trait and shared types for remote sandbox backends
// ABOUTME: Defines the create/exec/write/kill surface every sandbox platform must offer

use async_trait::async_trait;
use thiserror::Error;

pub mod e2b;
pub mod envd;

pub use e2b::{E2BConfig, E2BProvider};

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Timed out after {0}s")]
    Timeout(u64),

    #[error("Template not found: {0}")]
    TemplateNotFound(String),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, ProviderError>;

/// Live handle to a sandbox created by a provider
#[derive(Debug, Clone, PartialEq)]
pub struct SandboxInfo {
    pub sandbox_id: String,
    pub template_id: String,
    pub client_id: Option<String>,
    pub envd_version: Option<String>,
    pub envd_access_token: Option<String>,
    /// Domain the sandbox is served from, when it differs from the provider default
    pub domain: Option<String>,
}

/// Execution result from running a command in a sandbox
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecResult {
    pub exit_code: i64,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl ExecResult {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    pub fn stdout_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stdout).to_string()
    }

    pub fn stderr_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stderr).to_string()
    }
}

/// Provider trait for remote sandbox platforms
#[async_trait]
pub trait Provider: Send + Sync {
    /// Create a sandbox from a template reference (`name` or `name:tag`)
    async fn create_sandbox(&self, template_ref: &str, timeout_secs: u64) -> Result<SandboxInfo>;

    /// Run a shell command inside the sandbox and wait for it to finish
    async fn exec_command(&self, sandbox: &SandboxInfo, command: &str) -> Result<ExecResult>;

    /// Write a file into the sandbox filesystem
    async fn write_file(&self, sandbox: &SandboxInfo, path: &str, contents: &[u8]) -> Result<()>;

    /// Terminate a sandbox. Terminating an already gone sandbox succeeds.
    async fn kill_sandbox(&self, sandbox_id: &str) -> Result<()>;

    /// Assign tags to an existing template build, returning the tags now on it
    async fn assign_tags(&self, target: &str, tags: &[String]) -> Result<Vec<String>>;
}
