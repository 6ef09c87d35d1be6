// ABOUTME: Sandbox template verification: providers, scenario catalog and runner
// ABOUTME: Each scenario acquires a sandbox, runs ordered checks and always releases it

pub mod catalog;
pub mod providers;
pub mod scenario;
pub mod session;
pub mod tagging;
pub mod template;
pub mod verify;

pub use providers::{E2BConfig, E2BProvider, ExecResult, Provider, ProviderError, SandboxInfo};
pub use scenario::{Check, Scenario, StagedScript};
pub use session::{SandboxSession, SessionState};
pub use tagging::{tag_template, TagError, TagOutcome};
pub use template::TemplateRef;
pub use verify::{CheckResult, VerificationReport, Verifier, VerifyError, SUCCESS_MESSAGE};
