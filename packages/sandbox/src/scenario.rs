// ABOUTME: Declarative description of one template verification scenario
// ABOUTME: A template name plus an ordered list of (command, failure label) checks

use crate::template::TemplateRef;
use std::path::PathBuf;

/// Sandbox startup bound used by every built-in scenario
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// A single command whose exit code decides pass or fail
#[derive(Debug, Clone, PartialEq)]
pub struct Check {
    pub command: String,
    /// Name used in the failure message, e.g. `node` in "node check failed"
    pub label: String,
}

impl Check {
    pub fn new(command: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            label: label.into(),
        }
    }
}

/// A local script uploaded into the sandbox and executed as one check
#[derive(Debug, Clone, PartialEq)]
pub struct StagedScript {
    /// Path relative to the templates directory
    pub local_path: PathBuf,
    pub remote_path: String,
    pub label: String,
}

impl StagedScript {
    pub fn new(
        local_path: impl Into<PathBuf>,
        remote_path: impl Into<String>,
        label: impl Into<String>,
    ) -> Self {
        Self {
            local_path: local_path.into(),
            remote_path: remote_path.into(),
            label: label.into(),
        }
    }

    pub fn command(&self) -> String {
        format!("bash {}", self.remote_path)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Scenario {
    pub name: String,
    pub template: String,
    pub checks: Vec<Check>,
    pub staged: Option<StagedScript>,
    pub timeout_secs: u64,
    /// Whether the tag override selects a build of this template
    pub honors_tag: bool,
}

impl Scenario {
    pub fn new(name: impl Into<String>, template: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            template: template.into(),
            checks: Vec::new(),
            staged: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            honors_tag: false,
        }
    }

    pub fn check(mut self, command: impl Into<String>, label: impl Into<String>) -> Self {
        self.checks.push(Check::new(command, label));
        self
    }

    pub fn staged(mut self, script: StagedScript) -> Self {
        self.staged = Some(script);
        self
    }

    pub fn tagged(mut self) -> Self {
        self.honors_tag = true;
        self
    }

    /// Effective template for this run given the tag override
    pub fn template_ref(&self, tag: Option<&str>) -> TemplateRef {
        let template = TemplateRef::new(&self.template);
        if self.honors_tag {
            template.with_tag(tag)
        } else {
            template
        }
    }

    /// Number of commands the scenario runs inside the sandbox
    pub fn command_count(&self) -> usize {
        self.checks.len() + usize::from(self.staged.is_some())
    }
}
