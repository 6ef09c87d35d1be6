// ABOUTME: Template references of the form `name` or `name:tag`
// ABOUTME: Blank tags leave the reference untagged so the base build is used

use std::fmt;

/// A template name, optionally pinned to a tagged build
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateRef {
    pub name: String,
    pub tag: Option<String>,
}

impl TemplateRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tag: None,
        }
    }

    /// Pin to `tag`; blank tags leave the reference untagged
    pub fn with_tag(mut self, tag: Option<&str>) -> Self {
        self.tag = tag
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string);
        self
    }
}

impl fmt::Display for TemplateRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.tag {
            Some(tag) => write!(f, "{}:{}", self.name, tag),
            None => write!(f, "{}", self.name),
        }
    }
}
