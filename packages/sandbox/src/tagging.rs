// ABOUTME: Promotes a template build to its release tags
// ABOUTME: Reads templates/<name>/version, validates X.Y.Z and assigns v<version> and lts

use crate::providers::{Provider, ProviderError};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use thiserror::Error;
use tracing::info;

static VERSION_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\.\d+\.\d+$").expect("version pattern is valid"));

/// Tag that always follows the newest release
pub const LTS_TAG: &str = "lts";

#[derive(Error, Debug)]
pub enum TagError {
    #[error("Could not read version file: {}", .path.display())]
    VersionFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid version format {version:?} in {}. Expected X.Y.Z", .path.display())]
    InvalidVersion { version: String, path: PathBuf },

    #[error("Failed to assign tags to {target}: {source}")]
    Provider {
        target: String,
        #[source]
        source: ProviderError,
    },
}

/// Tags assigned by a successful run
#[derive(Debug, Clone, PartialEq)]
pub struct TagOutcome {
    pub target: String,
    pub tags: Vec<String>,
}

pub fn version_file(templates_dir: &Path, template: &str) -> PathBuf {
    templates_dir.join(template).join("version")
}

/// Read and validate the template's release version
pub fn read_version(templates_dir: &Path, template: &str) -> Result<String, TagError> {
    let path = version_file(templates_dir, template);
    let version = std::fs::read_to_string(&path)
        .map_err(|source| TagError::VersionFile {
            path: path.clone(),
            source,
        })?
        .trim()
        .to_string();

    if !VERSION_PATTERN.is_match(&version) {
        return Err(TagError::InvalidVersion { version, path });
    }
    Ok(version)
}

pub fn release_tags(version: &str) -> Vec<String> {
    vec![format!("v{}", version), LTS_TAG.to_string()]
}

/// Assign `v<version>` and `lts` to `<template>:<source_tag>`
pub async fn tag_template(
    provider: &dyn Provider,
    templates_dir: &Path,
    template: &str,
    source_tag: &str,
) -> Result<TagOutcome, TagError> {
    let version = read_version(templates_dir, template)?;
    let target = format!("{}:{}", template, source_tag);
    let tags = release_tags(&version);

    info!("Assigning tags {:?} to {}", tags, target);
    provider
        .assign_tags(&target, &tags)
        .await
        .map_err(|source| TagError::Provider {
            target: target.clone(),
            source,
        })?;

    Ok(TagOutcome { target, tags })
}
