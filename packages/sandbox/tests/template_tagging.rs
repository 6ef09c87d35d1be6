// ABOUTME: Tests promoting a template build to its release tags
// ABOUTME: Uses a temporary templates directory and the scripted provider

mod common;

use common::{Call, FakeProvider};
use std::fs;
use tempfile::TempDir;
use tplcheck_sandbox::{tag_template, TagError};

fn templates_dir(template: &str, version: &str) -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join(template)).unwrap();
    fs::write(dir.path().join(template).join("version"), version).unwrap();
    dir
}

#[tokio::test]
async fn test_tags_source_build() {
    let dir = templates_dir("codex", "1.2.3\n");
    let provider = FakeProvider::new();

    let outcome = tag_template(&provider, dir.path(), "codex", "dev")
        .await
        .unwrap();

    assert_eq!(outcome.target, "codex:dev");
    assert_eq!(outcome.tags, vec!["v1.2.3", "lts"]);
    assert_eq!(
        provider.calls(),
        vec![Call::AssignTags {
            target: "codex:dev".to_string(),
            tags: vec!["v1.2.3".to_string(), "lts".to_string()],
        }]
    );
}

#[tokio::test]
async fn test_invalid_version_never_reaches_provider() {
    let dir = templates_dir("openclaw", "latest");
    let provider = FakeProvider::new();

    let err = tag_template(&provider, dir.path(), "openclaw", "dev")
        .await
        .unwrap_err();

    assert!(matches!(err, TagError::InvalidVersion { .. }));
    assert!(err.to_string().starts_with("Invalid version format \"latest\""));
    assert!(provider.calls().is_empty());
}
