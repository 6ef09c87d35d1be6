// ABOUTME: `tplcheck tag` - promote a template build to its release tags
// ABOUTME: Assigns v<version> and lts to <template>:<source-tag>

use anyhow::Result;
use colored::*;
use std::path::Path;
use tplcheck_sandbox::{tag_template, Provider};

pub async fn execute(
    provider: &dyn Provider,
    templates_dir: &Path,
    template: &str,
    source_tag: &str,
) -> Result<()> {
    let outcome = tag_template(provider, templates_dir, template, source_tag).await?;

    println!(
        "{} Tagged {} as {}",
        "✓".green().bold(),
        outcome.target.bold(),
        outcome.tags.join(", ")
    );
    Ok(())
}
