use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::*;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use tplcheck_cli::commands::{list, run, tag};
use tplcheck_cli::config::Config;
use tplcheck_cli::logging;
use tplcheck_sandbox::{E2BProvider, Verifier};

#[derive(Parser)]
#[command(name = "tplcheck")]
#[command(about = "Verify sandbox templates by running smoke checks inside live sandboxes")]
#[command(version)]
struct Cli {
    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Verify one or more scenarios
    Run {
        /// Scenario names, see `tplcheck list`
        scenarios: Vec<String>,

        /// Verify every scenario in the catalog
        #[arg(long, conflicts_with = "scenarios")]
        all: bool,

        /// Template tag for tag-aware scenarios (overrides E2B_TEMPLATE_TAG)
        #[arg(long)]
        tag: Option<String>,

        /// Directory holding template sources and staged scripts
        #[arg(long)]
        templates_dir: Option<PathBuf>,
    },
    /// List available scenarios
    List,
    /// Assign v<version> and lts to a template build
    Tag {
        /// Template name, e.g. codex
        template: String,

        /// Tag of the build to promote (overrides E2B_SOURCE_TAG)
        #[arg(long)]
        source_tag: Option<String>,

        /// Directory holding template sources
        #[arg(long)]
        templates_dir: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    logging::init(cli.verbose);

    if let Err(e) = handle_command(cli.command).await {
        eprintln!("{} {}", "Error:".red().bold(), e);
        process::exit(1);
    }
}

async fn handle_command(command: Commands) -> Result<()> {
    match command {
        Commands::List => {
            list::execute();
            Ok(())
        }
        Commands::Run {
            scenarios,
            all,
            tag,
            templates_dir,
        } => {
            let selected = run::select(&scenarios, all)?;
            let config = Config::from_env()?;
            let provider = Arc::new(E2BProvider::new(config.e2b.clone())?);

            let verifier = Verifier::new(provider)
                .with_templates_dir(templates_dir.unwrap_or(config.templates_dir))
                .with_tag(tag.or(config.template_tag));

            let outcomes = run::execute(Arc::new(verifier), selected).await;
            run::report(outcomes)
        }
        Commands::Tag {
            template,
            source_tag,
            templates_dir,
        } => {
            let config = Config::from_env()?;
            let provider = E2BProvider::new(config.e2b.clone())?;
            let templates_dir = templates_dir.unwrap_or(config.templates_dir);
            let source_tag = source_tag.unwrap_or(config.source_tag);

            tag::execute(&provider, &templates_dir, &template, &source_tag).await
        }
    }
}
