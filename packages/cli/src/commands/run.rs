// ABOUTME: `tplcheck run` - verify one or more template scenarios
// ABOUTME: Independent scenarios run in parallel, each on its own sandbox

use anyhow::{anyhow, bail, Result};
use colored::*;
use std::sync::Arc;
use tokio::task::JoinSet;
use tplcheck_sandbox::{catalog, Scenario, VerificationReport, Verifier, SUCCESS_MESSAGE};
use tracing::warn;

/// Result of verifying one scenario
#[derive(Debug)]
pub struct ScenarioOutcome {
    pub scenario: String,
    pub result: Result<VerificationReport>,
}

impl ScenarioOutcome {
    pub fn passed(&self) -> bool {
        self.result.is_ok()
    }
}

/// Resolve scenario names against the catalog, preserving the given order
pub fn select(names: &[String], all: bool) -> Result<Vec<Scenario>> {
    if all {
        return Ok(catalog::all());
    }
    if names.is_empty() {
        bail!(
            "No scenario given. Available: {}",
            catalog::names().join(", ")
        );
    }

    names
        .iter()
        .map(|name| {
            catalog::find(name).ok_or_else(|| {
                anyhow!(
                    "Unknown scenario '{}'. Available: {}",
                    name,
                    catalog::names().join(", ")
                )
            })
        })
        .collect()
}

/// Verify every scenario and return outcomes in the order given
pub async fn execute(verifier: Arc<Verifier>, scenarios: Vec<Scenario>) -> Vec<ScenarioOutcome> {
    if let [scenario] = scenarios.as_slice() {
        return vec![ScenarioOutcome {
            scenario: scenario.name.clone(),
            result: verifier.run(scenario).await.map_err(Into::into),
        }];
    }

    let mut tasks = JoinSet::new();
    for (index, scenario) in scenarios.iter().cloned().enumerate() {
        let verifier = Arc::clone(&verifier);
        tasks.spawn(async move {
            let result = verifier.run(&scenario).await;
            (index, result)
        });
    }

    let mut results: Vec<Option<Result<VerificationReport>>> =
        scenarios.iter().map(|_| None).collect();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, result)) => results[index] = Some(result.map_err(Into::into)),
            Err(e) => warn!("Verification task ended abnormally: {}", e),
        }
    }

    scenarios
        .into_iter()
        .zip(results)
        .map(|(scenario, result)| ScenarioOutcome {
            scenario: scenario.name,
            result: result
                .unwrap_or_else(|| Err(anyhow!("verification task panicked"))),
        })
        .collect()
}

/// Print outcomes. A single scenario prints its report or returns its error
/// unchanged; several scenarios print one line each and a summary.
pub fn report(mut outcomes: Vec<ScenarioOutcome>) -> Result<()> {
    if outcomes.len() == 1 {
        if let Some(outcome) = outcomes.pop() {
            println!("{}", outcome.result?);
        }
        return Ok(());
    }

    let total = outcomes.len();
    let mut failed = 0;
    for outcome in outcomes {
        match outcome.result {
            Ok(_) => println!("{} {}", "✓".green().bold(), outcome.scenario.bold()),
            Err(e) => {
                failed += 1;
                eprintln!("{} {}: {}", "✗".red().bold(), outcome.scenario.bold(), e);
            }
        }
    }

    if failed > 0 {
        bail!("{} of {} scenarios failed", failed, total);
    }
    println!("{}", SUCCESS_MESSAGE);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_by_name_keeps_order() {
        let names = vec!["opencode".to_string(), "codex".to_string()];
        let selected: Vec<_> = select(&names, false)
            .unwrap()
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(selected, vec!["opencode", "codex"]);
    }

    #[test]
    fn test_select_all() {
        assert_eq!(select(&[], true).unwrap().len(), catalog::all().len());
    }

    #[test]
    fn test_select_unknown() {
        let err = select(&["nope".to_string()], false).unwrap_err();
        assert!(err.to_string().contains("Unknown scenario 'nope'"));
        assert!(err.to_string().contains("codex"));
    }

    #[test]
    fn test_select_nothing() {
        assert!(select(&[], false).is_err());
    }
}
