// ABOUTME: `tplcheck list` - show the built-in scenario catalog
// ABOUTME: Renders scenarios, their templates and checks as a table

use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, ContentArrangement, Table};
use tplcheck_sandbox::{catalog, Scenario};

fn describe_checks(scenario: &Scenario) -> String {
    let mut labels: Vec<String> = scenario.checks.iter().map(|c| c.label.clone()).collect();
    if let Some(script) = &scenario.staged {
        labels.push(format!("{} (staged)", script.label));
    }
    labels.join(", ")
}

pub fn render() -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec!["Scenario", "Template", "Tag override", "Checks"]);

    for scenario in catalog::all() {
        table.add_row(vec![
            scenario.name.clone(),
            scenario.template.clone(),
            if scenario.honors_tag { "yes" } else { "no" }.to_string(),
            describe_checks(&scenario),
        ]);
    }

    table.to_string()
}

pub fn execute() {
    println!("{}", render());
}
