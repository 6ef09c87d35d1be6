// ABOUTME: Subcommand implementations shared by the tplcheck binary and its tests
// ABOUTME: run verifies scenarios, list shows the catalog, tag promotes template builds

pub mod list;
pub mod run;
pub mod tag;
