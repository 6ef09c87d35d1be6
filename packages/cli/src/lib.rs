// ABOUTME: Library half of the tplcheck CLI
// ABOUTME: Exposes command handlers, configuration and logging for the binary and tests

pub mod commands;
pub mod config;
pub mod logging;
