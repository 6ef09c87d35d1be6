// ABOUTME: Environment variable name constants and defaults
// ABOUTME: Centralized definitions of all environment variable names used across tplcheck

// E2B Platform Configuration
pub const E2B_API_KEY: &str = "E2B_API_KEY";
pub const E2B_DOMAIN: &str = "E2B_DOMAIN";
pub const E2B_API_URL: &str = "E2B_API_URL";
pub const E2B_SANDBOX_URL: &str = "E2B_SANDBOX_URL"; // envd override, used for local testing

// Template Selection
pub const E2B_TEMPLATE_TAG: &str = "E2B_TEMPLATE_TAG";
pub const E2B_SOURCE_TAG: &str = "E2B_SOURCE_TAG";
pub const TPLCHECK_TEMPLATES_DIR: &str = "TPLCHECK_TEMPLATES_DIR";

// Logging
pub const RUST_LOG: &str = "RUST_LOG";

// Defaults
pub const DEFAULT_DOMAIN: &str = "e2b.app";
pub const DEFAULT_SOURCE_TAG: &str = "dev";
pub const DEFAULT_TEMPLATES_DIR: &str = "templates";
pub const DEFAULT_LOG_FILTER: &str = "warn";
