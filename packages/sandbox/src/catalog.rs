// ABOUTME: Built-in verification scenarios for every published sandbox template
// ABOUTME: Near-duplicate variants of the same template are kept as separately named scenarios

use crate::scenario::{Scenario, StagedScript};

/// Toolchain shared by the Claude templates
fn claude_toolchain(scenario: Scenario) -> Scenario {
    scenario
        .check("docker --version", "docker")
        .check("node --version", "node")
        .check("python3 --version", "python3")
        .check("claude --version", "claude")
        .check("mcp-gateway --help", "mcp-gateway")
        .check("uv --version", "uv")
        .check("poetry --version", "poetry")
}

/// All built-in scenarios, sorted by name
pub fn all() -> Vec<Scenario> {
    vec![
        Scenario::new("amp", "amp").check("amp --version", "amp"),
        Scenario::new("amp-code", "amp-code")
            .tagged()
            .check("amp --version", "amp"),
        claude_toolchain(Scenario::new("claude-code", "claude-code").tagged())
            .check("jq --version", "jq")
            .check("git --version", "git"),
        claude_toolchain(Scenario::new("claude-code-core", "claude-code")),
        claude_toolchain(Scenario::new("claude-mcp", "claude-mcp")),
        Scenario::new("claude-mcp-gateway", "claude-mcp").staged(StagedScript::new(
            "claude-mcp/smoke-test.sh",
            "/tmp/smoke-test.sh",
            "gateway smoke test",
        )),
        Scenario::new("codex", "codex")
            .tagged()
            .check("codex --version", "codex"),
        Scenario::new("e2b-tbench", "e2b-tbench")
            .check("tmux -V", "tmux")
            .check("git --version", "git")
            .check("docker --version", "docker")
            .check("uv --version", "uv")
            .check("harbor --version", "harbor")
            .check("tb run --help", "terminal-bench"),
        Scenario::new("openclaw", "openclaw")
            .tagged()
            .check("openclaw --version", "openclaw"),
        Scenario::new("opencode", "opencode").check("opencode --version", "opencode"),
    ]
}

pub fn find(name: &str) -> Option<Scenario> {
    all().into_iter().find(|scenario| scenario.name == name)
}

pub fn names() -> Vec<String> {
    all().into_iter().map(|scenario| scenario.name).collect()
}
