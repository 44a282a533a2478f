//! List rules command implementation.

use provider_lint_rules::RuleSet;

/// Runs the list-rules command.
pub fn run() {
    let set = RuleSet::builtin();
    println!("Rule set {} v{}\n", set.name, set.version);
    println!("{:<25} {:<9} {:<9} Description", "Name", "Default", "Severity");
    println!("{}", "-".repeat(80));

    for rule in set.rules() {
        println!(
            "{:<25} {:<9} {:<9} {}",
            rule.name(),
            if rule.enabled() { "enabled" } else { "disabled" },
            rule.severity().to_string(),
            rule.description()
        );
    }

    println!("\nEnable rules in .provider-lint.toml, or run selected rules with --only:");
    println!("  provider-lint check --only provider_default_tags");
}
