//! Init command implementation.

use anyhow::{bail, Result};
use std::path::Path;

const DEFAULT_CONFIG: &str = r#"# provider-lint configuration
#
# Rules can be enabled/disabled and have their severity overridden.

[rules.provider_default_tags]
enabled = true
# severity = "warning"  # Override default severity

# Tag keys every provider's default_tags must declare
tags = ["Managed By"]
"#;

/// Runs the init command.
pub fn run(force: bool) -> Result<()> {
    let config_path = Path::new(".provider-lint.toml");
    write_config(config_path, force)?;

    println!("Created {}", config_path.display());
    println!("\nNext steps:");
    println!("  1. Edit {} to list your required tags", config_path.display());
    println!("  2. Run: provider-lint check <module-dir>");

    Ok(())
}

fn write_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!(
            "Configuration file already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }
    std::fs::write(path, DEFAULT_CONFIG)?;
    Ok(())
}
