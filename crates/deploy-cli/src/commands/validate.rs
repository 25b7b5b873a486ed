use anyhow::{Context, Result};
use deploy_config::parser;
use std::path::Path;

pub fn run(file: &Path) -> Result<()> {
    println!("Validating {}...", file.display());

    let deploy_file = parser::parse_file(file).context("Failed to parse deploy file")?;

    println!("✓ Deploy file valid");
    println!("  Version: {}", deploy_file.version);
    println!("  Name: {}", deploy_file.name);
    println!("  Environments: {}", deploy_file.environments.len());

    for (name, services) in &deploy_file.environments {
        println!("    {}: {} service(s)", name, services.len());
    }

    if !deploy_file.extensions.is_empty() {
        println!("  Extensions:");
        for (prefix, package) in &deploy_file.extensions {
            println!("    {} -> {}", prefix, package);
        }
    }

    Ok(())
}
