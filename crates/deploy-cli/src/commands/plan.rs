use anyhow::{Context, Result};
use comfy_table::{Cell, Color, Table};
use deploy_config::parser;
use deploy_orchestration::{DependencyGraph, LevelPlan, plan_environment};
use std::path::Path;
use tracing::info;

pub fn run(file: &Path, environments: &[String]) -> Result<()> {
    let deploy_file = parser::parse_file(file).context("Failed to parse deploy file")?;

    for name in environments {
        let spec = parser::environment(&deploy_file, name)?;
        let (graph, plan) = plan_environment(&spec)
            .with_context(|| format!("Failed to plan environment '{}'", name))?;
        info!("Environment '{}' deploys in {} level(s)", name, plan.len());

        println!("Environment: {}", name);
        println!("{}", plan_table(&graph, &plan));
    }

    Ok(())
}

fn plan_table(graph: &DependencyGraph, plan: &LevelPlan) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["LEVEL", "SERVICE", "TYPE", "DEPENDS ON"]);

    for (index, level) in plan.iter().enumerate() {
        for service in level {
            let (service_type, deps) = match graph.node(service) {
                Some(node) => (
                    node.service_type.to_string(),
                    node.dependencies
                        .iter()
                        .cloned()
                        .collect::<Vec<_>>()
                        .join(", "),
                ),
                None => (String::new(), String::new()),
            };

            table.add_row(vec![
                Cell::new(index),
                Cell::new(service).fg(Color::Green),
                Cell::new(service_type),
                Cell::new(if deps.is_empty() { "-".to_string() } else { deps }),
            ]);
        }
    }

    table
}
