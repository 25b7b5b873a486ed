//! Cycle detection
//!
//! A depth-first topological visit with three-state marking. The visit runs on
//! an explicit stack so deep dependency chains cannot overflow the call stack.
//! Callers only care whether the visit completes; the order is a by-product.

use crate::DependencyGraph;
use std::collections::HashMap;

/// A cycle was found while visiting the graph
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("circular dependency involving service '{node}'")]
pub struct CycleFound {
    /// Service that was reached again while still in progress
    pub node: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    InProgress,
    Done,
}

/// Order the services so every dependency precedes its dependents
///
/// Aborts on the first service that is reached again while it is still in
/// progress. Dependencies that are not nodes of the graph are skipped.
pub fn topological_order(graph: &DependencyGraph) -> Result<Vec<String>, CycleFound> {
    // Unvisited nodes have no entry
    let mut marks: HashMap<&str, Mark> = HashMap::with_capacity(graph.len());
    let mut order = Vec::with_capacity(graph.len());

    for root in graph.nodes() {
        if marks.contains_key(root.name.as_str()) {
            continue;
        }

        marks.insert(&root.name, Mark::InProgress);
        let mut stack = vec![(root.name.as_str(), root.dependencies.iter())];

        while let Some((name, deps)) = stack.last_mut() {
            let Some(dep) = deps.next() else {
                let name = *name;
                marks.insert(name, Mark::Done);
                order.push(name.to_string());
                stack.pop();
                continue;
            };

            match marks.get(dep.as_str()) {
                Some(Mark::InProgress) => {
                    return Err(CycleFound { node: dep.clone() });
                }
                Some(Mark::Done) => {}
                None => {
                    let Some(node) = graph.node(dep) else {
                        continue;
                    };
                    marks.insert(&node.name, Mark::InProgress);
                    stack.push((node.name.as_str(), node.dependencies.iter()));
                }
            }
        }
    }

    Ok(order)
}

/// Whether the graph contains a cycle, including self-dependencies
pub fn has_cycle(graph: &DependencyGraph) -> bool {
    topological_order(graph).is_err()
}
