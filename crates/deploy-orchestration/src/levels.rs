//! Level planning
//!
//! Splits an acyclic graph into ordered levels. Every service lands in the
//! earliest level whose predecessors already hold all of its dependencies, so
//! a level is the largest batch that can safely run concurrently.

use crate::{DependencyGraph, Error, Result};
use std::collections::BTreeSet;
use tracing::debug;

/// Ordered levels of service names
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LevelPlan {
    levels: Vec<BTreeSet<String>>,
}

impl LevelPlan {
    /// Build a plan from explicit levels
    pub fn from_levels(levels: Vec<BTreeSet<String>>) -> Self {
        Self { levels }
    }

    /// Services in level `index`
    pub fn level(&self, index: usize) -> Option<&BTreeSet<String>> {
        self.levels.get(index)
    }

    /// All levels, first to last
    pub fn levels(&self) -> &[BTreeSet<String>] {
        &self.levels
    }

    /// Iterate over the levels, first to last
    pub fn iter(&self) -> std::slice::Iter<'_, BTreeSet<String>> {
        self.levels.iter()
    }

    /// Number of levels
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// Whether the plan has no levels
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Index of the level holding `name`
    pub fn level_of(&self, name: &str) -> Option<usize> {
        self.levels.iter().position(|level| level.contains(name))
    }
}

impl<'a> IntoIterator for &'a LevelPlan {
    type Item = &'a BTreeSet<String>;
    type IntoIter = std::slice::Iter<'a, BTreeSet<String>>;

    fn into_iter(self) -> Self::IntoIter {
        self.levels.iter()
    }
}

/// Partition an acyclic graph into levels
///
/// Fails with [`Error::UnsatisfiableLeveling`] instead of looping forever if
/// a round places nothing, which happens when a dependency names a service
/// that does not exist or the graph has a cycle.
pub fn plan_levels(graph: &DependencyGraph) -> Result<LevelPlan> {
    let mut placed: BTreeSet<&str> = BTreeSet::new();
    let mut levels = Vec::new();

    while placed.len() < graph.len() {
        let level: BTreeSet<&str> = graph
            .nodes()
            .filter(|node| !placed.contains(node.name.as_str()))
            .filter(|node| {
                node.dependencies
                    .iter()
                    .all(|dep| placed.contains(dep.as_str()))
            })
            .map(|node| node.name.as_str())
            .collect();

        if level.is_empty() {
            let unplaced = graph
                .names()
                .filter(|name| !placed.contains(name))
                .map(str::to_string)
                .collect();
            return Err(Error::UnsatisfiableLeveling {
                environment: graph.environment().to_string(),
                unplaced,
            });
        }

        debug!(
            environment = graph.environment(),
            level = levels.len(),
            services = ?level,
            "Planned level"
        );

        placed.extend(level.iter().copied());
        levels.push(level.into_iter().map(str::to_string).collect());
    }

    Ok(LevelPlan { levels })
}
