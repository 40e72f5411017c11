//! The catalog's dependency graph.

use std::collections::HashSet;

use serde::Serialize;

use crate::model::Catalog;

/// `from` is depended on by `to`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Edge<'a> {
    pub from: &'a str,
    pub to: &'a str,
}

/// Edges between the given entries, in entry order.
///
/// Each name in an entry's `dependenciesIn` gives an edge into that entry
/// when the name is itself one of `catalogs`. Repeated edges are kept once.
pub fn edges<'a>(catalogs: &[&'a Catalog]) -> Vec<Edge<'a>> {
    let nodes: HashSet<&'a str> = catalogs.iter().map(|&c| c.name.as_str()).collect();
    let mut seen = HashSet::new();
    let mut edges = Vec::new();

    for &catalog in catalogs {
        for dependency in &catalog.dependencies_in {
            let Some(&from) = nodes.get(dependency.as_str()) else {
                continue;
            };
            let edge = Edge {
                from,
                to: catalog.name.as_str(),
            };
            if seen.insert((edge.from, edge.to)) {
                edges.push(edge);
            }
        }
    }
    edges
}

/// How connected the catalog is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyStats {
    pub total: usize,

    /// Entries with at least one incoming or outgoing dependency.
    pub with_dependencies: usize,

    /// Declared dependencies, both directions.
    pub total_dependencies: usize,
}

impl DependencyStats {
    pub fn from_catalogs(catalogs: &[Catalog]) -> Self {
        let mut stats = Self {
            total: catalogs.len(),
            ..Self::default()
        };
        for catalog in catalogs {
            let declared = catalog.dependencies_in.len() + catalog.dependencies_out.len();
            if declared > 0 {
                stats.with_dependencies += 1;
            }
            stats.total_dependencies += declared;
        }
        stats
    }
}
