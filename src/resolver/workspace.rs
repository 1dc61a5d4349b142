//! Workspace aggregation.
//!
//! Each member is resolved on its own (`GOWORK=off`) and the results are
//! merged. Members that show up as dependencies of other members are
//! rewritten as source-built records: no hash, no packages, and a `local`
//! path relative to the workspace root.

use std::collections::{BTreeMap, BTreeSet};

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;

use crate::core::module::GoModule;
use crate::core::workfile::GoWorkFile;
use crate::resolver::packages::PackageMap;

/// Which member imports which, by module path.
#[derive(Debug)]
pub struct MemberGraph<'a> {
    graph: DiGraph<&'a str, ()>,
    nodes: BTreeMap<&'a str, NodeIndex>,
}

impl<'a> MemberGraph<'a> {
    /// Build the graph from each member's package map, given in member order.
    ///
    /// Member A imports member B when B's module path owns a package in A's
    /// map.
    pub fn build(workspace: &'a GoWorkFile, maps: &[PackageMap]) -> Self {
        let mut graph = DiGraph::new();
        let mut nodes = BTreeMap::new();
        for member in workspace.members() {
            let path = member.module_path();
            nodes.insert(path, graph.add_node(path));
        }

        for (member, map) in workspace.members().iter().zip(maps) {
            let from = nodes[member.module_path()];
            for imported in map.keys() {
                if let Some(&to) = nodes.get(imported.as_str()) {
                    if to != from {
                        graph.update_edge(from, to, ());
                    }
                }
            }
        }

        MemberGraph { graph, nodes }
    }

    /// Members imported by at least one other member.
    pub fn exported(&self) -> BTreeSet<&'a str> {
        self.nodes
            .iter()
            .filter(|&(_, &idx)| {
                self.graph
                    .neighbors_directed(idx, Direction::Incoming)
                    .next()
                    .is_some()
            })
            .map(|(&path, _)| path)
            .collect()
    }

    /// Members `path` imports directly.
    pub fn imports(&self, path: &str) -> BTreeSet<&'a str> {
        match self.nodes.get(path) {
            Some(&idx) => self
                .graph
                .neighbors_directed(idx, Direction::Outgoing)
                .map(|n| self.graph[n])
                .collect(),
            None => BTreeSet::new(),
        }
    }
}

/// Rewrite merged records so workspace members are built from source, and
/// add exported members the per-member resolution did not produce.
pub fn reconcile_members(
    workspace: &GoWorkFile,
    merged: Vec<GoModule>,
    exported: &BTreeSet<&str>,
) -> Vec<GoModule> {
    let members: BTreeMap<&str, (&str, Option<&str>)> = workspace
        .members()
        .iter()
        .zip(workspace.modules())
        .map(|(m, dir)| (m.module_path(), (dir.as_str(), m.go_version())))
        .collect();

    let mut by_path: BTreeMap<String, GoModule> = merged
        .into_iter()
        .map(|mut module| {
            if let Some((dir, go)) = members.get(module.path.as_str()) {
                module.hash = None;
                module.packages.clear();
                module.replaced = None;
                module.local = Some(dir.to_string());
                module.go = go.map(str::to_string);
            }
            (module.path.clone(), module)
        })
        .collect();

    for path in exported {
        if by_path.contains_key(*path) {
            continue;
        }
        if let Some((dir, go)) = members.get(path) {
            by_path.insert(
                path.to_string(),
                GoModule::new(*path, "v0.0.0")
                    .with_go(go.map(str::to_string))
                    .with_local(*dir),
            );
        }
    }

    by_path.into_values().collect()
}
