//! Resolved package graph construction and tree rendering.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;

use crate::solver::Selection;
use nixpin_core::requirement::Requirement;

/// A node in the resolved graph. The root node carries the project label
/// and no version.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct PackageNode {
    pub name: String,
    pub version: Option<String>,
}

impl fmt::Display for PackageNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.version {
            Some(version) => write!(f, "{}=={}", self.name, version),
            None => f.write_str(&self.name),
        }
    }
}

/// A resolved dependency graph backed by petgraph.
pub struct PackageGraph {
    graph: DiGraph<PackageNode, ()>,
    index: HashMap<String, NodeIndex>,
    root: Option<NodeIndex>,
}

impl PackageGraph {
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            index: HashMap::new(),
            root: None,
        }
    }

    /// Build the graph of a finished resolution: root label, filtered
    /// root declarations, and the selection map keyed by package key.
    pub fn from_resolution(
        root_label: &str,
        roots: &[Requirement],
        selections: &BTreeMap<String, Selection>,
    ) -> Self {
        let mut graph = Self::new();
        let root = graph.add_node(
            root_label.to_string(),
            PackageNode {
                name: root_label.to_string(),
                version: None,
            },
        );
        graph.root = Some(root);

        for (key, selection) in selections {
            graph.add_node(
                key.clone(),
                PackageNode {
                    name: selection.candidate.name.clone(),
                    version: Some(selection.candidate.version.to_string()),
                },
            );
        }

        for requirement in roots {
            if let Some(&to) = graph.index.get(requirement.key()) {
                graph.add_edge(root, to);
            }
        }
        for (key, selection) in selections {
            let from = graph.index[key.as_str()];
            for requirement in &selection.requirements {
                if let Some(&to) = graph.index.get(requirement.key()) {
                    graph.add_edge(from, to);
                }
            }
        }

        graph
    }

    fn add_node(&mut self, key: String, node: PackageNode) -> NodeIndex {
        if let Some(&idx) = self.index.get(&key) {
            return idx;
        }
        let idx = self.graph.add_node(node);
        self.index.insert(key, idx);
        idx
    }

    fn add_edge(&mut self, from: NodeIndex, to: NodeIndex) {
        if from != to && !self.graph.edges(from).any(|e| e.target() == to) {
            self.graph.add_edge(from, to, ());
        }
    }

    /// Look up a package by key.
    pub fn find(&self, key: &str) -> Option<NodeIndex> {
        self.index.get(key).copied()
    }

    pub fn node(&self, idx: NodeIndex) -> &PackageNode {
        &self.graph[idx]
    }

    /// Direct dependencies of a node, sorted by display name.
    pub fn dependencies_of(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        let mut deps: Vec<NodeIndex> = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .map(|e| e.target())
            .collect();
        deps.sort_by(|a, b| self.graph[*a].name.cmp(&self.graph[*b].name));
        deps
    }

    /// Reverse dependencies of a node.
    pub fn dependents_of(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        self.graph
            .edges_directed(idx, Direction::Incoming)
            .map(|e| e.source())
            .collect()
    }

    /// Number of resolved packages (excluding the root).
    pub fn len(&self) -> usize {
        let total = self.graph.node_count();
        if self.root.is_some() {
            total.saturating_sub(1)
        } else {
            total
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Render the dependency tree.
    pub fn print_tree(&self, max_depth: Option<usize>) -> String {
        let mut output = String::new();
        let Some(root) = self.root else {
            return output;
        };

        output.push_str(&format!("{}\n", self.graph[root]));

        let mut visited = HashSet::new();
        visited.insert(root);

        let deps = self.dependencies_of(root);
        let count = deps.len();
        for (i, idx) in deps.iter().enumerate() {
            let is_last = i == count - 1;
            self.print_subtree(&mut output, *idx, "", is_last, 1, max_depth, &mut visited);
        }

        output
    }

    #[allow(clippy::too_many_arguments)]
    fn print_subtree(
        &self,
        output: &mut String,
        idx: NodeIndex,
        prefix: &str,
        is_last: bool,
        depth: usize,
        max_depth: Option<usize>,
        visited: &mut HashSet<NodeIndex>,
    ) {
        let connector = if is_last { "└── " } else { "├── " };
        output.push_str(&format!("{prefix}{connector}{}\n", self.graph[idx]));

        if let Some(max) = max_depth {
            if depth >= max {
                return;
            }
        }
        if !visited.insert(idx) {
            return;
        }

        let child_prefix = format!("{prefix}{}", if is_last { "    " } else { "│   " });
        let deps = self.dependencies_of(idx);
        let count = deps.len();
        for (i, child) in deps.iter().enumerate() {
            let is_last = i == count - 1;
            self.print_subtree(
                output,
                *child,
                &child_prefix,
                is_last,
                depth + 1,
                max_depth,
                visited,
            );
        }

        visited.remove(&idx);
    }
}

impl Default for PackageGraph {
    fn default() -> Self {
        Self::new()
    }
}
