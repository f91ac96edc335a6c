//! The dependency graph container.
//!
//! Stores RDG nodes by id in insertion order. Dependencies are referenced by
//! id, so a node may be added before the nodes it depends on; dangling
//! references surface as [`GraphError::UnknownNode`] on traversal.

use std::collections::{HashMap, HashSet};
use std::fmt::Write as _;

use serde::Serialize;
use tracing::debug;

use crate::error::GraphError;
use crate::node::{validate_node_id, NodeId, RdgNode};

/// Reliability dependency graph.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DependencyGraph {
    nodes: Vec<RdgNode>,
    #[serde(skip)]
    index: HashMap<NodeId, usize>,
    #[serde(skip)]
    next_id: u64,
}

impl DependencyGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    // --- Construction ---

    /// Add a node. Ids are unique within a graph and must pass
    /// [`validate_node_id`].
    pub fn add_node(&mut self, node: RdgNode) -> Result<(), GraphError> {
        validate_node_id(&node.id)?;
        if self.index.contains_key(&node.id) {
            return Err(GraphError::DuplicateNode(node.id));
        }
        debug!(
            id = %node.id,
            presence_condition = %node.presence_condition,
            dependencies = node.dependencies.len(),
            "registered node"
        );
        self.index.insert(node.id.clone(), self.nodes.len());
        self.nodes.push(node);
        Ok(())
    }

    /// Record that `from` calls `to`. Both nodes must already exist.
    pub fn add_dependency(&mut self, from: &str, to: &str) -> Result<(), GraphError> {
        if !self.index.contains_key(to) {
            return Err(GraphError::UnknownNode(to.to_string()));
        }
        let position = *self
            .index
            .get(from)
            .ok_or_else(|| GraphError::UnknownNode(from.to_string()))?;
        self.nodes[position].add_dependency(to);
        Ok(())
    }

    /// Allocate a fresh `n<k>` id not yet used in this graph.
    pub fn next_id(&mut self) -> NodeId {
        loop {
            let id = format!("n{}", self.next_id);
            self.next_id += 1;
            if !self.index.contains_key(&id) {
                return id;
            }
        }
    }

    // --- Queries ---

    pub fn node(&self, id: &str) -> Option<&RdgNode> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    /// All nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &RdgNode> {
        self.nodes.iter()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Presence condition of a node; `"true"` for unconditional nodes.
    pub fn presence_condition(&self, id: &str) -> Result<&str, GraphError> {
        self.require(id).map(|n| n.presence_condition.as_str())
    }

    /// Direct dependencies of a node in discovery order.
    pub fn dependencies_of(&self, id: &str) -> Result<&[NodeId], GraphError> {
        self.require(id).map(|n| n.dependencies.as_slice())
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn require(&self, id: &str) -> Result<&RdgNode, GraphError> {
        self.node(id)
            .ok_or_else(|| GraphError::UnknownNode(id.to_string()))
    }

    // --- Traversal ---

    /// Every node reachable from `root`, each exactly once, leaves first and
    /// `root` last. Every node appears after all of its dependencies.
    ///
    /// Fails with [`GraphError::CyclicDependency`] as soon as a node is met
    /// again while still on the current path.
    pub fn transitive_closure(&self, root: &str) -> Result<Vec<&RdgNode>, GraphError> {
        let start = *self
            .index
            .get(root)
            .ok_or_else(|| GraphError::UnknownNode(root.to_string()))?;
        let mut done = HashSet::new();
        let mut order = Vec::new();
        self.visit(start, &mut done, &mut order)?;
        debug!(root, size = order.len(), "computed transitive closure");
        Ok(order.into_iter().map(|i| &self.nodes[i]).collect())
    }

    /// Fail if any node of the graph reaches itself.
    pub fn check_acyclic(&self) -> Result<(), GraphError> {
        let mut done = HashSet::new();
        let mut order = Vec::new();
        for start in 0..self.nodes.len() {
            if !done.contains(&start) {
                self.visit(start, &mut done, &mut order)?;
            }
        }
        Ok(())
    }

    /// Iterative post-order DFS from `start`, skipping nodes already in
    /// `done` and appending newly finished nodes to `order`.
    fn visit(
        &self,
        start: usize,
        done: &mut HashSet<usize>,
        order: &mut Vec<usize>,
    ) -> Result<(), GraphError> {
        let mut on_path: HashSet<usize> = HashSet::from([start]);
        // (node, index of the next dependency to explore)
        let mut stack: Vec<(usize, usize)> = vec![(start, 0)];

        while let Some((current, next)) = stack.last_mut() {
            let node = &self.nodes[*current];
            let Some(dep) = node.dependencies.get(*next) else {
                let finished = *current;
                stack.pop();
                on_path.remove(&finished);
                done.insert(finished);
                order.push(finished);
                continue;
            };
            *next += 1;

            let child = *self
                .index
                .get(dep)
                .ok_or_else(|| GraphError::UnknownNode(dep.clone()))?;
            if on_path.contains(&child) {
                return Err(GraphError::CyclicDependency(dep.clone()));
            }
            if done.contains(&child) {
                continue;
            }
            on_path.insert(child);
            stack.push((child, 0));
        }
        Ok(())
    }

    // --- Rendering ---

    /// Render the graph as a Graphviz digraph, edges pointing from caller to
    /// callee.
    pub fn to_dot(&self) -> String {
        let mut out = String::from("digraph rdg {\n");
        for node in &self.nodes {
            let _ = writeln!(
                out,
                "    \"{}\" [label=\"{}\\n{}\"];",
                escape(&node.id),
                escape(&node.id),
                escape(&node.presence_condition)
            );
        }
        for node in &self.nodes {
            for dep in &node.dependencies {
                let _ = writeln!(out, "    \"{}\" -> \"{}\";", escape(&node.id), escape(dep));
            }
        }
        out.push_str("}\n");
        out
    }
}

fn escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}
