//! Directed graph and topological sorting

use indexmap::{IndexMap, IndexSet};
use std::collections::HashSet;
use std::fmt::Display;
use std::hash::Hash;

/// Directed graph over opaque node identities.
///
/// Edges are inserted after both endpoints have been registered with
/// [`Digraph::add_node`]; the graph is write-once, read-many and keeps
/// insertion order so traversals are deterministic per run.
#[derive(Debug, Default)]
pub struct Digraph<N> {
    nodes: IndexSet<N>,
    adjacent: IndexMap<N, IndexSet<N>>,
}

impl<N> Digraph<N>
where
    N: Eq + Hash + Clone,
{
    /// Create an empty graph
    pub fn new() -> Self {
        Self {
            nodes: IndexSet::new(),
            adjacent: IndexMap::new(),
        }
    }

    /// Create an empty graph with pre-allocated capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: IndexSet::with_capacity(capacity),
            adjacent: IndexMap::with_capacity(capacity),
        }
    }

    /// Register a node; inserting the same node twice is a no-op
    pub fn add_node(&mut self, node: N) {
        self.nodes.insert(node);
    }

    /// Add a directed edge `from -> to`
    ///
    /// Both endpoints must already be registered via [`Digraph::add_node`].
    pub fn add_edge(&mut self, from: N, to: N) -> Result<(), GraphError> {
        if !self.nodes.contains(&from) || !self.nodes.contains(&to) {
            return Err(GraphError::UnknownNode);
        }

        self.adjacent.entry(from).or_default().insert(to);
        Ok(())
    }

    /// Number of registered nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph has no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All registered nodes, in insertion order
    pub fn nodes(&self) -> impl Iterator<Item = &N> {
        self.nodes.iter()
    }

    /// Nodes that `node` points to (possibly empty), in insertion order
    pub fn adjacent(&self, node: &N) -> impl Iterator<Item = &N> {
        self.adjacent.get(node).into_iter().flatten()
    }
}

/// Errors that can occur when mutating a [`Digraph`]
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum GraphError {
    #[error("both nodes must already exist in the graph prior to adding a connecting edge")]
    UnknownNode,
}

/// A cycle was found while sorting; carries the node at which the active
/// traversal path was re-entered.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("cycle detected at node '{0}'; can only sort directed acyclic graphs")]
pub struct CycleError<N: Display + std::fmt::Debug>(pub N);

/// Topological sort for a [`Digraph`].
///
/// An edge `u -> v` is read as "u depends on v", so the produced order is
/// dependency-first: every node appears after all nodes it points to.
pub struct TopSorter<'g, N> {
    graph: &'g Digraph<N>,
}

impl<'g, N> TopSorter<'g, N>
where
    N: Eq + Hash + Clone + Display + std::fmt::Debug,
{
    pub fn new(graph: &'g Digraph<N>) -> Self {
        Self { graph }
    }

    /// Produce a dependency-first order, or fail on the first cycle.
    ///
    /// Depth-first post-order over the nodes in insertion order, driven by
    /// an explicit work stack so arbitrarily deep dependency chains do not
    /// exhaust the call stack.
    pub fn sort(&self) -> Result<Vec<N>, CycleError<N>> {
        let mut result = Vec::with_capacity(self.graph.len());
        let mut on_stack: HashSet<&N> = HashSet::new();
        let mut done: HashSet<&N> = HashSet::with_capacity(self.graph.len());

        for node in self.graph.nodes() {
            self.visit(node, &mut result, &mut on_stack, &mut done)?;
        }

        Ok(result)
    }

    fn visit(
        &self,
        root: &'g N,
        result: &mut Vec<N>,
        on_stack: &mut HashSet<&'g N>,
        done: &mut HashSet<&'g N>,
    ) -> Result<(), CycleError<N>> {
        if done.contains(root) {
            return Ok(());
        }

        on_stack.insert(root);
        let mut stack = vec![(root, self.graph.adjacent(root).collect::<Vec<_>>().into_iter())];

        loop {
            let next_child = match stack.last_mut() {
                Some((_, children)) => children.next(),
                None => break,
            };

            match next_child {
                Some(child) if done.contains(child) => {}
                Some(child) if on_stack.contains(child) => {
                    return Err(CycleError(child.clone()));
                }
                Some(child) => {
                    on_stack.insert(child);
                    stack.push((child, self.graph.adjacent(child).collect::<Vec<_>>().into_iter()));
                }
                None => {
                    if let Some((node, _)) = stack.pop() {
                        on_stack.remove(node);
                        done.insert(node);
                        result.push(node.clone());
                    }
                }
            }
        }

        Ok(())
    }
}
