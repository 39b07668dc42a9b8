//! Topological scheduling over a [`Graph`].
//!
//! A textbook Kahn's-algorithm pass over the `IndexMap`/`IndexSet`-based
//! graph representation, breaking ties in FIFO order.

use std::collections::VecDeque;

use indexmap::IndexMap;

use crate::error::VeriqError;
use crate::graph::Graph;
use crate::path::ProjectPath;

/// Produces a topological order over every node in `graph`, breaking ties
/// among equal in-degree nodes in first-seen (FIFO) order.
///
/// Errors with [`VeriqError::Cycle`] if the graph is not a DAG, naming the
/// nodes that never reached zero in-degree.
pub fn topological_order(graph: &Graph) -> Result<Vec<ProjectPath>, VeriqError> {
    let mut in_degree: IndexMap<ProjectPath, usize> = IndexMap::new();
    for node in graph.nodes() {
        in_degree.insert(node.clone(), graph.in_degree(node));
    }

    let mut queue: VecDeque<ProjectPath> = in_degree
        .iter()
        .filter(|(_, &deg)| deg == 0)
        .map(|(node, _)| node.clone())
        .collect();

    let mut order = Vec::with_capacity(in_degree.len());
    while let Some(node) = queue.pop_front() {
        order.push(node.clone());
        if let Some(successors) = graph.successors.get(&node) {
            for succ in successors {
                let deg = in_degree.get_mut(succ).expect("successor must be a graph node");
                *deg -= 1;
                if *deg == 0 {
                    queue.push_back(succ.clone());
                }
            }
        }
    }

    if order.len() != in_degree.len() {
        let remaining: Vec<String> = in_degree
            .iter()
            .filter(|(node, &deg)| deg > 0 || !order.contains(node))
            .map(|(node, _)| node.to_string())
            .collect();
        return Err(VeriqError::Cycle(remaining.join(", ")));
    }

    Ok(order)
}
