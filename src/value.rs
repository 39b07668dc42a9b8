//! The concrete value carrier used at leaves.
//!
//! Calc/verif inputs and outputs are reduced to leaves for graph-building
//! and evaluation. `serde_json::Value` is the universal scalar/record/table
//! representation at that level.

use indexmap::IndexMap;

pub use serde_json::Value;

/// A flat mapping from leaf part-lists (relative to some owning path) to
/// their resolved values, used while hydrating model data and while
/// reconstructing structured calc/verif inputs from their leaf
/// predecessors (hydrate-from-leaves).
pub type LeafMap = IndexMap<Vec<crate::path::PathPart>, Value>;
