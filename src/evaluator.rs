//! Model hydration and scheduled execution.
//!
//! Two phases:
//!
//! 1. **Model hydration**. Every leaf of every supplied root model
//!    instance is stored under its `ModelPath`.
//! 2. **Scheduled execution**. The topological order from
//!    [`crate::scheduler::topological_order`] is walked; nodes already
//!    hydrated are skipped; calc/verif nodes reconstruct their inputs from
//!    already-computed predecessor leaves (hydrate-from-leaves) and store
//!    their splayed output.

use indexmap::IndexMap;

use crate::config::EngineConfig;
use crate::error::{Result, VeriqError};
use crate::graph::build_dependency_graph;
use crate::path::{Path, PathPart, ProjectPath};
use crate::project::Project;
use crate::scheduler::topological_order;
use crate::schema::{extract, hydrate_from_leaves, leaves, Model, Schema};
use crate::value::{LeafMap, Value};

/// Object-safe counterpart of [`Model`], letting a caller hand the
/// evaluator a heterogeneous `scope_name -> root instance` mapping despite
/// every scope's root model being a distinct concrete type.
pub trait RootModel {
    fn to_leaves_erased(&self, out: &mut LeafMap);
}

impl<M: Model> RootModel for M {
    fn to_leaves_erased(&self, out: &mut LeafMap) {
        Model::to_leaves(self, out)
    }
}

/// `scope_name -> root model instance`, covering every scope that declares
/// a root model. Every scope with a root model type must appear.
pub type ModelData = IndexMap<String, Box<dyn RootModel>>;

/// Runs the full two-phase evaluation and returns the immutable
/// `ProjectPath -> Value` result map.
pub fn evaluate(
    project: &Project,
    model_data: &ModelData,
    config: &EngineConfig,
) -> Result<IndexMap<ProjectPath, Value>> {
    let span = tracing::debug_span!("evaluate", project = %project.name);
    let _enter = span.enter();

    let mut result: IndexMap<ProjectPath, Value> = IndexMap::new();
    hydrate_models(project, model_data, &mut result)?;
    tracing::debug!(leaves = result.len(), "phase 1: model hydration complete");

    let graph = build_dependency_graph(project)?;
    if let Some(max) = config.max_nodes {
        let node_count = graph.nodes().count();
        if node_count > max {
            tracing::warn!(
                node_count,
                max_nodes = max,
                "dependency graph exceeds configured max_nodes"
            );
        }
    }

    let order = topological_order(&graph)?;
    tracing::debug!(nodes = order.len(), "phase 2: scheduled execution begins");

    for node in order {
        if result.contains_key(&node) {
            continue;
        }
        execute_node(project, &node, config, &mut result)?;
    }

    Ok(result)
}

fn hydrate_models(
    project: &Project,
    model_data: &ModelData,
    result: &mut IndexMap<ProjectPath, Value>,
) -> Result<()> {
    for (scope_name, instance) in model_data {
        let scope = project
            .scope(scope_name)
            .ok_or_else(|| VeriqError::Unresolved(format!("scope '{scope_name}'")))?;
        let schema = scope.root_model_schema().ok_or_else(|| {
            VeriqError::Unresolved(format!("scope '{scope_name}' has no root model"))
        })?;

        let mut raw: LeafMap = IndexMap::new();
        instance.to_leaves_erased(&mut raw);

        for leaf_parts in leaves(schema) {
            let key: Vec<PathPart> = leaf_parts.to_vec();
            let value = raw.get(&key).cloned().ok_or_else(|| {
                VeriqError::TypeMismatch(format!(
                    "model for scope '{scope_name}' is missing leaf {key:?}"
                ))
            })?;
            let pp = ProjectPath::new(
                scope_name.clone(),
                Path::Model {
                    parts: leaf_parts,
                },
            );
            tracing::trace!(path = %pp, "hydrated model leaf");
            result.insert(pp, value);
        }
    }
    Ok(())
}

fn execute_node(
    project: &Project,
    node: &ProjectPath,
    config: &EngineConfig,
    result: &mut IndexMap<ProjectPath, Value>,
) -> Result<()> {
    tracing::trace!(path = %node, "evaluating node");

    match &node.path {
        Path::Model { .. } => Err(VeriqError::Unresolved(format!(
            "model leaf '{node}' was never hydrated (scope '{}' missing from model data)",
            node.scope
        ))),
        Path::Calc { name, .. } => {
            let scope = project
                .scope(&node.scope)
                .ok_or_else(|| VeriqError::Unresolved(format!("scope '{}'", node.scope)))?;
            let calc = scope
                .calc(name)
                .ok_or_else(|| VeriqError::Unresolved(format!("calc '{name}'")))?;

            let inputs = hydrate_inputs(project, result, &calc.input_refs)?;
            let output = (calc.func)(&inputs).map_err(|e| wrap_user_fn(node, e, config))?;

            for out_parts in leaves(&calc.output_schema) {
                let value = extract(&output, &out_parts)?;
                let pp = ProjectPath::new(
                    node.scope.clone(),
                    Path::Calc {
                        name: name.clone(),
                        parts: out_parts,
                    },
                );
                result.insert(pp, value);
            }
            Ok(())
        }
        Path::Verif { name } => {
            let scope = project
                .scope(&node.scope)
                .ok_or_else(|| VeriqError::Unresolved(format!("scope '{}'", node.scope)))?;
            let verif = scope
                .verif(name)
                .ok_or_else(|| VeriqError::Unresolved(format!("verif '{name}'")))?;

            let inputs = hydrate_inputs(project, result, &verif.input_refs)?;
            let output = (verif.func)(&inputs).map_err(|e| wrap_user_fn(node, e, config))?;

            match output {
                Value::Bool(_) => {
                    result.insert(node.clone(), output);
                    Ok(())
                }
                other => Err(VeriqError::TypeMismatch(format!(
                    "verif '{node}' must return a boolean, got {other}"
                ))),
            }
        }
    }
}

/// Reconstructs every declared input parameter's structured value from its
/// already-computed predecessor leaves (hydrate-from-leaves), in the
/// calc/verif's parameter declaration order so they can be passed
/// positionally to [`crate::descriptor::Func`].
fn hydrate_inputs(
    project: &Project,
    result: &IndexMap<ProjectPath, Value>,
    input_refs: &[(String, ProjectPath)],
) -> Result<Vec<Value>> {
    let mut inputs = Vec::with_capacity(input_refs.len());
    for (_, source) in input_refs {
        let source_type: Schema = project.get_type(source)?;
        let mut leaf_map: LeafMap = IndexMap::new();
        for leaf_parts in leaves(&source_type) {
            let pp = ProjectPath::new(source.scope.clone(), source.path.with_extra_parts(&leaf_parts));
            let value = result.get(&pp).cloned().ok_or_else(|| {
                VeriqError::Unresolved(format!("predecessor '{pp}' has not been evaluated yet"))
            })?;
            leaf_map.insert(leaf_parts.to_vec(), value);
        }
        inputs.push(hydrate_from_leaves(&source_type, &leaf_map)?);
    }
    Ok(inputs)
}

fn wrap_user_fn(node: &ProjectPath, cause: VeriqError, config: &EngineConfig) -> VeriqError {
    if config.fail_fast {
        tracing::error!(path = %node, error = %cause, "calc/verif raised during evaluation");
    } else {
        tracing::warn!(path = %node, error = %cause, "calc/verif raised during evaluation");
    }
    VeriqError::UserFn {
        node: node.to_string(),
        cause: cause.to_string(),
        source: Some(Box::new(cause)),
    }
}
