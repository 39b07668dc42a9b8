//! Dependency graph construction at leaf granularity.
//!
//! Every edge is derived by expanding both a reference's source path and a
//! calc/verif's own output into their leaves via [`crate::schema::leaves`],
//! so the graph never has to reason about anything coarser than a single
//! scalar terminal.

use indexmap::{IndexMap, IndexSet};

use crate::error::VeriqError;
use crate::path::{Path, ProjectPath};
use crate::project::Project;
use crate::schema::leaves;

/// Successor/predecessor multimaps over leaf-granularity [`ProjectPath`]
/// nodes, built once per project and consumed by both the scheduler and
/// the evaluator.
#[derive(Debug, Default)]
pub struct Graph {
    pub successors: IndexMap<ProjectPath, IndexSet<ProjectPath>>,
    pub predecessors: IndexMap<ProjectPath, IndexSet<ProjectPath>>,
}

impl Graph {
    /// Every node that participates in the graph, in first-seen order.
    pub fn nodes(&self) -> impl Iterator<Item = &ProjectPath> {
        self.successors.keys()
    }

    pub fn in_degree(&self, node: &ProjectPath) -> usize {
        self.predecessors.get(node).map_or(0, |s| s.len())
    }

    fn add_edge(&mut self, from: ProjectPath, to: ProjectPath) {
        self.successors.entry(from.clone()).or_default().insert(to.clone());
        self.predecessors.entry(to).or_default().insert(from);
    }

    fn ensure_node(&mut self, node: ProjectPath) {
        self.successors.entry(node).or_default();
    }
}

/// Builds the full dependency graph for `project`: one node per leaf of
/// every calc/verif output, wired to one node per leaf of every parameter
/// it references.
pub fn build_dependency_graph(project: &Project) -> Result<Graph, VeriqError> {
    let mut graph = Graph::default();

    for scope in project.scopes() {
        for calc in scope.calcs() {
            let calc_path = Path::Calc {
                name: calc.name.clone(),
                parts: Default::default(),
            };
            let dest_nodes: Vec<ProjectPath> = leaves(&calc.output_schema)
                .into_iter()
                .map(|leaf_parts| {
                    ProjectPath::new(scope.name.clone(), calc_path.with_extra_parts(&leaf_parts))
                })
                .collect();
            for dest in &dest_nodes {
                graph.ensure_node(dest.clone());
            }

            for (_, source) in &calc.input_refs {
                let source_type = project.get_type(source)?;
                for leaf_parts in leaves(&source_type) {
                    let source_leaf =
                        ProjectPath::new(source.scope.clone(), source.path.with_extra_parts(&leaf_parts));
                    for dest in &dest_nodes {
                        graph.add_edge(source_leaf.clone(), dest.clone());
                    }
                }
            }
        }

        for verif in scope.verifs() {
            let dest = ProjectPath::new(
                scope.name.clone(),
                Path::Verif {
                    name: verif.name.clone(),
                },
            );
            graph.ensure_node(dest.clone());

            for (_, source) in &verif.input_refs {
                let source_type = project.get_type(source)?;
                for leaf_parts in leaves(&source_type) {
                    let source_leaf =
                        ProjectPath::new(source.scope.clone(), source.path.with_extra_parts(&leaf_parts));
                    graph.add_edge(source_leaf, dest.clone());
                }
            }
        }
    }

    Ok(graph)
}
