//! The authoring-time registry: `Project`, `Scope`, and the path-based type
//! resolver `get_type`.

use indexmap::IndexMap;

use crate::descriptor::{Calc, Verif};
use crate::error::VeriqError;
use crate::path::{Path, PathPart, ProjectPath};
use crate::schema::Schema;

/// A named collection of scopes. Scope names are unique within a project.
#[derive(Debug, Default)]
pub struct Project {
    pub name: String,
    pub(crate) scopes: IndexMap<String, Scope>,
}

impl Project {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            scopes: IndexMap::new(),
        }
    }

    /// Registers a scope, rejecting a name already taken: scope names are
    /// unique within a project.
    pub fn add_scope(&mut self, scope: Scope) -> Result<&mut Scope, VeriqError> {
        if self.scopes.contains_key(&scope.name) {
            return Err(VeriqError::DuplicateName {
                context: "project".to_string(),
                name: scope.name.clone(),
            });
        }
        let name = scope.name.clone();
        self.scopes.insert(name.clone(), scope);
        Ok(self.scopes.get_mut(&name).unwrap())
    }

    pub fn scope(&self, name: &str) -> Option<&Scope> {
        self.scopes.get(name)
    }

    pub fn scope_mut(&mut self, name: &str) -> Option<&mut Scope> {
        self.scopes.get_mut(name)
    }

    pub fn scopes(&self) -> impl Iterator<Item = &Scope> {
        self.scopes.values()
    }

    /// Resolves the [`Schema`] a [`ProjectPath`] addresses, walking a root
    /// model's declared fields for a model path, walking a registered
    /// calc's output schema by the path's trailing parts, or yielding the
    /// implicit boolean type of a verif.
    pub fn get_type(&self, pp: &ProjectPath) -> Result<Schema, VeriqError> {
        let scope = self
            .scopes
            .get(&pp.scope)
            .ok_or_else(|| VeriqError::Unresolved(format!("scope '{}'", pp.scope)))?;

        match &pp.path {
            Path::Model { parts } => {
                let root = scope.root_model_schema.as_ref().ok_or_else(|| {
                    VeriqError::Unresolved(format!("scope '{}' has no root model", pp.scope))
                })?;
                walk_schema(root, parts)
            }
            Path::Calc { name, parts } => {
                let calc = scope.calcs.get(name).ok_or_else(|| {
                    VeriqError::Unresolved(format!("calc '{name}' in scope '{}'", pp.scope))
                })?;
                walk_schema(&calc.output_schema, parts)
            }
            Path::Verif { name } => {
                scope.verifs.get(name).ok_or_else(|| {
                    VeriqError::Unresolved(format!("verif '{name}' in scope '{}'", pp.scope))
                })?;
                // A verif always yields a single boolean leaf.
                Ok(Schema::Scalar)
            }
        }
    }
}

/// Walks `schema` by `parts`, resolving attribute accesses against record
/// fields and item accesses against a table's value schema.
fn walk_schema(schema: &Schema, parts: &[PathPart]) -> Result<Schema, VeriqError> {
    let mut current = schema.clone();
    for part in parts {
        current = match (&current, part) {
            (Schema::Record(fields), PathPart::Attribute(name)) => fields
                .iter()
                .find(|f| &f.name == name)
                .map(|f| f.schema.resolve().clone())
                .ok_or_else(|| VeriqError::Unresolved(format!("field '{name}'")))?,
            (Schema::Table(table), PathPart::Item(_)) => table.value.resolve().clone(),
            (_, PathPart::Attribute(name)) => {
                return Err(VeriqError::TypeMismatch(format!(
                    "cannot access attribute '{name}' on a non-record type"
                )))
            }
            (_, PathPart::Item(_)) => {
                return Err(VeriqError::TypeMismatch(
                    "item access on a non-subscriptable type".to_string(),
                ))
            }
        };
    }
    Ok(current)
}

/// A named group of calcs and verifs sharing a root model and a default
/// scope for unqualified references.
#[derive(Debug, Default)]
pub struct Scope {
    pub name: String,
    pub(crate) root_model_schema: Option<Schema>,
    pub(crate) calcs: IndexMap<String, Calc>,
    pub(crate) verifs: IndexMap<String, Verif>,
}

impl Scope {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            root_model_schema: None,
            calcs: IndexMap::new(),
            verifs: IndexMap::new(),
        }
    }

    /// Declares this scope's root data model type. `M::schema()` is walked
    /// at registration time, well before any `M` instance exists.
    pub fn root_model<M: crate::schema::Model>(&mut self) -> &mut Self {
        self.root_model_schema = Some(M::schema());
        self
    }

    pub fn root_model_schema(&self) -> Option<&Schema> {
        self.root_model_schema.as_ref()
    }

    pub fn calc(&self, name: &str) -> Option<&Calc> {
        self.calcs.get(name)
    }

    pub fn verif(&self, name: &str) -> Option<&Verif> {
        self.verifs.get(name)
    }

    pub fn calcs(&self) -> impl Iterator<Item = &Calc> {
        self.calcs.values()
    }

    pub fn verifs(&self) -> impl Iterator<Item = &Verif> {
        self.verifs.values()
    }

    pub(crate) fn insert_calc(&mut self, calc: Calc) -> Result<(), VeriqError> {
        if self.calcs.contains_key(&calc.name) {
            return Err(VeriqError::DuplicateName {
                context: format!("scope '{}'", self.name),
                name: calc.name,
            });
        }
        self.calcs.insert(calc.name.clone(), calc);
        Ok(())
    }

    pub(crate) fn insert_verif(&mut self, verif: Verif) -> Result<(), VeriqError> {
        if self.verifs.contains_key(&verif.name) {
            return Err(VeriqError::DuplicateName {
                context: format!("scope '{}'", self.name),
                name: verif.name,
            });
        }
        self.verifs.insert(verif.name.clone(), verif);
        Ok(())
    }
}
