//! The closed error taxonomy for the engine.
//!
//! Every failure mode the core can produce is one of these variants; there is
//! no out-of-band error mechanism.

use thiserror::Error;

/// Errors raised by registration, graph construction, scheduling, or
/// evaluation.
#[derive(Debug, Error)]
pub enum VeriqError {
    /// A path string violates the grammar.
    #[error("invalid path syntax: {reason} (in {path:?})")]
    PathSyntax { path: String, reason: String },

    /// A scope, field, calc, or verif named by a path does not exist.
    #[error("unresolved path: {0}")]
    Unresolved(String),

    /// Item access on a non-subscriptable type, or a non-boolean verif
    /// return value.
    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    /// A calc/verif parameter lacks a reference annotation.
    #[error("parameter '{param}' of '{owner}' has no reference")]
    MissingRef { owner: String, param: String },

    /// A calc/verif function lacks a return type annotation.
    #[error("'{0}' has no declared return type")]
    MissingReturn(String),

    /// A reference targets a scope neither equal to the owner's nor
    /// declared in its imports.
    #[error("reference '{reference}' in '{owner}' targets scope '{target_scope}', which is not imported")]
    ScopeNotImported {
        owner: String,
        reference: String,
        target_scope: String,
    },

    /// Two scopes, two calcs (within a scope), or two verifs (within a
    /// scope) share a name.
    #[error("duplicate name '{name}' in {context}")]
    DuplicateName { context: String, name: String },

    /// A `Table` was constructed with missing or extra keys, or a key
    /// component whose type is not a closed enum domain.
    #[error("table error: {0}")]
    Table(String),

    /// The dependency graph is not a DAG.
    #[error("dependency cycle detected involving: {0}")]
    Cycle(String),

    /// A user calc/verif function raised during execution.
    #[error("evaluation of '{node}' failed: {cause}")]
    UserFn {
        node: String,
        cause: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

pub type Result<T> = std::result::Result<T, VeriqError>;
