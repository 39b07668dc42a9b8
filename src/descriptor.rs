//! Calc/verif descriptors and their registration.
//!
//! No decorator or reflection surface introspects a function's signature
//! here: an author calls [`Scope::calculation`] or [`Scope::verification`]
//! and states each parameter's [`Reference`] and the output [`Schema`]
//! directly, in a plain builder-registration style.

use std::sync::Arc;

use indexmap::IndexSet;

use crate::error::VeriqError;
use crate::path::{Path, ProjectPath, Reference};
use crate::project::Scope;
use crate::schema::Schema;
use crate::value::Value;

/// A calc/verif's callable body: takes its inputs in declaration order and
/// returns its output (or a failure, wrapped as `ErrUserFn` at evaluation
/// time).
pub type Func = Arc<dyn Fn(&[Value]) -> Result<Value, VeriqError> + Send + Sync>;

/// A registered calculation: a pure function of other paths, producing a
/// value shaped by `output_schema`.
#[derive(Clone)]
pub struct Calc {
    pub name: String,
    pub default_scope: String,
    pub imports: IndexSet<String>,
    /// Parameter name -> resolved source path, in declaration order.
    pub input_refs: Vec<(String, ProjectPath)>,
    pub output_schema: Schema,
    pub func: Func,
}

/// A registered verification: a pure predicate, always yielding a single
/// boolean leaf.
#[derive(Clone)]
pub struct Verif {
    pub name: String,
    pub default_scope: String,
    pub imports: IndexSet<String>,
    pub input_refs: Vec<(String, ProjectPath)>,
    pub func: Func,
}

/// One calc/verif parameter: its name and the [`Reference`] annotating it,
/// or `None` if the author forgot to annotate it. A parameter with no
/// reference annotation is a hard error.
pub type Param = (&'static str, Option<Reference>);

fn build_input_refs(
    owner_scope: &str,
    owner_name: &str,
    params: Vec<Param>,
    imports: &IndexSet<String>,
) -> Result<Vec<(String, ProjectPath)>, VeriqError> {
    let mut out = Vec::with_capacity(params.len());
    for (pname, maybe_ref) in params {
        let reference = maybe_ref.ok_or_else(|| VeriqError::MissingRef {
            owner: owner_name.to_string(),
            param: pname.to_string(),
        })?;
        let scope = reference
            .scope
            .clone()
            .unwrap_or_else(|| owner_scope.to_string());
        if scope != owner_scope && !imports.contains(&scope) {
            return Err(VeriqError::ScopeNotImported {
                owner: owner_name.to_string(),
                reference: reference.raw_path.clone(),
                target_scope: scope,
            });
        }
        let path = Path::parse(&reference.raw_path)?;
        out.push((pname.to_string(), ProjectPath::new(scope, path)));
    }
    Ok(out)
}

impl Scope {
    /// Registers a calculation. `output_schema` is `None` only to model an
    /// author who forgot to annotate a return type (yielding
    /// [`VeriqError::MissingReturn`]); in practice it is always `Some`.
    #[allow(clippy::too_many_arguments)]
    pub fn calculation(
        &mut self,
        name: impl Into<String>,
        params: Vec<Param>,
        imports: impl IntoIterator<Item = impl Into<String>>,
        output_schema: Option<Schema>,
        func: impl Fn(&[Value]) -> Result<Value, VeriqError> + Send + Sync + 'static,
    ) -> Result<(), VeriqError> {
        let name = name.into();
        let imports: IndexSet<String> = imports.into_iter().map(Into::into).collect();
        let output_schema = output_schema
            .ok_or_else(|| VeriqError::MissingReturn(format!("calculation '{name}'")))?;
        let input_refs = build_input_refs(&self.name, &name, params, &imports)?;
        self.insert_calc(Calc {
            name,
            default_scope: self.name.clone(),
            imports,
            input_refs,
            output_schema,
            func: Arc::new(func),
        })
    }

    /// Registers a verification. Its output is always an implicit boolean;
    /// there is no return-type annotation to omit.
    pub fn verification(
        &mut self,
        name: impl Into<String>,
        params: Vec<Param>,
        imports: impl IntoIterator<Item = impl Into<String>>,
        func: impl Fn(&[Value]) -> Result<Value, VeriqError> + Send + Sync + 'static,
    ) -> Result<(), VeriqError> {
        let name = name.into();
        let imports: IndexSet<String> = imports.into_iter().map(Into::into).collect();
        let input_refs = build_input_refs(&self.name, &name, params, &imports)?;
        self.insert_verif(Verif {
            name,
            default_scope: self.name.clone(),
            imports,
            input_refs,
            func: Arc::new(func),
        })
    }
}
