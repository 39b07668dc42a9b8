//! Schema description and leaf enumeration.
//!
//! A [`Schema`] describes the *shape* of a record, exhaustive table, or
//! scalar leaf type, independent of any concrete value. It's what the
//! registry walks at registration/graph-building time, well before any
//! model instance exists.

use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::error::VeriqError;
use crate::path::{ItemKey, PartVec, PathPart};
use crate::value::{LeafMap, Value};

/// One field of a [`Schema::Record`]: a name and the schema of its value,
/// resolved lazily via [`SchemaRef`] to support forward references.
#[derive(Debug, Clone)]
pub struct FieldSchema {
    pub name: String,
    pub schema: SchemaRef,
}

impl FieldSchema {
    pub fn new(name: impl Into<String>, schema: SchemaRef) -> Self {
        Self {
            name: name.into(),
            schema,
        }
    }
}

/// An exhaustive table schema: a closed set of expected keys and the schema
/// shared by every value. The table is treated as a flat leaf map; values at
/// keys are not descended into further.
#[derive(Debug, Clone)]
pub struct TableSchema {
    pub expected_keys: Vec<ItemKey>,
    /// The schema shared by every cell. Leaf enumeration never descends
    /// into it (a table is always a flat leaf map); `get_type` resolution of
    /// a path that continues past an `Item` part does.
    pub value: SchemaRef,
}

impl TableSchema {
    pub fn new(expected_keys: Vec<ItemKey>, value: SchemaRef) -> Self {
        Self {
            expected_keys,
            value,
        }
    }

    /// A table whose cells are themselves scalar (the common case).
    pub fn of_scalars(expected_keys: Vec<ItemKey>) -> Self {
        Self::new(expected_keys, SchemaRef::immediate(Schema::Scalar))
    }
}

/// The shape of a record, table, or scalar leaf type.
#[derive(Debug, Clone)]
pub enum Schema {
    /// A scalar leaf (numbers, strings, booleans, ...).
    Scalar,
    /// A record with named fields, walked in declaration order.
    Record(Vec<FieldSchema>),
    /// An exhaustive table, walked as one leaf per expected key.
    Table(TableSchema),
}

/// A possibly-lazy handle to a [`Schema`], so record fields can reference
/// other record types before those types are fully declared: forward
/// references are permitted and are resolved lazily.
///
/// Backed by `once_cell` to memoize a forward-referenced schema the first
/// time it's walked.
#[derive(Clone)]
pub enum SchemaRef {
    Immediate(Arc<Schema>),
    Lazy(fn() -> Schema, Arc<OnceCell<Schema>>),
}

impl std::fmt::Debug for SchemaRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchemaRef::Immediate(s) => f.debug_tuple("Immediate").field(s).finish(),
            SchemaRef::Lazy(..) => f.debug_tuple("Lazy").finish(),
        }
    }
}

impl SchemaRef {
    pub fn immediate(schema: Schema) -> Self {
        SchemaRef::Immediate(Arc::new(schema))
    }

    /// A forward reference: `f` is resolved (and memoized) the first time
    /// the field is walked, not at declaration time.
    pub fn lazy(f: fn() -> Schema) -> Self {
        SchemaRef::Lazy(f, Arc::new(OnceCell::new()))
    }

    pub fn resolve(&self) -> &Schema {
        match self {
            SchemaRef::Immediate(s) => s,
            SchemaRef::Lazy(f, cell) => cell.get_or_init(f),
        }
    }
}

/// Enumerates the ordered sequence of leaf part-lists addressing every
/// scalar leaf reachable from `schema`.
///
/// Stable iteration order: field declaration order, then expected-key
/// order.
pub fn leaves(schema: &Schema) -> Vec<PartVec> {
    match schema {
        Schema::Scalar => vec![PartVec::new()],
        Schema::Table(table) => table
            .expected_keys
            .iter()
            .map(|key| {
                let mut parts = PartVec::new();
                parts.push(PathPart::Item(key.clone()));
                parts
            })
            .collect(),
        Schema::Record(fields) => {
            let mut out = Vec::new();
            for field in fields {
                for leaf in leaves(field.schema.resolve()) {
                    let mut parts = PartVec::new();
                    parts.push(PathPart::Attribute(field.name.clone()));
                    parts.extend(leaf);
                    out.push(parts);
                }
            }
            out
        }
    }
}

/// A record type an author hand-describes so the engine can hydrate its
/// leaves without any derive-macro/reflection surface.
///
/// Only root model types need this: calc/verif outputs are always plain
/// [`Value`]s shaped according to their declared [`Schema`].
pub trait Model: Sized {
    /// Describes this type's shape. Must be stable: the schema returned
    /// here is what the registry walks at registration time, before any
    /// instance of `Self` exists.
    fn schema() -> Schema;

    /// Extracts every leaf value from this instance into `out`, keyed by
    /// its leaf part-list relative to the instance root.
    fn to_leaves(&self, out: &mut LeafMap);
}

/// Reconstructs a structured [`Value`] from a flat set of leaf values,
/// following `schema`'s shape (hydrate-from-leaves).
///
/// - A scalar target takes its single leaf value directly.
/// - A record target recursively hydrates each field from leaves whose
///   first part names that field.
/// - A table target builds `{key: value}` from leaves whose first part is
///   an `Item(key)`, one per expected key.
pub fn hydrate_from_leaves(schema: &Schema, leaves: &LeafMap) -> Result<Value, VeriqError> {
    match schema {
        Schema::Scalar => {
            if leaves.len() != 1 {
                return Err(VeriqError::TypeMismatch(format!(
                    "expected a single leaf value for a scalar, got {}",
                    leaves.len()
                )));
            }
            let (parts, value) = leaves.iter().next().unwrap();
            if !parts.is_empty() {
                return Err(VeriqError::TypeMismatch(
                    "expected an empty part-list for a scalar leaf".to_string(),
                ));
            }
            Ok(value.clone())
        }
        Schema::Table(table) => {
            let mut map = serde_json::Map::new();
            for key in &table.expected_keys {
                let key_str = key.to_string();
                let value = leaves
                    .iter()
                    .find(|(parts, _)| {
                        matches!(parts.first(), Some(PathPart::Item(k)) if k == key)
                    })
                    .map(|(_, v)| v.clone())
                    .ok_or_else(|| {
                        VeriqError::TypeMismatch(format!(
                            "missing value for table key '{key_str}' while hydrating"
                        ))
                    })?;
                map.insert(key_str, value);
            }
            Ok(Value::Object(map))
        }
        Schema::Record(fields) => {
            let mut map = serde_json::Map::new();
            for field in fields {
                let sub_leaves: LeafMap = leaves
                    .iter()
                    .filter_map(|(parts, v)| match parts.first() {
                        Some(PathPart::Attribute(name)) if name == &field.name => {
                            Some((parts[1..].to_vec(), v.clone()))
                        }
                        _ => None,
                    })
                    .collect();
                let value = hydrate_from_leaves(field.schema.resolve(), &sub_leaves)?;
                map.insert(field.name.clone(), value);
            }
            Ok(Value::Object(map))
        }
    }
}

/// Extracts the value at `parts` out of a previously hydrated structured
/// [`Value`] (the inverse traversal used to splay a calc's output across
/// its leaf part-lists).
pub fn extract(value: &Value, parts: &[PathPart]) -> Result<Value, VeriqError> {
    let mut current = value;
    for part in parts {
        current = match part {
            PathPart::Attribute(name) => current.get(name).ok_or_else(|| {
                VeriqError::TypeMismatch(format!("no attribute '{name}' on {current}"))
            })?,
            PathPart::Item(key) => current.get(key.to_string()).ok_or_else(|| {
                VeriqError::TypeMismatch(format!("no item '{key}' on {current}"))
            })?,
        };
    }
    Ok(current.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::ItemKey;
    use indexmap::IndexMap;

    fn scalar_field(name: &str) -> FieldSchema {
        FieldSchema::new(name, SchemaRef::immediate(Schema::Scalar))
    }

    #[test]
    fn leaves_of_scalar_is_single_empty_part_list() {
        let l = leaves(&Schema::Scalar);
        assert_eq!(l.len(), 1);
        assert!(l[0].is_empty());
    }

    #[test]
    fn leaves_of_table_is_one_per_expected_key() {
        let schema = Schema::Table(TableSchema::of_scalars(vec![
            ItemKey::Single("A".into()),
            ItemKey::Single("B".into()),
        ]));
        let l = leaves(&schema);
        assert_eq!(
            l,
            vec![
                PartVec::from_vec(vec![PathPart::Item(ItemKey::Single("A".into()))]),
                PartVec::from_vec(vec![PathPart::Item(ItemKey::Single("B".into()))]),
            ]
        );
    }

    #[test]
    fn leaves_of_record_prepend_field_names_in_order() {
        let schema = Schema::Record(vec![scalar_field("a"), scalar_field("b")]);
        let l = leaves(&schema);
        assert_eq!(
            l,
            vec![
                PartVec::from_vec(vec![PathPart::Attribute("a".into())]),
                PartVec::from_vec(vec![PathPart::Attribute("b".into())]),
            ]
        );
    }

    #[test]
    fn forward_reference_resolves_lazily() {
        fn inner() -> Schema {
            Schema::Record(vec![scalar_field("leaf")])
        }
        let schema = Schema::Record(vec![FieldSchema::new("nested", SchemaRef::lazy(inner))]);
        let l = leaves(&schema);
        assert_eq!(
            l,
            vec![PartVec::from_vec(vec![
                PathPart::Attribute("nested".into()),
                PathPart::Attribute("leaf".into()),
            ])]
        );
    }

    #[test]
    fn hydrates_record_from_leaves() {
        let schema = Schema::Record(vec![scalar_field("a"), scalar_field("b")]);
        let mut leaves_map: LeafMap = IndexMap::new();
        leaves_map.insert(vec![PathPart::Attribute("a".into())], Value::from(1));
        leaves_map.insert(vec![PathPart::Attribute("b".into())], Value::from(2));
        let hydrated = hydrate_from_leaves(&schema, &leaves_map).unwrap();
        assert_eq!(hydrated, serde_json::json!({"a": 1, "b": 2}));
    }

    #[test]
    fn hydrates_table_from_leaves() {
        let schema = Schema::Table(TableSchema::of_scalars(vec![
            ItemKey::Single("A".into()),
            ItemKey::Single("B".into()),
        ]));
        let mut leaves_map: LeafMap = IndexMap::new();
        leaves_map.insert(
            vec![PathPart::Item(ItemKey::Single("A".into()))],
            Value::from(3.14),
        );
        leaves_map.insert(
            vec![PathPart::Item(ItemKey::Single("B".into()))],
            Value::from(2.71),
        );
        let hydrated = hydrate_from_leaves(&schema, &leaves_map).unwrap();
        assert_eq!(hydrated, serde_json::json!({"A": 3.14, "B": 2.71}));
    }
}
