//! The exhaustive table: a closed mapping whose key domain is derivable
//! from its key type alone.

use indexmap::IndexMap;

use crate::error::VeriqError;
use crate::path::ItemKey;

/// A closed enum: a type whose full set of values is known statically.
/// There is no derive for this (that would itself be a decorator/reflection
/// surface). Authors implement it by hand for each key enum.
pub trait TableKey: Copy + Eq + std::hash::Hash + 'static {
    /// Every possible value of this key type, in declaration order.
    fn variants() -> &'static [Self];
    /// The key string used in paths and table construction.
    fn as_key(&self) -> &'static str;
}

/// The expected key set derivable from `K` alone (single-enum case).
pub fn expected_keys<K: TableKey>() -> Vec<ItemKey> {
    K::variants()
        .iter()
        .map(|k| ItemKey::Single(k.as_key().to_string()))
        .collect()
}

/// The expected key set for a two-component tuple key: the Cartesian
/// product of each component's domain.
pub fn expected_keys2<K1: TableKey, K2: TableKey>() -> Vec<ItemKey> {
    let mut out = Vec::with_capacity(K1::variants().len() * K2::variants().len());
    for k1 in K1::variants() {
        for k2 in K2::variants() {
            out.push(ItemKey::Tuple(vec![
                k1.as_key().to_string(),
                k2.as_key().to_string(),
            ]));
        }
    }
    out
}

/// An immutable, exhaustive mapping from a closed key domain to values.
///
/// Construction rejects empty input and any mismatch (missing or extra
/// keys) between the supplied entries and the expected domain.
#[derive(Debug, Clone)]
pub struct Table<K: TableKey, V> {
    entries: IndexMap<&'static str, V>,
    _key: std::marker::PhantomData<K>,
}

impl<K: TableKey, V> Table<K, V> {
    /// Builds a table from `(key, value)` pairs, requiring the exact
    /// expected key set: no missing, no extra.
    pub fn new(items: impl IntoIterator<Item = (K, V)>) -> Result<Self, VeriqError> {
        let mut entries: IndexMap<&'static str, V> = IndexMap::new();
        for (k, v) in items {
            entries.insert(k.as_key(), v);
        }
        if entries.is_empty() {
            return Err(VeriqError::Table("table cannot be empty".to_string()));
        }

        let expected: Vec<&'static str> = K::variants().iter().map(|k| k.as_key()).collect();

        let missing: Vec<&str> = expected
            .iter()
            .filter(|k| !entries.contains_key(*k))
            .copied()
            .collect();
        if !missing.is_empty() {
            return Err(VeriqError::Table(format!(
                "table is missing keys: {}",
                missing.join(", ")
            )));
        }

        let extra: Vec<&str> = entries
            .keys()
            .filter(|k| !expected.contains(k))
            .copied()
            .collect();
        if !extra.is_empty() {
            return Err(VeriqError::Table(format!(
                "table has disallowed keys: {}",
                extra.join(", ")
            )));
        }

        Ok(Self {
            entries,
            _key: std::marker::PhantomData,
        })
    }

    pub fn get(&self, key: K) -> &V {
        &self.entries[key.as_key()]
    }

    pub fn expected_keys(&self) -> Vec<ItemKey> {
        expected_keys::<K>()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &V)> {
        self.entries.iter().map(|(k, v)| (*k, v))
    }
}
