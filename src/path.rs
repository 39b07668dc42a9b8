//! Path grammar, parsing, and the `Path`/`ProjectPath`/`Reference` value
//! types.

use std::fmt;

use smallvec::SmallVec;

use crate::error::VeriqError;

/// One segment of a [`Path`]: either a named field access or a table-item
/// access keyed by one or more enum-derived keys.
///
/// An attribute/item split, with item keys carrying single or tuple string
/// keys instead of numeric array indices.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathPart {
    Attribute(String),
    Item(ItemKey),
}

/// The key carried by an `Item` part: a single table key, or a tuple of
/// keys for multi-dimensional tables.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ItemKey {
    Single(String),
    Tuple(Vec<String>),
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemKey::Single(k) => write!(f, "{k}"),
            ItemKey::Tuple(ks) => write!(f, "{}", ks.join(", ")),
        }
    }
}

/// Small vector of path parts. Most paths are shallow, so inline storage
/// avoids a heap allocation for the common case.
pub type PartVec = SmallVec<[PathPart; 4]>;

/// The three path sub-kinds, tagged by their root sigil.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Path {
    /// Root is the literal `"$"`: the scope's root record.
    Model { parts: PartVec },
    /// Root begins with `"@"` followed by a calc name.
    Calc { name: String, parts: PartVec },
    /// Root begins with `"?"` followed by a verif name. `parts` is always
    /// empty: a verif yields a single boolean.
    Verif { name: String },
}

impl Path {
    pub fn parts(&self) -> &[PathPart] {
        match self {
            Path::Model { parts } | Path::Calc { parts, .. } => parts,
            Path::Verif { .. } => &[],
        }
    }

    /// Returns a copy of this path with `extra` appended to its parts list
    /// (verif paths reject any extension since they never carry parts).
    pub fn with_extra_parts(&self, extra: &[PathPart]) -> Path {
        match self {
            Path::Model { parts } => {
                let mut p = parts.clone();
                p.extend(extra.iter().cloned());
                Path::Model { parts: p }
            }
            Path::Calc { name, parts } => {
                let mut p = parts.clone();
                p.extend(extra.iter().cloned());
                Path::Calc {
                    name: name.clone(),
                    parts: p,
                }
            }
            Path::Verif { name } => Path::Verif { name: name.clone() },
        }
    }

    /// Parses a path string.
    ///
    /// Root extraction scans for the earliest of `.` or `[`; everything
    /// before it is the root (or the whole string if neither appears).
    pub fn parse(s: &str) -> Result<Path, VeriqError> {
        let s = s.trim();
        let (root, rest) = split_root(s);

        if let Some(name) = root.strip_prefix('@') {
            if name.is_empty() {
                return Err(syntax_err(s, "calc root '@' must be followed by a name"));
            }
            let parts = parse_parts(s, rest)?;
            return Ok(Path::Calc {
                name: name.to_string(),
                parts,
            });
        }
        if let Some(name) = root.strip_prefix('?') {
            if name.is_empty() {
                return Err(syntax_err(s, "verif root '?' must be followed by a name"));
            }
            let parts = parse_parts(s, rest)?;
            if !parts.is_empty() {
                return Err(syntax_err(s, "a verif path must not carry parts"));
            }
            return Ok(Path::Verif {
                name: name.to_string(),
            });
        }
        if root == "$" {
            let parts = parse_parts(s, rest)?;
            return Ok(Path::Model { parts });
        }

        Err(syntax_err(s, format!("unknown root sigil '{root}'")))
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let root = match self {
            Path::Model { .. } => "$".to_string(),
            Path::Calc { name, .. } => format!("@{name}"),
            Path::Verif { name } => format!("?{name}"),
        };
        write!(f, "{root}")?;
        for part in self.parts() {
            match part {
                PathPart::Attribute(name) => write!(f, ".{name}")?,
                PathPart::Item(key) => write!(f, "[{key}]")?,
            }
        }
        Ok(())
    }
}

fn syntax_err(path: &str, reason: impl Into<String>) -> VeriqError {
    VeriqError::PathSyntax {
        path: path.to_string(),
        reason: reason.into(),
    }
}

/// Splits `s` at the earliest of `.` or `[`, returning `(root, rest)` where
/// `rest` is the remainder of the string starting at the separator (so the
/// part parser can re-scan it uniformly).
fn split_root(s: &str) -> (&str, &str) {
    let dot = s.find('.');
    let bracket = s.find('[');
    let cut = match (dot, bracket) {
        (Some(d), Some(b)) => Some(d.min(b)),
        (Some(d), None) => Some(d),
        (None, Some(b)) => Some(b),
        (None, None) => None,
    };
    match cut {
        Some(idx) => (&s[..idx], &s[idx..]),
        None => (s, ""),
    }
}

fn parse_parts(full: &str, mut rest: &str) -> Result<PartVec, VeriqError> {
    let mut parts = PartVec::new();
    while !rest.is_empty() {
        match rest.as_bytes()[0] {
            b'.' => {
                rest = &rest[1..];
                let end = rest
                    .find(|c| c == '.' || c == '[')
                    .unwrap_or(rest.len());
                let name = &rest[..end];
                if name.is_empty() {
                    return Err(syntax_err(full, "empty attribute name after '.'"));
                }
                parts.push(PathPart::Attribute(name.to_string()));
                rest = &rest[end..];
            }
            b'[' => {
                rest = &rest[1..];
                let end = rest
                    .find(']')
                    .ok_or_else(|| syntax_err(full, "unclosed '['"))?;
                let key_str = &rest[..end];
                let key = if key_str.contains(',') {
                    ItemKey::Tuple(key_str.split(',').map(|k| k.trim().to_string()).collect())
                } else {
                    ItemKey::Single(key_str.trim().to_string())
                };
                parts.push(PathPart::Item(key));
                rest = &rest[end + 1..];
            }
            other => {
                return Err(syntax_err(
                    full,
                    format!("unexpected character '{}'", other as char),
                ));
            }
        }
    }
    Ok(parts)
}

/// The canonical global coordinate: a scope name paired with a path into
/// that scope. Two `ProjectPath`s are equal iff scope and path are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProjectPath {
    pub scope: String,
    pub path: Path,
}

impl ProjectPath {
    pub fn new(scope: impl Into<String>, path: Path) -> Self {
        Self {
            scope: scope.into(),
            path,
        }
    }
}

impl fmt::Display for ProjectPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.scope, self.path)
    }
}

/// An authorial annotation attached to a calc/verif parameter: a raw path
/// string plus an optional explicit scope. Resolved against the owning
/// calc/verif's default scope at registration time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub raw_path: String,
    pub scope: Option<String>,
}

impl Reference {
    /// A reference resolved against the owning calc/verif's own scope.
    pub fn new(raw_path: impl Into<String>) -> Self {
        Self {
            raw_path: raw_path.into(),
            scope: None,
        }
    }

    /// A reference that explicitly targets a different (imported) scope.
    pub fn in_scope(raw_path: impl Into<String>, scope: impl Into<String>) -> Self {
        Self {
            raw_path: raw_path.into(),
            scope: Some(scope.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_model_path() {
        let p = Path::parse("$.sub.a").unwrap();
        assert_eq!(
            p,
            Path::Model {
                parts: SmallVec::from_vec(vec![
                    PathPart::Attribute("sub".into()),
                    PathPart::Attribute("a".into()),
                ])
            }
        );
    }

    #[test]
    fn parses_single_item_key() {
        let p = Path::parse("$.table[option_a]").unwrap();
        assert_eq!(
            p.parts(),
            &[
                PathPart::Attribute("table".into()),
                PathPart::Item(ItemKey::Single("option_a".into())),
            ]
        );
    }

    #[test]
    fn parses_tuple_item_key_with_whitespace() {
        let p = Path::parse("$.t[nominal, option_b]").unwrap();
        assert_eq!(
            p.parts(),
            &[
                PathPart::Attribute("t".into()),
                PathPart::Item(ItemKey::Tuple(vec!["nominal".into(), "option_b".into()])),
            ]
        );
    }

    #[test]
    fn parses_calc_path() {
        let p = Path::parse("@calc_y.y").unwrap();
        assert_eq!(
            p,
            Path::Calc {
                name: "calc_y".into(),
                parts: SmallVec::from_vec(vec![PathPart::Attribute("y".into())]),
            }
        );
    }

    #[test]
    fn parses_verif_path() {
        let p = Path::parse("?v").unwrap();
        assert_eq!(
            p,
            Path::Verif {
                name: "v".into()
            }
        );
    }

    #[test]
    fn rejects_verif_path_with_parts() {
        assert!(Path::parse("?v.field").is_err());
    }

    #[test]
    fn rejects_unknown_root() {
        assert!(Path::parse("#weird").is_err());
    }

    #[test]
    fn rejects_unclosed_bracket() {
        assert!(Path::parse("$.table[option_a").is_err());
    }

    #[test]
    fn round_trips_through_display() {
        for s in ["$", "$.a.b", "$.t[k]", "$.t[k1, k2]", "@c.out", "?v"] {
            let parsed = Path::parse(s).unwrap();
            assert_eq!(parsed.to_string(), s);
        }
    }

    #[test]
    fn round_trips_with_whitespace_normalized() {
        let parsed = Path::parse("$.t[nominal,  option_b]").unwrap();
        assert_eq!(parsed.to_string(), "$.t[nominal, option_b]");
    }

    #[test]
    fn project_path_string_form() {
        let pp = ProjectPath::new("Scope", Path::parse("$.a").unwrap());
        assert_eq!(pp.to_string(), "Scope::$.a");
    }
}
