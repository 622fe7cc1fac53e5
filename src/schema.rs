//! Schema descriptors for attributed C-sets.
//!
//! A schema is a finite category presentation: a set of tables (objects),
//! arrows between tables (morphism generators), and attribute arrows from
//! tables into externally-ordered value domains. The descriptor is built
//! once, validated eagerly, and consumed read-only by every algorithm in
//! this crate; the name→index translation happens here and nowhere else.
//!
//! # Citations
//! - C-sets as functors into Set: Spivak, "Functorial data migration" (2012)
//! - Attributed C-sets: Patterson, Lynch, Fairbanks, "Categorical data structures for technical computing" (2022)

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Index of a table in schema declaration order.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TableId(pub usize);

impl TableId {
    /// Returns the raw index.
    #[inline]
    pub const fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TableId({})", self.0)
    }
}

/// Index of an arrow in schema declaration order.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArrowId(pub usize);

impl ArrowId {
    /// Returns the raw index.
    #[inline]
    pub const fn index(&self) -> usize {
        self.0
    }
}

/// Index of an attribute domain in schema declaration order.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DomId(pub usize);

impl DomId {
    /// Returns the raw index.
    #[inline]
    pub const fn index(&self) -> usize {
        self.0
    }
}

/// Index of an attribute arrow in schema declaration order.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttrId(pub usize);

impl AttrId {
    /// Returns the raw index.
    #[inline]
    pub const fn index(&self) -> usize {
        self.0
    }
}

/// An arrow between two tables.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Arrow {
    /// Arrow name, unique across arrows and attribute arrows.
    pub name: String,
    /// Source table.
    pub src: TableId,
    /// Target table.
    pub tgt: TableId,
}

/// An attribute arrow from a table into a value domain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttrArrow {
    /// Arrow name, unique across arrows and attribute arrows.
    pub name: String,
    /// Source table.
    pub src: TableId,
    /// Target value domain.
    pub dom: DomId,
}

/// Error raised while constructing a schema descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SchemaError {
    /// Two tables, domains, or arrows share a name.
    DuplicateName(String),
    /// An arrow references a table index that does not exist.
    UnknownTable { arrow: String, table: usize },
    /// An attribute arrow references a domain index that does not exist.
    UnknownDomain { arrow: String, dom: usize },
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaError::DuplicateName(name) => write!(f, "duplicate name `{}`", name),
            SchemaError::UnknownTable { arrow, table } => {
                write!(f, "arrow `{}` references unknown table {}", arrow, table)
            }
            SchemaError::UnknownDomain { arrow, dom } => {
                write!(f, "attribute arrow `{}` references unknown domain {}", arrow, dom)
            }
        }
    }
}

impl std::error::Error for SchemaError {}

/// A validated schema descriptor.
///
/// Immutable for the duration of any computation that consumes it. All
/// algorithms address tables, arrows, and domains by position, never by
/// name; names exist for construction-time validation and display.
///
/// # Invariants
/// - All names (tables, domains, arrows, attribute arrows) are unique.
/// - Every arrow endpoint and attribute domain reference is in range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    tables: Vec<String>,
    arrows: Vec<Arrow>,
    doms: Vec<String>,
    attrs: Vec<AttrArrow>,
}

impl Schema {
    /// Builds and validates a schema descriptor.
    ///
    /// `arrows` are `(name, src, tgt)` table-index triples; `attrs` are
    /// `(name, src, dom)` triples into `doms`.
    pub fn new(
        tables: Vec<String>,
        arrows: Vec<(String, usize, usize)>,
        doms: Vec<String>,
        attrs: Vec<(String, usize, usize)>,
    ) -> Result<Self, SchemaError> {
        let mut seen = HashSet::new();
        for name in tables.iter().chain(doms.iter()) {
            if !seen.insert(name.clone()) {
                return Err(SchemaError::DuplicateName(name.clone()));
            }
        }
        for (name, _, _) in arrows.iter().chain(attrs.iter()) {
            if !seen.insert(name.clone()) {
                return Err(SchemaError::DuplicateName(name.clone()));
            }
        }
        let arrows = arrows
            .into_iter()
            .map(|(name, src, tgt)| {
                for &t in &[src, tgt] {
                    if t >= tables.len() {
                        return Err(SchemaError::UnknownTable { arrow: name.clone(), table: t });
                    }
                }
                Ok(Arrow { name, src: TableId(src), tgt: TableId(tgt) })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let attrs = attrs
            .into_iter()
            .map(|(name, src, dom)| {
                if src >= tables.len() {
                    return Err(SchemaError::UnknownTable { arrow: name.clone(), table: src });
                }
                if dom >= doms.len() {
                    return Err(SchemaError::UnknownDomain { arrow: name.clone(), dom });
                }
                Ok(AttrArrow { name, src: TableId(src), dom: DomId(dom) })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { tables, arrows, doms, attrs })
    }

    /// Number of tables.
    #[inline]
    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    /// Number of arrows.
    #[inline]
    pub fn arrow_count(&self) -> usize {
        self.arrows.len()
    }

    /// Number of attribute domains.
    #[inline]
    pub fn dom_count(&self) -> usize {
        self.doms.len()
    }

    /// Number of attribute arrows.
    #[inline]
    pub fn attr_count(&self) -> usize {
        self.attrs.len()
    }

    /// True when the schema carries no attribute arrows.
    #[inline]
    pub fn is_pure(&self) -> bool {
        self.attrs.is_empty()
    }

    /// Table names in declaration order.
    #[inline]
    pub fn tables(&self) -> &[String] {
        &self.tables
    }

    /// Arrows in declaration order.
    #[inline]
    pub fn arrows(&self) -> &[Arrow] {
        &self.arrows
    }

    /// Domain names in declaration order.
    #[inline]
    pub fn doms(&self) -> &[String] {
        &self.doms
    }

    /// Attribute arrows in declaration order.
    #[inline]
    pub fn attrs(&self) -> &[AttrArrow] {
        &self.attrs
    }

    /// Source table of an arrow.
    #[inline]
    pub fn src(&self, a: ArrowId) -> TableId {
        self.arrows[a.0].src
    }

    /// Target table of an arrow.
    #[inline]
    pub fn tgt(&self, a: ArrowId) -> TableId {
        self.arrows[a.0].tgt
    }

    /// Arrows whose target is `t`, in declaration order.
    pub fn arrows_into(&self, t: TableId) -> Vec<ArrowId> {
        self.arrows
            .iter()
            .enumerate()
            .filter(|(_, a)| a.tgt == t)
            .map(|(i, _)| ArrowId(i))
            .collect()
    }

    /// Arrows whose source is `t`, in declaration order.
    pub fn arrows_from(&self, t: TableId) -> Vec<ArrowId> {
        self.arrows
            .iter()
            .enumerate()
            .filter(|(_, a)| a.src == t)
            .map(|(i, _)| ArrowId(i))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph_schema() -> Schema {
        Schema::new(
            vec!["V".into(), "E".into()],
            vec![("src".into(), 1, 0), ("tgt".into(), 1, 0)],
            vec![],
            vec![],
        )
        .unwrap()
    }

    #[test]
    fn graph_schema_shape() {
        let s = graph_schema();
        assert_eq!(s.table_count(), 2);
        assert_eq!(s.arrow_count(), 2);
        assert!(s.is_pure());
        assert_eq!(s.src(ArrowId(0)), TableId(1));
        assert_eq!(s.tgt(ArrowId(0)), TableId(0));
        assert_eq!(s.arrows_into(TableId(0)), vec![ArrowId(0), ArrowId(1)]);
        assert_eq!(s.arrows_from(TableId(1)), vec![ArrowId(0), ArrowId(1)]);
    }

    #[test]
    fn duplicate_names_rejected() {
        let err = Schema::new(
            vec!["V".into(), "V".into()],
            vec![],
            vec![],
            vec![],
        )
        .unwrap_err();
        assert_eq!(err, SchemaError::DuplicateName("V".into()));

        let err = Schema::new(
            vec!["V".into()],
            vec![("f".into(), 0, 0), ("f".into(), 0, 0)],
            vec![],
            vec![],
        )
        .unwrap_err();
        assert_eq!(err, SchemaError::DuplicateName("f".into()));
    }

    #[test]
    fn out_of_range_references_rejected() {
        let err = Schema::new(
            vec!["V".into()],
            vec![("f".into(), 0, 3)],
            vec![],
            vec![],
        )
        .unwrap_err();
        assert!(matches!(err, SchemaError::UnknownTable { table: 3, .. }));

        let err = Schema::new(
            vec!["V".into()],
            vec![],
            vec!["Label".into()],
            vec![("dec".into(), 0, 2)],
        )
        .unwrap_err();
        assert!(matches!(err, SchemaError::UnknownDomain { dom: 2, .. }));
    }

    #[test]
    fn attributed_schema_accepted() {
        let s = Schema::new(
            vec!["V".into(), "E".into()],
            vec![("src".into(), 1, 0), ("tgt".into(), 1, 0)],
            vec!["Label".into()],
            vec![("dec".into(), 0, 0)],
        )
        .unwrap();
        assert!(!s.is_pure());
        assert_eq!(s.attrs()[0].src, TableId(0));
        assert_eq!(s.attrs()[0].dom, DomId(0));
    }
}
