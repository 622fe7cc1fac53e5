//! Instances of attributed C-sets.
//!
//! A `CSet` pairs a validated [`Schema`](crate::schema::Schema) with tabular
//! data: a size per table, an image sequence per arrow, and a value sequence
//! per attribute arrow. Elements of a table of size `n` are `0..n`.
//!
//! The inverse image index (`preimage`) is built eagerly at construction —
//! the refinement hot loop assumes O(1) access to it — and is rebuilt
//! whenever arrow data changes, so it can never go stale.
//!
//! # Invariants
//! - `images[a].len() == sizes[src(a)]` and every entry is `< sizes[tgt(a)]`.
//! - `attrs[α].len() == sizes[asrc(α)]`.
//! - `preimages[a][j]` lists, in ascending order, exactly the `i` with
//!   `images[a][i] == j`.

use crate::perm::CMap;
use crate::schema::{ArrowId, AttrId, Schema, TableId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A value drawn from an attribute domain.
///
/// Domains hold one variant in practice; the derived order (variant rank,
/// then payload) is total either way, which is all the engine requires.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AttrValue {
    /// Boolean value.
    Bool(bool),
    /// Signed integer value.
    Int(i64),
    /// String value.
    Str(String),
}

impl AttrValue {
    fn write_canonical_bytes(&self, buf: &mut Vec<u8>) {
        match self {
            AttrValue::Bool(b) => {
                buf.push(0);
                buf.push(*b as u8);
            }
            AttrValue::Int(v) => {
                buf.push(1);
                buf.extend_from_slice(&v.to_le_bytes());
            }
            AttrValue::Str(s) => {
                buf.push(2);
                buf.extend_from_slice(&(s.len() as u64).to_le_bytes());
                buf.extend_from_slice(s.as_bytes());
            }
        }
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        AttrValue::Str(s.to_owned())
    }
}

impl From<i64> for AttrValue {
    fn from(v: i64) -> Self {
        AttrValue::Int(v)
    }
}

/// Error raised while constructing or transforming an instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CSetError {
    /// An arrow image points outside its target table.
    ImageOutOfRange { arrow: String, index: usize, value: usize },
    /// A data column's length disagrees with its source table size.
    LengthMismatch { column: String, expected: usize, actual: usize },
    /// The number of data columns disagrees with the schema.
    ColumnCountMismatch { expected: usize, actual: usize },
    /// A purported permutation failed the bijection check during `apply`.
    NotAnAutomorphism { table: usize },
}

impl fmt::Display for CSetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CSetError::ImageOutOfRange { arrow, index, value } => {
                write!(f, "arrow `{}` maps element {} to out-of-range {}", arrow, index, value)
            }
            CSetError::LengthMismatch { column, expected, actual } => {
                write!(f, "column `{}` has length {}, expected {}", column, actual, expected)
            }
            CSetError::ColumnCountMismatch { expected, actual } => {
                write!(f, "got {} data columns, schema declares {}", actual, expected)
            }
            CSetError::NotAnAutomorphism { table } => {
                write!(f, "map is not a permutation on table {}", table)
            }
        }
    }
}

impl std::error::Error for CSetError {}

/// An attributed C-set instance.
///
/// Read-only once constructed; `apply` produces a fresh instance. The
/// schema travels with the data so that every consumer sees a consistent
/// pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CSet {
    schema: Schema,
    sizes: Vec<usize>,
    images: Vec<Vec<usize>>,
    attrs: Vec<Vec<AttrValue>>,
    preimages: Vec<Vec<Vec<usize>>>,
}

impl CSet {
    /// Builds and validates an instance.
    ///
    /// `images` holds one column per schema arrow, `attrs` one column per
    /// attribute arrow, both in declaration order. The preimage index is
    /// built here.
    pub fn new(
        schema: Schema,
        sizes: Vec<usize>,
        images: Vec<Vec<usize>>,
        attrs: Vec<Vec<AttrValue>>,
    ) -> Result<Self, CSetError> {
        if sizes.len() != schema.table_count() {
            return Err(CSetError::ColumnCountMismatch {
                expected: schema.table_count(),
                actual: sizes.len(),
            });
        }
        if images.len() != schema.arrow_count() {
            return Err(CSetError::ColumnCountMismatch {
                expected: schema.arrow_count(),
                actual: images.len(),
            });
        }
        if attrs.len() != schema.attr_count() {
            return Err(CSetError::ColumnCountMismatch {
                expected: schema.attr_count(),
                actual: attrs.len(),
            });
        }
        for (a, col) in images.iter().enumerate() {
            let arrow = &schema.arrows()[a];
            let n_src = sizes[arrow.src.index()];
            let n_tgt = sizes[arrow.tgt.index()];
            if col.len() != n_src {
                return Err(CSetError::LengthMismatch {
                    column: arrow.name.clone(),
                    expected: n_src,
                    actual: col.len(),
                });
            }
            for (i, &j) in col.iter().enumerate() {
                if j >= n_tgt {
                    return Err(CSetError::ImageOutOfRange {
                        arrow: arrow.name.clone(),
                        index: i,
                        value: j,
                    });
                }
            }
        }
        for (x, col) in attrs.iter().enumerate() {
            let attr = &schema.attrs()[x];
            let n_src = sizes[attr.src.index()];
            if col.len() != n_src {
                return Err(CSetError::LengthMismatch {
                    column: attr.name.clone(),
                    expected: n_src,
                    actual: col.len(),
                });
            }
        }
        let preimages = build_preimages(&schema, &sizes, &images);
        Ok(Self { schema, sizes, images, attrs, preimages })
    }

    /// The schema this instance inhabits.
    #[inline]
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Table sizes in declaration order.
    #[inline]
    pub fn sizes(&self) -> &[usize] {
        &self.sizes
    }

    /// Size of table `t`.
    #[inline]
    pub fn size(&self, t: TableId) -> usize {
        self.sizes[t.index()]
    }

    /// Image column of arrow `a`.
    #[inline]
    pub fn image(&self, a: ArrowId) -> &[usize] {
        &self.images[a.index()]
    }

    /// All image columns, in arrow declaration order.
    #[inline]
    pub fn images(&self) -> &[Vec<usize>] {
        &self.images
    }

    /// Value column of attribute arrow `α`.
    #[inline]
    pub fn attr_values(&self, x: AttrId) -> &[AttrValue] {
        &self.attrs[x.index()]
    }

    /// All attribute columns, in declaration order.
    #[inline]
    pub fn attrs(&self) -> &[Vec<AttrValue>] {
        &self.attrs
    }

    /// Elements of `src(a)` mapping to `j`, ascending.
    #[inline]
    pub fn preimage(&self, a: ArrowId, j: usize) -> &[usize] {
        &self.preimages[a.index()][j]
    }

    /// Applies a per-table permutation, producing the relabeled instance.
    ///
    /// `img'_a[p[s][i]] = p[t][img_a[i]]` for every arrow `a: s → t`, and
    /// `attr'_α[p[s][i]] = attr_α[i]`. Fails fast when `p` is not a
    /// permutation of every table.
    pub fn apply(&self, p: &CMap) -> Result<CSet, CSetError> {
        if p.len() != self.schema.table_count() {
            return Err(CSetError::ColumnCountMismatch {
                expected: self.schema.table_count(),
                actual: p.len(),
            });
        }
        for t in 0..self.schema.table_count() {
            let comp = p.component(t);
            if comp.len() != self.sizes[t] {
                return Err(CSetError::NotAnAutomorphism { table: t });
            }
        }
        if !p.is_perm() {
            let bad = (0..p.len())
                .find(|&t| !CMap::new(vec![p.component(t).to_vec()]).is_perm())
                .unwrap_or(0);
            return Err(CSetError::NotAnAutomorphism { table: bad });
        }
        let mut images = Vec::with_capacity(self.images.len());
        for (a, col) in self.images.iter().enumerate() {
            let arrow = &self.schema.arrows()[a];
            let ps = p.component(arrow.src.index());
            let pt = p.component(arrow.tgt.index());
            let mut out = vec![0usize; col.len()];
            for (i, &j) in col.iter().enumerate() {
                out[ps[i]] = pt[j];
            }
            images.push(out);
        }
        let mut attrs = Vec::with_capacity(self.attrs.len());
        for (x, col) in self.attrs.iter().enumerate() {
            let src = self.schema.attrs()[x].src;
            let ps = p.component(src.index());
            let mut out = col.clone();
            for (i, v) in col.iter().enumerate() {
                out[ps[i]] = v.clone();
            }
            attrs.push(out);
        }
        CSet::new(self.schema.clone(), self.sizes.clone(), images, attrs)
    }

    /// Length-prefixed little-endian rendering of the tabular data.
    ///
    /// Table sizes, then image columns in arrow order, then attribute
    /// columns in declaration order. Two instances over the same schema
    /// have equal bytes iff their data is field-for-field equal.
    pub fn to_canonical_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&(self.sizes.len() as u64).to_le_bytes());
        for &n in &self.sizes {
            buf.extend_from_slice(&(n as u64).to_le_bytes());
        }
        buf.extend_from_slice(&(self.images.len() as u64).to_le_bytes());
        for col in &self.images {
            buf.extend_from_slice(&(col.len() as u64).to_le_bytes());
            for &j in col {
                buf.extend_from_slice(&(j as u64).to_le_bytes());
            }
        }
        buf.extend_from_slice(&(self.attrs.len() as u64).to_le_bytes());
        for col in &self.attrs {
            buf.extend_from_slice(&(col.len() as u64).to_le_bytes());
            for v in col {
                v.write_canonical_bytes(&mut buf);
            }
        }
        buf
    }
}

/// Builds the inverse image index for every arrow.
///
/// Sources are pushed in ascending order, so each bucket is sorted.
fn build_preimages(
    schema: &Schema,
    sizes: &[usize],
    images: &[Vec<usize>],
) -> Vec<Vec<Vec<usize>>> {
    let mut preimages = Vec::with_capacity(images.len());
    for (a, col) in images.iter().enumerate() {
        let n_tgt = sizes[schema.arrows()[a].tgt.index()];
        let mut buckets = vec![Vec::new(); n_tgt];
        for (i, &j) in col.iter().enumerate() {
            buckets[j].push(i);
        }
        preimages.push(buckets);
    }
    preimages
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Schema;

    fn cycle4() -> CSet {
        let schema = Schema::new(
            vec!["V".into(), "E".into()],
            vec![("src".into(), 1, 0), ("tgt".into(), 1, 0)],
            vec![],
            vec![],
        )
        .unwrap();
        CSet::new(
            schema,
            vec![4, 4],
            vec![vec![0, 1, 2, 3], vec![1, 2, 3, 0]],
            vec![],
        )
        .unwrap()
    }

    #[test]
    fn preimage_index_matches_images() {
        let g = cycle4();
        assert_eq!(g.preimage(ArrowId(0), 2), &[2]);
        assert_eq!(g.preimage(ArrowId(1), 0), &[3]);
        for j in 0..4 {
            for a in [ArrowId(0), ArrowId(1)] {
                for &i in g.preimage(a, j) {
                    assert_eq!(g.image(a)[i], j);
                }
            }
        }
    }

    #[test]
    fn out_of_range_image_rejected() {
        let schema = Schema::new(
            vec!["V".into(), "E".into()],
            vec![("src".into(), 1, 0), ("tgt".into(), 1, 0)],
            vec![],
            vec![],
        )
        .unwrap();
        let err = CSet::new(
            schema,
            vec![2, 1],
            vec![vec![0], vec![5]],
            vec![],
        )
        .unwrap_err();
        assert!(matches!(err, CSetError::ImageOutOfRange { value: 5, .. }));
    }

    #[test]
    fn apply_respects_naturality() {
        let g = cycle4();
        // Rotate vertices and edges by one step.
        let p = CMap::new(vec![vec![1, 2, 3, 0], vec![1, 2, 3, 0]]);
        let h = g.apply(&p).unwrap();
        // img'_a[p[s][i]] = p[t][img_a[i]] for every arrow and element.
        for a in [ArrowId(0), ArrowId(1)] {
            let (s, t) = (g.schema().src(a), g.schema().tgt(a));
            for i in 0..g.size(s) {
                assert_eq!(
                    h.image(a)[p.component(s.index())[i]],
                    p.component(t.index())[g.image(a)[i]]
                );
            }
        }
        // The rotation is an automorphism of the 4-cycle.
        assert_eq!(h, g);
    }

    #[test]
    fn apply_rejects_non_permutations() {
        let g = cycle4();
        let bad = CMap::new(vec![vec![0, 0, 1, 2], vec![0, 1, 2, 3]]);
        assert!(matches!(
            g.apply(&bad).unwrap_err(),
            CSetError::NotAnAutomorphism { table: 0 }
        ));
    }

    #[test]
    fn apply_moves_attribute_rows_with_their_elements() {
        let schema = Schema::new(
            vec!["V".into()],
            vec![],
            vec!["Label".into()],
            vec![("dec".into(), 0, 0)],
        )
        .unwrap();
        let g = CSet::new(
            schema,
            vec![3],
            vec![],
            vec![vec!["a".into(), "b".into(), "c".into()]],
        )
        .unwrap();
        let p = CMap::new(vec![vec![2, 0, 1]]);
        let h = g.apply(&p).unwrap();
        assert_eq!(
            h.attr_values(AttrId(0)),
            &[AttrValue::from("b"), AttrValue::from("c"), AttrValue::from("a")]
        );
    }

    #[test]
    fn canonical_bytes_golden() {
        let schema = Schema::new(
            vec!["V".into()],
            vec![("loop".into(), 0, 0)],
            vec![],
            vec![],
        )
        .unwrap();
        let g = CSet::new(schema, vec![1], vec![vec![0]], vec![]).unwrap();
        let expected = vec![
            0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // 1 table
            0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // size 1
            0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // 1 arrow
            0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // column length 1
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // image 0
            0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, // 0 attribute columns
        ];
        assert_eq!(g.to_canonical_bytes(), expected);
    }
}
