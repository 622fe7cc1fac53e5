//! Per-table integer maps: colorings and permutations.
//!
//! A `CMap` assigns one integer sequence to every table of a schema, in
//! table declaration order. The same representation serves two roles:
//!
//! - a *coloring*, where `map[t][i]` is the (dense, 0-based) color of
//!   element `i` of table `t`;
//! - a *permutation*, where each component is a bijection of `0..n_t`.
//!
//! A discrete coloring (every class a singleton) is exactly a permutation,
//! which is what lets search-tree leaves double as candidate relabelings.
//!
//! # Citations
//! - Permutation representation by direct/inverse mapping vectors: Knuth, TAOCP vol. 3, §5.1 (1998)

use serde::{Deserialize, Serialize};
use std::fmt;

/// Error raised by permutation-only operations applied to non-bijections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PermError {
    /// The component for `table` is not a bijection of `0..n`.
    NotABijection { table: usize },
}

impl fmt::Display for PermError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PermError::NotABijection { table } => {
                write!(f, "component for table {} is not a bijection", table)
            }
        }
    }
}

impl std::error::Error for PermError {}

/// One integer sequence per table: a coloring or a permutation.
///
/// Components are indexed by table position in schema declaration order.
/// Equality, ordering, and hashing are componentwise and deterministic.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CMap {
    components: Vec<Vec<usize>>,
}

impl CMap {
    /// Wraps raw components.
    #[inline]
    pub fn new(components: Vec<Vec<usize>>) -> Self {
        Self { components }
    }

    /// The uniform coloring: every element of every table gets color 0.
    pub fn uniform(sizes: &[usize]) -> Self {
        Self { components: sizes.iter().map(|&n| vec![0; n]).collect() }
    }

    /// The identity permutation for the given table sizes.
    pub fn identity(sizes: &[usize]) -> Self {
        Self { components: sizes.iter().map(|&n| (0..n).collect()).collect() }
    }

    /// Number of components (tables).
    #[inline]
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// True when there are no components.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// The component for table `t`.
    #[inline]
    pub fn component(&self, t: usize) -> &[usize] {
        &self.components[t]
    }

    /// All components, in table order.
    #[inline]
    pub fn components(&self) -> &[Vec<usize>] {
        &self.components
    }

    /// Mutable access to the component for table `t`.
    #[inline]
    pub fn component_mut(&mut self, t: usize) -> &mut Vec<usize> {
        &mut self.components[t]
    }

    /// Number of distinct colors in component `t`.
    ///
    /// Assumes the component is dense (colors `0..k` all present), which
    /// every coloring produced by this crate maintains.
    #[inline]
    pub fn color_count(&self, t: usize) -> usize {
        self.components[t].iter().copied().max().map_or(0, |m| m + 1)
    }

    /// Sum of distinct-color counts across tables.
    ///
    /// Strictly monotone over refinement rounds; used as the fixed-point
    /// detector.
    pub fn total_colors(&self) -> usize {
        (0..self.components.len()).map(|t| self.color_count(t)).sum()
    }

    /// Assigns a fresh color to element `x` of table `t`.
    ///
    /// The fresh color is `color_count(t)`, so density is preserved as long
    /// as the old class of `x` had at least two members.
    pub fn individualize(&mut self, t: usize, x: usize) {
        let fresh = self.color_count(t);
        self.components[t][x] = fresh;
    }

    /// Composition: `(self ∘ other)[t][i] = other[t][self[t][i]]`.
    ///
    /// `self` applies first. Component count and lengths must agree; a
    /// mismatch is a programmer error.
    pub fn compose(&self, other: &CMap) -> CMap {
        assert_eq!(
            self.components.len(),
            other.components.len(),
            "compose: component counts differ"
        );
        let components = self
            .components
            .iter()
            .zip(other.components.iter())
            .map(|(p, q)| p.iter().map(|&v| q[v]).collect())
            .collect();
        CMap { components }
    }

    /// Per-table inverse permutation.
    ///
    /// Fails when any component is not a bijection of `0..n`.
    pub fn invert(&self) -> Result<CMap, PermError> {
        let mut components = Vec::with_capacity(self.components.len());
        for (t, comp) in self.components.iter().enumerate() {
            let n = comp.len();
            let mut inv = vec![usize::MAX; n];
            for (i, &v) in comp.iter().enumerate() {
                if v >= n || inv[v] != usize::MAX {
                    return Err(PermError::NotABijection { table: t });
                }
                inv[v] = i;
            }
            components.push(inv);
        }
        Ok(CMap { components })
    }

    /// True when every component is a bijection of `0..n_t`.
    pub fn is_perm(&self) -> bool {
        self.components.iter().all(|comp| {
            let n = comp.len();
            let mut seen = vec![false; n];
            comp.iter().all(|&v| v < n && !std::mem::replace(&mut seen[v], true))
        })
    }

    /// True when the coloring is discrete (every class a singleton).
    ///
    /// For dense colorings this coincides with being a permutation.
    #[inline]
    pub fn is_discrete(&self) -> bool {
        self.is_perm()
    }

    /// Length-prefixed little-endian byte rendering.
    ///
    /// Used as hash input for indicator values; two maps have equal bytes
    /// iff they are equal.
    pub fn to_canonical_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&(self.components.len() as u64).to_le_bytes());
        for comp in &self.components {
            buf.extend_from_slice(&(comp.len() as u64).to_le_bytes());
            for &v in comp {
                buf.extend_from_slice(&(v as u64).to_le_bytes());
            }
        }
        buf
    }
}
