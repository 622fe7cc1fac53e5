//! Canonical forms and isomorphism hashing.
//!
//! Every leaf of the search tree is a relabeling of the lowered structure.
//! Applying each, lifting attribute values back, and taking the minimum
//! under a deterministic sort key yields a representative that is equal
//! field-for-field across the whole isomorphism class. The 64-bit hash of
//! that representative's serialized form answers isomorphism queries by
//! equality.
//!
//! The sort key compares attribute columns first (genuine values, not
//! ranks), then arrow images, each group ordered by the schema heuristic
//! in [`crate::order`].
//!
//! # Citations
//! - Canonical labeling: McKay & Piperno, "Practical graph isomorphism, II" (2014)
//! - Domain separation for digests: Bernstein et al., "How to hash into elliptic curves" (2009)

use crate::cset::{AttrValue, CSet, CSetError};
use crate::hash::hash64_with_domain;
use crate::order::{schema_order, SchemaOrder};
use crate::pseudo::Pseudo;
use crate::search::{search, SearchConfig, SearchError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Domain tag for canonical-form digests.
const DOMAIN_CANONICAL_V1: &[u8] = b"CANONICAL_FORM_V1";

/// Error raised during canonicalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CanonError {
    /// No candidate survived; unreachable when the search is correct.
    EmptyIsosList,
    /// The underlying search failed.
    Search(SearchError),
    /// An instance operation failed.
    Instance(CSetError),
}

impl fmt::Display for CanonError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CanonError::EmptyIsosList => write!(f, "no canonical candidate was produced"),
            CanonError::Search(err) => write!(f, "search error: {}", err),
            CanonError::Instance(err) => write!(f, "instance error: {}", err),
        }
    }
}

impl std::error::Error for CanonError {}

impl From<SearchError> for CanonError {
    fn from(err: SearchError) -> Self {
        CanonError::Search(err)
    }
}

impl From<CSetError> for CanonError {
    fn from(err: CSetError) -> Self {
        CanonError::Instance(err)
    }
}

/// Comparison key of one canonical candidate: attribute columns first,
/// then arrow images, in heuristic order.
type CandidateKey = (Vec<Vec<AttrValue>>, Vec<Vec<usize>>);

fn candidate_key(x: &CSet, ord: &SchemaOrder) -> CandidateKey {
    let attrs = ord.attrs.iter().map(|&i| x.attrs()[i].clone()).collect();
    let images = ord.arrows.iter().map(|&a| x.images()[a].clone()).collect();
    (attrs, images)
}

/// The canonical representative of `g`'s isomorphism class, under the
/// default search configuration.
pub fn canonical_iso(g: &CSet) -> Result<CSet, CanonError> {
    canonical_iso_with(g, &SearchConfig::default())
}

/// The canonical representative under an explicit configuration.
pub fn canonical_iso_with(g: &CSet, cfg: &SearchConfig) -> Result<CSet, CanonError> {
    let lowering = Pseudo::new(g)?;
    let outcome = search(lowering.cset(), cfg)?;
    let ord = schema_order(g.schema());
    let mut best: Option<(CandidateKey, CSet)> = None;
    for leaf in outcome.tree.leaves() {
        let sat = &outcome
            .tree
            .node(leaf)
            .expect("leaf paths are in the tree")
            .saturated;
        let applied = lowering.cset().apply(sat)?;
        let candidate = lowering.lift(&applied, g)?;
        let key = candidate_key(&candidate, &ord);
        if best.as_ref().map_or(true, |(bk, _)| key < *bk) {
            best = Some((key, candidate));
        }
    }
    best.map(|(_, c)| c).ok_or(CanonError::EmptyIsosList)
}

/// 64-bit hash of the canonical representative.
///
/// Equal for every pair of isomorphic instances; unequal hashes certify
/// non-isomorphism. Stable across runs of the same build.
pub fn canonical_hash(g: &CSet) -> Result<u64, CanonError> {
    canonical_hash_with(g, &SearchConfig::default())
}

/// 64-bit canonical hash under an explicit configuration.
pub fn canonical_hash_with(g: &CSet, cfg: &SearchConfig) -> Result<u64, CanonError> {
    let canon = canonical_iso_with(g, cfg)?;
    let bytes = serde_cbor::to_vec(&canon).expect("canonical form serializes to CBOR");
    Ok(hash64_with_domain(DOMAIN_CANONICAL_V1, &bytes))
}

/// True when `g` and `h` are isomorphic.
///
/// Decided by field-for-field equality of canonical representatives;
/// instances over different schemas are never isomorphic.
pub fn is_isomorphic(g: &CSet, h: &CSet) -> Result<bool, CanonError> {
    if g.schema() != h.schema() {
        return Ok(false);
    }
    Ok(canonical_iso(g)? == canonical_iso(h)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Schema;

    fn graph(n_v: usize, edges: &[(usize, usize)]) -> CSet {
        let schema = Schema::new(
            vec!["V".into(), "E".into()],
            vec![("src".into(), 1, 0), ("tgt".into(), 1, 0)],
            vec![],
            vec![],
        )
        .unwrap();
        let src = edges.iter().map(|&(s, _)| s).collect();
        let tgt = edges.iter().map(|&(_, t)| t).collect();
        CSet::new(schema, vec![n_v, edges.len()], vec![src, tgt], vec![]).unwrap()
    }

    #[test]
    fn canonical_form_is_idempotent() {
        let g = graph(4, &[(0, 1), (1, 2), (2, 3), (3, 0)]);
        let canon = canonical_iso(&g).unwrap();
        let again = canonical_iso(&canon).unwrap();
        assert_eq!(canon, again);
    }

    #[test]
    fn relabeled_cycles_share_a_hash() {
        let g = graph(4, &[(0, 1), (1, 2), (2, 3), (3, 0)]);
        // Same cycle with vertices listed in a different order.
        let h = graph(4, &[(2, 3), (0, 1), (3, 0), (1, 2)]);
        assert_eq!(canonical_hash(&g).unwrap(), canonical_hash(&h).unwrap());
        assert!(is_isomorphic(&g, &h).unwrap());
    }

    #[test]
    fn different_structures_hash_apart() {
        // A 4-cycle against a path of the same size.
        let g = graph(4, &[(0, 1), (1, 2), (2, 3), (3, 0)]);
        let h = graph(4, &[(0, 1), (1, 2), (2, 3), (3, 1)]);
        assert_ne!(canonical_hash(&g).unwrap(), canonical_hash(&h).unwrap());
        assert!(!is_isomorphic(&g, &h).unwrap());
    }

    #[test]
    fn schema_mismatch_is_never_isomorphic() {
        let g = graph(1, &[(0, 0)]);
        let schema = Schema::new(
            vec!["V".into()],
            vec![("next".into(), 0, 0)],
            vec![],
            vec![],
        )
        .unwrap();
        let h = CSet::new(schema, vec![1], vec![vec![0]], vec![]).unwrap();
        assert!(!is_isomorphic(&g, &h).unwrap());
    }
}
