//! Kaleido: automorphism groups and canonical labelings for attributed C-sets.
//!
//! This crate computes, for a finite relational structure with typed tables,
//! typed arrows between tables, and attribute arrows into totally-ordered
//! value domains:
//!
//! - the automorphisms of the structure ([`autos`]),
//! - a canonical representative of its isomorphism class ([`canonical_iso`]),
//! - a stable 64-bit hash of that representative ([`canonical_hash`]),
//!   enabling isomorphism tests by hash equality.
//!
//! The engine is a McKay-style individualization-refinement search: color
//! refinement drives colorings to equitable fixed points, a DFS explores
//! individualizations of splitting cells, and discovered automorphisms,
//! sibling orbits, and indicator sequences prune the tree. Attributed
//! inputs are lowered to pure structures (one synthetic table per value
//! domain) before the search and lifted back before ranking candidates.
//!
//! # Name Origin: "Kaleido"
//!
//! A kaleidoscope is an instrument that makes symmetry visible: turn it,
//! and the picture changes while its structure does not. Kaleido does the
//! inverse — given the picture, it recovers every turn that leaves the
//! structure fixed, and a viewing angle everyone can agree on.
//!
//! # Mathematical Foundations
//!
//! A C-set is a functor from a finitely-presented category (the schema)
//! into Set; its automorphisms are the natural isomorphisms to itself.
//! Canonical labeling adapts McKay's partition-refinement search to this
//! multi-sorted setting: one color partition per table, refined jointly
//! along every arrow.
//!
//! # References
//!
//! - McKay, "Practical graph isomorphism" (1981)
//! - McKay & Piperno, "Practical graph isomorphism, II" (2014)
//! - Hartke & Radcliffe, "McKay's canonical graph labeling algorithm" (2009)
//! - Weisfeiler & Lehman, "A reduction of a graph to a canonical form" (1968)
//! - Patterson, Lynch, Fairbanks, "Categorical data structures for technical computing" (2022)
//!
//! # Example
//!
//! ```
//! use kaleido::prelude::*;
//!
//! let schema = Schema::new(
//!     vec!["V".into(), "E".into()],
//!     vec![("src".into(), 1, 0), ("tgt".into(), 1, 0)],
//!     vec![],
//!     vec![],
//! ).unwrap();
//! let cycle = CSet::new(
//!     schema,
//!     vec![3, 3],
//!     vec![vec![0, 1, 2], vec![1, 2, 0]],
//!     vec![],
//! ).unwrap();
//!
//! let found = autos(&cycle, &SearchConfig::default()).unwrap();
//! assert!(found.generators.iter().any(|p| *p == CMap::identity(cycle.sizes())));
//! for p in &found.generators {
//!     assert_eq!(cycle.apply(p).unwrap(), cycle);
//! }
//! ```

pub mod canon;
pub mod cset;
pub mod hash;
pub mod history;
pub mod order;
pub mod perm;
pub mod pseudo;
pub mod refine;
pub mod schema;
pub mod search;

pub use canon::{
    canonical_hash, canonical_hash_with, canonical_iso, canonical_iso_with, is_isomorphic,
    CanonError,
};
pub use cset::{AttrValue, CSet, CSetError};
pub use perm::{CMap, PermError};
pub use schema::{Arrow, ArrowId, AttrArrow, AttrId, DomId, Schema, SchemaError, TableId};
pub use search::{autos, search, Autos, SearchConfig, SearchError, SearchTree};

/// Prelude for convenient usage.
pub mod prelude {
    pub use crate::canon::{
        canonical_hash, canonical_hash_with, canonical_iso, canonical_iso_with, is_isomorphic,
        CanonError,
    };
    pub use crate::cset::{AttrValue, CSet, CSetError};
    pub use crate::hash::{hash64_with_domain, HashValue};
    pub use crate::history::SearchEvent;
    pub use crate::order::{schema_order, SchemaOrder};
    pub use crate::perm::{CMap, PermError};
    pub use crate::pseudo::Pseudo;
    pub use crate::refine::{color_refine, is_equitable, uniform_coloring};
    pub use crate::schema::{
        Arrow, ArrowId, AttrArrow, AttrId, DomId, Schema, SchemaError, TableId,
    };
    pub use crate::search::{
        autos, common, search, Autos, NodePath, SearchConfig, SearchError, SearchNode,
        SearchOutcome, SearchTree,
    };
}
