//! Deterministic table and arrow ordering for canonicalization keys.
//!
//! Each table carries an `(in, out)` score pair, seeded at `(1, 1)` and
//! grown by fixed-point iteration: a table's in-score absorbs the in-scores
//! of every arrow source pointing at it, its out-score absorbs the
//! out-scores of every arrow target it points at. Iteration stops when the
//! induced order stabilizes. The final order is score-descending, so
//! tables with many distinguishing in-neighbors sort late and
//! easily-distinguished tables dominate the comparison key early.
//!
//! Arrows are keyed by the componentwise sum of their endpoints' scores,
//! likewise reversed; attribute arrows follow their source table's
//! position. Ties everywhere break by declaration index, keeping the
//! order total and deterministic.

use crate::schema::Schema;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;

/// Hard cap on score iterations; the order always stabilizes long before
/// this on finite schemas, the cap only guards against a degenerate cycle
/// of order flips.
const MAX_ROUNDS: usize = 64;

/// A total order on a schema's tables, arrows, and attribute arrows.
///
/// Each field lists declaration indices in comparison-key order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaOrder {
    /// Table indices, most-distinguishing last.
    pub tables: Vec<usize>,
    /// Arrow indices in comparison-key order.
    pub arrows: Vec<usize>,
    /// Attribute-arrow indices in comparison-key order.
    pub attrs: Vec<usize>,
}

/// Computes the canonical ordering for `schema`.
pub fn schema_order(schema: &Schema) -> SchemaOrder {
    let n = schema.table_count();
    let mut scores: Vec<(u64, u64)> = vec![(1, 1); n];
    let mut order = induced_order(&scores);
    for _ in 0..MAX_ROUNDS {
        let mut next = scores.clone();
        for arrow in schema.arrows() {
            let (s, t) = (arrow.src.index(), arrow.tgt.index());
            next[t].0 = next[t].0.saturating_add(scores[s].0);
            next[s].1 = next[s].1.saturating_add(scores[t].1);
        }
        let next_order = induced_order(&next);
        let stable = next_order == order;
        scores = next;
        order = next_order;
        if stable {
            break;
        }
    }

    let mut tables: Vec<usize> = (0..n).collect();
    tables.sort_by_key(|&t| (Reverse(scores[t]), t));

    let mut arrows: Vec<usize> = (0..schema.arrow_count()).collect();
    arrows.sort_by_key(|&a| {
        let arrow = &schema.arrows()[a];
        let (s, t) = (arrow.src.index(), arrow.tgt.index());
        let key = (
            scores[s].0.saturating_add(scores[t].0),
            scores[s].1.saturating_add(scores[t].1),
        );
        (Reverse(key), a)
    });

    let table_pos: Vec<usize> = {
        let mut pos = vec![0; n];
        for (rank, &t) in tables.iter().enumerate() {
            pos[t] = rank;
        }
        pos
    };
    let mut attrs: Vec<usize> = (0..schema.attr_count()).collect();
    attrs.sort_by_key(|&x| (table_pos[schema.attrs()[x].src.index()], x));

    SchemaOrder { tables, arrows, attrs }
}

/// Ascending table order induced by a score vector (ties by index).
fn induced_order(scores: &[(u64, u64)]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by_key(|&t| (scores[t], t));
    order
}
