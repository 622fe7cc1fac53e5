//! Color refinement: the equitable-partition fixed point.
//!
//! Starting from an initial coloring (uniform by default), each round
//! recolors every element by the rank of its full neighborhood description
//! among the sorted distinct descriptions of its table. The description of
//! element `i` in table `t` is the tuple
//!
//! `(previous color, per-incoming-arrow source-color count vectors,
//!   per-outgoing-arrow target colors)`
//!
//! Because the previous color leads the tuple, every round refines the
//! previous partition, so the total number of color classes is monotone and
//! the iteration reaches its fixed point in at most `Σ n_t` rounds.
//!
//! Ranking compares full tuples in a total order — never hash buckets — so
//! no collision handling is needed anywhere downstream.
//!
//! # Citations
//! - Weisfeiler & Lehman, "A reduction of a graph to a canonical form" (1968)
//! - McKay & Piperno, "Practical graph isomorphism, II" (2014), §2 equitable partitions

use crate::cset::CSet;
use crate::perm::CMap;
use crate::schema::TableId;

/// The neighborhood description of one element under a coloring.
///
/// Ordered lexicographically; ranking sorted distinct keys per table yields
/// the canonical dense renumbering of the refined coloring.
type ElementKey = (usize, Vec<Vec<usize>>, Vec<usize>);

/// Refines `init` to the unique equitable coloring of `g` that it
/// dominates.
///
/// The output is independent of element insertion order; only the total
/// order on description tuples matters.
pub fn color_refine(g: &CSet, init: &CMap) -> CMap {
    let mut coloring = init.clone();
    let mut total = coloring.total_colors();
    loop {
        coloring = refine_round(g, &coloring);
        let refined_total = coloring.total_colors();
        if refined_total == total {
            return coloring;
        }
        total = refined_total;
    }
}

/// The uniform starting coloring for `g` (every element color 0).
pub fn uniform_coloring(g: &CSet) -> CMap {
    CMap::uniform(g.sizes())
}

/// One refinement round: recolor every table by sorted distinct keys.
fn refine_round(g: &CSet, c: &CMap) -> CMap {
    let schema = g.schema();
    let counts: Vec<usize> = (0..schema.table_count()).map(|t| c.color_count(t)).collect();
    let mut components = Vec::with_capacity(schema.table_count());
    for t in 0..schema.table_count() {
        let keys: Vec<ElementKey> = (0..g.sizes()[t])
            .map(|i| element_key(g, c, &counts, TableId(t), i))
            .collect();
        let mut distinct = keys.clone();
        distinct.sort();
        distinct.dedup();
        let component = keys
            .iter()
            .map(|k| {
                distinct
                    .binary_search(k)
                    .expect("key came from the same table")
            })
            .collect();
        components.push(component);
    }
    CMap::new(components)
}

/// Builds the description tuple for element `i` of table `t`.
fn element_key(g: &CSet, c: &CMap, counts: &[usize], t: TableId, i: usize) -> ElementKey {
    let schema = g.schema();
    let mut in_counts = Vec::new();
    for a in schema.arrows_into(t) {
        let s = schema.src(a).index();
        let mut hist = vec![0usize; counts[s]];
        for &src_el in g.preimage(a, i) {
            hist[c.component(s)[src_el]] += 1;
        }
        in_counts.push(hist);
    }
    let mut out_colors = Vec::new();
    for b in schema.arrows_from(t) {
        let u = schema.tgt(b).index();
        out_colors.push(c.component(u)[g.image(b)[i]]);
    }
    (c.component(t.index())[i], in_counts, out_colors)
}

/// True when `c` is an equitable coloring of `g`.
///
/// Equivalent to `refine_round` being color-preserving: elements sharing a
/// color share a description tuple.
pub fn is_equitable(g: &CSet, c: &CMap) -> bool {
    let schema = g.schema();
    let counts: Vec<usize> = (0..schema.table_count()).map(|t| c.color_count(t)).collect();
    for t in 0..schema.table_count() {
        let mut by_color: Vec<Option<ElementKey>> = vec![None; counts[t]];
        for i in 0..g.sizes()[t] {
            let key = element_key(g, c, &counts, TableId(t), i);
            let slot = &mut by_color[c.component(t)[i]];
            match slot {
                None => *slot = Some(key),
                Some(prev) if *prev != key => return false,
                Some(_) => {}
            }
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cset::CSet;
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
    fn cycle_stays_uniform() {
        // Every vertex of a directed cycle has the same in/out profile.
        let g = graph(4, &[(0, 1), (1, 2), (2, 3), (3, 0)]);
        let c = color_refine(&g, &uniform_coloring(&g));
        assert_eq!(c.color_count(0), 1);
        assert_eq!(c.color_count(1), 1);
        assert!(is_equitable(&g, &c));
    }

    #[test]
    fn path_becomes_discrete() {
        // 0 -> 1 -> 2: endpoints and middle are all distinguishable,
        // and the two edges differ by their endpoints' colors.
        let g = graph(3, &[(0, 1), (1, 2)]);
        let c = color_refine(&g, &uniform_coloring(&g));
        assert_eq!(c.color_count(0), 3);
        assert_eq!(c.color_count(1), 2);
        assert!(c.is_discrete());
        assert!(is_equitable(&g, &c));
    }

    #[test]
    fn refinement_respects_individualization() {
        let g = graph(4, &[(0, 1), (1, 2), (2, 3), (3, 0)]);
        let mut init = uniform_coloring(&g);
        init.individualize(0, 0);
        let c = color_refine(&g, &init);
        // Individualizing one vertex of a directed 4-cycle makes everything
        // discrete: each remaining vertex is at a distinct distance.
        assert!(c.is_discrete());
        assert!(is_equitable(&g, &c));
    }

    #[test]
    fn refinement_is_deterministic() {
        let g = graph(5, &[(0, 1), (1, 2), (2, 3), (3, 4), (4, 0), (0, 2)]);
        let a = color_refine(&g, &uniform_coloring(&g));
        let b = color_refine(&g, &uniform_coloring(&g));
        assert_eq!(a, b);
    }

    #[test]
    fn fixed_point_is_stable() {
        let g = graph(4, &[(0, 1), (1, 0), (2, 3), (3, 2)]);
        let c = color_refine(&g, &uniform_coloring(&g));
        let again = color_refine(&g, &c);
        assert_eq!(c, again);
    }
}
