//! Orbit computation for sibling-leaf automorphisms.
//!
//! While a branching node iterates its splitting cell, automorphisms
//! already witnessed by pairs of leaves below that node act on the cell.
//! An element whose orbit under those automorphisms contains an
//! already-explored sibling would root a subtree isomorphic to an explored
//! one, so it is skipped.
//!
//! Candidate maps come from arbitrary leaf pairs and are only kept after
//! verifying that they genuinely fix the searched structure — a pruning
//! decision backed by a non-automorphism would be unsound.

use crate::cset::CSet;
use crate::search::{SearchError, SearchTree};
use std::collections::HashSet;

/// Collects verified automorphism generators restricted to `table`, from
/// every pair of leaves below `node` discovered so far.
pub(crate) fn sibling_generators(
    g: &CSet,
    tree: &SearchTree,
    node: &[(usize, usize)],
    table: usize,
) -> Result<Vec<Vec<usize>>, SearchError> {
    let below: Vec<&Vec<(usize, usize)>> = tree
        .leaves()
        .iter()
        .filter(|p| p.len() > node.len() && p[..node.len()] == *node)
        .collect();
    let mut seen: HashSet<Vec<usize>> = HashSet::new();
    let mut generators = Vec::new();
    for (i, li) in below.iter().enumerate() {
        for lj in below.iter().skip(i + 1) {
            let sat_i = &tree.node(li).expect("leaf paths are in the tree").saturated;
            let sat_j = &tree.node(lj).expect("leaf paths are in the tree").saturated;
            for gamma in [
                sat_i.compose(&sat_j.invert()?),
                sat_j.compose(&sat_i.invert()?),
            ] {
                if g.apply(&gamma)? != *g {
                    continue;
                }
                let restricted = gamma.component(table).to_vec();
                if is_identity(&restricted) || !seen.insert(restricted.clone()) {
                    continue;
                }
                generators.push(restricted);
            }
        }
    }
    Ok(generators)
}

/// The orbit of `x` under the group generated by `generators`, computed by
/// generator-by-generator BFS.
///
/// The generators are bijections of a finite set, so the semigroup they
/// generate under BFS already contains every inverse; no explicit inverse
/// generators are needed.
pub(crate) fn orbit(generators: &[Vec<usize>], n: usize, x: usize) -> Vec<usize> {
    let mut seen = vec![false; n];
    seen[x] = true;
    let mut frontier = vec![x];
    while let Some(y) = frontier.pop() {
        for gen in generators {
            let z = gen[y];
            if !seen[z] {
                seen[z] = true;
                frontier.push(z);
            }
        }
    }
    (0..n).filter(|&i| seen[i]).collect()
}

#[inline]
fn is_identity(perm: &[usize]) -> bool {
    perm.iter().enumerate().all(|(i, &v)| i == v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orbit_of_single_cycle_generator() {
        // (0 1 2)(3)
        let gen = vec![vec![1, 2, 0, 3]];
        assert_eq!(orbit(&gen, 4, 0), vec![0, 1, 2]);
        assert_eq!(orbit(&gen, 4, 3), vec![3]);
    }

    #[test]
    fn orbit_joins_under_two_generators() {
        // (0 1) and (1 2) generate S_3 on {0,1,2}.
        let gens = vec![vec![1, 0, 2, 3], vec![0, 2, 1, 3]];
        assert_eq!(orbit(&gens, 4, 0), vec![0, 1, 2]);
    }

    #[test]
    fn orbit_reaches_inverse_images() {
        // A 3-cycle used forward-only still yields the full cycle orbit.
        let gen = vec![vec![1, 2, 0]];
        assert_eq!(orbit(&gen, 3, 2), vec![0, 1, 2]);
    }
}
