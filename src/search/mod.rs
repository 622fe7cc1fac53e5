//! DFS over ordered partition refinements.
//!
//! The search tree explores colorings of a pure structure: each node
//! refines its entry coloring to the equitable fixed point, picks the
//! splitting cell, and individualizes each of its elements in turn.
//! Discrete leaves are candidate relabelings; pairs of equivalent leaves
//! witness automorphisms. Three pruning tactics keep the tree small:
//!
//! - **auto-prune**: a discovered automorphism mapping one explored branch
//!   onto a pending one flags the pending branch's remainder;
//! - **orbit-prune**: an element in the orbit of an explored sibling under
//!   already-witnessed automorphisms is skipped;
//! - **order-prune** (off by default): a node whose indicator sequence is
//!   lexicographically dominated by the best leaf's cannot yield the
//!   canonical leaf and is abandoned.
//!
//! The recursion depth is bounded by the total element count; every node
//! stays in the tree until the search returns.
//!
//! # Citations
//! - McKay, "Practical graph isomorphism" (1981)
//! - McKay & Piperno, "Practical graph isomorphism, II" (2014)
//! - Hartke & Radcliffe, "McKay's canonical graph labeling algorithm" (2009)

pub mod orbit;

use crate::cset::{CSet, CSetError};
use crate::hash::hash64_with_domain;
use crate::history::SearchEvent;
use crate::perm::{CMap, PermError};
use crate::pseudo::Pseudo;
use crate::refine::{color_refine, uniform_coloring};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Domain tag for node indicator digests.
const DOMAIN_INDICATOR: &[u8] = b"NODE_INDICATOR";

/// Path from the root: one `(table, individualized element)` pair per edge.
pub type NodePath = Vec<(usize, usize)>;

/// Error surfaced by a search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchError {
    /// A permutation operation failed.
    Perm(PermError),
    /// An instance operation failed.
    Instance(CSetError),
}

impl fmt::Display for SearchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchError::Perm(err) => write!(f, "permutation error: {}", err),
            SearchError::Instance(err) => write!(f, "instance error: {}", err),
        }
    }
}

impl std::error::Error for SearchError {}

impl From<PermError> for SearchError {
    fn from(err: PermError) -> Self {
        SearchError::Perm(err)
    }
}

impl From<CSetError> for SearchError {
    fn from(err: CSetError) -> Self {
        SearchError::Instance(err)
    }
}

/// Per-invocation pruning toggles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// McKay's identity-node pruning from discovered automorphisms.
    pub auto_prune: bool,
    /// Orbit pruning among siblings of a splitting cell.
    pub orbit_prune: bool,
    /// Lexicographic indicator-sequence pruning.
    pub order_prune: bool,
    /// Record a [`SearchEvent`] log; never affects results.
    pub history: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self { auto_prune: true, orbit_prune: true, order_prune: false, history: false }
    }
}

/// One settled search-tree node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchNode {
    /// The coloring this node was entered with.
    pub init: CMap,
    /// The equitable refinement of `init`.
    pub saturated: CMap,
    /// 64-bit digest of `saturated`.
    pub indicator: u64,
}

/// The explored search tree.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchTree {
    nodes: HashMap<NodePath, SearchNode>,
    leaves: Vec<NodePath>,
}

impl SearchTree {
    /// Looks up a node by path.
    #[inline]
    pub fn node(&self, path: &[(usize, usize)]) -> Option<&SearchNode> {
        self.nodes.get(path)
    }

    /// Number of explored nodes.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when no node has been explored.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Paths of discrete leaves, in discovery order.
    #[inline]
    pub fn leaves(&self) -> &[NodePath] {
        &self.leaves
    }

    /// Indicator values along the root-to-`path` chain, root first.
    pub fn indicator_sequence(&self, path: &[(usize, usize)]) -> Vec<u64> {
        (0..=path.len())
            .filter_map(|j| self.nodes.get(&path[..j]).map(|n| n.indicator))
            .collect()
    }

    /// The leaf with the lexicographically maximal indicator sequence.
    pub fn canonical_leaf(&self) -> Option<&NodePath> {
        self.leaves
            .iter()
            .max_by(|a, b| self.indicator_sequence(a).cmp(&self.indicator_sequence(b)))
    }
}

/// Result of exploring one structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchOutcome {
    /// The full tree, leaves included.
    pub tree: SearchTree,
    /// Event log; empty unless `history` was set.
    pub events: Vec<SearchEvent>,
}

/// Automorphisms of an instance, with the tree that found them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Autos {
    /// Verified automorphisms on the instance's own tables. Always
    /// contains the identity; generates the full automorphism group.
    pub generators: Vec<CMap>,
    /// The search tree over the lowered structure.
    pub tree: SearchTree,
    /// Event log; empty unless `history` was set.
    pub events: Vec<SearchEvent>,
}

/// Length of the longest common prefix of two paths.
///
/// When one path is a prefix of the other, the shared length is returned.
pub fn common(a: &[(usize, usize)], b: &[(usize, usize)]) -> usize {
    a.iter().zip(b.iter()).take_while(|(x, y)| x == y).count()
}

/// Explores the search tree of a pure structure from the uniform coloring.
pub fn search(g: &CSet, cfg: &SearchConfig) -> Result<SearchOutcome, SearchError> {
    let mut searcher = Searcher {
        g,
        cfg: *cfg,
        tree: SearchTree::default(),
        skip: HashSet::new(),
        best: None,
        events: Vec::new(),
    };
    searcher.step(Vec::new(), uniform_coloring(g), &[])?;
    Ok(SearchOutcome { tree: searcher.tree, events: searcher.events })
}

/// Computes the automorphisms of `g`.
///
/// The search runs on the lowering of `g`; automorphisms are derived from
/// leaf relabelings against the canonical (maximal-indicator) leaf and
/// verified by application. For attributed inputs only relabelings fixing
/// every synthetic value table pointwise survive, restricted back to the
/// original tables, so every returned map satisfies `g.apply(p) == g`.
pub fn autos(g: &CSet, cfg: &SearchConfig) -> Result<Autos, SearchError> {
    let lowering = Pseudo::new(g)?;
    let lowered = lowering.cset();
    let outcome = search(lowered, cfg)?;
    let tree = outcome.tree;

    let leaf0 = tree
        .canonical_leaf()
        .expect("a search always records at least one leaf")
        .clone();
    let sat0 = &tree.node(&leaf0).expect("leaf paths are in the tree").saturated;
    let inv0 = sat0.invert()?;
    let base = lowered.apply(sat0)?;

    let orig_tables = g.schema().table_count();
    let mut seen: HashSet<CMap> = HashSet::new();
    let mut generators = Vec::new();
    for leaf in tree.leaves() {
        let sat = &tree.node(leaf).expect("leaf paths are in the tree").saturated;
        if lowered.apply(sat)? != base {
            continue;
        }
        let gamma = sat.compose(&inv0);
        // Value-table components must be pointwise fixed for the map to
        // descend to an automorphism of the attributed instance.
        let fixes_values = gamma.components()[orig_tables..]
            .iter()
            .all(|comp| comp.iter().enumerate().all(|(i, &v)| i == v));
        if !fixes_values {
            continue;
        }
        let restricted = CMap::new(gamma.components()[..orig_tables].to_vec());
        if g.apply(&restricted)? == *g && seen.insert(restricted.clone()) {
            generators.push(restricted);
        }
    }
    Ok(Autos { generators, tree, events: outcome.events })
}

struct Searcher<'a> {
    g: &'a CSet,
    cfg: SearchConfig,
    tree: SearchTree,
    skip: HashSet<NodePath>,
    best: Option<Vec<u64>>,
    events: Vec<SearchEvent>,
}

impl<'a> Searcher<'a> {
    fn record(&mut self, event: SearchEvent) {
        if self.cfg.history {
            self.events.push(event);
        }
    }

    /// Processes one node: refine, prune, and either settle a leaf or
    /// branch over the splitting cell.
    fn step(
        &mut self,
        path: NodePath,
        init: CMap,
        parent_inds: &[u64],
    ) -> Result<(), SearchError> {
        self.record(SearchEvent::StartIter { path: path.clone() });
        let saturated = color_refine(self.g, &init);
        let indicator = hash64_with_domain(DOMAIN_INDICATOR, &saturated.to_canonical_bytes());
        self.tree.nodes.insert(
            path.clone(),
            SearchNode { init, saturated: saturated.clone(), indicator },
        );
        let mut inds = parent_inds.to_vec();
        inds.push(indicator);

        if self.cfg.order_prune {
            if let Some(best) = &self.best {
                let shared = inds.len().min(best.len());
                if inds[..shared] < best[..shared] {
                    self.record(SearchEvent::OrderPrune { path });
                    return Ok(());
                }
            }
        }

        match splitting_cell(&saturated) {
            None => {
                self.tree.leaves.push(path.clone());
                if self.best.as_ref().map_or(true, |best| inds > *best) {
                    self.best = Some(inds);
                }
                self.record(SearchEvent::AddLeaf { path: path.clone() });
                if self.cfg.auto_prune {
                    self.auto_prune(&path)?;
                }
                Ok(())
            }
            Some((table, members)) => {
                let n = self.g.sizes()[table];
                let mut visited: Vec<usize> = Vec::new();
                for &x in &members {
                    if self.skip.contains(&path) {
                        self.record(SearchEvent::FlagSkip { path: path.clone() });
                        continue;
                    }
                    if self.cfg.orbit_prune && !visited.is_empty() {
                        let gens =
                            orbit::sibling_generators(self.g, &self.tree, &path, table)?;
                        let reach = orbit::orbit(&gens, n, x);
                        if visited.iter().any(|v| reach.contains(v)) {
                            self.record(SearchEvent::OrbitPrune {
                                path: path.clone(),
                                table,
                                elem: x,
                            });
                            continue;
                        }
                    }
                    let mut child_init = saturated.clone();
                    child_init.individualize(table, x);
                    let mut child_path = path.clone();
                    child_path.push((table, x));
                    self.record(SearchEvent::NewChild {
                        path: path.clone(),
                        table,
                        elem: x,
                    });
                    self.step(child_path, child_init, &inds)?;
                    visited.push(x);
                }
                self.record(SearchEvent::Return { path });
                Ok(())
            }
        }
    }

    /// McKay's identity-node pruning at a fresh leaf.
    ///
    /// Scans earlier leaves for an automorphism `γ` that fixes the
    /// individualization up to the deepest common ancestor and maps the
    /// explored branch onto this one; on success, every path from the
    /// divergence point down to this leaf is flagged, so pending siblings
    /// along it are skipped.
    fn auto_prune(&mut self, leaf: &NodePath) -> Result<(), SearchError> {
        let sigma = self.tree.node(leaf).expect("leaf paths are in the tree").saturated.clone();
        let earlier: Vec<NodePath> =
            self.tree.leaves().iter().filter(|p| *p != leaf).cloned().collect();
        for p in earlier {
            let tau = &self.tree.node(&p).expect("leaf paths are in the tree").saturated;
            // Maps this leaf's branch onto the explored one: the coloring
            // conditions below hold exactly when gamma fixes every class of
            // the common ancestor and carries branch c onto branch b.
            let gamma = sigma.compose(&tau.invert()?);
            let shared = common(&p, leaf);
            if shared >= p.len() || shared >= leaf.len() {
                continue;
            }
            let sat_a = &self.tree.node(&p[..shared]).expect("ancestors are in the tree").saturated;
            let sat_b =
                &self.tree.node(&p[..shared + 1]).expect("ancestors are in the tree").saturated;
            let sat_c = &self
                .tree
                .node(&leaf[..shared + 1])
                .expect("ancestors are in the tree")
                .saturated;
            if gamma.compose(sat_a) == *sat_a
                && gamma.compose(sat_b) == *sat_c
                && self.g.apply(&gamma)? == *self.g
            {
                for j in (shared + 1)..=leaf.len() {
                    self.skip.insert(leaf[..j].to_vec());
                }
                self.record(SearchEvent::AutoPrune { path: leaf.clone() });
                break;
            }
        }
        Ok(())
    }
}

/// Picks the splitting cell of a coloring.
///
/// Among color classes of size at least two, the minimum by (size, table
/// position in declaration order, color value); members are returned in
/// increasing element order. `None` means the coloring is discrete.
fn splitting_cell(c: &CMap) -> Option<(usize, Vec<usize>)> {
    let mut pick: Option<(usize, usize, usize)> = None; // (size, table, color)
    for t in 0..c.len() {
        let comp = c.component(t);
        let k = c.color_count(t);
        let mut sizes = vec![0usize; k];
        for &color in comp {
            sizes[color] += 1;
        }
        for (color, &size) in sizes.iter().enumerate() {
            if size >= 2 && pick.map_or(true, |best| (size, t, color) < best) {
                pick = Some((size, t, color));
            }
        }
    }
    pick.map(|(_, t, color)| {
        let members = c
            .component(t)
            .iter()
            .enumerate()
            .filter(|(_, &col)| col == color)
            .map(|(i, _)| i)
            .collect();
        (t, members)
    })
}
