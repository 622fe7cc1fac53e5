//! Search-event log.
//!
//! When the `history` toggle is set, the search records one tagged event
//! per decision point. Consumers treat the log as opaque debugging output;
//! recording never changes what the search computes.

use crate::search::NodePath;
use serde::{Deserialize, Serialize};

/// One recorded search decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchEvent {
    /// A node step began.
    StartIter { path: NodePath },
    /// A discrete leaf was recorded.
    AddLeaf { path: NodePath },
    /// A discovered automorphism flagged the remainder of a branch.
    AutoPrune { path: NodePath },
    /// An element was skipped because a visited sibling shares its orbit.
    OrbitPrune { path: NodePath, table: usize, elem: usize },
    /// A dominated indicator sequence abandoned the subtree.
    OrderPrune { path: NodePath },
    /// A flagged node skipped one child iteration.
    FlagSkip { path: NodePath },
    /// A child node was created by individualization.
    NewChild { path: NodePath, table: usize, elem: usize },
    /// A branching node finished iterating its splitting cell.
    Return { path: NodePath },
}
