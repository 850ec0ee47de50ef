//! Graph Edges
//!
//! Edges come in two families. Structural and pseudo edges exist solely to
//! keep the layout topologically connected (owner↔combo, center↔child);
//! they carry no relationship semantics. `Connection` edges are the real,
//! data-driven relationships (observed network traffic) and are the only
//! kind subject to bulk reset.

use serde::{Deserialize, Serialize};

/// What role an edge plays in the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    /// Owner↔combo edge keeping the combo attached to its owner.
    Structural,
    /// Parent↔child edge for nodes expanded without a combo (cloud, region).
    PseudoParent,
    /// Center↔child inner edge within a combo.
    PseudoComboLink,
    /// Owner↔center anchor edge; invisible and zero-width, but the spring
    /// that makes the combo track its owner.
    PseudoComboCenter,
    /// Real observed relationship (e.g. a live network connection).
    Connection,
}

impl EdgeKind {
    /// Everything except `Connection` is layout plumbing, excluded from
    /// "real" relationship semantics.
    pub fn is_pseudo(self) -> bool {
        !matches!(self, EdgeKind::Connection)
    }

    /// Anchor edges are drawn with zero width; everything else is visible.
    pub fn is_visible(self) -> bool {
        !matches!(self, EdgeKind::PseudoComboCenter)
    }
}

/// An edge between two nodes (or combos) in the model.
#[derive(Debug, Clone)]
pub struct Edge {
    /// Unique edge id.
    pub id: String,
    /// Source node id; must resolve to a live node.
    pub source: String,
    /// Target node id; must resolve to a live node.
    pub target: String,
    /// Role of this edge.
    pub kind: EdgeKind,
}

impl Edge {
    /// Create an edge.
    pub fn new(
        id: impl Into<String>,
        source: impl Into<String>,
        target: impl Into<String>,
        kind: EdgeKind,
    ) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            kind,
        }
    }

    /// Whether the edge touches the given node id on either side.
    pub fn touches(&self, node_id: &str) -> bool {
        self.source == node_id || self.target == node_id
    }
}
