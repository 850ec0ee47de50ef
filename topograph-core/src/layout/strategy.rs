//! Force Layout Strategy
//!
//! Pure parameter functions for the force solver, derived entirely from
//! `(NodeType, EdgeKind)`. There is no state here: the layout manager
//! calls these fresh for every job.

use crate::model::{EdgeKind, NodeType};

/// Rest length for ordinary edges.
pub const DEFAULT_LINK_DISTANCE: f64 = 60.0;

/// Rest length for the owner↔center anchor edge. Long enough that the
/// combo sits near its owner without crowding it.
pub const ANCHOR_LINK_DISTANCE: f64 = 120.0;

/// Rest length for center↔child inner edges. Negative by convention:
/// the sign marks rim edges. Children are held off the center and settle
/// on a ring of radius `|distance|`, giving combos an empty interior.
pub const COMBO_RIM_DISTANCE: f64 = -60.0;

/// Spring constant for ordinary edges; low and uniform.
pub const DEFAULT_EDGE_STRENGTH: f64 = 0.2;

/// Spring constant for anchor edges; high so the combo tracks its owner.
pub const ANCHOR_EDGE_STRENGTH: f64 = 0.9;

/// Base repulsion (negative = repel, d3 charge convention).
const BASE_NODE_STRENGTH: f64 = -900.0;

/// Hosts typically own the densest combos; they repel much harder so
/// neighbouring combos do not overlap.
const HOST_STRENGTH_MULTIPLIER: f64 = 10.0;

/// Scope size beyond which repulsion is damped to keep the canvas bounded.
const STRENGTH_DAMPING_THRESHOLD: usize = 30;

/// Rest length for an edge of the given kind.
pub fn link_distance(kind: EdgeKind) -> f64 {
    match kind {
        EdgeKind::PseudoComboLink => COMBO_RIM_DISTANCE,
        EdgeKind::PseudoComboCenter => ANCHOR_LINK_DISTANCE,
        _ => DEFAULT_LINK_DISTANCE,
    }
}

/// Spring constant for an edge of the given kind.
pub fn edge_strength(kind: EdgeKind) -> f64 {
    match kind {
        EdgeKind::PseudoComboCenter => ANCHOR_EDGE_STRENGTH,
        _ => DEFAULT_EDGE_STRENGTH,
    }
}

/// Repulsion for a node, given how many nodes share its layout scope.
pub fn node_strength(node_type: NodeType, scope_size: usize) -> f64 {
    let multiplier = match node_type {
        NodeType::Host => HOST_STRENGTH_MULTIPLIER,
        _ => 1.0,
    };
    let damping = (scope_size as f64 / STRENGTH_DAMPING_THRESHOLD as f64).max(1.0);
    BASE_NODE_STRENGTH * multiplier / damping
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rim_edges_get_a_negative_distance() {
        assert!(link_distance(EdgeKind::PseudoComboLink) < 0.0);
        assert_eq!(link_distance(EdgeKind::PseudoComboCenter), ANCHOR_LINK_DISTANCE);
        assert_eq!(link_distance(EdgeKind::Connection), DEFAULT_LINK_DISTANCE);
        assert_eq!(link_distance(EdgeKind::Structural), DEFAULT_LINK_DISTANCE);
    }

    #[test]
    fn only_anchor_edges_are_stiff() {
        assert_eq!(edge_strength(EdgeKind::PseudoComboCenter), ANCHOR_EDGE_STRENGTH);
        for kind in [
            EdgeKind::Structural,
            EdgeKind::PseudoParent,
            EdgeKind::PseudoComboLink,
            EdgeKind::Connection,
        ] {
            assert_eq!(edge_strength(kind), DEFAULT_EDGE_STRENGTH);
        }
    }

    #[test]
    fn hosts_repel_ten_times_harder() {
        let host = node_strength(NodeType::Host, 10);
        let pod = node_strength(NodeType::Pod, 10);
        assert_eq!(host, pod * 10.0);
        assert!(host < 0.0);
    }

    #[test]
    fn large_scopes_damp_repulsion() {
        let small = node_strength(NodeType::Pod, 10);
        let large = node_strength(NodeType::Pod, 300);
        assert!(large.abs() < small.abs());
    }
}
