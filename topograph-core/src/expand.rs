//! Expand/Collapse Controller
//!
//! The per-node visibility state machine: `None -> Expanding -> Expanded
//! -> None`. Expansion is two-phase because the children arrive
//! asynchronously: the node goes to `Expanding` immediately when the user
//! asks (making rapid repeated clicks an implicit debounce) and reaches
//! `Expanded` only when the first data delta for it is applied. Collapse
//! is synchronous and always returns the node straight to `None`.
//!
//! For types that expand as a combo (host, pod, container, kubernetes
//! cluster), reaching `Expanded` materializes the combo, its singleton
//! invisible center anchor, and two pseudo edges: owner↔center (the
//! anchor spring) and owner↔combo (structural). Collapse tears all of it
//! down in reverse, recursively collapsing still-expanded descendants
//! first.

use smallvec::SmallVec;
use tracing::{debug, error, warn};

use crate::model::{
    combo_center_id, combo_id_for, Edge, EdgeKind, ExpandState, GraphModel, Node, NodeType,
    Position,
};

/// New combos and centers are scattered within this radius of the owner so
/// the force solver never sees coincident points.
const COMBO_PLACEMENT_RADIUS: f64 = 40.0;

/// Drives the expand/collapse state machine against a borrowed model.
#[derive(Debug, Default)]
pub struct ExpandCollapseController {
    placement_seq: u64,
}

impl ExpandCollapseController {
    /// Create a controller.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request expansion of a node. Returns true if the node newly entered
    /// `Expanding` (the caller should then request child data); re-entrant
    /// calls on an `Expanding` or `Expanded` node are no-ops.
    pub fn expand(&mut self, model: &mut GraphModel, node_id: &str) -> bool {
        let Some(node) = model.find_by_id_mut(node_id) else {
            warn!(node_id, "expand requested for unknown node");
            return false;
        };
        if !node.node_type.expands() {
            warn!(node_id, node_type = ?node.node_type, "node type does not expand");
            return false;
        }
        match node.expand_state {
            ExpandState::Expanding | ExpandState::Expanded => {
                debug!(node_id, state = ?node.expand_state, "expand is a no-op");
                false
            }
            ExpandState::None => {
                node.expand_state = ExpandState::Expanding;
                debug!(node_id, "node expanding");
                true
            }
        }
    }

    /// Complete a pending expansion: called when the first data delta for
    /// an `Expanding` node is applied. Transitions to `Expanded` and, for
    /// combo types, materializes the combo and its center. No-op for nodes
    /// in any other state.
    pub fn on_delta_applied(&mut self, model: &mut GraphModel, node_id: &str) {
        let Some(node) = model.find_by_id(node_id) else {
            return;
        };
        if node.expand_state != ExpandState::Expanding {
            return;
        }
        let as_combo = node.node_type.expands_as_combo();
        let (x, y) = (node.position.x, node.position.y);

        if let Some(node) = model.find_by_id_mut(node_id) {
            node.expand_state = ExpandState::Expanded;
        }
        debug!(node_id, as_combo, "node expanded");
        if as_combo {
            self.materialize_combo(model, node_id, x, y);
        }
    }

    fn materialize_combo(&mut self, model: &mut GraphModel, owner_id: &str, x: f64, y: f64) {
        let combo_id = combo_id_for(owner_id);
        if model.contains(&combo_id) {
            warn!(owner_id, "combo already materialized");
            return;
        }
        let center_id = combo_center_id(&combo_id);

        let combo = Node::new(combo_id.clone(), NodeType::Combo)
            .with_parent(owner_id)
            .at(Position::scattered_around(
                x,
                y,
                COMBO_PLACEMENT_RADIUS,
                &mut self.placement_seq,
            ));
        let center = Node::new(center_id.clone(), NodeType::ComboCenter)
            .with_parent(combo_id.clone())
            .with_combo(combo_id.clone())
            .at(Position::scattered_around(
                x,
                y,
                COMBO_PLACEMENT_RADIUS,
                &mut self.placement_seq,
            ));

        if let Err(err) = model.add_node(combo) {
            error!(%err, "failed to materialize combo");
            return;
        }
        if let Err(err) = model.add_node(center) {
            error!(%err, "failed to materialize combo center");
            return;
        }
        // Anchor spring: invisible and zero-width, but what keeps the combo
        // tracking its owner in the force layout.
        let anchor = Edge::new(
            format!("{combo_id}-anchor"),
            owner_id,
            center_id,
            EdgeKind::PseudoComboCenter,
        );
        let link = Edge::new(
            format!("{combo_id}-link"),
            owner_id,
            combo_id,
            EdgeKind::Structural,
        );
        for edge in [anchor, link] {
            if let Err(err) = model.add_edge(edge) {
                error!(%err, "failed to wire combo edges");
            }
        }
    }

    /// Collapse a node: recursively collapse and remove every descendant
    /// created during its expansion, tear down its combo and center (if
    /// any), and reset the node to `None` with empty `children`.
    ///
    /// Valid mid-`Expanding` too, in which case it simply cancels the
    /// pending expansion.
    pub fn collapse(&mut self, model: &mut GraphModel, node_id: &str) {
        let Some(node) = model.find_by_id(node_id) else {
            warn!(node_id, "collapse requested for unknown node");
            return;
        };
        if node.expand_state == ExpandState::None && node.children.is_empty() {
            return;
        }

        if node.node_type.expands_as_combo() {
            let combo_id = combo_id_for(node_id);
            if model.contains(&combo_id) {
                let members: SmallVec<[String; 8]> = model
                    .find_by_id(&combo_id)
                    .map(|combo| combo.children.iter().cloned().collect())
                    .unwrap_or_default();
                for member in members {
                    self.collapse(model, &member);
                    let _ = model.remove_node(&member);
                }
                let _ = model.remove_node(&combo_center_id(&combo_id));
                let _ = model.remove_node(&combo_id);
            }
        }

        // Simple-node path: drop every edge emanating from this node, then
        // any remaining materialized children. Inbound edges belong to
        // their source node's lifecycle and are left alone.
        let outgoing: SmallVec<[String; 8]> = model
            .edges_of(node_id)
            .filter(|e| e.source == node_id)
            .map(|e| e.id.clone())
            .collect();
        for edge_id in outgoing {
            model.remove_edge(&edge_id);
        }

        let children: SmallVec<[String; 8]> = model
            .find_by_id(node_id)
            .map(|n| n.children.iter().cloned().collect())
            .unwrap_or_default();
        for child in children {
            self.collapse(model, &child);
            let _ = model.remove_node(&child);
        }

        if let Some(node) = model.find_by_id_mut(node_id) {
            node.children.clear();
            node.expand_state = ExpandState::None;
        }
        debug!(node_id, "node collapsed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host_model() -> (GraphModel, ExpandCollapseController) {
        let mut model = GraphModel::new();
        model.add_node(Node::new("h1", NodeType::Host)).unwrap();
        (model, ExpandCollapseController::new())
    }

    fn expand_host(model: &mut GraphModel, ctl: &mut ExpandCollapseController) {
        ctl.expand(model, "h1");
        ctl.on_delta_applied(model, "h1");
        // A child, the way a node delta would add one.
        model
            .add_node(
                Node::new("p1", NodeType::Pod)
                    .with_parent("h1")
                    .with_combo("h1-combo"),
            )
            .unwrap();
        model
            .add_edge(Edge::new(
                "h1-combo-center--p1",
                "h1-combo-center",
                "p1",
                EdgeKind::PseudoComboLink,
            ))
            .unwrap();
    }

    #[test]
    fn expand_moves_to_expanding_and_is_idempotent() {
        let (mut model, mut ctl) = host_model();

        assert!(ctl.expand(&mut model, "h1"));
        assert_eq!(
            model.find_by_id("h1").unwrap().expand_state,
            ExpandState::Expanding
        );
        // Second request before any delta: no-op, same end state.
        assert!(!ctl.expand(&mut model, "h1"));
        assert_eq!(
            model.find_by_id("h1").unwrap().expand_state,
            ExpandState::Expanding
        );
        assert_eq!(model.node_count(), 1);
    }

    #[test]
    fn inert_leaves_do_not_expand() {
        let mut model = GraphModel::new();
        model.add_node(Node::new("proc", NodeType::Process)).unwrap();
        let mut ctl = ExpandCollapseController::new();

        assert!(!ctl.expand(&mut model, "proc"));
        assert_eq!(
            model.find_by_id("proc").unwrap().expand_state,
            ExpandState::None
        );
    }

    #[test]
    fn first_delta_materializes_the_combo() {
        let (mut model, mut ctl) = host_model();
        ctl.expand(&mut model, "h1");
        ctl.on_delta_applied(&mut model, "h1");

        assert_eq!(
            model.find_by_id("h1").unwrap().expand_state,
            ExpandState::Expanded
        );
        let combo = model.find_by_id("h1-combo").unwrap();
        assert_eq!(combo.node_type, NodeType::Combo);
        let center = model.find_by_id("h1-combo-center").unwrap();
        assert_eq!(center.node_type, NodeType::ComboCenter);
        assert_eq!(center.combo_id.as_deref(), Some("h1-combo"));

        assert_eq!(
            model.edge("h1-combo-anchor").unwrap().kind,
            EdgeKind::PseudoComboCenter
        );
        assert_eq!(
            model.edge("h1-combo-link").unwrap().kind,
            EdgeKind::Structural
        );
        // Owner sits apart from the combo and center.
        let h1 = model.find_by_id("h1").unwrap().position;
        assert!((combo.position.x, combo.position.y) != (h1.x, h1.y));
    }

    #[test]
    fn non_combo_types_expand_without_a_combo() {
        let mut model = GraphModel::new();
        model.add_node(Node::new("c1", NodeType::Cloud)).unwrap();
        let mut ctl = ExpandCollapseController::new();

        ctl.expand(&mut model, "c1");
        ctl.on_delta_applied(&mut model, "c1");

        assert_eq!(
            model.find_by_id("c1").unwrap().expand_state,
            ExpandState::Expanded
        );
        assert!(!model.contains("c1-combo"));
    }

    #[test]
    fn collapse_mid_expanding_restores_the_initial_state() {
        let (mut model, mut ctl) = host_model();
        ctl.expand(&mut model, "h1");

        ctl.collapse(&mut model, "h1");

        let h1 = model.find_by_id("h1").unwrap();
        assert_eq!(h1.expand_state, ExpandState::None);
        assert!(h1.children.is_empty());
        assert_eq!(model.node_count(), 1);
        assert_eq!(model.edge_count(), 0);
    }

    #[test]
    fn collapse_tears_down_combo_children_and_edges() {
        let (mut model, mut ctl) = host_model();
        expand_host(&mut model, &mut ctl);

        ctl.collapse(&mut model, "h1");

        let h1 = model.find_by_id("h1").unwrap();
        assert_eq!(h1.expand_state, ExpandState::None);
        assert!(h1.children.is_empty());
        assert!(!model.contains("h1-combo"));
        assert!(!model.contains("h1-combo-center"));
        assert!(!model.contains("p1"));
        assert_eq!(model.edge_count(), 0);
    }

    #[test]
    fn collapse_recurses_through_expanded_descendants() {
        let (mut model, mut ctl) = host_model();
        expand_host(&mut model, &mut ctl);

        // Expand the pod inside the combo as well.
        ctl.expand(&mut model, "p1");
        ctl.on_delta_applied(&mut model, "p1");
        assert!(model.contains("p1-combo"));

        ctl.collapse(&mut model, "h1");
        assert!(!model.contains("p1-combo"));
        assert!(!model.contains("p1-combo-center"));
        assert!(!model.contains("p1"));
        assert_eq!(model.node_count(), 1);
        assert_eq!(model.edge_count(), 0);
    }

    #[test]
    fn collapse_removes_outbound_edges_but_keeps_inbound() {
        let (mut model, mut ctl) = host_model();
        model.add_node(Node::new("h2", NodeType::Host)).unwrap();
        model
            .add_edge(Edge::new("egress", "h1", "h2", EdgeKind::Connection))
            .unwrap();
        model
            .add_edge(Edge::new("ingress", "h2", "h1", EdgeKind::Connection))
            .unwrap();
        expand_host(&mut model, &mut ctl);

        ctl.collapse(&mut model, "h1");
        // Every edge emanating from h1 goes with the collapse; the edge
        // owned by h2 stays.
        assert!(model.edge("egress").is_none());
        assert!(model.edge("ingress").is_some());
    }
}
