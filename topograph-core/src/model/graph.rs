//! Graph Model
//!
//! The authoritative store of nodes, edges, and combos. All mutation goes
//! through the methods here, which keep three invariants at all times:
//!
//! 1. Every edge's source and target resolve to a live node. Removing a
//!    node removes all edges touching it *before* the node itself, so a
//!    dangling edge is never observable.
//! 2. A node's `children` set exactly mirrors the set of materialized
//!    child node/combo ids.
//! 3. Removing a node also removes any still-present combo (and center)
//!    owned by it, recursively.
//!
//! Duplicate adds and edges to missing endpoints are protocol violations
//! by an upstream producer: the operation returns an error for the caller
//! to log, and the model is left untouched.

use indexmap::IndexMap;
use smallvec::SmallVec;
use tracing::trace;

use crate::error::GraphError;

use super::edge::{Edge, EdgeKind};
use super::node::{combo_center_id, combo_id_for, Node, NodeType};

/// A structural change applied to the model.
///
/// The engine drains these after each command batch and forwards them to
/// the rendering collaborator, which keeps the model free of any rendering
/// coupling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelEvent {
    /// A node (or combo/center) was added.
    NodeAdded(String),
    /// A node was removed.
    NodeRemoved(String),
    /// An edge was added.
    EdgeAdded(String),
    /// An edge was removed.
    EdgeRemoved(String),
}

/// The shared mutable graph. Owned by the engine façade and passed to
/// controllers by reference; there are no ambient singletons.
#[derive(Debug, Default)]
pub struct GraphModel {
    nodes: IndexMap<String, Node>,
    edges: IndexMap<String, Edge>,
    events: Vec<ModelEvent>,
}

impl GraphModel {
    /// Create an empty model.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node. Mirrors the id into the parent's and combo's `children`.
    ///
    /// Fails without touching the model if the id already exists: duplicate
    /// adds happen when deltas race with user actions and must not clobber
    /// the live node.
    pub fn add_node(&mut self, node: Node) -> Result<(), GraphError> {
        if self.nodes.contains_key(&node.id) {
            return Err(GraphError::DuplicateNode(node.id.clone()));
        }
        if let Some(parent_id) = node.parent_id.clone() {
            if let Some(parent) = self.nodes.get_mut(&parent_id) {
                parent.children.insert(node.id.clone());
            }
        }
        // Centers live inside the combo physically but are anchors, not
        // grouped children.
        if node.node_type != NodeType::ComboCenter {
            if let Some(combo_id) = node.combo_id.clone() {
                if let Some(combo) = self.nodes.get_mut(&combo_id) {
                    combo.children.insert(node.id.clone());
                }
            }
        }
        trace!(id = %node.id, node_type = ?node.node_type, "node added");
        self.events.push(ModelEvent::NodeAdded(node.id.clone()));
        self.nodes.insert(node.id.clone(), node);
        Ok(())
    }

    /// Remove a node: all touching edges first, then the node itself, then
    /// any still-present combo/center owned by it, recursively.
    pub fn remove_node(&mut self, id: &str) -> Result<(), GraphError> {
        if !self.nodes.contains_key(id) {
            return Err(GraphError::UnknownNode(id.to_string()));
        }

        let touching: Vec<String> = self
            .edges
            .values()
            .filter(|e| e.touches(id))
            .map(|e| e.id.clone())
            .collect();
        for edge_id in touching {
            self.remove_edge(&edge_id);
        }

        let node = self
            .nodes
            .shift_remove(id)
            .expect("presence checked above");
        if let Some(parent_id) = &node.parent_id {
            if let Some(parent) = self.nodes.get_mut(parent_id) {
                parent.children.shift_remove(id);
            }
        }
        if let Some(combo_id) = &node.combo_id {
            if let Some(combo) = self.nodes.get_mut(combo_id) {
                combo.children.shift_remove(id);
            }
        }
        trace!(id, "node removed");
        self.events.push(ModelEvent::NodeRemoved(id.to_string()));

        // An owned combo left behind (e.g. the owner was removed by a data
        // delta while expanded) is torn down with its whole subtree.
        let combo_id = combo_id_for(id);
        if self.nodes.contains_key(&combo_id) {
            let members: SmallVec<[String; 8]> = self
                .nodes
                .get(&combo_id)
                .map(|combo| combo.children.iter().cloned().collect())
                .unwrap_or_default();
            for member in members {
                let _ = self.remove_node(&member);
            }
            let center_id = combo_center_id(&combo_id);
            if self.nodes.contains_key(&center_id) {
                let _ = self.remove_node(&center_id);
            }
            let _ = self.remove_node(&combo_id);
        }
        Ok(())
    }

    /// Add an edge. Both endpoints must currently exist.
    pub fn add_edge(&mut self, edge: Edge) -> Result<(), GraphError> {
        if self.edges.contains_key(&edge.id) {
            return Err(GraphError::DuplicateEdge(edge.id.clone()));
        }
        for endpoint in [&edge.source, &edge.target] {
            if !self.nodes.contains_key(endpoint) {
                return Err(GraphError::MissingEndpoint {
                    edge: edge.id.clone(),
                    endpoint: endpoint.clone(),
                });
            }
        }
        trace!(id = %edge.id, kind = ?edge.kind, "edge added");
        self.events.push(ModelEvent::EdgeAdded(edge.id.clone()));
        self.edges.insert(edge.id.clone(), edge);
        Ok(())
    }

    /// Remove an edge. No-op if the id is already gone.
    pub fn remove_edge(&mut self, id: &str) -> Option<Edge> {
        let removed = self.edges.shift_remove(id);
        if removed.is_some() {
            trace!(id, "edge removed");
            self.events.push(ModelEvent::EdgeRemoved(id.to_string()));
        }
        removed
    }

    /// Look up a node by id.
    pub fn find_by_id(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Look up a node by id, mutably.
    pub fn find_by_id_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    /// Whether a node with this id exists.
    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// Look up an edge by id.
    pub fn edge(&self, id: &str) -> Option<&Edge> {
        self.edges.get(id)
    }

    /// The materialized children of a node, in insertion order.
    pub fn children_of<'a>(&'a self, id: &str) -> impl Iterator<Item = &'a Node> {
        let ids: SmallVec<[String; 8]> = self
            .nodes
            .get(id)
            .map(|n| n.children.iter().cloned().collect())
            .unwrap_or_default();
        ids.into_iter().filter_map(|cid| self.nodes.get(&cid))
    }

    /// All edges touching the given node.
    pub fn edges_of<'a>(&'a self, node_id: &'a str) -> impl Iterator<Item = &'a Edge> {
        self.edges.values().filter(move |e| e.touches(node_id))
    }

    /// Ids of all `Connection` edges (the only kind subject to bulk reset).
    pub fn connection_edge_ids(&self) -> Vec<String> {
        self.edges
            .values()
            .filter(|e| e.kind == EdgeKind::Connection)
            .map(|e| e.id.clone())
            .collect()
    }

    /// Iterate all nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Iterate all edges in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    /// Number of nodes (combos and centers included).
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Drain the structural-change journal accumulated since the last call.
    pub fn take_events(&mut self) -> Vec<ModelEvent> {
        std::mem::take(&mut self.events)
    }
}
