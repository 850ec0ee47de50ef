//! Graph Update Manager
//!
//! Serializes application of data deltas (root-level, node-scoped, and
//! edge-set) against the model, and keeps them from mutating a scope that
//! is mid-layout: records queue FIFO and the queue only drains while the
//! update side holds the turn.
//!
//! Every applied record that changed structure asks the layout manager to
//! queue a job for the affected scope: root, or the specific node if it
//! gained or lost at least one child inside its combo.
//!
//! One bad record never aborts a batch: protocol violations are logged at
//! error level and skipped, stale references at warn level and dropped.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::error::GraphError;
use crate::expand::ExpandCollapseController;
use crate::layout::{LayoutManager, LayoutOptions, LayoutScope};
use crate::model::{
    combo_center_id, combo_id_for, Edge, EdgeKind, ExpandState, GraphModel, Node, NodeType,
    Position,
};
use crate::turn::TurnCoordinator;

/// Radius for placing new root nodes around the origin.
const ROOT_PLACEMENT_RADIUS: f64 = 150.0;
/// Radius for placing new children around their parent (or combo center).
const CHILD_PLACEMENT_RADIUS: f64 = 60.0;

/// A node as described by the data layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeSpec {
    /// Backend-assigned id.
    pub id: String,
    /// Entity type.
    pub node_type: NodeType,
    /// Styling group hint; only affects layout weighting.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style_group: Option<String>,
}

/// An edge as described by the data layer. Always a `Connection`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeSpec {
    /// Unique edge id.
    pub id: String,
    /// Source node id.
    pub source: String,
    /// Target node id.
    pub target: String,
}

/// Reference to an edge scheduled for removal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeRef {
    /// Id of the edge to remove.
    pub id: String,
}

/// Delta against the root-level node set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RootDelta {
    /// Nodes to add at the root.
    #[serde(default)]
    pub add: Vec<NodeSpec>,
    /// Ids of root nodes to remove.
    #[serde(default)]
    pub remove: Vec<String>,
}

/// Delta against one expanded node's children.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeDelta {
    /// Children to add under the node.
    #[serde(default)]
    pub add: Vec<NodeSpec>,
    /// Ids of children to remove.
    #[serde(default)]
    pub remove: Vec<String>,
}

/// Delta against the connection-edge set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EdgeDelta {
    /// Drop all existing `Connection` edges before applying `add`.
    #[serde(default)]
    pub reset: bool,
    /// Edges to add.
    #[serde(default)]
    pub add: Vec<EdgeSpec>,
    /// Edges to remove.
    #[serde(default)]
    pub remove: Vec<EdgeRef>,
}

/// A queued update command.
#[derive(Debug, Clone)]
pub enum UpdateRecord {
    /// Apply a root-level delta.
    RootNodes(RootDelta),
    /// Apply a delta to the named node's children.
    Node(String, NodeDelta),
    /// Apply an edge-set delta.
    Edges(EdgeDelta),
}

/// Queues data deltas and applies them in strict arrival order whenever
/// the update side holds the turn.
#[derive(Debug, Default)]
pub struct GraphUpdateManager {
    queue: VecDeque<UpdateRecord>,
    placement_seq: u64,
}

impl GraphUpdateManager {
    /// Create an empty manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record to the queue.
    pub fn enqueue(&mut self, record: UpdateRecord) {
        self.queue.push_back(record);
    }

    /// Number of records waiting.
    pub fn queued_len(&self) -> usize {
        self.queue.len()
    }

    /// Whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Drain the queue in FIFO order, applying each record to the model
    /// and queueing layout jobs for affected scopes. Returns immediately
    /// if a layout currently holds the turn; the records stay queued.
    pub fn drain(
        &mut self,
        turn: &TurnCoordinator,
        model: &mut GraphModel,
        expand: &mut ExpandCollapseController,
        layout: &mut LayoutManager,
    ) {
        if !turn.is_update() {
            debug!(queued = self.queue.len(), "updates deferred: layout holds the turn");
            return;
        }
        while let Some(record) = self.queue.pop_front() {
            match record {
                UpdateRecord::RootNodes(delta) => {
                    if self.apply_root(model, &delta) {
                        layout.layout(LayoutScope::Root, LayoutOptions::default());
                    }
                }
                UpdateRecord::Node(node_id, delta) => {
                    if let Some((scope, options)) =
                        self.apply_node(model, expand, &node_id, &delta)
                    {
                        layout.layout(scope, options);
                    }
                }
                UpdateRecord::Edges(delta) => {
                    if self.apply_edges(model, &delta) {
                        layout.layout(LayoutScope::Root, LayoutOptions::default());
                    }
                }
            }
        }
    }

    fn apply_root(&mut self, model: &mut GraphModel, delta: &RootDelta) -> bool {
        let mut changed = false;
        for spec in &delta.add {
            let mut node = Node::new(spec.id.clone(), spec.node_type).at(
                Position::scattered_around(0.0, 0.0, ROOT_PLACEMENT_RADIUS, &mut self.placement_seq),
            );
            node.style_group = spec.style_group.clone();
            match model.add_node(node) {
                Ok(()) => changed = true,
                Err(err) => error!(%err, "skipping bad root add"),
            }
        }
        for id in &delta.remove {
            match model.remove_node(id) {
                Ok(()) => changed = true,
                Err(err) => warn!(%err, "skipping stale root remove"),
            }
        }
        changed
    }

    /// Apply a node-scoped delta. Returns the layout scope to queue when
    /// the node's children changed, or None when nothing needs laying out
    /// (including the expected race where the node was collapsed before a
    /// previously requested expansion's first delta arrived).
    ///
    /// Note: a delta for an `Expanding` node completes the expansion
    /// regardless of which request originated it. Ids colliding across a
    /// collapse/re-expand within the same tick are not disambiguated.
    fn apply_node(
        &mut self,
        model: &mut GraphModel,
        expand: &mut ExpandCollapseController,
        node_id: &str,
        delta: &NodeDelta,
    ) -> Option<(LayoutScope, LayoutOptions)> {
        let Some(node) = model.find_by_id(node_id) else {
            warn!(
                error = %GraphError::UnknownNode(node_id.to_string()),
                "dropping node delta"
            );
            return None;
        };
        let expanding = match node.expand_state {
            ExpandState::None => {
                warn!(
                    error = %GraphError::NotExpanded(node_id.to_string()),
                    "dropping node delta for collapsed node"
                );
                return None;
            }
            ExpandState::Expanding => {
                expand.on_delta_applied(model, node_id);
                true
            }
            ExpandState::Expanded => false,
        };

        let owner = model.find_by_id(node_id).expect("owner survived expansion");
        let as_combo = owner.node_type.expands_as_combo();
        let combo_id = combo_id_for(node_id);
        let center_id = combo_center_id(&combo_id);
        // Children scatter around the combo center when there is one, so
        // they start inside the combo's footprint.
        let (ax, ay) = if as_combo {
            model
                .find_by_id(&center_id)
                .map(|c| (c.position.x, c.position.y))
                .unwrap_or((owner.position.x, owner.position.y))
        } else {
            (owner.position.x, owner.position.y)
        };

        let mut changed = false;
        for spec in &delta.add {
            if model.contains(&spec.id) {
                error!(
                    error = %GraphError::DuplicateNode(spec.id.clone()),
                    "skipping duplicate child add"
                );
                continue;
            }
            let mut child = Node::new(spec.id.clone(), spec.node_type)
                .with_parent(node_id)
                .at(Position::scattered_around(
                    ax,
                    ay,
                    CHILD_PLACEMENT_RADIUS,
                    &mut self.placement_seq,
                ));
            child.style_group = spec.style_group.clone();
            if as_combo {
                child.combo_id = Some(combo_id.clone());
            }
            if let Err(err) = model.add_node(child) {
                error!(%err, "skipping bad child add");
                continue;
            }
            changed = true;

            let edge = if as_combo {
                Edge::new(
                    format!("{center_id}--{}", spec.id),
                    center_id.clone(),
                    spec.id.clone(),
                    EdgeKind::PseudoComboLink,
                )
            } else {
                Edge::new(
                    format!("{node_id}--{}", spec.id),
                    node_id,
                    spec.id.clone(),
                    EdgeKind::PseudoParent,
                )
            };
            if let Err(err) = model.add_edge(edge) {
                error!(%err, "failed to wire child edge");
            }
        }
        for id in &delta.remove {
            match model.remove_node(id) {
                Ok(()) => changed = true,
                Err(err) => warn!(%err, "skipping stale child remove"),
            }
        }

        if !changed {
            return None;
        }
        // Children of non-combo expanders live at the root level.
        let scope = if as_combo {
            LayoutScope::Node(node_id.to_string())
        } else {
            LayoutScope::Root
        };
        Some((scope, LayoutOptions { expanding }))
    }

    fn apply_edges(&mut self, model: &mut GraphModel, delta: &EdgeDelta) -> bool {
        let mut changed = false;
        if delta.reset {
            for id in model.connection_edge_ids() {
                model.remove_edge(&id);
                changed = true;
            }
        }
        for spec in &delta.add {
            let edge = Edge::new(
                spec.id.clone(),
                spec.source.clone(),
                spec.target.clone(),
                EdgeKind::Connection,
            );
            match model.add_edge(edge) {
                Ok(()) => changed = true,
                // An edge referencing a since-removed node is stale data,
                // not an error.
                Err(err @ GraphError::MissingEndpoint { .. }) => {
                    warn!(%err, "dropping stale connection edge");
                }
                Err(err) => error!(%err, "skipping bad connection edge"),
            }
        }
        for edge_ref in &delta.remove {
            if model.remove_edge(&edge_ref.id).is_some() {
                changed = true;
            }
        }
        changed
    }
}
