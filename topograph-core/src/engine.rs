//! Visualization Façade
//!
//! [`TopologyEngine`] is the imperative command surface the hosting UI
//! and the data layer talk to. It owns the model and wires the
//! controllers together:
//!
//! - data commands (`update_root_nodes`, `update_node`, `update_edges`)
//!   queue through the update manager;
//! - user commands (`expand_node`, `collapse_node`) drive the
//!   expand/collapse state machine directly;
//! - `tick` advances the running layout, called by the host's animation
//!   driver; the engine never owns a timer or a thread.
//!
//! After every command the engine pumps: drains queued deltas if the
//! update side holds the turn, mirrors structural changes to the
//! renderer, and starts the next queued layout if one can run.

use tracing::warn;

use crate::expand::ExpandCollapseController;
use crate::layout::{LayoutManager, LayoutOptions, LayoutScope};
use crate::model::{combo_center_id, GraphModel, ModelEvent, Node, NodeType};
use crate::render::{ItemKind, RenderModel, Renderer, UiEvent};
use crate::turn::TurnCoordinator;
use crate::update::{EdgeDelta, GraphUpdateManager, NodeDelta, RootDelta, UpdateRecord};

/// The incremental topology graph engine.
///
/// Lives for the lifetime of one rendered topology view; drop it when the
/// view unmounts.
pub struct TopologyEngine<R: Renderer> {
    model: GraphModel,
    expand: ExpandCollapseController,
    updates: GraphUpdateManager,
    layout: LayoutManager,
    turn: TurnCoordinator,
    renderer: R,
    track_target: Option<String>,
    hover_target: Option<String>,
}

impl<R: Renderer> TopologyEngine<R> {
    /// Create an engine over an empty graph.
    pub fn new(renderer: R) -> Self {
        Self {
            model: GraphModel::new(),
            expand: ExpandCollapseController::new(),
            updates: GraphUpdateManager::new(),
            layout: LayoutManager::new(),
            turn: TurnCoordinator::new(),
            renderer,
            track_target: None,
            hover_target: None,
        }
    }

    // --- data-layer commands ------------------------------------------

    /// Apply a delta to the root-level node set.
    pub fn update_root_nodes(&mut self, delta: RootDelta) {
        self.updates.enqueue(UpdateRecord::RootNodes(delta));
        self.pump();
    }

    /// Apply a delta to one expanded node's children.
    pub fn update_node(&mut self, node_id: impl Into<String>, delta: NodeDelta) {
        self.updates.enqueue(UpdateRecord::Node(node_id.into(), delta));
        self.pump();
    }

    /// Apply a delta to the connection-edge set.
    pub fn update_edges(&mut self, delta: EdgeDelta) {
        self.updates.enqueue(UpdateRecord::Edges(delta));
        self.pump();
    }

    // --- hosting-UI commands ------------------------------------------

    /// Request expansion of a node. The node enters `Expanding`; the
    /// caller is expected to fetch child data and feed it back through
    /// [`update_node`](Self::update_node).
    pub fn expand_node(&mut self, node_id: &str) -> bool {
        self.expand.expand(&mut self.model, node_id)
    }

    /// Collapse a node, tearing down everything its expansion created,
    /// and relayout the root.
    pub fn collapse_node(&mut self, node_id: &str) {
        self.expand.collapse(&mut self.model, node_id);
        self.sync_renderer();
        self.layout
            .layout(LayoutScope::Root, LayoutOptions::default());
        self.try_start_layout();
    }

    /// Look up a node.
    pub fn find_by_id(&self, id: &str) -> Option<&Node> {
        self.model.find_by_id(id)
    }

    /// Read-only access to the whole model.
    pub fn model(&self) -> &GraphModel {
        &self.model
    }

    /// The ordered chain of real (non-synthetic) ancestor ids, nearest
    /// first. Combo and center ancestors are skipped; used by the hosting
    /// UI for breadcrumb labels.
    pub fn get_parents(&self, node_id: &str) -> Vec<String> {
        let mut chain = Vec::new();
        let mut current = self.model.find_by_id(node_id);
        let mut hops = 0;
        while let Some(node) = current {
            let Some(parent_id) = &node.parent_id else {
                break;
            };
            hops += 1;
            if hops > self.model.node_count() {
                break;
            }
            let parent = self.model.find_by_id(parent_id);
            match parent {
                Some(p) => {
                    if !p.node_type.is_synthetic() {
                        chain.push(p.id.clone());
                    }
                }
                None => break,
            }
            current = parent;
        }
        chain
    }

    /// Handle a translated pointer event from the rendering collaborator.
    pub fn handle_ui_event(&mut self, event: UiEvent) {
        match event {
            UiEvent::NodeClicked(id) => {
                if self.model.contains(&id) {
                    self.track_target = Some(id);
                } else {
                    warn!(id, "click on unknown node ignored");
                }
            }
            UiEvent::NodeHoverChanged { id, entered } => {
                if entered {
                    if self.model.contains(&id) {
                        self.hover_target = Some(id);
                    }
                } else if self.hover_target.as_deref() == Some(id.as_str()) {
                    self.hover_target = None;
                }
            }
            UiEvent::ComboDragEnded(combo_id) => self.fix_combo_center(&combo_id),
        }
    }

    /// The current camera-follow target, if any.
    pub fn track_target(&self) -> Option<&str> {
        self.track_target.as_deref()
    }

    /// The currently hovered node, if any.
    pub fn hover_target(&self) -> Option<&str> {
        self.hover_target.as_deref()
    }

    /// Forward a canvas resize to the renderer.
    pub fn change_size(&mut self, width: f64, height: f64) {
        self.renderer.change_size(width, height);
    }

    /// Install a hook fired after every completed layout job.
    pub fn set_on_layout_done(&mut self, hook: impl FnMut(&LayoutScope) + 'static) {
        self.layout.set_on_done(hook);
    }

    /// Suspend layout dequeuing (the running job, if any, still finishes).
    pub fn pause_layouts(&mut self) {
        self.layout.pause();
    }

    /// Resume layout dequeuing.
    pub fn resume_layouts(&mut self) {
        self.layout.resume();
        self.try_start_layout();
    }

    // --- drive loop ----------------------------------------------------

    /// Advance the engine one step. Call from the host's animation timer.
    ///
    /// While a layout runs, this ticks its simulation; on completion the
    /// turn returns to the update side, deferred deltas drain, positions
    /// flow to the renderer, and the next queued layout starts.
    pub fn tick(&mut self) {
        if self.layout.tick(&mut self.model).is_some() {
            self.turn.end_layout();
            self.push_positions();
            self.pump();
        } else if !self.layout.is_running() {
            self.pump();
        }
    }

    /// Whether a layout computation is executing right now.
    pub fn is_layout_running(&self) -> bool {
        self.layout.is_running()
    }

    /// Whether all queues are empty and nothing is running.
    pub fn is_idle(&self) -> bool {
        !self.layout.is_running() && !self.layout.has_pending() && self.updates.is_empty()
    }

    // --- internals -----------------------------------------------------

    fn pump(&mut self) {
        self.updates
            .drain(&self.turn, &mut self.model, &mut self.expand, &mut self.layout);
        self.sync_renderer();
        self.try_start_layout();
    }

    fn try_start_layout(&mut self) {
        self.layout.maybe_start_next(&mut self.turn, &self.model);
    }

    fn push_positions(&mut self) {
        let positions: Vec<(String, f64, f64)> = self
            .model
            .nodes()
            .map(|n| (n.id.clone(), n.position.x, n.position.y))
            .collect();
        self.renderer.refresh_positions(&positions);
    }

    /// After a manual combo drag the center's physics position no longer
    /// matches what the user sees. Pin it to the centroid of the combo
    /// children's current positions.
    fn fix_combo_center(&mut self, combo_id: &str) {
        let Some(combo) = self.model.find_by_id(combo_id) else {
            warn!(combo_id, "drag-end for unknown combo ignored");
            return;
        };
        if combo.node_type != NodeType::Combo {
            warn!(combo_id, "drag-end target is not a combo");
            return;
        }
        let mut count = 0usize;
        let (mut sx, mut sy) = (0.0, 0.0);
        for child in self.model.children_of(combo_id) {
            sx += child.position.x;
            sy += child.position.y;
            count += 1;
        }
        if count == 0 {
            return;
        }
        let (cx, cy) = (sx / count as f64, sy / count as f64);
        let center_id = combo_center_id(combo_id);
        if let Some(center) = self.model.find_by_id_mut(&center_id) {
            center.position.x = cx;
            center.position.y = cy;
            center.position.fx = Some(cx);
            center.position.fy = Some(cy);
            self.renderer.refresh_positions(&[(center_id, cx, cy)]);
        }
    }

    fn sync_renderer(&mut self) {
        for event in self.model.take_events() {
            match event {
                ModelEvent::NodeAdded(id) => {
                    let Some(node) = self.model.find_by_id(&id) else {
                        continue;
                    };
                    let kind = if node.node_type == NodeType::Combo {
                        ItemKind::Combo
                    } else {
                        ItemKind::Node
                    };
                    self.renderer.add_item(
                        kind,
                        RenderModel::Node {
                            id: id.clone(),
                            node_type: node.node_type,
                            x: node.position.x,
                            y: node.position.y,
                            visible: node.node_type != NodeType::ComboCenter,
                        },
                    );
                }
                ModelEvent::EdgeAdded(id) => {
                    let Some(edge) = self.model.edge(&id) else {
                        continue;
                    };
                    self.renderer.add_item(
                        ItemKind::Edge,
                        RenderModel::Edge {
                            id: id.clone(),
                            source: edge.source.clone(),
                            target: edge.target.clone(),
                            kind: edge.kind,
                            visible: edge.kind.is_visible(),
                        },
                    );
                }
                ModelEvent::NodeRemoved(id) | ModelEvent::EdgeRemoved(id) => {
                    self.renderer.remove_item(&id);
                }
            }
        }
    }
}
