//! Rendering Boundary
//!
//! The engine does not draw. It talks to an opaque rendering collaborator
//! through the narrow [`Renderer`] trait (item CRUD plus position
//! refreshes), and receives the collaborator's pointer events translated
//! once, at this boundary, into the internal [`UiEvent`] type. The
//! engine's logic never sees the collaborator's event shapes.

use crate::model::{EdgeKind, NodeType};

/// What category of item is being added to the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    /// A regular node (including invisible combo centers).
    Node,
    /// An edge.
    Edge,
    /// A combo cluster.
    Combo,
}

/// The engine-side description of a drawable item.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderModel {
    /// A node or combo.
    Node {
        /// Model id.
        id: String,
        /// Entity type, which the collaborator maps to a shape/style.
        node_type: NodeType,
        /// Initial x.
        x: f64,
        /// Initial y.
        y: f64,
        /// Combo centers are never drawn.
        visible: bool,
    },
    /// An edge.
    Edge {
        /// Model id.
        id: String,
        /// Source node id.
        source: String,
        /// Target node id.
        target: String,
        /// Role of the edge; pseudo kinds get structural styling.
        kind: EdgeKind,
        /// Anchor edges are zero-width and invisible.
        visible: bool,
    },
}

impl RenderModel {
    /// Id of the underlying model item.
    pub fn id(&self) -> &str {
        match self {
            RenderModel::Node { id, .. } | RenderModel::Edge { id, .. } => id,
        }
    }
}

/// The graph rendering library, as consumed by the engine.
///
/// Implementations only ever *read* the model through what the engine
/// hands them; they never mutate it.
pub trait Renderer {
    /// Add an item to the canvas.
    fn add_item(&mut self, kind: ItemKind, model: RenderModel);
    /// Remove an item from the canvas.
    fn remove_item(&mut self, id: &str);
    /// Push updated positions after a layout completes or a pin changes.
    fn refresh_positions(&mut self, positions: &[(String, f64, f64)]);
    /// Resize the canvas.
    fn change_size(&mut self, width: f64, height: f64);
}

/// A pointer event from the collaborator, already translated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    /// A node was clicked; it becomes the camera-follow target.
    NodeClicked(String),
    /// The pointer entered (`entered = true`) or left a node.
    NodeHoverChanged {
        /// The hovered node's id.
        id: String,
        /// True on mouse-enter, false on mouse-leave.
        entered: bool,
    },
    /// The user finished dragging a combo; its center needs re-pinning.
    ComboDragEnded(String),
}
