//! Graph Nodes
//!
//! This module defines the node types that live in the topology graph.

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

/// The kind of infrastructure entity a node represents.
///
/// This is a closed enumeration: expandability rules are declared on it
/// directly (`expands`, `expands_as_combo`) so adding a type is a single
/// declarative edit rather than a string switch scattered across modules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    /// A cloud account.
    Cloud,
    /// A cloud region.
    Region,
    /// A host (VM or bare metal).
    Host,
    /// A Kubernetes pod.
    Pod,
    /// A container.
    Container,
    /// A process.
    Process,
    /// A Kubernetes cluster.
    KubernetesCluster,
    /// Synthetic grouping node clustering a node's expanded children.
    Combo,
    /// Invisible anchor node inside a combo; keeps the layout stable.
    ComboCenter,
}

impl NodeType {
    /// Whether this type participates in the expand/collapse state machine.
    /// All other types are inert leaves.
    pub fn expands(self) -> bool {
        matches!(
            self,
            NodeType::Cloud
                | NodeType::Region
                | NodeType::KubernetesCluster
                | NodeType::Host
                | NodeType::Pod
                | NodeType::Container
        )
    }

    /// Whether expanding this type materializes a combo (and its center)
    /// to visually cluster the children.
    pub fn expands_as_combo(self) -> bool {
        matches!(
            self,
            NodeType::Host | NodeType::Pod | NodeType::Container | NodeType::KubernetesCluster
        )
    }

    /// Combos and centers are engine-made, not backed by real entities.
    /// `get_parents` skips them when building breadcrumb chains.
    pub fn is_synthetic(self) -> bool {
        matches!(self, NodeType::Combo | NodeType::ComboCenter)
    }
}

/// Expansion state of a node.
///
/// `None -> Expanding -> Expanded -> None`. A node goes to `Expanding` the
/// moment the user requests expansion (which makes re-entrant requests
/// idempotent) and reaches `Expanded` only when the first data delta for it
/// is applied. Collapse is synchronous, so there is no `Collapsing` state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExpandState {
    /// Collapsed; the node must have no materialized children.
    #[default]
    None,
    /// Expansion requested, waiting for the first data delta.
    Expanding,
    /// Children are materialized (and the combo exists, for combo types).
    Expanded,
}

/// A node's physical position in the layout.
///
/// `fx`/`fy`, when set, pin the node: the force solver will not move it.
/// Used to fix a combo's center after the user drags the combo manually.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Position {
    /// Current x coordinate.
    pub x: f64,
    /// Current y coordinate.
    pub y: f64,
    /// Pinned x coordinate, if the node is fixed.
    pub fx: Option<f64>,
    /// Pinned y coordinate, if the node is fixed.
    pub fy: Option<f64>,
}

impl Position {
    /// A position scattered within a small radius around `(x, y)`.
    ///
    /// New combos, centers, and children must not be placed exactly on top
    /// of their parent: coincident points feed degenerate zero-distance
    /// pairs to the force solver. The golden-angle step from `seq` spreads
    /// successive placements without needing a random source.
    pub fn scattered_around(x: f64, y: f64, radius: f64, seq: &mut u64) -> Self {
        // Golden angle in radians; successive multiples never repeat.
        const GOLDEN_ANGLE: f64 = 2.399_963_229_728_653;
        let n = *seq as f64;
        *seq += 1;
        let angle = n * GOLDEN_ANGLE;
        let r = radius * (0.35 + 0.65 * ((n * 0.618_033_988_75).fract()));
        Self {
            x: x + r * angle.cos(),
            y: y + r * angle.sin(),
            fx: None,
            fy: None,
        }
    }
}

/// A node in the topology graph.
#[derive(Debug, Clone)]
pub struct Node {
    /// Backend-assigned id (combos and centers derive theirs from the owner).
    pub id: String,
    /// What kind of entity this node represents.
    pub node_type: NodeType,
    /// Id of the parent node, if any.
    pub parent_id: Option<String>,
    /// Ids of currently-materialized children (nodes and combos).
    pub children: IndexSet<String>,
    /// Id of the combo this node is grouped into, if any.
    pub combo_id: Option<String>,
    /// Physical position maintained by the layout.
    pub position: Position,
    /// Where this node is in the expand/collapse state machine.
    pub expand_state: ExpandState,
    /// Styling group hint from the backend; only affects layout weighting.
    pub style_group: Option<String>,
}

impl Node {
    /// Create a node with no relationships at the origin.
    pub fn new(id: impl Into<String>, node_type: NodeType) -> Self {
        Self {
            id: id.into(),
            node_type,
            parent_id: None,
            children: IndexSet::new(),
            combo_id: None,
            position: Position::default(),
            expand_state: ExpandState::None,
            style_group: None,
        }
    }

    /// Builder-style parent assignment.
    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    /// Builder-style combo membership.
    pub fn with_combo(mut self, combo_id: impl Into<String>) -> Self {
        self.combo_id = Some(combo_id.into());
        self
    }

    /// Builder-style position.
    pub fn at(mut self, position: Position) -> Self {
        self.position = position;
        self
    }
}

/// Id of the combo owned by `owner_id`, whether or not it exists yet.
pub fn combo_id_for(owner_id: &str) -> String {
    format!("{owner_id}-combo")
}

/// Id of the center anchor inside `combo_id`.
pub fn combo_center_id(combo_id: &str) -> String {
    format!("{combo_id}-center")
}
