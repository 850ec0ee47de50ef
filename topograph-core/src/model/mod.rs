//! Graph Data Model
//!
//! This module holds the authoritative in-memory store for the topology
//! view: infrastructure nodes, relationship edges, and the synthetic combo
//! nodes that visually cluster expanded children.
//!
//! # Overview
//!
//! - Nodes represent infrastructure entities (cloud accounts, regions,
//!   hosts, pods, containers, processes) plus two synthetic types: combos
//!   and their invisible center anchors.
//! - Edges are either structural/pseudo (they exist only to keep the force
//!   layout topologically connected) or real `Connection` edges driven by
//!   observed data.
//!
//! # Design Decisions
//!
//! 1. One centralized, id-indexed store rather than per-controller copies:
//!    every controller receives the model by reference, so there is exactly
//!    one place where the invariants below can be enforced.
//!
//! 2. Insertion-ordered maps (`IndexMap`) so iteration, layout snapshots,
//!    and tests are deterministic.
//!
//! 3. Parent/combo membership is mirrored on every add and remove: a node's
//!    `children` set always equals the set of currently-materialized child
//!    ids, and no edge ever outlives either of its endpoints.

mod edge;
mod graph;
mod node;

pub use edge::{Edge, EdgeKind};
pub use graph::{GraphModel, ModelEvent};
pub use node::{combo_center_id, combo_id_for, ExpandState, Node, NodeType, Position};
