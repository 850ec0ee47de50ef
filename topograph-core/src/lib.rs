//! Topograph Core
//!
//! An incremental topology graph engine: it maintains a live,
//! continuously-updated diagram of infrastructure entities (cloud
//! accounts, regions, hosts, pods, containers, processes) connected by
//! relationship edges, with user-driven expand/collapse of subtrees,
//! visual clustering of expanded children into combos, and a
//! force-directed layout that stays stable while streaming data deltas
//! and user interaction mutate the graph.
//!
//! # Architecture
//!
//! The crate is organized into several modules, leaves first:
//!
//! - `model`: the authoritative store of nodes, edges, and combos
//! - `layout`: force parameters, the tick-based solver, and the manager
//!   that serializes layout jobs (at most one computation at a time)
//! - `expand`: the per-node expand/collapse state machine
//! - `update`: the queue that applies data deltas between layouts
//! - `turn`: the two-state coordinator that alternates the update and
//!   layout sides over the shared model
//! - `render`: the boundary trait for the opaque rendering collaborator
//! - `engine`: the imperative façade the hosting UI talks to
//!
//! Scheduling is single-threaded and cooperative: the engine owns no
//! timers or threads, and long-running layout iteration happens through
//! [`TopologyEngine::tick`] calls from the host's animation driver.
//!
//! # Example
//!
//! ```rust,ignore
//! use topograph_core::{NodeDelta, RootDelta, TopologyEngine};
//!
//! let mut engine = TopologyEngine::new(renderer);
//!
//! // Root entities arrive from the data layer.
//! engine.update_root_nodes(root_delta);
//!
//! // The user expands a host; its children arrive as a node delta.
//! engine.expand_node("h1");
//! engine.update_node("h1", children_delta);
//!
//! // The host's animation timer drives layout convergence.
//! engine.tick();
//! ```

pub mod engine;
pub mod error;
pub mod expand;
pub mod layout;
pub mod model;
pub mod render;
pub mod turn;
pub mod update;

pub use engine::TopologyEngine;
pub use error::GraphError;
pub use layout::{LayoutManager, LayoutOptions, LayoutScope};
pub use model::{Edge, EdgeKind, ExpandState, GraphModel, Node, NodeType, Position};
pub use render::{ItemKind, RenderModel, Renderer, UiEvent};
pub use update::{EdgeDelta, EdgeRef, EdgeSpec, NodeDelta, NodeSpec, RootDelta};
