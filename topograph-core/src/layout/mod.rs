//! Layout
//!
//! Force-directed layout for the topology graph, split into three parts:
//!
//! - `strategy`: pure per-scope force parameters derived from node and
//!   edge kinds (link distances, spring constants, charge strengths).
//! - `solver`: the tick-based force simulation that one layout job runs.
//! - `manager`: serializes jobs so at most one computation runs at a time
//!   across the whole graph, whatever mix of scopes requests layout.

mod manager;
mod solver;
pub mod strategy;

pub use manager::{LayoutManager, LayoutOptions, LayoutScope};
pub use solver::{ForceSimulation, SimLink, SimNode};
