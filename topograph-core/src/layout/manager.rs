//! Layout Manager
//!
//! Ensures at most one force computation runs at a time, across the whole
//! graph, no matter how many scopes (root or individual combos) request
//! layout concurrently.
//!
//! # Queueing
//!
//! Pending requests live in one insertion-ordered map: appending a new
//! scope queues it FIFO, re-requesting a queued scope overwrites its
//! options in place without moving it (last write wins; layout is
//! idempotent per scope, so only the latest request's grouping matters).
//!
//! # Failure semantics
//!
//! A queued scope whose node was removed or collapsed before its turn is
//! dropped with a warning; a scope that vanishes while its computation is
//! running has its result discarded at write-back. Both are expected
//! races, not errors.

use std::panic::{catch_unwind, AssertUnwindSafe};

use indexmap::IndexMap;
use tracing::{debug, error, warn};

use crate::error::GraphError;
use crate::model::{combo_center_id, combo_id_for, GraphModel, Node};
use crate::turn::TurnCoordinator;

use super::solver::{ForceSimulation, SimLink, SimNode};
use super::strategy;

/// The subset of the graph one layout computation operates on.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LayoutScope {
    /// Everything not grouped inside a combo.
    Root,
    /// One combo's interior, addressed by the owning node's id.
    Node(String),
}

/// Per-request layout options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LayoutOptions {
    /// Include the owner node itself in a combo scope, so the first layout
    /// after creating the combo also settles the owner's position.
    pub expanding: bool,
}

/// Completion hook invoked after every finished (or abandoned) job.
pub type LayoutHook = Box<dyn FnMut(&LayoutScope)>;

struct RunningLayout {
    scope: LayoutScope,
    sim: ForceSimulation,
}

/// Serializes and schedules layout recomputation jobs.
#[derive(Default)]
pub struct LayoutManager {
    pending: IndexMap<LayoutScope, LayoutOptions>,
    running: Option<RunningLayout>,
    paused: bool,
    on_done: Option<LayoutHook>,
}

impl LayoutManager {
    /// Create an idle manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record or overwrite the pending request for a scope.
    pub fn layout(&mut self, scope: LayoutScope, options: LayoutOptions) {
        debug!(?scope, ?options, "layout requested");
        self.pending.insert(scope, options);
    }

    /// Suspend dequeuing. Does not abort an already-running computation.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Resume dequeuing. The caller should follow up with
    /// [`maybe_start_next`](Self::maybe_start_next).
    pub fn resume(&mut self) {
        self.paused = false;
    }

    /// Whether a computation is currently executing.
    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Whether any scope is waiting for its turn.
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Queued requests in start order, for test inspection.
    pub(crate) fn pending_requests(&self) -> impl Iterator<Item = (&LayoutScope, &LayoutOptions)> {
        self.pending.iter()
    }

    /// Install the completion hook. Panics inside the hook are caught and
    /// logged; they never corrupt the manager's bookkeeping.
    pub fn set_on_done(&mut self, hook: impl FnMut(&LayoutScope) + 'static) {
        self.on_done = Some(Box::new(hook));
    }

    /// Dequeue and start the next scope, if not paused, nothing is running,
    /// and the update side is not mid-batch. Stale scopes are skipped with
    /// a warning until a live one (or nothing) remains.
    pub fn maybe_start_next(&mut self, turn: &mut TurnCoordinator, model: &GraphModel) -> bool {
        if self.paused || self.running.is_some() || !turn.is_update() {
            return false;
        }
        while let Some((scope, options)) = self.pending.shift_remove_index(0) {
            match resolve_scope(model, &scope, options) {
                Some((nodes, links)) => {
                    debug!(?scope, nodes = nodes.len(), links = links.len(), "layout starting");
                    turn.begin_layout();
                    self.running = Some(RunningLayout {
                        scope,
                        sim: ForceSimulation::new(nodes, links),
                    });
                    return true;
                }
                None => {
                    warn!(
                        error = %GraphError::ScopeVanished(scope),
                        "dropping stale layout request"
                    );
                }
            }
        }
        false
    }

    /// Advance the running computation by one step. On convergence: write
    /// positions back (unless the scope vanished mid-run), fire the
    /// completion hook, and return the finished scope so the caller can
    /// release the turn and resume updates.
    pub fn tick(&mut self, model: &mut GraphModel) -> Option<LayoutScope> {
        let job = self.running.as_mut()?;
        job.sim.tick();
        if !job.sim.done() {
            return None;
        }

        let RunningLayout { scope, sim } = self.running.take().expect("running job checked above");
        if scope_is_live(model, &scope) {
            for (id, x, y) in sim.positions() {
                // A node removed mid-run just doesn't get a position.
                if let Some(node) = model.find_by_id_mut(id) {
                    node.position.x = x;
                    node.position.y = y;
                }
            }
            debug!(?scope, "layout complete");
        } else {
            warn!(?scope, "layout scope vanished mid-run; discarding result");
        }

        if let Some(hook) = self.on_done.as_mut() {
            if catch_unwind(AssertUnwindSafe(|| hook(&scope))).is_err() {
                error!(?scope, "layout completion hook panicked");
            }
        }
        Some(scope)
    }
}

/// Whether a finished job's scope still refers to live structure.
fn scope_is_live(model: &GraphModel, scope: &LayoutScope) -> bool {
    match scope {
        LayoutScope::Root => true,
        LayoutScope::Node(id) => model.contains(id) && model.contains(&combo_id_for(id)),
    }
}

/// Resolve a scope to its current node/edge snapshot, or None if stale.
fn resolve_scope(
    model: &GraphModel,
    scope: &LayoutScope,
    options: LayoutOptions,
) -> Option<(Vec<SimNode>, Vec<SimLink>)> {
    let members: Vec<&Node> = match scope {
        LayoutScope::Root => model.nodes().filter(|n| n.combo_id.is_none()).collect(),
        LayoutScope::Node(id) => {
            let owner = model.find_by_id(id)?;
            if !owner.node_type.expands_as_combo() {
                return None;
            }
            let combo_id = combo_id_for(id);
            let combo = model.find_by_id(&combo_id)?;

            let mut members = Vec::with_capacity(combo.children.len() + 2);
            if options.expanding {
                members.push(owner);
            }
            if let Some(center) = model.find_by_id(&combo_center_id(&combo_id)) {
                members.push(center);
            }
            members.extend(
                combo
                    .children
                    .iter()
                    .filter_map(|child| model.find_by_id(child)),
            );
            members
        }
    };
    Some(snapshot(model, &members))
}

fn snapshot(model: &GraphModel, members: &[&Node]) -> (Vec<SimNode>, Vec<SimLink>) {
    let scope_size = members.len();
    let index_of: IndexMap<&str, usize> = members
        .iter()
        .enumerate()
        .map(|(i, n)| (n.id.as_str(), i))
        .collect();

    let nodes = members
        .iter()
        .map(|n| SimNode {
            id: n.id.clone(),
            x: n.position.x,
            y: n.position.y,
            fixed: match (n.position.fx, n.position.fy) {
                (Some(fx), Some(fy)) => Some((fx, fy)),
                _ => None,
            },
            strength: strategy::node_strength(n.node_type, scope_size),
        })
        .collect();

    let links = model
        .edges()
        .filter_map(|e| {
            let source = *index_of.get(e.source.as_str())?;
            let target = *index_of.get(e.target.as_str())?;
            Some(SimLink {
                source,
                target,
                distance: strategy::link_distance(e.kind),
                strength: strategy::edge_strength(e.kind),
            })
        })
        .collect();

    (nodes, links)
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::model::{Edge, EdgeKind, NodeType};

    fn two_node_model() -> GraphModel {
        let mut model = GraphModel::new();
        model.add_node(Node::new("a", NodeType::Cloud)).unwrap();
        let mut b = Node::new("b", NodeType::Cloud);
        b.position.x = 10.0;
        model.add_node(b).unwrap();
        model
            .add_edge(Edge::new("e", "a", "b", EdgeKind::Connection))
            .unwrap();
        model
    }

    fn run_to_idle(mgr: &mut LayoutManager, turn: &mut TurnCoordinator, model: &mut GraphModel) {
        let mut guard = 0;
        while mgr.is_running() || mgr.has_pending() {
            if mgr.tick(model).is_some() {
                turn.end_layout();
            }
            mgr.maybe_start_next(turn, model);
            guard += 1;
            assert!(guard < 10_000, "layout never went idle");
        }
    }

    #[test]
    fn duplicate_scope_collapses_to_latest_options() {
        let mut mgr = LayoutManager::new();
        mgr.layout(LayoutScope::Root, LayoutOptions { expanding: false });
        mgr.layout(LayoutScope::Node("h1".into()), LayoutOptions::default());
        mgr.layout(LayoutScope::Root, LayoutOptions { expanding: true });

        let queued: Vec<_> = mgr.pending_requests().collect();
        assert_eq!(queued.len(), 2);
        // Root kept its first-queued slot but carries the latest options.
        assert_eq!(queued[0].0, &LayoutScope::Root);
        assert!(queued[0].1.expanding);
    }

    #[test]
    fn only_one_computation_runs_at_a_time() {
        let mut model = two_node_model();
        let mut turn = TurnCoordinator::new();
        let mut mgr = LayoutManager::new();
        mgr.layout(LayoutScope::Root, LayoutOptions::default());
        mgr.layout(LayoutScope::Node("missing".into()), LayoutOptions::default());

        assert!(mgr.maybe_start_next(&mut turn, &model));
        assert!(mgr.is_running());
        assert!(!turn.is_update());
        // Nothing else may start while the first runs.
        assert!(!mgr.maybe_start_next(&mut turn, &model));

        run_to_idle(&mut mgr, &mut turn, &mut model);
        assert!(turn.is_update());
    }

    #[test]
    fn stale_scopes_are_skipped() {
        let model = two_node_model();
        let mut turn = TurnCoordinator::new();
        let mut mgr = LayoutManager::new();
        mgr.layout(LayoutScope::Node("ghost".into()), LayoutOptions::default());
        mgr.layout(LayoutScope::Root, LayoutOptions::default());

        // The stale combo scope is dropped; root starts instead.
        assert!(mgr.maybe_start_next(&mut turn, &model));
        assert!(!mgr.has_pending());
    }

    #[test]
    fn pause_blocks_dequeuing_but_not_the_running_job() {
        let mut model = two_node_model();
        let mut turn = TurnCoordinator::new();
        let mut mgr = LayoutManager::new();
        mgr.layout(LayoutScope::Root, LayoutOptions::default());
        assert!(mgr.maybe_start_next(&mut turn, &model));

        mgr.pause();
        mgr.layout(LayoutScope::Root, LayoutOptions::default());
        // The running job still ticks to completion.
        let mut guard = 0;
        while mgr.tick(&mut model).is_none() {
            guard += 1;
            assert!(guard < 10_000);
        }
        turn.end_layout();
        // But the queued request stays put until resume.
        assert!(!mgr.maybe_start_next(&mut turn, &model));
        mgr.resume();
        assert!(mgr.maybe_start_next(&mut turn, &model));
    }

    #[test]
    fn completion_writes_positions_and_fires_the_hook() {
        let mut model = two_node_model();
        let mut turn = TurnCoordinator::new();
        let mut mgr = LayoutManager::new();

        let completed: Rc<RefCell<Vec<LayoutScope>>> = Rc::new(RefCell::new(Vec::new()));
        let sink = completed.clone();
        mgr.set_on_done(move |scope| sink.borrow_mut().push(scope.clone()));

        mgr.layout(LayoutScope::Root, LayoutOptions::default());
        assert!(mgr.maybe_start_next(&mut turn, &model));
        run_to_idle(&mut mgr, &mut turn, &mut model);

        assert_eq!(completed.borrow().as_slice(), &[LayoutScope::Root]);
        let a = model.find_by_id("a").unwrap().position;
        let b = model.find_by_id("b").unwrap().position;
        let dist = ((b.x - a.x).powi(2) + (b.y - a.y).powi(2)).sqrt();
        assert!(dist > 10.0, "layout should spread the pair, got {dist}");
    }

    #[test]
    fn panicking_hook_does_not_corrupt_the_manager() {
        let mut model = two_node_model();
        let mut turn = TurnCoordinator::new();
        let mut mgr = LayoutManager::new();
        mgr.set_on_done(|_| panic!("host bug"));

        mgr.layout(LayoutScope::Root, LayoutOptions::default());
        assert!(mgr.maybe_start_next(&mut turn, &model));
        run_to_idle(&mut mgr, &mut turn, &mut model);

        // Still usable for the next job.
        mgr.set_on_done(|_| {});
        mgr.layout(LayoutScope::Root, LayoutOptions::default());
        assert!(mgr.maybe_start_next(&mut turn, &model));
    }
}
