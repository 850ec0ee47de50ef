//! Force Simulation
//!
//! A tick-based force-directed solver over one layout scope. Each tick
//! applies spring forces along links, pairwise charge repulsion between
//! nodes, and velocity damping, then integrates, cooling an `alpha`
//! factor every step until the simulation converges (or hits the cap).
//!
//! The simulation owns a snapshot of the scope taken when the job starts:
//! node ids, starting positions, pins, and the strategy parameters. It
//! never reads the live model, so the model can be torn down underneath a
//! running job without harm; the layout manager checks liveness again at
//! write-back.
//!
//! Pinned nodes (`fx`/`fy`) are held in place. Coincident pairs are nudged
//! apart with a deterministic jiggle before the force equations see them;
//! zero-distance pairs would otherwise produce NaN velocities.

/// Starting alpha.
const ALPHA_INITIAL: f64 = 1.0;
/// Below this the simulation counts as converged.
const ALPHA_MIN: f64 = 0.005;
/// Per-tick cooling rate.
const ALPHA_DECAY: f64 = 0.05;
/// Velocity retained per tick (1.0 - friction).
const VELOCITY_DECAY: f64 = 0.6;
/// Distance floor for the force equations.
const MIN_DISTANCE: f64 = 1.0;
/// Hard cap on ticks, whatever alpha says.
const MAX_TICKS: usize = 300;

/// A node snapshot inside the simulation.
#[derive(Debug, Clone)]
pub struct SimNode {
    /// Model node id, used for write-back.
    pub id: String,
    /// Current x.
    pub x: f64,
    /// Current y.
    pub y: f64,
    /// Pin; when set the node does not move.
    pub fixed: Option<(f64, f64)>,
    /// Charge strength (negative repels).
    pub strength: f64,
}

/// A spring between two snapshot nodes, by index.
#[derive(Debug, Clone, Copy)]
pub struct SimLink {
    /// Index of the source node.
    pub source: usize,
    /// Index of the target node.
    pub target: usize,
    /// Rest length. Negative marks a rim edge: the magnitude is the ring
    /// radius children settle on around a combo center.
    pub distance: f64,
    /// Spring constant.
    pub strength: f64,
}

/// One in-flight force layout computation.
#[derive(Debug)]
pub struct ForceSimulation {
    nodes: Vec<SimNode>,
    links: Vec<SimLink>,
    velocities: Vec<(f64, f64)>,
    alpha: f64,
    ticks: usize,
}

/// Small deterministic offset used to split coincident points.
fn jiggle(seed: usize) -> f64 {
    ((seed as f64 * 0.754_877_666_2).fract() - 0.5) * 1e-3 + 1e-6
}

impl ForceSimulation {
    /// Build a simulation over a scope snapshot.
    pub fn new(nodes: Vec<SimNode>, links: Vec<SimLink>) -> Self {
        // Nothing to solve for zero or one node.
        let alpha = if nodes.len() > 1 { ALPHA_INITIAL } else { 0.0 };
        let velocities = vec![(0.0, 0.0); nodes.len()];
        Self {
            nodes,
            links,
            velocities,
            alpha,
            ticks: 0,
        }
    }

    /// Whether the simulation has converged (or exhausted its tick cap).
    pub fn done(&self) -> bool {
        self.alpha < ALPHA_MIN || self.ticks >= MAX_TICKS
    }

    /// Current cooling factor, exposed for tests.
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Advance one step. No-op once done.
    pub fn tick(&mut self) {
        if self.done() {
            return;
        }
        self.ticks += 1;
        self.alpha += (0.0 - self.alpha) * ALPHA_DECAY;

        // Springs along links.
        for (li, link) in self.links.iter().enumerate() {
            let (sx, sy) = (self.nodes[link.source].x, self.nodes[link.source].y);
            let (tx, ty) = (self.nodes[link.target].x, self.nodes[link.target].y);
            let mut dx = tx - sx;
            let mut dy = ty - sy;
            if dx * dx + dy * dy < 1e-12 {
                dx = jiggle(li + 1);
                dy = jiggle(li + 2);
            }
            let dist = (dx * dx + dy * dy).sqrt().max(MIN_DISTANCE);
            let rest = link.distance.abs();
            let f = (dist - rest) / dist * self.alpha * link.strength;
            let (fx, fy) = (dx * f * 0.5, dy * f * 0.5);
            self.velocities[link.target].0 -= fx;
            self.velocities[link.target].1 -= fy;
            self.velocities[link.source].0 += fx;
            self.velocities[link.source].1 += fy;
        }

        // Pairwise charge repulsion.
        let n = self.nodes.len();
        for i in 0..n {
            for j in (i + 1)..n {
                let mut dx = self.nodes[j].x - self.nodes[i].x;
                let mut dy = self.nodes[j].y - self.nodes[i].y;
                if dx * dx + dy * dy < 1e-12 {
                    dx = jiggle(i * 31 + j + 1);
                    dy = jiggle(i * 17 + j + 2);
                }
                let dist2 = (dx * dx + dy * dy).max(MIN_DISTANCE);
                let dist = dist2.sqrt();
                let strength = (self.nodes[i].strength + self.nodes[j].strength) * 0.5;
                let f = strength * self.alpha / dist2;
                let (ux, uy) = (dx / dist, dy / dist);
                // f is negative for repulsion: i is pushed away from j.
                self.velocities[i].0 += ux * f;
                self.velocities[i].1 += uy * f;
                self.velocities[j].0 -= ux * f;
                self.velocities[j].1 -= uy * f;
            }
        }

        // Integrate.
        for (i, node) in self.nodes.iter_mut().enumerate() {
            let v = &mut self.velocities[i];
            v.0 *= VELOCITY_DECAY;
            v.1 *= VELOCITY_DECAY;
            if let Some((fx, fy)) = node.fixed {
                node.x = fx;
                node.y = fy;
                *v = (0.0, 0.0);
            } else {
                node.x += v.0;
                node.y += v.1;
            }
        }
    }

    /// Final (or current) positions for write-back.
    pub fn positions(&self) -> impl Iterator<Item = (&str, f64, f64)> {
        self.nodes.iter().map(|n| (n.id.as_str(), n.x, n.y))
    }

    /// Run until converged. Test convenience; production ticks come from
    /// the host's animation driver.
    #[cfg(test)]
    pub fn run_to_completion(&mut self) {
        while !self.done() {
            self.tick();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str, x: f64, y: f64) -> SimNode {
        SimNode {
            id: id.into(),
            x,
            y,
            fixed: None,
            strength: -900.0,
        }
    }

    #[test]
    fn trivial_scopes_converge_immediately() {
        let sim = ForceSimulation::new(vec![node("a", 3.0, 4.0)], vec![]);
        assert!(sim.done());
        let positions: Vec<_> = sim.positions().collect();
        assert_eq!(positions, vec![("a", 3.0, 4.0)]);
    }

    #[test]
    fn connected_pair_spreads_toward_rest_length() {
        let mut sim = ForceSimulation::new(
            vec![node("a", 0.0, 0.0), node("b", 10.0, 0.0)],
            vec![SimLink {
                source: 0,
                target: 1,
                distance: 60.0,
                strength: 0.2,
            }],
        );
        sim.run_to_completion();
        let positions: Vec<_> = sim.positions().collect();
        let dx = positions[1].1 - positions[0].1;
        let dy = positions[1].2 - positions[0].2;
        let dist = (dx * dx + dy * dy).sqrt();
        assert!(dist > 10.0, "pair should spread apart, got {dist}");
        assert!(dist.is_finite());
    }

    #[test]
    fn coincident_nodes_are_split_not_nan() {
        let mut sim = ForceSimulation::new(vec![node("a", 0.0, 0.0), node("b", 0.0, 0.0)], vec![]);
        sim.run_to_completion();
        let positions: Vec<_> = sim.positions().collect();
        let dx = positions[1].1 - positions[0].1;
        let dy = positions[1].2 - positions[0].2;
        assert!(dx.is_finite() && dy.is_finite());
        assert!(dx * dx + dy * dy > 0.0, "coincident pair never separated");
    }

    #[test]
    fn pinned_nodes_do_not_move() {
        let mut pinned = node("a", 5.0, 5.0);
        pinned.fixed = Some((5.0, 5.0));
        let mut sim = ForceSimulation::new(vec![pinned, node("b", 6.0, 5.0)], vec![]);
        sim.run_to_completion();
        let positions: Vec<_> = sim.positions().collect();
        assert_eq!((positions[0].1, positions[0].2), (5.0, 5.0));
        assert!((positions[1].1, positions[1].2) != (6.0, 5.0));
    }

    #[test]
    fn converges_within_the_tick_cap() {
        let nodes = (0..20)
            .map(|i| node(&format!("n{i}"), (i % 5) as f64 * 10.0, (i / 5) as f64 * 10.0))
            .collect();
        let mut sim = ForceSimulation::new(nodes, vec![]);
        let mut ticks = 0;
        while !sim.done() {
            sim.tick();
            ticks += 1;
            assert!(ticks <= MAX_TICKS, "simulation never converged");
        }
        for (_, x, y) in sim.positions() {
            assert!(x.is_finite() && y.is_finite());
        }
    }
}
