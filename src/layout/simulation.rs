use serde::Serialize;
use std::collections::HashMap;
use std::f64::consts::PI;

use super::forces::{self, ForceParams, Jiggle};
use super::{Bounds, Point};
use crate::config::LayoutConfig;
use crate::note::NoteId;

const INITIAL_RADIUS: f64 = 10.0;

/// A node as the simulation sees it.
///
/// `pin` is a user override kept apart from the simulated `position`; while
/// set, forces still read this node's position but never move it.
#[derive(Debug, Clone, Serialize)]
pub struct SimNode {
    pub id: NoteId,
    pub position: Point,
    pub velocity: Point,
    pub pin: Option<Point>,
    /// Collision radius.
    pub radius: f64,
}

/// A link between two node indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimLink {
    pub source: usize,
    pub target: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Running,
    Settled,
}

#[derive(Debug, Clone)]
pub struct Simulation {
    nodes: Vec<SimNode>,
    index: HashMap<NoteId, usize>,
    links: Vec<SimLink>,
    degree: Vec<usize>,
    params: ForceParams,
    alpha: f64,
    alpha_min: f64,
    alpha_decay: f64,
    alpha_target: f64,
    velocity_decay: f64,
    jiggle: Jiggle,
    running: bool,
    ticks: u64,
    restarts: u64,
}

impl Simulation {
    pub fn new(config: &LayoutConfig, center: Point) -> Self {
        Self {
            nodes: Vec::new(),
            index: HashMap::new(),
            links: Vec::new(),
            degree: Vec::new(),
            params: ForceParams::from_config(config, center),
            alpha: 1.0,
            alpha_min: config.alpha_min,
            alpha_decay: config.alpha_decay,
            alpha_target: 0.0,
            velocity_decay: config.velocity_decay,
            jiggle: Jiggle::new(),
            running: false,
            ticks: 0,
            restarts: 0,
        }
    }

    /// Replace the node and link sets, reset every coordinate and restart.
    ///
    /// `nodes` pairs each id with its collision radius. Links whose endpoints
    /// are not in `nodes` are skipped.
    pub fn set_graph(&mut self, nodes: Vec<(NoteId, f64)>, edges: &[(NoteId, NoteId)]) {
        let initial_angle = PI * (3.0 - 5f64.sqrt());
        let center = self.params.center;

        self.index.clear();
        self.nodes = nodes
            .into_iter()
            .enumerate()
            .map(|(i, (id, radius))| {
                let r = INITIAL_RADIUS * (0.5 + i as f64).sqrt();
                let angle = i as f64 * initial_angle;
                self.index.insert(id.clone(), i);
                SimNode {
                    id,
                    position: Point::new(center.x + r * angle.cos(), center.y + r * angle.sin()),
                    velocity: Point::ORIGIN,
                    pin: None,
                    radius,
                }
            })
            .collect();

        self.links = edges
            .iter()
            .filter_map(|(a, b)| {
                let source = *self.index.get(a)?;
                let target = *self.index.get(b)?;
                (source != target).then_some(SimLink { source, target })
            })
            .collect();

        self.degree = vec![0; self.nodes.len()];
        for link in &self.links {
            self.degree[link.source] += 1;
            self.degree[link.target] += 1;
        }

        self.jiggle = Jiggle::new();
        self.alpha_target = 0.0;
        tracing::debug!(
            nodes = self.nodes.len(),
            links = self.links.len(),
            "simulation graph replaced"
        );
        self.restart();
    }

    /// Reset alpha to 1 and resume ticking.
    pub fn restart(&mut self) {
        self.reheat(1.0);
    }

    /// Raise alpha to `alpha` and resume ticking.
    pub fn reheat(&mut self, alpha: f64) {
        self.alpha = alpha;
        self.running = true;
        self.restarts += 1;
        tracing::debug!(alpha, restarts = self.restarts, "simulation restarted");
    }

    /// Halt ticking. Positions are kept.
    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Change the spring rest length. Restarts only if the value moved.
    pub fn set_link_distance(&mut self, distance: f64) -> bool {
        if (self.params.link_distance - distance).abs() < f64::EPSILON {
            return false;
        }
        self.params.link_distance = distance;
        self.restart();
        true
    }

    pub fn link_distance(&self) -> f64 {
        self.params.link_distance
    }

    pub fn set_center(&mut self, center: Point) {
        self.params.center = center;
    }

    pub fn center(&self) -> Point {
        self.params.center
    }

    /// Alpha will converge to `target` instead of zero. Resumes ticking.
    pub fn set_alpha_target(&mut self, target: f64) {
        self.alpha_target = target;
        if target > 0.0 {
            self.running = true;
        }
    }

    /// Fix a node at `at`. Returns `false` for an unknown id.
    pub fn pin(&mut self, id: &NoteId, at: Point) -> bool {
        let Some(&i) = self.index.get(id) else {
            return false;
        };
        let node = &mut self.nodes[i];
        node.pin = Some(at);
        node.position = at;
        node.velocity = Point::ORIGIN;
        true
    }

    /// Release a node back to free simulation.
    pub fn unpin(&mut self, id: &NoteId) -> bool {
        match self.index.get(id) {
            Some(&i) => self.nodes[i].pin.take().is_some(),
            None => false,
        }
    }

    /// Advance one tick if running. Stops once alpha falls below `alpha_min`.
    pub fn tick(&mut self) -> TickOutcome {
        if !self.running {
            return TickOutcome::Settled;
        }
        self.step();
        if self.alpha < self.alpha_min {
            self.running = false;
            tracing::debug!(ticks = self.ticks, "simulation settled");
            return TickOutcome::Settled;
        }
        TickOutcome::Running
    }

    /// Apply one tick unconditionally.
    pub fn step(&mut self) {
        self.alpha += (self.alpha_target - self.alpha) * self.alpha_decay;
        let alpha = self.alpha;

        forces::apply_links(
            &mut self.nodes,
            &self.links,
            &self.degree,
            self.params.link_distance,
            alpha,
            &mut self.jiggle,
        );
        forces::apply_many_body(&mut self.nodes, &self.params, alpha, &mut self.jiggle);
        forces::apply_center(&mut self.nodes, self.params.center);
        forces::apply_collision(&mut self.nodes, self.params.collision_strength, &mut self.jiggle);

        let keep = 1.0 - self.velocity_decay;
        for node in &mut self.nodes {
            match node.pin {
                Some(pin) => {
                    node.position = pin;
                    node.velocity = Point::ORIGIN;
                }
                None => {
                    node.velocity.x *= keep;
                    node.velocity.y *= keep;
                    node.position.x += node.velocity.x;
                    node.position.y += node.velocity.y;
                }
            }
        }
        self.ticks += 1;
    }

    /// Tick until settled or `max_ticks` elapse. Returns ticks taken.
    pub fn run_until_settled(&mut self, max_ticks: u64) -> u64 {
        let mut taken = 0;
        while taken < max_ticks && self.tick() == TickOutcome::Running {
            taken += 1;
        }
        taken
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn alpha_target(&self) -> f64 {
        self.alpha_target
    }

    pub fn is_settled(&self) -> bool {
        !self.running
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Number of times alpha was reset.
    pub fn restarts(&self) -> u64 {
        self.restarts
    }

    pub fn nodes(&self) -> &[SimNode] {
        &self.nodes
    }

    pub fn node(&self, id: &NoteId) -> Option<&SimNode> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    pub fn position(&self, id: &NoteId) -> Option<Point> {
        self.node(id).map(|n| n.position)
    }

    pub fn links(&self) -> &[SimLink] {
        &self.links
    }

    pub fn bounds(&self) -> Option<Bounds> {
        Bounds::of_circles(self.nodes.iter().map(|n| (n.position, n.radius)))
    }

    /// Mean current length over all links, `None` without links.
    pub fn average_link_length(&self) -> Option<f64> {
        if self.links.is_empty() {
            return None;
        }
        let total: f64 = self
            .links
            .iter()
            .map(|l| self.nodes[l.source].position.distance(self.nodes[l.target].position))
            .sum();
        Some(total / self.links.len() as f64)
    }
}
