//! The four forces composed on every tick.
//!
//! Each force only adds to node velocities (centering is the exception: it
//! shifts positions directly). Integration happens in the simulation.

use super::simulation::{SimLink, SimNode};
use super::Point;
use crate::config::LayoutConfig;

/// Tunable force parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct ForceParams {
    pub link_distance: f64,
    pub charge_strength: f64,
    pub charge_distance_min: f64,
    pub charge_distance_max: f64,
    pub center: Point,
    pub collision_strength: f64,
}

impl ForceParams {
    pub fn from_config(config: &LayoutConfig, center: Point) -> Self {
        Self {
            link_distance: config.clamp_link_distance(config.link_distance),
            charge_strength: config.charge_strength,
            charge_distance_min: config.charge_distance_min,
            charge_distance_max: config.charge_distance_max,
            center,
            collision_strength: config.collision_strength,
        }
    }
}

/// Deterministic source of tiny offsets for separating coincident nodes.
#[derive(Debug, Clone)]
pub(crate) struct Jiggle(u64);

impl Jiggle {
    const A: u64 = 1_664_525;
    const C: u64 = 1_013_904_223;
    const M: u64 = 1 << 32;

    pub(crate) fn new() -> Self {
        Self(1)
    }

    pub(crate) fn next(&mut self) -> f64 {
        self.0 = (Self::A * self.0 + Self::C) % Self::M;
        (self.0 as f64 / Self::M as f64 - 0.5) * 1e-6
    }
}

/// Springs along every link toward `distance`.
///
/// Strength is `1 / min(deg(s), deg(t))`, so hubs are not torn apart; the
/// correction is split between endpoints in proportion to degree.
pub(crate) fn apply_links(
    nodes: &mut [SimNode],
    links: &[SimLink],
    degree: &[usize],
    distance: f64,
    alpha: f64,
    jiggle: &mut Jiggle,
) {
    for link in links {
        let (s, t) = (link.source, link.target);
        let mut x = nodes[t].position.x + nodes[t].velocity.x
            - nodes[s].position.x
            - nodes[s].velocity.x;
        let mut y = nodes[t].position.y + nodes[t].velocity.y
            - nodes[s].position.y
            - nodes[s].velocity.y;
        if x == 0.0 {
            x = jiggle.next();
        }
        if y == 0.0 {
            y = jiggle.next();
        }

        let (ds, dt) = (degree[s].max(1) as f64, degree[t].max(1) as f64);
        let strength = 1.0 / ds.min(dt);
        let bias = ds / (ds + dt);

        let l = (x * x + y * y).sqrt();
        let f = (l - distance) / l * alpha * strength;
        x *= f;
        y *= f;

        nodes[t].velocity.x -= x * bias;
        nodes[t].velocity.y -= y * bias;
        nodes[s].velocity.x += x * (1.0 - bias);
        nodes[s].velocity.y += y * (1.0 - bias);
    }
}

/// Pairwise repulsion, ignored beyond `charge_distance_max` and softened
/// below `charge_distance_min`.
pub(crate) fn apply_many_body(
    nodes: &mut [SimNode],
    params: &ForceParams,
    alpha: f64,
    jiggle: &mut Jiggle,
) {
    let max2 = params.charge_distance_max * params.charge_distance_max;
    let min2 = params.charge_distance_min * params.charge_distance_min;

    for i in 0..nodes.len() {
        let (mut dvx, mut dvy) = (0.0, 0.0);
        for j in 0..nodes.len() {
            if i == j {
                continue;
            }
            let mut x = nodes[j].position.x - nodes[i].position.x;
            let mut y = nodes[j].position.y - nodes[i].position.y;
            let mut l = x * x + y * y;
            if l >= max2 {
                continue;
            }
            if x == 0.0 {
                x = jiggle.next();
                l += x * x;
            }
            if y == 0.0 {
                y = jiggle.next();
                l += y * y;
            }
            if l < min2 {
                l = (min2 * l).sqrt();
            }
            let w = params.charge_strength * alpha / l;
            dvx += x * w;
            dvy += y * w;
        }
        nodes[i].velocity.x += dvx;
        nodes[i].velocity.y += dvy;
    }
}

/// Translate every node so the centroid sits on `center`.
pub(crate) fn apply_center(nodes: &mut [SimNode], center: Point) {
    if nodes.is_empty() {
        return;
    }
    let n = nodes.len() as f64;
    let (sx, sy) = nodes
        .iter()
        .fold((0.0, 0.0), |(sx, sy), node| (sx + node.position.x, sy + node.position.y));
    let (dx, dy) = (sx / n - center.x, sy / n - center.y);
    for node in nodes.iter_mut() {
        node.position.x -= dx;
        node.position.y -= dy;
    }
}

/// Push apart any two nodes whose anticipated positions overlap.
pub(crate) fn apply_collision(nodes: &mut [SimNode], strength: f64, jiggle: &mut Jiggle) {
    for i in 0..nodes.len() {
        let ri = nodes[i].radius;
        let ri2 = ri * ri;
        let xi = nodes[i].position.x + nodes[i].velocity.x;
        let yi = nodes[i].position.y + nodes[i].velocity.y;

        for j in (i + 1)..nodes.len() {
            let rj = nodes[j].radius;
            let r = ri + rj;
            let mut x = xi - nodes[j].position.x - nodes[j].velocity.x;
            let mut y = yi - nodes[j].position.y - nodes[j].velocity.y;
            let mut l = x * x + y * y;
            if l >= r * r {
                continue;
            }
            if x == 0.0 {
                x = jiggle.next();
                l += x * x;
            }
            if y == 0.0 {
                y = jiggle.next();
                l += y * y;
            }
            let l = l.sqrt();
            let f = (r - l) / l * strength;
            x *= f;
            y *= f;

            let rj2 = rj * rj;
            let share = rj2 / (ri2 + rj2);
            nodes[i].velocity.x += x * share;
            nodes[i].velocity.y += y * share;
            nodes[j].velocity.x -= x * (1.0 - share);
            nodes[j].velocity.y -= y * (1.0 - share);
        }
    }
}
