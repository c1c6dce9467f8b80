//! Zoom/pan transform, fit-to-view animation and pointer gesture state.
//!
//! Screen coordinates relate to world (simulation) coordinates through a
//! uniform scale plus translation: `screen = world * k + (x, y)`.

use serde::Serialize;
use std::time::Duration;

use crate::config::ViewportConfig;
use crate::layout::{Bounds, Point};
use crate::note::NoteId;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Transform {
    pub x: f64,
    pub y: f64,
    pub k: f64,
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        x: 0.0,
        y: 0.0,
        k: 1.0,
    };

    pub fn apply(&self, world: Point) -> Point {
        Point::new(world.x * self.k + self.x, world.y * self.k + self.y)
    }

    pub fn invert(&self, screen: Point) -> Point {
        Point::new((screen.x - self.x) / self.k, (screen.y - self.y) / self.k)
    }

    /// Blend toward `to` at eased progress `t`. Scale moves geometrically so
    /// zooming feels uniform in both directions.
    fn interpolate(&self, to: &Transform, t: f64) -> Transform {
        Transform {
            x: self.x + (to.x - self.x) * t,
            y: self.y + (to.y - self.y) * t,
            k: self.k * (to.k / self.k).powf(t),
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

fn ease_cubic_in_out(t: f64) -> f64 {
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}

/// A running animation between two transforms.
#[derive(Debug, Clone)]
pub struct Transition {
    from: Transform,
    to: Transform,
    duration: Duration,
    elapsed: Duration,
}

impl Transition {
    pub fn target(&self) -> Transform {
        self.to
    }

    pub fn is_finished(&self) -> bool {
        self.elapsed >= self.duration
    }

    fn current(&self) -> Transform {
        if self.is_finished() {
            return self.to;
        }
        let t = self.elapsed.as_secs_f64() / self.duration.as_secs_f64();
        self.from.interpolate(&self.to, ease_cubic_in_out(t))
    }
}

/// What the pointer is currently doing. A node drag takes precedence over
/// panning when the pointer goes down on a node.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Gesture {
    #[default]
    Idle,
    Panning {
        last: Point,
    },
    /// `offset` is node position minus the grabbed world point, so the node
    /// does not jump under the pointer.
    Dragging {
        id: NoteId,
        offset: Point,
    },
}

#[derive(Debug, Clone)]
pub struct Viewport {
    width: f64,
    height: f64,
    transform: Transform,
    min_scale: f64,
    max_scale: f64,
    fit_margin: f64,
    fit_duration: Duration,
    transition: Option<Transition>,
}

impl Viewport {
    pub fn new(config: &ViewportConfig) -> Self {
        Self {
            width: config.width.max(1.0),
            height: config.height.max(1.0),
            transform: Transform::IDENTITY,
            min_scale: config.min_scale,
            max_scale: config.max_scale,
            fit_margin: config.fit_margin,
            fit_duration: config.fit_duration(),
            transition: None,
        }
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    /// World point the layout is centered on.
    pub fn center(&self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }

    pub fn transform(&self) -> Transform {
        self.transform
    }

    pub fn scale_extent(&self) -> (f64, f64) {
        (self.min_scale, self.max_scale)
    }

    pub fn is_animating(&self) -> bool {
        self.transition.is_some()
    }

    pub fn transition(&self) -> Option<&Transition> {
        self.transition.as_ref()
    }

    /// Returns the new layout center.
    pub fn resize(&mut self, width: f64, height: f64) -> Point {
        self.width = width.max(1.0);
        self.height = height.max(1.0);
        self.center()
    }

    pub fn screen_to_world(&self, screen: Point) -> Point {
        self.transform.invert(screen)
    }

    pub fn world_to_screen(&self, world: Point) -> Point {
        self.transform.apply(world)
    }

    fn clamp_scale(&self, k: f64) -> f64 {
        if k.is_finite() && k > 0.0 {
            k.max(self.min_scale).min(self.max_scale)
        } else {
            self.max_scale
        }
    }

    /// Replace the transform outright, clamping scale.
    pub fn set_transform(&mut self, transform: Transform) {
        self.transition = None;
        self.transform = Transform {
            k: self.clamp_scale(transform.k),
            ..transform
        };
    }

    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        self.transition = None;
        self.transform.x += dx;
        self.transform.y += dy;
    }

    /// Scale by `factor` keeping the screen point `anchor` fixed.
    /// A factor that is not a positive finite number is ignored.
    pub fn zoom_at(&mut self, factor: f64, anchor: Point) {
        if !factor.is_finite() || factor <= 0.0 {
            return;
        }
        self.transition = None;
        let world = self.transform.invert(anchor);
        let k = self.clamp_scale(self.transform.k * factor);
        self.transform = Transform {
            x: anchor.x - world.x * k,
            y: anchor.y - world.y * k,
            k,
        };
    }

    /// Transform that centers `bounds` in the viewport at `fit_margin` of its extent.
    pub fn fit_transform(&self, bounds: &Bounds) -> Transform {
        let ratio = (bounds.width() / self.width).max(bounds.height() / self.height);
        let k = self.clamp_scale(self.fit_margin / ratio);
        Transform {
            x: (self.width - k * (bounds.min.x + bounds.max.x)) / 2.0,
            y: (self.height - k * (bounds.min.y + bounds.max.y)) / 2.0,
            k,
        }
    }

    /// Start animating toward the fitted transform. No-op for an empty graph.
    pub fn fit_to_view(&mut self, bounds: Option<Bounds>) -> Option<Transform> {
        let bounds = bounds?;
        let target = self.fit_transform(&bounds);
        if self.fit_duration.is_zero() {
            self.transform = target;
            self.transition = None;
        } else {
            self.transition = Some(Transition {
                from: self.transform,
                to: target,
                duration: self.fit_duration,
                elapsed: Duration::ZERO,
            });
        }
        tracing::debug!(k = target.k, x = target.x, y = target.y, "fit to view");
        Some(target)
    }

    /// Advance a running transition. Returns `true` while still animating.
    pub fn advance(&mut self, elapsed: Duration) -> bool {
        let Some(transition) = self.transition.as_mut() else {
            return false;
        };
        transition.elapsed += elapsed;
        self.transform = transition.current();
        if transition.is_finished() {
            self.transition = None;
            return false;
        }
        true
    }

    /// Topmost circle containing the screen point. Later candidates are drawn
    /// on top of earlier ones.
    pub fn hit_test<'a>(
        &self,
        candidates: impl IntoIterator<Item = (&'a NoteId, Point, f64)>,
        screen: Point,
    ) -> Option<&'a NoteId> {
        let world = self.screen_to_world(screen);
        candidates
            .into_iter()
            .filter(|(_, center, radius)| center.distance(world) <= *radius)
            .last()
            .map(|(id, _, _)| id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewport() -> Viewport {
        Viewport::new(&ViewportConfig {
            width: 800.0,
            height: 600.0,
            ..Default::default()
        })
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn apply_and_invert_round_trip() {
        let t = Transform { x: 10.0, y: -5.0, k: 2.0 };
        let p = Point::new(3.0, 4.0);
        assert_eq!(t.apply(p), Point::new(16.0, 3.0));
        assert_eq!(t.invert(t.apply(p)), p);
    }

    #[test]
    fn zoom_keeps_anchor_and_clamps() {
        let mut v = viewport();
        let anchor = Point::new(200.0, 150.0);
        let before = v.screen_to_world(anchor);
        v.zoom_at(2.0, anchor);
        let after = v.screen_to_world(anchor);
        assert!(close(before.x, after.x) && close(before.y, after.y));
        assert_eq!(v.transform().k, 2.0);

        v.zoom_at(100.0, anchor);
        assert_eq!(v.transform().k, 3.0);
        v.zoom_at(0.0001, anchor);
        assert_eq!(v.transform().k, 0.2);
    }

    #[test]
    fn degenerate_zoom_factors_leave_transform_alone() {
        let mut v = viewport();
        v.zoom_at(2.0, Point::new(10.0, 10.0));
        let before = v.transform();
        for factor in [f64::NAN, f64::INFINITY, 0.0, -1.0] {
            v.zoom_at(factor, Point::new(10.0, 10.0));
            assert_eq!(v.transform(), before);
        }
    }

    #[test]
    fn fit_centers_bounds() {
        let v = viewport();
        let bounds = Bounds {
            min: Point::new(0.0, 0.0),
            max: Point::new(400.0, 100.0),
        };
        let t = v.fit_transform(&bounds);
        assert!(close(t.k, 0.9 / 0.5));
        let c = t.apply(bounds.center());
        assert!(close(c.x, 400.0) && close(c.y, 300.0));
    }

    #[test]
    fn fit_single_point_uses_max_scale() {
        let v = viewport();
        let bounds = Bounds {
            min: Point::new(5.0, 5.0),
            max: Point::new(5.0, 5.0),
        };
        assert_eq!(v.fit_transform(&bounds).k, 3.0);
    }

    #[test]
    fn fit_on_empty_is_noop() {
        let mut v = viewport();
        assert!(v.fit_to_view(None).is_none());
        assert_eq!(v.transform(), Transform::IDENTITY);
        assert!(!v.is_animating());
    }

    #[test]
    fn fit_animates_then_lands() {
        let mut v = viewport();
        let bounds = Bounds {
            min: Point::new(-100.0, -100.0),
            max: Point::new(100.0, 100.0),
        };
        let target = v.fit_to_view(Some(bounds)).unwrap();
        assert!(v.is_animating());
        assert_eq!(v.transform(), Transform::IDENTITY);

        assert!(v.advance(Duration::from_millis(375)));
        let mid = v.transform();
        assert!(mid.k > 1.0 && mid.k < target.k);

        assert!(!v.advance(Duration::from_millis(400)));
        assert_eq!(v.transform(), target);
        assert!(!v.is_animating());
    }

    #[test]
    fn pan_cancels_animation() {
        let mut v = viewport();
        v.fit_to_view(Bounds::of_circles([(Point::new(0.0, 0.0), 10.0)]));
        v.pan_by(5.0, 5.0);
        assert!(!v.is_animating());
        assert_eq!(v.transform().x, 5.0);
    }

    #[test]
    fn hit_test_prefers_topmost() {
        let v = viewport();
        let a = NoteId::from("a");
        let b = NoteId::from("b");
        let candidates = vec![(&a, Point::new(10.0, 10.0), 8.0), (&b, Point::new(14.0, 10.0), 8.0)];
        assert_eq!(v.hit_test(candidates.clone(), Point::new(12.0, 10.0)), Some(&b));
        assert_eq!(v.hit_test(candidates.clone(), Point::new(3.0, 10.0)), Some(&a));
        assert_eq!(v.hit_test(candidates, Point::new(100.0, 100.0)), None);
    }

    #[test]
    fn resize_moves_center() {
        let mut v = viewport();
        assert_eq!(v.resize(1000.0, 500.0), Point::new(500.0, 250.0));
    }
}
