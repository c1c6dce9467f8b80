//! The single-threaded core a UI drives.
//!
//! [`GraphSession`] owns the graph model, search, category filter, layout
//! simulation, viewport and selection. Every structural mutation completes
//! here (model update, visible subgraph rebuild, simulation restart) before
//! the next [`GraphSession::tick`] can observe it.

use serde::Serialize;
use std::collections::BTreeSet;
use std::time::Duration;

use crate::config::{LayoutConfig, MemographConfig};
use crate::error::Result;
use crate::graph::{Edge, GraphModel, Highlight, LoadReport, RelationUpdate};
use crate::layout::{Bounds, Point, Simulation, TickOutcome};
use crate::note::{Category, CategoryId, Importance, Note, NoteId, OwnerId};
use crate::repository::Snapshot;
use crate::search::NoteSearch;
use crate::viewport::{Gesture, Transform, Viewport};

/// Which notes the graph view shows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(CategoryId),
}

impl CategoryFilter {
    pub fn admits(&self, note: &Note) -> bool {
        match self {
            Self::All => true,
            Self::Only(id) => &note.category_id == id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisibleNode {
    pub id: NoteId,
    pub label: String,
    pub category_id: CategoryId,
    pub importance: u8,
    pub radius: f64,
    pub x: f64,
    pub y: f64,
    pub pinned: bool,
    pub emphasized: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisibleEdge {
    pub source: NoteId,
    pub target: NoteId,
    pub emphasized: bool,
}

/// What a renderer needs for one frame.
#[derive(Debug, Clone, Serialize)]
pub struct VisibleGraph {
    pub nodes: Vec<VisibleNode>,
    pub edges: Vec<VisibleEdge>,
    pub selected: Option<NoteId>,
    pub transform: Transform,
    pub alpha: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameStatus {
    pub simulation: TickOutcome,
    /// A fit-to-view transition is still running.
    pub animating: bool,
}

impl FrameStatus {
    pub fn is_idle(&self) -> bool {
        self.simulation == TickOutcome::Settled && !self.animating
    }
}

/// Changes held until the next frame so rapid updates restart once.
#[derive(Debug, Default)]
struct Pending {
    link_distance: Option<f64>,
    resize: Option<(f64, f64)>,
}

const LABEL_CHARS: usize = 20;

pub struct GraphSession {
    model: GraphModel,
    search: NoteSearch,
    filter: CategoryFilter,
    simulation: Simulation,
    viewport: Viewport,
    layout: LayoutConfig,
    release_pin_on_drag_end: bool,
    visible: Vec<NoteId>,
    visible_set: BTreeSet<NoteId>,
    visible_edges: BTreeSet<Edge>,
    highlight: Highlight,
    gesture: Gesture,
    pending: Pending,
}

impl GraphSession {
    pub fn new(owner: OwnerId, config: &MemographConfig) -> Self {
        let viewport = Viewport::new(&config.viewport);
        Self {
            model: GraphModel::new(owner),
            search: NoteSearch::new(),
            filter: CategoryFilter::All,
            simulation: Simulation::new(&config.layout, viewport.center()),
            viewport,
            layout: config.layout.clone(),
            release_pin_on_drag_end: config.viewport.release_pin_on_drag_end,
            visible: Vec::new(),
            visible_set: BTreeSet::new(),
            visible_edges: BTreeSet::new(),
            highlight: Highlight::default(),
            gesture: Gesture::Idle,
            pending: Pending::default(),
        }
    }

    pub fn model(&self) -> &GraphModel {
        &self.model
    }

    pub fn owner(&self) -> &OwnerId {
        self.model.owner()
    }

    pub fn simulation(&self) -> &Simulation {
        &self.simulation
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn highlight(&self) -> &Highlight {
        &self.highlight
    }

    pub fn gesture(&self) -> &Gesture {
        &self.gesture
    }

    pub fn category_filter(&self) -> &CategoryFilter {
        &self.filter
    }

    /// Ids in the graph view, in draw order.
    pub fn visible_ids(&self) -> &[NoteId] {
        &self.visible
    }

    pub fn is_visible(&self, id: &NoteId) -> bool {
        self.visible_set.contains(id)
    }

    /// Replace everything with a freshly fetched snapshot.
    pub fn load(&mut self, snapshot: Snapshot) -> LoadReport {
        let report = self
            .model
            .load(snapshot.notes, &snapshot.relations, snapshot.categories);
        self.rebuild();
        report
    }

    /// Rebuild the visible subgraph and restart the layout.
    fn rebuild(&mut self) {
        self.visible = self
            .model
            .notes()
            .iter()
            .filter(|n| self.filter.admits(n))
            .map(|n| n.id.clone())
            .collect();
        self.visible_set = self.visible.iter().cloned().collect();
        self.visible_edges = self
            .model
            .edges()
            .into_iter()
            .filter(|e| self.visible_set.contains(&e.a) && self.visible_set.contains(&e.b))
            .collect();

        let nodes = self
            .visible
            .iter()
            .map(|id| (id.clone(), self.layout.collision_radius))
            .collect();
        let links: Vec<(NoteId, NoteId)> = self
            .visible_edges
            .iter()
            .map(|e| (e.a.clone(), e.b.clone()))
            .collect();
        let dragged = match &self.gesture {
            Gesture::Dragging { id, .. } => {
                Some((id.clone(), self.simulation.node(id).and_then(|n| n.pin)))
            }
            _ => None,
        };
        self.simulation.set_graph(nodes, &links);

        // set_graph drops every pin; the node under the pointer keeps its own.
        match dragged {
            Some((id, pin)) if self.visible_set.contains(&id) => {
                if let Some(at) = pin {
                    self.simulation.pin(&id, at);
                }
                self.simulation.set_alpha_target(self.layout.drag_alpha_target);
            }
            Some(_) => self.gesture = Gesture::Idle,
            None => {}
        }

        self.refresh_highlight();
        tracing::debug!(
            nodes = self.visible.len(),
            edges = self.visible_edges.len(),
            "visible graph rebuilt"
        );
    }

    fn refresh_highlight(&mut self) {
        self.highlight = match self.highlight.selected.clone() {
            Some(id) if self.visible_set.contains(&id) => {
                Highlight::select(&self.model, &id, &self.visible_set, &self.visible_edges)
            }
            _ => Highlight::cleared(&self.visible_set, &self.visible_edges),
        };
    }

    fn radius_of(&self, id: &NoteId) -> f64 {
        self.model
            .note(id)
            .map_or(Importance::default(), |n| n.importance)
            .display_radius()
    }

    pub fn visible_graph(&self) -> VisibleGraph {
        let nodes = self
            .simulation
            .nodes()
            .iter()
            .filter_map(|sim| {
                let note = self.model.note(&sim.id)?;
                Some(VisibleNode {
                    id: sim.id.clone(),
                    label: note.label(LABEL_CHARS),
                    category_id: note.category_id.clone(),
                    importance: note.importance.get(),
                    radius: note.importance.display_radius(),
                    x: sim.position.x,
                    y: sim.position.y,
                    pinned: sim.pin.is_some(),
                    emphasized: self.highlight.is_emphasized(&sim.id),
                })
            })
            .collect();
        let edges = self
            .visible_edges
            .iter()
            .map(|e| VisibleEdge {
                source: e.a.clone(),
                target: e.b.clone(),
                emphasized: self.highlight.is_edge_emphasized(e),
            })
            .collect();
        VisibleGraph {
            nodes,
            edges,
            selected: self.highlight.selected.clone(),
            transform: self.viewport.transform(),
            alpha: self.simulation.alpha(),
        }
    }

    /// Select `id`, replacing any previous selection. A hidden id clears.
    pub fn on_node_click(&mut self, id: &NoteId) -> &Highlight {
        self.highlight =
            Highlight::select(&self.model, id, &self.visible_set, &self.visible_edges);
        &self.highlight
    }

    pub fn on_background_click(&mut self) -> &Highlight {
        self.highlight = Highlight::cleared(&self.visible_set, &self.visible_edges);
        &self.highlight
    }

    /// Pin `id` where it is and warm the simulation. Returns `false` for a
    /// node that is not visible.
    pub fn on_node_drag_start(&mut self, id: &NoteId, screen: Point) -> bool {
        let Some(position) = self.simulation.position(id) else {
            return false;
        };
        let grab = self.viewport.screen_to_world(screen);
        self.simulation.pin(id, position);
        self.simulation.set_alpha_target(self.layout.drag_alpha_target);
        self.gesture = Gesture::Dragging {
            id: id.clone(),
            offset: Point::new(position.x - grab.x, position.y - grab.y),
        };
        true
    }

    pub fn on_node_drag_move(&mut self, id: &NoteId, screen: Point) -> bool {
        let target = self.drag_target(id, screen);
        self.simulation.pin(id, target)
    }

    /// Let the simulation cool. The pin is dropped unless configured to stay.
    pub fn on_node_drag_end(&mut self, id: &NoteId, screen: Point) -> bool {
        let target = self.drag_target(id, screen);
        self.simulation.set_alpha_target(0.0);
        self.gesture = Gesture::Idle;
        if self.release_pin_on_drag_end {
            self.simulation.unpin(id)
        } else {
            self.simulation.pin(id, target)
        }
    }

    fn drag_target(&self, id: &NoteId, screen: Point) -> Point {
        let world = self.viewport.screen_to_world(screen);
        match &self.gesture {
            Gesture::Dragging { id: dragged, offset } if dragged == id => {
                Point::new(world.x + offset.x, world.y + offset.y)
            }
            _ => world,
        }
    }

    /// Topmost visible node under the screen point.
    pub fn node_at(&self, screen: Point) -> Option<NoteId> {
        let candidates = self
            .simulation
            .nodes()
            .iter()
            .map(|n| (&n.id, n.position, self.radius_of(&n.id)));
        self.viewport.hit_test(candidates, screen).cloned()
    }

    /// Pointer down starts a node drag if it lands on a node, otherwise a pan.
    pub fn on_pointer_down(&mut self, screen: Point) -> &Gesture {
        match self.node_at(screen) {
            Some(id) => {
                self.on_node_drag_start(&id, screen);
            }
            None => self.gesture = Gesture::Panning { last: screen },
        }
        &self.gesture
    }

    pub fn on_pointer_move(&mut self, screen: Point) {
        match self.gesture.clone() {
            Gesture::Dragging { id, .. } => {
                self.on_node_drag_move(&id, screen);
            }
            Gesture::Panning { last } => {
                self.viewport.pan_by(screen.x - last.x, screen.y - last.y);
                self.gesture = Gesture::Panning { last: screen };
            }
            Gesture::Idle => {}
        }
    }

    pub fn on_pointer_up(&mut self, screen: Point) {
        if let Gesture::Dragging { id, .. } = self.gesture.clone() {
            self.on_node_drag_end(&id, screen);
        }
        self.gesture = Gesture::Idle;
    }

    pub fn on_zoom(&mut self, factor: f64, anchor: Point) -> Transform {
        self.viewport.zoom_at(factor, anchor);
        self.viewport.transform()
    }

    /// Returns `true` if the filter changed and the graph was rebuilt.
    pub fn set_category_filter(&mut self, filter: CategoryFilter) -> bool {
        if self.filter == filter {
            return false;
        }
        self.filter = filter;
        self.rebuild();
        true
    }

    /// Queue a new link distance, clamped to the configured range. Takes
    /// effect on the next tick; the last value queued wins.
    /// A non-finite distance is ignored and the current one returned.
    pub fn set_link_distance(&mut self, distance: f64) -> f64 {
        if !distance.is_finite() {
            tracing::warn!(distance, "ignoring non-finite link distance");
            return self
                .pending
                .link_distance
                .unwrap_or_else(|| self.simulation.link_distance());
        }
        let distance = self.layout.clamp_link_distance(distance);
        self.pending.link_distance = Some(distance);
        distance
    }

    /// Queue a viewport resize for the next tick.
    pub fn resize(&mut self, width: f64, height: f64) {
        self.pending.resize = Some((width, height));
    }

    fn apply_pending(&mut self) {
        if let Some(distance) = self.pending.link_distance.take() {
            self.simulation.set_link_distance(distance);
        }
        if let Some((width, height)) = self.pending.resize.take() {
            let center = self.viewport.resize(width, height);
            self.simulation.set_center(center);
            self.simulation.reheat(self.layout.resize_alpha);
        }
    }

    /// Bounds of the visible nodes' display circles.
    pub fn visible_bounds(&self) -> Option<Bounds> {
        Bounds::of_circles(
            self.simulation
                .nodes()
                .iter()
                .map(|n| (n.position, self.radius_of(&n.id))),
        )
    }

    /// Animate toward a transform that frames every visible node. `None`
    /// when nothing is visible.
    pub fn fit_to_view(&mut self) -> Option<Transform> {
        let bounds = self.visible_bounds();
        self.viewport.fit_to_view(bounds)
    }

    /// Set the list-view query and return the matching notes.
    pub fn set_search_query(&mut self, query: &str) -> Vec<Note> {
        self.search.set_query(query);
        self.search.results(&self.model).to_vec()
    }

    pub fn search_results(&mut self) -> &[Note] {
        self.search.results(&self.model)
    }

    /// Advance one frame: queued changes, one simulation tick, then any
    /// viewport transition.
    pub fn tick(&mut self, elapsed: Duration) -> FrameStatus {
        self.apply_pending();
        let simulation = self.simulation.tick();
        let animating = self.viewport.advance(elapsed);
        FrameStatus {
            simulation,
            animating,
        }
    }

    /// A note the store has just created, with its relations.
    pub fn apply_note_saved(&mut self, note: Note, related: &[NoteId]) -> Result<RelationUpdate> {
        let id = note.id.clone();
        self.model.upsert_note(note)?;
        let update = self.model.set_relations(&id, related)?;
        self.rebuild();
        Ok(update)
    }

    /// A note the store has just updated. `related` replaces its relations
    /// when given.
    pub fn apply_note_updated(
        &mut self,
        note: Note,
        related: Option<&[NoteId]>,
    ) -> Result<Option<RelationUpdate>> {
        let id = note.id.clone();
        self.model.upsert_note(note)?;
        let update = match related {
            Some(targets) => Some(self.model.set_relations(&id, targets)?),
            None => None,
        };
        self.rebuild();
        Ok(update)
    }

    pub fn apply_note_deleted(&mut self, id: &NoteId) -> Option<Note> {
        let removed = self.model.remove_note(id)?;
        self.rebuild();
        Some(removed)
    }

    pub fn apply_relations_replaced(
        &mut self,
        id: &NoteId,
        targets: &[NoteId],
    ) -> Result<RelationUpdate> {
        let update = self.model.set_relations(id, targets)?;
        self.rebuild();
        Ok(update)
    }

    /// A created or renamed category. Labels change, structure does not.
    pub fn apply_category_saved(&mut self, category: Category) -> Result<()> {
        self.model.upsert_category(category)
    }
}
