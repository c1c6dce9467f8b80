mod helpers;

use std::time::Duration;

use helpers::{category, numbered_notes, owner};
use memograph::config::{LayoutConfig, MemographConfig};
use memograph::layout::{Point, Simulation, TickOutcome};
use memograph::note::{NoteId, Relation};
use memograph::repository::Snapshot;
use memograph::session::GraphSession;

const MAX_TICKS: u64 = 5_000;

fn path_graph() -> (Vec<(NoteId, f64)>, Vec<(NoteId, NoteId)>) {
    let nodes = ["a", "b", "c"]
        .into_iter()
        .map(|id| (NoteId::from(id), 25.0))
        .collect();
    let edges = vec![("a".into(), "b".into()), ("b".into(), "c".into())];
    (nodes, edges)
}

fn settled_average(link_distance: f64) -> f64 {
    let config = LayoutConfig {
        link_distance,
        ..LayoutConfig::default()
    };
    let mut sim = Simulation::new(&config, Point::new(400.0, 300.0));
    let (nodes, edges) = path_graph();
    sim.set_graph(nodes, &edges);
    sim.run_until_settled(MAX_TICKS);
    assert!(sim.is_settled());
    sim.average_link_length().unwrap()
}

#[test]
fn link_distance_changes_settled_spacing() {
    let short = settled_average(50.0);
    let long = settled_average(200.0);
    assert!(long > 2.0 * short, "short={short:.1} long={long:.1}");
}

#[test]
fn layout_is_deterministic() {
    let run = || {
        let mut sim = Simulation::new(&LayoutConfig::default(), Point::ORIGIN);
        let (nodes, edges) = path_graph();
        sim.set_graph(nodes, &edges);
        sim.run_until_settled(MAX_TICKS);
        sim.nodes().iter().map(|n| n.position).collect::<Vec<_>>()
    };
    assert_eq!(run(), run());
}

#[test]
fn graph_without_edges_settles_and_spreads() {
    let mut sim = Simulation::new(&LayoutConfig::default(), Point::ORIGIN);
    let nodes = (0..6).map(|i| (NoteId::from(format!("n{i}")), 25.0)).collect();
    sim.set_graph(nodes, &[]);
    let taken = sim.run_until_settled(MAX_TICKS);
    assert!(taken < MAX_TICKS);
    assert_eq!(sim.average_link_length(), None);

    let positions: Vec<Point> = sim.nodes().iter().map(|n| n.position).collect();
    for (i, a) in positions.iter().enumerate() {
        assert!(a.x.is_finite() && a.y.is_finite());
        for b in &positions[i + 1..] {
            assert!(a.distance(*b) > 1.0);
        }
    }
}

#[test]
fn session_distance_slider_restarts_once_per_frame() {
    let mut session = GraphSession::new(owner(), &MemographConfig::default());
    session.load(Snapshot {
        notes: numbered_notes(3),
        relations: vec![Relation::new("n0", "n1"), Relation::new("n1", "n2")],
        categories: vec![category("c", "Cat")],
    });
    let frame = Duration::from_millis(16);
    while !session.tick(frame).is_idle() {}
    let restarts = session.simulation().restarts();

    session.set_link_distance(80.0);
    session.set_link_distance(140.0);
    assert_eq!(session.set_link_distance(10_000.0), 200.0);
    session.set_link_distance(180.0);

    assert_eq!(session.tick(frame).simulation, TickOutcome::Running);
    assert_eq!(session.simulation().restarts(), restarts + 1);
    assert_eq!(session.simulation().link_distance(), 180.0);
}
