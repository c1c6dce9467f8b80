//! Neighborhood highlighting for a clicked node.

use serde::Serialize;
use std::collections::BTreeSet;

use super::model::{Edge, GraphModel};
use crate::note::NoteId;

/// Visual partition of the visible graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Highlight {
    pub selected: Option<NoteId>,
    pub emphasized: BTreeSet<NoteId>,
    pub dimmed: BTreeSet<NoteId>,
    pub emphasized_edges: BTreeSet<Edge>,
    pub dimmed_edges: BTreeSet<Edge>,
}

impl Highlight {
    /// Nothing selected: everything visible is emphasized.
    pub fn cleared(nodes: &BTreeSet<NoteId>, edges: &BTreeSet<Edge>) -> Self {
        Self {
            selected: None,
            emphasized: nodes.clone(),
            dimmed: BTreeSet::new(),
            emphasized_edges: edges.clone(),
            dimmed_edges: BTreeSet::new(),
        }
    }

    /// Ego-network of `selected` within the visible sets.
    ///
    /// Only edges with the selected node as an endpoint are emphasized; an
    /// edge between two of its neighbors stays dimmed. A selection that is not
    /// visible clears.
    pub fn select(
        model: &GraphModel,
        selected: &NoteId,
        nodes: &BTreeSet<NoteId>,
        edges: &BTreeSet<Edge>,
    ) -> Self {
        if !nodes.contains(selected) {
            return Self::cleared(nodes, edges);
        }

        let mut emphasized: BTreeSet<NoteId> = model
            .neighbors_of(selected)
            .into_iter()
            .filter(|id| nodes.contains(id))
            .collect();
        emphasized.insert(selected.clone());

        let dimmed: BTreeSet<NoteId> = nodes.difference(&emphasized).cloned().collect();
        let (emphasized_edges, dimmed_edges): (BTreeSet<Edge>, BTreeSet<Edge>) =
            edges.iter().cloned().partition(|e| e.touches(selected));

        Self {
            selected: Some(selected.clone()),
            emphasized,
            dimmed,
            emphasized_edges,
            dimmed_edges,
        }
    }

    pub fn is_emphasized(&self, id: &NoteId) -> bool {
        self.emphasized.contains(id)
    }

    pub fn is_edge_emphasized(&self, edge: &Edge) -> bool {
        self.emphasized_edges.contains(edge)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::note::{Importance, Note};
    use chrono::Utc;

    fn triangle_plus_one() -> GraphModel {
        let now = Utc::now();
        let notes = ["1", "2", "3", "4"]
            .iter()
            .map(|id| Note {
                id: (*id).into(),
                owner_id: "o".into(),
                category_id: "c".into(),
                category_name: None,
                title: String::new(),
                content: "x".into(),
                importance: Importance::default(),
                created_at: now,
                updated_at: now,
            })
            .collect();
        let mut m = GraphModel::new("o".into());
        m.load(
            notes,
            &[
                crate::note::Relation::new("1", "2"),
                crate::note::Relation::new("1", "3"),
                crate::note::Relation::new("2", "3"),
            ],
            Vec::new(),
        );
        m
    }

    fn visible(m: &GraphModel) -> (BTreeSet<NoteId>, BTreeSet<Edge>) {
        (m.notes().iter().map(|n| n.id.clone()).collect(), m.edges())
    }

    #[test]
    fn ego_network_only() {
        let m = triangle_plus_one();
        let (nodes, edges) = visible(&m);
        let h = Highlight::select(&m, &"1".into(), &nodes, &edges);

        let expected: BTreeSet<NoteId> = ["1", "2", "3"].iter().map(|s| (*s).into()).collect();
        assert_eq!(h.emphasized, expected);
        assert_eq!(h.dimmed, BTreeSet::from([NoteId::from("4")]));
        assert_eq!(h.emphasized_edges.len(), 2);
        assert!(h.is_edge_emphasized(&Edge::new("1".into(), "2".into())));
        // neighbor-to-neighbor edge stays dimmed
        assert!(h.dimmed_edges.contains(&Edge::new("2".into(), "3".into())));
    }

    #[test]
    fn invisible_selection_clears() {
        let m = triangle_plus_one();
        let nodes: BTreeSet<NoteId> = ["2", "3"].iter().map(|s| (*s).into()).collect();
        let edges = BTreeSet::from([Edge::new("2".into(), "3".into())]);
        let h = Highlight::select(&m, &"1".into(), &nodes, &edges);
        assert_eq!(h, Highlight::cleared(&nodes, &edges));
        assert!(h.dimmed.is_empty());
    }

    #[test]
    fn neighbors_outside_visible_set_are_ignored() {
        let m = triangle_plus_one();
        let nodes: BTreeSet<NoteId> = ["1", "2", "4"].iter().map(|s| (*s).into()).collect();
        let edges = BTreeSet::from([Edge::new("1".into(), "2".into())]);
        let h = Highlight::select(&m, &"1".into(), &nodes, &edges);
        assert_eq!(h.emphasized.len(), 2);
        assert!(!h.emphasized.contains(&NoteId::from("3")));
    }
}
