use std::collections::BTreeMap;

use serde::Serialize;

use crate::dump::{Edge, HeapGraph, NodeId};
use crate::runtime::{Heap, ObjectKind};

#[derive(Debug, Clone, Serialize)]
pub struct EdgeRecord {
    pub parent: NodeId,
    pub child: NodeId,
    pub kind: ObjectKind,
    pub label: String,
}

impl From<Edge<'_>> for EdgeRecord {
    fn from(edge: Edge<'_>) -> Self {
        Self {
            parent: edge.parent,
            child: NodeId::Object(edge.child),
            kind: edge.kind,
            label: edge.label.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub objects: usize,
    pub edges: usize,
    pub unreached: usize,
    pub by_kind: BTreeMap<ObjectKind, usize>,
}

impl Summary {
    pub fn new(graph: &HeapGraph, heap: &Heap) -> Self {
        Self {
            objects: graph.object_count(),
            edges: graph.edge_count(),
            unreached: graph.unreached(heap).len(),
            by_kind: graph.kind_counts(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub summary: Summary,
    pub edges: Vec<EdgeRecord>,
}

impl Report {
    pub fn new(graph: &HeapGraph, heap: &Heap) -> Self {
        Self {
            summary: Summary::new(graph, heap),
            edges: graph.edges().map(EdgeRecord::from).collect(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

pub fn render_edge(edge: &Edge<'_>) -> String {
    format!(
        "{} -> {} : {} {{ {} }}",
        edge.parent, edge.child, edge.kind, edge.label
    )
}

pub fn render_lines(graph: &HeapGraph) -> Vec<String> {
    graph.edges().map(|edge| render_edge(&edge)).collect()
}
