use std::collections::{BTreeMap, HashMap, VecDeque};
use std::fmt;

use serde::{Serialize, Serializer};

use crate::runtime::{GcRef, Heap, ObjectKind};

/// Parent side of an edge: a heap object, or the synthetic root set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NodeId {
    Roots,
    Object(GcRef),
}

impl From<GcRef> for NodeId {
    fn from(gc: GcRef) -> Self {
        NodeId::Object(gc)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeId::Roots => f.write_str("roots"),
            NodeId::Object(gc) => write!(f, "{gc}"),
        }
    }
}

impl Serialize for NodeId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildInfo {
    pub label: String,
    pub kind: ObjectKind,
}

/// What to keep when the same parent reaches the same child twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LabelPolicy {
    KeepFirst,
    #[default]
    KeepLast,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge<'g> {
    pub parent: NodeId,
    pub child: GcRef,
    pub kind: ObjectKind,
    pub label: &'g str,
}

/// Accumulated object graph: labeled adjacency plus the visited set.
#[derive(Debug, Default)]
pub struct HeapGraph {
    adjacency: BTreeMap<NodeId, BTreeMap<GcRef, ChildInfo>>,
    visited: BTreeMap<GcRef, ObjectKind>,
}

impl HeapGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record(
        &mut self,
        parent: NodeId,
        child: GcRef,
        kind: ObjectKind,
        label: String,
        policy: LabelPolicy,
    ) {
        let children = self.adjacency.entry(parent).or_default();
        match children.get_mut(&child) {
            Some(existing) if policy == LabelPolicy::KeepLast => {
                existing.label = label;
                existing.kind = kind;
            }
            Some(_) => {}
            None => {
                children.insert(child, ChildInfo { label, kind });
            }
        }
    }

    /// Returns `false` if the object was already visited.
    pub(crate) fn mark_visited(&mut self, object: GcRef, kind: ObjectKind) -> bool {
        self.visited.insert(object, kind).is_none()
    }

    pub fn is_visited(&self, object: GcRef) -> bool {
        self.visited.contains_key(&object)
    }

    pub fn kind_of(&self, object: GcRef) -> Option<ObjectKind> {
        self.visited.get(&object).copied()
    }

    pub fn visited(&self) -> impl Iterator<Item = GcRef> + '_ {
        self.visited.keys().copied()
    }

    pub fn object_count(&self) -> usize {
        self.visited.len()
    }

    pub fn child(&self, parent: NodeId, child: GcRef) -> Option<&ChildInfo> {
        self.adjacency.get(&parent)?.get(&child)
    }

    pub fn children(&self, parent: NodeId) -> impl Iterator<Item = Edge<'_>> + '_ {
        self.adjacency
            .get(&parent)
            .into_iter()
            .flat_map(move |children| {
                children.iter().map(move |(child, info)| Edge {
                    parent,
                    child: *child,
                    kind: info.kind,
                    label: &info.label,
                })
            })
    }

    pub fn roots(&self) -> impl Iterator<Item = Edge<'_>> + '_ {
        self.children(NodeId::Roots)
    }

    pub fn edges(&self) -> impl Iterator<Item = Edge<'_>> + '_ {
        self.adjacency.keys().flat_map(move |parent| self.children(*parent))
    }

    pub fn edge_count(&self) -> usize {
        self.adjacency.values().map(BTreeMap::len).sum()
    }

    pub fn parents_of(&self, child: GcRef) -> Vec<Edge<'_>> {
        self.adjacency
            .iter()
            .filter_map(|(parent, children)| {
                children.get(&child).map(|info| Edge {
                    parent: *parent,
                    child,
                    kind: info.kind,
                    label: &info.label,
                })
            })
            .collect()
    }

    /// Shortest chain of recorded edges leading from the roots to `target`.
    pub fn retention_path(&self, target: GcRef) -> Option<Vec<Edge<'_>>> {
        let mut came_from: HashMap<GcRef, NodeId> = HashMap::new();
        let mut queue = VecDeque::from([NodeId::Roots]);

        while let Some(node) = queue.pop_front() {
            for edge in self.children(node) {
                if came_from.contains_key(&edge.child) {
                    continue;
                }
                came_from.insert(edge.child, node);
                if edge.child == target {
                    return Some(self.unwind(&came_from, target));
                }
                queue.push_back(NodeId::Object(edge.child));
            }
        }
        None
    }

    fn unwind(&self, came_from: &HashMap<GcRef, NodeId>, target: GcRef) -> Vec<Edge<'_>> {
        let mut path = Vec::new();
        let mut child = target;
        while let Some(&parent) = came_from.get(&child) {
            if let Some(info) = self.child(parent, child) {
                path.push(Edge {
                    parent,
                    child,
                    kind: info.kind,
                    label: &info.label,
                });
            }
            match parent {
                NodeId::Object(next) => child = next,
                NodeId::Roots => break,
            }
        }
        path.reverse();
        path
    }

    /// Heap objects the trace never reached.
    pub fn unreached(&self, heap: &Heap) -> Vec<GcRef> {
        heap.iter()
            .map(|(gc, _)| gc)
            .filter(|gc| !self.is_visited(*gc))
            .collect()
    }

    pub fn kind_counts(&self) -> BTreeMap<ObjectKind, usize> {
        let mut counts = BTreeMap::new();
        for kind in self.visited.values() {
            *counts.entry(*kind).or_insert(0) += 1;
        }
        counts
    }
}
