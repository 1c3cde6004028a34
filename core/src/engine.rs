use crate::dump::{GraphTracer, HeapGraph, LabelPolicy, enumerate_roots};
use crate::errors::TraceError;
use crate::runtime::Runtime;

#[derive(Debug, Clone, Copy)]
pub struct Inspector {
    record_revisits: bool,
    label_policy: LabelPolicy,
}

impl Default for Inspector {
    fn default() -> Self {
        Self {
            record_revisits: true,
            label_policy: LabelPolicy::KeepLast,
        }
    }
}

impl Inspector {
    pub fn new() -> Self {
        Self::default()
    }

    /// When off, only the first edge into each object is kept and the graph
    /// is a spanning tree of the reachable heap.
    pub fn with_record_revisits(mut self, record: bool) -> Self {
        self.record_revisits = record;
        self
    }

    pub fn with_label_policy(mut self, policy: LabelPolicy) -> Self {
        self.label_policy = policy;
        self
    }

    #[tracing::instrument(level = "debug", skip_all)]
    pub fn inspect(&self, runtime: &Runtime) -> Result<HeapGraph, TraceError> {
        let mut tracer = GraphTracer::new(runtime)
            .with_record_revisits(self.record_revisits)
            .with_label_policy(self.label_policy);
        enumerate_roots(&mut tracer)?;

        let graph = tracer.finish();
        tracing::debug!(
            objects = graph.object_count(),
            edges = graph.edge_count(),
            "heap trace complete"
        );
        Ok(graph)
    }
}
