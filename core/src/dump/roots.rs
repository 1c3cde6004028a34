use std::collections::HashSet;

use crate::errors::TraceError;
use crate::runtime::GcRef;

use super::classify::{Class, classify_object};
use super::graph::NodeId;
use super::tracer::GraphTracer;

/// Seeds the trace from the runtime's fixed roots, in order: the main thread,
/// the registry, then every thread on the open-upvalue list followed by its
/// open upvalues.
pub fn enumerate_roots(tracer: &mut GraphTracer<'_>) -> Result<(), TraceError> {
    let runtime = tracer.runtime();
    let heap = runtime.heap();

    tracing::debug!(object = %runtime.main_thread(), "root mainthread");
    tracer.trace(NodeId::Roots, Some(runtime.main_thread()), "mainthread")?;
    tracing::debug!(registry = ?runtime.registry(), "root registry");
    tracer.trace_value(NodeId::Roots, &runtime.registry(), "registry")?;

    let mut seen: HashSet<GcRef> = HashSet::new();
    let mut next = runtime.twups();
    let mut thread_index = 0;
    while let Some(thread_ref) = next {
        if !seen.insert(thread_ref) {
            return Err(TraceError::MalformedThreadList { thread: thread_ref });
        }
        thread_index += 1;
        tracing::debug!(object = %thread_ref, index = thread_index, "root thread");
        tracer.trace(
            NodeId::Roots,
            Some(thread_ref),
            format!("thread[{thread_index}]"),
        )?;

        let Some(thread) = heap.thread(thread_ref) else {
            return Err(match classify_object(heap, thread_ref) {
                Class::Collectable { kind, .. } => TraceError::NotAThread {
                    object: thread_ref,
                    found: kind,
                },
                _ => TraceError::DanglingReference { object: thread_ref },
            });
        };

        for (i, id) in thread.open_upvalues.iter().enumerate() {
            let value = heap.upval_value(*id);
            tracer.trace_value(
                NodeId::Roots,
                &value,
                format!("thread[{thread_index}]uv[{}]", i + 1),
            )?;
        }

        if thread.twups == Some(thread_ref) {
            break;
        }
        next = thread.twups;
    }
    Ok(())
}
