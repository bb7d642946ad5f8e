//! Injected solve tracing.
//!
//! Embedders that want visibility into bound updates hand an implementation
//! of [`SolveTracer`] to [`InferenceContext::with_tracer`]. The default is
//! a no-op whose `enabled()` gate lets callers skip event construction
//! entirely, so the hot path pays nothing when tracing is off.
//!
//! This replaces the process-wide debug flag the original design used; no
//! global state is involved.
//!
//! [`InferenceContext::with_tracer`]: crate::context::InferenceContext::with_tracer

use crate::types::{TypeId, TypeVarKey};

/// One observable solver decision.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SolveEvent {
    /// A bind attempt started for `type_var` with source `src`.
    BindAttempt { type_var: TypeVarKey, src: TypeId },
    /// The narrow bound of `type_var` changed.
    NarrowBoundSet { type_var: TypeVarKey, bound: TypeId },
    /// The wide bound of `type_var` changed.
    WideBoundSet { type_var: TypeVarKey, bound: TypeId },
    /// A widening union hit the subtype cap and collapsed to a supertype.
    UnionCapCollapse { type_var: TypeVarKey, collapsed_to: TypeId },
    /// The bind attempt was rejected.
    BindRejected { type_var: TypeVarKey, src: TypeId },
}

/// Capability for receiving [`SolveEvent`]s.
///
/// Events are constructed lazily: callers check [`enabled`](Self::enabled)
/// before building one.
pub trait SolveTracer {
    /// Whether events should be constructed and delivered at all.
    fn enabled(&self) -> bool;

    fn record(&mut self, event: SolveEvent);
}

/// The default tracer: reports disabled, receives nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullTracer;

impl SolveTracer for NullTracer {
    #[inline]
    fn enabled(&self) -> bool {
        false
    }

    #[inline]
    fn record(&mut self, _event: SolveEvent) {}
}

/// Collects every event in order; used by tests and debugging harnesses.
#[derive(Debug, Default)]
pub struct RecordingTracer {
    pub events: Vec<SolveEvent>,
}

impl SolveTracer for RecordingTracer {
    #[inline]
    fn enabled(&self) -> bool {
        true
    }

    fn record(&mut self, event: SolveEvent) {
        self.events.push(event);
    }
}
