//! The constraint store: per-type-variable bound tracking.
//!
//! An [`InferenceContext`] is created per call site or per class
//! specialization attempt, fed one observed assignment at a time by the
//! solver, and discarded (or copied out via
//! `instantiate::apply_solved_type_vars`) when the check completes.
//!
//! It owns one or more [`SignatureContext`]s. The plural case exists only
//! while several overload candidates are still viable: each candidate
//! explores its own bindings, and the caller discards all but the winner.
//! Reads resolve against the primary (first) context; committed updates
//! write through to every context.

use crate::tracer::{NullTracer, SolveEvent, SolveTracer};
use crate::types::{ScopeId, TupleElement, TypeId, TypeVarKey};
use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;
use smallvec::SmallVec;

/// Everything recorded so far for one type variable.
///
/// `narrow_bound_no_literals` is derived from `narrow_bound` at commit
/// time, never set independently. When both bounds are present the solver
/// guarantees narrow is assignable to wide before committing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TypeVarBinding {
    /// Lower bound: the most specific type the variable must hold.
    pub narrow_bound: Option<TypeId>,
    /// `narrow_bound` with literal values widened away, when that widened
    /// form still satisfies the wide bound.
    pub narrow_bound_no_literals: Option<TypeId>,
    /// Upper bound: the least specific type the variable may still be.
    pub wide_bound: Option<TypeId>,
    /// For TypeVarTuple bindings: the packed tuple element types.
    pub tuple_types: Option<Vec<TupleElement>>,
}

impl TypeVarBinding {
    /// The type this binding resolves to today: narrow bound, falling back
    /// to wide.
    #[inline]
    pub fn resolved(&self) -> Option<TypeId> {
        self.narrow_bound.or(self.wide_bound)
    }
}

/// Bindings for one overload candidate.
///
/// Insertion-ordered so that diagnostics and solution application iterate
/// deterministically.
#[derive(Clone, Debug, Default)]
pub struct SignatureContext {
    bindings: IndexMap<TypeVarKey, TypeVarBinding, FxBuildHasher>,
}

impl SignatureContext {
    pub fn new() -> Self {
        SignatureContext::default()
    }

    pub fn binding(&self, key: TypeVarKey) -> Option<&TypeVarBinding> {
        self.bindings.get(&key)
    }

    pub fn set_binding(&mut self, key: TypeVarKey, binding: TypeVarBinding) {
        self.bindings.insert(key, binding);
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TypeVarKey, &TypeVarBinding)> {
        self.bindings.iter()
    }
}

/// The constraint store for one solve session.
pub struct InferenceContext {
    signature_contexts: Vec<SignatureContext>,
    solve_for_scopes: SmallVec<[ScopeId; 2]>,
    locked: bool,
    tracer: Box<dyn SolveTracer>,
}

impl std::fmt::Debug for InferenceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InferenceContext")
            .field("signature_contexts", &self.signature_contexts)
            .field("solve_for_scopes", &self.solve_for_scopes)
            .field("locked", &self.locked)
            .finish_non_exhaustive()
    }
}

impl InferenceContext {
    /// An empty store responsible for no scopes.
    pub fn new() -> Self {
        InferenceContext {
            signature_contexts: vec![SignatureContext::new()],
            solve_for_scopes: SmallVec::new(),
            locked: false,
            tracer: Box::new(NullTracer),
        }
    }

    /// A store responsible for the given scope.
    pub fn for_scope(scope: ScopeId) -> Self {
        let mut ctx = InferenceContext::new();
        ctx.add_solve_for_scope(scope);
        ctx
    }

    /// Replace the no-op tracer with an embedder-supplied one.
    pub fn with_tracer(mut self, tracer: Box<dyn SolveTracer>) -> Self {
        self.tracer = tracer;
        self
    }

    pub fn add_solve_for_scope(&mut self, scope: ScopeId) {
        if !self.solve_for_scopes.contains(&scope) {
            self.solve_for_scopes.push(scope);
        }
    }

    /// Whether this store is responsible for variables of `scope`.
    #[inline]
    pub fn is_in_scope(&self, scope: ScopeId) -> bool {
        self.solve_for_scopes.contains(&scope)
    }

    pub fn solve_for_scopes(&self) -> &[ScopeId] {
        &self.solve_for_scopes
    }

    /// Put the store into validate-only mode. Further bind calls check new
    /// observations against the recorded solution but never change it.
    pub fn lock(&mut self) {
        self.locked = true;
    }

    pub fn unlock(&mut self) {
        self.locked = false;
    }

    #[inline]
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    // ------------------------------------------------------------------
    // Signature contexts
    // ------------------------------------------------------------------

    pub fn signature_context_count(&self) -> usize {
        self.signature_contexts.len()
    }

    /// Clone the primary context as a new candidate; returns its index.
    /// Used by overload resolution to explore bindings in parallel.
    pub fn fork_signature_context(&mut self) -> usize {
        let clone = self.signature_contexts[0].clone();
        self.signature_contexts.push(clone);
        self.signature_contexts.len() - 1
    }

    /// Drop every candidate except `index`, which becomes primary.
    pub fn retain_signature_context(&mut self, index: usize) {
        if index < self.signature_contexts.len() {
            self.signature_contexts.swap(0, index);
        }
        self.signature_contexts.truncate(1);
    }

    pub fn primary(&self) -> &SignatureContext {
        &self.signature_contexts[0]
    }

    pub fn signature_context(&self, index: usize) -> Option<&SignatureContext> {
        self.signature_contexts.get(index)
    }

    // ------------------------------------------------------------------
    // Bindings
    // ------------------------------------------------------------------

    /// The binding recorded for `key`, read from the primary context.
    pub fn binding(&self, key: TypeVarKey) -> Option<&TypeVarBinding> {
        self.primary().binding(key)
    }

    /// The binding recorded for `key` in one candidate context.
    pub fn binding_in(&self, index: usize, key: TypeVarKey) -> Option<&TypeVarBinding> {
        self.signature_contexts.get(index)?.binding(key)
    }

    /// Write `binding` through to every signature context.
    ///
    /// Callers must not invoke this on a locked store; the solver checks
    /// `is_locked` before reaching a commit.
    pub fn set_binding(&mut self, key: TypeVarKey, binding: TypeVarBinding) {
        debug_assert!(!self.locked, "commit on a locked context");
        for sig in &mut self.signature_contexts {
            sig.set_binding(key, binding.clone());
        }
    }

    /// Write `binding` into one candidate context only (ParamSpec matching
    /// evaluates candidates independently).
    pub fn set_binding_in(&mut self, index: usize, key: TypeVarKey, binding: TypeVarBinding) {
        debug_assert!(!self.locked, "commit on a locked context");
        if let Some(sig) = self.signature_contexts.get_mut(index) {
            sig.set_binding(key, binding);
        }
    }

    // ------------------------------------------------------------------
    // Tracing
    // ------------------------------------------------------------------

    /// Deliver a lazily-built event to the injected tracer.
    #[inline]
    pub fn trace(&mut self, event: impl FnOnce() -> SolveEvent) {
        if self.tracer.enabled() {
            let event = event();
            tracing::trace!(?event, "solve");
            self.tracer.record(event);
        }
    }
}

impl Default for InferenceContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "../tests/context_tests.rs"]
mod context_tests;
