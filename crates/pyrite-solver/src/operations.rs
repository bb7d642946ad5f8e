//! Constraint-solving entry points.
//!
//! The solver handles **WHAT** a type variable resolves to; the host
//! checker handles **WHERE** (AST traversal, argument matching, overload
//! selection). Everything here:
//!
//! - takes `TypeId` inputs, never AST nodes,
//! - reports failure as `false` plus optional structured diagnostics,
//! - leans on the [`AssignabilityOracle`] for every structural question.
//!
//! This file holds the mode/options types, the oracle seam, and the
//! dispatch stage of `bind_type_var`. The per-kind algorithms live in the
//! sibling `operations_*` files as further impl blocks on
//! [`ConstraintSolver`].

use crate::context::InferenceContext;
use crate::db::TypeDatabase;
use crate::diagnostics::{DiagnosticAddendum, SolveMessage};
use crate::instantiate::make_top_level_type_vars_concrete;
use crate::tracer::SolveEvent;
use crate::types::{
    ClassType, TupleElement, TypeId, TypeKey, TypeVarFlags, TypeVarInfo, Variance,
};
use crate::utils::{self, is_gradual};

/// How one observed assignment should move the destination variable's
/// bounds.
///
/// Exactly one mode is in force per call; modes are not combinable. The
/// genuinely orthogonal switches live as booleans on [`SolveOptions`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SolveMode {
    /// Update the narrow bound (the default direction).
    #[default]
    Covariant,
    /// Exact matching: the solved type must represent `src` precisely.
    Invariant,
    /// Update the wide bound (the destination appears in an input
    /// position).
    Contravariant,
    /// Seed bounds from an expected type before argument matching. Never
    /// overwrites a bound that is already set.
    PopulateExpected {
        variance: Variance,
        /// Skip the update entirely when the source is `Unknown`.
        skip_unknown: bool,
    },
}

/// Options threaded through every solve call.
#[derive(Clone, Copy, Debug, Default)]
pub struct SolveOptions {
    pub mode: SolveMode,
    /// Out-of-scope destination variables succeed silently instead of
    /// failing.
    pub ignore_scope: bool,
    /// Commit literal-carrying bounds without deriving the widened form.
    pub retain_literals: bool,
    /// Leave under-specialized classes (`list` with no arguments) alone
    /// instead of filling their arguments with `Unknown`.
    pub allow_unspecified_type_args: bool,
    /// Bypass the store: degrade to a plain structural check with type
    /// variables made concrete.
    pub skip_solve_type_vars: bool,
}

impl SolveOptions {
    pub fn covariant() -> SolveOptions {
        SolveOptions::default()
    }

    pub fn invariant() -> SolveOptions {
        SolveOptions {
            mode: SolveMode::Invariant,
            ..SolveOptions::default()
        }
    }

    pub fn contravariant() -> SolveOptions {
        SolveOptions {
            mode: SolveMode::Contravariant,
            ..SolveOptions::default()
        }
    }

    pub fn populate_expected(variance: Variance) -> SolveOptions {
        SolveOptions {
            mode: SolveMode::PopulateExpected {
                variance,
                skip_unknown: false,
            },
            ..SolveOptions::default()
        }
    }

    #[inline]
    pub fn is_invariant(&self) -> bool {
        self.mode == SolveMode::Invariant
    }

    #[inline]
    pub fn is_contravariant(&self) -> bool {
        self.mode == SolveMode::Contravariant
    }

    #[inline]
    pub fn is_populating(&self) -> bool {
        matches!(self.mode, SolveMode::PopulateExpected { .. })
    }
}

/// The structural/nominal assignability oracle (the sole source of truth
/// for "is src compatible with dest").
///
/// The solver re-enters itself through this trait: when the oracle meets a
/// type variable on the destination side and a context was supplied, it is
/// expected to call back into [`ConstraintSolver::bind_type_var`].
/// [`crate::relate::SubtypeChecker`] is the in-repo reference
/// implementation; production embedders substitute their own.
pub trait AssignabilityOracle {
    fn assign_type(
        &mut self,
        dest: TypeId,
        src: TypeId,
        diag: Option<&mut DiagnosticAddendum>,
        dest_ctx: Option<&mut InferenceContext>,
        src_ctx: Option<&mut InferenceContext>,
        options: SolveOptions,
        recursion: u32,
    ) -> bool;

    /// Plain covariant check with no context and no diagnostics.
    fn is_assignable(&mut self, dest: TypeId, src: TypeId, recursion: u32) -> bool {
        self.assign_type(
            dest,
            src,
            None,
            None,
            None,
            SolveOptions::covariant(),
            recursion,
        )
    }
}

/// Result of expected-type back-solving.
///
/// `populated` is the operation's success bit. `fully_resolved` is cleared
/// when a placeholder corresponded ambiguously (the affected parameter was
/// degraded to `Unknown`); callers must consult it before trusting the
/// partial bindings.
#[must_use]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BackSolveOutcome {
    pub populated: bool,
    pub fully_resolved: bool,
}

impl BackSolveOutcome {
    pub const FAILED: BackSolveOutcome = BackSolveOutcome {
        populated: false,
        fully_resolved: false,
    };

    pub fn ok() -> BackSolveOutcome {
        BackSolveOutcome {
            populated: true,
            fully_resolved: true,
        }
    }
}

/// The TypeVar binder and its specialized resolvers.
///
/// Borrows the database and the oracle for the duration of one call chain;
/// holds no state of its own, so constructing one is free.
pub struct ConstraintSolver<'a, O: AssignabilityOracle + ?Sized> {
    pub(crate) db: &'a dyn TypeDatabase,
    pub(crate) oracle: &'a mut O,
}

impl<'a, O: AssignabilityOracle + ?Sized> ConstraintSolver<'a, O> {
    pub fn new(db: &'a dyn TypeDatabase, oracle: &'a mut O) -> Self {
        ConstraintSolver { db, oracle }
    }

    /// Record that `src` is an acceptable substitution for the type
    /// variable `dest` inside `ctx`.
    ///
    /// Returns whether the observation is consistent with everything
    /// already recorded. On success, and if `ctx` is unlocked, the active
    /// bindings are updated.
    pub fn bind_type_var(
        &mut self,
        ctx: &mut InferenceContext,
        dest: TypeId,
        src: TypeId,
        mut diag: Option<&mut DiagnosticAddendum>,
        options: SolveOptions,
        recursion: u32,
    ) -> bool {
        let Some(info) = utils::as_type_var(self.db, dest) else {
            // Shape mismatch: the binder was handed a non-typevar dest.
            if let Some(diag) = diag.as_deref_mut() {
                diag.add_message(SolveMessage::TypeAssignmentMismatch { dest, src });
            }
            return false;
        };
        ctx.trace(|| SolveEvent::BindAttempt {
            type_var: info.key(),
            src,
        });

        // Step 1: scope guard.
        let in_scope = ctx.is_in_scope(info.scope);
        if !in_scope {
            if self.out_of_scope_escape(&info, src, options) {
                return true;
            }
            if options.ignore_scope {
                return true;
            }
            if info.flags.contains(TypeVarFlags::SYNTHESIZED)
                && !info.flags.contains(TypeVarFlags::SYNTHESIZED_SELF)
            {
                return true;
            }
            tracing::debug!(
                type_var = ?info.key(),
                scope = info.scope.0,
                "type variable out of scope for this solve"
            );
            if let Some(diag) = diag {
                diag.add_message(SolveMessage::TypeVarNotInScope {
                    type_var: info.name,
                });
            }
            return false;
        }

        // Step 2: a placeholder assigned to itself is a no-op success.
        if src == dest && info.flags.contains(TypeVarFlags::IN_SCOPE_PLACEHOLDER) {
            return true;
        }

        // Step 3: dispatch.
        if options.skip_solve_type_vars {
            let concrete_dest = make_top_level_type_vars_concrete(self.db, dest, true);
            let concrete_src = make_top_level_type_vars_concrete(self.db, src, true);
            let structural = SolveOptions {
                skip_solve_type_vars: false,
                ..options
            };
            return self.oracle.assign_type(
                concrete_dest,
                concrete_src,
                diag,
                None,
                None,
                structural,
                recursion + 1,
            );
        }

        if info.is_param_spec() {
            return self.bind_param_spec(ctx, &info, src, diag, recursion);
        }

        let mut src = src;
        if info.is_variadic() {
            // Uniformly tuple-shape every TypeVarTuple binding: a loose
            // source becomes a packed 1-tuple.
            if !self.is_unpacked_form(src) {
                src = self
                    .db
                    .unpacked_tuple(vec![TupleElement::new(src)]);
            }
        } else if let Some(src_info) = utils::as_type_var(self.db, src)
            && src_info.is_variadic()
            && src_info.flags.contains(TypeVarFlags::UNPACKED)
        {
            // An unpacked TypeVarTuple meeting a plain destination is
            // re-read as the plain variable reference.
            let mut plain = src_info;
            plain.flags -= TypeVarFlags::UNPACKED;
            src = self.db.type_var(plain);
        }

        if info.is_constrained() {
            return self.bind_constrained(ctx, &info, src, diag, options, recursion);
        }

        self.bind_unconstrained(ctx, &info, dest, src, diag, options, recursion)
    }

    /// Out-of-scope sources that still succeed (spec'd escape hatches):
    /// gradual types, classes deriving from them, `type[Any]`, the gradual
    /// callable accepted by a ParamSpec, and `Never` outside invariant
    /// matching.
    fn out_of_scope_escape(&self, info: &TypeVarInfo, src: TypeId, options: SolveOptions) -> bool {
        if is_gradual(src) {
            return true;
        }
        if src == TypeId::NEVER && !options.is_invariant() {
            return true;
        }
        match self.db.lookup(src) {
            Some(TypeKey::Instance(ClassType { class, .. })) => {
                utils::derives_from_any(self.db, class)
            }
            Some(TypeKey::Instantiable(ClassType { class, args })) => {
                // `type[Any]` and instantiables of Any-derived classes.
                utils::derives_from_any(self.db, class)
                    || args.is_some_and(|args| {
                        self.db.type_list(args).iter().copied().all(is_gradual)
                            && !args.is_empty()
                    })
            }
            Some(TypeKey::Callable(shape_id)) => {
                info.is_param_spec()
                    && self
                        .db
                        .callable_shape(shape_id)
                        .is_some_and(|shape| shape.is_gradual())
            }
            _ => false,
        }
    }

    fn is_unpacked_form(&self, ty: TypeId) -> bool {
        match self.db.lookup(ty) {
            Some(TypeKey::UnpackedTuple(_)) => true,
            // A TypeVarTuple reference (packed or unpacked) is already
            // tuple-shaped.
            Some(TypeKey::TypeVar(info)) => info.is_variadic(),
            _ => false,
        }
    }
}

#[cfg(test)]
#[path = "../tests/bind_tests.rs"]
mod bind_tests;
