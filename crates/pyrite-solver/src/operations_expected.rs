//! Expected-type back-solving.
//!
//! When a generic class is constructed (or called) where a specific
//! already-specialized type is expected — commonly a base class of the
//! constructed class — the expected type implies type arguments before any
//! call argument has been matched. This routine infers them by specializing
//! both classes with synthetic placeholders, running the oracle in reverse,
//! and reading the placeholder correspondence back out.

use crate::context::{InferenceContext, TypeVarBinding};
use crate::db::TypeDatabase;
use crate::instantiate::transform_live_type_vars;
use crate::operations::{AssignabilityOracle, BackSolveOutcome, ConstraintSolver, SolveOptions};
use crate::types::{
    ScopeId, TypeId, TypeKey, TypeVarFlags, TypeVarInfo, TypeVarKey, Variance,
};
use crate::utils::{self, is_gradual};
use rustc_hash::FxHashMap;

impl<O: AssignabilityOracle + ?Sized> ConstraintSolver<'_, O> {
    /// Infer `ty`'s type arguments from an expected, already-specialized
    /// compatible type, seeding `ctx` with the result.
    ///
    /// `live_scopes` lists scopes whose type variables are still being
    /// solved in an enclosing context; occurrences of those variables in
    /// the expected arguments become in-scope placeholders rather than
    /// pinned types.
    pub fn infer_from_expected_type(
        &mut self,
        ctx: &mut InferenceContext,
        ty: TypeId,
        expected: TypeId,
        live_scopes: &[ScopeId],
        recursion: u32,
    ) -> BackSolveOutcome {
        // A synthesized Self expectation stands for its bound.
        let mut expected = expected;
        if let Some(info) = utils::as_type_var(self.db, expected)
            && info.flags.contains(TypeVarFlags::SYNTHESIZED_SELF)
            && let Some(bound) = info.bound
        {
            expected = bound;
        }

        let Some(TypeKey::Instance(ty_ct)) = self.db.lookup(ty) else {
            return BackSolveOutcome::FAILED;
        };
        let Some(ty_def) = self.db.class_def(ty_ct.class) else {
            return BackSolveOutcome::FAILED;
        };

        // A gradual expectation makes every parameter gradual.
        if is_gradual(expected) {
            if !ctx.is_locked() {
                for param in &ty_def.type_params {
                    ctx.set_binding(
                        param.key(),
                        TypeVarBinding {
                            narrow_bound: Some(expected),
                            narrow_bound_no_literals: None,
                            wide_bound: Some(expected),
                            tuple_types: None,
                        },
                    );
                }
            }
            return BackSolveOutcome::ok();
        }

        let Some(TypeKey::Instance(expected_ct)) = self.db.lookup(expected) else {
            return BackSolveOutcome::FAILED;
        };

        // An unspecialized expectation carries no argument information;
        // degrade to a populate-mode assignment.
        let Some(expected_args_id) = expected_ct.args else {
            let populated = self.oracle.assign_type(
                ty,
                expected,
                None,
                Some(&mut *ctx),
                None,
                SolveOptions::populate_expected(Variance::Covariant),
                recursion + 1,
            );
            return BackSolveOutcome {
                populated,
                fully_resolved: populated,
            };
        };
        let expected_args = self.db.type_list(expected_args_id);

        // Fast path: same generic class. Copy the resolved arguments
        // directly, respecting each parameter's declared variance.
        if expected_ct.class == ty_ct.class {
            if !ctx.is_locked() {
                for (param, &arg) in ty_def.type_params.iter().zip(expected_args.iter()) {
                    let arg = transform_live_type_vars(self.db, arg, live_scopes);
                    self.seed_param(ctx, param, arg);
                }
            }
            return BackSolveOutcome::ok();
        }

        self.infer_through_base(
            ctx,
            ty_ct.class,
            &ty_def.type_params,
            expected_ct.class,
            &expected_args,
            live_scopes,
            recursion,
        )
    }

    /// General path: `expected` specializes one of `ty`'s base classes.
    fn infer_through_base(
        &mut self,
        ctx: &mut InferenceContext,
        ty_class: crate::types::ClassId,
        ty_params: &[TypeVarInfo],
        expected_class: crate::types::ClassId,
        expected_args: &[TypeId],
        live_scopes: &[ScopeId],
        recursion: u32,
    ) -> BackSolveOutcome {
        let Some(expected_def) = self.db.class_def(expected_class) else {
            return BackSolveOutcome::FAILED;
        };

        // One invariant placeholder per expected parameter, one
        // bound-check-exempt placeholder per solve parameter.
        let expected_scope = self.db.fresh_scope();
        let solve_scope = self.db.fresh_scope();
        let expected_placeholders = self.synthesize_placeholders(
            &expected_def.type_params,
            expected_scope,
            "__expected",
            false,
        );
        let (solve_placeholders, solve_index): (Vec<TypeId>, FxHashMap<TypeVarKey, usize>) = {
            let placeholders =
                self.synthesize_placeholders(ty_params, solve_scope, "__solve", true);
            let index = placeholders
                .iter()
                .enumerate()
                .filter_map(|(i, &p)| utils::as_type_var(self.db, p).map(|v| (v.key(), i)))
                .collect();
            (placeholders, index)
        };

        let expected_poly = self
            .db
            .instance(expected_class, expected_placeholders.clone());
        let ty_poly = self.db.instance(ty_class, solve_placeholders);

        // Run the oracle in reverse inside a throwaway context that solves
        // only for the expected placeholders.
        let mut scratch = InferenceContext::for_scope(expected_scope);
        if !self.oracle.assign_type(
            expected_poly,
            ty_poly,
            None,
            Some(&mut scratch),
            None,
            SolveOptions::covariant(),
            recursion + 1,
        ) {
            return BackSolveOutcome::FAILED;
        }

        // Read the correspondence back: each expected placeholder resolved
        // to (at most) one solve placeholder, possibly wrapped in a union
        // with unrelated types.
        let mut fully_resolved = true;
        let mut assigned: FxHashMap<usize, TypeId> = FxHashMap::default();
        for (i, &placeholder) in expected_placeholders.iter().enumerate() {
            let Some(info) = utils::as_type_var(self.db, placeholder) else {
                continue;
            };
            let Some(resolved) = scratch.binding(info.key()).and_then(|b| b.resolved()) else {
                continue;
            };
            let Some(&arg) = expected_args.get(i) else {
                continue;
            };

            for member in utils::union_members(self.db, resolved) {
                let Some(member_var) = utils::as_type_var(self.db, member) else {
                    continue;
                };
                let Some(&param_index) = solve_index.get(&member_var.key()) else {
                    continue;
                };
                match assigned.get(&param_index) {
                    Some(&prior) if prior != arg => {
                        // Two expected arguments landed on the same
                        // parameter (e.g. Mapping[T, T] with differing
                        // arguments). Degrade that one parameter.
                        tracing::debug!(
                            param = ?ty_params[param_index].key(),
                            "ambiguous placeholder correspondence"
                        );
                        assigned.insert(param_index, TypeId::UNKNOWN);
                        fully_resolved = false;
                    }
                    Some(_) => {}
                    None => {
                        assigned.insert(param_index, arg);
                    }
                }
            }
        }

        if !ctx.is_locked() {
            for (param_index, arg) in assigned {
                let param = &ty_params[param_index];
                let arg = transform_live_type_vars(self.db, arg, live_scopes);
                self.seed_param(ctx, param, arg);
            }
        }
        BackSolveOutcome {
            populated: true,
            fully_resolved,
        }
    }

    /// Only the solve-side placeholders are exempt from upper-bound
    /// validation; the expected-side ones stay invariant destinations.
    fn synthesize_placeholders(
        &self,
        params: &[TypeVarInfo],
        scope: ScopeId,
        prefix: &str,
        exempt_from_bound_check: bool,
    ) -> Vec<TypeId> {
        params
            .iter()
            .enumerate()
            .map(|(i, param)| {
                let name = self.db.intern_string(&format!("{prefix}_{i}"));
                let mut placeholder = TypeVarInfo::standard(name, scope);
                placeholder.kind = param.kind;
                placeholder.flags = TypeVarFlags::SYNTHESIZED;
                if exempt_from_bound_check {
                    placeholder.flags |= TypeVarFlags::EXEMPT_FROM_BOUND_CHECK;
                }
                self.db.type_var(placeholder)
            })
            .collect()
    }

    /// Write one inferred argument into the store per the parameter's
    /// declared variance: covariant parameters constrain only from above,
    /// contravariant only from below, invariant exactly.
    fn seed_param(&mut self, ctx: &mut InferenceContext, param: &TypeVarInfo, arg: TypeId) {
        let mut binding = ctx.binding(param.key()).cloned().unwrap_or_default();
        match param.variance {
            Variance::Covariant => {
                if binding.wide_bound.is_none() {
                    binding.wide_bound = Some(arg);
                }
            }
            Variance::Contravariant => {
                if binding.narrow_bound.is_none() {
                    binding.narrow_bound = Some(arg);
                }
            }
            Variance::Invariant => {
                if binding.narrow_bound.is_none() {
                    binding.narrow_bound = Some(arg);
                }
                if binding.wide_bound.is_none() {
                    binding.wide_bound = Some(arg);
                }
            }
        }
        ctx.set_binding(param.key(), binding);
    }
}

#[cfg(test)]
#[path = "../tests/expected_type_tests.rs"]
mod expected_type_tests;
