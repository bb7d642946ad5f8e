//! The narrow/wide bound algorithm for unconstrained type variables.
//!
//! This is the general case of `bind_type_var`: the destination is a plain
//! TypeVar (possibly with a declared upper bound), and each observation
//! either narrows, confirms, or widens the recorded bounds.

use crate::context::{InferenceContext, TypeVarBinding};
use crate::db::TypeDatabase;
use crate::diagnostics::{DiagnosticAddendum, SolveMessage};
use crate::instantiate::{fill_unspecified_args, make_top_level_type_vars_concrete};
use crate::limits::MAX_NARROWED_UNION_SUBTYPES;
use crate::operations::{AssignabilityOracle, ConstraintSolver, SolveMode, SolveOptions};
use crate::tracer::SolveEvent;
use crate::types::{TupleElement, TypeId, TypeKey, TypeVarFlags, TypeVarInfo, Variance};
use crate::utils::{self, is_gradual};
use crate::widening::{strip_literal_value, widen_tuple_types};

impl<O: AssignabilityOracle + ?Sized> ConstraintSolver<'_, O> {
    pub(crate) fn bind_unconstrained(
        &mut self,
        ctx: &mut InferenceContext,
        info: &TypeVarInfo,
        dest: TypeId,
        src: TypeId,
        mut diag: Option<&mut DiagnosticAddendum>,
        options: SolveOptions,
        recursion: u32,
    ) -> bool {
        let binding = ctx.binding(info.key()).cloned().unwrap_or_default();
        let cur_narrow = binding.narrow_bound;
        let mut cur_wide = binding.wide_bound;
        // The declared bound seeds the wide bound, except for the
        // synthesized Self variable (its bound is the enclosing class and
        // would wrongly pin every Self use).
        if cur_wide.is_none() && !info.flags.contains(TypeVarFlags::SYNTHESIZED_SELF) {
            cur_wide = info.bound;
        }

        // Normalize the source before recording it.
        let Some(src) = self.normalize_src(info, src, diag.as_deref_mut(), options) else {
            return false;
        };

        if let SolveMode::PopulateExpected {
            variance,
            skip_unknown,
        } = options.mode
        {
            return self.populate_expected(ctx, info, binding, src, variance, skip_unknown);
        }

        if options.is_contravariant() {
            return self.update_wide_bound(ctx, info, binding, cur_wide, dest, src, diag, recursion);
        }

        self.update_narrow_bound(
            ctx, info, binding, cur_narrow, cur_wide, src, diag, options, recursion,
        )
    }

    /// Fill unspecified type arguments and convert between the instance
    /// and instantiable forms to match the destination variable.
    fn normalize_src(
        &mut self,
        info: &TypeVarInfo,
        src: TypeId,
        diag: Option<&mut DiagnosticAddendum>,
        options: SolveOptions,
    ) -> Option<TypeId> {
        let src = if options.allow_unspecified_type_args {
            src
        } else {
            fill_unspecified_args(self.db, src)
        };
        if !info.flags.contains(TypeVarFlags::INSTANTIABLE) {
            return Some(src);
        }
        // `type[T]`: the value bound to T is the instance form of the
        // class object observed.
        match self.db.lookup(src) {
            Some(TypeKey::Instantiable(ct)) => Some(self.db.intern(TypeKey::Instance(ct))),
            _ if is_gradual(src) || src == TypeId::NEVER => Some(src),
            Some(TypeKey::TypeVar(_)) => Some(src),
            _ => {
                if let Some(diag) = diag {
                    diag.add_message(SolveMessage::TypeVarShapeMismatch {
                        type_var: info.name,
                        src,
                    });
                }
                None
            }
        }
    }

    /// Seed bounds from an expected type. Only unset bounds are written.
    fn populate_expected(
        &mut self,
        ctx: &mut InferenceContext,
        info: &TypeVarInfo,
        binding: TypeVarBinding,
        src: TypeId,
        variance: Variance,
        skip_unknown: bool,
    ) -> bool {
        if skip_unknown && src == TypeId::UNKNOWN {
            return true;
        }
        if ctx.is_locked() {
            return true;
        }
        let mut updated = binding;
        match variance {
            Variance::Invariant => {
                if updated.narrow_bound.is_none() {
                    updated.narrow_bound = Some(src);
                }
                if updated.wide_bound.is_none() {
                    updated.wide_bound = Some(src);
                }
            }
            Variance::Contravariant => {
                if updated.narrow_bound.is_none() {
                    updated.narrow_bound = Some(src);
                }
            }
            Variance::Covariant => {
                if updated.wide_bound.is_none() {
                    updated.wide_bound = Some(src);
                }
            }
        }
        ctx.set_binding(info.key(), updated);
        ctx.trace(|| SolveEvent::NarrowBoundSet {
            type_var: info.key(),
            bound: src,
        });
        true
    }

    /// Contravariant direction: the destination appears in an input
    /// position, so observations move the wide (upper) bound downward.
    fn update_wide_bound(
        &mut self,
        ctx: &mut InferenceContext,
        info: &TypeVarInfo,
        binding: TypeVarBinding,
        cur_wide: Option<TypeId>,
        dest: TypeId,
        src: TypeId,
        mut diag: Option<&mut DiagnosticAddendum>,
        recursion: u32,
    ) -> bool {
        let new_wide = match cur_wide {
            None => src,
            Some(w) if w == dest => src,
            Some(w) if w == src => w,
            Some(w) => {
                if self.oracle.is_assignable(w, src, recursion + 1) {
                    // The new observation is narrower; it becomes the new
                    // ceiling.
                    src
                } else if self.oracle.is_assignable(src, w, recursion + 1) {
                    w
                } else {
                    if let Some(diag) = diag {
                        diag.add_message(SolveMessage::BoundConflict {
                            type_var: info.name,
                            existing: w,
                            offending: src,
                        });
                    }
                    ctx.trace(|| SolveEvent::BindRejected {
                        type_var: info.key(),
                        src,
                    });
                    return false;
                }
            }
        };

        // The wide bound must remain a supertype of any recorded narrow
        // bound.
        if let Some(narrow) = binding.narrow_bound
            && !self.oracle.is_assignable(new_wide, narrow, recursion + 1)
        {
            if let Some(diag) = diag.as_deref_mut() {
                diag.add_message(SolveMessage::BoundConflict {
                    type_var: info.name,
                    existing: narrow,
                    offending: src,
                });
            }
            return false;
        }

        if !self.validate_declared_bound(
            ctx,
            info,
            binding.narrow_bound.unwrap_or(new_wide),
            diag,
            recursion,
        ) {
            return false;
        }

        if ctx.is_locked() {
            if cur_wide == Some(new_wide) {
                return true;
            }
            ctx.trace(|| SolveEvent::BindRejected {
                type_var: info.key(),
                src,
            });
            return false;
        }

        let mut updated = binding;
        updated.wide_bound = Some(new_wide);
        ctx.set_binding(info.key(), updated);
        ctx.trace(|| SolveEvent::WideBoundSet {
            type_var: info.key(),
            bound: new_wide,
        });
        true
    }

    /// Covariant/invariant direction: observations move the narrow (lower)
    /// bound upward, widening into a union when necessary.
    fn update_narrow_bound(
        &mut self,
        ctx: &mut InferenceContext,
        info: &TypeVarInfo,
        binding: TypeVarBinding,
        cur_narrow: Option<TypeId>,
        cur_wide: Option<TypeId>,
        src: TypeId,
        mut diag: Option<&mut DiagnosticAddendum>,
        options: SolveOptions,
        recursion: u32,
    ) -> bool {
        let mut capped = false;
        let new_narrow = match cur_narrow {
            None => src,
            Some(n) if n == src => {
                // Re-confirmation. In an invariant context with no wide
                // bound yet, prefer the literal-stripped variant so exact
                // matching does not pin a literal forever.
                if options.is_invariant() && cur_wide.is_none() {
                    binding.narrow_bound_no_literals.unwrap_or(n)
                } else {
                    n
                }
            }
            Some(_) if is_gradual(src) && binding.tuple_types.is_some() => {
                // A tuple binding touched by Any becomes tuple[Any, ...];
                // the bound itself degrades to the gradual type.
                src
            }
            Some(n) => {
                let keeps = self.oracle.assign_type(
                    n,
                    src,
                    None,
                    Some(&mut *ctx),
                    None,
                    SolveOptions::covariant(),
                    recursion + 1,
                );
                if keeps {
                    // The existing bound still covers src. Prefer a
                    // fully-known equivalent over a partially-Unknown one
                    // when the two are mutually assignable.
                    if utils::contains_unknown(self.db, n)
                        && !utils::contains_unknown(self.db, src)
                        && self.oracle.is_assignable(src, n, recursion + 1)
                    {
                        src
                    } else {
                        n
                    }
                } else if utils::as_type_var(self.db, n)
                    .is_some_and(|nv| !ctx.is_in_scope(nv.scope))
                {
                    // The recorded bound is an out-of-context variable;
                    // replace it outright.
                    src
                } else {
                    // Widen. A locked store only validates.
                    if ctx.is_locked() {
                        if let Some(diag) = diag.as_deref_mut() {
                            diag.add_message(SolveMessage::LockedContext {
                                type_var: info.name,
                                src,
                            });
                        }
                        ctx.trace(|| SolveEvent::BindRejected {
                            type_var: info.key(),
                            src,
                        });
                        return false;
                    }
                    if self.oracle.is_assignable(src, n, recursion + 1) {
                        src
                    } else if info.is_variadic()
                        && let Some(widened) = widen_tuple_types(self.db, n, src)
                    {
                        widened
                    } else {
                        let count = utils::union_members(self.db, n).len()
                            + utils::union_members(self.db, src).len();
                        if count > MAX_NARROWED_UNION_SUBTYPES {
                            capped = true;
                            self.db.object_type()
                        } else {
                            self.db.union2(n, src)
                        }
                    }
                }
            }
        };

        // Narrow must stay under the wide bound. Un-pinned variables in
        // the wide bound are made concrete first so the check means
        // something.
        if let Some(w) = cur_wide {
            let w_concrete = make_top_level_type_vars_concrete(self.db, w, true);
            if !self
                .oracle
                .is_assignable(w_concrete, new_narrow, recursion + 1)
            {
                if let Some(diag) = diag.as_deref_mut() {
                    diag.add_message(SolveMessage::BoundConflict {
                        type_var: info.name,
                        existing: w,
                        offending: src,
                    });
                }
                ctx.trace(|| SolveEvent::BindRejected {
                    type_var: info.key(),
                    src,
                });
                return false;
            }
        }

        // Invariant exactness: the solved type must represent src
        // precisely, not a wider approximation.
        if options.is_invariant()
            && new_narrow != src
            && !self.oracle.is_assignable(src, new_narrow, recursion + 1)
        {
            if let Some(diag) = diag.as_deref_mut() {
                diag.add_message(SolveMessage::BoundConflict {
                    type_var: info.name,
                    existing: cur_narrow.unwrap_or(new_narrow),
                    offending: src,
                });
            }
            return false;
        }

        if !self.validate_declared_bound(ctx, info, new_narrow, diag, recursion) {
            return false;
        }

        if ctx.is_locked() {
            // Reaching here means nothing needed to change.
            return true;
        }

        // Once any widening happened, packed tuple elements lose their
        // known length.
        let mut tuple_types = binding.tuple_types.clone();
        if tuple_types.is_some() && cur_narrow != Some(new_narrow) {
            tuple_types = Some(vec![TupleElement {
                type_id: new_narrow,
                unbounded: true,
            }]);
        }

        let retain_literals = options.retain_literals || options.is_populating();
        let mut updated = TypeVarBinding {
            narrow_bound: Some(new_narrow),
            narrow_bound_no_literals: None,
            wide_bound: cur_wide,
            tuple_types,
        };
        if !retain_literals {
            let stripped = strip_literal_value(self.db, new_narrow);
            if stripped != new_narrow {
                let fits_wide = match cur_wide {
                    Some(w) => self.oracle.is_assignable(w, stripped, recursion + 1),
                    None => true,
                };
                if fits_wide {
                    updated.narrow_bound_no_literals = Some(stripped);
                }
            }
        }
        ctx.set_binding(info.key(), updated);
        if capped {
            let collapsed_to = new_narrow;
            ctx.trace(|| SolveEvent::UnionCapCollapse {
                type_var: info.key(),
                collapsed_to,
            });
        }
        ctx.trace(|| SolveEvent::NarrowBoundSet {
            type_var: info.key(),
            bound: new_narrow,
        });
        true
    }

    /// Check the resulting bound against the variable's declared upper
    /// bound (`TypeVar("T", bound=X)`).
    fn validate_declared_bound(
        &mut self,
        ctx: &mut InferenceContext,
        info: &TypeVarInfo,
        effective: TypeId,
        diag: Option<&mut DiagnosticAddendum>,
        recursion: u32,
    ) -> bool {
        let Some(bound) = info.bound else {
            return true;
        };
        if info.flags.contains(TypeVarFlags::EXEMPT_FROM_BOUND_CHECK) {
            return true;
        }
        let concrete = make_top_level_type_vars_concrete(self.db, effective, true);
        if is_gradual(concrete) {
            return true;
        }
        let ok = if info.flags.contains(TypeVarFlags::SYNTHESIZED_SELF) {
            // Self's bound mentions the same generics being solved here;
            // reuse the live context so they resolve consistently.
            self.oracle.assign_type(
                bound,
                concrete,
                None,
                Some(&mut *ctx),
                None,
                SolveOptions::covariant(),
                recursion + 1,
            )
        } else {
            let mut sub_ctx = InferenceContext::for_scope(info.scope);
            self.oracle.assign_type(
                bound,
                concrete,
                None,
                Some(&mut sub_ctx),
                None,
                SolveOptions::covariant(),
                recursion + 1,
            )
        };
        if ok {
            return true;
        }
        // Synthesized internals fail quietly; user-written variables get
        // the full explanation.
        if !info.flags.contains(TypeVarFlags::SYNTHESIZED)
            && let Some(diag) = diag
        {
            diag.add_message(SolveMessage::TypeBound {
                type_var: info.name,
                bound,
                solved: effective,
            });
        }
        false
    }
}
