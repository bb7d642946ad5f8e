//! Resolution for constrained type variables (`AnyStr` style).
//!
//! A TypeVar declared with an explicit value-constraint list does not
//! accumulate bounds; it resolves to exactly one of its constraints. Every
//! subtype of the source must agree on which one — constraint lists are
//! not unioned across unrelated branches.

use crate::context::{InferenceContext, TypeVarBinding};
use crate::db::TypeDatabase;
use crate::diagnostics::{DiagnosticAddendum, SolveMessage};
use crate::operations::{AssignabilityOracle, ConstraintSolver, SolveOptions};
use crate::tracer::SolveEvent;
use crate::types::{TypeId, TypeKey, TypeVarInfo};
use crate::utils::{self, is_gradual};
use crate::widening::strip_literal_value;
use smallvec::SmallVec;

impl<O: AssignabilityOracle + ?Sized> ConstraintSolver<'_, O> {
    pub(crate) fn bind_constrained(
        &mut self,
        ctx: &mut InferenceContext,
        info: &TypeVarInfo,
        src: TypeId,
        mut diag: Option<&mut DiagnosticAddendum>,
        options: SolveOptions,
        recursion: u32,
    ) -> bool {
        let constraints = self.db.type_list(info.constraints);

        if is_gradual(src) {
            return true;
        }

        // A type-variable source is carried through as-is when its own
        // constraints/bound fit inside this variable's constraint set.
        if let Some(src_info) = utils::as_type_var(self.db, src) {
            if src_info.key() == info.key() {
                return true;
            }
            if !self.type_var_fits_constraints(&src_info, &constraints, recursion) {
                if let Some(diag) = diag {
                    diag.add_message(SolveMessage::TypeConstrainedTypeVar {
                        type_var: info.name,
                        src,
                    });
                }
                return false;
            }
            let carried = if src_info.flags.contains(crate::types::TypeVarFlags::INSTANTIABLE) {
                let mut instance_form = src_info;
                instance_form.flags -= crate::types::TypeVarFlags::INSTANTIABLE;
                self.db.type_var(instance_form)
            } else {
                src
            };
            return self.commit_constrained(ctx, info, carried, false, diag, recursion);
        }

        // Map every subtype of src onto the narrowest accepting constraint.
        let members = utils::union_members(self.db, src);
        let mut agreed: Option<usize> = None;
        let mut any_matched = false;
        let mut all_matched = true;
        for &member in members.iter() {
            match self.narrowest_constraint(&constraints, member, recursion) {
                Some(index) => {
                    any_matched = true;
                    match agreed {
                        None => agreed = Some(index),
                        Some(prev) if prev != index => {
                            if options.is_contravariant() {
                                // One matching subtype suffices in
                                // contravariant mode; keep the first.
                                continue;
                            }
                            if let Some(diag) = diag {
                                diag.add_message(SolveMessage::BoundConflict {
                                    type_var: info.name,
                                    existing: constraints[prev],
                                    offending: member,
                                });
                            }
                            return false;
                        }
                        Some(_) => {}
                    }
                }
                None => all_matched = false,
            }
        }

        let selected = if all_matched && any_matched {
            agreed.map(|index| constraints[index])
        } else if options.is_contravariant() && any_matched {
            agreed.map(|index| constraints[index])
        } else {
            // Per-subtype matching failed; fall back to the whole union
            // against a single constraint.
            constraints
                .iter()
                .copied()
                .find(|&c| self.oracle.is_assignable(c, src, recursion + 1))
        };

        let Some(selected) = selected else {
            if let Some(diag) = diag {
                diag.add_message(SolveMessage::TypeConstrainedTypeVar {
                    type_var: info.name,
                    src,
                });
            }
            ctx.trace(|| SolveEvent::BindRejected {
                type_var: info.key(),
                src,
            });
            return false;
        };

        // A result drawn purely from literal constraints keeps its
        // literal value on commit.
        let from_literal = matches!(self.db.lookup(selected), Some(TypeKey::Literal(_)));
        self.commit_constrained(ctx, info, selected, from_literal, diag, recursion)
    }

    /// Scan constraints in declaration order; keep the first match, then
    /// any strictly narrower later match.
    fn narrowest_constraint(
        &mut self,
        constraints: &[TypeId],
        member: TypeId,
        recursion: u32,
    ) -> Option<usize> {
        // Literal members match their base class's constraint, so compare
        // the stripped form too.
        let stripped = strip_literal_value(self.db, member);
        let mut best: Option<usize> = None;
        for (index, &constraint) in constraints.iter().enumerate() {
            let accepts = self.oracle.is_assignable(constraint, member, recursion + 1)
                || self.oracle.is_assignable(constraint, stripped, recursion + 1);
            if !accepts {
                continue;
            }
            match best {
                None => best = Some(index),
                Some(prev) => {
                    let narrower = self
                        .oracle
                        .is_assignable(constraints[prev], constraint, recursion + 1)
                        && !self
                            .oracle
                            .is_assignable(constraint, constraints[prev], recursion + 1);
                    if narrower {
                        best = Some(index);
                    }
                }
            }
        }
        best
    }

    fn type_var_fits_constraints(
        &mut self,
        src_info: &TypeVarInfo,
        constraints: &[TypeId],
        recursion: u32,
    ) -> bool {
        if src_info.is_constrained() {
            let src_constraints = self.db.type_list(src_info.constraints);
            return src_constraints.iter().all(|&sc| {
                constraints
                    .iter()
                    .any(|&c| self.oracle.is_assignable(c, sc, recursion + 1))
            });
        }
        if let Some(bound) = src_info.bound {
            return constraints
                .iter()
                .any(|&c| self.oracle.is_assignable(c, bound, recursion + 1));
        }
        false
    }

    /// Reconcile the selected constraint with any prior binding, then
    /// record it.
    fn commit_constrained(
        &mut self,
        ctx: &mut InferenceContext,
        info: &TypeVarInfo,
        selected: TypeId,
        retain_literals: bool,
        diag: Option<&mut DiagnosticAddendum>,
        recursion: u32,
    ) -> bool {
        let prior = ctx.binding(info.key()).and_then(|b| b.narrow_bound);
        let resolved = match prior {
            None => selected,
            Some(p) if p == selected => p,
            Some(p) => {
                // Accept whichever of the two subsumes the other.
                if self.oracle.is_assignable(p, selected, recursion + 1) {
                    p
                } else if self.oracle.is_assignable(selected, p, recursion + 1) {
                    selected
                } else {
                    if let Some(diag) = diag {
                        diag.add_message(SolveMessage::BoundConflict {
                            type_var: info.name,
                            existing: p,
                            offending: selected,
                        });
                    }
                    ctx.trace(|| SolveEvent::BindRejected {
                        type_var: info.key(),
                        src: selected,
                    });
                    return false;
                }
            }
        };

        if ctx.is_locked() {
            return prior == Some(resolved);
        }
        if prior == Some(resolved) {
            return true;
        }

        let mut binding = TypeVarBinding {
            narrow_bound: Some(resolved),
            narrow_bound_no_literals: None,
            wide_bound: None,
            tuple_types: None,
        };
        if !retain_literals {
            let stripped = strip_literal_value(self.db, resolved);
            if stripped != resolved {
                binding.narrow_bound_no_literals = Some(stripped);
            }
        }
        ctx.set_binding(info.key(), binding);
        ctx.trace(|| SolveEvent::NarrowBoundSet {
            type_var: info.key(),
            bound: resolved,
        });
        true
    }
}
