//! ParamSpec matching.
//!
//! A ParamSpec captures an entire callable parameter list rather than a
//! value type. Matching runs once per signature context — several may be
//! live during overload resolution — and the overall result is the AND of
//! the per-context outcomes.

use crate::context::{InferenceContext, TypeVarBinding};
use crate::db::TypeDatabase;
use crate::diagnostics::{DiagnosticAddendum, SolveMessage};
use crate::operations::{AssignabilityOracle, ConstraintSolver};
use crate::tracer::SolveEvent;
use crate::types::{CallableShape, ParamList, TypeId, TypeKey, TypeVarInfo};
use crate::utils::{self, is_gradual};

/// How a new signature compares to the one already captured.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SignatureOrder {
    Narrower,
    Wider,
    Equal,
    Incomparable,
}

impl<O: AssignabilityOracle + ?Sized> ConstraintSolver<'_, O> {
    pub(crate) fn bind_param_spec(
        &mut self,
        ctx: &mut InferenceContext,
        info: &TypeVarInfo,
        src: TypeId,
        mut diag: Option<&mut DiagnosticAddendum>,
        recursion: u32,
    ) -> bool {
        let mut all_ok = true;
        for index in 0..ctx.signature_context_count() {
            let ok =
                self.bind_param_spec_in(ctx, index, info, src, diag.as_deref_mut(), recursion);
            all_ok &= ok;
        }
        if !all_ok {
            ctx.trace(|| SolveEvent::BindRejected {
                type_var: info.key(),
                src,
            });
        }
        all_ok
    }

    fn bind_param_spec_in(
        &mut self,
        ctx: &mut InferenceContext,
        index: usize,
        info: &TypeVarInfo,
        src: TypeId,
        diag: Option<&mut DiagnosticAddendum>,
        recursion: u32,
    ) -> bool {
        // Gradual sources are always accepted without recording.
        if is_gradual(src) {
            return true;
        }

        let existing = ctx
            .binding_in(index, info.key())
            .and_then(|b| b.narrow_bound);

        // Source is itself a ParamSpec.
        if let Some(src_info) = utils::as_type_var(self.db, src)
            && src_info.is_param_spec()
        {
            match existing {
                Some(bound) => {
                    // Already captured: succeed iff it names the same
                    // ParamSpec, unwrapping a `(*args, **kwargs)` capture.
                    if self
                        .captured_param_spec(bound)
                        .is_some_and(|captured| captured.key() == src_info.key())
                    {
                        return true;
                    }
                    if let Some(diag) = diag {
                        diag.add_message(SolveMessage::ParamSpecMismatch {
                            type_var: info.name,
                            src,
                        });
                    }
                    return false;
                }
                None => {
                    if !ctx.is_locked() {
                        ctx.set_binding_in(
                            index,
                            info.key(),
                            TypeVarBinding {
                                narrow_bound: Some(src),
                                ..TypeVarBinding::default()
                            },
                        );
                        ctx.trace(|| SolveEvent::NarrowBoundSet {
                            type_var: info.key(),
                            bound: src,
                        });
                    }
                    return true;
                }
            }
        }

        // Source is a concrete callable signature.
        if let Some(TypeKey::Callable(shape_id)) = self.db.lookup(src) {
            let Some(shape) = self.db.callable_shape(shape_id) else {
                return false;
            };
            let Some(existing) = existing else {
                if !ctx.is_locked() {
                    ctx.set_binding_in(
                        index,
                        info.key(),
                        TypeVarBinding {
                            narrow_bound: Some(src),
                            ..TypeVarBinding::default()
                        },
                    );
                    ctx.trace(|| SolveEvent::NarrowBoundSet {
                        type_var: info.key(),
                        bound: src,
                    });
                }
                return true;
            };
            let Some(TypeKey::Callable(existing_id)) = self.db.lookup(existing) else {
                // Captured a ParamSpec earlier; a concrete signature
                // cannot also match it.
                if let Some(diag) = diag {
                    diag.add_message(SolveMessage::ParamSpecMismatch {
                        type_var: info.name,
                        src,
                    });
                }
                return false;
            };
            let Some(existing_shape) = self.db.callable_shape(existing_id) else {
                return false;
            };

            match self.compare_signatures(&existing_shape, &shape, recursion) {
                SignatureOrder::Equal => {
                    // Effectively the same; prefer whichever is not the
                    // fully-gradual `(...)` form.
                    if existing_shape.is_gradual() && !shape.is_gradual() && !ctx.is_locked() {
                        ctx.set_binding_in(
                            index,
                            info.key(),
                            TypeVarBinding {
                                narrow_bound: Some(src),
                                ..TypeVarBinding::default()
                            },
                        );
                    }
                    return true;
                }
                SignatureOrder::Wider => {
                    if !ctx.is_locked() {
                        ctx.set_binding_in(
                            index,
                            info.key(),
                            TypeVarBinding {
                                narrow_bound: Some(src),
                                ..TypeVarBinding::default()
                            },
                        );
                        ctx.trace(|| SolveEvent::NarrowBoundSet {
                            type_var: info.key(),
                            bound: src,
                        });
                    }
                    return true;
                }
                SignatureOrder::Narrower => return true,
                SignatureOrder::Incomparable => {
                    if let Some(diag) = diag {
                        diag.add_message(SolveMessage::ParamSpecMismatch {
                            type_var: info.name,
                            src,
                        });
                    }
                    return false;
                }
            }
        }

        if let Some(diag) = diag {
            diag.add_message(SolveMessage::ParamSpecMismatch {
                type_var: info.name,
                src,
            });
        }
        false
    }

    /// The ParamSpec a recorded binding names, looking through a
    /// `(*args: P.args, **kwargs: P.kwargs)` wrapper signature.
    fn captured_param_spec(&self, bound: TypeId) -> Option<TypeVarInfo> {
        match self.db.lookup(bound)? {
            TypeKey::TypeVar(info) if info.is_param_spec() => Some(info),
            TypeKey::Callable(shape_id) => {
                let shape = self.db.callable_shape(shape_id)?;
                match &shape.params {
                    ParamList::Params { params, param_spec } if params.is_empty() => *param_spec,
                    _ => None,
                }
            }
            _ => None,
        }
    }

    /// Compare two signatures in both directions, ignoring return types.
    fn compare_signatures(
        &mut self,
        existing: &CallableShape,
        new: &CallableShape,
        recursion: u32,
    ) -> SignatureOrder {
        // Normalize the return type away so only parameter lists matter.
        let existing_id = self.db.callable(CallableShape {
            params: existing.params.clone(),
            ret: TypeId::UNKNOWN,
        });
        let new_id = self.db.callable(CallableShape {
            params: new.params.clone(),
            ret: TypeId::UNKNOWN,
        });
        // Callable assignability is contravariant in parameters, so "new
        // usable where existing is expected" means new accepts at least as
        // much.
        let new_wider = self.oracle.is_assignable(existing_id, new_id, recursion + 1);
        let new_narrower = self.oracle.is_assignable(new_id, existing_id, recursion + 1);
        match (new_wider, new_narrower) {
            (true, true) => SignatureOrder::Equal,
            (true, false) => SignatureOrder::Wider,
            (false, true) => SignatureOrder::Narrower,
            // Neither direction holds as a call-compatibility relation; a
            // signature that extends the other with additional parameters
            // still captures strictly more, so order by prefix extension.
            (false, false) => self.compare_by_prefix(existing, new, recursion),
        }
    }

    fn compare_by_prefix(
        &mut self,
        existing: &CallableShape,
        new: &CallableShape,
        recursion: u32,
    ) -> SignatureOrder {
        let (
            ParamList::Params {
                params: existing_params,
                param_spec: existing_spec,
            },
            ParamList::Params {
                params: new_params,
                param_spec: new_spec,
            },
        ) = (&existing.params, &new.params)
        else {
            return SignatureOrder::Incomparable;
        };
        if existing_spec.is_some() || new_spec.is_some() {
            return SignatureOrder::Incomparable;
        }
        let shared = existing_params.len().min(new_params.len());
        let prefix_matches = existing_params[..shared]
            .iter()
            .zip(&new_params[..shared])
            .all(|(e, n)| {
                e.kind == n.kind
                    && self.oracle.is_assignable(e.ty, n.ty, recursion + 1)
                    && self.oracle.is_assignable(n.ty, e.ty, recursion + 1)
            });
        if !prefix_matches {
            return SignatureOrder::Incomparable;
        }
        if new_params.len() > existing_params.len() {
            SignatureOrder::Wider
        } else {
            SignatureOrder::Narrower
        }
    }
}

#[cfg(test)]
#[path = "../tests/param_spec_tests.rs"]
mod param_spec_tests;
