//! Reference assignability oracle.
//!
//! A structural/nominal checker sufficient to exercise the solver: unions,
//! literals, nominal walks over specialized bases, tuples, callables,
//! instantiable forms, and the gradual types. Type variables met on the
//! way re-enter [`ConstraintSolver::bind_type_var`] when a context was
//! supplied, which is how the solver and the oracle recurse into each
//! other.
//!
//! Production embedders replace this wholesale through the
//! [`AssignabilityOracle`] trait; nothing in the solver depends on this
//! implementation specifically.

use crate::context::InferenceContext;
use crate::db::TypeDatabase;
use crate::diagnostics::{DiagnosticAddendum, SolveMessage};
use crate::instantiate::{
    TypeSubstitution, fill_unspecified_args, instantiate_type, make_top_level_type_vars_concrete,
};
use crate::limits::MAX_TYPE_RELATION_DEPTH;
use crate::operations::{AssignabilityOracle, ConstraintSolver, SolveMode, SolveOptions};
use crate::types::{
    CallableShape, ClassType, ParamList, TupleElement, TypeId, TypeKey, Variance,
};
use crate::utils::{self, is_gradual};
use rustc_hash::FxHashSet;

/// The in-repo oracle implementation.
pub struct SubtypeChecker<'a> {
    db: &'a dyn TypeDatabase,
    /// Pairs currently being related; re-entering one is treated as
    /// success (coinductive handling of recursive types).
    in_progress: FxHashSet<(TypeId, TypeId)>,
}

impl<'a> SubtypeChecker<'a> {
    pub fn new(db: &'a dyn TypeDatabase) -> Self {
        SubtypeChecker {
            db,
            in_progress: FxHashSet::default(),
        }
    }

    fn check(
        &mut self,
        dest: TypeId,
        src: TypeId,
        mut diag: Option<&mut DiagnosticAddendum>,
        mut dest_ctx: Option<&mut InferenceContext>,
        mut src_ctx: Option<&mut InferenceContext>,
        options: SolveOptions,
        recursion: u32,
    ) -> bool {
        if recursion > MAX_TYPE_RELATION_DEPTH {
            // Past the ceiling: assume compatible and stop, matching the
            // surrounding evaluator's degrade-to-Unknown policy.
            return true;
        }
        if dest == src {
            return true;
        }

        // Type variable hooks: these re-enter the solver rather than
        // comparing structurally.
        if !options.skip_solve_type_vars {
            if utils::as_type_var(self.db, dest).is_some() {
                if let Some(ctx) = dest_ctx.as_deref_mut() {
                    let db = self.db;
                    return ConstraintSolver::new(db, self).bind_type_var(
                        ctx,
                        dest,
                        src,
                        diag,
                        options,
                        recursion + 1,
                    );
                }
                let concrete = make_top_level_type_vars_concrete(self.db, dest, true);
                if concrete == dest {
                    return false;
                }
                return self.check(concrete, src, diag, None, src_ctx, options, recursion + 1);
            }
            if utils::as_type_var(self.db, src).is_some() {
                if options.is_contravariant()
                    && let Some(ctx) = src_ctx.as_deref_mut()
                {
                    // Reverse matching solves source-side variables.
                    let db = self.db;
                    return ConstraintSolver::new(db, self).bind_type_var(
                        ctx,
                        src,
                        dest,
                        diag,
                        options,
                        recursion + 1,
                    );
                }
                let concrete = make_top_level_type_vars_concrete(self.db, src, true);
                if concrete == src {
                    return false;
                }
                return self.check(dest, concrete, diag, dest_ctx, None, options, recursion + 1);
            }
        }

        if is_gradual(dest) || is_gradual(src) {
            return true;
        }
        if src == TypeId::NEVER {
            return !options.is_invariant();
        }

        // Invariant structural matching is covariant matching in both
        // directions.
        if options.is_invariant() {
            let covariant = SolveOptions {
                mode: SolveMode::Covariant,
                ..options
            };
            return self.check(
                dest,
                src,
                diag.as_deref_mut(),
                dest_ctx,
                src_ctx,
                covariant,
                recursion + 1,
            ) && self.check(src, dest, None, None, None, covariant, recursion + 1);
        }

        if !self.in_progress.insert((dest, src)) {
            return true;
        }
        let result = self.check_structural(
            dest,
            src,
            diag.as_deref_mut(),
            dest_ctx,
            src_ctx,
            options,
            recursion,
        );
        self.in_progress.remove(&(dest, src));

        if !result && let Some(diag) = diag {
            diag.add_message(SolveMessage::TypeAssignmentMismatch { dest, src });
        }
        result
    }

    fn check_structural(
        &mut self,
        dest: TypeId,
        src: TypeId,
        mut diag: Option<&mut DiagnosticAddendum>,
        mut dest_ctx: Option<&mut InferenceContext>,
        mut src_ctx: Option<&mut InferenceContext>,
        options: SolveOptions,
        recursion: u32,
    ) -> bool {
        let Some(dest_key) = self.db.lookup(dest) else {
            return false;
        };
        let Some(src_key) = self.db.lookup(src) else {
            return false;
        };

        // object accepts everything, None included.
        if dest == self.db.object_type() {
            return true;
        }

        // Union source: every member must fit the destination.
        if let TypeKey::Union(list) = src_key {
            let members = self.db.type_list(list);
            return members.iter().all(|&member| {
                self.check(
                    dest,
                    member,
                    None,
                    dest_ctx.as_deref_mut(),
                    src_ctx.as_deref_mut(),
                    options,
                    recursion + 1,
                )
            });
        }
        // Union destination: any member will do.
        if let TypeKey::Union(list) = dest_key {
            let members = self.db.type_list(list);
            return members.iter().any(|&member| {
                self.check(
                    member,
                    src,
                    None,
                    dest_ctx.as_deref_mut(),
                    src_ctx.as_deref_mut(),
                    options,
                    recursion + 1,
                )
            });
        }

        match (dest_key, src_key) {
            // None is the NoneType singleton's instance.
            (TypeKey::Instance(ct), TypeKey::Intrinsic(crate::types::IntrinsicKind::None)) => {
                ct.class == self.db.builtins().none_type
            }
            (TypeKey::Intrinsic(crate::types::IntrinsicKind::None), TypeKey::Instance(ct)) => {
                ct.class == self.db.builtins().none_type
            }

            (_, TypeKey::Literal(value)) => {
                // A literal behaves as an instance of its runtime class.
                let base = utils::literal_base_type(self.db, value);
                self.check(dest, base, diag, dest_ctx, src_ctx, options, recursion + 1)
            }
            (TypeKey::Literal(_), _) => false,

            (TypeKey::Instance(dest_ct), TypeKey::Instance(src_ct)) => self.check_instances(
                dest_ct, src_ct, diag, dest_ctx, src_ctx, options, recursion,
            ),

            (TypeKey::Instantiable(dest_ct), TypeKey::Instantiable(src_ct)) => {
                // type[B] fits type[A] when B's instances fit A's.
                let dest_inst = self.db.intern(TypeKey::Instance(dest_ct));
                let src_inst = self.db.intern(TypeKey::Instance(src_ct));
                self.check(
                    dest_inst, src_inst, diag, dest_ctx, src_ctx, options, recursion + 1,
                )
            }
            (TypeKey::Instance(dest_ct), TypeKey::Instantiable(src_ct)) => {
                // A class object fits `type[X]` when its instance fits X.
                if dest_ct.class != self.db.builtins().type_ {
                    return false;
                }
                let Some(args) = dest_ct.args else {
                    return true;
                };
                let args = self.db.type_list(args);
                let Some(&type_arg) = args.first() else {
                    return true;
                };
                let src_inst = self.db.intern(TypeKey::Instance(src_ct));
                self.check(
                    type_arg, src_inst, diag, dest_ctx, src_ctx, options, recursion + 1,
                )
            }

            (TypeKey::Tuple(dest_list), TypeKey::Tuple(src_list))
            | (TypeKey::UnpackedTuple(dest_list), TypeKey::UnpackedTuple(src_list)) => self
                .check_tuples(
                    dest_list, src_list, dest_ctx, src_ctx, options, recursion,
                ),

            (TypeKey::Instance(dest_ct), TypeKey::Tuple(src_list)) => {
                // A tuple value is an instance of tuple[union-of-elements].
                let elements = self.db.tuple_list(src_list);
                let element_union = self
                    .db
                    .union(elements.iter().map(|e| e.type_id).collect());
                let as_instance = self
                    .db
                    .instance(self.db.builtins().tuple, vec![element_union]);
                let reinterpreted = self.db.intern(TypeKey::Instance(dest_ct));
                self.check(
                    reinterpreted,
                    as_instance,
                    diag,
                    dest_ctx,
                    src_ctx,
                    options,
                    recursion + 1,
                )
            }

            (TypeKey::Callable(dest_id), TypeKey::Callable(src_id)) => {
                let (Some(dest_shape), Some(src_shape)) = (
                    self.db.callable_shape(dest_id),
                    self.db.callable_shape(src_id),
                ) else {
                    return false;
                };
                self.check_callables(
                    &dest_shape,
                    &src_shape,
                    diag.as_deref_mut(),
                    dest_ctx,
                    src_ctx,
                    options,
                    recursion,
                )
            }

            _ => false,
        }
    }

    fn check_instances(
        &mut self,
        dest_ct: ClassType,
        src_ct: ClassType,
        mut diag: Option<&mut DiagnosticAddendum>,
        mut dest_ctx: Option<&mut InferenceContext>,
        mut src_ctx: Option<&mut InferenceContext>,
        options: SolveOptions,
        recursion: u32,
    ) -> bool {
        if utils::derives_from_any(self.db, src_ct.class) {
            return true;
        }

        if dest_ct.class == src_ct.class {
            let (Some(dest_args), Some(src_args)) = (dest_ct.args, src_ct.args) else {
                // An unspecialized side matches any specialization.
                return true;
            };
            let Some(def) = self.db.class_def(dest_ct.class) else {
                return false;
            };
            let dest_args = self.db.type_list(dest_args);
            let src_args = self.db.type_list(src_args);
            for (index, param) in def.type_params.iter().enumerate() {
                let (Some(&d_arg), Some(&s_arg)) = (dest_args.get(index), src_args.get(index))
                else {
                    continue;
                };
                let ok = match param.variance {
                    Variance::Covariant => self.check(
                        d_arg,
                        s_arg,
                        None,
                        dest_ctx.as_deref_mut(),
                        src_ctx.as_deref_mut(),
                        SolveOptions {
                            mode: SolveMode::Covariant,
                            ..options
                        },
                        recursion + 1,
                    ),
                    Variance::Contravariant => self.check(
                        s_arg,
                        d_arg,
                        None,
                        None,
                        dest_ctx.as_deref_mut(),
                        SolveOptions {
                            mode: SolveMode::Contravariant,
                            ..options
                        },
                        recursion + 1,
                    ),
                    Variance::Invariant => self.check(
                        d_arg,
                        s_arg,
                        None,
                        dest_ctx.as_deref_mut(),
                        src_ctx.as_deref_mut(),
                        SolveOptions {
                            mode: SolveMode::Invariant,
                            ..options
                        },
                        recursion + 1,
                    ),
                };
                if !ok {
                    if let Some(diag) = diag {
                        diag.add_message(SolveMessage::TypeAssignmentMismatch {
                            dest: d_arg,
                            src: s_arg,
                        });
                    }
                    return false;
                }
            }
            return true;
        }

        // Nominal walk: specialize each of src's bases with src's
        // arguments and retry against the destination.
        let Some(src_def) = self.db.class_def(src_ct.class) else {
            return false;
        };
        let src_instance = fill_unspecified_args(
            self.db,
            self.db.intern(TypeKey::Instance(src_ct)),
        );
        let src_args: Vec<TypeId> = match self.db.lookup(src_instance) {
            Some(TypeKey::Instance(ct)) => match ct.args {
                Some(args) => self.db.type_list(args).to_vec(),
                None => Vec::new(),
            },
            _ => Vec::new(),
        };
        let subst = TypeSubstitution::from_args(&src_def.type_params, &src_args);
        let dest = self.db.intern(TypeKey::Instance(dest_ct));
        for &base in &src_def.bases {
            let specialized = instantiate_type(self.db, base, &subst, 0);
            if self.check(
                dest,
                specialized,
                None,
                dest_ctx.as_deref_mut(),
                src_ctx.as_deref_mut(),
                options,
                recursion + 1,
            ) {
                return true;
            }
        }
        false
    }

    fn check_tuples(
        &mut self,
        dest_list: crate::types::TupleListId,
        src_list: crate::types::TupleListId,
        mut dest_ctx: Option<&mut InferenceContext>,
        mut src_ctx: Option<&mut InferenceContext>,
        options: SolveOptions,
        recursion: u32,
    ) -> bool {
        let dest_elements = self.db.tuple_list(dest_list);
        let src_elements = self.db.tuple_list(src_list);

        // tuple[X, ...] absorbs any tuple whose elements all fit X.
        if let [TupleElement {
            type_id: element,
            unbounded: true,
        }] = dest_elements.as_ref()
        {
            let element = *element;
            return src_elements.iter().all(|src_element| {
                self.check(
                    element,
                    src_element.type_id,
                    None,
                    dest_ctx.as_deref_mut(),
                    src_ctx.as_deref_mut(),
                    options,
                    recursion + 1,
                )
            });
        }

        if dest_elements.len() != src_elements.len() {
            return false;
        }
        dest_elements
            .iter()
            .zip(src_elements.iter())
            .all(|(d, s)| {
                d.unbounded == s.unbounded
                    && self.check(
                        d.type_id,
                        s.type_id,
                        None,
                        dest_ctx.as_deref_mut(),
                        src_ctx.as_deref_mut(),
                        options,
                        recursion + 1,
                    )
            })
    }

    fn check_callables(
        &mut self,
        dest_shape: &CallableShape,
        src_shape: &CallableShape,
        diag: Option<&mut DiagnosticAddendum>,
        mut dest_ctx: Option<&mut InferenceContext>,
        mut src_ctx: Option<&mut InferenceContext>,
        options: SolveOptions,
        recursion: u32,
    ) -> bool {
        let params_ok = match (&dest_shape.params, &src_shape.params) {
            // A gradual parameter list is compatible in both directions.
            (ParamList::Gradual, _) | (_, ParamList::Gradual) => true,
            (
                ParamList::Params {
                    params: dest_params,
                    param_spec: dest_spec,
                },
                ParamList::Params {
                    params: src_params,
                    param_spec: src_spec,
                },
            ) => {
                if src_params.len() < dest_params.len() {
                    false
                } else {
                    // Parameters compare contravariantly.
                    let prefix_ok = dest_params.iter().zip(src_params.iter()).all(|(d, s)| {
                        self.check(
                            s.ty,
                            d.ty,
                            None,
                            None,
                            dest_ctx.as_deref_mut(),
                            SolveOptions {
                                mode: SolveMode::Contravariant,
                                ..options
                            },
                            recursion + 1,
                        )
                    });
                    if !prefix_ok {
                        false
                    } else if let Some(spec) = dest_spec {
                        // The destination's trailing ParamSpec captures
                        // whatever the source has left over.
                        let remainder = CallableShape {
                            params: ParamList::Params {
                                params: src_params[dest_params.len()..].to_vec(),
                                param_spec: *src_spec,
                            },
                            ret: TypeId::UNKNOWN,
                        };
                        let remainder_id = self.db.callable(remainder);
                        let spec_id = self.db.type_var(*spec);
                        match dest_ctx.as_deref_mut() {
                            Some(ctx) => {
                                let db = self.db;
                                ConstraintSolver::new(db, self).bind_type_var(
                                    ctx,
                                    spec_id,
                                    remainder_id,
                                    None,
                                    SolveOptions {
                                        mode: SolveMode::Covariant,
                                        ..options
                                    },
                                    recursion + 1,
                                )
                            }
                            None => true,
                        }
                    } else {
                        src_params.len() == dest_params.len() && src_spec.is_none()
                    }
                }
            }
        };
        if !params_ok {
            return false;
        }
        // Return types compare covariantly.
        self.check(
            dest_shape.ret,
            src_shape.ret,
            diag,
            dest_ctx,
            src_ctx,
            options,
            recursion + 1,
        )
    }
}

impl AssignabilityOracle for SubtypeChecker<'_> {
    fn assign_type(
        &mut self,
        dest: TypeId,
        src: TypeId,
        diag: Option<&mut DiagnosticAddendum>,
        dest_ctx: Option<&mut InferenceContext>,
        src_ctx: Option<&mut InferenceContext>,
        options: SolveOptions,
        recursion: u32,
    ) -> bool {
        stacker::maybe_grow(64 * 1024, 1024 * 1024, || {
            self.check(dest, src, diag, dest_ctx, src_ctx, options, recursion)
        })
    }
}

#[cfg(test)]
#[path = "../tests/relate_tests.rs"]
mod relate_tests;
