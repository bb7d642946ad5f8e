//! Type instantiation: substituting solved types for type variables.
//!
//! `instantiate_type` rebuilds a type tree with a [`TypeSubstitution`]
//! applied; `apply_solved_type_vars` is the lifecycle exit point that copies
//! an [`InferenceContext`]'s solution out into a concrete type. Depth is an
//! explicit parameter: exceeding [`MAX_INSTANTIATION_DEPTH`] returns the
//! input unchanged rather than chasing a self-referential generic forever.

use crate::context::InferenceContext;
use crate::db::TypeDatabase;
use crate::limits::MAX_INSTANTIATION_DEPTH;
use crate::types::{
    CallableShape, Param, ParamList, ScopeId, TupleElement, TypeId, TypeKey, TypeVarFlags,
    TypeVarKey, TypeVarKind,
};
use rustc_hash::FxHashMap;

/// A mapping from type variable identity to replacement type.
#[derive(Clone, Debug, Default)]
pub struct TypeSubstitution {
    map: FxHashMap<TypeVarKey, TypeId>,
}

impl TypeSubstitution {
    pub fn new() -> Self {
        TypeSubstitution::default()
    }

    /// Pair up a class's type parameters with explicit type arguments.
    /// Extra parameters are left unmapped; extra arguments are ignored.
    pub fn from_args(
        params: &[crate::types::TypeVarInfo],
        args: &[TypeId],
    ) -> TypeSubstitution {
        let mut subst = TypeSubstitution::new();
        for (param, &arg) in params.iter().zip(args.iter()) {
            subst.insert(param.key(), arg);
        }
        subst
    }

    pub fn insert(&mut self, key: TypeVarKey, ty: TypeId) {
        self.map.insert(key, ty);
    }

    pub fn get(&self, key: TypeVarKey) -> Option<TypeId> {
        self.map.get(&key).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }
}

/// Rebuild `ty` with `subst` applied to every type variable occurrence.
pub fn instantiate_type(
    db: &dyn TypeDatabase,
    ty: TypeId,
    subst: &TypeSubstitution,
    depth: u32,
) -> TypeId {
    if subst.is_empty() || depth > MAX_INSTANTIATION_DEPTH {
        return ty;
    }
    stacker::maybe_grow(64 * 1024, 1024 * 1024, || {
        instantiate_inner(db, ty, subst, depth)
    })
}

fn instantiate_inner(
    db: &dyn TypeDatabase,
    ty: TypeId,
    subst: &TypeSubstitution,
    depth: u32,
) -> TypeId {
    let Some(key) = db.lookup(ty) else {
        return ty;
    };
    match key {
        TypeKey::Intrinsic(_) | TypeKey::Literal(_) => ty,
        TypeKey::TypeVar(info) => match subst.get(info.key()) {
            Some(mapped) => mapped,
            None => ty,
        },
        TypeKey::Instance(ct) | TypeKey::Instantiable(ct) => {
            let Some(args) = ct.args else {
                return ty;
            };
            let arg_list = db.type_list(args);
            let mut changed = false;
            let mut new_args = Vec::with_capacity(arg_list.len());
            for &arg in arg_list.iter() {
                let mapped = instantiate_type(db, arg, subst, depth + 1);
                changed |= mapped != arg;
                new_args.push(mapped);
            }
            if !changed {
                return ty;
            }
            match key {
                TypeKey::Instance(_) => db.instance(ct.class, new_args),
                _ => db.instantiable(ct.class, new_args),
            }
        }
        TypeKey::Union(list) => {
            let members = db.type_list(list);
            let mut changed = false;
            let mut new_members = Vec::with_capacity(members.len());
            for &member in members.iter() {
                let mapped = instantiate_type(db, member, subst, depth + 1);
                changed |= mapped != member;
                new_members.push(mapped);
            }
            if changed { db.union(new_members) } else { ty }
        }
        TypeKey::Tuple(list) | TypeKey::UnpackedTuple(list) => {
            let elements = db.tuple_list(list);
            let mut changed = false;
            let mut new_elements = Vec::with_capacity(elements.len());
            for element in elements.iter() {
                let mapped = instantiate_type(db, element.type_id, subst, depth + 1);
                changed |= mapped != element.type_id;
                new_elements.push(TupleElement {
                    type_id: mapped,
                    unbounded: element.unbounded,
                });
            }
            if !changed {
                return ty;
            }
            match key {
                TypeKey::Tuple(_) => db.tuple(new_elements),
                _ => db.unpacked_tuple(new_elements),
            }
        }
        TypeKey::Callable(shape_id) => {
            let Some(shape) = db.callable_shape(shape_id) else {
                return ty;
            };
            let ret = instantiate_type(db, shape.ret, subst, depth + 1);
            let (params, params_changed) = match &shape.params {
                ParamList::Gradual => (ParamList::Gradual, false),
                ParamList::Params { params, param_spec } => {
                    let mut changed = false;
                    let mut new_params: Vec<Param> = Vec::with_capacity(params.len());
                    for p in params {
                        let mapped = instantiate_type(db, p.ty, subst, depth + 1);
                        changed |= mapped != p.ty;
                        new_params.push(Param { ty: mapped, ..*p });
                    }
                    // A ParamSpec solved to a callable splices that
                    // callable's parameters onto the fixed prefix
                    // (Concatenate semantics).
                    let mut new_spec = *param_spec;
                    if let Some(spec) = param_spec
                        && let Some(mapped) = subst.get(spec.key())
                    {
                        changed = true;
                        new_spec = None;
                        match db.lookup(mapped) {
                            Some(TypeKey::Callable(inner_id)) => {
                                match db.callable_shape(inner_id).as_deref() {
                                    Some(CallableShape {
                                        params: ParamList::Params { params, param_spec },
                                        ..
                                    }) => {
                                        new_params.extend(params.iter().copied());
                                        new_spec = *param_spec;
                                    }
                                    // A gradual captured signature erases
                                    // the whole parameter list.
                                    _ => {
                                        return db.callable(CallableShape::gradual(ret));
                                    }
                                }
                            }
                            Some(TypeKey::TypeVar(inner)) if inner.is_param_spec() => {
                                new_spec = Some(inner);
                            }
                            _ => {
                                return db.callable(CallableShape::gradual(ret));
                            }
                        }
                    }
                    (
                        ParamList::Params {
                            params: new_params,
                            param_spec: new_spec,
                        },
                        changed,
                    )
                }
            };
            if !params_changed && ret == shape.ret {
                return ty;
            }
            db.callable(CallableShape { params, ret })
        }
    }
}

/// Fill missing type arguments of under-specialized classes with `Unknown`
/// (`list` becomes `list[Unknown]`).
pub fn fill_unspecified_args(db: &dyn TypeDatabase, ty: TypeId) -> TypeId {
    let (ct, instantiable) = match db.lookup(ty) {
        Some(TypeKey::Instance(ct)) => (ct, false),
        Some(TypeKey::Instantiable(ct)) => (ct, true),
        _ => return ty,
    };
    if ct.args.is_some() {
        return ty;
    }
    let Some(def) = db.class_def(ct.class) else {
        return ty;
    };
    let args = vec![TypeId::UNKNOWN; def.type_params.len()];
    if instantiable {
        db.instantiable(ct.class, args)
    } else {
        db.instance(ct.class, args)
    }
}

/// Replace top-level type variables with their declared upper bound, or
/// `Unknown` when they have none.
///
/// When `make_param_specs_concrete` is set, a top-level ParamSpec becomes
/// the fully-gradual callable `(...) -> Unknown`; otherwise it is left
/// alone (some callers must preserve it for capture).
pub fn make_top_level_type_vars_concrete(
    db: &dyn TypeDatabase,
    ty: TypeId,
    make_param_specs_concrete: bool,
) -> TypeId {
    match db.lookup(ty) {
        Some(TypeKey::TypeVar(info)) => match info.kind {
            TypeVarKind::ParamSpec => {
                if make_param_specs_concrete {
                    db.callable(CallableShape::gradual(TypeId::UNKNOWN))
                } else {
                    ty
                }
            }
            _ => info.bound.unwrap_or(TypeId::UNKNOWN),
        },
        Some(TypeKey::Union(list)) => {
            let members = db.type_list(list);
            let mut changed = false;
            let mut concrete = Vec::with_capacity(members.len());
            for &member in members.iter() {
                let mapped =
                    make_top_level_type_vars_concrete(db, member, make_param_specs_concrete);
                changed |= mapped != member;
                concrete.push(mapped);
            }
            if changed { db.union(concrete) } else { ty }
        }
        _ => ty,
    }
}

/// Re-key live type variables as in-scope placeholders.
///
/// Used by the expected-type back-solver: type arguments copied out of an
/// expected type may mention type variables that are still being solved in
/// an enclosing context (`live_scopes`). Those occurrences are marked as
/// placeholders so a later self-assignment unifies instead of failing.
pub fn transform_live_type_vars(
    db: &dyn TypeDatabase,
    ty: TypeId,
    live_scopes: &[ScopeId],
) -> TypeId {
    let mut subst = TypeSubstitution::new();
    collect_live_placeholders(db, ty, live_scopes, &mut subst, 0);
    instantiate_type(db, ty, &subst, 0)
}

fn collect_live_placeholders(
    db: &dyn TypeDatabase,
    ty: TypeId,
    live_scopes: &[ScopeId],
    subst: &mut TypeSubstitution,
    depth: u32,
) {
    if depth > MAX_INSTANTIATION_DEPTH {
        return;
    }
    let Some(key) = db.lookup(ty) else { return };
    match key {
        TypeKey::TypeVar(info) => {
            if live_scopes.contains(&info.scope)
                && !info.flags.contains(TypeVarFlags::IN_SCOPE_PLACEHOLDER)
            {
                let mut placeholder = info;
                placeholder.flags |= TypeVarFlags::IN_SCOPE_PLACEHOLDER;
                subst.insert(info.key(), db.type_var(placeholder));
            }
        }
        TypeKey::Instance(ct) | TypeKey::Instantiable(ct) => {
            if let Some(args) = ct.args {
                for &arg in db.type_list(args).iter() {
                    collect_live_placeholders(db, arg, live_scopes, subst, depth + 1);
                }
            }
        }
        TypeKey::Union(list) => {
            for &member in db.type_list(list).iter() {
                collect_live_placeholders(db, member, live_scopes, subst, depth + 1);
            }
        }
        TypeKey::Tuple(list) | TypeKey::UnpackedTuple(list) => {
            for element in db.tuple_list(list).iter() {
                collect_live_placeholders(db, element.type_id, live_scopes, subst, depth + 1);
            }
        }
        TypeKey::Callable(shape_id) => {
            if let Some(shape) = db.callable_shape(shape_id) {
                collect_live_placeholders(db, shape.ret, live_scopes, subst, depth + 1);
                if let ParamList::Params { params, .. } = &shape.params {
                    for p in params {
                        collect_live_placeholders(db, p.ty, live_scopes, subst, depth + 1);
                    }
                }
            }
        }
        TypeKey::Intrinsic(_) | TypeKey::Literal(_) => {}
    }
}

/// How [`apply_solved_type_vars`] treats variables without a solution and
/// literal-carrying bounds.
#[derive(Clone, Copy, Debug, Default)]
pub struct ApplyOptions {
    /// Replace in-scope variables that never got a bound with `Unknown`
    /// instead of leaving the variable in place.
    pub unsolved_to_unknown: bool,
    /// Use the literal-carrying narrow bound rather than the widened one.
    pub retain_literals: bool,
}

/// Copy the store's solution out into `ty`.
///
/// Each in-scope variable is replaced by its narrow bound (widened of
/// literals unless `retain_literals`), falling back to its wide bound.
pub fn apply_solved_type_vars(
    db: &dyn TypeDatabase,
    ty: TypeId,
    ctx: &InferenceContext,
    options: ApplyOptions,
) -> TypeId {
    let mut subst = TypeSubstitution::new();
    for (&key, binding) in ctx.primary().iter() {
        let solved = if options.retain_literals {
            binding.narrow_bound.or(binding.wide_bound)
        } else {
            binding
                .narrow_bound_no_literals
                .or(binding.narrow_bound)
                .or(binding.wide_bound)
        };
        if let Some(solved) = solved {
            subst.insert(key, solved);
        } else if options.unsolved_to_unknown {
            subst.insert(key, TypeId::UNKNOWN);
        }
    }
    if options.unsolved_to_unknown {
        // Unbound variables of a responsible scope may never have been
        // observed at all; sweep them too.
        let mut unknowns = TypeSubstitution::new();
        collect_unsolved(db, ty, ctx, &subst, &mut unknowns, 0);
        for (key, unknown) in unknowns.map {
            subst.insert(key, unknown);
        }
    }
    instantiate_type(db, ty, &subst, 0)
}

fn collect_unsolved(
    db: &dyn TypeDatabase,
    ty: TypeId,
    ctx: &InferenceContext,
    solved: &TypeSubstitution,
    out: &mut TypeSubstitution,
    depth: u32,
) {
    if depth > MAX_INSTANTIATION_DEPTH {
        return;
    }
    let Some(key) = db.lookup(ty) else { return };
    match key {
        TypeKey::TypeVar(info) => {
            if ctx.is_in_scope(info.scope) && solved.get(info.key()).is_none() {
                out.insert(info.key(), TypeId::UNKNOWN);
            }
        }
        TypeKey::Instance(ct) | TypeKey::Instantiable(ct) => {
            if let Some(args) = ct.args {
                for &arg in db.type_list(args).iter() {
                    collect_unsolved(db, arg, ctx, solved, out, depth + 1);
                }
            }
        }
        TypeKey::Union(list) => {
            for &member in db.type_list(list).iter() {
                collect_unsolved(db, member, ctx, solved, out, depth + 1);
            }
        }
        TypeKey::Tuple(list) | TypeKey::UnpackedTuple(list) => {
            for element in db.tuple_list(list).iter() {
                collect_unsolved(db, element.type_id, ctx, solved, out, depth + 1);
            }
        }
        TypeKey::Callable(shape_id) => {
            if let Some(shape) = db.callable_shape(shape_id) {
                collect_unsolved(db, shape.ret, ctx, solved, out, depth + 1);
                if let ParamList::Params { params, .. } = &shape.params {
                    for p in params {
                        collect_unsolved(db, p.ty, ctx, solved, out, depth + 1);
                    }
                }
            }
        }
        TypeKey::Intrinsic(_) | TypeKey::Literal(_) => {}
    }
}

#[cfg(test)]
#[path = "../tests/instantiate_tests.rs"]
mod instantiate_tests;
