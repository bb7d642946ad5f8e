//! Substitution, specialization helpers, and solution application.

use super::*;
use crate::context::TypeVarBinding;
use crate::intern::TypeInterner;
use crate::types::{ParamKind, TypeVarInfo};

fn type_var(db: &dyn TypeDatabase, name: &str, scope: ScopeId) -> (TypeId, TypeVarInfo) {
    let info = TypeVarInfo::standard(db.intern_string(name), scope);
    (db.type_var(info), info)
}

#[test]
fn substitution_rebuilds_nested_types() {
    let interner = TypeInterner::new();
    let db: &dyn TypeDatabase = &interner;
    let b = db.builtins();
    let scope = db.fresh_scope();
    let (t, t_info) = type_var(db, "T", scope);
    let (s, _) = type_var(db, "S", scope);
    let int = db.instance(b.int, Vec::new());

    let ty = db.instance(b.dict, vec![t, db.instance(b.list, vec![t])]);
    let mut subst = TypeSubstitution::new();
    subst.insert(t_info.key(), int);

    let expected = db.instance(b.dict, vec![int, db.instance(b.list, vec![int])]);
    assert_eq!(instantiate_type(db, ty, &subst, 0), expected);

    // Unmapped variables stay in place.
    assert_eq!(instantiate_type(db, s, &subst, 0), s);

    // Tuples and unions rebuild too.
    let tup = db.tuple(vec![TupleElement::new(t), TupleElement::new(int)]);
    assert_eq!(
        instantiate_type(db, tup, &subst, 0),
        db.tuple(vec![TupleElement::new(int), TupleElement::new(int)])
    );
    let un = db.union2(t, db.instance(b.str, Vec::new()));
    assert_eq!(
        instantiate_type(db, un, &subst, 0),
        db.union2(int, db.instance(b.str, Vec::new()))
    );
}

#[test]
fn from_args_pairs_declared_params() {
    let interner = TypeInterner::new();
    let db: &dyn TypeDatabase = &interner;
    let b = db.builtins();
    let int = db.instance(b.int, Vec::new());
    let list_def = db.class_def(b.list).unwrap();

    let subst = TypeSubstitution::from_args(&list_def.type_params, &[int]);
    assert_eq!(subst.len(), 1);
    assert_eq!(subst.get(list_def.type_params[0].key()), Some(int));

    // Extra arguments are ignored.
    let extra = TypeSubstitution::from_args(&list_def.type_params, &[int, int]);
    assert_eq!(extra.len(), 1);
}

#[test]
fn depth_cap_returns_the_input() {
    let interner = TypeInterner::new();
    let db: &dyn TypeDatabase = &interner;
    let b = db.builtins();
    let scope = db.fresh_scope();
    let (t, t_info) = type_var(db, "T", scope);
    let int = db.instance(b.int, Vec::new());
    let ty = db.instance(b.list, vec![t]);

    let mut subst = TypeSubstitution::new();
    subst.insert(t_info.key(), int);
    assert_eq!(
        instantiate_type(db, ty, &subst, MAX_INSTANTIATION_DEPTH + 1),
        ty
    );
    // An empty substitution is a no-op regardless of depth.
    assert_eq!(instantiate_type(db, ty, &TypeSubstitution::new(), 0), ty);
}

#[test]
fn unspecified_args_fill_with_unknown() {
    let interner = TypeInterner::new();
    let db: &dyn TypeDatabase = &interner;
    let b = db.builtins();
    let int = db.instance(b.int, Vec::new());

    let bare = db.unspecialized_instance(b.list);
    assert_eq!(
        fill_unspecified_args(db, bare),
        db.instance(b.list, vec![TypeId::UNKNOWN])
    );
    let bare_dict = db.unspecialized_instance(b.dict);
    assert_eq!(
        fill_unspecified_args(db, bare_dict),
        db.instance(b.dict, vec![TypeId::UNKNOWN, TypeId::UNKNOWN])
    );

    // Already specialized or non-class types pass through.
    let of_int = db.instance(b.list, vec![int]);
    assert_eq!(fill_unspecified_args(db, of_int), of_int);
    assert_eq!(fill_unspecified_args(db, int), int);
}

#[test]
fn top_level_type_vars_become_concrete() {
    let interner = TypeInterner::new();
    let db: &dyn TypeDatabase = &interner;
    let b = db.builtins();
    let scope = db.fresh_scope();
    let int = db.instance(b.int, Vec::new());
    let str_ty = db.instance(b.str, Vec::new());

    let mut bounded = TypeVarInfo::standard(db.intern_string("T"), scope);
    bounded.bound = Some(int);
    let bounded_ty = db.type_var(bounded);
    assert_eq!(make_top_level_type_vars_concrete(db, bounded_ty, true), int);

    let (unbounded, _) = type_var(db, "U", scope);
    assert_eq!(
        make_top_level_type_vars_concrete(db, unbounded, true),
        TypeId::UNKNOWN
    );

    // ParamSpecs erase to the fully gradual callable only on request.
    let mut spec = TypeVarInfo::standard(db.intern_string("P"), scope);
    spec.kind = TypeVarKind::ParamSpec;
    let spec_ty = db.type_var(spec);
    assert_eq!(
        make_top_level_type_vars_concrete(db, spec_ty, true),
        db.callable(CallableShape::gradual(TypeId::UNKNOWN))
    );
    assert_eq!(make_top_level_type_vars_concrete(db, spec_ty, false), spec_ty);

    // Unions resolve member-wise; nested occurrences are not touched.
    let un = db.union2(bounded_ty, str_ty);
    assert_eq!(
        make_top_level_type_vars_concrete(db, un, true),
        db.union2(int, str_ty)
    );
    let nested = db.instance(b.list, vec![bounded_ty]);
    assert_eq!(make_top_level_type_vars_concrete(db, nested, true), nested);
}

#[test]
fn live_type_vars_are_rekeyed_as_placeholders() {
    let interner = TypeInterner::new();
    let db: &dyn TypeDatabase = &interner;
    let b = db.builtins();
    let scope = db.fresh_scope();
    let (t, _) = type_var(db, "T", scope);
    let ty = db.instance(b.list, vec![t]);

    let transformed = transform_live_type_vars(db, ty, &[scope]);
    assert_ne!(transformed, ty);
    let Some(TypeKey::Instance(ct)) = db.lookup(transformed) else {
        panic!("expected an instance");
    };
    let args = db.type_list(ct.args.unwrap());
    let Some(TypeKey::TypeVar(info)) = db.lookup(args[0]) else {
        panic!("expected a type variable argument");
    };
    assert!(info.flags.contains(TypeVarFlags::IN_SCOPE_PLACEHOLDER));

    // Variables of other scopes are left alone, and re-transforming is
    // stable.
    assert_eq!(transform_live_type_vars(db, ty, &[db.fresh_scope()]), ty);
    assert_eq!(
        transform_live_type_vars(db, transformed, &[scope]),
        transformed
    );
}

#[test]
fn solved_param_specs_splice_into_callables() {
    let interner = TypeInterner::new();
    let db: &dyn TypeDatabase = &interner;
    let b = db.builtins();
    let scope = db.fresh_scope();
    let int = db.instance(b.int, Vec::new());
    let str_ty = db.instance(b.str, Vec::new());

    let mut spec = TypeVarInfo::standard(db.intern_string("P"), scope);
    spec.kind = TypeVarKind::ParamSpec;
    let param = |name: &str, ty| Param {
        name: db.intern_string(name),
        ty,
        kind: ParamKind::Positional,
    };
    // (x: int, *P) -> None
    let outer = db.callable(CallableShape {
        params: ParamList::Params {
            params: vec![param("x", int)],
            param_spec: Some(spec),
        },
        ret: TypeId::NONE,
    });

    // P := (y: str) -> ... splices the captured parameters on.
    let inner = db.callable(CallableShape {
        params: ParamList::Params {
            params: vec![param("y", str_ty)],
            param_spec: None,
        },
        ret: TypeId::UNKNOWN,
    });
    let mut subst = TypeSubstitution::new();
    subst.insert(spec.key(), inner);
    assert_eq!(
        instantiate_type(db, outer, &subst, 0),
        db.callable(CallableShape {
            params: ParamList::Params {
                params: vec![param("x", int), param("y", str_ty)],
                param_spec: None,
            },
            ret: TypeId::NONE,
        })
    );

    // P := (...) erases the whole parameter list.
    let mut gradual_subst = TypeSubstitution::new();
    gradual_subst.insert(
        spec.key(),
        db.callable(CallableShape::gradual(TypeId::UNKNOWN)),
    );
    assert_eq!(
        instantiate_type(db, outer, &gradual_subst, 0),
        db.callable(CallableShape::gradual(TypeId::NONE))
    );

    // P := Q re-targets the trailing spec.
    let mut other = TypeVarInfo::standard(db.intern_string("Q"), db.fresh_scope());
    other.kind = TypeVarKind::ParamSpec;
    let mut retarget = TypeSubstitution::new();
    retarget.insert(spec.key(), db.type_var(other));
    assert_eq!(
        instantiate_type(db, outer, &retarget, 0),
        db.callable(CallableShape {
            params: ParamList::Params {
                params: vec![param("x", int)],
                param_spec: Some(other),
            },
            ret: TypeId::NONE,
        })
    );
}

#[test]
fn apply_copies_the_solution_out() {
    let interner = TypeInterner::new();
    let db: &dyn TypeDatabase = &interner;
    let b = db.builtins();
    let scope = db.fresh_scope();
    let (t, t_info) = type_var(db, "T", scope);
    let (s, _) = type_var(db, "S", scope);
    let int = db.instance(b.int, Vec::new());
    let lit = db.literal_int(3);

    let mut ctx = InferenceContext::for_scope(scope);
    ctx.set_binding(
        t_info.key(),
        TypeVarBinding {
            narrow_bound: Some(lit),
            narrow_bound_no_literals: Some(int),
            wide_bound: Some(db.object_type()),
            tuple_types: None,
        },
    );

    let ty = db.instance(b.list, vec![t]);
    assert_eq!(
        apply_solved_type_vars(db, ty, &ctx, ApplyOptions::default()),
        db.instance(b.list, vec![int])
    );
    assert_eq!(
        apply_solved_type_vars(
            db,
            ty,
            &ctx,
            ApplyOptions {
                retain_literals: true,
                ..ApplyOptions::default()
            }
        ),
        db.instance(b.list, vec![lit])
    );

    // An unsolved in-scope variable is left alone by default and swept to
    // Unknown on request.
    let holey = db.instance(b.list, vec![s]);
    assert_eq!(
        apply_solved_type_vars(db, holey, &ctx, ApplyOptions::default()),
        holey
    );
    assert_eq!(
        apply_solved_type_vars(
            db,
            holey,
            &ctx,
            ApplyOptions {
                unsolved_to_unknown: true,
                ..ApplyOptions::default()
            }
        ),
        db.instance(b.list, vec![TypeId::UNKNOWN])
    );
}

#[test]
fn wide_bound_is_the_fallback_solution() {
    let interner = TypeInterner::new();
    let db: &dyn TypeDatabase = &interner;
    let b = db.builtins();
    let scope = db.fresh_scope();
    let (t, t_info) = type_var(db, "T", scope);
    let int = db.instance(b.int, Vec::new());

    let mut ctx = InferenceContext::for_scope(scope);
    ctx.set_binding(
        t_info.key(),
        TypeVarBinding {
            wide_bound: Some(int),
            ..TypeVarBinding::default()
        },
    );
    assert_eq!(
        apply_solved_type_vars(db, t, &ctx, ApplyOptions::default()),
        int
    );
}
