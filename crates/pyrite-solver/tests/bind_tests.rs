//! End-to-end binding behavior for unconstrained type variables: scope
//! filtering, narrow/wide bound movement, literal widening, the union cap,
//! and locked-context validation.

use super::*;
use crate::intern::TypeInterner;
use crate::limits::MAX_NARROWED_UNION_SUBTYPES;
use crate::relate::SubtypeChecker;
use crate::types::{ScopeId, TypeVarKind};

fn type_var(db: &dyn TypeDatabase, name: &str, scope: ScopeId) -> (TypeId, TypeVarInfo) {
    let info = TypeVarInfo::standard(db.intern_string(name), scope);
    (db.type_var(info), info)
}

fn narrow_of(ctx: &InferenceContext, info: &TypeVarInfo) -> Option<TypeId> {
    ctx.binding(info.key()).and_then(|b| b.narrow_bound)
}

fn wide_of(ctx: &InferenceContext, info: &TypeVarInfo) -> Option<TypeId> {
    ctx.binding(info.key()).and_then(|b| b.wide_bound)
}

#[test]
fn covariant_observations_widen_to_union() {
    let interner = TypeInterner::new();
    let db: &dyn TypeDatabase = &interner;
    let b = db.builtins();
    let scope = db.fresh_scope();
    let (t, info) = type_var(db, "T", scope);
    let int = db.instance(b.int, Vec::new());
    let str_ty = db.instance(b.str, Vec::new());

    let mut oracle = SubtypeChecker::new(db);
    let mut solver = ConstraintSolver::new(db, &mut oracle);
    let mut ctx = InferenceContext::for_scope(scope);

    assert!(solver.bind_type_var(&mut ctx, t, int, None, SolveOptions::covariant(), 0));
    assert_eq!(narrow_of(&ctx, &info), Some(int));

    assert!(solver.bind_type_var(&mut ctx, t, str_ty, None, SolveOptions::covariant(), 0));
    assert_eq!(narrow_of(&ctx, &info), Some(db.union2(int, str_ty)));
}

#[test]
fn narrower_observation_keeps_existing_bound() {
    let interner = TypeInterner::new();
    let db: &dyn TypeDatabase = &interner;
    let b = db.builtins();
    let scope = db.fresh_scope();
    let (t, info) = type_var(db, "T", scope);
    let int = db.instance(b.int, Vec::new());
    let bool_ty = db.instance(b.bool, Vec::new());

    let mut oracle = SubtypeChecker::new(db);
    let mut solver = ConstraintSolver::new(db, &mut oracle);
    let mut ctx = InferenceContext::for_scope(scope);

    assert!(solver.bind_type_var(&mut ctx, t, int, None, SolveOptions::covariant(), 0));
    // bool already fits under int; the bound does not move.
    assert!(solver.bind_type_var(&mut ctx, t, bool_ty, None, SolveOptions::covariant(), 0));
    assert_eq!(narrow_of(&ctx, &info), Some(int));
}

#[test]
fn invariant_rejects_widening() {
    let interner = TypeInterner::new();
    let db: &dyn TypeDatabase = &interner;
    let b = db.builtins();
    let scope = db.fresh_scope();
    let (t, info) = type_var(db, "T", scope);
    let int = db.instance(b.int, Vec::new());
    let bool_ty = db.instance(b.bool, Vec::new());

    let mut oracle = SubtypeChecker::new(db);
    let mut solver = ConstraintSolver::new(db, &mut oracle);
    let mut ctx = InferenceContext::for_scope(scope);

    assert!(solver.bind_type_var(&mut ctx, t, int, None, SolveOptions::invariant(), 0));
    // Re-confirmation of the exact type is fine.
    assert!(solver.bind_type_var(&mut ctx, t, int, None, SolveOptions::invariant(), 0));
    // bool is a strict subtype; int does not represent it exactly.
    assert!(!solver.bind_type_var(&mut ctx, t, bool_ty, None, SolveOptions::invariant(), 0));
    assert_eq!(narrow_of(&ctx, &info), Some(int));
}

#[test]
fn contravariant_keeps_the_lowest_ceiling() {
    let interner = TypeInterner::new();
    let db: &dyn TypeDatabase = &interner;
    let b = db.builtins();
    let scope = db.fresh_scope();
    let (t, info) = type_var(db, "T", scope);
    let int = db.instance(b.int, Vec::new());
    let str_ty = db.instance(b.str, Vec::new());

    let mut oracle = SubtypeChecker::new(db);
    let mut solver = ConstraintSolver::new(db, &mut oracle);
    let mut ctx = InferenceContext::for_scope(scope);

    assert!(solver.bind_type_var(&mut ctx, t, int, None, SolveOptions::contravariant(), 0));
    assert_eq!(wide_of(&ctx, &info), Some(int));

    // object is wider than the recorded ceiling; int stays.
    let object = db.object_type();
    assert!(solver.bind_type_var(&mut ctx, t, object, None, SolveOptions::contravariant(), 0));
    assert_eq!(wide_of(&ctx, &info), Some(int));

    // str relates to int in neither direction.
    let mut diag = DiagnosticAddendum::new();
    assert!(!solver.bind_type_var(
        &mut ctx,
        t,
        str_ty,
        Some(&mut diag),
        SolveOptions::contravariant(),
        0,
    ));
    assert!(!diag.is_empty());
    assert_eq!(wide_of(&ctx, &info), Some(int));
}

#[test]
fn narrow_must_stay_under_wide() {
    let interner = TypeInterner::new();
    let db: &dyn TypeDatabase = &interner;
    let b = db.builtins();
    let scope = db.fresh_scope();
    let (t, info) = type_var(db, "T", scope);
    let int = db.instance(b.int, Vec::new());
    let str_ty = db.instance(b.str, Vec::new());
    let bool_ty = db.instance(b.bool, Vec::new());

    let mut oracle = SubtypeChecker::new(db);
    let mut solver = ConstraintSolver::new(db, &mut oracle);
    let mut ctx = InferenceContext::for_scope(scope);

    // Ceiling at int, then observe values.
    assert!(solver.bind_type_var(&mut ctx, t, int, None, SolveOptions::contravariant(), 0));
    assert!(solver.bind_type_var(&mut ctx, t, bool_ty, None, SolveOptions::covariant(), 0));
    assert_eq!(narrow_of(&ctx, &info), Some(bool_ty));

    // str breaks through the ceiling.
    assert!(!solver.bind_type_var(&mut ctx, t, str_ty, None, SolveOptions::covariant(), 0));
}

#[test]
fn declared_bound_is_enforced() {
    let interner = TypeInterner::new();
    let db: &dyn TypeDatabase = &interner;
    let b = db.builtins();
    let scope = db.fresh_scope();
    let int = db.instance(b.int, Vec::new());
    let str_ty = db.instance(b.str, Vec::new());
    let bool_ty = db.instance(b.bool, Vec::new());
    let mut info = TypeVarInfo::standard(db.intern_string("T"), scope);
    info.bound = Some(int);
    let t = db.type_var(info);

    let mut oracle = SubtypeChecker::new(db);
    let mut solver = ConstraintSolver::new(db, &mut oracle);
    let mut ctx = InferenceContext::for_scope(scope);

    let mut diag = DiagnosticAddendum::new();
    assert!(!solver.bind_type_var(
        &mut ctx,
        t,
        str_ty,
        Some(&mut diag),
        SolveOptions::covariant(),
        0,
    ));
    assert!(!diag.is_empty());

    // A subtype of the bound is accepted.
    assert!(solver.bind_type_var(&mut ctx, t, bool_ty, None, SolveOptions::covariant(), 0));
    assert_eq!(narrow_of(&ctx, &info), Some(bool_ty));
}

#[test]
fn out_of_scope_fails_with_gradual_escapes() {
    let interner = TypeInterner::new();
    let db: &dyn TypeDatabase = &interner;
    let b = db.builtins();
    let solve_scope = db.fresh_scope();
    let other_scope = db.fresh_scope();
    let (t, info) = type_var(db, "T", other_scope);
    let int = db.instance(b.int, Vec::new());

    let mut oracle = SubtypeChecker::new(db);
    let mut solver = ConstraintSolver::new(db, &mut oracle);
    let mut ctx = InferenceContext::for_scope(solve_scope);

    // A concrete source for a foreign variable is an error.
    let mut diag = DiagnosticAddendum::new();
    assert!(!solver.bind_type_var(
        &mut ctx,
        t,
        int,
        Some(&mut diag),
        SolveOptions::covariant(),
        0,
    ));
    assert!(!diag.is_empty());

    // Gradual sources and Never pass silently.
    assert!(solver.bind_type_var(&mut ctx, t, TypeId::ANY, None, SolveOptions::covariant(), 0));
    assert!(solver.bind_type_var(
        &mut ctx,
        t,
        TypeId::UNKNOWN,
        None,
        SolveOptions::covariant(),
        0,
    ));
    assert!(solver.bind_type_var(&mut ctx, t, TypeId::NEVER, None, SolveOptions::covariant(), 0));
    // ...but Never needs exact matching under invariance.
    assert!(!solver.bind_type_var(&mut ctx, t, TypeId::NEVER, None, SolveOptions::invariant(), 0));

    // ignore_scope converts the failure into a silent success.
    let lenient = SolveOptions {
        ignore_scope: true,
        ..SolveOptions::covariant()
    };
    assert!(solver.bind_type_var(&mut ctx, t, int, None, lenient, 0));

    // Synthesized variables escape the scope check entirely.
    let mut synth = info;
    synth.flags |= TypeVarFlags::SYNTHESIZED;
    let synth_ty = db.type_var(synth);
    assert!(solver.bind_type_var(&mut ctx, synth_ty, int, None, SolveOptions::covariant(), 0));

    // Nothing was recorded along the way.
    assert!(ctx.binding(info.key()).is_none());
}

#[test]
fn locked_context_validates_without_moving() {
    let interner = TypeInterner::new();
    let db: &dyn TypeDatabase = &interner;
    let b = db.builtins();
    let scope = db.fresh_scope();
    let (t, info) = type_var(db, "T", scope);
    let int = db.instance(b.int, Vec::new());
    let str_ty = db.instance(b.str, Vec::new());

    let mut oracle = SubtypeChecker::new(db);
    let mut solver = ConstraintSolver::new(db, &mut oracle);
    let mut ctx = InferenceContext::for_scope(scope);
    assert!(solver.bind_type_var(&mut ctx, t, int, None, SolveOptions::covariant(), 0));
    ctx.lock();

    assert!(solver.bind_type_var(&mut ctx, t, int, None, SolveOptions::covariant(), 0));
    let mut diag = DiagnosticAddendum::new();
    assert!(!solver.bind_type_var(
        &mut ctx,
        t,
        str_ty,
        Some(&mut diag),
        SolveOptions::covariant(),
        0,
    ));
    assert!(!diag.is_empty());
    assert_eq!(narrow_of(&ctx, &info), Some(int));
}

#[test]
fn skip_solve_bypasses_the_store() {
    let interner = TypeInterner::new();
    let db: &dyn TypeDatabase = &interner;
    let b = db.builtins();
    let scope = db.fresh_scope();
    let int = db.instance(b.int, Vec::new());
    let str_ty = db.instance(b.str, Vec::new());
    let bool_ty = db.instance(b.bool, Vec::new());
    let mut info = TypeVarInfo::standard(db.intern_string("T"), scope);
    info.bound = Some(int);
    let t = db.type_var(info);

    let mut oracle = SubtypeChecker::new(db);
    let mut solver = ConstraintSolver::new(db, &mut oracle);
    let mut ctx = InferenceContext::for_scope(scope);
    let options = SolveOptions {
        skip_solve_type_vars: true,
        ..SolveOptions::covariant()
    };

    // T degrades to its declared bound; the check is purely structural.
    assert!(solver.bind_type_var(&mut ctx, t, bool_ty, None, options, 0));
    assert!(!solver.bind_type_var(&mut ctx, t, str_ty, None, options, 0));
    assert!(ctx.binding(info.key()).is_none());
}

#[test]
fn literal_bounds_carry_a_widened_shadow() {
    let interner = TypeInterner::new();
    let db: &dyn TypeDatabase = &interner;
    let b = db.builtins();
    let scope = db.fresh_scope();
    let (t, info) = type_var(db, "T", scope);
    let int = db.instance(b.int, Vec::new());

    let mut oracle = SubtypeChecker::new(db);
    let mut solver = ConstraintSolver::new(db, &mut oracle);
    let mut ctx = InferenceContext::for_scope(scope);

    let lit = db.literal_int(3);
    assert!(solver.bind_type_var(&mut ctx, t, lit, None, SolveOptions::covariant(), 0));
    let binding = ctx.binding(info.key()).unwrap();
    assert_eq!(binding.narrow_bound, Some(lit));
    assert_eq!(binding.narrow_bound_no_literals, Some(int));

    // retain_literals suppresses the shadow.
    let mut ctx2 = InferenceContext::for_scope(scope);
    let retain = SolveOptions {
        retain_literals: true,
        ..SolveOptions::covariant()
    };
    assert!(solver.bind_type_var(&mut ctx2, t, lit, None, retain, 0));
    let binding = ctx2.binding(info.key()).unwrap();
    assert_eq!(binding.narrow_bound, Some(lit));
    assert_eq!(binding.narrow_bound_no_literals, None);
}

#[test]
fn runaway_union_collapses_to_object() {
    let interner = TypeInterner::new();
    let db: &dyn TypeDatabase = &interner;
    let scope = db.fresh_scope();
    let (t, info) = type_var(db, "T", scope);

    let mut oracle = SubtypeChecker::new(db);
    let mut solver = ConstraintSolver::new(db, &mut oracle);
    let mut ctx = InferenceContext::for_scope(scope);
    let retain = SolveOptions {
        retain_literals: true,
        ..SolveOptions::covariant()
    };

    for i in 0..(MAX_NARROWED_UNION_SUBTYPES as i64 + 8) {
        assert!(solver.bind_type_var(&mut ctx, t, db.literal_int(i), None, retain, 0));
        let narrow = narrow_of(&ctx, &info).unwrap();
        assert!(utils::union_members(db, narrow).len() <= MAX_NARROWED_UNION_SUBTYPES);
    }
    assert_eq!(narrow_of(&ctx, &info), Some(db.object_type()));
}

#[test]
fn populate_mode_seeds_only_unset_bounds() {
    let interner = TypeInterner::new();
    let db: &dyn TypeDatabase = &interner;
    let b = db.builtins();
    let scope = db.fresh_scope();
    let (t, info) = type_var(db, "T", scope);
    let int = db.instance(b.int, Vec::new());
    let str_ty = db.instance(b.str, Vec::new());

    let mut oracle = SubtypeChecker::new(db);
    let mut solver = ConstraintSolver::new(db, &mut oracle);
    let mut ctx = InferenceContext::for_scope(scope);

    assert!(solver.bind_type_var(
        &mut ctx,
        t,
        int,
        None,
        SolveOptions::populate_expected(Variance::Invariant),
        0,
    ));
    assert_eq!(narrow_of(&ctx, &info), Some(int));
    assert_eq!(wide_of(&ctx, &info), Some(int));

    // Already seeded; a second populate is a no-op.
    assert!(solver.bind_type_var(
        &mut ctx,
        t,
        str_ty,
        None,
        SolveOptions::populate_expected(Variance::Invariant),
        0,
    ));
    assert_eq!(narrow_of(&ctx, &info), Some(int));

    // skip_unknown leaves the store untouched for Unknown sources.
    let mut fresh = InferenceContext::for_scope(scope);
    let skip = SolveOptions {
        mode: SolveMode::PopulateExpected {
            variance: Variance::Covariant,
            skip_unknown: true,
        },
        ..SolveOptions::default()
    };
    assert!(solver.bind_type_var(&mut fresh, t, TypeId::UNKNOWN, None, skip, 0));
    assert!(fresh.binding(info.key()).is_none());
}

#[test]
fn variadic_sources_are_tuple_shaped() {
    let interner = TypeInterner::new();
    let db: &dyn TypeDatabase = &interner;
    let b = db.builtins();
    let scope = db.fresh_scope();
    let int = db.instance(b.int, Vec::new());
    let mut info = TypeVarInfo::standard(db.intern_string("Ts"), scope);
    info.kind = TypeVarKind::Variadic;
    let ts = db.type_var(info);

    let mut oracle = SubtypeChecker::new(db);
    let mut solver = ConstraintSolver::new(db, &mut oracle);
    let mut ctx = InferenceContext::for_scope(scope);

    // A loose source is packed into a 1-tuple.
    assert!(solver.bind_type_var(
        &mut ctx,
        ts,
        db.literal_int(1),
        None,
        SolveOptions::covariant(),
        0,
    ));
    let packed = db.unpacked_tuple(vec![TupleElement::new(db.literal_int(1))]);
    assert_eq!(narrow_of(&ctx, &info), Some(packed));

    // A second literal of the same base widens element-wise.
    assert!(solver.bind_type_var(
        &mut ctx,
        ts,
        db.literal_int(2),
        None,
        SolveOptions::covariant(),
        0,
    ));
    let widened = db.unpacked_tuple(vec![TupleElement::new(int)]);
    assert_eq!(narrow_of(&ctx, &info), Some(widened));
}

#[test]
fn non_type_var_dest_is_a_shape_mismatch() {
    let interner = TypeInterner::new();
    let db: &dyn TypeDatabase = &interner;
    let b = db.builtins();
    let scope = db.fresh_scope();
    let int = db.instance(b.int, Vec::new());

    let mut oracle = SubtypeChecker::new(db);
    let mut solver = ConstraintSolver::new(db, &mut oracle);
    let mut ctx = InferenceContext::for_scope(scope);

    let mut diag = DiagnosticAddendum::new();
    assert!(!solver.bind_type_var(
        &mut ctx,
        int,
        int,
        Some(&mut diag),
        SolveOptions::covariant(),
        0,
    ));
    assert!(!diag.is_empty());
}
