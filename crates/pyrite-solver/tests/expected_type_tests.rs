//! Back-solving type arguments from an expected type.

use super::*;
use crate::intern::TypeInterner;
use crate::relate::SubtypeChecker;
use crate::types::{ClassDef, ClassFlags};

fn param_of(db: &dyn TypeDatabase, class: crate::types::ClassId, index: usize) -> TypeVarInfo {
    db.class_def(class).unwrap().type_params[index]
}

#[test]
fn gradual_expectation_makes_every_param_gradual() {
    let interner = TypeInterner::new();
    let db: &dyn TypeDatabase = &interner;
    let b = db.builtins();
    let ty = db.unspecialized_instance(b.dict);
    let kt = param_of(db, b.dict, 0);
    let vt = param_of(db, b.dict, 1);

    let mut oracle = SubtypeChecker::new(db);
    let mut solver = ConstraintSolver::new(db, &mut oracle);
    let mut ctx = InferenceContext::for_scope(kt.scope);

    let outcome = solver.infer_from_expected_type(&mut ctx, ty, TypeId::ANY, &[], 0);
    assert!(outcome.populated);
    assert!(outcome.fully_resolved);
    for key in [kt.key(), vt.key()] {
        let binding = ctx.binding(key).unwrap();
        assert_eq!(binding.narrow_bound, Some(TypeId::ANY));
        assert_eq!(binding.wide_bound, Some(TypeId::ANY));
    }
}

#[test]
fn same_class_copies_arguments_directly() {
    let interner = TypeInterner::new();
    let db: &dyn TypeDatabase = &interner;
    let b = db.builtins();
    let int = db.instance(b.int, Vec::new());
    let str_ty = db.instance(b.str, Vec::new());
    let ty = db.unspecialized_instance(b.dict);
    let expected = db.instance(b.dict, vec![str_ty, int]);
    let kt = param_of(db, b.dict, 0);
    let vt = param_of(db, b.dict, 1);

    let mut oracle = SubtypeChecker::new(db);
    let mut solver = ConstraintSolver::new(db, &mut oracle);
    let mut ctx = InferenceContext::for_scope(kt.scope);

    let outcome = solver.infer_from_expected_type(&mut ctx, ty, expected, &[], 0);
    assert!(outcome.populated && outcome.fully_resolved);
    // dict's parameters are invariant: both bounds get pinned.
    let kt_binding = ctx.binding(kt.key()).unwrap();
    assert_eq!(kt_binding.narrow_bound, Some(str_ty));
    assert_eq!(kt_binding.wide_bound, Some(str_ty));
    let vt_binding = ctx.binding(vt.key()).unwrap();
    assert_eq!(vt_binding.narrow_bound, Some(int));
    assert_eq!(vt_binding.wide_bound, Some(int));
}

#[test]
fn covariant_params_constrain_only_from_above() {
    let interner = TypeInterner::new();
    let db: &dyn TypeDatabase = &interner;
    let b = db.builtins();
    let int = db.instance(b.int, Vec::new());
    let ty = db.unspecialized_instance(b.sequence);
    let expected = db.instance(b.sequence, vec![int]);
    let t_co = param_of(db, b.sequence, 0);

    let mut oracle = SubtypeChecker::new(db);
    let mut solver = ConstraintSolver::new(db, &mut oracle);
    let mut ctx = InferenceContext::for_scope(t_co.scope);

    let outcome = solver.infer_from_expected_type(&mut ctx, ty, expected, &[], 0);
    assert!(outcome.populated && outcome.fully_resolved);
    let binding = ctx.binding(t_co.key()).unwrap();
    assert_eq!(binding.wide_bound, Some(int));
    assert_eq!(binding.narrow_bound, None);
}

#[test]
fn expected_base_class_solves_through_inheritance() {
    let interner = TypeInterner::new();
    let db: &dyn TypeDatabase = &interner;
    let b = db.builtins();
    let int = db.instance(b.int, Vec::new());
    // Constructing a list where a Sequence[int] is expected.
    let ty = db.unspecialized_instance(b.list);
    let expected = db.instance(b.sequence, vec![int]);
    let t = param_of(db, b.list, 0);

    let mut oracle = SubtypeChecker::new(db);
    let mut solver = ConstraintSolver::new(db, &mut oracle);
    let mut ctx = InferenceContext::for_scope(t.scope);

    let outcome = solver.infer_from_expected_type(&mut ctx, ty, expected, &[], 0);
    assert!(outcome.populated && outcome.fully_resolved);
    let binding = ctx.binding(t.key()).unwrap();
    assert_eq!(binding.narrow_bound, Some(int));
    assert_eq!(binding.wide_bound, Some(int));
}

#[test]
fn ambiguous_correspondence_degrades_to_unknown() {
    let interner = TypeInterner::new();
    let db: &dyn TypeDatabase = &interner;
    let b = db.builtins();
    let int = db.instance(b.int, Vec::new());
    let str_ty = db.instance(b.str, Vec::new());

    // class Pair(dict[T, T]): one parameter feeding two base arguments.
    let scope = db.fresh_scope();
    let t_info = TypeVarInfo::standard(db.intern_string("T"), scope);
    let t = db.type_var(t_info);
    let pair = db.register_class(ClassDef {
        name: db.intern_string("Pair"),
        type_params: vec![t_info],
        bases: vec![db.instance(b.dict, vec![t, t])],
        flags: ClassFlags::empty(),
    });

    let ty = db.unspecialized_instance(pair);
    // dict[str, int]: the two expected arguments disagree about T.
    let expected = db.instance(b.dict, vec![str_ty, int]);

    let mut oracle = SubtypeChecker::new(db);
    let mut solver = ConstraintSolver::new(db, &mut oracle);
    let mut ctx = InferenceContext::for_scope(scope);

    let outcome = solver.infer_from_expected_type(&mut ctx, ty, expected, &[], 0);
    assert!(outcome.populated);
    assert!(!outcome.fully_resolved);
    let binding = ctx.binding(t_info.key()).unwrap();
    assert_eq!(binding.resolved(), Some(TypeId::UNKNOWN));
}

#[test]
fn unspecialized_expectation_degrades_to_populate() {
    let interner = TypeInterner::new();
    let db: &dyn TypeDatabase = &interner;
    let b = db.builtins();
    let kt = param_of(db, b.dict, 0);
    let ty = db.unspecialized_instance(b.dict);
    let expected = db.unspecialized_instance(b.dict);

    let mut oracle = SubtypeChecker::new(db);
    let mut solver = ConstraintSolver::new(db, &mut oracle);
    let mut ctx = InferenceContext::for_scope(kt.scope);

    let outcome = solver.infer_from_expected_type(&mut ctx, ty, expected, &[], 0);
    assert!(outcome.populated);
}

#[test]
fn synthesized_self_expectation_stands_for_its_bound() {
    let interner = TypeInterner::new();
    let db: &dyn TypeDatabase = &interner;
    let b = db.builtins();
    let int = db.instance(b.int, Vec::new());
    let str_ty = db.instance(b.str, Vec::new());
    let kt = param_of(db, b.dict, 0);

    let mut self_var = TypeVarInfo::standard(db.intern_string("Self"), db.fresh_scope());
    self_var.flags |= TypeVarFlags::SYNTHESIZED | TypeVarFlags::SYNTHESIZED_SELF;
    self_var.bound = Some(db.instance(b.dict, vec![str_ty, int]));
    let expected = db.type_var(self_var);

    let mut oracle = SubtypeChecker::new(db);
    let mut solver = ConstraintSolver::new(db, &mut oracle);
    let mut ctx = InferenceContext::for_scope(kt.scope);

    let ty = db.unspecialized_instance(b.dict);
    let outcome = solver.infer_from_expected_type(&mut ctx, ty, expected, &[], 0);
    assert!(outcome.populated && outcome.fully_resolved);
    assert_eq!(
        ctx.binding(kt.key()).and_then(|b| b.narrow_bound),
        Some(str_ty)
    );
}

#[test]
fn non_class_operands_fail() {
    let interner = TypeInterner::new();
    let db: &dyn TypeDatabase = &interner;
    let b = db.builtins();
    let int = db.instance(b.int, Vec::new());

    let mut oracle = SubtypeChecker::new(db);
    let mut solver = ConstraintSolver::new(db, &mut oracle);
    let mut ctx = InferenceContext::new();

    let lit = db.literal_int(1);
    let outcome = solver.infer_from_expected_type(&mut ctx, lit, int, &[], 0);
    assert_eq!(outcome, BackSolveOutcome::FAILED);

    let outcome = solver.infer_from_expected_type(&mut ctx, int, lit, &[], 0);
    assert_eq!(outcome, BackSolveOutcome::FAILED);
}

#[test]
fn locked_context_is_not_seeded() {
    let interner = TypeInterner::new();
    let db: &dyn TypeDatabase = &interner;
    let b = db.builtins();
    let int = db.instance(b.int, Vec::new());
    let str_ty = db.instance(b.str, Vec::new());
    let kt = param_of(db, b.dict, 0);

    let mut oracle = SubtypeChecker::new(db);
    let mut solver = ConstraintSolver::new(db, &mut oracle);
    let mut ctx = InferenceContext::for_scope(kt.scope);
    ctx.lock();

    let ty = db.unspecialized_instance(b.dict);
    let expected = db.instance(b.dict, vec![str_ty, int]);
    let outcome = solver.infer_from_expected_type(&mut ctx, ty, expected, &[], 0);
    assert!(outcome.populated);
    assert!(ctx.binding(kt.key()).is_none());
}
