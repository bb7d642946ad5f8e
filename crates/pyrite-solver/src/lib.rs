//! Generic type constraint solver for a Python type-checking engine.
//!
//! Given a sequence of observed `dest := src` assignability checks, the
//! solver decides what every in-scope type parameter (TypeVar, ParamSpec,
//! TypeVarTuple) must be bound to — incrementally, without backtracking,
//! and always producing a single best answer.
//!
//! Key pieces:
//! - **Interned types**: structural values dedup to `TypeId` handles, so
//!   type equality is integer equality and "clone before mutate" cannot
//!   happen — mutation only ever interns a new value.
//! - **[`InferenceContext`]**: the constraint store; per-variable narrow
//!   and wide bounds, with parallel signature contexts for overload
//!   resolution and a lock flag for validate-only use.
//! - **[`ConstraintSolver`]**: the TypeVar binder plus the specialized
//!   resolvers for constrained TypeVars, ParamSpecs, and TypeVarTuples,
//!   and the expected-type back-solver.
//! - **[`AssignabilityOracle`]**: the seam to the host checker's
//!   structural engine. [`SubtypeChecker`] is the reference
//!   implementation used for bound validation and tests.

pub mod context;
pub mod db;
pub mod diagnostics;
pub mod format;
pub mod instantiate;
pub mod intern;
pub mod interner;
pub mod limits;
pub mod operations;
mod operations_bounds;
mod operations_constrained;
mod operations_expected;
mod operations_param_spec;
pub mod relate;
pub mod tracer;
pub mod types;
pub mod utils;
pub mod widening;

pub use context::{InferenceContext, SignatureContext, TypeVarBinding};
pub use db::TypeDatabase;
pub use diagnostics::{DiagnosticAddendum, SolveMessage};
pub use format::TypeFormatter;
pub use instantiate::{
    ApplyOptions, TypeSubstitution, apply_solved_type_vars, fill_unspecified_args,
    instantiate_type, make_top_level_type_vars_concrete, transform_live_type_vars,
};
pub use intern::{Builtins, TypeInterner};
pub use interner::{Atom, StringInterner};
pub use operations::{
    AssignabilityOracle, BackSolveOutcome, ConstraintSolver, SolveMode, SolveOptions,
};
pub use relate::SubtypeChecker;
pub use tracer::{NullTracer, RecordingTracer, SolveEvent, SolveTracer};
pub use types::{
    CallableShape, ClassDef, ClassFlags, ClassId, ClassType, IntrinsicKind, LiteralValue, Param,
    ParamKind, ParamList, ScopeId, TupleElement, TypeId, TypeKey, TypeVarFlags, TypeVarInfo,
    TypeVarKey, TypeVarKind, Variance,
};
pub use widening::{strip_literal_value, strip_tuple_literals, widen_tuple_types};

// Test modules: most are loaded by their subject files via
// #[path = "../tests/..."] declarations.
// context_tests: loaded from context.rs
// bind_tests: loaded from operations.rs
// constrained tests: inline in operations_constrained.rs
// param_spec_tests: loaded from operations_param_spec.rs
// variadic_tests: loaded from widening.rs
// expected_type_tests: loaded from operations_expected.rs
// instantiate_tests: loaded from instantiate.rs
// relate_tests: loaded from relate.rs
