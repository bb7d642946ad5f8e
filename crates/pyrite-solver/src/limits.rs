//! Centralized limits and thresholds for the constraint solver.
//!
//! This module provides shared constants for recursion depths and capacity
//! limits used throughout the solver. Centralizing these values:
//! - Prevents duplicate definitions with inconsistent values
//! - Documents the rationale for each limit
//! - Keeps independent policies independently tunable
//!
//! Each limit defends against a specific pathological input shape; the doc
//! comment on each constant shows a Python example of what it guards.

// =============================================================================
// Union growth caps
// =============================================================================
// These are precision/performance trade-offs, not correctness requirements.
// The two 64s below are independent policies that happen to share a value
// today. Do not fold them into one constant.

/// Maximum subtypes retained when widening a type variable's narrow bound
/// into a union.
///
/// When a sequence of covariant bindings keeps widening a TypeVar's narrow
/// bound, the bound grows as a union of everything observed. Once combining
/// one more alternative would exceed this count, the bound collapses to the
/// nearest known supertype (`object`) instead of growing further.
///
/// # Python example
///
/// ```python
/// def first(*values: _T) -> _T: ...
///
/// # 100 structurally distinct argument types:
/// first(A1(), A2(), A3(), ...)  # _T stays a union up to 64 subtypes,
///                               # then collapses to `object`
/// ```
pub const MAX_NARROWED_UNION_SUBTYPES: usize = 64;

/// Maximum subtypes produced when the evaluator expands literal arithmetic.
///
/// Published here for the surrounding type evaluator: folding operations
/// over int/str literal unions (e.g. `Literal[1, 2, 3] + Literal[10, 20]`)
/// multiplies union sizes. Beyond this count the evaluator widens to the
/// non-literal base type rather than enumerating combinations.
///
/// Independent from [`MAX_NARROWED_UNION_SUBTYPES`] even though the values
/// match; tuning one must not move the other.
///
/// # Python example
///
/// ```python
/// x: Literal[1, 2, 3, 4, 5, 6, 7, 8]
/// y: Literal[10, 20, 30, 40, 50, 60, 70, 80]
/// z = x + y  # 8 x 8 = 64 combinations: right at the cap; one more
///            # operand widens the result to plain `int`
/// ```
pub const MAX_LITERAL_EXPANSION_SUBTYPES: usize = 64;

// =============================================================================
// Recursion depths
// =============================================================================
// Recursion is threaded as an explicit `recursion: u32` parameter; these are
// the ceilings the enforcement points compare against. Exceeding a ceiling
// degrades ("assume compatible" / "return the input unchanged"), never
// panics.

/// Maximum depth for assignability checks in the reference oracle.
///
/// Prevents unbounded descent when comparing recursive types. When the
/// limit is hit the check assumes compatibility and stops, matching the
/// surrounding evaluator's "assume Unknown and continue" policy.
///
/// # Python example
///
/// ```python
/// class Node(Generic[_T]):
///     next: "Node[_T] | None"
///
/// a: Node[int]
/// b: Node[int | str]
/// b = a  # descends through `next` one level per recursion unit
/// ```
pub const MAX_TYPE_RELATION_DEPTH: u32 = 100;

/// Maximum depth for type instantiation and solved-variable application.
///
/// Prevents infinite expansion when substituting into self-referential
/// generics. When exceeded, substitution returns its input unchanged.
///
/// # Python example
///
/// ```python
/// Nested = list["Nested | int"]  # recursive alias; substitution must
///                                # not chase it forever
/// ```
pub const MAX_INSTANTIATION_DEPTH: u32 = 50;

// =============================================================================
// Capacity/size limits
// =============================================================================

/// Inline capacity for type lists (union members, tuple elements, class
/// type arguments).
///
/// Lists backed by `SmallVec<[TypeId; 8]>` hold up to 8 elements without
/// heap allocation. Most unions and argument lists in real code are
/// smaller, so the common case never allocates.
pub const TYPE_LIST_INLINE: usize = 8;

/// Maximum union members rendered in diagnostic text.
///
/// Larger unions are elided with `| ...` so constraint-violation messages
/// stay readable.
pub const UNION_MEMBER_DIAGNOSTIC_LIMIT: usize = 3;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limits_are_consistent() {
        // Diagnostics must elide before the widening cap is reachable,
        // otherwise a capped union prints all 64 members.
        assert!(UNION_MEMBER_DIAGNOSTIC_LIMIT < MAX_NARROWED_UNION_SUBTYPES);
        // Instantiation nests inside relation checks; it must give up first.
        assert!(MAX_INSTANTIATION_DEPTH <= MAX_TYPE_RELATION_DEPTH);
        assert!(TYPE_LIST_INLINE > 0);
    }
}
