//! Literal widening and the TypeVarTuple helper.
//!
//! Literal widening discards a literal value (`Literal[3]` becomes `int`)
//! so inferred bounds do not end up over-specific. TypeVarTuple widening is
//! deliberately stricter: Python's semantics require an exact repeated
//! shape across bindings, so two packed tuples combine only when they have
//! equal length and, after literal stripping, identical elements.

use crate::db::TypeDatabase;
use crate::limits::TYPE_LIST_INLINE;
use crate::types::{TupleElement, TypeId, TypeKey};
use crate::utils::literal_base_type;
use smallvec::SmallVec;

/// Replace literal types with their runtime class (`Literal['a']` -> `str`).
///
/// Unions are widened member-wise and re-normalized; everything else is
/// returned unchanged.
pub fn strip_literal_value(db: &dyn TypeDatabase, ty: TypeId) -> TypeId {
    match db.lookup(ty) {
        Some(TypeKey::Literal(value)) => literal_base_type(db, value),
        Some(TypeKey::Union(list)) => {
            let members = db.type_list(list);
            let mut changed = false;
            let mut widened: SmallVec<[TypeId; TYPE_LIST_INLINE]> =
                SmallVec::with_capacity(members.len());
            for &member in members.iter() {
                let stripped = strip_literal_value(db, member);
                changed |= stripped != member;
                widened.push(stripped);
            }
            if changed {
                db.union(widened.into_vec())
            } else {
                ty
            }
        }
        _ => ty,
    }
}

/// Strip literal values from the elements of an unpacked tuple.
///
/// Returns `ty` unchanged if it is not an unpacked tuple or if no element
/// actually carried a literal.
pub fn strip_tuple_literals(db: &dyn TypeDatabase, ty: TypeId) -> TypeId {
    let Some(TypeKey::UnpackedTuple(list)) = db.lookup(ty) else {
        return ty;
    };
    let elements = db.tuple_list(list);
    let mut changed = false;
    let mut stripped: Vec<TupleElement> = Vec::with_capacity(elements.len());
    for element in elements.iter() {
        let widened = strip_literal_value(db, element.type_id);
        changed |= widened != element.type_id;
        stripped.push(TupleElement {
            type_id: widened,
            unbounded: element.unbounded,
        });
    }
    if changed { db.unpacked_tuple(stripped) } else { ty }
}

/// Combine two TypeVarTuple bindings, if their shapes agree.
///
/// Both inputs must be unpacked tuples of equal length whose elements,
/// after literal stripping, are structurally identical (interning makes
/// that an id comparison). Any mismatch means no widening is possible and
/// the caller fails the bind.
pub fn widen_tuple_types(db: &dyn TypeDatabase, t1: TypeId, t2: TypeId) -> Option<TypeId> {
    let Some(TypeKey::UnpackedTuple(list1)) = db.lookup(t1) else {
        return None;
    };
    let Some(TypeKey::UnpackedTuple(list2)) = db.lookup(t2) else {
        return None;
    };
    let elements1 = db.tuple_list(list1);
    let elements2 = db.tuple_list(list2);
    if elements1.len() != elements2.len() {
        return None;
    }

    let mut combined: Vec<TupleElement> = Vec::with_capacity(elements1.len());
    for (e1, e2) in elements1.iter().zip(elements2.iter()) {
        if e1.unbounded != e2.unbounded {
            return None;
        }
        let s1 = strip_literal_value(db, e1.type_id);
        let s2 = strip_literal_value(db, e2.type_id);
        if s1 != s2 {
            return None;
        }
        combined.push(TupleElement {
            type_id: s1,
            unbounded: e1.unbounded,
        });
    }
    Some(db.unpacked_tuple(combined))
}

#[cfg(test)]
#[path = "../tests/variadic_tests.rs"]
mod variadic_tests;
