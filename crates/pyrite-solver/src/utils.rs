//! Shared utility functions for the solver module.
//!
//! Small type queries used across multiple solver components to avoid
//! code duplication.

use crate::db::TypeDatabase;
use crate::limits::TYPE_LIST_INLINE;
use crate::types::{ClassId, LiteralValue, TypeId, TypeKey, TypeVarInfo};
use rustc_hash::FxHashSet;
use smallvec::{SmallVec, smallvec};

/// True for the two gradual types (`Any` and `Unknown`), which are
/// assignable in both directions.
#[inline]
pub fn is_gradual(ty: TypeId) -> bool {
    ty == TypeId::ANY || ty == TypeId::UNKNOWN
}

/// The type variable behind `ty`, if it is one.
pub fn as_type_var(db: &dyn TypeDatabase, ty: TypeId) -> Option<TypeVarInfo> {
    match db.lookup(ty)? {
        TypeKey::TypeVar(info) => Some(info),
        _ => None,
    }
}

/// Union members of `ty`, or a singleton list for non-unions.
pub fn union_members(db: &dyn TypeDatabase, ty: TypeId) -> SmallVec<[TypeId; TYPE_LIST_INLINE]> {
    match db.lookup(ty) {
        Some(TypeKey::Union(list)) => db.type_list(list).iter().copied().collect(),
        _ => smallvec![ty],
    }
}

/// The non-literal base type of a literal value (`Literal[3]` -> `int`).
pub fn literal_base_type(db: &dyn TypeDatabase, value: LiteralValue) -> TypeId {
    db.instance(db.literal_class(value), Vec::new())
}

/// Whether a class or any of its bases was declared from `Any` (an
/// unresolved import, say). Instances of such classes are assignable
/// anywhere.
pub fn derives_from_any(db: &dyn TypeDatabase, class: ClassId) -> bool {
    let Some(def) = db.class_def(class) else {
        return false;
    };
    if def.flags.contains(crate::types::ClassFlags::DERIVES_FROM_ANY) {
        return true;
    }
    def.bases.iter().any(|&base| match db.lookup(base) {
        Some(TypeKey::Instance(ct)) => derives_from_any(db, ct.class),
        _ => false,
    })
}

/// Whether `Unknown` appears anywhere inside `ty`.
pub fn contains_unknown(db: &dyn TypeDatabase, ty: TypeId) -> bool {
    let mut visited = FxHashSet::default();
    contains_unknown_inner(db, ty, &mut visited)
}

fn contains_unknown_inner(
    db: &dyn TypeDatabase,
    ty: TypeId,
    visited: &mut FxHashSet<TypeId>,
) -> bool {
    if ty == TypeId::UNKNOWN {
        return true;
    }
    if !visited.insert(ty) {
        return false;
    }
    let Some(key) = db.lookup(ty) else {
        return false;
    };
    match key {
        TypeKey::Intrinsic(_) | TypeKey::Literal(_) => false,
        TypeKey::Instance(ct) | TypeKey::Instantiable(ct) => match ct.args {
            Some(args) => db
                .type_list(args)
                .iter()
                .any(|&arg| contains_unknown_inner(db, arg, visited)),
            None => false,
        },
        TypeKey::Union(list) => db
            .type_list(list)
            .iter()
            .any(|&member| contains_unknown_inner(db, member, visited)),
        TypeKey::Tuple(list) | TypeKey::UnpackedTuple(list) => db
            .tuple_list(list)
            .iter()
            .any(|element| contains_unknown_inner(db, element.type_id, visited)),
        TypeKey::Callable(shape_id) => {
            let Some(shape) = db.callable_shape(shape_id) else {
                return false;
            };
            if contains_unknown_inner(db, shape.ret, visited) {
                return true;
            }
            match &shape.params {
                crate::types::ParamList::Gradual => false,
                crate::types::ParamList::Params { params, .. } => params
                    .iter()
                    .any(|p| contains_unknown_inner(db, p.ty, visited)),
            }
        }
        TypeKey::TypeVar(info) => info
            .bound
            .is_some_and(|bound| contains_unknown_inner(db, bound, visited)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intern::TypeInterner;

    #[test]
    fn unknown_detection_descends_into_args() {
        let interner = TypeInterner::new();
        let db: &dyn TypeDatabase = &interner;
        let b = db.builtins();
        let int = db.instance(b.int, Vec::new());
        assert!(!contains_unknown(db, int));
        assert!(contains_unknown(db, TypeId::UNKNOWN));

        let list_unknown = db.instance(b.list, vec![TypeId::UNKNOWN]);
        assert!(contains_unknown(db, list_unknown));
        let nested = db.instance(b.list, vec![list_unknown]);
        assert!(contains_unknown(db, nested));

        // Any is gradual but is not Unknown.
        assert!(!contains_unknown(db, db.instance(b.list, vec![TypeId::ANY])));
    }

    #[test]
    fn union_members_of_non_union_is_singleton() {
        let interner = TypeInterner::new();
        let db: &dyn TypeDatabase = &interner;
        let b = db.builtins();
        let int = db.instance(b.int, Vec::new());
        let str_ty = db.instance(b.str, Vec::new());
        assert_eq!(union_members(db, int).as_slice(), &[int]);
        let both = db.union2(int, str_ty);
        assert_eq!(union_members(db, both).as_slice(), &[int, str_ty]);
    }
}
