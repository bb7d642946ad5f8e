//! Type database abstraction for the solver.
//!
//! This trait isolates solver logic from concrete storage so the host
//! checker can swap in its own type store without touching core logic.

use crate::interner::Atom;
use crate::intern::{Builtins, TypeInterner};
use crate::types::{
    CallableShape, CallableShapeId, ClassDef, ClassId, LiteralValue, ScopeId, TupleElement,
    TupleListId, TypeId, TypeKey, TypeListId, TypeVarInfo,
};
use std::sync::Arc;

/// Query interface for the solver.
///
/// This keeps solver components generic and prevents them from reaching
/// into concrete storage structures directly.
pub trait TypeDatabase {
    fn intern(&self, key: TypeKey) -> TypeId;
    fn lookup(&self, id: TypeId) -> Option<TypeKey>;
    fn intern_string(&self, s: &str) -> Atom;
    fn resolve_atom(&self, atom: Atom) -> String;
    fn resolve_atom_ref(&self, atom: Atom) -> Arc<str>;
    fn type_list(&self, id: TypeListId) -> Arc<[TypeId]>;
    fn intern_type_list(&self, items: Vec<TypeId>) -> TypeListId;
    fn tuple_list(&self, id: TupleListId) -> Arc<[TupleElement]>;
    fn intern_tuple_list(&self, items: Vec<TupleElement>) -> TupleListId;
    fn callable_shape(&self, id: CallableShapeId) -> Option<Arc<CallableShape>>;
    fn register_class(&self, def: ClassDef) -> ClassId;
    fn class_def(&self, id: ClassId) -> Option<Arc<ClassDef>>;
    fn builtins(&self) -> Builtins;
    fn fresh_scope(&self) -> ScopeId;

    fn union(&self, members: Vec<TypeId>) -> TypeId;
    fn union2(&self, left: TypeId, right: TypeId) -> TypeId;
    fn instance(&self, class: ClassId, args: Vec<TypeId>) -> TypeId;
    fn unspecialized_instance(&self, class: ClassId) -> TypeId;
    fn instantiable(&self, class: ClassId, args: Vec<TypeId>) -> TypeId;
    fn tuple(&self, elements: Vec<TupleElement>) -> TypeId;
    fn unpacked_tuple(&self, elements: Vec<TupleElement>) -> TypeId;
    fn callable(&self, shape: CallableShape) -> TypeId;
    fn type_var(&self, info: TypeVarInfo) -> TypeId;

    fn literal_int(&self, value: i64) -> TypeId;
    fn literal_str(&self, value: &str) -> TypeId;
    fn literal_bytes(&self, value: &str) -> TypeId;
    fn literal_bool(&self, value: bool) -> TypeId;
    fn literal_class(&self, value: LiteralValue) -> ClassId;

    fn object_type(&self) -> TypeId;
}

impl TypeDatabase for TypeInterner {
    fn intern(&self, key: TypeKey) -> TypeId {
        TypeInterner::intern(self, key)
    }

    fn lookup(&self, id: TypeId) -> Option<TypeKey> {
        TypeInterner::lookup(self, id)
    }

    fn intern_string(&self, s: &str) -> Atom {
        TypeInterner::intern_string(self, s)
    }

    fn resolve_atom(&self, atom: Atom) -> String {
        TypeInterner::resolve_atom(self, atom)
    }

    fn resolve_atom_ref(&self, atom: Atom) -> Arc<str> {
        TypeInterner::resolve_atom_ref(self, atom)
    }

    fn type_list(&self, id: TypeListId) -> Arc<[TypeId]> {
        TypeInterner::type_list(self, id)
    }

    fn intern_type_list(&self, items: Vec<TypeId>) -> TypeListId {
        TypeInterner::intern_type_list(self, items)
    }

    fn tuple_list(&self, id: TupleListId) -> Arc<[TupleElement]> {
        TypeInterner::tuple_list(self, id)
    }

    fn intern_tuple_list(&self, items: Vec<TupleElement>) -> TupleListId {
        TypeInterner::intern_tuple_list(self, items)
    }

    fn callable_shape(&self, id: CallableShapeId) -> Option<Arc<CallableShape>> {
        TypeInterner::callable_shape(self, id)
    }

    fn register_class(&self, def: ClassDef) -> ClassId {
        TypeInterner::register_class(self, def)
    }

    fn class_def(&self, id: ClassId) -> Option<Arc<ClassDef>> {
        TypeInterner::class_def(self, id)
    }

    fn builtins(&self) -> Builtins {
        TypeInterner::builtins(self)
    }

    fn fresh_scope(&self) -> ScopeId {
        TypeInterner::fresh_scope(self)
    }

    fn union(&self, members: Vec<TypeId>) -> TypeId {
        TypeInterner::union(self, members)
    }

    fn union2(&self, left: TypeId, right: TypeId) -> TypeId {
        TypeInterner::union2(self, left, right)
    }

    fn instance(&self, class: ClassId, args: Vec<TypeId>) -> TypeId {
        TypeInterner::instance(self, class, args)
    }

    fn unspecialized_instance(&self, class: ClassId) -> TypeId {
        TypeInterner::unspecialized_instance(self, class)
    }

    fn instantiable(&self, class: ClassId, args: Vec<TypeId>) -> TypeId {
        TypeInterner::instantiable(self, class, args)
    }

    fn tuple(&self, elements: Vec<TupleElement>) -> TypeId {
        TypeInterner::tuple(self, elements)
    }

    fn unpacked_tuple(&self, elements: Vec<TupleElement>) -> TypeId {
        TypeInterner::unpacked_tuple(self, elements)
    }

    fn callable(&self, shape: CallableShape) -> TypeId {
        TypeInterner::callable(self, shape)
    }

    fn type_var(&self, info: TypeVarInfo) -> TypeId {
        TypeInterner::type_var(self, info)
    }

    fn literal_int(&self, value: i64) -> TypeId {
        TypeInterner::literal_int(self, value)
    }

    fn literal_str(&self, value: &str) -> TypeId {
        TypeInterner::literal_str(self, value)
    }

    fn literal_bytes(&self, value: &str) -> TypeId {
        TypeInterner::literal_bytes(self, value)
    }

    fn literal_bool(&self, value: bool) -> TypeId {
        TypeInterner::literal_bool(self, value)
    }

    fn literal_class(&self, value: LiteralValue) -> ClassId {
        TypeInterner::literal_class(self, value)
    }

    fn object_type(&self) -> TypeId {
        TypeInterner::object_type(self)
    }
}
