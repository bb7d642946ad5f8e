//! Type interning for structural deduplication.
//!
//! Converts `TypeKey` structures into lightweight `TypeId` handles.
//!
//! Benefits:
//! - O(1) type equality (just compare TypeId values)
//! - Memory efficient (each unique structure stored once)
//! - Cache-friendly (work with u32 handles instead of heap objects)

use crate::interner::{Atom, StringInterner};
use crate::limits::TYPE_LIST_INLINE;
use crate::types::*;
use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;
use std::hash::Hash;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, RwLock};

type TypeListBuffer = SmallVec<[TypeId; TYPE_LIST_INLINE]>;

struct SliceInterner<T> {
    items: Vec<Arc<[T]>>,
    map: FxHashMap<Arc<[T]>, u32>,
}

impl<T> SliceInterner<T>
where
    T: Eq + Hash,
{
    fn new() -> Self {
        let empty: Arc<[T]> = Arc::from(Vec::new());
        let mut map = FxHashMap::default();
        map.insert(empty.clone(), 0);
        SliceInterner {
            items: vec![empty],
            map,
        }
    }

    fn intern(&mut self, items: Vec<T>) -> u32 {
        if items.is_empty() {
            return 0;
        }

        if let Some(&id) = self.map.get(items.as_slice()) {
            return id;
        }

        let arc: Arc<[T]> = items.into();
        let id = self.items.len() as u32;
        self.items.push(arc.clone());
        self.map.insert(arc, id);
        id
    }

    fn get(&self, id: u32) -> Arc<[T]> {
        self.items
            .get(id as usize)
            .cloned()
            .unwrap_or_else(|| self.items[0].clone())
    }
}

struct ShapeInterner {
    items: Vec<Arc<CallableShape>>,
    map: FxHashMap<Arc<CallableShape>, u32>,
}

impl ShapeInterner {
    fn new() -> Self {
        ShapeInterner {
            items: Vec::new(),
            map: FxHashMap::default(),
        }
    }

    fn intern(&mut self, shape: CallableShape) -> u32 {
        if let Some(&id) = self.map.get(&shape) {
            return id;
        }
        let arc = Arc::new(shape);
        let id = self.items.len() as u32;
        self.items.push(arc.clone());
        self.map.insert(arc, id);
        id
    }

    fn get(&self, id: u32) -> Option<Arc<CallableShape>> {
        self.items.get(id as usize).cloned()
    }
}

struct InternState {
    key_to_id: FxHashMap<TypeKey, TypeId>,
    id_to_key: Vec<TypeKey>,
    type_lists: SliceInterner<TypeId>,
    tuple_lists: SliceInterner<TupleElement>,
    callables: ShapeInterner,
}

impl InternState {
    /// Seed the intrinsic sentinels so their ids match the `TypeId`
    /// constants.
    fn seeded() -> Self {
        let mut state = InternState {
            key_to_id: FxHashMap::default(),
            id_to_key: Vec::with_capacity(64),
            type_lists: SliceInterner::new(),
            tuple_lists: SliceInterner::new(),
            callables: ShapeInterner::new(),
        };
        for kind in [
            IntrinsicKind::Unknown,
            IntrinsicKind::Any,
            IntrinsicKind::Never,
            IntrinsicKind::None,
        ] {
            let key = TypeKey::Intrinsic(kind);
            let id = TypeId(state.id_to_key.len() as u32);
            state.id_to_key.push(key);
            state.key_to_id.insert(key, id);
        }
        debug_assert_eq!(state.key_to_id[&TypeKey::Intrinsic(IntrinsicKind::Unknown)], TypeId::UNKNOWN);
        debug_assert_eq!(state.key_to_id[&TypeKey::Intrinsic(IntrinsicKind::None)], TypeId::NONE);
        state
    }
}

/// Class handles for the pre-registered builtin classes.
#[derive(Clone, Copy, Debug)]
pub struct Builtins {
    pub object: ClassId,
    pub type_: ClassId,
    pub sequence: ClassId,
    pub tuple: ClassId,
    pub list: ClassId,
    pub dict: ClassId,
    pub set: ClassId,
    pub int: ClassId,
    pub float: ClassId,
    pub bool: ClassId,
    pub str: ClassId,
    pub bytes: ClassId,
    pub none_type: ClassId,
}

/// The type interning engine.
///
/// All methods take `&self`; interior locks make the interner shareable
/// across solver components. Poisoned locks degrade to sentinel values
/// rather than panicking.
pub struct TypeInterner {
    strings: StringInterner,
    state: RwLock<InternState>,
    classes: RwLock<Vec<Arc<ClassDef>>>,
    next_scope: AtomicU32,
    builtins: Builtins,
}

impl TypeInterner {
    pub fn new() -> Self {
        let placeholder = Builtins {
            object: ClassId(0),
            type_: ClassId(0),
            sequence: ClassId(0),
            tuple: ClassId(0),
            list: ClassId(0),
            dict: ClassId(0),
            set: ClassId(0),
            int: ClassId(0),
            float: ClassId(0),
            bool: ClassId(0),
            str: ClassId(0),
            bytes: ClassId(0),
            none_type: ClassId(0),
        };
        let strings = StringInterner::new();
        strings.intern_common();
        let mut interner = TypeInterner {
            strings,
            state: RwLock::new(InternState::seeded()),
            classes: RwLock::new(Vec::new()),
            // Scope 0 is the builtins scope; classes registered below mint
            // their own scopes starting at 1.
            next_scope: AtomicU32::new(1),
            builtins: placeholder,
        };
        interner.builtins = interner.register_builtins();
        interner
    }

    fn register_builtins(&self) -> Builtins {
        let object = self.register_class(ClassDef {
            name: self.intern_string("object"),
            type_params: Vec::new(),
            bases: Vec::new(),
            flags: ClassFlags::empty(),
        });
        let object_instance = self.instance(object, Vec::new());

        // Each generic builtin gets its own scope so its parameters never
        // collide with another class's parameters of the same name.
        let param = |name: &str, variance: Variance| {
            let mut tv = TypeVarInfo::standard(self.intern_string(name), self.fresh_scope());
            tv.variance = variance;
            tv
        };
        let class = |name: &str, type_params: Vec<TypeVarInfo>, bases: Vec<TypeId>| {
            self.register_class(ClassDef {
                name: self.intern_string(name),
                type_params,
                bases,
                flags: ClassFlags::empty(),
            })
        };

        let type_ = class(
            "type",
            vec![param("_T", Variance::Covariant)],
            vec![object_instance],
        );

        let seq_param = param("_T_co", Variance::Covariant);
        let sequence = class("Sequence", vec![seq_param], vec![object_instance]);

        // tuple and list are Sequences of their element type.
        let tuple_param = param("_T_co", Variance::Covariant);
        let tuple = class(
            "tuple",
            vec![tuple_param],
            vec![self.instance(sequence, vec![self.type_var(tuple_param)])],
        );
        let list_param = param("_T", Variance::Invariant);
        let list = class(
            "list",
            vec![list_param],
            vec![self.instance(sequence, vec![self.type_var(list_param)])],
        );

        let dict_scope = self.fresh_scope();
        let dict = class(
            "dict",
            vec![
                TypeVarInfo::standard(self.intern_string("_KT"), dict_scope),
                TypeVarInfo::standard(self.intern_string("_VT"), dict_scope),
            ],
            vec![object_instance],
        );
        let set = class(
            "set",
            vec![param("_T", Variance::Invariant)],
            vec![object_instance],
        );

        let int = class("int", Vec::new(), vec![object_instance]);
        let float = class("float", Vec::new(), vec![object_instance]);
        let bool_class = class("bool", Vec::new(), vec![self.instance(int, Vec::new())]);
        let str_class = class("str", Vec::new(), vec![object_instance]);
        let bytes = class("bytes", Vec::new(), vec![object_instance]);
        let none_type = class("NoneType", Vec::new(), vec![object_instance]);

        Builtins {
            object,
            type_,
            sequence,
            tuple,
            list,
            dict,
            set,
            int,
            float,
            bool: bool_class,
            str: str_class,
            bytes,
            none_type,
        }
    }

    pub fn builtins(&self) -> Builtins {
        self.builtins
    }

    /// Mint a scope id no declaration has used yet.
    pub fn fresh_scope(&self) -> ScopeId {
        ScopeId(self.next_scope.fetch_add(1, Ordering::Relaxed))
    }

    pub fn intern(&self, key: TypeKey) -> TypeId {
        // Fast path: already interned.
        if let Ok(state) = self.state.read()
            && let Some(&id) = state.key_to_id.get(&key)
        {
            return id;
        }

        let Ok(mut state) = self.state.write() else {
            return TypeId::UNKNOWN;
        };
        if let Some(&id) = state.key_to_id.get(&key) {
            return id;
        }
        let id = TypeId(state.id_to_key.len() as u32);
        state.id_to_key.push(key);
        state.key_to_id.insert(key, id);
        id
    }

    pub fn lookup(&self, id: TypeId) -> Option<TypeKey> {
        let state = self.state.read().ok()?;
        state.id_to_key.get(id.0 as usize).copied()
    }

    pub fn intern_string(&self, s: &str) -> Atom {
        self.strings.intern(s)
    }

    pub fn resolve_atom(&self, atom: Atom) -> String {
        self.strings.resolve(atom).to_string()
    }

    pub fn resolve_atom_ref(&self, atom: Atom) -> Arc<str> {
        self.strings.resolve(atom)
    }

    pub fn intern_type_list(&self, items: Vec<TypeId>) -> TypeListId {
        match self.state.write() {
            Ok(mut state) => TypeListId(state.type_lists.intern(items)),
            Err(_) => TypeListId::EMPTY,
        }
    }

    pub fn type_list(&self, id: TypeListId) -> Arc<[TypeId]> {
        match self.state.read() {
            Ok(state) => state.type_lists.get(id.0),
            Err(_) => Arc::from(Vec::new()),
        }
    }

    pub fn intern_tuple_list(&self, items: Vec<TupleElement>) -> TupleListId {
        match self.state.write() {
            Ok(mut state) => TupleListId(state.tuple_lists.intern(items)),
            Err(_) => TupleListId::EMPTY,
        }
    }

    pub fn tuple_list(&self, id: TupleListId) -> Arc<[TupleElement]> {
        match self.state.read() {
            Ok(state) => state.tuple_lists.get(id.0),
            Err(_) => Arc::from(Vec::new()),
        }
    }

    pub fn callable_shape(&self, id: CallableShapeId) -> Option<Arc<CallableShape>> {
        let state = self.state.read().ok()?;
        state.callables.get(id.0)
    }

    pub fn register_class(&self, def: ClassDef) -> ClassId {
        match self.classes.write() {
            Ok(mut classes) => {
                let id = ClassId(classes.len() as u32);
                classes.push(Arc::new(def));
                id
            }
            Err(_) => ClassId(0),
        }
    }

    pub fn class_def(&self, id: ClassId) -> Option<Arc<ClassDef>> {
        let classes = self.classes.read().ok()?;
        classes.get(id.0 as usize).cloned()
    }

    // ------------------------------------------------------------------
    // Constructors
    // ------------------------------------------------------------------

    pub fn instance(&self, class: ClassId, args: Vec<TypeId>) -> TypeId {
        let args = self.intern_type_list(args);
        self.intern(TypeKey::Instance(ClassType {
            class,
            args: Some(args),
        }))
    }

    /// A generic class instance whose type arguments have not been
    /// provided (`list` rather than `list[int]`).
    pub fn unspecialized_instance(&self, class: ClassId) -> TypeId {
        self.intern(TypeKey::Instance(ClassType { class, args: None }))
    }

    pub fn instantiable(&self, class: ClassId, args: Vec<TypeId>) -> TypeId {
        let args = self.intern_type_list(args);
        self.intern(TypeKey::Instantiable(ClassType {
            class,
            args: Some(args),
        }))
    }

    pub fn tuple(&self, elements: Vec<TupleElement>) -> TypeId {
        let id = self.intern_tuple_list(elements);
        self.intern(TypeKey::Tuple(id))
    }

    pub fn unpacked_tuple(&self, elements: Vec<TupleElement>) -> TypeId {
        let id = self.intern_tuple_list(elements);
        self.intern(TypeKey::UnpackedTuple(id))
    }

    pub fn callable(&self, shape: CallableShape) -> TypeId {
        let id = match self.state.write() {
            Ok(mut state) => CallableShapeId(state.callables.intern(shape)),
            Err(_) => return TypeId::UNKNOWN,
        };
        self.intern(TypeKey::Callable(id))
    }

    pub fn type_var(&self, info: TypeVarInfo) -> TypeId {
        self.intern(TypeKey::TypeVar(info))
    }

    pub fn literal_int(&self, value: i64) -> TypeId {
        self.intern(TypeKey::Literal(LiteralValue::Int(value)))
    }

    pub fn literal_str(&self, value: &str) -> TypeId {
        let atom = self.strings.intern(value);
        self.intern(TypeKey::Literal(LiteralValue::Str(atom)))
    }

    pub fn literal_bytes(&self, value: &str) -> TypeId {
        let atom = self.strings.intern(value);
        self.intern(TypeKey::Literal(LiteralValue::Bytes(atom)))
    }

    pub fn literal_bool(&self, value: bool) -> TypeId {
        self.intern(TypeKey::Literal(LiteralValue::Bool(value)))
    }

    /// The class a literal value is an instance of.
    pub fn literal_class(&self, value: LiteralValue) -> ClassId {
        match value {
            LiteralValue::Int(_) => self.builtins.int,
            LiteralValue::Str(_) => self.builtins.str,
            LiteralValue::Bytes(_) => self.builtins.bytes,
            LiteralValue::Bool(_) => self.builtins.bool,
        }
    }

    /// `object`'s instance type, the top of the non-gradual lattice.
    pub fn object_type(&self) -> TypeId {
        self.instance(self.builtins.object, Vec::new())
    }

    // ------------------------------------------------------------------
    // Union construction
    // ------------------------------------------------------------------

    /// Build a normalized union: nested unions are flattened, duplicates
    /// dropped (first occurrence wins), `Never` members removed. A gradual
    /// member absorbs the whole union.
    pub fn union(&self, members: Vec<TypeId>) -> TypeId {
        let mut flat = TypeListBuffer::new();
        let mut seen = FxHashSet::default();
        for member in members {
            self.flatten_union_member(member, &mut flat, &mut seen);
        }

        if flat.iter().any(|&m| m == TypeId::ANY) {
            return TypeId::ANY;
        }
        if flat.iter().any(|&m| m == TypeId::UNKNOWN) {
            return TypeId::UNKNOWN;
        }

        match flat.len() {
            0 => TypeId::NEVER,
            1 => flat[0],
            _ => {
                let id = self.intern_type_list(flat.into_vec());
                self.intern(TypeKey::Union(id))
            }
        }
    }

    pub fn union2(&self, left: TypeId, right: TypeId) -> TypeId {
        if left == right {
            return left;
        }
        self.union(vec![left, right])
    }

    fn flatten_union_member(
        &self,
        member: TypeId,
        out: &mut TypeListBuffer,
        seen: &mut FxHashSet<TypeId>,
    ) {
        if member == TypeId::NEVER {
            return;
        }
        if let Some(TypeKey::Union(list)) = self.lookup(member) {
            let list = self.type_list(list);
            for &inner in list.iter() {
                self.flatten_union_member(inner, out, seen);
            }
            return;
        }
        if seen.insert(member) {
            out.push(member);
        }
    }
}

impl Default for TypeInterner {
    fn default() -> Self {
        Self::new()
    }
}
