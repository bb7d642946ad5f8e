//! Core type representations for the solver.
//!
//! Types are structural values (`TypeKey`) interned into lightweight
//! `TypeId` handles. Large payloads (union member lists, tuple element
//! lists, callable shapes) live behind secondary ids so `TypeKey` itself
//! stays `Copy`. Equality of interned types is id equality.

use crate::interner::Atom;
use bitflags::bitflags;

/// An interned type handle.
///
/// TypeIds are cheap to copy and compare. Two structurally identical types
/// always intern to the same id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub u32);

impl TypeId {
    /// The implicit "we don't know" type. Assignable in both directions,
    /// but distinguished from `Any` so diagnostics can tell an inference
    /// failure from an explicit escape hatch.
    pub const UNKNOWN: TypeId = TypeId(0);
    /// The explicit gradual type (`Any`).
    pub const ANY: TypeId = TypeId(1);
    /// The uninhabited bottom type (`Never`).
    pub const NEVER: TypeId = TypeId(2);
    /// The `None` singleton's type.
    pub const NONE: TypeId = TypeId(3);
    /// First id handed out for user types; everything below is pre-seeded.
    pub const FIRST_USER: TypeId = TypeId(4);

    #[inline]
    pub fn index(self) -> u32 {
        self.0
    }
}

/// Handle for an interned list of types (union members, class type args).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TypeListId(pub u32);

impl TypeListId {
    /// The empty list, pre-interned at index 0.
    pub const EMPTY: TypeListId = TypeListId(0);

    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

/// Handle for an interned list of tuple elements.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TupleListId(pub u32);

impl TupleListId {
    pub const EMPTY: TupleListId = TupleListId(0);
}

/// Handle for an interned callable shape.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CallableShapeId(pub u32);

/// Handle for a registered class definition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(pub u32);

/// Identifies the binding scope a type variable belongs to (the function,
/// class, or alias that declared it). Two type variables with the same name
/// in different scopes are different variables.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(pub u32);

impl ScopeId {
    /// The builtins scope; class type parameters registered at startup
    /// live here.
    pub const BUILTINS: ScopeId = ScopeId(0);
}

/// Types with no internal structure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IntrinsicKind {
    Any,
    Unknown,
    Never,
    None,
}

/// A literal value, used for types like `Literal[3]` or `Literal["a"]`.
/// The runtime class is implied by the variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LiteralValue {
    Int(i64),
    Str(Atom),
    Bytes(Atom),
    Bool(bool),
}

/// Declared variance of a class type parameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Variance {
    #[default]
    Invariant,
    Covariant,
    Contravariant,
}

impl Variance {
    /// Variance of a position nested inside another position.
    ///
    /// An invariant outer position forces exact matching everywhere below
    /// it; a contravariant outer position flips the inner direction.
    #[inline]
    pub fn compose(self, inner: Variance) -> Variance {
        match self {
            Variance::Invariant => Variance::Invariant,
            Variance::Covariant => inner,
            Variance::Contravariant => match inner {
                Variance::Invariant => Variance::Invariant,
                Variance::Covariant => Variance::Contravariant,
                Variance::Contravariant => Variance::Covariant,
            },
        }
    }
}

/// The three kinds of type variable Python's typing system defines.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum TypeVarKind {
    #[default]
    Standard,
    /// `ParamSpec`: stands for an entire parameter list.
    ParamSpec,
    /// `TypeVarTuple`: stands for a run of tuple elements.
    Variadic,
}

bitflags! {
    /// Behavior modifiers on a type variable.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct TypeVarFlags: u16 {
        /// Created by the checker rather than written by the user.
        /// Synthesized variables escape scope filtering during solving.
        const SYNTHESIZED = 1 << 0;
        /// The synthesized `Self` variable of a method. Exempt from the
        /// synthesized-escape rule: it still respects scope filtering.
        const SYNTHESIZED_SELF = 1 << 1;
        /// Marks a variable that should unify with itself when it appears
        /// on both sides of a check (live placeholder during back-solving).
        const IN_SCOPE_PLACEHOLDER = 1 << 2;
        /// Skip upper-bound validation when this variable is bound.
        const EXEMPT_FROM_BOUND_CHECK = 1 << 3;
        /// A `TypeVarTuple` appearing in unpacked position (`*Ts`).
        const UNPACKED = 1 << 4;
        /// The variable ranges over `type[X]` rather than instances.
        const INSTANTIABLE = 1 << 5;
    }
}

/// A type variable. Small enough to live inline in `TypeKey`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TypeVarInfo {
    pub name: Atom,
    pub scope: ScopeId,
    pub kind: TypeVarKind,
    pub variance: Variance,
    /// Upper bound (`TypeVar("T", bound=X)`), if declared.
    pub bound: Option<TypeId>,
    /// Value constraints (`TypeVar("T", int, str)`). `EMPTY` means
    /// unconstrained.
    pub constraints: TypeListId,
    pub flags: TypeVarFlags,
}

impl TypeVarInfo {
    /// A plain unconstrained type variable.
    pub fn standard(name: Atom, scope: ScopeId) -> TypeVarInfo {
        TypeVarInfo {
            name,
            scope,
            kind: TypeVarKind::Standard,
            variance: Variance::default(),
            bound: None,
            constraints: TypeListId::EMPTY,
            flags: TypeVarFlags::empty(),
        }
    }

    /// Identity used to key constraint-table entries.
    #[inline]
    pub fn key(&self) -> TypeVarKey {
        TypeVarKey {
            name: self.name,
            scope: self.scope,
        }
    }

    #[inline]
    pub fn is_param_spec(&self) -> bool {
        self.kind == TypeVarKind::ParamSpec
    }

    #[inline]
    pub fn is_variadic(&self) -> bool {
        self.kind == TypeVarKind::Variadic
    }

    /// Constrained TypeVars (`AnyStr` style) resolve by picking a
    /// constraint instead of accumulating bounds.
    #[inline]
    pub fn is_constrained(&self) -> bool {
        !self.constraints.is_empty()
    }
}

/// (name, scope) pair identifying a type variable across specializations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TypeVarKey {
    pub name: Atom,
    pub scope: ScopeId,
}

/// A class reference with optional type arguments.
///
/// `args: None` means the generic class is unspecialized (its parameters
/// have not been filled in); `Some` with an empty list is a non-generic
/// class.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ClassType {
    pub class: ClassId,
    pub args: Option<TypeListId>,
}

/// One element of a tuple type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TupleElement {
    pub type_id: TypeId,
    /// True for `*tuple[X, ...]` elements: zero or more values of this
    /// type at this position.
    pub unbounded: bool,
}

impl TupleElement {
    pub fn new(type_id: TypeId) -> TupleElement {
        TupleElement {
            type_id,
            unbounded: false,
        }
    }
}

/// How a callable parameter accepts its argument.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ParamKind {
    Positional,
    KeywordOnly,
    VarArgs,
    KwArgs,
}

/// One parameter of a callable shape.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Param {
    pub name: Atom,
    pub ty: TypeId,
    pub kind: ParamKind,
}

/// Parameter list of a callable.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ParamList {
    /// `Callable[..., X]`: accepts anything (gradual form).
    Gradual,
    Params {
        params: Vec<Param>,
        /// Trailing `ParamSpec` capturing the rest of the signature
        /// (`Concatenate[int, P]` keeps `int` in `params`).
        param_spec: Option<TypeVarInfo>,
    },
}

impl ParamList {
    pub fn empty() -> ParamList {
        ParamList::Params {
            params: Vec::new(),
            param_spec: None,
        }
    }
}

/// Interned payload of a callable type.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CallableShape {
    pub params: ParamList,
    pub ret: TypeId,
}

impl CallableShape {
    /// `Callable[..., ret]`.
    pub fn gradual(ret: TypeId) -> CallableShape {
        CallableShape {
            params: ParamList::Gradual,
            ret,
        }
    }

    #[inline]
    pub fn is_gradual(&self) -> bool {
        matches!(self.params, ParamList::Gradual)
    }
}

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    pub struct ClassFlags: u8 {
        /// The class (or one of its bases) is `Any`/unresolved, so its
        /// instances are assignable anywhere.
        const DERIVES_FROM_ANY = 1 << 0;
    }
}

/// A registered class definition. Stored once per class; instances refer
/// to it by `ClassId`.
#[derive(Clone, Debug)]
pub struct ClassDef {
    pub name: Atom,
    pub type_params: Vec<TypeVarInfo>,
    /// Direct bases, expressed in terms of `type_params`.
    pub bases: Vec<TypeId>,
    pub flags: ClassFlags,
}

/// Structural key for type interning.
///
/// All payloads are `Copy`; list- and shape-valued payloads are secondary
/// interner ids resolved through the `TypeDatabase`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TypeKey {
    Intrinsic(IntrinsicKind),
    /// An instance of a class, e.g. `int` or `list[str]`.
    Instance(ClassType),
    /// The class object itself, e.g. `type[int]`.
    Instantiable(ClassType),
    Literal(LiteralValue),
    Union(TypeListId),
    Tuple(TupleListId),
    /// An unpacked tuple (`*tuple[int, str]`), as produced when packing
    /// arguments for a `TypeVarTuple`.
    UnpackedTuple(TupleListId),
    Callable(CallableShapeId),
    TypeVar(TypeVarInfo),
}

impl TypeKey {
    #[inline]
    pub fn as_type_var(&self) -> Option<&TypeVarInfo> {
        match self {
            TypeKey::TypeVar(info) => Some(info),
            _ => None,
        }
    }
}
