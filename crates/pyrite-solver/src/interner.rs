//! String interner for identifier deduplication.
//!
//! Intern strings into a shared pool and pass around u32 indices (Atoms).
//! This eliminates duplicate string allocations for common identifiers like
//! "_T", "self", "__init__", etc.
//!
//! Comparisons become integer comparisons (atom_a == atom_b) instead of
//! string comparisons, which is significantly faster. Type variable identity
//! in the solver is (name, scope), so atom equality is on the hot path.

use rustc_hash::FxHashMap;
use std::sync::{Arc, RwLock};

/// An interned string identifier.
///
/// Atoms are cheap to copy (just a u32) and can be compared with == in O(1).
/// To get the actual string, use `StringInterner::resolve(atom)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct Atom(pub u32);

impl Atom {
    /// A sentinel value representing no atom / empty string.
    pub const NONE: Atom = Atom(0);

    /// Check if this is the empty/none atom.
    #[inline]
    pub fn is_none(self) -> bool {
        self.0 == 0
    }

    /// Get the raw index value.
    #[inline]
    pub fn index(self) -> u32 {
        self.0
    }
}

const COMMON_STRINGS: &[&str] = &[
    // Keywords
    "False",
    "None",
    "True",
    "and",
    "as",
    "assert",
    "async",
    "await",
    "break",
    "class",
    "continue",
    "def",
    "del",
    "elif",
    "else",
    "except",
    "finally",
    "for",
    "from",
    "global",
    "if",
    "import",
    "in",
    "is",
    "lambda",
    "nonlocal",
    "not",
    "or",
    "pass",
    "raise",
    "return",
    "try",
    "while",
    "with",
    "yield",
    // Builtin types and typing names
    "object",
    "type",
    "tuple",
    "str",
    "bytes",
    "int",
    "float",
    "bool",
    "list",
    "dict",
    "set",
    "frozenset",
    "NoneType",
    "Any",
    "Never",
    "Unknown",
    "Optional",
    "Union",
    "Callable",
    "Sequence",
    "Mapping",
    "Iterable",
    "Iterator",
    "Generic",
    "Protocol",
    "Literal",
    "Self",
    "AnyStr",
    // Common identifiers
    "self",
    "cls",
    "value",
    "name",
    "key",
    "item",
    "args",
    "kwargs",
    "_T",
    "_S",
    "_KT",
    "_VT",
    "_P",
    "_Ts",
    "T",
    "S",
    "P",
    // Dunders
    "__init__",
    "__new__",
    "__call__",
    "__iter__",
    "__next__",
    "__getitem__",
    "__setitem__",
    "__len__",
    "__contains__",
    "__enter__",
    "__exit__",
    "__name__",
    "__class__",
];

#[derive(Default)]
struct InternerState {
    map: FxHashMap<Arc<str>, Atom>,
    strings: Vec<Arc<str>>,
}

/// String interner that deduplicates strings and returns Atom handles.
///
/// Interior-mutable so it can sit behind a shared `TypeDatabase` reference;
/// a single RwLock suffices at the volume of names the solver touches.
///
/// # Example
/// ```
/// use pyrite_solver::interner::StringInterner;
/// let interner = StringInterner::new();
/// let a1 = interner.intern("hello");
/// let a2 = interner.intern("hello");
/// assert_eq!(a1, a2); // Same atom for same string
/// assert_eq!(&*interner.resolve(a1), "hello");
/// ```
pub struct StringInterner {
    state: RwLock<InternerState>,
}

impl StringInterner {
    /// Create a new interner with the empty string pre-interned at index 0.
    pub fn new() -> Self {
        let mut state = InternerState {
            map: FxHashMap::default(),
            strings: Vec::with_capacity(256),
        };
        // Index 0 is reserved for empty/none
        let empty: Arc<str> = Arc::from("");
        state.strings.push(empty.clone());
        state.map.insert(empty, Atom::NONE);
        StringInterner {
            state: RwLock::new(state),
        }
    }

    /// Intern a string, returning its Atom handle.
    /// If the string was already interned, returns the existing Atom.
    #[inline]
    pub fn intern(&self, s: &str) -> Atom {
        if s.is_empty() {
            return Atom::NONE;
        }

        let Ok(mut state) = self.state.write() else {
            // If lock is poisoned, return a fallback atom
            return Atom::NONE;
        };

        if let Some(&atom) = state.map.get(s) {
            return atom;
        }

        let atom = Atom(state.strings.len() as u32);
        let owned: Arc<str> = Arc::from(s);
        state.strings.push(owned.clone());
        state.map.insert(owned, atom);
        atom
    }

    /// Intern an owned String, avoiding allocation if possible.
    #[inline]
    pub fn intern_owned(&self, s: String) -> Atom {
        if s.is_empty() {
            return Atom::NONE;
        }

        let Ok(mut state) = self.state.write() else {
            return Atom::NONE;
        };

        if let Some(&atom) = state.map.get(s.as_str()) {
            return atom;
        }

        let atom = Atom(state.strings.len() as u32);
        let owned: Arc<str> = Arc::from(s.into_boxed_str());
        state.strings.push(owned.clone());
        state.map.insert(owned, atom);
        atom
    }

    /// Resolve an Atom back to its string value.
    /// Returns empty string if atom is out of bounds (safety for error recovery).
    #[inline]
    pub fn resolve(&self, atom: Atom) -> Arc<str> {
        self.try_resolve(atom).unwrap_or_else(|| Arc::from(""))
    }

    /// Try to resolve an Atom, returning None if invalid.
    #[inline]
    pub fn try_resolve(&self, atom: Atom) -> Option<Arc<str>> {
        let state = self.state.read().ok()?; // Return None if lock is poisoned
        state.strings.get(atom.0 as usize).cloned()
    }

    /// Get the number of interned strings.
    #[inline]
    pub fn len(&self) -> usize {
        self.state.read().map(|state| state.strings.len()).unwrap_or(0)
    }

    /// Check if the interner is empty (only has the empty string).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() <= 1
    }

    /// Pre-intern common Python keywords and identifiers.
    /// Call this after creating the interner for better cache locality.
    pub fn intern_common(&self) {
        for s in COMMON_STRINGS {
            self.intern(s);
        }
    }
}

impl Default for StringInterner {
    fn default() -> Self {
        Self::new()
    }
}
