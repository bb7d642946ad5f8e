//! Human-readable type formatting.
//!
//! Renders interned types in Python's type-expression notation for
//! diagnostics and trace output. Rendering is deliberately kept out of the
//! solving path; messages carry `TypeId`s and format them only when shown.

use crate::db::TypeDatabase;
use crate::limits::UNION_MEMBER_DIAGNOSTIC_LIMIT;
use crate::types::{
    IntrinsicKind, LiteralValue, ParamKind, ParamList, TupleListId, TypeId, TypeKey, TypeVarKind,
};

/// Formats types for display.
pub struct TypeFormatter<'a> {
    db: &'a dyn TypeDatabase,
}

impl<'a> TypeFormatter<'a> {
    pub fn new(db: &'a dyn TypeDatabase) -> Self {
        TypeFormatter { db }
    }

    pub fn format(&self, ty: TypeId) -> String {
        let Some(key) = self.db.lookup(ty) else {
            return "<invalid>".to_string();
        };
        match key {
            TypeKey::Intrinsic(kind) => match kind {
                IntrinsicKind::Any => "Any".to_string(),
                IntrinsicKind::Unknown => "Unknown".to_string(),
                IntrinsicKind::Never => "Never".to_string(),
                IntrinsicKind::None => "None".to_string(),
            },
            TypeKey::Instance(ct) => self.format_class(ct),
            TypeKey::Instantiable(ct) => format!("type[{}]", self.format_class(ct)),
            TypeKey::Literal(value) => self.format_literal(value),
            TypeKey::Union(list) => {
                let members = self.db.type_list(list);
                let mut parts: Vec<String> = members
                    .iter()
                    .take(UNION_MEMBER_DIAGNOSTIC_LIMIT)
                    .map(|&m| self.format(m))
                    .collect();
                if members.len() > UNION_MEMBER_DIAGNOSTIC_LIMIT {
                    parts.push("...".to_string());
                }
                parts.join(" | ")
            }
            TypeKey::Tuple(list) => self.format_tuple(list),
            TypeKey::UnpackedTuple(list) => format!("*{}", self.format_tuple(list)),
            TypeKey::Callable(shape_id) => {
                let Some(shape) = self.db.callable_shape(shape_id) else {
                    return "<invalid>".to_string();
                };
                let params = match &shape.params {
                    ParamList::Gradual => "...".to_string(),
                    ParamList::Params { params, param_spec } => {
                        let mut parts: Vec<String> = params
                            .iter()
                            .map(|p| {
                                let name = self.db.resolve_atom(p.name);
                                let ty = self.format(p.ty);
                                match p.kind {
                                    ParamKind::Positional | ParamKind::KeywordOnly => {
                                        format!("{name}: {ty}")
                                    }
                                    ParamKind::VarArgs => format!("*{name}: {ty}"),
                                    ParamKind::KwArgs => format!("**{name}: {ty}"),
                                }
                            })
                            .collect();
                        if let Some(spec) = param_spec {
                            parts.push(format!("**{}", self.db.resolve_atom(spec.name)));
                        }
                        parts.join(", ")
                    }
                };
                format!("({params}) -> {}", self.format(shape.ret))
            }
            TypeKey::TypeVar(info) => {
                let name = self.db.resolve_atom(info.name);
                if info.kind == TypeVarKind::Variadic
                    && info.flags.contains(crate::types::TypeVarFlags::UNPACKED)
                {
                    format!("*{name}")
                } else {
                    name
                }
            }
        }
    }

    fn format_class(&self, ct: crate::types::ClassType) -> String {
        let name = match self.db.class_def(ct.class) {
            Some(def) => self.db.resolve_atom(def.name),
            None => return "<invalid>".to_string(),
        };
        match ct.args {
            Some(args) if !args.is_empty() => {
                let args = self.db.type_list(args);
                let parts: Vec<String> = args.iter().map(|&a| self.format(a)).collect();
                format!("{name}[{}]", parts.join(", "))
            }
            _ => name,
        }
    }

    fn format_tuple(&self, list: TupleListId) -> String {
        let elements = self.db.tuple_list(list);
        if elements.is_empty() {
            return "tuple[()]".to_string();
        }
        let parts: Vec<String> = elements
            .iter()
            .map(|e| {
                let ty = self.format(e.type_id);
                if e.unbounded { format!("{ty}, ...") } else { ty }
            })
            .collect();
        format!("tuple[{}]", parts.join(", "))
    }

    fn format_literal(&self, value: LiteralValue) -> String {
        match value {
            LiteralValue::Int(v) => format!("Literal[{v}]"),
            LiteralValue::Str(atom) => format!("Literal['{}']", self.db.resolve_atom(atom)),
            LiteralValue::Bytes(atom) => format!("Literal[b'{}']", self.db.resolve_atom(atom)),
            LiteralValue::Bool(v) => format!("Literal[{}]", if v { "True" } else { "False" }),
        }
    }
}
