//! Diagnostic accumulation for solve failures.
//!
//! Failures in the solver are boolean returns plus, optionally, appended
//! diagnostic text. To keep the solving path cheap (bind attempts are
//! discarded wholesale during overload resolution), messages are collected
//! in two phases:
//!
//! 1. **Collection**: store a structured [`SolveMessage`] carrying `TypeId`
//!    and `Atom` arguments — no string formatting.
//! 2. **Rendering**: resolve the arguments against the database and format
//!    only when the message is actually displayed.
//!
//! The addendum forms a tree: each nested explanation is a child addendum,
//! rendered with increasing indentation.

use crate::db::TypeDatabase;
use crate::format::TypeFormatter;
use crate::interner::Atom;
use crate::types::TypeId;

/// A structured solve-failure message. Rendering is deferred until display.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SolveMessage {
    /// A type variable was solved for outside the context responsible
    /// for it.
    TypeVarNotInScope { type_var: Atom },
    /// `src` is not assignable to `dest`.
    TypeAssignmentMismatch { dest: TypeId, src: TypeId },
    /// A new observation conflicts with the bound already recorded.
    BoundConflict {
        type_var: Atom,
        existing: TypeId,
        offending: TypeId,
    },
    /// The solved type violates the variable's declared upper bound.
    TypeBound {
        type_var: Atom,
        bound: TypeId,
        solved: TypeId,
    },
    /// No declared constraint of the variable accepts the source type.
    TypeConstrainedTypeVar { type_var: Atom, src: TypeId },
    /// A ParamSpec met a source that is neither a ParamSpec, a callable,
    /// nor gradual.
    ParamSpecMismatch { type_var: Atom, src: TypeId },
    /// A value of the wrong shape reached a destination type variable
    /// (e.g. an instance form where `type[T]` was required).
    TypeVarShapeMismatch { type_var: Atom, src: TypeId },
    /// A locked context rejected a widening update.
    LockedContext { type_var: Atom, src: TypeId },
}

impl SolveMessage {
    fn render(&self, db: &dyn TypeDatabase) -> String {
        let f = TypeFormatter::new(db);
        match *self {
            SolveMessage::TypeVarNotInScope { type_var } => {
                format!(
                    "type variable \"{}\" is not in scope for this context",
                    db.resolve_atom(type_var)
                )
            }
            SolveMessage::TypeAssignmentMismatch { dest, src } => {
                format!(
                    "type \"{}\" is not assignable to \"{}\"",
                    f.format(src),
                    f.format(dest)
                )
            }
            SolveMessage::BoundConflict {
                type_var,
                existing,
                offending,
            } => format!(
                "type \"{}\" conflicts with \"{}\" previously solved for \"{}\"",
                f.format(offending),
                f.format(existing),
                db.resolve_atom(type_var)
            ),
            SolveMessage::TypeBound {
                type_var,
                bound,
                solved,
            } => format!(
                "type \"{}\" is not assignable to the bound \"{}\" of type variable \"{}\"",
                f.format(solved),
                f.format(bound),
                db.resolve_atom(type_var)
            ),
            SolveMessage::TypeConstrainedTypeVar { type_var, src } => format!(
                "type \"{}\" satisfies no constraint of type variable \"{}\"",
                f.format(src),
                db.resolve_atom(type_var)
            ),
            SolveMessage::ParamSpecMismatch { type_var, src } => format!(
                "type \"{}\" cannot be matched against ParamSpec \"{}\"",
                f.format(src),
                db.resolve_atom(type_var)
            ),
            SolveMessage::TypeVarShapeMismatch { type_var, src } => format!(
                "type \"{}\" has the wrong shape for type variable \"{}\"",
                f.format(src),
                db.resolve_atom(type_var)
            ),
            SolveMessage::LockedContext { type_var, src } => format!(
                "type \"{}\" would change the finalized solution for \"{}\"",
                f.format(src),
                db.resolve_atom(type_var)
            ),
        }
    }
}

/// Accumulates nested explanation text for a failed solve.
///
/// The solver only appends; the sole read-back it performs is
/// [`is_empty`](DiagnosticAddendum::is_empty).
#[derive(Clone, Debug, Default)]
pub struct DiagnosticAddendum {
    messages: Vec<SolveMessage>,
    children: Vec<DiagnosticAddendum>,
}

impl DiagnosticAddendum {
    pub fn new() -> Self {
        DiagnosticAddendum::default()
    }

    pub fn add_message(&mut self, message: SolveMessage) {
        self.messages.push(message);
    }

    /// Open a nested addendum for a sub-explanation.
    pub fn addendum(&mut self) -> &mut DiagnosticAddendum {
        self.children.push(DiagnosticAddendum::new());
        self.children
            .last_mut()
            .unwrap_or_else(|| unreachable!("child pushed above"))
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty() && self.children.iter().all(|c| c.is_empty())
    }

    /// Messages recorded at this level (not descendants).
    pub fn messages(&self) -> &[SolveMessage] {
        &self.messages
    }

    /// Render the whole tree, two spaces of indentation per level.
    pub fn render(&self, db: &dyn TypeDatabase) -> String {
        let mut out = String::new();
        self.render_into(db, 0, &mut out);
        out
    }

    fn render_into(&self, db: &dyn TypeDatabase, depth: usize, out: &mut String) {
        for message in &self.messages {
            for _ in 0..depth {
                out.push_str("  ");
            }
            out.push_str(&message.render(db));
            out.push('\n');
        }
        for child in &self.children {
            child.render_into(db, depth + 1, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intern::TypeInterner;

    #[test]
    fn empty_until_first_message() {
        let mut diag = DiagnosticAddendum::new();
        assert!(diag.is_empty());
        // An empty child keeps the tree empty.
        diag.addendum();
        assert!(diag.is_empty());
        diag.add_message(SolveMessage::TypeVarNotInScope {
            type_var: Atom::NONE,
        });
        assert!(!diag.is_empty());
    }

    #[test]
    fn rendering_is_deferred_and_indented() {
        let interner = TypeInterner::new();
        let db: &dyn TypeDatabase = &interner;
        let b = db.builtins();
        let int = db.instance(b.int, Vec::new());
        let str_ty = db.instance(b.str, Vec::new());

        let mut diag = DiagnosticAddendum::new();
        diag.add_message(SolveMessage::TypeAssignmentMismatch {
            dest: int,
            src: str_ty,
        });
        let child = diag.addendum();
        child.add_message(SolveMessage::TypeBound {
            type_var: db.intern_string("_T"),
            bound: int,
            solved: str_ty,
        });

        let text = diag.render(db);
        assert!(text.contains("\"str\" is not assignable to \"int\""), "{text}");
        assert!(text.contains("\n  type \"str\""), "{text}");
    }
}
