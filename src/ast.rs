//! Abstract syntax tree for one translation unit.
//!
//! Nodes are a tagged variant allocated from the parser's node arena
//! and addressed by [`NodeId`]. Statement lists hold child ids, and
//! jump statements hold the id of their target label, so the lowered
//! label/jump sequences produced for loops and switches are ordinary
//! data with no ownership cycles.
//!
//! Every expression node carries its resolved result type; the node
//! factory runs the type checker before allocation.

use crate::arena::Id;
use crate::scope::IdentId;
use crate::span::Span;
use crate::types::{TypeId, Value};
use string_interner::DefaultSymbol;

/// An interned identifier name.
pub type Symbol = DefaultSymbol;

pub type NodeId = Id<Node>;

/// Binary operators. Compound assignments are desugared during
/// parsing and never appear here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Comma,
    Assign,
    /// Subscription `p[i]`, typed by pointer rules.
    Index,
    Mul,
    Div,
    Rem,
    Add,
    Sub,
    Shl,
    Shr,
    Lt,
    Gt,
    Le,
    Ge,
    Eq,
    Ne,
    BitAnd,
    BitXor,
    BitOr,
    LogicAnd,
    LogicOr,
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    PostfixInc,
    PostfixDec,
    PrefixInc,
    PrefixDec,
    /// Address-of `&`.
    Addr,
    /// Dereference `*`.
    Deref,
    Plus,
    Minus,
    BitNot,
    LogicNot,
    /// Cast; the node's type is the cast target.
    Cast,
}

/// An AST node: tagged kind plus source span.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    // ============================================================
    // Statements
    // ============================================================
    EmptyStmt,
    CompoundStmt {
        stmts: Vec<NodeId>,
    },
    /// `then`/`els` may each be absent; loop lowering emits
    /// `if (c) {} else goto L_end` with an empty then branch.
    IfStmt {
        cond: NodeId,
        then: Option<NodeId>,
        els: Option<NodeId>,
    },
    /// Unconditional jump. `target` is `None` only for a `goto` whose
    /// label has not been defined yet; all jumps are resolved (or
    /// diagnosed) by the end of the enclosing function.
    JumpStmt {
        target: Option<NodeId>,
    },
    ReturnStmt {
        expr: Option<NodeId>,
    },
    /// A jump target. `label` is unique within the translation unit.
    LabelStmt {
        label: u32,
    },
    FuncDef {
        ty: TypeId,
        name: Symbol,
        body: NodeId,
    },

    // ============================================================
    // Expressions
    // ============================================================
    BinaryOp {
        op: BinOp,
        lhs: NodeId,
        rhs: NodeId,
        ty: TypeId,
        /// Set on assignments desugared from compound assignment
        /// operators: the lhs is shared with the rhs operation and
        /// must be evaluated once.
        lhs_once: bool,
    },
    UnaryOp {
        op: UnOp,
        operand: NodeId,
        ty: TypeId,
    },
    ConditionalOp {
        cond: NodeId,
        then: NodeId,
        els: NodeId,
        ty: TypeId,
    },
    FuncCall {
        callee: NodeId,
        args: Vec<NodeId>,
        ty: TypeId,
    },
    /// Member access, resolved against the record type at
    /// construction time.
    MemberRef {
        object: NodeId,
        member: Symbol,
        arrow: bool,
        offset: u32,
        ty: TypeId,
    },
    /// A reference to a declared identifier (object, function,
    /// enumerator, ...).
    Ident {
        ident: IdentId,
        ty: TypeId,
    },
    Constant {
        value: Value,
        ty: TypeId,
    },
    /// Compiler-introduced temporary, e.g. the controlling value of a
    /// lowered switch.
    TempVar {
        id: u32,
        ty: TypeId,
    },
}

impl NodeKind {
    /// The resolved type of an expression node, `None` for statements.
    pub fn ty(&self) -> Option<TypeId> {
        match self {
            NodeKind::BinaryOp { ty, .. }
            | NodeKind::UnaryOp { ty, .. }
            | NodeKind::ConditionalOp { ty, .. }
            | NodeKind::FuncCall { ty, .. }
            | NodeKind::MemberRef { ty, .. }
            | NodeKind::Ident { ty, .. }
            | NodeKind::Constant { ty, .. }
            | NodeKind::TempVar { ty, .. } => Some(*ty),
            _ => None,
        }
    }

    pub fn is_expr(&self) -> bool {
        self.ty().is_some()
    }
}

/// One parsed translation unit: an ordered sequence of top-level
/// items. Declarations are lifted to compound statements holding their
/// assignment-initializers; the other item kind is a function
/// definition.
#[derive(Debug, Clone, Default)]
pub struct TranslationUnit {
    pub items: Vec<NodeId>,
}
