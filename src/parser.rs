//! Recursive-descent parser with integrated semantic analysis.
//!
//! The parser consumes a token stream and builds a typed AST for one
//! translation unit. It is organized into several submodules:
//!
//! - `decl` - declaration specifiers, declarators, records, enums
//! - `expr` - the expression precedence cascade
//! - `stmt` - statements and control-flow lowering
//!
//! Semantic checking is integrated: every expression node is allocated
//! through a factory that runs the type checker (`typeck`) and records
//! the result type on the node. Scope and linkage resolution happen as
//! declarators are processed, and loops and switches are lowered to
//! label/jump sequences while parsing.
//!
//! # Error Recovery
//!
//! Errors never unwind. `expect` reports a diagnostic and skips ahead
//! to the nearest follow token; semantic errors are reported and
//! parsing continues best-effort. The translation unit is invalid if
//! any diagnostic was recorded.
//!
//! # Example
//!
//! ```rust
//! use cfe::Parser;
//!
//! let mut parser = Parser::new("int add(int a, int b) { return a + b; }");
//! let unit = parser.parse_translation_unit().expect("parse failed");
//! assert_eq!(unit.items.len(), 1);
//! ```

mod decl;
mod expr;
mod stmt;

#[cfg(test)]
mod tests;

use crate::arena::Arena;
use crate::ast::{BinOp, Node, NodeId, NodeKind, Symbol, TranslationUnit, UnOp};
use crate::diagnostics::{Diagnostic, ErrorCode};
use crate::lexer::{Lexer, Token, TokenKind};
use crate::scope::{Ident, IdentId, IdentKind, Linkage, ScopeKind, ScopeTree};
use crate::span::{LineIndex, Span};
use crate::types::{TypeId, TypeRegistry, Value};
use rustc_hash::FxHashMap;
use string_interner::DefaultStringInterner;

/// The C parser. One instance owns one translation unit: its nodes,
/// types, identifiers, and scopes all live here and are addressed by
/// ids.
pub struct Parser<'src> {
    /// The source text (for extracting lexemes).
    source: &'src str,
    /// String interner for identifier names.
    interner: DefaultStringInterner,
    /// The pre-lexed token stream, terminated by an EOF token.
    tokens: Vec<Token>,
    /// Cursor into `tokens`.
    pos: usize,
    /// Checkpoint stack for bounded lookahead.
    marks: Vec<usize>,

    pub(crate) types: TypeRegistry,
    pub(crate) scopes: ScopeTree,
    pub(crate) idents: Arena<Ident>,
    pub(crate) nodes: Arena<Node>,
    /// Cached `int`, the recovery type for failed checks.
    pub(crate) int_ty: TypeId,

    /// Accumulated diagnostics.
    errors: Vec<Diagnostic>,
    /// Non-zero while speculating (function-definition lookahead).
    /// Suppresses diagnostics and symbol-table mutation.
    pub(crate) speculation: u32,
    /// File-scope external names, for cross-scope unification.
    external_symbols: FxHashMap<Symbol, IdentId>,

    // Per-function statement context, saved and restored around every
    // loop and switch body.
    pub(crate) break_dest: Option<NodeId>,
    pub(crate) continue_dest: Option<NodeId>,
    pub(crate) case_labels: Option<Vec<(i64, NodeId)>>,
    pub(crate) default_label: Option<NodeId>,
    pub(crate) cur_labels: FxHashMap<Symbol, NodeId>,
    pub(crate) unresolved_jumps: Vec<(Symbol, Span, NodeId)>,

    /// Named parameters of the most recent function declarator,
    /// captured for function definitions.
    pub(crate) last_params: Vec<(Symbol, TypeId)>,
    pub(crate) params_armed: bool,

    label_counter: u32,
    temp_counter: u32,

    /// The parsed translation unit, kept for consumers that want the
    /// partial AST of an invalid unit.
    unit: TranslationUnit,
}

impl<'src> Parser<'src> {
    /// Create a new parser for the given source.
    pub fn new(source: &'src str) -> Self {
        let mut tokens = Vec::new();
        let mut errors = Vec::new();
        for tok in Lexer::new(source) {
            if tok.kind == TokenKind::Error {
                errors.push(
                    Diagnostic::error("unexpected character in source", tok.span)
                        .with_error_code(ErrorCode::UnexpectedCharacter),
                );
            } else {
                tokens.push(tok);
            }
        }
        let (line, col) = LineIndex::new(source).line_col(source.len());
        tokens.push(Token::new(
            TokenKind::Eof,
            Span::new(source.len(), source.len(), line, col),
        ));

        let mut types = TypeRegistry::new();
        let int_ty = types.int();

        Self {
            source,
            interner: DefaultStringInterner::new(),
            tokens,
            pos: 0,
            marks: Vec::new(),
            types,
            scopes: ScopeTree::new(),
            idents: Arena::new(),
            nodes: Arena::new(),
            int_ty,
            errors,
            speculation: 0,
            external_symbols: FxHashMap::default(),
            break_dest: None,
            continue_dest: None,
            case_labels: None,
            default_label: None,
            cur_labels: FxHashMap::default(),
            unresolved_jumps: Vec::new(),
            last_params: Vec::new(),
            params_armed: false,
            label_counter: 0,
            temp_counter: 0,
            unit: TranslationUnit::default(),
        }
    }

    /// Parse a complete translation unit.
    ///
    /// The unit is a sequence of top-level items: declarations lifted
    /// to compound statements holding their assignment-initializers,
    /// and function definitions. Returns the accumulated diagnostics
    /// if any error occurred; the partial AST remains accessible
    /// through the parser either way.
    #[must_use = "parsing has no effect if the result is not used"]
    pub fn parse_translation_unit(&mut self) -> Result<TranslationUnit, Vec<Diagnostic>> {
        tracing::debug!(tokens = self.tokens.len(), "parsing translation unit");
        let mut unit = TranslationUnit::default();
        while !self.peek().is_eof() {
            let before = self.pos;
            let item = if self.is_func_def() {
                self.parse_func_def()
            } else {
                self.parse_decl()
            };
            unit.items.push(item);
            if self.pos == before {
                // Forward progress on malformed input.
                self.next_tok();
            }
        }
        self.unit = unit.clone();
        if self.errors.is_empty() {
            Ok(unit)
        } else {
            Err(self.errors.clone())
        }
    }

    // ============================================================
    // Token cursor
    // ============================================================

    pub(crate) fn peek(&self) -> Token {
        self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    pub(crate) fn peek_nth(&self, n: usize) -> Token {
        self.tokens[(self.pos + n).min(self.tokens.len() - 1)]
    }

    /// Consume and return the current token. EOF is idempotent.
    pub(crate) fn next_tok(&mut self) -> Token {
        let tok = self.peek();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    /// One-token rewind.
    pub(crate) fn put_back(&mut self) {
        if self.pos > 0 {
            self.pos -= 1;
        }
    }

    pub(crate) fn test(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    /// Consume the current token if it matches.
    pub(crate) fn try_consume(&mut self, kind: TokenKind) -> bool {
        if self.test(kind) {
            self.next_tok();
            true
        } else {
            false
        }
    }

    /// Consume a token of the expected kind, or diagnose and skip to
    /// the nearest follow token.
    pub(crate) fn expect(&mut self, kind: TokenKind) {
        if self.test(kind) {
            self.next_tok();
            return;
        }
        self.error_expected(kind.description());
        self.panic_to(kind, TokenKind::Semi);
        if self.test(kind) {
            self.next_tok();
        }
    }

    /// Panic-mode recovery: skip tokens up to the nearest of the two
    /// follow tags. `}` and EOF always fence the skip.
    pub(crate) fn panic_to(&mut self, follow1: TokenKind, follow2: TokenKind) {
        tracing::debug!(?follow1, ?follow2, "resynchronizing after parse error");
        while !self.peek().is_eof() {
            let kind = self.peek().kind;
            if kind == follow1 || kind == follow2 || kind == TokenKind::RBrace {
                return;
            }
            self.next_tok();
        }
    }

    /// Save a cursor checkpoint for bounded lookahead.
    pub(crate) fn mark(&mut self) {
        self.marks.push(self.pos);
    }

    /// Rewind to the most recent checkpoint.
    pub(crate) fn release(&mut self) {
        if let Some(pos) = self.marks.pop() {
            self.pos = pos;
        }
    }

    /// The span of the most recently consumed token.
    pub(crate) fn prev_span(&self) -> Span {
        let idx = self.pos.saturating_sub(1).min(self.tokens.len() - 1);
        self.tokens[idx].span
    }

    pub(crate) fn text(&self, span: Span) -> &'src str {
        &self.source[span.start..span.end]
    }

    /// Intern the lexeme of a token.
    pub(crate) fn symbol(&mut self, tok: &Token) -> Symbol {
        let source = self.source;
        self.interner
            .get_or_intern(&source[tok.span.start..tok.span.end])
    }

    /// Whether an identifier token names a typedef in scope.
    pub(crate) fn is_typedef_name(&self, tok: Token) -> bool {
        let text = &self.source[tok.span.start..tok.span.end];
        let Some(sym) = self.interner.get(text) else {
            return false;
        };
        self.scopes
            .find(sym)
            .is_some_and(|id| self.idents[id].is_typedef())
    }

    /// Consume tokens through a brace block. `depth` is the number of
    /// already-open braces.
    pub(crate) fn skip_brace_block(&mut self, mut depth: u32) {
        while depth > 0 && !self.peek().is_eof() {
            match self.next_tok().kind {
                TokenKind::LBrace => depth += 1,
                TokenKind::RBrace => depth -= 1,
                _ => {}
            }
        }
    }

    // ============================================================
    // Error handling
    // ============================================================

    pub(crate) fn error_at(&mut self, span: Span, message: impl Into<String>, code: ErrorCode) {
        if self.speculation > 0 {
            return;
        }
        self.errors
            .push(Diagnostic::error(message, span).with_error_code(code));
    }

    pub(crate) fn error_expected(&mut self, expected: &str) {
        let found = self.peek();
        let code = if found.is_eof() {
            ErrorCode::UnexpectedEof
        } else {
            ErrorCode::UnexpectedToken
        };
        let message = format!("expected {}, found {}", expected, found.kind.description());
        self.error_at(found.span, message, code);
    }

    // ============================================================
    // Scope helpers
    // ============================================================

    pub(crate) fn enter_scope(&mut self, kind: ScopeKind) {
        self.scopes.enter(kind);
    }

    pub(crate) fn exit_scope(&mut self) {
        self.scopes.exit();
    }

    /// Bind an ordinary identifier, unless speculating.
    pub(crate) fn bind(&mut self, name: Symbol, ident: IdentId) {
        if self.speculation == 0 {
            self.scopes.insert(name, ident);
        }
    }

    /// Bind a tag, unless speculating.
    pub(crate) fn bind_tag(&mut self, name: Symbol, ident: IdentId) {
        if self.speculation == 0 {
            self.scopes.insert_tag(name, ident);
        }
    }

    /// Declare a tag identifier for a record or enum type.
    pub(crate) fn bind_tag_ident(&mut self, name: Symbol, ty: TypeId) {
        let ident = self.idents.alloc(Ident {
            name,
            ty,
            scope: self.scopes.current(),
            linkage: Linkage::None,
            kind: IdentKind::Tag,
        });
        self.bind_tag(name, ident);
    }

    /// Complete a record type, unless speculating.
    pub(crate) fn commit_record(&mut self, ty: TypeId, members: Vec<(Symbol, TypeId)>) {
        if self.speculation == 0 {
            self.types.complete_record(ty, members);
        }
    }

    /// Complete an enum type, unless speculating.
    pub(crate) fn commit_enum(&mut self, ty: TypeId) {
        if self.speculation == 0 {
            self.types.complete_enum(ty);
        }
    }

    pub(crate) fn external_symbol(&self, name: Symbol) -> Option<IdentId> {
        self.external_symbols.get(&name).copied()
    }

    pub(crate) fn record_external_symbol(&mut self, name: Symbol, ident: IdentId) {
        if self.speculation == 0 {
            self.external_symbols.insert(name, ident);
        }
    }

    // ============================================================
    // Node factories. Every expression factory runs the type checker
    // and stores the computed result type on the node.
    // ============================================================

    pub(crate) fn new_binary_op(
        &mut self,
        span: Span,
        op: BinOp,
        lhs: NodeId,
        rhs: NodeId,
    ) -> NodeId {
        let ty = self.check_binary_op(op, lhs, rhs, span);
        self.nodes.alloc(Node {
            kind: NodeKind::BinaryOp {
                op,
                lhs,
                rhs,
                ty,
                lhs_once: false,
            },
            span,
        })
    }

    /// Desugar `lhs op= rhs` into `lhs = lhs op rhs`, marking the
    /// assignment so consumers evaluate the shared lhs once.
    pub(crate) fn new_compound_assign(
        &mut self,
        span: Span,
        op: BinOp,
        lhs: NodeId,
        rhs: NodeId,
    ) -> NodeId {
        let inner = self.new_binary_op(span, op, lhs, rhs);
        let ty = self.check_binary_op(BinOp::Assign, lhs, inner, span);
        self.nodes.alloc(Node {
            kind: NodeKind::BinaryOp {
                op: BinOp::Assign,
                lhs,
                rhs: inner,
                ty,
                lhs_once: true,
            },
            span,
        })
    }

    /// An assignment synthesized from an initializer. Initializing a
    /// `const` object is allowed; only compatibility is checked.
    pub(crate) fn new_init_assign(&mut self, span: Span, lhs: NodeId, rhs: NodeId) -> NodeId {
        let lty = self.expr_ty(lhs);
        let rty = self.expr_ty(rhs);
        if !self.types.compatible(lty, rty) {
            self.error_at(
                span,
                "incompatible types in initialization",
                ErrorCode::IncompatibleAssignment,
            );
        }
        self.nodes.alloc(Node {
            kind: NodeKind::BinaryOp {
                op: BinOp::Assign,
                lhs,
                rhs,
                ty: lty,
                lhs_once: false,
            },
            span,
        })
    }

    pub(crate) fn new_unary_op(&mut self, span: Span, op: UnOp, operand: NodeId) -> NodeId {
        let ty = self.check_unary_op(op, operand, span);
        self.nodes.alloc(Node {
            kind: NodeKind::UnaryOp { op, operand, ty },
            span,
        })
    }

    pub(crate) fn new_cast(&mut self, span: Span, operand: NodeId, target: TypeId) -> NodeId {
        let ty = self.check_cast(target, operand, span);
        self.nodes.alloc(Node {
            kind: NodeKind::UnaryOp {
                op: UnOp::Cast,
                operand,
                ty,
            },
            span,
        })
    }

    pub(crate) fn new_conditional(
        &mut self,
        span: Span,
        cond: NodeId,
        then: NodeId,
        els: NodeId,
    ) -> NodeId {
        let ty = self.check_conditional(cond, then, els, span);
        self.nodes.alloc(Node {
            kind: NodeKind::ConditionalOp {
                cond,
                then,
                els,
                ty,
            },
            span,
        })
    }

    pub(crate) fn new_func_call(&mut self, span: Span, callee: NodeId, args: Vec<NodeId>) -> NodeId {
        let ty = self.check_call(callee, &args, span);
        self.nodes.alloc(Node {
            kind: NodeKind::FuncCall { callee, args, ty },
            span,
        })
    }

    pub(crate) fn new_member_ref(
        &mut self,
        span: Span,
        object: NodeId,
        member: Symbol,
        arrow: bool,
    ) -> NodeId {
        let (offset, ty) = self.check_member_ref(object, member, arrow, span);
        self.nodes.alloc(Node {
            kind: NodeKind::MemberRef {
                object,
                member,
                arrow,
                offset,
                ty,
            },
            span,
        })
    }

    pub(crate) fn new_ident_expr(&mut self, span: Span, ident: IdentId) -> NodeId {
        let ty = self.idents[ident].ty;
        self.nodes.alloc(Node {
            kind: NodeKind::Ident { ident, ty },
            span,
        })
    }

    pub(crate) fn new_constant_int(&mut self, span: Span, value: i64, ty: TypeId) -> NodeId {
        self.nodes.alloc(Node {
            kind: NodeKind::Constant {
                value: Value::Int(value),
                ty,
            },
            span,
        })
    }

    pub(crate) fn new_constant_float(&mut self, span: Span, value: f64, ty: TypeId) -> NodeId {
        self.nodes.alloc(Node {
            kind: NodeKind::Constant {
                value: Value::Float(value),
                ty,
            },
            span,
        })
    }

    pub(crate) fn new_temp_var(&mut self, span: Span, ty: TypeId) -> NodeId {
        self.temp_counter += 1;
        self.nodes.alloc(Node {
            kind: NodeKind::TempVar {
                id: self.temp_counter,
                ty,
            },
            span,
        })
    }

    /// A placeholder expression for error recovery.
    pub(crate) fn error_expr(&mut self, span: Span) -> NodeId {
        let ty = self.int_ty;
        self.nodes.alloc(Node {
            kind: NodeKind::Constant {
                value: Value::Int(0),
                ty,
            },
            span,
        })
    }

    pub(crate) fn new_label(&mut self) -> NodeId {
        self.label_counter += 1;
        self.nodes.alloc(Node {
            kind: NodeKind::LabelStmt {
                label: self.label_counter,
            },
            span: Span::dummy(),
        })
    }

    pub(crate) fn new_jump(&mut self, target: Option<NodeId>) -> NodeId {
        self.nodes.alloc(Node {
            kind: NodeKind::JumpStmt { target },
            span: Span::dummy(),
        })
    }

    pub(crate) fn new_if(
        &mut self,
        span: Span,
        cond: NodeId,
        then: Option<NodeId>,
        els: Option<NodeId>,
    ) -> NodeId {
        self.nodes.alloc(Node {
            kind: NodeKind::IfStmt { cond, then, els },
            span,
        })
    }

    pub(crate) fn new_compound(&mut self, stmts: Vec<NodeId>, span: Span) -> NodeId {
        self.nodes.alloc(Node {
            kind: NodeKind::CompoundStmt { stmts },
            span,
        })
    }

    pub(crate) fn new_empty(&mut self, span: Span) -> NodeId {
        self.nodes.alloc(Node {
            kind: NodeKind::EmptyStmt,
            span,
        })
    }

    pub(crate) fn new_return(&mut self, span: Span, expr: Option<NodeId>) -> NodeId {
        self.nodes.alloc(Node {
            kind: NodeKind::ReturnStmt { expr },
            span,
        })
    }

    /// The resolved type of an expression node.
    pub(crate) fn expr_ty(&self, node: NodeId) -> TypeId {
        self.nodes[node].kind.ty().unwrap_or(self.int_ty)
    }

    // ============================================================
    // Function definitions
    // ============================================================

    /// Decide between a declaration and a function definition. Both
    /// share the same leading form, so speculate over the specifiers
    /// and declarator: a following `,`, `=`, or `;` means declaration.
    /// This is the sole use of multi-token lookahead.
    fn is_func_def(&mut self) -> bool {
        if self.test(TokenKind::StaticAssert) {
            return false;
        }
        self.mark();
        self.speculation += 1;
        let (ty, _storage, _func) = self.parse_decl_spec();
        self.parse_declarator(ty);
        let is_def = !(self.test(TokenKind::Comma)
            || self.test(TokenKind::Assign)
            || self.test(TokenKind::Semi)
            || self.peek().is_eof());
        self.speculation -= 1;
        self.release();
        is_def
    }

    fn parse_func_def(&mut self) -> NodeId {
        let start = self.peek().span;
        let (ty, storage, func) = self.parse_decl_spec();
        self.last_params.clear();
        let ident = self.parse_direct_declarator(ty, storage, func);
        let params = std::mem::take(&mut self.last_params);

        let Some(ident) = ident else {
            self.panic_to(TokenKind::Semi, TokenKind::RBrace);
            self.try_consume(TokenKind::Semi);
            return self.new_empty(start);
        };

        let fty = self.idents[ident].ty;
        let name = self.idents[ident].name;
        if !self.types.is_function(fty) {
            self.error_at(
                start,
                "expected a function definition",
                ErrorCode::UnexpectedToken,
            );
        }

        self.expect(TokenKind::LBrace);
        let body = self.parse_func_body(&params, start);
        self.exit_func();

        let span = start.merge(self.prev_span());
        self.nodes.alloc(Node {
            kind: NodeKind::FuncDef {
                ty: fty,
                name,
                body,
            },
            span,
        })
    }

    /// Parse a function body: a block scope with the declarator's
    /// named parameters re-declared inside it.
    fn parse_func_body(&mut self, params: &[(Symbol, TypeId)], start: Span) -> NodeId {
        self.enter_scope(ScopeKind::Block);
        for &(name, ty) in params {
            let ident = self.idents.alloc(Ident {
                name,
                ty,
                scope: self.scopes.current(),
                linkage: Linkage::None,
                kind: IdentKind::Object {
                    storage: 0,
                    offset: 0,
                },
            });
            self.bind(name, ident);
        }
        let body = self.parse_compound_tail(start);
        self.exit_scope();
        body
    }

    /// Resolve queued `goto`s against the per-function label table and
    /// reset the per-function state. Jumps that still have no target
    /// are "used but not defined" errors.
    fn exit_func(&mut self) {
        let unresolved = std::mem::take(&mut self.unresolved_jumps);
        for (name, span, jump) in unresolved {
            if let Some(&label) = self.cur_labels.get(&name) {
                if let NodeKind::JumpStmt { target } = &mut self.nodes[jump].kind {
                    *target = Some(label);
                }
            } else {
                let text = self.interner.resolve(name).unwrap_or("?").to_string();
                self.error_at(
                    span,
                    format!("label '{}' used but not defined", text),
                    ErrorCode::UndefinedLabel,
                );
            }
        }
        self.cur_labels.clear();
    }

    // ============================================================
    // Public accessors
    // ============================================================

    pub fn nodes(&self) -> &Arena<Node> {
        &self.nodes
    }

    pub fn types(&self) -> &TypeRegistry {
        &self.types
    }

    pub fn idents(&self) -> &Arena<Ident> {
        &self.idents
    }

    pub fn scopes(&self) -> &ScopeTree {
        &self.scopes
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.errors
    }

    /// The parsed translation unit (possibly partial, if diagnostics
    /// were reported).
    pub fn unit(&self) -> &TranslationUnit {
        &self.unit
    }

    pub fn interner(&self) -> &DefaultStringInterner {
        &self.interner
    }

    /// Look up an already-interned name.
    pub fn lookup_symbol(&self, name: &str) -> Option<Symbol> {
        self.interner.get(name)
    }

    /// Resolve a name in the current scope chain (the file scope,
    /// after parsing completes).
    pub fn find_ident(&self, name: &str) -> Option<IdentId> {
        let sym = self.lookup_symbol(name)?;
        self.scopes.find(sym)
    }
}
