//! Declaration parsing.
//!
//! Covers the declaration-specifier state machine, declarators (with
//! base-type substitution for nested forms), struct/union and enum
//! specifiers, parameter lists, init-declarators, and initializers.
//!
//! Declarations are lifted into compound statements: each initializer
//! becomes an assignment statement, so a consumer sees declarations as
//! ordinary statement sequences.

use super::Parser;
use crate::ast::{NodeId, Symbol};
use crate::diagnostics::{ErrorCode, EvalError};
use crate::eval::eval_integer;
use crate::lexer::{Token, TokenKind};
use crate::scope::{Ident, IdentId, IdentKind, Linkage, ScopeKind};
use crate::span::Span;
use crate::types::*;
use rustc_hash::FxHashSet;

impl<'src> Parser<'src> {
    /// Parse one declaration, returning a compound statement holding
    /// its assignment-initializers (possibly empty).
    pub(crate) fn parse_decl(&mut self) -> NodeId {
        let start = self.peek().span;
        let mut stmts = Vec::new();

        if self.try_consume(TokenKind::StaticAssert) {
            self.parse_static_assert();
        } else {
            let (ty, storage, func) = self.parse_decl_spec();
            // FIRST set of an init-declarator: `*`, identifier, `(`.
            if self.test(TokenKind::Star)
                || self.test(TokenKind::Identifier)
                || self.test(TokenKind::LParen)
            {
                loop {
                    if let Some(init) = self.parse_init_declarator(ty, storage, func) {
                        stmts.push(init);
                    }
                    if !self.try_consume(TokenKind::Comma) {
                        break;
                    }
                }
            }
        }
        self.expect(TokenKind::Semi);

        self.new_compound(stmts, start.merge(self.prev_span()))
    }

    /// `_Static_assert ( constant-expression , string-literal )`
    /// (the keyword is already consumed, the trailing `;` is left to
    /// the caller).
    fn parse_static_assert(&mut self) {
        self.expect(TokenKind::LParen);
        let err_tok = self.peek();
        let expr = self.parse_conditional_expr();
        match eval_integer(&self.nodes, &self.idents, expr) {
            Ok(0) => self.error_at(
                err_tok.span,
                "static assertion failed",
                ErrorCode::StaticAssertFailed,
            ),
            Ok(_) => {}
            Err(e) => self.error_at(err_tok.span, e.to_string(), ErrorCode::NotConstant),
        }
        if self.try_consume(TokenKind::Comma) {
            if self.test(TokenKind::StringLit) {
                self.next_tok();
            } else {
                self.error_expected("string literal");
            }
        }
        self.expect(TokenKind::RParen);
    }

    /// Whether a token can start a declaration.
    pub(crate) fn is_decl_start(&self, tok: Token) -> bool {
        match tok.kind {
            TokenKind::Typedef
            | TokenKind::Extern
            | TokenKind::Static
            | TokenKind::Auto
            | TokenKind::Register
            | TokenKind::ThreadLocal
            | TokenKind::Inline
            | TokenKind::Noreturn
            | TokenKind::Alignas
            | TokenKind::StaticAssert => true,
            _ => self.is_type_name_tok(tok),
        }
    }

    /// Whether a token can start a type name (for casts, `sizeof`, and
    /// parameter declarations).
    pub(crate) fn is_type_name_tok(&self, tok: Token) -> bool {
        match tok.kind {
            TokenKind::Void
            | TokenKind::Char
            | TokenKind::Short
            | TokenKind::Int
            | TokenKind::Long
            | TokenKind::Float
            | TokenKind::Double
            | TokenKind::Signed
            | TokenKind::Unsigned
            | TokenKind::Bool
            | TokenKind::Complex
            | TokenKind::Struct
            | TokenKind::Union
            | TokenKind::Enum
            | TokenKind::Const
            | TokenKind::Restrict
            | TokenKind::Volatile
            | TokenKind::Atomic => true,
            TokenKind::Identifier => self.is_typedef_name(tok),
            _ => false,
        }
    }

    // ============================================================
    // Declaration specifiers
    // ============================================================

    /// Parse declaration specifiers, accumulating storage, function,
    /// qualifier, and type-specifier bits.
    pub(crate) fn parse_decl_spec(&mut self) -> (TypeId, u32, u32) {
        self.parse_decl_spec_inner(true)
    }

    /// Specifier-qualifier list: storage and function specifiers are
    /// diagnosed.
    pub(crate) fn parse_spec_qual(&mut self) -> TypeId {
        self.parse_decl_spec_inner(false).0
    }

    fn parse_decl_spec_inner(&mut self, allow_storage: bool) -> (TypeId, u32, u32) {
        let mut ty: Option<TypeId> = None;
        let mut storage = 0u32;
        let mut func = 0u32;
        let mut qual = 0u32;
        let mut spec = 0u32;
        let mut align: Option<i64> = None;

        loop {
            let tok = self.next_tok();
            match tok.kind {
                // Function specifiers
                TokenKind::Inline => func |= F_INLINE,
                TokenKind::Noreturn => func |= F_NORETURN,

                // Alignment specifier
                TokenKind::Alignas => align = Some(self.parse_alignas()),

                // Storage specifiers
                TokenKind::Typedef => {
                    if storage != 0 {
                        self.specifier_conflict(&tok);
                    }
                    storage |= S_TYPEDEF;
                }
                TokenKind::Extern => {
                    if storage & !S_THREAD != 0 {
                        self.specifier_conflict(&tok);
                    }
                    storage |= S_EXTERN;
                }
                TokenKind::Static => {
                    if storage & !S_THREAD != 0 {
                        self.specifier_conflict(&tok);
                    }
                    storage |= S_STATIC;
                }
                TokenKind::ThreadLocal => {
                    if storage & !COMP_THREAD != 0 {
                        self.specifier_conflict(&tok);
                    }
                    storage |= S_THREAD;
                }
                TokenKind::Auto => {
                    if storage != 0 {
                        self.specifier_conflict(&tok);
                    }
                    storage |= S_AUTO;
                }
                TokenKind::Register => {
                    if storage != 0 {
                        self.specifier_conflict(&tok);
                    }
                    storage |= S_REGISTER;
                }

                // Type qualifiers
                TokenKind::Const => qual |= Q_CONST,
                TokenKind::Restrict => qual |= Q_RESTRICT,
                TokenKind::Volatile => qual |= Q_VOLATILE,

                // Type specifiers
                TokenKind::Signed => {
                    if spec & !COMP_SIGNED != 0 {
                        self.specifier_conflict(&tok);
                    }
                    spec |= T_SIGNED;
                }
                TokenKind::Unsigned => {
                    if spec & !COMP_UNSIGNED != 0 {
                        self.specifier_conflict(&tok);
                    }
                    spec |= T_UNSIGNED;
                }
                TokenKind::Void => {
                    if spec != 0 {
                        self.specifier_conflict(&tok);
                    }
                    spec |= T_VOID;
                }
                TokenKind::Char => {
                    if spec & !COMP_CHAR != 0 {
                        self.specifier_conflict(&tok);
                    }
                    spec |= T_CHAR;
                }
                TokenKind::Short => {
                    if spec & !COMP_SHORT != 0 {
                        self.specifier_conflict(&tok);
                    }
                    spec |= T_SHORT;
                }
                TokenKind::Int => {
                    if spec & !COMP_INT != 0 {
                        self.specifier_conflict(&tok);
                    }
                    spec |= T_INT;
                }
                TokenKind::Long => {
                    if spec & !COMP_LONG != 0 {
                        self.specifier_conflict(&tok);
                    } else if spec & T_LONG != 0 {
                        // `long long`
                        spec &= !T_LONG;
                        spec |= T_LONG_LONG;
                    } else {
                        spec |= T_LONG;
                    }
                }
                TokenKind::Float => {
                    if spec & !COMP_FLOAT != 0 {
                        self.specifier_conflict(&tok);
                    }
                    spec |= T_FLOAT;
                }
                TokenKind::Double => {
                    if spec & !COMP_DOUBLE != 0 {
                        self.specifier_conflict(&tok);
                    }
                    spec |= T_DOUBLE;
                }
                TokenKind::Bool => {
                    if spec != 0 {
                        self.specifier_conflict(&tok);
                    }
                    spec |= T_BOOL;
                }
                TokenKind::Complex => {
                    if spec & !COMP_COMPLEX != 0 {
                        self.specifier_conflict(&tok);
                    }
                    spec |= T_COMPLEX;
                }

                TokenKind::Struct | TokenKind::Union => {
                    if spec != 0 {
                        self.specifier_conflict(&tok);
                    }
                    let is_struct = tok.kind == TokenKind::Struct;
                    ty = Some(self.parse_record_spec(is_struct));
                    spec |= T_RECORD;
                }
                TokenKind::Enum => {
                    if spec != 0 {
                        self.specifier_conflict(&tok);
                    }
                    ty = Some(self.parse_enum_spec());
                    spec |= T_ENUM;
                }
                TokenKind::Atomic => {
                    if self.test(TokenKind::LParen) {
                        self.error_at(
                            tok.span,
                            "`_Atomic(...)` type specifier is not supported",
                            ErrorCode::AtomicType,
                        );
                        self.next_tok();
                        let _ = self.parse_type_name();
                        self.expect(TokenKind::RParen);
                        spec |= T_INT;
                    } else {
                        qual |= Q_ATOMIC;
                    }
                }

                TokenKind::Identifier if spec == 0 && self.is_typedef_name(tok) => {
                    let sym = self.symbol(&tok);
                    if let Some(id) = self.scopes.find(sym) {
                        ty = Some(self.idents[id].ty);
                    }
                    spec |= T_TYPEDEF_NAME;
                }

                _ => {
                    self.put_back();
                    break;
                }
            }
        }

        // Final resolution.
        let end_tok = self.peek();
        let result = if spec == 0 {
            self.error_at(
                end_tok.span,
                "expected type specifier",
                ErrorCode::ExpectedTypeSpecifier,
            );
            self.int_ty
        } else if spec == T_VOID {
            self.types.void()
        } else if spec & (T_RECORD | T_ENUM | T_TYPEDEF_NAME) != 0 {
            ty.unwrap_or(self.int_ty)
        } else {
            self.types.arith(spec)
        };
        let result = self.types.qualify(result, qual);

        if !allow_storage && (storage != 0 || func != 0 || align.is_some()) {
            self.error_at(
                end_tok.span,
                "type specifier/qualifier only",
                ErrorCode::SpecifierQualifierOnly,
            );
        }

        (result, storage, func)
    }

    fn specifier_conflict(&mut self, tok: &Token) {
        self.error_at(
            tok.span,
            "conflicting specifiers in declaration",
            ErrorCode::IncompatibleSpecifiers,
        );
    }

    /// `_Alignas ( type-name | constant-expression )` (keyword consumed).
    fn parse_alignas(&mut self) -> i64 {
        self.expect(TokenKind::LParen);
        let value = if self.is_type_name_tok(self.peek()) {
            let ty = self.parse_type_name();
            self.types.align(ty) as i64
        } else {
            let err_tok = self.peek();
            let expr = self.parse_conditional_expr();
            match eval_integer(&self.nodes, &self.idents, expr) {
                Ok(v) => v,
                Err(e) => {
                    self.error_at(err_tok.span, e.to_string(), ErrorCode::NotConstant);
                    0
                }
            }
        };
        self.expect(TokenKind::RParen);
        value
    }

    // ============================================================
    // Struct/union and enum specifiers
    // ============================================================

    /// Struct/union specifier (keyword consumed). Handles forward
    /// declarations, in-place completion of an incomplete tag declared
    /// in the same scope, and tag redefinition errors.
    pub(crate) fn parse_record_spec(&mut self, is_struct: bool) -> TypeId {
        let kind = if is_struct {
            RecordKind::Struct
        } else {
            RecordKind::Union
        };
        let tok = self.next_tok();
        if tok.kind == TokenKind::Identifier {
            let name = self.symbol(&tok);
            if self.try_consume(TokenKind::LBrace) {
                // A definition. Only a same-scope forward declaration
                // may be completed; an outer-scope tag is shadowed by
                // a fresh type.
                if let Some(tag) = self.scopes.find_tag_in_current(name) {
                    let ty = self.idents[tag].ty;
                    if !self.types.is_complete(ty) {
                        return self.parse_record_members(ty);
                    }
                    let text = self.text(tok.span).to_string();
                    self.error_at(
                        tok.span,
                        format!("redefinition of struct/union tag '{}'", text),
                        ErrorCode::TagRedefinition,
                    );
                    let fresh = self.types.new_record(kind);
                    return self.parse_record_members(fresh);
                }
                let ty = self.types.new_record(kind);
                self.bind_tag_ident(name, ty);
                return self.parse_record_members(ty);
            }

            // A reference: any visible tag will do; otherwise this is
            // the first (forward) declaration.
            if let Some(tag) = self.scopes.find_tag(name) {
                return self.idents[tag].ty;
            }
            let ty = self.types.new_record(kind);
            self.bind_tag_ident(name, ty);
            return ty;
        }

        // Anonymous struct/union: the definition is mandatory.
        self.put_back();
        self.expect(TokenKind::LBrace);
        let ty = self.types.new_record(kind);
        self.parse_record_members(ty)
    }

    /// Member declarations up to the closing brace (which is
    /// consumed). Completes the record and computes its layout.
    fn parse_record_members(&mut self, ty: TypeId) -> TypeId {
        let mut members: Vec<(Symbol, TypeId)> = Vec::new();
        while !self.try_consume(TokenKind::RBrace) {
            if self.peek().is_eof() {
                self.error_at(
                    self.peek().span,
                    "premature end of input",
                    ErrorCode::PrematureEndOfInput,
                );
                break;
            }

            let base = self.parse_spec_qual();
            if self.try_consume(TokenKind::Semi) {
                continue;
            }
            loop {
                let err_tok = self.peek();
                let (tok, mty) = self.parse_declarator(base);
                match tok {
                    None => {
                        self.error_at(
                            err_tok.span,
                            "expected member name",
                            ErrorCode::ExpectedMemberName,
                        );
                    }
                    Some(tok) => {
                        let name = self.symbol(&tok);
                        let text = self.text(tok.span).to_string();
                        if self.types.is_void(mty) {
                            self.error_at(
                                tok.span,
                                format!("variable or field '{}' declared void", text),
                                ErrorCode::VoidVariable,
                            );
                        } else if self.types.is_function(mty) {
                            self.error_at(
                                tok.span,
                                format!("field '{}' declared as a function", text),
                                ErrorCode::FunctionMember,
                            );
                        } else if !self.types.is_complete(mty) {
                            self.error_at(
                                tok.span,
                                format!("field '{}' has incomplete type", text),
                                ErrorCode::IncompleteType,
                            );
                        } else if members.iter().any(|(n, _)| *n == name) {
                            self.error_at(
                                tok.span,
                                format!("duplicate member '{}'", text),
                                ErrorCode::DuplicateMember,
                            );
                        } else {
                            members.push((name, mty));
                        }
                    }
                }
                if !self.try_consume(TokenKind::Comma) {
                    break;
                }
            }
            self.expect(TokenKind::Semi);
        }
        self.commit_record(ty, members);
        ty
    }

    /// Enum specifier (keyword consumed). A forward-declared enum is
    /// an incomplete integer type until its enumerator list closes.
    pub(crate) fn parse_enum_spec(&mut self) -> TypeId {
        let tok = self.next_tok();
        if tok.kind == TokenKind::Identifier {
            let name = self.symbol(&tok);
            if self.try_consume(TokenKind::LBrace) {
                if let Some(tag) = self.scopes.find_tag_in_current(name) {
                    let ty = self.idents[tag].ty;
                    if !self.types.is_complete(ty) {
                        return self.parse_enumerators(ty);
                    }
                    let text = self.text(tok.span).to_string();
                    self.error_at(
                        tok.span,
                        format!("redefinition of enumeration tag '{}'", text),
                        ErrorCode::TagRedefinition,
                    );
                    let fresh = self.types.new_enum();
                    return self.parse_enumerators(fresh);
                }
                let ty = self.types.new_enum();
                self.bind_tag_ident(name, ty);
                return self.parse_enumerators(ty);
            }

            if let Some(tag) = self.scopes.find_tag(name) {
                return self.idents[tag].ty;
            }
            let ty = self.types.new_enum();
            self.bind_tag_ident(name, ty);
            return ty;
        }

        self.put_back();
        self.expect(TokenKind::LBrace);
        let ty = self.types.new_enum();
        self.parse_enumerators(ty)
    }

    /// Enumerator list up to the closing brace (which is consumed).
    /// Each enumerator enters the ordinary name space as an `int`
    /// constant.
    fn parse_enumerators(&mut self, ty: TypeId) -> TypeId {
        let mut val: i64 = 0;
        loop {
            let tok = self.peek();
            if tok.kind != TokenKind::Identifier {
                self.error_at(
                    tok.span,
                    "enumeration constant expected",
                    ErrorCode::ExpectedIdentifier,
                );
                self.panic_to(TokenKind::RBrace, TokenKind::Semi);
                self.try_consume(TokenKind::RBrace);
                break;
            }
            self.next_tok();
            let name = self.symbol(&tok);
            if self.speculation == 0 && self.scopes.find_in_current(name).is_some() {
                let text = self.text(tok.span).to_string();
                self.error_at(
                    tok.span,
                    format!("redefinition of enumerator '{}'", text),
                    ErrorCode::EnumeratorRedefinition,
                );
            }
            if self.try_consume(TokenKind::Assign) {
                let err_tok = self.peek();
                let expr = self.parse_conditional_expr();
                match eval_integer(&self.nodes, &self.idents, expr) {
                    Ok(v) => val = v,
                    Err(e) => self.error_at(err_tok.span, e.to_string(), ErrorCode::NotConstant),
                }
            }

            let int_ty = self.int_ty;
            let ident = self.idents.alloc(Ident {
                name,
                ty: int_ty,
                scope: self.scopes.current(),
                linkage: Linkage::None,
                kind: IdentKind::Constant(Value::Int(val)),
            });
            self.bind(name, ident);
            val += 1;

            self.try_consume(TokenKind::Comma);
            if self.try_consume(TokenKind::RBrace) {
                break;
            }
        }
        self.commit_enum(ty);
        ty
    }

    // ============================================================
    // Declarators
    // ============================================================

    fn parse_qual(&mut self) -> u32 {
        let mut qual = 0;
        loop {
            match self.peek().kind {
                TokenKind::Const => qual |= Q_CONST,
                TokenKind::Restrict => qual |= Q_RESTRICT,
                TokenKind::Volatile => qual |= Q_VOLATILE,
                TokenKind::Atomic => qual |= Q_ATOMIC,
                _ => return qual,
            }
            self.next_tok();
        }
    }

    fn parse_pointer(&mut self, mut ty: TypeId) -> TypeId {
        while self.try_consume(TokenKind::Star) {
            let qual = self.parse_qual();
            ty = self.types.pointer_to(ty, qual);
        }
        ty
    }

    /// Substitute `new_base` for `base` at the innermost position of
    /// `ty`'s derived-type chain. This corrects nested declarators:
    /// in `int (*p)(void)`, the inner declarator is built around the
    /// provisional base and re-rooted once the outer suffix is known.
    fn modify_base(&mut self, ty: TypeId, base: TypeId, new_base: TypeId) -> TypeId {
        if ty == base {
            return new_base;
        }
        match self.types.kind(ty).clone() {
            TypeKind::Pointer { pointee } => {
                let qual = self.types.qual(ty);
                let inner = self.modify_base(pointee, base, new_base);
                self.types.pointer_to(inner, qual)
            }
            TypeKind::Array { elem, len } => {
                let inner = self.modify_base(elem, base, new_base);
                self.types.array_of(inner, len)
            }
            TypeKind::Function {
                ret,
                params,
                variadic,
            } => {
                let inner = self.modify_base(ret, base, new_base);
                self.types.function_of(inner, params, variadic)
            }
            _ => new_base,
        }
    }

    /// Parse a declarator around `base`.
    ///
    /// Returns the innermost identifier token for a direct declarator,
    /// or `None` for an abstract declarator, together with the derived
    /// type.
    pub(crate) fn parse_declarator(&mut self, base: TypeId) -> (Option<Token>, TypeId) {
        let pointer_ty = self.parse_pointer(base);

        if self.try_consume(TokenKind::LParen) {
            // The pointer type is a provisional base for the inner
            // declarator; re-root it after the outer suffixes.
            let (tok, inner_ty) = self.parse_declarator(pointer_ty);
            self.expect(TokenKind::RParen);
            let new_base = self.parse_array_func_declarator(pointer_ty);
            let ty = self.modify_base(inner_ty, pointer_ty, new_base);
            (tok, ty)
        } else if self.test(TokenKind::Identifier) {
            let tok = self.next_tok();
            let saved = std::mem::replace(&mut self.params_armed, true);
            let ty = self.parse_array_func_declarator(pointer_ty);
            self.params_armed = saved;
            (Some(tok), ty)
        } else {
            let ty = self.parse_array_func_declarator(pointer_ty);
            (None, ty)
        }
    }

    /// Trailing array/function declarator suffixes.
    fn parse_array_func_declarator(&mut self, base: TypeId) -> TypeId {
        if self.try_consume(TokenKind::LBracket) {
            if self.types.is_function(base) {
                self.error_at(
                    self.peek().span,
                    "the element of an array can't be a function",
                    ErrorCode::ArrayOfFunctions,
                );
            }
            let len = self.parse_array_length();
            self.expect(TokenKind::RBracket);
            let inner = self.parse_array_func_declarator(base);
            self.types.array_of(inner, len)
        } else if self.try_consume(TokenKind::LParen) {
            if self.types.is_function(base) {
                self.error_at(
                    self.peek().span,
                    "the return value of a function can't be a function",
                    ErrorCode::FunctionReturningFunction,
                );
            } else if self.types.is_array(base) {
                self.error_at(
                    self.peek().span,
                    "the return value of a function can't be an array",
                    ErrorCode::FunctionReturningArray,
                );
            }

            let armed = std::mem::replace(&mut self.params_armed, false);
            self.enter_scope(ScopeKind::Proto);
            let (params, named, variadic) = self.parse_param_list();
            self.exit_scope();
            self.expect(TokenKind::RParen);
            if armed {
                self.last_params = named;
            }

            let inner = self.parse_array_func_declarator(base);
            self.types.function_of(inner, params, variadic)
        } else {
            base
        }
    }

    /// Array length between brackets (`[` consumed, `]` left to the
    /// caller). `None` means unspecified. Lengths must be positive
    /// integer constants.
    fn parse_array_length(&mut self) -> Option<u32> {
        let mut has_static = self.try_consume(TokenKind::Static);
        if self.parse_qual() != 0 {
            has_static = has_static || self.try_consume(TokenKind::Static);
        }
        if self.test(TokenKind::Star) && self.peek_nth(1).kind == TokenKind::RBracket {
            let tok = self.next_tok();
            self.error_at(
                tok.span,
                "variable-length arrays are not supported",
                ErrorCode::VariableLengthArray,
            );
            return Some(1);
        }
        if !has_static && self.test(TokenKind::RBracket) {
            return None;
        }

        let err_tok = self.peek();
        let expr = self.parse_assign_expr();
        match eval_integer(&self.nodes, &self.idents, expr) {
            Ok(v) if v > 0 && v <= u32::MAX as i64 => Some(v as u32),
            Ok(_) => {
                self.error_at(
                    err_tok.span,
                    "can't declare an array of non-positive length",
                    ErrorCode::ZeroLengthArray,
                );
                Some(1)
            }
            Err(EvalError::NotConstant) => {
                self.error_at(
                    err_tok.span,
                    "variable-length arrays are not supported",
                    ErrorCode::VariableLengthArray,
                );
                Some(1)
            }
            Err(e) => {
                self.error_at(err_tok.span, e.to_string(), ErrorCode::NotConstant);
                Some(1)
            }
        }
    }

    /// Parameter list between parentheses (`(` consumed, `)` left to
    /// the caller). Returns the parameter types, the named parameters,
    /// and the variadic flag. `(void)` and `()` both mean no
    /// parameters.
    fn parse_param_list(&mut self) -> (Vec<TypeId>, Vec<(Symbol, TypeId)>, bool) {
        let mut params = Vec::new();
        let mut named = Vec::new();
        if self.test(TokenKind::RParen) {
            return (params, named, false);
        }

        let first = self.parse_param_decl(&mut named);
        if self.types.is_void(first) && named.is_empty() {
            return (params, named, false);
        }
        params.push(first);

        while self.try_consume(TokenKind::Comma) {
            if self.try_consume(TokenKind::Ellipsis) {
                return (params, named, true);
            }
            let tok = self.peek();
            let param = self.parse_param_decl(&mut named);
            if self.types.is_void(param) {
                self.error_at(
                    tok.span,
                    "'void' must be the only parameter",
                    ErrorCode::VoidVariable,
                );
                continue;
            }
            params.push(param);
        }
        (params, named, false)
    }

    fn parse_param_decl(&mut self, named: &mut Vec<(Symbol, TypeId)>) -> TypeId {
        let (ty, storage, func) = self.parse_decl_spec();
        // No declarator at all.
        if self.test(TokenKind::Comma) || self.test(TokenKind::RParen) {
            return ty;
        }
        let (tok, ty) = self.parse_declarator(ty);
        if let Some(tok) = tok {
            let sym = self.symbol(&tok);
            self.process_declarator(&tok, ty, storage, func);
            named.push((sym, ty));
        }
        ty
    }

    /// Type name: specifier-qualifier list plus an optional abstract
    /// declarator.
    pub(crate) fn parse_type_name(&mut self) -> TypeId {
        let ty = self.parse_spec_qual();
        if self.test(TokenKind::Star) || self.test(TokenKind::LParen) || self.test(TokenKind::LBracket)
        {
            return self.parse_abstract_declarator(ty);
        }
        ty
    }

    fn parse_abstract_declarator(&mut self, ty: TypeId) -> TypeId {
        let (tok, ty) = self.parse_declarator(ty);
        if let Some(tok) = tok {
            let text = self.text(tok.span).to_string();
            self.error_at(
                tok.span,
                format!("unexpected identifier '{}'", text),
                ErrorCode::UnexpectedToken,
            );
        }
        ty
    }

    /// Parse a declarator that must name an identifier, and enter it
    /// into the symbol table.
    pub(crate) fn parse_direct_declarator(
        &mut self,
        ty: TypeId,
        storage: u32,
        func: u32,
    ) -> Option<IdentId> {
        let err_tok = self.peek();
        let (tok, ty) = self.parse_declarator(ty);
        match tok {
            Some(tok) => self.process_declarator(&tok, ty, storage, func),
            None => {
                self.error_at(
                    err_tok.span,
                    "expected identifier or '('",
                    ErrorCode::ExpectedIdentifier,
                );
                None
            }
        }
    }

    // ============================================================
    // Scope and linkage resolution
    // ============================================================

    /// Decide linkage, check redeclarations, and insert the declared
    /// identifier into the current scope.
    pub(crate) fn process_declarator(
        &mut self,
        tok: &Token,
        ty: TypeId,
        storage: u32,
        _func: u32,
    ) -> Option<IdentId> {
        let name = self.symbol(tok);
        let text = self.text(tok.span).to_string();

        // A typedef binds the name to the type itself.
        if storage & S_TYPEDEF != 0 {
            if let Some(existing) = self.scopes.find_in_current(name) {
                let ety = self.idents[existing].ty;
                if !self.types.equal(ty, ety) {
                    self.error_at(
                        tok.span,
                        format!("conflicting types for '{}'", text),
                        ErrorCode::ConflictingTypes,
                    );
                }
                return Some(existing);
            }
            let ident = self.idents.alloc(Ident {
                name,
                ty,
                scope: self.scopes.current(),
                linkage: Linkage::None,
                kind: IdentKind::TypeName,
            });
            self.bind(name, ident);
            return Some(ident);
        }

        if self.types.is_void(ty) {
            self.error_at(
                tok.span,
                format!("variable or field '{}' declared void", text),
                ErrorCode::VoidVariable,
            );
            return None;
        }

        if !self.types.is_function(ty) && !self.types.is_complete(ty) {
            self.error_at(
                tok.span,
                format!("storage size of '{}' isn't known", text),
                ErrorCode::IncompleteType,
            );
        }

        if self.types.is_function(ty)
            && self.scopes.current_kind() != ScopeKind::File
            && storage & S_STATIC != 0
        {
            self.error_at(
                tok.span,
                format!("invalid storage class for function '{}'", text),
                ErrorCode::InvalidStorageClass,
            );
        }

        // Linkage from scope kind and storage class.
        let mut linkage = match self.scopes.current_kind() {
            ScopeKind::Proto => Linkage::None,
            ScopeKind::File => {
                if storage & S_STATIC != 0 {
                    Linkage::Internal
                } else {
                    Linkage::External
                }
            }
            ScopeKind::Block => {
                if storage & S_EXTERN != 0 {
                    Linkage::External
                } else if self.types.is_function(ty) {
                    Linkage::External
                } else {
                    Linkage::None
                }
            }
        };

        // Same-scope redeclaration.
        if let Some(existing) = self.scopes.find_in_current(name) {
            let ety = self.idents[existing].ty;
            if !self.types.equal(ty, ety) {
                self.error_at(
                    tok.span,
                    format!("conflicting types for '{}'", text),
                    ErrorCode::ConflictingTypes,
                );
            }
            match linkage {
                Linkage::None => self.error_at(
                    tok.span,
                    format!("redeclaration of '{}' with no linkage", text),
                    ErrorCode::RedeclarationNoLinkage,
                ),
                Linkage::External => {
                    if self.idents[existing].linkage == Linkage::None {
                        self.error_at(
                            tok.span,
                            format!("conflicting linkage for '{}'", text),
                            ErrorCode::ConflictingLinkage,
                        );
                    }
                }
                Linkage::Internal => {
                    if self.idents[existing].linkage != Linkage::Internal {
                        self.error_at(
                            tok.span,
                            format!("conflicting linkage for '{}'", text),
                            ErrorCode::ConflictingLinkage,
                        );
                    }
                }
            }
            // The same redeclaration: return the prior declaration.
            return Some(existing);
        }

        // A new external declaration unifies with any visible
        // declaration and with the translation unit's external
        // symbols.
        let mut already_known = false;
        if linkage == Linkage::External {
            if let Some(up) = self.scopes.find(name) {
                let uty = self.idents[up].ty;
                if !self.types.equal(ty, uty) {
                    self.error_at(
                        tok.span,
                        format!("conflicting types for '{}'", text),
                        ErrorCode::ConflictingTypes,
                    );
                }
                if self.idents[up].linkage != Linkage::None {
                    linkage = self.idents[up].linkage;
                }
                already_known = true;
            } else if let Some(ext) = self.external_symbol(name) {
                let ety = self.idents[ext].ty;
                if !self.types.equal(ty, ety) {
                    self.error_at(
                        tok.span,
                        format!("conflicting types for '{}'", text),
                        ErrorCode::ConflictingTypes,
                    );
                }
                already_known = true;
            }
        }

        let kind = if self.types.is_function(ty) {
            IdentKind::Plain
        } else {
            IdentKind::Object {
                storage,
                offset: 0,
            }
        };
        let ident = self.idents.alloc(Ident {
            name,
            ty,
            scope: self.scopes.current(),
            linkage,
            kind,
        });
        self.bind(name, ident);

        if linkage == Linkage::External && !already_known {
            self.record_external_symbol(name, ident);
        }

        Some(ident)
    }

    // ============================================================
    // Init-declarators and initializers
    // ============================================================

    /// One init-declarator. Initialization is translated into an
    /// assignment statement; uninitialized declarators produce none.
    fn parse_init_declarator(&mut self, ty: TypeId, storage: u32, func: u32) -> Option<NodeId> {
        let ident = self.parse_direct_declarator(ty, storage, func);

        if self.try_consume(TokenKind::Assign) {
            match ident {
                Some(id) if self.idents[id].is_object() => {
                    return Some(self.parse_initializer(id));
                }
                _ => {
                    self.error_at(
                        self.peek().span,
                        "unexpected initializer",
                        ErrorCode::UnexpectedInitializer,
                    );
                    // Consume the initializer to resynchronize.
                    if self.try_consume(TokenKind::LBrace) {
                        self.skip_brace_block(1);
                    } else {
                        let _ = self.parse_assign_expr();
                    }
                }
            }
        }
        None
    }

    fn parse_initializer(&mut self, obj: IdentId) -> NodeId {
        let ty = self.idents[obj].ty;
        if self.test(TokenKind::LBrace) {
            let brace = self.next_tok();
            if self.types.is_array(ty) {
                return self.parse_array_initializer(obj, brace.span);
            }
            if self.types.is_record(ty) {
                self.error_at(
                    brace.span,
                    "struct/union initializers are not supported",
                    ErrorCode::StructInitializer,
                );
                self.skip_brace_block(1);
                return self.new_empty(brace.span);
            }
            // Braced scalar initializer.
            let tok = self.peek();
            let lhs = self.new_ident_expr(tok.span, obj);
            let rhs = self.parse_assign_expr();
            let node = self.new_init_assign(tok.span, lhs, rhs);
            self.try_consume(TokenKind::Comma);
            self.expect(TokenKind::RBrace);
            return node;
        }

        let tok = self.peek();
        let lhs = self.new_ident_expr(tok.span, obj);
        let rhs = self.parse_assign_expr();
        self.new_init_assign(tok.span, lhs, rhs)
    }

    /// Array initializer list (`{` consumed). Elements may use index
    /// designators `[k] =`; undesignated elements fill the lowest
    /// unused index. Each element initializer becomes an assignment to
    /// a synthesized element object at the element's offset.
    fn parse_array_initializer(&mut self, arr: IdentId, span: Span) -> NodeId {
        let arr_ty = self.idents[arr].ty;
        let elem_ty = self.types.array_elem(arr_ty).unwrap_or(self.int_ty);
        let len = self.types.array_len(arr_ty);
        let elem_width = self.types.width(elem_ty) as i64;
        let (storage, base_offset) = match self.idents[arr].kind {
            IdentKind::Object { storage, offset } => (storage, offset),
            _ => (0, 0),
        };

        let mut used: FxHashSet<i64> = FxHashSet::default();
        let mut next_idx: i64 = 0;
        let mut stmts = Vec::new();
        loop {
            let tok = self.next_tok();
            match tok.kind {
                TokenKind::RBrace => break,
                TokenKind::Eof => {
                    self.error_at(
                        tok.span,
                        "premature end of input",
                        ErrorCode::PrematureEndOfInput,
                    );
                    break;
                }
                _ => {}
            }

            let idx = if tok.kind == TokenKind::LBracket {
                let err_tok = self.peek();
                let expr = self.parse_conditional_expr();
                let idx = match eval_integer(&self.nodes, &self.idents, expr) {
                    Ok(v) if v >= 0 => v,
                    Ok(_) => {
                        self.error_at(
                            err_tok.span,
                            "array designator index is negative",
                            ErrorCode::ArrayIndexOutOfBounds,
                        );
                        0
                    }
                    Err(e) => {
                        self.error_at(err_tok.span, e.to_string(), ErrorCode::NotConstant);
                        0
                    }
                };
                self.expect(TokenKind::RBracket);
                self.expect(TokenKind::Assign);
                idx
            } else {
                self.put_back();
                while used.contains(&next_idx) {
                    next_idx += 1;
                }
                next_idx
            };

            if let Some(n) = len {
                if idx >= n as i64 {
                    self.error_at(
                        self.peek().span,
                        "array index in initializer exceeds array bounds",
                        ErrorCode::ArrayIndexOutOfBounds,
                    );
                }
            }
            used.insert(idx);

            let ele = self.idents.alloc(Ident {
                name: self.idents[arr].name,
                ty: elem_ty,
                scope: self.idents[arr].scope,
                linkage: self.idents[arr].linkage,
                kind: IdentKind::Object {
                    storage,
                    offset: base_offset + (idx * elem_width) as i32,
                },
            });
            stmts.push(self.parse_initializer(ele));

            if !self.try_consume(TokenKind::Comma) && !self.test(TokenKind::RBrace) {
                self.error_expected("',' or '}'");
                self.panic_to(TokenKind::RBrace, TokenKind::Semi);
                if self.test(TokenKind::Semi) {
                    break;
                }
            }
        }
        self.new_compound(stmts, span)
    }
}
