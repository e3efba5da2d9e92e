//! Expression parsing.
//!
//! A seventeen-level precedence cascade, from the comma operator at
//! the bottom through assignment, conditional, the binary operator
//! ladder, cast, unary, postfix, and primary expressions. Every level
//! parses the next-higher level and then loops on its own operator
//! set; assignment and conditional recurse to the right instead.
//!
//! Compound assignments are desugared here: `a += b` becomes
//! `a = a + b` with the assignment marked so the shared lhs is
//! evaluated once.

use super::Parser;
use crate::ast::{BinOp, NodeId, UnOp};
use crate::diagnostics::ErrorCode;
use crate::lexer::{Token, TokenKind};
use crate::scope::{Ident, IdentKind, Linkage};
use crate::types::{T_CHAR, T_DOUBLE, T_FLOAT, T_INT, T_LONG, T_LONG_LONG, T_UNSIGNED};

/// The operation a compound-assignment token desugars to.
fn compound_assign_op(kind: TokenKind) -> Option<BinOp> {
    match kind {
        TokenKind::StarAssign => Some(BinOp::Mul),
        TokenKind::SlashAssign => Some(BinOp::Div),
        TokenKind::PercentAssign => Some(BinOp::Rem),
        TokenKind::PlusAssign => Some(BinOp::Add),
        TokenKind::MinusAssign => Some(BinOp::Sub),
        TokenKind::ShlAssign => Some(BinOp::Shl),
        TokenKind::ShrAssign => Some(BinOp::Shr),
        TokenKind::AmpAssign => Some(BinOp::BitAnd),
        TokenKind::CaretAssign => Some(BinOp::BitXor),
        TokenKind::PipeAssign => Some(BinOp::BitOr),
        _ => None,
    }
}

impl<'src> Parser<'src> {
    /// Parse a full expression (the comma level).
    pub(crate) fn parse_expr(&mut self) -> NodeId {
        let mut lhs = self.parse_assign_expr();
        while self.test(TokenKind::Comma) {
            let tok = self.next_tok();
            let rhs = self.parse_assign_expr();
            lhs = self.new_binary_op(tok.span, BinOp::Comma, lhs, rhs);
        }
        lhs
    }

    /// Assignment expression. Right-associative; compound forms are
    /// desugared to plain assignment.
    pub(crate) fn parse_assign_expr(&mut self) -> NodeId {
        let lhs = self.parse_conditional_expr();
        let tok = self.peek();
        if tok.kind == TokenKind::Assign {
            self.next_tok();
            let rhs = self.parse_assign_expr();
            return self.new_binary_op(tok.span, BinOp::Assign, lhs, rhs);
        }
        if let Some(op) = compound_assign_op(tok.kind) {
            self.next_tok();
            let rhs = self.parse_assign_expr();
            return self.new_compound_assign(tok.span, op, lhs, rhs);
        }
        lhs
    }

    /// Conditional expression `c ? t : f`. Right-associative.
    pub(crate) fn parse_conditional_expr(&mut self) -> NodeId {
        let cond = self.parse_logical_or_expr();
        if self.test(TokenKind::Question) {
            let tok = self.next_tok();
            let then = self.parse_expr();
            self.expect(TokenKind::Colon);
            let els = self.parse_conditional_expr();
            return self.new_conditional(tok.span, cond, then, els);
        }
        cond
    }

    fn parse_logical_or_expr(&mut self) -> NodeId {
        let mut lhs = self.parse_logical_and_expr();
        while self.test(TokenKind::PipePipe) {
            let tok = self.next_tok();
            let rhs = self.parse_logical_and_expr();
            lhs = self.new_binary_op(tok.span, BinOp::LogicOr, lhs, rhs);
        }
        lhs
    }

    fn parse_logical_and_expr(&mut self) -> NodeId {
        let mut lhs = self.parse_bitwise_or_expr();
        while self.test(TokenKind::AmpAmp) {
            let tok = self.next_tok();
            let rhs = self.parse_bitwise_or_expr();
            lhs = self.new_binary_op(tok.span, BinOp::LogicAnd, lhs, rhs);
        }
        lhs
    }

    fn parse_bitwise_or_expr(&mut self) -> NodeId {
        let mut lhs = self.parse_bitwise_xor_expr();
        while self.test(TokenKind::Pipe) {
            let tok = self.next_tok();
            let rhs = self.parse_bitwise_xor_expr();
            lhs = self.new_binary_op(tok.span, BinOp::BitOr, lhs, rhs);
        }
        lhs
    }

    fn parse_bitwise_xor_expr(&mut self) -> NodeId {
        let mut lhs = self.parse_bitwise_and_expr();
        while self.test(TokenKind::Caret) {
            let tok = self.next_tok();
            let rhs = self.parse_bitwise_and_expr();
            lhs = self.new_binary_op(tok.span, BinOp::BitXor, lhs, rhs);
        }
        lhs
    }

    fn parse_bitwise_and_expr(&mut self) -> NodeId {
        let mut lhs = self.parse_equality_expr();
        while self.test(TokenKind::Amp) {
            let tok = self.next_tok();
            let rhs = self.parse_equality_expr();
            lhs = self.new_binary_op(tok.span, BinOp::BitAnd, lhs, rhs);
        }
        lhs
    }

    fn parse_equality_expr(&mut self) -> NodeId {
        let mut lhs = self.parse_relational_expr();
        loop {
            let op = match self.peek().kind {
                TokenKind::EqEq => BinOp::Eq,
                TokenKind::Ne => BinOp::Ne,
                _ => return lhs,
            };
            let tok = self.next_tok();
            let rhs = self.parse_relational_expr();
            lhs = self.new_binary_op(tok.span, op, lhs, rhs);
        }
    }

    fn parse_relational_expr(&mut self) -> NodeId {
        let mut lhs = self.parse_shift_expr();
        loop {
            let op = match self.peek().kind {
                TokenKind::Lt => BinOp::Lt,
                TokenKind::Gt => BinOp::Gt,
                TokenKind::Le => BinOp::Le,
                TokenKind::Ge => BinOp::Ge,
                _ => return lhs,
            };
            let tok = self.next_tok();
            let rhs = self.parse_shift_expr();
            lhs = self.new_binary_op(tok.span, op, lhs, rhs);
        }
    }

    fn parse_shift_expr(&mut self) -> NodeId {
        let mut lhs = self.parse_additive_expr();
        loop {
            let op = match self.peek().kind {
                TokenKind::Shl => BinOp::Shl,
                TokenKind::Shr => BinOp::Shr,
                _ => return lhs,
            };
            let tok = self.next_tok();
            let rhs = self.parse_additive_expr();
            lhs = self.new_binary_op(tok.span, op, lhs, rhs);
        }
    }

    fn parse_additive_expr(&mut self) -> NodeId {
        let mut lhs = self.parse_multiplicative_expr();
        loop {
            let op = match self.peek().kind {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                _ => return lhs,
            };
            let tok = self.next_tok();
            let rhs = self.parse_multiplicative_expr();
            lhs = self.new_binary_op(tok.span, op, lhs, rhs);
        }
    }

    fn parse_multiplicative_expr(&mut self) -> NodeId {
        let mut lhs = self.parse_cast_expr();
        loop {
            let op = match self.peek().kind {
                TokenKind::Star => BinOp::Mul,
                TokenKind::Slash => BinOp::Div,
                TokenKind::Percent => BinOp::Rem,
                _ => return lhs,
            };
            let tok = self.next_tok();
            let rhs = self.parse_cast_expr();
            lhs = self.new_binary_op(tok.span, op, lhs, rhs);
        }
    }

    /// Cast expression: `( type-name ) cast-expression`, disambiguated
    /// from parenthesized expressions by the typedef lookup.
    fn parse_cast_expr(&mut self) -> NodeId {
        if self.test(TokenKind::LParen) && self.is_type_name_tok(self.peek_nth(1)) {
            let tok = self.next_tok();
            let target = self.parse_type_name();
            self.expect(TokenKind::RParen);
            let operand = self.parse_cast_expr();
            return self.new_cast(tok.span, operand, target);
        }
        self.parse_unary_expr()
    }

    fn parse_unary_expr(&mut self) -> NodeId {
        let tok = self.next_tok();
        match tok.kind {
            TokenKind::Alignof => self.parse_alignof(&tok),
            TokenKind::Sizeof => self.parse_sizeof(&tok),
            TokenKind::Inc => {
                let operand = self.parse_unary_expr();
                self.new_unary_op(tok.span, UnOp::PrefixInc, operand)
            }
            TokenKind::Dec => {
                let operand = self.parse_unary_expr();
                self.new_unary_op(tok.span, UnOp::PrefixDec, operand)
            }
            TokenKind::Amp => self.parse_unary_op(&tok, UnOp::Addr),
            TokenKind::Star => self.parse_unary_op(&tok, UnOp::Deref),
            TokenKind::Plus => self.parse_unary_op(&tok, UnOp::Plus),
            TokenKind::Minus => self.parse_unary_op(&tok, UnOp::Minus),
            TokenKind::Tilde => self.parse_unary_op(&tok, UnOp::BitNot),
            TokenKind::Bang => self.parse_unary_op(&tok, UnOp::LogicNot),
            _ => {
                self.put_back();
                self.parse_postfix_expr()
            }
        }
    }

    fn parse_unary_op(&mut self, tok: &Token, op: UnOp) -> NodeId {
        let operand = self.parse_cast_expr();
        self.new_unary_op(tok.span, op, operand)
    }

    /// `sizeof unary-expression` or `sizeof ( type-name )`. The result
    /// is an `unsigned long` constant holding the type's width.
    fn parse_sizeof(&mut self, tok: &Token) -> NodeId {
        let ty = if self.test(TokenKind::LParen) && self.is_type_name_tok(self.peek_nth(1)) {
            self.next_tok();
            let ty = self.parse_type_name();
            self.expect(TokenKind::RParen);
            ty
        } else {
            let operand = self.parse_unary_expr();
            self.expr_ty(operand)
        };

        if self.types.is_function(ty) {
            self.error_at(
                tok.span,
                "sizeof operator can't act on a function",
                ErrorCode::SizeofFunction,
            );
        }
        let width = self.types.width(ty) as i64;
        let ulong = self.types.arith(T_UNSIGNED | T_LONG);
        self.new_constant_int(tok.span, width, ulong)
    }

    /// `_Alignof ( type-name )`, an `unsigned long` constant holding
    /// the type's alignment.
    fn parse_alignof(&mut self, tok: &Token) -> NodeId {
        self.expect(TokenKind::LParen);
        let ty = self.parse_type_name();
        self.expect(TokenKind::RParen);
        let align = self.types.align(ty) as i64;
        let ulong = self.types.arith(T_UNSIGNED | T_LONG);
        self.new_constant_int(tok.span, align, ulong)
    }

    fn parse_postfix_expr(&mut self) -> NodeId {
        if self.test(TokenKind::LParen) && self.is_type_name_tok(self.peek_nth(1)) {
            let tok = self.next_tok();
            self.error_at(
                tok.span,
                "compound literals are not supported",
                ErrorCode::CompoundLiteral,
            );
            let _ = self.parse_type_name();
            self.expect(TokenKind::RParen);
            if self.try_consume(TokenKind::LBrace) {
                self.skip_brace_block(1);
            }
            return self.error_expr(tok.span);
        }

        let primary = self.parse_primary_expr();
        self.parse_postfix_tail(primary)
    }

    /// Postfix suffixes: subscription, call, member access, and
    /// postfix `++`/`--`.
    fn parse_postfix_tail(&mut self, mut lhs: NodeId) -> NodeId {
        loop {
            let tok = self.next_tok();
            match tok.kind {
                TokenKind::LBracket => {
                    let index = self.parse_expr();
                    self.expect(TokenKind::RBracket);
                    lhs = self.new_binary_op(tok.span, BinOp::Index, lhs, index);
                }
                TokenKind::LParen => {
                    lhs = self.parse_call(&tok, lhs);
                }
                TokenKind::Dot | TokenKind::Arrow => {
                    let arrow = tok.kind == TokenKind::Arrow;
                    let name_tok = self.peek();
                    if name_tok.kind == TokenKind::Identifier {
                        self.next_tok();
                        let member = self.symbol(&name_tok);
                        lhs = self.new_member_ref(tok.span, lhs, member, arrow);
                    } else {
                        self.error_expected("member name");
                    }
                }
                TokenKind::Inc => {
                    lhs = self.new_unary_op(tok.span, UnOp::PostfixInc, lhs);
                }
                TokenKind::Dec => {
                    lhs = self.new_unary_op(tok.span, UnOp::PostfixDec, lhs);
                }
                _ => {
                    self.put_back();
                    return lhs;
                }
            }
        }
    }

    /// Call arguments (`(` consumed). Argument/parameter compatibility
    /// is validated by the call factory.
    fn parse_call(&mut self, tok: &Token, callee: NodeId) -> NodeId {
        let mut args = Vec::new();
        if !self.try_consume(TokenKind::RParen) {
            loop {
                args.push(self.parse_assign_expr());
                if !self.try_consume(TokenKind::Comma) {
                    break;
                }
            }
            self.expect(TokenKind::RParen);
        }
        self.new_func_call(tok.span, callee, args)
    }

    fn parse_primary_expr(&mut self) -> NodeId {
        let tok = self.next_tok();
        match tok.kind {
            TokenKind::LParen => {
                let expr = self.parse_expr();
                self.expect(TokenKind::RParen);
                expr
            }
            TokenKind::Identifier => {
                let sym = self.symbol(&tok);
                match self.scopes.find(sym) {
                    Some(id) => self.new_ident_expr(tok.span, id),
                    None => {
                        let text = self.text(tok.span).to_string();
                        self.error_at(
                            tok.span,
                            format!("undefined symbol '{}'", text),
                            ErrorCode::UndefinedSymbol,
                        );
                        // Recover with an unbound object so the
                        // surrounding expression stays checkable.
                        let int_ty = self.int_ty;
                        let ident = self.idents.alloc(Ident {
                            name: sym,
                            ty: int_ty,
                            scope: self.scopes.current(),
                            linkage: Linkage::None,
                            kind: IdentKind::Object {
                                storage: 0,
                                offset: 0,
                            },
                        });
                        self.new_ident_expr(tok.span, ident)
                    }
                }
            }
            TokenKind::IntConst => self.parse_int_constant(&tok),
            TokenKind::FloatConst => self.parse_float_constant(&tok),
            TokenKind::CharConst => self.parse_char_constant(&tok),
            TokenKind::StringLit => {
                self.error_at(
                    tok.span,
                    "string literals are not supported",
                    ErrorCode::StringLiteral,
                );
                self.error_expr(tok.span)
            }
            TokenKind::Generic => {
                self.error_at(
                    tok.span,
                    "_Generic selections are not supported",
                    ErrorCode::GenericSelection,
                );
                if self.try_consume(TokenKind::LParen) {
                    let mut depth = 1u32;
                    while depth > 0 && !self.peek().is_eof() {
                        match self.next_tok().kind {
                            TokenKind::LParen => depth += 1,
                            TokenKind::RParen => depth -= 1,
                            _ => {}
                        }
                    }
                }
                self.error_expr(tok.span)
            }
            _ => {
                self.put_back();
                let message = format!("expected expression, found {}", tok.kind.description());
                self.error_at(tok.span, message, ErrorCode::ExpectedExpression);
                self.error_expr(tok.span)
            }
        }
    }

    // ============================================================
    // Constants
    // ============================================================

    /// Integer constant: decimal, octal, or hex digits plus optional
    /// `u`/`l` suffixes that select the type.
    fn parse_int_constant(&mut self, tok: &Token) -> NodeId {
        let text = self.text(tok.span);
        let digits_end = text
            .find(|c: char| matches!(c, 'u' | 'U' | 'l' | 'L'))
            .unwrap_or(text.len());
        let (digits, suffix) = text.split_at(digits_end);

        let parsed = if let Some(hex) = digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X"))
        {
            u64::from_str_radix(hex, 16)
        } else if digits.len() > 1 && digits.starts_with('0') {
            u64::from_str_radix(&digits[1..], 8)
        } else {
            digits.parse::<u64>()
        };
        let value = match parsed {
            Ok(v) => v as i64,
            Err(_) => {
                self.error_at(tok.span, "invalid integer literal", ErrorCode::InvalidInteger);
                0
            }
        };

        let unsigned = suffix.contains(['u', 'U']);
        let longs = suffix.matches(['l', 'L']).count();
        let mut spec = match longs {
            0 => T_INT,
            1 => T_LONG,
            _ => T_LONG_LONG,
        };
        if unsigned {
            spec |= T_UNSIGNED;
        }
        let ty = self.types.arith(spec);
        self.new_constant_int(tok.span, value, ty)
    }

    /// Floating constant; `f` suffix selects `float`, otherwise
    /// `double`.
    fn parse_float_constant(&mut self, tok: &Token) -> NodeId {
        let text = self.text(tok.span);
        let (digits, is_float) = match text.as_bytes().last().copied() {
            Some(b'f' | b'F') => (&text[..text.len() - 1], true),
            Some(b'l' | b'L') => (&text[..text.len() - 1], false),
            _ => (text, false),
        };
        let value = match digits.parse::<f64>() {
            Ok(v) => v,
            Err(_) => {
                self.error_at(tok.span, "invalid floating literal", ErrorCode::InvalidFloat);
                0.0
            }
        };
        let ty = self.types.arith(if is_float { T_FLOAT } else { T_DOUBLE });
        self.new_constant_float(tok.span, value, ty)
    }

    /// Character constant; has type `char`. Multi-character constants
    /// take the value of their first character.
    fn parse_char_constant(&mut self, tok: &Token) -> NodeId {
        let text = self.text(tok.span);
        let inner = &text[1..text.len() - 1];
        let mut chars = inner.chars();
        let value = match chars.next() {
            Some('\\') => match chars.next() {
                Some('n') => b'\n' as i64,
                Some('r') => b'\r' as i64,
                Some('t') => b'\t' as i64,
                Some('0') => 0,
                Some('a') => 0x07,
                Some('b') => 0x08,
                Some('f') => 0x0c,
                Some('v') => 0x0b,
                Some('x') => {
                    let hex: String = chars.clone().take_while(|c| c.is_ascii_hexdigit()).collect();
                    i64::from_str_radix(&hex, 16).unwrap_or(0)
                }
                Some(c) => c as i64,
                None => 0,
            },
            Some(c) => c as i64,
            None => 0,
        };
        let ty = self.types.arith(T_CHAR);
        self.new_constant_int(tok.span, value, ty)
    }
}
