//! Statement parsing and control-flow lowering.
//!
//! Loops and switches are desugared while parsing into label and
//! conditional-jump sequences:
//!
//! ```text
//! while (c) S      =>  L_cond: if (c) {} else goto L_end;
//!                      S; goto L_cond; L_end:
//!
//! do S while (c)   =>  L_begin: S;
//!                      L_cond: if (c) goto L_begin; else goto L_end;
//!                      L_end:
//!
//! for (i; c; s) S  =>  i; L_cond: if (c) {} else goto L_end;
//!                      S; L_step: s; goto L_cond; L_end:
//!
//! switch (e) S     =>  t = e; goto L_test; S;
//!                      L_test: if (t == k) goto L_k; ...;
//!                      goto L_default; L_end:
//! ```
//!
//! `break`, `continue`, `case`, and `default` communicate with the
//! enclosing construct through parser fields that are saved and
//! restored around every loop and switch body, so nesting restores
//! the outer targets on every exit path.

use super::Parser;
use crate::ast::{BinOp, NodeId};
use crate::diagnostics::ErrorCode;
use crate::eval::eval_integer;
use crate::lexer::{Token, TokenKind};
use crate::scope::ScopeKind;
use crate::span::Span;

impl<'src> Parser<'src> {
    pub(crate) fn parse_stmt(&mut self) -> NodeId {
        let tok = self.next_tok();
        if tok.is_eof() {
            self.error_at(
                tok.span,
                "premature end of input",
                ErrorCode::PrematureEndOfInput,
            );
            return self.new_empty(tok.span);
        }

        match tok.kind {
            TokenKind::Semi => self.new_empty(tok.span),
            TokenKind::LBrace => self.parse_compound_stmt(tok.span),
            TokenKind::If => self.parse_if_stmt(tok.span),
            TokenKind::Switch => self.parse_switch_stmt(tok.span),
            TokenKind::While => self.parse_while_stmt(tok.span),
            TokenKind::Do => self.parse_do_stmt(tok.span),
            TokenKind::For => self.parse_for_stmt(tok.span),
            TokenKind::Goto => self.parse_goto_stmt(tok.span),
            TokenKind::Continue => self.parse_continue_stmt(tok.span),
            TokenKind::Break => self.parse_break_stmt(tok.span),
            TokenKind::Return => self.parse_return_stmt(tok.span),
            TokenKind::Case => self.parse_case_stmt(tok.span),
            TokenKind::Default => self.parse_default_stmt(tok.span),
            TokenKind::Identifier if self.test(TokenKind::Colon) => {
                self.next_tok();
                self.parse_label_stmt(&tok)
            }
            _ => {
                self.put_back();
                let expr = self.parse_expr();
                self.expect(TokenKind::Semi);
                expr
            }
        }
    }

    /// Compound statement (`{` consumed). Enters a block scope.
    fn parse_compound_stmt(&mut self, start: Span) -> NodeId {
        self.enter_scope(ScopeKind::Block);
        let node = self.parse_compound_tail(start);
        self.exit_scope();
        node
    }

    /// Block items up to the matching `}` (which is consumed). The
    /// caller controls the scope; function bodies enter theirs before
    /// binding parameters.
    pub(crate) fn parse_compound_tail(&mut self, start: Span) -> NodeId {
        let mut stmts = Vec::new();
        while !self.try_consume(TokenKind::RBrace) {
            if self.peek().is_eof() {
                self.error_at(
                    self.peek().span,
                    "premature end of input",
                    ErrorCode::PrematureEndOfInput,
                );
                break;
            }
            let before = self.pos;
            let item = if self.is_decl_start(self.peek()) {
                self.parse_decl()
            } else {
                self.parse_stmt()
            };
            stmts.push(item);
            if self.pos == before {
                self.next_tok();
            }
        }
        self.new_compound(stmts, start.merge(self.prev_span()))
    }

    fn parse_if_stmt(&mut self, start: Span) -> NodeId {
        self.expect(TokenKind::LParen);
        let tok = self.peek();
        let cond = self.parse_expr();
        if !self.types.is_scalar(self.expr_ty(cond)) {
            self.error_at(tok.span, "expected a scalar expression", ErrorCode::ScalarExpected);
        }
        self.expect(TokenKind::RParen);

        let then = self.parse_stmt();
        let els = if self.try_consume(TokenKind::Else) {
            Some(self.parse_stmt())
        } else {
            None
        };
        self.new_if(start, cond, Some(then), els)
    }

    fn parse_while_stmt(&mut self, start: Span) -> NodeId {
        self.expect(TokenKind::LParen);
        let tok = self.peek();
        let cond = self.parse_expr();
        self.expect(TokenKind::RParen);
        if !self.types.is_scalar(self.expr_ty(cond)) {
            self.error_at(tok.span, "scalar expression expected", ErrorCode::ScalarExpected);
        }

        let cond_label = self.new_label();
        let end_label = self.new_label();
        let goto_end = self.new_jump(Some(end_label));
        let if_stmt = self.new_if(start, cond, None, Some(goto_end));

        let body = self.with_loop_body(end_label, cond_label, |p| p.parse_stmt());

        let goto_cond = self.new_jump(Some(cond_label));
        self.new_compound(vec![cond_label, if_stmt, body, goto_cond, end_label], start)
    }

    fn parse_do_stmt(&mut self, start: Span) -> NodeId {
        let begin_label = self.new_label();
        let cond_label = self.new_label();
        let end_label = self.new_label();

        let body = self.with_loop_body(end_label, begin_label, |p| p.parse_stmt());

        self.expect(TokenKind::While);
        self.expect(TokenKind::LParen);
        let tok = self.peek();
        let cond = self.parse_expr();
        self.expect(TokenKind::RParen);
        self.expect(TokenKind::Semi);
        if !self.types.is_scalar(self.expr_ty(cond)) {
            self.error_at(tok.span, "scalar expression expected", ErrorCode::ScalarExpected);
        }

        let goto_begin = self.new_jump(Some(begin_label));
        let goto_end = self.new_jump(Some(end_label));
        let if_stmt = self.new_if(start, cond, Some(goto_begin), Some(goto_end));

        self.new_compound(
            vec![begin_label, body, cond_label, if_stmt, end_label],
            start,
        )
    }

    fn parse_for_stmt(&mut self, start: Span) -> NodeId {
        // The init declaration is scoped to the loop.
        self.enter_scope(ScopeKind::Block);
        self.expect(TokenKind::LParen);

        let mut stmts = Vec::new();
        if self.is_decl_start(self.peek()) {
            stmts.push(self.parse_decl());
        } else if !self.try_consume(TokenKind::Semi) {
            stmts.push(self.parse_expr());
            self.expect(TokenKind::Semi);
        }

        let cond = if !self.try_consume(TokenKind::Semi) {
            let tok = self.peek();
            let cond = self.parse_expr();
            self.expect(TokenKind::Semi);
            if !self.types.is_scalar(self.expr_ty(cond)) {
                self.error_at(tok.span, "scalar expression expected", ErrorCode::ScalarExpected);
            }
            Some(cond)
        } else {
            None
        };

        let step = if !self.try_consume(TokenKind::RParen) {
            let step = self.parse_expr();
            self.expect(TokenKind::RParen);
            Some(step)
        } else {
            None
        };

        let cond_label = self.new_label();
        let step_label = self.new_label();
        let end_label = self.new_label();

        stmts.push(cond_label);
        if let Some(cond) = cond {
            let goto_end = self.new_jump(Some(end_label));
            stmts.push(self.new_if(start, cond, None, Some(goto_end)));
        }

        // `continue` targets the step so the increment still runs.
        let body = self.with_loop_body(end_label, step_label, |p| p.parse_stmt());
        stmts.push(body);

        stmts.push(step_label);
        if let Some(step) = step {
            stmts.push(step);
        }
        stmts.push(self.new_jump(Some(cond_label)));
        stmts.push(end_label);

        self.exit_scope();
        self.new_compound(stmts, start)
    }

    fn parse_switch_stmt(&mut self, start: Span) -> NodeId {
        self.expect(TokenKind::LParen);
        let tok = self.peek();
        let expr = self.parse_expr();
        self.expect(TokenKind::RParen);

        let ety = self.expr_ty(expr);
        if !self.types.is_integer(ety) {
            self.error_at(
                tok.span,
                "switch quantity not an integer",
                ErrorCode::IntegerExpected,
            );
        }

        // t = e; goto L_test; body; L_test: dispatch; L_end:
        let test_label = self.new_label();
        let end_label = self.new_label();
        let temp = self.new_temp_var(tok.span, ety);
        let assign = self.new_binary_op(tok.span, BinOp::Assign, temp, expr);
        let goto_test = self.new_jump(Some(test_label));
        let mut stmts = vec![assign, goto_test];

        let (body, cases, default) = self.with_switch_body(end_label, |p| p.parse_stmt());
        stmts.push(body);
        stmts.push(test_label);

        for (value, label) in cases {
            let int_ty = self.int_ty;
            let rhs = self.new_constant_int(tok.span, value, int_ty);
            let cond = self.new_binary_op(tok.span, BinOp::Eq, temp, rhs);
            let then = self.new_jump(Some(label));
            stmts.push(self.new_if(start, cond, Some(then), None));
        }
        stmts.push(self.new_jump(Some(default.unwrap_or(end_label))));
        stmts.push(end_label);

        self.new_compound(stmts, start)
    }

    /// `case constant-expression :` — records the value and its label
    /// with the enclosing switch.
    fn parse_case_stmt(&mut self, start: Span) -> NodeId {
        let err_tok = self.peek();
        let expr = self.parse_conditional_expr();
        self.expect(TokenKind::Colon);

        let value = match eval_integer(&self.nodes, &self.idents, expr) {
            Ok(v) => v,
            Err(e) => {
                self.error_at(err_tok.span, e.to_string(), ErrorCode::NotConstant);
                0
            }
        };

        let label = self.new_label();
        if let Some(cases) = self.case_labels.as_mut() {
            cases.push((value, label));
        } else {
            self.error_at(
                start,
                "case label not within a switch statement",
                ErrorCode::CaseOutsideSwitch,
            );
        }

        let stmt = self.parse_stmt();
        self.new_compound(vec![label, stmt], start)
    }

    fn parse_default_stmt(&mut self, start: Span) -> NodeId {
        let colon = self.peek();
        self.expect(TokenKind::Colon);

        let label = self.new_label();
        if self.case_labels.is_none() {
            self.error_at(
                start,
                "'default' label not within a switch statement",
                ErrorCode::CaseOutsideSwitch,
            );
        } else if self.default_label.is_some() {
            self.error_at(
                colon.span,
                "multiple default labels in one switch",
                ErrorCode::MultipleDefaultLabels,
            );
        } else {
            self.default_label = Some(label);
        }

        let stmt = self.parse_stmt();
        self.new_compound(vec![label, stmt], start)
    }

    fn parse_continue_stmt(&mut self, start: Span) -> NodeId {
        self.expect(TokenKind::Semi);
        match self.continue_dest {
            Some(dest) => self.new_jump(Some(dest)),
            None => {
                self.error_at(
                    start,
                    "'continue' is allowed only in a loop",
                    ErrorCode::ContinueOutsideLoop,
                );
                self.new_empty(start)
            }
        }
    }

    fn parse_break_stmt(&mut self, start: Span) -> NodeId {
        self.expect(TokenKind::Semi);
        match self.break_dest {
            Some(dest) => self.new_jump(Some(dest)),
            None => {
                self.error_at(
                    start,
                    "'break' is allowed only in a loop or switch",
                    ErrorCode::BreakOutsideLoop,
                );
                self.new_empty(start)
            }
        }
    }

    fn parse_return_stmt(&mut self, start: Span) -> NodeId {
        if self.try_consume(TokenKind::Semi) {
            return self.new_return(start, None);
        }
        let expr = self.parse_expr();
        self.expect(TokenKind::Semi);
        self.new_return(start, Some(expr))
    }

    /// `goto label;` — resolves eagerly against the labels seen so
    /// far, otherwise queues the jump for resolution at function exit.
    fn parse_goto_stmt(&mut self, start: Span) -> NodeId {
        let label_tok = self.peek();
        if label_tok.kind != TokenKind::Identifier {
            self.error_expected("identifier");
            self.expect(TokenKind::Semi);
            return self.new_empty(start);
        }
        self.next_tok();
        let name = self.symbol(&label_tok);
        self.expect(TokenKind::Semi);

        if let Some(&label) = self.cur_labels.get(&name) {
            return self.new_jump(Some(label));
        }
        let jump = self.new_jump(None);
        self.unresolved_jumps.push((name, label_tok.span, jump));
        jump
    }

    /// `label: statement` (identifier and `:` consumed).
    fn parse_label_stmt(&mut self, label_tok: &Token) -> NodeId {
        let name = self.symbol(label_tok);
        let stmt = self.parse_stmt();

        if self.cur_labels.contains_key(&name) {
            let text = self.text(label_tok.span).to_string();
            self.error_at(
                label_tok.span,
                format!("redefinition of label '{}'", text),
                ErrorCode::LabelRedefinition,
            );
        }
        let label = self.new_label();
        self.cur_labels.insert(name, label);
        self.new_compound(vec![label, stmt], label_tok.span)
    }

    // ============================================================
    // Scoped statement context
    // ============================================================

    /// Run `body` with the given break/continue targets, restoring the
    /// outer targets afterwards.
    fn with_loop_body<F>(&mut self, break_dest: NodeId, continue_dest: NodeId, body: F) -> NodeId
    where
        F: FnOnce(&mut Self) -> NodeId,
    {
        let break_backup = self.break_dest.replace(break_dest);
        let continue_backup = self.continue_dest.replace(continue_dest);
        let stmt = body(self);
        self.break_dest = break_backup;
        self.continue_dest = continue_backup;
        stmt
    }

    /// Run a switch body with a fresh case-label accumulator and the
    /// given break target; returns the collected case labels and
    /// default label. `continue` still targets the enclosing loop.
    fn with_switch_body<F>(
        &mut self,
        break_dest: NodeId,
        body: F,
    ) -> (NodeId, Vec<(i64, NodeId)>, Option<NodeId>)
    where
        F: FnOnce(&mut Self) -> NodeId,
    {
        let break_backup = self.break_dest.replace(break_dest);
        let cases_backup = self.case_labels.replace(Vec::new());
        let default_backup = self.default_label.take();

        let stmt = body(self);

        let cases = std::mem::replace(&mut self.case_labels, cases_backup).unwrap_or_default();
        let default = std::mem::replace(&mut self.default_label, default_backup);
        self.break_dest = break_backup;
        (stmt, cases, default)
    }
}
