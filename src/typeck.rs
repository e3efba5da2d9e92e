//! Per-node type checking.
//!
//! Invoked by the node factories: each check validates operand
//! categories for one operator family, reports diagnostics on
//! violations, and computes the node's result type. Failed checks
//! recover with `int` so parsing continues.
//!
//! Arithmetic operands follow a simplified usual-arithmetic
//! conversion: operands below the machine word widen to `int`, the
//! wider operand wins, and floating-point dominates integers.

use crate::ast::{BinOp, NodeId, NodeKind, Symbol, UnOp};
use crate::diagnostics::ErrorCode;
use crate::parser::Parser;
use crate::scope::IdentKind;
use crate::span::Span;
use crate::types::{TypeId, MACHINE_WORD, T_DOUBLE, T_FLOAT, T_BOOL, T_INT, T_LONG};

impl<'src> Parser<'src> {
    /// Whether an expression designates an addressable object.
    pub(crate) fn is_lvalue(&self, node: NodeId) -> bool {
        match &self.nodes[node].kind {
            NodeKind::Ident { ident, .. } => {
                matches!(self.idents[*ident].kind, IdentKind::Object { .. })
            }
            NodeKind::TempVar { .. } => true,
            NodeKind::UnaryOp {
                op: UnOp::Deref, ..
            } => true,
            NodeKind::BinaryOp {
                op: BinOp::Index, ..
            } => true,
            NodeKind::MemberRef { object, arrow, .. } => *arrow || self.is_lvalue(*object),
            _ => false,
        }
    }

    /// Simplified usual-arithmetic conversion for two arithmetic
    /// operands.
    fn usual_arith_conv(&mut self, lty: TypeId, rty: TypeId) -> TypeId {
        let lspec = self.types.arith_spec(lty).unwrap_or(T_INT);
        let rspec = self.types.arith_spec(rty).unwrap_or(T_INT);

        if (lspec | rspec) & T_DOUBLE != 0 {
            return self.types.arith(T_DOUBLE);
        }
        if (lspec | rspec) & T_FLOAT != 0 {
            return self.types.arith(T_FLOAT);
        }

        let lwidth = self.types.width(lty);
        let rwidth = self.types.width(rty);
        if lwidth < MACHINE_WORD && rwidth < MACHINE_WORD {
            self.types.arith(T_INT)
        } else if lwidth >= rwidth {
            self.types.arith(lspec)
        } else {
            self.types.arith(rspec)
        }
    }

    // ============================================================
    // Binary operators
    // ============================================================

    pub(crate) fn check_binary_op(
        &mut self,
        op: BinOp,
        lhs: NodeId,
        rhs: NodeId,
        span: Span,
    ) -> TypeId {
        let lty = self.expr_ty(lhs);
        let rty = self.expr_ty(rhs);

        match op {
            BinOp::Comma => rty,
            BinOp::Assign => self.check_assign(lhs, lty, rty, span),
            BinOp::Index => {
                let Some(pointee) = self.types.pointee(lty) else {
                    self.error_at(span, "a pointer expected", ErrorCode::PointerExpected);
                    return self.int_ty;
                };
                if !self.types.is_integer(rty) {
                    self.error_at(
                        span,
                        "the subscript should be an integer",
                        ErrorCode::IntegerExpected,
                    );
                }
                pointee
            }
            BinOp::Mul | BinOp::Div => {
                if !self.types.is_arith(lty) || !self.types.is_arith(rty) {
                    self.error_at(
                        span,
                        "operands should have arithmetic type",
                        ErrorCode::ArithmeticExpected,
                    );
                    return self.int_ty;
                }
                self.usual_arith_conv(lty, rty)
            }
            BinOp::Rem => {
                if !self.types.is_integer(lty) || !self.types.is_integer(rty) {
                    self.error_at(
                        span,
                        "operands of '%' should be integers",
                        ErrorCode::IntegerExpected,
                    );
                    return self.int_ty;
                }
                self.usual_arith_conv(lty, rty)
            }
            BinOp::Add | BinOp::Sub => self.check_additive(op, lty, rty, span),
            BinOp::Shl | BinOp::Shr => {
                if !self.types.is_integer(lty) || !self.types.is_integer(rty) {
                    self.error_at(
                        span,
                        "shift operands should be integers",
                        ErrorCode::IntegerExpected,
                    );
                }
                lty
            }
            BinOp::Lt | BinOp::Gt | BinOp::Le | BinOp::Ge | BinOp::Eq | BinOp::Ne => {
                if !self.types.is_scalar(lty) || !self.types.is_scalar(rty) {
                    self.error_at(
                        span,
                        "comparison operands should be scalars",
                        ErrorCode::ScalarExpected,
                    );
                }
                self.types.arith(T_BOOL)
            }
            BinOp::BitAnd | BinOp::BitXor | BinOp::BitOr => {
                if !self.types.is_integer(lty) || !self.types.is_integer(rty) {
                    self.error_at(
                        span,
                        "bitwise operands should be integers",
                        ErrorCode::IntegerExpected,
                    );
                    return self.int_ty;
                }
                self.usual_arith_conv(lty, rty)
            }
            BinOp::LogicAnd | BinOp::LogicOr => {
                if !self.types.is_scalar(lty) || !self.types.is_scalar(rty) {
                    self.error_at(
                        span,
                        "the operand should be arithmetic type or pointer",
                        ErrorCode::ScalarExpected,
                    );
                }
                self.types.arith(T_BOOL)
            }
        }
    }

    /// Additive operands: pointer ± integer, pointer − pointer over
    /// the same pointee, or two arithmetic operands.
    fn check_additive(&mut self, op: BinOp, lty: TypeId, rty: TypeId, span: Span) -> TypeId {
        let lptr = self.types.pointee(lty);
        let rptr = self.types.pointee(rty);

        match (lptr, rptr) {
            (Some(lp), Some(rp)) => {
                if op == BinOp::Sub {
                    if !self.types.equal_unqualified(lp, rp) {
                        self.error_at(span, "invalid operands to binary -", ErrorCode::InvalidOperands);
                    }
                    // Pointer difference is an integer.
                    self.types.arith(T_LONG)
                } else {
                    self.error_at(span, "invalid operands to binary +", ErrorCode::InvalidOperands);
                    lty
                }
            }
            (Some(_), None) => {
                if !self.types.is_integer(rty) {
                    let msg = if op == BinOp::Sub {
                        "invalid operands to binary -"
                    } else {
                        "invalid operands to binary +"
                    };
                    self.error_at(span, msg, ErrorCode::InvalidOperands);
                }
                lty
            }
            (None, Some(_)) => {
                if op != BinOp::Add || !self.types.is_integer(lty) {
                    self.error_at(span, "invalid operands to binary -", ErrorCode::InvalidOperands);
                }
                rty
            }
            (None, None) => {
                if !self.types.is_arith(lty) || !self.types.is_arith(rty) {
                    self.error_at(
                        span,
                        "operands should have arithmetic type",
                        ErrorCode::ArithmeticExpected,
                    );
                    return self.int_ty;
                }
                self.usual_arith_conv(lty, rty)
            }
        }
    }

    fn check_assign(&mut self, lhs: NodeId, lty: TypeId, rty: TypeId, span: Span) -> TypeId {
        if !self.is_lvalue(lhs) {
            self.error_at(span, "lvalue expression expected", ErrorCode::LvalueExpected);
        } else if self.types.is_const(lty) {
            self.error_at(
                span,
                "can't modify 'const' qualified expression",
                ErrorCode::AssignToConst,
            );
        }
        if !self.types.compatible(lty, rty) {
            self.error_at(
                span,
                "incompatible types in assignment",
                ErrorCode::IncompatibleAssignment,
            );
        }
        lty
    }

    // ============================================================
    // Unary operators
    // ============================================================

    pub(crate) fn check_unary_op(&mut self, op: UnOp, operand: NodeId, span: Span) -> TypeId {
        let ty = self.expr_ty(operand);
        match op {
            UnOp::PostfixInc | UnOp::PostfixDec | UnOp::PrefixInc | UnOp::PrefixDec => {
                if !self.is_lvalue(operand) {
                    self.error_at(span, "lvalue expression expected", ErrorCode::LvalueExpected);
                } else if self.types.is_const(ty) {
                    self.error_at(
                        span,
                        "can't modify 'const' qualified expression",
                        ErrorCode::AssignToConst,
                    );
                }
                ty
            }
            UnOp::Addr => {
                if !self.types.is_function(ty) && !self.is_lvalue(operand) {
                    self.error_at(
                        span,
                        "expression must be an lvalue or function designator",
                        ErrorCode::LvalueExpected,
                    );
                }
                self.types.pointer_to(ty, 0)
            }
            UnOp::Deref => match self.types.pointee(ty) {
                Some(pointee) => pointee,
                None => {
                    self.error_at(
                        span,
                        "pointer expected for deref operator '*'",
                        ErrorCode::PointerExpected,
                    );
                    self.int_ty
                }
            },
            UnOp::Plus | UnOp::Minus => {
                if !self.types.is_arith(ty) {
                    self.error_at(span, "arithmetic type expected", ErrorCode::ArithmeticExpected);
                }
                ty
            }
            UnOp::BitNot => {
                if !self.types.is_integer(ty) {
                    self.error_at(span, "integer expected for operator '~'", ErrorCode::IntegerExpected);
                }
                ty
            }
            UnOp::LogicNot => {
                if !self.types.is_scalar(ty) {
                    self.error_at(
                        span,
                        "arithmetic type or pointer expected for operator '!'",
                        ErrorCode::ScalarExpected,
                    );
                }
                self.types.arith(T_BOOL)
            }
            // Casts carry their target type and are checked separately.
            UnOp::Cast => ty,
        }
    }

    /// Cast target must be scalar; pointers never convert to or from
    /// floating types.
    pub(crate) fn check_cast(&mut self, target: TypeId, operand: NodeId, span: Span) -> TypeId {
        let oty = self.expr_ty(operand);
        if !self.types.is_void(target) && !self.types.is_scalar(target) {
            self.error_at(
                span,
                "the cast type should be arithmetic type or pointer",
                ErrorCode::InvalidCast,
            );
        }
        if self.types.is_float(target) && self.types.is_pointer(oty) {
            self.error_at(span, "can't cast a pointer to floating", ErrorCode::InvalidCast);
        } else if self.types.is_pointer(target) && self.types.is_float(oty) {
            self.error_at(span, "can't cast a floating to pointer", ErrorCode::InvalidCast);
        }
        target
    }

    // ============================================================
    // Conditional, member access, calls
    // ============================================================

    /// The condition must be scalar; the branches unify to a common
    /// type (identical types, arithmetic conversion, or identical
    /// pointers).
    pub(crate) fn check_conditional(
        &mut self,
        cond: NodeId,
        then: NodeId,
        els: NodeId,
        span: Span,
    ) -> TypeId {
        let cty = self.expr_ty(cond);
        if !self.types.is_scalar(cty) {
            self.error_at(span, "scalar is required", ErrorCode::ScalarExpected);
        }

        let tty = self.expr_ty(then);
        let ety = self.expr_ty(els);
        if self.types.equal_unqualified(tty, ety) {
            return tty;
        }
        if self.types.is_arith(tty) && self.types.is_arith(ety) {
            return self.usual_arith_conv(tty, ety);
        }
        if let (Some(tp), Some(ep)) = (self.types.pointee(tty), self.types.pointee(ety)) {
            if self.types.equal_unqualified(tp, ep) || self.types.is_void(tp) || self.types.is_void(ep)
            {
                return tty;
            }
        }
        self.error_at(
            span,
            "operands of '?:' have no common type",
            ErrorCode::BranchTypeMismatch,
        );
        tty
    }

    /// Member resolution for `.` and `->`. Returns the member's offset
    /// and type.
    pub(crate) fn check_member_ref(
        &mut self,
        object: NodeId,
        member: Symbol,
        arrow: bool,
        span: Span,
    ) -> (u32, TypeId) {
        let oty = self.expr_ty(object);
        let rty = if arrow {
            match self.types.pointee(oty) {
                Some(pointee) if self.types.is_record(pointee) => pointee,
                Some(_) => {
                    self.error_at(
                        span,
                        "pointer to struct/union expected",
                        ErrorCode::RecordExpected,
                    );
                    return (0, self.int_ty);
                }
                None => {
                    self.error_at(
                        span,
                        "pointer expected for operator '->'",
                        ErrorCode::PointerExpected,
                    );
                    return (0, self.int_ty);
                }
            }
        } else {
            if !self.types.is_record(oty) {
                self.error_at(span, "a struct or union expected", ErrorCode::RecordExpected);
                return (0, self.int_ty);
            }
            oty
        };

        if !self.types.is_complete(rty) {
            self.error_at(
                span,
                "member access on an incomplete struct/union",
                ErrorCode::IncompleteType,
            );
            return (0, self.int_ty);
        }
        match self.types.find_member(rty, member) {
            Some(m) => (m.offset, m.ty),
            None => {
                let name = self.interner().resolve(member).unwrap_or("?").to_string();
                self.error_at(
                    span,
                    format!("'{}' is not a member of this struct/union", name),
                    ErrorCode::UnknownMember,
                );
                (0, self.int_ty)
            }
        }
    }

    /// Call checking: the callee must have function type; each
    /// argument must be compatible with its parameter, and extra
    /// arguments are allowed only for variadic functions.
    pub(crate) fn check_call(&mut self, callee: NodeId, args: &[NodeId], span: Span) -> TypeId {
        let cty = self.expr_ty(callee);
        let Some((ret, params, variadic)) = self.types.function_parts(cty) else {
            self.error_at(span, "called object is not a function", ErrorCode::NotAFunction);
            return self.int_ty;
        };

        for (i, &param) in params.iter().enumerate() {
            match args.get(i) {
                None => {
                    self.error_at(
                        span,
                        "too few arguments to function call",
                        ErrorCode::TooFewArguments,
                    );
                    break;
                }
                Some(&arg) => {
                    let aty = self.expr_ty(arg);
                    if !self.types.compatible(param, aty) {
                        self.error_at(
                            span,
                            format!("incompatible type for argument {} of function call", i + 1),
                            ErrorCode::IncompatibleArgument,
                        );
                    }
                }
            }
        }
        if args.len() > params.len() && !variadic {
            self.error_at(
                span,
                "too many arguments to function call",
                ErrorCode::TooManyArguments,
            );
        }
        ret
    }
}
