//! Parser and semantic-analysis tests.
//!
//! Organized by category:
//! - declarations, redeclaration, and linkage
//! - declarators and the type registry
//! - records and enums
//! - expressions and type checking
//! - statements and control-flow lowering
//! - error detection and recovery

use super::Parser;
use crate::ast::{BinOp, NodeId, NodeKind, UnOp};
use crate::scope::{IdentKind, Linkage};
use crate::types::{TypeId, Value};

/// Parse and assert success; the scope stack must be back at the file
/// scope afterwards.
fn assert_parses(source: &str) -> Parser<'_> {
    let mut parser = Parser::new(source);
    if let Err(errors) = parser.parse_translation_unit() {
        panic!(
            "expected parse to succeed, but got {} error(s):\n{}",
            errors.len(),
            errors
                .iter()
                .map(|e| format!("  {}:{}: {}", e.span.line, e.span.col, e.message))
                .collect::<Vec<_>>()
                .join("\n")
        );
    }
    assert_eq!(parser.scopes().depth(), 1);
    parser
}

/// Parse and assert that some diagnostic contains `expected`.
fn assert_error<'a>(source: &'a str, expected: &str) -> Parser<'a> {
    let mut parser = Parser::new(source);
    match parser.parse_translation_unit() {
        Ok(_) => panic!(
            "expected an error containing '{}', but parsing succeeded",
            expected
        ),
        Err(errors) => {
            if !errors.iter().any(|e| e.message.contains(expected)) {
                panic!(
                    "expected an error containing '{}', got:\n{}",
                    expected,
                    errors
                        .iter()
                        .map(|e| format!("  - {}", e.message))
                        .collect::<Vec<_>>()
                        .join("\n")
                );
            }
        }
    }
    assert_eq!(parser.scopes().depth(), 1);
    parser
}

fn stmts_of(parser: &Parser<'_>, node: NodeId) -> Vec<NodeId> {
    match &parser.nodes()[node].kind {
        NodeKind::CompoundStmt { stmts } => stmts.clone(),
        other => panic!("expected a compound statement, got {:?}", other),
    }
}

fn func_body(parser: &Parser<'_>, item: NodeId) -> NodeId {
    match &parser.nodes()[item].kind {
        NodeKind::FuncDef { body, .. } => *body,
        other => panic!("expected a function definition, got {:?}", other),
    }
}

fn tag_type(parser: &Parser<'_>, name: &str) -> TypeId {
    let sym = parser.lookup_symbol(name).expect("tag name interned");
    let tag = parser.scopes().find_tag(sym).expect("tag declared");
    parser.idents()[tag].ty
}

fn int_constants(parser: &Parser<'_>) -> Vec<i64> {
    parser
        .nodes()
        .iter()
        .filter_map(|(_, node)| match &node.kind {
            NodeKind::Constant {
                value: Value::Int(v),
                ..
            } => Some(*v),
            _ => None,
        })
        .collect()
}

// ============================================================
// Declarations, redeclaration, linkage
// ============================================================

#[test]
fn file_scope_redeclaration_with_external_linkage() {
    let parser = assert_parses("int x = 3; int x = 4;");
    let items = parser.unit().items.clone();
    assert_eq!(items.len(), 2);
    for item in items {
        let stmts = stmts_of(&parser, item);
        assert_eq!(stmts.len(), 1);
        assert!(matches!(
            parser.nodes()[stmts[0]].kind,
            NodeKind::BinaryOp {
                op: BinOp::Assign,
                ..
            }
        ));
    }
}

#[test]
fn static_declaration_keeps_internal_linkage_through_definition() {
    let parser = assert_parses("static int f(void); int f(void) { return 0; }");
    let f = parser.find_ident("f").expect("f declared");
    assert_eq!(parser.idents()[f].linkage, Linkage::Internal);
    assert!(matches!(
        parser.nodes()[parser.unit().items[1]].kind,
        NodeKind::FuncDef { .. }
    ));
}

#[test]
fn declaration_and_definition_are_distinguished() {
    let parser = assert_parses("int f(void); int f(void) { return 0; }");
    assert!(matches!(
        parser.nodes()[parser.unit().items[0]].kind,
        NodeKind::CompoundStmt { .. }
    ));
    assert!(matches!(
        parser.nodes()[parser.unit().items[1]].kind,
        NodeKind::FuncDef { .. }
    ));
}

#[test]
fn block_scope_extern_unifies_with_file_scope() {
    let parser = assert_parses("int shared; int f(void) { extern int shared; return shared; }");
    let sym = parser.lookup_symbol("shared").unwrap();
    let mut seen = 0;
    for (_, ident) in parser.idents().iter() {
        if ident.name == sym {
            assert_eq!(ident.linkage, Linkage::External);
            seen += 1;
        }
    }
    assert_eq!(seen, 2);
}

#[test]
fn block_scope_extern_with_conflicting_type_is_rejected() {
    assert_error(
        "int shared; int f(void) { extern float shared; return 0; }",
        "conflicting types for 'shared'",
    );
}

#[test]
fn same_scope_conflicting_types_are_rejected() {
    assert_error("int x; float x;", "conflicting types for 'x'");
}

#[test]
fn no_linkage_redeclaration_is_rejected() {
    assert_error(
        "int f(void) { int x; int x; return 0; }",
        "redeclaration of 'x' with no linkage",
    );
}

#[test]
fn static_function_at_block_scope_is_rejected() {
    assert_error(
        "int f(void) { static int g(void); return 0; }",
        "invalid storage class for function 'g'",
    );
}

#[test]
fn typedef_binds_and_resolves_to_the_same_type() {
    let parser = assert_parses("typedef unsigned long ulong_t; ulong_t y;");
    let t = parser.find_ident("ulong_t").unwrap();
    let y = parser.find_ident("y").unwrap();
    assert!(matches!(parser.idents()[t].kind, IdentKind::TypeName));
    assert_eq!(parser.idents()[t].ty, parser.idents()[y].ty);
    assert_eq!(parser.types().width(parser.idents()[y].ty), 8);
}

#[test]
fn typedef_name_can_be_shadowed_by_an_object() {
    let parser = assert_parses("typedef int T; int f(void) { int T = 5; return T; }");
    assert_eq!(parser.unit().items.len(), 2);
}

#[test]
fn void_variable_is_rejected() {
    assert_error("void v;", "declared void");
}

#[test]
fn incomplete_variable_is_rejected() {
    assert_error("struct s; struct s v;", "storage size of 'v'");
}

#[test]
fn specifier_conflicts_are_diagnosed() {
    assert_error("signed float x;", "conflicting specifiers");
    assert_error("typedef extern int x;", "conflicting specifiers");
}

#[test]
fn long_long_accumulates() {
    let parser = assert_parses("long long big; long small;");
    let big = parser.find_ident("big").unwrap();
    let small = parser.find_ident("small").unwrap();
    assert_eq!(parser.types().width(parser.idents()[big].ty), 8);
    assert_eq!(parser.types().width(parser.idents()[small].ty), 8);
    assert_ne!(parser.idents()[big].ty, parser.idents()[small].ty);
}

#[test]
fn static_assert_checks_its_condition() {
    assert_parses("_Static_assert(1, \"ok\"); int x;");
    assert_error("_Static_assert(0, \"no\");", "static assertion failed");
}

// ============================================================
// Declarators
// ============================================================

#[test]
fn nested_declarators_substitute_the_base_type() {
    let parser = assert_parses("int (*handler)(int, double);");
    let h = parser.find_ident("handler").unwrap();
    let ty = parser.idents()[h].ty;
    let pointee = parser.types().pointee(ty).expect("pointer to function");
    let (ret, params, variadic) = parser
        .types()
        .function_parts(pointee)
        .expect("function type");
    assert!(parser.types().is_integer(ret));
    assert_eq!(params.len(), 2);
    assert!(parser.types().is_float(params[1]));
    assert!(!variadic);
}

#[test]
fn array_of_pointers_vs_pointer_to_array() {
    let parser = assert_parses("int *a[3]; int (*b)[3];");

    let a_ty = parser.idents()[parser.find_ident("a").unwrap()].ty;
    assert_eq!(parser.types().array_len(a_ty), Some(3));
    assert!(parser
        .types()
        .is_pointer(parser.types().array_elem(a_ty).unwrap()));

    let b_ty = parser.idents()[parser.find_ident("b").unwrap()].ty;
    let pointee = parser.types().pointee(b_ty).unwrap();
    assert_eq!(parser.types().array_len(pointee), Some(3));
    assert!(parser
        .types()
        .is_integer(parser.types().array_elem(pointee).unwrap()));
}

#[test]
fn array_length_must_be_positive() {
    assert_error("int a[0];", "non-positive length");
}

#[test]
fn variable_length_arrays_are_rejected() {
    assert_error(
        "int f(int n) { int a[n]; return 0; }",
        "variable-length arrays are not supported",
    );
}

#[test]
fn derived_type_constraints_are_enforced() {
    assert_error(
        "typedef int F(void); F arr[3];",
        "the element of an array can't be a function",
    );
    assert_error(
        "typedef int F(void); F g(int);",
        "the return value of a function can't be a function",
    );
    assert_error(
        "typedef int A[4]; A g(void);",
        "the return value of a function can't be an array",
    );
}

#[test]
fn void_must_be_the_only_parameter() {
    assert_error("int f(int a, void);", "'void' must be the only parameter");
}

// ============================================================
// Records and enums
// ============================================================

#[test]
fn record_layout_struct_and_union() {
    let parser =
        assert_parses("struct pair { char c; int i; }; union either { char c; double d; };");

    let pair = tag_type(&parser, "pair");
    assert_eq!(parser.types().width(pair), 8);
    assert_eq!(parser.types().align(pair), 4);
    let c = parser.lookup_symbol("c").unwrap();
    let i = parser.lookup_symbol("i").unwrap();
    assert_eq!(parser.types().find_member(pair, c).unwrap().offset, 0);
    assert_eq!(parser.types().find_member(pair, i).unwrap().offset, 4);

    let either = tag_type(&parser, "either");
    assert_eq!(parser.types().width(either), 8);
    assert_eq!(parser.types().align(either), 8);
    let d = parser.lookup_symbol("d").unwrap();
    assert_eq!(parser.types().find_member(either, c).unwrap().offset, 0);
    assert_eq!(parser.types().find_member(either, d).unwrap().offset, 0);
}

#[test]
fn forward_declared_struct_completes_in_place() {
    let parser = assert_parses(
        "struct S; struct S *s; struct S { int a; }; int f(void) { return s->a; }",
    );
    let member_ty = parser
        .nodes()
        .iter()
        .find_map(|(_, node)| match &node.kind {
            NodeKind::MemberRef { ty, .. } => Some(*ty),
            _ => None,
        })
        .expect("member reference");
    assert!(parser.types().is_integer(member_ty));
    assert_eq!(parser.types().width(member_ty), 4);

    let s = parser.find_ident("s").unwrap();
    let pointee = parser.types().pointee(parser.idents()[s].ty).unwrap();
    assert!(parser.types().is_complete(pointee));
}

#[test]
fn recursive_struct_through_pointer() {
    let parser = assert_parses("struct node { int value; struct node *next; };");
    let node = tag_type(&parser, "node");
    assert_eq!(parser.types().width(node), 16);
    assert_eq!(parser.types().align(node), 8);
    let next = parser.lookup_symbol("next").unwrap();
    let next_ty = parser.types().find_member(node, next).unwrap().ty;
    assert_eq!(parser.types().pointee(next_ty), Some(node));
}

#[test]
fn member_access_through_pointer_has_the_member_offset() {
    let parser =
        assert_parses("struct pair { char c; int i; }; int f(struct pair *p) { return p->i; }");
    let (offset, ty, arrow) = parser
        .nodes()
        .iter()
        .find_map(|(_, node)| match &node.kind {
            NodeKind::MemberRef {
                offset, ty, arrow, ..
            } => Some((*offset, *ty, *arrow)),
            _ => None,
        })
        .expect("member reference");
    assert!(arrow);
    assert_eq!(offset, 4);
    assert!(parser.types().is_integer(ty));
}

#[test]
fn unknown_member_is_diagnosed() {
    assert_error(
        "struct pair { int a; }; int f(struct pair *p) { return p->b; }",
        "'b' is not a member",
    );
}

#[test]
fn tag_redefinition_is_rejected() {
    assert_error(
        "struct s { int a; }; struct s { int b; };",
        "redefinition of struct/union tag 's'",
    );
}

#[test]
fn duplicate_members_are_rejected() {
    assert_error("struct s { int a; int a; };", "duplicate member 'a'");
}

#[test]
fn enumerators_enter_the_ordinary_namespace() {
    let parser = assert_parses("enum color { RED, GREEN = 5, BLUE }; int b[BLUE];");

    let red = parser.find_ident("RED").unwrap();
    let blue = parser.find_ident("BLUE").unwrap();
    assert!(matches!(
        parser.idents()[red].kind,
        IdentKind::Constant(Value::Int(0))
    ));
    assert!(matches!(
        parser.idents()[blue].kind,
        IdentKind::Constant(Value::Int(6))
    ));

    // Enumerators are usable in constant expressions.
    let b_ty = parser.idents()[parser.find_ident("b").unwrap()].ty;
    assert_eq!(parser.types().array_len(b_ty), Some(6));
}

#[test]
fn enumerator_redefinition_is_rejected() {
    assert_error("enum e { A, A };", "redefinition of enumerator 'A'");
}

#[test]
fn enum_redefinition_is_rejected() {
    assert_error(
        "enum e { A }; enum e { B };",
        "redefinition of enumeration tag 'e'",
    );
}

// ============================================================
// Expressions and type checking
// ============================================================

#[test]
fn integer_and_float_constants_carry_their_values() {
    let parser = assert_parses("int c = 'a'; double d = 1.5; int h = 0x2a; int o = 052;");
    let ints = int_constants(&parser);
    assert!(ints.contains(&97));
    assert_eq!(ints.iter().filter(|&&v| v == 42).count(), 2);
    assert!(parser.nodes().iter().any(|(_, node)| matches!(
        node.kind,
        NodeKind::Constant {
            value: Value::Float(v),
            ..
        } if v == 1.5
    )));
}

#[test]
fn sizeof_yields_the_type_width_as_unsigned_long() {
    let parser = assert_parses("unsigned long a = sizeof(long); unsigned long b = sizeof(char);");
    let ints = int_constants(&parser);
    assert!(ints.contains(&8));
    assert!(ints.contains(&1));
}

#[test]
fn sizeof_accepts_expressions() {
    let parser = assert_parses("int x; unsigned long n = sizeof x;");
    assert!(int_constants(&parser).contains(&4));
}

#[test]
fn sizeof_rejects_functions() {
    assert_error(
        "int f(void); unsigned long n = sizeof f;",
        "sizeof operator can't act on a function",
    );
}

#[test]
fn alignof_yields_the_alignment() {
    let parser = assert_parses("unsigned long a = _Alignof(double);");
    assert!(int_constants(&parser).contains(&8));
}

#[test]
fn typedefs_disambiguate_casts() {
    assert_parses("typedef int myint; int f(int x) { return (myint)x + (int)2.0; }");
}

#[test]
fn pointer_to_floating_casts_are_rejected() {
    assert_error(
        "int f(int *p) { return (float)p; }",
        "can't cast a pointer to floating",
    );
    assert_error(
        "int *f(double d) { return (int *)d; }",
        "can't cast a floating to pointer",
    );
}

#[test]
fn assignment_requires_compatible_types() {
    let parser = assert_error(
        "int *p; float f; int g(void) { p = f; return 0; }",
        "incompatible types in assignment",
    );
    // Parsing continued past the error.
    assert_eq!(parser.unit().items.len(), 3);
    assert_eq!(parser.diagnostics().len(), 1);
}

#[test]
fn assignment_requires_an_lvalue() {
    assert_error("int f(void) { 3 = 4; return 0; }", "lvalue expression expected");
}

#[test]
fn const_objects_initialize_but_reject_assignment() {
    let parser = assert_error(
        "int f(void) { const int c = 1; c = 2; return c; }",
        "can't modify 'const' qualified expression",
    );
    assert_eq!(parser.diagnostics().len(), 1);
}

#[test]
fn compound_assignment_desugars_with_the_lhs_shared() {
    let parser = assert_parses("int f(void) { int x = 1; x += 2; return x; }");
    let rhs = parser
        .nodes()
        .iter()
        .find_map(|(_, node)| match &node.kind {
            NodeKind::BinaryOp {
                op: BinOp::Assign,
                rhs,
                lhs_once: true,
                ..
            } => Some(*rhs),
            _ => None,
        })
        .expect("desugared compound assignment");
    assert!(matches!(
        parser.nodes()[rhs].kind,
        NodeKind::BinaryOp { op: BinOp::Add, .. }
    ));
}

#[test]
fn pointer_arithmetic_and_dereference() {
    assert_parses("int f(int *p, int n) { return *(p + n); }");
    assert_parses("long f(int *a, int *b) { return a - b; }");
    assert_error(
        "int f(int *p, float g) { return *(p + g); }",
        "invalid operands to binary +",
    );
}

#[test]
fn subscription_follows_pointer_rules() {
    let parser = assert_parses("int f(int *p) { p[2] = 5; return p[2]; }");
    let index_ty = parser
        .nodes()
        .iter()
        .find_map(|(_, node)| match &node.kind {
            NodeKind::BinaryOp {
                op: BinOp::Index,
                ty,
                ..
            } => Some(*ty),
            _ => None,
        })
        .expect("subscription");
    assert!(parser.types().is_integer(index_ty));
}

#[test]
fn address_of_and_dereference_round_trip() {
    assert_parses("int f(void) { int x = 1; int *p = &x; *p = 2; return *p; }");
    assert_error("int f(int x) { return *x; }", "pointer expected for deref");
}

#[test]
fn modulo_requires_integers() {
    assert_error(
        "int f(double d) { return d % 2; }",
        "operands of '%' should be integers",
    );
}

#[test]
fn bitwise_operators_require_integer_operands() {
    assert_parses("int f(int a, int b) { return (a & b) | (a ^ b); }");
    assert_error(
        "int f(double d, int b) { return d & b; }",
        "bitwise operands should be integers",
    );
}

#[test]
fn conditional_branches_need_a_common_type() {
    assert_parses("int f(int a) { return a ? 1 : 2; }");
    assert_error(
        "int f(int *p, int a) { return a ? p : 2.5; }",
        "no common type",
    );
}

#[test]
fn calls_validate_arity_and_argument_types() {
    assert_parses("int add(int a, int b); int f(void) { return add(1, 2); }");
    assert_error(
        "int add(int a, int b); int f(void) { return add(1); }",
        "too few arguments",
    );
    assert_error(
        "int add(int a, int b); int f(void) { return add(1, 2, 3); }",
        "too many arguments",
    );
    assert_error(
        "void g(int *p); int f(void) { g(3.5); return 0; }",
        "incompatible type for argument 1",
    );
    assert_error("int x; int f(void) { return x(); }", "not a function");
}

#[test]
fn variadic_calls_accept_extra_arguments() {
    assert_parses("int log_msg(int level, ...); int f(void) { return log_msg(1, 2, 3, 4); }");
}

#[test]
fn undefined_symbols_are_diagnosed() {
    assert_error("int f(void) { return missing; }", "undefined symbol 'missing'");
}

#[test]
fn comma_expressions_fold_in_constant_positions() {
    // A parenthesized comma expression is still an integer constant;
    // its value is the rhs.
    let parser = assert_parses("int a[(1, 3)];");
    let a_ty = parser.idents()[parser.find_ident("a").unwrap()].ty;
    assert_eq!(parser.types().array_len(a_ty), Some(3));
}

#[test]
fn comma_expression_takes_the_right_type() {
    let parser = assert_parses("int f(int a) { return (a = 1, a + 2); }");
    let comma_ty = parser
        .nodes()
        .iter()
        .find_map(|(_, node)| match &node.kind {
            NodeKind::BinaryOp {
                op: BinOp::Comma,
                ty,
                ..
            } => Some(*ty),
            _ => None,
        })
        .expect("comma expression");
    assert!(parser.types().is_integer(comma_ty));
}

// ============================================================
// Statements and lowering
// ============================================================

#[test]
fn for_loops_lower_to_labels_and_jumps() {
    let parser = assert_parses(
        "int main(void) { for (int i = 0; i < 10; ++i) if (i == 5) break; return 0; }",
    );
    let body = func_body(&parser, parser.unit().items[0]);
    let body_stmts = stmts_of(&parser, body);
    let for_stmts = stmts_of(&parser, body_stmts[0]);

    let labels: Vec<NodeId> = for_stmts
        .iter()
        .copied()
        .filter(|&n| matches!(parser.nodes()[n].kind, NodeKind::LabelStmt { .. }))
        .collect();
    assert_eq!(labels.len(), 3, "cond, step, and end labels");
    let (cond_label, step_label, end_label) = (labels[0], labels[1], labels[2]);

    // ...; L_cond; if; body; L_step; step; goto L_cond; L_end
    assert_eq!(*for_stmts.last().unwrap(), end_label);
    assert!(matches!(
        parser.nodes()[for_stmts[for_stmts.len() - 2]].kind,
        NodeKind::JumpStmt { target: Some(t) } if t == cond_label
    ));

    // The step expression sits right after its label.
    let step_idx = for_stmts.iter().position(|&n| n == step_label).unwrap();
    assert!(matches!(
        parser.nodes()[for_stmts[step_idx + 1]].kind,
        NodeKind::UnaryOp {
            op: UnOp::PrefixInc,
            ..
        }
    ));

    // The break became `goto L_end`.
    let NodeKind::IfStmt {
        then: Some(then), ..
    } = parser.nodes()[for_stmts[3]].kind
    else {
        panic!("expected the loop body if statement");
    };
    assert!(matches!(
        parser.nodes()[then].kind,
        NodeKind::JumpStmt { target: Some(t) } if t == end_label
    ));
}

#[test]
fn while_loops_lower_to_cond_and_end_labels() {
    let parser = assert_parses("int f(int n) { while (n > 0) n = n - 1; return n; }");
    let body = func_body(&parser, parser.unit().items[0]);
    let while_stmts = stmts_of(&parser, stmts_of(&parser, body)[0]);
    assert_eq!(while_stmts.len(), 5);

    let cond_label = while_stmts[0];
    let end_label = while_stmts[4];
    assert!(matches!(
        parser.nodes()[cond_label].kind,
        NodeKind::LabelStmt { .. }
    ));
    assert!(matches!(
        parser.nodes()[end_label].kind,
        NodeKind::LabelStmt { .. }
    ));

    // if (c) {} else goto L_end
    let NodeKind::IfStmt {
        then,
        els: Some(els),
        ..
    } = parser.nodes()[while_stmts[1]].kind
    else {
        panic!("expected the lowered condition");
    };
    assert!(then.is_none());
    assert!(matches!(
        parser.nodes()[els].kind,
        NodeKind::JumpStmt { target: Some(t) } if t == end_label
    ));
    assert!(matches!(
        parser.nodes()[while_stmts[3]].kind,
        NodeKind::JumpStmt { target: Some(t) } if t == cond_label
    ));
}

#[test]
fn do_loops_test_the_condition_after_the_body() {
    let parser = assert_parses("int f(int n) { do n--; while (n > 0); return n; }");
    let body = func_body(&parser, parser.unit().items[0]);
    let do_stmts = stmts_of(&parser, stmts_of(&parser, body)[0]);
    assert_eq!(do_stmts.len(), 5);

    let begin_label = do_stmts[0];
    let end_label = do_stmts[4];
    let NodeKind::IfStmt {
        then: Some(then),
        els: Some(els),
        ..
    } = parser.nodes()[do_stmts[3]].kind
    else {
        panic!("expected the lowered condition");
    };
    assert!(matches!(
        parser.nodes()[then].kind,
        NodeKind::JumpStmt { target: Some(t) } if t == begin_label
    ));
    assert!(matches!(
        parser.nodes()[els].kind,
        NodeKind::JumpStmt { target: Some(t) } if t == end_label
    ));
}

#[test]
fn switch_collects_cases_and_rejects_a_second_default() {
    let mut parser = Parser::new(
        "int f(int x) { switch (x) { case 1: case 2: break; default: break; default: break; } return 0; }",
    );
    let errors = parser
        .parse_translation_unit()
        .expect_err("expected a diagnostic");
    assert_eq!(
        errors.len(),
        1,
        "exactly one diagnostic, got: {:?}",
        errors.iter().map(|e| &e.message).collect::<Vec<_>>()
    );
    assert!(errors[0].message.contains("multiple default labels"));

    // Both case values appear in the dispatch sequence against the
    // switch temporary.
    let mut case_values: Vec<i64> = parser
        .nodes()
        .iter()
        .filter_map(|(_, node)| match &node.kind {
            NodeKind::BinaryOp {
                op: BinOp::Eq,
                lhs,
                rhs,
                ..
            } => match (&parser.nodes()[*lhs].kind, &parser.nodes()[*rhs].kind) {
                (
                    NodeKind::TempVar { .. },
                    NodeKind::Constant {
                        value: Value::Int(v),
                        ..
                    },
                ) => Some(*v),
                _ => None,
            },
            _ => None,
        })
        .collect();
    case_values.sort_unstable();
    assert_eq!(case_values, vec![1, 2]);
}

#[test]
fn switch_requires_an_integer_quantity() {
    assert_error(
        "int f(double d) { switch (d) { default: break; } return 0; }",
        "switch quantity not an integer",
    );
}

#[test]
fn break_and_continue_outside_their_context_are_rejected() {
    assert_error("int f(void) { break; return 0; }", "'break' is allowed only");
    assert_error(
        "int f(void) { continue; return 0; }",
        "'continue' is allowed only",
    );
}

#[test]
fn case_outside_a_switch_is_rejected() {
    assert_error(
        "int f(void) { case 1: return 0; }",
        "case label not within a switch",
    );
}

#[test]
fn goto_resolves_against_labels_at_function_exit() {
    let parser = assert_parses("int f(void) { goto done; done: return 0; }");
    for (_, node) in parser.nodes().iter() {
        if let NodeKind::JumpStmt { target } = &node.kind {
            assert!(target.is_some(), "all jumps resolved after function exit");
        }
    }
}

#[test]
fn goto_to_an_undefined_label_is_reported_at_function_end() {
    assert_error(
        "int f(void) { goto nowhere; return 0; }",
        "label 'nowhere' used but not defined",
    );
}

#[test]
fn label_redefinition_is_rejected() {
    assert_error(
        "int f(void) { x: ; x: ; return 0; }",
        "redefinition of label 'x'",
    );
}

#[test]
fn nested_loops_restore_break_and_continue_targets() {
    let parser = assert_parses(
        "int f(void) {\
           int i; int j;\
           for (i = 0; i < 3; i++) {\
             for (j = 0; j < 3; j++) { if (j == 1) break; }\
             if (i == 2) continue;\
           }\
           return 0;\
         }",
    );
    for (_, node) in parser.nodes().iter() {
        if let NodeKind::JumpStmt { target } = &node.kind {
            assert!(target.is_some());
        }
    }
}

#[test]
fn for_init_declarations_are_scoped_to_the_loop() {
    assert_error(
        "int f(void) { for (int i = 0; i < 3; i++) ; return i; }",
        "undefined symbol 'i'",
    );
}

#[test]
fn if_conditions_must_be_scalar() {
    assert_error(
        "struct s { int a; }; int f(struct s v) { if (v) return 1; return 0; }",
        "expected a scalar expression",
    );
}

#[test]
fn object_declarations_shadow_across_blocks() {
    assert_parses("int x; int f(void) { int x = 2; { int x = 3; } return x; }");
}

// ============================================================
// Initializers
// ============================================================

#[test]
fn array_initializers_support_designators() {
    let parser = assert_parses("int a[4] = { 1, 2, [3] = 7 };");
    let decl_stmts = stmts_of(&parser, parser.unit().items[0]);
    assert_eq!(decl_stmts.len(), 1);
    let init_stmts = stmts_of(&parser, decl_stmts[0]);
    assert_eq!(init_stmts.len(), 3);

    let offsets: Vec<i32> = init_stmts
        .iter()
        .map(|&stmt| {
            let NodeKind::BinaryOp {
                op: BinOp::Assign,
                lhs,
                ..
            } = parser.nodes()[stmt].kind
            else {
                panic!("expected an element assignment");
            };
            let NodeKind::Ident { ident, .. } = parser.nodes()[lhs].kind else {
                panic!("expected an element object");
            };
            match parser.idents()[ident].kind {
                IdentKind::Object { offset, .. } => offset,
                _ => panic!("expected an object"),
            }
        })
        .collect();
    assert_eq!(offsets, vec![0, 4, 12]);
}

#[test]
fn array_designators_respect_the_bounds() {
    assert_error("int a[2] = { [5] = 1 };", "exceeds array bounds");
}

#[test]
fn braced_scalar_initializers_are_accepted() {
    assert_parses("int x = { 42 };");
}

#[test]
fn struct_initializers_are_rejected() {
    assert_error(
        "struct s { int a; }; struct s v = { 1 };",
        "struct/union initializers are not supported",
    );
}

// ============================================================
// Unsupported constructs and recovery
// ============================================================

#[test]
fn string_literals_are_rejected() {
    assert_error(
        "int f(void) { \"abc\"; return 0; }",
        "string literals are not supported",
    );
}

#[test]
fn generic_selections_are_rejected() {
    assert_error(
        "int f(int x) { return _Generic(x, int: 1); }",
        "_Generic selections are not supported",
    );
}

#[test]
fn atomic_type_specifier_is_rejected() {
    assert_error("_Atomic(int) x;", "`_Atomic(...)` type specifier is not supported");
}

#[test]
fn premature_end_of_input_is_reported() {
    assert_error("int f(void) {", "premature end of input");
}

#[test]
fn parser_recovers_after_a_missing_expression() {
    let parser = assert_error("int x = ; int y = 2;", "expected expression");
    // The second declaration still parsed.
    assert_eq!(parser.unit().items.len(), 2);
}
