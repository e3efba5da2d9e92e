//! End-to-end tests over the public API.

use cfe::{Linkage, NodeKind, Parser};

const SOURCE: &str = r#"
typedef unsigned long size_t;

enum state { IDLE, RUNNING = 3, DONE };

struct buffer {
    int length;
    int capacity;
    struct buffer *next;
};

static int clamp(int value, int low, int high) {
    if (value < low)
        return low;
    if (value > high)
        return high;
    return value;
}

int drain(struct buffer *buf) {
    int total = 0;
    while (buf->length > 0) {
        buf->length -= 1;
        total += 1;
    }
    return total;
}

int classify(int state) {
    switch (state) {
    case IDLE:
        return 0;
    case RUNNING:
        return 1;
    default:
        return clamp(state, 0, 7);
    }
}

size_t probe(void) {
    return sizeof(struct buffer);
}
"#;

#[test]
fn parses_a_representative_module() {
    let mut parser = Parser::new(SOURCE);
    let unit = parser
        .parse_translation_unit()
        .expect("the module should parse cleanly");

    // typedef, enum, struct, and four function definitions.
    assert_eq!(unit.items.len(), 7);
    let func_defs = unit
        .items
        .iter()
        .filter(|&&item| matches!(parser.nodes()[item].kind, NodeKind::FuncDef { .. }))
        .count();
    assert_eq!(func_defs, 4);

    // `clamp` is internal, `drain` external.
    let clamp = parser.find_ident("clamp").unwrap();
    assert_eq!(parser.idents()[clamp].linkage, Linkage::Internal);
    let drain = parser.find_ident("drain").unwrap();
    assert_eq!(parser.idents()[drain].linkage, Linkage::External);

    // The struct laid out: length 0, capacity 4, next 8; width 16.
    let probe = parser.find_ident("probe").unwrap();
    let (ret, params, variadic) = parser
        .types()
        .function_parts(parser.idents()[probe].ty)
        .unwrap();
    assert!(params.is_empty());
    assert!(!variadic);
    assert_eq!(parser.types().width(ret), 8);
    assert!(parser.nodes().iter().any(|(_, node)| matches!(
        node.kind,
        NodeKind::Constant { value: cfe::Value::Int(16), .. }
    )));

    // Enumerators resolved as constants inside the switch dispatch.
    assert_eq!(parser.diagnostics().len(), 0);
}

#[test]
fn diagnostics_carry_line_and_column() {
    let source = "int x = ;";
    let mut parser = Parser::new(source);
    let errors = parser
        .parse_translation_unit()
        .expect_err("the initializer is missing");
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].span.line, 1);
    assert_eq!(errors[0].span.col, 9);
}

#[test]
fn all_errors_in_an_invalid_unit_are_reported() {
    let source = "void v;\nint f(void) { break; return missing; }\n";
    let mut parser = Parser::new(source);
    let errors = parser.parse_translation_unit().expect_err("invalid unit");
    assert!(errors.len() >= 3);
    assert!(errors.iter().any(|e| e.message.contains("declared void")));
    assert!(errors.iter().any(|e| e.message.contains("'break'")));
    assert!(errors.iter().any(|e| e.message.contains("undefined symbol")));
}

#[test]
fn the_partial_ast_survives_errors() {
    let source = "int ok = 1; int bad = ; int also_ok = 2;";
    let mut parser = Parser::new(source);
    assert!(parser.parse_translation_unit().is_err());
    assert_eq!(parser.unit().items.len(), 3);
    assert!(parser.find_ident("also_ok").is_some());
}
