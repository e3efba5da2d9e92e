//! # cfe
//!
//! A recursive-descent C front end with integrated semantic analysis.
//!
//! `cfe` consumes C source for one translation unit and produces a
//! typed AST: declarations are lifted to compound statements holding
//! their assignment-initializers, loops and switches are lowered to
//! label/jump sequences, and every expression node carries its
//! resolved type. Scope and linkage resolution (four disjoint name
//! spaces, forward-declaration merging, external-symbol unification)
//! happens during parsing.
//!
//! The component is embedded: there is no CLI and no configuration.
//! Errors are accumulated as diagnostics and parsing continues
//! best-effort; a translation unit is invalid if any diagnostic was
//! recorded.
//!
//! ## Quick Start
//!
//! ```rust
//! use cfe::Parser;
//!
//! let source = r#"
//! struct point { int x; int y; };
//!
//! int manhattan(struct point *p) {
//!     int d = 0;
//!     d += p->x;
//!     d += p->y;
//!     return d;
//! }
//! "#;
//!
//! let mut parser = Parser::new(source);
//! match parser.parse_translation_unit() {
//!     Ok(unit) => println!("{} top-level items", unit.items.len()),
//!     Err(errors) => {
//!         for error in &errors {
//!             eprintln!("{}:{}: {}", error.span.line, error.span.col, error.message);
//!         }
//!     }
//! }
//! ```
//!
//! ## Rendering diagnostics
//!
//! ```rust
//! use cfe::{Parser, diagnostics::DiagnosticEmitter};
//!
//! let source = "int x = ;";
//! let mut parser = Parser::new(source);
//! if let Err(errors) = parser.parse_translation_unit() {
//!     let emitter = DiagnosticEmitter::new("example.c", source);
//!     for error in &errors {
//!         emitter.emit(error);
//!     }
//! }
//! ```
//!
//! ## Module Overview
//!
//! - [`lexer`] - tokenization
//! - [`parser`] - parsing, node factories, function definitions
//! - [`ast`] - the typed AST
//! - [`types`] - the type registry
//! - [`scope`] - scopes, name spaces, and linkage
//! - [`eval`] - integer constant evaluation
//! - [`diagnostics`] - error reporting
//! - [`arena`] - id-addressed storage
//! - [`span`] - source location tracking

pub mod arena;
pub mod ast;
pub mod diagnostics;
pub mod eval;
pub mod lexer;
pub mod parser;
pub mod scope;
pub mod span;
pub mod types;

mod typeck;

// Re-export commonly used types.
pub use ast::{BinOp, Node, NodeId, NodeKind, Symbol, TranslationUnit, UnOp};
pub use diagnostics::{Diagnostic, DiagnosticEmitter, DiagnosticKind, ErrorCode};
pub use lexer::{Lexer, Token, TokenKind};
pub use parser::Parser;
pub use scope::{Ident, IdentId, IdentKind, Linkage, ScopeKind};
pub use span::Span;
pub use types::{TypeId, TypeKind, TypeRegistry, Value};
