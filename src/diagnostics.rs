//! Diagnostic reporting infrastructure.
//!
//! Errors are reported locally and parsing continues best-effort; the
//! parser accumulates diagnostics and never unwinds. Each diagnostic
//! carries a source span (file/line/column through the emitter) and a
//! one-line message.
//!
//! # Error Codes
//!
//! Error codes are organized by category:
//!
//! - **E0001-E0099**: lexical errors
//! - **E0100-E0199**: token-shape errors (wrong token)
//! - **E0200-E0249**: specifier incompatibilities
//! - **E0250-E0299**: redeclarations
//! - **E0300-E0399**: undefined uses
//! - **E0400-E0499**: type mismatches
//! - **E0500-E0599**: constraint violations
//! - **E0600-E0699**: unsupported constructs

use crate::span::Span;
use ariadne::{Color, Label, Report, ReportKind, Source};
use thiserror::Error;

/// Diagnostic codes, grouped by error category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum ErrorCode {
    // Lexical (E0001-E0099)
    /// Unexpected character in source.
    UnexpectedCharacter = 1,
    /// Input ended inside a construct.
    PrematureEndOfInput = 2,
    /// Malformed integer literal.
    InvalidInteger = 3,
    /// Malformed floating literal.
    InvalidFloat = 4,

    // Token shape (E0100-E0199)
    /// Unexpected token.
    UnexpectedToken = 100,
    /// Unexpected end of file.
    UnexpectedEof = 101,
    /// Expected an expression.
    ExpectedExpression = 102,
    /// Expected an identifier.
    ExpectedIdentifier = 103,
    /// Expected a type specifier.
    ExpectedTypeSpecifier = 104,
    /// Expected a member name.
    ExpectedMemberName = 105,

    // Specifier incompatibility (E0200-E0249)
    /// Conflicting storage/type specifier bits.
    IncompatibleSpecifiers = 200,
    /// Storage or function specifiers in a type-name context.
    SpecifierQualifierOnly = 201,
    /// Storage class invalid at this position.
    InvalidStorageClass = 202,

    // Redeclaration (E0250-E0299)
    /// Same-scope redeclaration with a different type.
    ConflictingTypes = 250,
    /// Redeclaration of a no-linkage identifier.
    RedeclarationNoLinkage = 251,
    /// Redeclaration with conflicting linkage.
    ConflictingLinkage = 252,
    /// Redefinition of a struct/union/enum tag.
    TagRedefinition = 253,
    /// Redefinition of an enumerator.
    EnumeratorRedefinition = 254,
    /// Redefinition of a label.
    LabelRedefinition = 255,
    /// Duplicate member name in a struct/union.
    DuplicateMember = 256,
    /// More than one `default` label in a switch.
    MultipleDefaultLabels = 257,

    // Undefined use (E0300-E0399)
    /// Use of an undeclared identifier.
    UndefinedSymbol = 300,
    /// Label used but never defined.
    UndefinedLabel = 301,
    /// Member name not found in struct/union.
    UnknownMember = 302,

    // Type mismatch (E0400-E0499)
    /// Pointer operand required.
    PointerExpected = 400,
    /// Integer operand required.
    IntegerExpected = 401,
    /// Arithmetic operand required.
    ArithmeticExpected = 402,
    /// Scalar operand required.
    ScalarExpected = 403,
    /// Lvalue required.
    LvalueExpected = 404,
    /// Assignment to const-qualified expression.
    AssignToConst = 405,
    /// Incompatible types in assignment.
    IncompatibleAssignment = 406,
    /// Argument incompatible with parameter.
    IncompatibleArgument = 407,
    /// Called object is not a function.
    NotAFunction = 408,
    /// Struct or union operand required.
    RecordExpected = 409,
    /// Invalid operand combination for an operator.
    InvalidOperands = 410,
    /// Invalid cast.
    InvalidCast = 411,
    /// Conditional branches have no common type.
    BranchTypeMismatch = 412,
    /// Too few arguments in a call.
    TooFewArguments = 413,
    /// Too many arguments in a call.
    TooManyArguments = 414,

    // Constraint violation (E0500-E0599)
    /// Variable declared void.
    VoidVariable = 500,
    /// Variable of incomplete type.
    IncompleteType = 501,
    /// Array element of function type.
    ArrayOfFunctions = 502,
    /// Function returning a function.
    FunctionReturningFunction = 503,
    /// Function returning an array.
    FunctionReturningArray = 504,
    /// Array of non-positive length.
    ZeroLengthArray = 505,
    /// Expression is not an integer constant.
    NotConstant = 506,
    /// `break` outside loop or switch.
    BreakOutsideLoop = 507,
    /// `continue` outside loop.
    ContinueOutsideLoop = 508,
    /// `case`/`default` outside switch.
    CaseOutsideSwitch = 509,
    /// `sizeof` applied to a function type.
    SizeofFunction = 510,
    /// Initializer on a non-object declaration.
    UnexpectedInitializer = 511,
    /// `_Static_assert` condition is zero.
    StaticAssertFailed = 512,
    /// Array designator outside the array bounds.
    ArrayIndexOutOfBounds = 513,
    /// Struct/union member declared with function type.
    FunctionMember = 514,

    // Unsupported (E0600-E0699)
    /// String literal expressions.
    StringLiteral = 600,
    /// `_Generic` selection.
    GenericSelection = 601,
    /// Compound literal.
    CompoundLiteral = 602,
    /// Variable-length array.
    VariableLengthArray = 603,
    /// `_Atomic(...)` type specifier.
    AtomicType = 604,
    /// Struct/union initializer list.
    StructInitializer = 605,
}

impl ErrorCode {
    /// Get the formatted error code string (e.g., "E0400").
    pub fn as_str(&self) -> String {
        format!("E{:04}", *self as u16)
    }

    /// Get a help message suggesting how to fix the error, if there is one.
    pub fn help(&self) -> Option<&'static str> {
        match self {
            ErrorCode::VoidVariable => {
                Some("only pointers to `void` can be declared; use `void *`")
            }
            ErrorCode::ZeroLengthArray => Some("array lengths must be positive"),
            ErrorCode::VariableLengthArray => {
                Some("array lengths must be integer constant expressions")
            }
            ErrorCode::BreakOutsideLoop => {
                Some("`break` may only appear inside a loop or switch body")
            }
            ErrorCode::ContinueOutsideLoop => Some("`continue` may only appear inside a loop body"),
            ErrorCode::MultipleDefaultLabels => {
                Some("a switch statement may contain at most one `default` label")
            }
            ErrorCode::StringLiteral
            | ErrorCode::GenericSelection
            | ErrorCode::CompoundLiteral
            | ErrorCode::AtomicType
            | ErrorCode::StructInitializer => Some("this construct is not supported"),
            _ => None,
        }
    }
}

/// The kind of diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// An error that marks the translation unit invalid.
    Error,
    /// A warning that does not.
    Warning,
}

impl DiagnosticKind {
    fn to_report_kind(self) -> ReportKind<'static> {
        match self {
            DiagnosticKind::Error => ReportKind::Error,
            DiagnosticKind::Warning => ReportKind::Warning,
        }
    }

    fn color(self) -> Color {
        match self {
            DiagnosticKind::Error => Color::Red,
            DiagnosticKind::Warning => Color::Yellow,
        }
    }
}

/// A single diagnostic: one-line message keyed by a source span.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// The kind of diagnostic.
    pub kind: DiagnosticKind,
    /// The error code (e.g., "E0400").
    pub code: Option<String>,
    /// The main message.
    pub message: String,
    /// The primary span where the error occurred.
    pub span: Span,
    /// Suggestions for fixing the error.
    pub suggestions: Vec<String>,
}

impl Diagnostic {
    /// Create a new error diagnostic.
    pub fn error(message: impl Into<String>, span: Span) -> Self {
        Self {
            kind: DiagnosticKind::Error,
            code: None,
            message: message.into(),
            span,
            suggestions: Vec::new(),
        }
    }

    /// Create a new warning diagnostic.
    pub fn warning(message: impl Into<String>, span: Span) -> Self {
        Self {
            kind: DiagnosticKind::Warning,
            code: None,
            message: message.into(),
            span,
            suggestions: Vec::new(),
        }
    }

    /// Attach an error code; adds its help message when available.
    pub fn with_error_code(mut self, code: ErrorCode) -> Self {
        self.code = Some(code.as_str());
        if let Some(help) = code.help() {
            self.suggestions.push(help.to_string());
        }
        self
    }

    /// Add a suggestion.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    /// The message as presented to users, with its error code
    /// prefixed when one is attached.
    pub fn headline(&self) -> String {
        match &self.code {
            Some(code) => format!("[{}] {}", code, self.message),
            None => self.message.clone(),
        }
    }

    /// All suggestions folded into one help text, if any.
    fn help_text(&self) -> Option<String> {
        if self.suggestions.is_empty() {
            None
        } else {
            Some(self.suggestions.join("\n"))
        }
    }
}

/// Diagnostic emitter that pretty-prints diagnostics to stderr.
pub struct DiagnosticEmitter<'a> {
    filename: &'a str,
    source: &'a str,
}

impl<'a> DiagnosticEmitter<'a> {
    pub fn new(filename: &'a str, source: &'a str) -> Self {
        Self { filename, source }
    }

    /// Emit a diagnostic to stderr.
    pub fn emit(&self, diagnostic: &Diagnostic) {
        if let Err(err) = self.render(diagnostic) {
            eprintln!(
                "{}:{}:{}: {}",
                self.filename, diagnostic.span.line, diagnostic.span.col, diagnostic.message
            );
            eprintln!("(diagnostic rendering failed: {})", err);
        }
    }

    fn render(&self, diagnostic: &Diagnostic) -> std::io::Result<()> {
        let primary = Label::new((self.filename, diagnostic.span.start..diagnostic.span.end))
            .with_message(&diagnostic.message)
            .with_color(diagnostic.kind.color());

        let mut report = Report::build(
            diagnostic.kind.to_report_kind(),
            self.filename,
            diagnostic.span.start,
        )
        .with_message(diagnostic.headline())
        .with_label(primary);
        if let Some(help) = diagnostic.help_text() {
            report = report.with_help(help);
        }

        report
            .finish()
            .eprint((self.filename, Source::from(self.source)))
    }
}

/// Failure of integer constant evaluation.
///
/// Call sites convert these into diagnostics at the token that anchors
/// the constant expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EvalError {
    #[error("expression is not an integer constant")]
    NotConstant,
    #[error("division by zero in constant expression")]
    DivisionByZero,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_code_formatting() {
        assert_eq!(ErrorCode::UnexpectedCharacter.as_str(), "E0001");
        assert_eq!(ErrorCode::UnexpectedToken.as_str(), "E0100");
        assert_eq!(ErrorCode::VariableLengthArray.as_str(), "E0603");
    }

    #[test]
    fn diagnostic_with_code_picks_up_help() {
        let diag = Diagnostic::error("oops", Span::dummy())
            .with_error_code(ErrorCode::MultipleDefaultLabels);
        assert_eq!(diag.code.as_deref(), Some("E0257"));
        assert!(!diag.suggestions.is_empty());
    }

    #[test]
    fn headline_prefixes_the_error_code() {
        let coded = Diagnostic::error("bad token", Span::dummy())
            .with_error_code(ErrorCode::UnexpectedToken);
        assert_eq!(coded.headline(), "[E0100] bad token");

        let bare = Diagnostic::error("bad token", Span::dummy());
        assert_eq!(bare.headline(), "bad token");
    }
}
