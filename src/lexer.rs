//! Lexical analysis for C.
//!
//! Tokenizes C source into a stream of tokens: keywords, identifiers,
//! integer/floating/character constants, string literals, and the full
//! punctuation set. Whitespace and comments are skipped.
//!
//! # Example
//!
//! ```rust
//! use cfe::{Lexer, TokenKind};
//!
//! let tokens: Vec<_> = Lexer::new("int x = 42;").collect();
//! assert_eq!(tokens[0].kind, TokenKind::Int);
//! assert_eq!(tokens[1].kind, TokenKind::Identifier);
//! assert_eq!(tokens[2].kind, TokenKind::Assign);
//! assert_eq!(tokens[3].kind, TokenKind::IntConst);
//! assert_eq!(tokens[4].kind, TokenKind::Semi);
//! ```

use crate::span::{LineIndex, Span};
use logos::Logos;

/// Token kinds for the C lexer.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[logos(skip r"[ \t\r\n\x0c]+")]
#[logos(skip r"//[^\n]*")]
#[logos(skip r"/\*([^*]|\*+[^*/])*\*+/")]
pub enum TokenKind {
    // ============================================================
    // Keywords
    // ============================================================
    #[token("void")]
    Void,
    #[token("char")]
    Char,
    #[token("short")]
    Short,
    #[token("int")]
    Int,
    #[token("long")]
    Long,
    #[token("float")]
    Float,
    #[token("double")]
    Double,
    #[token("signed")]
    Signed,
    #[token("unsigned")]
    Unsigned,
    #[token("_Bool")]
    Bool,
    #[token("_Complex")]
    Complex,
    #[token("struct")]
    Struct,
    #[token("union")]
    Union,
    #[token("enum")]
    Enum,

    #[token("typedef")]
    Typedef,
    #[token("extern")]
    Extern,
    #[token("static")]
    Static,
    #[token("auto")]
    Auto,
    #[token("register")]
    Register,
    #[token("_Thread_local")]
    ThreadLocal,

    #[token("const")]
    Const,
    #[token("restrict")]
    Restrict,
    #[token("volatile")]
    Volatile,
    #[token("_Atomic")]
    Atomic,

    #[token("inline")]
    Inline,
    #[token("_Noreturn")]
    Noreturn,
    #[token("_Alignas")]
    Alignas,
    #[token("_Alignof")]
    Alignof,
    #[token("sizeof")]
    Sizeof,

    #[token("if")]
    If,
    #[token("else")]
    Else,
    #[token("switch")]
    Switch,
    #[token("case")]
    Case,
    #[token("default")]
    Default,
    #[token("while")]
    While,
    #[token("do")]
    Do,
    #[token("for")]
    For,
    #[token("goto")]
    Goto,
    #[token("continue")]
    Continue,
    #[token("break")]
    Break,
    #[token("return")]
    Return,

    #[token("_Static_assert")]
    StaticAssert,
    #[token("_Generic")]
    Generic,

    // ============================================================
    // Identifiers and constants
    // ============================================================
    /// Identifier. Typedef names are disambiguated by the parser
    /// through a symbol-table lookup, not by the lexer.
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*")]
    Identifier,

    /// Integer constant (decimal, octal, or hex) with optional u/l suffixes.
    #[regex(r"0[xX][0-9a-fA-F]+[uUlL]*")]
    #[regex(r"[0-9]+[uUlL]*")]
    IntConst,

    /// Floating constant with optional exponent and f/l suffix.
    #[regex(r"[0-9]+\.[0-9]*([eE][+-]?[0-9]+)?[fFlL]?")]
    #[regex(r"\.[0-9]+([eE][+-]?[0-9]+)?[fFlL]?")]
    #[regex(r"[0-9]+[eE][+-]?[0-9]+[fFlL]?")]
    FloatConst,

    /// Character constant, including escapes and multi-character forms.
    #[regex(r"'([^'\\\n]|\\[^\n])+'")]
    CharConst,

    /// String literal.
    #[regex(r#""([^"\\\n]|\\[^\n])*""#)]
    StringLit,

    // ============================================================
    // Punctuation
    // ============================================================
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token(";")]
    Semi,
    #[token(",")]
    Comma,
    #[token(":")]
    Colon,
    #[token(".")]
    Dot,
    #[token("...")]
    Ellipsis,
    #[token("->")]
    Arrow,
    #[token("?")]
    Question,

    #[token("++")]
    Inc,
    #[token("--")]
    Dec,
    #[token("&")]
    Amp,
    #[token("*")]
    Star,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("~")]
    Tilde,
    #[token("!")]
    Bang,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("<<")]
    Shl,
    #[token(">>")]
    Shr,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("<=")]
    Le,
    #[token(">=")]
    Ge,
    #[token("==")]
    EqEq,
    #[token("!=")]
    Ne,
    #[token("^")]
    Caret,
    #[token("|")]
    Pipe,
    #[token("&&")]
    AmpAmp,
    #[token("||")]
    PipePipe,

    #[token("=")]
    Assign,
    #[token("*=")]
    StarAssign,
    #[token("/=")]
    SlashAssign,
    #[token("%=")]
    PercentAssign,
    #[token("+=")]
    PlusAssign,
    #[token("-=")]
    MinusAssign,
    #[token("<<=")]
    ShlAssign,
    #[token(">>=")]
    ShrAssign,
    #[token("&=")]
    AmpAssign,
    #[token("^=")]
    CaretAssign,
    #[token("|=")]
    PipeAssign,

    // ============================================================
    // Special
    // ============================================================
    /// End of file marker (not produced by logos, appended by the parser).
    Eof,

    /// Lexer error (unexpected byte).
    Error,
}

impl TokenKind {
    /// Whether this kind is a keyword.
    pub fn is_keyword(self) -> bool {
        matches!(
            self,
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
                | TokenKind::Typedef
                | TokenKind::Extern
                | TokenKind::Static
                | TokenKind::Auto
                | TokenKind::Register
                | TokenKind::ThreadLocal
                | TokenKind::Const
                | TokenKind::Restrict
                | TokenKind::Volatile
                | TokenKind::Atomic
                | TokenKind::Inline
                | TokenKind::Noreturn
                | TokenKind::Alignas
                | TokenKind::Alignof
                | TokenKind::Sizeof
                | TokenKind::If
                | TokenKind::Else
                | TokenKind::Switch
                | TokenKind::Case
                | TokenKind::Default
                | TokenKind::While
                | TokenKind::Do
                | TokenKind::For
                | TokenKind::Goto
                | TokenKind::Continue
                | TokenKind::Break
                | TokenKind::Return
                | TokenKind::StaticAssert
                | TokenKind::Generic
        )
    }

    /// Returns a human-readable description of the token kind.
    pub fn description(self) -> &'static str {
        match self {
            TokenKind::Void => "`void`",
            TokenKind::Char => "`char`",
            TokenKind::Short => "`short`",
            TokenKind::Int => "`int`",
            TokenKind::Long => "`long`",
            TokenKind::Float => "`float`",
            TokenKind::Double => "`double`",
            TokenKind::Signed => "`signed`",
            TokenKind::Unsigned => "`unsigned`",
            TokenKind::Bool => "`_Bool`",
            TokenKind::Complex => "`_Complex`",
            TokenKind::Struct => "`struct`",
            TokenKind::Union => "`union`",
            TokenKind::Enum => "`enum`",
            TokenKind::Typedef => "`typedef`",
            TokenKind::Extern => "`extern`",
            TokenKind::Static => "`static`",
            TokenKind::Auto => "`auto`",
            TokenKind::Register => "`register`",
            TokenKind::ThreadLocal => "`_Thread_local`",
            TokenKind::Const => "`const`",
            TokenKind::Restrict => "`restrict`",
            TokenKind::Volatile => "`volatile`",
            TokenKind::Atomic => "`_Atomic`",
            TokenKind::Inline => "`inline`",
            TokenKind::Noreturn => "`_Noreturn`",
            TokenKind::Alignas => "`_Alignas`",
            TokenKind::Alignof => "`_Alignof`",
            TokenKind::Sizeof => "`sizeof`",
            TokenKind::If => "`if`",
            TokenKind::Else => "`else`",
            TokenKind::Switch => "`switch`",
            TokenKind::Case => "`case`",
            TokenKind::Default => "`default`",
            TokenKind::While => "`while`",
            TokenKind::Do => "`do`",
            TokenKind::For => "`for`",
            TokenKind::Goto => "`goto`",
            TokenKind::Continue => "`continue`",
            TokenKind::Break => "`break`",
            TokenKind::Return => "`return`",
            TokenKind::StaticAssert => "`_Static_assert`",
            TokenKind::Generic => "`_Generic`",
            TokenKind::Identifier => "identifier",
            TokenKind::IntConst => "integer constant",
            TokenKind::FloatConst => "floating constant",
            TokenKind::CharConst => "character constant",
            TokenKind::StringLit => "string literal",
            TokenKind::LParen => "`(`",
            TokenKind::RParen => "`)`",
            TokenKind::LBrace => "`{`",
            TokenKind::RBrace => "`}`",
            TokenKind::LBracket => "`[`",
            TokenKind::RBracket => "`]`",
            TokenKind::Semi => "`;`",
            TokenKind::Comma => "`,`",
            TokenKind::Colon => "`:`",
            TokenKind::Dot => "`.`",
            TokenKind::Ellipsis => "`...`",
            TokenKind::Arrow => "`->`",
            TokenKind::Question => "`?`",
            TokenKind::Inc => "`++`",
            TokenKind::Dec => "`--`",
            TokenKind::Amp => "`&`",
            TokenKind::Star => "`*`",
            TokenKind::Plus => "`+`",
            TokenKind::Minus => "`-`",
            TokenKind::Tilde => "`~`",
            TokenKind::Bang => "`!`",
            TokenKind::Slash => "`/`",
            TokenKind::Percent => "`%`",
            TokenKind::Shl => "`<<`",
            TokenKind::Shr => "`>>`",
            TokenKind::Lt => "`<`",
            TokenKind::Gt => "`>`",
            TokenKind::Le => "`<=`",
            TokenKind::Ge => "`>=`",
            TokenKind::EqEq => "`==`",
            TokenKind::Ne => "`!=`",
            TokenKind::Caret => "`^`",
            TokenKind::Pipe => "`|`",
            TokenKind::AmpAmp => "`&&`",
            TokenKind::PipePipe => "`||`",
            TokenKind::Assign => "`=`",
            TokenKind::StarAssign => "`*=`",
            TokenKind::SlashAssign => "`/=`",
            TokenKind::PercentAssign => "`%=`",
            TokenKind::PlusAssign => "`+=`",
            TokenKind::MinusAssign => "`-=`",
            TokenKind::ShlAssign => "`<<=`",
            TokenKind::ShrAssign => "`>>=`",
            TokenKind::AmpAssign => "`&=`",
            TokenKind::CaretAssign => "`^=`",
            TokenKind::PipeAssign => "`|=`",
            TokenKind::Eof => "end of file",
            TokenKind::Error => "invalid token",
        }
    }
}

/// A single token: kind plus source span.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// A token with a dummy span, for sentinels.
    pub fn dummy(kind: TokenKind) -> Self {
        Self {
            kind,
            span: Span::dummy(),
        }
    }

    pub fn is_eof(&self) -> bool {
        self.kind == TokenKind::Eof
    }
}

/// The C lexer, wrapping logos with span resolution.
pub struct Lexer<'src> {
    inner: logos::Lexer<'src, TokenKind>,
    line_index: LineIndex,
}

impl<'src> Lexer<'src> {
    /// Create a new lexer for the given source.
    pub fn new(source: &'src str) -> Self {
        Self {
            inner: TokenKind::lexer(source),
            line_index: LineIndex::new(source),
        }
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        let result = self.inner.next()?;
        let span = Span::from_range(self.inner.span(), &self.line_index);
        let kind = result.unwrap_or(TokenKind::Error);
        Some(Token::new(kind, span))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::new(source).map(|t| t.kind).collect()
    }

    #[test]
    fn keywords_and_identifiers() {
        assert_eq!(
            kinds("int _Bool boolean _Static_assert staticx"),
            vec![
                TokenKind::Int,
                TokenKind::Bool,
                TokenKind::Identifier,
                TokenKind::StaticAssert,
                TokenKind::Identifier,
            ]
        );
    }

    #[test]
    fn constants() {
        assert_eq!(
            kinds("42 0x2a 052 1.5 .5 1e3 'a' \"s\""),
            vec![
                TokenKind::IntConst,
                TokenKind::IntConst,
                TokenKind::IntConst,
                TokenKind::FloatConst,
                TokenKind::FloatConst,
                TokenKind::FloatConst,
                TokenKind::CharConst,
                TokenKind::StringLit,
            ]
        );
    }

    #[test]
    fn compound_operators() {
        assert_eq!(
            kinds("a <<= b >>= c -> d ... ++"),
            vec![
                TokenKind::Identifier,
                TokenKind::ShlAssign,
                TokenKind::Identifier,
                TokenKind::ShrAssign,
                TokenKind::Identifier,
                TokenKind::Arrow,
                TokenKind::Identifier,
                TokenKind::Ellipsis,
                TokenKind::Inc,
            ]
        );
    }

    #[test]
    fn comments_are_skipped() {
        assert_eq!(
            kinds("a // line\n b /* block\n still */ c"),
            vec![
                TokenKind::Identifier,
                TokenKind::Identifier,
                TokenKind::Identifier,
            ]
        );
    }

    #[test]
    fn spans_carry_line_and_column() {
        let tokens: Vec<_> = Lexer::new("int\n  x;").collect();
        assert_eq!(tokens[0].span.line, 1);
        assert_eq!(tokens[0].span.col, 1);
        assert_eq!(tokens[1].span.line, 2);
        assert_eq!(tokens[1].span.col, 3);
    }

    #[test]
    fn unexpected_byte_is_an_error_token() {
        let tokens: Vec<_> = Lexer::new("a @ b").collect();
        assert_eq!(tokens[1].kind, TokenKind::Error);
    }
}
