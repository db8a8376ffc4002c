//! Token types for the data-script lexer.
//!
//! Defines [`TokenKind`] covering every lexeme of the dialect and
//! [`Token`], which pairs a kind with a source [`Span`].

use graphdata_types::Span;
use std::fmt;

/// Keywords the dialect gives meaning to.
pub const KEYWORDS: &[&str] = &["var", "let", "const", "new", "true", "false", "null", "this"];

/// JavaScript reserved words the dialect does not support.
///
/// They are lexed as [`TokenKind::Reserved`] so the parser can name the
/// unsupported construct instead of reporting a confusing identifier error.
pub const RESERVED_WORDS: &[&str] = &[
    "function", "return", "if", "else", "for", "while", "do", "switch", "case", "default",
    "break", "continue", "class", "extends", "super", "import", "export", "typeof",
    "instanceof", "in", "delete", "void", "yield", "await", "try", "catch", "finally", "throw",
    "with", "debugger", "enum",
];

// ─────────────────────────────────────────────────────────────────────
// Token
// ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    /// A line terminator appeared between the previous token and this one.
    /// Drives automatic semicolon insertion.
    pub newline_before: bool,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self {
            kind,
            span,
            newline_before: false,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────
// TokenKind
// ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // ── Literals ──────────────────────────────────────────────
    /// Numeric literal in any radix: `42`, `3.14`, `.5`, `1e-3`, `0xff`
    Number(f64),
    /// Single- or double-quoted string, escapes already decoded.
    String(String),
    /// Template literal without substitutions: `` `text` ``
    Template(String),

    // ── Template substitution ────────────────────────────────
    /// Text between the opening backtick and the first `${`.
    TemplateStart(String),
    /// Text between a `}` and the next `${`.
    TemplatePart(String),
    /// Text between the last `}` and the closing backtick.
    TemplateEnd(String),
    /// The `${` opening a substitution.
    InterpolationStart,
    /// The `}` closing a substitution.
    InterpolationEnd,

    // ── Names ────────────────────────────────────────────────
    Identifier(String),
    Var,
    Let,
    Const,
    New,
    True,
    False,
    Null,
    This,
    /// A reserved word with no meaning in the dialect, e.g. `function`.
    Reserved(String),

    // ── Punctuation ──────────────────────────────────────────
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Colon,
    Semicolon,
    Dot,
    DotDotDot,

    // ── Operators ────────────────────────────────────────────
    Eq,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Bang,
    /// A JavaScript operator the dialect does not support, e.g. `===`.
    Operator(String),

    Eof,
}

impl TokenKind {
    /// Map a word to its keyword or reserved-word token.
    pub fn from_word(s: &str) -> Option<TokenKind> {
        let kind = match s {
            "var" => TokenKind::Var,
            "let" => TokenKind::Let,
            "const" => TokenKind::Const,
            "new" => TokenKind::New,
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            "null" => TokenKind::Null,
            "this" => TokenKind::This,
            _ if RESERVED_WORDS.contains(&s) => TokenKind::Reserved(s.to_string()),
            _ => return None,
        };
        Some(kind)
    }

    /// The source text of a keyword or reserved word.
    ///
    /// Used where any word is acceptable, such as property names after `.`.
    pub fn word(&self) -> Option<&str> {
        match self {
            TokenKind::Identifier(name) | TokenKind::Reserved(name) => Some(name),
            TokenKind::Var => Some("var"),
            TokenKind::Let => Some("let"),
            TokenKind::Const => Some("const"),
            TokenKind::New => Some("new"),
            TokenKind::True => Some("true"),
            TokenKind::False => Some("false"),
            TokenKind::Null => Some("null"),
            TokenKind::This => Some("this"),
            _ => None,
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(word) = self.word() {
            return f.write_str(word);
        }
        match self {
            TokenKind::Number(n) => write!(f, "{n}"),
            TokenKind::String(s) => write!(f, "{s:?}"),
            TokenKind::Template(s) => write!(f, "`{s}`"),
            TokenKind::TemplateStart(s) => write!(f, "`{s}${{"),
            TokenKind::TemplatePart(s) => write!(f, "}}{s}${{"),
            TokenKind::TemplateEnd(s) => write!(f, "}}{s}`"),
            TokenKind::InterpolationStart => f.write_str("${"),
            TokenKind::InterpolationEnd => f.write_str("}"),
            TokenKind::LParen => f.write_str("("),
            TokenKind::RParen => f.write_str(")"),
            TokenKind::LBracket => f.write_str("["),
            TokenKind::RBracket => f.write_str("]"),
            TokenKind::LBrace => f.write_str("{"),
            TokenKind::RBrace => f.write_str("}"),
            TokenKind::Comma => f.write_str(","),
            TokenKind::Colon => f.write_str(":"),
            TokenKind::Semicolon => f.write_str(";"),
            TokenKind::Dot => f.write_str("."),
            TokenKind::DotDotDot => f.write_str("..."),
            TokenKind::Eq => f.write_str("="),
            TokenKind::Plus => f.write_str("+"),
            TokenKind::Minus => f.write_str("-"),
            TokenKind::Star => f.write_str("*"),
            TokenKind::Slash => f.write_str("/"),
            TokenKind::Percent => f.write_str("%"),
            TokenKind::Bang => f.write_str("!"),
            TokenKind::Operator(op) => f.write_str(op),
            TokenKind::Eof => f.write_str("end of input"),
            // Words are handled above.
            _ => Ok(()),
        }
    }
}
