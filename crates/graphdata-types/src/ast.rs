//! AST node types for the data-script dialect.
//!
//! The dialect is the literal-data subset of JavaScript: declarations,
//! assignments, and expressions built from literals, references,
//! arithmetic, member access, and `Date` construction. Every node carries a
//! [`Span`] for error reporting.

use crate::Span;

// ══════════════════════════════════════════════════════════════════════════════
// Top Level
// ══════════════════════════════════════════════════════════════════════════════

/// A complete script: top-level statements in source order.
#[derive(Debug, Clone, PartialEq)]
pub struct Script {
    pub body: Vec<Stmt>,
    pub span: Span,
}

/// A spanned identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

impl Ident {
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            span,
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Statements
// ══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// `var a = 1, b;` / `let a = 1;` / `const a = 1;`
    VarDecl(VarDecl),
    /// Any expression followed by a terminator, including assignments.
    Expr(ExprStmt),
    /// A lone `;`.
    Empty(Span),
}

impl Stmt {
    pub fn span(&self) -> Span {
        match self {
            Stmt::VarDecl(decl) => decl.span,
            Stmt::Expr(stmt) => stmt.span,
            Stmt::Empty(span) => *span,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclKind {
    Var,
    Let,
    Const,
}

impl DeclKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DeclKind::Var => "var",
            DeclKind::Let => "let",
            DeclKind::Const => "const",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VarDecl {
    pub kind: DeclKind,
    pub declarators: Vec<Declarator>,
    pub span: Span,
}

/// `name` or `name = init`
#[derive(Debug, Clone, PartialEq)]
pub struct Declarator {
    pub name: Ident,
    pub init: Option<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExprStmt {
    pub expr: Expr,
    pub span: Span,
}

// ══════════════════════════════════════════════════════════════════════════════
// Expressions
// ══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    // ── Literals ──
    NumberLit(f64),
    StringLit(String),
    BoolLit(bool),
    NullLit,
    /// `` `text ${expr} text` ``
    Template(Vec<TemplatePart>),
    ArrayLit(Vec<ArrayElement>),
    ObjectLit(Vec<ObjectEntry>),

    // ── References ──
    Identifier(String),
    /// Top-level `this`, i.e. the global object.
    This,

    // ── Access & construction ──
    /// `object.property`
    Member {
        object: Box<Expr>,
        property: Ident,
    },
    /// `object[index]`
    Index {
        object: Box<Expr>,
        index: Box<Expr>,
    },
    /// `callee(args)`
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    /// `new callee(args)` or `new callee`
    New {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },

    // ── Operators ──
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    /// A run of operators of one precedence level, applied left to right:
    /// `first op₁ e₁ op₂ e₂ …`. Kept flat so long chains stay shallow.
    Binary {
        first: Box<Expr>,
        rest: Vec<(BinOp, Expr)>,
    },
    /// `target = value`; the parser only produces identifier, member, or
    /// index targets.
    Assign {
        target: Box<Expr>,
        value: Box<Expr>,
    },
    Paren(Box<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum TemplatePart {
    Literal(String),
    Expr(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ArrayElement {
    Expr(Expr),
    /// `...expr`
    Spread(Expr),
    /// An elided element: `[1, , 3]`.
    Hole(Span),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ObjectEntry {
    /// `key: value`, or the shorthand `key` (value is then an identifier
    /// expression with the same name).
    Property { key: PropertyKey, value: Expr },
    /// `...expr`
    Spread(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub enum PropertyKey {
    /// Identifier, keyword, or string key.
    Named(String),
    /// Numeric key; converted to its canonical string at evaluation time.
    Number(f64),
    /// `[expr]`
    Computed(Box<Expr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl BinOp {
    pub fn as_str(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// `-`
    Neg,
    /// `+`
    Plus,
    /// `!`
    Not,
}
