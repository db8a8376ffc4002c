//! Core parser infrastructure: token cursor, error reporting, helpers.

use std::collections::HashMap;

use graphdata_lexer::token::{Token, TokenKind};
use graphdata_types::ast::{DeclKind, Ident, Script};
use graphdata_types::{ErrorCode, ScriptError, ScriptErrors, SourceFile, Span, MAX_NESTING_DEPTH};

/// The data-script parser.
///
/// Consumes a token stream produced by the lexer and builds an AST.
/// Collects errors and attempts recovery when possible.
pub struct Parser<'src> {
    /// The token stream. Never empty; always ends with `Eof`.
    tokens: Vec<Token>,
    /// Current index into `tokens`.
    pos: usize,
    /// Source file for error context.
    source_file: &'src SourceFile,
    /// Collected errors.
    errors: ScriptErrors,
    /// Current AST nesting depth within the statement being parsed.
    pub(crate) depth: u32,
    /// Top-level names declared so far, for redeclaration checks.
    pub(crate) declared: HashMap<String, DeclKind>,
}

/// Result of parsing.
pub struct ParseResult {
    /// The parsed script, present only when no errors were reported.
    pub script: Option<Script>,
    pub errors: ScriptErrors,
}

impl<'src> Parser<'src> {
    /// Create a new parser from a token stream and source file.
    pub fn new(mut tokens: Vec<Token>, source_file: &'src SourceFile) -> Self {
        if tokens.last().is_none_or(|t| t.kind != TokenKind::Eof) {
            let span = tokens.last().map_or(Span::point(1, 1), |t| t.span);
            tokens.push(Token::new(TokenKind::Eof, span));
        }
        Self {
            tokens,
            pos: 0,
            source_file,
            errors: ScriptErrors::empty(),
            depth: 0,
            declared: HashMap::new(),
        }
    }

    // ── Token Cursor ──────────────────────────────────────────────────────────

    /// Returns the current token without advancing.
    pub(crate) fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    /// Returns the kind of the current token.
    pub(crate) fn peek_kind(&self) -> &TokenKind {
        &self.peek().kind
    }

    /// Advance the cursor by one and return the consumed token.
    pub(crate) fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    /// Returns the previously consumed token's span.
    pub(crate) fn previous_span(&self) -> Span {
        if self.pos > 0 {
            self.tokens[self.pos - 1].span
        } else {
            Span::point(1, 1)
        }
    }

    /// Returns the span of the current token.
    pub(crate) fn current_span(&self) -> Span {
        self.peek().span
    }

    /// Returns `true` if the current token is `Eof`.
    pub(crate) fn at_end(&self) -> bool {
        matches!(self.peek_kind(), TokenKind::Eof)
    }

    /// Check if the current token matches the given kind exactly.
    pub(crate) fn check_exact(&self, kind: &TokenKind) -> bool {
        self.peek_kind() == kind
    }

    /// If the current token matches, advance and return `true`.
    pub(crate) fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.check_exact(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    // ── Statement Termination ─────────────────────────────────────────────────

    /// Consume the end of a statement.
    ///
    /// A statement ends at `;`, at end of input, or before a token that
    /// starts a new line. Anything else is reported and skipped up to the
    /// next statement boundary.
    pub(crate) fn expect_terminator(&mut self) {
        if self.eat(&TokenKind::Semicolon) || self.at_end() || self.peek().newline_before {
            return;
        }
        match self.peek_kind().clone() {
            TokenKind::Operator(op) => self.error_at_current(
                ErrorCode::UNSUPPORTED_SYNTAX,
                format!("operator '{op}' is not supported in data scripts"),
            ),
            TokenKind::Comma => self.error_at_current(
                ErrorCode::UNSUPPORTED_SYNTAX,
                "comma expressions are not supported in data scripts",
            ),
            other => self.error_at_current(
                ErrorCode::MISSING_SEMICOLON,
                format!("expected ';' or a line break, got '{other}'"),
            ),
        }
        self.synchronize();
    }

    // ── Expect Helpers ────────────────────────────────────────────────────────

    /// Expect a specific token kind. Returns the token if matched, or emits an error.
    pub(crate) fn expect(&mut self, expected: &TokenKind) -> Option<Token> {
        if self.check_exact(expected) {
            Some(self.advance())
        } else {
            let message = format!("expected '{}', got '{}'", expected, self.peek_kind());
            self.error_at_current(ErrorCode::UNEXPECTED_TOKEN, message);
            None
        }
    }

    /// Expect a binding name. Keywords and reserved words are rejected.
    pub(crate) fn expect_identifier(&mut self) -> Option<Ident> {
        match self.peek_kind().clone() {
            TokenKind::Identifier(name) => {
                let span = self.advance().span;
                Some(Ident::new(name, span))
            }
            other => {
                self.error_at_current(
                    ErrorCode::UNEXPECTED_TOKEN,
                    format!("expected identifier, got '{other}'"),
                );
                None
            }
        }
    }

    /// Expect a property name after `.`; any word is accepted, so
    /// `Date.new` and `row.default` are valid.
    pub(crate) fn expect_property_name(&mut self) -> Option<Ident> {
        let word = self.peek_kind().word().map(str::to_string);
        match word {
            Some(name) => {
                let span = self.advance().span;
                Some(Ident::new(name, span))
            }
            None => {
                let message = format!("expected property name, got '{}'", self.peek_kind());
                self.error_at_current(ErrorCode::UNEXPECTED_TOKEN, message);
                None
            }
        }
    }

    // ── Nesting ───────────────────────────────────────────────────────────────

    /// Record one more level of AST nesting.
    ///
    /// Fails with E107 once [`MAX_NESTING_DEPTH`] is reached. Callers save
    /// `depth` and restore it on success; a failed statement resets it.
    pub(crate) fn descend(&mut self) -> Option<()> {
        if self.depth >= MAX_NESTING_DEPTH {
            self.error_at_current(
                ErrorCode::NESTING_LIMIT_EXCEEDED,
                format!("maximum nesting depth is {MAX_NESTING_DEPTH}"),
            );
            return None;
        }
        self.depth += 1;
        Some(())
    }

    // ── Error Reporting ───────────────────────────────────────────────────────

    /// Report an error at the current token position.
    pub(crate) fn error_at_current(&mut self, code: ErrorCode, message: impl Into<String>) {
        let span = self.current_span();
        self.error_at(code, message, span);
    }

    /// Report an error at a specific span.
    pub(crate) fn error_at(&mut self, code: ErrorCode, message: impl Into<String>, span: Span) {
        let source_line = self.source_file.line(span.start_line).unwrap_or("");
        let error = ScriptError::new(&self.source_file.name, code, message, span, source_line);
        self.errors.push(error);
    }

    /// Report an error with a fix suggestion attached.
    pub(crate) fn error_with_suggestion(
        &mut self,
        code: ErrorCode,
        message: impl Into<String>,
        span: Span,
        suggestion: impl Into<String>,
    ) {
        let source_line = self.source_file.line(span.start_line).unwrap_or("");
        let error = ScriptError::new(&self.source_file.name, code, message, span, source_line)
            .with_suggestion(suggestion);
        self.errors.push(error);
    }

    /// Returns `true` if we've hit the error limit and should stop.
    pub(crate) fn too_many_errors(&self) -> bool {
        self.errors.total_errors >= graphdata_types::MAX_ERRORS
    }

    // ── Synchronization ───────────────────────────────────────────────────────

    /// Skip tokens until the start of the next statement.
    ///
    /// Always consumes at least one token, then stops after a `;` or before
    /// a token that begins a new line.
    pub(crate) fn synchronize(&mut self) {
        while !self.at_end() {
            if self.eat(&TokenKind::Semicolon) {
                return;
            }
            self.advance();
            if self.peek().newline_before {
                return;
            }
        }
    }

    // ── Public API ────────────────────────────────────────────────────────────

    /// Parse the token stream into a [`Script`] AST.
    pub fn parse(mut self) -> ParseResult {
        let script = self.parse_script();
        let script = (!self.errors.has_errors()).then_some(script);
        ParseResult {
            script,
            errors: self.errors,
        }
    }

    fn parse_script(&mut self) -> Script {
        let start = self.current_span();
        let mut body = Vec::new();
        while !self.at_end() {
            if self.too_many_errors() {
                break;
            }
            match self.parse_statement() {
                Some(stmt) => body.push(stmt),
                None => self.synchronize(),
            }
        }
        let span = start.merge(self.previous_span());
        Script { body, span }
    }
}
