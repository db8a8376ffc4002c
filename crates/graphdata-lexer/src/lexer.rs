//! Core lexer: converts script text to a token stream.
//!
//! Features:
//! - Numbers in every JavaScript radix, with exponents and `_` separators
//! - Single/double-quoted strings with the full escape set
//! - Template literals with `${expr}` substitutions via a mode stack
//! - `//` and `/* */` comments, a leading `#!` line
//! - Line-break tracking on every token for automatic semicolon insertion
//! - Error recovery: collects up to [`MAX_ERRORS`] errors instead of stopping

use graphdata_types::{ErrorCode, ScriptError, ScriptErrors, SourceFile, Span, MAX_ERRORS};

use crate::token::{Token, TokenKind};

/// Lexer mode: plain code, or the text and substitution parts of a
/// template literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Normal,
    /// Inside a template literal, scanning text until `` ` `` or `${`.
    Template,
    /// Inside `${...}`. `brace_depth` counts nested `{` so the closing `}`
    /// of the substitution can be told apart from object literal braces.
    Interpolation { brace_depth: u32 },
}

/// Where a chunk of template text ended.
enum TemplateStop {
    Backtick,
    Substitution,
    Eof,
}

pub struct Lexer<'src> {
    source: &'src str,
    source_file: &'src SourceFile,
    /// Current byte offset into `source`.
    pos: usize,
    line: u32,
    /// Column in characters, 1-based.
    col: u32,
    errors: ScriptErrors,
    mode_stack: Vec<Mode>,
    /// Tokens to emit before scanning again (used for `${`).
    pending: Vec<Token>,
    /// A line terminator was skipped since the last token.
    newline_pending: bool,
}

/// Result of lexing: tokens + any errors collected.
pub struct LexResult {
    /// The token stream (always ends with [`TokenKind::Eof`]).
    pub tokens: Vec<Token>,
    pub errors: ScriptErrors,
}

impl<'src> Lexer<'src> {
    pub fn new(source_file: &'src SourceFile) -> Self {
        Self {
            source: &source_file.source,
            source_file,
            pos: 0,
            line: 1,
            col: 1,
            errors: ScriptErrors::empty(),
            mode_stack: vec![Mode::Normal],
            pending: Vec::new(),
            newline_pending: false,
        }
    }

    /// Lex the entire source file into a token stream.
    pub fn lex(mut self) -> LexResult {
        self.skip_hashbang();
        let mut tokens = Vec::new();

        loop {
            if self.too_many_errors() {
                break;
            }

            if let Some(pending) = self.pending.pop() {
                tokens.push(pending);
                continue;
            }

            let mut token = match self.current_mode() {
                Mode::Template => self.scan_template_continuation(),
                Mode::Normal | Mode::Interpolation { .. } => self.scan_normal(),
            };
            token.newline_before = std::mem::take(&mut self.newline_pending);

            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }

        if tokens.last().is_none_or(|t| t.kind != TokenKind::Eof) {
            tokens.push(Token::new(TokenKind::Eof, self.current_span()));
        }

        LexResult {
            tokens,
            errors: self.errors,
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Mode stack helpers
    // ─────────────────────────────────────────────────────────────

    fn current_mode(&self) -> Mode {
        *self.mode_stack.last().unwrap_or(&Mode::Normal)
    }

    fn push_mode(&mut self, mode: Mode) {
        self.mode_stack.push(mode);
    }

    fn pop_mode(&mut self) {
        if self.mode_stack.len() > 1 {
            self.mode_stack.pop();
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Character-level helpers
    // ─────────────────────────────────────────────────────────────

    fn peek(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.source[self.pos..].chars().nth(offset)
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(ch)
    }

    /// Consume `expected` if it is the next character.
    fn eat_char(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn current_span(&self) -> Span {
        Span::point(self.line, self.col)
    }

    fn span_from(&self, start_line: u32, start_col: u32) -> Span {
        Span::new(
            start_line,
            start_col,
            self.line,
            self.col.saturating_sub(1).max(1),
        )
    }

    fn too_many_errors(&self) -> bool {
        self.errors.total_errors >= MAX_ERRORS
    }

    fn emit_error(&mut self, code: ErrorCode, message: impl Into<String>, span: Span) {
        let source_line = self.source_file.line(span.start_line).unwrap_or("");
        let err = ScriptError::new(&self.source_file.name, code, message, span, source_line);
        self.errors.push(err);
    }

    // ─────────────────────────────────────────────────────────────
    // Whitespace & comments
    // ─────────────────────────────────────────────────────────────

    /// Skip a `#!` interpreter line at the very start of the file.
    fn skip_hashbang(&mut self) {
        if self.source.starts_with("#!") {
            while matches!(self.peek(), Some(ch) if ch != '\n') {
                self.advance();
            }
        }
    }

    /// Skip whitespace and comments, recording whether a line break was seen.
    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                Some(ch) if is_line_terminator(ch) => {
                    self.advance();
                    self.newline_pending = true;
                }
                Some(ch) if ch.is_whitespace() || ch == '\u{feff}' => {
                    self.advance();
                }
                Some('/') if self.peek_at(1) == Some('/') => {
                    while matches!(self.peek(), Some(ch) if !is_line_terminator(ch)) {
                        self.advance();
                    }
                }
                Some('/') if self.peek_at(1) == Some('*') => self.skip_block_comment(),
                _ => break,
            }
        }
    }

    fn skip_block_comment(&mut self) {
        let start_line = self.line;
        let start_col = self.col;
        self.advance();
        self.advance();
        loop {
            match self.peek() {
                None => {
                    let span = self.span_from(start_line, start_col);
                    self.emit_error(
                        ErrorCode::UNTERMINATED_COMMENT,
                        "Unterminated block comment",
                        span,
                    );
                    return;
                }
                Some('*') if self.peek_at(1) == Some('/') => {
                    self.advance();
                    self.advance();
                    return;
                }
                Some(ch) => {
                    if is_line_terminator(ch) {
                        self.newline_pending = true;
                    }
                    self.advance();
                }
            }
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Normal-mode scanning
    // ─────────────────────────────────────────────────────────────

    /// Scan one token in code mode, skipping characters that cannot start one.
    fn scan_normal(&mut self) -> Token {
        loop {
            self.skip_trivia();

            if self.too_many_errors() {
                return Token::new(TokenKind::Eof, self.current_span());
            }

            if self.peek().is_none() {
                if self.mode_stack.len() > 1 {
                    self.emit_error(
                        ErrorCode::UNTERMINATED_STRING,
                        "Unterminated template literal",
                        self.current_span(),
                    );
                }
                return Token::new(TokenKind::Eof, self.current_span());
            }

            if let Some(token) = self.scan_token() {
                return token;
            }
        }
    }

    /// Scan the token starting at the current character.
    ///
    /// Returns `None` after reporting a character that cannot start a token;
    /// the character has been consumed.
    fn scan_token(&mut self) -> Option<Token> {
        let start_line = self.line;
        let start_col = self.col;
        let start_pos = self.pos;
        let ch = self.advance()?;

        let kind = match ch {
            '"' | '\'' => self.scan_string(ch, start_line, start_col),
            '`' => self.scan_template(),
            '0'..='9' => self.scan_number(ch, start_pos, start_line, start_col),
            '.' if matches!(self.peek(), Some('0'..='9')) => {
                self.scan_number(ch, start_pos, start_line, start_col)
            }
            '.' => {
                if self.peek() == Some('.') && self.peek_at(1) == Some('.') {
                    self.advance();
                    self.advance();
                    TokenKind::DotDotDot
                } else {
                    TokenKind::Dot
                }
            }
            c if is_ident_start(c) => self.scan_identifier(start_pos),

            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            ',' => TokenKind::Comma,
            ':' => TokenKind::Colon,
            ';' => TokenKind::Semicolon,

            '{' => {
                if let Some(Mode::Interpolation { brace_depth }) = self.mode_stack.last_mut() {
                    *brace_depth += 1;
                }
                TokenKind::LBrace
            }
            '}' => match self.current_mode() {
                Mode::Interpolation { brace_depth: 0 } => {
                    // Ends the substitution; template text follows.
                    self.pop_mode();
                    self.push_mode(Mode::Template);
                    TokenKind::InterpolationEnd
                }
                Mode::Interpolation { brace_depth } => {
                    self.pop_mode();
                    self.push_mode(Mode::Interpolation {
                        brace_depth: brace_depth - 1,
                    });
                    TokenKind::RBrace
                }
                _ => TokenKind::RBrace,
            },

            '=' => {
                if self.eat_char('=') {
                    operator(if self.eat_char('=') { "===" } else { "==" })
                } else if self.eat_char('>') {
                    operator("=>")
                } else {
                    TokenKind::Eq
                }
            }
            '!' => {
                if self.eat_char('=') {
                    operator(if self.eat_char('=') { "!==" } else { "!=" })
                } else {
                    TokenKind::Bang
                }
            }
            '+' => {
                if self.eat_char('+') {
                    operator("++")
                } else if self.eat_char('=') {
                    operator("+=")
                } else {
                    TokenKind::Plus
                }
            }
            '-' => {
                if self.eat_char('-') {
                    operator("--")
                } else if self.eat_char('=') {
                    operator("-=")
                } else {
                    TokenKind::Minus
                }
            }
            '*' => {
                if self.eat_char('*') {
                    operator(if self.eat_char('=') { "**=" } else { "**" })
                } else if self.eat_char('=') {
                    operator("*=")
                } else {
                    TokenKind::Star
                }
            }
            // Comments were consumed as trivia, so this is division.
            '/' => {
                if self.eat_char('=') {
                    operator("/=")
                } else {
                    TokenKind::Slash
                }
            }
            '%' => {
                if self.eat_char('=') {
                    operator("%=")
                } else {
                    TokenKind::Percent
                }
            }
            '<' | '>' | '&' | '|' | '^' | '~' | '?' => {
                let mut op = ch.to_string();
                while op.len() < 4
                    && matches!(self.peek(), Some('<' | '>' | '=' | '&' | '|' | '?'))
                {
                    if let Some(next) = self.advance() {
                        op.push(next);
                    }
                }
                TokenKind::Operator(op)
            }

            _ => {
                let span = self.span_from(start_line, start_col);
                self.emit_error(
                    ErrorCode::UNEXPECTED_TOKEN,
                    format!("Invalid or unexpected token '{ch}'"),
                    span,
                );
                return None;
            }
        };

        Some(Token::new(kind, self.span_from(start_line, start_col)))
    }

    // ─────────────────────────────────────────────────────────────
    // Number literals
    // ─────────────────────────────────────────────────────────────

    fn eat_digits(&mut self, radix: u32) {
        while matches!(self.peek(), Some(c) if c.is_digit(radix) || c == '_') {
            self.advance();
        }
    }

    /// Scan a number whose first character (`first`) is already consumed.
    fn scan_number(
        &mut self,
        first: char,
        start_pos: usize,
        start_line: u32,
        start_col: u32,
    ) -> TokenKind {
        let radix = match (first, self.peek()) {
            ('0', Some('x' | 'X')) => Some(16),
            ('0', Some('o' | 'O')) => Some(8),
            ('0', Some('b' | 'B')) => Some(2),
            _ => None,
        };

        let value = if let Some(radix) = radix {
            self.advance();
            let digits_start = self.pos;
            self.eat_digits(radix);
            let digits: String = self.source[digits_start..self.pos]
                .chars()
                .filter(|&c| c != '_')
                .collect();
            if digits.is_empty() {
                None
            } else {
                Some(digits.chars().fold(0.0, |acc, c| {
                    acc * f64::from(radix) + f64::from(c.to_digit(radix).unwrap_or(0))
                }))
            }
        } else {
            self.scan_decimal(first, start_pos)
        };

        let ident_follows =
            matches!(self.peek(), Some(c) if is_ident_start(c) || c.is_ascii_digit());
        if ident_follows {
            while matches!(self.peek(), Some(c) if is_ident_continue(c)) {
                self.advance();
            }
        }

        match value {
            Some(value) if !ident_follows => TokenKind::Number(value),
            _ => {
                let span = self.span_from(start_line, start_col);
                let text = self.source[start_pos..self.pos].to_string();
                self.emit_error(
                    ErrorCode::INVALID_NUMBER,
                    format!("Invalid number literal '{text}'"),
                    span,
                );
                TokenKind::Number(0.0)
            }
        }
    }

    fn scan_decimal(&mut self, first: char, start_pos: usize) -> Option<f64> {
        if first != '.' {
            self.eat_digits(10);
            let dot_continues = self.peek() == Some('.')
                && !matches!(self.peek_at(1), Some(c) if c == '.' || is_ident_start(c));
            if dot_continues {
                self.advance();
            }
        }
        self.eat_digits(10);

        if matches!(self.peek(), Some('e' | 'E')) {
            let exponent_digits = match self.peek_at(1) {
                Some('+' | '-') => matches!(self.peek_at(2), Some('0'..='9')),
                Some('0'..='9') => true,
                _ => false,
            };
            if exponent_digits {
                self.advance();
                if matches!(self.peek(), Some('+' | '-')) {
                    self.advance();
                }
                self.eat_digits(10);
            }
        }

        let text: String = self.source[start_pos..self.pos]
            .chars()
            .filter(|&c| c != '_')
            .collect();

        // Sloppy-mode legacy octal: `017` is 15.
        let legacy_octal = text.len() > 1
            && text.starts_with('0')
            && text.chars().all(|c| ('0'..='7').contains(&c));
        if legacy_octal {
            return Some(text.chars().fold(0.0, |acc, c| {
                acc * 8.0 + f64::from(c.to_digit(8).unwrap_or(0))
            }));
        }

        text.parse::<f64>().ok()
    }

    // ─────────────────────────────────────────────────────────────
    // Identifiers & keywords
    // ─────────────────────────────────────────────────────────────

    fn scan_identifier(&mut self, start_pos: usize) -> TokenKind {
        while matches!(self.peek(), Some(c) if is_ident_continue(c)) {
            self.advance();
        }
        let text = &self.source[start_pos..self.pos];
        TokenKind::from_word(text).unwrap_or_else(|| TokenKind::Identifier(text.to_string()))
    }

    // ─────────────────────────────────────────────────────────────
    // String literals
    // ─────────────────────────────────────────────────────────────

    /// Scan a quoted string after its opening `quote`.
    fn scan_string(&mut self, quote: char, start_line: u32, start_col: u32) -> TokenKind {
        let mut buf = String::new();
        loop {
            match self.peek() {
                None | Some('\n' | '\r') => {
                    let span = self.span_from(start_line, start_col);
                    self.emit_error(
                        ErrorCode::UNTERMINATED_STRING,
                        "Unterminated string literal",
                        span,
                    );
                    return TokenKind::String(buf);
                }
                Some(c) if c == quote => {
                    self.advance();
                    return TokenKind::String(buf);
                }
                Some('\\') => {
                    if let Some(escaped) = self.scan_escape_sequence() {
                        buf.push(escaped);
                    }
                }
                Some(c) => {
                    self.advance();
                    buf.push(c);
                }
            }
        }
    }

    /// Scan an escape sequence starting at the `\`.
    ///
    /// Returns `None` for line continuations, which produce no character.
    fn scan_escape_sequence(&mut self) -> Option<char> {
        let start_line = self.line;
        let start_col = self.col;
        self.advance(); // consume the '\'

        let Some(ch) = self.advance() else {
            let span = self.span_from(start_line, start_col);
            self.emit_error(
                ErrorCode::UNTERMINATED_STRING,
                "Unexpected end of input in escape sequence",
                span,
            );
            return None;
        };

        match ch {
            'n' => Some('\n'),
            't' => Some('\t'),
            'r' => Some('\r'),
            'b' => Some('\u{8}'),
            'f' => Some('\u{c}'),
            'v' => Some('\u{b}'),
            '0' if !matches!(self.peek(), Some('0'..='9')) => Some('\0'),
            '0'..='7' => {
                let mut value = ch.to_digit(8).unwrap_or(0);
                while let Some(digit) = self.peek().and_then(|c| c.to_digit(8)) {
                    if value * 8 + digit > 0xff {
                        break;
                    }
                    self.advance();
                    value = value * 8 + digit;
                }
                char::from_u32(value)
            }
            'x' => match self.read_hex_digits(2) {
                Some(value) => char::from_u32(value),
                None => {
                    let span = self.span_from(start_line, start_col);
                    self.emit_error(
                        ErrorCode::INVALID_ESCAPE,
                        "Invalid hexadecimal escape sequence",
                        span,
                    );
                    None
                }
            },
            'u' => self.scan_unicode_escape(start_line, start_col),
            '\r' => {
                self.eat_char('\n');
                None
            }
            '\n' | '\u{2028}' | '\u{2029}' => None,
            other => Some(other),
        }
    }

    /// Decode `\u` escapes (after the `u`), joining UTF-16 surrogate pairs.
    fn scan_unicode_escape(&mut self, start_line: u32, start_col: u32) -> Option<char> {
        let unit = if self.eat_char('{') {
            let mut value: u32 = 0;
            let mut digits = 0;
            while let Some(digit) = self.peek().and_then(|c| c.to_digit(16)) {
                self.advance();
                value = value.saturating_mul(16).saturating_add(digit);
                digits += 1;
            }
            if digits == 0 || !self.eat_char('}') || value > 0x10ffff {
                None
            } else {
                Some(value)
            }
        } else {
            self.read_hex_digits(4)
        };

        let Some(unit) = unit else {
            let span = self.span_from(start_line, start_col);
            self.emit_error(
                ErrorCode::INVALID_ESCAPE,
                "Invalid Unicode escape sequence",
                span,
            );
            return None;
        };

        match unit {
            0xd800..=0xdbff => {
                let low = self.peek_low_surrogate_escape();
                match low {
                    Some(low) => {
                        for _ in 0..6 {
                            self.advance();
                        }
                        char::from_u32(0x10000 + ((unit - 0xd800) << 10) + (low - 0xdc00))
                    }
                    None => Some(char::REPLACEMENT_CHARACTER),
                }
            }
            0xdc00..=0xdfff => Some(char::REPLACEMENT_CHARACTER),
            _ => char::from_u32(unit),
        }
    }

    /// Look ahead for `\uXXXX` encoding a low surrogate, without consuming it.
    fn peek_low_surrogate_escape(&self) -> Option<u32> {
        if self.peek() != Some('\\') || self.peek_at(1) != Some('u') {
            return None;
        }
        let mut value = 0;
        for offset in 2..6 {
            value = value * 16 + self.peek_at(offset)?.to_digit(16)?;
        }
        (0xdc00..=0xdfff).contains(&value).then_some(value)
    }

    fn read_hex_digits(&mut self, count: usize) -> Option<u32> {
        let mut value = 0;
        for _ in 0..count {
            let digit = self.peek().and_then(|c| c.to_digit(16))?;
            self.advance();
            value = value * 16 + digit;
        }
        Some(value)
    }

    // ─────────────────────────────────────────────────────────────
    // Template literals
    // ─────────────────────────────────────────────────────────────

    /// Scan a template literal after its opening backtick.
    fn scan_template(&mut self) -> TokenKind {
        let (text, stop) = self.scan_template_chunk();
        match stop {
            TemplateStop::Backtick => TokenKind::Template(text),
            TemplateStop::Substitution => {
                self.begin_substitution();
                TokenKind::TemplateStart(text)
            }
            TemplateStop::Eof => {
                self.report_unterminated_template();
                TokenKind::Template(text)
            }
        }
    }

    /// Continue template text after a substitution's closing `}`.
    fn scan_template_continuation(&mut self) -> Token {
        let start_line = self.line;
        let start_col = self.col;
        let (text, stop) = self.scan_template_chunk();
        self.pop_mode();
        let kind = match stop {
            TemplateStop::Backtick => TokenKind::TemplateEnd(text),
            TemplateStop::Substitution => {
                self.begin_substitution();
                TokenKind::TemplatePart(text)
            }
            TemplateStop::Eof => {
                self.report_unterminated_template();
                TokenKind::TemplateEnd(text)
            }
        };
        Token::new(kind, self.span_from(start_line, start_col))
    }

    fn begin_substitution(&mut self) {
        let span = Span::new(
            self.line,
            self.col.saturating_sub(2).max(1),
            self.line,
            self.col.saturating_sub(1).max(1),
        );
        self.push_mode(Mode::Interpolation { brace_depth: 0 });
        self.pending
            .push(Token::new(TokenKind::InterpolationStart, span));
    }

    fn report_unterminated_template(&mut self) {
        self.emit_error(
            ErrorCode::UNTERMINATED_STRING,
            "Unterminated template literal",
            self.current_span(),
        );
    }

    /// Read template text up to and including the next `` ` `` or `${`.
    fn scan_template_chunk(&mut self) -> (String, TemplateStop) {
        let mut buf = String::new();
        loop {
            match self.peek() {
                None => return (buf, TemplateStop::Eof),
                Some('`') => {
                    self.advance();
                    return (buf, TemplateStop::Backtick);
                }
                Some('$') if self.peek_at(1) == Some('{') => {
                    self.advance();
                    self.advance();
                    return (buf, TemplateStop::Substitution);
                }
                Some('\\') => {
                    if let Some(escaped) = self.scan_escape_sequence() {
                        buf.push(escaped);
                    }
                }
                Some('\r') => {
                    // Template text normalises CRLF and CR to LF.
                    self.advance();
                    self.eat_char('\n');
                    buf.push('\n');
                }
                Some(c) => {
                    self.advance();
                    buf.push(c);
                }
            }
        }
    }
}

fn operator(op: &str) -> TokenKind {
    TokenKind::Operator(op.to_string())
}

fn is_line_terminator(ch: char) -> bool {
    matches!(ch, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

fn is_ident_start(ch: char) -> bool {
    ch == '$' || ch == '_' || ch.is_alphabetic()
}

fn is_ident_continue(ch: char) -> bool {
    is_ident_start(ch) || ch.is_alphanumeric() || ch == '\u{200c}' || ch == '\u{200d}'
}
