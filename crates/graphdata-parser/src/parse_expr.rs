//! Expression parsing with operator precedence.
//!
//! Precedence (lowest → highest):
//! 5. `=` (right-associative)
//! 4. `+`, `-`
//! 3. `*`, `/`, `%`
//! 2. unary `-`, `+`, `!`
//! 1. `.` (member), `[]` (index), `()` (call), `new`

use graphdata_lexer::token::TokenKind;
use graphdata_types::ast::*;
use graphdata_types::{ErrorCode, Span};

use crate::parser::Parser;

impl<'src> Parser<'src> {
    // ══════════════════════════════════════════════════════════════════════════
    // Entry Point
    // ══════════════════════════════════════════════════════════════════════════

    /// Parse an expression (an assignment or anything of higher precedence).
    pub(crate) fn parse_expression(&mut self) -> Option<Expr> {
        let saved = self.depth;
        self.descend()?;
        let result = self.parse_assignment();
        self.depth = saved;
        result
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Precedence Chain
    // ══════════════════════════════════════════════════════════════════════════

    /// `Assign = AddExpr [ "=" Assign ]`
    fn parse_assignment(&mut self) -> Option<Expr> {
        let target = self.parse_add()?;
        if !self.check_exact(&TokenKind::Eq) {
            return Some(target);
        }
        if !is_assignable(&target) {
            self.error_at(
                ErrorCode::INVALID_ASSIGNMENT_TARGET,
                "Invalid left-hand side in assignment",
                target.span,
            );
            return None;
        }
        self.advance(); // eat `=`
        let value = self.parse_expression()?;
        let span = target.span.merge(value.span);
        Some(Expr::new(
            ExprKind::Assign {
                target: Box::new(target),
                value: Box::new(value),
            },
            span,
        ))
    }

    /// `AddExpr = MulExpr { ("+" | "-") MulExpr }`
    fn parse_add(&mut self) -> Option<Expr> {
        let first = self.parse_mul()?;
        let mut rest = Vec::new();
        loop {
            let op = match self.peek_kind() {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                _ => break,
            };
            self.advance();
            rest.push((op, self.parse_mul()?));
        }
        Some(binary(first, rest))
    }

    /// `MulExpr = UnaryExpr { ("*" | "/" | "%") UnaryExpr }`
    fn parse_mul(&mut self) -> Option<Expr> {
        let first = self.parse_unary()?;
        let mut rest = Vec::new();
        loop {
            let op = match self.peek_kind() {
                TokenKind::Star => BinOp::Mul,
                TokenKind::Slash => BinOp::Div,
                TokenKind::Percent => BinOp::Mod,
                _ => break,
            };
            self.advance();
            rest.push((op, self.parse_unary()?));
        }
        Some(binary(first, rest))
    }

    /// `UnaryExpr = ( "-" | "+" | "!" ) UnaryExpr | PostfixExpr`
    fn parse_unary(&mut self) -> Option<Expr> {
        let op = match self.peek_kind() {
            TokenKind::Minus => UnaryOp::Neg,
            TokenKind::Plus => UnaryOp::Plus,
            TokenKind::Bang => UnaryOp::Not,
            _ => return self.parse_postfix(),
        };
        let start = self.advance().span;
        let saved = self.depth;
        self.descend()?;
        let operand = self.parse_unary()?;
        self.depth = saved;
        let span = start.merge(operand.span);
        Some(Expr::new(
            ExprKind::Unary {
                op,
                operand: Box::new(operand),
            },
            span,
        ))
    }

    /// `PostfixExpr = ( NewExpr | PrimaryExpr ) { "." Name | "[" Expr "]" | "(" Args ")" }`
    fn parse_postfix(&mut self) -> Option<Expr> {
        let saved = self.depth;
        let mut expr = if self.check_exact(&TokenKind::New) {
            self.parse_new()?
        } else {
            self.parse_primary()?
        };
        loop {
            match self.peek_kind() {
                TokenKind::Dot | TokenKind::LBracket => {
                    self.descend()?;
                    expr = self.parse_member_suffix(expr)?;
                }
                TokenKind::LParen => {
                    self.descend()?;
                    let args = self.parse_arguments()?;
                    let span = expr.span.merge(self.previous_span());
                    expr = Expr::new(
                        ExprKind::Call {
                            callee: Box::new(expr),
                            args,
                        },
                        span,
                    );
                }
                _ => break,
            }
        }
        self.depth = saved;
        Some(expr)
    }

    /// Parse one `.name` or `[expr]` suffix onto `object`.
    fn parse_member_suffix(&mut self, object: Expr) -> Option<Expr> {
        if self.eat(&TokenKind::Dot) {
            let property = self.expect_property_name()?;
            let span = object.span.merge(property.span);
            return Some(Expr::new(
                ExprKind::Member {
                    object: Box::new(object),
                    property,
                },
                span,
            ));
        }
        self.expect(&TokenKind::LBracket)?;
        let index = self.parse_expression()?;
        self.expect(&TokenKind::RBracket)?;
        let span = object.span.merge(self.previous_span());
        Some(Expr::new(
            ExprKind::Index {
                object: Box::new(object),
                index: Box::new(index),
            },
            span,
        ))
    }

    /// `NewExpr = "new" ( NewExpr | PrimaryExpr { "." Name | "[" Expr "]" } ) [ "(" Args ")" ]`
    fn parse_new(&mut self) -> Option<Expr> {
        let start = self.advance().span; // eat `new`
        let saved = self.depth;
        self.descend()?;
        let mut callee = if self.check_exact(&TokenKind::New) {
            self.parse_new()?
        } else {
            self.parse_primary()?
        };
        while matches!(self.peek_kind(), TokenKind::Dot | TokenKind::LBracket) {
            self.descend()?;
            callee = self.parse_member_suffix(callee)?;
        }
        let args = if self.check_exact(&TokenKind::LParen) {
            self.parse_arguments()?
        } else {
            Vec::new()
        };
        self.depth = saved;
        let span = start.merge(self.previous_span());
        Some(Expr::new(
            ExprKind::New {
                callee: Box::new(callee),
                args,
            },
            span,
        ))
    }

    /// `"(" [ Expr { "," Expr } [ "," ] ] ")"`
    fn parse_arguments(&mut self) -> Option<Vec<Expr>> {
        self.expect(&TokenKind::LParen)?;
        let mut args = Vec::new();
        while !self.check_exact(&TokenKind::RParen) {
            if self.check_exact(&TokenKind::DotDotDot) {
                self.error_at_current(
                    ErrorCode::UNSUPPORTED_SYNTAX,
                    "spread arguments are not supported in data scripts",
                );
                return None;
            }
            args.push(self.parse_expression()?);
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RParen)?;
        Some(args)
    }

    // ══════════════════════════════════════════════════════════════════════════
    // Primary Expressions
    // ══════════════════════════════════════════════════════════════════════════

    /// Parse a primary expression.
    fn parse_primary(&mut self) -> Option<Expr> {
        let start = self.current_span();
        match self.peek_kind().clone() {
            // ── Literals ────────────────────────────────────────────────
            TokenKind::Number(n) => {
                self.advance();
                Some(Expr::new(ExprKind::NumberLit(n), start))
            }
            TokenKind::String(s) | TokenKind::Template(s) => {
                self.advance();
                Some(Expr::new(ExprKind::StringLit(s), start))
            }
            TokenKind::TemplateStart(s) => {
                self.advance();
                self.parse_template(s, start)
            }
            TokenKind::True => {
                self.advance();
                Some(Expr::new(ExprKind::BoolLit(true), start))
            }
            TokenKind::False => {
                self.advance();
                Some(Expr::new(ExprKind::BoolLit(false), start))
            }
            TokenKind::Null => {
                self.advance();
                Some(Expr::new(ExprKind::NullLit, start))
            }

            // ── References ──────────────────────────────────────────────
            TokenKind::Identifier(name) => {
                self.advance();
                Some(Expr::new(ExprKind::Identifier(name), start))
            }
            TokenKind::This => {
                self.advance();
                Some(Expr::new(ExprKind::This, start))
            }

            // ── Collections ─────────────────────────────────────────────
            TokenKind::LBracket => self.parse_array_literal(),
            TokenKind::LBrace => self.parse_object_literal(),

            // ── Grouping ────────────────────────────────────────────────
            TokenKind::LParen => {
                self.advance(); // eat `(`
                let inner = self.parse_expression()?;
                self.expect(&TokenKind::RParen)?;
                let span = start.merge(self.previous_span());
                Some(Expr::new(ExprKind::Paren(Box::new(inner)), span))
            }

            // ── Outside the dialect ─────────────────────────────────────
            TokenKind::Reserved(word) => {
                self.error_at_current(
                    ErrorCode::UNSUPPORTED_SYNTAX,
                    format!("'{word}' is not supported in data scripts"),
                );
                None
            }
            TokenKind::Operator(op) => {
                self.error_at_current(
                    ErrorCode::UNSUPPORTED_SYNTAX,
                    format!("operator '{op}' is not supported in data scripts"),
                );
                None
            }
            TokenKind::Slash => {
                self.error_at_current(
                    ErrorCode::UNSUPPORTED_SYNTAX,
                    "regular expression literals are not supported in data scripts",
                );
                None
            }
            TokenKind::Eof => {
                self.error_at_current(ErrorCode::UNEXPECTED_TOKEN, "Unexpected end of input");
                None
            }
            other => {
                self.error_at_current(
                    ErrorCode::UNEXPECTED_TOKEN,
                    format!("expected expression, got '{other}'"),
                );
                None
            }
        }
    }

    /// Parse the rest of a template after its `TemplateStart` text.
    fn parse_template(&mut self, head: String, start: Span) -> Option<Expr> {
        let mut parts = Vec::new();
        if !head.is_empty() {
            parts.push(TemplatePart::Literal(head));
        }
        loop {
            self.expect(&TokenKind::InterpolationStart)?;
            parts.push(TemplatePart::Expr(self.parse_expression()?));
            self.expect(&TokenKind::InterpolationEnd)?;
            match self.peek_kind().clone() {
                TokenKind::TemplatePart(text) => {
                    self.advance();
                    if !text.is_empty() {
                        parts.push(TemplatePart::Literal(text));
                    }
                }
                TokenKind::TemplateEnd(text) => {
                    self.advance();
                    if !text.is_empty() {
                        parts.push(TemplatePart::Literal(text));
                    }
                    break;
                }
                other => {
                    self.error_at_current(
                        ErrorCode::UNEXPECTED_TOKEN,
                        format!("expected template text, got '{other}'"),
                    );
                    return None;
                }
            }
        }
        let span = start.merge(self.previous_span());
        Some(Expr::new(ExprKind::Template(parts), span))
    }

    /// `"[" { Element | "," } "]"` where a bare `,` leaves a hole.
    fn parse_array_literal(&mut self) -> Option<Expr> {
        let start = self.current_span();
        self.advance(); // eat `[`
        let mut elements = Vec::new();
        loop {
            if self.eat(&TokenKind::RBracket) {
                break;
            }
            if self.check_exact(&TokenKind::Comma) {
                let span = self.advance().span;
                elements.push(ArrayElement::Hole(span));
                continue;
            }
            let element = if self.eat(&TokenKind::DotDotDot) {
                ArrayElement::Spread(self.parse_expression()?)
            } else {
                ArrayElement::Expr(self.parse_expression()?)
            };
            elements.push(element);
            if !self.check_exact(&TokenKind::RBracket) {
                self.expect(&TokenKind::Comma)?;
            }
        }
        let span = start.merge(self.previous_span());
        Some(Expr::new(ExprKind::ArrayLit(elements), span))
    }

    /// `"{" [ Entry { "," Entry } [ "," ] ] "}"`
    fn parse_object_literal(&mut self) -> Option<Expr> {
        let start = self.current_span();
        self.advance(); // eat `{`
        let mut entries = Vec::new();
        while !self.check_exact(&TokenKind::RBrace) {
            entries.push(self.parse_object_entry()?);
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::RBrace)?;
        let span = start.merge(self.previous_span());
        Some(Expr::new(ExprKind::ObjectLit(entries), span))
    }

    fn parse_object_entry(&mut self) -> Option<ObjectEntry> {
        if self.eat(&TokenKind::DotDotDot) {
            return Some(ObjectEntry::Spread(self.parse_expression()?));
        }

        let key_token = self.advance();
        // Identifier keys may stand alone: `{ a }` means `{ a: a }`.
        let mut shorthand = None;
        let key = match &key_token.kind {
            TokenKind::String(s) => PropertyKey::Named(s.clone()),
            TokenKind::Number(n) => PropertyKey::Number(*n),
            TokenKind::LBracket => {
                let expr = self.parse_expression()?;
                self.expect(&TokenKind::RBracket)?;
                PropertyKey::Computed(Box::new(expr))
            }
            TokenKind::Identifier(name) => {
                shorthand = Some(name.clone());
                PropertyKey::Named(name.clone())
            }
            kind => match kind.word() {
                Some(word) => PropertyKey::Named(word.to_string()),
                None => {
                    self.error_at(
                        ErrorCode::UNEXPECTED_TOKEN,
                        format!("expected property name, got '{kind}'"),
                        key_token.span,
                    );
                    return None;
                }
            },
        };

        if self.eat(&TokenKind::Colon) {
            let value = self.parse_expression()?;
            return Some(ObjectEntry::Property { key, value });
        }

        match self.peek_kind().clone() {
            TokenKind::Comma | TokenKind::RBrace if shorthand.is_some() => {
                let name = shorthand.unwrap_or_default();
                let value = Expr::new(ExprKind::Identifier(name), key_token.span);
                Some(ObjectEntry::Property { key, value })
            }
            TokenKind::LParen | TokenKind::Identifier(_) => {
                self.error_at_current(
                    ErrorCode::UNSUPPORTED_SYNTAX,
                    "methods and accessors are not supported in data scripts",
                );
                None
            }
            other => {
                self.error_at_current(
                    ErrorCode::UNEXPECTED_TOKEN,
                    format!("expected ':', got '{other}'"),
                );
                None
            }
        }
    }
}

/// `first` alone, or a flat operator chain when `rest` is non-empty.
fn binary(first: Expr, rest: Vec<(BinOp, Expr)>) -> Expr {
    let Some((_, last)) = rest.last() else {
        return first;
    };
    let span = first.span.merge(last.span);
    Expr::new(
        ExprKind::Binary {
            first: Box::new(first),
            rest,
        },
        span,
    )
}

/// Only references and property accesses can be assigned to.
fn is_assignable(expr: &Expr) -> bool {
    matches!(
        expr.kind,
        ExprKind::Identifier(_) | ExprKind::Member { .. } | ExprKind::Index { .. }
    )
}
