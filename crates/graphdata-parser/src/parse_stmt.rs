//! Statement parsing.

use crate::parser::Parser;
use graphdata_lexer::token::TokenKind;
use graphdata_types::ast::*;
use graphdata_types::ErrorCode;

impl<'src> Parser<'src> {
    /// Parse a single top-level statement.
    pub(crate) fn parse_statement(&mut self) -> Option<Stmt> {
        self.depth = 0;
        match self.peek_kind() {
            TokenKind::Semicolon => {
                let span = self.advance().span;
                Some(Stmt::Empty(span))
            }
            TokenKind::Var => self.parse_var_decl(DeclKind::Var).map(Stmt::VarDecl),
            TokenKind::Let => self.parse_var_decl(DeclKind::Let).map(Stmt::VarDecl),
            TokenKind::Const => self.parse_var_decl(DeclKind::Const).map(Stmt::VarDecl),
            TokenKind::LBrace => {
                self.error_at_current(
                    ErrorCode::UNSUPPORTED_SYNTAX,
                    "block statements are not supported in data scripts",
                );
                None
            }
            _ => {
                let start = self.current_span();
                let expr = self.parse_expression()?;
                self.expect_terminator();
                let span = start.merge(self.previous_span());
                Some(Stmt::Expr(ExprStmt { expr, span }))
            }
        }
    }

    /// `var a = 1, b;` / `let a = 1;` / `const a = 1;`
    fn parse_var_decl(&mut self, kind: DeclKind) -> Option<VarDecl> {
        let start = self.current_span();
        self.advance(); // eat the keyword
        let mut declarators = Vec::new();
        loop {
            let name = self.expect_identifier()?;
            self.check_redeclaration(kind, &name);
            let init = if self.eat(&TokenKind::Eq) {
                Some(self.parse_expression()?)
            } else {
                if kind == DeclKind::Const {
                    self.error_with_suggestion(
                        ErrorCode::MISSING_INITIALIZER,
                        "Missing initializer in const declaration",
                        name.span,
                        format!("write `const {} = <value>` or use `let`", name.name),
                    );
                }
                None
            };
            let span = name.span.merge(self.previous_span());
            declarators.push(Declarator { name, init, span });
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        self.expect_terminator();
        let span = start.merge(self.previous_span());
        Some(VarDecl {
            kind,
            declarators,
            span,
        })
    }

    /// Lexical declarations may not share a name with any other top-level
    /// declaration; `var` may repeat only other `var`s.
    fn check_redeclaration(&mut self, kind: DeclKind, name: &Ident) {
        let conflict = match self.declared.get(&name.name) {
            None => false,
            Some(DeclKind::Var) => kind != DeclKind::Var,
            Some(DeclKind::Let | DeclKind::Const) => true,
        };
        if conflict {
            self.error_at(
                ErrorCode::DUPLICATE_DECLARATION,
                format!("Identifier '{}' has already been declared", name.name),
                name.span,
            );
        } else {
            self.declared.entry(name.name.clone()).or_insert(kind);
        }
    }
}
