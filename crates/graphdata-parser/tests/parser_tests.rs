//! Parser tests.
//!
//! Covers: declarations, assignment targets, precedence, member access,
//! `new` expressions, literals (arrays with holes, objects with every key
//! form, templates), statement termination, unsupported syntax, nesting
//! limits, error recovery, and determinism.

use graphdata_lexer::Lexer;
use graphdata_parser::{ParseResult, Parser};
use graphdata_types::ast::*;
use graphdata_types::{ErrorCode, SourceFile, MAX_NESTING_DEPTH};

// ─────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────

/// Parse source and return the result (script + errors).
fn parse(source: &str) -> ParseResult {
    let sf = SourceFile::new("test.js", source);
    let lex = Lexer::new(&sf).lex();
    assert!(!lex.errors.has_errors(), "lex errors: {}", lex.errors);
    Parser::new(lex.tokens, &sf).parse()
}

/// Parse source and return the script, panicking if there are errors.
fn parse_ok(source: &str) -> Script {
    let result = parse(source);
    if result.errors.has_errors() {
        for e in &result.errors.errors {
            eprintln!("  ERROR: {} ({})", e.message, e.code);
        }
        panic!("unexpected parse errors (see above)");
    }
    result.script.expect("no script returned")
}

/// Parse source and return the error codes.
fn error_codes(source: &str) -> Vec<ErrorCode> {
    parse(source).errors.errors.iter().map(|e| e.code).collect()
}

/// Parse a single expression statement and return its expression.
fn expr(source: &str) -> Expr {
    let script = parse_ok(source);
    assert_eq!(script.body.len(), 1, "expected one statement in {source:?}");
    match script.body.into_iter().next() {
        Some(Stmt::Expr(stmt)) => stmt.expr,
        other => panic!("expected expression statement, got {other:?}"),
    }
}

/// The right-hand side of `graphData = <source>`.
fn value(source: &str) -> Expr {
    match expr(&format!("graphData = {source}")).kind {
        ExprKind::Assign { value, .. } => *value,
        other => panic!("expected assignment, got {other:?}"),
    }
}

fn is_ident(expr: &Expr, name: &str) -> bool {
    matches!(&expr.kind, ExprKind::Identifier(n) if n == name)
}

fn number(expr: &Expr) -> f64 {
    match expr.kind {
        ExprKind::NumberLit(n) => n,
        ref other => panic!("expected number, got {other:?}"),
    }
}

// ─────────────────────────────────────────────────────────────────────
// Declarations
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_var_declaration() {
    let script = parse_ok("var graphData = [1, 2];");
    let Stmt::VarDecl(decl) = &script.body[0] else {
        panic!("expected declaration");
    };
    assert_eq!(decl.kind, DeclKind::Var);
    assert_eq!(decl.declarators.len(), 1);
    assert_eq!(decl.declarators[0].name.name, "graphData");
    assert!(decl.declarators[0].init.is_some());
}

#[test]
fn test_multiple_declarators() {
    let script = parse_ok("var a = 1, b, c = a;");
    let Stmt::VarDecl(decl) = &script.body[0] else {
        panic!("expected declaration");
    };
    let names: Vec<_> = decl.declarators.iter().map(|d| d.name.name.as_str()).collect();
    assert_eq!(names, vec!["a", "b", "c"]);
    assert!(decl.declarators[1].init.is_none());
    assert!(is_ident(decl.declarators[2].init.as_ref().unwrap(), "a"));
}

#[test]
fn test_let_and_const_declarations() {
    let script = parse_ok("let a = 1\nconst b = 2");
    let kinds: Vec<_> = script
        .body
        .iter()
        .map(|s| match s {
            Stmt::VarDecl(d) => d.kind,
            other => panic!("expected declaration, got {other:?}"),
        })
        .collect();
    assert_eq!(kinds, vec![DeclKind::Let, DeclKind::Const]);
}

#[test]
fn test_const_without_initializer() {
    let result = parse("const a;");
    assert_eq!(result.errors.errors[0].code, ErrorCode::MISSING_INITIALIZER);
    assert!(result.errors.errors[0].suggestion.is_some());
    assert!(result.script.is_none());
}

#[test]
fn test_redeclaration_rules() {
    assert!(error_codes("var a = 1; var a = 2;").is_empty());
    assert_eq!(error_codes("let a; let a;"), vec![ErrorCode::DUPLICATE_DECLARATION]);
    assert_eq!(error_codes("var a; const a = 1;"), vec![ErrorCode::DUPLICATE_DECLARATION]);
    assert_eq!(error_codes("const a = 1; var a;"), vec![ErrorCode::DUPLICATE_DECLARATION]);
}

#[test]
fn test_keyword_as_binding_name_is_error() {
    assert_eq!(error_codes("var new = 1;"), vec![ErrorCode::UNEXPECTED_TOKEN]);
}

// ─────────────────────────────────────────────────────────────────────
// Assignments
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_assignment_to_identifier() {
    let e = expr("graphData = 1;");
    let ExprKind::Assign { target, value } = e.kind else {
        panic!("expected assignment");
    };
    assert!(is_ident(&target, "graphData"));
    assert_eq!(number(&value), 1.0);
}

#[test]
fn test_assignment_is_right_associative() {
    let e = expr("a = b = 3");
    let ExprKind::Assign { target, value } = e.kind else {
        panic!("expected assignment");
    };
    assert!(is_ident(&target, "a"));
    assert!(matches!(value.kind, ExprKind::Assign { .. }));
}

#[test]
fn test_assignment_to_member_chain() {
    let e = expr("data.rows[0].label = 'x'");
    let ExprKind::Assign { target, .. } = e.kind else {
        panic!("expected assignment");
    };
    let ExprKind::Member { object, property } = target.kind else {
        panic!("expected member target");
    };
    assert_eq!(property.name, "label");
    assert!(matches!(object.kind, ExprKind::Index { .. }));
}

#[test]
fn test_assignment_through_this() {
    let e = expr("this.graphData = {}");
    let ExprKind::Assign { target, .. } = e.kind else {
        panic!("expected assignment");
    };
    let ExprKind::Member { object, property } = target.kind else {
        panic!("expected member target");
    };
    assert_eq!(object.kind, ExprKind::This);
    assert_eq!(property.name, "graphData");
}

#[test]
fn test_invalid_assignment_targets() {
    assert_eq!(error_codes("1 = 2"), vec![ErrorCode::INVALID_ASSIGNMENT_TARGET]);
    assert_eq!(error_codes("a + b = 2"), vec![ErrorCode::INVALID_ASSIGNMENT_TARGET]);
    assert_eq!(error_codes("(a) = 2"), vec![ErrorCode::INVALID_ASSIGNMENT_TARGET]);
}

// ─────────────────────────────────────────────────────────────────────
// Operators
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_multiplication_binds_tighter_than_addition() {
    let e = value("1 + 2 * 3");
    let ExprKind::Binary { first, rest } = e.kind else {
        panic!("expected binary");
    };
    assert_eq!(number(&first), 1.0);
    assert_eq!(rest.len(), 1);
    assert_eq!(rest[0].0, BinOp::Add);
    let ExprKind::Binary { rest: product, .. } = &rest[0].1.kind else {
        panic!("expected binary");
    };
    assert_eq!(product[0].0, BinOp::Mul);
}

#[test]
fn test_subtraction_is_left_associative() {
    let e = value("10 - 4 - 3");
    let ExprKind::Binary { first, rest } = e.kind else {
        panic!("expected binary");
    };
    assert_eq!(number(&first), 10.0);
    let ops: Vec<BinOp> = rest.iter().map(|(op, _)| *op).collect();
    assert_eq!(ops, vec![BinOp::Sub, BinOp::Sub]);
    assert_eq!(number(&rest[0].1), 4.0);
    assert_eq!(number(&rest[1].1), 3.0);
}

#[test]
fn test_unary_operators() {
    let e = value("-+!x");
    let ExprKind::Unary { op, operand } = e.kind else {
        panic!("expected unary");
    };
    assert_eq!(op, UnaryOp::Neg);
    let ExprKind::Unary { op, operand } = operand.kind else {
        panic!("expected unary");
    };
    assert_eq!(op, UnaryOp::Plus);
    assert!(matches!(operand.kind, ExprKind::Unary { op: UnaryOp::Not, .. }));
}

#[test]
fn test_member_access_binds_tighter_than_unary() {
    // `-a.b` negates the member, not `a`.
    let e = value("-a.b");
    let ExprKind::Unary { operand, .. } = e.kind else {
        panic!("expected unary");
    };
    assert!(matches!(operand.kind, ExprKind::Member { .. }));
}

#[test]
fn test_parentheses_group() {
    let e = value("(1 + 2) * 3");
    let ExprKind::Binary { first, rest } = e.kind else {
        panic!("expected binary");
    };
    assert_eq!(rest[0].0, BinOp::Mul);
    assert!(matches!(first.kind, ExprKind::Paren(_)));
}

// ─────────────────────────────────────────────────────────────────────
// Member access, calls, new
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_keyword_property_names() {
    let e = value("row.default.new");
    let ExprKind::Member { object, property } = e.kind else {
        panic!("expected member");
    };
    assert_eq!(property.name, "new");
    let ExprKind::Member { property, .. } = object.kind else {
        panic!("expected member");
    };
    assert_eq!(property.name, "default");
}

#[test]
fn test_new_date_with_arguments() {
    let e = value("new Date(2004, 7, 1)");
    let ExprKind::New { callee, args } = e.kind else {
        panic!("expected new");
    };
    assert!(is_ident(&callee, "Date"));
    let nums: Vec<f64> = args.iter().map(number).collect();
    assert_eq!(nums, vec![2004.0, 7.0, 1.0]);
}

#[test]
fn test_new_without_arguments() {
    let e = value("new Date");
    let ExprKind::New { args, .. } = e.kind else {
        panic!("expected new");
    };
    assert!(args.is_empty());
}

#[test]
fn test_member_access_after_new() {
    let e = value("new Date(0).x");
    let ExprKind::Member { object, .. } = e.kind else {
        panic!("expected member");
    };
    assert!(matches!(object.kind, ExprKind::New { .. }));
}

#[test]
fn test_date_utc_call() {
    let e = value("Date.UTC(2020, 0, 1,)");
    let ExprKind::Call { callee, args } = e.kind else {
        panic!("expected call");
    };
    assert!(matches!(callee.kind, ExprKind::Member { .. }));
    assert_eq!(args.len(), 3);
}

#[test]
fn test_call_continues_across_line_break() {
    // No semicolon is inserted before `(`.
    let script = parse_ok("graphData = f\n(1)");
    assert_eq!(script.body.len(), 1);
}

// ─────────────────────────────────────────────────────────────────────
// Literals
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_array_literal_with_holes_and_spread() {
    let e = value("[1, , ...rest, 2,]");
    let ExprKind::ArrayLit(elements) = e.kind else {
        panic!("expected array");
    };
    assert_eq!(elements.len(), 4);
    assert!(matches!(elements[0], ArrayElement::Expr(_)));
    assert!(matches!(elements[1], ArrayElement::Hole(_)));
    assert!(matches!(elements[2], ArrayElement::Spread(_)));
    assert!(matches!(elements[3], ArrayElement::Expr(_)));
}

#[test]
fn test_empty_and_elided_arrays() {
    assert!(matches!(value("[]").kind, ExprKind::ArrayLit(ref v) if v.is_empty()));
    assert!(matches!(value("[,]").kind, ExprKind::ArrayLit(ref v) if v.len() == 1));
    assert!(matches!(value("[,,]").kind, ExprKind::ArrayLit(ref v) if v.len() == 2));
}

#[test]
fn test_object_literal_key_forms() {
    let e = value("{ a: 1, 'b c': 2, 3: 4, [k]: 5, default: 6, short, ...more }");
    let ExprKind::ObjectLit(entries) = e.kind else {
        panic!("expected object");
    };
    assert_eq!(entries.len(), 7);
    let keys: Vec<String> = entries
        .iter()
        .map(|entry| match entry {
            ObjectEntry::Property { key: PropertyKey::Named(n), .. } => n.clone(),
            ObjectEntry::Property { key: PropertyKey::Number(n), .. } => format!("#{n}"),
            ObjectEntry::Property { key: PropertyKey::Computed(_), .. } => "[]".into(),
            ObjectEntry::Spread(_) => "...".into(),
        })
        .collect();
    assert_eq!(keys, vec!["a", "b c", "#3", "[]", "default", "short", "..."]);

    let ObjectEntry::Property { value, .. } = &entries[5] else {
        panic!("expected shorthand property");
    };
    assert!(is_ident(value, "short"));
}

#[test]
fn test_object_literal_trailing_comma() {
    let e = value("{ a: 1, }");
    assert!(matches!(e.kind, ExprKind::ObjectLit(ref v) if v.len() == 1));
}

#[test]
fn test_object_method_is_unsupported() {
    assert_eq!(error_codes("x = { f() {} }")[0], ErrorCode::UNSUPPORTED_SYNTAX);
    assert_eq!(error_codes("x = { get a() {} }")[0], ErrorCode::UNSUPPORTED_SYNTAX);
}

#[test]
fn test_keyword_shorthand_is_error() {
    assert_eq!(error_codes("x = { true }"), vec![ErrorCode::UNEXPECTED_TOKEN]);
}

#[test]
fn test_template_literal_parts() {
    let e = value("`a${x}b${y + 1}`");
    let ExprKind::Template(parts) = e.kind else {
        panic!("expected template");
    };
    assert_eq!(parts.len(), 4);
    assert_eq!(parts[0], TemplatePart::Literal("a".into()));
    assert!(matches!(&parts[1], TemplatePart::Expr(e) if is_ident(e, "x")));
    assert_eq!(parts[2], TemplatePart::Literal("b".into()));
    assert!(matches!(&parts[3], TemplatePart::Expr(_)));
}

#[test]
fn test_plain_template_is_string() {
    assert_eq!(value("`text`").kind, ExprKind::StringLit("text".into()));
}

#[test]
fn test_literal_keywords() {
    assert_eq!(value("true").kind, ExprKind::BoolLit(true));
    assert_eq!(value("false").kind, ExprKind::BoolLit(false));
    assert_eq!(value("null").kind, ExprKind::NullLit);
    assert!(is_ident(&value("undefined"), "undefined"));
}

// ─────────────────────────────────────────────────────────────────────
// Statement termination
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_line_breaks_terminate_statements() {
    let script = parse_ok("var a = 1\nvar b = 2\ngraphData = [a, b]");
    assert_eq!(script.body.len(), 3);
}

#[test]
fn test_empty_statements() {
    let script = parse_ok(";;graphData = 1;;");
    assert_eq!(script.body.len(), 4);
    assert!(matches!(script.body[0], Stmt::Empty(_)));
}

#[test]
fn test_missing_semicolon_on_same_line() {
    assert_eq!(error_codes("a = 1 b = 2"), vec![ErrorCode::MISSING_SEMICOLON]);
}

#[test]
fn test_multiline_literal_statement() {
    let script = parse_ok("graphData = [\n  ['Date', 'Python'],\n  [1, 2]\n];\n");
    assert_eq!(script.body.len(), 1);
}

#[test]
fn test_empty_script() {
    assert!(parse_ok("").body.is_empty());
    assert!(parse_ok("// nothing here\n").body.is_empty());
}

// ─────────────────────────────────────────────────────────────────────
// Unsupported syntax
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_functions_are_unsupported() {
    assert_eq!(error_codes("function f() {}")[0], ErrorCode::UNSUPPORTED_SYNTAX);
}

#[test]
fn test_unsupported_operators() {
    assert_eq!(error_codes("x = a === b"), vec![ErrorCode::UNSUPPORTED_SYNTAX]);
    assert_eq!(error_codes("x = a, b"), vec![ErrorCode::UNSUPPORTED_SYNTAX]);
    assert_eq!(error_codes("x = typeof a"), vec![ErrorCode::UNSUPPORTED_SYNTAX]);
}

#[test]
fn test_regex_literal_is_unsupported() {
    assert_eq!(error_codes("x = /ab+c/"), vec![ErrorCode::UNSUPPORTED_SYNTAX]);
}

#[test]
fn test_block_statement_is_unsupported() {
    assert_eq!(error_codes("{ a = 1 }")[0], ErrorCode::UNSUPPORTED_SYNTAX);
}

#[test]
fn test_unexpected_end_of_input() {
    let result = parse("graphData = [1, 2");
    assert_eq!(result.errors.total_errors, 1);
    assert_eq!(result.errors.errors[0].code, ErrorCode::UNEXPECTED_TOKEN);
}

// ─────────────────────────────────────────────────────────────────────
// Nesting limit
// ─────────────────────────────────────────────────────────────────────

/// Deep recursion needs more stack than the default test thread has in
/// debug builds.
fn on_big_stack<T: Send + 'static>(f: impl FnOnce() -> T + Send + 'static) -> T {
    std::thread::Builder::new()
        .stack_size(64 * 1024 * 1024)
        .spawn(f)
        .unwrap()
        .join()
        .unwrap()
}

#[test]
fn test_nesting_within_limit() {
    on_big_stack(|| {
        let depth = (MAX_NESTING_DEPTH / 2) as usize;
        let source = format!("x = {}1{}", "[".repeat(depth), "]".repeat(depth));
        assert!(parse(&source).script.is_some());
    });
}

#[test]
fn test_nesting_limit_exceeded_by_arrays() {
    on_big_stack(|| {
        let depth = MAX_NESTING_DEPTH as usize * 2;
        let source = format!("x = {}1{}", "[".repeat(depth), "]".repeat(depth));
        let result = parse(&source);
        assert_eq!(result.errors.errors[0].code, ErrorCode::NESTING_LIMIT_EXCEEDED);
        assert_eq!(result.errors.total_errors, 1);
    });
}

#[test]
fn test_long_operator_chain_is_flat() {
    let source = format!("'ab'{}", " + 'ab'".repeat(499));
    let e = value(&source);
    let ExprKind::Binary { rest, .. } = e.kind else {
        panic!("expected binary");
    };
    assert_eq!(rest.len(), 499);
    assert!(rest.iter().all(|(op, _)| *op == BinOp::Add));
}

#[test]
fn test_mixed_precedence_chain_within_limit() {
    let source = format!("x = 1{}", " * 2 + 3 / 4 - 5 % 6".repeat(2_000));
    assert_eq!(parse_ok(&source).body.len(), 1);
}

#[test]
fn test_nesting_limit_exceeded_by_parenthesized_chain() {
    on_big_stack(|| {
        let depth = MAX_NESTING_DEPTH as usize * 2;
        let source = format!("x = {}1{}", "(1 + ".repeat(depth), ")".repeat(depth));
        let result = parse(&source);
        assert_eq!(result.errors.errors[0].code, ErrorCode::NESTING_LIMIT_EXCEEDED);
    });
}

#[test]
fn test_nesting_limit_resets_between_statements() {
    on_big_stack(|| {
        let line = format!("x = 1{}\n", " + 1".repeat(MAX_NESTING_DEPTH as usize / 2));
        let source = line.repeat(10);
        assert_eq!(parse_ok(&source).body.len(), 10);
    });
}

// ─────────────────────────────────────────────────────────────────────
// Error recovery
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_recovery_reports_errors_on_separate_lines() {
    let result = parse("a = ]\nb = 1\nc = )\n");
    assert_eq!(result.errors.total_errors, 2);
    assert_eq!(result.errors.errors[0].span.start_line, 1);
    assert_eq!(result.errors.errors[1].span.start_line, 3);
    assert!(result.script.is_none());
}

#[test]
fn test_error_carries_source_line() {
    let result = parse("var ok = 1;\ngraphData = [1 2];");
    let err = &result.errors.errors[0];
    assert_eq!(err.source_line, "graphData = [1 2];");
    assert_eq!(err.file, "test.js");
    assert_eq!(err.span.start_line, 2);
}

#[test]
fn test_error_cap() {
    let source = "a = ]\n".repeat(50);
    let result = parse(&source);
    assert_eq!(result.errors.total_errors, graphdata_types::MAX_ERRORS);
}

// ─────────────────────────────────────────────────────────────────────
// Determinism
// ─────────────────────────────────────────────────────────────────────

#[test]
fn test_parser_determinism_100_iterations() {
    let source = concat!(
        "var rows = [['Date', 'Python'], [new Date(2004,7,1), 0.2817]];\n",
        "graphData = { rows, count: rows.length };"
    );
    let first = parse_ok(source);
    for i in 0..100 {
        assert_eq!(first, parse_ok(source), "Determinism failure at iteration {i}");
    }
}
