//! Tree-walking evaluator for data scripts.

use graphdata_types::ast::*;
use graphdata_types::{ErrorCode, ScriptError, SourceFile, Span};

use crate::date::{self, DateValue};
use crate::env::{AssignError, BindingKind, Environment, LookupError};
use crate::error::{EvalError, EvalResult};
use crate::number::{format_number, string_to_number};
use crate::object::ObjectMap;
use crate::value::{Builtin, ConversionError, PropertyError, Value};
use crate::MAX_VALUE_DEPTH;

/// The object a property is read from or written to.
enum Base {
    /// `this` or `globalThis`: the key names a global property.
    Global,
    Value(Value),
}

/// Walks a script's AST, executing it against a fresh [`Environment`].
pub struct Evaluator<'src> {
    source_file: &'src SourceFile,
    /// The script's global bindings.
    pub env: Environment,
    /// Gas consumed so far.
    pub gas: u64,
    /// Gas limit.
    pub gas_limit: u64,
}

impl<'src> Evaluator<'src> {
    pub fn new(source_file: &'src SourceFile, gas_limit: u64) -> Self {
        Self {
            source_file,
            env: Environment::new(),
            gas: 0,
            gas_limit,
        }
    }

    pub fn into_env(self) -> Environment {
        self.env
    }

    /// Consume one unit of gas.
    fn tick(&mut self) -> EvalResult<()> {
        self.charge(1)
    }

    /// Consume `units` of gas. Returns an error once the limit is passed.
    fn charge(&mut self, units: u64) -> EvalResult<()> {
        charge_gas(&mut self.gas, self.gas_limit, units)
    }

    fn error(&self, code: ErrorCode, message: impl Into<String>, span: Span) -> EvalError {
        let line = self.source_file.line(span.start_line).unwrap_or_default();
        ScriptError::new(&self.source_file.name, code, message, span, line).into()
    }

    // ══════════════════════════════════════════════════════════════════════
    // Statements
    // ══════════════════════════════════════════════════════════════════════

    /// Run a whole script: hoist its declarations, then execute each
    /// statement in order. Stops at the first error.
    pub fn run(&mut self, script: &Script) -> EvalResult<()> {
        for stmt in &script.body {
            if let Stmt::VarDecl(decl) = stmt {
                let kind = match decl.kind {
                    DeclKind::Var => BindingKind::Var,
                    DeclKind::Let => BindingKind::Let,
                    DeclKind::Const => BindingKind::Const,
                };
                for declarator in &decl.declarators {
                    self.env.declare(&declarator.name.name, kind);
                }
            }
        }
        for stmt in &script.body {
            self.exec_stmt(stmt)?;
        }
        Ok(())
    }

    fn exec_stmt(&mut self, stmt: &Stmt) -> EvalResult<()> {
        self.tick()?;
        match stmt {
            Stmt::VarDecl(decl) => {
                for declarator in &decl.declarators {
                    let value = match &declarator.init {
                        Some(init) => self.eval_expr(init)?,
                        // `var x;` leaves an existing value alone.
                        None if decl.kind == DeclKind::Var => continue,
                        None => Value::Undefined,
                    };
                    self.env.initialize(&declarator.name.name, value);
                }
                Ok(())
            }
            Stmt::Expr(stmt) => {
                self.eval_expr(&stmt.expr)?;
                Ok(())
            }
            Stmt::Empty(_) => Ok(()),
        }
    }

    // ══════════════════════════════════════════════════════════════════════
    // Expressions
    // ══════════════════════════════════════════════════════════════════════

    /// Evaluate an expression to a value.
    pub fn eval_expr(&mut self, expr: &Expr) -> EvalResult<Value> {
        self.tick()?;
        match &expr.kind {
            // ── Literals ──
            ExprKind::NumberLit(n) => Ok(Value::Number(*n)),
            ExprKind::StringLit(s) => Ok(Value::String(s.clone())),
            ExprKind::BoolLit(b) => Ok(Value::Bool(*b)),
            ExprKind::NullLit => Ok(Value::Null),
            ExprKind::Template(parts) => {
                let mut out = String::new();
                for part in parts {
                    match part {
                        TemplatePart::Literal(text) => out.push_str(text),
                        TemplatePart::Expr(e) => {
                            let value = self.eval_expr(e)?;
                            out.push_str(&self.to_string(&value, e.span)?);
                        }
                    }
                }
                self.charge(out.len() as u64 / 16)?;
                Ok(Value::String(out))
            }
            ExprKind::ArrayLit(elements) => self.eval_array(elements),
            ExprKind::ObjectLit(entries) => self.eval_object(entries),

            // ── References ──
            ExprKind::Identifier(name) => self.read_variable(name, expr.span),
            ExprKind::This => self.global_this(),

            // ── Access & construction ──
            ExprKind::Member { object, property } => {
                let base = self.eval_base(object)?;
                self.read_property(base, &property.name, expr.span)
            }
            ExprKind::Index { object, index } => {
                let base = self.eval_base(object)?;
                let key = self.eval_key(index)?;
                self.read_property(base, &key, expr.span)
            }
            ExprKind::Call { callee, args } => {
                let function = self.eval_expr(callee)?;
                let args = self.eval_args(args)?;
                match function {
                    Value::Builtin(Builtin::DateUtc) => {
                        let fields = self.to_numbers(&args, expr.span)?;
                        Ok(Value::Number(date::utc(&fields)))
                    }
                    Value::Builtin(Builtin::DateConstructor) => Err(self.error(
                        ErrorCode::NONDETERMINISTIC_VALUE,
                        "Date() returns the current time, \
                         which would make the output non-reproducible",
                        expr.span,
                    )),
                    _ => Err(self.error(
                        ErrorCode::NOT_A_FUNCTION,
                        format!("{} is not a function", describe(callee)),
                        expr.span,
                    )),
                }
            }
            ExprKind::New { callee, args } => {
                let constructor = self.eval_expr(callee)?;
                let args = self.eval_args(args)?;
                match constructor {
                    Value::Builtin(Builtin::DateConstructor) => {
                        self.construct_date(&args, expr.span)
                    }
                    _ => Err(self.error(
                        ErrorCode::NOT_A_CONSTRUCTOR,
                        format!("{} is not a constructor", describe(callee)),
                        expr.span,
                    )),
                }
            }

            // ── Operators ──
            ExprKind::Unary { op, operand } => {
                let value = self.eval_expr(operand)?;
                Ok(match op {
                    UnaryOp::Neg => Value::Number(-self.to_number(&value, expr.span)?),
                    UnaryOp::Plus => Value::Number(self.to_number(&value, expr.span)?),
                    UnaryOp::Not => Value::Bool(!value.is_truthy()),
                })
            }
            ExprKind::Binary { first, rest } => {
                let mut result = self.eval_expr(first)?;
                for (op, operand) in rest {
                    let right = self.eval_expr(operand)?;
                    result = self.eval_binary(*op, result, right, expr.span)?;
                }
                Ok(result)
            }
            ExprKind::Assign { target, value } => self.eval_assign(target, value),
            ExprKind::Paren(inner) => self.eval_expr(inner),
        }
    }

    fn eval_args(&mut self, args: &[Expr]) -> EvalResult<Vec<Value>> {
        args.iter().map(|arg| self.eval_expr(arg)).collect()
    }

    fn eval_array(&mut self, elements: &[ArrayElement]) -> EvalResult<Value> {
        let mut items = Vec::with_capacity(elements.len());
        for element in elements {
            match element {
                ArrayElement::Expr(e) => items.push(self.eval_expr(e)?),
                ArrayElement::Hole(_) => items.push(Value::Undefined),
                ArrayElement::Spread(e) => match self.eval_expr(e)? {
                    Value::Array(spread) => {
                        let source = spread.borrow();
                        self.charge(source.iter().map(Value::copy_cost).sum())?;
                        items.extend(source.iter().cloned());
                    }
                    Value::String(s) => {
                        self.charge(s.len() as u64)?;
                        items.extend(s.chars().map(|c| Value::String(c.to_string())));
                    }
                    other => {
                        return Err(self.error(
                            ErrorCode::NOT_ITERABLE,
                            format!("{} is not iterable", describe_value(&other)),
                            e.span,
                        ))
                    }
                },
            }
        }
        Ok(Value::array(items))
    }

    fn eval_object(&mut self, entries: &[ObjectEntry]) -> EvalResult<Value> {
        let mut map = ObjectMap::new();
        for entry in entries {
            match entry {
                ObjectEntry::Property { key, value } => {
                    let key = match key {
                        PropertyKey::Named(name) => name.clone(),
                        PropertyKey::Number(n) => format_number(*n),
                        PropertyKey::Computed(e) => self.eval_key(e)?,
                    };
                    let value = self.eval_expr(value)?;
                    map.insert(key, value);
                }
                ObjectEntry::Spread(e) => match self.eval_expr(e)? {
                    Value::Object(spread) => {
                        let source = spread.borrow();
                        self.charge(source.values().map(Value::copy_cost).sum())?;
                        for (key, value) in source.iter() {
                            map.insert(key, value.clone());
                        }
                    }
                    Value::Array(spread) => {
                        let source = spread.borrow();
                        self.charge(source.iter().map(Value::copy_cost).sum())?;
                        for (i, value) in source.iter().enumerate() {
                            map.insert(i.to_string(), value.clone());
                        }
                    }
                    Value::String(s) => {
                        self.charge(s.len() as u64)?;
                        for (i, unit) in s.encode_utf16().enumerate() {
                            let unit = String::from_utf16_lossy(&[unit]);
                            map.insert(i.to_string(), Value::String(unit));
                        }
                    }
                    // Primitives and dates have no own enumerable properties.
                    _ => {}
                },
            }
        }
        Ok(Value::object(map))
    }

    fn eval_binary(
        &mut self,
        op: BinOp,
        left: Value,
        right: Value,
        span: Span,
    ) -> EvalResult<Value> {
        if op != BinOp::Add {
            let left = self.to_number(&left, span)?;
            let right = self.to_number(&right, span)?;
            return Ok(Value::Number(match op {
                BinOp::Sub => left - right,
                BinOp::Mul => left * right,
                BinOp::Div => left / right,
                _ => left % right,
            }));
        }
        let left = self.to_primitive(left, span)?;
        let right = self.to_primitive(right, span)?;
        let result = match (left, right) {
            // Append in place; the left operand is already an owned copy.
            (Value::String(mut out), right) => {
                let tail = right.to_js_string();
                self.charge(tail.len() as u64 / 16)?;
                out.push_str(&tail);
                Value::String(out)
            }
            (left, Value::String(tail)) => {
                let mut out = left.to_js_string();
                self.charge((out.len() + tail.len()) as u64 / 16)?;
                out.push_str(&tail);
                Value::String(out)
            }
            (left, right) => Value::Number(left.to_number() + right.to_number()),
        };
        Ok(result)
    }

    fn construct_date(&mut self, args: &[Value], span: Span) -> EvalResult<Value> {
        let date = match args {
            [] => {
                return Err(self.error(
                    ErrorCode::NONDETERMINISTIC_VALUE,
                    "new Date() without arguments returns the current time, \
                     which would make the output non-reproducible",
                    span,
                ))
            }
            [Value::Date(date)] => *date,
            [value] => match self.to_primitive(value.clone(), span)? {
                Value::String(text) => DateValue::parse(&text),
                primitive => DateValue::from_time(primitive.to_number()),
            },
            fields => DateValue::from_fields(&self.to_numbers(fields, span)?),
        };
        Ok(Value::Date(date))
    }

    // ══════════════════════════════════════════════════════════════════════
    // Conversions
    // ══════════════════════════════════════════════════════════════════════

    /// `ToString`, paid for out of the remaining gas.
    fn to_string(&mut self, value: &Value, span: Span) -> EvalResult<String> {
        let mut budget = self.gas_limit.saturating_sub(self.gas);
        let result = value.to_js_string_within(&mut budget);
        self.gas = self.gas_limit - budget;
        result.map_err(|err| self.conversion_error(err, span))
    }

    /// `ToPrimitive` with the default hint: containers, dates, and
    /// functions become strings.
    fn to_primitive(&mut self, value: Value, span: Span) -> EvalResult<Value> {
        match value {
            Value::Array(_) | Value::Object(_) | Value::Date(_) | Value::Builtin(_) => {
                Ok(Value::String(self.to_string(&value, span)?))
            }
            other => Ok(other),
        }
    }

    /// `ToNumber`.
    fn to_number(&mut self, value: &Value, span: Span) -> EvalResult<f64> {
        match value {
            Value::Array(_) => Ok(string_to_number(&self.to_string(value, span)?)),
            other => Ok(other.to_number()),
        }
    }

    fn to_numbers(&mut self, values: &[Value], span: Span) -> EvalResult<Vec<f64>> {
        values.iter().map(|value| self.to_number(value, span)).collect()
    }

    fn conversion_error(&self, err: ConversionError, span: Span) -> EvalError {
        match err {
            ConversionError::TooDeep => self.error(
                ErrorCode::VALUE_TOO_DEEP,
                format!("value nesting exceeds the limit of {MAX_VALUE_DEPTH} levels"),
                span,
            ),
            ConversionError::OverBudget => EvalError::GasExhausted {
                limit: self.gas_limit,
            },
        }
    }

    // ══════════════════════════════════════════════════════════════════════
    // Bindings
    // ══════════════════════════════════════════════════════════════════════

    fn read_variable(&mut self, name: &str, span: Span) -> EvalResult<Value> {
        if name == "globalThis" {
            return self.global_this();
        }
        let value = match self.env.lookup(name) {
            Ok(value) => value,
            Err(err) => return Err(self.lookup_error(err, name, span)),
        };
        // Copies are paid for before they are made.
        charge_gas(&mut self.gas, self.gas_limit, value.copy_cost())?;
        Ok(value.clone())
    }

    /// A snapshot of the global object. Writes through `this.name` reach
    /// the bindings; writes through the snapshot do not.
    fn global_this(&mut self) -> EvalResult<Value> {
        let map = self.env.global_object();
        self.charge(1 + map.values().map(Value::copy_cost).sum::<u64>())?;
        Ok(Value::object(map))
    }

    fn lookup_error(&self, err: LookupError, name: &str, span: Span) -> EvalError {
        match err {
            LookupError::Undefined => self.error(
                ErrorCode::UNDEFINED_VARIABLE,
                format!("{name} is not defined"),
                span,
            ),
            LookupError::Uninitialized => self.error(
                ErrorCode::UNDEFINED_VARIABLE,
                format!("Cannot access '{name}' before initialization"),
                span,
            ),
        }
    }

    fn assign_error(&self, err: AssignError, name: &str, span: Span) -> EvalError {
        match err {
            AssignError::Constant => self.error(
                ErrorCode::CONST_ASSIGNMENT,
                "Assignment to constant variable.",
                span,
            ),
            AssignError::Uninitialized => {
                self.lookup_error(LookupError::Uninitialized, name, span)
            }
        }
    }

    fn property_error(&self, err: PropertyError, span: Span) -> EvalError {
        match err {
            PropertyError::NullishRead { .. } | PropertyError::NullishWrite { .. } => {
                self.error(ErrorCode::NULLISH_PROPERTY_ACCESS, err.to_string(), span)
            }
            PropertyError::InvalidArrayLength => {
                self.error(ErrorCode::INVALID_ARRAY_LENGTH, err.to_string(), span)
            }
            PropertyError::GrowthLimit { .. } => EvalError::GasExhausted {
                limit: self.gas_limit,
            },
        }
    }

    // ══════════════════════════════════════════════════════════════════════
    // Member access & assignment
    // ══════════════════════════════════════════════════════════════════════

    /// Evaluate the object part of `object.key` or `object[key]`.
    fn eval_base(&mut self, object: &Expr) -> EvalResult<Base> {
        match &object.kind {
            ExprKind::This => Ok(Base::Global),
            ExprKind::Identifier(name) if name == "globalThis" => Ok(Base::Global),
            ExprKind::Paren(inner) => self.eval_base(inner),
            _ => Ok(Base::Value(self.eval_expr(object)?)),
        }
    }

    /// Evaluate a computed key to a property name.
    fn eval_key(&mut self, key: &Expr) -> EvalResult<String> {
        let key_value = self.eval_expr(key)?;
        self.to_string(&key_value, key.span)
    }

    fn read_property(&mut self, base: Base, key: &str, span: Span) -> EvalResult<Value> {
        let value = match base {
            Base::Global => self
                .env
                .global_property(key)
                .cloned()
                .unwrap_or(Value::Undefined),
            Base::Value(object) => object
                .get_property(key)
                .map_err(|err| self.property_error(err, span))?,
        };
        self.charge(value.copy_cost())?;
        Ok(value)
    }

    /// `target = value`, evaluated left to right: the target's object and
    /// key first, then the value. Returns the assigned value.
    fn eval_assign(&mut self, target: &Expr, value: &Expr) -> EvalResult<Value> {
        match &target.kind {
            ExprKind::Identifier(name) => {
                let value = self.eval_expr(value)?;
                self.charge(value.copy_cost())?;
                if let Err(err) = self.env.assign(name, value.clone()) {
                    return Err(self.assign_error(err, name, target.span));
                }
                Ok(value)
            }
            ExprKind::Member { object, property } => {
                let base = self.eval_base(object)?;
                let value = self.eval_expr(value)?;
                self.write_property(base, &property.name, value, target.span)
            }
            ExprKind::Index { object, index } => {
                let base = self.eval_base(object)?;
                let key = self.eval_key(index)?;
                let value = self.eval_expr(value)?;
                self.write_property(base, &key, value, target.span)
            }
            _ => Err(self.error(
                ErrorCode::INVALID_ASSIGNMENT_TARGET,
                "Invalid left-hand side in assignment",
                target.span,
            )),
        }
    }

    fn write_property(
        &mut self,
        base: Base,
        key: &str,
        value: Value,
        span: Span,
    ) -> EvalResult<Value> {
        self.charge(value.copy_cost())?;
        match base {
            Base::Global => {
                if let Err(err) = self.env.assign(key, value.clone()) {
                    return Err(self.assign_error(err, key, span));
                }
            }
            Base::Value(object) => {
                let budget = self.gas_limit.saturating_sub(self.gas);
                let grown = object
                    .set_property(key, value.clone(), budget)
                    .map_err(|err| self.property_error(err, span))?;
                self.charge(grown)?;
            }
        }
        Ok(value)
    }
}

fn charge_gas(gas: &mut u64, limit: u64, units: u64) -> EvalResult<()> {
    *gas = gas.saturating_add(units);
    if *gas > limit {
        Err(EvalError::GasExhausted { limit })
    } else {
        Ok(())
    }
}

/// Source-like rendering of a callee for error messages.
fn describe(expr: &Expr) -> String {
    match &expr.kind {
        ExprKind::Identifier(name) => name.clone(),
        ExprKind::This => "this".to_string(),
        ExprKind::Member { object, property } => {
            format!("{}.{}", describe(object), property.name)
        }
        ExprKind::Index { object, index } => {
            format!("{}[{}]", describe(object), describe(index))
        }
        ExprKind::Call { callee, .. } => format!("{}(...)", describe(callee)),
        ExprKind::NumberLit(n) => format_number(*n),
        ExprKind::StringLit(s) => format!("\"{s}\""),
        ExprKind::BoolLit(b) => b.to_string(),
        ExprKind::NullLit => "null".to_string(),
        ExprKind::Paren(inner) => format!("({})", describe(inner)),
        _ => "expression".to_string(),
    }
}

fn describe_value(value: &Value) -> String {
    match value {
        Value::Undefined | Value::Null | Value::Bool(_) | Value::Number(_) => {
            value.to_js_string()
        }
        Value::Object(_) => "object".to_string(),
        Value::Date(_) => "date".to_string(),
        other => other.type_name().to_string(),
    }
}
