// src/expression.rs
//! The `expr` script language: boolean predicates over binding variables.
//!
//! ```text
//! level == 'ERROR' && !is_null(marker) || contains(message.text, 'timeout')
//! ```

use serde_json::Value;

use crate::bindings::ScriptBindings;
use crate::comparison::{compare_values, values_equal};
use crate::errors::{Result, ScriptError};
use crate::functions::Registry;
use crate::parser::{ParseError, Parser};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PathToken {
    Key(String),
    Index(i64),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    Var { root: String, path: Vec<PathToken> },
    Call { name: String, args: Vec<Expr> },
    Compare(CmpOp, Box<Expr>, Box<Expr>),
    And(Vec<Expr>),
    Or(Vec<Expr>),
    Not(Box<Expr>),
}

pub fn parse_expr(input: &str) -> std::result::Result<Expr, ParseError> {
    let mut p = Parser::new(input);
    let expr = parse_or(&mut p)?;
    p.skip_ws();
    if !p.eof() {
        return Err(p.error("trailing input"));
    }
    Ok(expr)
}

/// Parses `body` and checks every called function exists in `functions`.
pub fn compile(script: &str, body: &str, functions: &Registry) -> Result<Expr> {
    let expr = parse_expr(body).map_err(|e| ScriptError::Parse {
        script: script.to_string(),
        message: e.to_string(),
    })?;
    check_functions(&expr, functions).map_err(|message| ScriptError::Parse {
        script: script.to_string(),
        message,
    })?;
    Ok(expr)
}

fn check_functions(expr: &Expr, functions: &Registry) -> std::result::Result<(), String> {
    match expr {
        Expr::Literal(_) | Expr::Var { .. } => Ok(()),
        Expr::Call { name, args } => {
            if functions.get(name).is_none() {
                return Err(format!("unknown function `{name}`"));
            }
            args.iter().try_for_each(|a| check_functions(a, functions))
        }
        Expr::Compare(_, l, r) => {
            check_functions(l, functions)?;
            check_functions(r, functions)
        }
        Expr::And(terms) | Expr::Or(terms) => terms.iter().try_for_each(|t| check_functions(t, functions)),
        Expr::Not(inner) => check_functions(inner, functions),
    }
}

fn parse_or(p: &mut Parser) -> std::result::Result<Expr, ParseError> {
    p.enter()?;
    let mut terms = vec![parse_and(p)?];
    loop {
        p.skip_ws();
        if p.consume_str("||") {
            terms.push(parse_and(p)?);
        } else {
            break;
        }
    }
    p.leave();
    Ok(if terms.len() == 1 { terms.remove(0) } else { Expr::Or(terms) })
}

fn parse_and(p: &mut Parser) -> std::result::Result<Expr, ParseError> {
    let mut terms = vec![parse_not(p)?];
    loop {
        p.skip_ws();
        if p.consume_str("&&") {
            terms.push(parse_not(p)?);
        } else {
            break;
        }
    }
    Ok(if terms.len() == 1 { terms.remove(0) } else { Expr::And(terms) })
}

fn parse_not(p: &mut Parser) -> std::result::Result<Expr, ParseError> {
    p.skip_ws();
    if p.peek_char() == Some('!') && !p.peek_str("!=") {
        p.consume_char('!');
        p.enter()?;
        let inner = parse_not(p)?;
        p.leave();
        Ok(Expr::Not(Box::new(inner)))
    } else {
        parse_compare(p)
    }
}

fn parse_compare(p: &mut Parser) -> std::result::Result<Expr, ParseError> {
    let left = parse_primary(p)?;
    p.skip_ws();
    let op = if p.consume_str("==") {
        Some(CmpOp::Eq)
    } else if p.consume_str("!=") {
        Some(CmpOp::Ne)
    } else if p.consume_str("<=") {
        Some(CmpOp::Lte)
    } else if p.consume_str(">=") {
        Some(CmpOp::Gte)
    } else if p.consume_char('<') {
        Some(CmpOp::Lt)
    } else if p.consume_char('>') {
        Some(CmpOp::Gt)
    } else {
        None
    };
    match op {
        Some(op) => {
            let right = parse_primary(p)?;
            Ok(Expr::Compare(op, Box::new(left), Box::new(right)))
        }
        None => Ok(left),
    }
}

fn parse_primary(p: &mut Parser) -> std::result::Result<Expr, ParseError> {
    p.skip_ws();
    if p.consume_char('(') {
        let inner = parse_or(p)?;
        p.expect(')')?;
        return Ok(inner);
    }
    if matches!(p.peek_char(), Some('"') | Some('\'')) {
        return Ok(Expr::Literal(Value::String(p.parse_quoted_string()?)));
    }
    if p.consume_keyword("true") {
        return Ok(Expr::Literal(Value::Bool(true)));
    }
    if p.consume_keyword("false") {
        return Ok(Expr::Literal(Value::Bool(false)));
    }
    if p.consume_keyword("null") {
        return Ok(Expr::Literal(Value::Null));
    }
    if p.peek_char().is_some_and(|c| c == '-' || c.is_ascii_digit()) {
        return Ok(Expr::Literal(p.parse_number_literal()?));
    }

    let name = p.parse_identifier()?;
    p.skip_ws();
    if p.consume_char('(') {
        let args = parse_args(p)?;
        p.expect(')')?;
        return Ok(Expr::Call { name, args });
    }

    let mut path = Vec::new();
    loop {
        if p.consume_char('.') {
            path.push(PathToken::Key(p.parse_identifier()?));
        } else if p.consume_char('[') {
            p.skip_ws();
            if matches!(p.peek_char(), Some('"') | Some('\'')) {
                path.push(PathToken::Key(p.parse_quoted_string()?));
            } else {
                path.push(PathToken::Index(p.parse_int()?));
            }
            p.expect(']')?;
        } else {
            break;
        }
    }
    Ok(Expr::Var { root: name, path })
}

fn parse_args(p: &mut Parser) -> std::result::Result<Vec<Expr>, ParseError> {
    let mut out = Vec::new();
    p.skip_ws();
    if p.peek_char() == Some(')') {
        return Ok(out);
    }
    loop {
        out.push(parse_or(p)?);
        p.skip_ws();
        if !p.consume_char(',') {
            break;
        }
    }
    Ok(out)
}

pub fn truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// Evaluates `expr` against one binding. Unbound variables and missing
/// path segments evaluate to `null`.
pub fn eval(expr: &Expr, bindings: &ScriptBindings, functions: &Registry) -> Result<Value> {
    match expr {
        Expr::Literal(v) => Ok(v.clone()),
        Expr::Var { root, path } => Ok(lookup(bindings, root, path)),
        Expr::Call { name, args } => {
            let args = args
                .iter()
                .map(|a| eval(a, bindings, functions))
                .collect::<Result<Vec<_>>>()?;
            functions.call(name, &args, bindings)
        }
        Expr::Compare(op, l, r) => {
            let a = eval(l, bindings, functions)?;
            let b = eval(r, bindings, functions)?;
            let out = match op {
                CmpOp::Eq => values_equal(&a, &b),
                CmpOp::Ne => !values_equal(&a, &b),
                CmpOp::Lt => compare_values(&a, &b)?.is_lt(),
                CmpOp::Lte => compare_values(&a, &b)?.is_le(),
                CmpOp::Gt => compare_values(&a, &b)?.is_gt(),
                CmpOp::Gte => compare_values(&a, &b)?.is_ge(),
            };
            Ok(Value::Bool(out))
        }
        Expr::And(terms) => {
            for t in terms {
                if !truthy(&eval(t, bindings, functions)?) {
                    return Ok(Value::Bool(false));
                }
            }
            Ok(Value::Bool(true))
        }
        Expr::Or(terms) => {
            for t in terms {
                if truthy(&eval(t, bindings, functions)?) {
                    return Ok(Value::Bool(true));
                }
            }
            Ok(Value::Bool(false))
        }
        Expr::Not(inner) => Ok(Value::Bool(!truthy(&eval(inner, bindings, functions)?))),
    }
}

fn lookup(bindings: &ScriptBindings, root: &str, path: &[PathToken]) -> Value {
    let mut node = match bindings.get(root) {
        Some(v) => v,
        None => return Value::Null,
    };
    for token in path {
        let next = match (token, node) {
            (PathToken::Key(k), Value::Object(m)) => m.get(k),
            (PathToken::Index(i), Value::Array(a)) if *i >= 0 => a.get(*i as usize),
            _ => None,
        };
        match next {
            Some(v) => node = v,
            None => return Value::Null,
        }
    }
    node.clone()
}
