//! Parameter-mode evaluation: named scalar symbols plus math helpers.

use std::collections::BTreeMap;
use std::f64::consts;

use crate::parser::{BinOp, Expr, UnaryOp, parse};
use crate::{ExprError, ExprResult};

const SCALAR_FUNCS: &[&str] = &[
    "sin", "cos", "tan", "asin", "acos", "atan", "sqrt", "abs",
];

/// Evaluate a parameter expression against a scalar symbol table.
///
/// Unknown free symbols fail with the sorted list of offending names; a
/// NaN result is reported as such rather than propagated as a value.
pub fn eval_param_expr(expr: &str, params: &BTreeMap<String, f64>) -> ExprResult<f64> {
    let expr = expr.trim();
    if expr.is_empty() {
        return Err(ExprError::Empty);
    }

    let tree = parse(expr)?;

    let mut unknown = Vec::new();
    collect_unknown_symbols(&tree, params, &mut unknown);
    if !unknown.is_empty() {
        unknown.sort();
        unknown.dedup();
        return Err(ExprError::UnknownSymbols(unknown.join(", ")));
    }

    let value = eval(&tree, params)?;
    if value.is_nan() {
        return Err(ExprError::NanResult);
    }
    if !value.is_finite() {
        return Err(ExprError::Eval("non-finite result".to_string()));
    }
    Ok(value)
}

fn is_constant(name: &str) -> bool {
    matches!(name, "pi" | "E")
}

fn collect_unknown_symbols(expr: &Expr, params: &BTreeMap<String, f64>, out: &mut Vec<String>) {
    match expr {
        Expr::Number(_) => {}
        Expr::Name(name) => {
            if !is_constant(name) && !params.contains_key(name) {
                out.push(name.clone());
            }
        }
        Expr::Unary(_, operand) => collect_unknown_symbols(operand, params, out),
        Expr::Binary(_, left, right) => {
            collect_unknown_symbols(left, params, out);
            collect_unknown_symbols(right, params, out);
        }
        Expr::Call(_, args) => {
            for arg in args {
                collect_unknown_symbols(arg, params, out);
            }
        }
    }
}

fn eval(expr: &Expr, params: &BTreeMap<String, f64>) -> ExprResult<f64> {
    match expr {
        Expr::Number(value) => Ok(*value),
        Expr::Name(name) => {
            if let Some(value) = params.get(name) {
                return Ok(*value);
            }
            match name.as_str() {
                "pi" => Ok(consts::PI),
                "E" => Ok(consts::E),
                _ => Err(ExprError::UnknownSymbols(name.clone())),
            }
        }
        Expr::Unary(op, operand) => {
            let value = eval(operand, params)?;
            Ok(match op {
                UnaryOp::Plus => value,
                UnaryOp::Minus => -value,
            })
        }
        Expr::Binary(op, left, right) => {
            let lhs = eval(left, params)?;
            let rhs = eval(right, params)?;
            match op {
                BinOp::Add => Ok(lhs + rhs),
                BinOp::Sub => Ok(lhs - rhs),
                BinOp::Mul => Ok(lhs * rhs),
                BinOp::Div => {
                    if rhs == 0.0 {
                        Err(ExprError::Eval("division by zero".to_string()))
                    } else {
                        Ok(lhs / rhs)
                    }
                }
            }
        }
        Expr::Call(name, args) => eval_call(name, args, params),
    }
}

fn eval_call(name: &str, args: &[Expr], params: &BTreeMap<String, f64>) -> ExprResult<f64> {
    if SCALAR_FUNCS.contains(&name) {
        if args.len() != 1 {
            return Err(ExprError::ExpectsOneArgument(name.to_string()));
        }
        let value = eval(&args[0], params)?;
        return Ok(match name {
            "sin" => value.sin(),
            "cos" => value.cos(),
            "tan" => value.tan(),
            "asin" => value.asin(),
            "acos" => value.acos(),
            "atan" => value.atan(),
            "sqrt" => value.sqrt(),
            "abs" => value.abs(),
            _ => unreachable!(),
        });
    }

    match name {
        "min" | "max" => {
            if args.is_empty() {
                return Err(ExprError::ExpectsArguments(name.to_string()));
            }
            let mut acc = eval(&args[0], params)?;
            for arg in &args[1..] {
                let value = eval(arg, params)?;
                acc = if name == "min" {
                    acc.min(value)
                } else {
                    acc.max(value)
                };
            }
            Ok(acc)
        }
        _ => Err(ExprError::UnknownFunction(name.to_string())),
    }
}
