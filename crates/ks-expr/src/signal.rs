//! Signal-mode evaluation: symbols bound to scalars or per-step series.

use std::collections::BTreeMap;

use crate::parser::{BinOp, Expr, UnaryOp, parse};
use crate::{ExprError, ExprResult};

/// A named simulation signal: either a single value or one value per step.
#[derive(Debug, Clone, PartialEq)]
pub enum Signal {
    Scalar(f64),
    Series(Vec<f64>),
}

/// Flat symbol table keyed by (possibly dotted) signal name.
pub type SignalTable = BTreeMap<String, Signal>;

const AGGREGATE_FUNCS: &[&str] = &["max", "min", "mean", "rms", "abs", "first", "last"];

#[derive(Debug, Clone, Copy)]
enum Value<'a> {
    Scalar(f64),
    Series(&'a [f64]),
}

/// Evaluate a signal expression against a signal table.
///
/// Arithmetic operates on scalars only; series must pass through an
/// aggregate function first. An empty expression is the soft failure
/// [`ExprError::Empty`] so callers can skip unset fields.
pub fn eval_signal_expr(expr: &str, signals: &SignalTable) -> ExprResult<f64> {
    let expr = expr.trim();
    if expr.is_empty() {
        return Err(ExprError::Empty);
    }

    let tree = parse(expr)?;
    match eval(&tree, signals)? {
        Value::Scalar(value) => Ok(value),
        Value::Series(_) => Err(ExprError::SeriesArithmetic),
    }
}

fn eval<'a>(expr: &Expr, signals: &'a SignalTable) -> ExprResult<Value<'a>> {
    match expr {
        Expr::Number(value) => Ok(Value::Scalar(*value)),
        Expr::Name(key) => match signals.get(key) {
            Some(Signal::Scalar(value)) => Ok(Value::Scalar(*value)),
            Some(Signal::Series(values)) => Ok(Value::Series(values)),
            None => Err(ExprError::UnknownSignal(key.clone())),
        },
        Expr::Unary(op, operand) => {
            let Value::Scalar(value) = eval(operand, signals)? else {
                return Err(ExprError::SeriesArithmetic);
            };
            Ok(Value::Scalar(match op {
                UnaryOp::Plus => value,
                UnaryOp::Minus => -value,
            }))
        }
        Expr::Binary(op, left, right) => {
            let (Value::Scalar(lhs), Value::Scalar(rhs)) =
                (eval(left, signals)?, eval(right, signals)?)
            else {
                return Err(ExprError::SeriesArithmetic);
            };
            Ok(Value::Scalar(match op {
                BinOp::Add => lhs + rhs,
                BinOp::Sub => lhs - rhs,
                BinOp::Mul => lhs * rhs,
                BinOp::Div => lhs / rhs,
            }))
        }
        Expr::Call(name, args) => {
            if !AGGREGATE_FUNCS.contains(&name.as_str()) {
                return Err(ExprError::UnknownFunction(name.clone()));
            }
            if args.len() != 1 {
                return Err(ExprError::ExpectsOneArgument(name.clone()));
            }
            let arg = eval(&args[0], signals)?;
            Ok(Value::Scalar(aggregate(name, arg)?))
        }
    }
}

fn aggregate(name: &str, arg: Value<'_>) -> ExprResult<f64> {
    // A scalar argument is treated as a one-element series.
    let singleton;
    let values: &[f64] = match arg {
        Value::Scalar(value) => {
            if name == "abs" {
                return Ok(value.abs());
            }
            singleton = [value];
            &singleton
        }
        Value::Series(values) => values,
    };

    if name == "abs" {
        return Err(ExprError::ScalarOnly("abs".to_string()));
    }
    if values.is_empty() {
        return Err(ExprError::EmptyAggregate(name.to_string()));
    }

    let n = values.len() as f64;
    Ok(match name {
        "max" => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        "min" => values.iter().copied().fold(f64::INFINITY, f64::min),
        "mean" => values.iter().sum::<f64>() / n,
        "rms" => (values.iter().map(|v| v * v).sum::<f64>() / n).sqrt(),
        "first" => values[0],
        "last" => values[values.len() - 1],
        _ => unreachable!(),
    })
}
