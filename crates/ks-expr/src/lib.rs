//! ks-expr: sandboxed expression evaluation for parameters and signals.
//!
//! Expressions are user-authored text embedded in sketch fields and
//! optimization objectives/constraints. They are parsed into a small
//! whitelisted syntax tree (literals, `+ - * /`, unary sign, simple
//! function calls, plain/dotted name lookups) and walked directly. The
//! whitelist is the security boundary: nothing outside it is executable.
//!
//! Two evaluation modes share the grammar:
//! - [`eval_param_expr`]: scalar symbols only, trig/sqrt/min/max helpers.
//! - [`eval_signal_expr`]: symbols bound to scalars or per-step series,
//!   with aggregate functions (`max`, `min`, `mean`, `rms`, ...).

mod lexer;
mod parser;

pub mod param;
pub mod signal;

pub use param::eval_param_expr;
pub use signal::{Signal, SignalTable, eval_signal_expr};

pub type ExprResult<T> = Result<T, ExprError>;

/// Expression failures are always recoverable: callers surface the message
/// or fold it into a penalty, they never abort on one.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExprError {
    #[error("Empty expression")]
    Empty,

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Unknown symbol(s): {0}")]
    UnknownSymbols(String),

    #[error("Unknown signal: {0}")]
    UnknownSignal(String),

    #[error("Function not allowed: {0}")]
    UnknownFunction(String),

    #[error("{0}() expects one argument")]
    ExpectsOneArgument(String),

    #[error("{0}() expects at least one argument")]
    ExpectsArguments(String),

    #[error("{0}() requires at least one value")]
    EmptyAggregate(String),

    #[error("{0}() expects a scalar value")]
    ScalarOnly(String),

    #[error("Use aggregate functions for signal arrays")]
    SeriesArithmetic,

    #[error("Only simple function calls are allowed")]
    NotSimpleCall,

    #[error("Expression evaluated to NaN")]
    NanResult,

    #[error("Eval error: {0}")]
    Eval(String),
}
