//! Values, operator semantics and the two evaluation modes for the formula
//! engine.
//!
//! Parsing (see `formula_parse`) decides what an operator *is*; this crate
//! decides what it *does*. Evaluation comes in two modes over the same AST:
//! the fail-soft [`evaluate`] for partially bound data, and the fail-loud
//! [`execute`] used by the engine facade's `exec`/`eval`.

mod environment;
mod errors;
mod interpreter;
mod operators;
mod strict;
mod value;

pub use environment::{Environment, THIS_BINDING};
pub use errors::{
    binary_type_mismatch, index_out_of_bounds, invalid_call_target, invalid_index, key_not_found,
    not_callable, not_indexable, undefined_binary_op, undefined_field, undefined_function,
    undefined_unary_op, unary_type_mismatch, EvalError, EvalErrorKind, EvalResult,
};
pub use interpreter::{evaluate, Resolution, ALL_KEYWORD};
pub use operators::{apply_binary, apply_unary, BinaryImpl, Operators, UnaryImpl};
pub use strict::execute;
pub use value::{Callable, FnCtx, Heap, Value};
