//! Operator implementation tables.
//!
//! What *parses* is the grammar's concern; what an operator *does* lives
//! here. The two registries are mutated independently, so a host can parse
//! an operator it has not given semantics yet (the fail-soft interpreter
//! degrades, the strict evaluator errors).
//!
//! Implementations are exhaustive matches over value pairs with structured
//! errors for unsupported combinations. There is no implicit coercion.

use crate::errors::{binary_type_mismatch, unary_type_mismatch, EvalResult};
use crate::value::Value;
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// Implementation of a binary operator.
pub type BinaryImpl = Arc<dyn Fn(&Value, &Value) -> EvalResult + Send + Sync>;

/// Implementation of a prefix unary operator.
pub type UnaryImpl = Arc<dyn Fn(&Value) -> EvalResult + Send + Sync>;

/// Operator implementation registry for one engine instance.
#[derive(Clone)]
pub struct Operators {
    binary: FxHashMap<String, BinaryImpl>,
    unary: FxHashMap<String, UnaryImpl>,
}

impl Default for Operators {
    fn default() -> Self {
        Self::default_set()
    }
}

impl Operators {
    /// Registry with no implementations at all.
    pub fn empty() -> Self {
        Operators {
            binary: FxHashMap::default(),
            unary: FxHashMap::default(),
        }
    }

    /// Registry seeded with the default operator semantics.
    pub fn default_set() -> Self {
        let mut ops = Operators::empty();

        ops.set_binary("+", eval_add);
        ops.set_binary("-", eval_sub);
        ops.set_binary("*", eval_mul);
        ops.set_binary("/", eval_div);
        ops.set_binary("%", eval_rem);
        // `^` parses at the bitwise-xor precedence slot but means
        // exponentiation, matching the seeded semantics hosts expect.
        ops.set_binary("^", eval_pow);

        ops.set_binary("==", eval_eq);
        ops.set_binary("!=", eval_ne);
        ops.set_binary("===", eval_eq);
        ops.set_binary("!==", eval_ne);
        ops.set_binary("<", |a, b| eval_compare("<", a, b));
        ops.set_binary("<=", |a, b| eval_compare("<=", a, b));
        ops.set_binary(">", |a, b| eval_compare(">", a, b));
        ops.set_binary(">=", |a, b| eval_compare(">=", a, b));

        ops.set_binary("&&", |a, b| Ok(Value::Bool(a.truthy() && b.truthy())));
        ops.set_binary("||", |a, b| Ok(Value::Bool(a.truthy() || b.truthy())));

        ops.set_binary("|", |a, b| eval_int_binary("|", a, b, |x, y| x | y));
        ops.set_binary("&", |a, b| eval_int_binary("&", a, b, |x, y| x & y));
        ops.set_binary("<<", |a, b| {
            eval_int_binary("<<", a, b, |x, y| x << (y as u32 & 63))
        });
        ops.set_binary(">>", |a, b| {
            eval_int_binary(">>", a, b, |x, y| x >> (y as u32 & 63))
        });
        ops.set_binary(">>>", |a, b| {
            eval_int_binary(">>>", a, b, |x, y| ((x as u64) >> (y as u32 & 63)) as i64)
        });

        // In soft evaluation `->` is an ordinary operator returning its
        // right operand; the strict evaluator special-cases it for piping.
        ops.set_binary("->", |_, b| Ok(b.clone()));

        ops.set_unary("-", eval_neg);
        ops.set_unary("!", |v| Ok(Value::Bool(!v.truthy())));
        ops.set_unary("+", eval_numeric_identity);
        ops.set_unary("~", eval_bitnot);

        ops
    }

    /// Install (or replace) a binary operator implementation.
    pub fn set_binary<F>(&mut self, op: impl Into<String>, f: F)
    where
        F: Fn(&Value, &Value) -> EvalResult + Send + Sync + 'static,
    {
        self.binary.insert(op.into(), Arc::new(f));
    }

    /// Install (or replace) a unary operator implementation.
    pub fn set_unary<F>(&mut self, op: impl Into<String>, f: F)
    where
        F: Fn(&Value) -> EvalResult + Send + Sync + 'static,
    {
        self.unary.insert(op.into(), Arc::new(f));
    }

    /// Look up a binary operator implementation.
    pub fn binary(&self, op: &str) -> Option<&BinaryImpl> {
        self.binary.get(op)
    }

    /// Look up a unary operator implementation.
    pub fn unary(&self, op: &str) -> Option<&UnaryImpl> {
        self.unary.get(op)
    }
}

impl std::fmt::Debug for Operators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Operators {{ {} binary, {} unary }}",
            self.binary.len(),
            self.unary.len()
        )
    }
}

// ===== Default binary semantics =====

fn eval_add(a: &Value, b: &Value) -> EvalResult {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => Ok(Value::Number(x + y)),
        (Value::Str(x), Value::Str(y)) => Ok(Value::string(format!("{}{}", **x, **y))),
        (Value::Array(x), Value::Array(y)) => {
            let mut joined = (**x).clone();
            joined.extend_from_slice(y);
            Ok(Value::array(joined))
        }
        _ => Err(binary_type_mismatch("+", a, b)),
    }
}

fn eval_sub(a: &Value, b: &Value) -> EvalResult {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => Ok(Value::Number(x - y)),
        _ => Err(binary_type_mismatch("-", a, b)),
    }
}

fn eval_mul(a: &Value, b: &Value) -> EvalResult {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => Ok(Value::Number(x * y)),
        _ => Err(binary_type_mismatch("*", a, b)),
    }
}

/// Division keeps IEEE semantics: dividing by zero yields an infinity
/// rather than an error.
fn eval_div(a: &Value, b: &Value) -> EvalResult {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => Ok(Value::Number(x / y)),
        _ => Err(binary_type_mismatch("/", a, b)),
    }
}

fn eval_rem(a: &Value, b: &Value) -> EvalResult {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => Ok(Value::Number(x % y)),
        _ => Err(binary_type_mismatch("%", a, b)),
    }
}

fn eval_pow(a: &Value, b: &Value) -> EvalResult {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => Ok(Value::Number(x.powf(*y))),
        _ => Err(binary_type_mismatch("^", a, b)),
    }
}

fn eval_eq(a: &Value, b: &Value) -> EvalResult {
    Ok(Value::Bool(a.equals(b)))
}

fn eval_ne(a: &Value, b: &Value) -> EvalResult {
    Ok(Value::Bool(!a.equals(b)))
}

/// Ordering comparisons on numbers and strings.
fn eval_compare(op: &str, a: &Value, b: &Value) -> EvalResult {
    let ordering = match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.partial_cmp(y),
        (Value::Str(x), Value::Str(y)) => Some(x.cmp(y)),
        _ => return Err(binary_type_mismatch(op, a, b)),
    };
    // NaN comparisons are false across the board.
    let result = match ordering {
        Some(ord) => match op {
            "<" => ord.is_lt(),
            "<=" => ord.is_le(),
            ">" => ord.is_gt(),
            ">=" => ord.is_ge(),
            _ => false,
        },
        None => false,
    };
    Ok(Value::Bool(result))
}

/// Integer operators work on the operands truncated to i64.
fn eval_int_binary(
    op: &str,
    a: &Value,
    b: &Value,
    f: impl Fn(i64, i64) -> i64,
) -> EvalResult {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            let result = f(*x as i64, *y as i64);
            Ok(Value::Number(result as f64))
        }
        _ => Err(binary_type_mismatch(op, a, b)),
    }
}

// ===== Default unary semantics =====

fn eval_neg(v: &Value) -> EvalResult {
    match v {
        Value::Number(n) => Ok(Value::Number(-n)),
        _ => Err(unary_type_mismatch("-", v)),
    }
}

fn eval_numeric_identity(v: &Value) -> EvalResult {
    match v {
        Value::Number(n) => Ok(Value::Number(*n)),
        _ => Err(unary_type_mismatch("+", v)),
    }
}

fn eval_bitnot(v: &Value) -> EvalResult {
    match v {
        Value::Number(n) => Ok(Value::Number(!(*n as i64) as f64)),
        _ => Err(unary_type_mismatch("~", v)),
    }
}

/// Invoke a binary implementation, or fail with `undefined_binary_op`.
pub fn apply_binary(ops: &Operators, op: &str, left: &Value, right: &Value) -> EvalResult {
    match ops.binary(op) {
        Some(f) => f(left, right),
        None => Err(crate::errors::undefined_binary_op(op)),
    }
}

/// Invoke a unary implementation, or fail with `undefined_unary_op`.
pub fn apply_unary(ops: &Operators, op: &str, operand: &Value) -> EvalResult {
    match ops.unary(op) {
        Some(f) => f(operand),
        None => Err(crate::errors::undefined_unary_op(op)),
    }
}
