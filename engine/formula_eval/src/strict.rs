//! Fail-loud evaluator.
//!
//! The execution mode behind `exec`/`eval` on the engine facade: every
//! failure is a structured [`EvalError`]. Two policies separate it from the
//! fail-soft interpreter:
//!
//! - an unbound identifier evaluates to its own name as a string, so bare
//!   words can be fed to host functions as labels;
//! - `->` threads its left value into evaluation of its right operand,
//!   where calls observe it through [`FnCtx::piped`].

use crate::environment::Environment;
use crate::errors::{
    index_out_of_bounds, invalid_call_target, invalid_index, key_not_found, not_callable,
    not_indexable, undefined_field, undefined_function, EvalResult,
};
use crate::interpreter::ALL_KEYWORD;
use crate::operators::{apply_binary, apply_unary, Operators};
use crate::value::{Callable, FnCtx, Value};
use formula_ir::{ExprArena, ExprId, ExprKind, ExprRange, Literal, Program};
use rustc_hash::FxHashMap;
use tracing::trace;

/// Pipe operator, special-cased for value threading.
const PIPE_OP: &str = "->";

/// Evaluate a program fail-loud.
pub fn execute(
    program: &Program,
    ops: &Operators,
    functions: &FxHashMap<String, Callable>,
    env: &Environment,
) -> EvalResult {
    StrictEvaluator {
        arena: &program.arena,
        ops,
        functions,
        env,
    }
    .eval(program.root, None)
}

struct StrictEvaluator<'a> {
    arena: &'a ExprArena,
    ops: &'a Operators,
    functions: &'a FxHashMap<String, Callable>,
    env: &'a Environment,
}

impl StrictEvaluator<'_> {
    fn eval(&self, id: ExprId, piped: Option<&Value>) -> EvalResult {
        let expr = self.arena.get(id);
        match &expr.kind {
            ExprKind::Literal(lit) => Ok(literal_value(lit)),
            ExprKind::Ident(name) => Ok(self.resolve_name(name)),
            ExprKind::This => match self.env.this() {
                Some(v) => Ok(v.clone()),
                None => Err(key_not_found(crate::environment::THIS_BINDING)),
            },
            ExprKind::Array(items) => {
                let mut values = Vec::with_capacity(items.len());
                for item in self.arena.list(*items) {
                    values.push(self.eval(*item, piped)?);
                }
                Ok(Value::array(values))
            }
            ExprKind::Unary { op, operand } => {
                let operand = self.eval(*operand, piped)?;
                apply_unary(self.ops, op, &operand)
            }
            ExprKind::Binary { op, left, right } if op == PIPE_OP => {
                let carried = self.eval(*left, piped)?;
                trace!("piping value into right operand");
                self.eval(*right, Some(&carried))
            }
            ExprKind::Binary { op, left, right } | ExprKind::Logical { op, left, right } => {
                let left = self.eval(*left, piped)?;
                let right = self.eval(*right, piped)?;
                apply_binary(self.ops, op, &left, &right)
            }
            ExprKind::Conditional {
                test,
                consequent,
                alternate,
            } => {
                if self.eval(*test, piped)?.truthy() {
                    self.eval(*consequent, piped)
                } else {
                    self.eval(*alternate, piped)
                }
            }
            ExprKind::Field { receiver, field } => {
                let receiver = self.eval(*receiver, piped)?;
                field_access(&receiver, field)
            }
            ExprKind::Index { receiver, index } => {
                if let ExprKind::Ident(name) = &self.arena.get(*index).kind {
                    if name == ALL_KEYWORD && !self.env.contains(name) {
                        return self.eval(*receiver, piped);
                    }
                }
                let receiver = self.eval(*receiver, piped)?;
                let index = self.eval(*index, piped)?;
                index_access(&receiver, &index)
            }
            ExprKind::Call { callee, args } => self.eval_call(*callee, *args, piped),
            ExprKind::Compound(exprs) => {
                let mut last = Value::Null;
                for expr in self.arena.list(*exprs) {
                    last = self.eval(*expr, piped)?;
                }
                Ok(last)
            }
        }
    }

    /// Unbound names fall back to themselves as strings.
    fn resolve_name(&self, name: &str) -> Value {
        match self.env.get(name) {
            Some(v) => v.clone(),
            None => Value::string(name),
        }
    }

    /// Calls accept identifier callees only, resolved against the named
    /// function table first and the environment second.
    fn eval_call(&self, callee: ExprId, args: ExprRange, piped: Option<&Value>) -> EvalResult {
        let ExprKind::Ident(name) = &self.arena.get(callee).kind else {
            return Err(invalid_call_target());
        };
        let target: Callable = if let Some(f) = self.functions.get(name) {
            f.clone()
        } else {
            match self.env.get(name) {
                Some(Value::Function(f)) => f.clone(),
                Some(other) => return Err(not_callable(other)),
                None => return Err(undefined_function(name)),
            }
        };
        let mut arg_values = Vec::with_capacity(args.len());
        for arg in self.arena.list(args) {
            arg_values.push(self.eval(*arg, piped)?);
        }
        let ctx = FnCtx {
            receiver: None,
            piped: piped.cloned(),
        };
        target(&ctx, &arg_values)
    }
}

fn field_access(receiver: &Value, field: &str) -> EvalResult {
    match receiver {
        Value::Object(fields) => match fields.get(field) {
            Some(v) => Ok(v.clone()),
            None => Err(undefined_field(field, receiver)),
        },
        Value::Array(items) => {
            let mut projected = Vec::with_capacity(items.len());
            for item in items.iter() {
                projected.push(field_access(item, field)?);
            }
            Ok(Value::array(projected))
        }
        _ => Err(undefined_field(field, receiver)),
    }
}

fn index_access(receiver: &Value, index: &Value) -> EvalResult {
    match (receiver, index) {
        (Value::Array(items), Value::Number(n)) => {
            if n.fract() != 0.0 {
                return Err(invalid_index(*n));
            }
            let i = *n as i64;
            if i < 0 || i as usize >= items.len() {
                return Err(index_out_of_bounds(i, items.len()));
            }
            Ok(items[i as usize].clone())
        }
        (Value::Object(fields), Value::Str(key)) => match fields.get(&**key) {
            Some(v) => Ok(v.clone()),
            None => Err(key_not_found(key)),
        },
        _ => Err(not_indexable(receiver)),
    }
}

fn literal_value(lit: &Literal) -> Value {
    match lit {
        Literal::Number(n) => Value::Number(*n),
        Literal::Str(s) => Value::string(s.clone()),
        Literal::Bool(b) => Value::Bool(*b),
        Literal::Null => Value::Null,
    }
}
