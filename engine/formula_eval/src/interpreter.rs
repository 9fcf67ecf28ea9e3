//! Fail-soft tree-walking interpreter.
//!
//! Evaluation over partially bound environments: anything that cannot be
//! resolved (an unbound name, a missing operator implementation, a failed
//! operation) degrades the affected subtree to [`Resolution::Unresolved`]
//! instead of erroring. Hosts use this to probe which formulas are
//! computable with the data they have so far.

use crate::environment::Environment;
use crate::operators::{apply_binary, apply_unary, Operators};
use crate::value::{FnCtx, Value};
use formula_ir::{ExprArena, ExprId, ExprKind, ExprRange, Literal, Program};
use tracing::trace;

/// Identifier with bracket-index meaning "the whole receiver".
pub const ALL_KEYWORD: &str = "ALL";

/// Outcome of fail-soft evaluation.
#[derive(Clone, Debug, PartialEq)]
pub enum Resolution {
    Resolved(Value),
    Unresolved,
}

impl Resolution {
    pub fn is_resolved(&self) -> bool {
        matches!(self, Resolution::Resolved(_))
    }

    /// The resolved value, if any.
    pub fn value(self) -> Option<Value> {
        match self {
            Resolution::Resolved(v) => Some(v),
            Resolution::Unresolved => None,
        }
    }
}

/// Unwrap a sub-resolution or propagate `Unresolved` out of the caller.
macro_rules! resolve {
    ($e:expr) => {
        match $e {
            Resolution::Resolved(v) => v,
            Resolution::Unresolved => return Resolution::Unresolved,
        }
    };
}

/// Evaluate a parsed program against an environment, fail-soft.
pub fn evaluate(program: &Program, ops: &Operators, env: &Environment) -> Resolution {
    Interpreter {
        arena: &program.arena,
        ops,
        env,
    }
    .eval(program.root)
}

struct Interpreter<'a> {
    arena: &'a ExprArena,
    ops: &'a Operators,
    env: &'a Environment,
}

impl Interpreter<'_> {
    fn eval(&self, id: ExprId) -> Resolution {
        let expr = self.arena.get(id);
        trace!(kind = ?std::mem::discriminant(&expr.kind), "eval");
        match &expr.kind {
            ExprKind::Literal(lit) => Resolution::Resolved(literal_value(lit)),
            ExprKind::Ident(name) => self.lookup(name),
            ExprKind::This => match self.env.this() {
                Some(v) => Resolution::Resolved(v.clone()),
                None => Resolution::Unresolved,
            },
            ExprKind::Array(items) => {
                let mut values = Vec::with_capacity(items.len());
                for item in self.arena.list(*items) {
                    values.push(resolve!(self.eval(*item)));
                }
                Resolution::Resolved(Value::array(values))
            }
            ExprKind::Unary { op, operand } => {
                let operand = resolve!(self.eval(*operand));
                soften(apply_unary(self.ops, op, &operand))
            }
            // `&&` and `||` evaluate both operands here; only resolution
            // failures short-circuit in this mode.
            ExprKind::Binary { op, left, right } | ExprKind::Logical { op, left, right } => {
                let left = resolve!(self.eval(*left));
                let right = resolve!(self.eval(*right));
                soften(apply_binary(self.ops, op, &left, &right))
            }
            ExprKind::Conditional {
                test,
                consequent,
                alternate,
            } => {
                let test = resolve!(self.eval(*test));
                if test.truthy() {
                    self.eval(*consequent)
                } else {
                    self.eval(*alternate)
                }
            }
            ExprKind::Field { receiver, field } => {
                let receiver = resolve!(self.eval(*receiver));
                field_access(&receiver, field)
            }
            ExprKind::Index { receiver, index } => {
                // `xs[ALL]` passes the receiver through unchanged.
                if let ExprKind::Ident(name) = &self.arena.get(*index).kind {
                    if name == ALL_KEYWORD && !self.env.contains(name) {
                        return self.eval(*receiver);
                    }
                }
                let receiver = resolve!(self.eval(*receiver));
                let index = resolve!(self.eval(*index));
                index_access(&receiver, &index)
            }
            ExprKind::Call { callee, args } => self.eval_call(*callee, *args),
            ExprKind::Compound(exprs) => {
                let mut last = Resolution::Unresolved;
                for expr in self.arena.list(*exprs) {
                    last = self.eval(*expr);
                }
                last
            }
        }
    }

    fn lookup(&self, name: &str) -> Resolution {
        match self.env.get(name) {
            Some(v) => Resolution::Resolved(v.clone()),
            None => Resolution::Unresolved,
        }
    }

    fn eval_call(&self, callee: ExprId, args: ExprRange) -> Resolution {
        // A field-access callee supplies its receiver to the function.
        let (target, ctx) = match &self.arena.get(callee).kind {
            ExprKind::Field { receiver, field } => {
                let receiver = resolve!(self.eval(*receiver));
                let target = resolve!(field_access(&receiver, field));
                (
                    target,
                    FnCtx {
                        receiver: Some(receiver),
                        piped: None,
                    },
                )
            }
            _ => (resolve!(self.eval(callee)), FnCtx::default()),
        };
        let Value::Function(f) = target else {
            return Resolution::Unresolved;
        };
        let mut arg_values = Vec::with_capacity(args.len());
        for arg in self.arena.list(args) {
            arg_values.push(resolve!(self.eval(*arg)));
        }
        soften(f(&ctx, &arg_values))
    }
}

/// Resolve a named field on a value.
///
/// Arrays broadcast the access over their elements; if any element is
/// missing the field the whole access is unresolved.
fn field_access(receiver: &Value, field: &str) -> Resolution {
    match receiver {
        Value::Object(fields) => match fields.get(field) {
            Some(v) => Resolution::Resolved(v.clone()),
            None => Resolution::Unresolved,
        },
        Value::Array(items) => {
            let mut projected = Vec::with_capacity(items.len());
            for item in items.iter() {
                projected.push(resolve!(field_access(item, field)));
            }
            Resolution::Resolved(Value::array(projected))
        }
        _ => Resolution::Unresolved,
    }
}

fn index_access(receiver: &Value, index: &Value) -> Resolution {
    match (receiver, index) {
        (Value::Array(items), Value::Number(n)) => {
            // Non-integral and NaN indices are a miss, never a truncation.
            if n.fract() != 0.0 {
                return Resolution::Unresolved;
            }
            let i = *n as i64;
            if i < 0 || i as usize >= items.len() {
                return Resolution::Unresolved;
            }
            Resolution::Resolved(items[i as usize].clone())
        }
        (Value::Object(fields), Value::Str(key)) => match fields.get(&**key) {
            Some(v) => Resolution::Resolved(v.clone()),
            None => Resolution::Unresolved,
        },
        _ => Resolution::Unresolved,
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

fn soften(result: Result<Value, crate::errors::EvalError>) -> Resolution {
    match result {
        Ok(v) => Resolution::Resolved(v),
        Err(err) => {
            trace!(%err, "degrading to unresolved");
            Resolution::Unresolved
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use formula_parse::Grammar;
    use pretty_assertions::assert_eq;
    use rustc_hash::FxHashMap;

    fn eval_src(source: &str, env: &Environment) -> Resolution {
        let program = formula_parse::parse(&Grammar::default(), source).unwrap();
        evaluate(&program, &Operators::default_set(), env)
    }

    fn resolved(source: &str, env: &Environment) -> Value {
        eval_src(source, env).value().unwrap()
    }

    fn obj(fields: &[(&str, Value)]) -> Value {
        Value::object(
            fields
                .iter()
                .map(|(k, v)| ((*k).to_string(), v.clone()))
                .collect::<FxHashMap<_, _>>(),
        )
    }

    #[test]
    fn arithmetic() {
        let env = Environment::new();
        assert_eq!(resolved("2 + 2 * 2", &env), Value::Number(6.0));
        assert_eq!(resolved("2 ^ 3", &env), Value::Number(8.0));
        assert_eq!(resolved("(2 + 2) * 2", &env), Value::Number(8.0));
    }

    #[test]
    fn unbound_identifier_is_unresolved() {
        let env = Environment::new().with("a", Value::Number(1.0));
        assert_eq!(resolved("a + 1", &env), Value::Number(2.0));
        assert_eq!(eval_src("b + 1", &env), Resolution::Unresolved);
        assert_eq!(eval_src("this", &env), Resolution::Unresolved);
    }

    #[test]
    fn logical_operators_evaluate_both_sides() {
        let env = Environment::new().with("a", Value::Bool(false));
        // `a` is false but the unbound right side still poisons the result.
        assert_eq!(eval_src("a && missing", &env), Resolution::Unresolved);
        assert_eq!(resolved("a || 1", &env), Value::Bool(true));
    }

    #[test]
    fn conditional_evaluates_one_branch() {
        let env = Environment::new().with("cold", Value::Bool(false));
        // The untaken branch is never evaluated, so its unbound name is fine.
        assert_eq!(resolved("cold ? missing : 7", &env), Value::Number(7.0));
        assert_eq!(eval_src("cold ? 7 : missing", &env), Resolution::Unresolved);
    }

    #[test]
    fn field_access_on_objects() {
        let env = Environment::new().with("foo", obj(&[("bar", Value::Number(3.0))]));
        assert_eq!(resolved("foo.bar", &env), Value::Number(3.0));
        assert_eq!(eval_src("foo.baz", &env), Resolution::Unresolved);
    }

    #[test]
    fn field_access_broadcasts_over_arrays() {
        let rows = Value::array(vec![
            obj(&[("x", Value::Number(1.0))]),
            obj(&[("x", Value::Number(2.0))]),
        ]);
        let env = Environment::new().with("rows", rows);
        assert_eq!(
            resolved("rows.x", &env),
            Value::array(vec![Value::Number(1.0), Value::Number(2.0)])
        );

        let ragged = Value::array(vec![
            obj(&[("x", Value::Number(1.0))]),
            obj(&[("y", Value::Number(2.0))]),
        ]);
        let env = Environment::new().with("rows", ragged);
        assert_eq!(eval_src("rows.x", &env), Resolution::Unresolved);
    }

    #[test]
    fn indexing() {
        let env = Environment::new()
            .with("xs", Value::array(vec![Value::Number(10.0), Value::Number(20.0)]))
            .with("m", obj(&[("k", Value::Bool(true))]));
        assert_eq!(resolved("xs[1]", &env), Value::Number(20.0));
        assert_eq!(eval_src("xs[5]", &env), Resolution::Unresolved);
        assert_eq!(eval_src("xs[-1]", &env), Resolution::Unresolved);
        assert_eq!(resolved("m['k']", &env), Value::Bool(true));
        assert_eq!(eval_src("m['nope']", &env), Resolution::Unresolved);
        assert_eq!(eval_src("xs['k']", &env), Resolution::Unresolved);
    }

    #[test]
    fn non_integral_index_is_a_miss() {
        let env = Environment::new()
            .with(
                "xs",
                Value::array(vec![Value::Number(10.0), Value::Number(20.0)]),
            )
            .with("nan", Value::Number(f64::NAN));
        assert_eq!(eval_src("xs[1.5]", &env), Resolution::Unresolved);
        assert_eq!(eval_src("xs[nan]", &env), Resolution::Unresolved);
        assert_eq!(resolved("xs[1.0]", &env), Value::Number(20.0));
    }

    #[test]
    fn all_index_passes_receiver_through() {
        let xs = Value::array(vec![Value::Number(1.0), Value::Number(2.0)]);
        let env = Environment::new().with("xs", xs.clone());
        assert_eq!(resolved("xs[ALL]", &env), xs);
        // A bound ALL is an ordinary identifier again.
        let env = env.with("ALL", Value::Number(0.0));
        assert_eq!(resolved("xs[ALL]", &env), Value::Number(1.0));
    }

    #[test]
    fn nested_member_chain() {
        let env = Environment::new().with(
            "foo",
            obj(&[("bar", obj(&[("baz", Value::string("deep"))]))]),
        );
        assert_eq!(resolved("foo.bar.baz", &env), Value::string("deep"));
    }

    #[test]
    fn calls_resolve_from_environment() {
        let env = Environment::new().with(
            "add",
            Value::function(|_, args| match args {
                [Value::Number(a), Value::Number(b)] => Ok(Value::Number(a + b)),
                _ => Err(crate::errors::EvalError::new("add wants two numbers")),
            }),
        );
        assert_eq!(resolved("add(2, 3)", &env), Value::Number(5.0));
        assert_eq!(eval_src("add(2, missing)", &env), Resolution::Unresolved);
        assert_eq!(eval_src("nope(2)", &env), Resolution::Unresolved);
        // Implementation errors degrade rather than escape.
        assert_eq!(eval_src("add('a', 'b')", &env), Resolution::Unresolved);
    }

    #[test]
    fn method_call_passes_receiver() {
        let counter = obj(&[
            ("n", Value::Number(41.0)),
            (
                "next",
                Value::function(|ctx, _| {
                    let Some(Value::Object(fields)) = &ctx.receiver else {
                        return Err(crate::errors::EvalError::new("no receiver"));
                    };
                    match fields.get("n") {
                        Some(Value::Number(n)) => Ok(Value::Number(n + 1.0)),
                        _ => Err(crate::errors::EvalError::new("no n")),
                    }
                }),
            ),
        ]);
        let env = Environment::new().with("counter", counter);
        assert_eq!(resolved("counter.next()", &env), Value::Number(42.0));
    }

    #[test]
    fn non_callable_target_is_unresolved() {
        let env = Environment::new().with("n", Value::Number(1.0));
        assert_eq!(eval_src("n(2)", &env), Resolution::Unresolved);
    }

    #[test]
    fn compound_yields_last() {
        let env = Environment::new().with("a", Value::Number(1.0));
        assert_eq!(resolved("a; a + 1, a + 2", &env), Value::Number(3.0));
        // Every expression is evaluated, only the last decides the result.
        assert_eq!(resolved("missing; 9", &env), Value::Number(9.0));
        assert_eq!(eval_src("9; missing", &env), Resolution::Unresolved);
    }

    #[test]
    fn type_mismatch_degrades() {
        let env = Environment::new();
        assert_eq!(eval_src("1 + 'x'", &env), Resolution::Unresolved);
        assert_eq!(eval_src("-'x'", &env), Resolution::Unresolved);
    }

    #[test]
    fn missing_operator_impl_degrades() {
        let program = formula_parse::parse(&Grammar::default(), "1 + 2").unwrap();
        let res = evaluate(&program, &Operators::empty(), &Environment::new());
        assert_eq!(res, Resolution::Unresolved);
    }
}
