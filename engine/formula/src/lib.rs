//! Embeddable expression-language engine.
//!
//! An [`Engine`] bundles a runtime-mutable grammar (which tokens parse as
//! operators and literals), operator implementations (what those tokens do),
//! a named host-function table, and the most recently parsed program. Each
//! engine is an independent configuration; nothing is shared through
//! process globals, so two engines can carry different operator sets side
//! by side.
//!
//! ```
//! use formula::{Engine, Environment, Value};
//!
//! let mut engine = Engine::new();
//! engine.parse("price * (1 + rate)")?;
//! let env = Environment::new()
//!     .with("price", Value::Number(100.0))
//!     .with("rate", Value::Number(0.2));
//! assert_eq!(engine.exec(&env)?, Value::Number(120.0));
//! # Ok::<(), formula::EngineError>(())
//! ```

use rustc_hash::FxHashMap;
use thiserror::Error;

pub use formula_ir::{Expr, ExprArena, ExprId, ExprKind, ExprRange, Literal, Program, Span};
pub use formula_parse::{
    parse, Grammar, ParseError, ParseErrorKind, CONTEXT_KEYWORD, MAX_DEPTH, NOT_AN_OPERATOR,
};
pub use formula_eval::{
    evaluate, execute, Callable, Environment, EvalError, EvalErrorKind, EvalResult, FnCtx, Heap,
    Operators, Resolution, Value, ALL_KEYWORD, THIS_BINDING,
};

pub use std::num::NonZeroU8;

/// Any failure surfaced by the engine facade.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum EngineError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Eval(#[from] EvalError),

    /// Evaluation was requested before any source was parsed.
    #[error("no program has been parsed")]
    NoProgram,
}

/// One self-contained expression engine.
pub struct Engine {
    grammar: Grammar,
    operators: Operators,
    functions: FxHashMap<String, Callable>,
    source: String,
    program: Option<Program>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    /// Engine with the default grammar and operator semantics.
    pub fn new() -> Self {
        Engine {
            grammar: Grammar::default(),
            operators: Operators::default_set(),
            functions: FxHashMap::default(),
            source: String::new(),
            program: None,
        }
    }

    /// Engine with an empty grammar and no operator implementations.
    pub fn empty() -> Self {
        Engine {
            grammar: Grammar::empty(),
            operators: Operators::empty(),
            functions: FxHashMap::default(),
            source: String::new(),
            program: None,
        }
    }

    // ===== Parsing =====

    /// Parse `source` with the current grammar, replacing any previously
    /// parsed program. Registered operators and functions are kept.
    pub fn parse(&mut self, source: &str) -> Result<&Program, ParseError> {
        let program = formula_parse::parse(&self.grammar, source)?;
        self.source = source.to_string();
        Ok(self.program.insert(program))
    }

    /// Source of the current program, empty if nothing was parsed.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The current program, if one was parsed.
    pub fn program(&self) -> Option<&Program> {
        self.program.as_ref()
    }

    // ===== Grammar registry =====

    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    /// Register a binary operator token at the given precedence. Does not
    /// install an implementation; pair with [`Engine::set_binary_impl`].
    pub fn register_binary(&mut self, op: impl Into<String>, precedence: NonZeroU8) {
        self.grammar.register_binary(op, precedence);
    }

    /// Register a prefix unary operator token.
    pub fn register_unary(&mut self, op: impl Into<String>) {
        self.grammar.register_unary(op);
    }

    /// Register a keyword literal.
    pub fn register_literal(&mut self, name: impl Into<String>, value: Literal) {
        self.grammar.register_literal(name, value);
    }

    /// Remove a binary operator token. Returns whether it was registered.
    pub fn remove_binary(&mut self, op: &str) -> bool {
        self.grammar.remove_binary(op)
    }

    /// Remove a unary operator token. Returns whether it was registered.
    pub fn remove_unary(&mut self, op: &str) -> bool {
        self.grammar.remove_unary(op)
    }

    /// Remove a keyword literal. Returns whether it was registered.
    pub fn remove_literal(&mut self, name: &str) -> bool {
        self.grammar.remove_literal(name)
    }

    // ===== Implementations =====

    /// Install (or replace) the implementation of a binary operator.
    pub fn set_binary_impl<F>(&mut self, op: impl Into<String>, f: F)
    where
        F: Fn(&Value, &Value) -> EvalResult + Send + Sync + 'static,
    {
        self.operators.set_binary(op, f);
    }

    /// Install (or replace) the implementation of a unary operator.
    pub fn set_unary_impl<F>(&mut self, op: impl Into<String>, f: F)
    where
        F: Fn(&Value) -> EvalResult + Send + Sync + 'static,
    {
        self.operators.set_unary(op, f);
    }

    /// Install (or replace) a named host function. Named functions shadow
    /// environment bindings at call sites in strict evaluation.
    pub fn set_function<F>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(&FnCtx, &[Value]) -> EvalResult + Send + Sync + 'static,
    {
        self.functions.insert(name.into(), std::sync::Arc::new(f));
    }

    /// Remove a named host function. Returns whether it existed.
    pub fn remove_function(&mut self, name: &str) -> bool {
        self.functions.remove(name).is_some()
    }

    pub fn operators(&self) -> &Operators {
        &self.operators
    }

    // ===== Evaluation =====

    /// Evaluate the current program fail-soft.
    pub fn evaluate(&self, env: &Environment) -> Result<Resolution, EngineError> {
        let program = self.program.as_ref().ok_or(EngineError::NoProgram)?;
        Ok(formula_eval::evaluate(program, &self.operators, env))
    }

    /// Evaluate the current program fail-loud.
    pub fn exec(&self, env: &Environment) -> Result<Value, EngineError> {
        let program = self.program.as_ref().ok_or(EngineError::NoProgram)?;
        Ok(formula_eval::execute(
            program,
            &self.operators,
            &self.functions,
            env,
        )?)
    }

    /// Parse and evaluate in one step, fail-loud.
    pub fn eval(&mut self, source: &str, env: &Environment) -> Result<Value, EngineError> {
        self.parse(source)?;
        self.exec(env)
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("source", &self.source)
            .field("parsed", &self.program.is_some())
            .field("functions", &self.functions.len())
            .finish_non_exhaustive()
    }
}

/// Parse and fail-soft evaluate with the default grammar and operators.
pub fn eval_string(source: &str, env: &Environment) -> Result<Resolution, ParseError> {
    let program = formula_parse::parse(&Grammar::default(), source)?;
    Ok(formula_eval::evaluate(
        &program,
        &Operators::default_set(),
        env,
    ))
}
