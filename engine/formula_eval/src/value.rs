//! Dynamic values produced by evaluation.

use crate::errors::EvalError;
use rustc_hash::FxHashMap;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

/// Shared immutable heap allocation.
///
/// A transparent `Arc` wrapper so cloning a composite value is a refcount
/// bump, never a deep copy.
#[derive(Clone)]
pub struct Heap<T: ?Sized>(Arc<T>);

impl<T> Heap<T> {
    /// Move a value to the heap.
    pub fn new(value: T) -> Self {
        Heap(Arc::new(value))
    }
}

impl<T: ?Sized> Deref for Heap<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T: ?Sized + fmt::Debug> fmt::Debug for Heap<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl<T: ?Sized + PartialEq> PartialEq for Heap<T> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || *self.0 == *other.0
    }
}

/// Context passed to host functions at call time.
#[derive(Clone, Debug, Default)]
pub struct FnCtx {
    /// Receiver value for method-style calls (`obj.f()`).
    pub receiver: Option<Value>,
    /// Value threaded in by the `->` pipe operator, if any.
    pub piped: Option<Value>,
}

/// A host function callable from formulas.
pub type Callable = Arc<dyn Fn(&FnCtx, &[Value]) -> Result<Value, EvalError> + Send + Sync>;

/// A dynamically typed formula value.
#[derive(Clone)]
pub enum Value {
    Number(f64),
    Str(Heap<String>),
    Bool(bool),
    Null,
    Array(Heap<Vec<Value>>),
    Object(Heap<FxHashMap<String, Value>>),
    Function(Callable),
}

impl Value {
    /// Heap-allocate a string value.
    pub fn string(s: impl Into<String>) -> Self {
        Value::Str(Heap::new(s.into()))
    }

    /// Heap-allocate an array value.
    pub fn array(items: Vec<Value>) -> Self {
        Value::Array(Heap::new(items))
    }

    /// Heap-allocate an object value.
    pub fn object(fields: FxHashMap<String, Value>) -> Self {
        Value::Object(Heap::new(fields))
    }

    /// Wrap a host closure as a callable value.
    pub fn function<F>(f: F) -> Self
    where
        F: Fn(&FnCtx, &[Value]) -> Result<Value, EvalError> + Send + Sync + 'static,
    {
        Value::Function(Arc::new(f))
    }

    /// Name of the value's type, for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "number",
            Value::Str(_) => "string",
            Value::Bool(_) => "bool",
            Value::Null => "null",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
            Value::Function(_) => "function",
        }
    }

    /// Truthiness used by conditionals and the logical operators.
    ///
    /// `null` is false, numbers are false iff zero or NaN, strings iff
    /// empty; arrays, objects and functions are always true.
    pub fn truthy(&self) -> bool {
        match self {
            Value::Bool(b) => *b,
            Value::Null => false,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::Str(s) => !s.is_empty(),
            Value::Array(_) | Value::Object(_) | Value::Function(_) => true,
        }
    }

    /// Structural equality. Values of different types are never equal;
    /// numbers follow IEEE semantics (`NaN != NaN`); functions compare
    /// by identity.
    pub fn equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Null, Value::Null) => true,
            (Value::Array(a), Value::Array(b)) => {
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x.equals(y))
            }
            (Value::Object(a), Value::Object(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .all(|(k, v)| b.get(k).is_some_and(|w| v.equals(w)))
            }
            (Value::Function(a), Value::Function(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.equals(other)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{n:?}"),
            Value::Str(s) => write!(f, "{:?}", &**s),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Null => write!(f, "null"),
            Value::Array(items) => f.debug_list().entries(items.iter()).finish(),
            Value::Object(fields) => f.debug_map().entries(fields.iter()).finish(),
            Value::Function(_) => write!(f, "<function>"),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}
