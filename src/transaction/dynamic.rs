//! Runtime-checked call shapes.
//!
//! Typed transactions are shape-checked by the compiler. The dynamic entry
//! points accept work whose shape is only known at runtime: a boxed callable
//! with a declared arity, a `(module, function)` reference, or a plain value
//! passed where a callable was expected. All three are normalized to one
//! `Call` (a callable plus its argument list) before any lock is attempted.

use std::fmt;

use serde_json::Value;

use super::registry::FunctionRegistry;
use crate::error::{LockError, Shape, WorkError};

type BoxedWork = Box<dyn FnOnce(Vec<Value>) -> Result<Value, WorkError> + Send>;

/// A boxed callable that knows how many arguments it takes.
pub struct DynFn {
    arity: usize,
    work: BoxedWork,
}

impl DynFn {
    pub fn new<F>(arity: usize, f: F) -> Self
    where
        F: FnOnce(Vec<Value>) -> Result<Value, WorkError> + Send + 'static,
    {
        DynFn {
            arity,
            work: Box::new(f),
        }
    }

    /// A callable taking no arguments.
    pub fn nullary<F>(f: F) -> Self
    where
        F: FnOnce() -> Result<Value, WorkError> + Send + 'static,
    {
        DynFn::new(0, move |_| f())
    }

    pub fn arity(&self) -> usize {
        self.arity
    }
}

impl fmt::Debug for DynFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynFn").field("arity", &self.arity).finish()
    }
}

/// A `(module, function)` pair naming a registered function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionRef {
    pub module: String,
    pub function: String,
}

impl FunctionRef {
    pub fn new(module: impl Into<String>, function: impl Into<String>) -> Self {
        FunctionRef {
            module: module.into(),
            function: function.into(),
        }
    }
}

/// What a dynamic transaction was asked to run.
#[derive(Debug)]
pub enum Target {
    Callable(DynFn),
    Named(FunctionRef),
    /// Anything that is not callable. Always rejected; kept so the error can
    /// say what was passed instead.
    Value(Value),
}

impl From<DynFn> for Target {
    fn from(f: DynFn) -> Self {
        Target::Callable(f)
    }
}

impl From<FunctionRef> for Target {
    fn from(r: FunctionRef) -> Self {
        Target::Named(r)
    }
}

impl From<Value> for Target {
    fn from(v: Value) -> Self {
        Target::Value(v)
    }
}

/// A validated callable plus its argument list.
pub(crate) struct Call {
    work: BoxedWork,
    args: Vec<Value>,
}

impl Call {
    pub(crate) fn run(self) -> Result<Value, WorkError> {
        (self.work)(self.args)
    }
}

impl fmt::Debug for Call {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Call").field("args", &self.args).finish()
    }
}

/// Check `target`/`args` against the accepted shapes and resolve named
/// functions. Never touches the lock.
pub(crate) fn normalize(
    target: Target,
    args: Option<Value>,
    registry: &FunctionRegistry,
) -> Result<Call, LockError> {
    match (target, args) {
        (Target::Callable(f), None) => {
            if f.arity != 0 {
                return Err(LockError::invalid_shape(
                    Shape::Bare,
                    format!(
                        "the function takes {} argument(s) but no argument list was given; \
                         did you mean transaction(key, fun, [arg1, ..., arg{}])?",
                        f.arity, f.arity
                    ),
                ));
            }
            Ok(Call {
                work: f.work,
                args: Vec::new(),
            })
        }
        (Target::Value(v), None) => Err(LockError::invalid_shape(
            Shape::Bare,
            format!(
                "expected a zero-argument function, got {} {}; \
                 did you mean to wrap it in a function that returns it?",
                kind(&v),
                v
            ),
        )),
        (Target::Callable(f), Some(args)) => {
            let args = expect_list(Shape::CallableWithArgs, args)?;
            check_arity(Shape::CallableWithArgs, "the function", f.arity, args.len())?;
            Ok(Call { work: f.work, args })
        }
        (Target::Value(v), Some(_)) => Err(LockError::invalid_shape(
            Shape::CallableWithArgs,
            format!(
                "expected a function as the second argument, got {} {}; \
                 pass a callable, or a module and function name to call a registered function",
                kind(&v),
                v
            ),
        )),
        (Target::Named(r), None) => Err(LockError::invalid_shape(
            Shape::Named,
            format!(
                "{}::{} needs an argument list; did you mean transaction(key, {:?}, {:?}, [])?",
                r.module, r.function, r.module, r.function
            ),
        )),
        (Target::Named(r), Some(args)) => {
            if !is_module_path(&r.module) {
                return Err(LockError::invalid_shape(
                    Shape::Named,
                    format!("module name {:?} is not an identifier", r.module),
                ));
            }
            if !is_identifier(&r.function) {
                return Err(LockError::invalid_shape(
                    Shape::Named,
                    format!(
                        "function name {:?} is not an identifier; \
                         to run a closure, use transaction(key, fun, args) instead",
                        r.function
                    ),
                ));
            }
            let args = expect_list(Shape::Named, args)?;
            let registered = registry.resolve(&r.module, &r.function).ok_or_else(|| {
                LockError::UnknownFunction {
                    module: r.module.clone(),
                    function: r.function.clone(),
                }
            })?;
            let what = format!("{}::{}", r.module, r.function);
            check_arity(Shape::Named, &what, registered.arity, args.len())?;
            let function = registered.function;
            Ok(Call {
                work: Box::new(move |args| function(args)),
                args,
            })
        }
    }
}

fn expect_list(shape: Shape, args: Value) -> Result<Vec<Value>, LockError> {
    match args {
        Value::Array(args) => Ok(args),
        other => Err(LockError::invalid_shape(
            shape,
            format!(
                "arguments must be a list, got {} {}; \
                 did you mean to wrap a single value in a list, as in [{}]?",
                kind(&other),
                other,
                other
            ),
        )),
    }
}

fn check_arity(shape: Shape, what: &str, arity: usize, given: usize) -> Result<(), LockError> {
    if arity == given {
        return Ok(());
    }
    Err(LockError::invalid_shape(
        shape,
        format!(
            "{} takes {} argument(s) but the list has {}",
            what, arity, given
        ),
    ))
}

fn kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_')
}

fn is_module_path(s: &str) -> bool {
    s.split("::").all(is_identifier)
}
