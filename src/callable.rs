//! Function values and the argument binder.
//!
//! Three kinds of callable share one calling convention:
//!
//! * [`UserFunction`]: defined in the language; parameters are bound in a fresh
//!   frame and the body is evaluated with dynamic scoping.
//! * [`NativeFunction`]: a Rust handler receiving evaluated arguments by name.
//! * [`Macro`]: a Rust handler receiving the unevaluated argument nodes, so it can
//!   decide whether and when to evaluate them.
//!
//! Native functions and macros declare required, optional and vararg parameter
//! names through a [`Signature`], which binds positional or keyword arguments.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::trace;

use crate::ast::{CallArgs, Node};
use crate::environment::{Environment, Scope};
use crate::evaluator::eval;
use crate::{EvalError, Value};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Signature {
    pub required: Vec<String>,
    pub optional: Vec<String>,
    pub vararg: Option<String>,
}

/// Arguments bound to parameter names, plus any variadic tail.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundArgs<T> {
    named: HashMap<String, T>,
    rest: Vec<T>,
}

impl<T> BoundArgs<T> {
    /// A bound argument; optional parameters that were not supplied are `None`.
    pub fn get(&self, name: &str) -> Option<&T> {
        self.named.get(name)
    }

    /// A parameter the signature declared as required.
    pub fn required(&self, name: &str) -> Result<&T, EvalError> {
        self.named
            .get(name)
            .ok_or_else(|| EvalError::MissingKeywordArgument(name.to_string()))
    }

    /// Arguments collected by the vararg parameter.
    pub fn rest(&self) -> &[T] {
        &self.rest
    }
}

impl Signature {
    /// Required names take arguments first, then optional names, then the vararg
    /// collects the remainder.
    pub fn bind_positional<T>(&self, args: Vec<T>) -> Result<BoundArgs<T>, EvalError> {
        if args.len() < self.required.len() {
            return Err(EvalError::TooFewArguments(self.required[args.len()..].to_vec()));
        }
        let mut names = self.required.iter().chain(&self.optional);
        let mut bound = BoundArgs {
            named: HashMap::new(),
            rest: Vec::new(),
        };
        for arg in args {
            match names.next() {
                Some(name) => {
                    bound.named.insert(name.clone(), arg);
                }
                None if self.vararg.is_some() => bound.rest.push(arg),
                None => return Err(EvalError::TooManyArguments),
            }
        }
        Ok(bound)
    }

    /// Every required name must be supplied; optional names are bound when present.
    /// A keyword naming the vararg contributes a single variadic argument. Other
    /// keywords are ignored.
    pub fn bind_keyword<T>(&self, args: Vec<(String, T)>) -> Result<BoundArgs<T>, EvalError> {
        let mut supplied: HashMap<String, T> = args.into_iter().collect();
        let mut bound = BoundArgs {
            named: HashMap::new(),
            rest: Vec::new(),
        };
        for name in &self.required {
            let arg = supplied
                .remove(name)
                .ok_or_else(|| EvalError::MissingKeywordArgument(name.clone()))?;
            bound.named.insert(name.clone(), arg);
        }
        for name in &self.optional {
            if let Some(arg) = supplied.remove(name) {
                bound.named.insert(name.clone(), arg);
            }
        }
        if let Some(arg) = self.vararg.as_ref().and_then(|name| supplied.remove(name)) {
            bound.rest.push(arg);
        }
        Ok(bound)
    }

    fn bind<'n>(&self, args: &'n CallArgs) -> Result<BoundArgs<&'n Node>, EvalError> {
        match args {
            CallArgs::Positional(nodes) => self.bind_positional(nodes.iter().collect()),
            CallArgs::Keyword(pairs) => {
                self.bind_keyword(pairs.iter().map(|(name, node)| (name.clone(), node)).collect())
            }
        }
    }
}

pub type NativeArgs = BoundArgs<Value>;
pub type NativeHandler = fn(&NativeArgs, &mut Environment) -> Result<Value, EvalError>;

pub type MacroArgs<'n> = BoundArgs<&'n Node>;
pub type MacroHandler = for<'n> fn(&MacroArgs<'n>, &mut Environment) -> Result<Value, EvalError>;

macro_rules! signature_builder {
    ($ty:ident, $handler:ty) => {
        impl $ty {
            pub fn new(handler: $handler) -> Self {
                $ty {
                    handler,
                    signature: Signature::default(),
                    help: String::new(),
                }
            }

            pub fn required<const N: usize>(mut self, names: [&str; N]) -> Self {
                self.signature.required.extend(names.map(str::to_string));
                self
            }

            pub fn optional<const N: usize>(mut self, names: [&str; N]) -> Self {
                self.signature.optional.extend(names.map(str::to_string));
                self
            }

            pub fn vararg(mut self, name: &str) -> Self {
                self.signature.vararg = Some(name.to_string());
                self
            }

            pub fn help(mut self, text: &str) -> Self {
                self.help = text.to_string();
                self
            }

            pub fn signature(&self) -> &Signature {
                &self.signature
            }
        }
    };
}

pub struct NativeFunction {
    handler: NativeHandler,
    signature: Signature,
    help: String,
}

signature_builder!(NativeFunction, NativeHandler);

pub struct Macro {
    handler: MacroHandler,
    signature: Signature,
    help: String,
}

signature_builder!(Macro, MacroHandler);

/// A function defined in the language. It closes over nothing: free names in the
/// body resolve in the caller's environment.
#[derive(Debug, PartialEq)]
pub struct UserFunction {
    pub params: Vec<String>,
    pub body: Arc<Node>,
}

#[derive(Clone)]
pub enum Callable {
    User(Arc<UserFunction>),
    Native(Arc<NativeFunction>),
    Macro(Arc<Macro>),
}

impl Callable {
    pub fn help(&self) -> Option<&str> {
        match self {
            Callable::User(_) => None,
            Callable::Native(f) => Some(&f.help),
            Callable::Macro(m) => Some(&m.help),
        }
    }

    /// Calls with argument nodes from a call site, evaluating them as the callable
    /// requires.
    pub fn call(&self, args: &CallArgs, env: &mut Environment) -> Result<Value, EvalError> {
        trace!(callee = %self, args = args.len(), "call");
        match self {
            Callable::Macro(m) => {
                let bound = m.signature.bind(args)?;
                (m.handler)(&bound, env)
            }
            Callable::Native(f) => {
                let bound = match args {
                    CallArgs::Positional(nodes) => f.signature.bind_positional(eval_all(nodes, env)?)?,
                    CallArgs::Keyword(pairs) => {
                        let mut values = Vec::with_capacity(pairs.len());
                        for (name, node) in pairs {
                            values.push((name.clone(), eval(node, env)?));
                        }
                        f.signature.bind_keyword(values)?
                    }
                };
                (f.handler)(&bound, env)
            }
            Callable::User(f) => {
                check_arity(&f.params, args.len())?;
                let scope: Scope = match args {
                    CallArgs::Positional(nodes) => f.params.iter().cloned().zip(eval_all(nodes, env)?).collect(),
                    CallArgs::Keyword(pairs) => {
                        let mut supplied = HashMap::new();
                        for (name, node) in pairs {
                            supplied.insert(name.as_str(), eval(node, env)?);
                        }
                        f.params
                            .iter()
                            .map(|param| (param.clone(), supplied.remove(param.as_str()).unwrap_or(Value::Null)))
                            .collect()
                    }
                };
                env.scoped(scope, |env| eval(&f.body, env))
            }
        }
    }

    /// Calls with already evaluated positional arguments, as builtins taking a
    /// function argument do.
    pub fn call_with_values(&self, args: Vec<Value>, env: &mut Environment) -> Result<Value, EvalError> {
        match self {
            Callable::Native(f) => {
                let bound = f.signature.bind_positional(args)?;
                (f.handler)(&bound, env)
            }
            Callable::User(f) => {
                check_arity(&f.params, args.len())?;
                let scope: Scope = f.params.iter().cloned().zip(args).collect();
                env.scoped(scope, |env| eval(&f.body, env))
            }
            Callable::Macro(_) => Err(EvalError::type_mismatch("function")),
        }
    }
}

fn check_arity(params: &[String], supplied: usize) -> Result<(), EvalError> {
    match supplied.cmp(&params.len()) {
        std::cmp::Ordering::Less => Err(EvalError::TooFewArguments(params[supplied..].to_vec())),
        std::cmp::Ordering::Greater => Err(EvalError::TooManyArguments),
        std::cmp::Ordering::Equal => Ok(()),
    }
}

fn eval_all(nodes: &[Node], env: &mut Environment) -> Result<Vec<Value>, EvalError> {
    nodes.iter().map(|node| eval(node, env)).collect()
}

/// Callables are equal only when they are the same function value.
impl PartialEq for Callable {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Callable::User(a), Callable::User(b)) => Arc::ptr_eq(a, b),
            (Callable::Native(a), Callable::Native(b)) => Arc::ptr_eq(a, b),
            (Callable::Macro(a), Callable::Macro(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Callable::User(func) => write!(f, "function({})", func.params.join(", ")),
            Callable::Native(_) => write!(f, "<native function>"),
            Callable::Macro(_) => write!(f, "<macro>"),
        }
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Callable::User(func) => f.debug_tuple("User").field(&func.params).finish(),
            Callable::Native(func) => f.debug_tuple("Native").field(&func.signature).finish(),
            Callable::Macro(func) => f.debug_tuple("Macro").field(&func.signature).finish(),
        }
    }
}

impl From<NativeFunction> for Value {
    fn from(function: NativeFunction) -> Self {
        Value::Function(Callable::Native(Arc::new(function)))
    }
}

impl From<Macro> for Value {
    fn from(function: Macro) -> Self {
        Value::Function(Callable::Macro(Arc::new(function)))
    }
}

impl From<UserFunction> for Value {
    fn from(function: UserFunction) -> Self {
        Value::Function(Callable::User(Arc::new(function)))
    }
}
