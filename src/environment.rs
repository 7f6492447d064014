//! The scope stack names are resolved against.
//!
//! Resolution walks the frames from the innermost outwards and finally consults the
//! shared [`Prelude`]. User functions do not capture the scope they were defined in:
//! free names in a function body resolve against whatever frames are live when the
//! function is called.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::trace;

use crate::Value;
use crate::builtinops::Prelude;

/// One frame of bindings.
pub type Scope = HashMap<String, Value>;

#[derive(Debug, Clone)]
pub struct Environment {
    frames: Vec<Scope>,
    prelude: Arc<Prelude>,
}

impl Default for Environment {
    fn default() -> Self {
        Environment::new()
    }
}

impl Environment {
    /// A fresh environment with one empty root frame over the standard prelude.
    pub fn new() -> Self {
        Environment::with_prelude(Prelude::global())
    }

    pub fn with_prelude(prelude: Arc<Prelude>) -> Self {
        Environment {
            frames: vec![Scope::new()],
            prelude,
        }
    }

    pub fn prelude(&self) -> &Prelude {
        &self.prelude
    }

    pub fn push(&mut self, scope: Scope) {
        self.frames.push(scope);
        trace!(depth = self.frames.len(), "push scope");
    }

    pub fn push_empty(&mut self) {
        self.push(Scope::new());
    }

    pub fn pop(&mut self) -> Option<Scope> {
        let popped = self.frames.pop();
        trace!(depth = self.frames.len(), "pop scope");
        popped
    }

    /// Number of frames currently on the stack.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn resolve(&self, name: &str) -> Option<&Value> {
        self.frames
            .iter()
            .rev()
            .find_map(|frame| frame.get(name))
            .or_else(|| self.prelude.get(name))
    }

    /// Names bound in the frames (not the prelude), innermost binding first, sorted
    /// by name.
    pub fn bindings(&self) -> Vec<(&str, &Value)> {
        let mut seen: HashMap<&str, &Value> = HashMap::new();
        for frame in self.frames.iter().rev() {
            for (name, value) in frame {
                seen.entry(name.as_str()).or_insert(value);
            }
        }
        let mut bindings: Vec<_> = seen.into_iter().collect();
        bindings.sort_by(|a, b| a.0.cmp(b.0));
        bindings
    }

    /// Binds `name` in the innermost frame, replacing any binding already there.
    ///
    /// # Panics
    ///
    /// Panics if every frame has been popped. Evaluation always pops what it
    /// pushes, so this only happens when a host pops the root frame itself.
    pub fn bind(&mut self, name: impl Into<String>, value: Value) {
        match self.frames.last_mut() {
            Some(frame) => {
                frame.insert(name.into(), value);
            }
            None => panic!("bind on an empty scope stack"),
        }
    }

    /// Updates the innermost frame that already defines `name`, or binds it in the
    /// innermost frame if none does.
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        match self.frames.iter_mut().rev().find(|frame| frame.contains_key(&name)) {
            Some(frame) => {
                frame.insert(name, value);
            }
            None => self.bind(name, value),
        }
    }

    /// Runs `f` with `scope` pushed, popping it again however `f` returns.
    pub fn scoped<T>(&mut self, scope: Scope, f: impl FnOnce(&mut Environment) -> T) -> T {
        self.push(scope);
        let result = f(self);
        self.pop();
        result
    }
}
