use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use crate::bindings::ScriptBindings;
use crate::comparison::type_name;
use crate::errors::{Result, ScriptError};

/// Trait for pluggable functions callable from script expressions.
pub trait Function: Send + Sync {
    fn name(&self) -> &'static str;
    fn arity(&self) -> std::ops::RangeInclusive<usize>;
    fn call(&self, args: &[Value], bindings: &ScriptBindings) -> Result<Value>;
}

/// Thread-safe function registry.
#[derive(Clone, Default)]
pub struct Registry {
    inner: Arc<HashMap<&'static str, Arc<dyn Function>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_builtins() -> Self {
        let mut reg = Self::new();
        reg.register(builtins::Lower);
        reg.register(builtins::Upper);
        reg.register(builtins::Length);
        reg.register(builtins::Contains);
        reg.register(builtins::StartsWith);
        reg.register(builtins::EndsWith);
        reg.register(builtins::IsNull);
        reg.register(builtins::Subst);
        reg
    }

    pub fn register<F: Function + 'static>(&mut self, f: F) {
        let map = Arc::make_mut(&mut self.inner);
        map.insert(f.name(), Arc::new(f));
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Function>> {
        self.inner.get(name).cloned()
    }

    /// Looks up `name`, checks arity and invokes it.
    pub fn call(&self, name: &str, args: &[Value], bindings: &ScriptBindings) -> Result<Value> {
        let f = self
            .get(name)
            .ok_or_else(|| ScriptError::Runtime(format!("unknown function `{name}`")))?;
        if !f.arity().contains(&args.len()) {
            return Err(ScriptError::Runtime(format!(
                "`{name}` takes {:?} arguments, got {}",
                f.arity(),
                args.len()
            )));
        }
        f.call(args, bindings)
    }
}

fn str_arg<'v>(fname: &str, args: &'v [Value], i: usize) -> Result<&'v str> {
    match args.get(i) {
        Some(Value::String(s)) => Ok(s),
        Some(other) => Err(ScriptError::Runtime(format!(
            "`{fname}` expects a string argument, got {}",
            type_name(other)
        ))),
        None => Err(ScriptError::Runtime(format!("`{fname}` is missing argument {i}"))),
    }
}

pub mod builtins {
    use super::*;
    use crate::substitutor::StrSubstitutor;

    pub struct Lower;
    impl Function for Lower {
        fn name(&self) -> &'static str { "lower" }
        fn arity(&self) -> std::ops::RangeInclusive<usize> { 1..=1 }
        fn call(&self, args: &[Value], _: &ScriptBindings) -> Result<Value> {
            Ok(match args.first().cloned().unwrap_or(Value::Null) {
                Value::String(t) => Value::String(t.to_lowercase()),
                other => other,
            })
        }
    }

    pub struct Upper;
    impl Function for Upper {
        fn name(&self) -> &'static str { "upper" }
        fn arity(&self) -> std::ops::RangeInclusive<usize> { 1..=1 }
        fn call(&self, args: &[Value], _: &ScriptBindings) -> Result<Value> {
            Ok(match args.first().cloned().unwrap_or(Value::Null) {
                Value::String(t) => Value::String(t.to_uppercase()),
                other => other,
            })
        }
    }

    pub struct Length;
    impl Function for Length {
        fn name(&self) -> &'static str { "length" }
        fn arity(&self) -> std::ops::RangeInclusive<usize> { 1..=1 }
        fn call(&self, args: &[Value], _: &ScriptBindings) -> Result<Value> {
            let len = match args.first() {
                Some(Value::Array(a)) => a.len(),
                Some(Value::Object(m)) => m.len(),
                Some(Value::String(s)) => s.chars().count(),
                _ => 0,
            };
            Ok(Value::from(len))
        }
    }

    pub struct Contains;
    impl Function for Contains {
        fn name(&self) -> &'static str { "contains" }
        fn arity(&self) -> std::ops::RangeInclusive<usize> { 2..=2 }
        fn call(&self, args: &[Value], _: &ScriptBindings) -> Result<Value> {
            Ok(Value::Bool(match &args[0] {
                Value::Array(items) => items.iter().any(|v| crate::comparison::values_equal(v, &args[1])),
                Value::Object(m) => m.contains_key(str_arg(self.name(), args, 1)?),
                Value::Null => false,
                _ => str_arg(self.name(), args, 0)?.contains(str_arg(self.name(), args, 1)?),
            }))
        }
    }

    pub struct StartsWith;
    impl Function for StartsWith {
        fn name(&self) -> &'static str { "starts_with" }
        fn arity(&self) -> std::ops::RangeInclusive<usize> { 2..=2 }
        fn call(&self, args: &[Value], _: &ScriptBindings) -> Result<Value> {
            let s = str_arg(self.name(), args, 0)?;
            Ok(Value::Bool(s.starts_with(str_arg(self.name(), args, 1)?)))
        }
    }

    pub struct EndsWith;
    impl Function for EndsWith {
        fn name(&self) -> &'static str { "ends_with" }
        fn arity(&self) -> std::ops::RangeInclusive<usize> { 2..=2 }
        fn call(&self, args: &[Value], _: &ScriptBindings) -> Result<Value> {
            let s = str_arg(self.name(), args, 0)?;
            Ok(Value::Bool(s.ends_with(str_arg(self.name(), args, 1)?)))
        }
    }

    pub struct IsNull;
    impl Function for IsNull {
        fn name(&self) -> &'static str { "is_null" }
        fn arity(&self) -> std::ops::RangeInclusive<usize> { 1..=1 }
        fn call(&self, args: &[Value], _: &ScriptBindings) -> Result<Value> {
            Ok(Value::Bool(args[0].is_null()))
        }
    }

    /// Runs the bound `substitutor` over a string.
    pub struct Subst;
    impl Function for Subst {
        fn name(&self) -> &'static str { "subst" }
        fn arity(&self) -> std::ops::RangeInclusive<usize> { 1..=1 }
        fn call(&self, args: &[Value], bindings: &ScriptBindings) -> Result<Value> {
            let text = str_arg(self.name(), args, 0)?;
            let subst = bindings
                .get("substitutor")
                .and_then(StrSubstitutor::from_value)
                .ok_or_else(|| ScriptError::Runtime("no substitutor is bound".into()))?;
            Ok(Value::String(subst.replace(text)))
        }
    }
}
