//! Native functions callable from scripts.

use std::collections::HashMap;
use std::fmt;
use std::io::prelude::*;

use crate::eval::RuntimeError;
use crate::value::Value;

/// Signature shared by all native functions.  They receive the program output and the already
/// evaluated arguments.
pub type NativeFn = fn(&mut dyn Write, &[Value]) -> Result<Value, RuntimeError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Fixed(usize),
    Variadic,
}

impl Arity {
    fn accepts(self, count: usize) -> bool {
        match self {
            Arity::Fixed(n) => n == count,
            Arity::Variadic => true,
        }
    }
}

#[derive(Clone, Copy)]
pub struct Builtin {
    name: &'static str,
    arity: Arity,
    body: NativeFn,
}

impl fmt::Debug for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Builtin")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish()
    }
}

impl Builtin {
    pub fn new(name: &'static str, arity: Arity, body: NativeFn) -> Builtin {
        Builtin { name, arity, body }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn call(&self, output: &mut dyn Write, args: &[Value]) -> Result<Value, RuntimeError> {
        if !self.arity.accepts(args.len()) {
            return Err(RuntimeError::BadNumberOfArguments {
                name: self.name.to_owned(),
                found: args.len(),
            });
        }
        (self.body)(output, args)
    }
}

/// Closed name-to-function registry consulted when evaluating calls.
#[derive(Debug, Default)]
pub struct Builtins(HashMap<&'static str, Builtin>);

impl Builtins {
    /// An empty registry.
    pub fn new() -> Builtins {
        Builtins(HashMap::new())
    }

    /// The registry scripts run with: `print` only.
    pub fn standard() -> Builtins {
        let mut builtins = Builtins::new();
        builtins.register(Builtin::new("print", Arity::Variadic, builtin_print));
        builtins
    }

    /// Add `builtin`, replacing any function with the same name.
    pub fn register(&mut self, builtin: Builtin) {
        self.0.insert(builtin.name, builtin);
    }

    pub fn get(&self, name: &str) -> Option<&Builtin> {
        self.0.get(name)
    }
}

/// Write each argument on its own line.
fn builtin_print(output: &mut dyn Write, args: &[Value]) -> Result<Value, RuntimeError> {
    for arg in args {
        writeln!(output, "{}", arg)?;
    }
    Ok(Value::Nil)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn print_writes_one_line_per_argument() -> Result<(), RuntimeError> {
        let mut out: Vec<u8> = Vec::new();
        let print = *Builtins::standard().get("print").expect("print is registered");
        let result = print.call(
            &mut out,
            &[Value::Int(1), Value::Float(2.5), Value::from("three"), Value::Nil],
        )?;
        assert_eq!(result, Value::Nil);
        assert_eq!(String::from_utf8(out).expect("utf8 output"), "1\n2.5\nthree\nnil\n");
        Ok(())
    }

    #[test]
    fn print_without_arguments_writes_nothing() -> Result<(), RuntimeError> {
        let mut out: Vec<u8> = Vec::new();
        let builtins = Builtins::standard();
        builtins.get("print").expect("print is registered").call(&mut out, &[])?;
        assert!(out.is_empty());
        Ok(())
    }

    #[test]
    fn fixed_arity_is_checked() {
        let mut out: Vec<u8> = Vec::new();
        let mut builtins = Builtins::new();
        builtins.register(Builtin::new("__test_answer__", Arity::Fixed(0), |_, _| {
            Ok(Value::Int(42))
        }));
        let answer = builtins.get("__test_answer__").expect("registered");
        assert_eq!(answer.name(), "__test_answer__");
        match answer.call(&mut out, &[Value::Nil]) {
            Err(RuntimeError::BadNumberOfArguments { name, found: 1 }) if name == "__test_answer__" => (),
            r => panic!("unexpected output: {:?}", r),
        }
        assert_eq!(answer.call(&mut out, &[]).ok(), Some(Value::Int(42)));
    }

    #[test]
    fn unknown_names_are_absent() {
        assert!(Builtins::standard().get("clock").is_none());
        assert!(Builtins::new().get("print").is_none());
    }
}
