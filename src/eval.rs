//! Tree-walking evaluator.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::io;
use std::io::prelude::*;

use thiserror::Error;
use tracing::trace;

use crate::ast::{Expr, Mutability, Stmt};
use crate::builtins::Builtins;
use crate::config::Config;
use crate::token::{Token, TokenKind};
use crate::value::Value;

/// Errors aborting an interpretation run.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("unary minus on non-number: {0}")]
    UnaryMinus(&'static str),

    #[error("unary ! on non-bool: {0}")]
    UnaryNot(&'static str),

    #[error("invalid operands to '{op}': {left} and {right}")]
    InvalidOperands {
        op: String,
        left: &'static str,
        right: &'static str,
    },

    #[error("division by zero")]
    DivByZero,

    #[error("undefined variable '{0}'")]
    UndefinedVariable(String),

    #[error("only print() is supported as a built-in function")]
    NotCallable,

    #[error("invalid condition: expected bool or int, found {0}")]
    InvalidCondition(&'static str),

    #[error("cannot assign to constant '{0}'")]
    AssignToConstant(String),

    #[error("bad number of arguments to {name}(): {found}")]
    BadNumberOfArguments { name: String, found: usize },

    #[error("{0} is not supported yet")]
    Unsupported(&'static str),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug)]
pub struct Evaluator<'t, W: Write> {
    output: &'t mut W,
    env: Env,
    builtins: Builtins,
    last_value: Value,
    strict_assignment: bool,
}

impl<'t, W: Write> Evaluator<'t, W> {
    pub fn new(output: &'t mut W, config: &Config) -> Evaluator<'t, W> {
        Evaluator {
            output,
            env: Env::default(),
            builtins: Builtins::standard(),
            last_value: Value::Nil,
            strict_assignment: config.strict_assignment,
        }
    }

    /// Registry consulted when evaluating calls.  Exposed so embedders can add natives.
    pub fn builtins_mut(&mut self) -> &mut Builtins {
        &mut self.builtins
    }

    /// Value of the most recently evaluated expression statement or variable declaration.
    pub fn last_value(&self) -> &Value {
        &self.last_value
    }

    /// Current value bound to `name`, if any.
    pub fn lookup(&self, name: &str) -> Option<&Value> {
        self.env.get(name)
    }

    /// Execute `stmts` in order.  Bindings persist across calls.  The first error aborts the
    /// run, side effects of the statements executed so far are kept.
    pub fn interpret(&mut self, stmts: &[Stmt]) -> Result<(), RuntimeError> {
        for stmt in stmts {
            self.eval_stmt(stmt)?;
        }
        Ok(())
    }

    fn eval_stmt(&mut self, stmt: &Stmt) -> Result<(), RuntimeError> {
        trace!(%stmt, "executing");
        match stmt {
            Stmt::Expr(e) => {
                self.last_value = self.eval_expr(e)?;
            }
            Stmt::VarDecl(name, init, mutability) => {
                let value = match init {
                    Some(init) => self.eval_expr(init)?,
                    None => Value::Nil,
                };
                self.env.define(&name.lexeme, value.clone(), *mutability);
                self.last_value = value;
            }
            Stmt::Block(stmts) => self.interpret(stmts)?,
            Stmt::If(cond, then_branch, else_branch) => {
                if self.eval_condition(cond)? {
                    self.eval_stmt(then_branch)?;
                } else if let Some(else_branch) = else_branch {
                    self.eval_stmt(else_branch)?;
                }
            }
            Stmt::While(cond, body) => {
                while self.eval_condition(cond)? {
                    self.eval_stmt(body)?;
                }
            }
            Stmt::Function(..) => return Err(RuntimeError::Unsupported("function declaration")),
            Stmt::Return(..) => return Err(RuntimeError::Unsupported("return statement")),
        }
        Ok(())
    }

    fn eval_condition(&mut self, cond: &Expr) -> Result<bool, RuntimeError> {
        let value = self.eval_expr(cond)?;
        value
            .as_condition()
            .ok_or_else(|| RuntimeError::InvalidCondition(value.type_name()))
    }

    fn eval_expr(&mut self, expr: &Expr) -> Result<Value, RuntimeError> {
        match expr {
            Expr::Literal(v) => Ok(v.clone()),
            Expr::Group(e) => self.eval_expr(e),
            Expr::Var(name) => self
                .env
                .get(&name.lexeme)
                .cloned()
                .ok_or_else(|| RuntimeError::UndefinedVariable(name.lexeme.clone())),
            Expr::Assign(name, rhs) => {
                let value = self.eval_expr(rhs)?;
                self.env
                    .assign(&name.lexeme, value.clone(), self.strict_assignment)?;
                Ok(value)
            }
            Expr::Unary(op, operand) => match (op.kind, self.eval_expr(operand)?) {
                (TokenKind::Minus, Value::Int(n)) => Ok(Value::Int(n.wrapping_neg())),
                (TokenKind::Minus, Value::Float(n)) => Ok(Value::Float(-n)),
                (TokenKind::Minus, v) => Err(RuntimeError::UnaryMinus(v.type_name())),
                (_, Value::Bool(b)) => Ok(Value::Bool(!b)),
                (_, v) => Err(RuntimeError::UnaryNot(v.type_name())),
            },
            Expr::Binary(lhs, op, rhs) => match op.kind {
                // Short-circuit: the right operand is only evaluated when needed.
                TokenKind::And => {
                    Ok(Value::Bool(self.eval_condition(lhs)? && self.eval_condition(rhs)?))
                }
                TokenKind::Or => {
                    Ok(Value::Bool(self.eval_condition(lhs)? || self.eval_condition(rhs)?))
                }
                _ => {
                    let l = self.eval_expr(lhs)?;
                    let r = self.eval_expr(rhs)?;
                    binary(op, &l, &r)
                }
            },
            Expr::Call(callee, _, args) => {
                let builtin = match callee.as_ref() {
                    Expr::Var(name) => self.builtins.get(&name.lexeme).copied(),
                    _ => None,
                }
                .ok_or(RuntimeError::NotCallable)?;
                let args = args
                    .iter()
                    .map(|a| self.eval_expr(a))
                    .collect::<Result<Vec<Value>, RuntimeError>>()?;
                builtin.call(&mut *self.output, &args)
            }
        }
    }
}

fn binary(op: &Token, l: &Value, r: &Value) -> Result<Value, RuntimeError> {
    use TokenKind::*;

    match (op.kind, l, r) {
        (EqualEqual, _, _) => Ok(Value::Bool(l == r)),
        (BangEqual, _, _) => Ok(Value::Bool(l != r)),

        (Plus, Value::Int(a), Value::Int(b)) => Ok(Value::Int(a.wrapping_add(*b))),
        (Plus, Value::Float(a), Value::Float(b)) => Ok(Value::Float(a + b)),
        (Plus, Value::Str(a), Value::Str(b)) => Ok(Value::Str(format!("{}{}", a, b))),
        (Plus, Value::Str(a), Value::Int(b)) => Ok(Value::Str(format!("{}{}", a, b))),
        (Plus, Value::Int(a), Value::Str(b)) => Ok(Value::Str(format!("{}{}", a, b))),

        (Minus, Value::Int(a), Value::Int(b)) => Ok(Value::Int(a.wrapping_sub(*b))),
        (Minus, Value::Float(a), Value::Float(b)) => Ok(Value::Float(a - b)),

        (Star, Value::Int(a), Value::Int(b)) => Ok(Value::Int(a.wrapping_mul(*b))),
        (Star, Value::Float(a), Value::Float(b)) => Ok(Value::Float(a * b)),

        (Slash | Percent, Value::Int(_), Value::Int(0)) => Err(RuntimeError::DivByZero),
        (Slash | Percent, Value::Float(_), Value::Float(b)) if *b == 0.0 => {
            Err(RuntimeError::DivByZero)
        }
        (Slash, Value::Int(a), Value::Int(b)) => Ok(Value::Int(a.wrapping_div(*b))),
        (Slash, Value::Float(a), Value::Float(b)) => Ok(Value::Float(a / b)),
        (Percent, Value::Int(a), Value::Int(b)) => Ok(Value::Int(a.wrapping_rem(*b))),
        (Percent, Value::Float(a), Value::Float(b)) => Ok(Value::Float(a % b)),

        (Less | LessEqual | Greater | GreaterEqual, Value::Int(a), Value::Int(b)) => {
            Ok(Value::Bool(compare(op.kind, a, b)))
        }
        (Less | LessEqual | Greater | GreaterEqual, Value::Float(a), Value::Float(b)) => {
            Ok(Value::Bool(compare(op.kind, a, b)))
        }

        _ => Err(RuntimeError::InvalidOperands {
            op: op.lexeme.clone(),
            left: l.type_name(),
            right: r.type_name(),
        }),
    }
}

fn compare<T: PartialOrd>(kind: TokenKind, a: &T, b: &T) -> bool {
    match kind {
        TokenKind::Less => a < b,
        TokenKind::LessEqual => a <= b,
        TokenKind::Greater => a > b,
        _ => a >= b,
    }
}

#[derive(Debug)]
struct Binding {
    value: Value,
    mutability: Mutability,
}

/// Single flat namespace shared by all blocks.
#[derive(Debug, Default)]
struct Env {
    bindings: HashMap<String, Binding>,
}

impl Env {
    /// Bind `name`, overwriting any previous binding whatever its mutability.
    fn define(&mut self, name: &str, value: Value, mutability: Mutability) {
        self.bindings
            .insert(name.to_owned(), Binding { value, mutability });
    }

    /// Rebind an existing mutable `name`.  Unknown names are declared on the fly unless
    /// `strict` is set.
    fn assign(&mut self, name: &str, value: Value, strict: bool) -> Result<(), RuntimeError> {
        match self.bindings.entry(name.to_owned()) {
            Entry::Occupied(mut e) => {
                if e.get().mutability == Mutability::Const {
                    return Err(RuntimeError::AssignToConstant(name.to_owned()));
                }
                e.get_mut().value = value;
            }
            Entry::Vacant(e) => {
                if strict {
                    return Err(RuntimeError::UndefinedVariable(name.to_owned()));
                }
                e.insert(Binding {
                    value,
                    mutability: Mutability::Var,
                });
            }
        }
        Ok(())
    }

    fn get(&self, name: &str) -> Option<&Value> {
        self.bindings.get(name).map(|b| &b.value)
    }
}
