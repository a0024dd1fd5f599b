use std::fmt;

use crate::token::Token;
use crate::value::Value;

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum Mutability {
    Var,
    Const,
}

#[derive(Debug, PartialEq, Clone)]
pub enum Stmt {
    Expr(Box<Expr>),
    VarDecl(Token, Option<Box<Expr>>, Mutability),
    Block(Vec<Stmt>),
    If(Box<Expr>, Box<Stmt>, Option<Box<Stmt>>),
    While(Box<Expr>, Box<Stmt>),
    Function(Token, Vec<Token>, Vec<Stmt>),
    /// Keyword token and optional value.
    Return(Token, Option<Box<Expr>>),
}

#[derive(Debug, PartialEq, Clone)]
pub enum Expr {
    Literal(Value),
    Unary(Token, Box<Expr>),
    Binary(Box<Expr>, Token, Box<Expr>),
    Group(Box<Expr>),
    Var(Token),
    Assign(Token, Box<Expr>),
    /// Callee, closing parenthesis and arguments.
    Call(Box<Expr>, Token, Vec<Expr>),
}

// Lisp-like rendering used by tests and `mana --dump-ast`.

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Literal(Value::Str(s)) => write!(f, "{:?}", s),
            Expr::Literal(Value::Float(n)) if n.fract() == 0.0 && n.is_finite() => {
                write!(f, "{:.1}", n)
            }
            Expr::Literal(v) => write!(f, "{}", v),
            Expr::Unary(op, right) => write!(f, "({} {})", op.lexeme, right),
            Expr::Binary(left, op, right) => write!(f, "({} {} {})", op.lexeme, left, right),
            Expr::Group(e) => write!(f, "(group {})", e),
            Expr::Var(name) => write!(f, "{}", name.lexeme),
            Expr::Assign(name, value) => write!(f, "(= {} {})", name.lexeme, value),
            Expr::Call(callee, _, args) => {
                write!(f, "(call {}", callee)?;
                for arg in args {
                    write!(f, " {}", arg)?;
                }
                write!(f, ")")
            }
        }
    }
}

impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stmt::Expr(e) => write!(f, "{};", e),
            Stmt::VarDecl(name, init, mutability) => {
                let keyword = match mutability {
                    Mutability::Var => "var",
                    Mutability::Const => "const",
                };
                match init {
                    Some(init) => write!(f, "({} {} {})", keyword, name.lexeme, init),
                    None => write!(f, "({} {})", keyword, name.lexeme),
                }
            }
            Stmt::Block(stmts) => {
                write!(f, "{{")?;
                for stmt in stmts {
                    write!(f, " {}", stmt)?;
                }
                write!(f, " }}")
            }
            Stmt::If(cond, then_branch, else_branch) => match else_branch {
                Some(else_branch) => write!(f, "(if {} {} {})", cond, then_branch, else_branch),
                None => write!(f, "(if {} {})", cond, then_branch),
            },
            Stmt::While(cond, body) => write!(f, "(while {} {})", cond, body),
            Stmt::Function(name, params, body) => {
                write!(f, "(function {} (", name.lexeme)?;
                for (i, p) in params.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", p.lexeme)?;
                }
                write!(f, ")")?;
                for stmt in body {
                    write!(f, " {}", stmt)?;
                }
                write!(f, ")")
            }
            Stmt::Return(_, Some(value)) => write!(f, "(return {})", value),
            Stmt::Return(_, None) => write!(f, "(return)"),
        }
    }
}
