//! API to control the interpreter.

use std::io::prelude::*;

use thiserror::Error;
use tracing::debug;

use crate::ast::Stmt;
use crate::config::Config;
use crate::diag::Diagnostics;
use crate::eval::{Evaluator, RuntimeError};
use crate::parser::Parser;
use crate::scanner::{Scanner, ScannerError};
use crate::value::Value;

/// Tree-walk interpreter.
///
/// Bindings persist from one call to [`Interpreter::eval`] to the next.
///
/// # Example
///
/// ```
/// # use manascript::interpreter::{Interpreter, ManaError};
///
/// let mut output: Vec<u8> = Vec::new();
/// let mut interp = Interpreter::new(&mut output);
///
/// interp.eval("var label = \"age: \";".as_bytes())?;
/// interp.eval("print(label + 42);".as_bytes())?;
/// interp.eval("print 6 * 7;".as_bytes())?;
///
/// assert_eq!(output, b"age: 42\n42\n");
/// # Ok::<(), ManaError>(())
/// ```
#[derive(Debug)]
pub struct Interpreter<'t, W: Write> {
    config: Config,
    evaluator: Evaluator<'t, W>,
}

/// Errors the interpreter can raise.
#[derive(Debug, Error)]
pub enum ManaError {
    /// The input could not be read.
    #[error(transparent)]
    Read(#[from] ScannerError),

    /// Lexical or syntax errors.  Nothing was evaluated.
    #[error("{0}")]
    Syntax(Diagnostics),

    /// Error occurring during evaluation.
    #[error("runtime error: {0}")]
    Runtime(#[from] RuntimeError),
}

impl<'t, W: Write> Interpreter<'t, W> {
    pub fn new(output: &'t mut W) -> Interpreter<'t, W> {
        Interpreter::with_config(output, Config::default())
    }

    pub fn with_config(output: &'t mut W, config: Config) -> Interpreter<'t, W> {
        let evaluator = Evaluator::new(output, &config);
        Interpreter { config, evaluator }
    }

    /// Name reported in diagnostics for subsequent inputs.
    pub fn set_file_name(&mut self, file_name: impl Into<String>) {
        self.config.file_name = file_name.into();
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Scan and parse `input`.  Lexical and syntax errors do not fail: they are returned
    /// alongside whatever statements could be built.
    pub fn parse<R: BufRead>(&self, input: R) -> Result<(Vec<Stmt>, Diagnostics), ManaError> {
        let file_name = self.config.file_name.as_str();
        let (tokens, mut diagnostics, lines) =
            Scanner::new(input, file_name).scan_with_lines()?;
        let (prg, syntax_diagnostics) = Parser::new(tokens, file_name)
            .with_source_lines(lines)
            .parse_program();
        diagnostics.extend(syntax_diagnostics);
        debug!(
            file = file_name,
            statements = prg.len(),
            diagnostics = diagnostics.len(),
            "parsed"
        );
        Ok((prg, diagnostics))
    }

    /// Execute already parsed statements.
    pub fn interpret(&mut self, prg: &[Stmt]) -> Result<(), RuntimeError> {
        self.evaluator.interpret(prg)
    }

    /// Parse then execute `input`.  Nothing is executed if any error is reported while parsing.
    pub fn eval<R: BufRead>(&mut self, input: R) -> Result<(), ManaError> {
        let (prg, diagnostics) = self.parse(input)?;
        if diagnostics.has_errors() {
            return Err(ManaError::Syntax(diagnostics));
        }
        self.interpret(&prg)?;
        Ok(())
    }

    /// Value of the last expression statement or variable declaration executed.
    pub fn last_value(&self) -> &Value {
        self.evaluator.last_value()
    }
}
