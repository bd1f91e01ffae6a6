//! One interpreter instance plus everything that must outlive a single
//! `run`: the global frame, the resolver's distance table and the id
//! generator feeding it.  The CLI drives scripts and the REPL through this.

use std::fmt;
use std::io::Write;

use log::{debug, info};

use crate::ast::IdGen;
use crate::error::ZincError;
use crate::interpreter::Interpreter;
use crate::parser::Parser;
use crate::resolver::Resolver;
use crate::scanner::scan_tokens;

/// Why a [`Session::run`] did not complete.
#[derive(Debug)]
pub enum RunError {
    /// Lex, parse or resolve diagnostics.  Nothing was executed.
    Static(Vec<ZincError>),

    /// Execution stopped at the first runtime error.
    Runtime(ZincError),
}

impl RunError {
    /// Process exit status conventionally used for this failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            RunError::Static(_) => 65,
            RunError::Runtime(_) => 70,
        }
    }

    pub fn errors(&self) -> &[ZincError] {
        match self {
            RunError::Static(errors) => errors,
            RunError::Runtime(error) => std::slice::from_ref(error),
        }
    }
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for error in self.errors() {
            if !first {
                writeln!(f)?;
            }
            write!(f, "{}", error)?;
            first = false;
        }
        Ok(())
    }
}

impl std::error::Error for RunError {}

pub struct Session {
    interpreter: Interpreter,
    ids: IdGen,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// A session printing program output to stdout.
    pub fn new() -> Self {
        Self::from_interpreter(Interpreter::new())
    }

    /// A session printing program output to `out`.
    pub fn with_output<W: Write + 'static>(out: W) -> Self {
        Self::from_interpreter(Interpreter::with_output(out))
    }

    fn from_interpreter(interpreter: Interpreter) -> Self {
        Session {
            interpreter,
            ids: IdGen::new(),
        }
    }

    pub fn interpreter(&self) -> &Interpreter {
        &self.interpreter
    }

    /// Scan, parse, resolve and execute `source`.  Globals defined by earlier
    /// runs stay visible.  A program with any static error is not executed.
    pub fn run(&mut self, source: &str) -> Result<(), RunError> {
        info!("Running {} bytes of source", source.len());

        let (tokens, mut errors) = scan_tokens(source);
        debug!("Scanned {} tokens", tokens.len());

        // Parse even after lex errors so one pass reports as much as possible.
        let statements = match Parser::new(&tokens, &mut self.ids).parse() {
            Ok(statements) => statements,
            Err(parse_errors) => {
                errors.extend(parse_errors);
                return Err(RunError::Static(errors));
            }
        };

        if !errors.is_empty() {
            return Err(RunError::Static(errors));
        }

        Resolver::new(&mut self.interpreter)
            .resolve(&statements)
            .map_err(RunError::Static)?;

        self.interpreter
            .interpret(&statements)
            .map_err(RunError::Runtime)
    }

    /// Forget every global and recorded binding; output goes to the same
    /// writer as before.
    pub fn reset(&mut self) {
        info!("Resetting session");
        self.interpreter.reset();
    }
}
