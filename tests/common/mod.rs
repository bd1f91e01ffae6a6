#![allow(dead_code)]

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use zinc::session::{RunError, Session};

/// In-memory writer whose contents stay readable after the interpreter that
/// owns a clone of it has been moved or dropped.
#[derive(Clone, Default)]
pub struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// A session over a fresh buffer.
pub fn session() -> (Session, SharedBuffer) {
    let out = SharedBuffer::new();
    (Session::with_output(out.clone()), out)
}

/// Run `source` in a fresh session, returning what it printed and how it
/// finished.
pub fn run_program(source: &str) -> (String, Result<(), RunError>) {
    let (mut session, out) = session();
    let result = session.run(source);
    (out.contents(), result)
}

/// Run `source` and return its output, panicking on any error.
pub fn output_of(source: &str) -> String {
    let (output, result) = run_program(source);
    if let Err(e) = result {
        panic!("program failed:\n{}\noutput so far:\n{}", e, output);
    }
    output
}

/// All diagnostics of a failed run, rendered one per line.
pub fn error_text(result: &Result<(), RunError>) -> String {
    match result {
        Ok(()) => panic!("expected the program to fail"),
        Err(e) => e.to_string(),
    }
}
