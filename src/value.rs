//! Runtime values and the callable capability.
//!
//! `Value` is the tagged union every expression evaluates to. Callables come
//! in three flavours (natives, user functions with their captured frame, and
//! class constructors) that all answer to the same `arity` / `call` pair.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::ast::FunctionDecl;
use crate::environment::{EnvRef, Environment};
use crate::error::{Result, ZincError};
use crate::interpreter::Interpreter;
use crate::token::Token;

/// Signature of a built‑in.  Errors are plain messages; the interpreter
/// attaches the call site's line.
pub type NativeFn = fn(&mut Interpreter, &[Value]) -> std::result::Result<Value, String>;

#[derive(Debug, Clone)]
pub enum Value {
    /// Result of calls that produce nothing (`print`, `println`); never
    /// echoed by the single‑expression convenience.
    Void,
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Callable(Callable),
    Instance(Rc<Instance>),
}

impl Value {
    /// Only `null` and `false` are falsy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            _ => true,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Void, Value::Void) => true,
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Callable(a), Value::Callable(b)) => a.same(b),
            (Value::Instance(a), Value::Instance(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Void => write!(f, "void"),

            Value::Null => write!(f, "null"),

            Value::Bool(b) => write!(f, "{}", b),

            Value::Number(n) => {
                // Integral values print without a trailing ".0".
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    let mut buf = itoa::Buffer::new();
                    f.write_str(buf.format(*n as i64))
                } else {
                    write!(f, "{}", n)
                }
            }

            Value::String(s) => write!(f, "{}", s),

            Value::Callable(c) => write!(f, "{}", c),

            Value::Instance(i) => write!(f, "{} instance", i.class.name),
        }
    }
}

/// A built‑in function registered in the global frame.
pub struct NativeFunction {
    pub name: &'static str,
    pub arity: usize,
    pub func: NativeFn,
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeFunction")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish()
    }
}

/// A user function: its declaration plus the frame active where it was
/// declared.
pub struct Function {
    pub decl: Rc<FunctionDecl>,
    closure: Closure,
}

/// Link from a function to its captured frame.  The copy of a function
/// stored in the very frame it captures holds the frame weakly; every copy
/// read out of a frame holds it strongly again.
#[derive(Clone)]
enum Closure {
    Strong(EnvRef),
    Weak(Weak<RefCell<Environment>>),
}

impl Function {
    pub fn new(decl: Rc<FunctionDecl>, closure: EnvRef) -> Self {
        Function {
            decl,
            closure: Closure::Strong(closure),
        }
    }

    /// The captured frame, or `None` if it has already been dropped.
    pub fn closure(&self) -> Option<EnvRef> {
        match &self.closure {
            Closure::Strong(frame) => Some(Rc::clone(frame)),
            Closure::Weak(frame) => frame.upgrade(),
        }
    }

    /// Whether this copy holds `frame` strongly.
    pub(crate) fn captures(&self, frame: &Environment) -> bool {
        match &self.closure {
            Closure::Strong(captured) => {
                std::ptr::eq(captured.as_ptr() as *const Environment, frame)
            }
            Closure::Weak(_) => false,
        }
    }

    /// The same function holding its frame weakly.
    pub(crate) fn downgrade(&self) -> Function {
        let closure = match &self.closure {
            Closure::Strong(frame) => Closure::Weak(Rc::downgrade(frame)),
            weak => weak.clone(),
        };

        Function {
            decl: Rc::clone(&self.decl),
            closure,
        }
    }

    /// Strong form of a copy that holds its frame weakly.  `None` when this
    /// copy is already strong or the frame is gone.
    pub(crate) fn upgrade(&self) -> Option<Function> {
        match &self.closure {
            Closure::Strong(_) => None,
            Closure::Weak(frame) => frame
                .upgrade()
                .map(|frame| Function::new(Rc::clone(&self.decl), frame)),
        }
    }

    fn frame_ptr(&self) -> *const RefCell<Environment> {
        match &self.closure {
            Closure::Strong(frame) => Rc::as_ptr(frame),
            Closure::Weak(frame) => frame.as_ptr(),
        }
    }

    /// Two copies are the same function when they share a declaration and a
    /// captured frame.
    fn same(&self, other: &Function) -> bool {
        Rc::ptr_eq(&self.decl, &other.decl) && self.frame_ptr() == other.frame_ptr()
    }
}

impl fmt::Debug for Function {
    // The closure frame may contain this very function; don't recurse.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.decl.name.lexeme)
            .field("arity", &self.decl.params.len())
            .finish()
    }
}

/// Minimal class stub; calling it yields an empty [`Instance`].
#[derive(Debug)]
pub struct Class {
    pub name: String,
    pub methods: Vec<Rc<FunctionDecl>>,
}

#[derive(Debug)]
pub struct Instance {
    pub class: Rc<Class>,
}

#[derive(Debug, Clone)]
pub enum Callable {
    Native(Rc<NativeFunction>),
    Function(Rc<Function>),
    Class(Rc<Class>),
}

impl Callable {
    pub fn arity(&self) -> usize {
        match self {
            Callable::Native(native) => native.arity,
            Callable::Function(function) => function.decl.params.len(),
            Callable::Class(_) => 0,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Callable::Native(native) => native.name,
            Callable::Function(function) => &function.decl.name.lexeme,
            Callable::Class(class) => &class.name,
        }
    }

    /// Invoke with already‑evaluated arguments.  Arity has been checked by
    /// the caller; `paren` locates native failures.
    pub fn call(
        &self,
        interpreter: &mut Interpreter,
        paren: &Token,
        arguments: &[Value],
    ) -> Result<Value> {
        match self {
            Callable::Native(native) => {
                (native.func)(interpreter, arguments).map_err(|msg| ZincError::runtime(paren, msg))
            }

            Callable::Function(function) => interpreter.call_function(function, arguments),

            Callable::Class(class) => Ok(Value::Instance(Rc::new(Instance {
                class: Rc::clone(class),
            }))),
        }
    }

    /// Identity comparison.
    fn same(&self, other: &Callable) -> bool {
        match (self, other) {
            (Callable::Native(a), Callable::Native(b)) => Rc::ptr_eq(a, b),
            (Callable::Function(a), Callable::Function(b)) => a.same(b),
            (Callable::Class(a), Callable::Class(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Callable::Native(native) => write!(f, "<native fn {}>", native.name),
            Callable::Function(function) => write!(f, "<fn {}>", function.decl.name.lexeme),
            Callable::Class(class) => write!(f, "{}", class.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_display() {
        assert_eq!(Value::Number(2.0).to_string(), "2");
        assert_eq!(Value::Number(-7.0).to_string(), "-7");
        assert_eq!(Value::Number(0.25).to_string(), "0.25");
        assert_eq!(Value::Number(1.5e300).to_string(), format!("{}", 1.5e300));
    }

    #[test]
    fn test_truthiness() {
        assert!(!Value::Null.is_truthy());
        assert!(!Value::Bool(false).is_truthy());
        assert!(Value::Number(0.0).is_truthy());
        assert!(Value::String(String::new()).is_truthy());
        assert!(Value::Void.is_truthy());
    }

    #[test]
    fn test_equality_is_by_value_and_kind() {
        assert_eq!(Value::Number(1.0), Value::Number(1.0));
        assert_ne!(Value::Number(1.0), Value::String("1".into()));
        assert_eq!(Value::Null, Value::Null);
        assert_ne!(Value::Null, Value::Bool(false));
    }
}
