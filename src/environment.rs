use crate::error::{Result, ZincError};
use crate::token::Token;
use crate::value::{Callable, Value};
use log::debug;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Shared handle to a scope frame.  Closures and in‑progress block
/// activations hold these; a frame lives as long as its longest holder.
pub type EnvRef = Rc<RefCell<Environment>>;

/// One lexical scope frame: a name → value map plus the enclosing frame
/// (`None` for globals).  Frames only ever point outward, so the chain is
/// acyclic.  A function bound in the frame it captures is kept with a weak
/// link back (see [`Environment::define`]), so a local recursive function
/// does not keep its own frame alive.
#[derive(Debug, Default)]
pub struct Environment {
    values: HashMap<String, Value>,
    enclosing: Option<EnvRef>,
}

impl Environment {
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    pub fn with_enclosing(enclosing: EnvRef) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    /// Wrap into a shared handle.
    pub fn into_ref(self) -> EnvRef {
        Rc::new(RefCell::new(self))
    }

    /// Insert or overwrite `name` in *this* frame only.
    pub fn define(&mut self, name: &str, value: Value) {
        let value = self.stored(value);
        self.values.insert(name.to_string(), value);
    }

    /// Drop every binding in this frame.
    pub fn clear(&mut self) {
        self.values.clear();
    }

    /// Form of `value` kept in this frame.
    fn stored(&self, value: Value) -> Value {
        match &value {
            Value::Callable(Callable::Function(function)) if function.captures(self) => {
                Value::Callable(Callable::Function(Rc::new(function.downgrade())))
            }
            _ => value,
        }
    }

    /// Walk outward until a frame defines `name`.
    pub fn get(&self, name: &Token) -> Result<Value> {
        if let Some(value) = self.values.get(&name.lexeme) {
            Ok(loaded(value))
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get(name)
        } else {
            Err(ZincError::runtime(
                name,
                format!("Undefined variable '{}'.", name.lexeme),
            ))
        }
    }

    /// Walk outward and overwrite the first frame that defines `name`.
    pub fn assign(&mut self, name: &Token, value: Value) -> Result<()> {
        if self.values.contains_key(&name.lexeme) {
            let value = self.stored(value);
            self.values.insert(name.lexeme.clone(), value);
            Ok(())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign(name, value)
        } else {
            Err(ZincError::runtime(
                name,
                format!("Cannot assign to undefined variable '{}'.", name.lexeme),
            ))
        }
    }

    /// Lookup in this frame only.
    pub fn get_local(&self, name: &str) -> Option<Value> {
        self.values.get(name).map(loaded)
    }

    /// The frame `distance` hops outward from `env` (0 is `env` itself).
    pub fn ancestor(env: &EnvRef, distance: usize) -> Option<EnvRef> {
        let mut frame: EnvRef = Rc::clone(env);

        for _ in 0..distance {
            let next: EnvRef = frame.borrow().enclosing.clone()?;
            frame = next;
        }

        Some(frame)
    }

    /// Read `name` from exactly the frame `distance` hops outward.
    pub fn get_at(env: &EnvRef, distance: usize, name: &Token) -> Result<Value> {
        debug!("get_at '{}' distance {}", name.lexeme, distance);

        let frame: Option<EnvRef> = Self::ancestor(env, distance);

        frame
            .as_ref()
            .and_then(|frame| frame.borrow().get_local(&name.lexeme))
            .ok_or_else(|| {
                ZincError::runtime(name, format!("Undefined variable '{}'.", name.lexeme))
            })
    }

    /// Overwrite `name` in exactly the frame `distance` hops outward.
    pub fn assign_at(env: &EnvRef, distance: usize, name: &Token, value: Value) -> Result<()> {
        debug!("assign_at '{}' distance {}", name.lexeme, distance);

        let frame: EnvRef = Self::ancestor(env, distance).ok_or_else(|| {
            ZincError::runtime(
                name,
                format!("Cannot assign to undefined variable '{}'.", name.lexeme),
            )
        })?;

        frame.borrow_mut().define(&name.lexeme, value);

        Ok(())
    }
}

/// Form of a stored value handed out to the program.
fn loaded(value: &Value) -> Value {
    match value {
        Value::Callable(Callable::Function(function)) => match function.upgrade() {
            Some(function) => Value::Callable(Callable::Function(Rc::new(function))),
            None => value.clone(),
        },
        _ => value.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::FunctionDecl;
    use crate::token::TokenType;
    use crate::value::Function;

    fn ident(name: &str) -> Token {
        Token::new(TokenType::IDENTIFIER, name, 1)
    }

    #[test]
    fn test_define_get_assign() {
        let mut env = Environment::new();
        // getting a name without defining it is an error
        assert!(env.get(&ident("x")).is_err());
        assert!(env.assign(&ident("x"), Value::Number(1.0)).is_err());

        env.define("x", Value::Number(1.0));
        assert_eq!(env.get(&ident("x")).unwrap(), Value::Number(1.0));

        env.assign(&ident("x"), Value::Bool(true)).unwrap();
        assert_eq!(env.get(&ident("x")).unwrap(), Value::Bool(true));
    }

    #[test]
    fn test_assign_walks_outward() {
        let globals = Environment::new().into_ref();
        globals.borrow_mut().define("x", Value::Number(1.0));

        let inner = Environment::with_enclosing(Rc::clone(&globals)).into_ref();
        inner
            .borrow_mut()
            .assign(&ident("x"), Value::Number(2.0))
            .unwrap();

        assert_eq!(globals.borrow().get_local("x"), Some(Value::Number(2.0)));
        assert_eq!(inner.borrow().get_local("x"), None);
    }

    #[test]
    fn test_get_at_skips_shadowing_frames() {
        let outer = Environment::new().into_ref();
        outer.borrow_mut().define("a", Value::Number(1.0));

        let middle = Environment::with_enclosing(Rc::clone(&outer)).into_ref();
        middle.borrow_mut().define("a", Value::Number(2.0));

        let inner = Environment::with_enclosing(Rc::clone(&middle)).into_ref();

        assert_eq!(
            Environment::get_at(&inner, 2, &ident("a")).unwrap(),
            Value::Number(1.0)
        );
        assert_eq!(
            Environment::get_at(&inner, 1, &ident("a")).unwrap(),
            Value::Number(2.0)
        );
        // distance 0 looks at `inner` only, no outward search
        assert!(Environment::get_at(&inner, 0, &ident("a")).is_err());

        Environment::assign_at(&inner, 2, &ident("a"), Value::Number(9.0)).unwrap();
        assert_eq!(outer.borrow().get_local("a"), Some(Value::Number(9.0)));
        assert_eq!(middle.borrow().get_local("a"), Some(Value::Number(2.0)));
    }

    fn function_in(frame: &EnvRef) -> Value {
        let decl = FunctionDecl {
            name: ident("f"),
            params: Vec::new(),
            body: Vec::new(),
        };
        Value::Callable(Callable::Function(Rc::new(Function::new(
            Rc::new(decl),
            Rc::clone(frame),
        ))))
    }

    #[test]
    fn test_function_bound_in_own_frame_holds_it_weakly() {
        let frame = Environment::new().into_ref();
        frame.borrow_mut().define("f", function_in(&frame));
        assert_eq!(Rc::strong_count(&frame), 1);

        // reads hand out a strong copy
        let read = frame.borrow().get_local("f").unwrap();
        assert_eq!(Rc::strong_count(&frame), 2);
        assert_eq!(read, frame.borrow().get(&ident("f")).unwrap());
        drop(read);

        let weak = Rc::downgrade(&frame);
        drop(frame);
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn test_function_bound_elsewhere_holds_frame_strongly() {
        let outer = Environment::new().into_ref();
        let inner = Environment::with_enclosing(Rc::clone(&outer)).into_ref();

        outer.borrow_mut().define("g", function_in(&inner));
        let weak = Rc::downgrade(&inner);
        drop(inner);
        assert!(weak.upgrade().is_some());

        outer.borrow_mut().clear();
        assert!(weak.upgrade().is_none());
    }
}
