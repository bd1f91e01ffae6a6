//! Tree‑walking evaluator.
//!
//! Statements execute to a [`Flow`] that tells the enclosing construct how to
//! continue: `Return` unwinds to the nearest function call, `Break` and
//! `Continue` to the nearest loop.  Runtime errors travel separately as the
//! `Err` side of [`Result`] and unwind to [`Interpreter::interpret`].

use std::collections::HashMap;
use std::io::{self, Write};
use std::mem;
use std::rc::Rc;

use chrono::Utc;
use log::{debug, info};

use crate::ast::{BinaryOp, ExprId, Expr, IncDecOp, LiteralValue, LogicalOp, Stmt, UnaryOp};
use crate::environment::{EnvRef, Environment};
use crate::error::{Result, ZincError};
use crate::stack::ensure_sufficient_stack;
use crate::token::{Token, TokenType};
use crate::value::{Callable, Class, Function, NativeFn, NativeFunction, Value};

/// Nested calls allowed before a call fails with "Stack overflow.".
pub const MAX_CALL_DEPTH: usize = 4096;

/// How a statement finished.
#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    Normal,
    Return(Value),
    Break,
    Continue,
}

pub struct Interpreter {
    globals: EnvRef,
    environment: EnvRef,
    /// Resolver‑computed scope distances; absent ⇒ global.
    locals: HashMap<ExprId, usize>,
    /// Calls currently in progress.
    call_depth: usize,
    out: Box<dyn Write>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Interpreter {
    // Frames reachable from a global binding may point back at the globals.
    fn drop(&mut self) {
        self.globals.borrow_mut().clear();
    }
}

impl Interpreter {
    /// Creates an interpreter writing program output to stdout.
    pub fn new() -> Self {
        Self::with_output(io::stdout())
    }

    /// Creates an interpreter writing program output to `out` and defines the
    /// native functions `clock`, `print` and `println`.
    pub fn with_output<W: Write + 'static>(out: W) -> Self {
        info!("Initializing Interpreter");

        let globals: EnvRef = global_frame();

        Self {
            environment: Rc::clone(&globals),
            globals,
            locals: HashMap::new(),
            call_depth: 0,
            out: Box::new(out),
        }
    }

    /// Drop every global binding and recorded distance, keeping the output
    /// writer.  Afterwards the interpreter behaves like a freshly built one.
    pub fn reset(&mut self) {
        info!("Resetting Interpreter");

        self.globals.borrow_mut().clear();
        self.globals = global_frame();
        self.environment = Rc::clone(&self.globals);
        self.locals.clear();
        self.call_depth = 0;
    }

    /// Record that the variable reference `id` binds `depth` frames out.
    pub fn note_local(&mut self, id: ExprId, depth: usize) {
        self.locals.insert(id, depth);
    }

    /// Scope distance recorded for `id`, if it is a local reference.
    pub fn local_depth(&self, id: ExprId) -> Option<usize> {
        self.locals.get(&id).copied()
    }

    /// Current value of a global binding.
    pub fn get_global(&self, name: &str) -> Option<Value> {
        self.globals.borrow().get_local(name)
    }

    /// Interprets a resolved program.  A program consisting of exactly one
    /// expression statement has its value echoed (unless it is `void`).
    pub fn interpret(&mut self, statements: &[Stmt]) -> Result<()> {
        debug!("Interpreting {} statements", statements.len());

        let result = self.run_program(statements);

        // Output must reach the writer even when the program failed midway.
        self.out.flush()?;

        if result.is_ok() {
            info!("Interpretation completed successfully");
        }

        result
    }

    fn run_program(&mut self, statements: &[Stmt]) -> Result<()> {
        if let [Stmt::Expression(expr)] = statements {
            let value = self.evaluate(expr)?;
            if !matches!(value, Value::Void) {
                writeln!(self.out, "{}", value)?;
            }
            return Ok(());
        }

        for stmt in statements {
            // Top-level break/continue/return are rejected statically.
            self.execute(stmt)?;
        }

        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Statements
    // ─────────────────────────────────────────────────────────────────────

    /// Executes a single statement.
    pub fn execute(&mut self, stmt: &Stmt) -> Result<Flow> {
        ensure_sufficient_stack(|| self.execute_stmt(stmt))
    }

    fn execute_stmt(&mut self, stmt: &Stmt) -> Result<Flow> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;
                Ok(Flow::Normal)
            }

            Stmt::Print(expr) => {
                let value = self.evaluate(expr)?;
                write!(self.out, "{}", value)?;
                Ok(Flow::Normal)
            }

            Stmt::Println(expr) => {
                let value = self.evaluate(expr)?;
                writeln!(self.out, "{}", value)?;
                Ok(Flow::Normal)
            }

            Stmt::Var { name, initializer } => {
                let value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Null,
                };
                debug!("Defining variable '{}' = {}", name.lexeme, value);
                self.environment.borrow_mut().define(&name.lexeme, value);
                Ok(Flow::Normal)
            }

            Stmt::Block(statements) => {
                let frame = Environment::with_enclosing(Rc::clone(&self.environment));
                self.execute_block(statements, frame.into_ref())
            }

            Stmt::If {
                condition,
                then_branch,
                elif_branches,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    return self.execute(then_branch);
                }

                for elif in elif_branches {
                    if self.evaluate(&elif.condition)?.is_truthy() {
                        return self.execute(&elif.branch);
                    }
                }

                match else_branch {
                    Some(stmt) => self.execute(stmt),
                    None => Ok(Flow::Normal),
                }
            }

            Stmt::While {
                condition,
                body,
                increment,
            } => {
                debug!("Entering while loop");

                while self.evaluate(condition)?.is_truthy() {
                    match self.execute(body)? {
                        Flow::Break => break,
                        Flow::Return(value) => return Ok(Flow::Return(value)),
                        Flow::Normal | Flow::Continue => {}
                    }

                    if let Some(increment) = increment {
                        self.evaluate(increment)?;
                    }
                }

                debug!("Exited while loop");
                Ok(Flow::Normal)
            }

            Stmt::Function(decl) => {
                debug!("Defining function '{}'", decl.name.lexeme);

                let function = Function::new(Rc::clone(decl), Rc::clone(&self.environment));
                self.environment.borrow_mut().define(
                    &decl.name.lexeme,
                    Value::Callable(Callable::Function(Rc::new(function))),
                );
                Ok(Flow::Normal)
            }

            Stmt::Class { name, methods } => {
                let class = Class {
                    name: name.lexeme.clone(),
                    methods: methods.clone(),
                };
                self.environment.borrow_mut().define(
                    &name.lexeme,
                    Value::Callable(Callable::Class(Rc::new(class))),
                );
                Ok(Flow::Normal)
            }

            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Null,
                };
                debug!("Returning value: {}", value);
                Ok(Flow::Return(value))
            }

            Stmt::Break { .. } => Ok(Flow::Break),

            Stmt::Continue { .. } => Ok(Flow::Continue),
        }
    }

    /// Runs `statements` with `frame` as the active environment, restoring
    /// the previous one on every exit path (normal, non‑local or error).
    pub fn execute_block(&mut self, statements: &[Stmt], frame: EnvRef) -> Result<Flow> {
        let previous: EnvRef = mem::replace(&mut self.environment, frame);

        let result = self.execute_sequence(statements);

        self.environment = previous;
        result
    }

    fn execute_sequence(&mut self, statements: &[Stmt]) -> Result<Flow> {
        for stmt in statements {
            match self.execute(stmt)? {
                Flow::Normal => {}
                other => return Ok(other),
            }
        }

        Ok(Flow::Normal)
    }

    /// Invoke a user function: a fresh frame parented at the *closure*,
    /// parameters bound positionally.
    pub fn call_function(&mut self, function: &Function, arguments: &[Value]) -> Result<Value> {
        debug!("Calling user-defined function '{}'", function.decl.name.lexeme);

        let closure: EnvRef = function.closure().ok_or_else(|| {
            ZincError::runtime(&function.decl.name, "Enclosing scope no longer exists.")
        })?;

        let mut frame = Environment::with_enclosing(closure);
        for (param, arg) in function.decl.params.iter().zip(arguments) {
            frame.define(&param.lexeme, arg.clone());
        }

        match self.execute_block(&function.decl.body, frame.into_ref())? {
            Flow::Return(value) => Ok(value),
            Flow::Normal | Flow::Break | Flow::Continue => Ok(Value::Null),
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Expressions
    // ─────────────────────────────────────────────────────────────────────

    /// Evaluates an expression and returns a Value.
    pub fn evaluate(&mut self, expr: &Expr) -> Result<Value> {
        ensure_sufficient_stack(|| self.evaluate_expr(expr))
    }

    fn evaluate_expr(&mut self, expr: &Expr) -> Result<Value> {
        match expr {
            Expr::Literal(literal) => Ok(match literal {
                LiteralValue::Number(n) => Value::Number(*n),
                LiteralValue::Str(s) => Value::String(s.clone()),
                LiteralValue::Bool(b) => Value::Bool(*b),
                LiteralValue::Null => Value::Null,
            }),

            Expr::Grouping(inner) => self.evaluate(inner),

            Expr::Unary {
                op,
                operator,
                right,
            } => {
                let right = self.evaluate(right)?;
                evaluate_unary(*op, operator, right)
            }

            Expr::Binary {
                left,
                op,
                operator,
                right,
            } => {
                let left = self.evaluate(left)?;
                let right = self.evaluate(right)?;
                evaluate_binary(*op, operator, left, right)
            }

            Expr::Logical {
                left, op, right, ..
            } => {
                let left = self.evaluate(left)?;

                let short_circuit = match op {
                    LogicalOp::Or => left.is_truthy(),
                    LogicalOp::And => !left.is_truthy(),
                };

                if short_circuit {
                    Ok(left)
                } else {
                    self.evaluate(right)
                }
            }

            Expr::Variable { id, name } => self.lookup_variable(*id, name),

            Expr::Assign { id, name, value } => {
                let value = self.evaluate(value)?;
                self.store_variable(*id, name, value.clone())?;
                Ok(value)
            }

            Expr::IncDec {
                id,
                name,
                op,
                operator,
                prefix,
            } => {
                let Value::Number(old) = self.lookup_variable(*id, name)? else {
                    return Err(ZincError::runtime(
                        operator,
                        format!("Operand for {} must be a number.", operator.lexeme),
                    ));
                };

                let new = match op {
                    IncDecOp::Increment => old + 1.0,
                    IncDecOp::Decrement => old - 1.0,
                };
                self.store_variable(*id, name, Value::Number(new))?;

                Ok(Value::Number(if *prefix { new } else { old }))
            }

            Expr::Call {
                callee,
                paren,
                arguments,
            } => {
                let callee = self.evaluate(callee)?;

                let mut values = Vec::with_capacity(arguments.len());
                for arg in arguments {
                    values.push(self.evaluate(arg)?);
                }

                self.call_value(&callee, paren, &values)
            }
        }
    }

    /// Call `callee` with evaluated arguments, checking callability and
    /// arity first.
    pub fn call_value(&mut self, callee: &Value, paren: &Token, arguments: &[Value]) -> Result<Value> {
        let Value::Callable(callable) = callee else {
            return Err(ZincError::runtime(
                paren,
                "Can only call functions and classes.",
            ));
        };

        if arguments.len() != callable.arity() {
            return Err(ZincError::runtime(
                paren,
                format!(
                    "Expected {} arguments but got {}.",
                    callable.arity(),
                    arguments.len()
                ),
            ));
        }

        if self.call_depth >= MAX_CALL_DEPTH {
            return Err(ZincError::runtime(paren, "Stack overflow."));
        }

        self.call_depth += 1;
        let result = callable.call(self, paren, arguments);
        self.call_depth -= 1;

        let result = result?;
        debug!("'{}' returned: {}", callable.name(), result);
        Ok(result)
    }

    /// Convenience for hosts: call a value with no source location.
    pub fn invoke(&mut self, callee: &Value, arguments: &[Value]) -> Result<Value> {
        let paren = Token::new(TokenType::RIGHT_PAREN, ")", 0);
        self.call_value(callee, &paren, arguments)
    }

    fn lookup_variable(&self, id: ExprId, name: &Token) -> Result<Value> {
        match self.locals.get(&id) {
            Some(&distance) => Environment::get_at(&self.environment, distance, name),
            None => self.globals.borrow().get(name),
        }
    }

    fn store_variable(&mut self, id: ExprId, name: &Token, value: Value) -> Result<()> {
        match self.locals.get(&id) {
            Some(&distance) => Environment::assign_at(&self.environment, distance, name, value),
            None => self.globals.borrow_mut().assign(name, value),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────
// Operators
// ─────────────────────────────────────────────────────────────────────────

fn evaluate_unary(op: UnaryOp, operator: &Token, right: Value) -> Result<Value> {
    match op {
        UnaryOp::Not => Ok(Value::Bool(!right.is_truthy())),

        UnaryOp::Negate => match right {
            Value::Number(n) => Ok(Value::Number(-n)),
            other => Err(ZincError::runtime(
                operator,
                format!(
                    "Operand must be a number for operator {}, got {}.",
                    operator.lexeme, other
                ),
            )),
        },

        UnaryOp::BitNot => match to_integer(&right) {
            Some(n) => Ok(Value::Number(!n as f64)),
            None => Err(ZincError::runtime(
                operator,
                format!(
                    "Operand must be an integer for operator {}, got {}.",
                    operator.lexeme, right
                ),
            )),
        },
    }
}

fn evaluate_binary(op: BinaryOp, operator: &Token, left: Value, right: Value) -> Result<Value> {
    debug!("Binary {:?}: {} , {}", op, left, right);

    match op {
        BinaryOp::Equal => Ok(Value::Bool(left == right)),
        BinaryOp::NotEqual => Ok(Value::Bool(left != right)),

        BinaryOp::Add => match (&left, &right) {
            (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
            (Value::String(a), _) => Ok(Value::String(format!("{}{}", a, right))),
            _ => Err(ZincError::runtime(
                operator,
                format!(
                    "Operator {} is not supported for {} and {}.",
                    operator.lexeme, left, right
                ),
            )),
        },

        BinaryOp::Subtract => numbers(operator, &left, &right).map(|(a, b)| Value::Number(a - b)),
        BinaryOp::Multiply => numbers(operator, &left, &right).map(|(a, b)| Value::Number(a * b)),
        BinaryOp::Divide => numbers(operator, &left, &right).map(|(a, b)| Value::Number(a / b)),
        BinaryOp::Modulo => numbers(operator, &left, &right).map(|(a, b)| Value::Number(a % b)),
        BinaryOp::Power => {
            numbers(operator, &left, &right).map(|(a, b)| Value::Number(a.powf(b)))
        }

        BinaryOp::Greater => numbers(operator, &left, &right).map(|(a, b)| Value::Bool(a > b)),
        BinaryOp::GreaterEqual => {
            numbers(operator, &left, &right).map(|(a, b)| Value::Bool(a >= b))
        }
        BinaryOp::Less => numbers(operator, &left, &right).map(|(a, b)| Value::Bool(a < b)),
        BinaryOp::LessEqual => numbers(operator, &left, &right).map(|(a, b)| Value::Bool(a <= b)),

        BinaryOp::BitOr => integers(operator, &left, &right).map(|(a, b)| Value::Number((a | b) as f64)),
        BinaryOp::BitXor => integers(operator, &left, &right).map(|(a, b)| Value::Number((a ^ b) as f64)),
        BinaryOp::BitAnd => integers(operator, &left, &right).map(|(a, b)| Value::Number((a & b) as f64)),

        BinaryOp::ShiftLeft => shift_operands(operator, &left, &right)
            .map(|(a, count)| Value::Number(a.wrapping_shl(count) as f64)),
        BinaryOp::ShiftRight => shift_operands(operator, &left, &right)
            .map(|(a, count)| Value::Number(a.wrapping_shr(count) as f64)),
    }
}

fn numbers(operator: &Token, left: &Value, right: &Value) -> Result<(f64, f64)> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok((*a, *b)),
        _ => Err(ZincError::runtime(
            operator,
            format!(
                "Operands must be numbers for operator {}, got {} and {}.",
                operator.lexeme, left, right
            ),
        )),
    }
}

/// A number with no fractional part that fits an `i64`.
fn to_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n)
            if n.is_finite()
                && n.fract() == 0.0
                && *n >= i64::MIN as f64
                && *n < i64::MAX as f64 =>
        {
            Some(*n as i64)
        }
        _ => None,
    }
}

fn integers(operator: &Token, left: &Value, right: &Value) -> Result<(i64, i64)> {
    match (to_integer(left), to_integer(right)) {
        (Some(a), Some(b)) => Ok((a, b)),
        _ => Err(ZincError::runtime(
            operator,
            format!(
                "Operands must be integers for operator {}, got {} and {}.",
                operator.lexeme, left, right
            ),
        )),
    }
}

/// Shift operands are 32‑bit; the count is masked to its low five bits.
fn shift_operands(operator: &Token, left: &Value, right: &Value) -> Result<(i32, u32)> {
    let (a, b) = integers(operator, left, right)?;

    match (i32::try_from(a), i32::try_from(b)) {
        (Ok(a), Ok(b)) => Ok((a, (b & 0x1f) as u32)),
        _ => Err(ZincError::runtime(
            operator,
            format!(
                "Operands must be integers for operator {}, got {} and {}.",
                operator.lexeme, left, right
            ),
        )),
    }
}

// ─────────────────────────────────────────────────────────────────────────
// Native functions
// ─────────────────────────────────────────────────────────────────────────

/// A global frame holding only the built‑ins.
fn global_frame() -> EnvRef {
    let globals: EnvRef = Environment::new().into_ref();

    let natives: [(&'static str, usize, NativeFn); 3] = [
        ("clock", 0, native_clock),
        ("print", 1, native_print),
        ("println", 1, native_println),
    ];

    for (name, arity, func) in natives {
        debug!("Defining native function '{}'", name);

        globals.borrow_mut().define(
            name,
            Value::Callable(Callable::Native(Rc::new(NativeFunction {
                name,
                arity,
                func,
            }))),
        );
    }

    globals
}

fn native_clock(_: &mut Interpreter, _: &[Value]) -> std::result::Result<Value, String> {
    let micros = Utc::now().timestamp_micros();
    Ok(Value::Number(micros as f64 / 1_000_000.0))
}

fn native_print(interpreter: &mut Interpreter, args: &[Value]) -> std::result::Result<Value, String> {
    write!(interpreter.out, "{}", args[0]).map_err(|e| e.to_string())?;
    Ok(Value::Void)
}

fn native_println(
    interpreter: &mut Interpreter,
    args: &[Value],
) -> std::result::Result<Value, String> {
    writeln!(interpreter.out, "{}", args[0]).map_err(|e| e.to_string())?;
    Ok(Value::Void)
}
