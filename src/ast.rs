//! **Abstract syntax tree** for Zinc programs.
//!
//! Nodes are immutable once the parser has built them and are exclusively
//! owned by their parent (a tree, no cycles). The one exception is the body of
//! a function declaration, which sits behind an `Rc` so that every runtime
//! function value created from it can share the declaration instead of
//! cloning the subtree.
//!
//! Variable reads, assignments and increment/decrement targets carry an
//! [`ExprId`]. The resolver keys its scope‑distance table by that id.

use serde::Serialize;
use std::rc::Rc;

use crate::token::Token;

/// Identity of a variable‑referencing node, unique within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ExprId(pub usize);

/// Hands out fresh [`ExprId`]s.  One generator lives as long as the session
/// that owns the distance table, so ids never collide across runs.
#[derive(Debug, Default)]
pub struct IdGen {
    next: usize,
}

impl IdGen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&mut self) -> ExprId {
        let id = ExprId(self.next);
        self.next += 1;
        id
    }
}

/// A **literal constant** that appears directly in the source code.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum LiteralValue {
    /// Numeric literal ‑ stored as IEEE‑754 `f64`.
    Number(f64),

    /// String literal without surrounding quotes.
    Str(String),

    Bool(bool),

    /// The `null` literal.
    Null,
}

/// Prefix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UnaryOp {
    /// `!`
    Not,
    /// `-`
    Negate,
    /// `~`
    BitNot,
}

/// Infix (non short‑circuit) operators, grouped by precedence tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BinaryOp {
    Equal,
    NotEqual,
    Greater,
    GreaterEqual,
    Less,
    LessEqual,
    BitOr,
    BitXor,
    BitAnd,
    ShiftLeft,
    ShiftRight,
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Power,
}

/// Short‑circuit operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LogicalOp {
    And,
    Or,
}

/// `++` / `--`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum IncDecOp {
    Increment,
    Decrement,
}

/// Every kind of *expression* in Zinc.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Expr {
    /// A literal constant: number, string, `true`, `false`, or `null`.
    Literal(LiteralValue),

    /// Parenthesised sub‑expression.
    Grouping(Box<Expr>),

    /// Prefix unary operator expression, e.g. `!ready`, `-42`, `~mask`.
    Unary {
        op: UnaryOp,
        /// The operator token, retained for error reporting.
        operator: Token,
        right: Box<Expr>,
    },

    /// Infix binary operator expression, e.g. `a + b`, `x << 2`.
    Binary {
        left: Box<Expr>,
        op: BinaryOp,
        operator: Token,
        right: Box<Expr>,
    },

    /// Short‑circuiting `and` / `or`.
    Logical {
        left: Box<Expr>,
        op: LogicalOp,
        operator: Token,
        right: Box<Expr>,
    },

    /// Assignment `name = value` (compound forms are desugared into this).
    Assign {
        id: ExprId,
        name: Token,
        value: Box<Expr>,
    },

    /// Variable access.
    Variable { id: ExprId, name: Token },

    /// `++x`, `x++`, `--x`, `x--` on a plain variable.
    IncDec {
        /// Identity of the *target* variable reference.
        id: ExprId,
        name: Token,
        op: IncDecOp,
        operator: Token,
        prefix: bool,
    },

    /// Function or class‑constructor call.
    Call {
        callee: Box<Expr>,
        /// The closing `)` token, retained for error reporting.
        paren: Token,
        arguments: Vec<Expr>,
    },
}

/// A function declaration; shared between the AST and the runtime values
/// created from it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionDecl {
    pub name: Token,

    /// Parameter name tokens (arity ≤ 255).
    pub params: Vec<Token>,

    /// Body executed when the function is called.
    pub body: Vec<Stmt>,
}

/// One `elif (cond) branch` clause of an `if` statement.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ElifBranch {
    pub condition: Expr,
    pub branch: Stmt,
}

/// Executable *statements*.  A program is a sequence of these.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Stmt {
    /// Stand‑alone expression terminated by a semicolon.
    Expression(Expr),

    /// `print expr;` ‑ writes the value without a trailing newline.
    Print(Expr),

    /// `println expr;` ‑ writes the value followed by a newline.
    Println(Expr),

    /// Variable declaration: `"var" IDENT ("=" initializer)? ";"`.
    Var {
        name: Token,
        initializer: Option<Expr>,
    },

    /// Braced scope containing zero or more declarations/statements.
    Block(Vec<Stmt>),

    /// `if` / `elif`* / `else`? conditional.
    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        elif_branches: Vec<ElifBranch>,
        else_branch: Option<Box<Stmt>>,
    },

    /// `while` loop; desugared `for` loops carry their increment here so it
    /// still runs after a `continue`.
    While {
        condition: Expr,
        body: Box<Stmt>,
        increment: Option<Expr>,
    },

    /// Function declaration ‑ becomes a first‑class callable value.
    Function(Rc<FunctionDecl>),

    /// `return` statement inside a function body.
    Return {
        /// The `return` keyword token (for error locations).
        keyword: Token,

        /// Absent ⇒ `null` is returned.
        value: Option<Expr>,
    },

    /// `break;`
    Break { keyword: Token },

    /// `continue;`
    Continue { keyword: Token },

    /// Minimal class stub: the name becomes a zero‑argument constructor.
    Class {
        name: Token,
        methods: Vec<Rc<FunctionDecl>>,
    },
}
