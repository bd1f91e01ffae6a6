/*!
Recursive‑descent parser for Zinc.

Grammar (EBNF, condensed)
--------------------------

```text
program        → declaration* EOF ;
declaration    → classDecl | funDecl | varDecl | statement ;
classDecl      → "class" IDENT "{" function* "}" ;
funDecl        → "fun" function ;
function       → IDENT "(" parameters? ")" block ;
varDecl        → "var" IDENT ( "=" expression )? ";" ;
statement      → exprStmt | forStmt | ifStmt | printStmt | printlnStmt
               | returnStmt | breakStmt | continueStmt | whileStmt | block ;
forStmt        → "for" "(" ( varDecl | exprStmt | ";" ) expression? ";"
                 expression? ")" statement ;
ifStmt         → "if" "(" expression ")" statement
                 ( "elif" "(" expression ")" statement )*
                 ( "else" statement )? ;
block          → "{" declaration* "}" ;
expression     → assignment ;
assignment     → IDENT ( "=" | "+=" | "-=" | "*=" | "/=" | "%=" | "**=" ) assignment
               | logic_or ;
logic_or       → logic_and ( "or" logic_and )* ;
logic_and      → equality ( "and" equality )* ;
equality       → comparison ( ( "!=" | "==" ) comparison )* ;
comparison     → bit_or ( ( ">" | ">=" | "<" | "<=" ) bit_or )* ;
bit_or         → bit_xor ( "|" bit_xor )* ;
bit_xor        → bit_and ( "^" bit_and )* ;
bit_and        → shift ( "&" shift )* ;
shift          → term ( ( "<<" | ">>" ) term )* ;
term           → factor ( ( "-" | "+" ) factor )* ;
factor         → exponent ( ( "/" | "*" | "%" ) exponent )* ;
exponent       → unary ( "**" unary )* ;
unary          → ( "!" | "-" | "~" | "++" | "--" ) unary | postfix ;
postfix        → call ( "++" | "--" )* ;
call           → primary ( "(" arguments? ")" )* ;
primary        → NUMBER | STRING | "true" | "false" | "null"
               | IDENT | "(" expression ")" ;
```

`for` is desugared into a block holding the initializer and a `while` that
carries the increment. Compound assignment is desugared into `Assign` over a
`Binary`. Errors are collected and the parser re‑synchronises on the next
statement boundary, so one run can report several independent mistakes.

Logging: `info` for lifecycle milestones, `debug` for descent into the
statement grammar.
*/

use std::rc::Rc;

use crate::ast::{
    BinaryOp, ElifBranch, Expr, FunctionDecl, IdGen, IncDecOp, LiteralValue, LogicalOp, Stmt,
    UnaryOp,
};
use crate::error::{Result, ZincError};
use crate::stack::ensure_sufficient_stack;
use crate::token::{Token, TokenType};

use log::{debug, info};

const MAX_ARITY: usize = 255;

/// Top‑level parser over a slice of tokens ending in `EOF`.
pub struct Parser<'a> {
    tokens: &'a [Token],
    current: usize,
    /// Number of enclosing loops; `break`/`continue` need it to be non‑zero.
    loop_depth: usize,
    ids: &'a mut IdGen,
    errors: Vec<ZincError>,
}

impl<'a> Parser<'a> {
    /// Construct a new parser. `ids` must belong to the session whose
    /// interpreter will run the resulting program.
    pub fn new(tokens: &'a [Token], ids: &'a mut IdGen) -> Self {
        info!("Parser created with {} tokens", tokens.len());

        Self {
            tokens,
            current: 0,
            loop_depth: 0,
            ids,
            errors: Vec::new(),
        }
    }

    // ───────────────────────── public API ─────────────────────────

    /// Parse an entire program.  Returns every diagnostic if any statement
    /// failed to parse.
    pub fn parse(mut self) -> std::result::Result<Vec<Stmt>, Vec<ZincError>> {
        info!("Beginning parse phase");

        let mut statements: Vec<Stmt> = Vec::new();

        if self.tokens.is_empty() {
            return Ok(statements);
        }

        while !self.is_at_end() {
            if let Some(stmt) = self.declaration() {
                statements.push(stmt);
            }
        }

        if self.errors.is_empty() {
            info!("Parsed {} statement(s)", statements.len());
            Ok(statements)
        } else {
            info!("Parse finished with {} error(s)", self.errors.len());
            Err(self.errors)
        }
    }

    // ──────────────────────── declaration rules ───────────────────

    /// Parse one declaration, recording the error and synchronising on
    /// failure.
    fn declaration(&mut self) -> Option<Stmt> {
        debug!("Entering declaration");

        let result = if self.matches(TokenType::CLASS) {
            self.class_declaration()
        } else if self.matches(TokenType::FUN) {
            self.function().map(|decl| Stmt::Function(Rc::new(decl)))
        } else if self.matches(TokenType::VAR) {
            self.var_declaration()
        } else {
            self.statement()
        };

        match result {
            Ok(stmt) => Some(stmt),
            Err(e) => {
                debug!("Parse error, synchronising: {}", e);
                self.errors.push(e);
                self.synchronize();
                None
            }
        }
    }

    fn class_declaration(&mut self) -> Result<Stmt> {
        let name: Token = self
            .consume(TokenType::IDENTIFIER, "Expected class name.")?
            .clone();

        self.consume(TokenType::LEFT_BRACE, "Expected '{' before class body.")?;

        let mut methods: Vec<Rc<FunctionDecl>> = Vec::new();

        while !self.check(TokenType::RIGHT_BRACE) && !self.is_at_end() {
            methods.push(Rc::new(self.function()?));
        }

        self.consume(TokenType::RIGHT_BRACE, "Expected '}' after class body.")?;

        Ok(Stmt::Class { name, methods })
    }

    /// `IDENT "(" parameters? ")" block` ‑ shared by functions and methods.
    fn function(&mut self) -> Result<FunctionDecl> {
        let name: Token = self
            .consume(TokenType::IDENTIFIER, "Expected function name.")?
            .clone();

        self.consume(TokenType::LEFT_PAREN, "Expected '(' after function name.")?;

        let mut params: Vec<Token> = Vec::new();
        if !self.check(TokenType::RIGHT_PAREN) {
            loop {
                if params.len() >= MAX_ARITY {
                    return Err(ZincError::parse(
                        self.peek(),
                        "Can't have more than 255 parameters.",
                    ));
                }

                params.push(
                    self.consume(TokenType::IDENTIFIER, "Expected parameter name.")?
                        .clone(),
                );

                if !self.matches(TokenType::COMMA) {
                    break;
                }
            }
        }

        self.consume(TokenType::RIGHT_PAREN, "Expected ')' after parameters.")?;
        self.consume(TokenType::LEFT_BRACE, "Expected '{' before function body.")?;

        // Loops outside the function do not make `break` legal inside it.
        let enclosing_loops = self.loop_depth;
        self.loop_depth = 0;
        let body = self.block();
        self.loop_depth = enclosing_loops;

        Ok(FunctionDecl {
            name,
            params,
            body: body?,
        })
    }

    fn var_declaration(&mut self) -> Result<Stmt> {
        let name: Token = self
            .consume(TokenType::IDENTIFIER, "Expected variable name.")?
            .clone();

        let initializer: Option<Expr> = if self.matches(TokenType::EQUAL) {
            Some(self.expression()?)
        } else {
            None
        };

        self.consume(
            TokenType::SEMICOLON,
            "Expected ';' after variable declaration.",
        )?;

        Ok(Stmt::Var { name, initializer })
    }

    // ───────────────────────── statement rules ────────────────────

    fn statement(&mut self) -> Result<Stmt> {
        ensure_sufficient_stack(|| self.statement_kind())
    }

    fn statement_kind(&mut self) -> Result<Stmt> {
        debug!("Entering statement at {:?}", self.peek().token_type);

        if self.matches(TokenType::FOR) {
            self.for_statement()
        } else if self.matches(TokenType::IF) {
            self.if_statement()
        } else if self.matches(TokenType::WHILE) {
            self.while_statement()
        } else if self.matches(TokenType::RETURN) {
            self.return_statement()
        } else if self.matches(TokenType::BREAK) {
            self.loop_control_statement(true)
        } else if self.matches(TokenType::CONTINUE) {
            self.loop_control_statement(false)
        } else if self.matches(TokenType::LEFT_BRACE) {
            Ok(Stmt::Block(self.block()?))
        } else if self.matches(TokenType::PRINT) {
            Ok(Stmt::Print(self.print_value()?))
        } else if self.matches(TokenType::PRINTLN) {
            Ok(Stmt::Println(self.print_value()?))
        } else {
            self.expression_statement()
        }
    }

    /// Desugars `for (init; cond; incr) body` into
    /// `{ init; while (cond) body <incr> }`.
    fn for_statement(&mut self) -> Result<Stmt> {
        self.consume(TokenType::LEFT_PAREN, "Expected '(' after 'for'.")?;

        let initializer: Option<Stmt> = if self.matches(TokenType::SEMICOLON) {
            None
        } else if self.matches(TokenType::VAR) {
            Some(self.var_declaration()?)
        } else {
            Some(self.expression_statement()?)
        };

        let condition: Expr = if !self.check(TokenType::SEMICOLON) {
            self.expression()?
        } else {
            Expr::Literal(LiteralValue::Bool(true))
        };
        self.consume(TokenType::SEMICOLON, "Expected ';' after loop condition.")?;

        let increment: Option<Expr> = if !self.check(TokenType::RIGHT_PAREN) {
            Some(self.expression()?)
        } else {
            None
        };
        self.consume(TokenType::RIGHT_PAREN, "Expected ')' after for clauses.")?;

        let body = self.loop_body()?;

        let mut statements: Vec<Stmt> = Vec::with_capacity(2);
        statements.extend(initializer);
        statements.push(Stmt::While {
            condition,
            body: Box::new(body),
            increment,
        });

        Ok(Stmt::Block(statements))
    }

    fn if_statement(&mut self) -> Result<Stmt> {
        let condition: Expr = self.parenthesized("if")?;
        let then_branch: Box<Stmt> = Box::new(self.statement()?);

        let mut elif_branches: Vec<ElifBranch> = Vec::new();
        while self.matches(TokenType::ELIF) {
            let condition = self.parenthesized("elif")?;
            let branch = self.statement()?;
            elif_branches.push(ElifBranch { condition, branch });
        }

        let else_branch: Option<Box<Stmt>> = if self.matches(TokenType::ELSE) {
            Some(Box::new(self.statement()?))
        } else {
            None
        };

        Ok(Stmt::If {
            condition,
            then_branch,
            elif_branches,
            else_branch,
        })
    }

    fn while_statement(&mut self) -> Result<Stmt> {
        let condition: Expr = self.parenthesized("while")?;
        let body: Stmt = self.loop_body()?;

        Ok(Stmt::While {
            condition,
            body: Box::new(body),
            increment: None,
        })
    }

    /// Parse a statement with the loop counter raised, restoring it on every
    /// exit path.
    fn loop_body(&mut self) -> Result<Stmt> {
        self.loop_depth += 1;
        let body = self.statement();
        self.loop_depth -= 1;
        body
    }

    fn return_statement(&mut self) -> Result<Stmt> {
        let keyword: Token = self.previous().clone();
        let value: Option<Expr> = if !self.check(TokenType::SEMICOLON) {
            Some(self.expression()?)
        } else {
            None
        };

        self.consume(TokenType::SEMICOLON, "Expected ';' after return value.")?;

        Ok(Stmt::Return { keyword, value })
    }

    fn loop_control_statement(&mut self, is_break: bool) -> Result<Stmt> {
        let keyword: Token = self.previous().clone();

        if self.loop_depth == 0 {
            return Err(ZincError::parse(
                &keyword,
                format!("Cannot use '{}' outside of a loop.", keyword.lexeme),
            ));
        }

        self.consume(
            TokenType::SEMICOLON,
            &format!("Expected ';' after '{}'.", keyword.lexeme),
        )?;

        if is_break {
            Ok(Stmt::Break { keyword })
        } else {
            Ok(Stmt::Continue { keyword })
        }
    }

    fn print_value(&mut self) -> Result<Expr> {
        let value: Expr = self.expression()?;

        self.consume(TokenType::SEMICOLON, "Expected ';' after value.")?;

        Ok(value)
    }

    fn expression_statement(&mut self) -> Result<Stmt> {
        let expr: Expr = self.expression()?;
        self.consume(TokenType::SEMICOLON, "Expected ';' after expression.")?;
        Ok(Stmt::Expression(expr))
    }

    /// Body of a `{ … }` whose opening brace was already consumed.
    fn block(&mut self) -> Result<Vec<Stmt>> {
        let mut statements: Vec<Stmt> = Vec::new();

        while !self.check(TokenType::RIGHT_BRACE) && !self.is_at_end() {
            if let Some(stmt) = self.declaration() {
                statements.push(stmt);
            }
        }

        self.consume(TokenType::RIGHT_BRACE, "Expected '}' after block.")?;
        Ok(statements)
    }

    fn parenthesized(&mut self, keyword: &str) -> Result<Expr> {
        self.consume(
            TokenType::LEFT_PAREN,
            &format!("Expected '(' after '{}'.", keyword),
        )?;
        let condition: Expr = self.expression()?;
        self.consume(TokenType::RIGHT_PAREN, "Expected ')' after condition.")?;
        Ok(condition)
    }

    // ─────────────────────── expression rules ─────────────────────

    fn expression(&mut self) -> Result<Expr> {
        ensure_sufficient_stack(|| self.assignment())
    }

    fn assignment(&mut self) -> Result<Expr> {
        let expr: Expr = self.logical_or()?;

        if self.match_any(&[
            TokenType::EQUAL,
            TokenType::PLUS_EQUAL,
            TokenType::MINUS_EQUAL,
            TokenType::STAR_EQUAL,
            TokenType::SLASH_EQUAL,
            TokenType::PERCENT_EQUAL,
            TokenType::STAR_STAR_EQUAL,
        ]) {
            let equals: Token = self.previous().clone();
            let value: Expr = ensure_sufficient_stack(|| self.assignment())?;

            let Expr::Variable { ref name, .. } = expr else {
                // Reported but not thrown: the parser is not confused.
                self.errors
                    .push(ZincError::parse(&equals, "Invalid assignment target."));
                return Ok(expr);
            };

            let name: Token = name.clone();
            let value: Expr = match compound_base(&equals.token_type) {
                None => value,
                Some((op, base)) => Expr::Binary {
                    left: Box::new(expr),
                    op,
                    operator: Token::new(base, equals.lexeme.as_str(), equals.line),
                    right: Box::new(value),
                },
            };

            return Ok(Expr::Assign {
                id: self.ids.next_id(),
                name,
                value: Box::new(value),
            });
        }

        Ok(expr)
    }

    fn logical_or(&mut self) -> Result<Expr> {
        let mut expr: Expr = self.logical_and()?;

        while self.matches(TokenType::OR) {
            let operator: Token = self.previous().clone();
            let right: Expr = self.logical_and()?;

            expr = Expr::Logical {
                left: Box::new(expr),
                op: LogicalOp::Or,
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn logical_and(&mut self) -> Result<Expr> {
        let mut expr: Expr = self.equality()?;

        while self.matches(TokenType::AND) {
            let operator: Token = self.previous().clone();
            let right: Expr = self.equality()?;

            expr = Expr::Logical {
                left: Box::new(expr),
                op: LogicalOp::And,
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn equality(&mut self) -> Result<Expr> {
        self.binary_tier(
            &[TokenType::BANG_EQUAL, TokenType::EQUAL_EQUAL],
            Self::comparison,
        )
    }

    fn comparison(&mut self) -> Result<Expr> {
        self.binary_tier(
            &[
                TokenType::GREATER,
                TokenType::GREATER_EQUAL,
                TokenType::LESS,
                TokenType::LESS_EQUAL,
            ],
            Self::bit_or,
        )
    }

    fn bit_or(&mut self) -> Result<Expr> {
        self.binary_tier(&[TokenType::PIPE], Self::bit_xor)
    }

    fn bit_xor(&mut self) -> Result<Expr> {
        self.binary_tier(&[TokenType::CARET], Self::bit_and)
    }

    fn bit_and(&mut self) -> Result<Expr> {
        self.binary_tier(&[TokenType::AMPERSAND], Self::shift)
    }

    fn shift(&mut self) -> Result<Expr> {
        self.binary_tier(
            &[TokenType::LESS_LESS, TokenType::GREATER_GREATER],
            Self::term,
        )
    }

    fn term(&mut self) -> Result<Expr> {
        self.binary_tier(&[TokenType::MINUS, TokenType::PLUS], Self::factor)
    }

    fn factor(&mut self) -> Result<Expr> {
        self.binary_tier(
            &[TokenType::STAR, TokenType::SLASH, TokenType::PERCENT],
            Self::exponent,
        )
    }

    fn exponent(&mut self) -> Result<Expr> {
        self.binary_tier(&[TokenType::STAR_STAR], Self::unary)
    }

    /// One left‑associative precedence level: `next ( op next )*`.
    fn binary_tier(
        &mut self,
        operators: &[TokenType],
        next: fn(&mut Self) -> Result<Expr>,
    ) -> Result<Expr> {
        let mut expr: Expr = next(self)?;

        while self.match_any(operators) {
            let operator: Token = self.previous().clone();
            let op: BinaryOp = binary_op(&operator.token_type)
                .ok_or_else(|| ZincError::parse(&operator, "Unknown binary operator."))?;
            let right: Expr = next(self)?;

            expr = Expr::Binary {
                left: Box::new(expr),
                op,
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn unary(&mut self) -> Result<Expr> {
        if self.match_any(&[TokenType::BANG, TokenType::MINUS, TokenType::TILDE]) {
            let operator: Token = self.previous().clone();
            let op = match operator.token_type {
                TokenType::BANG => UnaryOp::Not,
                TokenType::MINUS => UnaryOp::Negate,
                _ => UnaryOp::BitNot,
            };
            let right: Expr = ensure_sufficient_stack(|| self.unary())?;

            return Ok(Expr::Unary {
                op,
                operator,
                right: Box::new(right),
            });
        }

        if self.match_any(&[TokenType::PLUS_PLUS, TokenType::MINUS_MINUS]) {
            let operator: Token = self.previous().clone();
            let operand: Expr = ensure_sufficient_stack(|| self.unary())?;

            return Ok(self.inc_dec(operand, operator, true));
        }

        self.postfix()
    }

    fn postfix(&mut self) -> Result<Expr> {
        let mut expr: Expr = self.call()?;

        while self.match_any(&[TokenType::PLUS_PLUS, TokenType::MINUS_MINUS]) {
            let operator: Token = self.previous().clone();
            expr = self.inc_dec(expr, operator, false);
        }

        Ok(expr)
    }

    /// Wrap `operand` in an increment/decrement when it is a plain variable;
    /// otherwise record an error and hand the operand back unchanged.
    fn inc_dec(&mut self, operand: Expr, operator: Token, prefix: bool) -> Expr {
        match operand {
            Expr::Variable { id, name } => Expr::IncDec {
                id,
                name,
                op: if operator.token_type == TokenType::PLUS_PLUS {
                    IncDecOp::Increment
                } else {
                    IncDecOp::Decrement
                },
                operator,
                prefix,
            },
            other => {
                self.errors.push(ZincError::parse(
                    &operator,
                    format!("Invalid target for '{}'.", operator.lexeme),
                ));
                other
            }
        }
    }

    fn call(&mut self) -> Result<Expr> {
        let mut expr: Expr = self.primary()?;

        while self.matches(TokenType::LEFT_PAREN) {
            expr = self.finish_call(expr)?;
        }

        Ok(expr)
    }

    fn finish_call(&mut self, callee: Expr) -> Result<Expr> {
        let mut arguments: Vec<Expr> = Vec::new();
        if !self.check(TokenType::RIGHT_PAREN) {
            loop {
                if arguments.len() >= MAX_ARITY {
                    return Err(ZincError::parse(
                        self.peek(),
                        "Can't have more than 255 arguments.",
                    ));
                }

                arguments.push(self.expression()?);

                if !self.matches(TokenType::COMMA) {
                    break;
                }
            }
        }

        let paren: Token = self
            .consume(TokenType::RIGHT_PAREN, "Expected ')' after arguments.")?
            .clone();

        Ok(Expr::Call {
            callee: Box::new(callee),
            paren,
            arguments,
        })
    }

    fn primary(&mut self) -> Result<Expr> {
        let literal = match &self.peek().token_type {
            TokenType::FALSE => Some(LiteralValue::Bool(false)),
            TokenType::TRUE => Some(LiteralValue::Bool(true)),
            TokenType::NULL => Some(LiteralValue::Null),
            TokenType::NUMBER(n) => Some(LiteralValue::Number(*n)),
            TokenType::STRING(s) => Some(LiteralValue::Str(s.clone())),
            _ => None,
        };

        if let Some(literal) = literal {
            self.advance();
            return Ok(Expr::Literal(literal));
        }

        if self.matches(TokenType::IDENTIFIER) {
            return Ok(Expr::Variable {
                id: self.ids.next_id(),
                name: self.previous().clone(),
            });
        }

        if self.matches(TokenType::LEFT_PAREN) {
            let expr: Expr = self.expression()?;

            self.consume(TokenType::RIGHT_PAREN, "Expected ')' after expression.")?;

            return Ok(Expr::Grouping(Box::new(expr)));
        }

        Err(ZincError::parse(self.peek(), "Expected expression."))
    }

    // ────────────────────── utility helpers ───────────────────────

    #[inline(always)]
    fn matches(&mut self, ttype: TokenType) -> bool {
        if self.check(ttype) {
            self.advance();

            return true;
        }

        false
    }

    #[inline(always)]
    fn match_any(&mut self, ttypes: &[TokenType]) -> bool {
        if ttypes.iter().any(|tt| self.check_ref(tt)) {
            self.advance();

            return true;
        }

        false
    }

    #[inline(always)]
    fn consume(&mut self, ttype: TokenType, message: &str) -> Result<&'a Token> {
        if self.check(ttype) {
            return Ok(self.advance());
        }

        Err(ZincError::parse(self.peek(), message))
    }

    #[inline(always)]
    fn check(&self, ttype: TokenType) -> bool {
        self.check_ref(&ttype)
    }

    #[inline(always)]
    fn check_ref(&self, ttype: &TokenType) -> bool {
        if self.is_at_end() {
            return false;
        }

        self.peek().token_type == *ttype
    }

    #[inline(always)]
    fn advance(&mut self) -> &'a Token {
        if !self.is_at_end() {
            self.current += 1;
        }

        self.previous()
    }

    #[inline(always)]
    fn is_at_end(&self) -> bool {
        matches!(self.peek().token_type, TokenType::EOF)
    }

    #[inline(always)]
    fn peek(&self) -> &'a Token {
        let tokens: &'a [Token] = self.tokens;
        &tokens[self.current.min(tokens.len() - 1)]
    }

    #[inline(always)]
    fn previous(&self) -> &'a Token {
        let tokens: &'a [Token] = self.tokens;
        &tokens[self.current.saturating_sub(1)]
    }

    /// Discards tokens until it thinks it is at a statement boundary.
    fn synchronize(&mut self) {
        self.advance(); // skip the token that caused the error

        while !self.is_at_end() {
            if matches!(self.previous().token_type, TokenType::SEMICOLON) {
                return;
            }

            match self.peek().token_type {
                TokenType::CLASS
                | TokenType::FUN
                | TokenType::VAR
                | TokenType::FOR
                | TokenType::IF
                | TokenType::WHILE
                | TokenType::PRINT
                | TokenType::PRINTLN
                | TokenType::RETURN
                | TokenType::BREAK
                | TokenType::CONTINUE => return,
                _ => {}
            }

            self.advance();
        }
    }
}

/// Maps an infix operator token to its tag.
fn binary_op(tt: &TokenType) -> Option<BinaryOp> {
    let op = match tt {
        TokenType::EQUAL_EQUAL => BinaryOp::Equal,
        TokenType::BANG_EQUAL => BinaryOp::NotEqual,
        TokenType::GREATER => BinaryOp::Greater,
        TokenType::GREATER_EQUAL => BinaryOp::GreaterEqual,
        TokenType::LESS => BinaryOp::Less,
        TokenType::LESS_EQUAL => BinaryOp::LessEqual,
        TokenType::PIPE => BinaryOp::BitOr,
        TokenType::CARET => BinaryOp::BitXor,
        TokenType::AMPERSAND => BinaryOp::BitAnd,
        TokenType::LESS_LESS => BinaryOp::ShiftLeft,
        TokenType::GREATER_GREATER => BinaryOp::ShiftRight,
        TokenType::PLUS => BinaryOp::Add,
        TokenType::MINUS => BinaryOp::Subtract,
        TokenType::STAR => BinaryOp::Multiply,
        TokenType::SLASH => BinaryOp::Divide,
        TokenType::PERCENT => BinaryOp::Modulo,
        TokenType::STAR_STAR => BinaryOp::Power,
        _ => return None,
    };

    Some(op)
}

/// For a compound assignment token, the binary operator it desugars to.
fn compound_base(tt: &TokenType) -> Option<(BinaryOp, TokenType)> {
    match tt {
        TokenType::PLUS_EQUAL => Some((BinaryOp::Add, TokenType::PLUS)),
        TokenType::MINUS_EQUAL => Some((BinaryOp::Subtract, TokenType::MINUS)),
        TokenType::STAR_EQUAL => Some((BinaryOp::Multiply, TokenType::STAR)),
        TokenType::SLASH_EQUAL => Some((BinaryOp::Divide, TokenType::SLASH)),
        TokenType::PERCENT_EQUAL => Some((BinaryOp::Modulo, TokenType::PERCENT)),
        TokenType::STAR_STAR_EQUAL => Some((BinaryOp::Power, TokenType::STAR_STAR)),
        _ => None,
    }
}
