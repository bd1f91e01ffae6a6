use crate::ast::{Expr, LiteralValue, Stmt};
use crate::stack::ensure_sufficient_stack;

/// Renders the AST in a parenthesised prefix form, one statement per call.
/// Used by the `parse` command and by tests that check tree shape.
pub struct AstPrinter;

impl AstPrinter {
    pub fn print(expr: &Expr) -> String {
        ensure_sufficient_stack(|| Self::expr_text(expr))
    }

    fn expr_text(expr: &Expr) -> String {
        match expr {
            // ── literals ────────────────────────────────────────────────
            Expr::Literal(lit) => match lit {
                LiteralValue::Bool(b) => b.to_string(),

                LiteralValue::Null => "null".into(),

                LiteralValue::Str(s) => s.clone(),

                LiteralValue::Number(n) => {
                    if n.fract() == 0.0 {
                        // 3 → 3.0
                        format!("{:.1}", n)
                    } else {
                        n.to_string()
                    }
                }
            },

            // ── grouping ────────────────────────────────────────────────
            Expr::Grouping(inner) => format!("(group {})", Self::print(inner)),

            // ── operators ───────────────────────────────────────────────
            Expr::Unary {
                operator, right, ..
            } => format!("({} {})", operator.lexeme, Self::print(right)),

            Expr::Binary {
                left,
                operator,
                right,
                ..
            }
            | Expr::Logical {
                left,
                operator,
                right,
                ..
            } => format!(
                "({} {} {})",
                operator.lexeme,
                Self::print(left),
                Self::print(right)
            ),

            Expr::IncDec {
                name,
                operator,
                prefix,
                ..
            } => {
                if *prefix {
                    format!("(pre{} {})", operator.lexeme, name.lexeme)
                } else {
                    format!("(post{} {})", operator.lexeme, name.lexeme)
                }
            }

            // ── variables / calls ───────────────────────────────────────
            Expr::Variable { name, .. } => name.lexeme.clone(),

            Expr::Assign { name, value, .. } => {
                format!("(= {} {})", name.lexeme, Self::print(value))
            }

            Expr::Call {
                callee, arguments, ..
            } => {
                let mut s = format!("(call {}", Self::print(callee));
                for arg in arguments {
                    s.push(' ');
                    s.push_str(&Self::print(arg));
                }
                s.push(')');
                s
            }
        }
    }

    pub fn print_stmt(stmt: &Stmt) -> String {
        ensure_sufficient_stack(|| Self::stmt_text(stmt))
    }

    fn stmt_text(stmt: &Stmt) -> String {
        match stmt {
            Stmt::Expression(expr) => format!("(; {})", Self::print(expr)),

            Stmt::Print(expr) => format!("(print {})", Self::print(expr)),

            Stmt::Println(expr) => format!("(println {})", Self::print(expr)),

            Stmt::Var { name, initializer } => match initializer {
                Some(expr) => format!("(var {} {})", name.lexeme, Self::print(expr)),
                None => format!("(var {})", name.lexeme),
            },

            Stmt::Block(statements) => Self::list("block", statements),

            Stmt::If {
                condition,
                then_branch,
                elif_branches,
                else_branch,
            } => {
                let mut s = format!(
                    "(if {} {}",
                    Self::print(condition),
                    Self::print_stmt(then_branch)
                );
                for elif in elif_branches {
                    s.push_str(&format!(
                        " (elif {} {})",
                        Self::print(&elif.condition),
                        Self::print_stmt(&elif.branch)
                    ));
                }
                if let Some(branch) = else_branch {
                    s.push_str(&format!(" (else {})", Self::print_stmt(branch)));
                }
                s.push(')');
                s
            }

            Stmt::While {
                condition,
                body,
                increment,
            } => match increment {
                Some(increment) => format!(
                    "(while {} {} {})",
                    Self::print(condition),
                    Self::print_stmt(body),
                    Self::print(increment)
                ),
                None => format!(
                    "(while {} {})",
                    Self::print(condition),
                    Self::print_stmt(body)
                ),
            },

            Stmt::Function(decl) => {
                let params: Vec<&str> = decl.params.iter().map(|p| p.lexeme.as_str()).collect();
                format!(
                    "(fun {}({}) {})",
                    decl.name.lexeme,
                    params.join(" "),
                    Self::list("block", &decl.body)
                )
            }

            Stmt::Return { value, .. } => match value {
                Some(expr) => format!("(return {})", Self::print(expr)),
                None => "(return)".into(),
            },

            Stmt::Break { .. } => "(break)".into(),

            Stmt::Continue { .. } => "(continue)".into(),

            Stmt::Class { name, methods } => {
                let mut s = format!("(class {}", name.lexeme);
                for method in methods {
                    s.push(' ');
                    s.push_str(&method.name.lexeme);
                }
                s.push(')');
                s
            }
        }
    }

    fn list(head: &str, statements: &[Stmt]) -> String {
        let mut s = format!("({}", head);
        for stmt in statements {
            s.push(' ');
            s.push_str(&Self::print_stmt(stmt));
        }
        s.push(')');
        s
    }
}
