mod common;

#[cfg(test)]
mod resolver_tests {
    use zinc as zn;

    use zn::ast::{Expr, ExprId, IdGen, Stmt};
    use zn::interpreter::Interpreter;
    use zn::parser::Parser;
    use zn::resolver::Resolver;
    use zn::scanner::scan_tokens;

    use super::common::{error_text, run_program};

    fn parse(source: &str) -> Vec<Stmt> {
        let (tokens, errors) = scan_tokens(source);
        assert!(errors.is_empty(), "unexpected lex errors: {:?}", errors);

        let mut ids = IdGen::new();
        Parser::new(&tokens, &mut ids)
            .parse()
            .unwrap_or_else(|e| panic!("parse failed: {:?}", e))
    }

    fn resolve(source: &str) -> (Vec<Stmt>, Interpreter) {
        let statements = parse(source);
        let mut interpreter = Interpreter::with_output(Vec::new());

        if let Err(errors) = Resolver::new(&mut interpreter).resolve(&statements) {
            panic!("resolve failed: {:?}", errors);
        }

        (statements, interpreter)
    }

    fn resolve_errors(source: &str) -> Vec<String> {
        let statements = parse(source);
        let mut interpreter = Interpreter::with_output(Vec::new());

        match Resolver::new(&mut interpreter).resolve(&statements) {
            Ok(()) => panic!("expected resolve errors"),
            Err(errors) => errors.iter().map(|e| e.to_string()).collect(),
        }
    }

    fn variable_id(expr: &Expr) -> ExprId {
        match expr {
            Expr::Variable { id, .. } => *id,
            other => panic!("expected a variable, got {:?}", other),
        }
    }

    #[test]
    fn test_local_reference_depth() {
        let (statements, interpreter) = resolve("{ var a = 1; { println a; } }");

        let Stmt::Block(outer) = &statements[0] else {
            panic!("expected block");
        };
        let Stmt::Block(inner) = &outer[1] else {
            panic!("expected inner block");
        };
        let Stmt::Println(expr) = &inner[0] else {
            panic!("expected println");
        };

        assert_eq!(interpreter.local_depth(variable_id(expr)), Some(1));
    }

    #[test]
    fn test_globals_have_no_entry() {
        let (statements, interpreter) = resolve("var g = 1; { println g; }");

        let Stmt::Block(block) = &statements[1] else {
            panic!("expected block");
        };
        let Stmt::Println(expr) = &block[0] else {
            panic!("expected println");
        };

        assert_eq!(interpreter.local_depth(variable_id(expr)), None);
    }

    #[test]
    fn test_parameter_depth() {
        let (statements, interpreter) = resolve("fun f(a) { return a; }");

        let Stmt::Function(decl) = &statements[0] else {
            panic!("expected function");
        };
        let Stmt::Return {
            value: Some(expr), ..
        } = &decl.body[0]
        else {
            panic!("expected return");
        };

        assert_eq!(interpreter.local_depth(variable_id(expr)), Some(0));
    }

    #[test]
    fn test_shadowed_name_binds_innermost() {
        let (statements, interpreter) = resolve("{ var a = 1; { var a = 2; println a; } println a; }");

        let Stmt::Block(outer) = &statements[0] else {
            panic!("expected block");
        };
        let Stmt::Block(inner) = &outer[1] else {
            panic!("expected inner block");
        };
        let Stmt::Println(inner_read) = &inner[1] else {
            panic!("expected println");
        };
        let Stmt::Println(outer_read) = &outer[2] else {
            panic!("expected println");
        };

        assert_eq!(interpreter.local_depth(variable_id(inner_read)), Some(0));
        assert_eq!(interpreter.local_depth(variable_id(outer_read)), Some(0));
    }

    #[test]
    fn test_self_referential_initializer() {
        assert_eq!(
            resolve_errors("var x = x;"),
            vec!["[line 1] Error at 'x': Can't read a variable in its own initializer."]
        );
        assert_eq!(
            resolve_errors("{ var y = y + 1; }"),
            vec!["[line 1] Error at 'y': Can't read a variable in its own initializer."]
        );
    }

    #[test]
    fn test_initializer_may_read_outer_binding_of_other_name() {
        resolve("var a = 1; { var b = a; }");
        resolve("fun f() { return 1; } var x = f();");
    }

    #[test]
    fn test_duplicate_local() {
        assert_eq!(
            resolve_errors("{ var a = 1; var a = 2; }"),
            vec!["[line 1] Error at 'a': Already a variable with this name in this scope."]
        );
        assert_eq!(
            resolve_errors("fun f(a, a) {}"),
            vec!["[line 1] Error at 'a': Already a variable with this name in this scope."]
        );
        // globals may be redeclared
        resolve("var a = 1; var a = 2;");
    }

    #[test]
    fn test_return_outside_function() {
        assert_eq!(
            resolve_errors("return 1;"),
            vec!["[line 1] Error at 'return': Can't return from top-level code."]
        );
        resolve("class C { m() { return 1; } }");
    }

    #[test]
    fn test_errors_accumulate() {
        let errors = resolve_errors("return;\n{ var a = a; }\n{ var b; var b; }");

        assert_eq!(errors.len(), 3);
        assert!(errors[0].starts_with("[line 1]"));
        assert!(errors[1].starts_with("[line 2]"));
        assert!(errors[2].starts_with("[line 3]"));
    }

    #[test]
    fn test_static_error_prevents_execution() {
        let (output, result) = run_program("println \"before\";\nvar x = x;");

        assert_eq!(output, "");
        assert!(error_text(&result).contains("Can't read a variable in its own initializer."));
        assert_eq!(result.err().map(|e| e.exit_code()), Some(65));
    }
}
