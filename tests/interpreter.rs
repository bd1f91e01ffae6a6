mod common;

#[cfg(test)]
mod interpreter_tests {
    use zinc as zn;

    use zn::interpreter::Interpreter;
    use zn::value::Value;

    use super::common::{error_text, output_of, run_program, session, SharedBuffer};

    fn runtime_error(source: &str) -> String {
        let (_, result) = run_program(source);
        assert_eq!(
            result.as_ref().err().map(|e| e.exit_code()),
            Some(70),
            "expected a runtime error from {:?}",
            source
        );
        error_text(&result)
    }

    // ───────────────────────── expressions ─────────────────────────

    #[test]
    fn test_precedence() {
        assert_eq!(output_of("println 2 + 3 * 4;"), "14\n");
        assert_eq!(output_of("println (2 + 3) * 4;"), "20\n");
        assert_eq!(output_of("println 2 * 3 ** 2;"), "18\n");
        assert_eq!(output_of("println -2 + 5;"), "3\n");
    }

    #[test]
    fn test_single_expression_is_echoed() {
        assert_eq!(output_of("1 + 1;"), "2\n");
        assert_eq!(output_of("1.0 / 4.0;"), "0.25\n");
        assert_eq!(output_of("\"hi\";"), "hi\n");
        // not a lone expression statement
        assert_eq!(output_of("1; 2;"), "");
        assert_eq!(output_of("var x = 1;"), "");
    }

    #[test]
    fn test_number_formatting() {
        assert_eq!(output_of("println 3.0;"), "3\n");
        assert_eq!(output_of("println 10 / 4;"), "2.5\n");
        assert_eq!(output_of("println 2.5 * 2;"), "5\n");
        assert_eq!(output_of("println 7 % 3;"), "1\n");
        assert_eq!(output_of("println 2 ** 10;"), "1024\n");
        assert_eq!(output_of("println -0.5;"), "-0.5\n");
    }

    #[test]
    fn test_division_by_zero_is_ieee() {
        assert_eq!(output_of("println 1 / 0;"), "inf\n");
        assert_eq!(output_of("println -1 / 0;"), "-inf\n");
        assert_eq!(output_of("println 0 / 0;"), "NaN\n");
    }

    #[test]
    fn test_string_concatenation() {
        assert_eq!(output_of("println \"a\" + 1;"), "a1\n");
        assert_eq!(output_of("println \"n=\" + 1.5;"), "n=1.5\n");
        assert_eq!(output_of("println \"a\" + true + null;"), "atruenull\n");
        assert_eq!(output_of("println \"a\" + \"b\";"), "ab\n");
    }

    #[test]
    fn test_escapes_reach_output() {
        assert_eq!(output_of(r#"println "a\tb\\";"#), "a\tb\\\n");
        assert_eq!(output_of(r#"println "say \"hi\"";"#), "say \"hi\"\n");
    }

    #[test]
    fn test_print_has_no_newline() {
        assert_eq!(output_of("print \"a\"; print 1; println \"\";"), "a1\n");
    }

    #[test]
    fn test_equality_and_comparison() {
        assert_eq!(
            output_of(
                "println 1 == 1; println \"a\" == \"a\"; println null == false; \
                 println 1 == \"1\"; println null == null; println 1 != 2;"
            ),
            "true\ntrue\nfalse\nfalse\ntrue\ntrue\n"
        );
        assert_eq!(
            output_of("println 1 < 2; println 2 <= 2; println 3 > 4; println 4 >= 5;"),
            "true\ntrue\nfalse\nfalse\n"
        );
    }

    #[test]
    fn test_truthiness() {
        assert_eq!(
            output_of(
                "if (0) println \"zero\";\n\
                 if (\"\") println \"empty\";\n\
                 if (null) println \"no\"; else println \"null\";\n\
                 println !false; println !0;"
            ),
            "zero\nempty\nnull\ntrue\nfalse\n"
        );
    }

    #[test]
    fn test_short_circuit() {
        let program = r#"
            var called = false;
            fun side() { called = true; return true; }
            println false and side();
            println true or side();
            println called;
            println null or "x";
            println 1 and 2;
        "#;

        assert_eq!(output_of(program), "false\ntrue\nfalse\nx\n2\n");
    }

    #[test]
    fn test_bitwise_operators() {
        assert_eq!(
            output_of(
                "println 6 & 3; println 6 | 3; println 6 ^ 3; println ~5; \
                 println 1 << 4; println -16 >> 2; println 1 << 33;"
            ),
            "2\n7\n5\n-6\n16\n-4\n2\n"
        );
    }

    #[test]
    fn test_bitwise_requires_integers() {
        assert_eq!(
            runtime_error("println 1.5 | 1;"),
            "Operands must be integers for operator |, got 1.5 and 1.\n[line 1]"
        );
        assert!(runtime_error("println \"a\" << 1;").contains("Operands must be integers"));
    }

    // ───────────────────────── variables ─────────────────────────

    #[test]
    fn test_shadowing() {
        let program = r#"
            var a = "global";
            {
                var a = "outer";
                {
                    var a = "inner";
                    println a;
                }
                println a;
            }
            println a;
        "#;

        assert_eq!(output_of(program), "inner\nouter\nglobal\n");
    }

    #[test]
    fn test_assignment_reaches_enclosing_frame() {
        let program = r#"
            var a = 1;
            {
                var b = 2;
                {
                    a = a + b;
                    b = 10;
                }
                println b;
            }
            println a;
        "#;

        assert_eq!(output_of(program), "10\n3\n");
    }

    #[test]
    fn test_compound_assignment() {
        assert_eq!(
            output_of("var x = 10; x += 5; x -= 3; x *= 2; x /= 4; x %= 4; println x;"),
            "2\n"
        );
        assert_eq!(output_of("var p = 2; p **= 10; println p;"), "1024\n");
        assert_eq!(output_of("var s = \"a\"; s += 1; println s;"), "a1\n");
        assert_eq!(output_of("{ var n = 1; n += 1; println n; }"), "2\n");
    }

    #[test]
    fn test_increment_and_decrement() {
        assert_eq!(
            output_of("var i = 5; println i++; println i; println ++i; println i--; println --i;"),
            "5\n6\n7\n7\n5\n"
        );
        assert_eq!(output_of("{ var k = 1; k++; println k; }"), "2\n");
        assert_eq!(
            runtime_error("var s = \"a\"; s++;"),
            "Operand for ++ must be a number.\n[line 1]"
        );
    }

    #[test]
    fn test_uninitialized_variable_is_null() {
        assert_eq!(output_of("var x; println x;"), "null\n");
    }

    #[test]
    fn test_undefined_variable() {
        assert_eq!(
            runtime_error("println 1;\nprintln nope;"),
            "Undefined variable 'nope'.\n[line 2]"
        );
        assert_eq!(
            runtime_error("nope = 1;"),
            "Cannot assign to undefined variable 'nope'.\n[line 1]"
        );
    }

    #[test]
    fn test_runtime_error_halts_only_current_run() {
        let (mut session, out) = session();

        session.run("var a = 1;").unwrap();

        let err = session.run("println a; println b; println \"unreached\";").unwrap_err();
        assert_eq!(err.exit_code(), 70);
        assert_eq!(out.contents(), "1\n");

        out.clear();
        session.run("println a;").unwrap();
        assert_eq!(out.contents(), "1\n");
    }

    // ───────────────────────── control flow ─────────────────────────

    #[test]
    fn test_if_elif_else() {
        let program = r#"
            fun grade(n) {
                if (n > 90) return "A";
                elif (n > 80) return "B";
                elif (n > 70) return "C";
                else return "F";
            }
            println grade(95);
            println grade(85);
            println grade(75);
            println grade(10);
        "#;

        assert_eq!(output_of(program), "A\nB\nC\nF\n");
    }

    #[test]
    fn test_while_loop() {
        assert_eq!(
            output_of("var i = 0; while (i < 3) { print i; i = i + 1; } println \"\";"),
            "012\n"
        );
    }

    #[test]
    fn test_break_exits_innermost_loop_only() {
        let program = r#"
            for (var i = 0; i < 3; i = i + 1) {
                for (var j = 0; j < 3; j = j + 1) {
                    if (j == 1) break;
                    print i; print j; print " ";
                }
            }
        "#;

        assert_eq!(output_of(program), "00 10 20 ");
    }

    #[test]
    fn test_continue_still_runs_for_increment() {
        let program = r#"
            for (var i = 0; i < 5; i = i + 1) {
                if (i % 2 == 0) continue;
                println i;
            }
        "#;

        assert_eq!(output_of(program), "1\n3\n");
    }

    #[test]
    fn test_continue_in_while() {
        let program = r#"
            var i = 0;
            while (i < 5) {
                i = i + 1;
                if (i == 3) continue;
                print i;
            }
        "#;

        assert_eq!(output_of(program), "1245");
    }

    #[test]
    fn test_for_variable_is_scoped_to_loop() {
        assert_eq!(
            runtime_error("for (var i = 0; i < 1; i = i + 1) {} println i;"),
            "Undefined variable 'i'.\n[line 1]"
        );
    }

    // ───────────────────────── functions ─────────────────────────

    #[test]
    fn test_recursion() {
        let program = r#"
            fun fib(n) {
                if (n < 2) return n;
                return fib(n - 1) + fib(n - 2);
            }
            println fib(15);
        "#;

        assert_eq!(output_of(program), "610\n");
    }

    #[test]
    fn test_return_values() {
        assert_eq!(
            output_of("fun f() { while (true) { return 3; } } println f();"),
            "3\n"
        );
        assert_eq!(output_of("fun g() {} println g();"), "null\n");
        assert_eq!(output_of("fun h() { return; } println h();"), "null\n");
    }

    #[test]
    fn test_counter_closures_are_independent() {
        let program = r#"
            fun makeCounter() {
                var i = 0;
                fun count() {
                    i = i + 1;
                    return i;
                }
                return count;
            }

            var c1 = makeCounter();
            var c2 = makeCounter();
            println c1();
            println c1();
            println c2();
            println c1();
        "#;

        assert_eq!(output_of(program), "1\n2\n1\n3\n");
    }

    #[test]
    fn test_closure_binding_is_static() {
        let program = r#"
            var a = "global";
            {
                fun show() { println a; }
                show();
                var a = "block";
                show();
            }
        "#;

        assert_eq!(output_of(program), "global\nglobal\n");
    }

    #[test]
    fn test_deep_recursion() {
        let program = r#"
            fun sum(n) {
                if (n == 0) return 0;
                return n + sum(n - 1);
            }
            println sum(3000);
        "#;

        assert_eq!(output_of(program), "4501500
");
    }

    #[test]
    fn test_unbounded_recursion_is_a_runtime_error() {
        let (mut session, out) = session();

        let err = session
            .run("fun down(n) { return down(n + 1); }
down(0);")
            .unwrap_err();
        assert_eq!(err.exit_code(), 70);
        assert_eq!(err.to_string(), "Stack overflow.\n[line 1]");

        // the depth counter unwinds with the error
        session.run("fun up(n) { if (n == 0) return 0; return 1 + up(n - 1); }").unwrap();
        session.run("println up(100);").unwrap();
        assert_eq!(out.contents(), "100\n");
    }

    #[test]
    fn test_deeply_nested_source() {
        let depth = 2000;

        let parens = format!("println {}1{};", "(".repeat(depth), ")".repeat(depth));
        assert_eq!(output_of(&parens), "1\n");

        let negations = format!("println {}true;", "!".repeat(depth));
        assert_eq!(output_of(&negations), "true\n");

        let blocks = format!("{}println 2;{}", "{".repeat(depth), "}".repeat(depth));
        assert_eq!(output_of(&blocks), "2\n");
    }

    #[test]
    fn test_function_identity() {
        let program = r#"
            fun f() { return f; }
            var g = f;
            println f == g;
            println f() == f;
            fun make() { fun inner() {} return inner; }
            println make() == make();
        "#;

        assert_eq!(output_of(program), "true\ntrue\nfalse\n");
    }

    #[test]
    fn test_callable_display() {
        assert_eq!(output_of("fun f() {} println f;"), "<fn f>\n");
        assert_eq!(output_of("clock;"), "<native fn clock>\n");
        assert_eq!(output_of("println clock() > 0;"), "true\n");
    }

    #[test]
    fn test_call_errors() {
        assert_eq!(
            runtime_error("var x = 1; x();"),
            "Can only call functions and classes.\n[line 1]"
        );
        assert_eq!(
            runtime_error("fun f(a) {}\nf();"),
            "Expected 1 arguments but got 0.\n[line 2]"
        );
    }

    // ───────────────────────── operators on wrong types ─────────────────────────

    #[test]
    fn test_type_errors() {
        assert_eq!(
            runtime_error("println \"a\" - 1;"),
            "Operands must be numbers for operator -, got a and 1.\n[line 1]"
        );
        assert_eq!(
            runtime_error("println 1 + true;"),
            "Operator + is not supported for 1 and true.\n[line 1]"
        );
        assert_eq!(
            runtime_error("println -\"x\";"),
            "Operand must be a number for operator -, got x.\n[line 1]"
        );
        assert_eq!(
            runtime_error("println 1 < \"2\";"),
            "Operands must be numbers for operator <, got 1 and 2.\n[line 1]"
        );
    }

    // ───────────────────────── classes ─────────────────────────

    #[test]
    fn test_class_stub() {
        assert_eq!(
            output_of("class Foo { bar() { return 1; } } println Foo; println Foo();"),
            "Foo\nFoo instance\n"
        );
        assert_eq!(
            runtime_error("class Foo {} Foo(1);"),
            "Expected 0 arguments but got 1.\n[line 1]"
        );
    }

    // ───────────────────────── sessions / hosts ─────────────────────────

    #[test]
    fn test_fresh_runs_are_identical() {
        let program = r#"
            var total = 0;
            for (var i = 0; i < 4; i = i + 1) total += i;
            println total;
        "#;

        let (first, r1) = run_program(program);
        let (second, r2) = run_program(program);

        assert!(r1.is_ok() && r2.is_ok());
        assert_eq!(first, "6\n");
        assert_eq!(first, second);
    }

    #[test]
    fn test_native_print_functions() {
        let out = SharedBuffer::new();
        let mut interpreter = Interpreter::with_output(out.clone());

        let println = interpreter.get_global("println").unwrap();
        let print = interpreter.get_global("print").unwrap();

        assert_eq!(
            interpreter.invoke(&print, &[Value::String("x=".into())]).unwrap(),
            Value::Void
        );
        assert_eq!(
            interpreter.invoke(&println, &[Value::Number(3.0)]).unwrap(),
            Value::Void
        );
        assert_eq!(out.contents(), "x=3\n");

        let err = interpreter.invoke(&println, &[]).unwrap_err();
        assert_eq!(err.to_string(), "Expected 1 arguments but got 0.\n[line 0]");
    }

    #[test]
    fn test_void_display_and_silent_clock() {
        assert_eq!(Value::Void.to_string(), "void");

        let out = SharedBuffer::new();
        let mut interpreter = Interpreter::with_output(out.clone());
        let clock = interpreter.get_global("clock").unwrap();

        assert!(matches!(
            interpreter.invoke(&clock, &[]).unwrap(),
            Value::Number(n) if n > 0.0
        ));
        assert_eq!(out.contents(), "");
    }
}
