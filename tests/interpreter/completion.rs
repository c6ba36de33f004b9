//! Completion records: statement values, abrupt completions and labels

use super::{create_test_runtime, eval, eval_result, throws_error};
use jsflow::ast::Span;
use jsflow::builder::*;
use jsflow::{CompletionType, JsError, JsValue};

#[test]
fn test_statement_list_value_is_last_value() {
    assert_eq!(
        eval(&program(vec![
            expr_stmt(num(1.0)),
            expr_stmt(num(2.0)),
            var_("x", Some(num(5.0))),
        ])),
        JsValue::Number(2.0)
    );
}

#[test]
fn test_empty_program_is_undefined() {
    assert_eq!(eval(&program(vec![])), JsValue::Undefined);
}

#[test]
fn test_throw_stops_statement_list() {
    let mut interp = create_test_runtime();
    let completion = interp
        .evaluate_program(&program(vec![
            var_("reached", Some(bool_(false))),
            throw_(str_("boom")),
            expr_stmt(assign("reached", bool_(true))),
        ]))
        .unwrap();
    assert_eq!(completion.kind, CompletionType::Throw);
    assert_eq!(completion.value, Some(JsValue::from("boom")));
    assert_eq!(interp.get_global("reached"), Some(JsValue::Boolean(false)));
}

#[test]
fn test_throw_completion_carries_location() {
    let mut interp = create_test_runtime();
    let completion = interp
        .evaluate_program(&program(vec![
            expr_stmt(num(1.0)),
            throw_(num(7.0)).with_span(Span::new(4, 9)),
        ]))
        .unwrap();
    assert_eq!(completion.kind, CompletionType::Throw);
    assert_eq!(completion.location, Span::new(4, 9));
}

#[test]
fn test_uncaught_throw_is_thrown_error() {
    let err = eval_result(&program(vec![throw_(num(42.0))])).unwrap_err();
    match err {
        JsError::Thrown { value, .. } => assert_eq!(value, JsValue::Number(42.0)),
        other => panic!("expected Thrown, got {:?}", other),
    }
}

#[test]
fn test_break_carries_loop_value() {
    // var i = 0; while (true) { i = i + 1; if (i > 3) break; }
    assert_eq!(
        eval(&program(vec![
            var_("i", Some(num(0.0))),
            while_(
                bool_(true),
                block(vec![
                    expr_stmt(assign("i", add(ident("i"), num(1.0)))),
                    if_(gt(ident("i"), num(3.0)), break_(), None),
                ]),
            ),
        ])),
        JsValue::Number(4.0)
    );
}

#[test]
fn test_break_inside_if_keeps_previous_value() {
    // 1; while (true) { 2; if (true) break; }
    assert_eq!(
        eval(&program(vec![
            expr_stmt(num(1.0)),
            while_(
                bool_(true),
                block(vec![expr_stmt(num(2.0)), if_(bool_(true), break_(), None)]),
            ),
        ])),
        JsValue::Number(2.0)
    );
}

#[test]
fn test_break_through_finally_keeps_previous_value() {
    // 1; do { 2; try { break; } finally { } } while (false)
    assert_eq!(
        eval(&program(vec![
            expr_stmt(num(1.0)),
            do_while(
                block(vec![expr_stmt(num(2.0)), try_finally(vec![break_()], vec![])]),
                bool_(false),
            ),
        ])),
        JsValue::Number(2.0)
    );
}

#[test]
fn test_continue_skips_rest_of_body() {
    // var sum = 0; for (var i = 0; i < 5; i++) { if (i === 2) continue; sum += i; } sum
    assert_eq!(
        eval(&program(vec![
            var_("sum", Some(num(0.0))),
            for_(
                Some(for_var("i", num(0.0))),
                Some(lt(ident("i"), num(5.0))),
                Some(increment("i")),
                block(vec![
                    if_(strict_eq(ident("i"), num(2.0)), continue_(), None),
                    expr_stmt(add_assign("sum", ident("i"))),
                ]),
            ),
            expr_stmt(ident("sum")),
        ])),
        JsValue::Number(8.0)
    );
}

#[test]
fn test_labelled_break_exits_outer_loop() {
    // var n = 0;
    // outer: for (var i = 0; i < 3; i++) {
    //   for (var j = 0; j < 3; j++) { if (j === 1) break outer; n++; }
    // }
    // n
    assert_eq!(
        eval(&program(vec![
            var_("n", Some(num(0.0))),
            labeled(
                "outer",
                for_(
                    Some(for_var("i", num(0.0))),
                    Some(lt(ident("i"), num(3.0))),
                    Some(increment("i")),
                    block(vec![for_(
                        Some(for_var("j", num(0.0))),
                        Some(lt(ident("j"), num(3.0))),
                        Some(increment("j")),
                        block(vec![
                            if_(strict_eq(ident("j"), num(1.0)), break_label("outer"), None),
                            expr_stmt(increment("n")),
                        ]),
                    )]),
                ),
            ),
            expr_stmt(ident("n")),
        ])),
        JsValue::Number(1.0)
    );
}

#[test]
fn test_labelled_continue_targets_outer_loop() {
    // outer: for (var i = 0; i < 3; i++) {
    //   for (var j = 0; j < 3; j++) { if (j === 1) continue outer; n++; }
    // }
    assert_eq!(
        eval(&program(vec![
            var_("n", Some(num(0.0))),
            labeled(
                "outer",
                for_(
                    Some(for_var("i", num(0.0))),
                    Some(lt(ident("i"), num(3.0))),
                    Some(increment("i")),
                    block(vec![for_(
                        Some(for_var("j", num(0.0))),
                        Some(lt(ident("j"), num(3.0))),
                        Some(increment("j")),
                        block(vec![
                            if_(strict_eq(ident("j"), num(1.0)), continue_label("outer"), None),
                            expr_stmt(increment("n")),
                        ]),
                    )]),
                ),
            ),
            expr_stmt(ident("n")),
        ])),
        JsValue::Number(3.0)
    );
}

#[test]
fn test_labelled_block_break() {
    // block: { x = 1; break block; x = 2; } x
    assert_eq!(
        eval(&program(vec![
            var_("x", Some(num(0.0))),
            labeled(
                "block",
                block(vec![
                    expr_stmt(assign("x", num(1.0))),
                    break_label("block"),
                    expr_stmt(assign("x", num(2.0))),
                ]),
            ),
            expr_stmt(ident("x")),
        ])),
        JsValue::Number(1.0)
    );
}

#[test]
fn test_do_while_runs_body_once() {
    assert_eq!(
        eval(&program(vec![
            var_("n", Some(num(0.0))),
            do_while(block(vec![expr_stmt(increment("n"))]), bool_(false)),
            expr_stmt(ident("n")),
        ])),
        JsValue::Number(1.0)
    );
}

#[test]
fn test_switch_falls_through_until_break() {
    // var log = "";
    // switch (2) {
    //   case 1: log += "a"; case 2: log += "b"; case 3: log += "c"; break;
    //   default: log += "d";
    // }
    // log
    assert_eq!(
        eval(&program(vec![
            var_("log", Some(str_(""))),
            switch_(
                num(2.0),
                vec![
                    case(num(1.0), vec![expr_stmt(add_assign("log", str_("a")))]),
                    case(num(2.0), vec![expr_stmt(add_assign("log", str_("b")))]),
                    case(
                        num(3.0),
                        vec![expr_stmt(add_assign("log", str_("c"))), break_()],
                    ),
                    default_case(vec![expr_stmt(add_assign("log", str_("d")))]),
                ],
            ),
            expr_stmt(ident("log")),
        ])),
        JsValue::from("bc")
    );
}

#[test]
fn test_switch_default_when_nothing_matches() {
    assert_eq!(
        eval(&program(vec![switch_(
            str_("z"),
            vec![
                case(str_("a"), vec![expr_stmt(num(1.0))]),
                default_case(vec![expr_stmt(num(2.0))]),
                case(str_("b"), vec![expr_stmt(num(3.0))]),
            ],
        )])),
        JsValue::Number(3.0)
    );
}

#[test]
fn test_catch_binds_thrown_value() {
    assert_eq!(
        eval(&program(vec![try_catch(
            vec![throw_(num(41.0))],
            Some("e"),
            vec![expr_stmt(add(ident("e"), num(1.0)))],
        )])),
        JsValue::Number(42.0)
    );
}

#[test]
fn test_catch_receives_engine_errors_as_objects() {
    // try { null.x } catch (e) { e instanceof TypeError }
    assert_eq!(
        eval(&program(vec![try_catch(
            vec![expr_stmt(member(null(), "x"))],
            Some("e"),
            vec![expr_stmt(instanceof(ident("e"), ident("TypeError")))],
        )])),
        JsValue::Boolean(true)
    );
}

#[test]
fn test_finally_return_overrides_try_return() {
    // function f() { try { return 1 } finally { return 2 } } f()
    assert_eq!(
        eval(&program(vec![
            fn_decl(function(
                Some("f"),
                vec![],
                vec![try_finally(
                    vec![return_(Some(num(1.0)))],
                    vec![return_(Some(num(2.0)))],
                )],
            )),
            expr_stmt(call(ident("f"), vec![])),
        ])),
        JsValue::Number(2.0)
    );
}

#[test]
fn test_normal_finally_keeps_pending_return() {
    // var ran = false;
    // function f() { try { return 1 } finally { ran = true } }
    // f() + (ran ? 10 : 0)
    assert_eq!(
        eval(&program(vec![
            var_("ran", Some(bool_(false))),
            fn_decl(function(
                Some("f"),
                vec![],
                vec![try_finally(
                    vec![return_(Some(num(1.0)))],
                    vec![expr_stmt(assign("ran", bool_(true)))],
                )],
            )),
            expr_stmt(add(
                call(ident("f"), vec![]),
                cond(ident("ran"), num(10.0), num(0.0)),
            )),
        ])),
        JsValue::Number(11.0)
    );
}

#[test]
fn test_finally_runs_on_break() {
    // var log = ""; while (true) { try { break; } finally { log += "f"; } } log
    assert_eq!(
        eval(&program(vec![
            var_("log", Some(str_(""))),
            while_(
                bool_(true),
                block(vec![try_finally(
                    vec![break_()],
                    vec![expr_stmt(add_assign("log", str_("f")))],
                )]),
            ),
            expr_stmt(ident("log")),
        ])),
        JsValue::from("f")
    );
}

#[test]
fn test_throw_from_catch_runs_finally() {
    // var log = "";
    // try { try { throw 1 } catch (e) { throw 2 } finally { log += "f" } } catch (e) { log += e }
    // log
    assert_eq!(
        eval(&program(vec![
            var_("log", Some(str_(""))),
            try_catch(
                vec![try_catch_finally(
                    vec![throw_(num(1.0))],
                    Some("e"),
                    vec![throw_(num(2.0))],
                    vec![expr_stmt(add_assign("log", str_("f")))],
                )],
                Some("e"),
                vec![expr_stmt(add_assign("log", ident("e")))],
            ),
            expr_stmt(ident("log")),
        ])),
        JsValue::from("f2")
    );
}

#[test]
fn test_throw_crosses_function_boundary() {
    // function inner() { throw "deep" } function outer() { inner(); return 1 }
    // try { outer() } catch (e) { e }
    assert_eq!(
        eval(&program(vec![
            fn_decl(function(Some("inner"), vec![], vec![throw_(str_("deep"))])),
            fn_decl(function(
                Some("outer"),
                vec![],
                vec![
                    expr_stmt(call(ident("inner"), vec![])),
                    return_(Some(num(1.0))),
                ],
            )),
            try_catch(
                vec![expr_stmt(call(ident("outer"), vec![]))],
                Some("e"),
                vec![expr_stmt(ident("e"))],
            ),
        ])),
        JsValue::from("deep")
    );
}

#[test]
fn test_if_without_taken_branch_is_undefined() {
    assert_eq!(
        eval(&program(vec![
            expr_stmt(num(1.0)),
            if_(bool_(false), expr_stmt(num(2.0)), None),
        ])),
        JsValue::Undefined
    );
}

#[test]
fn test_not_a_function_message_names_callee() {
    assert!(throws_error(
        &program(vec![
            var_("x", Some(num(1.0))),
            expr_stmt(call(ident("x"), vec![])),
        ]),
        "x is not a function"
    ));
}
