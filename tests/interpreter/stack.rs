//! Execution context stack: balance, frame names and error traces

use super::{as_string, create_runtime_with, create_test_runtime};
use jsflow::builder::*;
use jsflow::{EngineOptions, Interpreter, JsError, JsValue};

fn depth(interp: &mut Interpreter, _this: JsValue, _args: &[JsValue]) -> Result<JsValue, JsError> {
    Ok(JsValue::Number(interp.context_depth() as f64))
}

/// Named frames, innermost first, joined with commas
fn trace(interp: &mut Interpreter, _this: JsValue, _args: &[JsValue]) -> Result<JsValue, JsError> {
    let names: Vec<String> = interp
        .stack_trace()
        .into_iter()
        .filter_map(|frame| frame.function_name)
        .collect();
    Ok(JsValue::from(names.join(",")))
}

#[test]
fn test_only_global_context_when_idle() {
    let mut interp = create_test_runtime();
    assert_eq!(interp.context_depth(), 1);
    interp.eval(&program(vec![expr_stmt(num(1.0))])).unwrap();
    assert_eq!(interp.context_depth(), 1);
}

#[test]
fn test_depth_during_script_and_calls() {
    // function f() { return depth() } [depth(), f()]
    let mut interp = create_test_runtime();
    interp.register_function("depth", depth, 0);
    let at_top = interp
        .eval(&program(vec![expr_stmt(call(ident("depth"), vec![]))]))
        .unwrap();
    // global + script + native
    assert_eq!(at_top, JsValue::Number(3.0));

    let in_function = interp
        .eval(&program(vec![
            fn_decl(function(
                Some("f"),
                vec![],
                vec![return_(Some(call(ident("depth"), vec![])))],
            )),
            expr_stmt(call(ident("f"), vec![])),
        ]))
        .unwrap();
    assert_eq!(in_function, JsValue::Number(4.0));
}

#[test]
fn test_stack_balanced_after_caught_throw() {
    // function g() { throw 1 }
    // function f() { try { g() } catch (e) {} return depth() }
    // f()
    let mut interp = create_test_runtime();
    interp.register_function("depth", depth, 0);
    let result = interp
        .eval(&program(vec![
            fn_decl(function(Some("g"), vec![], vec![throw_(num(1.0))])),
            fn_decl(function(
                Some("f"),
                vec![],
                vec![
                    try_catch(vec![expr_stmt(call(ident("g"), vec![]))], Some("e"), vec![]),
                    return_(Some(call(ident("depth"), vec![]))),
                ],
            )),
            expr_stmt(call(ident("f"), vec![])),
        ]))
        .unwrap();
    assert_eq!(result, JsValue::Number(4.0));
}

#[test]
fn test_stack_balanced_after_uncaught_throw() {
    let mut interp = create_test_runtime();
    let result = interp.eval(&program(vec![
        fn_decl(function(
            Some("boom"),
            vec![],
            vec![expr_stmt(member(undefined(), "x"))],
        )),
        expr_stmt(call(ident("boom"), vec![])),
    ]));
    assert!(result.is_err());
    assert_eq!(interp.context_depth(), 1);
}

#[test]
fn test_stack_trace_names_innermost_first() {
    // function f() { return g() } function g() { return trace() } f()
    let mut interp = create_test_runtime();
    interp.register_function("trace", trace, 0);
    let result = interp
        .eval(&program(vec![
            fn_decl(function(
                Some("f"),
                vec![],
                vec![return_(Some(call(ident("g"), vec![])))],
            )),
            fn_decl(function(
                Some("g"),
                vec![],
                vec![return_(Some(call(ident("trace"), vec![])))],
            )),
            expr_stmt(call(ident("f"), vec![])),
        ]))
        .unwrap();
    assert_eq!(as_string(&result), "trace,g,f");
}

#[test]
fn test_anonymous_function_frame() {
    // (function () { return trace() })()
    let mut interp = create_test_runtime();
    interp.register_function("trace", trace, 0);
    let result = interp
        .eval(&program(vec![expr_stmt(call(
            func_expr(function(
                None,
                vec![],
                vec![return_(Some(call(ident("trace"), vec![])))],
            )),
            vec![],
        ))]))
        .unwrap();
    assert_eq!(as_string(&result), "trace,<anonymous>");
}

#[test]
fn test_debug_names_disabled() {
    let mut interp = create_runtime_with(EngineOptions {
        debug_names: false,
        ..EngineOptions::default()
    });
    interp.register_function("trace", trace, 0);
    let result = interp
        .eval(&program(vec![
            fn_decl(function(
                Some("f"),
                vec![],
                vec![return_(Some(call(ident("trace"), vec![])))],
            )),
            expr_stmt(call(ident("f"), vec![])),
        ]))
        .unwrap();
    assert_eq!(as_string(&result), "");
}

#[test]
fn test_error_stack_lists_calling_functions() {
    // function outer() { return inner() }
    // function inner() { return new Error("bad") }
    // outer().stack
    let stack = super::eval(&program(vec![
        fn_decl(function(
            Some("outer"),
            vec![],
            vec![return_(Some(call(ident("inner"), vec![])))],
        )),
        fn_decl(function(
            Some("inner"),
            vec![],
            vec![return_(Some(new_(ident("Error"), vec![str_("bad")])))],
        )),
        expr_stmt(member(call(ident("outer"), vec![]), "stack")),
    ]));
    assert_eq!(as_string(&stack), "Error: bad\n    at inner\n    at outer");
}

#[test]
fn test_engine_error_stack() {
    // function f() { try { null.x } catch (e) { return e.stack } }
    let stack = super::eval(&program(vec![
        fn_decl(function(
            Some("f"),
            vec![],
            vec![try_catch(
                vec![expr_stmt(member(null(), "x"))],
                Some("e"),
                vec![return_(Some(member(ident("e"), "stack")))],
            )],
        )),
        expr_stmt(call(ident("f"), vec![])),
    ]));
    let stack = as_string(&stack);
    assert!(stack.starts_with("TypeError: Cannot read properties of null"));
    assert!(stack.ends_with("    at f"));
}
