//! Script and native function calls: this binding, arguments and results

use super::{create_test_runtime, eval, throws_error};
use jsflow::builder::*;
use jsflow::{Interpreter, JsError, JsValue};

#[test]
fn test_recursive_function() {
    // function fact(n) { if (n < 2) return 1; return n * fact(n - 1) } fact(5)
    assert_eq!(
        eval(&program(vec![
            fn_decl(function(
                Some("fact"),
                vec![param("n")],
                vec![
                    if_(lt(ident("n"), num(2.0)), return_(Some(num(1.0))), None),
                    return_(Some(mul(
                        ident("n"),
                        call(ident("fact"), vec![sub(ident("n"), num(1.0))]),
                    ))),
                ],
            )),
            expr_stmt(call(ident("fact"), vec![num(5.0)])),
        ])),
        JsValue::Number(120.0)
    );
}

#[test]
fn test_return_without_value_is_undefined() {
    assert_eq!(
        eval(&program(vec![
            fn_decl(function(Some("f"), vec![], vec![return_(None)])),
            expr_stmt(call(ident("f"), vec![])),
        ])),
        JsValue::Undefined
    );
}

#[test]
fn test_falling_off_the_end_is_undefined() {
    assert_eq!(
        eval(&program(vec![
            fn_decl(function(Some("f"), vec![], vec![expr_stmt(num(5.0))])),
            expr_stmt(call(ident("f"), vec![])),
        ])),
        JsValue::Undefined
    );
}

#[test]
fn test_sloppy_this_is_global_object() {
    // function f() { return this } f() === globalThis
    assert_eq!(
        eval(&program(vec![
            fn_decl(function(Some("f"), vec![], vec![return_(Some(this()))])),
            expr_stmt(strict_eq(call(ident("f"), vec![]), ident("globalThis"))),
        ])),
        JsValue::Boolean(true)
    );
}

#[test]
fn test_strict_this_stays_undefined() {
    assert_eq!(
        eval(&program(vec![
            fn_decl(strict_function(Some("f"), vec![], vec![return_(Some(typeof_(this())))])),
            expr_stmt(call(ident("f"), vec![])),
        ])),
        JsValue::from("undefined")
    );
}

#[test]
fn test_sloppy_primitive_this_is_boxed() {
    // function f() { return typeof this } f.call(5)
    assert_eq!(
        eval(&program(vec![
            fn_decl(function(Some("f"), vec![], vec![return_(Some(typeof_(this())))])),
            expr_stmt(call_method(ident("f"), "call", vec![num(5.0)])),
        ])),
        JsValue::from("object")
    );
}

#[test]
fn test_method_call_binds_receiver() {
    // var o = { v: 3, get() { return this.v } }; o.get()
    assert_eq!(
        eval(&program(vec![
            var_(
                "o",
                Some(object(vec![
                    prop("v", num(3.0)),
                    method(
                        "get",
                        function(None, vec![], vec![return_(Some(member(this(), "v")))]),
                    ),
                ])),
            ),
            expr_stmt(call_method(ident("o"), "get", vec![])),
        ])),
        JsValue::Number(3.0)
    );
}

#[test]
fn test_arrow_captures_this() {
    // var o = { v: 5, m() { const a = () => this.v; return a() } }; o.m()
    assert_eq!(
        eval(&program(vec![
            var_(
                "o",
                Some(object(vec![
                    prop("v", num(5.0)),
                    method(
                        "m",
                        function(
                            None,
                            vec![],
                            vec![
                                const_("a", func_expr(arrow_expr(vec![], member(this(), "v")))),
                                return_(Some(call(ident("a"), vec![]))),
                            ],
                        ),
                    ),
                ])),
            ),
            expr_stmt(call_method(ident("o"), "m", vec![])),
        ])),
        JsValue::Number(5.0)
    );
}

#[test]
fn test_arrow_with_block_body() {
    // const f = (a, b) => { return a + b }; f(2, 3)
    assert_eq!(
        eval(&program(vec![
            const_(
                "f",
                func_expr(arrow(
                    vec![param("a"), param("b")],
                    vec![return_(Some(add(ident("a"), ident("b"))))],
                )),
            ),
            expr_stmt(call(ident("f"), vec![num(2.0), num(3.0)])),
        ])),
        JsValue::Number(5.0)
    );
}

#[test]
fn test_function_call_and_apply() {
    // function f(a, b) { return this.base + a + b }
    // var o = { base: 100 };
    // f.call(o, 1, 2) + f.apply(o, { 0: 10, 1: 20, length: 2 })
    assert_eq!(
        eval(&program(vec![
            fn_decl(function(
                Some("f"),
                vec![param("a"), param("b")],
                vec![return_(Some(add(
                    add(member(this(), "base"), ident("a")),
                    ident("b"),
                )))],
            )),
            var_("o", Some(object(vec![prop("base", num(100.0))]))),
            expr_stmt(add(
                call_method(ident("f"), "call", vec![ident("o"), num(1.0), num(2.0)]),
                call_method(
                    ident("f"),
                    "apply",
                    vec![
                        ident("o"),
                        object(vec![
                            prop("0", num(10.0)),
                            prop("1", num(20.0)),
                            prop("length", num(2.0)),
                        ]),
                    ],
                ),
            )),
        ])),
        JsValue::Number(233.0)
    );
}

#[test]
fn test_apply_rejects_non_object_arguments() {
    assert!(throws_error(
        &program(vec![
            fn_decl(function(Some("f"), vec![], vec![])),
            expr_stmt(call_method(ident("f"), "apply", vec![null(), num(1.0)])),
        ]),
        "CreateListFromArrayLike called on non-object"
    ));
}

#[test]
fn test_function_name_and_length() {
    // function f(a, b = 1, c) {} f.name + f.length
    assert_eq!(
        eval(&program(vec![
            fn_decl(function(
                Some("f"),
                vec![param("a"), param_default("b", num(1.0)), param("c")],
                vec![],
            )),
            expr_stmt(add(member(ident("f"), "name"), member(ident("f"), "length"))),
        ])),
        JsValue::from("f1")
    );
}

#[test]
fn test_anonymous_function_takes_binding_name() {
    // var g = function () {}; const h = () => 1; g.name + h.name
    assert_eq!(
        eval(&program(vec![
            var_("g", Some(func_expr(function(None, vec![], vec![])))),
            const_("h", func_expr(arrow_expr(vec![], num(1.0)))),
            expr_stmt(add(member(ident("g"), "name"), member(ident("h"), "name"))),
        ])),
        JsValue::from("gh")
    );
}

#[test]
fn test_typeof_function() {
    assert_eq!(
        eval(&program(vec![
            fn_decl(function(Some("f"), vec![], vec![])),
            expr_stmt(typeof_(ident("f"))),
        ])),
        JsValue::from("function")
    );
}

#[test]
fn test_calling_non_callable_member() {
    assert!(throws_error(
        &program(vec![
            var_("o", Some(object(vec![]))),
            expr_stmt(call_method(ident("o"), "missing", vec![])),
        ]),
        "is not a function"
    ));
}

#[test]
fn test_arrow_is_not_a_constructor() {
    assert!(throws_error(
        &program(vec![
            const_("a", func_expr(arrow_expr(vec![], num(1.0)))),
            expr_stmt(new_(ident("a"), vec![])),
        ]),
        "a is not a constructor"
    ));
}

#[test]
fn test_method_is_not_a_constructor() {
    assert!(throws_error(
        &program(vec![
            var_(
                "o",
                Some(object(vec![method("m", function(None, vec![], vec![]))])),
            ),
            expr_stmt(new_(member(ident("o"), "m"), vec![])),
        ]),
        "is not a constructor"
    ));
}

fn sum(_interp: &mut Interpreter, _this: JsValue, args: &[JsValue]) -> Result<JsValue, JsError> {
    Ok(JsValue::Number(args.iter().map(JsValue::to_number).sum()))
}

fn fail(_interp: &mut Interpreter, _this: JsValue, _args: &[JsValue]) -> Result<JsValue, JsError> {
    Err(JsError::range_error("host refused"))
}

#[test]
fn test_native_function_call() {
    let mut interp = create_test_runtime();
    interp.register_function("sum", sum, 2);
    let result = interp
        .eval(&program(vec![expr_stmt(call(
            ident("sum"),
            vec![num(1.0), num(2.0), num(3.0)],
        ))]))
        .unwrap();
    assert_eq!(result, JsValue::Number(6.0));
}

#[test]
fn test_native_error_is_catchable() {
    // try { fail() } catch (e) { e instanceof RangeError }
    let mut interp = create_test_runtime();
    interp.register_function("fail", fail, 0);
    let result = interp
        .eval(&program(vec![try_catch(
            vec![expr_stmt(call(ident("fail"), vec![]))],
            Some("e"),
            vec![expr_stmt(instanceof(ident("e"), ident("RangeError")))],
        )]))
        .unwrap();
    assert_eq!(result, JsValue::Boolean(true));
}

#[test]
fn test_native_function_metadata() {
    let mut interp = create_test_runtime();
    interp.register_function("sum", sum, 2);
    let result = interp
        .eval(&program(vec![expr_stmt(add(
            member(ident("sum"), "name"),
            member(ident("sum"), "length"),
        ))]))
        .unwrap();
    assert_eq!(result, JsValue::from("sum2"));
}

#[test]
fn test_host_calls_script_function() {
    let mut interp = create_test_runtime();
    interp
        .eval(&program(vec![fn_decl(function(
            Some("inc"),
            vec![param("x")],
            vec![return_(Some(add(ident("x"), num(1.0))))],
        ))]))
        .unwrap();
    let inc = interp.get_global("inc").unwrap();
    let result = interp
        .call_function(&inc, JsValue::Undefined, &[JsValue::Number(41.0)])
        .unwrap();
    assert_eq!(result, JsValue::Number(42.0));
    assert_eq!(interp.context_depth(), 1);
}

#[test]
fn test_host_call_surfaces_script_throw() {
    let mut interp = create_test_runtime();
    interp
        .eval(&program(vec![fn_decl(function(
            Some("bad"),
            vec![],
            vec![throw_(str_("nope"))],
        ))]))
        .unwrap();
    let bad = interp.get_global("bad").unwrap();
    let err = interp
        .call_function(&bad, JsValue::Undefined, &[])
        .unwrap_err();
    assert_eq!(err.thrown_value(), Some(&JsValue::from("nope")));
}

#[test]
fn test_throwing_default_skips_later_defaults() {
    // var log = ""; var caught = "";
    // function thrower() { throw new Error("stop") }
    // function f(a = (log += "a", thrower()), b = (log += "b")) { log += "body" }
    // try { f() } catch (e) { caught = e.message }
    let mut interp = create_test_runtime();
    interp
        .eval(&program(vec![
            var_("log", Some(str_(""))),
            var_("caught", Some(str_(""))),
            fn_decl(function(
                Some("thrower"),
                vec![],
                vec![throw_(new_(ident("Error"), vec![str_("stop")]))],
            )),
            fn_decl(function(
                Some("f"),
                vec![
                    param_default(
                        "a",
                        sequence(vec![
                            add_assign("log", str_("a")),
                            call(ident("thrower"), vec![]),
                        ]),
                    ),
                    param_default("b", add_assign("log", str_("b"))),
                ],
                vec![expr_stmt(add_assign("log", str_("body")))],
            )),
            try_catch(
                vec![expr_stmt(call(ident("f"), vec![]))],
                Some("e"),
                vec![expr_stmt(assign("caught", member(ident("e"), "message")))],
            ),
        ]))
        .unwrap();
    assert_eq!(interp.get_global("log"), Some(JsValue::from("a")));
    assert_eq!(interp.get_global("caught"), Some(JsValue::from("stop")));
    assert_eq!(interp.context_depth(), 1);
}

#[test]
fn test_throwing_default_reaches_host_caller() {
    // function f(a = missing) {} ; host calls f()
    let mut interp = create_test_runtime();
    interp
        .eval(&program(vec![fn_decl(function(
            Some("f"),
            vec![param_default("a", ident("missing"))],
            vec![],
        ))]))
        .unwrap();
    let f = interp.get_global("f").unwrap();
    let err = interp.call_function(&f, JsValue::Undefined, &[]).unwrap_err();
    assert!(matches!(err, JsError::ReferenceError { .. }));
    assert_eq!(interp.context_depth(), 1);
}
