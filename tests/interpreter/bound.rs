//! Bound function exotic objects

use super::{eval, throws_error};
use jsflow::builder::*;
use jsflow::JsValue;

/// function f(a, b) { return this.v + a + b }
fn adder() -> jsflow::ast::Statement {
    fn_decl(function(
        Some("f"),
        vec![param("a"), param("b")],
        vec![return_(Some(add(
            add(member(this(), "v"), ident("a")),
            ident("b"),
        )))],
    ))
}

#[test]
fn test_bind_fixes_this_and_leading_arguments() {
    // var g = f.bind({ v: 1 }, 10); g(100)
    assert_eq!(
        eval(&program(vec![
            adder(),
            var_(
                "g",
                Some(call_method(
                    ident("f"),
                    "bind",
                    vec![object(vec![prop("v", num(1.0))]), num(10.0)],
                )),
            ),
            expr_stmt(call(ident("g"), vec![num(100.0)])),
        ])),
        JsValue::Number(111.0)
    );
}

#[test]
fn test_bound_this_ignores_call_receiver() {
    // var g = f.bind({ v: 1 }, 1, 1); var o = { v: 50, g: g }; o.g()
    assert_eq!(
        eval(&program(vec![
            adder(),
            var_(
                "g",
                Some(call_method(
                    ident("f"),
                    "bind",
                    vec![object(vec![prop("v", num(1.0))]), num(1.0), num(1.0)],
                )),
            ),
            var_(
                "o",
                Some(object(vec![prop("v", num(50.0)), prop("g", ident("g"))])),
            ),
            expr_stmt(call_method(ident("o"), "g", vec![])),
        ])),
        JsValue::Number(3.0)
    );
}

#[test]
fn test_bound_name_and_length() {
    // var g = f.bind(null, 1); g.name + ":" + g.length
    assert_eq!(
        eval(&program(vec![
            adder(),
            var_("g", Some(call_method(ident("f"), "bind", vec![null(), num(1.0)]))),
            expr_stmt(add(
                add(member(ident("g"), "name"), str_(":")),
                member(ident("g"), "length"),
            )),
        ])),
        JsValue::from("bound f:1")
    );
}

#[test]
fn test_bound_length_never_negative() {
    assert_eq!(
        eval(&program(vec![
            adder(),
            expr_stmt(member(
                call_method(
                    ident("f"),
                    "bind",
                    vec![null(), num(1.0), num(2.0), num(3.0)],
                ),
                "length",
            )),
        ])),
        JsValue::Number(0.0)
    );
}

#[test]
fn test_rebinding_appends_arguments_and_keeps_this() {
    // var g = f.bind({ v: 1 }, 10); var h = g.bind({ v: 1000 }, 20); h()
    assert_eq!(
        eval(&program(vec![
            adder(),
            var_(
                "g",
                Some(call_method(
                    ident("f"),
                    "bind",
                    vec![object(vec![prop("v", num(1.0))]), num(10.0)],
                )),
            ),
            var_(
                "h",
                Some(call_method(
                    ident("g"),
                    "bind",
                    vec![object(vec![prop("v", num(1000.0))]), num(20.0)],
                )),
            ),
            expr_stmt(call(ident("h"), vec![])),
        ])),
        JsValue::Number(31.0)
    );
}

#[test]
fn test_new_on_bound_constructs_target() {
    // function P(x, y) { this.sum = x + y }
    // var B = P.bind(null, 5); var p = new B(6);
    // p.sum === 11 && p instanceof P && p instanceof B
    assert_eq!(
        eval(&program(vec![
            fn_decl(function(
                Some("P"),
                vec![param("x"), param("y")],
                vec![expr_stmt(assign_member(
                    this(),
                    "sum",
                    add(ident("x"), ident("y")),
                ))],
            )),
            var_("B", Some(call_method(ident("P"), "bind", vec![null(), num(5.0)]))),
            var_("p", Some(new_(ident("B"), vec![num(6.0)]))),
            expr_stmt(logical(
                jsflow::ast::LogicalOp::And,
                logical(
                    jsflow::ast::LogicalOp::And,
                    strict_eq(member(ident("p"), "sum"), num(11.0)),
                    instanceof(ident("p"), ident("P")),
                ),
                instanceof(ident("p"), ident("B")),
            )),
        ])),
        JsValue::Boolean(true)
    );
}

#[test]
fn test_bound_class_still_requires_new() {
    assert!(throws_error(
        &program(vec![
            class_decl(class(Some("K"), None, None, vec![])),
            var_("B", Some(call_method(ident("K"), "bind", vec![null()]))),
            expr_stmt(call(ident("B"), vec![])),
        ]),
        "cannot be invoked without 'new'"
    ));
}

#[test]
fn test_bound_class_constructs() {
    // class K { constructor(v) { this.v = v } } var B = K.bind(null, 4); new B().v
    assert_eq!(
        eval(&program(vec![
            class_decl(class(
                Some("K"),
                None,
                Some(function(
                    None,
                    vec![param("v")],
                    vec![expr_stmt(assign_member(this(), "v", ident("v")))],
                )),
                vec![],
            )),
            var_("B", Some(call_method(ident("K"), "bind", vec![null(), num(4.0)]))),
            expr_stmt(member(new_(ident("B"), vec![]), "v")),
        ])),
        JsValue::Number(4.0)
    );
}

#[test]
fn test_bound_arrow_is_not_a_constructor() {
    assert!(throws_error(
        &program(vec![
            const_("a", func_expr(arrow_expr(vec![], num(1.0)))),
            var_("B", Some(call_method(ident("a"), "bind", vec![null()]))),
            expr_stmt(new_(ident("B"), vec![])),
        ]),
        "is not a constructor"
    ));
}

#[test]
fn test_bind_requires_callable_receiver() {
    // f.bind.call(1)
    assert!(throws_error(
        &program(vec![
            adder(),
            expr_stmt(call_method(member(ident("f"), "bind"), "call", vec![num(1.0)])),
        ]),
        "Bind must be called on a function"
    ));
}

#[test]
fn test_bound_function_typeof() {
    assert_eq!(
        eval(&program(vec![
            adder(),
            expr_stmt(typeof_(call_method(ident("f"), "bind", vec![null()]))),
        ])),
        JsValue::from("function")
    );
}
