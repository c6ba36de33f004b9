//! Environment records: bindings, TDZ, closures and global declarations

use super::{create_test_runtime, eval, throws_error};
use jsflow::builder::*;
use jsflow::{CompletionType, JsValue};

#[test]
fn test_let_read_before_initialization() {
    // { x; let x = 1; }
    assert!(throws_error(
        &program(vec![block(vec![
            expr_stmt(ident("x")),
            let_("x", Some(num(1.0))),
        ])]),
        "Cannot access 'x' before initialization"
    ));
}

#[test]
fn test_let_write_before_initialization() {
    // { x = 2; let x; }
    assert!(throws_error(
        &program(vec![block(vec![
            expr_stmt(assign("x", num(2.0))),
            let_("x", None),
        ])]),
        "ReferenceError"
    ));
}

#[test]
fn test_tdz_error_is_catchable() {
    // try { x; let x = 1; } catch (e) { e instanceof ReferenceError }
    assert_eq!(
        eval(&program(vec![try_catch(
            vec![expr_stmt(ident("x")), let_("x", Some(num(1.0)))],
            Some("e"),
            vec![expr_stmt(instanceof(ident("e"), ident("ReferenceError")))],
        )])),
        JsValue::Boolean(true)
    );
}

#[test]
fn test_const_assignment_is_type_error() {
    assert!(throws_error(
        &program(vec![
            const_("c", num(1.0)),
            expr_stmt(assign("c", num(2.0))),
        ]),
        "Assignment to constant variable."
    ));
}

#[test]
fn test_let_without_initializer_is_undefined() {
    assert_eq!(
        eval(&program(vec![let_("x", None), expr_stmt(ident("x"))])),
        JsValue::Undefined
    );
}

#[test]
fn test_unresolvable_read() {
    assert!(throws_error(
        &program(vec![expr_stmt(ident("missing"))]),
        "missing is not defined"
    ));
}

#[test]
fn test_typeof_unresolvable_is_undefined() {
    assert_eq!(
        eval(&program(vec![expr_stmt(typeof_(ident("missing")))])),
        JsValue::from("undefined")
    );
}

#[test]
fn test_sloppy_write_creates_global() {
    // function f() { leaked = 1 } f(); leaked
    assert_eq!(
        eval(&program(vec![
            fn_decl(function(
                Some("f"),
                vec![],
                vec![expr_stmt(assign("leaked", num(1.0)))],
            )),
            expr_stmt(call(ident("f"), vec![])),
            expr_stmt(ident("leaked")),
        ])),
        JsValue::Number(1.0)
    );
}

#[test]
fn test_strict_write_to_unresolvable_throws() {
    assert!(throws_error(
        &strict_program(vec![expr_stmt(assign("leaked", num(1.0)))]),
        "leaked is not defined"
    ));
}

#[test]
fn test_block_shadowing() {
    // let x = 1; { let x = 2; } x
    assert_eq!(
        eval(&program(vec![
            let_("x", Some(num(1.0))),
            block(vec![let_("x", Some(num(2.0)))]),
            expr_stmt(ident("x")),
        ])),
        JsValue::Number(1.0)
    );
}

#[test]
fn test_var_is_hoisted_as_undefined() {
    assert_eq!(
        eval(&program(vec![
            expr_stmt(ident("x")),
            var_("x", Some(num(1.0))),
        ])),
        JsValue::Undefined
    );
}

#[test]
fn test_var_inside_block_is_function_scoped() {
    // function f() { { var inner = 3; } return inner } f()
    assert_eq!(
        eval(&program(vec![
            fn_decl(function(
                Some("f"),
                vec![],
                vec![
                    block(vec![var_("inner", Some(num(3.0)))]),
                    return_(Some(ident("inner"))),
                ],
            )),
            expr_stmt(call(ident("f"), vec![])),
        ])),
        JsValue::Number(3.0)
    );
}

#[test]
fn test_function_declaration_is_hoisted() {
    assert_eq!(
        eval(&program(vec![
            expr_stmt(call(ident("later"), vec![])),
            fn_decl(function(Some("later"), vec![], vec![return_(Some(str_("ok")))])),
        ])),
        JsValue::from("ok")
    );
}

#[test]
fn test_closure_keeps_its_environment() {
    // function counter() { let n = 0; return function () { n = n + 1; return n } }
    // const c = counter(); c(); c()
    assert_eq!(
        eval(&program(vec![
            fn_decl(function(
                Some("counter"),
                vec![],
                vec![
                    let_("n", Some(num(0.0))),
                    return_(Some(func_expr(function(
                        None,
                        vec![],
                        vec![
                            expr_stmt(assign("n", add(ident("n"), num(1.0)))),
                            return_(Some(ident("n"))),
                        ],
                    )))),
                ],
            )),
            const_("c", call(ident("counter"), vec![])),
            expr_stmt(call(ident("c"), vec![])),
            expr_stmt(call(ident("c"), vec![])),
        ])),
        JsValue::Number(2.0)
    );
}

#[test]
fn test_for_let_binding_per_iteration() {
    // var first; for (let i = 0; i < 3; i++) { if (i === 0) first = () => i; } first()
    assert_eq!(
        eval(&program(vec![
            var_("first", None),
            for_(
                Some(for_let("i", num(0.0))),
                Some(lt(ident("i"), num(3.0))),
                Some(increment("i")),
                block(vec![if_(
                    strict_eq(ident("i"), num(0.0)),
                    expr_stmt(assign("first", func_expr(arrow_expr(vec![], ident("i"))))),
                    None,
                )]),
            ),
            expr_stmt(call(ident("first"), vec![])),
        ])),
        JsValue::Number(0.0)
    );
}

#[test]
fn test_for_var_binding_is_shared() {
    // var last; for (var i = 0; i < 3; i++) { last = () => i; } last()
    assert_eq!(
        eval(&program(vec![
            var_("last", None),
            for_(
                Some(for_var("i", num(0.0))),
                Some(lt(ident("i"), num(3.0))),
                Some(increment("i")),
                block(vec![expr_stmt(assign(
                    "last",
                    func_expr(arrow_expr(vec![], ident("i"))),
                ))]),
            ),
            expr_stmt(call(ident("last"), vec![])),
        ])),
        JsValue::Number(3.0)
    );
}

#[test]
fn test_parameter_default_sees_earlier_parameter() {
    // function f(a, b = a + 1) { return b } f(1)
    assert_eq!(
        eval(&program(vec![
            fn_decl(function(
                Some("f"),
                vec![param("a"), param_default("b", add(ident("a"), num(1.0)))],
                vec![return_(Some(ident("b")))],
            )),
            expr_stmt(call(ident("f"), vec![num(1.0)])),
        ])),
        JsValue::Number(2.0)
    );
}

#[test]
fn test_parameter_default_not_used_when_argument_given() {
    assert_eq!(
        eval(&program(vec![
            fn_decl(function(
                Some("f"),
                vec![param_default("a", num(10.0))],
                vec![return_(Some(ident("a")))],
            )),
            expr_stmt(call(ident("f"), vec![num(3.0)])),
        ])),
        JsValue::Number(3.0)
    );
}

#[test]
fn test_missing_arguments_are_undefined() {
    assert_eq!(
        eval(&program(vec![
            fn_decl(function(
                Some("f"),
                vec![param("a"), param("b")],
                vec![return_(Some(typeof_(ident("b"))))],
            )),
            expr_stmt(call(ident("f"), vec![num(1.0)])),
        ])),
        JsValue::from("undefined")
    );
}

#[test]
fn test_named_function_expression_binding() {
    // var f = function g() { g = 1; return typeof g }; f()
    assert_eq!(
        eval(&program(vec![
            var_(
                "f",
                Some(func_expr(function(
                    Some("g"),
                    vec![],
                    vec![
                        expr_stmt(assign("g", num(1.0))),
                        return_(Some(typeof_(ident("g")))),
                    ],
                ))),
            ),
            expr_stmt(call(ident("f"), vec![])),
        ])),
        JsValue::from("function")
    );
}

#[test]
fn test_with_resolves_through_object() {
    // var o = { a: 5 }; with (o) { a = a + 1 } o.a
    assert_eq!(
        eval(&program(vec![
            var_("o", Some(object(vec![prop("a", num(5.0))]))),
            with_(
                ident("o"),
                block(vec![expr_stmt(assign("a", add(ident("a"), num(1.0))))]),
            ),
            expr_stmt(member(ident("o"), "a")),
        ])),
        JsValue::Number(6.0)
    );
}

#[test]
fn test_with_in_strict_code_is_syntax_error() {
    assert!(throws_error(
        &strict_program(vec![with_(object(vec![]), empty())]),
        "SyntaxError"
    ));
}

#[test]
fn test_strict_delete_of_identifier() {
    assert!(throws_error(
        &strict_program(vec![
            var_("x", Some(num(1.0))),
            expr_stmt(unary(jsflow::ast::UnaryOp::Delete, ident("x"))),
        ]),
        "Delete of an unqualified identifier"
    ));
}

#[test]
fn test_global_lexical_bindings_persist_between_scripts() {
    let mut interp = create_test_runtime();
    interp
        .eval(&program(vec![let_("shared", Some(num(7.0)))]))
        .unwrap();
    assert_eq!(
        interp.eval(&program(vec![expr_stmt(ident("shared"))])).unwrap(),
        JsValue::Number(7.0)
    );
}

#[test]
fn test_global_redeclaration_is_syntax_error() {
    let mut interp = create_test_runtime();
    interp.eval(&program(vec![let_("x", None)])).unwrap();
    let completion = interp.evaluate_program(&program(vec![var_("x", None)])).unwrap();
    assert_eq!(completion.kind, CompletionType::Throw);
    let message = interp.get(
        completion.value.as_ref().and_then(|v| v.as_object()).unwrap(),
        "message",
    );
    assert_eq!(
        message,
        JsValue::from("Identifier 'x' has already been declared")
    );
}

#[test]
fn test_global_var_is_global_object_property() {
    let mut interp = create_test_runtime();
    interp
        .eval(&program(vec![var_("answer", Some(num(42.0)))]))
        .unwrap();
    assert_eq!(interp.get_global("answer"), Some(JsValue::Number(42.0)));
}
