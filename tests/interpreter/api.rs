//! Host-facing API: options, globals, host calls and value conversion

use std::rc::Rc;

use super::{create_runtime_with, create_test_runtime};
use jsflow::builder::*;
use jsflow::{CompletionType, EngineOptions, Interpreter, JsError, JsValue};

#[test]
fn test_options_from_json() {
    let json = r#"{
        "strict": true,
        "maxRecursionDepth": 64,
        "maxNativeStack": 65536,
        "debugNames": false
    }"#;
    let options = EngineOptions::from_json(json).unwrap();
    assert_eq!(
        options,
        EngineOptions {
            strict: true,
            max_recursion_depth: Some(64),
            max_native_stack: Some(65536),
            debug_names: false,
        }
    );
    let round_trip = serde_json::to_string(&options).unwrap();
    assert_eq!(EngineOptions::from_json(&round_trip).unwrap(), options);
}

#[test]
fn test_strict_option_applies_to_every_script() {
    let mut interp = create_runtime_with(EngineOptions::default().strict(true));
    assert!(interp.options().strict);
    let err = interp
        .eval(&program(vec![expr_stmt(assign("leaked", num(1.0)))]))
        .unwrap_err();
    assert!(err.to_string().contains("leaked is not defined"));
}

#[test]
fn test_evaluate_returns_normal_completion() {
    let mut interp = create_test_runtime();
    let completion = interp
        .evaluate_program(&program(vec![expr_stmt(add(num(1.0), num(2.0)))]))
        .unwrap();
    assert_eq!(completion.kind, CompletionType::Normal);
    assert_eq!(completion.value, Some(JsValue::Number(3.0)));
}

#[test]
fn test_set_and_get_global() {
    let mut interp = create_test_runtime();
    interp.set_global("limit", JsValue::Number(10.0));
    let result = interp
        .eval(&program(vec![expr_stmt(mul(ident("limit"), num(2.0)))]))
        .unwrap();
    assert_eq!(result, JsValue::Number(20.0));
    assert_eq!(interp.get_global("nothing"), None);
}

#[test]
fn test_global_this_is_global_object() {
    let mut interp = create_test_runtime();
    let result = interp
        .eval(&program(vec![expr_stmt(ident("globalThis"))]))
        .unwrap();
    let global = result.as_object().unwrap();
    assert!(Rc::ptr_eq(global, interp.global_object()));
}

#[test]
fn test_undefined_global_is_read_only() {
    // undefined = 1; typeof undefined
    assert_eq!(
        super::eval(&program(vec![
            expr_stmt(assign("undefined", num(1.0))),
            expr_stmt(typeof_(ident("undefined"))),
        ])),
        JsValue::from("undefined")
    );
}

#[test]
fn test_value_from_json() {
    let mut interp = create_test_runtime();
    let config = interp.value_from_json(&serde_json::json!({
        "name": "job",
        "retries": 3,
        "tags": ["a", "b"],
        "owner": null
    }));
    interp.set_global("config", config);
    let result = interp
        .eval(&program(vec![expr_stmt(add(
            add(member(ident("config"), "name"), member(ident("config"), "retries")),
            member(member(ident("config"), "tags"), "length"),
        ))]))
        .unwrap();
    assert_eq!(result, JsValue::from("job32"));

    let tags = interp
        .eval(&program(vec![expr_stmt(index(
            member(ident("config"), "tags"),
            num(1.0),
        ))]))
        .unwrap();
    assert_eq!(tags, JsValue::from("b"));
}

#[test]
fn test_host_construct() {
    let mut interp = create_test_runtime();
    interp
        .eval(&program(vec![fn_decl(function(
            Some("Box"),
            vec![param("v")],
            vec![expr_stmt(assign_member(this(), "v", ident("v")))],
        ))]))
        .unwrap();
    let ctor = interp.get_global("Box").unwrap();
    assert!(interp.is_constructor(&ctor));
    let instance = interp.construct(&ctor, &[JsValue::from("x")], None).unwrap();
    assert_eq!(interp.get(&instance, "v"), JsValue::from("x"));
}

#[test]
fn test_host_construct_rejects_non_constructor() {
    let mut interp = create_test_runtime();
    let err = interp
        .construct(&JsValue::Number(1.0), &[], None)
        .unwrap_err();
    assert!(matches!(err, JsError::TypeError { .. }));
}

#[test]
fn test_error_to_value_uses_native_prototypes() {
    let mut interp = create_test_runtime();
    let value = interp.error_to_value(JsError::type_error("bad input"));
    let object = value.as_object().unwrap();
    let proto = object.borrow().prototype.clone().unwrap();
    assert!(Rc::ptr_eq(&proto, &interp.error_prototypes.type_error));
    assert_eq!(interp.get(object, "message"), JsValue::from("bad input"));
    assert_eq!(interp.get(object, "name"), JsValue::from("TypeError"));

    let thrown = interp.error_to_value(JsError::thrown(JsValue::Number(5.0)));
    assert_eq!(thrown, JsValue::Number(5.0));
}

#[test]
fn test_error_to_string() {
    // new RangeError("too far").toString()
    assert_eq!(
        super::eval(&program(vec![expr_stmt(call_method(
            new_(ident("RangeError"), vec![str_("too far")]),
            "toString",
            vec![],
        ))])),
        JsValue::from("RangeError: too far")
    );
}

#[test]
fn test_error_called_without_new() {
    // Error("plain") instanceof Error
    assert_eq!(
        super::eval(&program(vec![expr_stmt(instanceof(
            call(ident("Error"), vec![str_("plain")]),
            ident("Error"),
        ))])),
        JsValue::Boolean(true)
    );
}

#[test]
fn test_uncaught_error_display() {
    let mut interp = create_test_runtime();
    let err = interp
        .eval(&program(vec![throw_(new_(ident("TypeError"), vec![str_("nope")]))]))
        .unwrap_err();
    assert!(err.to_string().starts_with("Uncaught TypeError: nope"));
}

#[test]
fn test_idle_interpreter_runs_in_global_scope() {
    let interp = Interpreter::default();
    assert!(Rc::ptr_eq(&interp.lexical_environment(), &interp.global_env));
    assert!(Rc::ptr_eq(&interp.variable_environment(), &interp.global_env));
    assert!(!interp.is_strict());
    let this = interp.get_this_binding().unwrap();
    assert!(Rc::ptr_eq(this.as_object().unwrap(), &interp.global));
}

#[test]
fn test_debug_output_mentions_depth() {
    let interp = create_test_runtime();
    assert!(format!("{:?}", interp).contains("depth: 1"));
}
