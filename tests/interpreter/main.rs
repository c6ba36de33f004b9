//! Integration tests for the interpreter, organized by feature
//!
//! These tests exercise the interpreter through the public API, with
//! programs assembled by `jsflow::builder`.
//!
//! Set `JSFLOW_LOG` to get engine tracing while a test runs:
//!
//! ```bash
//! JSFLOW_LOG=jsflow::generator=debug cargo test generator
//! ```

mod api;
mod bound;
mod completion;
mod function;
mod scope;
mod stack;

use jsflow::ast::Program;
use jsflow::{EngineOptions, Interpreter, JsError, JsValue};

/// Install a fmt subscriber when `JSFLOW_LOG` is set. Safe to call from
/// every test.
pub fn init_tracing() {
    if let Ok(filter) = std::env::var("JSFLOW_LOG") {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
            .with_test_writer()
            .try_init();
    }
}

/// Create a new interpreter with the default options
pub fn create_test_runtime() -> Interpreter {
    init_tracing();
    Interpreter::new()
}

/// Create a new interpreter with custom options
pub fn create_runtime_with(options: EngineOptions) -> Interpreter {
    init_tracing();
    Interpreter::with_options(options)
}

/// Evaluate a program in a fresh interpreter and return its value
#[allow(clippy::expect_used)]
pub fn eval(program: &Program) -> JsValue {
    eval_result(program).expect("eval failed")
}

/// Evaluate a program in a fresh interpreter, keeping errors
pub fn eval_result(program: &Program) -> Result<JsValue, JsError> {
    let mut interp = create_test_runtime();
    interp.eval(program)
}

/// Whether the program ends in an error whose text contains `fragment`
pub fn throws_error(program: &Program, fragment: &str) -> bool {
    match eval_result(program) {
        Ok(_) => false,
        Err(e) => e.to_string().contains(fragment),
    }
}

/// String contents of a value, panicking on anything else
#[allow(clippy::panic)]
pub fn as_string(value: &JsValue) -> String {
    match value {
        JsValue::String(s) => s.to_string(),
        other => panic!("expected a string, got {:?}", other),
    }
}
