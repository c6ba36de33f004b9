//! Control-flow and invocation engine for a prototype-based scripting language
//!
//! Programs arrive as trees (from an external parser, or assembled with
//! [`builder`]). The [`Interpreter`] evaluates them with completion records,
//! an environment record chain, an execution context stack and the
//! call/construct protocol for script, native, bound and generator functions.
//!
//! # Example
//!
//! ```
//! use jsflow::builder::*;
//! use jsflow::{Interpreter, JsValue};
//!
//! let mut interp = Interpreter::new();
//! let program = program(vec![
//!     fn_decl(function(Some("double"), vec![param("x")], vec![
//!         return_(Some(mul(ident("x"), num(2.0)))),
//!     ])),
//!     expr_stmt(call(ident("double"), vec![num(21.0)])),
//! ]);
//! assert_eq!(interp.eval(&program).unwrap(), JsValue::Number(42.0));
//! ```

pub mod ast;
pub mod builder;
pub mod error;
pub mod hoist;
pub mod interpreter;
pub mod options;
pub mod value;

pub use error::{JsError, StackFrame};
pub use interpreter::Interpreter;
pub use interpreter::completion::{Completion, CompletionType};
pub use interpreter::generator::{GeneratorBrand, GeneratorState};
pub use options::{EngineOptions, ExecutionConstraint, MaxStatements};
pub use value::CheapClone;
pub use value::JsObjectRef;
pub use value::JsString;
pub use value::JsValue;
