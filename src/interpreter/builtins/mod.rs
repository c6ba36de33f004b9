//! Built-in objects the control-flow core relies on

pub mod error;
pub mod function;
pub mod generator;
pub mod global;
pub mod object;

use crate::interpreter::Interpreter;

/// Populate the intrinsic prototypes and the global object
pub fn init_builtins(interp: &mut Interpreter) {
    object::init_object_prototype(interp);
    object::init_object_constructor(interp);
    function::init_function_prototype(interp);
    generator::init_generator_prototype(interp);
    error::init_error(interp);
    global::init_globals(interp);
}
