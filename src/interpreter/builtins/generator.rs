//! Generator built-in methods

use crate::error::JsError;
use crate::interpreter::Interpreter;
use crate::interpreter::generator::GeneratorBrand;
use crate::value::{CheapClone, JsString, JsValue, Property};

/// Initialize Generator.prototype
pub fn init_generator_prototype(interp: &mut Interpreter) {
    let proto = interp.generator_prototype.cheap_clone();

    proto.borrow_mut().define_property(
        JsString::from("@@toStringTag"),
        Property::readonly_hidden(JsValue::from("Generator")),
    );

    interp.register_method(&proto, "next", generator_next, 1);
    interp.register_method(&proto, "return", generator_return, 1);
    interp.register_method(&proto, "throw", generator_throw, 1);
}

/// Generator.prototype.next(value)
pub fn generator_next(
    interp: &mut Interpreter,
    this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let value = args.first().cloned().unwrap_or_default();
    interp.generator_resume(&this, value, GeneratorBrand::EMPTY)
}

/// Generator.prototype.return(value)
pub fn generator_return(
    interp: &mut Interpreter,
    this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let value = args.first().cloned().unwrap_or_default();
    interp.generator_return(&this, value, GeneratorBrand::EMPTY)
}

/// Generator.prototype.throw(exception)
pub fn generator_throw(
    interp: &mut Interpreter,
    this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let exception = args.first().cloned().unwrap_or_default();
    interp.generator_throw(&this, exception, GeneratorBrand::EMPTY)
}
