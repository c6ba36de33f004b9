//! Global value properties

use crate::interpreter::Interpreter;
use crate::value::{CheapClone, JsString, JsValue, Property};

/// `globalThis`, `undefined`, `NaN` and `Infinity`
pub fn init_globals(interp: &mut Interpreter) {
    let global = interp.global.cheap_clone();
    let mut g = global.borrow_mut();
    g.define_property(
        JsString::from("globalThis"),
        Property::hidden(JsValue::Object(global.cheap_clone())),
    );
    // Non-writable, non-configurable
    for (name, value) in [
        ("undefined", JsValue::Undefined),
        ("NaN", JsValue::Number(f64::NAN)),
        ("Infinity", JsValue::Number(f64::INFINITY)),
    ] {
        g.define_property(
            JsString::from(name),
            Property::with_attributes(value, false, false, false),
        );
    }
}
