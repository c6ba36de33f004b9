//! Function.prototype built-in methods (call, apply, bind)

use std::cell::RefCell;
use std::rc::Rc;

use crate::error::JsError;
use crate::interpreter::Interpreter;
use crate::value::{
    BoundFunction, CheapClone, ExoticObject, JsFunction, JsObject, JsString, JsValue, Property,
};

/// Initialize Function.prototype with call, apply, bind methods
pub fn init_function_prototype(interp: &mut Interpreter) {
    let proto = interp.function_prototype.cheap_clone();

    interp.register_method(&proto, "call", function_call, 1);
    interp.register_method(&proto, "apply", function_apply, 2);
    interp.register_method(&proto, "bind", function_bind, 1);
}

// Function.prototype.call - call function with specified this value and arguments
pub fn function_call(
    interp: &mut Interpreter,
    this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    // `this` is the function to call
    // args[0] is the thisArg for the call
    // args[1..] are the arguments
    let this_arg = args.first().cloned().unwrap_or_default();
    let call_args = args.get(1..).unwrap_or_default();
    interp.call_function(&this, this_arg, call_args)
}

// Function.prototype.apply - call function with specified this value and an
// array-like of arguments
pub fn function_apply(
    interp: &mut Interpreter,
    this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let this_arg = args.first().cloned().unwrap_or_default();
    let call_args = match args.get(1) {
        None | Some(JsValue::Undefined) | Some(JsValue::Null) => Vec::new(),
        Some(JsValue::Object(list)) => {
            let list = list.borrow();
            let length = list
                .get_property(&JsString::from("length"))
                .map(|v| v.to_number())
                .unwrap_or(0.0);
            let length = if length.is_finite() && length > 0.0 {
                length as usize
            } else {
                0
            };
            (0..length)
                .map(|i| {
                    list.get_property(&JsString::from(i.to_string()))
                        .unwrap_or_default()
                })
                .collect()
        }
        Some(_) => {
            return Err(JsError::type_error(
                "CreateListFromArrayLike called on non-object",
            ));
        }
    };
    interp.call_function(&this, this_arg, &call_args)
}

// Function.prototype.bind - create a new function with bound this value and pre-filled arguments
pub fn function_bind(
    _interp: &mut Interpreter,
    this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let JsValue::Object(target) = this else {
        return Err(JsError::type_error("Bind must be called on a function"));
    };
    if !target.borrow().is_callable() {
        return Err(JsError::type_error("Bind must be called on a function"));
    }

    let this_arg = args.first().cloned().unwrap_or_default();
    let bound_args: Vec<JsValue> = args.get(1..).unwrap_or_default().to_vec();

    let (proto, target_name, target_length) = {
        let t = target.borrow();
        let name = match t.get_property(&JsString::from("name")) {
            Some(JsValue::String(name)) => name,
            _ => JsString::default(),
        };
        let length = match t.get_property(&JsString::from("length")) {
            Some(JsValue::Number(n)) => n,
            _ => 0.0,
        };
        (t.prototype.clone(), name, length)
    };
    let length = (target_length - bound_args.len() as f64).max(0.0);

    let bound = JsObject::new(
        proto,
        ExoticObject::Function(JsFunction::Bound(Rc::new(BoundFunction {
            target,
            this_arg,
            bound_args,
        }))),
    );
    let bound = Rc::new(RefCell::new(bound));
    {
        let mut b = bound.borrow_mut();
        b.define_property(
            JsString::from("name"),
            Property::readonly_hidden(JsValue::String(JsString::from("bound ") + &target_name)),
        );
        b.define_property(
            JsString::from("length"),
            Property::readonly_hidden(JsValue::Number(length)),
        );
    }
    Ok(JsValue::Object(bound))
}
