//! Object constructor and Object.prototype

use crate::error::JsError;
use crate::interpreter::Interpreter;
use crate::value::{
    CheapClone, JsObjectRef, JsString, JsValue, NativeFunction, Property, create_object,
};

/// Initialize Object.prototype methods
pub fn init_object_prototype(interp: &mut Interpreter) {
    let proto = interp.object_prototype.cheap_clone();
    interp.register_method(&proto, "hasOwnProperty", object_has_own_property, 1);
    interp.register_method(&proto, "isPrototypeOf", object_is_prototype_of, 1);
}

/// Create the Object constructor and register it globally
pub fn init_object_constructor(interp: &mut Interpreter) {
    let constructor = interp.create_native(NativeFunction {
        name: JsString::from("Object"),
        func: object_call,
        arity: 1,
        constructor: Some(object_construct),
    });
    interp.register_method(&constructor, "getPrototypeOf", object_get_prototype_of, 1);

    let proto = interp.object_prototype.cheap_clone();
    constructor.borrow_mut().define_property(
        JsString::from("prototype"),
        Property::with_attributes(JsValue::Object(proto.cheap_clone()), false, false, false),
    );
    proto.borrow_mut().define_property(
        JsString::from("constructor"),
        Property::hidden(JsValue::Object(constructor.cheap_clone())),
    );
    interp.set_global("Object", JsValue::Object(constructor));
}

/// Object(value): box primitives, fresh object for nullish
fn object_call(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let value = args.first().cloned().unwrap_or_default();
    if value.is_null_or_undefined() {
        return Ok(JsValue::Object(interp.create_object()));
    }
    interp.to_object(&value).map(JsValue::Object)
}

/// new Object(): subclasses get their own prototype from new.target
fn object_construct(
    interp: &mut Interpreter,
    args: &[JsValue],
    new_target: &JsObjectRef,
) -> Result<JsObjectRef, JsError> {
    let is_object_ctor = interp
        .get_global("Object")
        .and_then(|v| v.as_object().cloned())
        .is_some_and(|ctor| std::rc::Rc::ptr_eq(&ctor, new_target));
    if !is_object_ctor {
        let proto = interp.prototype_from_constructor(new_target)?;
        return Ok(create_object(Some(proto)));
    }
    match args.first() {
        Some(value) if !value.is_null_or_undefined() => interp.to_object(value),
        _ => Ok(interp.create_object()),
    }
}

/// Object.getPrototypeOf(obj)
fn object_get_prototype_of(
    interp: &mut Interpreter,
    _this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let value = args.first().cloned().unwrap_or_default();
    let object = interp.to_object(&value)?;
    let proto = object.borrow().prototype.clone();
    Ok(proto.map(JsValue::Object).unwrap_or(JsValue::Null))
}

/// Object.prototype.hasOwnProperty(key)
fn object_has_own_property(
    interp: &mut Interpreter,
    this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let key = args.first().cloned().unwrap_or_default().to_js_string();
    let object = interp.to_object(&this)?;
    let has = object.borrow().has_own_property(&key);
    Ok(JsValue::Boolean(has))
}

/// Object.prototype.isPrototypeOf(value)
fn object_is_prototype_of(
    _interp: &mut Interpreter,
    this: JsValue,
    args: &[JsValue],
) -> Result<JsValue, JsError> {
    let (Some(JsValue::Object(value)), JsValue::Object(proto)) = (args.first(), &this) else {
        return Ok(JsValue::Boolean(false));
    };
    let mut current = value.borrow().prototype.clone();
    while let Some(candidate) = current {
        if std::rc::Rc::ptr_eq(&candidate, proto) {
            return Ok(JsValue::Boolean(true));
        }
        current = candidate.borrow().prototype.clone();
    }
    Ok(JsValue::Boolean(false))
}
