//! Error constructors and error objects

use crate::error::JsError;
use crate::interpreter::Interpreter;
use crate::value::{
    CheapClone, JsObjectRef, JsString, JsValue, NativeConstructFn, NativeFn, NativeFunction,
    Property, create_object,
};

/// Native error types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Error,
    TypeError,
    ReferenceError,
    RangeError,
    SyntaxError,
}

impl ErrorKind {
    pub const ALL: [ErrorKind; 5] = [
        ErrorKind::Error,
        ErrorKind::TypeError,
        ErrorKind::ReferenceError,
        ErrorKind::RangeError,
        ErrorKind::SyntaxError,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ErrorKind::Error => "Error",
            ErrorKind::TypeError => "TypeError",
            ErrorKind::ReferenceError => "ReferenceError",
            ErrorKind::RangeError => "RangeError",
            ErrorKind::SyntaxError => "SyntaxError",
        }
    }
}

/// Error.prototype and the native error prototypes that inherit from it
#[derive(Debug, Clone)]
pub struct ErrorPrototypes {
    pub error: JsObjectRef,
    pub type_error: JsObjectRef,
    pub reference_error: JsObjectRef,
    pub range_error: JsObjectRef,
    pub syntax_error: JsObjectRef,
}

impl ErrorPrototypes {
    pub fn new(object_prototype: &JsObjectRef) -> Self {
        let error = create_object(Some(object_prototype.cheap_clone()));
        let derived = || create_object(Some(error.cheap_clone()));
        Self {
            type_error: derived(),
            reference_error: derived(),
            range_error: derived(),
            syntax_error: derived(),
            error,
        }
    }

    pub fn get(&self, kind: ErrorKind) -> &JsObjectRef {
        match kind {
            ErrorKind::Error => &self.error,
            ErrorKind::TypeError => &self.type_error,
            ErrorKind::ReferenceError => &self.reference_error,
            ErrorKind::RangeError => &self.range_error,
            ErrorKind::SyntaxError => &self.syntax_error,
        }
    }
}

/// Generates the [[Call]] and [[Construct]] entry points of one error
/// constructor
macro_rules! error_constructor {
    ($call:ident, $construct:ident, $kind:expr) => {
        fn $call(
            interp: &mut Interpreter,
            _this: JsValue,
            args: &[JsValue],
        ) -> Result<JsValue, JsError> {
            let proto = interp.error_prototypes.get($kind).cheap_clone();
            Ok(JsValue::Object(construct_error(interp, proto, args)))
        }

        fn $construct(
            interp: &mut Interpreter,
            args: &[JsValue],
            new_target: &JsObjectRef,
        ) -> Result<JsObjectRef, JsError> {
            let proto = match new_target.borrow().get_property(&JsString::from("prototype")) {
                Some(JsValue::Object(proto)) => proto,
                _ => interp.error_prototypes.get($kind).cheap_clone(),
            };
            Ok(construct_error(interp, proto, args))
        }
    };
}

error_constructor!(error_call, error_construct, ErrorKind::Error);
error_constructor!(type_error_call, type_error_construct, ErrorKind::TypeError);
error_constructor!(reference_error_call, reference_error_construct, ErrorKind::ReferenceError);
error_constructor!(range_error_call, range_error_construct, ErrorKind::RangeError);
error_constructor!(syntax_error_call, syntax_error_construct, ErrorKind::SyntaxError);

/// Initialize Error and all derived error constructors and add them to globals
pub fn init_error(interp: &mut Interpreter) {
    for kind in ErrorKind::ALL {
        let (func, constructor): (NativeFn, NativeConstructFn) = match kind {
            ErrorKind::Error => (error_call as NativeFn, error_construct as NativeConstructFn),
            ErrorKind::TypeError => {
                (type_error_call as NativeFn, type_error_construct as NativeConstructFn)
            }
            ErrorKind::ReferenceError => {
                (reference_error_call as NativeFn, reference_error_construct as NativeConstructFn)
            }
            ErrorKind::RangeError => {
                (range_error_call as NativeFn, range_error_construct as NativeConstructFn)
            }
            ErrorKind::SyntaxError => {
                (syntax_error_call as NativeFn, syntax_error_construct as NativeConstructFn)
            }
        };
        let proto = interp.error_prototypes.get(kind).cheap_clone();
        {
            let mut p = proto.borrow_mut();
            p.define_property(JsString::from("name"), Property::hidden(JsValue::from(kind.name())));
            p.define_property(JsString::from("message"), Property::hidden(JsValue::from("")));
        }

        let ctor = interp.create_native(NativeFunction {
            name: JsString::from(kind.name()),
            func,
            arity: 1,
            constructor: Some(constructor),
        });
        // Native error constructors inherit from Error
        if kind != ErrorKind::Error {
            let parent = interp.get_global("Error").and_then(|v| v.as_object().cloned());
            if let Some(parent) = parent {
                ctor.borrow_mut().prototype = Some(parent);
            }
        }
        ctor.borrow_mut().define_property(
            JsString::from("prototype"),
            Property::with_attributes(JsValue::Object(proto.cheap_clone()), false, false, false),
        );
        proto.borrow_mut().define_property(
            JsString::from("constructor"),
            Property::hidden(JsValue::Object(ctor.cheap_clone())),
        );
        interp.set_global(kind.name(), JsValue::Object(ctor));
    }

    let error_proto = interp.error_prototypes.error.cheap_clone();
    interp.register_method(&error_proto, "toString", error_to_string, 0);
}

/// Shared body of every error constructor
fn construct_error(interp: &Interpreter, proto: JsObjectRef, args: &[JsValue]) -> JsObjectRef {
    let object = create_object(Some(proto));
    if let Some(message) = args.first().filter(|m| !m.is_undefined()) {
        object.borrow_mut().define_property(
            JsString::from("message"),
            Property::hidden(JsValue::String(message.to_js_string())),
        );
    }
    // Skip the frame of the error constructor itself
    attach_stack(interp, &object, 1);
    object
}

/// `stack`: "Name: message" followed by one line per named frame, after
/// skipping the `skip` innermost frames
fn attach_stack(interp: &Interpreter, object: &JsObjectRef, skip: usize) {
    let header = {
        let o = object.borrow();
        let name = o
            .get_property(&JsString::from("name"))
            .map(|v| v.to_js_string())
            .unwrap_or_else(|| JsString::from("Error"));
        let message = o
            .get_property(&JsString::from("message"))
            .map(|v| v.to_js_string())
            .unwrap_or_default();
        if message.is_empty() {
            name.to_string()
        } else {
            format!("{}: {}", name, message)
        }
    };
    let mut stack = header;
    for frame in interp.stack_trace().into_iter().skip(skip) {
        if frame.function_name.is_some() {
            stack.push('\n');
            stack.push_str(&frame.to_string());
        }
    }
    object.borrow_mut().define_property(
        JsString::from("stack"),
        Property::hidden(JsValue::from(stack)),
    );
}

/// Error.prototype.toString
fn error_to_string(
    interp: &mut Interpreter,
    this: JsValue,
    _args: &[JsValue],
) -> Result<JsValue, JsError> {
    let JsValue::Object(object) = &this else {
        return Err(JsError::type_error(
            "Error.prototype.toString called on non-object",
        ));
    };
    let name = interp.get(object, "name");
    let message = interp.get(object, "message");
    let name = if name.is_undefined() {
        JsString::from("Error")
    } else {
        name.to_js_string()
    };
    let message = if message.is_undefined() {
        JsString::default()
    } else {
        message.to_js_string()
    };
    Ok(JsValue::String(match (name.is_empty(), message.is_empty()) {
        (_, true) => name,
        (true, false) => message,
        (false, false) => JsString::from(format!("{}: {}", name, message)),
    }))
}

impl Interpreter {
    /// Create an error object of `kind`, as the engine raises them
    pub fn create_error(&mut self, kind: ErrorKind, message: &str) -> JsObjectRef {
        let proto = self.error_prototypes.get(kind).cheap_clone();
        let object = create_object(Some(proto));
        object.borrow_mut().define_property(
            JsString::from("message"),
            Property::hidden(JsValue::from(message)),
        );
        attach_stack(self, &object, 0);
        object
    }
}
