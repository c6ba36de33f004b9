//! JavaScript value representation
//!
//! The core JsValue type, the minimal object model, and the function records
//! the invocation protocol dispatches on.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;

use crate::ast::FunctionNode;
use crate::error::JsError;
use crate::interpreter::Interpreter;
use crate::interpreter::environment::EnvRef;
use crate::interpreter::generator::GeneratorRef;

/// Trait for types that have cheap (O(1), reference-counted) clones.
///
/// This makes it explicit when a clone only increments a reference count.
pub trait CheapClone: Clone {
    fn cheap_clone(&self) -> Self {
        self.clone()
    }
}

impl<T: ?Sized> CheapClone for Rc<T> {}

/// A JavaScript value
#[derive(Clone, Default)]
pub enum JsValue {
    #[default]
    Undefined,
    Null,
    Boolean(bool),
    Number(f64),
    String(JsString),
    Object(JsObjectRef),
}

impl CheapClone for JsValue {}

impl JsValue {
    /// Check if this value is null or undefined
    pub fn is_null_or_undefined(&self) -> bool {
        matches!(self, JsValue::Null | JsValue::Undefined)
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, JsValue::Undefined)
    }

    pub fn is_object(&self) -> bool {
        matches!(self, JsValue::Object(_))
    }

    pub fn as_object(&self) -> Option<&JsObjectRef> {
        match self {
            JsValue::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Check if this value is callable (a function)
    pub fn is_callable(&self) -> bool {
        match self {
            JsValue::Object(obj) => obj.borrow().is_callable(),
            _ => false,
        }
    }

    /// Get the typeof result for this value
    pub fn type_of(&self) -> &'static str {
        match self {
            JsValue::Undefined => "undefined",
            JsValue::Null => "object", // Historical quirk
            JsValue::Boolean(_) => "boolean",
            JsValue::Number(_) => "number",
            JsValue::String(_) => "string",
            JsValue::Object(obj) => {
                if obj.borrow().is_callable() {
                    "function"
                } else {
                    "object"
                }
            }
        }
    }

    /// Convert to boolean (ToBoolean)
    pub fn to_boolean(&self) -> bool {
        match self {
            JsValue::Undefined | JsValue::Null => false,
            JsValue::Boolean(b) => *b,
            JsValue::Number(n) => *n != 0.0 && !n.is_nan(),
            JsValue::String(s) => !s.is_empty(),
            JsValue::Object(_) => true,
        }
    }

    /// Convert to number (ToNumber)
    pub fn to_number(&self) -> f64 {
        match self {
            JsValue::Undefined => f64::NAN,
            JsValue::Null => 0.0,
            JsValue::Boolean(true) => 1.0,
            JsValue::Boolean(false) => 0.0,
            JsValue::Number(n) => *n,
            JsValue::String(s) => {
                let trimmed = s.as_str().trim();
                if trimmed.is_empty() {
                    0.0
                } else {
                    trimmed.parse::<f64>().unwrap_or(f64::NAN)
                }
            }
            JsValue::Object(obj) => match &obj.borrow().exotic {
                ExoticObject::Primitive(inner) => inner.to_number(),
                _ => f64::NAN,
            },
        }
    }

    /// Convert to string (ToString)
    pub fn to_js_string(&self) -> JsString {
        match self {
            JsValue::Undefined => JsString::from("undefined"),
            JsValue::Null => JsString::from("null"),
            JsValue::Boolean(true) => JsString::from("true"),
            JsValue::Boolean(false) => JsString::from("false"),
            JsValue::Number(n) => number_to_js_string(*n),
            JsValue::String(s) => s.cheap_clone(),
            JsValue::Object(obj) => {
                let obj = obj.borrow();
                match &obj.exotic {
                    ExoticObject::Primitive(inner) => inner.to_js_string(),
                    ExoticObject::Function(func) => {
                        JsString::from(format!("function {}() {{ [code] }}", func.name()))
                    }
                    _ => JsString::from("[object Object]"),
                }
            }
        }
    }

    /// Strict equality (===)
    pub fn strict_equals(&self, other: &JsValue) -> bool {
        match (self, other) {
            (JsValue::Undefined, JsValue::Undefined) => true,
            (JsValue::Null, JsValue::Null) => true,
            (JsValue::Boolean(a), JsValue::Boolean(b)) => a == b,
            // NaN !== NaN falls out of f64 comparison
            (JsValue::Number(a), JsValue::Number(b)) => a == b,
            (JsValue::String(a), JsValue::String(b)) => a == b,
            (JsValue::Object(a), JsValue::Object(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Loose equality (==) over primitives; objects compare by identity
    /// unless compared against a primitive, where they are unwrapped.
    pub fn loose_equals(&self, other: &JsValue) -> bool {
        match (self, other) {
            (JsValue::Undefined | JsValue::Null, JsValue::Undefined | JsValue::Null) => true,
            (JsValue::Undefined | JsValue::Null, _) | (_, JsValue::Undefined | JsValue::Null) => {
                false
            }
            (JsValue::Object(a), JsValue::Object(b)) => Rc::ptr_eq(a, b),
            (JsValue::String(a), JsValue::String(b)) => a == b,
            (JsValue::Object(_), JsValue::String(_)) | (JsValue::String(_), JsValue::Object(_)) => {
                self.to_js_string() == other.to_js_string()
            }
            _ => self.to_number() == other.to_number(),
        }
    }

    /// SameValue: like `===` but NaN equals NaN and +0 differs from -0
    pub fn same_value(&self, other: &JsValue) -> bool {
        match (self, other) {
            (JsValue::Number(a), JsValue::Number(b)) => {
                if a.is_nan() && b.is_nan() {
                    true
                } else {
                    a == b && a.is_sign_negative() == b.is_sign_negative()
                }
            }
            _ => self.strict_equals(other),
        }
    }
}

fn number_to_js_string(n: f64) -> JsString {
    if n.is_nan() {
        JsString::from("NaN")
    } else if n.is_infinite() {
        if n > 0.0 {
            JsString::from("Infinity")
        } else {
            JsString::from("-Infinity")
        }
    } else if n == 0.0 {
        JsString::from("0")
    } else {
        JsString::from(n.to_string())
    }
}

impl fmt::Debug for JsValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JsValue::Undefined => write!(f, "undefined"),
            JsValue::Null => write!(f, "null"),
            JsValue::Boolean(b) => write!(f, "{}", b),
            JsValue::Number(n) => write!(f, "{}", n),
            JsValue::String(s) => write!(f, "\"{}\"", s.as_ref()),
            JsValue::Object(obj) => match obj.try_borrow() {
                Ok(obj) => match &obj.exotic {
                    ExoticObject::Ordinary => write!(f, "{{...}}"),
                    ExoticObject::Function(func) => write!(f, "[Function: {}]", func.name()),
                    ExoticObject::Generator(_) => write!(f, "[object Generator]"),
                    ExoticObject::Primitive(inner) => write!(f, "[Object: {:?}]", inner),
                },
                Err(_) => write!(f, "[object <borrowed>]"),
            },
        }
    }
}

impl PartialEq for JsValue {
    fn eq(&self, other: &Self) -> bool {
        self.strict_equals(other)
    }
}

// Conversions from Rust types

impl From<bool> for JsValue {
    fn from(b: bool) -> Self {
        JsValue::Boolean(b)
    }
}

impl From<f64> for JsValue {
    fn from(n: f64) -> Self {
        JsValue::Number(n)
    }
}

impl From<i32> for JsValue {
    fn from(n: i32) -> Self {
        JsValue::Number(n as f64)
    }
}

impl From<&str> for JsValue {
    fn from(s: &str) -> Self {
        JsValue::String(JsString::from(s))
    }
}

impl From<String> for JsValue {
    fn from(s: String) -> Self {
        JsValue::String(JsString::from(s))
    }
}

impl From<JsString> for JsValue {
    fn from(s: JsString) -> Self {
        JsValue::String(s)
    }
}

impl From<JsObjectRef> for JsValue {
    fn from(obj: JsObjectRef) -> Self {
        JsValue::Object(obj)
    }
}

/// Reference-counted string for efficient string handling
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JsString(Rc<str>);

// JsString wraps Rc<str>, so clone is cheap (just reference count increment)
impl CheapClone for JsString {}

impl JsString {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl AsRef<str> for JsString {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::borrow::Borrow<str> for JsString {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for JsString {
    fn eq(&self, other: &str) -> bool {
        self.0.as_ref() == other
    }
}

impl PartialEq<&str> for JsString {
    fn eq(&self, other: &&str) -> bool {
        self.0.as_ref() == *other
    }
}

impl From<&str> for JsString {
    fn from(s: &str) -> Self {
        JsString(s.into())
    }
}

impl From<String> for JsString {
    fn from(s: String) -> Self {
        JsString(s.into())
    }
}

impl Default for JsString {
    fn default() -> Self {
        JsString::from("")
    }
}

impl fmt::Debug for JsString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\"", self.0)
    }
}

impl fmt::Display for JsString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::ops::Add<&JsString> for JsString {
    type Output = JsString;

    fn add(self, other: &JsString) -> JsString {
        let mut s = String::from(&*self.0);
        s.push_str(&other.0);
        JsString::from(s)
    }
}

/// Shared, mutable object handle
pub type JsObjectRef = Rc<RefCell<JsObject>>;

/// Create a new ordinary object with the given prototype
pub fn create_object(prototype: Option<JsObjectRef>) -> JsObjectRef {
    Rc::new(RefCell::new(JsObject::new(prototype, ExoticObject::Ordinary)))
}

/// Object property descriptor (data properties only)
#[derive(Debug, Clone)]
pub struct Property {
    pub value: JsValue,
    pub writable: bool,
    pub enumerable: bool,
    pub configurable: bool,
}

impl Property {
    pub fn data(value: JsValue) -> Self {
        Self {
            value,
            writable: true,
            enumerable: true,
            configurable: true,
        }
    }

    /// Writable and configurable but skipped by enumeration (methods,
    /// `constructor` links)
    pub fn hidden(value: JsValue) -> Self {
        Self {
            value,
            writable: true,
            enumerable: false,
            configurable: true,
        }
    }

    /// Function `name`/`length`: read-only, non-enumerable, configurable
    pub fn readonly_hidden(value: JsValue) -> Self {
        Self {
            value,
            writable: false,
            enumerable: false,
            configurable: true,
        }
    }

    pub fn with_attributes(
        value: JsValue,
        writable: bool,
        enumerable: bool,
        configurable: bool,
    ) -> Self {
        Self {
            value,
            writable,
            enumerable,
            configurable,
        }
    }
}

/// Exotic object behavior
#[derive(Debug)]
pub enum ExoticObject {
    /// Ordinary object
    Ordinary,
    /// Function exotic object
    Function(JsFunction),
    /// Generator instance
    Generator(GeneratorRef),
    /// Wrapper produced by ToObject on a primitive
    Primitive(JsValue),
}

/// A JavaScript object
#[derive(Debug)]
pub struct JsObject {
    pub prototype: Option<JsObjectRef>,
    pub extensible: bool,
    pub properties: IndexMap<JsString, Property, FxBuildHasher>,
    pub exotic: ExoticObject,
}

impl JsObject {
    pub fn new(prototype: Option<JsObjectRef>, exotic: ExoticObject) -> Self {
        Self {
            prototype,
            extensible: true,
            properties: IndexMap::with_hasher(FxBuildHasher),
            exotic,
        }
    }

    pub fn is_callable(&self) -> bool {
        matches!(self.exotic, ExoticObject::Function(_))
    }

    pub fn as_function(&self) -> Option<&JsFunction> {
        match &self.exotic {
            ExoticObject::Function(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_generator(&self) -> Option<&GeneratorRef> {
        match &self.exotic {
            ExoticObject::Generator(g) => Some(g),
            _ => None,
        }
    }

    pub fn get_own_property(&self, key: &JsString) -> Option<&Property> {
        self.properties.get(key)
    }

    pub fn has_own_property(&self, key: &JsString) -> bool {
        self.properties.contains_key(key)
    }

    /// [[Get]] walking the prototype chain
    pub fn get_property(&self, key: &JsString) -> Option<JsValue> {
        if let Some(prop) = self.properties.get(key) {
            return Some(prop.value.cheap_clone());
        }
        let mut current = self.prototype.clone();
        while let Some(obj) = current {
            let obj = obj.borrow();
            if let Some(prop) = obj.properties.get(key) {
                return Some(prop.value.cheap_clone());
            }
            current = obj.prototype.clone();
        }
        None
    }

    /// [[HasProperty]] walking the prototype chain
    pub fn has_property(&self, key: &JsString) -> bool {
        if self.properties.contains_key(key) {
            return true;
        }
        let mut current = self.prototype.clone();
        while let Some(obj) = current {
            let obj = obj.borrow();
            if obj.properties.contains_key(key) {
                return true;
            }
            current = obj.prototype.clone();
        }
        false
    }

    /// [[Set]] for data properties. Returns false when the write is rejected
    /// (read-only property here or on the chain, or a non-extensible object).
    pub fn set_property(&mut self, key: JsString, value: JsValue) -> bool {
        if let Some(prop) = self.properties.get_mut(&key) {
            if !prop.writable {
                return false;
            }
            prop.value = value;
            return true;
        }
        let mut current = self.prototype.clone();
        while let Some(obj) = current {
            let obj = obj.borrow();
            if let Some(prop) = obj.properties.get(&key) {
                if !prop.writable {
                    return false;
                }
                break;
            }
            current = obj.prototype.clone();
        }
        if !self.extensible {
            return false;
        }
        self.properties.insert(key, Property::data(value));
        true
    }

    /// Define (or replace) an own property
    pub fn define_property(&mut self, key: JsString, property: Property) {
        self.properties.insert(key, property);
    }

    /// [[Delete]]: false if the property exists and is non-configurable
    pub fn delete_property(&mut self, key: &JsString) -> bool {
        match self.properties.get(key) {
            Some(prop) if !prop.configurable => false,
            Some(_) => {
                self.properties.shift_remove(key);
                true
            }
            None => true,
        }
    }

    /// Own enumerable keys in insertion order
    pub fn own_keys(&self) -> Vec<JsString> {
        self.properties
            .iter()
            .filter(|(_, p)| p.enumerable)
            .map(|(k, _)| k.cheap_clone())
            .collect()
    }
}

/// How a function binds `this` on entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThisMode {
    /// Arrow functions: `this` comes from the enclosing environment
    Lexical,
    /// Strict functions: `this` is passed through unchanged
    Strict,
    /// Sloppy functions: `this` is boxed, nullish becomes the global object
    Global,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstructorKind {
    Base,
    Derived,
}

/// Function representation: a closed set of callable variants
#[derive(Debug, Clone)]
pub enum JsFunction {
    /// Function defined by script code
    Script(Rc<ScriptFunction>),
    /// `function*` defined by script code
    Generator(Rc<ScriptFunction>),
    /// Native Rust function
    Native(NativeFunction),
    /// Bound function (created by Function.prototype.bind)
    Bound(Rc<BoundFunction>),
}

impl JsFunction {
    pub fn name(&self) -> JsString {
        match self {
            JsFunction::Script(f) | JsFunction::Generator(f) => f
                .name
                .clone()
                .unwrap_or_else(|| JsString::from("anonymous")),
            JsFunction::Native(f) => f.name.cheap_clone(),
            JsFunction::Bound(_) => JsString::from("bound"),
        }
    }
}

/// Function record for script-defined functions
#[derive(Debug)]
pub struct ScriptFunction {
    pub name: Option<JsString>,
    pub node: Rc<FunctionNode>,
    /// Environment captured at creation
    pub environment: EnvRef,
    pub this_mode: ThisMode,
    pub constructor_kind: ConstructorKind,
    /// Object whose prototype `super.x` looks up from
    pub home_object: Option<JsObjectRef>,
    /// Class constructors refuse [[Call]]
    pub class_constructor: bool,
    /// Methods and arrows have no [[Construct]]
    pub constructable: bool,
    /// Synthesized constructor of a class without an explicit one
    pub default_constructor: bool,
    pub strict: bool,
}

/// Native function signature
pub type NativeFn = fn(&mut Interpreter, JsValue, &[JsValue]) -> Result<JsValue, JsError>;

/// Native [[Construct]] signature: receives the arguments and `new.target`
pub type NativeConstructFn =
    fn(&mut Interpreter, &[JsValue], &JsObjectRef) -> Result<JsObjectRef, JsError>;

/// Native function wrapper
#[derive(Clone)]
pub struct NativeFunction {
    pub name: JsString,
    pub func: NativeFn,
    pub arity: usize,
    pub constructor: Option<NativeConstructFn>,
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeFunction")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .field("constructor", &self.constructor.is_some())
            .finish()
    }
}

/// Data for a bound function
#[derive(Debug)]
pub struct BoundFunction {
    /// The target function to call
    pub target: JsObjectRef,
    /// The bound this value
    pub this_arg: JsValue,
    /// Pre-filled arguments
    pub bound_args: Vec<JsValue>,
}
