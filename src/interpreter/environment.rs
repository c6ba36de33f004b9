//! Environment records
//!
//! A scope is an [`Environment`]: one record variant plus a link to the
//! enclosing scope. Closures hold the environment that was active when they
//! were created, so records are shared through `Rc<RefCell<_>>`. Chains end
//! at the single global environment.

use std::cell::RefCell;
use std::rc::Rc;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::error::JsError;
use crate::value::{CheapClone, JsObjectRef, JsString, JsValue, Property};

pub type EnvRef = Rc<RefCell<Environment>>;

/// Variable binding
#[derive(Debug, Clone)]
pub struct Binding {
    pub value: JsValue,
    pub mutable: bool,
    pub initialized: bool,
    pub deletable: bool,
    /// Immutable bindings created in strict code reject writes loudly
    pub strict: bool,
}

fn uninitialized(name: &JsString) -> JsError {
    JsError::reference_error(format!("Cannot access '{}' before initialization", name))
}

/// Name-to-binding table shared by declarative, function and global records
#[derive(Debug, Default)]
pub struct DeclarativeRecord {
    bindings: FxHashMap<JsString, Binding>,
}

impl DeclarativeRecord {
    pub fn has_binding(&self, name: &JsString) -> bool {
        self.bindings.contains_key(name)
    }

    pub fn create_mutable_binding(
        &mut self,
        name: JsString,
        deletable: bool,
    ) -> Result<(), JsError> {
        if self.bindings.contains_key(&name) {
            return Err(JsError::syntax_error(format!(
                "Identifier '{}' has already been declared",
                name
            )));
        }
        self.bindings.insert(
            name,
            Binding {
                value: JsValue::Undefined,
                mutable: true,
                initialized: false,
                deletable,
                strict: false,
            },
        );
        Ok(())
    }

    pub fn create_immutable_binding(
        &mut self,
        name: JsString,
        strict: bool,
    ) -> Result<(), JsError> {
        if self.bindings.contains_key(&name) {
            return Err(JsError::syntax_error(format!(
                "Identifier '{}' has already been declared",
                name
            )));
        }
        self.bindings.insert(
            name,
            Binding {
                value: JsValue::Undefined,
                mutable: false,
                initialized: false,
                deletable: false,
                strict,
            },
        );
        Ok(())
    }

    pub fn initialize_binding(&mut self, name: &JsString, value: JsValue) -> Result<(), JsError> {
        let binding = self
            .bindings
            .get_mut(name)
            .ok_or_else(|| {
                JsError::internal_error(format!("no binding '{}' to initialize", name))
            })?;
        binding.value = value;
        binding.initialized = true;
        Ok(())
    }

    pub fn set_mutable_binding(
        &mut self,
        name: &JsString,
        value: JsValue,
        strict: bool,
    ) -> Result<(), JsError> {
        let Some(binding) = self.bindings.get_mut(name) else {
            if strict {
                return Err(JsError::not_defined(name.as_str()));
            }
            self.create_mutable_binding(name.cheap_clone(), true)?;
            return self.initialize_binding(name, value);
        };
        if !binding.initialized {
            return Err(uninitialized(name));
        }
        if binding.mutable {
            binding.value = value;
            Ok(())
        } else if binding.strict || strict {
            Err(JsError::type_error("Assignment to constant variable."))
        } else {
            // Sloppy write to an immutable binding is silently dropped
            Ok(())
        }
    }

    pub fn get_binding_value(&self, name: &JsString) -> Result<JsValue, JsError> {
        match self.bindings.get(name) {
            Some(binding) if binding.initialized => Ok(binding.value.cheap_clone()),
            Some(_) => Err(uninitialized(name)),
            None => Err(JsError::not_defined(name.as_str())),
        }
    }

    pub fn delete_binding(&mut self, name: &JsString) -> bool {
        match self.bindings.get(name) {
            None => true,
            Some(binding) if !binding.deletable => false,
            Some(_) => {
                self.bindings.remove(name);
                true
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThisBindingStatus {
    /// Arrow functions: no own `this`
    Lexical,
    Uninitialized,
    Initialized,
}

/// Record created for each ordinary call
#[derive(Debug)]
pub struct FunctionRecord {
    pub declarative: DeclarativeRecord,
    pub this_status: ThisBindingStatus,
    pub this_value: JsValue,
    pub function_object: JsObjectRef,
    /// `undefined` for [[Call]], the constructor target for [[Construct]]
    pub new_target: JsValue,
    pub home_object: Option<JsObjectRef>,
}

/// The outermost scope: global object properties plus a declarative part
/// for `let`/`const`/`class`
#[derive(Debug)]
pub struct GlobalRecord {
    pub object: JsObjectRef,
    pub declarative: DeclarativeRecord,
    pub var_names: FxHashSet<JsString>,
}

/// Bindings are the properties of an object (`with`)
#[derive(Debug)]
pub struct ObjectRecord {
    pub binding_object: JsObjectRef,
    pub with_environment: bool,
}

impl ObjectRecord {
    fn has_binding(&self, name: &JsString) -> bool {
        self.binding_object.borrow().has_property(name)
    }

    fn create_mutable_binding(&mut self, name: JsString, deletable: bool) {
        self.binding_object.borrow_mut().define_property(
            name,
            Property::with_attributes(JsValue::Undefined, true, true, deletable),
        );
    }

    fn set_mutable_binding(
        &mut self,
        name: &JsString,
        value: JsValue,
        strict: bool,
    ) -> Result<(), JsError> {
        let still_exists = self.has_binding(name);
        if !still_exists && strict {
            return Err(JsError::not_defined(name.as_str()));
        }
        let ok = self
            .binding_object
            .borrow_mut()
            .set_property(name.cheap_clone(), value);
        if !ok && strict {
            return Err(JsError::type_error(format!(
                "Cannot assign to read only property '{}' of object",
                name
            )));
        }
        Ok(())
    }

    fn get_binding_value(&self, name: &JsString, strict: bool) -> Result<JsValue, JsError> {
        match self.binding_object.borrow().get_property(name) {
            Some(value) => Ok(value),
            None if strict => Err(JsError::not_defined(name.as_str())),
            None => Ok(JsValue::Undefined),
        }
    }

    fn delete_binding(&mut self, name: &JsString) -> bool {
        self.binding_object.borrow_mut().delete_property(name)
    }
}

#[derive(Debug)]
pub enum EnvironmentRecord {
    Declarative(DeclarativeRecord),
    Function(FunctionRecord),
    Global(GlobalRecord),
    Object(ObjectRecord),
}

/// A scope: record plus enclosing scope
#[derive(Debug)]
pub struct Environment {
    pub outer: Option<EnvRef>,
    pub record: EnvironmentRecord,
}

impl Environment {
    pub fn new_declarative(outer: Option<EnvRef>) -> EnvRef {
        Rc::new(RefCell::new(Environment {
            outer,
            record: EnvironmentRecord::Declarative(DeclarativeRecord::default()),
        }))
    }

    pub fn new_function(
        outer: EnvRef,
        function_object: JsObjectRef,
        lexical_this: bool,
        new_target: JsValue,
        home_object: Option<JsObjectRef>,
    ) -> EnvRef {
        let this_status = if lexical_this {
            ThisBindingStatus::Lexical
        } else {
            ThisBindingStatus::Uninitialized
        };
        Rc::new(RefCell::new(Environment {
            outer: Some(outer),
            record: EnvironmentRecord::Function(FunctionRecord {
                declarative: DeclarativeRecord::default(),
                this_status,
                this_value: JsValue::Undefined,
                function_object,
                new_target,
                home_object,
            }),
        }))
    }

    pub fn new_global(global_object: JsObjectRef) -> EnvRef {
        Rc::new(RefCell::new(Environment {
            outer: None,
            record: EnvironmentRecord::Global(GlobalRecord {
                object: global_object,
                declarative: DeclarativeRecord::default(),
                var_names: FxHashSet::default(),
            }),
        }))
    }

    pub fn new_object(
        binding_object: JsObjectRef,
        with_environment: bool,
        outer: EnvRef,
    ) -> EnvRef {
        Rc::new(RefCell::new(Environment {
            outer: Some(outer),
            record: EnvironmentRecord::Object(ObjectRecord {
                binding_object,
                with_environment,
            }),
        }))
    }

    /// The binding table for declarative-like records
    fn declarative(&self) -> Option<&DeclarativeRecord> {
        match &self.record {
            EnvironmentRecord::Declarative(d) => Some(d),
            EnvironmentRecord::Function(f) => Some(&f.declarative),
            _ => None,
        }
    }

    fn declarative_mut(&mut self) -> Option<&mut DeclarativeRecord> {
        match &mut self.record {
            EnvironmentRecord::Declarative(d) => Some(d),
            EnvironmentRecord::Function(f) => Some(&mut f.declarative),
            _ => None,
        }
    }

    pub fn has_binding(&self, name: &JsString) -> bool {
        match &self.record {
            EnvironmentRecord::Global(g) => {
                g.declarative.has_binding(name) || g.object.borrow().has_property(name)
            }
            EnvironmentRecord::Object(o) => o.has_binding(name),
            _ => self.declarative().is_some_and(|d| d.has_binding(name)),
        }
    }

    pub fn create_mutable_binding(
        &mut self,
        name: JsString,
        deletable: bool,
    ) -> Result<(), JsError> {
        match &mut self.record {
            EnvironmentRecord::Global(g) => g.declarative.create_mutable_binding(name, deletable),
            EnvironmentRecord::Object(o) => {
                o.create_mutable_binding(name, deletable);
                Ok(())
            }
            EnvironmentRecord::Declarative(d) => d.create_mutable_binding(name, deletable),
            EnvironmentRecord::Function(f) => f.declarative.create_mutable_binding(name, deletable),
        }
    }

    pub fn create_immutable_binding(
        &mut self,
        name: JsString,
        strict: bool,
    ) -> Result<(), JsError> {
        match &mut self.record {
            EnvironmentRecord::Global(g) => g.declarative.create_immutable_binding(name, strict),
            EnvironmentRecord::Object(_) => Err(JsError::internal_error(
                "object environments hold no immutable bindings",
            )),
            EnvironmentRecord::Declarative(d) => d.create_immutable_binding(name, strict),
            EnvironmentRecord::Function(f) => f.declarative.create_immutable_binding(name, strict),
        }
    }

    pub fn initialize_binding(&mut self, name: &JsString, value: JsValue) -> Result<(), JsError> {
        match &mut self.record {
            EnvironmentRecord::Global(g) => {
                if g.declarative.has_binding(name) {
                    g.declarative.initialize_binding(name, value)
                } else {
                    g.object
                        .borrow_mut()
                        .set_property(name.cheap_clone(), value);
                    Ok(())
                }
            }
            EnvironmentRecord::Object(o) => o.set_mutable_binding(name, value, false),
            EnvironmentRecord::Declarative(d) => d.initialize_binding(name, value),
            EnvironmentRecord::Function(f) => f.declarative.initialize_binding(name, value),
        }
    }

    pub fn set_mutable_binding(
        &mut self,
        name: &JsString,
        value: JsValue,
        strict: bool,
    ) -> Result<(), JsError> {
        match &mut self.record {
            EnvironmentRecord::Global(g) => {
                if g.declarative.has_binding(name) {
                    return g.declarative.set_mutable_binding(name, value, strict);
                }
                let mut record = ObjectRecord {
                    binding_object: g.object.cheap_clone(),
                    with_environment: false,
                };
                record.set_mutable_binding(name, value, strict)
            }
            EnvironmentRecord::Object(o) => o.set_mutable_binding(name, value, strict),
            EnvironmentRecord::Declarative(d) => d.set_mutable_binding(name, value, strict),
            EnvironmentRecord::Function(f) => {
                f.declarative.set_mutable_binding(name, value, strict)
            }
        }
    }

    pub fn get_binding_value(&self, name: &JsString, strict: bool) -> Result<JsValue, JsError> {
        match &self.record {
            EnvironmentRecord::Global(g) => {
                if g.declarative.has_binding(name) {
                    return g.declarative.get_binding_value(name);
                }
                match g.object.borrow().get_property(name) {
                    Some(value) => Ok(value),
                    None if strict => Err(JsError::not_defined(name.as_str())),
                    None => Ok(JsValue::Undefined),
                }
            }
            EnvironmentRecord::Object(o) => o.get_binding_value(name, strict),
            EnvironmentRecord::Declarative(d) => d.get_binding_value(name),
            EnvironmentRecord::Function(f) => f.declarative.get_binding_value(name),
        }
    }

    pub fn delete_binding(&mut self, name: &JsString) -> bool {
        match &mut self.record {
            EnvironmentRecord::Global(g) => {
                if g.declarative.has_binding(name) {
                    return g.declarative.delete_binding(name);
                }
                let has_own = g.object.borrow().has_own_property(name);
                if !has_own {
                    return true;
                }
                let deleted = g.object.borrow_mut().delete_property(name);
                if deleted {
                    g.var_names.remove(name);
                }
                deleted
            }
            EnvironmentRecord::Object(o) => o.delete_binding(name),
            EnvironmentRecord::Declarative(d) => d.delete_binding(name),
            EnvironmentRecord::Function(f) => f.declarative.delete_binding(name),
        }
    }

    pub fn has_this_binding(&self) -> bool {
        match &self.record {
            EnvironmentRecord::Global(_) => true,
            EnvironmentRecord::Function(f) => f.this_status != ThisBindingStatus::Lexical,
            _ => false,
        }
    }

    pub fn get_this_binding(&self) -> Result<JsValue, JsError> {
        match &self.record {
            EnvironmentRecord::Global(g) => Ok(JsValue::Object(g.object.cheap_clone())),
            EnvironmentRecord::Function(f) => match f.this_status {
                ThisBindingStatus::Initialized => Ok(f.this_value.cheap_clone()),
                ThisBindingStatus::Uninitialized => Err(JsError::reference_error(concat!(
                    "Must call super constructor in derived class before ",
                    "accessing 'this' or returning from derived constructor"
                ))),
                ThisBindingStatus::Lexical => {
                    Err(JsError::internal_error("arrow environment has no this binding"))
                }
            },
            _ => Err(JsError::internal_error("environment has no this binding")),
        }
    }

    /// BindThisValue: only once per function environment
    pub fn bind_this_value(&mut self, value: JsValue) -> Result<(), JsError> {
        match &mut self.record {
            EnvironmentRecord::Function(f) => match f.this_status {
                ThisBindingStatus::Lexical => {
                    Err(JsError::internal_error("cannot bind this in an arrow environment"))
                }
                ThisBindingStatus::Initialized => Err(JsError::reference_error(
                    "Super constructor may only be called once",
                )),
                ThisBindingStatus::Uninitialized => {
                    f.this_value = value;
                    f.this_status = ThisBindingStatus::Initialized;
                    Ok(())
                }
            },
            _ => Err(JsError::internal_error("only function environments bind this")),
        }
    }

    /// Base object for calls through a `with` scope
    pub fn with_base_object(&self) -> Option<JsObjectRef> {
        match &self.record {
            EnvironmentRecord::Object(o) if o.with_environment => {
                Some(o.binding_object.cheap_clone())
            }
            _ => None,
        }
    }

    pub fn function_record(&self) -> Option<&FunctionRecord> {
        match &self.record {
            EnvironmentRecord::Function(f) => Some(f),
            _ => None,
        }
    }

    // Global-specific operations

    pub fn global_record(&self) -> Option<&GlobalRecord> {
        match &self.record {
            EnvironmentRecord::Global(g) => Some(g),
            _ => None,
        }
    }

    fn global_record_mut(&mut self) -> Result<&mut GlobalRecord, JsError> {
        match &mut self.record {
            EnvironmentRecord::Global(g) => Ok(g),
            _ => Err(JsError::internal_error("not a global environment")),
        }
    }

    pub fn has_var_declaration(&self, name: &JsString) -> bool {
        self.global_record().is_some_and(|g| g.var_names.contains(name))
    }

    pub fn has_lexical_declaration(&self, name: &JsString) -> bool {
        self.global_record()
            .is_some_and(|g| g.declarative.has_binding(name))
    }

    /// Own non-configurable global property (e.g. `undefined`)
    pub fn has_restricted_global_property(&self, name: &JsString) -> bool {
        self.global_record().is_some_and(|g| {
            g.object
                .borrow()
                .get_own_property(name)
                .is_some_and(|p| !p.configurable)
        })
    }

    pub fn create_global_var_binding(
        &mut self,
        name: JsString,
        deletable: bool,
    ) -> Result<(), JsError> {
        let g = self.global_record_mut()?;
        let mut object = g.object.borrow_mut();
        if !object.has_own_property(&name) && object.extensible {
            object.define_property(
                name.cheap_clone(),
                Property::with_attributes(JsValue::Undefined, true, true, deletable),
            );
        }
        drop(object);
        g.var_names.insert(name);
        Ok(())
    }

    pub fn create_global_function_binding(
        &mut self,
        name: JsString,
        value: JsValue,
        deletable: bool,
    ) -> Result<(), JsError> {
        let g = self.global_record_mut()?;
        let mut object = g.object.borrow_mut();
        let replace = object
            .get_own_property(&name)
            .is_none_or(|p| p.configurable);
        if replace {
            object.define_property(
                name.cheap_clone(),
                Property::with_attributes(value, true, true, deletable),
            );
        } else if !object.set_property(name.cheap_clone(), value) {
            return Err(JsError::type_error(format!(
                "Cannot redefine global function '{}'",
                name
            )));
        }
        drop(object);
        g.var_names.insert(name);
        Ok(())
    }
}

/// A resolved (or unresolvable) identifier
#[derive(Debug, Clone)]
pub struct Reference {
    /// Environment holding the binding; `None` when unresolvable
    pub base: Option<EnvRef>,
    pub name: JsString,
    pub strict: bool,
}

impl Reference {
    pub fn is_unresolvable(&self) -> bool {
        self.base.is_none()
    }
}

/// Walk outward from `env` until a record has `name`
pub fn get_identifier_reference(env: &EnvRef, name: &JsString, strict: bool) -> Reference {
    let mut current = Some(env.cheap_clone());
    while let Some(env) = current {
        if env.borrow().has_binding(name) {
            return Reference {
                base: Some(env),
                name: name.cheap_clone(),
                strict,
            };
        }
        current = env.borrow().outer.clone();
    }
    Reference {
        base: None,
        name: name.cheap_clone(),
        strict,
    }
}

/// Nearest environment that provides `this`
pub fn get_this_environment(env: &EnvRef) -> EnvRef {
    let mut current = env.cheap_clone();
    loop {
        let outer = {
            let borrowed = current.borrow();
            if borrowed.has_this_binding() {
                None
            } else {
                borrowed.outer.clone()
            }
        };
        match outer {
            Some(outer) => current = outer,
            None => return current,
        }
    }
}
