//! Interpreter for executing program trees
//!
//! The [`Interpreter`] owns the global object, the intrinsic prototypes and
//! the execution context stack. Evaluation is split by concern:
//! statements and completions in `statements.rs`, expressions in
//! `expressions.rs`, the call/construct protocol in `call.rs` and the
//! generator state machine in `generator.rs`.

// Builtin function implementations (split into separate files)
pub mod builtins;

pub mod call;
pub mod completion;
pub mod context;
pub mod environment;
pub mod expressions;
pub mod generator;
pub mod statements;

use std::cell::Cell;

use tracing::warn;

use crate::ast::Program;
use crate::error::{JsError, StackFrame};
use crate::hoist::program_scope;
use crate::options::{EngineOptions, ExecutionConstraint};
use crate::value::{
    CheapClone, ExoticObject, JsFunction, JsObjectRef, JsString, JsValue, NativeFn,
    NativeFunction, Property, create_object,
};
use builtins::error::{ErrorKind, ErrorPrototypes};
use completion::{Completion, CompletionType};
use context::{ContextStack, ExecutionContext};
use environment::{EnvRef, Environment};
use generator::GeneratorRef;

/// The engine: one global environment, one context stack
pub struct Interpreter {
    /// Global object
    pub global: JsObjectRef,
    /// Global environment - bindings for global scope
    pub global_env: EnvRef,
    /// Object.prototype for all objects
    pub object_prototype: JsObjectRef,
    /// Function.prototype for function methods (call, apply, bind)
    pub function_prototype: JsObjectRef,
    /// Generator.prototype for generator methods
    pub generator_prototype: JsObjectRef,
    /// Error.prototype and the native error prototypes
    pub error_prototypes: ErrorPrototypes,
    pub(crate) stack: ContextStack,
    pub(crate) options: EngineOptions,
    constraints: Vec<Box<dyn ExecutionConstraint>>,
    /// Highest native stack address seen at an entry point
    pub(crate) native_stack_base: Cell<usize>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    pub fn new() -> Self {
        Self::with_options(EngineOptions::default())
    }

    pub fn with_options(options: EngineOptions) -> Self {
        let object_prototype = create_object(None);
        let function_prototype = create_object(Some(object_prototype.cheap_clone()));
        let generator_prototype = create_object(Some(object_prototype.cheap_clone()));
        let error_prototypes = ErrorPrototypes::new(&object_prototype);
        let global = create_object(Some(object_prototype.cheap_clone()));
        let global_env = Environment::new_global(global.cheap_clone());

        let stack = ContextStack::new();
        stack.push_root(ExecutionContext::new(
            global_env.cheap_clone(),
            global_env.cheap_clone(),
            options.strict,
        ));

        let mut interp = Self {
            global,
            global_env,
            object_prototype,
            function_prototype,
            generator_prototype,
            error_prototypes,
            stack,
            options,
            constraints: Vec::new(),
            native_stack_base: Cell::new(0),
        };
        builtins::init_builtins(&mut interp);
        interp
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    // ============ PROGRAMS ============

    /// Evaluate a script and return its completion. A script-level throw is
    /// a `Throw` completion; host aborts are `Err`.
    pub fn evaluate_program(&mut self, program: &Program) -> Result<Completion, JsError> {
        self.note_native_stack();
        for constraint in &mut self.constraints {
            constraint.reset();
        }
        let strict = program.strict || self.options.strict;
        let context = ExecutionContext::new(
            self.global_env.cheap_clone(),
            self.global_env.cheap_clone(),
            strict,
        );
        let _guard = self.stack.enter(context);

        let result = match self.global_declaration_instantiation(program) {
            Ok(()) => self.execute_statement_list(&program.body),
            Err(e) => Err(e),
        };
        match result {
            Ok(completion) => Ok(completion),
            Err(e) if e.is_host_abort() => {
                warn!(target: "jsflow::limits", error = %e, "evaluation aborted");
                Err(e)
            }
            Err(e) => {
                let location = e.location().unwrap_or(program.span);
                let value = self.error_to_value(e);
                Ok(Completion::throw(value, location))
            }
        }
    }

    /// Evaluate a script for its value; an uncaught throw becomes
    /// `JsError::Thrown`
    pub fn eval(&mut self, program: &Program) -> Result<JsValue, JsError> {
        let completion = self.evaluate_program(program)?;
        match completion.kind {
            CompletionType::Throw => Err(JsError::Thrown {
                value: completion.value_or_undefined(),
                location: Some(completion.location),
            }),
            _ => Ok(completion.value_or_undefined()),
        }
    }

    /// GlobalDeclarationInstantiation
    fn global_declaration_instantiation(&mut self, program: &Program) -> Result<(), JsError> {
        let scope = program_scope(program);
        let env = self.global_env.cheap_clone();
        let already_declared = |name: &JsString| {
            JsError::syntax_error(format!("Identifier '{}' has already been declared", name))
        };
        {
            let e = env.borrow();
            for binding in &scope.lexical {
                if e.has_var_declaration(&binding.name)
                    || e.has_lexical_declaration(&binding.name)
                    || e.has_restricted_global_property(&binding.name)
                {
                    return Err(already_declared(&binding.name));
                }
            }
            let function_names = scope.functions.iter().filter_map(|f| f.name());
            for name in scope.var_names.iter().chain(function_names) {
                if e.has_lexical_declaration(name) {
                    return Err(already_declared(name));
                }
            }
        }

        for declaration in &scope.functions {
            let Some(name) = declaration.name() else {
                continue;
            };
            let function = self.instantiate_function_object(declaration, env.cheap_clone());
            env.borrow_mut().create_global_function_binding(
                name.cheap_clone(),
                JsValue::Object(function),
                false,
            )?;
        }
        let mut e = env.borrow_mut();
        for name in &scope.var_names {
            e.create_global_var_binding(name.cheap_clone(), false)?;
        }
        for binding in &scope.lexical {
            if binding.constant {
                e.create_immutable_binding(binding.name.cheap_clone(), true)?;
            } else {
                e.create_mutable_binding(binding.name.cheap_clone(), false)?;
            }
        }
        Ok(())
    }

    // ============ RUNNING CONTEXT ============

    pub fn lexical_environment(&self) -> EnvRef {
        self.stack
            .with_current(|ctx| ctx.lexical_environment.cheap_clone())
            .unwrap_or_else(|| self.global_env.cheap_clone())
    }

    pub(crate) fn set_lexical_environment(&self, env: EnvRef) {
        self.stack
            .with_current_mut(|ctx| ctx.lexical_environment = env);
    }

    pub fn variable_environment(&self) -> EnvRef {
        self.stack
            .with_current(|ctx| ctx.variable_environment.cheap_clone())
            .unwrap_or_else(|| self.global_env.cheap_clone())
    }

    pub(crate) fn set_variable_environment(&self, env: EnvRef) {
        self.stack
            .with_current_mut(|ctx| ctx.variable_environment = env);
    }

    pub fn is_strict(&self) -> bool {
        self.stack.with_current(|ctx| ctx.strict).unwrap_or(false)
    }

    /// Generator driving the running context, if any
    pub(crate) fn current_generator(&self) -> Option<GeneratorRef> {
        self.stack.with_current(|ctx| ctx.generator()).flatten()
    }

    /// ResolveThisBinding for the running context
    pub fn get_this_binding(&self) -> Result<JsValue, JsError> {
        self.resolve_this_binding()
    }

    /// Number of live execution contexts, the global frame included
    pub fn context_depth(&self) -> usize {
        self.stack.depth()
    }

    /// Snapshot of the call stack, innermost frame first
    pub fn stack_trace(&self) -> Vec<StackFrame> {
        self.stack
            .function_names()
            .into_iter()
            .map(|name| StackFrame {
                function_name: name.map(|n| n.to_string()),
            })
            .collect()
    }

    // ============ HOST SURFACE ============

    pub fn global_object(&self) -> &JsObjectRef {
        &self.global
    }

    pub fn set_global(&mut self, name: &str, value: JsValue) {
        self.global
            .borrow_mut()
            .define_property(JsString::from(name), Property::hidden(value));
    }

    pub fn get_global(&self, name: &str) -> Option<JsValue> {
        self.global.borrow().get_property(&JsString::from(name))
    }

    /// Ordinary object inheriting from Object.prototype
    pub fn create_object(&self) -> JsObjectRef {
        create_object(Some(self.object_prototype.cheap_clone()))
    }

    /// Property lookup along the prototype chain
    pub fn get(&self, object: &JsObjectRef, key: &str) -> JsValue {
        object
            .borrow()
            .get_property(&JsString::from(key))
            .unwrap_or_default()
    }

    /// Create a native function object
    pub fn create_native_function(&self, name: &str, func: NativeFn, arity: usize) -> JsObjectRef {
        self.create_native(NativeFunction {
            name: JsString::from(name),
            func,
            arity,
            constructor: None,
        })
    }

    pub(crate) fn create_native(&self, native: NativeFunction) -> JsObjectRef {
        let name = native.name.cheap_clone();
        let arity = native.arity;
        let object = create_object(Some(self.function_prototype.cheap_clone()));
        {
            let mut obj = object.borrow_mut();
            obj.exotic = ExoticObject::Function(JsFunction::Native(native));
            obj.define_property(
                JsString::from("length"),
                Property::readonly_hidden(JsValue::Number(arity as f64)),
            );
            obj.define_property(
                JsString::from("name"),
                Property::readonly_hidden(JsValue::String(name)),
            );
        }
        object
    }

    /// Register a method on an object
    pub fn register_method(&mut self, obj: &JsObjectRef, name: &str, func: NativeFn, arity: usize) {
        let f = self.create_native_function(name, func, arity);
        obj.borrow_mut()
            .define_property(JsString::from(name), Property::hidden(JsValue::Object(f)));
    }

    /// Expose a host function as a global
    pub fn register_function(&mut self, name: &str, func: NativeFn, arity: usize) {
        let global = self.global.cheap_clone();
        self.register_method(&global, name, func, arity);
    }

    /// Install an execution limit checked before every statement
    pub fn add_constraint(&mut self, constraint: impl ExecutionConstraint + 'static) {
        self.constraints.push(Box::new(constraint));
    }

    pub(crate) fn check_constraints(&mut self) -> Result<(), JsError> {
        for constraint in &mut self.constraints {
            constraint.check()?;
        }
        Ok(())
    }

    // ============ VALUES ============

    /// Script-visible value for an engine error: thrown values pass through,
    /// engine faults become error objects
    pub fn error_to_value(&mut self, error: JsError) -> JsValue {
        let (kind, message) = match error {
            JsError::Thrown { value, .. } => return value,
            JsError::TypeError { message, .. } => (ErrorKind::TypeError, message),
            JsError::ReferenceError { message } => (ErrorKind::ReferenceError, message),
            JsError::RangeError { message } => (ErrorKind::RangeError, message),
            JsError::SyntaxError { message, .. } => (ErrorKind::SyntaxError, message),
            other => (ErrorKind::Error, other.to_string()),
        };
        JsValue::Object(self.create_error(kind, &message))
    }

    /// Build a value from JSON; arrays become array-like objects with
    /// indexed properties and `length`
    pub fn value_from_json(&self, json: &serde_json::Value) -> JsValue {
        match json {
            serde_json::Value::Null => JsValue::Null,
            serde_json::Value::Bool(b) => JsValue::Boolean(*b),
            serde_json::Value::Number(n) => JsValue::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => JsValue::from(s.as_str()),
            serde_json::Value::Array(items) => {
                let object = self.create_object();
                {
                    let mut obj = object.borrow_mut();
                    for (index, item) in items.iter().enumerate() {
                        obj.define_property(
                            JsString::from(index.to_string()),
                            Property::data(self.value_from_json(item)),
                        );
                    }
                    obj.define_property(
                        JsString::from("length"),
                        Property::hidden(JsValue::Number(items.len() as f64)),
                    );
                }
                JsValue::Object(object)
            }
            serde_json::Value::Object(map) => {
                let object = self.create_object();
                {
                    let mut obj = object.borrow_mut();
                    for (key, item) in map {
                        obj.define_property(
                            JsString::from(key.as_str()),
                            Property::data(self.value_from_json(item)),
                        );
                    }
                }
                JsValue::Object(object)
            }
        }
    }
}

impl std::fmt::Debug for Interpreter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Interpreter")
            .field("depth", &self.stack.depth())
            .field("options", &self.options)
            .field("constraints", &self.constraints.len())
            .finish_non_exhaustive()
    }
}
