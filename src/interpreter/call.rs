//! Function objects and the [[Call]] / [[Construct]] protocol
//!
//! Script calls run PrepareForOrdinaryCall (fresh function environment and
//! execution context), OrdinaryCallBindThis, FunctionDeclarationInstantiation
//! and then the body. Native calls get their own context too so stack traces
//! and depth limits see them. Bound functions forward to their target.

use std::rc::Rc;

use rustc_hash::FxHashSet;
use tracing::{trace, warn};

use super::Interpreter;
use super::completion::{Completion, CompletionType};
use super::context::{ContextGuard, ExecutionContext};
use super::environment::{EnvRef, Environment};
use crate::ast::{FunctionBody, FunctionNode};
use crate::error::JsError;
use crate::hoist::function_scope;
use crate::value::{
    CheapClone, ConstructorKind, ExoticObject, JsFunction, JsObject, JsObjectRef, JsString,
    JsValue, NativeFunction, Property, ScriptFunction, ThisMode, create_object,
};

/// How a script function object is being created
#[derive(Debug, Default)]
pub(crate) struct FunctionCreation {
    /// Name to use when the node has none (NamedEvaluation, methods)
    pub name: Option<JsString>,
    pub home_object: Option<JsObjectRef>,
    /// Object literal or class methods: no [[Construct]]
    pub method: bool,
    pub class_constructor: bool,
    pub derived: bool,
    pub default_constructor: bool,
    /// [[Prototype]] of the function object, defaults to Function.prototype
    pub function_prototype: Option<JsObjectRef>,
    /// Class bodies are always strict
    pub strict: bool,
}

/// Address of a local in a frame that is never inlined
#[inline(never)]
fn native_stack_position() -> usize {
    let marker = 0u8;
    std::hint::black_box(&marker) as *const u8 as usize
}

impl Interpreter {
    // ============ CREATION ============

    /// OrdinaryFunctionCreate followed by SetFunctionName, SetFunctionLength
    /// and MakeConstructor where it applies
    pub(crate) fn create_script_function(
        &mut self,
        node: &Rc<FunctionNode>,
        environment: EnvRef,
        creation: FunctionCreation,
    ) -> JsObjectRef {
        let strict = creation.strict || node.strict || self.is_strict();
        let this_mode = if node.arrow {
            ThisMode::Lexical
        } else if strict {
            ThisMode::Strict
        } else {
            ThisMode::Global
        };
        let constructable = creation.class_constructor
            || !(node.arrow || node.generator || creation.method);
        let name = node.name().cloned().or(creation.name);

        let function = Rc::new(ScriptFunction {
            name: name.clone(),
            node: node.cheap_clone(),
            environment,
            this_mode,
            constructor_kind: if creation.derived {
                ConstructorKind::Derived
            } else {
                ConstructorKind::Base
            },
            home_object: creation.home_object,
            class_constructor: creation.class_constructor,
            constructable,
            default_constructor: creation.default_constructor,
            strict,
        });
        let exotic = if node.generator {
            ExoticObject::Function(JsFunction::Generator(function))
        } else {
            ExoticObject::Function(JsFunction::Script(function))
        };
        let proto = creation
            .function_prototype
            .unwrap_or_else(|| self.function_prototype.cheap_clone());
        let object = Rc::new(std::cell::RefCell::new(JsObject::new(Some(proto), exotic)));
        {
            let mut obj = object.borrow_mut();
            obj.define_property(
                JsString::from("length"),
                Property::readonly_hidden(JsValue::Number(node.expected_argument_count() as f64)),
            );
            obj.define_property(
                JsString::from("name"),
                Property::readonly_hidden(JsValue::String(name.unwrap_or_default())),
            );
        }

        if node.generator {
            // Generator instances inherit from F.prototype, which has no
            // constructor link
            let prototype = create_object(Some(self.generator_prototype.cheap_clone()));
            object.borrow_mut().define_property(
                JsString::from("prototype"),
                Property::with_attributes(JsValue::Object(prototype), true, false, false),
            );
        } else if constructable && !creation.class_constructor {
            let prototype = create_object(Some(self.object_prototype.cheap_clone()));
            prototype.borrow_mut().define_property(
                JsString::from("constructor"),
                Property::hidden(JsValue::Object(object.cheap_clone())),
            );
            object.borrow_mut().define_property(
                JsString::from("prototype"),
                Property::with_attributes(JsValue::Object(prototype), true, false, false),
            );
        }
        object
    }

    /// InstantiateFunctionObject for hoisted declarations
    pub(crate) fn instantiate_function_object(
        &mut self,
        node: &Rc<FunctionNode>,
        environment: EnvRef,
    ) -> JsObjectRef {
        self.create_script_function(node, environment, FunctionCreation::default())
    }

    // ============ INVOCATION ============

    /// [[Call]] on any callable value
    pub fn call_function(
        &mut self,
        callee: &JsValue,
        this: JsValue,
        args: &[JsValue],
    ) -> Result<JsValue, JsError> {
        let JsValue::Object(object) = callee else {
            return Err(JsError::type_error(format!(
                "{} is not a function",
                callee.to_js_string()
            )));
        };
        let function = object.borrow().as_function().cloned();
        match function {
            None => Err(JsError::type_error("object is not a function")),
            Some(JsFunction::Script(f)) => {
                if f.class_constructor {
                    return Err(JsError::type_error(format!(
                        "Class constructor {} cannot be invoked without 'new'",
                        f.name.clone().unwrap_or_default()
                    )));
                }
                self.ordinary_call(object, &f, this, args)
            }
            Some(JsFunction::Generator(f)) => self.generator_start(object, &f, this, args),
            Some(JsFunction::Native(native)) => self.call_native(&native, this, args),
            Some(JsFunction::Bound(bound)) => {
                let mut full_args = bound.bound_args.clone();
                full_args.extend_from_slice(args);
                let target = JsValue::Object(bound.target.cheap_clone());
                self.call_function(&target, bound.this_arg.cheap_clone(), &full_args)
            }
        }
    }

    /// [[Construct]]. `new_target` defaults to the callee itself.
    pub fn construct(
        &mut self,
        callee: &JsValue,
        args: &[JsValue],
        new_target: Option<&JsValue>,
    ) -> Result<JsObjectRef, JsError> {
        let not_constructor =
            || JsError::type_error(format!("{} is not a constructor", callee.to_js_string()));
        let JsValue::Object(object) = callee else {
            return Err(not_constructor());
        };
        let new_target = match new_target {
            Some(JsValue::Object(target)) => target.cheap_clone(),
            _ => object.cheap_clone(),
        };
        let function = object.borrow().as_function().cloned();
        match function {
            Some(JsFunction::Script(f)) if f.constructable => {
                self.construct_script(object, &f, args, new_target)
            }
            Some(JsFunction::Native(native)) => {
                let Some(construct_fn) = native.constructor else {
                    return Err(not_constructor());
                };
                let _guard = self.enter_native(&native)?;
                construct_fn(self, args, &new_target)
            }
            Some(JsFunction::Bound(bound)) => {
                let mut full_args = bound.bound_args.clone();
                full_args.extend_from_slice(args);
                let target = JsValue::Object(bound.target.cheap_clone());
                let new_target = if Rc::ptr_eq(&new_target, object) {
                    target.cheap_clone()
                } else {
                    JsValue::Object(new_target)
                };
                self.construct(&target, &full_args, Some(&new_target))
            }
            _ => Err(not_constructor()),
        }
    }

    /// IsConstructor
    pub fn is_constructor(&self, value: &JsValue) -> bool {
        let JsValue::Object(object) = value else {
            return false;
        };
        match object.borrow().as_function() {
            Some(JsFunction::Script(f)) => f.constructable,
            Some(JsFunction::Native(native)) => native.constructor.is_some(),
            Some(JsFunction::Bound(bound)) => {
                self.is_constructor(&JsValue::Object(bound.target.cheap_clone()))
            }
            Some(JsFunction::Generator(_)) | None => false,
        }
    }

    fn ordinary_call(
        &mut self,
        object: &JsObjectRef,
        function: &ScriptFunction,
        this: JsValue,
        args: &[JsValue],
    ) -> Result<JsValue, JsError> {
        trace!(
            target: "jsflow::call",
            function = %function.name.clone().unwrap_or_default(),
            argc = args.len(),
            "call"
        );
        let (env, _guard) = self.prepare_for_ordinary_call(object, function, JsValue::Undefined)?;
        self.ordinary_call_bind_this(function, &env, this)?;
        self.execute_function_body(function, &env, args)
    }

    fn construct_script(
        &mut self,
        object: &JsObjectRef,
        function: &ScriptFunction,
        args: &[JsValue],
        new_target: JsObjectRef,
    ) -> Result<JsObjectRef, JsError> {
        trace!(
            target: "jsflow::call",
            function = %function.name.clone().unwrap_or_default(),
            argc = args.len(),
            "construct"
        );
        let derived = function.constructor_kind == ConstructorKind::Derived;
        let this_argument = if derived {
            None
        } else {
            let proto = self.prototype_from_constructor(&new_target)?;
            Some(create_object(Some(proto)))
        };

        let (env, _guard) = self.prepare_for_ordinary_call(
            object,
            function,
            JsValue::Object(new_target.cheap_clone()),
        )?;
        if let Some(this) = &this_argument {
            self.ordinary_call_bind_this(function, &env, JsValue::Object(this.cheap_clone()))?;
        }
        let result = if derived && function.default_constructor {
            self.default_derived_construct(object, &env, args, new_target)?
        } else {
            self.execute_function_body(function, &env, args)?
        };

        if let JsValue::Object(returned) = result {
            return Ok(returned);
        }
        if let Some(this) = this_argument {
            return Ok(this);
        }
        if !result.is_undefined() {
            return Err(JsError::type_error(
                "Derived constructors may only return object or undefined",
            ));
        }
        let this = env.borrow().get_this_binding()?;
        match this {
            JsValue::Object(this) => Ok(this),
            _ => Err(JsError::internal_error("derived constructor bound a primitive this")),
        }
    }

    /// `constructor(...args) { super(...args); }` without evaluating any code
    fn default_derived_construct(
        &mut self,
        object: &JsObjectRef,
        env: &EnvRef,
        args: &[JsValue],
        new_target: JsObjectRef,
    ) -> Result<JsValue, JsError> {
        let parent = object
            .borrow()
            .prototype
            .clone()
            .map(JsValue::Object)
            .unwrap_or_default();
        if !self.is_constructor(&parent) {
            return Err(JsError::type_error("Super constructor is not a constructor"));
        }
        let this = self.construct(&parent, args, Some(&JsValue::Object(new_target)))?;
        env.borrow_mut().bind_this_value(JsValue::Object(this))?;
        Ok(JsValue::Undefined)
    }

    /// GetPrototypeFromConstructor with Object.prototype as the fallback
    pub(crate) fn prototype_from_constructor(
        &self,
        constructor: &JsObjectRef,
    ) -> Result<JsObjectRef, JsError> {
        let proto = constructor
            .borrow()
            .get_property(&JsString::from("prototype"));
        Ok(match proto {
            Some(JsValue::Object(proto)) => proto,
            _ => self.object_prototype.cheap_clone(),
        })
    }

    /// PrepareForOrdinaryCall: new function environment and a new running
    /// execution context. The context is popped when the guard drops.
    pub(crate) fn prepare_for_ordinary_call(
        &mut self,
        object: &JsObjectRef,
        function: &ScriptFunction,
        new_target: JsValue,
    ) -> Result<(EnvRef, ContextGuard), JsError> {
        self.check_recursion_depth()?;
        let env = Environment::new_function(
            function.environment.cheap_clone(),
            object.cheap_clone(),
            function.this_mode == ThisMode::Lexical,
            new_target,
            function.home_object.clone(),
        );
        let name = self
            .options
            .debug_names
            .then(|| function.name.clone().unwrap_or_else(|| JsString::from("<anonymous>")));
        let context = ExecutionContext::new(env.cheap_clone(), env.cheap_clone(), function.strict)
            .named(name);
        let guard = self.stack.enter(context);
        Ok((env, guard))
    }

    /// OrdinaryCallBindThis
    pub(crate) fn ordinary_call_bind_this(
        &mut self,
        function: &ScriptFunction,
        env: &EnvRef,
        this: JsValue,
    ) -> Result<(), JsError> {
        let this = match function.this_mode {
            ThisMode::Lexical => return Ok(()),
            ThisMode::Strict => this,
            ThisMode::Global if this.is_null_or_undefined() => {
                JsValue::Object(self.global.cheap_clone())
            }
            ThisMode::Global => JsValue::Object(self.to_object(&this)?),
        };
        env.borrow_mut().bind_this_value(this)
    }

    /// FunctionDeclarationInstantiation followed by body evaluation
    pub(crate) fn execute_function_body(
        &mut self,
        function: &ScriptFunction,
        env: &EnvRef,
        args: &[JsValue],
    ) -> Result<JsValue, JsError> {
        self.function_declaration_instantiation(function, env, args)?;
        let completion = self.evaluate_body(&function.node)?;
        completion_result(completion)
    }

    /// Run a body in the current context. Concise arrow bodies behave like
    /// `return expr;`
    pub(crate) fn evaluate_body(&mut self, node: &FunctionNode) -> Result<Completion, JsError> {
        match &node.body {
            FunctionBody::Block(list) => self.execute_statement_list(list),
            FunctionBody::Expression(expr) => match self.evaluate(expr) {
                Ok(value) => Ok(Completion::return_(value)),
                Err(e) if e.is_host_abort() || e.is_suspension() => Err(e),
                Err(e) => {
                    let location = e.location().unwrap_or_else(|| expr.span());
                    let value = self.error_to_value(e);
                    Ok(Completion::throw(value, location))
                }
            },
        }
    }

    /// Bind parameters, hoisted `var`s, lexical declarations and top-level
    /// function declarations in the new function environment
    pub(crate) fn function_declaration_instantiation(
        &mut self,
        function: &ScriptFunction,
        env: &EnvRef,
        args: &[JsValue],
    ) -> Result<(), JsError> {
        let node = &function.node;
        let scope = function_scope(node);

        {
            let mut e = env.borrow_mut();
            for name in &scope.parameter_names {
                if !e.has_binding(name) {
                    e.create_mutable_binding(name.cheap_clone(), false)?;
                }
            }
        }

        // Defaults see earlier parameters; a throwing default stops here
        let mut initialized = FxHashSet::default();
        for (index, param) in node.params.iter().enumerate() {
            let mut value = args.get(index).cloned().unwrap_or_default();
            if value.is_undefined() {
                if let Some(default) = &param.default {
                    value = self.evaluate_named(default, &param.name.name)?;
                }
            }
            let name = &param.name.name;
            if initialized.insert(name.cheap_clone()) {
                env.borrow_mut().initialize_binding(name, value)?;
            } else {
                env.borrow_mut().set_mutable_binding(name, value, false)?;
            }
        }

        let var_env = if scope.has_parameter_expressions {
            // Separate var scope so closures in defaults cannot see body vars
            let var_env = Environment::new_declarative(Some(env.cheap_clone()));
            for name in &scope.var_names {
                let initial = if scope.parameter_names.contains(name) {
                    env.borrow().get_binding_value(name, false)?
                } else {
                    JsValue::Undefined
                };
                let mut v = var_env.borrow_mut();
                v.create_mutable_binding(name.cheap_clone(), false)?;
                v.initialize_binding(name, initial)?;
            }
            self.set_variable_environment(var_env.cheap_clone());
            self.set_lexical_environment(var_env.cheap_clone());
            var_env
        } else {
            let mut e = env.borrow_mut();
            for name in &scope.var_names {
                if !e.has_binding(name) {
                    e.create_mutable_binding(name.cheap_clone(), false)?;
                    e.initialize_binding(name, JsValue::Undefined)?;
                }
            }
            drop(e);
            env.cheap_clone()
        };

        {
            let mut v = var_env.borrow_mut();
            for binding in &scope.lexical {
                if binding.constant {
                    v.create_immutable_binding(binding.name.cheap_clone(), true)?;
                } else {
                    v.create_mutable_binding(binding.name.cheap_clone(), false)?;
                }
            }
        }

        for declaration in &scope.functions {
            let Some(name) = declaration.name() else {
                continue;
            };
            let object = self.instantiate_function_object(declaration, var_env.cheap_clone());
            let mut v = var_env.borrow_mut();
            if v.has_binding(name) {
                v.set_mutable_binding(name, JsValue::Object(object), false)?;
            } else {
                v.create_mutable_binding(name.cheap_clone(), false)?;
                v.initialize_binding(name, JsValue::Object(object))?;
            }
        }
        Ok(())
    }

    fn enter_native(&mut self, native: &NativeFunction) -> Result<ContextGuard, JsError> {
        self.check_recursion_depth()?;
        let context = ExecutionContext::new(
            self.lexical_environment(),
            self.variable_environment(),
            self.is_strict(),
        )
        .named(self.options.debug_names.then(|| native.name.cheap_clone()));
        Ok(self.stack.enter(context))
    }

    fn call_native(
        &mut self,
        native: &NativeFunction,
        this: JsValue,
        args: &[JsValue],
    ) -> Result<JsValue, JsError> {
        trace!(target: "jsflow::call", function = %native.name, argc = args.len(), "native call");
        let _guard = self.enter_native(native)?;
        (native.func)(self, this, args)
    }

    pub(crate) fn check_recursion_depth(&self) -> Result<(), JsError> {
        let depth = self.stack.depth();
        if let Some(max) = self.options.max_recursion_depth.filter(|&max| depth >= max) {
            warn!(target: "jsflow::limits", depth, max, "recursion depth exceeded");
            return Err(JsError::RecursionDepthOverflow { depth });
        }
        if let Some(limit) = self.options.max_native_stack {
            let used = self.note_native_stack();
            if used > limit {
                warn!(target: "jsflow::limits", depth, used, limit, "native stack budget exceeded");
                return Err(JsError::RecursionDepthOverflow { depth });
            }
        }
        Ok(())
    }

    /// Bytes of native stack in use below the shallowest entry point seen so
    /// far. Assumes a downward-growing stack; the interpreter never leaves
    /// its thread.
    pub(crate) fn note_native_stack(&self) -> usize {
        let here = native_stack_position();
        let base = self.native_stack_base.get().max(here);
        self.native_stack_base.set(base);
        base - here
    }

    // ============ CONVERSIONS ============

    /// ToObject
    pub fn to_object(&self, value: &JsValue) -> Result<JsObjectRef, JsError> {
        match value {
            JsValue::Undefined | JsValue::Null => Err(JsError::type_error(
                "Cannot convert undefined or null to object",
            )),
            JsValue::Object(object) => Ok(object.cheap_clone()),
            primitive => Ok(Rc::new(std::cell::RefCell::new(JsObject::new(
                Some(self.object_prototype.cheap_clone()),
                ExoticObject::Primitive(primitive.cheap_clone()),
            )))),
        }
    }

    /// InstanceofOperator
    pub fn instance_of(&self, value: &JsValue, target: &JsValue) -> Result<bool, JsError> {
        if !target.is_callable() {
            return Err(JsError::type_error(
                "Right-hand side of 'instanceof' is not callable",
            ));
        }
        self.ordinary_has_instance(target, value)
    }

    /// OrdinaryHasInstance: bound functions defer to their target
    pub(crate) fn ordinary_has_instance(
        &self,
        constructor: &JsValue,
        value: &JsValue,
    ) -> Result<bool, JsError> {
        let JsValue::Object(ctor) = constructor else {
            return Ok(false);
        };
        let bound_target = match ctor.borrow().as_function() {
            None => return Ok(false),
            Some(JsFunction::Bound(bound)) => Some(bound.target.cheap_clone()),
            Some(_) => None,
        };
        if let Some(target) = bound_target {
            return self.instance_of(value, &JsValue::Object(target));
        }
        let JsValue::Object(object) = value else {
            return Ok(false);
        };
        let proto = ctor.borrow().get_property(&JsString::from("prototype"));
        let Some(JsValue::Object(proto)) = proto else {
            return Err(JsError::type_error(
                "Function has non-object prototype in instanceof check",
            ));
        };
        let mut current = object.borrow().prototype.clone();
        while let Some(candidate) = current {
            if Rc::ptr_eq(&candidate, &proto) {
                return Ok(true);
            }
            current = candidate.borrow().prototype.clone();
        }
        Ok(false)
    }
}

/// Map a body completion to the call result
pub(crate) fn completion_result(completion: Completion) -> Result<JsValue, JsError> {
    match completion.kind {
        CompletionType::Return => Ok(completion.value_or_undefined()),
        CompletionType::Throw => Err(JsError::Thrown {
            value: completion.value_or_undefined(),
            location: Some(completion.location),
        }),
        _ => Ok(JsValue::Undefined),
    }
}
