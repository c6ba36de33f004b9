//! Expression evaluation

use std::rc::Rc;

use super::Interpreter;
use super::call::FunctionCreation;
use super::environment::{Environment, Reference, get_this_environment};
use crate::ast::{
    AssignmentExpression, AssignmentOp, AssignmentTarget, BinaryExpression, BinaryOp,
    CallExpression, ClassNode, Expression, FunctionBody, FunctionNode, LiteralValue,
    LogicalExpression, LogicalOp, MemberExpression, MemberProperty, NewExpression,
    ObjectExpression, PropertyName, StatementList, SuperCallExpression, UnaryExpression, UnaryOp,
    UpdateExpression, UpdateOp,
};
use crate::error::JsError;
use crate::value::{
    CheapClone, ExoticObject, JsObjectRef, JsString, JsValue, Property, create_object,
};

/// Source text of a callee for "is not a function" messages
fn describe_callee(expr: &Expression) -> String {
    match expr {
        Expression::Identifier(id) => id.name.to_string(),
        Expression::Member(m) => match &m.property {
            MemberProperty::Identifier(name) => format!("{}.{}", describe_callee(&m.object), name),
            MemberProperty::Computed(_) => format!("{}[...]", describe_callee(&m.object)),
        },
        Expression::This(_) => "this".to_string(),
        _ => "expression".to_string(),
    }
}

fn literal_value(value: &LiteralValue) -> JsValue {
    match value {
        LiteralValue::Undefined => JsValue::Undefined,
        LiteralValue::Null => JsValue::Null,
        LiteralValue::Boolean(b) => JsValue::Boolean(*b),
        LiteralValue::Number(n) => JsValue::Number(*n),
        LiteralValue::String(s) => JsValue::String(s.cheap_clone()),
    }
}

/// Unwrap primitive wrappers, stringify other objects
fn to_primitive(value: JsValue) -> JsValue {
    match &value {
        JsValue::Object(obj) => match &obj.borrow().exotic {
            ExoticObject::Primitive(inner) => inner.cheap_clone(),
            _ => JsValue::String(value.to_js_string()),
        },
        _ => value,
    }
}

fn add_values(left: JsValue, right: JsValue) -> JsValue {
    let left = to_primitive(left);
    let right = to_primitive(right);
    match (&left, &right) {
        (JsValue::String(l), _) => JsValue::String(l.cheap_clone() + &right.to_js_string()),
        (_, JsValue::String(r)) => JsValue::String(left.to_js_string() + r),
        _ => JsValue::Number(left.to_number() + right.to_number()),
    }
}

fn compare(left: &JsValue, right: &JsValue, op: BinaryOp) -> bool {
    if let (JsValue::String(l), JsValue::String(r)) = (left, right) {
        return match op {
            BinaryOp::Lt => l < r,
            BinaryOp::LtEq => l <= r,
            BinaryOp::Gt => l > r,
            _ => l >= r,
        };
    }
    let (l, r) = (left.to_number(), right.to_number());
    match op {
        BinaryOp::Lt => l < r,
        BinaryOp::LtEq => l <= r,
        BinaryOp::Gt => l > r,
        _ => l >= r,
    }
}

impl Interpreter {
    pub fn evaluate(&mut self, expr: &Expression) -> Result<JsValue, JsError> {
        match expr {
            Expression::Literal(lit) => Ok(literal_value(&lit.value)),
            Expression::Identifier(id) => {
                let reference = self.resolve_binding(&id.name);
                self.get_value(&reference)
            }
            Expression::This(_) => self.resolve_this_binding(),
            Expression::Object(obj) => self.evaluate_object(obj),
            Expression::Function(node) => self.evaluate_function_expression(node, None),
            Expression::Class(class) => self.evaluate_class(class, None).map(JsValue::Object),
            Expression::Unary(unary) => self.evaluate_unary(unary),
            Expression::Binary(binary) => self.evaluate_binary(binary),
            Expression::Logical(logical) => self.evaluate_logical(logical),
            Expression::Conditional(cond) => {
                if self.evaluate(&cond.test)?.to_boolean() {
                    self.evaluate(&cond.consequent)
                } else {
                    self.evaluate(&cond.alternate)
                }
            }
            Expression::Assignment(assign) => self.evaluate_assignment(assign),
            Expression::Update(update) => self.evaluate_update(update),
            Expression::Sequence(seq) => {
                let mut last = JsValue::Undefined;
                for e in &seq.expressions {
                    last = self.evaluate(e)?;
                }
                Ok(last)
            }
            Expression::Member(member) => {
                let base = self.evaluate(&member.object)?;
                let key = self.member_key(&member.property)?;
                self.get_member(&base, &key)
            }
            Expression::Call(call) => self.evaluate_call(call),
            Expression::New(new) => self.evaluate_new(new),
            Expression::SuperCall(call) => self.evaluate_super_call(call),
            Expression::SuperMember(member) => {
                let (base, _) = self.super_base()?;
                let key = self.member_key(&member.property)?;
                self.get_member(&base, &key)
            }
            Expression::Yield(y) => Err(JsError::SyntaxError {
                message: concat!(
                    "yield is only supported as a statement, an assignment or ",
                    "declaration initializer, or a return argument"
                )
                .to_string(),
                location: Some(y.span),
            }),
        }
    }

    /// NamedEvaluation: anonymous functions and classes take `name`
    pub(crate) fn evaluate_named(
        &mut self,
        expr: &Expression,
        name: &JsString,
    ) -> Result<JsValue, JsError> {
        match expr {
            Expression::Function(node) if node.id.is_none() => {
                self.evaluate_function_expression(node, Some(name.cheap_clone()))
            }
            Expression::Class(class) if class.id.is_none() => self
                .evaluate_class(class, Some(name.cheap_clone()))
                .map(JsValue::Object),
            _ => self.evaluate(expr),
        }
    }

    // ============ REFERENCES ============

    /// Resolve an identifier against the running lexical environment
    pub fn resolve_binding(&self, name: &JsString) -> Reference {
        super::environment::get_identifier_reference(
            &self.lexical_environment(),
            name,
            self.is_strict(),
        )
    }

    pub fn get_value(&self, reference: &Reference) -> Result<JsValue, JsError> {
        match &reference.base {
            None => Err(JsError::not_defined(reference.name.as_str())),
            Some(env) => env
                .borrow()
                .get_binding_value(&reference.name, reference.strict),
        }
    }

    pub fn put_value(&mut self, reference: &Reference, value: JsValue) -> Result<(), JsError> {
        match &reference.base {
            None if reference.strict => Err(JsError::not_defined(reference.name.as_str())),
            None => {
                // Sloppy assignment to an undeclared name creates a global
                self.global
                    .borrow_mut()
                    .set_property(reference.name.cheap_clone(), value);
                Ok(())
            }
            Some(env) => env
                .borrow_mut()
                .set_mutable_binding(&reference.name, value, reference.strict),
        }
    }

    /// ResolveThisBinding
    pub fn resolve_this_binding(&self) -> Result<JsValue, JsError> {
        let env = get_this_environment(&self.lexical_environment());
        env.borrow().get_this_binding()
    }

    // ============ MEMBERS ============

    pub(crate) fn member_key(&mut self, property: &MemberProperty) -> Result<JsString, JsError> {
        match property {
            MemberProperty::Identifier(name) => Ok(name.cheap_clone()),
            MemberProperty::Computed(expr) => Ok(self.evaluate(expr)?.to_js_string()),
        }
    }

    pub(crate) fn get_member(&self, base: &JsValue, key: &JsString) -> Result<JsValue, JsError> {
        match base {
            JsValue::Undefined | JsValue::Null => Err(JsError::type_error(format!(
                "Cannot read properties of {} (reading '{}')",
                base.to_js_string(),
                key
            ))),
            JsValue::Object(obj) => Ok(obj.borrow().get_property(key).unwrap_or_default()),
            primitive => {
                let wrapper = self.to_object(primitive)?;
                let value = wrapper.borrow().get_property(key).unwrap_or_default();
                Ok(value)
            }
        }
    }

    pub(crate) fn set_member(
        &mut self,
        base: &JsValue,
        key: JsString,
        value: JsValue,
    ) -> Result<(), JsError> {
        match base {
            JsValue::Undefined | JsValue::Null => Err(JsError::type_error(format!(
                "Cannot set properties of {} (setting '{}')",
                base.to_js_string(),
                key
            ))),
            JsValue::Object(obj) => {
                let ok = obj.borrow_mut().set_property(key.cheap_clone(), value);
                if !ok && self.is_strict() {
                    return Err(JsError::type_error(format!(
                        "Cannot assign to read only property '{}' of object",
                        key
                    )));
                }
                Ok(())
            }
            primitive => {
                if self.is_strict() {
                    return Err(JsError::type_error(format!(
                        "Cannot create property '{}' on {} '{}'",
                        key,
                        primitive.type_of(),
                        primitive.to_js_string()
                    )));
                }
                Ok(())
            }
        }
    }

    /// Home object prototype and `this` for `super.x`
    fn super_base(&self) -> Result<(JsValue, JsValue), JsError> {
        let env = get_this_environment(&self.lexical_environment());
        let home = {
            let env = env.borrow();
            env.function_record().and_then(|f| f.home_object.clone())
        };
        let Some(home) = home else {
            return Err(JsError::syntax_error("'super' keyword unexpected here"));
        };
        let this = env.borrow().get_this_binding()?;
        let base = match home.borrow().prototype.clone() {
            Some(proto) => JsValue::Object(proto),
            None => JsValue::Null,
        };
        Ok((base, this))
    }

    // ============ OBJECTS & FUNCTIONS ============

    fn evaluate_object(&mut self, expr: &ObjectExpression) -> Result<JsValue, JsError> {
        let obj = create_object(Some(self.object_prototype.cheap_clone()));
        for property in &expr.properties {
            let key = match &property.key {
                PropertyName::Identifier(name) => name.cheap_clone(),
                PropertyName::Computed(expr) => self.evaluate(expr)?.to_js_string(),
            };
            let value = match (&property.value, property.method) {
                (Expression::Function(node), true) => {
                    let env = self.lexical_environment();
                    let method = self.create_script_function(
                        node,
                        env,
                        FunctionCreation {
                            name: Some(key.cheap_clone()),
                            home_object: Some(obj.cheap_clone()),
                            method: true,
                            ..Default::default()
                        },
                    );
                    JsValue::Object(method)
                }
                (value, _) => self.evaluate_named(value, &key)?,
            };
            obj.borrow_mut().define_property(key, Property::data(value));
        }
        Ok(JsValue::Object(obj))
    }

    pub(crate) fn evaluate_function_expression(
        &mut self,
        node: &Rc<FunctionNode>,
        name: Option<JsString>,
    ) -> Result<JsValue, JsError> {
        let env = self.lexical_environment();
        match &node.id {
            Some(id) if !node.arrow => {
                // The function's own name is visible inside it and read-only
                let func_env = Environment::new_declarative(Some(env));
                func_env
                    .borrow_mut()
                    .create_immutable_binding(id.name.cheap_clone(), false)?;
                let function = self.create_script_function(
                    node,
                    func_env.cheap_clone(),
                    FunctionCreation::default(),
                );
                func_env
                    .borrow_mut()
                    .initialize_binding(&id.name, JsValue::Object(function.cheap_clone()))?;
                Ok(JsValue::Object(function))
            }
            _ => {
                let function = self.create_script_function(
                    node,
                    env,
                    FunctionCreation {
                        name,
                        ..Default::default()
                    },
                );
                Ok(JsValue::Object(function))
            }
        }
    }

    /// ClassDefinitionEvaluation
    pub(crate) fn evaluate_class(
        &mut self,
        class: &ClassNode,
        name: Option<JsString>,
    ) -> Result<JsObjectRef, JsError> {
        let old = self.lexical_environment();
        let class_env = Environment::new_declarative(Some(old.cheap_clone()));
        if let Some(id) = &class.id {
            class_env
                .borrow_mut()
                .create_immutable_binding(id.name.cheap_clone(), true)?;
        }
        self.set_lexical_environment(class_env.cheap_clone());
        let result = self.class_definition(class, name);
        self.set_lexical_environment(old);
        let constructor = result?;
        if let Some(id) = &class.id {
            class_env
                .borrow_mut()
                .initialize_binding(&id.name, JsValue::Object(constructor.cheap_clone()))?;
        }
        Ok(constructor)
    }

    fn class_definition(
        &mut self,
        class: &ClassNode,
        name: Option<JsString>,
    ) -> Result<JsObjectRef, JsError> {
        let (proto_parent, constructor_parent) = match &class.super_class {
            None => (
                Some(self.object_prototype.cheap_clone()),
                self.function_prototype.cheap_clone(),
            ),
            Some(expr) => {
                let superclass = self.evaluate(expr)?;
                match &superclass {
                    JsValue::Null => (None, self.function_prototype.cheap_clone()),
                    JsValue::Object(parent) if self.is_constructor(&superclass) => {
                        let proto = self.get_member(&superclass, &JsString::from("prototype"))?;
                        match proto {
                            JsValue::Object(p) => (Some(p), parent.cheap_clone()),
                            JsValue::Null => (None, parent.cheap_clone()),
                            _ => {
                                return Err(JsError::type_error(
                                    "Class extends value does not have valid prototype property",
                                ));
                            }
                        }
                    }
                    _ => {
                        return Err(JsError::type_error(format!(
                            "Class extends value {} is not a constructor or null",
                            superclass.to_js_string()
                        )));
                    }
                }
            }
        };

        let prototype = create_object(proto_parent);
        let class_name = class
            .id
            .as_ref()
            .map(|id| id.name.cheap_clone())
            .or(name)
            .unwrap_or_else(|| JsString::from(""));
        let (node, default_constructor) = match &class.constructor {
            Some(ctor) => (ctor.cheap_clone(), false),
            None => (
                Rc::new(FunctionNode::new(
                    None,
                    Vec::new(),
                    FunctionBody::Block(StatementList::default()),
                    class.span,
                )),
                true,
            ),
        };
        let env = self.lexical_environment();
        let constructor = self.create_script_function(
            &node,
            env.cheap_clone(),
            FunctionCreation {
                name: Some(class_name),
                home_object: Some(prototype.cheap_clone()),
                class_constructor: true,
                derived: class.super_class.is_some(),
                default_constructor,
                function_prototype: Some(constructor_parent),
                strict: true,
                ..Default::default()
            },
        );
        constructor.borrow_mut().define_property(
            JsString::from("prototype"),
            Property::with_attributes(
                JsValue::Object(prototype.cheap_clone()),
                false,
                false,
                false,
            ),
        );
        prototype.borrow_mut().define_property(
            JsString::from("constructor"),
            Property::hidden(JsValue::Object(constructor.cheap_clone())),
        );

        for method in &class.methods {
            let target = if method.static_ {
                constructor.cheap_clone()
            } else {
                prototype.cheap_clone()
            };
            let function = self.create_script_function(
                &method.value,
                env.cheap_clone(),
                FunctionCreation {
                    name: Some(method.key.cheap_clone()),
                    home_object: Some(target.cheap_clone()),
                    method: true,
                    strict: true,
                    ..Default::default()
                },
            );
            target.borrow_mut().define_property(
                method.key.cheap_clone(),
                Property::hidden(JsValue::Object(function)),
            );
        }
        Ok(constructor)
    }

    // ============ OPERATORS ============

    fn evaluate_unary(&mut self, unary: &UnaryExpression) -> Result<JsValue, JsError> {
        match unary.op {
            UnaryOp::Typeof => {
                if let Expression::Identifier(id) = unary.argument.as_ref() {
                    let reference = self.resolve_binding(&id.name);
                    if reference.is_unresolvable() {
                        return Ok(JsValue::from("undefined"));
                    }
                    let value = self.get_value(&reference)?;
                    return Ok(JsValue::from(value.type_of()));
                }
                let value = self.evaluate(&unary.argument)?;
                Ok(JsValue::from(value.type_of()))
            }
            UnaryOp::Delete => self.evaluate_delete(&unary.argument),
            UnaryOp::Not => Ok(JsValue::Boolean(!self.evaluate(&unary.argument)?.to_boolean())),
            UnaryOp::Minus => Ok(JsValue::Number(-self.evaluate(&unary.argument)?.to_number())),
            UnaryOp::Plus => Ok(JsValue::Number(self.evaluate(&unary.argument)?.to_number())),
            UnaryOp::Void => {
                self.evaluate(&unary.argument)?;
                Ok(JsValue::Undefined)
            }
        }
    }

    fn evaluate_delete(&mut self, argument: &Expression) -> Result<JsValue, JsError> {
        match argument {
            Expression::Member(member) => {
                let base = self.evaluate(&member.object)?;
                let key = self.member_key(&member.property)?;
                let object = self.to_object(&base)?;
                let deleted = object.borrow_mut().delete_property(&key);
                if !deleted && self.is_strict() {
                    return Err(JsError::type_error(format!(
                        "Cannot delete property '{}' of object",
                        key
                    )));
                }
                Ok(JsValue::Boolean(deleted))
            }
            Expression::Identifier(id) => {
                if self.is_strict() {
                    return Err(JsError::syntax_error(
                        "Delete of an unqualified identifier in strict mode.",
                    ));
                }
                let reference = self.resolve_binding(&id.name);
                match &reference.base {
                    None => Ok(JsValue::Boolean(true)),
                    Some(env) => Ok(JsValue::Boolean(env.borrow_mut().delete_binding(&id.name))),
                }
            }
            other => {
                self.evaluate(other)?;
                Ok(JsValue::Boolean(true))
            }
        }
    }

    fn evaluate_binary(&mut self, binary: &BinaryExpression) -> Result<JsValue, JsError> {
        let left = self.evaluate(&binary.left)?;
        let right = self.evaluate(&binary.right)?;
        let value = match binary.op {
            BinaryOp::Add => add_values(left, right),
            BinaryOp::Sub => JsValue::Number(left.to_number() - right.to_number()),
            BinaryOp::Mul => JsValue::Number(left.to_number() * right.to_number()),
            BinaryOp::Div => JsValue::Number(left.to_number() / right.to_number()),
            BinaryOp::Mod => JsValue::Number(left.to_number() % right.to_number()),
            BinaryOp::Lt | BinaryOp::LtEq | BinaryOp::Gt | BinaryOp::GtEq => {
                let left = to_primitive(left);
                let right = to_primitive(right);
                JsValue::Boolean(compare(&left, &right, binary.op))
            }
            BinaryOp::Eq => JsValue::Boolean(left.loose_equals(&right)),
            BinaryOp::NotEq => JsValue::Boolean(!left.loose_equals(&right)),
            BinaryOp::StrictEq => JsValue::Boolean(left.strict_equals(&right)),
            BinaryOp::StrictNotEq => JsValue::Boolean(!left.strict_equals(&right)),
            BinaryOp::Instanceof => JsValue::Boolean(self.instance_of(&left, &right)?),
            BinaryOp::In => {
                let JsValue::Object(obj) = &right else {
                    return Err(JsError::type_error(format!(
                        "Cannot use 'in' operator to search for '{}' in {}",
                        left.to_js_string(),
                        right.to_js_string()
                    )));
                };
                let key = left.to_js_string();
                JsValue::Boolean(obj.borrow().has_property(&key))
            }
        };
        Ok(value)
    }

    fn evaluate_logical(&mut self, logical: &LogicalExpression) -> Result<JsValue, JsError> {
        let left = self.evaluate(&logical.left)?;
        let short_circuit = match logical.op {
            LogicalOp::And => !left.to_boolean(),
            LogicalOp::Or => left.to_boolean(),
            LogicalOp::NullishCoalescing => !left.is_null_or_undefined(),
        };
        if short_circuit {
            Ok(left)
        } else {
            self.evaluate(&logical.right)
        }
    }

    fn apply_compound(op: AssignmentOp, current: JsValue, rhs: JsValue) -> JsValue {
        match op {
            AssignmentOp::Assign => rhs,
            AssignmentOp::AddAssign => add_values(current, rhs),
            AssignmentOp::SubAssign => JsValue::Number(current.to_number() - rhs.to_number()),
            AssignmentOp::MulAssign => JsValue::Number(current.to_number() * rhs.to_number()),
        }
    }

    fn evaluate_assignment(&mut self, assign: &AssignmentExpression) -> Result<JsValue, JsError> {
        match &assign.target {
            AssignmentTarget::Identifier(id) => {
                let reference = self.resolve_binding(&id.name);
                let value = if assign.op == AssignmentOp::Assign {
                    self.evaluate_named(&assign.value, &id.name)?
                } else {
                    let current = self.get_value(&reference)?;
                    let rhs = self.evaluate(&assign.value)?;
                    Self::apply_compound(assign.op, current, rhs)
                };
                self.put_value(&reference, value.cheap_clone())?;
                Ok(value)
            }
            AssignmentTarget::Member(member) => {
                let base = self.evaluate(&member.object)?;
                let key = self.member_key(&member.property)?;
                let value = if assign.op == AssignmentOp::Assign {
                    self.evaluate(&assign.value)?
                } else {
                    let current = self.get_member(&base, &key)?;
                    let rhs = self.evaluate(&assign.value)?;
                    Self::apply_compound(assign.op, current, rhs)
                };
                self.set_member(&base, key, value.cheap_clone())?;
                Ok(value)
            }
        }
    }

    /// PutValue for an already computed right-hand side
    pub(crate) fn assign_to_target(
        &mut self,
        target: &AssignmentTarget,
        value: JsValue,
    ) -> Result<JsValue, JsError> {
        match target {
            AssignmentTarget::Identifier(id) => {
                let reference = self.resolve_binding(&id.name);
                self.put_value(&reference, value.cheap_clone())?;
            }
            AssignmentTarget::Member(member) => {
                let base = self.evaluate(&member.object)?;
                let key = self.member_key(&member.property)?;
                self.set_member(&base, key, value.cheap_clone())?;
            }
        }
        Ok(value)
    }

    fn evaluate_update(&mut self, update: &UpdateExpression) -> Result<JsValue, JsError> {
        let delta = match update.op {
            UpdateOp::Increment => 1.0,
            UpdateOp::Decrement => -1.0,
        };
        let (old, new) = match &update.target {
            AssignmentTarget::Identifier(id) => {
                let reference = self.resolve_binding(&id.name);
                let old = self.get_value(&reference)?.to_number();
                let new = old + delta;
                self.put_value(&reference, JsValue::Number(new))?;
                (old, new)
            }
            AssignmentTarget::Member(MemberExpression {
                object, property, ..
            }) => {
                let base = self.evaluate(object)?;
                let key = self.member_key(property)?;
                let old = self.get_member(&base, &key)?.to_number();
                let new = old + delta;
                self.set_member(&base, key, JsValue::Number(new))?;
                (old, new)
            }
        };
        Ok(JsValue::Number(if update.prefix { new } else { old }))
    }

    // ============ CALLS ============

    fn evaluate_arguments(&mut self, arguments: &[Expression]) -> Result<Vec<JsValue>, JsError> {
        let mut values = Vec::with_capacity(arguments.len());
        for argument in arguments {
            values.push(self.evaluate(argument)?);
        }
        Ok(values)
    }

    fn evaluate_call(&mut self, call: &CallExpression) -> Result<JsValue, JsError> {
        let (callee, this) = match call.callee.as_ref() {
            Expression::Member(member) => {
                let base = self.evaluate(&member.object)?;
                let key = self.member_key(&member.property)?;
                let callee = self.get_member(&base, &key)?;
                (callee, base)
            }
            Expression::SuperMember(member) => {
                let (base, this) = self.super_base()?;
                let key = self.member_key(&member.property)?;
                (self.get_member(&base, &key)?, this)
            }
            Expression::Identifier(id) => {
                let reference = self.resolve_binding(&id.name);
                let callee = self.get_value(&reference)?;
                // Calls through `with` scopes use the scope object as `this`
                let this = reference
                    .base
                    .as_ref()
                    .and_then(|env| env.borrow().with_base_object())
                    .map(JsValue::Object)
                    .unwrap_or_default();
                (callee, this)
            }
            other => (self.evaluate(other)?, JsValue::Undefined),
        };
        let args = self.evaluate_arguments(&call.arguments)?;
        if !callee.is_callable() {
            return Err(JsError::type_error_at(
                format!("{} is not a function", describe_callee(&call.callee)),
                call.span,
            ));
        }
        self.call_function(&callee, this, &args)
    }

    fn evaluate_new(&mut self, new: &NewExpression) -> Result<JsValue, JsError> {
        let callee = self.evaluate(&new.callee)?;
        let args = self.evaluate_arguments(&new.arguments)?;
        if !self.is_constructor(&callee) {
            return Err(JsError::type_error_at(
                format!("{} is not a constructor", describe_callee(&new.callee)),
                new.span,
            ));
        }
        self.construct(&callee, &args, None).map(JsValue::Object)
    }

    /// `super(...args)`: construct the parent with the current new.target
    /// and bind the result as `this`
    fn evaluate_super_call(&mut self, call: &SuperCallExpression) -> Result<JsValue, JsError> {
        let env = get_this_environment(&self.lexical_environment());
        let (function_object, new_target) = {
            let env = env.borrow();
            match env.function_record() {
                Some(record) => (
                    record.function_object.cheap_clone(),
                    record.new_target.cheap_clone(),
                ),
                None => return Err(JsError::syntax_error("'super' keyword unexpected here")),
            }
        };
        let parent = function_object
            .borrow()
            .prototype
            .clone()
            .map(JsValue::Object)
            .unwrap_or_default();
        if !self.is_constructor(&parent) {
            return Err(JsError::type_error("Super constructor is not a constructor"));
        }
        let args = self.evaluate_arguments(&call.arguments)?;
        if new_target.is_undefined() {
            return Err(JsError::syntax_error("'super' keyword unexpected here"));
        }
        let result = self.construct(&parent, &args, Some(&new_target))?;
        env.borrow_mut()
            .bind_this_value(JsValue::Object(result.cheap_clone()))?;
        Ok(JsValue::Object(result))
    }
}
