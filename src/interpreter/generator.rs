//! Generator objects and the suspend/resume state machine
//!
//! Calling a generator function runs the ordinary call prologue, then parks
//! the new frame inside a [`Generator`] without running any body code. Each
//! resume splices the frame back onto the context stack and replays the body
//! along the recorded resume points until the next `yield` unwinds it again.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::debug;

use super::Interpreter;
use super::call::completion_result;
use super::context::ExecutionContext;
use super::statements::ResumePoint;
use crate::error::JsError;
use crate::value::{
    CheapClone, ExoticObject, JsObject, JsObjectRef, JsString, JsValue, Property, ScriptFunction,
    create_object,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneratorState {
    SuspendedStart,
    SuspendedYield,
    Executing,
    Completed,
}

/// Token that ties prototype methods to the generators they may drive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeneratorBrand(pub Option<&'static str>);

impl GeneratorBrand {
    /// Brand of generators created by `function*`
    pub const EMPTY: GeneratorBrand = GeneratorBrand(None);
}

/// Value delivered at the suspended `yield`
#[derive(Debug, Clone)]
pub(crate) enum Resumption {
    Next(JsValue),
    Throw(JsValue),
    Return(JsValue),
}

#[derive(Debug)]
pub struct Generator {
    pub(crate) state: GeneratorState,
    /// Parked frame; `None` while executing and once completed
    pub(crate) context: Option<ExecutionContext>,
    pub(crate) brand: GeneratorBrand,
    pub(crate) function: JsObjectRef,
    pub(crate) body: Rc<ScriptFunction>,
    /// Outermost construct last
    pub(crate) resume_points: Vec<ResumePoint>,
    pub(crate) resumption: Option<Resumption>,
}

pub type GeneratorRef = Rc<RefCell<Generator>>;

impl Generator {
    pub fn state(&self) -> GeneratorState {
        self.state
    }

    pub fn brand(&self) -> GeneratorBrand {
        self.brand
    }

    /// The generator function this instance was created from
    pub fn function(&self) -> &JsObjectRef {
        &self.function
    }

    fn transition(&mut self, to: GeneratorState) {
        debug!(target: "jsflow::generator", from = ?self.state, to = ?to, "state transition");
        self.state = to;
    }

    fn complete(&mut self) {
        self.transition(GeneratorState::Completed);
        self.context = None;
        self.resume_points.clear();
        self.resumption = None;
    }
}

impl Interpreter {
    /// [[Call]] of a generator function: everything up to the first body
    /// statement, then park
    pub(crate) fn generator_start(
        &mut self,
        object: &JsObjectRef,
        function: &Rc<ScriptFunction>,
        this: JsValue,
        args: &[JsValue],
    ) -> Result<JsValue, JsError> {
        let (env, guard) = self.prepare_for_ordinary_call(object, function, JsValue::Undefined)?;
        self.ordinary_call_bind_this(function, &env, this)?;
        self.function_declaration_instantiation(function, &env, args)?;

        let proto = match object.borrow().get_property(&JsString::from("prototype")) {
            Some(JsValue::Object(proto)) => proto,
            _ => self.generator_prototype.cheap_clone(),
        };
        let generator = Rc::new(RefCell::new(Generator {
            state: GeneratorState::SuspendedStart,
            context: None,
            brand: GeneratorBrand::EMPTY,
            function: object.cheap_clone(),
            body: function.cheap_clone(),
            resume_points: Vec::new(),
            resumption: None,
        }));
        let mut context = guard
            .park()
            .ok_or_else(|| JsError::internal_error("generator frame missing from the stack"))?;
        context.generator = Some(Rc::downgrade(&generator));
        generator.borrow_mut().context = Some(context);
        debug!(
            target: "jsflow::generator",
            function = %function.name.clone().unwrap_or_default(),
            "created in SuspendedStart"
        );

        let instance = JsObject::new(Some(proto), ExoticObject::Generator(generator));
        Ok(JsValue::Object(Rc::new(RefCell::new(instance))))
    }

    /// GeneratorValidate: the receiver must be a generator of `brand` that
    /// is not already running
    pub fn generator_validate(
        &self,
        value: &JsValue,
        brand: GeneratorBrand,
    ) -> Result<GeneratorRef, JsError> {
        let generator = value
            .as_object()
            .and_then(|object| object.borrow().as_generator().cloned())
            .ok_or_else(|| JsError::type_error("receiver is not a generator"))?;
        {
            let g = generator.borrow();
            if g.brand != brand {
                return Err(JsError::type_error("generator brand mismatch"));
            }
            if g.state == GeneratorState::Executing {
                return Err(JsError::type_error("Generator is already running"));
            }
        }
        Ok(generator)
    }

    /// GeneratorResume: `next(value)`
    pub fn generator_resume(
        &mut self,
        value: &JsValue,
        sent: JsValue,
        brand: GeneratorBrand,
    ) -> Result<JsValue, JsError> {
        let generator = self.generator_validate(value, brand)?;
        let state = generator.borrow().state;
        match state {
            GeneratorState::Completed => Ok(self.create_iter_result(JsValue::Undefined, true)),
            // The first resume value has no `yield` to land on
            GeneratorState::SuspendedStart => self.run_generator(&generator, None),
            _ => self.run_generator(&generator, Some(Resumption::Next(sent))),
        }
    }

    /// GeneratorResumeAbrupt with a return completion: `return(value)`
    pub fn generator_return(
        &mut self,
        value: &JsValue,
        returned: JsValue,
        brand: GeneratorBrand,
    ) -> Result<JsValue, JsError> {
        self.generator_resume_abrupt(value, Resumption::Return(returned), brand)
    }

    /// GeneratorResumeAbrupt with a throw completion: `throw(exception)`
    pub fn generator_throw(
        &mut self,
        value: &JsValue,
        exception: JsValue,
        brand: GeneratorBrand,
    ) -> Result<JsValue, JsError> {
        self.generator_resume_abrupt(value, Resumption::Throw(exception), brand)
    }

    fn generator_resume_abrupt(
        &mut self,
        value: &JsValue,
        abrupt: Resumption,
        brand: GeneratorBrand,
    ) -> Result<JsValue, JsError> {
        let generator = self.generator_validate(value, brand)?;
        let state = generator.borrow().state;
        if state == GeneratorState::SuspendedStart {
            generator.borrow_mut().complete();
        }
        if matches!(
            state,
            GeneratorState::SuspendedStart | GeneratorState::Completed
        ) {
            return match abrupt {
                Resumption::Return(v) => Ok(self.create_iter_result(v, true)),
                Resumption::Throw(v) => Err(JsError::Thrown {
                    value: v,
                    location: None,
                }),
                Resumption::Next(_) => Ok(self.create_iter_result(JsValue::Undefined, true)),
            };
        }
        self.run_generator(&generator, Some(abrupt))
    }

    /// Splice the parked frame back and run until the next suspension or
    /// the end of the body
    fn run_generator(
        &mut self,
        generator: &GeneratorRef,
        resumption: Option<Resumption>,
    ) -> Result<JsValue, JsError> {
        let (context, body, previous) = {
            let mut g = generator.borrow_mut();
            let previous = g.state;
            let context = g
                .context
                .take()
                .ok_or_else(|| JsError::internal_error("suspended generator has no frame"))?;
            (context, g.body.cheap_clone(), previous)
        };
        if let Err(e) = self.check_recursion_depth() {
            // Leave the generator resumable
            generator.borrow_mut().context = Some(context);
            return Err(e);
        }
        {
            let mut g = generator.borrow_mut();
            g.resumption = resumption;
            g.transition(GeneratorState::Executing);
        }

        let guard = self.stack.enter(context);
        let result = self.evaluate_body(&body.node);
        match result {
            Err(JsError::GeneratorYield { value }) => {
                let frame = guard.park();
                {
                    let mut g = generator.borrow_mut();
                    g.context = frame;
                    g.transition(GeneratorState::SuspendedYield);
                }
                Ok(self.create_iter_result(value, false))
            }
            other => {
                guard.leave();
                generator.borrow_mut().complete();
                if previous == GeneratorState::SuspendedStart {
                    debug!(target: "jsflow::generator", "ran to completion on first resume");
                }
                let value = completion_result(other?)?;
                Ok(self.create_iter_result(value, true))
            }
        }
    }

    /// CreateIterResultObject
    pub fn create_iter_result(&self, value: JsValue, done: bool) -> JsValue {
        let object = create_object(Some(self.object_prototype.cheap_clone()));
        {
            let mut o = object.borrow_mut();
            o.define_property(JsString::from("value"), Property::data(value));
            o.define_property(JsString::from("done"), Property::data(JsValue::Boolean(done)));
        }
        JsValue::Object(object)
    }
}
