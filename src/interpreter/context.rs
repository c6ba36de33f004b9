//! Execution contexts and the context stack
//!
//! Every call, construct and generator resume enters exactly one context
//! through [`ContextStack::enter`]. The returned [`ContextGuard`] pops it when
//! dropped, so early returns and `?` keep the stack balanced. A generator
//! that suspends uses [`ContextGuard::park`] to take its frame off the stack
//! and keep it.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use tracing::trace;

use super::environment::EnvRef;
use super::generator::{Generator, GeneratorRef};
use crate::value::{CheapClone, JsString};

/// One stack frame
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    pub lexical_environment: EnvRef,
    pub variable_environment: EnvRef,
    /// Generator driving this frame, if any
    pub(crate) generator: Option<Weak<RefCell<Generator>>>,
    pub strict: bool,
    /// Name of the running function, for stack traces
    pub function_name: Option<JsString>,
}

impl ExecutionContext {
    pub fn new(lexical_environment: EnvRef, variable_environment: EnvRef, strict: bool) -> Self {
        Self {
            lexical_environment,
            variable_environment,
            generator: None,
            strict,
            function_name: None,
        }
    }

    pub fn named(mut self, name: Option<JsString>) -> Self {
        self.function_name = name;
        self
    }

    /// The generator this frame belongs to, if it is still alive
    pub fn generator(&self) -> Option<GeneratorRef> {
        self.generator.as_ref().and_then(Weak::upgrade)
    }
}

type Frames = Rc<RefCell<Vec<ExecutionContext>>>;

/// Stack of execution contexts owned by one interpreter
#[derive(Debug, Default)]
pub struct ContextStack {
    frames: Frames,
}

impl ContextStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn depth(&self) -> usize {
        self.frames.borrow().len()
    }

    /// Push a frame for the lifetime of the returned guard
    #[must_use = "the context is popped when the guard is dropped"]
    pub fn enter(&self, context: ExecutionContext) -> ContextGuard {
        let mut frames = self.frames.borrow_mut();
        frames.push(context);
        let depth = frames.len();
        trace!(target: "jsflow::context", depth, "enter");
        ContextGuard {
            frames: self.frames.cheap_clone(),
            depth,
            active: true,
        }
    }

    /// Push a frame that is never popped (the global frame)
    pub fn push_root(&self, context: ExecutionContext) {
        self.frames.borrow_mut().push(context);
    }

    /// Clone of the running context
    pub fn current(&self) -> Option<ExecutionContext> {
        self.frames.borrow().last().cloned()
    }

    pub fn with_current<R>(&self, f: impl FnOnce(&ExecutionContext) -> R) -> Option<R> {
        self.frames.borrow().last().map(f)
    }

    pub fn with_current_mut<R>(&self, f: impl FnOnce(&mut ExecutionContext) -> R) -> Option<R> {
        self.frames.borrow_mut().last_mut().map(f)
    }

    /// Function names from innermost to outermost
    pub fn function_names(&self) -> Vec<Option<JsString>> {
        self.frames
            .borrow()
            .iter()
            .rev()
            .map(|ctx| ctx.function_name.clone())
            .collect()
    }
}

/// Pops its context when dropped
#[derive(Debug)]
pub struct ContextGuard {
    frames: Frames,
    depth: usize,
    active: bool,
}

impl ContextGuard {
    /// Stack depth including this guard's frame
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Pop the frame now
    pub fn leave(self) {
        drop(self);
    }

    /// Pop the frame and hand it to the caller instead of discarding it
    pub fn park(mut self) -> Option<ExecutionContext> {
        self.active = false;
        let mut frames = self.frames.borrow_mut();
        debug_assert_eq!(frames.len(), self.depth, "unbalanced context stack");
        let frame = frames.pop();
        trace!(target: "jsflow::context", depth = self.depth, "park");
        frame
    }
}

impl Drop for ContextGuard {
    fn drop(&mut self) {
        if !self.active {
            return;
        }
        if let Ok(mut frames) = self.frames.try_borrow_mut() {
            debug_assert_eq!(frames.len(), self.depth, "unbalanced context stack");
            frames.pop();
            trace!(target: "jsflow::context", depth = self.depth, "leave");
        }
    }
}
