//! Completion records

use crate::ast::Span;
use crate::value::{JsString, JsValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionType {
    Normal,
    Break,
    Continue,
    Return,
    Throw,
}

/// Outcome of evaluating a statement.
///
/// `value` is `None` for the empty completion value, which statement lists
/// replace with the last value seen.
#[derive(Debug, Clone)]
pub struct Completion {
    pub kind: CompletionType,
    pub value: Option<JsValue>,
    pub label: Option<JsString>,
    pub location: Span,
}

impl Completion {
    pub fn new(
        kind: CompletionType,
        value: Option<JsValue>,
        label: Option<JsString>,
        location: Span,
    ) -> Self {
        Self {
            kind,
            value,
            label,
            location,
        }
    }

    pub fn normal(value: JsValue) -> Self {
        Self::new(CompletionType::Normal, Some(value), None, Span::default())
    }

    pub fn empty() -> Self {
        Self::new(CompletionType::Normal, None, None, Span::default())
    }

    pub fn normal_opt(value: Option<JsValue>) -> Self {
        Self::new(CompletionType::Normal, value, None, Span::default())
    }

    pub fn return_(value: JsValue) -> Self {
        Self::new(CompletionType::Return, Some(value), None, Span::default())
    }

    pub fn throw(value: JsValue, location: Span) -> Self {
        Self::new(CompletionType::Throw, Some(value), None, location)
    }

    pub fn break_(label: Option<JsString>, location: Span) -> Self {
        Self::new(CompletionType::Break, None, label, location)
    }

    pub fn continue_(label: Option<JsString>, location: Span) -> Self {
        Self::new(CompletionType::Continue, None, label, location)
    }

    pub fn is_abrupt(&self) -> bool {
        self.kind != CompletionType::Normal
    }

    pub fn value_or_undefined(&self) -> JsValue {
        self.value.clone().unwrap_or_default()
    }

    /// UpdateEmpty: fill an empty value, keep a present one
    pub fn update_empty(mut self, value: Option<JsValue>) -> Self {
        if self.value.is_none() {
            self.value = value;
        }
        self
    }

    /// LoopContinues: whether an iteration statement carrying `labels`
    /// proceeds to its next iteration after this completion
    pub fn loop_continues(&self, labels: &[JsString]) -> bool {
        match self.kind {
            CompletionType::Normal => true,
            CompletionType::Continue => match &self.label {
                None => true,
                Some(label) => labels.contains(label),
            },
            _ => false,
        }
    }

    /// Whether this is an unlabelled break, consumed by the innermost
    /// breakable statement
    pub fn is_unlabelled_break(&self) -> bool {
        self.kind == CompletionType::Break && self.label.is_none()
    }
}
