//! Error types for the engine

use thiserror::Error;

use crate::ast::Span;
use crate::value::JsValue;

/// Stack frame for error traces
#[derive(Debug, Clone, PartialEq)]
pub struct StackFrame {
    pub function_name: Option<String>,
}

impl std::fmt::Display for StackFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = self.function_name.as_deref().unwrap_or("<anonymous>");
        write!(f, "    at {}", name)
    }
}

/// Main error type for the engine
#[derive(Debug, Error)]
pub enum JsError {
    #[error("SyntaxError: {message}{}", format_location(.location))]
    SyntaxError {
        message: String,
        location: Option<Span>,
    },

    #[error("TypeError: {message}{}", format_location(.location))]
    TypeError {
        message: String,
        location: Option<Span>,
    },

    #[error("ReferenceError: {message}")]
    ReferenceError { message: String },

    #[error("RangeError: {message}")]
    RangeError { message: String },

    /// A scripted value in flight, raised out of a body that completed with
    /// a Throw completion
    #[error("Uncaught {}{}", describe_thrown(.value), format_location(.location))]
    Thrown {
        value: JsValue,
        location: Option<Span>,
    },

    /// Internal marker for generator yield (not a real error)
    #[error("GeneratorYield")]
    GeneratorYield { value: JsValue },

    #[error("RangeError: Maximum call stack size exceeded ({depth} frames)")]
    RecursionDepthOverflow { depth: usize },

    #[error("Execution aborted: {message}")]
    ConstraintViolation { message: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

fn format_location(location: &Option<Span>) -> String {
    match location {
        Some(loc) => format!(" at {}", loc),
        None => String::new(),
    }
}

fn describe_thrown(value: &JsValue) -> String {
    if let JsValue::Object(obj) = value {
        let obj = obj.borrow();
        let name = obj.get_property(&"name".into());
        let message = obj.get_property(&"message".into());
        if let (Some(JsValue::String(name)), Some(message)) = (name, message) {
            return format!("{}: {}", name, message.to_js_string());
        }
    }
    value.to_js_string().to_string()
}

impl JsError {
    pub fn syntax_error(message: impl Into<String>) -> Self {
        JsError::SyntaxError {
            message: message.into(),
            location: None,
        }
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        JsError::TypeError {
            message: message.into(),
            location: None,
        }
    }

    pub fn type_error_at(message: impl Into<String>, location: Span) -> Self {
        JsError::TypeError {
            message: message.into(),
            location: Some(location),
        }
    }

    pub fn reference_error(message: impl Into<String>) -> Self {
        JsError::ReferenceError {
            message: message.into(),
        }
    }

    /// `x is not defined`
    pub fn not_defined(name: &str) -> Self {
        JsError::ReferenceError {
            message: format!("{} is not defined", name),
        }
    }

    pub fn range_error(message: impl Into<String>) -> Self {
        JsError::RangeError {
            message: message.into(),
        }
    }

    pub fn thrown(value: JsValue) -> Self {
        JsError::Thrown {
            value,
            location: None,
        }
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        JsError::Internal(message.into())
    }

    /// Errors raised by the host rather than by script code. They unwind
    /// every frame and are never turned into catchable Throw completions.
    pub fn is_host_abort(&self) -> bool {
        matches!(
            self,
            JsError::RecursionDepthOverflow { .. }
                | JsError::ConstraintViolation { .. }
                | JsError::Internal(_)
        )
    }

    /// The generator suspension marker
    pub fn is_suspension(&self) -> bool {
        matches!(self, JsError::GeneratorYield { .. })
    }

    pub fn location(&self) -> Option<Span> {
        match self {
            JsError::SyntaxError { location, .. }
            | JsError::TypeError { location, .. }
            | JsError::Thrown { location, .. } => *location,
            _ => None,
        }
    }

    /// The thrown value, for `Thrown` errors
    pub fn thrown_value(&self) -> Option<&JsValue> {
        match self {
            JsError::Thrown { value, .. } => Some(value),
            _ => None,
        }
    }
}
