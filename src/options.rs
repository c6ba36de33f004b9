//! Engine configuration and the execution-limiting hook

use serde::{Deserialize, Serialize};

use crate::error::JsError;

/// Half of the 2 MiB stack Rust gives spawned threads
pub const DEFAULT_NATIVE_STACK: usize = 1024 * 1024;

/// Options fixed at interpreter construction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineOptions {
    /// Evaluate every program as strict code
    pub strict: bool,
    /// Maximum number of execution contexts on the stack (`None` = unlimited)
    pub max_recursion_depth: Option<usize>,
    /// Native stack bytes calls may consume below the shallowest entry point
    /// (`None` = unchecked)
    pub max_native_stack: Option<usize>,
    /// Record function names on execution contexts for stack traces
    pub debug_names: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            strict: false,
            max_recursion_depth: Some(512),
            max_native_stack: Some(DEFAULT_NATIVE_STACK),
            debug_names: true,
        }
    }
}

impl EngineOptions {
    /// Parse options from JSON, filling absent fields with defaults
    pub fn from_json(json: &str) -> Result<Self, JsError> {
        serde_json::from_str(json)
            .map_err(|e| JsError::internal_error(format!("invalid engine options: {}", e)))
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn max_recursion_depth(mut self, depth: Option<usize>) -> Self {
        self.max_recursion_depth = depth;
        self
    }

    pub fn max_native_stack(mut self, bytes: Option<usize>) -> Self {
        self.max_native_stack = bytes;
        self
    }
}

/// Host hook consulted before every statement.
///
/// An error returned from `check` aborts the whole evaluation: it unwinds
/// every frame and cannot be caught by script code.
pub trait ExecutionConstraint {
    fn check(&mut self) -> Result<(), JsError>;

    /// Called at the start of every `evaluate_program`
    fn reset(&mut self) {}
}

/// Aborts after a fixed number of statements
#[derive(Debug, Clone)]
pub struct MaxStatements {
    limit: u64,
    executed: u64,
}

impl MaxStatements {
    pub fn new(limit: u64) -> Self {
        Self { limit, executed: 0 }
    }
}

impl ExecutionConstraint for MaxStatements {
    fn check(&mut self) -> Result<(), JsError> {
        self.executed += 1;
        if self.executed > self.limit {
            return Err(JsError::ConstraintViolation {
                message: format!("statement limit of {} exceeded", self.limit),
            });
        }
        Ok(())
    }

    fn reset(&mut self) {
        self.executed = 0;
    }
}
