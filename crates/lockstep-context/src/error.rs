//! Error handling for the context manager

use thiserror::Error;

/// Result type for context operations
pub type Result<T> = std::result::Result<T, ContextError>;

/// Context-level errors
#[derive(Error, Debug)]
pub enum ContextError {
    /// Host model error
    #[error("Model error: {0}")]
    Model(#[from] lockstep_model::ModelError),

    /// Runtime layer error
    #[error("Runtime error: {0}")]
    Runtime(#[from] lockstep_runtime::RuntimeError),

    /// Compile or wiring error; the previous actor set is kept
    #[error("Compile error: {0}")]
    Compiler(#[from] lockstep_compiler::CompilerError),

    /// Operation not allowed in the current lifecycle state
    #[error("Invalid lifecycle: cannot {action} while {state}")]
    InvalidLifecycle {
        /// Attempted action
        action: String,
        /// Current state
        state: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ContextError {
    /// Create a lifecycle error
    pub fn invalid_lifecycle(action: impl Into<String>, state: impl ToString) -> Self {
        Self::InvalidLifecycle {
            action: action.into(),
            state: state.to_string(),
        }
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
