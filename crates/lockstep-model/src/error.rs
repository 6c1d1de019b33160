//! Error types for the host model

use thiserror::Error;

/// Result type for host model operations
pub type Result<T> = std::result::Result<T, ModelError>;

/// Errors raised by the host model
#[derive(Error, Debug)]
pub enum ModelError {
    /// Component not registered
    #[error("Component '{name}' not found")]
    UnknownComponent {
        /// Component name
        name: String,
    },

    /// Slot not present on a component
    #[error("Component '{component}' has no slot '{slot}'")]
    UnknownSlot {
        /// Component name
        component: String,
        /// Slot name
        slot: String,
    },

    /// A component with the same name is already registered
    #[error("Component '{name}' already registered")]
    DuplicateComponent {
        /// Component name
        name: String,
    },

    /// Malformed `component/slot` path
    #[error("Invalid slot path '{path}' (expected 'component/slot')")]
    InvalidPath {
        /// Offending path
        path: String,
    },

    /// A pure function asked for an argument it was not given
    #[error("Missing binding '{name}'")]
    MissingBinding {
        /// Argument name
        name: String,
    },

    /// A pure function returned the wrong number of values
    #[error("Function '{function}' returned {actual} values (expected {expected})")]
    OutputArity {
        /// Function name
        function: String,
        /// Declared output count
        expected: usize,
        /// Returned value count
        actual: usize,
    },

    /// Value could not be constructed
    #[error("Invalid value: {reason}")]
    InvalidValue {
        /// Reason
        reason: String,
    },

    /// Failure raised from inside a pure function body
    #[error("Function error: {reason}")]
    Function {
        /// Reason
        reason: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Topology (de)serialization error
    #[error("Topology format error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ModelError {
    /// Create an unknown slot error
    pub fn unknown_slot(component: impl Into<String>, slot: impl Into<String>) -> Self {
        Self::UnknownSlot {
            component: component.into(),
            slot: slot.into(),
        }
    }

    /// Create an invalid value error
    pub fn invalid_value(reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            reason: reason.into(),
        }
    }

    /// Create an error from inside a pure function body
    pub fn function(reason: impl Into<String>) -> Self {
        Self::Function {
            reason: reason.into(),
        }
    }
}
