//! Compiler error type

use lockstep_model::ModelError;
use lockstep_runtime::RuntimeError;

/// Compiler error type
#[derive(thiserror::Error, Debug)]
pub enum CompilerError {
    /// A pure function could not be resolved on a component
    #[error("Cannot extract '{function}' from '{component}': {reason}")]
    Extraction {
        /// Component name
        component: String,
        /// Function name
        function: String,
        /// Reason
        reason: String,
    },

    /// Wiring names a component or port that was not compiled
    #[error("Unresolved reference '{reference}': {reason}")]
    UnresolvedReference {
        /// Offending path
        reference: String,
        /// Reason
        reason: String,
    },

    /// A port's shape could not be resolved or does not match its peer
    #[error("Shape mismatch at {actor}/{slot}: {reason}")]
    ShapeMismatch {
        /// Actor name
        actor: String,
        /// Slot name
        slot: String,
        /// Reason
        reason: String,
    },

    /// Wiring contains a cycle with no lagged actor
    #[error("Cyclic wiring without a lagged actor among [{}]", .actors.join(", "))]
    CyclicWiring {
        /// Actors that could not be scheduled
        actors: Vec<String>,
    },

    /// Runtime layer error during template construction or lowering
    #[error("Runtime error: {0}")]
    Runtime(#[from] RuntimeError),

    /// Host model error
    #[error("Model error: {0}")]
    Model(#[from] ModelError),
}

impl CompilerError {
    /// Create an extraction error
    pub fn extraction(
        component: impl Into<String>,
        function: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Extraction {
            component: component.into(),
            function: function.into(),
            reason: reason.into(),
        }
    }

    /// Create an unresolved reference error
    pub fn unresolved(reference: impl ToString, reason: impl Into<String>) -> Self {
        Self::UnresolvedReference {
            reference: reference.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result alias for compiler operations
pub type Result<T> = std::result::Result<T, CompilerError>;
