//! Error types for the lockstep runtime

use lockstep_model::ModelError;
use thiserror::Error;

/// Result type for runtime operations
pub type Result<T> = std::result::Result<T, RuntimeError>;

/// Errors that can occur in the lockstep runtime
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// A value's shape cannot be reconciled with its state variable or port
    #[error("Shape mismatch on {actor}.{name}: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        /// Actor name
        actor: String,
        /// State variable or port name
        name: String,
        /// Declared shape
        expected: Vec<usize>,
        /// Offending shape
        actual: Vec<usize>,
    },

    /// Two ports of one direction share a name with different shapes
    #[error("Duplicate {direction} port {actor}.{name}: {first:?} vs {second:?}")]
    DuplicatePort {
        /// Actor name
        actor: String,
        /// Port name
        name: String,
        /// "input" or "output"
        direction: &'static str,
        /// Shape already registered
        first: Vec<usize>,
        /// Conflicting shape
        second: Vec<usize>,
    },

    /// Lookup of a state variable that the actor does not have
    #[error("Actor '{actor}' has no state variable '{name}'")]
    UnknownStateVariable {
        /// Actor name
        actor: String,
        /// Missing name
        name: String,
    },

    /// Lookup of a port that the actor does not have
    #[error("Actor '{actor}' has no {direction} port '{name}'")]
    UnknownPort {
        /// Actor name
        actor: String,
        /// Missing port name
        name: String,
        /// "input" or "output"
        direction: &'static str,
    },

    /// Actor not found
    #[error("Actor '{name}' not found")]
    ActorNotFound {
        /// Actor name
        name: String,
    },

    /// Receive did not complete in time
    #[error("Receive on {actor}.{port} timed out after {timeout_ms}ms at tick {tick}")]
    ReceiveTimeout {
        /// Consumer actor
        actor: String,
        /// Input port
        port: String,
        /// Configured timeout
        timeout_ms: u64,
        /// Tick being executed
        tick: u64,
    },

    /// The other end of a port channel is gone
    #[error("Port {actor}.{port} is disconnected")]
    Disconnected {
        /// Actor name
        actor: String,
        /// Port name
        port: String,
    },

    /// Update or reset function failed
    #[error("Function '{function}' of actor '{actor}' failed: {source}")]
    FunctionFailed {
        /// Actor name
        actor: String,
        /// Function name
        function: String,
        /// Underlying error
        #[source]
        source: ModelError,
    },

    /// A tick phase ran out of order
    #[error("Actor '{actor}' cannot {action} while {phase}")]
    PhaseViolation {
        /// Actor name
        actor: String,
        /// Attempted action
        action: &'static str,
        /// Current phase
        phase: String,
    },

    /// Operation not allowed in the current lifecycle state
    #[error("Invalid lifecycle: cannot {action} while {state}")]
    InvalidLifecycle {
        /// Attempted action
        action: String,
        /// Current state
        state: String,
    },

    /// Network topology error
    #[error("Network topology error: {reason}")]
    NetworkTopology {
        /// Reason for topology error
        reason: String,
    },

    /// Invalid parameter value
    #[error("Invalid parameter {parameter}: {value} (expected {constraint})")]
    InvalidParameter {
        /// Parameter name
        parameter: String,
        /// Invalid value
        value: String,
        /// Constraint description
        constraint: String,
    },
}

impl RuntimeError {
    /// Create a shape mismatch error
    pub fn shape_mismatch(
        actor: impl Into<String>,
        name: impl Into<String>,
        expected: &[usize],
        actual: &[usize],
    ) -> Self {
        Self::ShapeMismatch {
            actor: actor.into(),
            name: name.into(),
            expected: expected.to_vec(),
            actual: actual.to_vec(),
        }
    }

    /// Create an unknown state variable error
    pub fn unknown_state(actor: impl Into<String>, name: impl Into<String>) -> Self {
        Self::UnknownStateVariable {
            actor: actor.into(),
            name: name.into(),
        }
    }

    /// Create an unknown port error
    pub fn unknown_port(
        actor: impl Into<String>,
        name: impl Into<String>,
        direction: &'static str,
    ) -> Self {
        Self::UnknownPort {
            actor: actor.into(),
            name: name.into(),
            direction,
        }
    }

    /// Create an invalid lifecycle error
    pub fn invalid_lifecycle(action: impl Into<String>, state: impl ToString) -> Self {
        Self::InvalidLifecycle {
            action: action.into(),
            state: state.to_string(),
        }
    }

    /// Create a network topology error
    pub fn network_topology(reason: impl Into<String>) -> Self {
        Self::NetworkTopology {
            reason: reason.into(),
        }
    }

    /// Create an invalid parameter error
    pub fn invalid_parameter(
        parameter: impl Into<String>,
        value: impl Into<String>,
        constraint: impl Into<String>,
    ) -> Self {
        Self::InvalidParameter {
            parameter: parameter.into(),
            value: value.into(),
            constraint: constraint.into(),
        }
    }
}
