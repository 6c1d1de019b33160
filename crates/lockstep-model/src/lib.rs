//! Host component model for the lockstep actor compiler
//!
//! Components own parameters, compartments (state slots), a connection list and
//! named pure functions. The compiler reads this model to build actors; the
//! context writes actor state back into it.

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod component;
pub mod error;
pub mod model;
pub mod topology;
pub mod value;

pub use component::{
    Bindings, Component, Connection, PureFunction, SlotPath, RESET_FUNCTION, UPDATE_FUNCTION,
};
pub use error::{ModelError, Result};
pub use model::Model;
pub use topology::{ComponentRecord, Topology};
pub use value::{Value, ValueRecord};
