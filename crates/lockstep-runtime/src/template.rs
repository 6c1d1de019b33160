//! Actor templates: the compiled, immutable shape of one component

use std::collections::BTreeMap;

use lockstep_model::{value, PureFunction, Value};

use crate::error::*;

/// A named, shaped value cell owned by an actor
#[derive(Debug, Clone, PartialEq)]
pub struct StateVariable {
    /// Variable name
    pub name: String,
    /// Value the instance starts from
    pub initial: Value,
}

impl StateVariable {
    /// Fixed shape of the variable
    pub fn shape(&self) -> &[usize] {
        self.initial.shape()
    }
}

/// Name and shape of a port
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortSpec {
    /// Port name, equal to the backing state variable
    pub name: String,
    /// Shape of values crossing the port
    pub shape: Vec<usize>,
}

/// Compiled description of one actor.
///
/// Every port name is also a state variable name; templates are built once
/// per compile pass and never edited afterwards.
#[derive(Debug, Clone)]
pub struct ActorTemplate {
    name: String,
    state: BTreeMap<String, StateVariable>,
    inputs: BTreeMap<String, PortSpec>,
    outputs: BTreeMap<String, PortSpec>,
    update: PureFunction,
    reset: Option<PureFunction>,
    lag: bool,
}

impl ActorTemplate {
    /// Create a template with no state or ports
    pub fn new(name: impl Into<String>, update: PureFunction, lag: bool) -> Self {
        Self {
            name: name.into(),
            state: BTreeMap::new(),
            inputs: BTreeMap::new(),
            outputs: BTreeMap::new(),
            update,
            reset: None,
            lag,
        }
    }

    /// Add a state variable; the first registration of a name wins
    pub fn add_state(&mut self, name: &str, initial: Value) -> bool {
        if self.state.contains_key(name) {
            return false;
        }
        self.state.insert(
            name.to_string(),
            StateVariable {
                name: name.to_string(),
                initial: value::normalize(initial),
            },
        );
        true
    }

    /// Add an input port backed by state variable `name`
    pub fn add_input(&mut self, name: &str) -> Result<()> {
        let shape = self.shape_of(name)?;
        Self::insert_port(&self.name, &mut self.inputs, "input", name, shape)
    }

    /// Add an output port backed by state variable `name`
    pub fn add_output(&mut self, name: &str) -> Result<()> {
        let shape = self.shape_of(name)?;
        Self::insert_port(&self.name, &mut self.outputs, "output", name, shape)
    }

    /// Attach a reset function
    pub fn set_reset(&mut self, reset: PureFunction) {
        self.reset = Some(reset);
    }

    fn shape_of(&self, name: &str) -> Result<Vec<usize>> {
        self.state
            .get(name)
            .map(|s| s.shape().to_vec())
            .ok_or_else(|| RuntimeError::unknown_state(&self.name, name))
    }

    fn insert_port(
        actor: &str,
        ports: &mut BTreeMap<String, PortSpec>,
        direction: &'static str,
        name: &str,
        shape: Vec<usize>,
    ) -> Result<()> {
        match ports.get(name) {
            Some(existing) if existing.shape != shape => Err(RuntimeError::DuplicatePort {
                actor: actor.to_string(),
                name: name.to_string(),
                direction,
                first: existing.shape.clone(),
                second: shape,
            }),
            Some(_) => Ok(()),
            None => {
                ports.insert(
                    name.to_string(),
                    PortSpec {
                        name: name.to_string(),
                        shape,
                    },
                );
                Ok(())
            }
        }
    }

    /// Actor name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether outputs are emitted one tick late
    pub fn is_lagged(&self) -> bool {
        self.lag
    }

    /// State variable by name
    pub fn state(&self, name: &str) -> Option<&StateVariable> {
        self.state.get(name)
    }

    /// All state variables in name order
    pub fn states(&self) -> impl Iterator<Item = &StateVariable> {
        self.state.values()
    }

    /// Number of state variables
    pub fn state_count(&self) -> usize {
        self.state.len()
    }

    /// Input port specs
    pub fn inputs(&self) -> impl Iterator<Item = &PortSpec> {
        self.inputs.values()
    }

    /// Output port specs
    pub fn outputs(&self) -> impl Iterator<Item = &PortSpec> {
        self.outputs.values()
    }

    /// Input port spec by name
    pub fn input(&self, name: &str) -> Option<&PortSpec> {
        self.inputs.get(name)
    }

    /// Output port spec by name
    pub fn output(&self, name: &str) -> Option<&PortSpec> {
        self.outputs.get(name)
    }

    /// Update function
    pub fn update(&self) -> &PureFunction {
        &self.update
    }

    /// Reset function, if the component has one
    pub fn reset(&self) -> Option<&PureFunction> {
        self.reset.as_ref()
    }
}
