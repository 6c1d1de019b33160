//! Live actor instances and the per-tick phase protocol

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::Duration;

use crossbeam::channel::{Receiver, Sender};
use lockstep_model::{value, Bindings, PureFunction, Value};

use crate::error::*;
use crate::port::{InputPort, OutputPort};
use crate::template::ActorTemplate;

/// Where an actor is inside the current tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorPhase {
    /// Between ticks
    Idle,
    /// Lagged actor has published last tick's outputs
    Emitted,
    /// Inputs gathered for this tick
    Received,
    /// Update function applied
    Computed,
}

impl Display for ActorPhase {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ActorPhase::Idle => write!(f, "idle"),
            ActorPhase::Emitted => write!(f, "emitted"),
            ActorPhase::Received => write!(f, "received"),
            ActorPhase::Computed => write!(f, "computed"),
        }
    }
}

/// One running realization of an [`ActorTemplate`]
#[derive(Debug)]
pub struct ActorInstance {
    template: Arc<ActorTemplate>,
    state: BTreeMap<String, Value>,
    inputs: BTreeMap<String, InputPort>,
    outputs: BTreeMap<String, OutputPort>,
    clamps: BTreeMap<String, Value>,
    phase: ActorPhase,
}

impl ActorInstance {
    /// Instantiate a template with unbound ports
    pub fn new(template: Arc<ActorTemplate>) -> Self {
        let state = template
            .states()
            .map(|s| (s.name.clone(), s.initial.clone()))
            .collect();
        let inputs = template
            .inputs()
            .map(|p| (p.name.clone(), InputPort::new(p.clone())))
            .collect();
        let outputs = template
            .outputs()
            .map(|p| (p.name.clone(), OutputPort::new(p.clone())))
            .collect();
        Self {
            template,
            state,
            inputs,
            outputs,
            clamps: BTreeMap::new(),
            phase: ActorPhase::Idle,
        }
    }

    /// Actor name
    pub fn name(&self) -> &str {
        self.template.name()
    }

    /// Template this instance was built from
    pub fn template(&self) -> &ActorTemplate {
        &self.template
    }

    /// Whether outputs are emitted one tick late
    pub fn is_lagged(&self) -> bool {
        self.template.is_lagged()
    }

    /// Current phase
    pub fn phase(&self) -> ActorPhase {
        self.phase
    }

    /// Current value of a state variable
    pub fn state(&self, name: &str) -> Option<&Value> {
        self.state.get(name)
    }

    /// All state variables in name order
    pub fn states(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.state.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Overwrite a state variable, keeping its shape
    pub fn set_state(&mut self, name: &str, v: Value) -> Result<()> {
        let actor = self.template.name();
        let current = self
            .state
            .get_mut(name)
            .ok_or_else(|| RuntimeError::unknown_state(actor, name))?;
        let v = value::normalize(v);
        let v = value::reshape(&v, current.shape()).ok_or_else(|| {
            RuntimeError::shape_mismatch(actor, name, current.shape(), v.shape())
        })?;
        *current = v;
        Ok(())
    }

    /// True if the actor has an input port `name`
    pub fn has_input(&self, name: &str) -> bool {
        self.inputs.contains_key(name)
    }

    /// True if the actor has an output port `name`
    pub fn has_output(&self, name: &str) -> bool {
        self.outputs.contains_key(name)
    }

    /// Input port by name
    pub fn input(&self, name: &str) -> Option<&InputPort> {
        self.inputs.get(name)
    }

    /// Output port by name
    pub fn output(&self, name: &str) -> Option<&OutputPort> {
        self.outputs.get(name)
    }

    /// Value most recently emitted on an output port
    pub fn last_emitted(&self, port: &str) -> Option<&Value> {
        self.outputs.get(port).and_then(|p| p.last_emitted())
    }

    /// Attach the receiving end of a wiring edge
    pub fn bind_input(&mut self, port: &str, rx: Receiver<Value>) -> Result<()> {
        let actor = self.template.name();
        self.inputs
            .get_mut(port)
            .ok_or_else(|| RuntimeError::unknown_port(actor, port, "input"))?
            .bind(rx);
        Ok(())
    }

    /// Attach the sending end of a wiring edge
    pub fn bind_output(&mut self, port: &str, tx: Sender<Value>) -> Result<()> {
        let actor = self.template.name();
        self.outputs
            .get_mut(port)
            .ok_or_else(|| RuntimeError::unknown_port(actor, port, "output"))?
            .bind(tx);
        Ok(())
    }

    /// Hold `slot` at `v` every tick, after inputs are received
    pub fn clamp(&mut self, slot: &str, v: Value) -> Result<()> {
        let v = self.prepare_clamp(slot, v)?;
        self.install_clamp(slot, v);
        Ok(())
    }

    /// Check `v` against state variable `slot` and reshape it to fit
    pub fn prepare_clamp(&self, slot: &str, v: Value) -> Result<Value> {
        let current = self
            .state
            .get(slot)
            .ok_or_else(|| RuntimeError::unknown_state(self.template.name(), slot))?;
        let v = value::normalize(v);
        value::reshape(&v, current.shape()).ok_or_else(|| {
            RuntimeError::shape_mismatch(self.template.name(), slot, current.shape(), v.shape())
        })
    }

    pub(crate) fn install_clamp(&mut self, slot: &str, v: Value) {
        self.clamps.insert(slot.to_string(), v);
    }

    /// Drop all clamps
    pub fn clear_clamps(&mut self) {
        self.clamps.clear();
    }

    /// Active clamps
    pub fn clamps(&self) -> &BTreeMap<String, Value> {
        &self.clamps
    }

    /// Lag phase: publish the pre-tick output values
    pub fn emit_lagged(&mut self, timeout: Duration) -> Result<()> {
        if !self.is_lagged() || self.phase != ActorPhase::Idle {
            return Err(self.violation("emit early"));
        }
        self.emit(timeout)?;
        self.phase = ActorPhase::Emitted;
        Ok(())
    }

    /// Receive, compute and (when not lagged) emit for one tick
    pub fn advance(&mut self, timeout: Duration, tick: u64) -> Result<()> {
        let expected = if self.is_lagged() {
            ActorPhase::Emitted
        } else {
            ActorPhase::Idle
        };
        if self.phase != expected {
            return Err(self.violation("receive"));
        }

        self.receive(timeout, tick)?;
        self.phase = ActorPhase::Received;

        self.compute()?;
        self.phase = ActorPhase::Computed;

        if !self.is_lagged() {
            self.emit(timeout)?;
        }
        self.phase = ActorPhase::Idle;
        Ok(())
    }

    fn receive(&mut self, timeout: Duration, tick: u64) -> Result<()> {
        let actor = self.template.name();
        for (name, port) in &self.inputs {
            if !port.is_bound() {
                continue;
            }
            let v = port.recv(actor, timeout, tick)?;
            if let Some(slot) = self.state.get_mut(name) {
                *slot = v;
            }
        }
        for (name, v) in &self.clamps {
            if let Some(slot) = self.state.get_mut(name) {
                *slot = v.clone();
            }
        }
        Ok(())
    }

    fn compute(&mut self) -> Result<()> {
        let template = Arc::clone(&self.template);
        let update = template.update();
        let values = self.invoke(update)?;
        for (name, v) in update.outputs().iter().zip(values) {
            self.set_state(name, v)?;
        }
        Ok(())
    }

    fn emit(&mut self, timeout: Duration) -> Result<()> {
        let actor = self.template.name();
        for (name, port) in self.outputs.iter_mut() {
            let v = self
                .state
                .get(name)
                .ok_or_else(|| RuntimeError::unknown_state(actor, name))?;
            port.send(actor, v, timeout)?;
        }
        Ok(())
    }

    /// Run the reset function outside the tick protocol. Returns `false`
    /// when the actor has no reset function.
    pub fn reset(&mut self) -> Result<bool> {
        let template = Arc::clone(&self.template);
        let Some(reset) = template.reset() else {
            log::debug!("Actor '{}' has no reset function", self.name());
            return Ok(false);
        };
        let values = self.invoke(reset)?;
        for (name, v) in reset.outputs().iter().zip(values) {
            self.set_state(name, v)?;
        }
        Ok(true)
    }

    fn invoke(&self, function: &PureFunction) -> Result<Vec<Value>> {
        let actor = self.template.name();
        let mut bindings = Bindings::new();
        for name in function.parameters().iter().chain(function.compartments()) {
            let v = self
                .state
                .get(name)
                .ok_or_else(|| RuntimeError::unknown_state(actor, name))?;
            bindings.insert(name.as_str(), v);
        }
        function
            .call(&bindings)
            .map_err(|source| RuntimeError::FunctionFailed {
                actor: actor.to_string(),
                function: function.name().to_string(),
                source,
            })
    }

    fn violation(&self, action: &'static str) -> RuntimeError {
        RuntimeError::PhaseViolation {
            actor: self.name().to_string(),
            action,
            phase: self.phase.to_string(),
        }
    }
}
