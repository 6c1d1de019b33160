//! Ports and their channel transport.
//!
//! Each wiring edge is one bounded channel. An input port bound to several
//! edges receives one value from every edge per tick and sums them.

use std::time::Duration;

use crossbeam::channel::{self, Receiver, RecvTimeoutError, SendTimeoutError, Sender};
use lockstep_model::{value, Value};

use crate::error::*;
use crate::template::PortSpec;

/// Create the channel backing one wiring edge
pub fn edge_channel(capacity: usize) -> (Sender<Value>, Receiver<Value>) {
    channel::bounded(capacity.max(1))
}

/// Sum the values delivered to one input port.
///
/// Every value must carry the port's element count; it is reshaped to the
/// port shape before being added.
pub fn accumulate<I>(actor: &str, spec: &PortSpec, values: I) -> Result<Value>
where
    I: IntoIterator<Item = Value>,
{
    let mut total = value::zeros(&spec.shape);
    for v in values {
        let v = value::reshape(&v, &spec.shape).ok_or_else(|| {
            RuntimeError::shape_mismatch(actor, &spec.name, &spec.shape, v.shape())
        })?;
        total += &v;
    }
    Ok(total)
}

/// Receiving end of a port
#[derive(Debug)]
pub struct InputPort {
    spec: PortSpec,
    receivers: Vec<Receiver<Value>>,
}

impl InputPort {
    /// Create an unbound input port
    pub fn new(spec: PortSpec) -> Self {
        Self {
            spec,
            receivers: Vec::new(),
        }
    }

    /// Bind one more wiring edge
    pub fn bind(&mut self, receiver: Receiver<Value>) {
        self.receivers.push(receiver);
    }

    /// Port description
    pub fn spec(&self) -> &PortSpec {
        &self.spec
    }

    /// Number of bound edges
    pub fn fan_in(&self) -> usize {
        self.receivers.len()
    }

    /// True when at least one edge drives this port
    pub fn is_bound(&self) -> bool {
        !self.receivers.is_empty()
    }

    /// Block until every bound edge has delivered, then return the sum
    pub fn recv(&self, actor: &str, timeout: Duration, tick: u64) -> Result<Value> {
        let mut values = Vec::with_capacity(self.receivers.len());
        for rx in &self.receivers {
            match rx.recv_timeout(timeout) {
                Ok(v) => values.push(v),
                Err(RecvTimeoutError::Timeout) => {
                    return Err(RuntimeError::ReceiveTimeout {
                        actor: actor.to_string(),
                        port: self.spec.name.clone(),
                        timeout_ms: timeout.as_millis() as u64,
                        tick,
                    })
                }
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(RuntimeError::Disconnected {
                        actor: actor.to_string(),
                        port: self.spec.name.clone(),
                    })
                }
            }
        }
        accumulate(actor, &self.spec, values)
    }
}

/// Sending end of a port
#[derive(Debug)]
pub struct OutputPort {
    spec: PortSpec,
    senders: Vec<Sender<Value>>,
    last: Option<Value>,
}

impl OutputPort {
    /// Create an unbound output port
    pub fn new(spec: PortSpec) -> Self {
        Self {
            spec,
            senders: Vec::new(),
            last: None,
        }
    }

    /// Bind one more wiring edge
    pub fn bind(&mut self, sender: Sender<Value>) {
        self.senders.push(sender);
    }

    /// Port description
    pub fn spec(&self) -> &PortSpec {
        &self.spec
    }

    /// Number of bound edges
    pub fn fan_out(&self) -> usize {
        self.senders.len()
    }

    /// Value emitted most recently
    pub fn last_emitted(&self) -> Option<&Value> {
        self.last.as_ref()
    }

    /// Reshape `v` to the port shape and deliver it on every edge
    pub fn send(&mut self, actor: &str, v: &Value, timeout: Duration) -> Result<()> {
        let out = value::reshape(v, &self.spec.shape).ok_or_else(|| {
            RuntimeError::shape_mismatch(actor, &self.spec.name, &self.spec.shape, v.shape())
        })?;
        for tx in &self.senders {
            match tx.send_timeout(out.clone(), timeout) {
                Ok(()) => {}
                Err(SendTimeoutError::Timeout(_)) => {
                    return Err(RuntimeError::network_topology(format!(
                        "output {}.{} is backed up; a consumer skipped a tick",
                        actor, self.spec.name
                    )))
                }
                Err(SendTimeoutError::Disconnected(_)) => {
                    return Err(RuntimeError::Disconnected {
                        actor: actor.to_string(),
                        port: self.spec.name.clone(),
                    })
                }
            }
        }
        self.last = Some(out);
        Ok(())
    }
}
