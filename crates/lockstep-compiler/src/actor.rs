//! Actor compiler: one component in, one actor template out

use lockstep_model::{Component, RESET_FUNCTION, UPDATE_FUNCTION};
use lockstep_runtime::{ActorTemplate, RuntimeError};

use crate::error::{CompilerError, Result};
use crate::extract::extract;

/// Compile `component` into an unwired actor template.
///
/// The update function is mandatory; a missing or malformed reset function
/// only means the actor has no reset behaviour.
pub fn compile(component: &Component, lag: bool) -> Result<ActorTemplate> {
    let update = extract(component, UPDATE_FUNCTION)?;
    let reset = match extract(component, RESET_FUNCTION) {
        Ok(reset) => Some(reset),
        Err(e) => {
            log::debug!("No reset for '{}': {}", component.name(), e);
            None
        }
    };

    let mut template = ActorTemplate::new(component.name(), update.function.clone(), lag);
    for (name, value) in &update.values {
        template.add_state(name, value.clone());
    }
    if let Some(reset) = &reset {
        for (name, value) in &reset.values {
            template.add_state(name, value.clone());
        }
        template.set_reset(reset.function.clone());
    }

    for conn in component.connections() {
        let dest = &conn.destination;
        if dest.component != component.name() {
            log::debug!(
                "Connection into '{}' stored on '{}'; left to its owner",
                dest,
                component.name()
            );
            continue;
        }
        if !update.contains(&dest.slot) {
            log::debug!("Skipping internal destination '{}'", dest);
            continue;
        }
        template.add_input(&dest.slot).map_err(|e| match e {
            RuntimeError::UnknownStateVariable { .. } => CompilerError::ShapeMismatch {
                actor: component.name().to_string(),
                slot: dest.slot.clone(),
                reason: "destination shape cannot be resolved".into(),
            },
            other => CompilerError::Runtime(other),
        })?;
    }

    for name in &update.outputs {
        template.add_output(name)?;
    }

    log::debug!(
        "Compiled '{}': {} state variables, {} inputs, {} outputs{}",
        component.name(),
        template.state_count(),
        template.inputs().count(),
        template.outputs().count(),
        if lag { ", lagged" } else { "" }
    );
    Ok(template)
}
