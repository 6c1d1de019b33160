//! Fan-in wiring pass: host connections become wiring edges between actors

use std::collections::BTreeMap;

use lockstep_model::Model;
use lockstep_runtime::{ActorTemplate, WiringEdge};

use crate::error::{CompilerError, Result};

/// Resolve every host connection against the compiled templates.
///
/// Destinations without a matching input port are internal and skipped.
/// Several sources into one destination produce several edges into the same
/// input port; the runtime sums them each tick.
pub fn wire(templates: &BTreeMap<String, ActorTemplate>, model: &Model) -> Result<Vec<WiringEdge>> {
    let mut edges = Vec::new();

    for component in model.components() {
        for conn in component.connections() {
            let dest = &conn.destination;
            let consumer = templates
                .get(&dest.component)
                .ok_or_else(|| CompilerError::unresolved(dest, "destination component was not compiled"))?;
            let Some(input) = consumer.input(&dest.slot) else {
                log::debug!("No input port for '{}', skipping", dest);
                continue;
            };

            for source in &conn.sources {
                let producer = templates
                    .get(&source.component)
                    .ok_or_else(|| CompilerError::unresolved(source, "source component was not compiled"))?;
                let output = producer
                    .output(&source.slot)
                    .ok_or_else(|| CompilerError::unresolved(source, "source has no output port"))?;

                let out_len: usize = output.shape.iter().product();
                let in_len: usize = input.shape.iter().product();
                if out_len != in_len {
                    return Err(CompilerError::ShapeMismatch {
                        actor: dest.component.clone(),
                        slot: dest.slot.clone(),
                        reason: format!(
                            "source {} has shape {:?}, port expects {:?}",
                            source, output.shape, input.shape
                        ),
                    });
                }

                edges.push(WiringEdge::new(
                    &source.component,
                    &source.slot,
                    &dest.component,
                    &dest.slot,
                ));
            }
        }
    }

    log::info!("Wired {} edges", edges.len());
    Ok(edges)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::compile;
    use lockstep_model::{value, Bindings, Component, PureFunction};

    fn relay(name: &str) -> Component {
        let update = PureFunction::new("advance_state", |b: &Bindings<'_>| {
            Ok(vec![b.get("inputs")?.clone()])
        })
        .with_compartments(&["inputs"])
        .with_outputs(&["outputs"]);
        Component::new(name)
            .with_compartment("inputs", value::scalar(0.0))
            .with_compartment("outputs", value::scalar(0.0))
            .with_function(update)
    }

    fn compile_all(model: &Model) -> BTreeMap<String, ActorTemplate> {
        model
            .components()
            .map(|c| (c.name().to_string(), compile(c, false).unwrap()))
            .collect()
    }

    #[test]
    fn test_fan_in_edges() {
        let mut m = Model::new("m");
        m.add(relay("a")).unwrap();
        m.add(relay("b")).unwrap();
        m.add(relay("c")).unwrap();
        m.connect("c/inputs", &["a/outputs", "b/outputs"]).unwrap();

        let edges = wire(&compile_all(&m), &m).unwrap();
        assert_eq!(
            edges,
            vec![
                WiringEdge::new("a", "outputs", "c", "inputs"),
                WiringEdge::new("b", "outputs", "c", "inputs"),
            ]
        );
    }

    #[test]
    fn test_unknown_source_component() {
        let mut m = Model::new("m");
        m.add(relay("a")).unwrap();
        m.connect("a/inputs", &["ghost/outputs"]).unwrap();
        let err = wire(&compile_all(&m), &m).unwrap_err();
        assert!(matches!(err, CompilerError::UnresolvedReference { .. }));
    }

    #[test]
    fn test_source_without_output_port() {
        let mut m = Model::new("m");
        m.add(relay("a")).unwrap();
        m.add(relay("b")).unwrap();
        m.connect("b/inputs", &["a/inputs"]).unwrap();
        let err = wire(&compile_all(&m), &m).unwrap_err();
        assert!(format!("{}", err).contains("no output port"));
    }

    #[test]
    fn test_shape_mismatch_between_ports() {
        let mut m = Model::new("m");
        m.add(relay("a")).unwrap();
        let wide = relay("b").with_compartment("inputs", value::zeros(&[3]));
        m.add(wide).unwrap();
        m.connect("b/inputs", &["a/outputs"]).unwrap();
        let err = wire(&compile_all(&m), &m).unwrap_err();
        assert!(matches!(err, CompilerError::ShapeMismatch { .. }));
    }
}
