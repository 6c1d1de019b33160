//! Whole-model compilation: extraction, wiring, verification and lowering.

use lockstep_compiler::{compile_model, CompilerError};
use lockstep_model::{value, Bindings, Component, Model, PureFunction};
use lockstep_runtime::RuntimeConfig;

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// `v' = v * k`
fn scaler(name: &str, v: f64, k: f64) -> Component {
    let update = PureFunction::new("advance_state", |b: &Bindings<'_>| {
        Ok(vec![b.get("v")? * b.scalar("k")?])
    })
    .with_parameters(&["k"])
    .with_compartments(&["v"])
    .with_outputs(&["v"]);
    Component::new(name)
        .with_parameter("k", value::scalar(k))
        .with_compartment("v", value::scalar(v))
        .with_function(update)
}

/// `outputs' = inputs * w`
fn weight(name: &str, w: f64) -> Component {
    let update = PureFunction::new("advance_state", |b: &Bindings<'_>| {
        Ok(vec![b.get("inputs")? * b.scalar("w")?])
    })
    .with_parameters(&["w"])
    .with_compartments(&["inputs"])
    .with_outputs(&["outputs"]);
    Component::new(name)
        .with_parameter("w", value::scalar(w))
        .with_compartment("inputs", value::scalar(0.0))
        .with_compartment("outputs", value::scalar(0.0))
        .with_function(update)
}

#[test]
fn no_connection_round_trip() {
    init();
    let mut model = Model::new("solo");
    model.add(scaler("z", 2.0, 0.5)).unwrap();

    let net = compile_model(&model, |_| false).unwrap();
    assert_eq!(net.actor_count(), 1);
    assert!(net.edges().is_empty());

    let t = net.template("z").unwrap();
    assert_eq!(t.inputs().count(), 0);
    assert!(t.output("v").is_some());

    let mut rt = net.into_runtime(RuntimeConfig::default()).unwrap();
    rt.run(1).unwrap();
    let z = rt.actor("z").unwrap();
    assert_eq!(value::first(z.last_emitted("v").unwrap()), 1.0);
    assert_eq!(value::first(z.state("v").unwrap()), 1.0);
}

#[test]
fn chain_propagates_within_one_tick() {
    init();
    let mut model = Model::new("chain");
    model.add(scaler("z0", 2.0, 1.0)).unwrap();
    model.add(weight("w", 3.0)).unwrap();
    model.connect("w/inputs", &["z0/v"]).unwrap();

    let net = compile_model(&model, |_| false).unwrap();
    assert_eq!(net.edges().len(), 1);

    let mut rt = net.into_runtime(RuntimeConfig::default()).unwrap();
    rt.run(1).unwrap();
    assert_eq!(value::first(rt.actor("w").unwrap().state("outputs").unwrap()), 6.0);
}

#[test]
fn unresolved_source_aborts_compile() {
    let mut model = Model::new("broken");
    model.add(weight("w", 1.0)).unwrap();
    model.connect("w/inputs", &["nowhere/v"]).unwrap();

    let err = compile_model(&model, |_| false).unwrap_err();
    assert!(matches!(err, CompilerError::UnresolvedReference { .. }));
}

#[test]
fn cycle_needs_a_lagged_actor() {
    init();
    let mut model = Model::new("loop");
    model.add(weight("a", 1.0)).unwrap();
    model.add(weight("b", 1.0)).unwrap();
    model.connect("a/inputs", &["b/outputs"]).unwrap();
    model.connect("b/inputs", &["a/outputs"]).unwrap();

    match compile_model(&model, |_| false) {
        Err(CompilerError::CyclicWiring { actors }) => assert_eq!(actors.len(), 2),
        other => panic!("expected CyclicWiring, got {:?}", other.map(|n| n.actor_count())),
    }

    let net = compile_model(&model, |name| name == "b").unwrap();
    assert!(net.template("b").unwrap().is_lagged());
    let mut rt = net.into_runtime(RuntimeConfig::default()).unwrap();
    rt.run(3).unwrap();
    assert_eq!(rt.tick(), 3);
}

#[test]
fn missing_update_function_is_an_extraction_error() {
    let mut model = Model::new("empty");
    model.add(Component::new("bare").with_compartment("x", value::scalar(0.0))).unwrap();
    let err = compile_model(&model, |_| false).unwrap_err();
    assert!(matches!(err, CompilerError::Extraction { .. }));
}
