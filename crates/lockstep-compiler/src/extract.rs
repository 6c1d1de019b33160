//! Value extraction: resolve a component's pure function and snapshot the
//! values it touches.

use lockstep_model::{value, Component, PureFunction, Value};

use crate::error::{CompilerError, Result};

/// What one pure function of a component reads and writes
#[derive(Debug, Clone)]
pub struct Extraction {
    /// The resolved function
    pub function: PureFunction,
    /// Parameter names it reads
    pub parameters: Vec<String>,
    /// Compartment names it reads
    pub compartments: Vec<String>,
    /// Compartment names it writes
    pub outputs: Vec<String>,
    /// Parameters, compartments and outputs with their current values, first
    /// occurrence first
    pub values: Vec<(String, Value)>,
}

impl Extraction {
    /// True if `name` is part of the extracted value set
    pub fn contains(&self, name: &str) -> bool {
        self.values.iter().any(|(n, _)| n == name)
    }

    /// Snapshot of `name`
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.values.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }
}

/// Resolve `function_name` on `component`.
///
/// Every declared parameter must be a parameter (or constructor default) of
/// the component and every declared compartment or output must be a
/// compartment (or default).
pub fn extract(component: &Component, function_name: &str) -> Result<Extraction> {
    let function = component.function(function_name).ok_or_else(|| {
        CompilerError::extraction(component.name(), function_name, "function not registered")
    })?;

    for name in function.parameters() {
        if component.parameter(name).is_none() && component.default_value(name).is_none() {
            return Err(CompilerError::extraction(
                component.name(),
                function_name,
                format!("unknown parameter '{}'", name),
            ));
        }
    }
    for name in function.compartments().iter().chain(function.outputs()) {
        if !component.is_compartment(name) && component.default_value(name).is_none() {
            return Err(CompilerError::extraction(
                component.name(),
                function_name,
                format!("unknown compartment '{}'", name),
            ));
        }
    }

    let mut values: Vec<(String, Value)> = Vec::new();
    for name in function
        .parameters()
        .iter()
        .chain(function.compartments())
        .chain(function.outputs())
    {
        if values.iter().any(|(n, _)| n == name) {
            continue;
        }
        values.push((name.clone(), snapshot(component, name)));
    }

    Ok(Extraction {
        function: function.clone(),
        parameters: function.parameters().to_vec(),
        compartments: function.compartments().to_vec(),
        outputs: function.outputs().to_vec(),
        values,
    })
}

/// Current value of `name`: parameter, then compartment, then constructor
/// default, then a scalar zero
pub fn snapshot(component: &Component, name: &str) -> Value {
    let found = component
        .parameter(name)
        .or_else(|| component.compartment(name))
        .or_else(|| component.default_value(name))
        .cloned();
    match found {
        Some(v) => value::normalize(v),
        None => value::scalar(0.0),
    }
}
