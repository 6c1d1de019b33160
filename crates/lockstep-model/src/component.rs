//! Host-side components: parameters, compartments, connections and pure functions

use std::collections::BTreeMap;
use std::fmt::{Debug, Display, Formatter};
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};
use crate::value::{first, Value};

/// Name of the update function every compilable component registers
pub const UPDATE_FUNCTION: &str = "advance_state";

/// Name of the optional reset function
pub const RESET_FUNCTION: &str = "reset";

/// Reference to a slot as `component/slot`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SlotPath {
    /// Owning component
    pub component: String,
    /// Slot on that component
    pub slot: String,
}

impl SlotPath {
    /// Create a path from its two parts
    pub fn new(component: impl Into<String>, slot: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            slot: slot.into(),
        }
    }
}

impl FromStr for SlotPath {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self> {
        match s.split_once('/') {
            Some((component, slot))
                if !component.is_empty() && !slot.is_empty() && !slot.contains('/') =>
            {
                Ok(Self::new(component, slot))
            }
            _ => Err(ModelError::InvalidPath { path: s.to_string() }),
        }
    }
}

impl TryFrom<String> for SlotPath {
    type Error = ModelError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<SlotPath> for String {
    fn from(path: SlotPath) -> Self {
        path.to_string()
    }
}

impl Display for SlotPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.component, self.slot)
    }
}

/// A destination slot driven by an ordered list of source slots
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    /// Driven slot
    pub destination: SlotPath,
    /// Driving slots, summed at the destination
    pub sources: Vec<SlotPath>,
}

/// Named arguments handed to a pure function
#[derive(Debug, Default)]
pub struct Bindings<'a> {
    values: BTreeMap<&'a str, &'a Value>,
}

impl<'a> Bindings<'a> {
    /// Empty argument set
    pub fn new() -> Self {
        Self {
            values: BTreeMap::new(),
        }
    }

    /// Bind `name` to `value`
    pub fn insert(&mut self, name: &'a str, value: &'a Value) {
        self.values.insert(name, value);
    }

    /// Look up an argument
    pub fn get(&self, name: &str) -> Result<&'a Value> {
        self.values
            .get(name)
            .copied()
            .ok_or_else(|| ModelError::MissingBinding { name: name.to_string() })
    }

    /// First element of an argument
    pub fn scalar(&self, name: &str) -> Result<f64> {
        self.get(name).map(first)
    }

    /// Number of bound arguments
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when nothing is bound
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

type FunctionBody = dyn Fn(&Bindings<'_>) -> Result<Vec<Value>> + Send + Sync;

/// A pure computation over a component's parameters and compartments.
///
/// The body receives its declared parameters and compartments by name and
/// returns one value per declared output, in declaration order.
#[derive(Clone)]
pub struct PureFunction {
    name: String,
    parameters: Vec<String>,
    compartments: Vec<String>,
    outputs: Vec<String>,
    body: Arc<FunctionBody>,
}

impl PureFunction {
    /// Create a function with no declared arguments or outputs
    pub fn new<F>(name: impl Into<String>, body: F) -> Self
    where
        F: Fn(&Bindings<'_>) -> Result<Vec<Value>> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            parameters: Vec::new(),
            compartments: Vec::new(),
            outputs: Vec::new(),
            body: Arc::new(body),
        }
    }

    /// Declare the parameters read by the body
    pub fn with_parameters(mut self, names: &[&str]) -> Self {
        self.parameters = names.iter().map(|n| n.to_string()).collect();
        self
    }

    /// Declare the compartments read by the body
    pub fn with_compartments(mut self, names: &[&str]) -> Self {
        self.compartments = names.iter().map(|n| n.to_string()).collect();
        self
    }

    /// Declare the compartments written by the body
    pub fn with_outputs(mut self, names: &[&str]) -> Self {
        self.outputs = names.iter().map(|n| n.to_string()).collect();
        self
    }

    /// Function name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared parameter names
    pub fn parameters(&self) -> &[String] {
        &self.parameters
    }

    /// Declared compartment names
    pub fn compartments(&self) -> &[String] {
        &self.compartments
    }

    /// Declared output names
    pub fn outputs(&self) -> &[String] {
        &self.outputs
    }

    /// Invoke the body and check the output arity
    pub fn call(&self, bindings: &Bindings<'_>) -> Result<Vec<Value>> {
        let values = (self.body)(bindings)?;
        if values.len() != self.outputs.len() {
            return Err(ModelError::OutputArity {
                function: self.name.clone(),
                expected: self.outputs.len(),
                actual: values.len(),
            });
        }
        Ok(values)
    }
}

impl Debug for PureFunction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PureFunction")
            .field("name", &self.name)
            .field("parameters", &self.parameters)
            .field("compartments", &self.compartments)
            .field("outputs", &self.outputs)
            .finish()
    }
}

/// A stateful host component
#[derive(Debug, Clone)]
pub struct Component {
    name: String,
    parameters: BTreeMap<String, Value>,
    compartments: BTreeMap<String, Option<Value>>,
    defaults: BTreeMap<String, Value>,
    connections: Vec<Connection>,
    functions: BTreeMap<String, PureFunction>,
}

impl Component {
    /// Create an empty component
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameters: BTreeMap::new(),
            compartments: BTreeMap::new(),
            defaults: BTreeMap::new(),
            connections: Vec::new(),
            functions: BTreeMap::new(),
        }
    }

    /// Add a parameter
    pub fn with_parameter(mut self, name: impl Into<String>, value: Value) -> Self {
        self.parameters.insert(name.into(), value);
        self
    }

    /// Add a compartment holding `value`
    pub fn with_compartment(mut self, name: impl Into<String>, value: Value) -> Self {
        self.compartments.insert(name.into(), Some(value));
        self
    }

    /// Add a compartment with no value yet
    pub fn with_slot(mut self, name: impl Into<String>) -> Self {
        self.compartments.insert(name.into(), None);
        self
    }

    /// Record a constructor default used when a slot holds no value
    pub fn with_default(mut self, name: impl Into<String>, value: Value) -> Self {
        self.defaults.insert(name.into(), value);
        self
    }

    /// Register a pure function under its own name
    pub fn with_function(mut self, function: PureFunction) -> Self {
        self.functions.insert(function.name().to_string(), function);
        self
    }

    /// Component name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Parameter value
    pub fn parameter(&self, name: &str) -> Option<&Value> {
        self.parameters.get(name)
    }

    /// All parameters
    pub fn parameters(&self) -> &BTreeMap<String, Value> {
        &self.parameters
    }

    /// True if `name` is a compartment of this component
    pub fn is_compartment(&self, name: &str) -> bool {
        self.compartments.contains_key(name)
    }

    /// Current compartment value, `None` for unknown or unset slots
    pub fn compartment(&self, name: &str) -> Option<&Value> {
        self.compartments.get(name).and_then(|v| v.as_ref())
    }

    /// All compartments
    pub fn compartments(&self) -> &BTreeMap<String, Option<Value>> {
        &self.compartments
    }

    /// Constructor default for `name`
    pub fn default_value(&self, name: &str) -> Option<&Value> {
        self.defaults.get(name)
    }

    /// Outgoing connection list (edges whose destination lives on this component)
    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    /// Registered function
    pub fn function(&self, name: &str) -> Option<&PureFunction> {
        self.functions.get(name)
    }

    /// Overwrite a parameter
    pub fn set_parameter(&mut self, name: &str, value: Value) -> Result<()> {
        match self.parameters.get_mut(name) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(ModelError::unknown_slot(&self.name, name)),
        }
    }

    /// Overwrite a compartment
    pub fn set_compartment(&mut self, name: &str, value: Value) -> Result<()> {
        match self.compartments.get_mut(name) {
            Some(slot) => {
                *slot = Some(value);
                Ok(())
            }
            None => Err(ModelError::unknown_slot(&self.name, name)),
        }
    }

    /// Drive compartment `slot` of this component from the given source paths
    pub fn connect(&mut self, slot: &str, sources: &[&str]) -> Result<()> {
        if !self.is_compartment(slot) {
            return Err(ModelError::unknown_slot(&self.name, slot));
        }
        let sources = sources
            .iter()
            .map(|s| s.parse())
            .collect::<Result<Vec<SlotPath>>>()?;
        self.connections.push(Connection {
            destination: SlotPath::new(&self.name, slot),
            sources,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::scalar;

    #[test]
    fn test_slot_path_parse() {
        let p: SlotPath = "z0/j".parse().unwrap();
        assert_eq!(p, SlotPath::new("z0", "j"));
        assert_eq!(p.to_string(), "z0/j");

        assert!("z0".parse::<SlotPath>().is_err());
        assert!("/j".parse::<SlotPath>().is_err());
        assert!("a/b/c".parse::<SlotPath>().is_err());
    }

    #[test]
    fn test_function_arity_checked() {
        let f = PureFunction::new("advance_state", |_b: &Bindings<'_>| Ok(vec![]))
            .with_outputs(&["v"]);
        let err = f.call(&Bindings::new()).unwrap_err();
        assert!(matches!(err, ModelError::OutputArity { expected: 1, actual: 0, .. }));
    }

    #[test]
    fn test_bindings_lookup() {
        let k = scalar(0.5);
        let mut b = Bindings::new();
        b.insert("k", &k);
        assert_eq!(b.scalar("k").unwrap(), 0.5);
        assert!(matches!(b.get("v"), Err(ModelError::MissingBinding { .. })));
    }

    #[test]
    fn test_connect_requires_compartment() {
        let mut c = Component::new("w").with_compartment("inputs", scalar(0.0));
        c.connect("inputs", &["z0/s"]).unwrap();
        assert_eq!(c.connections().len(), 1);
        assert_eq!(c.connections()[0].destination.to_string(), "w/inputs");

        assert!(c.connect("missing", &["z0/s"]).is_err());
        assert!(c.connect("inputs", &["bad-path"]).is_err());
    }

    #[test]
    fn test_unset_slot() {
        let c = Component::new("z").with_slot("s");
        assert!(c.is_compartment("s"));
        assert!(c.compartment("s").is_none());
    }
}
