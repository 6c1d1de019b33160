//! Component registry with a textual dump

use std::collections::BTreeMap;

use crate::component::{Component, SlotPath};
use crate::error::{ModelError, Result};
use crate::value::Value;

/// A named registry of host components
#[derive(Debug, Clone, Default)]
pub struct Model {
    name: String,
    components: BTreeMap<String, Component>,
}

impl Model {
    /// Create an empty model
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            components: BTreeMap::new(),
        }
    }

    /// Model name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Register a component
    pub fn add(&mut self, component: Component) -> Result<()> {
        if self.components.contains_key(component.name()) {
            return Err(ModelError::DuplicateComponent {
                name: component.name().to_string(),
            });
        }
        self.components.insert(component.name().to_string(), component);
        Ok(())
    }

    /// Look up a component
    pub fn component(&self, name: &str) -> Option<&Component> {
        self.components.get(name)
    }

    /// Look up a component for mutation
    pub fn component_mut(&mut self, name: &str) -> Result<&mut Component> {
        self.components
            .get_mut(name)
            .ok_or_else(|| ModelError::UnknownComponent { name: name.to_string() })
    }

    /// Iterate over components in name order
    pub fn components(&self) -> impl Iterator<Item = &Component> {
        self.components.values()
    }

    /// Number of registered components
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// True when no component is registered
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Connect `destination` (a `component/slot` path) from `sources`.
    /// The connection is stored on the destination component.
    pub fn connect(&mut self, destination: &str, sources: &[&str]) -> Result<()> {
        let dest: SlotPath = destination.parse()?;
        self.component_mut(&dest.component)?.connect(&dest.slot, sources)
    }

    /// Overwrite a compartment through its path
    pub fn set_compartment(&mut self, path: &str, value: Value) -> Result<()> {
        let path: SlotPath = path.parse()?;
        self.component_mut(&path.component)?.set_compartment(&path.slot, value)
    }

    /// Read a compartment through its path
    pub fn compartment(&self, path: &str) -> Result<&Value> {
        let path: SlotPath = path.parse()?;
        let component = self
            .component(&path.component)
            .ok_or_else(|| ModelError::UnknownComponent { name: path.component.clone() })?;
        component
            .compartment(&path.slot)
            .ok_or_else(|| ModelError::unknown_slot(&path.component, &path.slot))
    }

    /// Print a readable outline of the model
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("model {} {{\n", self.name));
        for component in self.components.values() {
            Self::print_component(&mut out, component);
        }
        out.push_str("}\n");
        out
    }

    fn print_component(out: &mut String, component: &Component) {
        out.push_str(&format!("  component {} {{\n", component.name()));
        for (name, value) in component.parameters() {
            out.push_str(&format!("    param {} : {:?}\n", name, value.shape()));
        }
        for (name, value) in component.compartments() {
            match value {
                Some(v) => out.push_str(&format!("    slot {} : {:?}\n", name, v.shape())),
                None => out.push_str(&format!("    slot {} : unset\n", name)),
            }
        }
        for conn in component.connections() {
            let sources: Vec<String> = conn.sources.iter().map(|s| s.to_string()).collect();
            out.push_str(&format!("    {} << {}\n", conn.destination, sources.join(" + ")));
        }
        out.push_str("  }\n");
    }
}
