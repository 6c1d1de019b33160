//! JSON topology persistence.
//!
//! The saved file mirrors the model's components with one extra `lagging`
//! flag per component entry. Loading applies stored values and returns the
//! lag table; connections and functions stay owned by the code that builds the
//! model.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::component::Connection;
use crate::error::{ModelError, Result};
use crate::model::Model;
use crate::value::ValueRecord;

/// Persisted form of one component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentRecord {
    /// Component name
    pub name: String,
    /// Whether the component's actor emits one tick late
    #[serde(default)]
    pub lagging: bool,
    /// Parameter values
    #[serde(default)]
    pub parameters: BTreeMap<String, ValueRecord>,
    /// Compartment values (`null` for unset slots)
    #[serde(default)]
    pub compartments: BTreeMap<String, Option<ValueRecord>>,
    /// Connection list
    #[serde(default)]
    pub connections: Vec<Connection>,
}

/// Persisted form of a model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topology {
    /// Model name
    pub name: String,
    /// Component entries
    pub components: Vec<ComponentRecord>,
}

impl Topology {
    /// Snapshot a model, asking `lagging` for each component's lag flag
    pub fn capture(model: &Model, lagging: impl Fn(&str) -> bool) -> Self {
        let components = model
            .components()
            .map(|c| ComponentRecord {
                name: c.name().to_string(),
                lagging: lagging(c.name()),
                parameters: c
                    .parameters()
                    .iter()
                    .map(|(k, v)| (k.clone(), ValueRecord::from(v)))
                    .collect(),
                compartments: c
                    .compartments()
                    .iter()
                    .map(|(k, v)| (k.clone(), v.as_ref().map(ValueRecord::from)))
                    .collect(),
                connections: c.connections().to_vec(),
            })
            .collect();
        Self {
            name: model.name().to_string(),
            components,
        }
    }

    /// Write as pretty JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        log::debug!("Saved topology '{}' to {}", self.name, path.display());
        Ok(())
    }

    /// Read a topology file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Write stored parameter and compartment values into `model`.
    /// Every entry must name a registered component and its existing slots.
    pub fn apply(&self, model: &mut Model) -> Result<()> {
        for record in &self.components {
            let component = model.component_mut(&record.name)?;
            for (name, value) in &record.parameters {
                component.set_parameter(name, value.to_value()?)?;
            }
            for (name, value) in &record.compartments {
                match value {
                    Some(value) => component.set_compartment(name, value.to_value()?)?,
                    None if component.is_compartment(name) => {}
                    None => return Err(ModelError::unknown_slot(&record.name, name)),
                }
            }
        }
        Ok(())
    }

    /// Per-component lag flags
    pub fn lag_table(&self) -> BTreeMap<String, bool> {
        self.components
            .iter()
            .map(|c| (c.name.clone(), c.lagging))
            .collect()
    }
}
