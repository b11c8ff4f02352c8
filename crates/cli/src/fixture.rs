//! JSON description of a deployment: its units, their indexed classes and
//! web descriptors.

use jaxscope_api::{ClassInfo, WebDescriptor};
use jaxscope_core::{BuildUnit, InMemoryIndex, IndexClassResolver, PipelineConfig};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, JsonSchema)]
pub struct DeploymentFixture {
    /// Name of the top-level deployment.
    pub deployment: String,
    #[serde(default)]
    pub units: Vec<UnitFixture>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, JsonSchema)]
pub struct UnitFixture {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(default)]
    pub dependencies: Vec<String>,
    /// Classes in this unit's annotation index.
    #[serde(default)]
    pub classes: Vec<ClassInfo>,
    /// Additional class names loadable from this unit, e.g. from its
    /// dependencies or the container.
    #[serde(default)]
    pub visible: Vec<String>,
    /// Present for web units.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub descriptor: Option<WebDescriptor>,
}

impl DeploymentFixture {
    pub fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        let fixture: Self = serde_json::from_str(&content)
            .map_err(|e| format!("invalid fixture {}: {}", path.display(), e))?;
        Ok(fixture)
    }

    /// Builds the units. Dispatcher and boot classes are always loadable.
    pub fn into_units(self, config: &PipelineConfig) -> Vec<BuildUnit> {
        self.units
            .into_iter()
            .map(|unit| unit.into_unit(config))
            .collect()
    }
}

impl UnitFixture {
    fn into_unit(self, config: &PipelineConfig) -> BuildUnit {
        let index = InMemoryIndex::new(self.classes);
        let visible = self
            .visible
            .into_iter()
            .chain(std::iter::once(config.dispatcher.servlet_class.clone()))
            .chain(config.boot_classes.iter().cloned());
        let resolver = IndexClassResolver::new(&index, visible);

        let mut unit = BuildUnit::new(self.id, Arc::new(index), Arc::new(resolver))
            .with_dependencies(self.dependencies);
        if let Some(parent) = self.parent {
            unit = unit.with_parent(parent);
        }
        if let Some(descriptor) = self.descriptor {
            unit = unit.with_descriptor(descriptor);
        }
        unit
    }
}
