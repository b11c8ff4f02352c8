use super::class::DotName;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Effective scan switches for one build unit.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default, JsonSchema)]
pub struct ScanPolicy {
    pub scan_all: bool,
    pub scan_providers: bool,
    pub scan_resources: bool,
    pub has_boot_classes: bool,
}

impl ScanPolicy {
    /// Library units carry no descriptor and always scan everything.
    pub fn scan_everything() -> Self {
        Self {
            scan_all: true,
            scan_providers: true,
            scan_resources: true,
            has_boot_classes: false,
        }
    }

    pub fn should_scan(&self) -> bool {
        !self.has_boot_classes && (self.scan_all || self.scan_providers || self.scan_resources)
    }

    pub fn scans_resources(&self) -> bool {
        !self.has_boot_classes && self.scan_resources
    }

    pub fn scans_providers(&self) -> bool {
        !self.has_boot_classes && self.scan_providers
    }
}

/// A scanned `Application` subclass.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, JsonSchema)]
pub struct ApplicationClass {
    pub name: DotName,
    /// Value of the class's application-path annotation, when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application_path: Option<String>,
}

impl ApplicationClass {
    pub fn is_annotated(&self) -> bool {
        self.application_path.is_some()
    }
}

/// Accumulated REST metadata for one build unit.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq, JsonSchema)]
pub struct DeploymentMetadata {
    pub policy: ScanPolicy,
    pub application_classes: BTreeMap<DotName, ApplicationClass>,
    pub provider_classes: BTreeSet<DotName>,
    pub resource_classes: BTreeSet<DotName>,
    pub jndi_component_resources: BTreeSet<DotName>,
    pub has_boot_classes: bool,
    pub dispatcher_created: bool,
    pub ignore_application_path: bool,
    pub unwrapped_exceptions_set: bool,
}

impl DeploymentMetadata {
    pub fn with_policy(policy: ScanPolicy) -> Self {
        Self {
            policy,
            has_boot_classes: policy.has_boot_classes,
            ..Default::default()
        }
    }

    pub fn add_application(&mut self, class: ApplicationClass) {
        self.application_classes.insert(class.name.clone(), class);
    }

    pub fn is_empty(&self) -> bool {
        self.application_classes.is_empty()
            && self.provider_classes.is_empty()
            && self.resource_classes.is_empty()
            && self.jndi_component_resources.is_empty()
    }

    /// Re-establishes mutual exclusivity of the classified sets.
    ///
    /// Application classes win over everything, resources win over providers.
    /// Returns the names that were dropped from the provider or resource sets.
    pub fn enforce_exclusivity(&mut self) -> Vec<DotName> {
        let mut dropped = Vec::new();
        let apps = &self.application_classes;
        self.resource_classes.retain(|name| {
            let keep = !apps.contains_key(name);
            if !keep {
                dropped.push(name.clone());
            }
            keep
        });
        let resources = &self.resource_classes;
        self.provider_classes.retain(|name| {
            let keep = !apps.contains_key(name) && !resources.contains(name);
            if !keep {
                dropped.push(name.clone());
            }
            keep
        });
        dropped
    }
}

/// Read access to metadata published by sibling build units.
pub trait MetadataLookup: Send + Sync {
    fn lookup(&self, unit_id: &str) -> Option<Arc<DeploymentMetadata>>;
}
