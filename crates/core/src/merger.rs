//! Merging of metadata contributed by the units a unit depends on.

use jaxscope_api::{DeploymentMetadata, MetadataLookup};
use serde::Serialize;
use std::collections::HashSet;
use tracing::debug;

/// Outcome of one merge pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MergeReport {
    /// Dependencies that contributed, in merge order.
    pub merged: Vec<String>,
    /// Dependencies with no published metadata.
    pub missing: Vec<String>,
    /// Class names dropped to keep the classified sets disjoint.
    pub dropped: Vec<String>,
}

pub struct MetadataMerger<'a> {
    lookup: &'a dyn MetadataLookup,
}

impl<'a> MetadataMerger<'a> {
    pub fn new(lookup: &'a dyn MetadataLookup) -> Self {
        Self { lookup }
    }

    /// Unions the metadata of every dependency into `target`.
    ///
    /// Each dependency contributes at most once however often it is listed,
    /// which also bounds the walk when the dependency list loops back.
    pub fn merge(
        &self,
        unit_id: &str,
        target: &mut DeploymentMetadata,
        dependencies: &[String],
    ) -> MergeReport {
        let mut report = MergeReport::default();
        let mut seen: HashSet<&str> = HashSet::from([unit_id]);

        for dependency in dependencies {
            if !seen.insert(dependency.as_str()) {
                continue;
            }
            match self.lookup.lookup(dependency) {
                Some(contribution) => {
                    absorb(target, &contribution);
                    report.merged.push(dependency.clone());
                }
                None => report.missing.push(dependency.clone()),
            }
        }

        report.dropped = target.enforce_exclusivity();
        debug!(
            "unit {} merged {} dependencies ({} without metadata)",
            unit_id,
            report.merged.len(),
            report.missing.len()
        );
        report
    }
}

/// Set union of the classified classes; flags are left to the owning unit.
///
/// When two contributions disagree on an application's path, the smallest
/// path is kept.
pub fn absorb(target: &mut DeploymentMetadata, contribution: &DeploymentMetadata) {
    for (name, app) in &contribution.application_classes {
        let entry = target
            .application_classes
            .entry(name.clone())
            .or_insert_with(|| app.clone());
        entry.application_path = match (entry.application_path.take(), &app.application_path) {
            (Some(ours), Some(theirs)) => Some(ours.min(theirs.clone())),
            (ours, theirs) => ours.or_else(|| theirs.clone()),
        };
    }
    target
        .provider_classes
        .extend(contribution.provider_classes.iter().cloned());
    target
        .resource_classes
        .extend(contribution.resource_classes.iter().cloned());
    target
        .jndi_component_resources
        .extend(contribution.jndi_component_resources.iter().cloned());
}
