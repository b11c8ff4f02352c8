//! Three-phase deployment of a set of build units: scan, merge, synthesize.

use crate::classifier::{ClassClassifier, ScanInput};
use crate::config::PipelineConfig;
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::index::ClassHierarchy;
use crate::merger::{MergeReport, MetadataMerger};
use crate::policy;
use crate::prescan::WebPrescanner;
use crate::session::DeploymentSession;
use crate::synthesizer::{ServletSynthesizer, SynthesisOutcome};
use crate::unit::{BuildUnit, UnitPhase};
use jaxscope_api::{
    AnnotationIndex, DeploymentError, DeploymentMetadata, Result, ScanPolicy, WebDescriptor,
};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// What the pipeline produced for one unit.
#[derive(Debug, Clone, Serialize)]
pub struct UnitReport {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    pub phase: UnitPhase,
    pub metadata: DeploymentMetadata,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merge: Option<MergeReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub synthesis: Option<SynthesisOutcome>,
    /// The descriptor after synthesis, for web units.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub descriptor: Option<WebDescriptor>,
    pub diagnostics: Diagnostics,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeploymentReport {
    pub deployment: String,
    /// In the order the units were submitted.
    pub units: Vec<UnitReport>,
}

impl DeploymentReport {
    pub fn unit(&self, id: &str) -> Option<&UnitReport> {
        self.units.iter().find(|u| u.id == id)
    }

    pub fn diagnostic_count(&self) -> usize {
        self.units.iter().map(|u| u.diagnostics.len()).sum()
    }
}

struct UnitState {
    unit: BuildUnit,
    phase: UnitPhase,
    metadata: DeploymentMetadata,
    merge: Option<MergeReport>,
    synthesis: Option<SynthesisOutcome>,
    diagnostics: Diagnostics,
}

impl UnitState {
    fn new(unit: BuildUnit) -> Self {
        Self {
            unit,
            phase: UnitPhase::NotStarted,
            metadata: DeploymentMetadata::default(),
            merge: None,
            synthesis: None,
            diagnostics: Diagnostics::new(),
        }
    }

    fn into_report(self) -> UnitReport {
        UnitReport {
            id: self.unit.id,
            parent: self.unit.parent,
            phase: self.phase,
            metadata: self.metadata,
            merge: self.merge,
            synthesis: self.synthesis,
            descriptor: self.unit.descriptor,
            diagnostics: self.diagnostics,
        }
    }
}

pub struct DeploymentPipeline {
    config: PipelineConfig,
}

impl DeploymentPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Deploys `units` within a fresh session named `deployment`.
    pub fn deploy(&self, deployment: &str, units: Vec<BuildUnit>) -> Result<DeploymentReport> {
        let session = DeploymentSession::new(deployment);
        self.deploy_in(&session, units)
    }

    /// Runs only the scan phase: every unit is classified and published, but
    /// nothing is merged and no descriptor is synthesized.
    pub fn classify(&self, deployment: &str, units: Vec<BuildUnit>) -> Result<DeploymentReport> {
        let session = DeploymentSession::new(deployment);
        self.run_in(&session, units, UnitPhase::Classified)
    }

    /// Deploys `units` within `session`.
    ///
    /// Every unit is scanned and published before any unit merges, so merge
    /// results do not depend on unit order. The session is completed on
    /// success and rolled back on the first fatal error.
    pub fn deploy_in(
        &self,
        session: &DeploymentSession,
        units: Vec<BuildUnit>,
    ) -> Result<DeploymentReport> {
        self.run_in(session, units, UnitPhase::Synthesized)
    }

    fn run_in(
        &self,
        session: &DeploymentSession,
        units: Vec<BuildUnit>,
        last: UnitPhase,
    ) -> Result<DeploymentReport> {
        if session.is_closed() {
            return Err(DeploymentError::IllegalState(format!(
                "session {} is already closed",
                session.name()
            )));
        }
        info!(
            "deploying {} with {} units (parallel: {})",
            session.name(),
            units.len(),
            self.config.parallel
        );

        match self.run_phases(session, units, last) {
            Ok(units) => {
                session.complete();
                Ok(DeploymentReport {
                    deployment: session.name().to_string(),
                    units: units.into_iter().map(UnitState::into_report).collect(),
                })
            }
            Err(err) => {
                warn!("deployment {} failed: {}", session.name(), err);
                session.rollback();
                Err(err)
            }
        }
    }

    fn run_phases(
        &self,
        session: &DeploymentSession,
        units: Vec<BuildUnit>,
        last: UnitPhase,
    ) -> Result<Vec<UnitState>> {
        let mut ids = HashSet::new();
        for unit in &units {
            if !ids.insert(unit.id.as_str()) {
                return Err(DeploymentError::IllegalState(format!(
                    "unit {} submitted twice",
                    unit.id
                )));
            }
        }

        let mut states: Vec<UnitState> = units.into_iter().map(UnitState::new).collect();
        let indexes: HashMap<String, Arc<dyn AnnotationIndex>> = states
            .iter()
            .map(|s| (s.unit.id.clone(), Arc::clone(&s.unit.index)))
            .collect();

        self.for_each_unit(&mut states, |state| self.scan(state, session, &indexes))?;
        if last >= UnitPhase::Merged {
            self.for_each_unit(&mut states, |state| self.merge(state, session))?;
        }
        if last >= UnitPhase::Synthesized {
            self.for_each_unit(&mut states, |state| self.synthesize(state))?;
        }
        Ok(states)
    }

    /// Runs `step` over every unit; the reported error is the one of the
    /// earliest failing unit in submission order.
    fn for_each_unit<F>(&self, states: &mut [UnitState], step: F) -> Result<()>
    where
        F: Fn(&mut UnitState) -> Result<()> + Send + Sync,
    {
        let run = |state: &mut UnitState| step(state).map_err(|e| e.in_unit(&state.unit.id));
        let results: Vec<Result<()>> = if self.config.parallel {
            states.par_iter_mut().map(run).collect()
        } else {
            states.iter_mut().map(run).collect()
        };
        results.into_iter().collect()
    }

    fn scan(
        &self,
        state: &mut UnitState,
        session: &DeploymentSession,
        indexes: &HashMap<String, Arc<dyn AnnotationIndex>>,
    ) -> Result<()> {
        state.phase.require(UnitPhase::NotStarted)?;
        let unit = &mut state.unit;

        let mut metadata = match unit.descriptor.as_mut() {
            Some(web) => {
                // Declared servlets may name classes from dependency units.
                let hierarchy = ClassHierarchy::new(
                    std::iter::once(unit.index.as_ref())
                        .chain(
                            unit.dependencies
                                .iter()
                                .filter_map(|id| indexes.get(id))
                                .map(|index| index.as_ref()),
                        )
                        .collect(),
                );
                let scan = WebPrescanner::new(&self.config).prescan(
                    web,
                    &hierarchy,
                    unit.resolver.as_ref(),
                )?;
                let policy = policy::resolve_for_descriptor(web, scan.has_boot_classes)?;
                let mut metadata = DeploymentMetadata::with_policy(policy);
                metadata.dispatcher_created = scan.dispatcher_created();
                metadata.unwrapped_exceptions_set = scan.unwrapped_exceptions_set;
                metadata
            }
            None => DeploymentMetadata::with_policy(ScanPolicy::scan_everything()),
        };

        let input = ScanInput {
            index: unit.index.as_ref(),
            resolver: unit.resolver.as_ref(),
            descriptor: unit.descriptor.as_ref(),
        };
        ClassClassifier::new(&self.config).classify(input, &mut metadata, &mut state.diagnostics)?;

        debug!(
            "unit {} classified {} applications, {} resources, {} providers",
            unit.id,
            metadata.application_classes.len(),
            metadata.resource_classes.len(),
            metadata.provider_classes.len()
        );
        if !session.publish(&unit.id, metadata.clone()) {
            return Err(DeploymentError::IllegalState(format!(
                "metadata for unit {} could not be published",
                unit.id
            )));
        }
        state.metadata = metadata;
        state.phase.advance(UnitPhase::Classified)
    }

    fn merge(&self, state: &mut UnitState, session: &DeploymentSession) -> Result<()> {
        state.phase.require(UnitPhase::Classified)?;
        if state.unit.parent.is_some() {
            let report = MetadataMerger::new(session).merge(
                &state.unit.id,
                &mut state.metadata,
                &state.unit.dependencies,
            );
            for name in &report.dropped {
                state.diagnostics.record(
                    DiagnosticKind::ClassificationOverlap,
                    name.clone(),
                    "dropped after merging dependency metadata",
                );
            }
            state.merge = Some(report);
        }
        if state.unit.is_web() {
            log_integration(&state.unit.id, &state.metadata);
        }
        state.phase.advance(UnitPhase::Merged)
    }

    fn synthesize(&self, state: &mut UnitState) -> Result<()> {
        state.phase.require(UnitPhase::Merged)?;
        if let Some(web) = state.unit.descriptor.as_mut() {
            let outcome = ServletSynthesizer::new(&self.config).synthesize(
                &mut state.metadata,
                web,
                state.unit.resolver.as_ref(),
                &mut state.diagnostics,
            )?;
            state.synthesis = Some(outcome);
        }
        state.phase.advance(UnitPhase::Synthesized)
    }
}

fn log_integration(unit_id: &str, metadata: &DeploymentMetadata) {
    let lists = [
        ("resource", &metadata.resource_classes),
        ("provider", &metadata.provider_classes),
        ("jndi component resource", &metadata.jndi_component_resources),
    ];
    for (label, classes) in lists {
        if !classes.is_empty() {
            info!("{} {} classes: {}", unit_id, label, join(classes));
        }
    }
}

fn join(classes: &BTreeSet<String>) -> String {
    classes.iter().map(String::as_str).collect::<Vec<_>>().join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{InMemoryIndex, IndexClassResolver};
    use jaxscope_api::{Annotation, ClassInfo, ClassKind, names};
    use std::sync::Arc;

    fn unit(id: &str, classes: Vec<ClassInfo>) -> BuildUnit {
        let index = InMemoryIndex::new(classes);
        let resolver = IndexClassResolver::new(&index, Vec::new());
        BuildUnit::new(id, Arc::new(index), Arc::new(resolver))
    }

    fn resource(name: &str) -> ClassInfo {
        let mut class = ClassInfo::new(name, ClassKind::Class);
        class.annotations.push(Annotation::with_value(names::PATH, "/x"));
        class
    }

    #[test]
    fn units_are_driven_through_every_phase() {
        let pipeline = DeploymentPipeline::new(PipelineConfig::default());
        let lib = unit("lib.jar", vec![resource("lib.Orders")]).with_parent("app.ear");
        let web = unit("web.war", vec![resource("web.Status")])
            .with_parent("app.ear")
            .with_dependencies(["lib.jar"])
            .with_descriptor(WebDescriptor::default());

        let report = pipeline.deploy("app.ear", vec![web, lib]).unwrap();

        assert!(report.units.iter().all(|u| u.phase == UnitPhase::Synthesized));
        let web = report.unit("web.war").unwrap();
        assert_eq!(
            web.metadata.resource_classes.iter().collect::<Vec<_>>(),
            vec!["lib.Orders", "web.Status"]
        );
        assert!(report.unit("lib.jar").unwrap().synthesis.is_none());
    }

    #[test]
    fn classify_stops_after_scanning() {
        let pipeline = DeploymentPipeline::new(PipelineConfig::default());
        let lib = unit("lib.jar", vec![resource("lib.Orders")]).with_parent("app.ear");
        let web = unit("web.war", vec![resource("web.Status")])
            .with_parent("app.ear")
            .with_dependencies(["lib.jar"])
            .with_descriptor(WebDescriptor::default());

        let report = pipeline.classify("app.ear", vec![lib, web]).unwrap();

        let web = report.unit("web.war").unwrap();
        assert_eq!(web.phase, UnitPhase::Classified);
        assert!(!web.metadata.resource_classes.contains("lib.Orders"));
        assert!(web.merge.is_none() && web.synthesis.is_none());
        assert_eq!(web.descriptor, Some(WebDescriptor::default()));
    }

    #[test]
    fn diagnostics_are_counted_across_units() {
        let pipeline = DeploymentPipeline::new(PipelineConfig::default());
        let mut app = ClassInfo::new("web.ShopApp", ClassKind::Class);
        app.super_name = Some(names::APPLICATION.to_string());
        let mut descriptor = WebDescriptor::default();
        descriptor.add_servlet_mapping(
            "web.ShopApp",
            vec!["/shop/*".to_string(), "/store/*".to_string()],
        );
        let web = unit("web.war", vec![app]).with_descriptor(descriptor);

        let report = pipeline
            .deploy("web.war", vec![web, unit("lib.jar", vec![])])
            .unwrap();

        assert_eq!(report.diagnostic_count(), 1);
        assert!(report.unit("web.war").unwrap().metadata.ignore_application_path);
    }

    #[test]
    fn duplicate_unit_ids_are_rejected() {
        let pipeline = DeploymentPipeline::new(PipelineConfig::default());
        let err = pipeline
            .deploy("app.ear", vec![unit("a.jar", vec![]), unit("a.jar", vec![])])
            .unwrap_err();
        assert!(matches!(err, DeploymentError::IllegalState(_)));
    }

    #[test]
    fn closed_session_cannot_be_reused() {
        let pipeline = DeploymentPipeline::new(PipelineConfig::default());
        let session = DeploymentSession::new("app.ear");
        pipeline.deploy_in(&session, vec![unit("a.jar", vec![])]).unwrap();
        assert!(session.is_closed());

        let err = pipeline
            .deploy_in(&session, vec![unit("b.jar", vec![])])
            .unwrap_err();
        assert!(matches!(err, DeploymentError::IllegalState(_)));
    }
}
