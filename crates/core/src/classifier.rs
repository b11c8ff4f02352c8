//! Classification of indexed classes into applications, resources and providers.

use crate::config::PipelineConfig;
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use jaxscope_api::{
    AnnotationIndex, AnnotationTarget, ApplicationClass, ClassInfo, ClassResolver,
    DeploymentMetadata, DotName, Result, WebDescriptor, names,
};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

/// Everything the classifier reads for one unit.
#[derive(Clone, Copy)]
pub struct ScanInput<'a> {
    pub index: &'a dyn AnnotationIndex,
    pub resolver: &'a dyn ClassResolver,
    /// Read-only; present for web units.
    pub descriptor: Option<&'a WebDescriptor>,
}

#[derive(Debug, Default)]
struct Classified {
    applications: BTreeMap<DotName, ApplicationClass>,
    resources: BTreeSet<DotName>,
    providers: BTreeSet<DotName>,
    jndi_resources: BTreeSet<DotName>,
    resource_interfaces: BTreeMap<DotName, ClassInfo>,
}

pub struct ClassClassifier<'a> {
    config: &'a PipelineConfig,
}

impl<'a> ClassClassifier<'a> {
    pub fn new(config: &'a PipelineConfig) -> Self {
        Self { config }
    }

    /// Populates the class sets of `metadata` according to its policy.
    ///
    /// Nothing is written to `metadata` unless classification succeeds as a
    /// whole.
    pub fn classify(
        &self,
        input: ScanInput<'_>,
        metadata: &mut DeploymentMetadata,
        diagnostics: &mut Diagnostics,
    ) -> Result<()> {
        let policy = metadata.policy;
        if !policy.should_scan() {
            debug!("scanning disabled, skipping classification");
            return Ok(());
        }

        let mut found = Classified::default();
        if !metadata.dispatcher_created {
            found.applications = self.scan_applications(input)?;
        }
        if policy.scans_resources() {
            self.scan_resources(input.index, &mut found, diagnostics);
        }
        if policy.scans_providers() {
            self.scan_providers(input.index, &mut found, diagnostics);
        }
        self.expand_interfaces(input.index, &mut found, diagnostics);

        for (name, app) in found.applications {
            metadata.application_classes.insert(name, app);
        }
        metadata.resource_classes.extend(found.resources);
        metadata.provider_classes.extend(found.providers);
        metadata.jndi_component_resources.extend(found.jndi_resources);
        for name in metadata.enforce_exclusivity() {
            diagnostics.record(
                DiagnosticKind::ClassificationOverlap,
                name.clone(),
                "class already classified with higher precedence",
            );
            warn!("{} matched more than one classification, keeping the first by precedence", name);
        }
        Ok(())
    }

    fn scan_applications(&self, input: ScanInput<'_>) -> Result<BTreeMap<DotName, ApplicationClass>> {
        let mut applications = BTreeMap::new();
        for candidate in input.index.find_subtypes(names::APPLICATION) {
            if candidate.is_abstract() {
                continue;
            }
            input.resolver.load(&candidate.name)?;

            let application_path = candidate
                .annotation(names::APPLICATION_PATH)
                .map(|a| a.value.clone().unwrap_or_default());
            let app = ApplicationClass {
                name: candidate.name.clone(),
                application_path,
            };
            let keep = match input.descriptor {
                Some(web) => is_registered(&app, web),
                // Mapping cannot be judged without a descriptor; the owning web
                // unit filters again during synthesis.
                None => true,
            };
            if keep {
                applications.insert(app.name.clone(), app);
            } else {
                debug!(
                    "ignoring application subclass {} without path or mapping",
                    candidate.name
                );
            }
        }
        Ok(applications)
    }

    fn scan_resources(
        &self,
        index: &dyn AnnotationIndex,
        found: &mut Classified,
        diagnostics: &mut Diagnostics,
    ) {
        for occurrence in index.find_annotated(names::PATH) {
            let info = match occurrence.target {
                AnnotationTarget::Class(info) => info,
                AnnotationTarget::Method { .. } => continue,
                other => {
                    report_malformed(diagnostics, "@Path", &other, "class or method");
                    continue;
                }
            };
            if is_decorator(&info, diagnostics) {
                continue;
            }
            if info.is_interface() {
                found.resource_interfaces.insert(info.name.clone(), info);
            } else {
                self.add_resource(found, &info);
            }
        }
    }

    fn scan_providers(
        &self,
        index: &dyn AnnotationIndex,
        found: &mut Classified,
        diagnostics: &mut Diagnostics,
    ) {
        for occurrence in index.find_annotated(names::PROVIDER) {
            let info = match occurrence.target {
                AnnotationTarget::Class(info) => info,
                other => {
                    report_malformed(diagnostics, "@Provider", &other, "class");
                    continue;
                }
            };
            if is_decorator(&info, diagnostics) {
                continue;
            }
            if !info.is_interface() {
                found.providers.insert(info.name);
            }
        }
    }

    fn expand_interfaces(
        &self,
        index: &dyn AnnotationIndex,
        found: &mut Classified,
        diagnostics: &mut Diagnostics,
    ) {
        let interfaces = std::mem::take(&mut found.resource_interfaces);
        for iface in interfaces.keys() {
            for implementor in index.find_implementors(iface) {
                if !implementor.is_concrete() || is_decorator(&implementor, diagnostics) {
                    continue;
                }
                self.add_resource(found, &implementor);
            }
        }
    }

    fn add_resource(&self, found: &mut Classified, info: &ClassInfo) {
        found.resources.insert(info.name.clone());
        if self
            .config
            .session_bean_markers
            .iter()
            .any(|m| info.has_annotation(m))
        {
            found.jndi_resources.insert(info.name.clone());
        }
    }
}

/// An application class counts when it is annotated with a path or the
/// descriptor already maps a servlet named after it.
pub fn is_registered(app: &ApplicationClass, web: &WebDescriptor) -> bool {
    app.is_annotated() || web.servlet_mapping_exists(&app.name)
}

fn is_decorator(info: &ClassInfo, diagnostics: &mut Diagnostics) -> bool {
    // Decorators registered programmatically are not visible here.
    if info.has_annotation(names::DECORATOR) {
        diagnostics.record(
            DiagnosticKind::DecoratorExcluded,
            info.name.clone(),
            "decorators are never resources or providers",
        );
        debug!("skipping decorator {}", info.name);
        return true;
    }
    false
}

fn report_malformed(
    diagnostics: &mut Diagnostics,
    annotation: &str,
    target: &AnnotationTarget,
    expected: &str,
) {
    warn!(
        "{} annotation not on a {}, found on {}; ignoring",
        annotation, expected, target
    );
    diagnostics.record(
        DiagnosticKind::MalformedTarget,
        target.to_string(),
        format!("{} expected on a {}", annotation, expected),
    );
}
