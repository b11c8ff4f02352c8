//! Descriptor synthesis for the dispatcher servlets of a web unit.

use crate::classifier::is_registered;
use crate::config::{APPLICATION_INIT_PARAM, DEFAULT_SERVLET_NAME, PipelineConfig};
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use jaxscope_api::{
    ClassResolver, DeploymentMetadata, Result, ServletMapping, ServletMetaData, WebDescriptor,
};
use serde::Serialize;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// A declared servlet already serves an `Application` subclass.
    DispatcherCreated,
    /// The descriptor declares the dispatcher itself.
    BootClasses,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SynthesisOutcome {
    Skipped { reason: SkipReason },
    DefaultServlet { added: bool },
    ApplicationServlets {
        servlets: Vec<String>,
        mappings_added: Vec<String>,
    },
}

#[derive(Debug, Default)]
struct Plan {
    servlets: Vec<ServletMetaData>,
    mappings: Vec<ServletMapping>,
    ignore_application_path: bool,
}

pub struct ServletSynthesizer<'a> {
    config: &'a PipelineConfig,
}

impl<'a> ServletSynthesizer<'a> {
    pub fn new(config: &'a PipelineConfig) -> Self {
        Self { config }
    }

    /// Registers the dispatcher servlets `metadata` calls for.
    ///
    /// The whole plan, including class resolution, is built before the
    /// descriptor is modified, so a failure leaves `web` untouched.
    pub fn synthesize(
        &self,
        metadata: &mut DeploymentMetadata,
        web: &mut WebDescriptor,
        resolver: &dyn ClassResolver,
        diagnostics: &mut Diagnostics,
    ) -> Result<SynthesisOutcome> {
        if metadata.has_boot_classes || metadata.policy.has_boot_classes {
            info!("descriptor declares the dispatcher, skipping servlet synthesis");
            return Ok(SynthesisOutcome::Skipped {
                reason: SkipReason::BootClasses,
            });
        }
        if metadata.dispatcher_created {
            info!("dispatcher already created from a declared servlet, skipping synthesis");
            return Ok(SynthesisOutcome::Skipped {
                reason: SkipReason::DispatcherCreated,
            });
        }

        let applications: Vec<&str> = metadata
            .application_classes
            .values()
            .filter(|app| is_registered(app, web))
            .map(|app| app.name.as_str())
            .collect();

        if applications.is_empty() {
            return Ok(self.add_default_servlet(web));
        }

        let plan = self.plan(&applications, web, resolver, diagnostics)?;
        let servlets = plan.servlets.iter().map(|s| s.name.clone()).collect();
        let mappings_added = plan
            .mappings
            .iter()
            .map(|m| m.servlet_name.clone())
            .collect();
        for servlet in plan.servlets {
            web.add_servlet(servlet);
        }
        web.servlet_mappings.extend(plan.mappings);
        if plan.ignore_application_path {
            metadata.ignore_application_path = true;
        }
        Ok(SynthesisOutcome::ApplicationServlets {
            servlets,
            mappings_added,
        })
    }

    fn add_default_servlet(&self, web: &mut WebDescriptor) -> SynthesisOutcome {
        if web.servlet_by_name(DEFAULT_SERVLET_NAME).is_some() {
            debug!("default dispatcher servlet already registered");
            return SynthesisOutcome::DefaultServlet { added: false };
        }
        let mut servlet = ServletMetaData::named(DEFAULT_SERVLET_NAME);
        self.config.dispatcher.install(&mut servlet);
        web.add_servlet(servlet);
        info!("registered default dispatcher servlet {}", DEFAULT_SERVLET_NAME);
        SynthesisOutcome::DefaultServlet { added: true }
    }

    fn plan(
        &self,
        applications: &[&str],
        web: &WebDescriptor,
        resolver: &dyn ClassResolver,
        diagnostics: &mut Diagnostics,
    ) -> Result<Plan> {
        let mut plan = Plan::default();
        for &application in applications {
            let handle = resolver.load(application)?;
            let servlet_name = handle.name;

            if self.already_synthesized(web, &servlet_name) {
                debug!("dispatcher servlet for {} already synthesized", servlet_name);
                continue;
            }
            if web.servlet_by_name(&servlet_name).is_some() {
                debug!("servlet {} already registered", servlet_name);
            } else {
                let mut servlet = ServletMetaData::named(servlet_name.clone());
                // Eager start so the dispatcher is ready before the first request.
                servlet.load_on_startup = Some("0".to_string());
                self.config.dispatcher.install(&mut servlet);
                servlet.add_init_param(APPLICATION_INIT_PARAM, &servlet_name);
                plan.servlets.push(servlet);
            }

            if !web.servlet_mapping_exists(&servlet_name) {
                plan.mappings.push(ServletMapping {
                    servlet_name: servlet_name.clone(),
                    url_patterns: vec!["/*".to_string()],
                });
            } else if url_pattern_set(web, &servlet_name, diagnostics) {
                plan.ignore_application_path = true;
            }
            info!("registered dispatcher servlet for application {}", servlet_name);
        }
        Ok(plan)
    }

    /// A servlet named after the application that already runs the
    /// dispatcher for it.
    fn already_synthesized(&self, web: &WebDescriptor, application: &str) -> bool {
        web.servlet_by_name(application).is_some_and(|servlet| {
            servlet.servlet_class.as_deref() == Some(self.config.dispatcher.servlet_class.as_str())
                && servlet
                    .init_param(APPLICATION_INIT_PARAM)
                    .and_then(|p| p.value.as_deref())
                    == Some(application)
        })
    }
}

/// Whether any URL pattern is mapped to `servlet_name`; every pattern beyond
/// the first is reported.
fn url_pattern_set(web: &WebDescriptor, servlet_name: &str, diagnostics: &mut Diagnostics) -> bool {
    let patterns = web.url_patterns_for(servlet_name);
    for extra in patterns.iter().skip(1) {
        warn!(
            "more than one mapping found for servlet {}, ignoring pattern {}",
            servlet_name, extra
        );
        diagnostics.record(
            DiagnosticKind::MultipleUrlPatterns,
            servlet_name,
            format!("additional url pattern {}", extra),
        );
    }
    !patterns.is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{InMemoryIndex, IndexClassResolver};
    use jaxscope_api::{ApplicationClass, ClassInfo, ClassKind, DeploymentError, ScanPolicy};

    fn resolver(classes: &[&str]) -> IndexClassResolver {
        let index = InMemoryIndex::new(
            classes
                .iter()
                .map(|c| ClassInfo::new(*c, ClassKind::Class)),
        );
        IndexClassResolver::new(&index, Vec::new())
    }

    fn with_apps(apps: &[(&str, Option<&str>)]) -> DeploymentMetadata {
        let mut md = DeploymentMetadata::with_policy(ScanPolicy::scan_everything());
        for (name, path) in apps {
            md.add_application(ApplicationClass {
                name: name.to_string(),
                application_path: path.map(str::to_string),
            });
        }
        md
    }

    fn run(
        metadata: &mut DeploymentMetadata,
        web: &mut WebDescriptor,
        classes: &[&str],
    ) -> (Result<SynthesisOutcome>, Diagnostics) {
        let config = PipelineConfig::default();
        let mut diagnostics = Diagnostics::new();
        let outcome = ServletSynthesizer::new(&config).synthesize(
            metadata,
            web,
            &resolver(classes),
            &mut diagnostics,
        );
        (outcome, diagnostics)
    }

    #[test]
    fn no_application_registers_default_servlet_without_mapping() {
        let mut md = with_apps(&[]);
        md.resource_classes.insert("Widget".to_string());
        let mut web = WebDescriptor::default();

        let (outcome, _) = run(&mut md, &mut web, &[]);

        assert_eq!(outcome.unwrap(), SynthesisOutcome::DefaultServlet { added: true });
        assert_eq!(web.servlets.len(), 1);
        assert_eq!(web.servlets[0].name, DEFAULT_SERVLET_NAME);
        assert!(web.servlets[0].async_supported);
        assert!(web.servlet_mappings.is_empty());
    }

    #[test]
    fn annotated_application_gets_servlet_and_mapping() {
        let mut md = with_apps(&[("MyApp", Some("/api"))]);
        let mut web = WebDescriptor::default();

        let (outcome, _) = run(&mut md, &mut web, &["MyApp"]);

        assert!(matches!(outcome.unwrap(), SynthesisOutcome::ApplicationServlets { .. }));
        let servlet = web.servlet_by_name("MyApp").unwrap();
        assert_eq!(servlet.load_on_startup.as_deref(), Some("0"));
        assert!(servlet.async_supported);
        assert_eq!(
            servlet
                .init_param(APPLICATION_INIT_PARAM)
                .and_then(|p| p.value.as_deref()),
            Some("MyApp")
        );
        assert_eq!(
            web.servlet_mappings,
            vec![ServletMapping {
                servlet_name: "MyApp".to_string(),
                url_patterns: vec!["/*".to_string()],
            }]
        );
        assert!(!md.ignore_application_path);
    }

    #[test]
    fn existing_mapping_wins_over_application_path() {
        let mut md = with_apps(&[("MyApp", Some("/api"))]);
        let mut web = WebDescriptor::default();
        web.add_servlet_mapping("MyApp", vec!["/rest/*".to_string()]);

        let (outcome, diagnostics) = run(&mut md, &mut web, &["MyApp"]);

        match outcome.unwrap() {
            SynthesisOutcome::ApplicationServlets { mappings_added, .. } => {
                assert!(mappings_added.is_empty())
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(web.servlet_mappings.len(), 1);
        assert!(md.ignore_application_path);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn extra_url_patterns_warn_and_proceed() {
        let mut md = with_apps(&[("MyApp", None)]);
        let mut web = WebDescriptor::default();
        web.add_servlet_mapping("MyApp", vec!["/rest/*".to_string(), "/api/*".to_string()]);
        web.add_servlet_mapping("MyApp", vec!["/v2/*".to_string()]);

        let (outcome, diagnostics) = run(&mut md, &mut web, &["MyApp"]);

        assert!(outcome.is_ok());
        assert!(md.ignore_application_path);
        assert_eq!(diagnostics.of_kind(DiagnosticKind::MultipleUrlPatterns).count(), 2);
    }

    #[test]
    fn empty_existing_mapping_keeps_application_path() {
        let mut md = with_apps(&[("MyApp", None)]);
        let mut web = WebDescriptor::default();
        web.add_servlet_mapping("MyApp", Vec::new());

        let (outcome, _) = run(&mut md, &mut web, &["MyApp"]);

        assert!(outcome.is_ok());
        assert_eq!(web.servlet_mappings.len(), 1);
        assert!(!md.ignore_application_path);
    }

    #[test]
    fn unregistered_applications_fall_back_to_default() {
        let mut md = with_apps(&[("HelperApp", None)]);
        let mut web = WebDescriptor::default();

        let (outcome, _) = run(&mut md, &mut web, &["HelperApp"]);

        assert_eq!(outcome.unwrap(), SynthesisOutcome::DefaultServlet { added: true });
        assert!(web.servlet_by_name("HelperApp").is_none());
    }

    #[test]
    fn boot_classes_short_circuit() {
        let mut md = with_apps(&[("MyApp", Some("/"))]);
        md.has_boot_classes = true;
        let mut web = WebDescriptor::default();

        let (outcome, _) = run(&mut md, &mut web, &["MyApp"]);

        assert_eq!(
            outcome.unwrap(),
            SynthesisOutcome::Skipped {
                reason: SkipReason::BootClasses
            }
        );
        assert_eq!(web, WebDescriptor::default());
    }

    #[test]
    fn dispatcher_created_short_circuit() {
        let mut md = with_apps(&[]);
        md.dispatcher_created = true;
        let mut web = WebDescriptor::default();

        let (outcome, _) = run(&mut md, &mut web, &[]);

        assert_eq!(
            outcome.unwrap(),
            SynthesisOutcome::Skipped {
                reason: SkipReason::DispatcherCreated
            }
        );
        assert!(web.servlets.is_empty());
    }

    #[test]
    fn unresolvable_application_leaves_descriptor_untouched() {
        let mut md = with_apps(&[("a.First", Some("/a")), ("b.Second", Some("/b"))]);
        let mut web = WebDescriptor::default();

        let (outcome, _) = run(&mut md, &mut web, &["a.First"]);

        assert!(matches!(outcome, Err(DeploymentError::ClassNotFound { .. })));
        assert_eq!(web, WebDescriptor::default());
    }

    #[test]
    fn second_run_adds_nothing() {
        let mut md = with_apps(&[("MyApp", Some("/api"))]);
        let mut web = WebDescriptor::default();

        run(&mut md, &mut web, &["MyApp"]).0.unwrap();
        let first = (web.clone(), md.clone());
        let (outcome, diagnostics) = run(&mut md, &mut web, &["MyApp"]);

        assert_eq!(
            outcome.unwrap(),
            SynthesisOutcome::ApplicationServlets {
                servlets: Vec::new(),
                mappings_added: Vec::new(),
            }
        );
        assert_eq!(web, first.0);
        assert_eq!(md, first.1);
        assert!(!md.ignore_application_path);
        assert!(diagnostics.is_empty());
    }
}
