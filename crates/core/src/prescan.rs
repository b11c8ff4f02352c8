//! Inspection of a web descriptor before its unit is scanned.

use crate::config::{APPLICATION_INIT_PARAM, PipelineConfig, UNWRAPPED_EXCEPTIONS_PARAM};
use crate::index::ClassHierarchy;
use jaxscope_api::{ClassResolver, DeploymentError, Result, WebDescriptor, names};
use tracing::info;

/// What the descriptor already says about REST dispatching.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WebScan {
    pub has_boot_classes: bool,
    /// `Application` subclass a declared servlet was adopted for.
    pub declared_application: Option<String>,
    pub unwrapped_exceptions_set: bool,
}

impl WebScan {
    pub fn dispatcher_created(&self) -> bool {
        self.declared_application.is_some()
    }
}

pub struct WebPrescanner<'a> {
    config: &'a PipelineConfig,
}

impl<'a> WebPrescanner<'a> {
    pub fn new(config: &'a PipelineConfig) -> Self {
        Self { config }
    }

    /// Detects boot classes, then adopts the first declared servlet whose class
    /// is an `Application` subclass as a dispatcher. The class may come from
    /// any index in `hierarchy`.
    ///
    /// All checks that can fail run before the descriptor is touched.
    pub fn prescan(
        &self,
        web: &mut WebDescriptor,
        hierarchy: &ClassHierarchy<'_>,
        resolver: &dyn ClassResolver,
    ) -> Result<WebScan> {
        self.check_conflicts(web)?;

        let has_boot_classes = web
            .declared_classes()
            .any(|class| self.config.is_boot_class(class));

        let mut scan = WebScan {
            has_boot_classes,
            declared_application: None,
            unwrapped_exceptions_set: web.find_context_param(UNWRAPPED_EXCEPTIONS_PARAM).is_some(),
        };

        if let Some(position) = self.find_application_servlet(web, hierarchy, resolver)? {
            let servlet = &mut web.servlets[position];
            let application = servlet.servlet_class.clone().unwrap_or_default();
            self.config.dispatcher.install(servlet);
            servlet.add_init_param(APPLICATION_INIT_PARAM, &application);
            info!(
                "servlet {} declares application {}, serving it through the dispatcher",
                servlet.name, application
            );
            scan.declared_application = Some(application);
        }
        Ok(scan)
    }

    fn check_conflicts(&self, web: &WebDescriptor) -> Result<()> {
        let servlets = web
            .servlets
            .iter()
            .filter_map(|s| s.servlet_class.as_deref().map(|c| (s.name.as_str(), c)));
        let filters = web
            .filters
            .iter()
            .filter_map(|f| f.filter_class.as_deref().map(|c| (f.name.as_str(), c)));
        for (name, class) in servlets.chain(filters) {
            if self.config.dispatcher.is_conflicting(class) {
                return Err(DeploymentError::ConflictingDispatcherServlet {
                    servlet: name.to_string(),
                    class: class.to_string(),
                });
            }
        }
        Ok(())
    }

    fn find_application_servlet(
        &self,
        web: &WebDescriptor,
        hierarchy: &ClassHierarchy<'_>,
        resolver: &dyn ClassResolver,
    ) -> Result<Option<usize>> {
        for (position, servlet) in web.servlets.iter().enumerate() {
            let Some(class) = servlet.servlet_class.as_deref() else {
                continue;
            };
            let handle = resolver.load(class)?;
            if hierarchy.extends(&handle, names::APPLICATION) {
                return Ok(Some(position));
            }
        }
        Ok(None)
    }
}
