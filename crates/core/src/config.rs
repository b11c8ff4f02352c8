use jaxscope_api::ServletMetaData;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Name of the catch-all dispatcher servlet registered when a deployment has
/// no usable `Application` subclass.
pub const DEFAULT_SERVLET_NAME: &str = "javax.ws.rs.core.Application";
/// Init parameter carrying the `Application` class a dispatcher serves.
pub const APPLICATION_INIT_PARAM: &str = "javax.ws.rs.Application";
/// Context parameter that marks unwrapped exceptions as configured.
pub const UNWRAPPED_EXCEPTIONS_PARAM: &str = "resteasy.unwrapped.exceptions";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatcherConfig {
    /// Servlet class every synthesized or adopted dispatcher runs on.
    pub servlet_class: String,
    pub servlet_mode_param: String,
    pub delegate_param: String,
    pub delegate_class: String,
    /// Simple class names that identify a dispatcher implementation.
    pub recognized_names: Vec<String>,
    /// Fully qualified dispatcher classes a descriptor may declare directly.
    pub allowed_classes: Vec<String>,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            servlet_class: "org.jboss.wsf.spi.deployment.WSFServlet".to_string(),
            servlet_mode_param: "org.jboss.ws.jaxrs.servlet.mode".to_string(),
            delegate_param: "org.jboss.ws.stack.servlet.delegate.class".to_string(),
            delegate_class: "org.jboss.wsf.stack.cxf.JAXRSServletExt".to_string(),
            recognized_names: vec!["WSFServlet".to_string()],
            allowed_classes: vec!["org.jboss.wsf.spi.deployment.WSFServlet".to_string()],
        }
    }
}

impl DispatcherConfig {
    /// Whether `class` looks like a dispatcher but is not one of the allowed
    /// implementations.
    pub fn is_conflicting(&self, class: &str) -> bool {
        let simple = jaxscope_api::simple_name(class);
        self.recognized_names.iter().any(|n| n == simple)
            && !self.allowed_classes.iter().any(|c| c == class)
    }

    /// Turns `servlet` into an async dispatcher servlet.
    pub fn install(&self, servlet: &mut ServletMetaData) {
        servlet.servlet_class = Some(self.servlet_class.clone());
        servlet.add_init_param(&self.servlet_mode_param, "true");
        servlet.add_init_param(&self.delegate_param, &self.delegate_class);
        servlet.async_supported = true;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub dispatcher: DispatcherConfig,
    /// Servlet or filter classes whose presence turns scanning off.
    pub boot_classes: Vec<String>,
    /// Annotations marking session beans; resources carrying one are also
    /// published as JNDI component resources.
    pub session_bean_markers: Vec<String>,
    /// Process the units of one phase on the rayon pool.
    pub parallel: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let dispatcher = DispatcherConfig::default();
        Self {
            boot_classes: vec![dispatcher.servlet_class.clone()],
            dispatcher,
            session_bean_markers: vec![
                "javax.ejb.Stateless".to_string(),
                "javax.ejb.Stateful".to_string(),
                "javax.ejb.Singleton".to_string(),
            ],
            parallel: true,
        }
    }
}

impl PipelineConfig {
    pub fn from_file(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn is_boot_class(&self, class: &str) -> bool {
        self.boot_classes.iter().any(|c| c == class)
    }
}
