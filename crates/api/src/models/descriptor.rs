use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, JsonSchema)]
pub struct ParamValue {
    pub name: String,
    pub value: Option<String>,
}

impl ParamValue {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq, JsonSchema)]
pub struct ServletMetaData {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub servlet_class: Option<String>,
    #[serde(default)]
    pub init_params: Vec<ParamValue>,
    #[serde(default)]
    pub async_supported: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub load_on_startup: Option<String>,
}

impl ServletMetaData {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn init_param(&self, name: &str) -> Option<&ParamValue> {
        self.init_params.iter().find(|p| p.name == name)
    }

    /// Appends an init parameter; existing entries with the same name are kept.
    pub fn add_init_param(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.init_params.push(ParamValue::new(name, value));
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq, JsonSchema)]
pub struct FilterMetaData {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter_class: Option<String>,
    #[serde(default)]
    pub init_params: Vec<ParamValue>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, JsonSchema)]
pub struct ServletMapping {
    pub servlet_name: String,
    #[serde(default)]
    pub url_patterns: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, JsonSchema)]
pub struct SecurityConstraint {
    pub resource_name: String,
    #[serde(default)]
    pub url_patterns: Vec<String>,
    #[serde(default)]
    pub roles: Vec<String>,
}

/// One web application's deployment descriptor.
///
/// Owned by the surrounding deployment; the pipeline only appends to it or
/// queries it.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq, JsonSchema)]
pub struct WebDescriptor {
    #[serde(default)]
    pub metadata_complete: bool,
    #[serde(default)]
    pub servlets: Vec<ServletMetaData>,
    #[serde(default)]
    pub filters: Vec<FilterMetaData>,
    #[serde(default)]
    pub servlet_mappings: Vec<ServletMapping>,
    #[serde(default)]
    pub context_params: Vec<ParamValue>,
    #[serde(default)]
    pub security_constraints: Vec<SecurityConstraint>,
}

impl WebDescriptor {
    pub fn servlet_by_name(&self, name: &str) -> Option<&ServletMetaData> {
        self.servlets.iter().find(|s| s.name == name)
    }

    pub fn add_servlet(&mut self, servlet: ServletMetaData) {
        self.servlets.push(servlet);
    }

    pub fn add_servlet_mapping(&mut self, servlet_name: impl Into<String>, patterns: Vec<String>) {
        self.servlet_mappings.push(ServletMapping {
            servlet_name: servlet_name.into(),
            url_patterns: patterns,
        });
    }

    pub fn servlet_mapping_exists(&self, servlet_name: &str) -> bool {
        self.servlet_mappings
            .iter()
            .any(|m| m.servlet_name == servlet_name)
    }

    /// All URL patterns mapped to `servlet_name`, across every mapping entry, in
    /// declaration order.
    pub fn url_patterns_for(&self, servlet_name: &str) -> Vec<&str> {
        self.servlet_mappings
            .iter()
            .filter(|m| m.servlet_name == servlet_name)
            .flat_map(|m| m.url_patterns.iter().map(String::as_str))
            .collect()
    }

    pub fn find_context_param(&self, name: &str) -> Option<&ParamValue> {
        self.context_params.iter().find(|p| p.name == name)
    }

    /// First init parameter named `name` on any servlet.
    pub fn find_init_param(&self, name: &str) -> Option<&ParamValue> {
        self.servlets.iter().find_map(|s| s.init_param(name))
    }

    pub fn set_context_param(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.context_params.push(ParamValue::new(name, value));
    }

    /// Servlet and filter classes declared by this descriptor.
    pub fn declared_classes(&self) -> impl Iterator<Item = &str> {
        self.servlets
            .iter()
            .filter_map(|s| s.servlet_class.as_deref())
            .chain(self.filters.iter().filter_map(|f| f.filter_class.as_deref()))
    }
}
