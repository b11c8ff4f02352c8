use super::class::{ClassInfo, DotName};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Well-known annotation and type names the scanner keys on.
pub mod names {
    pub const APPLICATION: &str = "javax.ws.rs.core.Application";
    pub const APPLICATION_PATH: &str = "javax.ws.rs.ApplicationPath";
    pub const PATH: &str = "javax.ws.rs.Path";
    pub const PROVIDER: &str = "javax.ws.rs.ext.Provider";
    pub const DECORATOR: &str = "javax.decorator.Decorator";
}

/// The element an annotation occurrence is attached to.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, JsonSchema)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AnnotationTarget {
    Class(ClassInfo),
    Method { owner: DotName, name: String },
    Field { owner: DotName, name: String },
    Parameter { owner: DotName, method: String, position: u16 },
}

impl AnnotationTarget {
    pub fn as_class(&self) -> Option<&ClassInfo> {
        match self {
            AnnotationTarget::Class(info) => Some(info),
            _ => None,
        }
    }
}

impl fmt::Display for AnnotationTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnnotationTarget::Class(info) => write!(f, "class {}", info.name),
            AnnotationTarget::Method { owner, name } => write!(f, "method {}#{}", owner, name),
            AnnotationTarget::Field { owner, name } => write!(f, "field {}#{}", owner, name),
            AnnotationTarget::Parameter {
                owner,
                method,
                position,
            } => write!(f, "parameter {} of {}#{}", position, owner, method),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, JsonSchema)]
pub struct AnnotationInstance {
    pub name: DotName,
    pub target: AnnotationTarget,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}
