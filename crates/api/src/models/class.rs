use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Fully qualified, dot separated class or annotation name.
pub type DotName = String;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ClassKind {
    #[default]
    Class,
    Interface,
    Enum,
    Annotation,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Modifier {
    Public,
    Protected,
    Private,
    Abstract,
    Static,
    Final,
}

/// An annotation usage together with its `value` member, if any.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash, JsonSchema)]
pub struct Annotation {
    pub name: DotName,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl Annotation {
    pub fn marker(name: impl Into<DotName>) -> Self {
        Self {
            name: name.into(),
            value: None,
        }
    }

    pub fn with_value(name: impl Into<DotName>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, JsonSchema)]
pub struct MemberInfo {
    pub name: String,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

/// Tagged class identity as recorded by an annotation index.
///
/// Classification works purely on this data; turning a name into a loadable
/// handle is left to a [`crate::ClassResolver`].
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, JsonSchema)]
pub struct ClassInfo {
    pub name: DotName,
    #[serde(default)]
    pub kind: ClassKind,
    #[serde(default)]
    pub modifiers: Vec<Modifier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub super_name: Option<DotName>,
    #[serde(default)]
    pub interfaces: Vec<DotName>,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
    #[serde(default)]
    pub methods: Vec<MemberInfo>,
    #[serde(default)]
    pub fields: Vec<MemberInfo>,
}

impl ClassInfo {
    pub fn new(name: impl Into<DotName>, kind: ClassKind) -> Self {
        Self {
            name: name.into(),
            kind,
            modifiers: vec![Modifier::Public],
            super_name: None,
            interfaces: Vec::new(),
            annotations: Vec::new(),
            methods: Vec::new(),
            fields: Vec::new(),
        }
    }

    pub fn is_interface(&self) -> bool {
        matches!(self.kind, ClassKind::Interface | ClassKind::Annotation)
    }

    pub fn is_abstract(&self) -> bool {
        self.is_interface() || self.modifiers.contains(&Modifier::Abstract)
    }

    /// Neither an interface nor abstract.
    pub fn is_concrete(&self) -> bool {
        !self.is_abstract()
    }

    pub fn annotation(&self, name: &str) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.name == name)
    }

    pub fn has_annotation(&self, name: &str) -> bool {
        self.annotation(name).is_some()
    }

    pub fn simple_name(&self) -> &str {
        simple_name(&self.name)
    }
}

/// Last segment of a dot separated name.
pub fn simple_name(name: &str) -> &str {
    name.rsplit('.').next().unwrap_or(name)
}
