use jaxscope_api::{AnnotationIndex, ClassResolver, DeploymentError, Result, WebDescriptor};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// Processing phase of one build unit. Phases only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitPhase {
    NotStarted,
    Classified,
    Merged,
    Synthesized,
}

impl UnitPhase {
    fn next(self) -> Option<UnitPhase> {
        match self {
            UnitPhase::NotStarted => Some(UnitPhase::Classified),
            UnitPhase::Classified => Some(UnitPhase::Merged),
            UnitPhase::Merged => Some(UnitPhase::Synthesized),
            UnitPhase::Synthesized => None,
        }
    }

    /// Moves to `to`, which must be the immediate successor.
    pub fn advance(&mut self, to: UnitPhase) -> Result<()> {
        if self.next() != Some(to) {
            return Err(DeploymentError::IllegalState(format!(
                "cannot move from {} to {}",
                self, to
            )));
        }
        *self = to;
        Ok(())
    }

    pub fn require(self, expected: UnitPhase) -> Result<()> {
        if self != expected {
            return Err(DeploymentError::IllegalState(format!(
                "expected phase {}, unit is {}",
                expected, self
            )));
        }
        Ok(())
    }
}

impl fmt::Display for UnitPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UnitPhase::NotStarted => "not-started",
            UnitPhase::Classified => "classified",
            UnitPhase::Merged => "merged",
            UnitPhase::Synthesized => "synthesized",
        };
        f.write_str(name)
    }
}

/// One compilation/deployment boundary with its own index.
pub struct BuildUnit {
    pub id: String,
    pub parent: Option<String>,
    pub index: Arc<dyn AnnotationIndex>,
    pub resolver: Arc<dyn ClassResolver>,
    /// Module dependencies in declaration order.
    pub dependencies: Vec<String>,
    /// Present for web archives; library units have none.
    pub descriptor: Option<WebDescriptor>,
}

impl BuildUnit {
    pub fn new(
        id: impl Into<String>,
        index: Arc<dyn AnnotationIndex>,
        resolver: Arc<dyn ClassResolver>,
    ) -> Self {
        Self {
            id: id.into(),
            parent: None,
            index,
            resolver,
            dependencies: Vec::new(),
            descriptor: None,
        }
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn with_dependencies<I, S>(mut self, dependencies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies = dependencies.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_descriptor(mut self, descriptor: WebDescriptor) -> Self {
        self.descriptor = Some(descriptor);
        self
    }

    pub fn is_web(&self) -> bool {
        self.descriptor.is_some()
    }
}

impl fmt::Debug for BuildUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuildUnit")
            .field("id", &self.id)
            .field("parent", &self.parent)
            .field("dependencies", &self.dependencies)
            .field("web", &self.is_web())
            .finish()
    }
}
