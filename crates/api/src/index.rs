use crate::error::ResolveError;
use crate::models::{AnnotationInstance, ClassInfo};

/// Queryable view over the compiled classes of one build unit.
pub trait AnnotationIndex: Send + Sync {
    /// Every occurrence of the annotation `name`, on any target.
    fn find_annotated(&self, name: &str) -> Vec<AnnotationInstance>;

    /// All known direct and indirect subclasses of `name`.
    fn find_subtypes(&self, name: &str) -> Vec<ClassInfo>;

    /// All known classes implementing the interface `name`, directly, through a
    /// sub-interface or through a superclass.
    fn find_implementors(&self, name: &str) -> Vec<ClassInfo>;

    fn class_by_name(&self, name: &str) -> Option<ClassInfo>;
}

/// A class that the host was able to load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassHandle {
    pub name: String,
    /// Index entry for the class, when the class is part of the indexed unit.
    pub info: Option<ClassInfo>,
}

/// Maps a fully qualified name to a loadable class.
pub trait ClassResolver: Send + Sync {
    fn load(&self, name: &str) -> Result<ClassHandle, ResolveError>;
}
