pub mod error;
pub mod index;
pub mod models;

// Re-export commonly used types
pub use error::{DeploymentError, ResolveError, Result};
pub use index::{AnnotationIndex, ClassHandle, ClassResolver};
pub use models::*;
