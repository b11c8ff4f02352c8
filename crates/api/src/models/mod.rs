pub mod annotation;
pub mod class;
pub mod descriptor;
pub mod metadata;

pub use annotation::*;
pub use class::*;
pub use descriptor::*;
pub use metadata::*;
