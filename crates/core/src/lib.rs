pub mod classifier;
pub mod config;
pub mod diagnostics;
pub mod index;
pub mod logging;
pub mod merger;
pub mod pipeline;
pub mod policy;
pub mod prescan;
pub mod session;
pub mod synthesizer;
pub mod unit;

pub use classifier::{ClassClassifier, ScanInput};
pub use config::{DispatcherConfig, PipelineConfig};
pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
pub use index::{ClassHierarchy, InMemoryIndex, IndexClassResolver};
pub use merger::{MergeReport, MetadataMerger};
pub use pipeline::{DeploymentPipeline, DeploymentReport, UnitReport};
pub use prescan::{WebPrescanner, WebScan};
pub use session::DeploymentSession;
pub use synthesizer::{ServletSynthesizer, SkipReason, SynthesisOutcome};
pub use unit::{BuildUnit, UnitPhase};

pub use jaxscope_api::{DeploymentError, Result};
