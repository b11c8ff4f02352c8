use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("class not found: {0}")]
    ClassNotFound(String),
}

/// Fatal conditions that abort the deployment of a build unit.
#[derive(Debug, Error)]
pub enum DeploymentError {
    #[error("invalid value {value:?} for parameter {param}")]
    InvalidConfigValue { param: String, value: Option<String> },
    #[error("cannot load class {class}: {source}")]
    ClassNotFound {
        class: String,
        #[source]
        source: ResolveError,
    },
    #[error(
        "servlet {servlet} declares {class}, which is not an allowed dispatcher class"
    )]
    ConflictingDispatcherServlet { servlet: String, class: String },
    #[error("illegal state: {0}")]
    IllegalState(String),
    #[error("deployment of unit {unit} failed: {source}")]
    Unit {
        unit: String,
        #[source]
        source: Box<DeploymentError>,
    },
}

impl DeploymentError {
    pub fn in_unit(self, unit: impl Into<String>) -> Self {
        match self {
            DeploymentError::Unit { .. } => self,
            other => DeploymentError::Unit {
                unit: unit.into(),
                source: Box::new(other),
            },
        }
    }

    /// The underlying error, without any unit wrapper.
    pub fn root(&self) -> &DeploymentError {
        match self {
            DeploymentError::Unit { source, .. } => source.root(),
            other => other,
        }
    }
}

impl From<ResolveError> for DeploymentError {
    fn from(err: ResolveError) -> Self {
        match &err {
            ResolveError::ClassNotFound(class) => DeploymentError::ClassNotFound {
                class: class.clone(),
                source: err,
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, DeploymentError>;
