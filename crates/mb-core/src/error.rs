use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum MultiBranchError {
    #[error("branch name '{0}' is reserved")]
    ReservedName(String),

    #[error("branch name '{name}' cannot be stored safely: {reason}")]
    UnsafeBranchName { name: String, reason: String },

    #[error("branch name '{name}' collides with '{existing}' on case-insensitive storage")]
    NameCollision { name: String, existing: String },

    #[error("sub-project '{0}' not found")]
    SubProjectNotFound(String),

    #[error("sub-project '{0}' is not buildable")]
    NotBuildable(String),

    #[error("template project is unavailable: {0}")]
    TemplateUnavailable(String),

    #[error("invalid persisted state: {0}")]
    InvalidState(String),

    #[error("unknown type tag '{0}'")]
    UnknownTypeTag(String),

    #[error("unsupported schema version {found} (newest supported is {supported})")]
    UnsupportedSchemaVersion { found: u32, supported: u32 },

    #[error("document '{tag}' is a {found}, expected a {expected}")]
    KindMismatch {
        tag: String,
        found: &'static str,
        expected: &'static str,
    },

    #[error("state persistence failed: {0}")]
    State(String),

    #[error("branch discovery failed: {0}")]
    Discovery(String),

    #[error("git operation failed: {0}")]
    Git(String),

    #[error("config file not found at {0}")]
    ConfigNotFound(PathBuf),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

impl MultiBranchError {
    /// Whether this error belongs to the naming-conflict family: the branch is
    /// skipped for the cycle instead of failing anything else.
    pub fn is_naming_conflict(&self) -> bool {
        matches!(
            self,
            Self::ReservedName(_) | Self::UnsafeBranchName { .. } | Self::NameCollision { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, MultiBranchError>;
