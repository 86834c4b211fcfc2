use hemo_types::TypesError;
use hemo_uuid::UuidError;

/// Coarse classification of a [`CoreError`], used by adapters to pick a response.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidInput,
    BusinessRule,
    NotFound,
    CollaboratorFailure,
}

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error(transparent)]
    Types(#[from] TypesError),
    #[error("invalid identifier: {0}")]
    Identifier(#[from] UuidError),

    #[error("insufficient available stock. Available: {available}, Requested: {requested}")]
    InsufficientStock { available: u32, requested: u32 },
    #[error("insufficient reserved stock. Reserved: {reserved}, Requested: {requested}")]
    InsufficientReservedStock { reserved: u32, requested: u32 },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("collaborator failure: {0}")]
    Collaborator(String),
    #[error("{0} timed out")]
    Timeout(&'static str),
    #[error("inventory store rejected a non-append-only write: {0}")]
    AppendOnlyViolation(String),
    #[error("failed to create storage directory: {0}")]
    StorageDirCreation(std::io::Error),
    #[error("failed to read file: {0}")]
    FileRead(std::io::Error),
    #[error("failed to write inventory file: {0}")]
    FileWrite(std::io::Error),
    #[error("failed to serialize YAML: {0}")]
    YamlSerialization(serde_yaml::Error),
    #[error("failed to deserialize YAML: {0}")]
    YamlDeserialization(serde_yaml::Error),
}

impl CoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput(_)
            | Self::InvalidRequest(_)
            | Self::Types(_)
            | Self::Identifier(_) => ErrorKind::InvalidInput,
            Self::InsufficientStock { .. } | Self::InsufficientReservedStock { .. } => {
                ErrorKind::BusinessRule
            }
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Collaborator(_)
            | Self::Timeout(_)
            | Self::AppendOnlyViolation(_)
            | Self::StorageDirCreation(_)
            | Self::FileRead(_)
            | Self::FileWrite(_)
            | Self::YamlSerialization(_)
            | Self::YamlDeserialization(_) => ErrorKind::CollaboratorFailure,
        }
    }
}

pub type CoreResult<T> = std::result::Result<T, CoreError>;
