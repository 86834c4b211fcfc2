use hemo_core::{CoreError, ErrorKind};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Body returned with every non-2xx response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ErrorRes {
    /// One of `invalid_input`, `business_rule`, `not_found`, `collaborator_failure`.
    pub kind: String,
    pub message: String,
}

impl From<&CoreError> for ErrorRes {
    fn from(e: &CoreError) -> Self {
        let kind = match e.kind() {
            ErrorKind::InvalidInput => "invalid_input",
            ErrorKind::BusinessRule => "business_rule",
            ErrorKind::NotFound => "not_found",
            ErrorKind::CollaboratorFailure => "collaborator_failure",
        };
        Self {
            kind: kind.into(),
            message: e.to_string(),
        }
    }
}
