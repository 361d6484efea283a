use thiserror::Error;

use crate::types::FichaState;

#[derive(Debug, Error)]
pub enum FichaError {
    #[error("ficha not found: {0}")]
    NotFound(String),

    #[error("ficha already exists: {0}")]
    Conflict(String),

    #[error("invalid transition for ficha {id} from {from} to {to}")]
    InvalidTransition {
        id: String,
        from: FichaState,
        to: FichaState,
    },

    #[error("invalid ficha record: {0}")]
    InvalidRecord(String),

    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl FichaError {
    /// Stable snake_case label reported alongside the message.
    pub fn kind(&self) -> &'static str {
        match self {
            FichaError::NotFound(_) => "not_found",
            FichaError::Conflict(_) => "conflict",
            FichaError::InvalidTransition { .. } => "invalid_transition",
            FichaError::InvalidRecord(_) => "invalid_record",
            FichaError::StorageUnavailable(_) => "storage_unavailable",
            FichaError::Io(_) => "io",
            FichaError::Yaml(_) => "yaml",
            FichaError::Json(_) => "json",
        }
    }
}

impl From<rusqlite::Error> for FichaError {
    fn from(err: rusqlite::Error) -> Self {
        FichaError::StorageUnavailable(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, FichaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_are_snake_case() {
        assert_eq!(FichaError::NotFound("x".into()).kind(), "not_found");
        assert_eq!(FichaError::Conflict("x".into()).kind(), "conflict");
        assert_eq!(
            FichaError::StorageUnavailable("locked".into()).kind(),
            "storage_unavailable"
        );
    }

    #[test]
    fn invalid_transition_message_names_both_states() {
        let err = FichaError::InvalidTransition {
            id: "SIG-1".into(),
            from: FichaState::Discarded,
            to: FichaState::Contacted,
        };
        let msg = err.to_string();
        assert!(msg.contains("discarded"), "{msg}");
        assert!(msg.contains("contacted"), "{msg}");
    }
}
