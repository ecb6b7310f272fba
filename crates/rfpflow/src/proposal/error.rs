use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProposalError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("Proposal extraction failed: {0}")]
    Extraction(#[from] crate::ai::AiError),

    #[error("Database error: {0}")]
    Database(#[from] crate::db::DatabaseError),
}

impl ProposalError {
    pub(crate) fn not_found(kind: &'static str, id: &str) -> Self {
        ProposalError::NotFound {
            kind,
            id: id.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ProposalError>;
