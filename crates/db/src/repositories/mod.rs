use async_trait::async_trait;
use thiserror::Error;

pub mod interaction;

pub use interaction::{InteractionRecord, SqlInteractionRepository};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

/// Persisted record of every chat exchange, for analytics and audit.
#[async_trait]
pub trait InteractionRepository: Send + Sync {
    async fn insert(&self, record: InteractionRecord) -> Result<(), RepositoryError>;
    async fn recent(&self, limit: i64) -> Result<Vec<InteractionRecord>, RepositoryError>;
    async fn find_by_user(
        &self,
        user_id: &str,
        limit: i64,
    ) -> Result<Vec<InteractionRecord>, RepositoryError>;
}
