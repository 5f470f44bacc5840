use std::sync::Arc;

use mira_agent::{build_client, KnowledgeRetriever, LlmError, Orchestrator, PromptLibrary};
use mira_agent::retrieval::RetrievalError;
use mira_core::config::{AppConfig, ConfigError};
use mira_db::{connect_from_config, migrations, DbPool, SqlInteractionRepository};
use thiserror::Error;
use tracing::info;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub orchestrator: Arc<Orchestrator>,
    pub repository: Arc<SqlInteractionRepository>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error(transparent)]
    Llm(#[from] LlmError),
    #[error(transparent)]
    Retrieval(#[from] RetrievalError),
    #[error("prompt templates failed to compile: {0}")]
    Prompts(String),
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(event_name = "system.bootstrap.start", "starting application bootstrap");

    let db_pool =
        connect_from_config(&config.database).await.map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        "database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(event_name = "system.bootstrap.migrations_applied", "database migrations applied");

    let llm = build_client(&config.llm)?;
    let retriever = Arc::new(KnowledgeRetriever::from_config(&config.knowledge)?);
    let prompts = Arc::new(
        PromptLibrary::new().map_err(|error| BootstrapError::Prompts(error.to_string()))?,
    );

    let orchestrator = Arc::new(Orchestrator::new(llm, retriever, prompts));
    let repository = Arc::new(SqlInteractionRepository::new(db_pool.clone()));

    info!(
        event_name = "system.bootstrap.pipeline_ready",
        llm_provider = ?config.llm.provider,
        knowledge_mode = ?config.knowledge.mode,
        "query pipeline assembled"
    );

    Ok(Application { config, db_pool, orchestrator, repository })
}
