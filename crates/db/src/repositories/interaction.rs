//! Interaction repository.
//!
//! Stores one row per chat exchange. Classification and insight payloads are
//! kept as JSON; the schema only indexes what analytics queries filter on.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqliteRow, Row};

use mira_core::{ClassificationOutcome, InteractionInsight, PipelineOutcome};

use super::{InteractionRepository, RepositoryError};
use crate::DbPool;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InteractionRecord {
    pub interaction_id: String,
    pub user_id: String,
    pub session_id: Option<String>,
    pub query: String,
    pub response: String,
    pub classification: ClassificationOutcome,
    pub insights: InteractionInsight,
    pub created_at: DateTime<Utc>,
}

impl InteractionRecord {
    pub fn from_outcome(
        interaction_id: impl Into<String>,
        user_id: impl Into<String>,
        session_id: Option<String>,
        query: impl Into<String>,
        outcome: &PipelineOutcome,
    ) -> Self {
        Self {
            interaction_id: interaction_id.into(),
            user_id: user_id.into(),
            session_id,
            query: query.into(),
            response: outcome.response.clone(),
            classification: outcome.classification.clone(),
            insights: outcome.insights.clone(),
            created_at: outcome.timestamp,
        }
    }
}

pub struct SqlInteractionRepository {
    pool: DbPool,
}

impl SqlInteractionRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InteractionRepository for SqlInteractionRepository {
    async fn insert(&self, record: InteractionRecord) -> Result<(), RepositoryError> {
        let classification_json = serde_json::to_string(&record.classification)
            .map_err(|error| RepositoryError::Decode(error.to_string()))?;
        let insights_json = serde_json::to_string(&record.insights)
            .map_err(|error| RepositoryError::Decode(error.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO interactions (
                interaction_id, user_id, session_id, query, response,
                classification, insights, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.interaction_id)
        .bind(&record.user_id)
        .bind(&record.session_id)
        .bind(&record.query)
        .bind(&record.response)
        .bind(&classification_json)
        .bind(&insights_json)
        .bind(record.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn recent(&self, limit: i64) -> Result<Vec<InteractionRecord>, RepositoryError> {
        let rows = sqlx::query(
            r#"
            SELECT interaction_id, user_id, session_id, query, response,
                   classification, insights, created_at
            FROM interactions
            ORDER BY created_at DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(decode_row).collect()
    }

    async fn find_by_user(
        &self,
        user_id: &str,
        limit: i64,
    ) -> Result<Vec<InteractionRecord>, RepositoryError> {
        let rows = sqlx::query(
            r#"
            SELECT interaction_id, user_id, session_id, query, response,
                   classification, insights, created_at
            FROM interactions
            WHERE user_id = ?
            ORDER BY created_at DESC
            LIMIT ?
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(decode_row).collect()
    }
}

fn decode_row(row: SqliteRow) -> Result<InteractionRecord, RepositoryError> {
    let classification_json: String = row.get("classification");
    let insights_json: String = row.get("insights");
    let created_at_raw: String = row.get("created_at");

    let classification = serde_json::from_str(&classification_json)
        .map_err(|error| RepositoryError::Decode(error.to_string()))?;
    let insights = serde_json::from_str(&insights_json)
        .map_err(|error| RepositoryError::Decode(error.to_string()))?;
    let created_at = DateTime::parse_from_rfc3339(&created_at_raw)
        .map_err(|error| RepositoryError::Decode(error.to_string()))?
        .with_timezone(&Utc);

    Ok(InteractionRecord {
        interaction_id: row.get("interaction_id"),
        user_id: row.get("user_id"),
        session_id: row.get("session_id"),
        query: row.get("query"),
        response: row.get("response"),
        classification,
        insights,
        created_at,
    })
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use mira_core::{ClassificationOutcome, PipelineOutcome};

    use crate::repositories::{InteractionRepository, SqlInteractionRepository};
    use crate::{connect_with_settings, migrations};

    use super::InteractionRecord;

    async fn pool() -> crate::DbPool {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("run migrations");
        pool
    }

    fn record(interaction_id: &str, user_id: &str) -> InteractionRecord {
        let outcome = PipelineOutcome::failed("stubbed", Utc::now());
        InteractionRecord::from_outcome(
            interaction_id,
            user_id,
            Some("session-1".to_string()),
            "is this normal?",
            &outcome,
        )
    }

    #[tokio::test]
    async fn insert_then_read_back_round_trips_json_columns() {
        let repository = SqlInteractionRepository::new(pool().await);
        let original = record("int-1", "user-1");

        repository.insert(original.clone()).await.expect("insert");
        let loaded = repository.recent(10).await.expect("recent");

        assert_eq!(loaded, vec![original]);
    }

    #[tokio::test]
    async fn recent_orders_newest_first_and_respects_limit() {
        let repository = SqlInteractionRepository::new(pool().await);

        let mut first = record("int-1", "user-1");
        first.created_at = first.created_at - chrono::Duration::minutes(5);
        let second = record("int-2", "user-1");

        repository.insert(first).await.expect("insert first");
        repository.insert(second.clone()).await.expect("insert second");

        let loaded = repository.recent(1).await.expect("recent");
        assert_eq!(loaded, vec![second]);
    }

    #[tokio::test]
    async fn find_by_user_filters_other_users_out() {
        let repository = SqlInteractionRepository::new(pool().await);

        repository.insert(record("int-1", "user-a")).await.expect("insert a");
        repository.insert(record("int-2", "user-b")).await.expect("insert b");

        let loaded = repository.find_by_user("user-a", 10).await.expect("find");
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].user_id, "user-a");
        assert!(matches!(loaded[0].classification, ClassificationOutcome::Failed { .. }));
    }
}
