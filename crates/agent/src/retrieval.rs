//! Knowledge retrieval collaborator.
//!
//! One `KnowledgeIndex` trait with two implementations chosen once at
//! construction: a live vector-search endpoint and a deterministic stub with
//! canned per-namespace snippets. Connectivity errors from the live index are
//! caught here and degrade that single call to the stub; no cross-call state
//! changes.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use mira_core::config::{KnowledgeConfig, KnowledgeMode};
use mira_core::{Namespace, Snippet};

#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("knowledge index unreachable: {0}")]
    Unreachable(String),
    #[error("knowledge index returned a malformed payload: {0}")]
    Malformed(String),
    #[error("knowledge configuration error: {0}")]
    Configuration(String),
}

#[async_trait]
pub trait KnowledgeIndex: Send + Sync {
    async fn search(
        &self,
        query: &str,
        namespace: Namespace,
        top_k: usize,
    ) -> Result<Vec<Snippet>, RetrievalError>;
}

// ---------------------------------------------------------------------------
// Live HTTP index
// ---------------------------------------------------------------------------

pub struct HttpKnowledgeIndex {
    http: reqwest::Client,
    endpoint: String,
    api_key: Option<SecretString>,
    index: String,
}

impl HttpKnowledgeIndex {
    pub fn from_config(config: &KnowledgeConfig) -> Result<Self, RetrievalError> {
        let endpoint = config.endpoint.clone().ok_or_else(|| {
            RetrievalError::Configuration("live knowledge mode requires an endpoint".to_string())
        })?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|error| RetrievalError::Configuration(error.to_string()))?;

        Ok(Self { http, endpoint, api_key: config.api_key.clone(), index: config.index.clone() })
    }
}

#[derive(Serialize)]
struct IndexQueryRequest<'a> {
    query: &'a str,
    namespace: &'a str,
    top_k: usize,
}

#[derive(Deserialize)]
struct IndexQueryResponse {
    matches: Vec<IndexMatch>,
}

#[derive(Deserialize)]
struct IndexMatch {
    text: String,
    #[serde(default)]
    metadata: std::collections::BTreeMap<String, String>,
}

#[async_trait]
impl KnowledgeIndex for HttpKnowledgeIndex {
    async fn search(
        &self,
        query: &str,
        namespace: Namespace,
        top_k: usize,
    ) -> Result<Vec<Snippet>, RetrievalError> {
        let url = format!(
            "{}/indexes/{}/query",
            self.endpoint.trim_end_matches('/'),
            self.index
        );

        let mut request = self.http.post(&url).json(&IndexQueryRequest {
            query,
            namespace: namespace.as_str(),
            top_k,
        });
        if let Some(api_key) = &self.api_key {
            request = request.header("api-key", api_key.expose_secret());
        }

        let response = request
            .send()
            .await
            .map_err(|error| RetrievalError::Unreachable(error.to_string()))?
            .error_for_status()
            .map_err(|error| RetrievalError::Unreachable(error.to_string()))?;

        let payload: IndexQueryResponse = response
            .json()
            .await
            .map_err(|error| RetrievalError::Malformed(error.to_string()))?;

        Ok(payload
            .matches
            .into_iter()
            .take(top_k)
            .map(|entry| Snippet { body: entry.text, metadata: entry.metadata })
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Deterministic stub index
// ---------------------------------------------------------------------------

/// Canned per-namespace snippets, filtered by simple keyword overlap with the
/// query. Falls back to the unfiltered canned set when nothing overlaps, so a
/// responder always has grounding context.
#[derive(Clone, Debug, Default)]
pub struct StubKnowledgeIndex;

impl StubKnowledgeIndex {
    pub fn canned(namespace: Namespace) -> Vec<Snippet> {
        match namespace {
            Namespace::Products => vec![
                Snippet::new(
                    "Mira sanitary pads are designed with a wider back for leak-proof nights. \
                     They are ultra soft and rash-free.",
                )
                .with_metadata("name", "Mira Sanitary Pads")
                .with_metadata("price", "affordable"),
                Snippet::new(
                    "Mira cramp comfort heat patches provide up to 8 hours of relief from \
                     period pain without any medication.",
                )
                .with_metadata("name", "Cramp Comfort Patches")
                .with_metadata("price", "premium"),
                Snippet::new(
                    "Mira intimate wash is balanced for vaginal pH and contains no harsh \
                     chemicals.",
                )
                .with_metadata("name", "Intimate Wash")
                .with_metadata("price", "standard"),
            ],
            Namespace::Education => vec![
                Snippet::new(
                    "Period blood color can vary from bright red to dark brown. Brown blood \
                     is usually just older blood oxidizing.",
                )
                .with_metadata("topic", "health"),
                Snippet::new(
                    "Irregular periods linked to PCOS affect about 1 in 5 women. Symptoms \
                     include weight gain, acne, and missed periods.",
                )
                .with_metadata("topic", "pcos"),
                Snippet::new(
                    "Menstrual hygiene matters: change pads every 4 to 6 hours to prevent \
                     infection and odor.",
                )
                .with_metadata("topic", "hygiene"),
            ],
            Namespace::Reassurance => vec![
                Snippet::new(
                    "It is completely normal to feel tired and emotional during your period. \
                     Your body is doing hard work.",
                )
                .with_metadata("tone", "supportive"),
                Snippet::new(
                    "You are not alone in feeling anxious about leaks. It happens to almost \
                     everyone at some point.",
                )
                .with_metadata("tone", "validating"),
            ],
        }
    }

    fn filter_by_overlap(query: &str, candidates: Vec<Snippet>) -> Vec<Snippet> {
        let folded_query = query.to_lowercase();
        let words: Vec<&str> = folded_query.split_whitespace().collect();

        let matched: Vec<Snippet> = candidates
            .iter()
            .filter(|snippet| {
                let folded_body = snippet.body.to_lowercase();
                words.iter().any(|word| folded_body.contains(word))
            })
            .cloned()
            .collect();

        if matched.is_empty() {
            candidates
        } else {
            matched
        }
    }
}

#[async_trait]
impl KnowledgeIndex for StubKnowledgeIndex {
    async fn search(
        &self,
        query: &str,
        namespace: Namespace,
        top_k: usize,
    ) -> Result<Vec<Snippet>, RetrievalError> {
        let mut results = Self::filter_by_overlap(query, Self::canned(namespace));
        results.truncate(top_k);
        Ok(results)
    }
}

// ---------------------------------------------------------------------------
// Retriever boundary
// ---------------------------------------------------------------------------

/// The retrieval boundary the responders call. Owns the degraded-mode rule:
/// a primary failure falls back to canned stub results for that call only.
pub struct KnowledgeRetriever {
    primary: Arc<dyn KnowledgeIndex>,
    stub: StubKnowledgeIndex,
}

impl KnowledgeRetriever {
    pub fn new(primary: Arc<dyn KnowledgeIndex>) -> Self {
        Self { primary, stub: StubKnowledgeIndex }
    }

    pub fn stub() -> Self {
        Self::new(Arc::new(StubKnowledgeIndex))
    }

    pub fn from_config(config: &KnowledgeConfig) -> Result<Self, RetrievalError> {
        match config.mode {
            KnowledgeMode::Live => {
                Ok(Self::new(Arc::new(HttpKnowledgeIndex::from_config(config)?)))
            }
            KnowledgeMode::Stub => Ok(Self::stub()),
        }
    }

    pub async fn search(&self, query: &str, namespace: Namespace, top_k: usize) -> Vec<Snippet> {
        match self.primary.search(query, namespace, top_k).await {
            Ok(snippets) => snippets,
            Err(error) => {
                warn!(
                    event_name = "knowledge.search.degraded",
                    namespace = namespace.as_str(),
                    error = %error,
                    "live knowledge search failed; serving canned snippets"
                );
                self.stub
                    .search(query, namespace, top_k)
                    .await
                    .unwrap_or_default()
            }
        }
    }
}
