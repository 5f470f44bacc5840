//! The query pipeline: classify, dispatch, tone-check, safety-check, extract.
//!
//! Each request walks the stages strictly in order. The only error callers can
//! observe is an empty query; everything downstream of validation degrades to
//! a well-formed result bundle instead of an `Err`.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use mira_core::errors::DomainError;
use mira_core::{
    AgentKind, ClassificationOutcome, InsightExtractor, PipelineOutcome, PipelineStage,
    SafetyPolicy, SafetyValidator, TonePolicy, ToneValidator, UserContext,
};

use crate::classifier::QueryClassifier;
use crate::llm::LlmClient;
use crate::prompts::PromptLibrary;
use crate::responders::{
    EducationResponder, ProductResponder, ReassuranceResponder, Responder,
};
use crate::retrieval::KnowledgeRetriever;

pub struct Orchestrator {
    classifier: QueryClassifier,
    registry: BTreeMap<AgentKind, Arc<dyn Responder>>,
    fallback: Arc<dyn Responder>,
    tone: ToneValidator,
    safety: SafetyValidator,
    insights: InsightExtractor,
}

impl Orchestrator {
    /// Wire the standard three-responder registry. The reassurance responder
    /// doubles as the dispatch fallback for any kind without a handler.
    pub fn new(
        llm: Arc<dyn LlmClient>,
        retriever: Arc<KnowledgeRetriever>,
        prompts: Arc<PromptLibrary>,
    ) -> Self {
        let reassurance: Arc<dyn Responder> = Arc::new(ReassuranceResponder::new(
            retriever.clone(),
            llm.clone(),
            prompts.clone(),
        ));

        let mut registry: BTreeMap<AgentKind, Arc<dyn Responder>> = BTreeMap::new();
        registry.insert(
            AgentKind::Product,
            Arc::new(ProductResponder::new(retriever.clone(), llm.clone(), prompts.clone())),
        );
        registry.insert(
            AgentKind::Education,
            Arc::new(EducationResponder::new(retriever, llm.clone(), prompts)),
        );
        registry.insert(AgentKind::Reassurance, reassurance.clone());

        Self::with_registry(QueryClassifier::new(llm), registry, reassurance)
    }

    pub fn with_registry(
        classifier: QueryClassifier,
        registry: BTreeMap<AgentKind, Arc<dyn Responder>>,
        fallback: Arc<dyn Responder>,
    ) -> Self {
        Self {
            classifier,
            registry,
            fallback,
            tone: ToneValidator::default(),
            safety: SafetyValidator::default(),
            insights: InsightExtractor::default(),
        }
    }

    /// Swap in deployment-specific tone and safety policies. The defaults
    /// carry the shipped rule tables; this is the hook for tightening them.
    pub fn with_policies(mut self, tone: TonePolicy, safety: SafetyPolicy) -> Self {
        self.tone = ToneValidator::new(tone);
        self.safety = SafetyValidator::new(safety);
        self
    }

    /// Run one query through the full pipeline.
    ///
    /// `Err` only for an empty query. A generation failure resolves to a
    /// well-formed failed bundle carrying the fixed apology text.
    pub async fn process_query(
        &self,
        query: &str,
        context: &UserContext,
    ) -> Result<PipelineOutcome, DomainError> {
        if query.trim().is_empty() {
            return Err(DomainError::EmptyQuery);
        }

        debug!(
            event_name = "pipeline.stage",
            stage = PipelineStage::Classifying.as_str(),
        );
        let classification = self.classifier.classify(query).await;

        debug!(
            event_name = "pipeline.stage",
            stage = PipelineStage::Dispatching.as_str(),
            primary_agent = classification.primary_agent.as_str(),
        );
        let responder = self
            .registry
            .get(&classification.primary_agent)
            .unwrap_or(&self.fallback);

        let raw_response = match responder.handle(query, context).await {
            Ok(response) => response,
            Err(error) => {
                warn!(
                    event_name = "pipeline.generation_failed",
                    primary_agent = responder.kind().as_str(),
                    error = %error,
                    "responder failed; returning apology bundle"
                );
                return Ok(PipelineOutcome::failed(error.to_string(), Utc::now()));
            }
        };

        debug!(
            event_name = "pipeline.stage",
            stage = PipelineStage::ToneCheck.as_str(),
        );
        let toned = self.tone.validate(&raw_response, &classification);

        debug!(
            event_name = "pipeline.stage",
            stage = PipelineStage::SafetyCheck.as_str(),
        );
        let verdict = self.safety.validate(&toned, query);
        if !verdict.is_safe {
            info!(
                event_name = "pipeline.safety_rejection",
                reason = verdict.reason.as_deref().unwrap_or("unspecified"),
            );
        }

        debug!(
            event_name = "pipeline.stage",
            stage = PipelineStage::InsightExtraction.as_str(),
        );
        let insights =
            self.insights
                .extract(query, &verdict.effective_response, &classification, context);

        info!(
            event_name = "pipeline.done",
            primary_agent = classification.primary_agent.as_str(),
            safe = verdict.is_safe,
        );

        Ok(PipelineOutcome {
            response: verdict.effective_response,
            classification: ClassificationOutcome::Classified(classification),
            insights,
            timestamp: Utc::now(),
        })
    }
}
