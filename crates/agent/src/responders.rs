//! The three specialized response generators.
//!
//! Each responder retrieves from its own fixed namespace, renders its persona
//! template, and issues exactly one generation call. Generation failures
//! propagate; the orchestrator owns the degraded path.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use mira_core::{AgentKind, Namespace, Snippet, UserContext};

use crate::llm::{LlmClient, LlmError};
use crate::prompts::PromptLibrary;
use crate::retrieval::KnowledgeRetriever;

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error(transparent)]
    Llm(#[from] LlmError),
    #[error("prompt template rendering failed: {0}")]
    Template(#[from] tera::Error),
}

#[async_trait]
pub trait Responder: Send + Sync {
    fn kind(&self) -> AgentKind;
    async fn handle(&self, query: &str, context: &UserContext)
        -> Result<String, GenerationError>;
}

struct ResponderDeps {
    retriever: Arc<KnowledgeRetriever>,
    llm: Arc<dyn LlmClient>,
    prompts: Arc<PromptLibrary>,
}

impl ResponderDeps {
    async fn generate(
        &self,
        kind: AgentKind,
        namespace: Namespace,
        top_k: usize,
        system_instruction: &str,
        temperature: f32,
        query: &str,
        context_block: impl Fn(&[Snippet]) -> String,
        stage_hint: Option<&str>,
    ) -> Result<String, GenerationError> {
        let snippets = self.retriever.search(query, namespace, top_k).await;
        let block = context_block(&snippets);
        let prompt = self.prompts.render(kind, query, &block, stage_hint)?;
        let response = self.llm.generate(system_instruction, &prompt, temperature).await?;
        Ok(response)
    }
}

// ---------------------------------------------------------------------------
// Product
// ---------------------------------------------------------------------------

pub struct ProductResponder {
    deps: ResponderDeps,
}

impl ProductResponder {
    const SYSTEM: &'static str = "You are a helpful product expert for Mira.";
    const TEMPERATURE: f32 = 0.5;
    const TOP_K: usize = 3;

    pub fn new(
        retriever: Arc<KnowledgeRetriever>,
        llm: Arc<dyn LlmClient>,
        prompts: Arc<PromptLibrary>,
    ) -> Self {
        Self { deps: ResponderDeps { retriever, llm, prompts } }
    }
}

#[async_trait]
impl Responder for ProductResponder {
    fn kind(&self) -> AgentKind {
        AgentKind::Product
    }

    async fn handle(
        &self,
        query: &str,
        _context: &UserContext,
    ) -> Result<String, GenerationError> {
        self.deps
            .generate(
                AgentKind::Product,
                Namespace::Products,
                Self::TOP_K,
                Self::SYSTEM,
                Self::TEMPERATURE,
                query,
                |snippets| {
                    snippets
                        .iter()
                        .map(|snippet| {
                            let name = snippet
                                .metadata
                                .get("name")
                                .map(String::as_str)
                                .unwrap_or("Mira product");
                            format!("Product: {name}\nDetails: {}", snippet.body)
                        })
                        .collect::<Vec<_>>()
                        .join("\n\n")
                },
                None,
            )
            .await
    }
}

// ---------------------------------------------------------------------------
// Education
// ---------------------------------------------------------------------------

pub struct EducationResponder {
    deps: ResponderDeps,
}

impl EducationResponder {
    const SYSTEM: &'static str = "You are a knowledgeable, trustworthy health educator.";
    // Low temperature for factual answers.
    const TEMPERATURE: f32 = 0.3;
    const TOP_K: usize = 2;

    pub fn new(
        retriever: Arc<KnowledgeRetriever>,
        llm: Arc<dyn LlmClient>,
        prompts: Arc<PromptLibrary>,
    ) -> Self {
        Self { deps: ResponderDeps { retriever, llm, prompts } }
    }
}

#[async_trait]
impl Responder for EducationResponder {
    fn kind(&self) -> AgentKind {
        AgentKind::Education
    }

    async fn handle(
        &self,
        query: &str,
        _context: &UserContext,
    ) -> Result<String, GenerationError> {
        self.deps
            .generate(
                AgentKind::Education,
                Namespace::Education,
                Self::TOP_K,
                Self::SYSTEM,
                Self::TEMPERATURE,
                query,
                join_bodies,
                None,
            )
            .await
    }
}

// ---------------------------------------------------------------------------
// Reassurance
// ---------------------------------------------------------------------------

pub struct ReassuranceResponder {
    deps: ResponderDeps,
}

impl ReassuranceResponder {
    const SYSTEM: &'static str = "You are a compassionate, empathetic friend who listens.";
    // Higher temperature for expressive empathy.
    const TEMPERATURE: f32 = 0.8;
    const TOP_K: usize = 2;

    pub fn new(
        retriever: Arc<KnowledgeRetriever>,
        llm: Arc<dyn LlmClient>,
        prompts: Arc<PromptLibrary>,
    ) -> Self {
        Self { deps: ResponderDeps { retriever, llm, prompts } }
    }
}

#[async_trait]
impl Responder for ReassuranceResponder {
    fn kind(&self) -> AgentKind {
        AgentKind::Reassurance
    }

    async fn handle(
        &self,
        query: &str,
        context: &UserContext,
    ) -> Result<String, GenerationError> {
        self.deps
            .generate(
                AgentKind::Reassurance,
                Namespace::Reassurance,
                Self::TOP_K,
                Self::SYSTEM,
                Self::TEMPERATURE,
                query,
                join_bodies,
                context.get_str("conversation_stage"),
            )
            .await
    }
}

fn join_bodies(snippets: &[Snippet]) -> String {
    snippets.iter().map(|snippet| snippet.body.as_str()).collect::<Vec<_>>().join("\n\n")
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use mira_core::{AgentKind, UserContext};

    use crate::llm::{LlmClient, LlmError};
    use crate::prompts::PromptLibrary;
    use crate::retrieval::KnowledgeRetriever;

    use super::{
        EducationResponder, ProductResponder, ReassuranceResponder, Responder,
    };

    #[derive(Clone, Debug, PartialEq)]
    struct RecordedCall {
        system: String,
        prompt: String,
        temperature: f32,
    }

    struct RecordingLlm {
        calls: Mutex<Vec<RecordedCall>>,
        reply: String,
    }

    impl RecordingLlm {
        fn new(reply: &str) -> Self {
            Self { calls: Mutex::new(Vec::new()), reply: reply.to_string() }
        }

        fn last_call(&self) -> RecordedCall {
            self.calls.lock().expect("calls lock").last().cloned().expect("a call was made")
        }
    }

    #[async_trait]
    impl LlmClient for RecordingLlm {
        async fn generate(
            &self,
            system_instruction: &str,
            user_prompt: &str,
            temperature: f32,
        ) -> Result<String, LlmError> {
            self.calls.lock().expect("calls lock").push(RecordedCall {
                system: system_instruction.to_string(),
                prompt: user_prompt.to_string(),
                temperature,
            });
            Ok(self.reply.clone())
        }
    }

    fn fixture(reply: &str) -> (Arc<RecordingLlm>, Arc<KnowledgeRetriever>, Arc<PromptLibrary>) {
        (
            Arc::new(RecordingLlm::new(reply)),
            Arc::new(KnowledgeRetriever::stub()),
            Arc::new(PromptLibrary::new().expect("templates compile")),
        )
    }

    #[tokio::test]
    async fn product_responder_grounds_prompt_in_product_snippets() {
        let (llm, retriever, prompts) = fixture("try the wider-back pads");
        let responder = ProductResponder::new(retriever, llm.clone(), prompts);

        let response = responder
            .handle("which pads are best for leak-proof nights?", &UserContext::new())
            .await
            .expect("generation should succeed");

        assert_eq!(response, "try the wider-back pads");
        assert_eq!(responder.kind(), AgentKind::Product);

        let call = llm.last_call();
        assert_eq!(call.system, "You are a helpful product expert for Mira.");
        assert!((call.temperature - 0.5).abs() < f32::EPSILON);
        assert!(call.prompt.contains("Product: Mira Sanitary Pads"));
        assert!(call.prompt.contains("which pads are best for leak-proof nights?"));
    }

    #[tokio::test]
    async fn education_responder_uses_low_temperature_and_education_namespace() {
        let (llm, retriever, prompts) = fixture("brown blood is usually older blood");
        let responder = EducationResponder::new(retriever, llm.clone(), prompts);

        responder
            .handle("why is my period blood brown?", &UserContext::new())
            .await
            .expect("generation should succeed");

        let call = llm.last_call();
        assert!((call.temperature - 0.3).abs() < f32::EPSILON);
        assert!(call.prompt.contains("Period blood color can vary"));
        assert!(!call.prompt.contains("Product:"));
    }

    #[tokio::test]
    async fn reassurance_responder_threads_conversation_stage_from_context() {
        let (llm, retriever, prompts) = fixture("I hear you");
        let responder = ReassuranceResponder::new(retriever, llm.clone(), prompts);

        let context = UserContext::new().with("conversation_stage", "retention");
        responder
            .handle("I feel so anxious about leaks", &context)
            .await
            .expect("generation should succeed");

        let call = llm.last_call();
        assert!((call.temperature - 0.8).abs() < f32::EPSILON);
        assert!(call.prompt.contains("CONVERSATION STAGE: retention"));
        assert!(call.prompt.contains("You are not alone in feeling anxious about leaks."));
    }
}
