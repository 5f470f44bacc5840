//! Agent runtime - classification, retrieval-grounded generation, and the
//! query pipeline.
//!
//! This crate is the "brain" of the mira system:
//! - Labels incoming customer queries with an LLM (`classifier`)
//! - Routes each query to one of three persona responders (`responders`)
//! - Grounds responses in per-namespace knowledge snippets (`retrieval`)
//! - Walks every response through tone and safety validation (`orchestrator`)
//!
//! # Architecture
//!
//! One request follows a fixed pipeline:
//! 1. **Classification** (`classifier`) - Parse NL → structured `Classification`
//! 2. **Dispatch** (`orchestrator`) - Route to a `Responder` by primary agent
//! 3. **Generation** (`responders`) - Retrieve snippets, render persona prompt,
//!    call the model once
//! 4. **Validation** - Tone then safety rules from `mira-core`
//! 5. **Insight Extraction** - Analytics signals bundled into the result
//!
//! # Key Types
//!
//! - `Orchestrator` - Main pipeline driver (see `orchestrator` module)
//! - `LlmClient` - Pluggable trait for OpenAI/Anthropic/Ollama
//! - `KnowledgeRetriever` - Retrieval boundary with stub degradation
//!
//! # Safety Principle
//!
//! The LLM is strictly a generator. It never decides what is safe to surface;
//! the deterministic rule tables in `mira-core` always have the last word.

pub mod classifier;
pub mod llm;
pub mod orchestrator;
pub mod prompts;
pub mod responders;
pub mod retrieval;

pub use classifier::QueryClassifier;
pub use llm::{build_client, LlmClient, LlmError};
pub use orchestrator::Orchestrator;
pub use prompts::PromptLibrary;
pub use responders::{
    EducationResponder, GenerationError, ProductResponder, ReassuranceResponder, Responder,
};
pub use retrieval::{KnowledgeIndex, KnowledgeRetriever, RetrievalError, StubKnowledgeIndex};
