//! Conversation runtime for the showroom assistant.
//!
//! Every turn runs the same constrained loop:
//! 1. **Guardrails** (`guardrails`) - redirect off-topic or unrelated-product input
//! 2. **Slot filling** (`conversation`) - extract preferences and ask for the next one
//! 3. **Recommendation** - catalog search, ranking and templated replies
//! 4. **Fallback** (`llm`) - only for turns nothing above can answer
//!
//! # Key Types
//!
//! - `AgentRuntime` - session registry plus turn engine (see `runtime` module)
//! - `LlmClient` - pluggable generative backend
//! - `TopicGuard` - keyword screens for input and generated text
//!
//! The model never decides which cars match or how they rank. Those come from
//! the catalog and the deterministic ranker in `showroom-core`.

pub mod conversation;
pub mod guardrails;
pub mod llm;
pub mod runtime;
pub mod sessions;

pub use conversation::{ConversationEngine, EngineSettings, TurnReply, TurnRoute};
pub use guardrails::{GuardVerdict, TopicGuard};
pub use llm::{client_from_config, LlmClient, OllamaClient, UnavailableLlm};
pub use runtime::{AgentRuntime, TurnOutcome};
pub use sessions::SessionStore;
