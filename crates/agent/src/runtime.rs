use std::sync::Arc;
use std::time::Instant;

use showroom_core::config::AppConfig;
use showroom_core::dialogue::{system_prompt, DialogueStage, SessionSettings};
use showroom_core::CatalogStore;
use tracing::info;

use crate::conversation::{ConversationEngine, EngineSettings, TurnRoute};
use crate::llm::LlmClient;
use crate::sessions::SessionStore;

/// Result of one turn as seen by the transport layers.
#[derive(Clone, Debug, PartialEq)]
pub struct TurnOutcome {
    pub reply: String,
    pub route: TurnRoute,
    pub stage: DialogueStage,
}

/// Owns the turn engine and every live session. Shared by the HTTP server and
/// the interactive CLI.
pub struct AgentRuntime {
    engine: ConversationEngine,
    sessions: SessionStore,
}

impl AgentRuntime {
    pub fn new(engine: ConversationEngine, sessions: SessionStore) -> Self {
        Self { engine, sessions }
    }

    pub fn from_config(
        config: &AppConfig,
        catalog: Arc<dyn CatalogStore>,
        llm: Arc<dyn LlmClient>,
    ) -> Self {
        let session_settings = SessionSettings {
            system_prompt: system_prompt(&config.dialogue.brand),
            transcript_limit: config.dialogue.transcript_limit,
            recommendation_limit: config.dialogue.recommendation_limit,
        };
        Self::new(
            ConversationEngine::new(catalog, llm, EngineSettings::from(config)),
            SessionStore::new(session_settings),
        )
    }

    pub fn brand(&self) -> &str {
        &self.engine.settings().brand
    }

    /// Runs one buyer turn. Turns on the same session are serialised.
    pub async fn process_turn(&self, session_id: &str, text: &str) -> TurnOutcome {
        let started = Instant::now();
        let session = self.sessions.get_or_create(session_id).await;
        let mut session = session.lock().await;

        let reply = self.engine.respond(&mut session, text).await;
        let stage = session.stage();
        info!(
            event_name = "agent.turn.completed",
            correlation_id = %session_id,
            route = reply.route.as_str(),
            stage = ?stage,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "turn handled"
        );

        TurnOutcome { reply: reply.text, route: reply.route, stage }
    }

    pub async fn reset_session(&self, session_id: &str) -> String {
        let existed = self.sessions.reset(session_id).await;
        info!(
            event_name = "agent.session.reset",
            correlation_id = %session_id,
            existed,
            "session reset"
        );
        "Conversation reset successfully!".to_string()
    }

    pub async fn end_session(&self, session_id: &str) -> String {
        self.sessions.remove(session_id).await;
        info!(event_name = "agent.session.ended", correlation_id = %session_id, "session ended");
        format!("Thanks for visiting {}! Have a wonderful day ahead! 👋", self.brand())
    }

    pub async fn has_session(&self, session_id: &str) -> bool {
        self.sessions.get(session_id).await.is_some()
    }

    pub async fn active_sessions(&self) -> usize {
        self.sessions.len().await
    }
}
