use std::sync::Arc;
use std::time::Duration;

use showroom_core::config::AppConfig;
use showroom_core::dialogue::{ChatMessage, DialogueSession, MergeOutcome, Slot};
use showroom_core::errors::{ApplicationError, DomainError};
use showroom_core::{
    CandidateRanker, CatalogItem, CatalogQuery, CatalogStore, EntityExtractor, ListingStyle,
    PitchStyle, ResponseComposer,
};
use tokio::sync::OnceCell;
use tracing::{debug, warn};

use crate::guardrails::{GuardVerdict, TopicGuard};
use crate::llm::LlmClient;

const GREETINGS: &[&str] = &["hi", "hello", "hey"];

/// Phrases asking the assistant to pick one car from the last listing.
const RECOMMENDATION_TRIGGERS: &[&str] = &[
    "which one",
    "recommend",
    "best",
    "suggest",
    "good one",
    "value",
    "better",
    "better option",
    "which is good",
    "top pick",
    "what should",
    "what would you",
    "choose",
    "go with",
    "prefer",
    "opinion",
    "which car",
];

const RECAP_PHRASES: &[&str] = &["options", "show again", "what were"];

/// Minimum similarity for a misspelt model name ("swft") to count.
pub const MODEL_MATCH_CUTOFF: f64 = 0.7;

const NO_MATCH_MESSAGE: &str = "Hmm, I couldn't find a perfect match. You might want to adjust your preferences a bit like budget or fuel type.";

#[derive(Clone, Debug, PartialEq)]
pub struct EngineSettings {
    pub brand: String,
    pub budget_flex_pct: u32,
    pub recommendation_limit: usize,
    pub fallback_timeout: Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            brand: "Maruti Suzuki".to_string(),
            budget_flex_pct: 10,
            recommendation_limit: 6,
            fallback_timeout: Duration::from_secs(30),
        }
    }
}

impl From<&AppConfig> for EngineSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            brand: config.dialogue.brand.clone(),
            budget_flex_pct: config.dialogue.budget_flex_pct,
            recommendation_limit: config.dialogue.recommendation_limit,
            fallback_timeout: Duration::from_secs(config.llm.timeout_secs.max(1)),
        }
    }
}

/// Which branch of the turn pipeline produced a reply.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TurnRoute {
    Guarded(GuardVerdict),
    Greeting,
    SlotPrompt,
    Recommendations,
    NoMatches,
    TopPick,
    Recap,
    ModelShowcase,
    Fallback,
    FallbackBlocked,
    FallbackUnavailable,
    StoreUnavailable,
}

impl TurnRoute {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Guarded(_) => "guarded",
            Self::Greeting => "greeting",
            Self::SlotPrompt => "slot_prompt",
            Self::Recommendations => "recommendations",
            Self::NoMatches => "no_matches",
            Self::TopPick => "top_pick",
            Self::Recap => "recap",
            Self::ModelShowcase => "model_showcase",
            Self::Fallback => "fallback",
            Self::FallbackBlocked => "fallback_blocked",
            Self::FallbackUnavailable => "fallback_unavailable",
            Self::StoreUnavailable => "store_unavailable",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TurnReply {
    pub text: String,
    pub route: TurnRoute,
}

impl TurnReply {
    fn new(text: impl Into<String>, route: TurnRoute) -> Self {
        Self { text: text.into(), route }
    }
}

/// Deterministic turn pipeline: guard, slot filling, ranking, model lookup,
/// and only then the generative fallback.
pub struct ConversationEngine {
    catalog: Arc<dyn CatalogStore>,
    llm: Arc<dyn LlmClient>,
    extractor: EntityExtractor,
    guard: TopicGuard,
    ranker: CandidateRanker,
    composer: ResponseComposer,
    settings: EngineSettings,
    model_names: OnceCell<Vec<String>>,
}

impl ConversationEngine {
    pub fn new(
        catalog: Arc<dyn CatalogStore>,
        llm: Arc<dyn LlmClient>,
        settings: EngineSettings,
    ) -> Self {
        Self {
            catalog,
            llm,
            extractor: EntityExtractor::new(),
            guard: TopicGuard::new(settings.brand.clone()),
            ranker: CandidateRanker::new(),
            composer: ResponseComposer::new(settings.brand.clone()),
            settings,
            model_names: OnceCell::new(),
        }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Produces the reply for one buyer utterance. Never fails: store and
    /// fallback errors become fixed apology messages and leave the session
    /// as it was before the turn.
    pub async fn respond(&self, session: &mut DialogueSession, utterance: &str) -> TurnReply {
        let text = utterance.trim();
        if text.is_empty() {
            return match session.next_prompt() {
                Some(prompt) => TurnReply::new(prompt, TurnRoute::SlotPrompt),
                None => TurnReply::new(
                    self.guard.input_redirect(GuardVerdict::OffTopic).unwrap_or_default(),
                    TurnRoute::SlotPrompt,
                ),
            };
        }

        let verdict = self.guard.screen_input(text);
        if let Some(redirect) = self.guard.input_redirect(verdict) {
            debug!(
                event_name = "conversation.input.blocked",
                reason = verdict.reason_code(),
                "buyer input redirected"
            );
            return TurnReply::new(redirect, TurnRoute::Guarded(verdict));
        }

        let lowered = text.to_lowercase();
        if session.is_complete() {
            self.respond_ready(session, text, &lowered).await
        } else {
            self.collect_slots(session, text, &lowered).await
        }
    }

    async fn collect_slots(
        &self,
        session: &mut DialogueSession,
        text: &str,
        lowered: &str,
    ) -> TurnReply {
        let awaiting = session.next_slot();
        let extracted = self.extractor.extract_for_slot(text, awaiting);

        if extracted.is_empty() {
            if session.profile().is_empty() && is_greeting(lowered) {
                return TurnReply::new(self.greeting(), TurnRoute::Greeting);
            }
            return TurnReply::new(
                session.next_prompt().unwrap_or(Slot::FamilySize.prompt()),
                TurnRoute::SlotPrompt,
            );
        }

        let mut draft = session.clone();
        let outcome = draft.merge(&extracted);
        log_conflicts(&outcome);

        if !draft.is_complete() {
            let prompt = draft.next_prompt().unwrap_or_default();
            let reply = match acknowledgement(&outcome, &draft) {
                Some(ack) => format!("{ack} {prompt}"),
                None => prompt.to_string(),
            };
            *session = draft;
            return TurnReply::new(reply, TurnRoute::SlotPrompt);
        }

        let items = match self.search_profile(&draft).await {
            Ok(items) => items,
            Err(error) => return self.store_failure(error),
        };

        let reply = if items.is_empty() {
            draft.clear_recommendations();
            TurnReply::new(NO_MATCH_MESSAGE, TurnRoute::NoMatches)
        } else {
            draft.remember_recommendations(&items);
            TurnReply::new(
                self.composer.listing(draft.recommended(), ListingStyle::Recommendations),
                TurnRoute::Recommendations,
            )
        };
        *session = draft;
        reply
    }

    async fn respond_ready(
        &self,
        session: &mut DialogueSession,
        text: &str,
        lowered: &str,
    ) -> TurnReply {
        if contains_any(lowered, RECOMMENDATION_TRIGGERS) {
            return self.pick_top(session).await;
        }

        if contains_any(lowered, RECAP_PHRASES) && !session.recommended().is_empty() {
            return TurnReply::new(
                self.composer.listing(session.recommended(), ListingStyle::Recap),
                TurnRoute::Recap,
            );
        }

        match self.lookup_model(lowered).await {
            Ok(Some(item)) => {
                return TurnReply::new(
                    self.composer.pitch(&item, PitchStyle::Showcase),
                    TurnRoute::ModelShowcase,
                )
            }
            Ok(None) => {}
            Err(error) => return self.store_failure(error),
        }

        self.fallback(session, text).await
    }

    /// Ranks the remembered listing, or a fresh search when nothing is
    /// remembered, and pitches the winner. The listing is forgotten afterwards.
    async fn pick_top(&self, session: &mut DialogueSession) -> TurnReply {
        let candidates = if session.recommended().is_empty() {
            match self.search_profile(session).await {
                Ok(items) => items,
                Err(error) => return self.store_failure(error),
            }
        } else {
            session.recommended().to_vec()
        };

        let Some(top) = self.ranker.top(&candidates, session.profile()) else {
            return TurnReply::new(NO_MATCH_MESSAGE, TurnRoute::NoMatches);
        };
        debug!(
            event_name = "conversation.ranking.top_pick",
            model = %top.item.model,
            score = top.score,
            candidates = candidates.len(),
            "top candidate selected"
        );

        session.clear_recommendations();
        TurnReply::new(self.composer.pitch(&top.item, PitchStyle::TopPick), TurnRoute::TopPick)
    }

    async fn search_profile(
        &self,
        session: &DialogueSession,
    ) -> Result<Vec<CatalogItem>, ApplicationError> {
        let query = CatalogQuery::from_profile(session.profile(), self.settings.budget_flex_pct)
            .with_limit(self.settings.recommendation_limit.max(1));
        Ok(self.catalog.find(&query).await?)
    }

    /// Resolves a model mention, then narrows to a trim when the words right
    /// after the model name match a variant ("swift zxi").
    async fn lookup_model(&self, lowered: &str) -> Result<Option<CatalogItem>, ApplicationError> {
        let fetched;
        // An empty catalog is not cached, so seeding after startup is picked up.
        let names: &[String] = match self.model_names.get() {
            Some(cached) => cached,
            None => {
                fetched = self.catalog.distinct_models().await?;
                if !fetched.is_empty() {
                    let _ = self.model_names.set(fetched.clone());
                }
                &fetched
            }
        };

        let Some(model) = match_model_name(lowered, names) else {
            return Ok(None);
        };

        if let Some(variant) = variant_hint(lowered, &model.to_lowercase()) {
            let query = CatalogQuery { variant: Some(variant), ..CatalogQuery::by_model(model) };
            if let Some(item) = self.catalog.find_one(&query).await? {
                return Ok(Some(item));
            }
        }
        Ok(self.catalog.find_one(&CatalogQuery::by_model(model)).await?)
    }

    async fn fallback(&self, session: &mut DialogueSession, text: &str) -> TurnReply {
        let history = session.transcript().history_with(ChatMessage::user(text));
        let completion =
            tokio::time::timeout(self.settings.fallback_timeout, self.llm.complete(&history)).await;

        let generated = match completion {
            Ok(Ok(generated)) if !generated.trim().is_empty() => generated.trim().to_string(),
            Ok(Ok(_)) => return self.fallback_failure("fallback returned an empty reply"),
            Ok(Err(error)) => return self.fallback_failure(&error.to_string()),
            Err(_) => return self.fallback_failure("fallback timed out"),
        };

        let verdict = self.guard.screen_generated(&generated);
        if let Some(redirect) = self.guard.generated_redirect(verdict) {
            debug!(
                event_name = "conversation.fallback.blocked",
                reason = verdict.reason_code(),
                "generated reply replaced"
            );
            return TurnReply::new(redirect, TurnRoute::FallbackBlocked);
        }

        session.record_exchange(text, generated.clone());
        TurnReply::new(generated, TurnRoute::Fallback)
    }

    fn greeting(&self) -> String {
        format!(
            "Hello! Welcome to {}. To help find your ideal car, how many people will usually be traveling with you?",
            self.settings.brand
        )
    }

    fn store_failure(&self, error: ApplicationError) -> TurnReply {
        warn!(event_name = "conversation.catalog.failed", error = %error, "catalog lookup failed");
        TurnReply::new(error.user_message(&self.settings.brand), TurnRoute::StoreUnavailable)
    }

    fn fallback_failure(&self, reason: &str) -> TurnReply {
        let error = ApplicationError::FallbackUnavailable(reason.to_string());
        warn!(event_name = "conversation.fallback.failed", error = %error, "fallback unavailable");
        TurnReply::new(error.user_message(&self.settings.brand), TurnRoute::FallbackUnavailable)
    }
}

fn acknowledgement(outcome: &MergeOutcome, session: &DialogueSession) -> Option<String> {
    match outcome.filled.first()? {
        Slot::FamilySize => session
            .profile()
            .family_size
            .map(|count| format!("Thanks! For {count} people, we have great options.")),
        Slot::FuelType => Some("Great choice!".to_string()),
        Slot::CarType => Some("Excellent!".to_string()),
        Slot::Budget => Some("Noted.".to_string()),
    }
}

fn log_conflicts(outcome: &MergeOutcome) {
    for conflict in &outcome.conflicts {
        let error = DomainError::from(conflict.clone());
        warn!(event_name = "conversation.merge.conflict", error = %error, "extracted value ignored");
    }
}

fn is_greeting(lowered: &str) -> bool {
    lowered.split(|ch: char| !ch.is_alphanumeric()).any(|word| GREETINGS.contains(&word))
}

fn contains_any(lowered: &str, phrases: &[&str]) -> bool {
    phrases.iter().any(|phrase| lowered.contains(phrase))
}

/// Exact mention first (longest name wins, so "Grand Vitara" beats "Vitara"),
/// then a close misspelling of the whole utterance.
fn match_model_name<'a>(lowered: &str, names: &'a [String]) -> Option<&'a str> {
    let exact = names
        .iter()
        .filter(|name| !name.trim().is_empty())
        .filter(|name| contains_phrase(lowered, &name.to_lowercase()))
        .max_by_key(|name| name.len());
    if let Some(name) = exact {
        return Some(name.as_str());
    }

    let utterance = lowered.split_whitespace().collect::<Vec<_>>().join(" ");
    names
        .iter()
        .map(|name| (name, similarity(&utterance, &name.to_lowercase())))
        .filter(|(_, ratio)| *ratio >= MODEL_MATCH_CUTOFF)
        .max_by(|left, right| left.1.total_cmp(&right.1))
        .map(|(name, _)| name.as_str())
}

/// `needle` occurs in `haystack` bounded by non-alphanumeric characters.
fn contains_phrase(haystack: &str, needle: &str) -> bool {
    phrase_end(haystack, needle).is_some()
}

/// Byte offset just past the first bounded occurrence of `needle`.
fn phrase_end(haystack: &str, needle: &str) -> Option<usize> {
    haystack.match_indices(needle).map(|(start, _)| (start, start + needle.len())).find_map(
        |(start, end)| {
            let before = haystack[..start].chars().next_back();
            let after = haystack[end..].chars().next();
            (!before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric))
                .then_some(end)
        },
    )
}

/// Whatever follows an exact model mention, e.g. "zxi" in "swift zxi?".
fn variant_hint(lowered: &str, model: &str) -> Option<String> {
    let end = phrase_end(lowered, model)?;
    let rest = lowered[end..].trim().trim_end_matches(['?', '.', '!', ',']).trim();
    (!rest.is_empty()).then(|| rest.to_string())
}

/// `1 - levenshtein / longer_length`, in `[0, 1]`.
fn similarity(left: &str, right: &str) -> f64 {
    let longest = left.chars().count().max(right.chars().count());
    if longest == 0 {
        return 1.0;
    }
    1.0 - levenshtein(left, right) as f64 / longest as f64
}

fn levenshtein(left: &str, right: &str) -> usize {
    let left = left.chars().collect::<Vec<_>>();
    let right = right.chars().collect::<Vec<_>>();
    if left.is_empty() {
        return right.len();
    }
    if right.is_empty() {
        return left.len();
    }

    let mut previous = (0..=right.len()).collect::<Vec<_>>();
    let mut current = vec![0; right.len() + 1];
    for (i, left_char) in left.iter().enumerate() {
        current[0] = i + 1;
        for (j, right_char) in right.iter().enumerate() {
            let cost = usize::from(left_char != right_char);
            current[j + 1] = (previous[j + 1] + 1).min(current[j] + 1).min(previous[j] + cost);
        }
        std::mem::swap(&mut previous, &mut current);
    }
    previous[right.len()]
}
