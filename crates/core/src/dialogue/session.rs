use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::dialogue::states::{DialogueStage, MergeConflict, MergeOutcome, Slot};
use crate::domain::profile::AttributeProfile;
use crate::domain::vehicle::CatalogItem;
use crate::extraction::ExtractedAttributes;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: ChatRole::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: ChatRole::Assistant, content: content.into() }
    }
}

/// Instructions given to the fallback model ahead of every transcript.
pub fn system_prompt(brand: &str) -> String {
    format!(
        "You are a {brand} sales assistant. ONLY discuss real cars, prices, and features. \
         Follow this workflow strictly:\n\
         1. Greet the customer\n\
         2. Ask about family size (seating needs)\n\
         3. Ask fuel preference (Petrol/Diesel/CNG)\n\
         4. Ask preferred car type (SUV/Sedan/Hatchback/MPV)\n\
         5. Ask budget range\n\
         6. Recommend suitable models\n\n\
         RULES:\n\
         - NEVER invent models, features, or prices\n\
         - NEVER discuss hypothetical scenarios\n\
         - All recommendations must be based on real {brand} models\n\
         - When asked for a recommendation, ALWAYS pick one specific model and justify your choice"
    )
}

/// Rolling fallback context: the system prompt plus the newest messages.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transcript {
    system_prompt: String,
    messages: VecDeque<ChatMessage>,
    limit: usize,
}

impl Transcript {
    pub fn new(system_prompt: impl Into<String>, limit: usize) -> Self {
        Self { system_prompt: system_prompt.into(), messages: VecDeque::new(), limit: limit.max(1) }
    }

    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push_back(message);
        while self.messages.len() > self.limit {
            self.messages.pop_front();
        }
    }

    /// Full history to send to the model, with `pending` appended but not
    /// recorded.
    pub fn history_with(&self, pending: ChatMessage) -> Vec<ChatMessage> {
        let mut history = Vec::with_capacity(self.messages.len() + 2);
        history.push(ChatMessage { role: ChatRole::System, content: self.system_prompt.clone() });
        history.extend(self.messages.iter().cloned());
        history.push(pending);
        history
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionSettings {
    pub system_prompt: String,
    pub transcript_limit: usize,
    pub recommendation_limit: usize,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            system_prompt: system_prompt("Maruti Suzuki"),
            transcript_limit: 20,
            recommendation_limit: 6,
        }
    }
}

/// One buyer's conversation: preference profile, the last listing shown, and
/// the fallback transcript.
#[derive(Clone, Debug, PartialEq)]
pub struct DialogueSession {
    profile: AttributeProfile,
    recommended: Vec<CatalogItem>,
    transcript: Transcript,
    recommendation_limit: usize,
}

impl DialogueSession {
    pub fn new(settings: &SessionSettings) -> Self {
        Self {
            profile: AttributeProfile::default(),
            recommended: Vec::new(),
            transcript: Transcript::new(settings.system_prompt.clone(), settings.transcript_limit),
            recommendation_limit: settings.recommendation_limit.max(1),
        }
    }

    pub fn profile(&self) -> &AttributeProfile {
        &self.profile
    }

    pub fn is_slot_filled(&self, slot: Slot) -> bool {
        match slot {
            Slot::FamilySize => self.profile.family_size.is_some(),
            Slot::FuelType => self.profile.fuel_type.is_some(),
            Slot::CarType => self.profile.car_type.is_some(),
            Slot::Budget => self.profile.has_budget(),
        }
    }

    pub fn next_slot(&self) -> Option<Slot> {
        Slot::ORDER.into_iter().find(|slot| !self.is_slot_filled(*slot))
    }

    pub fn is_complete(&self) -> bool {
        self.next_slot().is_none()
    }

    pub fn next_prompt(&self) -> Option<&'static str> {
        self.next_slot().map(|slot| slot.prompt())
    }

    pub fn stage(&self) -> DialogueStage {
        self.next_slot().map(|slot| slot.stage()).unwrap_or(DialogueStage::Ready)
    }

    /// First-write-wins merge. Absent fields never clear anything; bounds that
    /// would invert an already-set bound are dropped and reported.
    pub fn merge(&mut self, extracted: &ExtractedAttributes) -> MergeOutcome {
        let unmet_before =
            Slot::ORDER.into_iter().filter(|slot| !self.is_slot_filled(*slot)).collect::<Vec<_>>();
        let mut conflicts = Vec::new();
        let profile = &mut self.profile;

        fill(&mut profile.family_size, extracted.family_size);
        fill(&mut profile.fuel_type, extracted.fuel_type);
        fill(&mut profile.car_type, extracted.car_type);
        fill(&mut profile.drive_type, extracted.drive_type);
        fill(&mut profile.transmission, extracted.transmission);

        let (budget_min, budget_max) = ordered(extracted.budget_min, extracted.budget_max);
        if let Some((min, max)) =
            fill_bounds(&mut profile.budget_min, &mut profile.budget_max, budget_min, budget_max)
        {
            conflicts.push(MergeConflict::BudgetRange { min, max });
        }

        let (mileage_min, mileage_max) = ordered(extracted.mileage_min, extracted.mileage_max);
        if let Some((min, max)) = fill_bounds(
            &mut profile.mileage_min,
            &mut profile.mileage_max,
            mileage_min,
            mileage_max,
        ) {
            conflicts.push(MergeConflict::MileageRange { min, max });
        }

        let filled =
            unmet_before.into_iter().filter(|slot| self.is_slot_filled(*slot)).collect::<Vec<_>>();
        MergeOutcome { filled, conflicts }
    }

    pub fn reset(&mut self) {
        self.profile = AttributeProfile::default();
        self.recommended.clear();
        self.transcript.clear();
    }

    pub fn recommended(&self) -> &[CatalogItem] {
        &self.recommended
    }

    pub fn remember_recommendations(&mut self, items: &[CatalogItem]) {
        self.recommended = items.iter().take(self.recommendation_limit).cloned().collect();
    }

    pub fn clear_recommendations(&mut self) {
        self.recommended.clear();
    }

    pub fn recommendation_limit(&self) -> usize {
        self.recommendation_limit
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn record_exchange(&mut self, user: impl Into<String>, assistant: impl Into<String>) {
        self.transcript.push(ChatMessage::user(user));
        self.transcript.push(ChatMessage::assistant(assistant));
    }
}

fn fill<T>(slot: &mut Option<T>, value: Option<T>) {
    if slot.is_none() {
        *slot = value;
    }
}

fn ordered<T: PartialOrd>(min: Option<T>, max: Option<T>) -> (Option<T>, Option<T>) {
    match (min, max) {
        (Some(low), Some(high)) if low > high => (Some(high), Some(low)),
        other => other,
    }
}

/// Fills unset bounds; returns the rejected pair when a new bound would invert
/// an existing one.
fn fill_bounds<T: PartialOrd + Copy>(
    current_min: &mut Option<T>,
    current_max: &mut Option<T>,
    new_min: Option<T>,
    new_max: Option<T>,
) -> Option<(T, T)> {
    let mut rejected = None;

    if current_min.is_none() {
        if let Some(min) = new_min {
            match *current_max {
                Some(max) if min > max => rejected = Some((min, max)),
                _ => *current_min = Some(min),
            }
        }
    }

    if current_max.is_none() {
        if let Some(max) = new_max {
            match *current_min {
                Some(min) if max < min => rejected = Some((min, max)),
                _ => *current_max = Some(max),
            }
        }
    }

    rejected
}

#[cfg(test)]
mod tests {
    use crate::dialogue::states::{DialogueStage, MergeConflict, Slot};
    use crate::domain::profile::{CarType, FuelType, Transmission};
    use crate::domain::vehicle::CatalogItem;
    use crate::extraction::ExtractedAttributes;

    use super::{ChatRole, DialogueSession, SessionSettings};

    fn session() -> DialogueSession {
        DialogueSession::new(&SessionSettings::default())
    }

    #[test]
    fn prompts_follow_canonical_order() {
        let mut session = session();
        assert_eq!(session.next_prompt(), Some(Slot::FamilySize.prompt()));
        assert_eq!(session.stage(), DialogueStage::CollectingFamilySize);

        // Budget and car type arrive first; fuel is still asked before them.
        session.merge(&ExtractedAttributes {
            family_size: Some(4),
            car_type: Some(CarType::Sedan),
            budget_max: Some(700_000),
            ..ExtractedAttributes::default()
        });
        assert_eq!(session.next_slot(), Some(Slot::FuelType));
        assert_eq!(session.stage(), DialogueStage::CollectingFuel);

        session.merge(&ExtractedAttributes {
            fuel_type: Some(FuelType::Petrol),
            ..ExtractedAttributes::default()
        });
        assert!(session.is_complete());
        assert_eq!(session.next_prompt(), None);
        assert_eq!(session.stage(), DialogueStage::Ready);
    }

    #[test]
    fn merge_is_first_write_wins() {
        let mut session = session();
        let first = session.merge(&ExtractedAttributes {
            family_size: Some(5),
            fuel_type: Some(FuelType::Diesel),
            ..ExtractedAttributes::default()
        });
        assert_eq!(first.filled, vec![Slot::FamilySize, Slot::FuelType]);

        let second = session.merge(&ExtractedAttributes {
            family_size: Some(7),
            fuel_type: Some(FuelType::Petrol),
            ..ExtractedAttributes::default()
        });
        assert!(!second.filled_any());
        assert_eq!(session.profile().family_size, Some(5));

        session.merge(&ExtractedAttributes {
            transmission: Some(Transmission::Automatic),
            ..ExtractedAttributes::default()
        });
        session.merge(&ExtractedAttributes {
            transmission: Some(Transmission::Manual),
            ..ExtractedAttributes::default()
        });
        assert_eq!(session.profile().transmission, Some(Transmission::Automatic));
        assert_eq!(session.profile().fuel_type, Some(FuelType::Diesel));
    }

    #[test]
    fn merging_nothing_is_a_no_op() {
        let mut session = session();
        session.merge(&ExtractedAttributes { family_size: Some(3), ..ExtractedAttributes::default() });
        let before = session.clone();

        let outcome = session.merge(&ExtractedAttributes::default());
        assert_eq!(session, before);
        assert!(outcome.filled.is_empty());
        assert!(outcome.conflicts.is_empty());
    }

    #[test]
    fn inverted_budget_in_one_utterance_is_normalized() {
        let mut session = session();
        session.merge(&ExtractedAttributes {
            budget_min: Some(900_000),
            budget_max: Some(600_000),
            ..ExtractedAttributes::default()
        });
        assert_eq!(session.profile().budget_min, Some(600_000));
        assert_eq!(session.profile().budget_max, Some(900_000));
    }

    #[test]
    fn bound_that_would_invert_existing_budget_is_dropped() {
        let mut session = session();
        session.merge(&ExtractedAttributes { budget_max: Some(500_000), ..ExtractedAttributes::default() });

        let outcome = session.merge(&ExtractedAttributes {
            budget_min: Some(800_000),
            ..ExtractedAttributes::default()
        });
        assert_eq!(session.profile().budget_min, None);
        assert_eq!(outcome.conflicts, vec![MergeConflict::BudgetRange { min: 800_000, max: 500_000 }]);
    }

    #[test]
    fn reset_restores_virgin_state() {
        let settings = SessionSettings::default();
        let fresh = DialogueSession::new(&settings);
        let mut session = DialogueSession::new(&settings);

        session.merge(&ExtractedAttributes {
            family_size: Some(5),
            fuel_type: Some(FuelType::Cng),
            car_type: Some(CarType::Hatchback),
            budget_max: Some(600_000),
            ..ExtractedAttributes::default()
        });
        session.remember_recommendations(&[CatalogItem {
            model: "Wagon R".to_string(),
            ..CatalogItem::default()
        }]);
        session.record_exchange("what about servicing?", "Service intervals are 10,000 km.");

        session.reset();
        assert_eq!(session, fresh);
        assert!(!session.is_complete());
        assert_eq!(session.next_prompt(), fresh.next_prompt());
        assert!(session.recommended().is_empty());
        assert!(session.transcript().is_empty());
    }

    #[test]
    fn recommendations_and_transcript_are_bounded() {
        let settings = SessionSettings {
            transcript_limit: 2,
            recommendation_limit: 2,
            ..SessionSettings::default()
        };
        let mut session = DialogueSession::new(&settings);

        let items = ["Alto", "Swift", "Dzire"]
            .into_iter()
            .map(|model| CatalogItem { model: model.to_string(), ..CatalogItem::default() })
            .collect::<Vec<_>>();
        session.remember_recommendations(&items);
        assert_eq!(session.recommended().len(), 2);

        session.record_exchange("first", "one");
        session.record_exchange("second", "two");
        assert_eq!(session.transcript().len(), 2);

        let history = session.transcript().history_with(super::ChatMessage::user("third"));
        assert_eq!(history[0].role, ChatRole::System);
        assert_eq!(history[1].content, "second");
        assert_eq!(history.last().map(|message| message.content.as_str()), Some("third"));
    }
}
