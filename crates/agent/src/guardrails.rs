//! Keeps the conversation on the brand's cars, both for buyer input and for
//! text coming back from the fallback model.

/// Hypothetical, puzzle and role-play phrasing. Substring match.
const OFF_TOPIC_TRIGGERS: &[&str] = &[
    "logic puzzle",
    "proof",
    "robot",
    "suv1",
    "tree of thought",
    "deduction",
    "logical reasoning",
    "imagine you",
    "customer a",
    "customer b",
    "hypothetical",
    "what if",
    "scenario",
    "thought experiment",
    "fictional",
    "pretend",
    "assume",
    "imagine a",
];

/// Meta-reasoning markers that only show up in generated text.
const HALLUCINATION_MARKERS: &[&str] = &[
    "according to my calculations",
    "let me think through this",
    "here's a story",
    "imagine this",
    "suppose that",
    "theoretical",
    "abstract",
    "philosophical",
    "mathematical proof",
    "puzzle solution",
];

/// Products we do not sell. Whole-word match.
const UNRELATED_PRODUCTS: &[&str] = &[
    "bike",
    "motorcycle",
    "scooter",
    "bicycle",
    "truck",
    "bus",
    "plane",
    "airplane",
    "boat",
    "ship",
    "train",
    "helicopter",
    "smartphones",
    "cosmetics",
    "mobiles",
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GuardVerdict {
    Allow,
    OffTopic,
    UnrelatedProduct,
    Hallucination,
}

impl GuardVerdict {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }

    pub fn reason_code(&self) -> &'static str {
        match self {
            Self::Allow => "allow",
            Self::OffTopic => "off_topic",
            Self::UnrelatedProduct => "unrelated_product",
            Self::Hallucination => "hallucination",
        }
    }
}

#[derive(Clone, Debug)]
pub struct TopicGuard {
    brand: String,
}

impl TopicGuard {
    pub fn new(brand: impl Into<String>) -> Self {
        Self { brand: brand.into() }
    }

    pub fn is_off_topic(&self, text: &str) -> bool {
        let lowered = text.to_lowercase();
        OFF_TOPIC_TRIGGERS.iter().any(|trigger| lowered.contains(trigger))
    }

    pub fn is_hallucination(&self, text: &str) -> bool {
        let lowered = text.to_lowercase();
        HALLUCINATION_MARKERS.iter().any(|marker| lowered.contains(marker))
    }

    pub fn mentions_unrelated_vehicle(&self, text: &str) -> bool {
        let lowered = text.to_lowercase();
        lowered
            .split(|ch: char| !ch.is_alphanumeric())
            .any(|word| UNRELATED_PRODUCTS.contains(&word))
    }

    /// Buyer input: off-topic phrasing first, then products outside the range.
    pub fn screen_input(&self, text: &str) -> GuardVerdict {
        if self.is_off_topic(text) {
            GuardVerdict::OffTopic
        } else if self.mentions_unrelated_vehicle(text) {
            GuardVerdict::UnrelatedProduct
        } else {
            GuardVerdict::Allow
        }
    }

    pub fn screen_generated(&self, text: &str) -> GuardVerdict {
        if self.is_hallucination(text) {
            GuardVerdict::Hallucination
        } else if self.is_off_topic(text) {
            GuardVerdict::OffTopic
        } else {
            GuardVerdict::Allow
        }
    }

    /// Fixed reply for a blocked input. `None` for `Allow`.
    pub fn input_redirect(&self, verdict: GuardVerdict) -> Option<String> {
        let brand = &self.brand;
        match verdict {
            GuardVerdict::Allow => None,
            GuardVerdict::OffTopic | GuardVerdict::Hallucination => Some(format!(
                "Let's focus on {brand} cars. How can I help you find your perfect car today?"
            )),
            GuardVerdict::UnrelatedProduct => Some(format!(
                "I specialize in {brand} cars. Please ask about our car models, features, or pricing!"
            )),
        }
    }

    /// Fixed reply replacing a blocked fallback answer. `None` for `Allow`.
    pub fn generated_redirect(&self, verdict: GuardVerdict) -> Option<String> {
        let brand = &self.brand;
        match verdict {
            GuardVerdict::Allow => None,
            _ => Some(format!(
                "Let's focus on {brand} cars. Would you like to know about models, pricing, or book a test drive?"
            )),
        }
    }
}
