pub mod catalog;
pub mod compose;
pub mod config;
pub mod dialogue;
pub mod domain;
pub mod errors;
pub mod extraction;
pub mod ranking;

pub use catalog::{CatalogError, CatalogStore};
pub use compose::{format_rupees, ListingStyle, PitchStyle, ResponseComposer};
pub use dialogue::{
    ChatMessage, ChatRole, DialogueSession, DialogueStage, MergeConflict, MergeOutcome,
    SessionSettings, Slot,
};
pub use domain::profile::{AttributeProfile, CarType, DriveType, FuelType, Transmission};
pub use domain::vehicle::{CatalogItem, CatalogQuery};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use extraction::{EntityExtractor, ExtractedAttributes};
pub use ranking::{CandidateRanker, ScoreBreakdown, ScoredCandidate};
