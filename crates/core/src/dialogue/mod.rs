pub mod session;
pub mod states;

pub use session::{system_prompt, ChatMessage, ChatRole, DialogueSession, SessionSettings, Transcript};
pub use states::{DialogueStage, MergeConflict, MergeOutcome, Slot};
