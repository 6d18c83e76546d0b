//! Domain layer for writers-roundtable
//!
//! This crate contains the core business logic, entities, and value objects.
//! It has no dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Discussion Session
//!
//! A [`DiscussionSession`] convenes 2 to 5 agent participants around a
//! creative-writing topic. Participants speak in a fixed round-robin order,
//! one turn at a time, for at most `max_rounds` rounds. A human operator can
//! add interventions to the log at any point while the session is open.
//!
//! ## Lifecycle
//!
//! `pending → active ⇄ paused → concluded`, validated by [`SessionStatus::apply`].
//! A concluded session is immutable.

pub mod context;
pub mod core;
pub mod participant;
pub mod policy;
pub mod progress;
pub mod prompt;
pub mod session;
pub mod util;

// Re-export commonly used types
pub use context::{DEFAULT_CONTEXT_WINDOW, Speaker, Transcript, TurnContext, WeightedIntervention};
pub use self::core::{
    error::DomainError,
    ids::{MessageId, ParticipantId, SessionId},
    topic::Topic,
};
pub use participant::{
    entities::{AgentParticipant, ParticipantConfig, ParticipantStatus},
    persona::{Personality, TraitWeights},
    role::ParticipantRole,
};
pub use policy::retry::{FailureAction, RetryPolicy};
pub use progress::{DiscussionProgress, ParticipantProgress};
pub use prompt::PromptTemplate;
pub use session::{
    entities::{
        DEFAULT_MAX_ROUNDS, DiscussionSession, MAX_PARTICIPANTS, MIN_PARTICIPANTS, SessionSummary,
        SessionType, TurnAdvance,
    },
    message::{HUMAN_SENDER, Impact, Message, MessageMetadata, SYSTEM_SENDER, Sender},
    status::{SessionCommand, SessionStatus},
};
