//! Discussion session domain.
//!
//! - [`entities::DiscussionSession`] — the aggregate root owning participants and messages
//! - [`status::SessionStatus`] — the lifecycle state machine
//! - [`message::Message`] — append-only contributions, including human interventions

pub mod entities;
pub mod message;
pub mod status;
