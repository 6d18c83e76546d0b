//! Agent participant domain.
//!
//! - [`role::ParticipantRole`] — closed set of editorial roles plus custom roles
//! - [`persona::Personality`] — trait weights and voice of a participant
//! - [`entities::AgentParticipant`] — a participant owned by a session

pub mod entities;
pub mod persona;
pub mod role;
