//! Core domain concepts shared across all subdomains.
//!
//! - [`ids`] — session, participant and message identifiers
//! - [`topic::Topic`] — a validated discussion topic
//! - [`error::DomainError`] — domain-level errors

pub mod error;
pub mod ids;
pub mod topic;
