//! Use cases (application services)
//!
//! - [`orchestrator`] — the facade: session lifecycle, interventions, queries
//! - `turn_scheduler` — one scheduling loop per session
//! - [`conclusion`] — summary generation and the terminal transition

pub mod conclusion;
pub mod orchestrator;
mod session_runtime;
mod turn_scheduler;
