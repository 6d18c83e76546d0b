//! Session event publishing
//!
//! - [`SessionEvent`] — what happened, tagged with its session
//! - [`EventBus`] — one broadcast channel per session

pub mod bus;
pub mod types;

pub use bus::{DEFAULT_EVENT_CAPACITY, EventBus, SharedEventBus};
pub use types::SessionEvent;
