//! Per-session conversation context.
//!
//! - Lazy creation on first message, primed with the lesson instruction
//! - Bounded turn sequence with the priming turn pinned
//! - Idle eviction driven by a periodic sweep

pub mod store;
pub mod types;

pub use store::{InMemorySessionStore, SessionHandle, SessionStore};
pub use types::{Session, Turn, TurnRole};
