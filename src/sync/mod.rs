//! Cross-tab session synchronization.

pub mod engine;
pub mod ready;

pub use engine::{SessionSync, DEFAULT_BOOTSTRAP_DELAY, DEFAULT_SETTLE_DELAY};
pub use ready::ReadyBarrier;
