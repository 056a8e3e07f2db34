//! Unit tests spanning several modules
//!
//! Cross-tab scenarios built from whole app contexts, plus the event bus.

mod event_bus_test;
