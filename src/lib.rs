//! Client-side session layer for the storefront.
//!
//! Keeps admin-only regions of every open tab in line with the session
//! token in shared storage, and wraps the `payments` and `users` REST
//! endpoints with the session's bearer token.

pub mod api;
pub mod app;
pub mod cart;
pub mod config;
pub mod error;
pub mod events;
pub mod session;
pub mod sync;
pub mod ui;

#[cfg(test)]
mod tests;

pub use app::AppContext;
pub use cart::{CartItem, CartService};
pub use config::Config;
pub use error::{ErrorCategory, ErrorCode, ErrorSeverity, StorefrontError, StorefrontResult};
pub use events::{AuthStateChanged, EventBus, PageEvent, AUTH_STATE_CHANGED};
pub use session::{AuthService, Principal, Role, SharedStorage, StorageChange, StorageHandle};
pub use sync::{ReadyBarrier, SessionSync};
pub use ui::{AdminVisibilityReconciler, Document, Element, Reconcile, UiTargetSet};
