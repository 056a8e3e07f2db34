//! UI regions and the logic that gates them on the session's role.

pub mod binding;
pub mod document;
pub mod reconciler;

pub use binding::bind_admin_region;
pub use document::{Document, Element, HIDDEN_CLASS};
pub use reconciler::{AdminVisibilityReconciler, Reconcile, UiTargetSet};
