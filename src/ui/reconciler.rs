use std::sync::Arc;
use tracing::debug;

use crate::session::{AuthService, Principal};
use crate::ui::document::Document;

/// Something that brings observable UI state in line with current session state.
/// Implementations must be idempotent.
pub trait Reconcile: Send + Sync {
    fn reconcile(&self);
}

/// Ordered set of element ids gated on the admin role
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiTargetSet {
    ids: Vec<String>,
}

impl UiTargetSet {
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ids: ids.into_iter().map(Into::into).collect(),
        }
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }
}

impl Default for UiTargetSet {
    fn default() -> Self {
        Self::new(["admin-link", "admin-nav"])
    }
}

/// Whether a region restricted to admins should be hidden for this principal
pub fn hidden_for(principal: Option<&Principal>) -> bool {
    !principal.map_or(false, Principal::is_admin)
}

/// Shows admin-only regions to admins and hides them from everyone else
pub struct AdminVisibilityReconciler {
    auth: Arc<AuthService>,
    document: Arc<Document>,
    targets: UiTargetSet,
}

impl AdminVisibilityReconciler {
    pub fn new(auth: Arc<AuthService>, document: Arc<Document>, targets: UiTargetSet) -> Self {
        Self {
            auth,
            document,
            targets,
        }
    }

    pub fn targets(&self) -> &UiTargetSet {
        &self.targets
    }
}

impl Reconcile for AdminVisibilityReconciler {
    fn reconcile(&self) {
        let principal = self.auth.current_user();
        let hidden = hidden_for(principal.as_ref());

        let mut applied = 0usize;
        for id in self.targets.ids() {
            if let Some(element) = self.document.get_element_by_id(id) {
                element.set_hidden(hidden);
                applied += 1;
            }
        }
        debug!(hidden, applied, "Admin visibility reconciled");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventBus;
    use crate::session::token::encode_unsigned;
    use crate::session::{SharedStorage, StorageHandle};
    use crate::ui::document::Element;
    use serde_json::json;

    fn setup() -> (AdminVisibilityReconciler, StorageHandle, Arc<Document>) {
        let storage = SharedStorage::new();
        let handle = storage.open_context();
        let bus = Arc::new(EventBus::new(16));
        let auth = Arc::new(AuthService::new(handle.clone(), bus, "auth_token"));
        let document = Arc::new(Document::new());
        let reconciler =
            AdminVisibilityReconciler::new(auth, Arc::clone(&document), UiTargetSet::default());
        (reconciler, handle, document)
    }

    #[test]
    fn test_admin_sees_all_present_targets() {
        let (reconciler, handle, document) = setup();
        let link = document.mount(Element::new("admin-link"));
        let nav = document.mount(Element::new("admin-nav"));
        link.add_class(crate::ui::HIDDEN_CLASS);
        nav.add_class(crate::ui::HIDDEN_CLASS);

        handle.set("auth_token", encode_unsigned(&json!({ "sub": "1", "role": "admin" })));
        reconciler.reconcile();

        assert!(!link.is_hidden());
        assert!(!nav.is_hidden());
    }

    #[test]
    fn test_customer_and_anonymous_are_hidden() {
        let (reconciler, handle, document) = setup();
        let link = document.mount(Element::new("admin-link"));
        let nav = document.mount(Element::new("admin-nav"));

        reconciler.reconcile();
        assert!(link.is_hidden());
        assert!(nav.is_hidden());

        handle.set("auth_token", encode_unsigned(&json!({ "sub": "2", "role": "customer" })));
        link.remove_class(crate::ui::HIDDEN_CLASS);
        reconciler.reconcile();
        assert!(link.is_hidden());
        assert!(nav.is_hidden());
    }

    #[test]
    fn test_role_must_be_exactly_admin() {
        let (reconciler, handle, document) = setup();
        let link = document.mount(Element::new("admin-link"));

        for role in ["Admin", "ADMIN", "administrator"] {
            handle.set("auth_token", encode_unsigned(&json!({ "sub": "1", "role": role })));
            link.remove_class(crate::ui::HIDDEN_CLASS);
            reconciler.reconcile();
            assert!(link.is_hidden(), "role {:?} must not reveal admin regions", role);
        }
    }

    #[test]
    fn test_missing_targets_are_skipped() {
        let (reconciler, handle, document) = setup();
        handle.set("auth_token", encode_unsigned(&json!({ "sub": "1", "role": "admin" })));

        reconciler.reconcile();
        assert!(document.is_empty());

        // Only one of the two targets is on this page
        let nav = document.mount(Element::new("admin-nav"));
        let unrelated = document.mount(Element::new("cart-badge"));
        handle.remove("auth_token");
        reconciler.reconcile();
        assert!(nav.is_hidden());
        assert!(!unrelated.is_hidden());
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let (reconciler, handle, document) = setup();
        let link = document.mount(Element::new("admin-link"));
        link.add_class("nav-item");
        handle.set("auth_token", encode_unsigned(&json!({ "sub": "2", "role": "customer" })));

        reconciler.reconcile();
        let once = link.classes();
        for _ in 0..5 {
            reconciler.reconcile();
        }
        assert_eq!(link.classes(), once);
        assert_eq!(once, vec!["hidden".to_string(), "nav-item".to_string()]);
    }
}
