use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::trace;

use crate::events::{AuthStateChanged, EventBus};
use crate::session::AuthService;
use crate::ui::document::Element;
use crate::ui::reconciler::hidden_for;

/// Bind an admin-only region to the auth state.
///
/// The region is gated immediately and again on every `authStateChanged`
/// event until the returned task is aborted or the bus goes away. The
/// event only says that something changed; the role is re-read from the
/// auth service each time.
pub fn bind_admin_region(
    element: Arc<Element>,
    auth: Arc<AuthService>,
    bus: &EventBus,
) -> JoinHandle<()> {
    // Subscribe before the initial pass so no change slips between the two
    let mut events = bus.subscribe();
    element.set_hidden(hidden_for(auth.current_user().as_ref()));

    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            if AuthStateChanged::from_event(&event).is_none() {
                continue;
            }
            let hidden = hidden_for(auth.current_user().as_ref());
            trace!(element = %element.id(), hidden, "Bound region updated");
            element.set_hidden(hidden);
        }
    })
}
