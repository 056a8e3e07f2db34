use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

use crate::api::{ApiClient, HttpClient, PaymentsApi, ReqwestHttpClient, UsersApi};
use crate::cart::CartService;
use crate::config::Config;
use crate::error::StorefrontResult;
use crate::events::EventBus;
use crate::session::{AuthService, SharedStorage, StorageHandle};
use crate::sync::{ReadyBarrier, SessionSync};
use crate::ui::{AdminVisibilityReconciler, Document, UiTargetSet};

/// Every service of one page, constructed and wired explicitly.
///
/// Several contexts may share one [`SharedStorage`]; each behaves like a
/// separate browser tab.
pub struct AppContext {
    pub config: Config,
    pub storage: StorageHandle,
    pub event_bus: Arc<EventBus>,
    pub auth: Arc<AuthService>,
    pub cart: Arc<CartService>,
    pub document: Arc<Document>,
    pub reconciler: Arc<AdminVisibilityReconciler>,
    pub sync: Arc<SessionSync>,
    pub api: Arc<ApiClient>,
    pub payments: PaymentsApi,
    pub users: UsersApi,
    ready: ReadyBarrier,
    initialized: RwLock<bool>,
}

impl AppContext {
    /// Build a context using reqwest for HTTP
    pub fn new(config: Config, storage: &Arc<SharedStorage>) -> StorefrontResult<Self> {
        let http = Arc::new(ReqwestHttpClient::new(config.api.timeout())?);
        Ok(Self::with_http_client(config, storage, http))
    }

    /// Build a context around a caller-supplied HTTP client
    pub fn with_http_client(
        config: Config,
        storage: &Arc<SharedStorage>,
        http: Arc<dyn HttpClient>,
    ) -> Self {
        let handle = storage.open_context();
        let event_bus = Arc::new(EventBus::new(config.sync.event_bus_capacity));

        let auth = Arc::new(AuthService::new(
            handle.clone(),
            Arc::clone(&event_bus),
            config.session.token_key.clone(),
        ));
        let cart = Arc::new(CartService::new(
            handle.clone(),
            Arc::clone(&event_bus),
            config.session.cart_key.clone(),
        ));

        let document = Arc::new(Document::new());
        let reconciler = Arc::new(AdminVisibilityReconciler::new(
            Arc::clone(&auth),
            Arc::clone(&document),
            UiTargetSet::new(config.ui.admin_targets.iter().cloned()),
        ));

        let ready = ReadyBarrier::new();
        let sync = Arc::new(
            SessionSync::new(
                handle.clone(),
                Arc::clone(&event_bus),
                config.session.token_key.clone(),
                ready.clone(),
            )
            .with_delays(config.sync.settle_delay(), config.sync.bootstrap_delay()),
        );

        let api = Arc::new(
            ApiClient::new(http, config.api.base_url.clone(), Arc::clone(&auth))
                .with_max_get_attempts(config.api.max_get_attempts),
        );
        let payments = PaymentsApi::new(Arc::clone(&api));
        let users = UsersApi::new(Arc::clone(&api));

        info!(context = %handle.context(), "Created app context");

        Self {
            config,
            storage: handle,
            event_bus,
            auth,
            cart,
            document,
            reconciler,
            sync,
            api,
            payments,
            users,
            ready,
            initialized: RwLock::new(false),
        }
    }

    /// Start cross-tab sync for this context.
    ///
    /// The listener is running before bootstrap reads the token, so a
    /// change made by another context in between is not lost. The ready
    /// barrier opens last; no reconciliation runs before that.
    pub async fn initialize(&self) {
        let mut initialized = self.initialized.write().await;
        if *initialized {
            return;
        }
        info!(context = %self.storage.context(), "Initializing app context");

        self.sync.spawn(self.storage.subscribe()).await;
        self.sync.attach_reconciler(self.reconciler.clone()).await;
        self.sync.bootstrap().await;
        self.ready.mark_ready();

        *initialized = true;
    }

    pub async fn is_initialized(&self) -> bool {
        *self.initialized.read().await
    }

    pub fn is_ready(&self) -> bool {
        self.ready.is_ready()
    }

    /// Tear down background work and flush storage
    pub async fn shutdown(&self) -> StorefrontResult<()> {
        info!(context = %self.storage.context(), "Shutting down app context");
        self.sync.shutdown().await;
        self.sync.detach_reconciler().await;
        *self.initialized.write().await = false;
        self.storage.storage().save().await
    }
}
