//! Integration test harness
//! Builds app contexts wired to a mockito server and signs test tokens

use std::path::PathBuf;
use std::sync::Arc;

use mockito::ServerGuard;
use serde_json::json;

use storefront_lib::session::token::encode_unsigned;
use storefront_lib::{AppContext, Config, SharedStorage};

/// A mock backend plus the shared storage every tab of the test uses
pub struct TestShop {
    pub server: ServerGuard,
    pub storage: Arc<SharedStorage>,
}

impl TestShop {
    pub async fn start() -> Self {
        Self {
            server: mockito::Server::new_async().await,
            storage: SharedStorage::new(),
        }
    }

    pub fn config(&self) -> Config {
        let mut config = Config::default();
        config.api.base_url = format!("{}/api", self.server.url());
        config.api.max_get_attempts = 3;
        config.session.storage_path = None;
        config
    }

    /// Open another tab against the same backend and storage
    pub fn open_tab(&self) -> AppContext {
        AppContext::new(self.config(), &self.storage).expect("app context should build")
    }
}

pub fn admin_token() -> String {
    encode_unsigned(&json!({
        "sub": "u-1",
        "email": "ops@example.com",
        "name": "Ops",
        "role": "admin",
    }))
}

pub fn customer_token() -> String {
    encode_unsigned(&json!({
        "sub": "u-2",
        "email": "buyer@example.com",
        "role": "customer",
    }))
}

/// A unique file path under the system temp dir
pub fn temp_storage_path() -> PathBuf {
    std::env::temp_dir().join(format!("storefront-{}.json", uuid::Uuid::new_v4()))
}
