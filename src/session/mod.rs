pub mod auth;
pub mod storage;
pub mod token;

pub use auth::AuthService;
pub use storage::{ContextId, SharedStorage, StorageChange, StorageHandle, StorageNotice, StorageSubscription};
pub use token::{Principal, Role};
