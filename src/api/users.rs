use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::api::client::ApiClient;
use crate::api::payments::require_id;
use crate::error::{self, StorefrontResult};
use crate::session::Role;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Fields to change on a user; unset fields are left alone
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Only honored by the backend for admin callers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

impl UserUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.role.is_none()
    }
}

/// Client for the `/users` endpoints
pub struct UsersApi {
    client: Arc<ApiClient>,
}

impl UsersApi {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    /// The profile of the logged-in user
    pub async fn me(&self) -> StorefrontResult<User> {
        self.client.get("users/me").await
    }

    pub async fn get_user(&self, user_id: &str) -> StorefrontResult<User> {
        require_id("userId", user_id)?;
        self.client.get(&format!("users/{}", user_id)).await
    }

    /// One page of users (admin only); pages start at 1
    pub async fn list_users(&self, page: Option<u32>) -> StorefrontResult<Vec<User>> {
        match page {
            Some(page) => self.client.get(&format!("users?page={}", page.max(1))).await,
            None => self.client.get("users").await,
        }
    }

    pub async fn update_user(&self, user_id: &str, update: &UserUpdate) -> StorefrontResult<User> {
        require_id("userId", user_id)?;
        if update.is_empty() {
            return Err(error::api_request_invalid("update", "no fields to change"));
        }
        if let Some(email) = &update.email {
            if !email.contains('@') {
                return Err(error::api_request_invalid("email", "not an email address"));
            }
        }
        let user: User = self.client.put(&format!("users/{}", user_id), update).await?;
        info!(user = %user.id, "User updated");
        Ok(user)
    }

    pub async fn delete_user(&self, user_id: &str) -> StorefrontResult<()> {
        require_id("userId", user_id)?;
        self.client.delete(&format!("users/{}", user_id)).await?;
        info!(user = %user_id, "User deleted");
        Ok(())
    }
}
