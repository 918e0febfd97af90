//! Logged-in identity persisted across restarts
//!
//! All reads and writes of the current user go through [`SessionContext`];
//! nothing else touches the underlying key. `AppState` holds one built on
//! the same store as the image cache.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::{AppError, Result};
use crate::storage::KeyValueStore;

/// Key holding the serialized current user
pub const SESSION_KEY: &str = "currentUser";

/// Marketplace account as remembered by the session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub is_admin: bool,
}

impl User {
    /// Only administrators may create, edit, or remove listings
    pub fn can_manage_listings(&self) -> bool {
        self.is_admin
    }
}

pub trait SessionContext: Send + Sync {
    /// The remembered user, if any. Unreadable state counts as logged out.
    fn current_user(&self) -> Option<User>;

    fn login(&self, user: User) -> Result<()>;

    fn logout(&self) -> Result<()>;

    fn is_admin(&self) -> bool {
        self.current_user()
            .map(|u| u.can_manage_listings())
            .unwrap_or(false)
    }
}

/// Session persisted in a [`KeyValueStore`]
pub struct StoredSession {
    store: Arc<dyn KeyValueStore>,
}

impl StoredSession {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }
}

impl SessionContext for StoredSession {
    fn current_user(&self) -> Option<User> {
        let raw = match self.store.get(SESSION_KEY) {
            Ok(raw) => raw?,
            Err(e) => {
                warn!(error = %e, "Could not read session");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(user) => Some(user),
            Err(e) => {
                warn!(error = %e, "Discarding unreadable session");
                if let Err(e) = self.store.remove(SESSION_KEY) {
                    warn!(error = %e, "Could not clear session");
                }
                None
            }
        }
    }

    fn login(&self, user: User) -> Result<()> {
        if user.username.trim().is_empty() {
            return Err(AppError::InvalidRequest("Username is required".to_string()));
        }

        let raw = serde_json::to_string(&user)?;
        self.store.set(SESSION_KEY, &raw)?;
        info!(user_id = user.id, username = %user.username, "User logged in");
        Ok(())
    }

    fn logout(&self) -> Result<()> {
        self.store.remove(SESSION_KEY)?;
        info!("User logged out");
        Ok(())
    }
}
