//! Session gate consumed by catalog writes.
//!
//! Token issuance and storage live outside this crate; the catalog only asks
//! whether a session is active and who owns it.

use std::sync::RwLock;

use crate::cache::lock::{rw_read, rw_write};

const SOURCE: &str = "application::session";

pub trait SessionGate: Send + Sync {
    fn is_session_active(&self) -> bool;

    fn current_user_id(&self) -> Option<String>;
}

/// In-process session holder toggled by the embedding application.
#[derive(Debug, Default)]
pub struct StaticSession {
    user_id: RwLock<Option<String>>,
}

impl StaticSession {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn signed_in(user_id: impl Into<String>) -> Self {
        Self {
            user_id: RwLock::new(Some(user_id.into())),
        }
    }

    pub fn sign_in(&self, user_id: impl Into<String>) {
        *rw_write(&self.user_id, SOURCE, "sign_in") = Some(user_id.into());
    }

    pub fn sign_out(&self) {
        *rw_write(&self.user_id, SOURCE, "sign_out") = None;
    }
}

impl SessionGate for StaticSession {
    fn is_session_active(&self) -> bool {
        rw_read(&self.user_id, SOURCE, "is_session_active").is_some()
    }

    fn current_user_id(&self) -> Option<String> {
        rw_read(&self.user_id, SOURCE, "current_user_id").clone()
    }
}
