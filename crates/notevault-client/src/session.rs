//! Identity gate for mutating operations.

use std::sync::Arc;

use tracing::debug;

use notevault_core::{AuthProvider, AuthUser, Error, EventBus, Result, VaultEvent};

/// Auth provider plus the event bus used to ask the view for a login.
#[derive(Clone)]
pub struct Session {
    auth: Arc<dyn AuthProvider>,
    events: EventBus,
}

impl Session {
    pub fn new(auth: Arc<dyn AuthProvider>, events: EventBus) -> Self {
        Self { auth, events }
    }

    pub fn current_user(&self) -> Option<AuthUser> {
        self.auth.current_user()
    }

    pub fn is_loading(&self) -> bool {
        self.auth.is_loading()
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// The signed-in user, or [`Error::AuthRequired`].
    ///
    /// A `LoginRequired` event is emitted for guests. While the session check
    /// is still running the call fails without the event, so the view does
    /// not redirect a user who is about to be signed in.
    pub fn require_user(&self, action: &str) -> Result<AuthUser> {
        if let Some(user) = self.auth.current_user() {
            return Ok(user);
        }
        if self.auth.is_loading() {
            debug!(
                subsystem = "session",
                op = action,
                "Session check still running, refusing action"
            );
        } else {
            debug!(subsystem = "session", op = action, "Guest attempted gated action");
            self.events.emit(VaultEvent::LoginRequired {
                action: action.to_string(),
            });
        }
        Err(Error::AuthRequired(action.to_string()))
    }
}
