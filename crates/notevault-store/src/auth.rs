//! Auth provider fed by the embedding view layer.

use std::sync::{Arc, PoisonError, RwLock};

use notevault_core::{AuthProvider, AuthUser};

#[derive(Debug, Default)]
struct AuthState {
    user: Option<AuthUser>,
    loading: bool,
}

/// Identity holder the view layer updates when its session changes.
///
/// Cloning shares the same state, so one handle can be given to the
/// catalog services while the view keeps another for updates.
#[derive(Debug, Clone, Default)]
pub struct StaticAuthProvider {
    state: Arc<RwLock<AuthState>>,
}

impl StaticAuthProvider {
    /// Guest identity, session check finished.
    pub fn guest() -> Self {
        Self::default()
    }

    /// Session check still running.
    pub fn loading() -> Self {
        let provider = Self::default();
        provider.set_loading(true);
        provider
    }

    pub fn signed_in(user: AuthUser) -> Self {
        let provider = Self::default();
        provider.set_user(Some(user));
        provider
    }

    /// Replace the identity; also marks the session check finished.
    pub fn set_user(&self, user: Option<AuthUser>) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.user = user;
        state.loading = false;
    }

    pub fn set_loading(&self, loading: bool) {
        self.state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .loading = loading;
    }
}

impl AuthProvider for StaticAuthProvider {
    fn current_user(&self) -> Option<AuthUser> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .user
            .clone()
    }

    fn is_loading(&self) -> bool {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .loading
    }
}
