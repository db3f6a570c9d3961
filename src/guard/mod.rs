//! Gate in front of protected views.
//!
//! Observes the session store's auth-state channel and exposes a three-state
//! machine: `Checking` while the persisted session is still being restored,
//! then `Authenticated` or `Unauthenticated`. Consumers must not render
//! protected content while `Checking`, and later auth-state changes (logout,
//! forced teardown) re-drive the machine.

use tokio::sync::watch;

use crate::session::AuthState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardState {
    /// Session restore has not resolved; show a neutral loading indicator.
    Checking,
    /// Render the protected content.
    Authenticated,
    /// Send the user to the login entry point; render nothing.
    Unauthenticated,
}

pub struct RouteGuard {
    rx: watch::Receiver<AuthState>,
}

impl RouteGuard {
    pub fn new(rx: watch::Receiver<AuthState>) -> Self {
        Self { rx }
    }

    fn map(state: AuthState) -> GuardState {
        match state {
            AuthState::Restoring => GuardState::Checking,
            AuthState::SignedIn => GuardState::Authenticated,
            AuthState::SignedOut => GuardState::Unauthenticated,
        }
    }

    /// The guard's view of the current auth state.
    pub fn state(&self) -> GuardState {
        Self::map(*self.rx.borrow())
    }

    /// Suspend until the state is no longer `Checking`. Returns the resolved
    /// state; if the session store goes away first, the caller is treated as
    /// unauthenticated.
    pub async fn wait_until_resolved(&mut self) -> GuardState {
        loop {
            let state = Self::map(*self.rx.borrow_and_update());
            if state != GuardState::Checking {
                return state;
            }
            if self.rx.changed().await.is_err() {
                return GuardState::Unauthenticated;
            }
        }
    }
}
