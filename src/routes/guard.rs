//! Route guard for the protected area.
//!
//! A pure function of the current `SessionState`: it never issues network
//! calls and never mutates the session. While bootstrap is still resolving
//! the identity it answers `Wait` rather than bouncing a valid session to
//! the login page.

use tokio::sync::watch;

use super::Route;
use crate::state::session::{AuthStatus, SessionState};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GuardDecision {
    Render(Route),
    Redirect { to: Route, from: Route },
    /// Identity not yet known; hold rendering until the session resolves.
    Wait,
}

pub struct RouteGuard;

impl RouteGuard {
    #[must_use]
    pub fn check(route: Route, session: &SessionState) -> GuardDecision {
        if !route.is_protected() {
            return GuardDecision::Render(route);
        }
        match session.status() {
            AuthStatus::Authenticated => GuardDecision::Render(route),
            AuthStatus::Anonymous => GuardDecision::Redirect { to: Route::Login, from: route },
            AuthStatus::Pending => GuardDecision::Wait,
        }
    }

    /// Wait until the session leaves `Pending`, then decide.
    ///
    /// If the store is dropped while still pending, the route is treated as
    /// anonymous.
    pub async fn resolve(route: Route, session: &mut watch::Receiver<SessionState>) -> GuardDecision {
        let resolved = session
            .wait_for(|s| s.status() != AuthStatus::Pending)
            .await
            .map(|state| state.clone())
            .ok();
        let resolved = resolved.unwrap_or_else(|| SessionState { bootstrapped: true, ..session.borrow().clone() });
        Self::check(route, &resolved)
    }
}

#[cfg(test)]
#[path = "guard_test.rs"]
mod tests;
