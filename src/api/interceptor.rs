//! Response-error policy shared by every request.
//!
//! Classification is pure; `apply` performs the side effects. Auth failures
//! bypass the router on purpose: a hard navigation guarantees no stale
//! permission set or view state survives them.

use tracing::info;

use crate::identity::SessionStore;
use crate::navigation::{Navigator, FORBIDDEN_PATH, LOGIN_PATH, UNAUTHORIZED_PATH};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorAction {
    /// Hand the error back untouched.
    Propagate,
    /// Log out, then hard-navigate to the unauthorized view.
    Unauthorized,
    /// Hard-navigate to the forbidden view; the session stays.
    Forbidden,
}

/// Decide what to do with a failed request.
///
/// `status` is None for failures without a response (network, timeout).
/// `request_path` is the path the request was sent to and `location` the
/// console's current path.
pub fn classify(status: Option<u16>, request_path: &str, location: &str) -> ErrorAction {
    let on_login_page = location == LOGIN_PATH || location == "/";
    let is_login_request = request_path.contains("/auth/login");
    let on_error_page = location.starts_with("/error/");
    if on_login_page || is_login_request || on_error_page {
        return ErrorAction::Propagate;
    }
    match status {
        Some(401) => ErrorAction::Unauthorized,
        Some(403) => ErrorAction::Forbidden,
        _ => ErrorAction::Propagate,
    }
}

/// Run the side effects of `action`. The caller still returns the error.
pub fn apply(action: ErrorAction, store: &SessionStore, navigator: &dyn Navigator) {
    match action {
        ErrorAction::Propagate => {}
        ErrorAction::Unauthorized => {
            info!(target: "api", "credential rejected, clearing session");
            store.logout();
            navigator.hard_navigate(UNAUTHORIZED_PATH);
        }
        ErrorAction::Forbidden => {
            info!(target: "api", "request forbidden for current session");
            navigator.hard_navigate(FORBIDDEN_PATH);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(classify(Some(401), "/expedientes", "/dashboard"), ErrorAction::Unauthorized);
        assert_eq!(classify(Some(403), "/expedientes", "/dashboard"), ErrorAction::Forbidden);
        assert_eq!(classify(Some(500), "/expedientes", "/dashboard"), ErrorAction::Propagate);
        assert_eq!(classify(Some(404), "/expedientes/9", "/expedientes/9"), ErrorAction::Propagate);
        assert_eq!(classify(None, "/expedientes", "/dashboard"), ErrorAction::Propagate);
    }

    #[test]
    fn loop_breakers() {
        assert_eq!(classify(Some(401), "/auth/login", "/dashboard"), ErrorAction::Propagate);
        assert_eq!(classify(Some(401), "/expedientes", "/login"), ErrorAction::Propagate);
        assert_eq!(classify(Some(401), "/expedientes", "/"), ErrorAction::Propagate);
        assert_eq!(classify(Some(403), "/expedientes", "/error/forbidden"), ErrorAction::Propagate);
        assert_eq!(classify(Some(401), "/expedientes", "/error/unauthorized"), ErrorAction::Propagate);
    }
}
