//! Location tracking and the two kinds of navigation the console performs:
//! in-app route changes (push/replace on `History`) and hard navigation.
//!
//! Hard navigation is only ever triggered from the API client's auth-failure
//! path. It deliberately bypasses the router: the history collapses, the
//! reload epoch moves, and every view-scoped request in flight is cancelled,
//! which is how a terminal console models a full document reload.

mod history;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::info;

pub use history::{path_of, query_param, History};

pub const LOGIN_PATH: &str = "/login";
pub const DASHBOARD_PATH: &str = "/dashboard";
pub const UNAUTHORIZED_PATH: &str = "/error/unauthorized";
pub const FORBIDDEN_PATH: &str = "/error/forbidden";

/// What the transport layer needs from the host environment.
pub trait Navigator: Send + Sync {
    /// Current location path, without query string.
    fn current_path(&self) -> String;
    /// Full reload onto `path`, dropping all in-memory view state.
    fn hard_navigate(&self, path: &str);
}

struct NavState {
    history: History,
    view_scope: CancellationToken,
}

/// The console's navigator. Owns the history and the cancellation scope of the
/// current view; a new scope is opened on every location change.
pub struct ConsoleNavigator {
    state: Mutex<NavState>,
}

impl ConsoleNavigator {
    pub fn new<S: Into<String>>(initial: S) -> Self {
        Self { state: Mutex::new(NavState { history: History::new(initial), view_scope: CancellationToken::new() }) }
    }

    pub fn location(&self) -> String { self.state.lock().history.location().to_string() }

    pub fn history(&self) -> History { self.state.lock().history.clone() }

    pub fn reload_epoch(&self) -> u64 { self.state.lock().history.reload_epoch() }

    /// Token that is cancelled when the current view is left.
    pub fn view_scope(&self) -> CancellationToken { self.state.lock().view_scope.child_token() }

    pub fn push(&self, location: &str) {
        let mut st = self.state.lock();
        st.history.push(location);
        Self::renew_scope(&mut st);
    }

    pub fn replace(&self, location: &str) {
        let mut st = self.state.lock();
        st.history.replace(location);
        Self::renew_scope(&mut st);
    }

    pub fn back(&self) -> Option<String> {
        let mut st = self.state.lock();
        let loc = st.history.back().map(|s| s.to_string());
        if loc.is_some() { Self::renew_scope(&mut st); }
        loc
    }

    fn renew_scope(st: &mut NavState) {
        st.view_scope.cancel();
        st.view_scope = CancellationToken::new();
    }
}

impl Default for ConsoleNavigator {
    fn default() -> Self { ConsoleNavigator::new(DASHBOARD_PATH) }
}

impl Navigator for ConsoleNavigator {
    fn current_path(&self) -> String { self.state.lock().history.path().to_string() }

    fn hard_navigate(&self, path: &str) {
        let mut st = self.state.lock();
        st.history.hard_reset(path);
        Self::renew_scope(&mut st);
        info!(target: "navigation", "hard navigation to {} (epoch {})", path, st.history.reload_epoch());
    }
}
