//! Composition root: one session store shared by the API client, the guards
//! and the menu, with the navigator as the console's address bar.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::api::ApiClient;
use crate::config::ClientConfig;
use crate::error::AppResult;
use crate::identity::{AuthService, LoginRequest, LoginResponse, PermissionEvaluator, PermissionRef, SessionStore};
use crate::navigation::{ConsoleNavigator, DASHBOARD_PATH, LOGIN_PATH};
use crate::routes::{visible_items, MenuItem, RouteMatch, RouteTable};
use crate::services::{CaseService, DashboardService};

pub struct App {
    config: ClientConfig,
    store: Arc<SessionStore>,
    navigator: Arc<ConsoleNavigator>,
    api: ApiClient,
    routes: RouteTable,
    auth: AuthService,
    dashboard: DashboardService,
    cases: CaseService,
}

impl App {
    /// Store built from `config` (persistent unless disabled), starting at `/`.
    pub fn new(config: ClientConfig) -> AppResult<Self> {
        let store = Arc::new(SessionStore::from_config(&config));
        Self::with_store(config, store)
    }

    pub fn with_store(config: ClientConfig, store: Arc<SessionStore>) -> AppResult<Self> {
        let navigator = Arc::new(ConsoleNavigator::new("/"));
        let api = ApiClient::new(&config, store.clone(), navigator.clone())?;
        Ok(Self {
            auth: AuthService::new(api.clone()),
            dashboard: DashboardService::new(api.clone()),
            cases: CaseService::new(api.clone()),
            routes: RouteTable::dicri(),
            config,
            store,
            navigator,
            api,
        })
    }

    pub fn config(&self) -> &ClientConfig { &self.config }
    pub fn store(&self) -> &Arc<SessionStore> { &self.store }
    pub fn navigator(&self) -> &Arc<ConsoleNavigator> { &self.navigator }
    pub fn api(&self) -> &ApiClient { &self.api }
    pub fn routes(&self) -> &RouteTable { &self.routes }
    pub fn auth(&self) -> &AuthService { &self.auth }
    pub fn dashboard(&self) -> &DashboardService { &self.dashboard }
    pub fn cases(&self) -> &CaseService { &self.cases }

    pub fn location(&self) -> String { self.navigator.location() }

    /// Cancellation scope of the view currently shown.
    pub fn view_scope(&self) -> CancellationToken { self.navigator.view_scope() }

    /// In-app navigation to `location`, then through the guards.
    pub fn navigate(&self, location: &str) -> AppResult<RouteMatch> {
        self.navigator.push(location);
        self.settle()
    }

    /// Pop one history entry and re-run the guards there. None at the bottom.
    pub fn back(&self) -> AppResult<Option<RouteMatch>> {
        if self.navigator.back().is_none() {
            return Ok(None);
        }
        self.settle().map(Some)
    }

    /// Re-evaluate the current location against the current session. Every
    /// guard redirect replaces the current history entry.
    pub fn settle(&self) -> AppResult<RouteMatch> {
        let session = self.store.snapshot();
        let settled = self.routes.settle(&self.navigator.location(), session.as_deref())?;
        for r in &settled.redirects {
            if r.replace {
                self.navigator.replace(&r.to);
            } else {
                self.navigator.push(&r.to);
            }
        }
        Ok(settled.route)
    }

    /// Log in and land on the dashboard.
    pub async fn login(&self, email: &str, password: &str) -> AppResult<LoginResponse> {
        let req = LoginRequest { email: email.to_string(), password: password.to_string() };
        let resp = self.auth.login(&req).await?;
        self.navigate(DASHBOARD_PATH)?;
        info!(target: "app", "signed in as {}", resp.principal.full_name());
        Ok(resp)
    }

    /// Sidebar logout: clear the session, then go to the login view in-app.
    pub fn logout(&self) -> AppResult<RouteMatch> {
        self.auth.logout();
        self.navigate(LOGIN_PATH)
    }

    pub fn can(&self, req: &PermissionRef) -> bool {
        let session = self.store.snapshot();
        PermissionEvaluator::for_session(session.as_deref()).has(req)
    }

    pub fn menu(&self) -> Vec<MenuItem> {
        let session = self.store.snapshot();
        visible_items(session.as_deref())
    }
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("api", &self.api)
            .field("location", &self.location())
            .field("store", &self.store)
            .finish()
    }
}
