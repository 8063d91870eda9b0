use std::collections::HashMap;

use crate::error::{AppError, AppResult};
use crate::identity::{catalog, Session};
use crate::navigation::{path_of, DASHBOARD_PATH};
use crate::tprintln;

use super::guard::{Guard, GuardDecision, PermissionRequirement, Redirect};

/// Upper bound on chained redirects for one navigation.
pub const MAX_REDIRECTS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum View {
    Login,
    RequestReset,
    ResetPassword,
    Dashboard,
    Profile,
    Settings,
    CaseList,
    CaseCreate,
    CaseDetail,
    CaseEdit,
    Unauthorized,
    Forbidden,
}

impl View {
    pub fn title(&self) -> &'static str {
        match self {
            View::Login => "Iniciar sesión",
            View::RequestReset => "Recuperar contraseña",
            View::ResetPassword => "Restablecer contraseña",
            View::Dashboard => "Dashboard",
            View::Profile => "Mi perfil",
            View::Settings => "Configuración",
            View::CaseList => "Expedientes",
            View::CaseCreate => "Nuevo expediente",
            View::CaseDetail => "Detalle de expediente",
            View::CaseEdit => "Editar expediente",
            View::Unauthorized => "Sesión expirada",
            View::Forbidden => "Acceso denegado",
        }
    }
}

#[derive(Debug, Clone)]
enum Target {
    View(View),
    Redirect(String),
}

#[derive(Debug, Clone)]
struct Route {
    segments: Vec<String>,
    guard: Option<Guard>,
    target: Target,
}

impl Route {
    /// Captured `:param` segments when `path` matches this route.
    fn matches(&self, path: &str) -> Option<HashMap<String, String>> {
        let parts = split_path(path);
        if parts.len() != self.segments.len() { return None; }
        let mut params = HashMap::new();
        for (pat, part) in self.segments.iter().zip(parts) {
            if let Some(name) = pat.strip_prefix(':') {
                params.insert(name.to_string(), part.to_string());
            } else if pat != part {
                return None;
            }
        }
        Some(params)
    }
}

fn split_path(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// A location that resolved to a view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    pub view: View,
    pub location: String,
    pub params: HashMap<String, String>,
}

impl RouteMatch {
    pub fn param(&self, name: &str) -> Option<&str> { self.params.get(name).map(|s| s.as_str()) }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Render(RouteMatch),
    Redirect(Redirect),
}

/// Final outcome of a navigation after following redirects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settled {
    pub route: RouteMatch,
    pub redirects: Vec<Redirect>,
}

/// Ordered route table. The first matching route wins; unmatched locations
/// replace-redirect to the fallback.
#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: Vec<Route>,
    fallback: String,
}

impl RouteTable {
    pub fn new<S: Into<String>>(fallback: S) -> Self {
        Self { routes: Vec::new(), fallback: fallback.into() }
    }

    pub fn view(mut self, pattern: &str, guard: Option<Guard>, view: View) -> Self {
        self.routes.push(Route { segments: split_path(pattern).into_iter().map(String::from).collect(), guard, target: Target::View(view) });
        self
    }

    pub fn redirect(mut self, pattern: &str, to: &str) -> Self {
        self.routes.push(Route { segments: split_path(pattern).into_iter().map(String::from).collect(), guard: None, target: Target::Redirect(to.to_string()) });
        self
    }

    /// The console's routes.
    pub fn dicri() -> Self {
        RouteTable::new(DASHBOARD_PATH)
            .view("/login", Some(Guard::PublicOnly), View::Login)
            .view("/request-reset", Some(Guard::PublicOnly), View::RequestReset)
            .view("/reset-password", Some(Guard::PublicOnly), View::ResetPassword)
            .view("/dashboard", Some(Guard::Authenticated), View::Dashboard)
            .view("/profile", Some(Guard::Authenticated), View::Profile)
            .view(
                "/settings",
                Some(Guard::Permission(PermissionRequirement::by_id(catalog::MANAGE_SYSTEM).with_name(catalog::MANAGE_SYSTEM_NAME))),
                View::Settings,
            )
            .view("/expedientes", Some(Guard::permission_id(catalog::VIEW_CASES)), View::CaseList)
            .view("/expedientes/nuevo", Some(Guard::permission_id(catalog::CREATE_CASE)), View::CaseCreate)
            .view("/expedientes/:id", Some(Guard::permission_id(catalog::VIEW_CASES)), View::CaseDetail)
            .view("/expedientes/:id/editar", Some(Guard::permission_id(catalog::EDIT_CASE)), View::CaseEdit)
            .view("/error/unauthorized", None, View::Unauthorized)
            .view("/error/forbidden", None, View::Forbidden)
            .redirect("/", DASHBOARD_PATH)
    }

    /// One resolution step for `location` under `session`.
    pub fn resolve(&self, location: &str, session: Option<&Session>) -> Resolution {
        let path = path_of(location);
        for route in &self.routes {
            let Some(params) = route.matches(path) else { continue };
            tprintln!("route.resolve location={} params={:?}", location, params);
            if let Some(guard) = &route.guard {
                if let GuardDecision::Redirect(r) = guard.decide(session) {
                    return Resolution::Redirect(r);
                }
            }
            return match &route.target {
                Target::View(view) => Resolution::Render(RouteMatch { view: *view, location: location.to_string(), params }),
                Target::Redirect(to) => Resolution::Redirect(Redirect::replace(to.clone())),
            };
        }
        Resolution::Redirect(Redirect::replace(self.fallback.clone()))
    }

    /// Resolve and follow redirects until a view renders.
    pub fn settle(&self, location: &str, session: Option<&Session>) -> AppResult<Settled> {
        let mut redirects = Vec::new();
        let mut current = location.to_string();
        loop {
            match self.resolve(&current, session) {
                Resolution::Render(route) => return Ok(Settled { route, redirects }),
                Resolution::Redirect(r) => {
                    if redirects.len() >= MAX_REDIRECTS {
                        return Err(AppError::internal("redirect_loop".to_string(), format!("too many redirects starting at {}", location)));
                    }
                    current = r.to.clone();
                    redirects.push(r);
                }
            }
        }
    }
}
