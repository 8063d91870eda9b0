use std::sync::Arc;

use dicri_console::app::App;
use dicri_console::config::ClientConfig;
use dicri_console::identity::{Grant, PermissionRef, PermissionSet, Principal, Role, Session, SessionStore, UserRecord};
use dicri_console::routes::{Guard, PermissionRequirement, Resolution, RouteTable, View};

fn principal(ids: &[u32]) -> Principal {
    Principal {
        id: 21,
        first_name: "Marta".into(),
        last_name: "Cifuentes".into(),
        email: "mcifuentes@mp.gob.gt".into(),
        dpi: None,
        phone: None,
        active: Some(true),
        role: Some(Role { id: Some(2), name: "Técnico".into(), description: None }),
        permissions: PermissionSet::new(ids.iter().map(|i| Grant::with_id(*i, format!("perm_{}", i))).collect()),
    }
}

fn app() -> App {
    let cfg = ClientConfig::default().without_persistence();
    App::with_store(cfg, Arc::new(SessionStore::in_memory())).unwrap()
}

fn signed_in(ids: &[u32]) -> App {
    let app = app();
    app.store().set_auth(principal(ids), "tok").unwrap();
    app
}

#[test]
fn unauthenticated_dashboard_goes_to_login() {
    let app = app();
    let route = app.navigate("/dashboard").unwrap();
    assert_eq!(route.view, View::Login);
    assert_eq!(app.location(), "/login");
    // the denied location was replaced, not kept
    assert!(!app.navigator().history().entries().iter().any(|e| e == "/dashboard"));
}

#[test]
fn missing_permission_goes_to_forbidden() {
    let app = signed_in(&[2]);
    let route = app.navigate("/expedientes/nuevo").unwrap();
    assert_eq!(route.view, View::Forbidden);
    assert_eq!(app.location(), "/error/forbidden");
    assert!(app.store().is_authenticated());
}

#[test]
fn settings_with_permission_renders() {
    let app = signed_in(&[11]);
    let route = app.navigate("/settings").unwrap();
    assert_eq!(route.view, View::Settings);
    assert_eq!(app.location(), "/settings");
}

fn rendered(table: &RouteTable, location: &str, session: Option<&Session>) -> Option<View> {
    match table.resolve(location, session) {
        Resolution::Render(m) => Some(m.view),
        Resolution::Redirect(_) => None,
    }
}

#[test]
fn unconstrained_guard_matches_authenticated_only() {
    let open = RouteTable::new("/a")
        .view("/a", Some(Guard::Authenticated), View::Dashboard)
        .view("/b", Some(Guard::Permission(PermissionRequirement::none())), View::Dashboard)
        .view("/login", Some(Guard::PublicOnly), View::Login);
    let store = SessionStore::in_memory();
    for ids in [&[][..], &[4][..], &[1, 2, 3][..]] {
        store.set_auth(principal(ids), "tok").unwrap();
        let snap = store.snapshot();
        assert_eq!(rendered(&open, "/a", snap.as_deref()), rendered(&open, "/b", snap.as_deref()));
        assert_eq!(open.settle("/b", snap.as_deref()).unwrap().route.view, View::Dashboard);
    }
    store.logout();
    assert_eq!(open.settle("/b", None).unwrap().route.view, View::Login);
}

#[test]
fn public_pages_bounce_authenticated_users() {
    let app = signed_in(&[]);
    assert_eq!(app.navigate("/login").unwrap().view, View::Dashboard);
    assert_eq!(app.navigate("/reset-password?token=abc").unwrap().view, View::Dashboard);
}

#[test]
fn back_never_returns_to_a_denied_route() {
    let app = signed_in(&[2]);
    app.navigate("/dashboard").unwrap();
    app.navigate("/expedientes").unwrap();
    assert_eq!(app.navigate("/settings").unwrap().view, View::Forbidden);
    let back = app.back().unwrap().unwrap();
    assert_eq!(back.view, View::CaseList);
    assert_eq!(app.location(), "/expedientes");
}

#[test]
fn detail_and_edit_need_different_permissions() {
    let app = signed_in(&[2]);
    let detail = app.navigate("/expedientes/15").unwrap();
    assert_eq!(detail.view, View::CaseDetail);
    assert_eq!(detail.param("id"), Some("15"));
    assert_eq!(app.navigate("/expedientes/15/editar").unwrap().view, View::Forbidden);
}

#[test]
fn logout_lands_on_login_and_clears_session() {
    let app = signed_in(&[2, 11]);
    app.navigate("/settings").unwrap();
    let route = app.logout().unwrap();
    assert_eq!(route.view, View::Login);
    assert!(!app.store().is_authenticated());
    // a second logout changes nothing
    assert_eq!(app.logout().unwrap().view, View::Login);
}

#[test]
fn session_change_is_seen_on_next_settle() {
    let app = signed_in(&[11]);
    app.navigate("/settings").unwrap();
    app.store().set_auth(principal(&[2]), "tok-2").unwrap();
    assert_eq!(app.settle().unwrap().view, View::Forbidden);
}

#[test]
fn menu_and_permission_checks_follow_session() {
    let app = app();
    assert!(!app.can(&PermissionRef::Id(2)));
    app.store().set_auth(principal(&[2]), "tok").unwrap();
    let titles: Vec<_> = app.menu().iter().map(|m| m.title).collect();
    assert_eq!(titles, vec!["Dashboard", "Expedientes"]);
    assert!(app.can(&"perm_2".into()));
    assert!(!app.can(&PermissionRef::Id(11)));
}

#[test]
fn name_list_grants_open_id_gated_routes() {
    let app = app();
    let user: UserRecord = serde_json::from_value(serde_json::json!({
        "id": 30,
        "nombre": "Sofía",
        "apellido": "Morales",
        "email": "smorales@mp.gob.gt",
        "rol": "Administrador",
        "permisos": ["gestionar_sistema", "ver_expedientes"]
    }))
    .unwrap();
    app.store().set_auth(user, "tok").unwrap();
    assert_eq!(app.navigate("/settings").unwrap().view, View::Settings);
    assert_eq!(app.navigate("/expedientes").unwrap().view, View::CaseList);
    assert_eq!(app.navigate("/expedientes/nuevo").unwrap().view, View::Forbidden);
    let titles: Vec<_> = app.menu().iter().map(|m| m.title).collect();
    assert_eq!(titles, vec!["Dashboard", "Expedientes", "Configuración"]);
}
