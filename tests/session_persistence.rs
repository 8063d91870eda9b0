use std::sync::Arc;

use serde_json::json;

use dicri_console::config::{ClientConfig, SESSION_FILE_ENV};
use dicri_console::identity::{decode_session, FileStorage, SessionStorage, SessionStore, UserRecord};

fn legacy_user() -> UserRecord {
    serde_json::from_value(json!({
        "id": 12,
        "nombre": "Carlos",
        "apellido": "Ramírez",
        "email": "cramirez@mp.gob.gt",
        "rol": "Coordinador",
        "permisos": ["ver_expedientes", "aprobar_expedientes"]
    }))
    .unwrap()
}

#[test]
fn session_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("auth-storage.json");
    {
        let store = SessionStore::open(Arc::new(FileStorage::new(&path)));
        assert!(!store.is_authenticated());
        store.set_auth(legacy_user(), "tok-abc").unwrap();
    }
    assert!(path.exists());

    let reopened = SessionStore::open(Arc::new(FileStorage::new(&path)));
    assert!(reopened.is_authenticated());
    assert_eq!(reopened.token().as_deref(), Some("tok-abc"));
    let p = reopened.principal().unwrap();
    assert_eq!(p.full_name(), "Carlos Ramírez");
    assert_eq!(p.role_name(), "Coordinador");
    assert!(p.permissions.contains_name("aprobar_expedientes"));
}

#[test]
fn persisted_shape_is_versioned_envelope() {
    let dir = tempfile::tempdir().unwrap();
    let storage = FileStorage::new(dir.path().join("s.json"));
    let store = SessionStore::open(Arc::new(storage.clone()));
    store.set_auth(legacy_user(), "tok-abc").unwrap();

    let raw = storage.load().unwrap().unwrap();
    let v: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(v["version"], 0);
    assert_eq!(v["state"]["token"], "tok-abc");
    assert_eq!(v["state"]["isAuthenticated"], true);
    assert_eq!(decode_session(&raw).unwrap().unwrap().principal.id, 12);
}

#[test]
fn logout_removes_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("auth-storage.json");
    let store = SessionStore::open(Arc::new(FileStorage::new(&path)));
    store.set_auth(legacy_user(), "tok-abc").unwrap();
    store.logout();
    assert!(!path.exists());
    assert!(!SessionStore::open(Arc::new(FileStorage::new(&path))).is_authenticated());
}

#[test]
fn garbage_file_is_discarded() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("auth-storage.json");
    std::fs::write(&path, "{ not json").unwrap();
    let store = SessionStore::open(Arc::new(FileStorage::new(&path)));
    assert!(store.snapshot().is_none());
    assert!(!path.exists());
}

#[test]
fn half_session_is_discarded() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("auth-storage.json");
    std::fs::write(&path, r#"{"state":{"user":null,"token":"solo-token","isAuthenticated":true},"version":0}"#).unwrap();
    let store = SessionStore::open(Arc::new(FileStorage::new(&path)));
    assert!(!store.is_authenticated());
    assert!(!path.exists());
}

#[test]
fn session_file_comes_from_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("from-env.json");
    let p = path.to_string_lossy().to_string();
    let cfg = ClientConfig::from_lookup(|k| if k == SESSION_FILE_ENV { Some(p.clone()) } else { None });
    assert_eq!(cfg.session_file.as_deref(), Some(path.as_path()));

    SessionStore::from_config(&cfg).set_auth(legacy_user(), "tok-xyz").unwrap();
    assert_eq!(SessionStore::from_config(&cfg).token().as_deref(), Some("tok-xyz"));

    let memory_only = cfg.without_persistence();
    let store = SessionStore::from_config(&memory_only);
    assert!(!store.is_authenticated());
}
