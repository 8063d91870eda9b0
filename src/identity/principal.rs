//! The authenticated principal and the wire shapes it is built from.
//!
//! The backend has shipped two shapes for roles (plain name or a role record)
//! and two for permissions (permission records or bare names). Both are
//! accepted on the way in and normalized into `Role` / `PermissionSet` here,
//! so nothing downstream ever looks at the wire shape again.

use serde::{Deserialize, Serialize};

use super::catalog;

/// Role as sent by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RoleWire {
    Name(String),
    Record {
        id: u32,
        #[serde(rename = "nombreRol")]
        nombre_rol: String,
        #[serde(default)]
        descripcion: Option<String>,
    },
}

/// Permission grant as sent by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PermissionWire {
    Name(String),
    Record {
        id_permiso: u32,
        nombre_permiso: String,
        #[serde(default)]
        descripcion: Option<String>,
        #[serde(default)]
        modulo: Option<String>,
    },
}

/// User record as returned by `/auth/login` and `/auth/profile`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: u64,
    pub nombre: String,
    pub apellido: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub dpi: Option<String>,
    #[serde(default)]
    pub telefono: Option<String>,
    #[serde(default)]
    pub activo: Option<bool>,
    #[serde(default, rename = "idRol")]
    pub id_rol: Option<u32>,
    #[serde(default)]
    pub rol: Option<RoleWire>,
    #[serde(default)]
    pub permisos: Option<Vec<PermissionWire>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    #[serde(default)]
    pub id: Option<u32>,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl Role {
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() { "Usuario" } else { self.name.as_str() }
    }
}

impl From<RoleWire> for Role {
    fn from(w: RoleWire) -> Self {
        match w {
            RoleWire::Name(name) => Role { id: None, name, description: None },
            RoleWire::Record { id, nombre_rol, descripcion } => Role { id: Some(id), name: nombre_rol, description: descripcion },
        }
    }
}

/// One unit of authorization. Either key may be absent depending on the wire shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grant {
    #[serde(default)]
    pub id: Option<u32>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub module: Option<String>,
}

impl Grant {
    pub fn with_id<S: Into<String>>(id: u32, name: S) -> Self {
        Grant { id: Some(id), name: Some(name.into()), description: None, module: None }
    }

    pub fn named<S: Into<String>>(name: S) -> Self {
        Grant { id: None, name: Some(name.into()), description: None, module: None }
    }

    pub fn in_module<S: Into<String>>(mut self, module: S) -> Self {
        self.module = Some(module.into());
        self
    }
}

impl From<PermissionWire> for Grant {
    /// Bare names of well-known grants also get their id, so id checks and
    /// name checks agree under both wire shapes.
    fn from(w: PermissionWire) -> Self {
        match w {
            PermissionWire::Name(name) => Grant { id: catalog::id_for_name(&name), ..Grant::named(name) },
            PermissionWire::Record { id_permiso, nombre_permiso, descripcion, modulo } => Grant {
                id: Some(id_permiso),
                name: Some(nombre_permiso),
                description: descripcion,
                module: modulo,
            },
        }
    }
}

/// Canonical grant collection. Treated as a multiset: duplicates are kept and
/// every query is an existence check.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionSet {
    grants: Vec<Grant>,
}

impl PermissionSet {
    pub fn new(grants: Vec<Grant>) -> Self { Self { grants } }

    pub fn grants(&self) -> &[Grant] { &self.grants }

    pub fn is_empty(&self) -> bool { self.grants.is_empty() }

    pub fn len(&self) -> usize { self.grants.len() }

    pub fn contains_id(&self, id: u32) -> bool {
        self.grants.iter().any(|g| g.id == Some(id))
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.grants.iter().any(|g| g.name.as_deref() == Some(name))
    }

    pub fn in_module<'a>(&'a self, module: &'a str) -> impl Iterator<Item = &'a Grant> + 'a {
        self.grants.iter().filter(move |g| g.module.as_deref() == Some(module))
    }
}

impl FromIterator<Grant> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = Grant>>(iter: I) -> Self {
        PermissionSet { grants: iter.into_iter().collect() }
    }
}

impl From<Vec<PermissionWire>> for PermissionSet {
    fn from(wire: Vec<PermissionWire>) -> Self {
        wire.into_iter().map(Grant::from).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: u64,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub dpi: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub active: Option<bool>,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub permissions: PermissionSet,
}

impl Principal {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }

    pub fn role_name(&self) -> &str {
        self.role.as_ref().map(|r| r.display_name()).unwrap_or("Usuario")
    }
}

impl From<UserRecord> for Principal {
    fn from(u: UserRecord) -> Self {
        // A bare idRol without a role record still identifies the role.
        let role = match (u.rol, u.id_rol) {
            (Some(w), id_rol) => {
                let mut r = Role::from(w);
                if r.id.is_none() { r.id = id_rol; }
                Some(r)
            }
            (None, Some(id)) => Some(Role { id: Some(id), name: String::new(), description: None }),
            (None, None) => None,
        };
        Principal {
            id: u.id,
            first_name: u.nombre,
            last_name: u.apellido,
            email: u.email,
            dpi: u.dpi,
            phone: u.telefono,
            active: u.activo,
            role,
            permissions: u.permisos.map(PermissionSet::from).unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn user(rol: serde_json::Value, permisos: serde_json::Value) -> UserRecord {
        serde_json::from_value(json!({
            "id": 7,
            "nombre": "Ana",
            "apellido": "López",
            "email": "ana@mp.gob.gt",
            "rol": rol,
            "permisos": permisos,
        }))
        .unwrap()
    }

    #[test]
    fn role_as_plain_string() {
        let p = Principal::from(user(json!("Técnico"), json!([])));
        let role = p.role.unwrap();
        assert_eq!(role.name, "Técnico");
        assert_eq!(role.id, None);
    }

    #[test]
    fn role_as_record() {
        let p = Principal::from(user(json!({"id": 2, "nombreRol": "Coordinador", "descripcion": "coord"}), json!([])));
        assert_eq!(p.role, Some(Role { id: Some(2), name: "Coordinador".into(), description: Some("coord".into()) }));
        assert_eq!(p.role_name(), "Coordinador");
    }

    #[test]
    fn permission_records_are_normalized() {
        let p = Principal::from(user(
            json!("Admin"),
            json!([
                {"id_permiso": 11, "nombre_permiso": "gestionar_sistema", "descripcion": null, "modulo": "sistema"},
                {"id_permiso": 2, "nombre_permiso": "ver_expedientes", "descripcion": "ver", "modulo": "expedientes"}
            ]),
        ));
        assert!(p.permissions.contains_id(11));
        assert!(p.permissions.contains_name("ver_expedientes"));
        assert_eq!(p.permissions.in_module("expedientes").count(), 1);
    }

    #[test]
    fn permission_names_are_normalized() {
        let p = Principal::from(user(json!("Admin"), json!(["gestionar_sistema", "ver_expedientes", "firmar_actas"])));
        assert!(p.permissions.contains_name("gestionar_sistema"));
        assert!(p.permissions.contains_id(11));
        assert!(p.permissions.contains_id(2));
        assert_eq!(p.permissions.len(), 3);
        // unknown names stay name-only
        assert_eq!(p.permissions.grants()[2], Grant::named("firmar_actas"));
    }

    #[test]
    fn missing_role_and_permissions() {
        let u: UserRecord = serde_json::from_value(json!({"id": 1, "nombre": "X", "apellido": "Y", "idRol": 3})).unwrap();
        let p = Principal::from(u);
        assert_eq!(p.role.as_ref().and_then(|r| r.id), Some(3));
        assert_eq!(p.role_name(), "Usuario");
        assert!(p.permissions.is_empty());
        assert_eq!(p.full_name(), "X Y");
    }
}
