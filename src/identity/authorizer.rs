use std::fmt::{Display, Formatter};
use std::str::FromStr;

use super::principal::{Grant, Principal};
use super::session::Session;

/// A permission requirement, by numeric id or by (legacy) name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PermissionRef {
    Id(u32),
    Name(String),
}

impl From<u32> for PermissionRef {
    fn from(id: u32) -> Self { PermissionRef::Id(id) }
}

impl From<&str> for PermissionRef {
    fn from(name: &str) -> Self { PermissionRef::Name(name.to_string()) }
}

impl From<String> for PermissionRef {
    fn from(name: String) -> Self { PermissionRef::Name(name) }
}

/// Numeric text parses as an id, anything else as a name.
impl FromStr for PermissionRef {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let t = s.trim();
        Ok(match t.parse::<u32>() {
            Ok(id) => PermissionRef::Id(id),
            Err(_) => PermissionRef::Name(t.to_string()),
        })
    }
}

impl Display for PermissionRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            PermissionRef::Id(id) => write!(f, "#{}", id),
            PermissionRef::Name(n) => write!(f, "{}", n),
        }
    }
}

/// Read-only permission queries over one session snapshot.
/// Every query answers false when there is no session; nothing here errors.
#[derive(Debug, Clone, Copy)]
pub struct PermissionEvaluator<'a> {
    principal: Option<&'a Principal>,
}

impl<'a> PermissionEvaluator<'a> {
    pub fn new(principal: Option<&'a Principal>) -> Self { Self { principal } }

    pub fn for_session(session: Option<&'a Session>) -> Self {
        Self { principal: session.map(|s| &s.principal) }
    }

    pub fn has_permission_by_id(&self, id: u32) -> bool {
        self.principal.map(|p| p.permissions.contains_id(id)).unwrap_or(false)
    }

    pub fn has_permission_by_name(&self, name: &str) -> bool {
        self.principal.map(|p| p.permissions.contains_name(name)).unwrap_or(false)
    }

    pub fn has(&self, req: &PermissionRef) -> bool {
        match req {
            PermissionRef::Id(id) => self.has_permission_by_id(*id),
            PermissionRef::Name(name) => self.has_permission_by_name(name),
        }
    }

    /// Existential check. An empty request is never satisfied.
    pub fn has_any(&self, reqs: &[PermissionRef]) -> bool {
        self.principal.is_some() && reqs.iter().any(|r| self.has(r))
    }

    /// Universal check. An empty request is satisfied by any session.
    pub fn has_all(&self, reqs: &[PermissionRef]) -> bool {
        self.principal.is_some() && reqs.iter().all(|r| self.has(r))
    }

    pub fn permissions_by_module(&self, module: &'a str) -> Vec<&'a Grant> {
        match self.principal {
            Some(p) => p.permissions.in_module(module).collect(),
            None => Vec::new(),
        }
    }

    pub fn permissions(&self) -> &'a [Grant] {
        self.principal.map(|p| p.permissions.grants()).unwrap_or(&[])
    }
}
