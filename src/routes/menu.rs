use crate::identity::{catalog, PermissionEvaluator, Session};

/// Sidebar entry. `required` is the permission id that makes it visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MenuItem {
    pub title: &'static str,
    pub path: &'static str,
    pub required: Option<u32>,
}

pub const MENU: [MenuItem; 3] = [
    MenuItem { title: "Dashboard", path: "/dashboard", required: None },
    MenuItem { title: "Expedientes", path: "/expedientes", required: Some(catalog::VIEW_CASES) },
    MenuItem { title: "Configuración", path: "/settings", required: Some(catalog::MANAGE_SYSTEM) },
];

pub fn visible_items(session: Option<&Session>) -> Vec<MenuItem> {
    let ev = PermissionEvaluator::for_session(session);
    MENU.iter()
        .filter(|item| item.required.map(|id| ev.has_permission_by_id(id)).unwrap_or(true))
        .copied()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{Grant, PermissionSet, Principal};

    fn session(ids: &[u32]) -> Session {
        Session {
            token: "t".into(),
            principal: Principal {
                id: 1,
                first_name: "A".into(),
                last_name: "B".into(),
                email: String::new(),
                dpi: None,
                phone: None,
                active: None,
                role: None,
                permissions: PermissionSet::new(ids.iter().map(|i| Grant::with_id(*i, "p")).collect()),
            },
        }
    }

    #[test]
    fn menu_follows_permissions() {
        let titles = |ids: &[u32]| visible_items(Some(&session(ids))).iter().map(|m| m.title).collect::<Vec<_>>();
        assert_eq!(titles(&[]), vec!["Dashboard"]);
        assert_eq!(titles(&[2]), vec!["Dashboard", "Expedientes"]);
        assert_eq!(titles(&[2, 11]), vec!["Dashboard", "Expedientes", "Configuración"]);
    }
}
