//! Well-known permission grants of the DICRI backend.
//!
//! Ids are the authoritative key; names are kept for screens and routes that
//! still check by name.

/// Create a case (expediente).
pub const CREATE_CASE: u32 = 1;
/// View cases.
pub const VIEW_CASES: u32 = 2;
/// Edit a case.
pub const EDIT_CASE: u32 = 3;
/// Approve or reject a case under review.
pub const APPROVE_CASE: u32 = 5;
/// Register an evidence item (indicio) on a case.
pub const CREATE_EVIDENCE: u32 = 6;
/// Manage users, roles, and assignments.
pub const MANAGE_SYSTEM: u32 = 11;

pub const MANAGE_SYSTEM_NAME: &str = "gestionar_sistema";

/// Backend names of the grants above, as sent in the name-list schema.
const NAMES: [(u32, &str); 6] = [
    (CREATE_CASE, "crear_expediente"),
    (VIEW_CASES, "ver_expedientes"),
    (EDIT_CASE, "editar_expediente"),
    (APPROVE_CASE, "aprobar_expedientes"),
    (CREATE_EVIDENCE, "crear_indicio"),
    (MANAGE_SYSTEM, MANAGE_SYSTEM_NAME),
];

pub fn id_for_name(name: &str) -> Option<u32> {
    NAMES.iter().find(|(_, n)| *n == name).map(|(id, _)| *id)
}

pub fn name_for_id(id: u32) -> Option<&'static str> {
    NAMES.iter().find(|(i, _)| *i == id).map(|(_, n)| *n)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_and_ids_agree() {
        assert_eq!(id_for_name("gestionar_sistema"), Some(MANAGE_SYSTEM));
        assert_eq!(name_for_id(VIEW_CASES), Some("ver_expedientes"));
        for (id, name) in NAMES {
            assert_eq!(name_for_id(id).and_then(id_for_name), Some(id));
            assert_eq!(id_for_name(name).and_then(name_for_id), Some(name));
        }
        assert_eq!(id_for_name("Gestionar_Sistema"), None);
        assert_eq!(name_for_id(99), None);
    }
}
