//! Client-side form rules. A rejected form never reaches the network; its
//! field errors travel inside `AppError::Validation`.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

static EMAIL_RE: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").ok());

pub const MIN_PASSWORD_LEN: usize = 6;
pub const MIN_NAME_LEN: usize = 2;

/// Field name -> messages, in field order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self { Self::default() }

    pub fn add(&mut self, field: &str, message: &str) {
        self.0.entry(field.to_string()).or_default().push(message.to_string());
    }

    pub fn is_empty(&self) -> bool { self.0.is_empty() }

    pub fn get(&self, field: &str) -> &[String] {
        self.0.get(field).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> { self.0.keys().map(|k| k.as_str()) }

    /// Ok when nothing was recorded, otherwise a validation error listing every field.
    pub fn into_result(self) -> AppResult<()> {
        if self.is_empty() {
            return Ok(());
        }
        let message = self
            .0
            .iter()
            .map(|(field, msgs)| format!("{}: {}", field, msgs.join(", ")))
            .collect::<Vec<_>>()
            .join("; ");
        Err(AppError::Validation { code: "invalid_form".into(), message })
    }
}

pub trait Form {
    fn errors(&self) -> FieldErrors;

    fn validate(&self) -> AppResult<()> { self.errors().into_result() }
}

fn check_email(errs: &mut FieldErrors, email: &str) {
    let valid = EMAIL_RE.as_ref().map(|re| re.is_match(email.trim())).unwrap_or(false);
    if !valid {
        errs.add("email", "Ingrese un email válido");
    }
}

fn check_new_password(errs: &mut FieldErrors, new_password: &str, confirm: &str) {
    if new_password.chars().count() < MIN_PASSWORD_LEN {
        errs.add("newPassword", "La contraseña debe tener al menos 6 caracteres");
    }
    if !new_password.chars().any(|c| c.is_ascii_uppercase()) {
        errs.add("newPassword", "Debe contener al menos una mayúscula");
    }
    if !new_password.chars().any(|c| c.is_ascii_digit()) {
        errs.add("newPassword", "Debe contener al menos un número");
    }
    if new_password != confirm {
        errs.add("confirmPassword", "Las contraseñas no coinciden");
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl Form for LoginForm {
    fn errors(&self) -> FieldErrors {
        let mut errs = FieldErrors::new();
        check_email(&mut errs, &self.email);
        if self.password.is_empty() {
            errs.add("password", "La contraseña es requerida");
        }
        errs
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestResetForm {
    pub email: String,
}

impl Form for RequestResetForm {
    fn errors(&self) -> FieldErrors {
        let mut errs = FieldErrors::new();
        check_email(&mut errs, &self.email);
        errs
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetPasswordForm {
    pub token: String,
    pub new_password: String,
    pub confirm_password: String,
}

impl Form for ResetPasswordForm {
    fn errors(&self) -> FieldErrors {
        let mut errs = FieldErrors::new();
        if self.token.trim().is_empty() {
            errs.add("token", "El enlace de restablecimiento no es válido");
        }
        check_new_password(&mut errs, &self.new_password, &self.confirm_password);
        errs
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangePasswordForm {
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

impl Form for ChangePasswordForm {
    fn errors(&self) -> FieldErrors {
        let mut errs = FieldErrors::new();
        if self.current_password.is_empty() {
            errs.add("currentPassword", "La contraseña actual es requerida");
        }
        check_new_password(&mut errs, &self.new_password, &self.confirm_password);
        errs
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileForm {
    pub nombre: String,
    pub apellido: String,
    pub telefono: Option<String>,
}

impl Form for ProfileForm {
    fn errors(&self) -> FieldErrors {
        let mut errs = FieldErrors::new();
        if self.nombre.trim().chars().count() < MIN_NAME_LEN {
            errs.add("nombre", "El nombre debe tener al menos 2 caracteres");
        }
        if self.apellido.trim().chars().count() < MIN_NAME_LEN {
            errs.add("apellido", "El apellido debe tener al menos 2 caracteres");
        }
        errs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_form() {
        let ok = LoginForm { email: "tecnico@mp.gob.gt".into(), password: "x".into() };
        assert!(ok.validate().is_ok());
        let bad = LoginForm { email: "tecnico".into(), password: String::new() };
        let errs = bad.errors();
        assert_eq!(errs.fields().collect::<Vec<_>>(), vec!["email", "password"]);
        let err = bad.validate().unwrap_err();
        assert_eq!(err.code_str(), "invalid_form");
        assert!(err.message().contains("La contraseña es requerida"));
    }

    #[test]
    fn password_rules_accumulate() {
        let f = ResetPasswordForm { token: "t".into(), new_password: "abc".into(), confirm_password: "abd".into() };
        let errs = f.errors();
        assert_eq!(errs.get("newPassword").len(), 3);
        assert_eq!(errs.get("confirmPassword"), &["Las contraseñas no coinciden".to_string()]);

        let f = ResetPasswordForm { token: "t".into(), new_password: "Clave1".into(), confirm_password: "Clave1".into() };
        assert!(f.validate().is_ok());
    }

    #[test]
    fn change_password_needs_current() {
        let f = ChangePasswordForm { current_password: String::new(), new_password: "Nueva99".into(), confirm_password: "Nueva99".into() };
        assert_eq!(f.errors().fields().collect::<Vec<_>>(), vec!["currentPassword"]);
    }

    #[test]
    fn profile_names() {
        let f = ProfileForm { nombre: "A".into(), apellido: "López".into(), telefono: None };
        assert_eq!(f.errors().get("nombre").len(), 1);
        assert!(f.errors().get("apellido").is_empty());
    }
}
