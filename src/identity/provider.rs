use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::api::ApiClient;
use crate::error::AppResult;
use crate::tprintln;
use crate::validation::{ChangePasswordForm, Form, LoginForm, ProfileForm, RequestResetForm, ResetPasswordForm};

use super::principal::{Principal, UserRecord};

#[derive(Debug, Clone)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginResponse {
    pub principal: Principal,
    /// The account must set a new password before doing anything else.
    pub requires_password_change: bool,
}

#[derive(Debug, Deserialize)]
struct LoginPayload {
    token: String,
    user: UserRecord,
    #[serde(default, rename = "requiereCambioPassword")]
    requires_password_change: bool,
}

/// Body of `PUT /auth/profile`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileUpdate {
    pub nombre: String,
    pub apellido: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub telefono: Option<String>,
}

impl From<&ProfileForm> for ProfileUpdate {
    fn from(f: &ProfileForm) -> Self {
        Self {
            nombre: f.nombre.trim().to_string(),
            apellido: f.apellido.trim().to_string(),
            telefono: f.telefono.clone().filter(|t| !t.trim().is_empty()),
        }
    }
}

/// Account flows against `/auth/*`. Login is the only one that writes the
/// session; logout never reaches the server.
#[derive(Debug, Clone)]
pub struct AuthService {
    api: ApiClient,
}

impl AuthService {
    pub fn new(api: ApiClient) -> Self { Self { api } }

    /// Bad credentials come back as `AppError::Auth` with the server's message;
    /// the session is left untouched and nothing navigates.
    pub async fn login(&self, req: &LoginRequest) -> AppResult<LoginResponse> {
        LoginForm { email: req.email.clone(), password: req.password.clone() }.validate()?;
        let body = json!({ "email": req.email.trim(), "password": req.password });
        let payload: LoginPayload = self.api.post_data("/auth/login", &body, None).await?;
        let principal = Principal::from(payload.user);
        self.api.store().set_auth(principal.clone(), payload.token)?;
        info!(target: "session", "login ok user id={} role={}", principal.id, principal.role_name());
        Ok(LoginResponse { principal, requires_password_change: payload.requires_password_change })
    }

    pub fn logout(&self) {
        self.api.store().logout();
        info!(target: "session", "logged out");
    }

    pub async fn request_reset(&self, email: &str) -> AppResult<String> {
        RequestResetForm { email: email.to_string() }.validate()?;
        self.api.post_unit("/auth/request-reset", &json!({ "email": email.trim() }), None).await
    }

    pub async fn reset_password(&self, form: &ResetPasswordForm) -> AppResult<String> {
        form.validate()?;
        let body = json!({ "token": form.token, "newPassword": form.new_password });
        self.api.post_unit("/auth/reset-password", &body, None).await
    }

    pub async fn change_password(&self, form: &ChangePasswordForm) -> AppResult<String> {
        form.validate()?;
        let body = json!({ "currentPassword": form.current_password, "newPassword": form.new_password });
        self.api.post_unit("/auth/change-password", &body, None).await
    }

    pub async fn profile(&self, cancel: Option<&CancellationToken>) -> AppResult<Principal> {
        let user: UserRecord = self.api.get_data("/auth/profile", cancel).await?;
        Ok(user.into())
    }

    /// Saves the profile, then mirrors the new names into the current session.
    pub async fn update_profile(&self, form: &ProfileForm) -> AppResult<String> {
        form.validate()?;
        let update = ProfileUpdate::from(form);
        let message = self.api.put_unit("/auth/profile", &update, None).await?;
        let store = self.api.store();
        let Some(session) = store.snapshot() else { return Ok(message) };
        let mut principal = session.principal.clone();
        principal.first_name = update.nombre;
        principal.last_name = update.apellido;
        if update.telefono.is_some() {
            principal.phone = update.telefono;
        }
        store.set_auth(principal, session.token.clone())?;
        tprintln!("auth.update_profile user={}", session.principal.id);
        Ok(message)
    }
}
