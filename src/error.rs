//! Unified application error model.
//! Every fallible operation in the console (API calls, form validation, session
//! persistence) surfaces one of these variants; the API client maps HTTP
//! statuses onto them and the console decides what the user sees.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AppError {
    /// Client-side form rejection. The request was never sent.
    Validation { code: String, message: String },
    /// 401 from the backend.
    Auth { code: String, message: String },
    /// 403 from the backend.
    Forbidden { code: String, message: String },
    NotFound { code: String, message: String },
    Conflict { code: String, message: String },
    /// Any other non-success status, left to the caller.
    Remote { status: u16, code: String, message: String },
    /// Network failure, timeout, or an undecodable body.
    Transport { code: String, message: String },
    Cancelled { code: String, message: String },
    Storage { code: String, message: String },
    Internal { code: String, message: String },
}

impl AppError {
    pub fn code_str(&self) -> &str {
        match self {
            AppError::Validation { code, .. }
            | AppError::Auth { code, .. }
            | AppError::Forbidden { code, .. }
            | AppError::NotFound { code, .. }
            | AppError::Conflict { code, .. }
            | AppError::Remote { code, .. }
            | AppError::Transport { code, .. }
            | AppError::Cancelled { code, .. }
            | AppError::Storage { code, .. }
            | AppError::Internal { code, .. } => code.as_str(),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            AppError::Validation { message, .. }
            | AppError::Auth { message, .. }
            | AppError::Forbidden { message, .. }
            | AppError::NotFound { message, .. }
            | AppError::Conflict { message, .. }
            | AppError::Remote { message, .. }
            | AppError::Transport { message, .. }
            | AppError::Cancelled { message, .. }
            | AppError::Storage { message, .. }
            | AppError::Internal { message, .. } => message.as_str(),
        }
    }

    pub fn validation<S: Into<String>>(code: S, msg: S) -> Self { AppError::Validation { code: code.into(), message: msg.into() } }
    pub fn auth<S: Into<String>>(code: S, msg: S) -> Self { AppError::Auth { code: code.into(), message: msg.into() } }
    pub fn forbidden<S: Into<String>>(code: S, msg: S) -> Self { AppError::Forbidden { code: code.into(), message: msg.into() } }
    pub fn not_found<S: Into<String>>(code: S, msg: S) -> Self { AppError::NotFound { code: code.into(), message: msg.into() } }
    pub fn conflict<S: Into<String>>(code: S, msg: S) -> Self { AppError::Conflict { code: code.into(), message: msg.into() } }
    pub fn transport<S: Into<String>>(code: S, msg: S) -> Self { AppError::Transport { code: code.into(), message: msg.into() } }
    pub fn cancelled() -> Self { AppError::Cancelled { code: "cancelled".into(), message: "request cancelled".into() } }
    pub fn storage<S: Into<String>>(code: S, msg: S) -> Self { AppError::Storage { code: code.into(), message: msg.into() } }
    pub fn internal<S: Into<String>>(code: S, msg: S) -> Self { AppError::Internal { code: code.into(), message: msg.into() } }

    /// Build the error for a non-success HTTP status. `message` is the server's
    /// envelope message when one could be decoded.
    pub fn from_status(status: u16, message: Option<String>) -> Self {
        let message = message.filter(|m| !m.is_empty()).unwrap_or_else(|| format!("request failed with HTTP {}", status));
        match status {
            401 => AppError::Auth { code: "unauthorized".into(), message },
            403 => AppError::Forbidden { code: "forbidden".into(), message },
            404 => AppError::NotFound { code: "not_found".into(), message },
            409 => AppError::Conflict { code: "conflict".into(), message },
            s => AppError::Remote { status: s, code: "remote_error".into(), message },
        }
    }

    /// Map back to an HTTP status where one applies.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            AppError::Auth { .. } => Some(401),
            AppError::Forbidden { .. } => Some(403),
            AppError::NotFound { .. } => Some(404),
            AppError::Conflict { .. } => Some(409),
            AppError::Remote { status, .. } => Some(*status),
            AppError::Validation { .. } => Some(400),
            AppError::Transport { .. }
            | AppError::Cancelled { .. }
            | AppError::Storage { .. }
            | AppError::Internal { .. } => None,
        }
    }

    /// 401 or 403.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, AppError::Auth { .. } | AppError::Forbidden { .. })
    }
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code_str(), self.message())
    }
}

impl std::error::Error for AppError {}

pub type AppResult<T> = Result<T, AppError>;

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return AppError::Transport { code: "timeout".into(), message: err.to_string() };
        }
        if err.is_decode() {
            return AppError::Transport { code: "decode_error".into(), message: err.to_string() };
        }
        if let Some(status) = err.status() {
            return AppError::from_status(status.as_u16(), None);
        }
        AppError::Transport { code: "network_error".into(), message: err.to_string() }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Transport { code: "decode_error".into(), message: err.to_string() }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Storage { code: "io_error".into(), message: err.to_string() }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal { code: "internal".into(), message: err.to_string() }
    }
}
