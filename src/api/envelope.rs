use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// `{ success, message, data }`, the shape every backend endpoint answers with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default = "Option::default")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self { Self { success: true, message: String::new(), data: Some(data) } }

    /// The payload of a successful envelope.
    pub fn into_data(self) -> AppResult<T> {
        if !self.success {
            return Err(unsuccessful(self.message));
        }
        self.data.ok_or_else(|| AppError::transport("decode_error", "response envelope carried no data"))
    }

    /// Success check for endpoints whose payload is irrelevant.
    pub fn into_unit(self) -> AppResult<String> {
        if !self.success {
            return Err(unsuccessful(self.message));
        }
        Ok(self.message)
    }
}

fn unsuccessful(message: String) -> AppError {
    let message = if message.is_empty() { "request was not successful".to_string() } else { message };
    AppError::Remote { status: 200, code: "unsuccessful".into(), message }
}

/// Envelope message of an error body, if it decodes as one.
pub fn error_message(body: &[u8]) -> Option<String> {
    serde_json::from_slice::<ApiResponse<serde_json::Value>>(body)
        .ok()
        .map(|env| env.message)
        .filter(|m| !m.is_empty())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u32,
}

/// List envelope: `data` is the page and `pagination` sits beside it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
    pub pagination: Pagination,
}

impl<T> PaginatedResponse<T> {
    pub fn into_page(self) -> AppResult<(Vec<T>, Pagination)> {
        if !self.success {
            return Err(unsuccessful(self.message));
        }
        Ok((self.data, self.pagination))
    }
}
