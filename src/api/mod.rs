//! Transport to the backend REST API: the response envelope, the shared
//! error policy, and the client that applies both to every call.

mod client;
mod envelope;
pub mod interceptor;

pub use client::ApiClient;
pub use envelope::{error_message, ApiResponse, PaginatedResponse, Pagination};
pub use interceptor::ErrorAction;
