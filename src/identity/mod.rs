//! Central identity and session management for the console.
//! Keep the public surface thin and split implementation across sub-modules.

mod principal;
mod session;
mod provider;
mod storage;
mod authorizer;
pub mod catalog;

pub use principal::{Grant, PermissionSet, PermissionWire, Principal, Role, RoleWire, UserRecord};
pub use session::{
    decode_session, encode_session, principal_slice, token_slice, Session, SessionSnapshot, SessionStore, SessionToken,
    SessionWatcher, PERSIST_VERSION,
};
pub use provider::{AuthService, LoginRequest, LoginResponse, ProfileUpdate};
pub use storage::{FileStorage, MemoryStorage, SessionStorage, StorageError};
pub use authorizer::{PermissionEvaluator, PermissionRef};
