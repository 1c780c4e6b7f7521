//! Core `adapters` crate for abstracting request and identity persistence.
//!
//! This crate defines the [`RequestStore`] and [`IdentityStore`] traits, which
//! outline the operations the backend needs from a persistence layer, and
//! provides the concrete implementations (JSON files, SQLite). The backend
//! holds an `Arc<dyn Storage>` and never learns which one it got.

pub mod errors;
pub mod file;
pub mod models;
pub mod sqlite;

use async_trait::async_trait;

pub use errors::{StoreError, StoreResult};
pub use file::JsonFileStore;
pub use models::{
    NewServiceRequest, NewUser, PatchError, RequestField, RequestPatch, RequestStatus,
    ServiceRequest, User, UserSummary, FIELD_MAP,
};
pub use sqlite::SqliteStore;

/// Persistence of service requests.
#[async_trait]
pub trait RequestStore: Send + Sync {
    /// Inserts a request with status `new` and returns its id.
    async fn create_request(&self, new: NewServiceRequest) -> StoreResult<i64>;

    async fn get_request(&self, id: i64) -> StoreResult<Option<ServiceRequest>>;

    /// All requests, newest `created_at` first (ties: highest id first).
    async fn list_requests(&self) -> StoreResult<Vec<ServiceRequest>>;

    /// Applies `patch` and stamps `updated_at`. An empty patch returns
    /// `false` without touching the row.
    async fn update_request(&self, id: i64, patch: &RequestPatch) -> StoreResult<bool>;

    /// Marks the request completed. Re-completing refreshes the timestamps.
    async fn complete_request(&self, id: i64) -> StoreResult<bool>;

    async fn delete_request(&self, id: i64) -> StoreResult<bool>;
}

/// Persistence of staff accounts.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>>;

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// Fails with [`StoreError::Conflict`] when the username or email is taken.
    async fn create_user(&self, new: NewUser) -> StoreResult<i64>;

    async fn list_users(&self) -> StoreResult<Vec<UserSummary>>;

    async fn count_users(&self) -> StoreResult<usize>;
}

/// A complete storage backend.
#[async_trait]
pub trait Storage: RequestStore + IdentityStore {
    fn backend_name(&self) -> &'static str;

    async fn health_check(&self) -> StoreResult<()>;
}
