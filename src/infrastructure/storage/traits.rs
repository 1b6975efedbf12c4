//! Storage trait definitions

use async_trait::async_trait;

use crate::domain::DomainResult;

/// Client-local key-value cell holding serialized session records.
///
/// Values are opaque strings; parsing is the caller's concern so that a
/// corrupt value can be told apart from a failing backend.
#[async_trait]
pub trait SessionStorage: Send + Sync {
    async fn get(&self, key: &str) -> DomainResult<Option<String>>;
    async fn set(&self, key: &str, value: String) -> DomainResult<()>;
    /// Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> DomainResult<()>;
}
