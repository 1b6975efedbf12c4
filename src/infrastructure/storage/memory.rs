//! In-memory storage implementation

use async_trait::async_trait;
use dashmap::DashMap;

use super::SessionStorage;
use crate::domain::DomainResult;

/// In-memory storage for development and testing.
///
/// Clones share nothing; wrap in an `Arc` to hand the same cell to
/// several session stores (e.g. to simulate a reload).
#[derive(Debug, Default)]
pub struct InMemorySessionStorage {
    entries: DashMap<String, String>,
}

impl InMemorySessionStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl SessionStorage for InMemorySessionStorage {
    async fn get(&self, key: &str) -> DomainResult<Option<String>> {
        Ok(self.entries.get(key).map(|v| v.value().clone()))
    }

    async fn set(&self, key: &str, value: String) -> DomainResult<()> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> DomainResult<()> {
        self.entries.remove(key);
        Ok(())
    }
}
