use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::RwLock;

use crate::store::StateBackend;

/// Thread-safe in-memory state store. Used by tests and by embedders that
/// don't need the lease record to survive a restart.
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently stored.
    pub fn len(&self) -> usize {
        self.entries.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().unwrap().is_empty()
    }
}

#[async_trait]
impl StateBackend for MemoryStore {
    async fn get(&self, key: &str) -> anyhow::Result<Option<Vec<u8>>> {
        Ok(self.entries.read().unwrap().get(key).cloned())
    }

    async fn put(&self, key: &str, value: &[u8]) -> anyhow::Result<()> {
        self.entries
            .write()
            .unwrap()
            .insert(key.to_string(), value.to_vec());
        Ok(())
    }

    async fn delete(&self, key: &str) -> anyhow::Result<()> {
        self.entries.write().unwrap().remove(key);
        Ok(())
    }

    async fn list_prefix(&self, prefix: &str) -> anyhow::Result<Vec<(String, Vec<u8>)>> {
        let entries = self.entries.read().unwrap();
        Ok(entries
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_get_delete_round_trip() {
        let store = MemoryStore::new();
        store.put("/registry/lock/deadline_ms", b"60000").await.unwrap();
        assert_eq!(
            store.get("/registry/lock/deadline_ms").await.unwrap(),
            Some(b"60000".to_vec())
        );

        store.delete("/registry/lock/deadline_ms").await.unwrap();
        assert_eq!(store.get("/registry/lock/deadline_ms").await.unwrap(), None);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn list_prefix_filters_other_keys() {
        let store = MemoryStore::new();
        store.put("/registry/lock/module", b"\"orders\"").await.unwrap();
        store.put("/registry/lock/user_id", b"7").await.unwrap();
        store.put("/registry/other/key", b"1").await.unwrap();

        let entries = store.list_prefix("/registry/lock/").await.unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|(k, _)| k.starts_with("/registry/lock/")));
    }
}
