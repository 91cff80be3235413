//! Allocation records — the stickiness memory.
//!
//! Records are keyed by exactly (visitor id, custom visitor id, group id) so
//! a changed identity never inherits another visitor's allocation. Durable
//! implementations belong to the persistence collaborator; the in-memory
//! store here is the default and the test double.

use dashmap::DashMap;

/// Key of one allocation record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AllocationKey {
    pub visitor_id: String,
    pub custom_visitor_id: Option<String>,
    pub group_id: String,
}

impl AllocationKey {
    pub fn new(
        visitor_id: impl Into<String>,
        custom_visitor_id: Option<String>,
        group_id: impl Into<String>,
    ) -> Self {
        Self {
            visitor_id: visitor_id.into(),
            custom_visitor_id,
            group_id: group_id.into(),
        }
    }
}

/// Durable mapping of allocation key → chosen variation id.
pub trait AllocationStore: Send + Sync {
    fn get(&self, key: &AllocationKey) -> Option<String>;
    fn put(&self, key: &AllocationKey, variation_id: &str);
}

/// Lock-free in-process store backed by DashMap.
#[derive(Default)]
pub struct InMemoryAllocationStore {
    records: DashMap<AllocationKey, String>,
}

impl InMemoryAllocationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&self) {
        self.records.clear();
    }
}

impl AllocationStore for InMemoryAllocationStore {
    fn get(&self, key: &AllocationKey) -> Option<String> {
        self.records.get(key).map(|r| r.value().clone())
    }

    fn put(&self, key: &AllocationKey, variation_id: &str) {
        self.records.insert(key.clone(), variation_id.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyed_by_full_triple() {
        let store = InMemoryAllocationStore::new();
        let key = AllocationKey::new("v1", Some("crm-9".to_string()), "vg1");
        store.put(&key, "variation_a");

        assert_eq!(store.get(&key).as_deref(), Some("variation_a"));
        // Any component differing is a different record.
        assert!(store
            .get(&AllocationKey::new("v2", Some("crm-9".to_string()), "vg1"))
            .is_none());
        assert!(store.get(&AllocationKey::new("v1", None, "vg1")).is_none());
        assert!(store
            .get(&AllocationKey::new("v1", Some("crm-9".to_string()), "vg2"))
            .is_none());
    }

    #[test]
    fn test_put_overwrites() {
        let store = InMemoryAllocationStore::new();
        let key = AllocationKey::new("v1", None, "vg1");
        store.put(&key, "a");
        store.put(&key, "b");
        assert_eq!(store.get(&key).as_deref(), Some("b"));
        assert_eq!(store.len(), 1);
    }
}
