//! Visitor context — the attribute map targeting rules evaluate against.

use crate::value::FlagValue;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;

/// Keys under this prefix belong to the SDK (device/platform attributes).
/// Host-supplied updates to them are rejected with a diagnostic.
pub const RESERVED_PREFIX: &str = "fk.";

/// Mutable visitor attributes, keyed by string. The host mutates this
/// between syncs; the engine snapshots it for each resolution pass and for
/// every campaign fetch sent to the transport collaborator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VisitorContext {
    attributes: HashMap<String, FlagValue>,
}

impl VisitorContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a host attribute. Returns `false` (and logs) without writing when
    /// `key` is inside the reserved namespace.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<FlagValue>) -> bool {
        let key = key.into();
        if key.starts_with(RESERVED_PREFIX) {
            warn!(key = %key, "rejected context update to reserved key");
            return false;
        }
        self.attributes.insert(key, value.into());
        true
    }

    /// Bulk [`set`](Self::set); reserved keys are skipped individually.
    /// Returns the number of entries actually written.
    pub fn extend<I>(&mut self, entries: I) -> usize
    where
        I: IntoIterator<Item = (String, FlagValue)>,
    {
        let mut written = 0;
        for (key, value) in entries {
            if self.set(key, value) {
                written += 1;
            }
        }
        written
    }

    /// Write a reserved SDK-owned attribute. Engine-internal; bypasses the
    /// namespace check.
    pub fn set_preset(&mut self, key: impl Into<String>, value: impl Into<FlagValue>) {
        self.attributes.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&FlagValue> {
        self.attributes.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<FlagValue> {
        if key.starts_with(RESERVED_PREFIX) {
            warn!(key = %key, "rejected context removal of reserved key");
            return None;
        }
        self.attributes.remove(key)
    }

    /// Snapshot of all attributes, reserved keys included, for the
    /// per-request context the transport collaborator sends upstream.
    pub fn as_map(&self) -> &HashMap<String, FlagValue> {
        &self.attributes
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_get() {
        let mut ctx = VisitorContext::new();
        assert!(ctx.set("plan", "enterprise"));
        assert!(ctx.set("age", 33i64));
        assert_eq!(ctx.get("plan"), Some(&FlagValue::from("enterprise")));
        assert_eq!(ctx.get("age"), Some(&FlagValue::Number(33.0)));
        assert_eq!(ctx.get("missing"), None);
    }

    #[test]
    fn test_reserved_keys_rejected() {
        let mut ctx = VisitorContext::new();
        assert!(!ctx.set("fk.device_type", "phone"));
        assert_eq!(ctx.get("fk.device_type"), None);

        ctx.set_preset("fk.device_type", "phone");
        assert_eq!(ctx.get("fk.device_type"), Some(&FlagValue::from("phone")));

        // Host cannot remove a preset either.
        assert_eq!(ctx.remove("fk.device_type"), None);
        assert!(ctx.get("fk.device_type").is_some());
    }

    #[test]
    fn test_extend_skips_reserved() {
        let mut ctx = VisitorContext::new();
        let written = ctx.extend(vec![
            ("a".to_string(), FlagValue::from(true)),
            ("fk.os_name".to_string(), FlagValue::from("android")),
            ("b".to_string(), FlagValue::from(1.5)),
        ]);
        assert_eq!(written, 2);
        assert_eq!(ctx.len(), 2);
        assert!(ctx.get("fk.os_name").is_none());
    }
}
