//! The process-wide active-modification table.
//!
//! Snapshot-swap discipline: the table holds an `Arc` to an immutable map,
//! readers clone the `Arc` under a momentary read lock, and a resolution
//! pass replaces the whole map in one swap. Readers observe either the
//! fully-old or the fully-new table, never a mixture, and never block on a
//! pass in flight.

use flagkit_catalog::Modification;
use flagkit_core::{ActivationEvent, ActivationSink, FromFlagValue};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

pub struct ActiveModificationTable {
    snapshot: RwLock<Arc<HashMap<String, Modification>>>,
    sink: Arc<dyn ActivationSink>,
    /// Kill switch shared with the owning engine. Relaxed ordering is
    /// enough: a torn read costs one stale cycle, never correctness.
    panic: Arc<AtomicBool>,
    visitor_id: RwLock<String>,
}

impl ActiveModificationTable {
    pub fn new(
        sink: Arc<dyn ActivationSink>,
        panic: Arc<AtomicBool>,
        visitor_id: impl Into<String>,
    ) -> Self {
        Self {
            snapshot: RwLock::new(Arc::new(HashMap::new())),
            sink,
            panic,
            visitor_id: RwLock::new(visitor_id.into()),
        }
    }

    /// Typed read. Key-miss or variant mismatch returns `default` (logged,
    /// never raised). With `report`, a successful read emits exactly one
    /// activation event; deduplication, if wanted, belongs to the
    /// transport layer.
    pub fn get<T: FromFlagValue>(&self, key: &str, default: T, report: bool) -> T {
        if self.panic.load(Ordering::Relaxed) {
            return default;
        }

        let snapshot = self.snapshot();
        let Some(modification) = snapshot.get(key) else {
            debug!(key = %key, "flag not active, returning default");
            return default;
        };

        match T::from_flag_value(&modification.value) {
            Some(value) => {
                if report {
                    self.sink.emit(ActivationEvent::new(
                        self.visitor_id.read().clone(),
                        modification.variation_group_id.clone(),
                        modification.variation_id.clone(),
                        key,
                    ));
                }
                value
            }
            None => {
                debug!(
                    key = %key,
                    stored = modification.value.type_name(),
                    "flag type mismatch, returning default"
                );
                default
            }
        }
    }

    /// Atomically replace the table with a freshly resolved one.
    pub fn replace(&self, entries: HashMap<String, Modification>) {
        *self.snapshot.write() = Arc::new(entries);
    }

    /// The current immutable snapshot.
    pub fn snapshot(&self) -> Arc<HashMap<String, Modification>> {
        self.snapshot.read().clone()
    }

    pub fn set_visitor_id(&self, visitor_id: impl Into<String>) {
        *self.visitor_id.write() = visitor_id.into();
    }

    pub fn len(&self) -> usize {
        self.snapshot.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flagkit_core::events::capture_sink;
    use flagkit_core::FlagValue;

    fn make_table(sink: Arc<dyn ActivationSink>) -> (ActiveModificationTable, Arc<AtomicBool>) {
        let panic = Arc::new(AtomicBool::new(false));
        let table = ActiveModificationTable::new(sink, panic.clone(), "visitor-1");
        table.replace(HashMap::from([
            (
                "color".to_string(),
                Modification {
                    key: "color".to_string(),
                    variation_group_id: "vg1".to_string(),
                    variation_id: "a".to_string(),
                    value: FlagValue::from("red"),
                },
            ),
            (
                "limit".to_string(),
                Modification {
                    key: "limit".to_string(),
                    variation_group_id: "vg2".to_string(),
                    variation_id: "b".to_string(),
                    value: FlagValue::Number(25.0),
                },
            ),
        ]));
        (table, panic)
    }

    #[test]
    fn test_typed_read_round_trip() {
        let (table, _) = make_table(flagkit_core::events::noop_sink());

        assert_eq!(table.get("limit", 0.0, false), 25.0);
        assert_eq!(table.get("color", "default".to_string(), false), "red");
        // Type mismatch falls back to the default, not a coerced value.
        assert_eq!(table.get("limit", "none".to_string(), false), "none");
        assert_eq!(table.get("color", 7.0, false), 7.0);
        // Key miss.
        assert!(table.get("missing", true, false));
    }

    #[test]
    fn test_report_emits_one_event_per_call() {
        let sink = capture_sink();
        let (table, _) = make_table(sink.clone());

        let _: String = table.get("color", String::new(), true);
        let _: String = table.get("color", String::new(), true);
        let _: String = table.get("color", String::new(), false);

        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].variation_group_id, "vg1");
        assert_eq!(events[0].variation_id, "a");
        assert_eq!(events[0].flag_key, "color");
        assert_eq!(events[0].visitor_id, "visitor-1");
    }

    #[test]
    fn test_no_event_on_miss_or_mismatch() {
        let sink = capture_sink();
        let (table, _) = make_table(sink.clone());

        let _: f64 = table.get("missing", 1.0, true);
        let _: f64 = table.get("color", 1.0, true);
        assert_eq!(sink.count(), 0);
    }

    #[test]
    fn test_panic_flag_short_circuits_reads() {
        let sink = capture_sink();
        let (table, panic) = make_table(sink.clone());

        panic.store(true, Ordering::Relaxed);
        assert_eq!(table.get("color", "default".to_string(), true), "default");
        assert_eq!(sink.count(), 0);

        panic.store(false, Ordering::Relaxed);
        assert_eq!(table.get("color", "default".to_string(), false), "red");
    }

    #[test]
    fn test_replace_is_wholesale() {
        let (table, _) = make_table(flagkit_core::events::noop_sink());
        let before = table.snapshot();

        table.replace(HashMap::new());
        assert!(table.is_empty());
        // The old snapshot is still intact for readers that hold it.
        assert_eq!(before.len(), 2);
    }
}
