//! Activation reporting — trait for emitting exposure events from the
//! active-modification table.
//!
//! The engine emits one event per reported read. Queuing, deduplication, and
//! delivery are the transport collaborator's concern; implementations route
//! events into its offline queue.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// A visitor was exposed to a specific variation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivationEvent {
    pub event_id: Uuid,
    pub visitor_id: String,
    pub variation_group_id: String,
    pub variation_id: String,
    pub flag_key: String,
    pub timestamp: DateTime<Utc>,
}

impl ActivationEvent {
    pub fn new(
        visitor_id: impl Into<String>,
        variation_group_id: impl Into<String>,
        variation_id: impl Into<String>,
        flag_key: impl Into<String>,
    ) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            visitor_id: visitor_id.into(),
            variation_group_id: variation_group_id.into(),
            variation_id: variation_id.into(),
            flag_key: flag_key.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Trait for emitting activation events.
pub trait ActivationSink: Send + Sync {
    fn emit(&self, event: ActivationEvent);
}

/// No-op sink for hosts that don't report activations.
pub struct NoOpSink;

impl ActivationSink for NoOpSink {
    fn emit(&self, _event: ActivationEvent) {}
}

/// In-memory sink that captures events for testing.
#[derive(Default)]
pub struct CaptureSink {
    events: Mutex<Vec<ActivationEvent>>,
}

impl CaptureSink {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
        }
    }

    pub fn events(&self) -> Vec<ActivationEvent> {
        self.events.lock().expect("activation mutex poisoned").clone()
    }

    pub fn count(&self) -> usize {
        self.events.lock().expect("activation mutex poisoned").len()
    }

    pub fn clear(&self) {
        self.events.lock().expect("activation mutex poisoned").clear();
    }
}

impl ActivationSink for CaptureSink {
    fn emit(&self, event: ActivationEvent) {
        self.events
            .lock()
            .expect("activation mutex poisoned")
            .push(event);
    }
}

/// Convenience: a no-op sink for engines that don't report.
pub fn noop_sink() -> Arc<dyn ActivationSink> {
    Arc::new(NoOpSink)
}

/// Convenience: a capture sink for tests.
pub fn capture_sink() -> Arc<CaptureSink> {
    Arc::new(CaptureSink::new())
}
