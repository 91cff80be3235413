//! The engine instance owned by the host integration layer.
//!
//! All state lives on the instance (create on init, replace on identity
//! change, drop on shutdown); there are no ambient statics. Resolution
//! passes are serialized by a pass mutex; readers go through the table's
//! snapshot and never block on a pass.

use crate::resolver::resolve_all;
use crate::table::ActiveModificationTable;
use flagkit_allocation::{
    AllocationEngine, AllocationStore, DrawSource, RandomDraw, VisitorIdentity,
};
use flagkit_catalog::{parse_catalog, Catalog, Modification};
use flagkit_core::{
    ActivationSink, FlagResult, FlagValue, FromFlagValue, SdkConfig, VisitorContext,
};
use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// What a sync pass did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The table was replaced.
    Applied { campaigns: usize, flags: usize },
    /// The visitor identity changed mid-pass; the result was stale and the
    /// table was left untouched.
    Discarded,
    /// Panic mode, or nothing to resolve yet.
    Skipped,
}

pub struct FlagEngine {
    config: SdkConfig,
    context: RwLock<VisitorContext>,
    identity: RwLock<VisitorIdentity>,
    /// Bumped on every identity change; a pass that started under an older
    /// generation discards its result instead of applying it.
    generation: AtomicU64,
    panic: Arc<AtomicBool>,
    table: ActiveModificationTable,
    allocation: AllocationEngine,
    draw_source: Arc<dyn DrawSource>,
    /// Serializes resolution passes. The table swap inside is the only
    /// step readers could otherwise observe half-done.
    pass_lock: Mutex<()>,
    /// The catalog of the last applied sync, owned here between syncs.
    catalog: Mutex<Option<Catalog>>,
}

impl FlagEngine {
    pub fn new(
        config: SdkConfig,
        visitor: VisitorIdentity,
        store: Arc<dyn AllocationStore>,
        sink: Arc<dyn ActivationSink>,
    ) -> Self {
        let panic = Arc::new(AtomicBool::new(false));
        let table = ActiveModificationTable::new(sink, panic.clone(), visitor.visitor_id.clone());

        let mut context = VisitorContext::new();
        context.set_preset("fk.os_name", std::env::consts::OS);
        context.set_preset("fk.sdk_version", env!("CARGO_PKG_VERSION"));

        info!(
            env_id = %config.env_id,
            mode = ?config.decision_mode,
            visitor = %visitor.visitor_id,
            "flag engine initialized"
        );

        Self {
            config,
            context: RwLock::new(context),
            identity: RwLock::new(visitor),
            generation: AtomicU64::new(0),
            panic,
            table,
            allocation: AllocationEngine::new(store),
            draw_source: Arc::new(RandomDraw),
            pass_lock: Mutex::new(()),
            catalog: Mutex::new(None),
        }
    }

    /// Override the allocation draw source (reproducible runs, tests).
    pub fn with_draw_source(mut self, draw_source: Arc<dyn DrawSource>) -> Self {
        self.draw_source = draw_source;
        self
    }

    /// Stamp an SDK-owned (reserved) context attribute, e.g. a device
    /// descriptor collected by the host platform layer.
    pub fn set_preset(&self, key: impl Into<String>, value: impl Into<FlagValue>) {
        self.context.write().set_preset(key, value);
    }

    /// Run one resolution pass over a fetched catalog payload and swap the
    /// active table.
    ///
    /// A parse failure leaves the previous table untouched. A visitor
    /// identity change racing the pass discards the result. Panic mode
    /// makes the whole call a no-op.
    pub fn synchronize(&self, payload: &Value) -> FlagResult<SyncOutcome> {
        if self.panic.load(Ordering::Relaxed) {
            warn!("sync skipped: engine is in panic mode");
            return Ok(SyncOutcome::Skipped);
        }

        let generation = self.generation.load(Ordering::Acquire);
        let mut catalog = parse_catalog(payload)?;
        let identity = self.identity.read().clone();
        let context = self.context.read().clone();
        // One draw per pass, reused for every group.
        let draw = self.draw_source.draw();

        let _pass = self.pass_lock.lock();
        let entries = resolve_all(
            &mut catalog,
            &context,
            &identity,
            self.config.decision_mode,
            draw,
            &self.allocation,
        );

        if self.generation.load(Ordering::Acquire) != generation {
            info!(
                visitor = %identity.visitor_id,
                "sync discarded: visitor identity changed mid-pass"
            );
            return Ok(SyncOutcome::Discarded);
        }

        let campaigns = catalog.len();
        let flags = entries.len();
        self.table.replace(entries);
        *self.catalog.lock() = Some(catalog);
        info!(campaigns, flags, "sync applied");
        Ok(SyncOutcome::Applied { campaigns, flags })
    }

    /// [`synchronize`](Self::synchronize) on a worker thread, returning the
    /// task handle so the caller observes completion deterministically.
    pub fn spawn_synchronize(self: &Arc<Self>, payload: Value) -> JoinHandle<FlagResult<SyncOutcome>> {
        let engine = Arc::clone(self);
        tokio::task::spawn_blocking(move || engine.synchronize(&payload))
    }

    /// Re-resolve the held catalog against the current context without a
    /// fresh fetch: the engine-side half of a context-triggered re-sync.
    pub fn resynchronize(&self) -> FlagResult<SyncOutcome> {
        if self.panic.load(Ordering::Relaxed) {
            warn!("re-sync skipped: engine is in panic mode");
            return Ok(SyncOutcome::Skipped);
        }

        let generation = self.generation.load(Ordering::Acquire);
        let identity = self.identity.read().clone();
        let context = self.context.read().clone();
        let draw = self.draw_source.draw();

        let _pass = self.pass_lock.lock();
        let mut held = self.catalog.lock();
        let Some(catalog) = held.as_mut() else {
            debug!("re-sync skipped: no catalog held yet");
            return Ok(SyncOutcome::Skipped);
        };

        let entries = resolve_all(
            catalog,
            &context,
            &identity,
            self.config.decision_mode,
            draw,
            &self.allocation,
        );

        if self.generation.load(Ordering::Acquire) != generation {
            info!(
                visitor = %identity.visitor_id,
                "re-sync discarded: visitor identity changed mid-pass"
            );
            return Ok(SyncOutcome::Discarded);
        }

        let campaigns = catalog.len();
        let flags = entries.len();
        self.table.replace(entries);
        info!(campaigns, flags, "re-sync applied");
        Ok(SyncOutcome::Applied { campaigns, flags })
    }

    /// Typed read of an active flag value; see
    /// [`ActiveModificationTable::get`].
    pub fn get_modification<T: FromFlagValue>(&self, key: &str, default: T, report: bool) -> T {
        self.table.get(key, default, report)
    }

    /// Update a host context attribute. Reserved keys are rejected, panic
    /// mode makes this a no-op; both return `false`.
    pub fn update_context(&self, key: impl Into<String>, value: impl Into<FlagValue>) -> bool {
        if self.panic.load(Ordering::Relaxed) {
            return false;
        }
        self.context.write().set(key, value)
    }

    /// Bulk context update; returns how many entries were written.
    pub fn update_context_many<I>(&self, entries: I) -> usize
    where
        I: IntoIterator<Item = (String, FlagValue)>,
    {
        if self.panic.load(Ordering::Relaxed) {
            return 0;
        }
        self.context.write().extend(entries)
    }

    /// Switch to a new visitor identity. Any in-flight sync keyed to the
    /// old identity will discard its result.
    pub fn set_visitor(&self, visitor_id: impl Into<String>, custom_visitor_id: Option<String>) {
        if self.panic.load(Ordering::Relaxed) {
            warn!("identity change skipped: engine is in panic mode");
            return;
        }
        let identity = VisitorIdentity::new(visitor_id, custom_visitor_id);
        info!(visitor = %identity.visitor_id, "visitor identity changed");
        self.table.set_visitor_id(identity.visitor_id.clone());
        *self.identity.write() = identity;
        self.generation.fetch_add(1, Ordering::AcqRel);
    }

    /// Flip the kill switch. While set, reads return defaults and writes
    /// (context updates, syncs, identity changes) are no-ops.
    pub fn set_panic(&self, on: bool) {
        self.panic.store(on, Ordering::Relaxed);
        if on {
            warn!("panic mode engaged: reads degrade to defaults, writes are no-ops");
        } else {
            info!("panic mode cleared");
        }
    }

    pub fn is_panicking(&self) -> bool {
        self.panic.load(Ordering::Relaxed)
    }

    pub fn visitor(&self) -> VisitorIdentity {
        self.identity.read().clone()
    }

    /// Context snapshot for the transport collaborator's fetch calls.
    pub fn context_snapshot(&self) -> HashMap<String, FlagValue> {
        self.context.read().as_map().clone()
    }

    /// Immutable snapshot of the active table.
    pub fn active_modifications(&self) -> Arc<HashMap<String, Modification>> {
        self.table.snapshot()
    }

    pub fn config(&self) -> &SdkConfig {
        &self.config
    }
}
