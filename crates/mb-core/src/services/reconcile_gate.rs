use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::PoisonError;

use tokio::sync::{Mutex, MutexGuard};

use super::orchestrator::TriggerCause;

/// Single-writer section for one container.
///
/// Reconciliation triggers never queue: a trigger that finds the section busy
/// records itself as pending and leaves. Whoever holds the section, cycle or
/// explicit writer, runs one more cycle for it after releasing. User-invoked
/// writers wait for the section instead.
#[derive(Debug, Default)]
pub struct ReconcileGate {
    writer: Mutex<()>,
    pending: std::sync::Mutex<Option<TriggerCause>>,
    in_cycle: AtomicBool,
}

/// Holds the section. Dropping it releases the section and, for a cycle,
/// clears the in-cycle flag.
#[derive(Debug)]
pub struct GateGuard<'a> {
    _lock: MutexGuard<'a, ()>,
    in_cycle: Option<&'a AtomicBool>,
}

impl Drop for GateGuard<'_> {
    fn drop(&mut self) {
        if let Some(flag) = self.in_cycle {
            flag.store(false, Ordering::SeqCst);
        }
    }
}

impl ReconcileGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter for a reconciliation cycle, or record `cause` as pending and
    /// return `None` if the section is held.
    pub fn try_enter(&self, cause: TriggerCause) -> Option<GateGuard<'_>> {
        if let Ok(lock) = self.writer.try_lock() {
            return Some(self.cycle_guard(lock));
        }
        *self.pending_slot() = Some(cause);
        // The holder may have released between the failed attempt and the
        // store above, in which case nobody would see the mark.
        match self.writer.try_lock() {
            Ok(lock) => Some(self.cycle_guard(lock)),
            Err(_) => None,
        }
    }

    /// Wait for the section. Used by explicit writers.
    pub async fn enter(&self) -> GateGuard<'_> {
        GateGuard {
            _lock: self.writer.lock().await,
            in_cycle: None,
        }
    }

    /// Consume the pending trigger, if any. Call after releasing the guard.
    pub fn take_pending(&self) -> Option<TriggerCause> {
        self.pending_slot().take()
    }

    /// A reconciliation cycle holds the section. Does not touch the lock.
    pub fn is_busy(&self) -> bool {
        self.in_cycle.load(Ordering::SeqCst)
    }

    fn cycle_guard<'a>(&'a self, lock: MutexGuard<'a, ()>) -> GateGuard<'a> {
        *self.pending_slot() = None;
        self.in_cycle.store(true, Ordering::SeqCst);
        GateGuard {
            _lock: lock,
            in_cycle: Some(&self.in_cycle),
        }
    }

    fn pending_slot(&self) -> std::sync::MutexGuard<'_, Option<TriggerCause>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
