use rust_decimal::Decimal;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use uuid::Uuid;

/// Copy-on-read view of a running backtest for external pollers. Reading
/// never blocks the simulation beyond a brief lock on a small struct.
#[derive(Debug, Clone)]
pub struct ProgressSnapshot {
    pub session_id: Uuid,
    pub is_running: bool,
    pub current_balance: Decimal,
    pub total_trades: usize,
    /// Current max drawdown as a percentage.
    pub current_drawdown: Decimal,
}

/// Shared progress cell. The engine writes once per bar; any number of
/// observers clone snapshots out of it.
#[derive(Clone)]
pub struct ProgressTracker {
    inner: Arc<RwLock<ProgressSnapshot>>,
}

impl ProgressTracker {
    pub fn new(session_id: Uuid, initial_balance: Decimal) -> Self {
        Self {
            inner: Arc::new(RwLock::new(ProgressSnapshot {
                session_id,
                is_running: false,
                current_balance: initial_balance,
                total_trades: 0,
                current_drawdown: Decimal::ZERO,
            })),
        }
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        match self.inner.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub(crate) fn update(
        &self,
        is_running: bool,
        balance: Decimal,
        total_trades: usize,
        drawdown_pct: Decimal,
    ) {
        let mut guard = match self.inner.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.is_running = is_running;
        guard.current_balance = balance;
        guard.total_trades = total_trades;
        guard.current_drawdown = drawdown_pct;
    }
}

/// Cooperative cancellation flag, checked once per bar iteration.
#[derive(Clone, Default)]
pub struct CancelHandle {
    flag: Arc<AtomicBool>,
}

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn snapshot_reflects_updates() {
        let tracker = ProgressTracker::new(Uuid::new_v4(), dec!(10000));
        assert!(!tracker.snapshot().is_running);

        tracker.update(true, dec!(10190), 3, dec!(1.2));
        let snapshot = tracker.snapshot();
        assert!(snapshot.is_running);
        assert_eq!(snapshot.current_balance, dec!(10190));
        assert_eq!(snapshot.total_trades, 3);
        assert_eq!(snapshot.current_drawdown, dec!(1.2));
    }

    #[test]
    fn cancel_handle_is_shared() {
        let handle = CancelHandle::new();
        let observer = handle.clone();
        assert!(!observer.is_cancelled());
        handle.cancel();
        assert!(observer.is_cancelled());
    }
}
