pub mod bollinger_combo;
pub mod ema_classifier;
pub mod heikin_ashi;
pub mod rsi_extremes;
pub mod stochastic_quick;
pub mod vwap_macd;

pub use bollinger_combo::BollingerRsiAdx;
pub use ema_classifier::EmaClassifier;
pub use heikin_ashi::HeikinAshiPullback;
pub use rsi_extremes::RsiExtremes;
pub use stochastic_quick::StochasticQuick;
pub use vwap_macd::VwapMacd;

use anyhow::Result;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::types::{Bar, Side, SignalAction, Timeframe};

/// One pip of quote price for the majors this engine targets.
pub const PIP: Decimal = dec!(0.0001);

/// Default stop buffer past a swing extreme: 5 pips.
pub const SWING_BUFFER: Decimal = dec!(0.0005);

/// A bar-by-bar signal classifier. Implementations are stateless; every
/// call re-derives its view from the bar history it is handed, so a
/// single instance can serve concurrent runs behind an `Arc`.
pub trait Strategy: Send + Sync {
    /// Stable identifier the registry resolves configs against.
    fn id(&self) -> &'static str;
    fn name(&self) -> &'static str;
    fn timeframe(&self) -> Timeframe;
    /// Documentation only, never enforced.
    fn win_rate_expectation(&self) -> &'static str;
    /// Access control is a concern of the surrounding application.
    fn is_premium(&self) -> bool {
        false
    }
    /// Minimum bars of history before a non-WAIT signal is possible.
    fn min_bars(&self) -> usize;
    /// Classify the latest bar given all history up to and including it.
    fn analyze(&self, bars: &[Bar]) -> Result<Signal>;
}

/// Strategy output for one bar. WAIT signals carry no tradeable levels.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signal {
    pub action: SignalAction,
    /// 0..=100, meaningful only when the action is not WAIT.
    pub confidence: Decimal,
    pub entry: Decimal,
    pub stop_loss: Decimal,
    pub take_profit: Decimal,
    pub reason: String,
}

impl Signal {
    pub fn wait(reason: impl Into<String>) -> Self {
        Self {
            action: SignalAction::Wait,
            confidence: Decimal::ZERO,
            entry: Decimal::ZERO,
            stop_loss: Decimal::ZERO,
            take_profit: Decimal::ZERO,
            reason: reason.into(),
        }
    }

    pub fn entry(
        action: SignalAction,
        confidence: Decimal,
        entry: Decimal,
        stop_loss: Decimal,
        take_profit: Decimal,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            action,
            confidence,
            entry,
            stop_loss,
            take_profit,
            reason: reason.into(),
        }
    }

    pub fn is_tradeable(&self, min_confidence: Decimal) -> bool {
        !self.action.is_wait() && self.confidence >= min_confidence
    }
}

/// Stop past the swing extreme of the trailing `lookback` bars
/// (current bar included).
pub(crate) fn swing_stop(bars: &[Bar], lookback: usize, side: Side, buffer: Decimal) -> Decimal {
    let window = &bars[bars.len().saturating_sub(lookback)..];
    match side {
        Side::Buy => crate::types::lowest_low(window).unwrap_or_default() - buffer,
        Side::Sell => crate::types::highest_high(window).unwrap_or_default() + buffer,
    }
}

/// Target at `multiplier` times the stop distance past the entry.
pub(crate) fn target_from_stop(
    entry: Decimal,
    stop_loss: Decimal,
    side: Side,
    multiplier: Decimal,
) -> Decimal {
    match side {
        Side::Buy => entry + (entry - stop_loss) * multiplier,
        Side::Sell => entry - (stop_loss - entry) * multiplier,
    }
}

pub(crate) fn clamp_confidence(confidence: Decimal) -> Decimal {
    confidence.min(dec!(95))
}

/// Immutable map of strategy id to implementation, constructed once and
/// injected into the engine. No global mutable state.
pub struct StrategyRegistry {
    strategies: HashMap<&'static str, Arc<dyn Strategy>>,
}

impl StrategyRegistry {
    pub fn new() -> Self {
        Self {
            strategies: HashMap::new(),
        }
    }

    /// All six built-in scalping strategies.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(RsiExtremes::new()));
        registry.register(Arc::new(HeikinAshiPullback::new()));
        registry.register(Arc::new(StochasticQuick::new()));
        registry.register(Arc::new(BollingerRsiAdx::new()));
        registry.register(Arc::new(VwapMacd::new()));
        registry.register(Arc::new(EmaClassifier::new()));
        registry
    }

    pub fn register(&mut self, strategy: Arc<dyn Strategy>) {
        self.strategies.insert(strategy.id(), strategy);
    }

    pub fn resolve(&self, id: &str) -> Option<Arc<dyn Strategy>> {
        self.strategies.get(id).cloned()
    }

    pub fn ids(&self) -> Vec<&'static str> {
        let mut ids: Vec<_> = self.strategies.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_registry_has_all_six() {
        let registry = StrategyRegistry::builtin();
        assert_eq!(registry.len(), 6);
        for id in [
            "rsi-extremes",
            "heikin-ashi-pullback",
            "stochastic-quick",
            "bollinger-rsi-adx",
            "vwap-macd",
            "ema-classifier",
        ] {
            assert!(registry.resolve(id).is_some(), "missing strategy {id}");
        }
    }

    #[test]
    fn unknown_id_resolves_to_none() {
        assert!(StrategyRegistry::builtin().resolve("martingale").is_none());
    }

    #[test]
    fn wait_signal_carries_no_levels() {
        let signal = Signal::wait("testing");
        assert!(signal.action.is_wait());
        assert_eq!(signal.confidence, Decimal::ZERO);
        assert!(!signal.is_tradeable(dec!(70)));
    }

    #[test]
    fn target_mirrors_by_side() {
        let entry = dec!(1.0850);
        let stop = dec!(1.0830);
        assert_eq!(
            target_from_stop(entry, stop, Side::Buy, dec!(2)),
            dec!(1.0890)
        );
        let stop = dec!(1.0870);
        assert_eq!(
            target_from_stop(entry, stop, Side::Sell, dec!(2)),
            dec!(1.0810)
        );
    }
}
