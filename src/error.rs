use thiserror::Error;

/// Fatal failures that abort a backtest run before or at the fetch stage.
///
/// Per-bar strategy evaluation failures are not represented here; the
/// engine logs them and treats the bar as a WAIT.
#[derive(Debug, Error)]
pub enum BacktestError {
    #[error("invalid configuration: {0}")]
    Configuration(String),

    #[error("unknown strategy id '{0}'")]
    UnknownStrategy(String),

    #[error("no historical bars for {symbol} between {start} and {end}")]
    DataUnavailable {
        symbol: String,
        start: String,
        end: String,
    },

    #[error("market data fetch failed: {0}")]
    DataFetch(#[source] anyhow::Error),
}
