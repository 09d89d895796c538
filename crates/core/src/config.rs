//! Worker configuration loaded from environment variables.
//!
//! Out-of-range values are clamped to the nearest bound with a
//! warning rather than rejected, so a typo in an env var degrades to
//! a safe default instead of keeping the worker down. The scheduler
//! re-reads this struct on SIGHUP, which is what makes naptime and
//! batch size reloadable without a restart.

/// Default seconds between scheduler wake cycles.
pub const DEFAULT_NAPTIME_SECS: u64 = 10;

/// Minimum allowed naptime.
pub const MIN_NAPTIME_SECS: u64 = 1;

/// Default rows per job per cycle.
pub const DEFAULT_BATCH_SIZE: i64 = 256;

/// Allowed batch size range.
pub const MIN_BATCH_SIZE: i64 = 1;
pub const MAX_BATCH_SIZE: i64 = 10_000;

/// Tunable settings for the embedding worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerConfig {
    /// Seconds the scheduler sleeps between cycles.
    pub naptime_secs: u64,
    /// Maximum rows extracted per job per cycle.
    pub batch_size: i64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            naptime_secs: DEFAULT_NAPTIME_SECS,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl WorkerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var               | Default | Bounds      |
    /// |-----------------------|---------|-------------|
    /// | `GEMBED_NAPTIME_SECS` | `10`    | `>= 1`      |
    /// | `GEMBED_BATCH_SIZE`   | `256`   | `1..=10000` |
    pub fn from_env() -> Self {
        let naptime_secs = match std::env::var("GEMBED_NAPTIME_SECS") {
            Ok(raw) => parse_or_default("GEMBED_NAPTIME_SECS", &raw, DEFAULT_NAPTIME_SECS),
            Err(_) => DEFAULT_NAPTIME_SECS,
        };

        let batch_size = match std::env::var("GEMBED_BATCH_SIZE") {
            Ok(raw) => parse_or_default("GEMBED_BATCH_SIZE", &raw, DEFAULT_BATCH_SIZE),
            Err(_) => DEFAULT_BATCH_SIZE,
        };

        Self {
            naptime_secs,
            batch_size,
        }
        .clamped()
    }

    /// Clamp both tunables into their allowed ranges, logging when a
    /// value had to be adjusted.
    pub fn clamped(self) -> Self {
        let naptime_secs = clamp_naptime(self.naptime_secs);
        let batch_size = clamp_batch_size(self.batch_size);
        Self {
            naptime_secs,
            batch_size,
        }
    }
}

/// Parse a set env var's value, warning and falling back to the
/// default when it does not parse.
fn parse_or_default<T>(name: &str, raw: &str, default: T) -> T
where
    T: std::str::FromStr + std::fmt::Display + Copy,
{
    match raw.parse() {
        Ok(value) => value,
        Err(_) => {
            tracing::warn!(
                var = name,
                value = raw,
                default = %default,
                "Unparseable value, using default"
            );
            default
        }
    }
}

/// Clamp a naptime value to at least [`MIN_NAPTIME_SECS`].
pub fn clamp_naptime(secs: u64) -> u64 {
    if secs < MIN_NAPTIME_SECS {
        tracing::warn!(
            requested = secs,
            min = MIN_NAPTIME_SECS,
            "Naptime below minimum, clamping"
        );
        MIN_NAPTIME_SECS
    } else {
        secs
    }
}

/// Clamp a batch size into `MIN_BATCH_SIZE..=MAX_BATCH_SIZE`.
pub fn clamp_batch_size(size: i64) -> i64 {
    if size < MIN_BATCH_SIZE {
        tracing::warn!(
            requested = size,
            min = MIN_BATCH_SIZE,
            "Batch size below minimum, clamping"
        );
        MIN_BATCH_SIZE
    } else if size > MAX_BATCH_SIZE {
        tracing::warn!(
            requested = size,
            max = MAX_BATCH_SIZE,
            "Batch size above maximum, clamping"
        );
        MAX_BATCH_SIZE
    } else {
        size
    }
}
