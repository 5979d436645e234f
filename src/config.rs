use serde::Deserialize;
use std::time::Duration;

/// Scanner configuration. Defaults mirror the kiosk's fixed constants:
/// ~30 Hz capture, 5 s scan cooldown, 7 day expiry warning, camera index 0
/// with a single fallback on index 1.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    pub capture_period_ms: u64,
    pub cooldown_ms: u64,
    pub expiring_soon_days: i64,
    pub device_indices: Vec<u32>,
    pub frame_buffer_size: usize,
    /// Multiple of the capture period after which a silent source is
    /// reported as stalled.
    pub stall_periods: u32,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            capture_period_ms: 33,
            cooldown_ms: 5000,
            expiring_soon_days: 7,
            device_indices: vec![0, 1],
            frame_buffer_size: 8,
            stall_periods: 10,
        }
    }
}

impl ScannerConfig {
    pub fn capture_period(&self) -> Duration {
        Duration::from_millis(self.capture_period_ms)
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }

    pub fn stall_timeout(&self) -> Duration {
        self.capture_period() * self.stall_periods
    }

    /// Loads configuration from an optional `turnstile.toml` next to the
    /// binary plus `TURNSTILE_*` environment overrides. Missing sources fall
    /// back to the defaults above.
    pub fn load() -> Self {
        let loaded = config::Config::builder()
            .add_source(config::File::with_name("turnstile").required(false))
            .add_source(config::Environment::with_prefix("TURNSTILE"))
            .build()
            .and_then(|c| c.try_deserialize::<ScannerConfig>());
        match loaded {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Failed to load configuration, using defaults: {}", e);
                Self::default()
            }
        }
    }
}
