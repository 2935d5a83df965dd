//! Tunable parameters for window/level interaction.
//!
//! Every knob has a named constant so an integrator can read the defaults,
//! and a field on [`WindowLevelConfig`] so it can be overridden from JSON at
//! install time.

use once_cell::sync::OnceCell;
use serde::Deserialize;

use crate::domain::errors::{AppError, AppResult};
use crate::domain::logging::LogLevel;

/// Horizontal drag sensitivity (exponent per pixel).
pub const CONTRAST_SENS: f64 = 0.005;
/// Vertical drag sensitivity, scaled by the current window width.
pub const BRIGHT_SENS: f64 = 0.003;
/// Upper bound on the number of grid points used for percentile estimation.
pub const SAMPLE_TARGET: usize = 5000;
/// Low percentile fraction of the robust default range.
pub const P_LO: f64 = 0.02;
/// High percentile fraction of the robust default range.
pub const P_HI: f64 = 0.98;
/// `min_width = base_width / MIN_WIDTH_DIVISOR`
pub const MIN_WIDTH_DIVISOR: f64 = 2000.0;
/// `max_width = base_width * MAX_WIDTH_FACTOR`
pub const MAX_WIDTH_FACTOR: f64 = 50.0;
/// How many delayed rescans run while slots are still missing.
pub const DISCOVERY_RETRIES: u32 = 20;
/// Delay between delayed rescans.
pub const DISCOVERY_INTERVAL_MS: u32 = 250;
/// Number of visualization slots scanned by default.
pub const SLOT_COUNT: usize = 4;
/// Slot element ids are `{SLOT_PREFIX}{n}` for `n` in `1..=SLOT_COUNT`.
pub const SLOT_PREFIX: &str = "raw-graph-";
/// Marker class of the renderable plot element inside a slot.
pub const PLOT_SELECTOR: &str = ".js-plotly-plot";
/// Maximum gap between two taps of a double tap.
pub const DOUBLE_TAP_MS: f64 = 300.0;
/// Maximum pointer travel for a tap, and between the two taps of a double tap.
pub const DOUBLE_TAP_SLOP_PX: f64 = 10.0;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    pub target: usize,
    pub low_percentile: f64,
    pub high_percentile: f64,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self { target: SAMPLE_TARGET, low_percentile: P_LO, high_percentile: P_HI }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    pub contrast_sensitivity: f64,
    pub brightness_sensitivity: f64,
    pub double_tap_ms: f64,
    pub double_tap_slop_px: f64,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            contrast_sensitivity: CONTRAST_SENS,
            brightness_sensitivity: BRIGHT_SENS,
            double_tap_ms: DOUBLE_TAP_MS,
            double_tap_slop_px: DOUBLE_TAP_SLOP_PX,
        }
    }
}

/// Width bounds relative to the data-derived base width.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct WidthLimitsConfig {
    pub min_width_divisor: f64,
    pub max_width_factor: f64,
}

impl Default for WidthLimitsConfig {
    fn default() -> Self {
        Self { min_width_divisor: MIN_WIDTH_DIVISOR, max_width_factor: MAX_WIDTH_FACTOR }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    pub slots: Vec<String>,
    pub plot_selector: String,
    pub retries: u32,
    pub interval_ms: u32,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            slots: (1..=SLOT_COUNT).map(|n| format!("{SLOT_PREFIX}{n}")).collect(),
            plot_selector: PLOT_SELECTOR.to_string(),
            retries: DISCOVERY_RETRIES,
            interval_ms: DISCOVERY_INTERVAL_MS,
        }
    }
}

/// Complete configuration; every section falls back to its defaults when
/// omitted from JSON.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct WindowLevelConfig {
    pub sampling: SamplingConfig,
    pub gesture: GestureConfig,
    pub limits: WidthLimitsConfig,
    pub discovery: DiscoveryConfig,
    #[serde(deserialize_with = "deserialize_log_level")]
    pub log_level: LogLevel,
}

impl Default for WindowLevelConfig {
    fn default() -> Self {
        Self {
            sampling: SamplingConfig::default(),
            gesture: GestureConfig::default(),
            limits: WidthLimitsConfig::default(),
            discovery: DiscoveryConfig::default(),
            log_level: LogLevel::Debug,
        }
    }
}

fn deserialize_log_level<'de, D>(deserializer: D) -> Result<LogLevel, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    raw.parse().map_err(serde::de::Error::custom)
}

impl WindowLevelConfig {
    /// Parse and validate a JSON document. Missing fields take defaults.
    pub fn from_json(json: &str) -> AppResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> AppResult<()> {
        let s = &self.sampling;
        if s.target == 0 {
            return Err(AppError::Configuration("sampling.target must be positive".into()));
        }
        if !(0.0..=1.0).contains(&s.low_percentile) || !(0.0..=1.0).contains(&s.high_percentile) {
            return Err(AppError::Configuration("percentiles must lie in [0, 1]".into()));
        }
        if s.low_percentile > s.high_percentile {
            return Err(AppError::Configuration(format!(
                "low percentile {} exceeds high percentile {}",
                s.low_percentile, s.high_percentile
            )));
        }

        let g = &self.gesture;
        if !g.contrast_sensitivity.is_finite() || !g.brightness_sensitivity.is_finite() {
            return Err(AppError::Configuration("sensitivities must be finite".into()));
        }
        if !(g.double_tap_ms >= 0.0) || !(g.double_tap_slop_px >= 0.0) {
            return Err(AppError::Configuration("double tap limits must be non-negative".into()));
        }

        let l = &self.limits;
        if !(l.min_width_divisor >= 1.0) || !l.min_width_divisor.is_finite() {
            return Err(AppError::Configuration("limits.min_width_divisor must be >= 1".into()));
        }
        if !(l.max_width_factor >= 1.0) || !l.max_width_factor.is_finite() {
            return Err(AppError::Configuration("limits.max_width_factor must be >= 1".into()));
        }

        let d = &self.discovery;
        if d.slots.is_empty() {
            return Err(AppError::Configuration("discovery.slots must not be empty".into()));
        }
        if d.slots.iter().any(|slot| slot.is_empty()) {
            return Err(AppError::Configuration("discovery slot ids must not be empty".into()));
        }
        if d.plot_selector.trim().is_empty() {
            return Err(AppError::Configuration("discovery.plot_selector must not be empty".into()));
        }
        Ok(())
    }
}

static ACTIVE_CONFIG: OnceCell<WindowLevelConfig> = OnceCell::new();

/// Configuration in effect; defaults unless [`set_active_config`] ran first.
pub fn active_config() -> &'static WindowLevelConfig {
    ACTIVE_CONFIG.get_or_init(WindowLevelConfig::default)
}

/// Fix the configuration for the lifetime of the module. Fails if a
/// configuration was already fixed (explicitly or by reading the defaults).
pub fn set_active_config(config: WindowLevelConfig) -> AppResult<()> {
    config.validate()?;
    ACTIVE_CONFIG
        .set(config)
        .map_err(|_| AppError::Configuration("configuration already initialized".into()))
}
