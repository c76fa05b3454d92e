//! Engine configuration: tolerances, weights, softmax temperature.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (SEGIQ_CRS_WEIGHT_*, SEGIQ_CRS_TEMPERATURE, ...)
//! 2. Config file (.segiq/config.yaml, searched upward from the CWD,
//!    then ~/.segiq/config.yaml)
//! 3. Built-in defaults
//!
//! The resolved [`EngineConfig`] is an explicit value passed into
//! `arbitrate` and `solve`; nothing in the engine reads process globals
//! at call time. Invalid configuration fails fast at load, not
//! per-request.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration rejected at load time.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} must be in [0,1], got {value}")]
    OutOfRange { name: &'static str, value: f64 },

    #[error("softmax temperature must be positive, got {0}")]
    NonPositiveTemperature(f64),

    #[error("top_n must be at least 1")]
    ZeroTopN,

    #[error("fallback zone must be in 1..=60, got {0}")]
    BadFallbackZone(u8),
}

/// Tolerances and adjustments for two-source arbitration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArbiterConfig {
    /// Absolute tolerance for numeric agreement
    #[serde(default = "default_abs_tol")]
    pub abs_tol: f64,

    /// Relative tolerance for numeric agreement (fraction of the
    /// larger magnitude)
    #[serde(default = "default_rel_tol")]
    pub rel_tol: f64,

    /// Confidence boost applied when both sources agree
    #[serde(default = "default_agree_boost")]
    pub agree_boost: f64,

    /// Confidence penalty applied to the winner of a disagreement
    #[serde(default = "default_disagree_penalty")]
    pub disagree_penalty: f64,
}

fn default_abs_tol() -> f64 {
    0.001
}
fn default_rel_tol() -> f64 {
    0.01
}
fn default_agree_boost() -> f64 {
    0.10
}
fn default_disagree_penalty() -> f64 {
    0.05
}

impl Default for ArbiterConfig {
    fn default() -> Self {
        Self {
            abs_tol: default_abs_tol(),
            rel_tol: default_rel_tol(),
            agree_boost: default_agree_boost(),
            disagree_penalty: default_disagree_penalty(),
        }
    }
}

/// Scoring weights for CRS candidate ranking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrsWeights {
    #[serde(default = "default_w_utm")]
    pub utm: f64,
    #[serde(default = "default_w_zone")]
    pub zone: f64,
    #[serde(default = "default_w_datum")]
    pub datum: f64,
    #[serde(default = "default_w_hemi")]
    pub hemi: f64,
    #[serde(default = "default_w_units_m")]
    pub units_m: f64,
    #[serde(default = "default_w_units_ft")]
    pub units_ft: f64,
    #[serde(default = "default_w_no_datum")]
    pub no_datum: f64,
    #[serde(default = "default_w_ambig_datum")]
    pub ambig_datum: f64,
}

fn default_w_utm() -> f64 {
    2.0
}
fn default_w_zone() -> f64 {
    3.0
}
fn default_w_datum() -> f64 {
    4.0
}
fn default_w_hemi() -> f64 {
    2.0
}
fn default_w_units_m() -> f64 {
    1.0
}
fn default_w_units_ft() -> f64 {
    -2.0
}
fn default_w_no_datum() -> f64 {
    -1.0
}
fn default_w_ambig_datum() -> f64 {
    -2.0
}

impl Default for CrsWeights {
    fn default() -> Self {
        Self {
            utm: default_w_utm(),
            zone: default_w_zone(),
            datum: default_w_datum(),
            hemi: default_w_hemi(),
            units_m: default_w_units_m(),
            units_ft: default_w_units_ft(),
            no_datum: default_w_no_datum(),
            ambig_datum: default_w_ambig_datum(),
        }
    }
}

/// CRS solver configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrsConfig {
    #[serde(default)]
    pub weights: CrsWeights,

    /// Softmax temperature
    #[serde(default = "default_temperature")]
    pub temperature: f64,

    /// Maximum candidates returned
    #[serde(default = "default_top_n")]
    pub top_n: usize,

    /// Top-candidate probability below which an ambiguity note is added
    #[serde(default = "default_ambiguity_threshold")]
    pub ambiguity_threshold: f64,

    /// UTM zone assumed when none was detected
    #[serde(default = "default_fallback_zone")]
    pub fallback_zone: u8,
}

fn default_temperature() -> f64 {
    1.0
}
fn default_top_n() -> usize {
    10
}
fn default_ambiguity_threshold() -> f64 {
    0.7
}
fn default_fallback_zone() -> u8 {
    32
}

impl Default for CrsConfig {
    fn default() -> Self {
        Self {
            weights: CrsWeights::default(),
            temperature: default_temperature(),
            top_n: default_top_n(),
            ambiguity_threshold: default_ambiguity_threshold(),
            fallback_zone: default_fallback_zone(),
        }
    }
}

/// Complete engine configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub arbiter: ArbiterConfig,
    #[serde(default)]
    pub crs: CrsConfig,
}

impl EngineConfig {
    /// Load from the discovered config file (if any), apply environment
    /// overrides, then validate.
    pub fn load() -> Result<Self> {
        let mut config = match find_config_file() {
            Some(path) => Self::from_yaml_file(&path)?,
            None => Self::default(),
        };
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Parse a YAML config file.
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Apply `SEGIQ_*` environment overrides.
    ///
    /// Weight overrides follow `SEGIQ_CRS_WEIGHT_<NAME>` (e.g.
    /// `SEGIQ_CRS_WEIGHT_DATUM=5.0`); unparseable values are ignored.
    pub fn apply_env(&mut self) {
        let mut weight = |name: &str, slot: &mut f64| {
            if let Ok(raw) = std::env::var(format!("SEGIQ_CRS_WEIGHT_{name}")) {
                if let Ok(v) = raw.parse::<f64>() {
                    *slot = v;
                }
            }
        };
        weight("UTM", &mut self.crs.weights.utm);
        weight("ZONE", &mut self.crs.weights.zone);
        weight("DATUM", &mut self.crs.weights.datum);
        weight("HEMI", &mut self.crs.weights.hemi);
        weight("UNITS_M", &mut self.crs.weights.units_m);
        weight("UNITS_FT", &mut self.crs.weights.units_ft);
        weight("NO_DATUM", &mut self.crs.weights.no_datum);
        weight("AMBIG_DATUM", &mut self.crs.weights.ambig_datum);

        if let Ok(raw) = std::env::var("SEGIQ_CRS_TEMPERATURE") {
            if let Ok(v) = raw.parse::<f64>() {
                self.crs.temperature = v;
            }
        }
        if let Ok(raw) = std::env::var("SEGIQ_CRS_TOP_N") {
            if let Ok(v) = raw.parse::<usize>() {
                self.crs.top_n = v;
            }
        }
    }

    /// Reject configuration the engine cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let unit_ranged = [
            ("abs_tol", self.arbiter.abs_tol),
            ("rel_tol", self.arbiter.rel_tol),
            ("agree_boost", self.arbiter.agree_boost),
            ("disagree_penalty", self.arbiter.disagree_penalty),
            ("ambiguity_threshold", self.crs.ambiguity_threshold),
        ];
        for (name, value) in unit_ranged {
            if !(0.0..=1.0).contains(&value) || value.is_nan() {
                return Err(ConfigError::OutOfRange { name, value });
            }
        }
        if !(self.crs.temperature > 0.0) {
            return Err(ConfigError::NonPositiveTemperature(self.crs.temperature));
        }
        if self.crs.top_n == 0 {
            return Err(ConfigError::ZeroTopN);
        }
        if !(1..=60).contains(&self.crs.fallback_zone) {
            return Err(ConfigError::BadFallbackZone(self.crs.fallback_zone));
        }
        Ok(())
    }
}

/// Find config file by searching current directory and parents, then
/// the home directory.
fn find_config_file() -> Option<PathBuf> {
    if let Ok(mut current) = std::env::current_dir() {
        loop {
            let config_path = current.join(".segiq").join("config.yaml");
            if config_path.exists() {
                return Some(config_path);
            }
            if !current.pop() {
                break;
            }
        }
    }

    let home_config = dirs::home_dir()?.join(".segiq").join("config.yaml");
    home_config.exists().then_some(home_config)
}
