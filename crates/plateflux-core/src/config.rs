use std::path::{Path, PathBuf};

use plateflux_parser::PlateLayout;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::swap::{SwapEvent, SwapSchedule, TriggerComparison, TriggerPolicy, TriggerUnit};
use crate::timeline::TimeSource;

pub const DEFAULT_SAMPLING_INTERVAL_S: i64 = 4;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file {0:?} does not exist")]
    BadFilePath(PathBuf),
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("sampling interval must be a positive number of seconds, got {0}")]
    InvalidSamplingInterval(i64),
    #[error("swap {index} ('{label}') has negative duration {duration_s}")]
    NegativeSwapDuration {
        index: usize,
        label: String,
        duration_s: i64,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutChoice {
    #[default]
    Auto,
    Grid,
    Log,
}

impl LayoutChoice {
    /// `None` means detect from the file contents.
    pub fn layout(&self) -> Option<PlateLayout> {
        match self {
            LayoutChoice::Auto => None,
            LayoutChoice::Grid => Some(PlateLayout::DenseGrid),
            LayoutChoice::Log => Some(PlateLayout::KeyValueLog),
        }
    }
}

/// Unset fields fall back to the layout's default trigger policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TriggerSettings {
    pub unit: Option<TriggerUnit>,
    pub comparison: Option<TriggerComparison>,
}

/// Settings for one processing run, loaded from TOML and/or command-line flags.
///
/// ```toml
/// sampling_interval_s = 4
/// layout = "grid"
///
/// [trigger]
/// unit = "cycle"
/// comparison = "at_or_after"
///
/// [[swaps]]
/// trigger = 1
/// duration_s = 10
/// label = "Post swap"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    pub sampling_interval_s: Option<i64>,
    pub layout: LayoutChoice,
    pub trigger: TriggerSettings,
    pub swaps: Vec<SwapEvent>,
}

impl RunConfig {
    pub fn read_config_file(config_path: &Path) -> Result<Self, ConfigError> {
        if !config_path.exists() {
            return Err(ConfigError::BadFilePath(config_path.to_path_buf()));
        }
        let toml_str = std::fs::read_to_string(config_path)?;
        Self::from_toml_str(&toml_str)
    }

    pub fn from_toml_str(toml_str: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.sampling_interval_s()?;
        for (index, swap) in self.swaps.iter().enumerate() {
            if swap.duration_s < 0 {
                return Err(ConfigError::NegativeSwapDuration {
                    index,
                    label: swap.label.to_string(),
                    duration_s: swap.duration_s,
                });
            }
        }
        Ok(())
    }

    pub fn sampling_interval_s(&self) -> Result<i64, ConfigError> {
        let interval = self
            .sampling_interval_s
            .unwrap_or(DEFAULT_SAMPLING_INTERVAL_S);
        if interval > 0 {
            Ok(interval)
        } else {
            Err(ConfigError::InvalidSamplingInterval(interval))
        }
    }

    pub fn time_source(&self, layout: PlateLayout) -> Result<TimeSource, ConfigError> {
        Ok(TimeSource::for_layout(layout, self.sampling_interval_s()?))
    }

    pub fn trigger_policy(&self, layout: PlateLayout) -> TriggerPolicy {
        let defaults = TriggerPolicy::for_layout(layout);
        TriggerPolicy {
            unit: self.trigger.unit.unwrap_or(defaults.unit),
            comparison: self.trigger.comparison.unwrap_or(defaults.comparison),
        }
    }

    pub fn schedule(&self) -> SwapSchedule {
        SwapSchedule::new(self.swaps.clone())
    }

    /// Overlays `other` on top of `self`: set values in `other` win, and a non-empty swap
    /// list in `other` replaces this one.
    pub fn merge(mut self, other: RunConfig) -> Self {
        if other.sampling_interval_s.is_some() {
            self.sampling_interval_s = other.sampling_interval_s;
        }
        if other.layout != LayoutChoice::Auto {
            self.layout = other.layout;
        }
        if other.trigger.unit.is_some() {
            self.trigger.unit = other.trigger.unit;
        }
        if other.trigger.comparison.is_some() {
            self.trigger.comparison = other.trigger.comparison;
        }
        if !other.swaps.is_empty() {
            self.swaps = other.swaps;
        }
        self
    }
}
