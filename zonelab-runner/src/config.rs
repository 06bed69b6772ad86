//! TOML configuration for detection, scoring and screening.
//!
//! Every section is optional and falls back to its defaults, so an empty
//! document is a valid config. Values are checked by `validate()` before any
//! detector sees them; the core's constructors assert on the same rules.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use zonelab_core::scoring::{AgingConfig, ConfluenceConfig};
use zonelab_core::screener::ScreenerConfig;
use zonelab_core::structure::SwingConfig;
use zonelab_core::zones::{FvgConfig, OrderBlockConfig};
use zonelab_core::AnalysisConfig;

/// Errors from loading or validating a config.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

/// Upper bound on any single score weight; scores themselves top out at 100.
pub const MAX_WEIGHT_POINTS: u32 = 100;

fn check_points(weights: &[(&'static str, u32)]) -> Result<(), ConfigError> {
    match weights.iter().find(|(_, points)| *points > MAX_WEIGHT_POINTS) {
        Some(&(field, points)) => Err(invalid(
            field,
            format!("must be <= {MAX_WEIGHT_POINTS} points, got {points}"),
        )),
        None => Ok(()),
    }
}

/// Full zonelab configuration document.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ZonelabConfig {
    pub swing: SwingConfig,
    pub orderblock: OrderBlockConfig,
    pub fvg: FvgConfig,
    pub aging: AgingConfig,
    pub confluence: ConfluenceConfig,
    pub screener: ScreenerConfig,
}

impl ZonelabConfig {
    /// Load and validate a config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a TOML document.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// The detector/scorer part of the config.
    pub fn analysis(&self) -> AnalysisConfig {
        AnalysisConfig {
            swing: self.swing,
            orderblock: self.orderblock,
            fvg: self.fvg,
            aging: self.aging,
            confluence: self.confluence,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.swing.left_bars == 0 {
            return Err(invalid("swing.left_bars", "must be >= 1"));
        }
        if self.swing.right_bars == 0 {
            return Err(invalid("swing.right_bars", "must be >= 1"));
        }

        let ob = &self.orderblock;
        if !ob.displacement_threshold.is_finite() || ob.displacement_threshold <= 0.0 {
            return Err(invalid(
                "orderblock.displacement_threshold",
                format!("must be a positive finite number, got {}", ob.displacement_threshold),
            ));
        }
        if ob.lookback == 0 {
            return Err(invalid("orderblock.lookback", "must be >= 1"));
        }

        let frac = self.fvg.mitigation_fraction;
        if !(0.0..=1.0).contains(&frac) {
            return Err(invalid(
                "fvg.mitigation_fraction",
                format!("must be within [0, 1], got {frac}"),
            ));
        }

        let aging = &self.aging;
        if aging.fresh_max_candles > aging.mature_max_candles {
            return Err(invalid(
                "aging.fresh_max_candles",
                format!(
                    "{} exceeds mature_max_candles {}",
                    aging.fresh_max_candles, aging.mature_max_candles
                ),
            ));
        }
        if aging.volume_lookback == 0 {
            return Err(invalid("aging.volume_lookback", "must be >= 1"));
        }
        if !aging.weights.is_monotonic() {
            return Err(invalid(
                "aging.weights",
                "require fresh >= mature >= aged and a finite, non-negative volume_per_ratio",
            ));
        }
        let w = &aging.weights;
        check_points(&[
            ("aging.weights.fresh", w.fresh),
            ("aging.weights.mature", w.mature),
            ("aging.weights.aged", w.aged),
            ("aging.weights.fvg_fresh", w.fvg_fresh),
            ("aging.weights.volume_cap", w.volume_cap),
        ])?;

        let conf = &self.confluence;
        if !conf.proximity_atr_span.is_finite() || conf.proximity_atr_span <= 0.0 {
            return Err(invalid(
                "confluence.proximity_atr_span",
                format!("must be a positive finite number, got {}", conf.proximity_atr_span),
            ));
        }
        if conf.cutoff > 100 {
            return Err(invalid("confluence.cutoff", "must be <= 100"));
        }
        check_points(&[
            ("confluence.ob_base", conf.ob_base),
            ("confluence.ob_fvg_bonus", conf.ob_fvg_bonus),
            ("confluence.fvg_base", conf.fvg_base),
            ("confluence.fvg_fresh_bonus", conf.fvg_fresh_bonus),
            ("confluence.overlap_bonus", conf.overlap_bonus),
            ("confluence.proximity_max", conf.proximity_max),
        ])?;
        if conf.atr_period == 0 {
            return Err(invalid("confluence.atr_period", "must be >= 1"));
        }

        let scr = &self.screener;
        if scr.fast_period == 0 {
            return Err(invalid("screener.fast_period", "must be >= 1"));
        }
        if scr.fast_period >= scr.slow_period {
            return Err(invalid(
                "screener.fast_period",
                format!(
                    "must be less than slow_period ({} >= {})",
                    scr.fast_period, scr.slow_period
                ),
            ));
        }
        if scr.top == 0 {
            return Err(invalid("screener.top", "must be >= 1"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_is_default() {
        let config = ZonelabConfig::from_toml("").unwrap();
        assert_eq!(config, ZonelabConfig::default());
    }

    #[test]
    fn default_round_trips_through_toml() {
        let text = ZonelabConfig::default().to_toml().unwrap();
        assert!(text.contains("[orderblock]"));
        assert!(text.contains("[aging.weights]"));
        let back = ZonelabConfig::from_toml(&text).unwrap();
        assert_eq!(back, ZonelabConfig::default());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = ZonelabConfig::from_toml(
            r#"
[orderblock]
displacement_threshold = 2.0

[screener]
fast_period = 10
slow_period = 30
"#,
        )
        .unwrap();
        assert_eq!(config.orderblock.displacement_threshold, 2.0);
        assert_eq!(config.orderblock.lookback, 20);
        assert_eq!(config.screener.fast_period, 10);
        assert_eq!(config.screener.max_days, 30);
        assert_eq!(config.aging, AgingConfig::default());
    }

    #[test]
    fn rejects_inverted_screener_periods() {
        let err = ZonelabConfig::from_toml("[screener]\nfast_period = 50\nslow_period = 20\n")
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "screener.fast_period",
                ..
            }
        ));
    }

    #[test]
    fn rejects_out_of_range_values() {
        let cases = [
            "[swing]\nleft_bars = 0\n",
            "[orderblock]\ndisplacement_threshold = 0.0\n",
            "[orderblock]\nlookback = 0\n",
            "[fvg]\nmitigation_fraction = 1.5\n",
            "[aging]\nfresh_max_candles = 40\nmature_max_candles = 30\n",
            "[aging.weights]\naged = 90\n",
            "[confluence]\ncutoff = 101\n",
            "[confluence]\nproximity_atr_span = -1.0\n",
            "[confluence]\noverlap_bonus = 101\n",
            "[aging.weights]\nfresh = 1000\n",
        ];
        for case in cases {
            let result = ZonelabConfig::from_toml(case);
            assert!(
                matches!(result, Err(ConfigError::Invalid { .. })),
                "expected rejection for {case:?}"
            );
        }
    }

    #[test]
    fn rejects_weights_beyond_score_range() {
        let err = ZonelabConfig::from_toml("[confluence]\nob_base = 4294967295\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "confluence.ob_base",
                ..
            }
        ));
        let err = ZonelabConfig::from_toml("[aging.weights]\nvolume_cap = 500\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "aging.weights.volume_cap",
                ..
            }
        ));
        // the bound itself is allowed
        let config = ZonelabConfig::from_toml("[confluence]\nob_base = 100\n").unwrap();
        assert_eq!(config.confluence.ob_base, MAX_WEIGHT_POINTS);
    }

    #[test]
    fn rejects_unknown_section() {
        let result = ZonelabConfig::from_toml("[unknown]\nx = 1\n");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = ZonelabConfig::from_file(Path::new("/nonexistent/zonelab.toml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/zonelab.toml"));
    }
}
