//! # View Layer Configuration
//!
//! Loaded once at startup from TOML. Every field has a default, so an empty
//! file is a valid configuration.
//!
//! ```toml
//! # Debug inspection: keep stale space views around.
//! reclaim_enabled = false
//! predict_move_correction = 0.25
//! tick_rate = 30
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tether_shared::{Vec2, DEFAULT_PREDICT_MOVE_CORRECTION, TICK_RATE};

use crate::error::{ViewError, ViewResult};
use crate::geometry::{self, MovementState};

/// Runtime configuration for the registry and its frame driver.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ViewConfig {
    /// Whether the driver reclaims silent space views.
    ///
    /// `false` is debug inspection mode: stale views persist.
    pub reclaim_enabled: bool,
    /// Seconds added to every move-duration prediction.
    pub predict_move_correction: f32,
    /// Ticks per second the host runtime drives the registry at.
    pub tick_rate: u32,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            reclaim_enabled: true,
            predict_move_correction: DEFAULT_PREDICT_MOVE_CORRECTION,
            tick_rate: TICK_RATE,
        }
    }
}

impl ViewConfig {
    /// Parses and validates a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ViewError::ConfigParse`] for malformed TOML and
    /// [`ViewError::InvalidConfig`] for out-of-range values.
    pub fn from_toml_str(text: &str) -> ViewResult<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ViewError::ConfigRead`] if the file cannot be read, otherwise
    /// whatever [`ViewConfig::from_toml_str`] returns.
    pub fn load(path: impl AsRef<Path>) -> ViewResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    fn validate(&self) -> ViewResult<()> {
        if self.tick_rate == 0 {
            return Err(ViewError::InvalidConfig(
                "tick_rate must be positive".into(),
            ));
        }
        if !self.predict_move_correction.is_finite() {
            return Err(ViewError::InvalidConfig(format!(
                "predict_move_correction must be finite, got {}",
                self.predict_move_correction
            )));
        }
        Ok(())
    }

    /// Wall-clock length of one tick.
    #[must_use]
    pub fn tick_interval(&self) -> Duration {
        Duration::from_nanos(1_000_000_000 / u64::from(self.tick_rate.max(1)))
    }

    /// [`geometry::predict_move_duration`] with the configured correction.
    #[must_use]
    pub fn predict_move_duration(&self, entity: &impl MovementState, target: Vec2) -> f32 {
        geometry::predict_move_duration(entity, target, self.predict_move_correction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::MovementSnapshot;
    use tether_shared::Vec3;

    #[test]
    fn test_empty_file_is_default() {
        let config = ViewConfig::from_toml_str("").unwrap();
        assert_eq!(config, ViewConfig::default());
        assert!(config.reclaim_enabled);
    }

    #[test]
    fn test_debug_mode_disables_reclaim() {
        let config = ViewConfig::from_toml_str(
            "reclaim_enabled = false\npredict_move_correction = 0.25\n",
        )
        .unwrap();
        assert!(!config.reclaim_enabled);
        assert_eq!(config.predict_move_correction, 0.25);
        assert_eq!(config.tick_rate, TICK_RATE);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(matches!(
            ViewConfig::from_toml_str("tick_rate = 0"),
            Err(ViewError::InvalidConfig(_))
        ));
        assert!(matches!(
            ViewConfig::from_toml_str("predict_move_correction = nan"),
            Err(ViewError::InvalidConfig(_))
        ));
        assert!(matches!(
            ViewConfig::from_toml_str("reclaim = true"),
            Err(ViewError::ConfigParse(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let path = std::env::temp_dir().join("tether_views_no_such_config.toml");
        assert!(matches!(ViewConfig::load(&path), Err(ViewError::ConfigRead(_))));
    }

    #[test]
    fn test_configured_correction() {
        let config = ViewConfig {
            predict_move_correction: 0.5,
            ..ViewConfig::default()
        };
        let entity = MovementSnapshot::new(Vec3::ZERO, 4.0);
        assert_eq!(config.predict_move_duration(&entity, Vec2::new(8.0, 0.0)), 2.5);
    }

    #[test]
    fn test_tick_interval() {
        let config = ViewConfig {
            tick_rate: 50,
            ..ViewConfig::default()
        };
        assert_eq!(config.tick_interval(), Duration::from_millis(20));
    }
}
