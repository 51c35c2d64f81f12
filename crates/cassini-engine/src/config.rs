//! Simulation configuration.
//!
//! Every field has a default, so a config document only needs to name the
//! values it changes:
//!
//! ```
//! use cassini_engine::config::SimConfig;
//!
//! let config = SimConfig::from_json_str(r#"{"screen_width": 1024}"#).unwrap();
//! assert_eq!(config.screen_width, 1024);
//! assert_eq!(config.screen_height, 480);
//! ```

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Seconds per main tick. Must be positive and finite.
    pub fixed_dt: f64,
    /// Seconds between action-queue steps. Must be positive and finite.
    pub event_interval: f64,
    pub screen_width: u32,
    pub screen_height: u32,
    /// Seed of the entity UUID generator.
    pub uuid_seed: u64,
    /// Seconds between repeats of a held arrow key.
    pub key_repeat_interval: f32,
    /// Screen distance under which a press and release count as a tap.
    pub touch_sensitivity: f32,
    /// Largest camera pan per drag event, in world units.
    pub drag_limit: f32,
    pub keyboard_pan_step: f32,
    pub zoom_min: f32,
    pub zoom_max: f32,
    pub zoom_step: f32,
    /// Map new agents start on.
    pub default_map: String,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            fixed_dt: 1.0 / 60.0,
            event_interval: 1.0 / 25.0,
            screen_width: 800,
            screen_height: 480,
            uuid_seed: 0,
            key_repeat_interval: 0.125,
            touch_sensitivity: 2.0,
            drag_limit: 20.0,
            keyboard_pan_step: 4.0,
            zoom_min: 0.25,
            zoom_max: 4.0,
            zoom_step: 0.05,
            default_map: String::from("maps/test.tmx"),
        }
    }
}

impl SimConfig {
    pub fn from_json_str(json: &str) -> EngineResult<Self> {
        let config: Self = serde_json::from_str(json).map_err(|e| EngineError::InvalidConfig {
            details: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Read a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_json_str(&json)
            .with_context(|| format!("failed to parse config {}", path.display()))
    }

    pub fn validate(&self) -> EngineResult<()> {
        let rate_ok = |v: f64| v > 0.0 && v.is_finite();
        if !rate_ok(self.fixed_dt) || !rate_ok(self.event_interval) {
            return Err(EngineError::InvalidConfig {
                details: format!(
                    "fixed_dt ({}) and event_interval ({}) must be positive and finite",
                    self.fixed_dt, self.event_interval
                ),
            });
        }
        if self.zoom_min > self.zoom_max {
            return Err(EngineError::InvalidConfig {
                details: format!(
                    "zoom_min ({}) exceeds zoom_max ({})",
                    self.zoom_min, self.zoom_max
                ),
            });
        }
        Ok(())
    }
}
