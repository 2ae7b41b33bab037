//! Engine tuning constants.
//!
//! Distances marked "screen px" are divided by the current zoom before use,
//! so they feel the same at every zoom level. Distances in content units are
//! used as-is.

use serde::{Deserialize, Serialize};

/// Configuration for `CanvasEngine`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    /// Cursor displacement (content units) before a press becomes a move.
    pub move_threshold: f64,
    /// Clicking this close (content units) to the first pen point closes the path.
    pub close_path_distance: f64,

    /// Vertex hit radius in vertex-edit mode (screen px).
    pub vertex_hit_radius: f64,
    /// Bezier handle hit radius (screen px).
    pub handle_hit_radius: f64,
    /// Distance from an edge that inserts a new vertex (screen px).
    pub edge_hit_distance: f64,

    /// Gravity radius around row anchors during relationship drags (screen px).
    pub anchor_snap_radius: f64,
    /// Distance of row anchors outside the table edge (content units).
    pub anchor_offset: f64,
    /// Radius for starting a relationship drag on an anchor dot (screen px).
    pub anchor_hit_radius: f64,
    /// Click tolerance around a relationship line (screen px).
    pub relationship_hit_tolerance: f64,

    /// Base snap tolerance (screen px).
    pub snap_tolerance: f64,

    /// Window during which ambiguous wheel events reuse the last gesture (ms).
    pub gesture_hysteresis_ms: f64,
    /// Integer `|deltaY|` above which a vertical-only wheel event is a mouse wheel.
    pub discrete_wheel_threshold: f64,
    /// Zoom factor per wheel delta unit: `factor = exp(-delta * sensitivity)`.
    pub wheel_zoom_sensitivity: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
    /// Multiplier for keyboard zoom in/out.
    pub zoom_step: f64,

    /// Per-frame velocity decay of the zoom settle animation.
    pub settle_friction: f64,
    /// Settle loop stops once `|velocity|` drops below this.
    pub settle_velocity_floor: f64,
    /// Nominal frame duration used to normalize settle ticks (ms).
    pub frame_ms: f64,

    /// How long the zoom indicator stays up after the last zoom change (ms).
    pub zoom_indicator_ms: f64,
    /// Maximum interval between clicks of a double-click (ms).
    pub double_click_ms: f64,
    /// Maximum distance between clicks of a double-click (screen px).
    pub double_click_distance: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            move_threshold: 3.0,
            close_path_distance: 10.0,
            vertex_hit_radius: 8.0,
            handle_hit_radius: 6.0,
            edge_hit_distance: 10.0,
            anchor_snap_radius: 30.0,
            anchor_offset: 5.0,
            anchor_hit_radius: 7.0,
            relationship_hit_tolerance: 6.0,
            snap_tolerance: 10.0,
            gesture_hysteresis_ms: 100.0,
            discrete_wheel_threshold: 50.0,
            wheel_zoom_sensitivity: 0.0015,
            min_zoom: 0.1,
            max_zoom: 5.0,
            zoom_step: 1.2,
            settle_friction: 0.92,
            settle_velocity_floor: 0.0005,
            frame_ms: 16.0,
            zoom_indicator_ms: 1500.0,
            double_click_ms: 300.0,
            double_click_distance: 5.0,
        }
    }
}

impl EngineConfig {
    /// Load overrides from JSON. Missing fields keep their defaults.
    ///
    /// # Errors
    /// Returns the JSON error message for malformed input or wrong field
    /// types, or a validation message when the zoom limits are unusable.
    pub fn from_json(json: &str) -> Result<Self, String> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| format!("Config parse error: {e}"))?;
        config.validate()?;
        Ok(config)
    }

    /// Zoom limits must be positive and ordered.
    ///
    /// # Errors
    /// Names the offending limits.
    pub fn validate(&self) -> Result<(), String> {
        let (min, max) = (self.min_zoom, self.max_zoom);
        if min.is_nan() || max.is_nan() || min <= 0.0 || max < min {
            return Err(format!(
                "Config error: zoom limits {min}..{max} must satisfy 0 < minZoom <= maxZoom"
            ));
        }
        Ok(())
    }

    /// Never panics, even on inverted limits; the upper limit wins then.
    pub fn clamp_zoom(&self, zoom: f64) -> f64 {
        zoom.max(self.min_zoom).min(self.max_zoom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config = EngineConfig::from_json(r#"{"moveThreshold": 5, "maxZoom": 8}"#).unwrap();
        assert_eq!(config.move_threshold, 5.0);
        assert_eq!(config.max_zoom, 8.0);
        assert_eq!(config.close_path_distance, 10.0);
        assert_eq!(config.gesture_hysteresis_ms, 100.0);
    }

    #[test]
    fn malformed_json_is_an_error() {
        let err = EngineConfig::from_json(r#"{"moveThreshold": "far"}"#).unwrap_err();
        assert!(err.starts_with("Config parse error"));
    }

    #[test]
    fn zoom_is_clamped() {
        let config = EngineConfig::default();
        assert_eq!(config.clamp_zoom(0.01), 0.1);
        assert_eq!(config.clamp_zoom(12.0), 5.0);
        assert_eq!(config.clamp_zoom(1.5), 1.5);
    }

    #[test]
    fn inverted_zoom_limits_are_rejected() {
        let err = EngineConfig::from_json(r#"{"minZoom": 4, "maxZoom": 2}"#).unwrap_err();
        assert!(err.contains("minZoom <= maxZoom"));
        assert!(EngineConfig::from_json(r#"{"minZoom": 0}"#).is_err());
    }

    #[test]
    fn clamp_survives_hand_built_inverted_limits() {
        let config = EngineConfig {
            min_zoom: 4.0,
            max_zoom: 2.0,
            ..EngineConfig::default()
        };
        assert_eq!(config.clamp_zoom(3.0), 2.0);
    }
}
