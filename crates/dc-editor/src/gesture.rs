//! Wheel / trackpad / pinch disambiguation.
//!
//! Browsers report mouse wheels, two-finger trackpad scrolls and trackpad
//! pinches through the same wheel event. The classifier tells them apart
//! with a small heuristic, then holds the result for a short hysteresis
//! window so a trackpad producing mixed deltas mid-gesture doesn't flicker
//! between pan and zoom.
//!
//! | Input                                      | Result |
//! |--------------------------------------------|--------|
//! | `ctrlKey` (pinch)                          | zoom   |
//! | `deltaX != 0` or fractional `deltaY`       | pan    |
//! | `deltaX == 0`, integer `\|deltaY\| > 50`   | zoom   |
//! | anything else                              | pan    |

use crate::config::EngineConfig;
use crate::input::WheelInput;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureKind {
    Pan,
    Zoom,
}

/// Native pinch session (`gesturestart` → `gestureend`).
#[derive(Debug, Clone, Copy, PartialEq)]
struct PinchSession {
    initial_scale: f64,
    initial_zoom: f64,
}

pub struct GestureClassifier {
    hysteresis_ms: f64,
    discrete_wheel_threshold: f64,
    /// Last resolved classification and when it happened.
    last: Option<(GestureKind, f64)>,
    pinch: Option<PinchSession>,
}

impl GestureClassifier {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            hysteresis_ms: config.gesture_hysteresis_ms,
            discrete_wheel_threshold: config.discrete_wheel_threshold,
            last: None,
            pinch: None,
        }
    }

    /// Stateless heuristic, without hysteresis.
    pub fn heuristic(&self, wheel: &WheelInput) -> GestureKind {
        if wheel.ctrl_key {
            return GestureKind::Zoom;
        }
        if wheel.delta_x != 0.0 || wheel.delta_y.fract() != 0.0 {
            return GestureKind::Pan;
        }
        if wheel.delta_y.abs() > self.discrete_wheel_threshold {
            return GestureKind::Zoom;
        }
        GestureKind::Pan
    }

    /// Classify a wheel event. Ctrl+wheel is always a zoom; any other event
    /// inside the hysteresis window reuses the previous result. Every
    /// classification restarts the window.
    pub fn classify(&mut self, wheel: &WheelInput) -> GestureKind {
        let kind = match self.last {
            _ if wheel.ctrl_key => GestureKind::Zoom,
            Some((previous, at))
                if wheel.timestamp >= at && wheel.timestamp - at < self.hysteresis_ms =>
            {
                previous
            }
            _ => self.heuristic(wheel),
        };
        log::trace!(
            "wheel dx={} dy={} ctrl={} -> {kind:?}",
            wheel.delta_x,
            wheel.delta_y,
            wheel.ctrl_key
        );
        self.last = Some((kind, wheel.timestamp));
        kind
    }

    /// Forget the hysteresis state.
    pub fn reset(&mut self) {
        self.last = None;
        self.pinch = None;
    }

    // ─── Native pinch gestures ───────────────────────────────────────────

    /// `gesturestart`: remember the starting scale and the zoom it maps to.
    pub fn begin_pinch(&mut self, scale: f64, current_zoom: f64) {
        let initial_scale = if scale > 0.0 { scale } else { 1.0 };
        self.pinch = Some(PinchSession {
            initial_scale,
            initial_zoom: current_zoom,
        });
    }

    /// `gesturechange`: absolute zoom for the current scale. Computed from the
    /// session start every time so rounding never compounds.
    pub fn pinch_target(&self, scale: f64) -> Option<f64> {
        let session = self.pinch?;
        Some(session.initial_zoom * (scale / session.initial_scale))
    }

    /// `gestureend`. Returns whether a pinch was active.
    pub fn end_pinch(&mut self) -> bool {
        self.pinch.take().is_some()
    }

    pub fn is_pinching(&self) -> bool {
        self.pinch.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dc_core::model::Point;

    fn wheel(delta_x: f64, delta_y: f64, ctrl_key: bool, timestamp: f64) -> WheelInput {
        WheelInput {
            delta_x,
            delta_y,
            ctrl_key,
            position: Point::ZERO,
            timestamp,
        }
    }

    fn classifier() -> GestureClassifier {
        GestureClassifier::new(&EngineConfig::default())
    }

    #[test]
    fn ctrl_wheel_is_always_zoom() {
        let mut c = classifier();
        assert_eq!(c.classify(&wheel(0.0, 3.2, true, 0.0)), GestureKind::Zoom);
        // Even right after a pan.
        assert_eq!(c.classify(&wheel(4.0, 1.5, false, 500.0)), GestureKind::Pan);
        assert_eq!(c.classify(&wheel(4.0, 1.5, true, 520.0)), GestureKind::Zoom);
    }

    #[test]
    fn discrete_mouse_wheel_is_zoom() {
        let mut c = classifier();
        assert_eq!(c.classify(&wheel(0.0, 120.0, false, 0.0)), GestureKind::Zoom);
        assert_eq!(c.classify(&wheel(0.0, -100.0, false, 1000.0)), GestureKind::Zoom);
    }

    #[test]
    fn trackpad_scroll_is_pan() {
        let mut c = classifier();
        assert_eq!(c.classify(&wheel(2.5, -1.1, false, 0.0)), GestureKind::Pan);
        assert_eq!(c.classify(&wheel(0.0, 12.5, false, 1000.0)), GestureKind::Pan);
    }

    #[test]
    fn small_integer_delta_falls_back_to_pan() {
        assert_eq!(
            classifier().heuristic(&wheel(0.0, 40.0, false, 0.0)),
            GestureKind::Pan
        );
        assert_eq!(
            classifier().heuristic(&wheel(0.0, 0.0, false, 0.0)),
            GestureKind::Pan
        );
    }

    #[test]
    fn hysteresis_reuses_previous_classification() {
        let mut c = classifier();
        assert_eq!(c.classify(&wheel(2.5, -1.1, false, 0.0)), GestureKind::Pan);
        // Would be a zoom on its own, but lands inside the window.
        assert_eq!(c.classify(&wheel(0.0, 120.0, false, 60.0)), GestureKind::Pan);
        // The window restarted at 60, so 150 is still inside it.
        assert_eq!(c.classify(&wheel(0.0, 120.0, false, 150.0)), GestureKind::Pan);
        // Past the window: re-evaluated.
        assert_eq!(c.classify(&wheel(0.0, 120.0, false, 400.0)), GestureKind::Zoom);
    }

    #[test]
    fn native_pinch_targets_are_absolute() {
        let mut c = classifier();
        assert_eq!(c.pinch_target(2.0), None);
        c.begin_pinch(1.0, 1.5);
        assert!(c.is_pinching());
        assert_eq!(c.pinch_target(2.0), Some(3.0));
        assert_eq!(c.pinch_target(2.0), Some(3.0));
        assert_eq!(c.pinch_target(0.5), Some(0.75));
        assert!(c.end_pinch());
        assert!(!c.end_pinch());
    }
}
