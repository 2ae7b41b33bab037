//! Viewport math: screen ↔ content conversion, anchored zoom, pan, and the
//! zoom settle animation.
//!
//! Screen space is pixels relative to the canvas container; content space is
//! the diagram's own coordinate system:
//!
//! ```text
//! screen = content * zoom + pan
//! content = (screen - pan) / zoom
//! ```
//!
//! Pans are always applied 1:1 with no smoothing and no inertia: a released
//! two-finger pan stops dead. Zoom gestures may settle with a short decaying
//! animation after they end.

use crate::config::EngineConfig;
use dc_core::model::{Bounds, Point, ViewState};
use dc_core::store::StoreCommand;

/// Size of the canvas container in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContainerSize {
    pub width: f64,
    pub height: f64,
}

impl ContainerSize {
    /// Negative or NaN dimensions collapse to zero.
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width: width.max(0.0),
            height: height.max(0.0),
        }
    }

    pub fn center(&self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }

    fn clamp(&self, p: Point) -> Point {
        Point::new(p.x.max(0.0).min(self.width), p.y.max(0.0).min(self.height))
    }
}

impl Default for ContainerSize {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
        }
    }
}

pub fn screen_to_content(p: Point, view: &ViewState) -> Point {
    (p - view.pan) / view.zoom
}

pub fn content_to_screen(p: Point, view: &ViewState) -> Point {
    p * view.zoom + view.pan
}

/// The content-space rectangle currently visible in the container.
pub fn visible_content_bounds(view: &ViewState, container: ContainerSize) -> Bounds {
    Bounds::from_corners(
        screen_to_content(Point::ZERO, view),
        screen_to_content(Point::new(container.width, container.height), view),
    )
}

/// Pan that keeps the content under `anchor` (screen) fixed when switching
/// to `zoom`.
pub fn pan_for_anchored_zoom(view: &ViewState, zoom: f64, anchor: Point) -> Point {
    let content = screen_to_content(anchor, view);
    anchor - content * zoom
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct ZoomSettle {
    /// Log-zoom change per nominal frame.
    velocity: f64,
    anchor: Point,
    last_tick: f64,
}

pub struct ViewportController {
    config: EngineConfig,
    settle: Option<ZoomSettle>,
    /// Last zoom change during a gesture: `(zoom, timestamp)`.
    last_zoom_sample: Option<(f64, f64)>,
    zoom_velocity: f64,
    zoom_indicator_until: Option<f64>,
}

impl ViewportController {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            config: config.clone(),
            settle: None,
            last_zoom_sample: None,
            zoom_velocity: 0.0,
            zoom_indicator_until: None,
        }
    }

    /// Convert a wheel delta into a zoom change anchored at `center`.
    pub fn wheel_zoom(
        &mut self,
        view: &ViewState,
        delta: f64,
        center: Point,
        container: ContainerSize,
        now: f64,
    ) -> Vec<StoreCommand> {
        let factor = (-delta * self.config.wheel_zoom_sensitivity).exp();
        self.set_zoom_level(view, view.zoom * factor, center, container, now)
    }

    /// Zoom to an absolute level, keeping the content under `center` fixed.
    pub fn set_zoom_level(
        &mut self,
        view: &ViewState,
        target_zoom: f64,
        center: Point,
        container: ContainerSize,
        now: f64,
    ) -> Vec<StoreCommand> {
        self.settle = None;
        let zoom = self.config.clamp_zoom(target_zoom);
        self.sample_zoom(view.zoom, zoom, now);
        self.zoom_indicator_until = Some(now + self.config.zoom_indicator_ms);
        if zoom == view.zoom {
            return Vec::new();
        }
        let pan = pan_for_anchored_zoom(view, zoom, container.clamp(center));
        vec![StoreCommand::SetZoom(zoom), StoreCommand::SetPan(pan)]
    }

    /// Immediate, unsmoothed pan.
    pub fn instant_pan(&self, pan: Point) -> StoreCommand {
        StoreCommand::SetPan(pan)
    }

    /// Two-finger scroll: content moves opposite to the wheel delta.
    pub fn scroll_pan(&self, view: &ViewState, delta: Point) -> StoreCommand {
        self.instant_pan(view.pan - delta)
    }

    /// Drag-to-pan: content follows the pointer.
    pub fn drag_pan(&self, view: &ViewState, screen_delta: Point) -> StoreCommand {
        self.instant_pan(view.pan + screen_delta)
    }

    pub fn zoom_in(&mut self, view: &ViewState, container: ContainerSize, now: f64) -> Vec<StoreCommand> {
        let target = view.zoom * self.config.zoom_step;
        self.set_zoom_level(view, target, container.center(), container, now)
    }

    pub fn zoom_out(&mut self, view: &ViewState, container: ContainerSize, now: f64) -> Vec<StoreCommand> {
        let target = view.zoom / self.config.zoom_step;
        self.set_zoom_level(view, target, container.center(), container, now)
    }

    pub fn reset_zoom(&mut self, view: &ViewState, container: ContainerSize, now: f64) -> Vec<StoreCommand> {
        self.set_zoom_level(view, 1.0, container.center(), container, now)
    }

    fn sample_zoom(&mut self, from: f64, to: f64, now: f64) {
        let frames = match self.last_zoom_sample {
            Some((_, at)) if now > at && now - at < self.config.gesture_hysteresis_ms => {
                (now - at) / self.config.frame_ms
            }
            _ => 0.0,
        };
        self.zoom_velocity = if frames > 0.0 && from > 0.0 {
            (to / from).ln() / frames.max(1.0)
        } else {
            0.0
        };
        self.last_zoom_sample = Some((to, now));
    }

    // ─── Settle animation ────────────────────────────────────────────────

    /// End of a zoom gesture: hand the sampled velocity to the settle loop.
    /// Returns whether an animation started.
    pub fn end_gesture(&mut self, anchor: Point, now: f64) -> bool {
        let velocity = self.zoom_velocity;
        self.zoom_velocity = 0.0;
        self.last_zoom_sample = None;
        if velocity.abs() < self.config.settle_velocity_floor {
            self.settle = None;
            return false;
        }
        log::debug!("zoom settle start velocity={velocity:.5}");
        self.settle = Some(ZoomSettle {
            velocity,
            anchor,
            last_tick: now,
        });
        true
    }

    /// Advance the settle animation and the zoom indicator timer.
    pub fn tick(&mut self, view: &ViewState, now: f64) -> Vec<StoreCommand> {
        if self.zoom_indicator_until.is_some_and(|until| now >= until) {
            self.zoom_indicator_until = None;
        }

        let Some(mut settle) = self.settle else {
            return Vec::new();
        };
        let frames = ((now - settle.last_tick) / self.config.frame_ms).max(0.0);
        if frames == 0.0 {
            return Vec::new();
        }
        settle.velocity *= self.config.settle_friction.powf(frames);
        settle.last_tick = now;

        let zoom = self.config.clamp_zoom(view.zoom * (settle.velocity * frames).exp());
        let at_limit = zoom == self.config.min_zoom || zoom == self.config.max_zoom;
        if settle.velocity.abs() < self.config.settle_velocity_floor || at_limit {
            log::debug!("zoom settle stop");
            self.settle = None;
        } else {
            self.settle = Some(settle);
        }

        if zoom == view.zoom {
            return Vec::new();
        }
        self.zoom_indicator_until = Some(now + self.config.zoom_indicator_ms);
        let pan = pan_for_anchored_zoom(view, zoom, settle.anchor);
        vec![StoreCommand::SetZoom(zoom), StoreCommand::SetPan(pan)]
    }

    pub fn is_settling(&self) -> bool {
        self.settle.is_some()
    }

    /// Stop any running animation (new gesture, teardown).
    pub fn cancel(&mut self) {
        self.settle = None;
        self.zoom_velocity = 0.0;
        self.last_zoom_sample = None;
    }

    pub fn zoom_indicator_visible(&self, now: f64) -> bool {
        self.zoom_indicator_until.is_some_and(|until| now < until)
    }

    /// Drop every timer.
    pub fn teardown(&mut self) {
        self.cancel();
        self.zoom_indicator_until = None;
    }
}
