//! Tool system for canvas interactions.
//!
//! Each controller translates pointer events into `StoreCommand`s that the
//! engine forwards to the store. Controllers read the store through a
//! `ToolContext` snapshot and never mutate it themselves.
//!
//! ## Modifier behaviors
//!
//! | Modifier     | Select Tool                    | Pen Tool | Vertex edit         |
//! |--------------|--------------------------------|----------|---------------------|
//! | **Ctrl/Cmd** | Add / remove from selection    | —        | Toggle vertex       |
//! | **Shift**    | —                              | —        | Toggle vertex       |
//! | **Alt**      | Duplicate on release, no snap  | No snap  | No snap             |

use crate::config::EngineConfig;
use crate::input::InputEvent;
use crate::snapping::SnappingEngine;
use crate::viewport::{ContainerSize, ViewportController, screen_to_content, visible_content_bounds};
use dc_core::model::{Bounds, Point};
use dc_core::store::{CanvasStore, StoreCommand};

/// The active tool determines how pointer events on the canvas are
/// interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToolKind {
    #[default]
    Select,
    Pen,
    Pan,
}

/// Read-only view of everything a controller needs for one event.
pub struct ToolContext<'a> {
    pub store: &'a dyn CanvasStore,
    pub config: &'a EngineConfig,
    pub snapping: &'a SnappingEngine,
    pub viewport: &'a ViewportController,
    pub container: ContainerSize,
}

impl ToolContext<'_> {
    pub fn zoom(&self) -> f64 {
        self.store.view().zoom
    }

    pub fn to_content(&self, screen: Point) -> Point {
        screen_to_content(screen, self.store.view())
    }

    pub fn visible_bounds(&self) -> Bounds {
        visible_content_bounds(self.store.view(), self.container)
    }

    /// Convert a screen-pixel radius into content units at the current zoom.
    pub fn screen_radius(&self, px: f64) -> f64 {
        px / self.zoom()
    }
}

/// A pointer-driven controller.
pub trait Tool {
    /// Handle a pointer event, returning zero or more store commands.
    fn handle(&mut self, event: &InputEvent, ctx: &ToolContext) -> Vec<StoreCommand>;

    /// Whether a press-drag-release gesture is in progress.
    fn is_active(&self) -> bool;

    /// Abandon the in-flight gesture without committing it.
    fn cancel(&mut self);
}
