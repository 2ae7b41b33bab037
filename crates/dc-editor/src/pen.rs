//! Pen tool: click to place path points, drag after a click to pull out
//! bezier handles, click near the first point to close.
//!
//! ```text
//! idle ──click──▶ drawing ──click──▶ dragging-handle ──release──▶ drawing
//!                    │                                              │
//!                    ├── click near first point (>2 points) ──▶ closed
//!                    ├── Enter (≥3 points) ───────────────────▶ closed
//!                    └── Escape ──────────────────────────────▶ cancelled
//! ```

use crate::input::{InputEvent, PointerInput};
use crate::tools::{Tool, ToolContext};
use dc_core::model::{Point, SnapIndicator};
use dc_core::store::{CanvasStore, StoreCommand};

#[derive(Default)]
pub struct BezierPathAuthor {
    /// Index of the point whose handle is being dragged.
    handle_drag: Option<usize>,
    /// Snapped hover position, for the rubber-band segment preview.
    cursor: Option<Point>,
    indicators: Vec<SnapIndicator>,
}

impl BezierPathAuthor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cursor(&self) -> Option<Point> {
        self.cursor
    }

    pub fn indicators(&self) -> &[SnapIndicator] {
        &self.indicators
    }

    pub fn is_dragging_handle(&self) -> bool {
        self.handle_drag.is_some()
    }

    /// Enter: finish an open path with at least three points.
    pub fn finish(&mut self, store: &dyn CanvasStore) -> Vec<StoreCommand> {
        let drawing = store.drawing();
        if !drawing.is_drawing || drawing.bezier_path.len() < 3 {
            return vec![];
        }
        self.reset();
        vec![StoreCommand::FinishDrawing]
    }

    /// Escape: discard the in-progress path.
    pub fn abort(&mut self, store: &dyn CanvasStore) -> Vec<StoreCommand> {
        self.reset();
        if store.drawing().is_drawing {
            vec![StoreCommand::CancelDrawing]
        } else {
            vec![]
        }
    }

    fn reset(&mut self) {
        self.handle_drag = None;
        self.cursor = None;
        self.indicators.clear();
    }

    fn pointer_down(&mut self, input: &PointerInput, ctx: &ToolContext) -> Vec<StoreCommand> {
        let store = ctx.store;
        let p = ctx.to_content(input.position);
        let drawing = store.drawing();

        if !drawing.is_drawing {
            let snap = ctx.snapping.snap_point(p, &[], false, store);
            log::debug!("pen: start at {:?}", snap.point);
            self.indicators = snap.indicators;
            return vec![StoreCommand::StartDrawing(snap.point)];
        }

        let path = &drawing.bezier_path;
        if let Some(first) = path.first()
            && path.len() > 2
            && p.distance(first.point()) <= ctx.config.close_path_distance
        {
            log::debug!("pen: closing path with {} points", path.len());
            self.reset();
            return vec![StoreCommand::FinishDrawing];
        }

        let snap = ctx.snapping.snapped_drawing_point(p, store);
        self.indicators = snap.indicators;
        self.handle_drag = Some(path.len());
        vec![
            StoreCommand::AddBezierPoint(snap.point),
            StoreCommand::SetDraggingHandle(true),
        ]
    }

    fn pointer_move(&mut self, input: &PointerInput, ctx: &ToolContext) -> Vec<StoreCommand> {
        let store = ctx.store;
        let p = ctx.to_content(input.position);
        if let Some(index) = self.handle_drag {
            let Some(anchor) = store.drawing().bezier_path.get(index).map(|v| v.point()) else {
                return vec![];
            };
            // A click without a real drag keeps a corner point.
            if p.distance(anchor) <= ctx.config.move_threshold {
                return vec![];
            }
            return vec![StoreCommand::SetBezierHandle {
                index,
                handle_out: p,
            }];
        }
        if store.drawing().is_drawing {
            let snap = ctx.snapping.snapped_drawing_point(p, store);
            self.cursor = Some(snap.point);
            self.indicators = snap.indicators;
        }
        vec![]
    }

    fn pointer_up(&mut self) -> Vec<StoreCommand> {
        match self.handle_drag.take() {
            Some(_) => vec![StoreCommand::SetDraggingHandle(false)],
            None => vec![],
        }
    }
}

impl Tool for BezierPathAuthor {
    fn handle(&mut self, event: &InputEvent, ctx: &ToolContext) -> Vec<StoreCommand> {
        match event {
            InputEvent::PointerDown(input) => self.pointer_down(input, ctx),
            InputEvent::PointerMove(input) => self.pointer_move(input, ctx),
            InputEvent::PointerUp(_) => self.pointer_up(),
            _ => vec![],
        }
    }

    fn is_active(&self) -> bool {
        self.handle_drag.is_some()
    }

    fn cancel(&mut self) {
        self.reset();
    }
}
