//! Select tool: click selection, area selection, drag-move and
//! Alt-duplicate.
//!
//! Moves are previewed, not applied: while dragging, the controller tracks a
//! snapped delta that the host renders on top of the stored positions. The
//! store sees a single `MoveTerritories` (or `DuplicateTerritories` when Alt
//! is held at release) when the pointer comes up.

use crate::input::{InputEvent, PointerInput};
use crate::tools::{Tool, ToolContext};
use dc_core::geometry::clamp_to_bounds;
use dc_core::hit::hit_test;
use dc_core::id::TerritoryId;
use dc_core::model::{Bounds, Point, SnapIndicator};
use dc_core::store::StoreCommand;

/// In-flight move of one or more territories.
#[derive(Debug, Clone, PartialEq)]
pub struct MoveGesture {
    pub ids: Vec<TerritoryId>,
    /// Content position of the press.
    press: Point,
    /// Center of the grabbed territory at press time; this is what snaps.
    reference: Point,
    /// Snapped offset from the original positions.
    pub delta: Point,
    /// Cursor has travelled past the move threshold.
    pub has_moved: bool,
    /// Alt is held: render a duplicate at `delta` and leave originals alone.
    pub duplicate: bool,
}

/// The four mutually exclusive gestures of the select tool.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SelectGesture {
    #[default]
    Idle,
    AreaSelecting {
        start: Point,
        current: Point,
        additive: bool,
    },
    /// Screen-space drag of the view (middle button or pan tool).
    DraggingView { last: Point },
    MovingTerritories(MoveGesture),
}

#[derive(Default)]
pub struct SelectionController {
    gesture: SelectGesture,
    indicators: Vec<SnapIndicator>,
}

impl SelectionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gesture(&self) -> &SelectGesture {
        &self.gesture
    }

    /// The current move, if the cursor has passed the threshold.
    pub fn move_preview(&self) -> Option<&MoveGesture> {
        match &self.gesture {
            SelectGesture::MovingTerritories(m) if m.has_moved => Some(m),
            _ => None,
        }
    }

    /// Normalized area-selection rectangle in content space.
    pub fn area_rect(&self) -> Option<Bounds> {
        match self.gesture {
            SelectGesture::AreaSelecting { start, current, .. } => {
                Some(Bounds::from_corners(start, current))
            }
            _ => None,
        }
    }

    pub fn indicators(&self) -> &[SnapIndicator] {
        &self.indicators
    }

    /// Start a view drag at `screen`. Used for the middle button and the
    /// pan tool.
    pub fn begin_view_drag(&mut self, screen: Point) {
        self.indicators.clear();
        self.gesture = SelectGesture::DraggingView { last: screen };
    }

    fn pointer_down(&mut self, input: &PointerInput, ctx: &ToolContext) -> Vec<StoreCommand> {
        let store = ctx.store;
        let p = ctx.to_content(input.position);
        let additive = input.modifiers.cmd();
        self.indicators.clear();

        let Some(id) = hit_test(store.territories(), p) else {
            let start = clamp_to_bounds(p, &ctx.visible_bounds());
            self.gesture = SelectGesture::AreaSelecting {
                start,
                current: start,
                additive,
            };
            return vec![];
        };

        let selection = store.selection();
        let already_selected = selection.contains(id);
        if already_selected && additive {
            // Ctrl/Cmd on a selected territory: deselect, no move.
            self.gesture = SelectGesture::Idle;
            return vec![StoreCommand::DeselectTerritory(id)];
        }

        let mut commands = Vec::new();
        let ids = if already_selected {
            selection.territories.clone()
        } else {
            commands.push(StoreCommand::SelectTerritory { id, additive });
            if additive {
                let mut ids = selection.territories.clone();
                ids.push(id);
                ids
            } else {
                vec![id]
            }
        };

        let reference = store.territory(id).map_or(p, |t| t.center);
        log::debug!("select: press on {id} moving {} territories", ids.len());
        self.gesture = SelectGesture::MovingTerritories(MoveGesture {
            ids,
            press: p,
            reference,
            delta: Point::ZERO,
            has_moved: false,
            duplicate: input.modifiers.alt,
        });
        commands
    }

    fn pointer_move(&mut self, input: &PointerInput, ctx: &ToolContext) -> Vec<StoreCommand> {
        match &mut self.gesture {
            SelectGesture::Idle => vec![],
            SelectGesture::AreaSelecting { current, .. } => {
                let p = ctx.to_content(input.position);
                *current = clamp_to_bounds(p, &ctx.visible_bounds());
                vec![]
            }
            SelectGesture::DraggingView { last } => {
                let delta = input.position - *last;
                *last = input.position;
                vec![ctx.viewport.drag_pan(ctx.store.view(), delta)]
            }
            SelectGesture::MovingTerritories(m) => {
                let raw = ctx.to_content(input.position) - m.press;
                if !m.has_moved && raw.length() <= ctx.config.move_threshold {
                    return vec![];
                }
                m.has_moved = true;
                m.duplicate = input.modifiers.alt;
                let snap = ctx.snapping.snap_point(
                    m.reference + raw,
                    &m.ids,
                    m.ids.len() > 1,
                    ctx.store,
                );
                m.delta = snap.point - m.reference;
                self.indicators = snap.indicators;
                vec![]
            }
        }
    }

    fn pointer_up(&mut self, input: &PointerInput) -> Vec<StoreCommand> {
        self.indicators.clear();
        match std::mem::take(&mut self.gesture) {
            SelectGesture::Idle | SelectGesture::DraggingView { .. } => vec![],
            SelectGesture::AreaSelecting {
                start,
                current,
                additive,
            } => vec![StoreCommand::SelectTerritoriesInArea {
                area: Bounds::from_corners(start, current),
                additive,
            }],
            SelectGesture::MovingTerritories(m) => {
                if !m.has_moved {
                    return vec![];
                }
                if input.modifiers.alt {
                    log::debug!("select: duplicate {} at {:?}", m.ids.len(), m.delta);
                    vec![StoreCommand::DuplicateTerritories {
                        ids: m.ids,
                        offset: Some(m.delta),
                    }]
                } else if m.delta == Point::ZERO {
                    vec![]
                } else {
                    vec![StoreCommand::MoveTerritories {
                        ids: m.ids,
                        delta: m.delta,
                    }]
                }
            }
        }
    }
}

impl Tool for SelectionController {
    fn handle(&mut self, event: &InputEvent, ctx: &ToolContext) -> Vec<StoreCommand> {
        match event {
            InputEvent::PointerDown(input) => self.pointer_down(input, ctx),
            InputEvent::PointerMove(input) => self.pointer_move(input, ctx),
            InputEvent::PointerUp(input) => self.pointer_up(input),
            _ => vec![],
        }
    }

    fn is_active(&self) -> bool {
        self.gesture != SelectGesture::Idle
    }

    fn cancel(&mut self) {
        self.gesture = SelectGesture::Idle;
        self.indicators.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::input::Modifiers;
    use crate::snapping::SnappingEngine;
    use crate::viewport::{ContainerSize, ViewportController};
    use dc_core::model::Territory;
    use dc_core::store::{CanvasStore, DiagramStore};
    use pretty_assertions::assert_eq;

    struct Harness {
        store: DiagramStore,
        config: EngineConfig,
        snapping: SnappingEngine,
        viewport: ViewportController,
        tool: SelectionController,
    }

    impl Harness {
        /// Two squares side by side, grid and snapping off.
        fn new() -> Self {
            let config = EngineConfig::default();
            let mut store = DiagramStore::new();
            store.add_territory(Territory::path(
                TerritoryId::intern("left"),
                Point::new(50.0, 50.0),
                "M 0 0 L 100 0 L 100 100 L 0 100 Z",
            ));
            store.add_territory(Territory::path(
                TerritoryId::intern("right"),
                Point::new(250.0, 50.0),
                "M 200 0 L 300 0 L 300 100 L 200 100 Z",
            ));
            store.apply(StoreCommand::ToggleSnapping);
            Self {
                snapping: SnappingEngine::new(&config),
                viewport: ViewportController::new(&config),
                store,
                config,
                tool: SelectionController::new(),
            }
        }

        fn send(&mut self, event: InputEvent) -> Vec<StoreCommand> {
            let ctx = ToolContext {
                store: &self.store,
                config: &self.config,
                snapping: &self.snapping,
                viewport: &self.viewport,
                container: ContainerSize::default(),
            };
            let commands = self.tool.handle(&event, &ctx);
            for cmd in &commands {
                self.store.apply(cmd.clone());
            }
            commands
        }
    }

    fn left() -> TerritoryId {
        TerritoryId::intern("left")
    }

    fn right() -> TerritoryId {
        TerritoryId::intern("right")
    }

    #[test]
    fn click_selects_and_replaces() {
        let mut h = Harness::new();
        h.send(InputEvent::PointerDown(PointerInput::at(50.0, 50.0)));
        h.send(InputEvent::PointerUp(PointerInput::at(50.0, 50.0)));
        h.send(InputEvent::PointerDown(PointerInput::at(250.0, 50.0)));
        h.send(InputEvent::PointerUp(PointerInput::at(250.0, 50.0)));
        assert_eq!(h.store.selection().territories, vec![right()]);
    }

    #[test]
    fn ctrl_click_adds_then_removes() {
        let mut h = Harness::new();
        h.send(InputEvent::PointerDown(PointerInput::at(50.0, 50.0)));
        h.send(InputEvent::PointerUp(PointerInput::at(50.0, 50.0)));
        let ctrl = PointerInput::at(250.0, 50.0).with_modifiers(Modifiers::CTRL);
        h.send(InputEvent::PointerDown(ctrl));
        h.send(InputEvent::PointerUp(ctrl));
        assert_eq!(h.store.selection().territories, vec![left(), right()]);

        let ctrl_left = PointerInput::at(50.0, 50.0).with_modifiers(Modifiers::CTRL);
        h.send(InputEvent::PointerDown(ctrl_left));
        assert!(!h.tool.is_active());
        // Dragging after a deselect-click moves nothing.
        let commands = h.send(InputEvent::PointerMove(
            PointerInput::at(90.0, 50.0).with_modifiers(Modifiers::CTRL),
        ));
        assert!(commands.is_empty());
        assert_eq!(h.store.selection().territories, vec![right()]);
    }

    #[test]
    fn sub_threshold_drag_is_a_click() {
        let mut h = Harness::new();
        h.send(InputEvent::PointerDown(PointerInput::at(50.0, 50.0)));
        h.send(InputEvent::PointerMove(PointerInput::at(52.0, 51.0)));
        assert_eq!(h.tool.move_preview(), None);
        let commands = h.send(InputEvent::PointerUp(PointerInput::at(52.0, 51.0)));
        assert!(commands.is_empty());
        assert_eq!(h.store.territories()[0].center, Point::new(50.0, 50.0));
        assert_eq!(h.store.selection().territories, vec![left()]);
    }

    #[test]
    fn dragging_selected_moves_whole_selection() {
        let mut h = Harness::new();
        h.send(InputEvent::PointerDown(PointerInput::at(50.0, 50.0)));
        h.send(InputEvent::PointerUp(PointerInput::at(50.0, 50.0)));
        let ctrl = PointerInput::at(250.0, 50.0).with_modifiers(Modifiers::CTRL);
        h.send(InputEvent::PointerDown(ctrl));
        h.send(InputEvent::PointerUp(ctrl));

        // Plain press on an already-selected member keeps both selected.
        h.send(InputEvent::PointerDown(PointerInput::at(50.0, 50.0)));
        h.send(InputEvent::PointerMove(PointerInput::at(60.0, 70.0)));
        assert_eq!(
            h.tool.move_preview().map(|m| m.delta),
            Some(Point::new(10.0, 20.0))
        );
        // Nothing moves until release.
        assert_eq!(h.store.territories()[0].center, Point::new(50.0, 50.0));
        h.send(InputEvent::PointerUp(PointerInput::at(60.0, 70.0)));
        assert_eq!(h.store.territories()[0].center, Point::new(60.0, 70.0));
        assert_eq!(h.store.territories()[1].center, Point::new(260.0, 70.0));
    }

    #[test]
    fn alt_release_duplicates_at_offset() {
        let mut h = Harness::new();
        let alt = |x, y| PointerInput::at(x, y).with_modifiers(Modifiers::ALT);
        h.send(InputEvent::PointerDown(alt(50.0, 50.0)));
        h.send(InputEvent::PointerMove(alt(50.0, 170.0)));
        assert!(h.tool.move_preview().is_some_and(|m| m.duplicate));
        let commands = h.send(InputEvent::PointerUp(alt(50.0, 170.0)));
        assert_eq!(
            commands,
            vec![StoreCommand::DuplicateTerritories {
                ids: vec![left()],
                offset: Some(Point::new(0.0, 120.0)),
            }]
        );
        assert_eq!(h.store.territories().len(), 3);
        assert_eq!(h.store.territories()[0].center, Point::new(50.0, 50.0));
        assert_eq!(h.store.territories()[2].center, Point::new(50.0, 170.0));
    }

    #[test]
    fn releasing_alt_before_pointer_up_moves() {
        let mut h = Harness::new();
        h.send(InputEvent::PointerDown(
            PointerInput::at(50.0, 50.0).with_modifiers(Modifiers::ALT),
        ));
        h.send(InputEvent::PointerMove(
            PointerInput::at(50.0, 80.0).with_modifiers(Modifiers::ALT),
        ));
        h.send(InputEvent::PointerUp(PointerInput::at(50.0, 80.0)));
        assert_eq!(h.store.territories().len(), 2);
        assert_eq!(h.store.territories()[0].center, Point::new(50.0, 80.0));
    }

    #[test]
    fn area_select_picks_centers_inside_reversed_rectangle() {
        let mut h = Harness::new();
        h.send(InputEvent::PointerDown(PointerInput::at(320.0, 120.0)));
        h.send(InputEvent::PointerMove(PointerInput::at(150.0, 10.0)));
        assert_eq!(
            h.tool.area_rect(),
            Some(Bounds::from_corners(
                Point::new(150.0, 10.0),
                Point::new(320.0, 120.0)
            ))
        );
        h.send(InputEvent::PointerUp(PointerInput::at(150.0, 10.0)));
        assert_eq!(h.store.selection().territories, vec![right()]);
    }

    #[test]
    fn area_rect_is_clamped_to_viewport() {
        let mut h = Harness::new();
        h.send(InputEvent::PointerDown(PointerInput::at(700.0, 500.0)));
        h.send(InputEvent::PointerMove(PointerInput::at(900.0, -40.0)));
        let rect = h.tool.area_rect().unwrap();
        assert_eq!(rect.max_x, 800.0);
        assert_eq!(rect.min_y, 0.0);
    }

    #[test]
    fn view_drag_pans_one_to_one() {
        let mut h = Harness::new();
        h.tool.begin_view_drag(Point::new(10.0, 10.0));
        let commands = h.send(InputEvent::PointerMove(PointerInput::at(25.0, 5.0)));
        assert_eq!(commands, vec![StoreCommand::SetPan(Point::new(15.0, -5.0))]);
        h.send(InputEvent::PointerUp(PointerInput::at(25.0, 5.0)));
        assert!(!h.tool.is_active());
    }
}
