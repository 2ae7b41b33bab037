//! Canvas engine: the single entry point for raw input.
//!
//! Every event goes through `CanvasEngine::handle`, which reads the current
//! tool and store state, routes the event to one controller and applies the
//! resulting commands to the store. At most one pointer interaction runs at a
//! time; it owns the pointer that started it until release or capture loss.

use crate::config::EngineConfig;
use crate::gesture::{GestureClassifier, GestureKind};
use crate::input::{InputEvent, KeyInput, Modifiers, PointerButton, PointerInput, WheelInput};
use crate::linker::{LinkPreview, RelationshipLine, RelationshipLinker, relationship_at, relationship_lines};
use crate::pen::BezierPathAuthor;
use crate::select::{MoveGesture, SelectionController};
use crate::shortcuts::{ShortcutAction, ShortcutMap};
use crate::snapping::SnappingEngine;
use crate::tools::{Tool, ToolContext, ToolKind};
use crate::vertex::VertexEditor;
use crate::viewport::{ContainerSize, ViewportController, screen_to_content};
use dc_core::geometry::cell_at;
use dc_core::hit::hit_test;
use dc_core::id::TerritoryId;
use dc_core::model::{Bounds, InlineEditTarget, Point, RelationshipType, SnapIndicator};
use dc_core::store::{CanvasStore, StoreCommand};

/// Which controller owns the captured pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interaction {
    Select,
    Pen,
    Vertex,
    Link,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Capture {
    pointer_id: u32,
    interaction: Interaction,
}

/// Last primary press, for double-click detection.
#[derive(Debug, Clone, Copy, PartialEq)]
struct ClickRecord {
    timestamp: f64,
    target: Option<TerritoryId>,
    position: Point,
}

/// Transient state the host renders on top of the stored diagram.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Feedback {
    pub indicators: Vec<SnapIndicator>,
    pub move_preview: Option<MoveGesture>,
    pub area_rect: Option<Bounds>,
    pub link_preview: Option<LinkPreview>,
    /// Pen rubber-band endpoint.
    pub pen_cursor: Option<Point>,
    /// Current zoom while the zoom indicator is visible.
    pub zoom_indicator: Option<f64>,
}

/// Services shared by every controller.
struct Services {
    config: EngineConfig,
    snapping: SnappingEngine,
    viewport: ViewportController,
    container: ContainerSize,
}

impl Services {
    fn context<'a>(&'a self, store: &'a dyn CanvasStore) -> ToolContext<'a> {
        ToolContext {
            store,
            config: &self.config,
            snapping: &self.snapping,
            viewport: &self.viewport,
            container: self.container,
        }
    }
}

pub struct CanvasEngine {
    services: Services,
    tool: ToolKind,
    classifier: GestureClassifier,
    select: SelectionController,
    pen: BezierPathAuthor,
    vertex: VertexEditor,
    linker: RelationshipLinker,
    capture: Option<Capture>,
    last_click: Option<ClickRecord>,
    last_cursor: Point,
    last_modifiers: Modifiers,
    pinch_anchor: Point,
}

impl CanvasEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            classifier: GestureClassifier::new(&config),
            services: Services {
                snapping: SnappingEngine::new(&config),
                viewport: ViewportController::new(&config),
                container: ContainerSize::default(),
                config,
            },
            tool: ToolKind::Select,
            select: SelectionController::new(),
            pen: BezierPathAuthor::new(),
            vertex: VertexEditor::new(),
            linker: RelationshipLinker::new(),
            capture: None,
            last_click: None,
            last_cursor: Point::ZERO,
            last_modifiers: Modifiers::NONE,
            pinch_anchor: Point::ZERO,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.services.config
    }

    pub fn tool(&self) -> ToolKind {
        self.tool
    }

    pub fn set_container_size(&mut self, container: ContainerSize) {
        self.services.container = ContainerSize::new(container.width, container.height);
    }

    pub fn connection_type(&self) -> RelationshipType {
        self.linker.connection_type()
    }

    pub fn set_connection_type(&mut self, relationship_type: RelationshipType) {
        self.linker.set_connection_type(relationship_type);
    }

    /// Controller currently holding the pointer.
    pub fn active_interaction(&self) -> Option<Interaction> {
        self.capture.map(|c| c.interaction)
    }

    /// Switch tools. Cancels the in-flight gesture and clears the selection.
    pub fn set_tool(&mut self, tool: ToolKind, store: &mut dyn CanvasStore) -> Vec<StoreCommand> {
        if tool == self.tool {
            return vec![];
        }
        log::debug!("tool {:?} -> {tool:?}", self.tool);
        self.cancel_interaction();
        self.tool = tool;
        apply(store, vec![StoreCommand::ClearSelection])
    }

    /// Route one input event and apply the resulting commands. Returns the
    /// commands that were applied.
    pub fn handle(&mut self, event: &InputEvent, store: &mut dyn CanvasStore) -> Vec<StoreCommand> {
        let commands = match event {
            InputEvent::PointerDown(input) => self.pointer_down(input, store),
            InputEvent::PointerMove(input) => self.pointer_move(input, store),
            InputEvent::PointerUp(input) => self.pointer_up(input, store),
            InputEvent::LostPointerCapture { pointer_id, .. } => {
                self.lost_capture(*pointer_id, store)
            }
            InputEvent::Wheel(wheel) => self.wheel(wheel, store),
            InputEvent::GestureStart {
                scale, position, ..
            } => {
                self.services.viewport.cancel();
                self.classifier.begin_pinch(*scale, store.view().zoom);
                self.pinch_anchor = *position;
                vec![]
            }
            InputEvent::GestureChange {
                scale,
                position,
                timestamp,
            } => match self.classifier.pinch_target(*scale) {
                Some(target) => {
                    self.pinch_anchor = *position;
                    self.services.viewport.set_zoom_level(
                        store.view(),
                        target,
                        *position,
                        self.services.container,
                        *timestamp,
                    )
                }
                None => vec![],
            },
            InputEvent::GestureEnd { timestamp } => {
                if self.classifier.end_pinch() {
                    self.services.viewport.end_gesture(self.pinch_anchor, *timestamp);
                }
                vec![]
            }
            InputEvent::KeyDown(key) => self.key_down(key, store),
            InputEvent::KeyUp(key) => self.key_up(key),
        };
        apply(store, commands)
    }

    // ─── Pointer ─────────────────────────────────────────────────────────

    fn pointer_down(&mut self, input: &PointerInput, store: &dyn CanvasStore) -> Vec<StoreCommand> {
        if let Some(capture) = self.capture {
            log::trace!(
                "pointer {} ignored: {:?} holds pointer {}",
                input.pointer_id,
                capture.interaction,
                capture.pointer_id
            );
            return vec![];
        }
        self.services.viewport.cancel();
        self.last_cursor = input.position;
        self.last_modifiers = input.modifiers;
        let event = InputEvent::PointerDown(*input);
        let p = screen_to_content(input.position, store.view());

        if input.button == PointerButton::Middle
            || (input.button == PointerButton::Primary && self.tool == ToolKind::Pan)
        {
            self.select.begin_view_drag(input.position);
            self.capture(input, Interaction::Select);
            return vec![];
        }
        if input.button != PointerButton::Primary {
            return vec![];
        }

        if store.is_placing_shape() {
            let snap = self.services.snapping.snap_point(p, &[], false, store);
            return vec![StoreCommand::PlaceShape(snap.point)];
        }

        if store.editing().is_editing {
            let ctx = self.services.context(store);
            let commands = self.vertex.handle(&event, &ctx);
            if self.vertex.is_active() {
                self.capture(input, Interaction::Vertex);
            }
            return commands;
        }

        match self.tool {
            ToolKind::Pen => {
                let ctx = self.services.context(store);
                let commands = self.pen.handle(&event, &ctx);
                if self.pen.is_active() {
                    self.capture(input, Interaction::Pen);
                }
                commands
            }
            ToolKind::Select => self.select_press(input, p, store),
            ToolKind::Pan => vec![],
        }
    }

    fn select_press(
        &mut self,
        input: &PointerInput,
        p: Point,
        store: &dyn CanvasStore,
    ) -> Vec<StoreCommand> {
        let event = InputEvent::PointerDown(*input);
        {
            let ctx = self.services.context(store);
            if self.linker.anchor_under(input.position, &ctx).is_some() {
                self.linker.handle(&event, &ctx);
                self.capture(input, Interaction::Link);
                return vec![];
            }
        }

        let target = hit_test(store.territories(), p);
        if let Some(commands) = self.double_click(input, target, p, store) {
            return commands;
        }

        let ctx = self.services.context(store);
        let config = &self.services.config;
        if target.is_none()
            && let Some(id) = relationship_at(
                store,
                p,
                config.anchor_offset,
                ctx.screen_radius(config.relationship_hit_tolerance),
            )
        {
            return vec![StoreCommand::SelectRelationship(Some(id))];
        }

        let commands = self.select.handle(&event, &ctx);
        if self.select.is_active() {
            self.capture(input, Interaction::Select);
        }
        commands
    }

    /// Second press on the same target within the double-click window.
    /// Paths enter vertex editing; tables open an inline editor on the cell.
    fn double_click(
        &mut self,
        input: &PointerInput,
        target: Option<TerritoryId>,
        p: Point,
        store: &dyn CanvasStore,
    ) -> Option<Vec<StoreCommand>> {
        let config = &self.services.config;
        let record = ClickRecord {
            timestamp: input.timestamp,
            target,
            position: input.position,
        };
        let previous = self.last_click.replace(record);
        let is_double = previous.is_some_and(|prev| {
            prev.target.is_some()
                && prev.target == target
                && input.timestamp >= prev.timestamp
                && input.timestamp - prev.timestamp <= config.double_click_ms
                && prev.position.distance(input.position) <= config.double_click_distance
        });
        if !is_double {
            return None;
        }
        self.last_click = None;

        let territory = store.territory(target?)?;
        if territory.is_table() {
            let cell = cell_at(territory, p)?;
            log::debug!("double-click: inline edit {} {cell:?}", territory.id);
            Some(vec![StoreCommand::StartInlineEdit(InlineEditTarget {
                table: territory.id,
                cell,
            })])
        } else {
            log::debug!("double-click: edit vertices of {}", territory.id);
            Some(vec![StoreCommand::StartEditingTerritory(territory.id)])
        }
    }

    fn pointer_move(&mut self, input: &PointerInput, store: &dyn CanvasStore) -> Vec<StoreCommand> {
        let event = InputEvent::PointerMove(*input);
        match self.capture {
            Some(capture) if capture.pointer_id != input.pointer_id => vec![],
            Some(capture) => {
                self.last_cursor = input.position;
                self.last_modifiers = input.modifiers;
                self.route(capture.interaction, &event, store)
            }
            None => {
                self.last_cursor = input.position;
                self.last_modifiers = input.modifiers;
                // Hover: only the pen tracks the cursor for its preview.
                if self.tool == ToolKind::Pen && store.drawing().is_drawing {
                    let ctx = self.services.context(store);
                    self.pen.handle(&event, &ctx)
                } else {
                    vec![]
                }
            }
        }
    }

    fn pointer_up(&mut self, input: &PointerInput, store: &dyn CanvasStore) -> Vec<StoreCommand> {
        match self.capture {
            Some(capture) if capture.pointer_id == input.pointer_id => {
                self.capture = None;
                self.last_cursor = input.position;
                self.route(capture.interaction, &InputEvent::PointerUp(*input), store)
            }
            _ => vec![],
        }
    }

    /// Capture loss ends the gesture as a release at the last known position.
    fn lost_capture(&mut self, pointer_id: u32, store: &dyn CanvasStore) -> Vec<StoreCommand> {
        if self.capture.is_none_or(|c| c.pointer_id != pointer_id) {
            return vec![];
        }
        log::debug!("pointer {pointer_id} lost capture");
        let release = PointerInput {
            pointer_id,
            position: self.last_cursor,
            button: PointerButton::Primary,
            modifiers: self.last_modifiers,
            timestamp: 0.0,
            over_anchor: None,
        };
        self.pointer_up(&release, store)
    }

    fn route(
        &mut self,
        interaction: Interaction,
        event: &InputEvent,
        store: &dyn CanvasStore,
    ) -> Vec<StoreCommand> {
        let ctx = self.services.context(store);
        match interaction {
            Interaction::Select => self.select.handle(event, &ctx),
            Interaction::Pen => self.pen.handle(event, &ctx),
            Interaction::Vertex => self.vertex.handle(event, &ctx),
            Interaction::Link => self.linker.handle(event, &ctx),
        }
    }

    fn capture(&mut self, input: &PointerInput, interaction: Interaction) {
        log::trace!("pointer {} captured by {interaction:?}", input.pointer_id);
        self.capture = Some(Capture {
            pointer_id: input.pointer_id,
            interaction,
        });
    }

    fn cancel_interaction(&mut self) {
        self.capture = None;
        self.select.cancel();
        self.pen.cancel();
        self.vertex.cancel();
        self.linker.cancel();
    }

    // ─── Wheel ───────────────────────────────────────────────────────────

    fn wheel(&mut self, wheel: &WheelInput, store: &dyn CanvasStore) -> Vec<StoreCommand> {
        self.last_cursor = wheel.position;
        let viewport = &mut self.services.viewport;
        match self.classifier.classify(wheel) {
            GestureKind::Zoom => viewport.wheel_zoom(
                store.view(),
                wheel.delta_y,
                wheel.position,
                self.services.container,
                wheel.timestamp,
            ),
            GestureKind::Pan => {
                viewport.cancel();
                vec![viewport.scroll_pan(
                    store.view(),
                    Point::new(wheel.delta_x, wheel.delta_y),
                )]
            }
        }
    }

    // ─── Keyboard ────────────────────────────────────────────────────────

    fn key_down(&mut self, key: &KeyInput, store: &dyn CanvasStore) -> Vec<StoreCommand> {
        if key.in_text_field {
            return vec![];
        }
        if key.key == "Alt" {
            return vec![StoreCommand::SetTemporarySnapDisabled(true)];
        }
        let m = key.modifiers;
        let Some(action) = ShortcutMap::resolve(&key.key, m.ctrl, m.shift, m.alt, m.meta) else {
            return vec![];
        };
        log::debug!("shortcut {action:?}");
        self.shortcut(action, store, key.timestamp)
    }

    fn key_up(&mut self, key: &KeyInput) -> Vec<StoreCommand> {
        // Always honored so a release inside a text field can't leave
        // snapping suspended.
        if key.key == "Alt" {
            vec![StoreCommand::SetTemporarySnapDisabled(false)]
        } else {
            vec![]
        }
    }

    fn is_mid_edit(&self, store: &dyn CanvasStore) -> bool {
        self.capture.is_some() || store.editing().is_editing || store.drawing().is_drawing
    }

    fn shortcut(
        &mut self,
        action: ShortcutAction,
        store: &dyn CanvasStore,
        now: f64,
    ) -> Vec<StoreCommand> {
        let selection = store.selection();
        let container = self.services.container;
        match action {
            ShortcutAction::ToolSelect | ShortcutAction::ToolPen | ShortcutAction::ToolPan => {
                let tool = match action {
                    ShortcutAction::ToolPen => ToolKind::Pen,
                    ShortcutAction::ToolPan => ToolKind::Pan,
                    _ => ToolKind::Select,
                };
                if self.is_mid_edit(store) || tool == self.tool {
                    return vec![];
                }
                log::debug!("tool {:?} -> {tool:?}", self.tool);
                self.cancel_interaction();
                self.tool = tool;
                vec![StoreCommand::ClearSelection]
            }
            ShortcutAction::SelectAll => vec![StoreCommand::SelectAll],
            ShortcutAction::Copy if !selection.territories.is_empty() => {
                vec![StoreCommand::CopyTerritories(selection.territories.clone())]
            }
            ShortcutAction::Paste => {
                let at = screen_to_content(self.last_cursor, store.view());
                vec![StoreCommand::PasteTerritories(at)]
            }
            ShortcutAction::Duplicate if !selection.territories.is_empty() => {
                vec![StoreCommand::DuplicateTerritories {
                    ids: selection.territories.clone(),
                    offset: None,
                }]
            }
            ShortcutAction::Copy | ShortcutAction::Duplicate => vec![],
            ShortcutAction::Delete => {
                // While editing, Delete only ever touches vertices; the
                // edited territory itself stays selected underneath.
                if store.editing().is_editing {
                    VertexEditor::delete_selected(selection)
                } else if !selection.territories.is_empty() {
                    selection
                        .territories
                        .iter()
                        .map(|&id| StoreCommand::DeleteTerritory(id))
                        .collect()
                } else if let Some(id) = store.selected_relationship() {
                    vec![StoreCommand::RemoveRelationship(id)]
                } else {
                    vec![]
                }
            }
            ShortcutAction::Cancel => self.cancel(store),
            ShortcutAction::Commit => {
                if store.editing().is_editing {
                    self.vertex.cancel();
                    vec![StoreCommand::StopEditingTerritory { commit: true }]
                } else {
                    self.pen.finish(store)
                }
            }
            ShortcutAction::ToggleBezier if store.editing().is_editing => {
                VertexEditor::toggle_bezier(selection)
            }
            ShortcutAction::ToggleBezier => vec![],
            ShortcutAction::ToggleGrid => vec![StoreCommand::ToggleGrid],
            ShortcutAction::ToggleGridType => vec![StoreCommand::ToggleGridType],
            ShortcutAction::ToggleSnapping => vec![StoreCommand::ToggleSnapping],
            ShortcutAction::ZoomIn => self.services.viewport.zoom_in(store.view(), container, now),
            ShortcutAction::ZoomOut => self.services.viewport.zoom_out(store.view(), container, now),
            ShortcutAction::ZoomReset => {
                self.services.viewport.reset_zoom(store.view(), container, now)
            }
        }
    }

    /// Escape: abandon the in-flight gesture, then leave the innermost mode.
    fn cancel(&mut self, store: &dyn CanvasStore) -> Vec<StoreCommand> {
        self.capture = None;
        self.select.cancel();
        self.vertex.cancel();
        self.linker.cancel();
        if store.is_placing_shape() {
            self.pen.cancel();
            vec![StoreCommand::CancelShapePlacement]
        } else if store.editing().is_editing {
            self.pen.cancel();
            vec![StoreCommand::StopEditingTerritory { commit: false }]
        } else if store.drawing().is_drawing {
            self.pen.abort(store)
        } else if store.selected_relationship().is_some() {
            self.pen.cancel();
            vec![StoreCommand::SelectRelationship(None)]
        } else {
            self.pen.cancel();
            vec![StoreCommand::ClearSelection]
        }
    }

    // ─── Frame loop & feedback ───────────────────────────────────────────

    /// Advance animations and timers.
    pub fn tick(&mut self, now: f64, store: &mut dyn CanvasStore) -> Vec<StoreCommand> {
        let commands = self.services.viewport.tick(store.view(), now);
        apply(store, commands)
    }

    pub fn is_animating(&self) -> bool {
        self.services.viewport.is_settling()
    }

    /// Drop every timer and transient gesture. Call when the canvas unmounts.
    pub fn teardown(&mut self) {
        log::debug!("engine teardown");
        self.cancel_interaction();
        self.services.viewport.teardown();
        self.classifier.reset();
        self.last_click = None;
    }

    pub fn feedback(&self, store: &dyn CanvasStore, now: f64) -> Feedback {
        let mut indicators = Vec::new();
        indicators.extend_from_slice(self.select.indicators());
        indicators.extend_from_slice(self.pen.indicators());
        indicators.extend_from_slice(self.vertex.indicators());
        indicators.extend(self.linker.indicators());
        Feedback {
            indicators,
            move_preview: self.select.move_preview().cloned(),
            area_rect: self.select.area_rect(),
            link_preview: self.linker.preview(),
            pen_cursor: self.pen.cursor().filter(|_| store.drawing().is_drawing),
            zoom_indicator: self
                .services
                .viewport
                .zoom_indicator_visible(now)
                .then_some(store.view().zoom),
        }
    }

    /// Relationship endpoints, following any in-flight move of their tables.
    /// An Alt-duplicate preview leaves the originals (and their lines) put.
    pub fn relationship_lines(&self, store: &dyn CanvasStore) -> Vec<RelationshipLine> {
        let moving = self
            .select
            .move_preview()
            .filter(|m| !m.duplicate)
            .map(|m| (m.ids.as_slice(), m.delta));
        relationship_lines(store, self.services.config.anchor_offset, moving)
    }
}

impl Default for CanvasEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

fn apply(store: &mut dyn CanvasStore, commands: Vec<StoreCommand>) -> Vec<StoreCommand> {
    for cmd in &commands {
        store.apply(cmd.clone());
    }
    commands
}
