//! Store contract: the command/query interface the editor drives, plus an
//! in-memory `DiagramStore` that holds the authoritative diagram state.
//!
//! The editor never mutates diagram state directly. It reads snapshots
//! through `CanvasStore` queries and issues `StoreCommand`s; the store is the
//! single writer. Hosts with their own state container implement the trait.

use crate::hit::territories_in_area;
use crate::id::{RelationshipId, TerritoryId};
use crate::model::*;
use crate::path::{path_to_vertices, translate_path, vertices_to_path};
use std::collections::HashMap;

/// Partial territory update. `None` fields are left untouched.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TerritoryPatch {
    pub name: Option<String>,
    pub center: Option<Point>,
    pub shape: Option<TerritoryShape>,
    pub z_index: Option<i32>,
}

/// A mutation request issued by the editor.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreCommand {
    // ── View ──
    SetPan(Point),
    SetZoom(f64),
    ToggleGrid,
    ToggleGridType,
    ToggleSnapping,
    SetTemporarySnapDisabled(bool),

    // ── Selection ──
    SelectTerritory { id: TerritoryId, additive: bool },
    DeselectTerritory(TerritoryId),
    SelectTerritoriesInArea { area: Bounds, additive: bool },
    SelectAll,
    ClearSelection,

    // ── Territories ──
    MoveTerritories { ids: Vec<TerritoryId>, delta: Point },
    DuplicateTerritories { ids: Vec<TerritoryId>, offset: Option<Point> },
    DeleteTerritory(TerritoryId),
    UpdateTerritory { id: TerritoryId, patch: TerritoryPatch },
    CopyTerritories(Vec<TerritoryId>),
    PasteTerritories(Point),
    PlaceShape(Point),
    CancelShapePlacement,

    // ── Pen drawing ──
    StartDrawing(Point),
    AddBezierPoint(Point),
    /// Set the `out` handle of a path point; `in` mirrors it.
    SetBezierHandle { index: usize, handle_out: Point },
    SetDraggingHandle(bool),
    FinishDrawing,
    CancelDrawing,

    // ── Vertex editing ──
    StartEditingTerritory(TerritoryId),
    StopEditingTerritory { commit: bool },
    SelectVertex { index: usize, additive: bool },
    StartDraggingVertex(usize),
    StartDraggingHandle { index: usize, handle: HandleKind },
    StopDraggingVertex,
    UpdateVertexPosition { index: usize, point: Point },
    UpdateControlHandle { index: usize, handle: HandleKind, point: Point },
    AddVertexOnEdge { edge_index: usize, point: Point },
    DeleteVertex(usize),
    ToggleVertexBezier(usize),

    // ── Relationships ──
    AddRelationship(Relationship),
    RemoveRelationship(RelationshipId),
    SelectRelationship(Option<RelationshipId>),

    // ── Inline editing ──
    StartInlineEdit(InlineEditTarget),
}

/// Snapshot queries plus the single mutation entry point.
pub trait CanvasStore {
    fn territories(&self) -> &[Territory];

    fn territory(&self, id: TerritoryId) -> Option<&Territory> {
        self.territories().iter().find(|t| t.id == id)
    }

    fn view(&self) -> &ViewState;
    fn selection(&self) -> &SelectionState;
    fn drawing(&self) -> &DrawingState;
    fn editing(&self) -> &EditingState;
    fn snap_settings(&self) -> &SnapSettings;
    fn is_placing_shape(&self) -> bool;
    fn relationships(&self) -> &[Relationship];
    fn selected_relationship(&self) -> Option<RelationshipId>;

    fn apply(&mut self, command: StoreCommand);
}

/// Shape waiting to be dropped onto the canvas. Path data is authored
/// around the origin and translated to the drop point.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacementTemplate {
    pub name: String,
    pub shape: TerritoryShape,
}

/// In-memory authoritative store.
#[derive(Debug, Clone, Default)]
pub struct DiagramStore {
    territories: Vec<Territory>,
    /// Index from id → position in `territories`.
    id_index: HashMap<TerritoryId, usize>,
    relationships: Vec<Relationship>,
    selected_relationship: Option<RelationshipId>,
    view: ViewState,
    selection: SelectionState,
    drawing: DrawingState,
    editing: EditingState,
    snap: SnapSettings,
    placement: Option<PlacementTemplate>,
    clipboard: Vec<Territory>,
    inline_edit: Option<InlineEditTarget>,
}

impl DiagramStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_diagram(diagram: Diagram) -> Self {
        let mut store = Self {
            territories: diagram.territories,
            relationships: diagram.relationships,
            view: diagram.view,
            ..Self::default()
        };
        store.rebuild_index();
        store
    }

    /// Load a diagram document.
    ///
    /// # Errors
    /// Returns the JSON error message if the document doesn't match the
    /// `Diagram` shape.
    pub fn from_json(json: &str) -> Result<Self, String> {
        let diagram: Diagram =
            serde_json::from_str(json).map_err(|e| format!("Diagram parse error: {e}"))?;
        Ok(Self::from_diagram(diagram))
    }

    pub fn to_diagram(&self) -> Diagram {
        Diagram {
            territories: self.territories.clone(),
            relationships: self.relationships.clone(),
            view: self.view,
        }
    }

    pub fn add_territory(&mut self, territory: Territory) {
        self.id_index.insert(territory.id, self.territories.len());
        self.territories.push(territory);
    }

    /// Enter shape-placement mode; the next `PlaceShape` drops `template`.
    pub fn begin_placement(&mut self, template: PlacementTemplate) {
        self.placement = Some(template);
    }

    pub fn placement(&self) -> Option<&PlacementTemplate> {
        self.placement.as_ref()
    }

    pub fn clipboard(&self) -> &[Territory] {
        &self.clipboard
    }

    pub fn inline_edit(&self) -> Option<InlineEditTarget> {
        self.inline_edit
    }

    fn rebuild_index(&mut self) {
        self.id_index = self
            .territories
            .iter()
            .enumerate()
            .map(|(i, t)| (t.id, i))
            .collect();
    }

    fn territory_mut(&mut self, id: TerritoryId) -> Option<&mut Territory> {
        let idx = *self.id_index.get(&id)?;
        self.territories.get_mut(idx)
    }

    fn next_z_index(&self) -> i32 {
        self.territories
            .iter()
            .map(|t| t.z_index)
            .max()
            .map_or(0, |z| z + 1)
    }

    /// Insert translated copies of `sources` with fresh ids and select them.
    fn insert_copies(&mut self, sources: Vec<Territory>, offset: Point) {
        let mut z = self.next_z_index();
        let mut new_ids = Vec::with_capacity(sources.len());
        for mut copy in sources {
            copy.id = TerritoryId::with_prefix("territory");
            translate_territory(&mut copy, offset);
            copy.z_index = z;
            z += 1;
            new_ids.push(copy.id);
            self.add_territory(copy);
        }
        self.selection.clear();
        self.selection.territories = new_ids;
        self.selected_relationship = None;
    }

    fn finish_drawing(&mut self) {
        let drawing = std::mem::take(&mut self.drawing);
        if drawing.bezier_path.len() < 3 {
            log::debug!(
                "finish_drawing: discarding path with {} points",
                drawing.bezier_path.len()
            );
            return;
        }
        let points: Vec<Point> = drawing.bezier_path.iter().map(Vertex::point).collect();
        let center = Bounds::enclosing(&points).map_or(Point::ZERO, |b| b.center());
        let territory = Territory::path(
            TerritoryId::with_prefix("territory"),
            center,
            vertices_to_path(&drawing.bezier_path),
        )
        .with_z_index(self.next_z_index());
        self.selection.clear();
        self.selection.territories.push(territory.id);
        self.add_territory(territory);
    }

    fn stop_editing(&mut self, commit: bool) {
        let editing = std::mem::take(&mut self.editing);
        self.selection.vertices.clear();
        let Some(id) = editing.territory else {
            return;
        };
        if commit && editing.vertices.len() >= 3 {
            let points: Vec<Point> = editing.vertices.iter().map(Vertex::point).collect();
            let path = vertices_to_path(&editing.vertices);
            if let Some(t) = self.territory_mut(id) {
                if let Some(b) = Bounds::enclosing(&points) {
                    t.center = b.center();
                }
                t.shape = TerritoryShape::Path { fill_path: path };
            }
        }
    }

    fn delete_territory(&mut self, id: TerritoryId) {
        let Some(&idx) = self.id_index.get(&id) else {
            return;
        };
        self.territories.remove(idx);
        self.rebuild_index();
        self.selection.remove(id);
        self.relationships.retain(|r| !r.touches(id));
        if self
            .selected_relationship
            .is_some_and(|sel| !self.relationships.iter().any(|r| r.id == sel))
        {
            self.selected_relationship = None;
        }
        if self.editing.territory == Some(id) {
            self.stop_editing(false);
        }
    }

    fn delete_vertex(&mut self, index: usize) {
        // A territory needs at least a triangle.
        if index >= self.editing.vertices.len() || self.editing.vertices.len() <= 3 {
            return;
        }
        self.editing.vertices.remove(index);
        self.selection.vertices = self
            .selection
            .vertices
            .iter()
            .filter(|&&v| v != index)
            .map(|&v| if v > index { v - 1 } else { v })
            .collect();
    }

    fn toggle_vertex_bezier(&mut self, index: usize) {
        let n = self.editing.vertices.len();
        if index >= n {
            return;
        }
        let prev = self.editing.vertices[(index + n - 1) % n].point();
        let next = self.editing.vertices[(index + 1) % n].point();
        let v = &mut self.editing.vertices[index];
        if v.is_bezier() {
            v.control_points = None;
        } else {
            let tangent = (next - prev) / 4.0;
            v.control_points = Some(ControlPoints {
                handle_in: Some(v.point() - tangent),
                handle_out: Some(v.point() + tangent),
            });
        }
    }
}

/// Move a territory and every coordinate of its geometry.
fn translate_territory(t: &mut Territory, delta: Point) {
    t.center = t.center + delta;
    if let TerritoryShape::Path { fill_path } = &mut t.shape {
        *fill_path = translate_path(fill_path, delta);
    }
}

impl CanvasStore for DiagramStore {
    fn territories(&self) -> &[Territory] {
        &self.territories
    }

    fn territory(&self, id: TerritoryId) -> Option<&Territory> {
        self.id_index.get(&id).and_then(|&i| self.territories.get(i))
    }

    fn view(&self) -> &ViewState {
        &self.view
    }

    fn selection(&self) -> &SelectionState {
        &self.selection
    }

    fn drawing(&self) -> &DrawingState {
        &self.drawing
    }

    fn editing(&self) -> &EditingState {
        &self.editing
    }

    fn snap_settings(&self) -> &SnapSettings {
        &self.snap
    }

    fn is_placing_shape(&self) -> bool {
        self.placement.is_some()
    }

    fn relationships(&self) -> &[Relationship] {
        &self.relationships
    }

    fn selected_relationship(&self) -> Option<RelationshipId> {
        self.selected_relationship
    }

    fn apply(&mut self, command: StoreCommand) {
        log::trace!("store apply {command:?}");
        match command {
            StoreCommand::SetPan(pan) => self.view.pan = pan,
            StoreCommand::SetZoom(zoom) => self.view.zoom = zoom,
            StoreCommand::ToggleGrid => self.view.show_grid = !self.view.show_grid,
            StoreCommand::ToggleGridType => {
                self.view.grid_type = match self.view.grid_type {
                    GridType::Lines => GridType::Dots,
                    GridType::Dots => GridType::Lines,
                };
            }
            StoreCommand::ToggleSnapping => self.snap.enabled = !self.snap.enabled,
            StoreCommand::SetTemporarySnapDisabled(disabled) => {
                self.snap.temporarily_disabled = disabled;
            }

            StoreCommand::SelectTerritory { id, additive } => {
                if !additive {
                    self.selection.clear();
                }
                self.selection.insert(id);
                self.selected_relationship = None;
            }
            StoreCommand::DeselectTerritory(id) => self.selection.remove(id),
            StoreCommand::SelectTerritoriesInArea { area, additive } => {
                let hits = territories_in_area(&self.territories, &area);
                if !additive {
                    self.selection.clear();
                }
                for id in hits {
                    self.selection.insert(id);
                }
                self.selected_relationship = None;
            }
            StoreCommand::SelectAll => {
                self.selection.territories = self.territories.iter().map(|t| t.id).collect();
            }
            StoreCommand::ClearSelection => {
                self.selection.clear();
                self.selected_relationship = None;
            }

            StoreCommand::MoveTerritories { ids, delta } => {
                for id in ids {
                    if let Some(t) = self.territory_mut(id) {
                        translate_territory(t, delta);
                    }
                }
            }
            StoreCommand::DuplicateTerritories { ids, offset } => {
                let sources: Vec<Territory> = ids
                    .iter()
                    .filter_map(|id| CanvasStore::territory(self, *id).cloned())
                    .collect();
                self.insert_copies(sources, offset.unwrap_or(Point::ZERO));
            }
            StoreCommand::DeleteTerritory(id) => self.delete_territory(id),
            StoreCommand::UpdateTerritory { id, patch } => {
                if let Some(t) = self.territory_mut(id) {
                    if let Some(name) = patch.name {
                        t.name = name;
                    }
                    if let Some(center) = patch.center {
                        t.center = center;
                    }
                    if let Some(shape) = patch.shape {
                        t.shape = shape;
                    }
                    if let Some(z) = patch.z_index {
                        t.z_index = z;
                    }
                }
            }
            StoreCommand::CopyTerritories(ids) => {
                self.clipboard = ids
                    .iter()
                    .filter_map(|id| CanvasStore::territory(self, *id).cloned())
                    .collect();
            }
            StoreCommand::PasteTerritories(at) => {
                let centers: Vec<Point> = self.clipboard.iter().map(|t| t.center).collect();
                if let Some(b) = Bounds::enclosing(&centers) {
                    let sources = self.clipboard.clone();
                    self.insert_copies(sources, at - b.center());
                }
            }
            StoreCommand::PlaceShape(at) => {
                if let Some(template) = self.placement.take() {
                    let mut t = Territory {
                        id: TerritoryId::with_prefix("territory"),
                        name: template.name,
                        center: Point::ZERO,
                        shape: template.shape,
                        z_index: self.next_z_index(),
                    };
                    translate_territory(&mut t, at);
                    self.selection.clear();
                    self.selection.territories.push(t.id);
                    self.add_territory(t);
                }
            }
            StoreCommand::CancelShapePlacement => self.placement = None,

            StoreCommand::StartDrawing(p) => {
                self.drawing = DrawingState {
                    is_drawing: true,
                    bezier_path: vec![Vertex::corner(p)],
                    is_dragging_handle: false,
                    drag_start_point: Some(p),
                };
            }
            StoreCommand::AddBezierPoint(p) => {
                if self.drawing.is_drawing {
                    self.drawing.bezier_path.push(Vertex::corner(p));
                    self.drawing.drag_start_point = Some(p);
                }
            }
            StoreCommand::SetBezierHandle { index, handle_out } => {
                if let Some(v) = self.drawing.bezier_path.get_mut(index) {
                    let anchor = v.point();
                    v.control_points = Some(ControlPoints {
                        handle_in: Some(anchor * 2.0 - handle_out),
                        handle_out: Some(handle_out),
                    });
                }
            }
            StoreCommand::SetDraggingHandle(dragging) => {
                self.drawing.is_dragging_handle = dragging;
            }
            StoreCommand::FinishDrawing => self.finish_drawing(),
            StoreCommand::CancelDrawing => self.drawing = DrawingState::default(),

            StoreCommand::StartEditingTerritory(id) => {
                let vertices = CanvasStore::territory(self, id)
                    .and_then(Territory::fill_path)
                    .map(path_to_vertices);
                if let Some(vertices) = vertices {
                    self.editing = EditingState {
                        is_editing: true,
                        territory: Some(id),
                        vertices,
                        dragging: None,
                    };
                    self.selection.clear();
                    self.selection.territories.push(id);
                }
            }
            StoreCommand::StopEditingTerritory { commit } => self.stop_editing(commit),
            StoreCommand::SelectVertex { index, additive } => {
                if index >= self.editing.vertices.len() {
                    return;
                }
                if !additive {
                    self.selection.vertices = vec![index];
                } else if self.selection.vertices.contains(&index) {
                    self.selection.vertices.retain(|&v| v != index);
                } else {
                    self.selection.insert_vertex(index);
                }
            }
            StoreCommand::StartDraggingVertex(index) => {
                self.editing.dragging = Some(VertexDrag::Vertex(index));
            }
            StoreCommand::StartDraggingHandle { index, handle } => {
                self.editing.dragging = Some(VertexDrag::Handle(index, handle));
            }
            StoreCommand::StopDraggingVertex => self.editing.dragging = None,
            StoreCommand::UpdateVertexPosition { index, point } => {
                if let Some(v) = self.editing.vertices.get_mut(index) {
                    let delta = point - v.point();
                    v.translate(delta);
                }
            }
            StoreCommand::UpdateControlHandle {
                index,
                handle,
                point,
            } => {
                if let Some(v) = self.editing.vertices.get_mut(index) {
                    let cp = v.control_points.get_or_insert_with(ControlPoints::default);
                    match handle {
                        HandleKind::In => cp.handle_in = Some(point),
                        HandleKind::Out => cp.handle_out = Some(point),
                    }
                }
            }
            StoreCommand::AddVertexOnEdge { edge_index, point } => {
                // Edge i runs from vertex i to vertex i + 1 (wrapping).
                if edge_index < self.editing.vertices.len() {
                    let at = edge_index + 1;
                    self.editing.vertices.insert(at, Vertex::corner(point));
                    self.selection.vertices = vec![at];
                }
            }
            StoreCommand::DeleteVertex(index) => self.delete_vertex(index),
            StoreCommand::ToggleVertexBezier(index) => self.toggle_vertex_bezier(index),

            StoreCommand::AddRelationship(rel) => {
                if rel.is_self_loop() {
                    log::debug!("ignoring self-referential relationship {:?}", rel.id);
                    return;
                }
                self.relationships.push(rel);
            }
            StoreCommand::RemoveRelationship(id) => {
                self.relationships.retain(|r| r.id != id);
                if self.selected_relationship == Some(id) {
                    self.selected_relationship = None;
                }
            }
            StoreCommand::SelectRelationship(id) => {
                self.selected_relationship = id;
                if id.is_some() {
                    self.selection.territories.clear();
                }
            }

            StoreCommand::StartInlineEdit(target) => self.inline_edit = Some(target),
        }
    }
}
