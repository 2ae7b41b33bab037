//! Vertex editing of an existing path territory.
//!
//! Active while `store.editing().is_editing`. Press priority is handle, then
//! vertex, then edge: a bezier handle wins over the vertex it belongs to, and
//! a click on an edge only inserts when no vertex is close enough.

use crate::input::{InputEvent, PointerInput};
use crate::tools::{Tool, ToolContext};
use dc_core::geometry::closest_point_on_segment;
use dc_core::model::{EditingState, HandleKind, Point, SelectionState, SnapIndicator, VertexDrag};
use dc_core::store::StoreCommand;

#[derive(Debug, Clone, Copy, PartialEq)]
struct VertexDragState {
    target: VertexDrag,
    press: Point,
    has_moved: bool,
}

#[derive(Default)]
pub struct VertexEditor {
    drag: Option<VertexDragState>,
    indicators: Vec<SnapIndicator>,
}

/// What a press in vertex-edit mode landed on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VertexHit {
    Handle(usize, HandleKind),
    Vertex(usize),
    /// Closest point on edge `i` (from vertex `i` to `i + 1`).
    Edge(usize, Point),
}

/// Resolve a content-space press against the edited outline. Radii are in
/// content units.
pub fn vertex_hit(
    editing: &EditingState,
    p: Point,
    handle_radius: f64,
    vertex_radius: f64,
    edge_distance: f64,
) -> Option<VertexHit> {
    let vertices = &editing.vertices;

    for (i, v) in vertices.iter().enumerate() {
        for kind in [HandleKind::In, HandleKind::Out] {
            if v.handle(kind).is_some_and(|h| p.distance(h) <= handle_radius) {
                return Some(VertexHit::Handle(i, kind));
            }
        }
    }

    let nearest_vertex = vertices
        .iter()
        .enumerate()
        .map(|(i, v)| (i, p.distance(v.point())))
        .filter(|&(_, d)| d <= vertex_radius)
        .min_by(|a, b| a.1.total_cmp(&b.1));
    if let Some((i, _)) = nearest_vertex {
        return Some(VertexHit::Vertex(i));
    }

    let n = vertices.len();
    if n < 2 {
        return None;
    }
    (0..n)
        .map(|i| {
            let projection =
                closest_point_on_segment(p, vertices[i].point(), vertices[(i + 1) % n].point());
            (i, projection)
        })
        .filter(|(_, proj)| proj.distance < edge_distance)
        .min_by(|a, b| a.1.distance.total_cmp(&b.1.distance))
        .map(|(i, proj)| VertexHit::Edge(i, proj.point))
}

impl VertexEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn indicators(&self) -> &[SnapIndicator] {
        &self.indicators
    }

    /// Space: toggle bezier handles on every selected vertex.
    pub fn toggle_bezier(selection: &SelectionState) -> Vec<StoreCommand> {
        selection
            .vertices
            .iter()
            .map(|&i| StoreCommand::ToggleVertexBezier(i))
            .collect()
    }

    /// Delete: remove selected vertices, highest index first so earlier
    /// removals don't shift later ones.
    pub fn delete_selected(selection: &SelectionState) -> Vec<StoreCommand> {
        let mut indices = selection.vertices.clone();
        indices.sort_unstable_by(|a, b| b.cmp(a));
        indices.dedup();
        indices.into_iter().map(StoreCommand::DeleteVertex).collect()
    }

    fn pointer_down(&mut self, input: &PointerInput, ctx: &ToolContext) -> Vec<StoreCommand> {
        let editing = ctx.store.editing();
        let p = ctx.to_content(input.position);
        self.indicators.clear();

        let hit = vertex_hit(
            editing,
            p,
            ctx.screen_radius(ctx.config.handle_hit_radius),
            ctx.screen_radius(ctx.config.vertex_hit_radius),
            ctx.screen_radius(ctx.config.edge_hit_distance),
        );
        log::debug!("vertex edit: press {hit:?}");
        match hit {
            Some(VertexHit::Handle(index, handle)) => {
                self.start_drag(VertexDrag::Handle(index, handle), p);
                vec![StoreCommand::StartDraggingHandle { index, handle }]
            }
            Some(VertexHit::Vertex(index)) => {
                let additive = input.modifiers.shift || input.modifiers.cmd();
                self.start_drag(VertexDrag::Vertex(index), p);
                vec![
                    StoreCommand::SelectVertex { index, additive },
                    StoreCommand::StartDraggingVertex(index),
                ]
            }
            Some(VertexHit::Edge(edge_index, on_edge)) => {
                let excluded: Vec<_> = editing.territory.into_iter().collect();
                let snap = ctx.snapping.snap_point(on_edge, &excluded, false, ctx.store);
                self.indicators = snap.indicators;
                vec![StoreCommand::AddVertexOnEdge {
                    edge_index,
                    point: snap.point,
                }]
            }
            None => vec![],
        }
    }

    fn start_drag(&mut self, target: VertexDrag, press: Point) {
        self.drag = Some(VertexDragState {
            target,
            press,
            has_moved: false,
        });
    }

    fn pointer_move(&mut self, input: &PointerInput, ctx: &ToolContext) -> Vec<StoreCommand> {
        let Some(drag) = self.drag.as_mut() else {
            return vec![];
        };
        let p = ctx.to_content(input.position);
        if !drag.has_moved && p.distance(drag.press) <= ctx.config.move_threshold {
            return vec![];
        }
        drag.has_moved = true;
        match drag.target {
            VertexDrag::Vertex(index) => {
                let excluded: Vec<_> = ctx.store.editing().territory.into_iter().collect();
                let snap = ctx.snapping.snap_point(p, &excluded, false, ctx.store);
                self.indicators = snap.indicators;
                vec![StoreCommand::UpdateVertexPosition {
                    index,
                    point: snap.point,
                }]
            }
            VertexDrag::Handle(index, handle) => vec![StoreCommand::UpdateControlHandle {
                index,
                handle,
                point: p,
            }],
        }
    }

    fn pointer_up(&mut self) -> Vec<StoreCommand> {
        self.indicators.clear();
        match self.drag.take() {
            Some(_) => vec![StoreCommand::StopDraggingVertex],
            None => vec![],
        }
    }
}

impl Tool for VertexEditor {
    fn handle(&mut self, event: &InputEvent, ctx: &ToolContext) -> Vec<StoreCommand> {
        match event {
            InputEvent::PointerDown(input) => self.pointer_down(input, ctx),
            InputEvent::PointerMove(input) => self.pointer_move(input, ctx),
            InputEvent::PointerUp(_) => self.pointer_up(),
            _ => vec![],
        }
    }

    fn is_active(&self) -> bool {
        self.drag.is_some()
    }

    fn cancel(&mut self) {
        self.drag = None;
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
    use dc_core::id::TerritoryId;
    use dc_core::model::{ControlPoints, Territory, Vertex};
    use dc_core::store::{CanvasStore, DiagramStore};
    use pretty_assertions::assert_eq;

    fn editing(vertices: Vec<Vertex>) -> EditingState {
        EditingState {
            is_editing: true,
            territory: None,
            vertices,
            dragging: None,
        }
    }

    fn square() -> Vec<Vertex> {
        vec![
            Vertex::corner(Point::new(0.0, 0.0)),
            Vertex::corner(Point::new(100.0, 0.0)),
            Vertex::corner(Point::new(100.0, 100.0)),
            Vertex::corner(Point::new(0.0, 100.0)),
        ]
    }

    #[test]
    fn handle_beats_vertex() {
        let mut vertices = square();
        vertices[1].control_points = Some(ControlPoints {
            handle_in: Some(Point::new(96.0, -3.0)),
            handle_out: None,
        });
        let hit = vertex_hit(&editing(vertices), Point::new(98.0, -1.0), 6.0, 8.0, 10.0);
        assert_eq!(hit, Some(VertexHit::Handle(1, HandleKind::In)));
    }

    #[test]
    fn vertex_then_edge() {
        let e = editing(square());
        assert_eq!(
            vertex_hit(&e, Point::new(95.0, 4.0), 6.0, 8.0, 10.0),
            Some(VertexHit::Vertex(1))
        );
        assert_eq!(
            vertex_hit(&e, Point::new(50.0, 97.0), 6.0, 8.0, 10.0),
            Some(VertexHit::Edge(2, Point::new(50.0, 100.0)))
        );
        // The closing edge wraps back to vertex 0.
        assert_eq!(
            vertex_hit(&e, Point::new(-4.0, 50.0), 6.0, 8.0, 10.0),
            Some(VertexHit::Edge(3, Point::new(0.0, 50.0)))
        );
        assert_eq!(vertex_hit(&e, Point::new(50.0, 50.0), 6.0, 8.0, 10.0), None);
    }

    #[test]
    fn radii_scale_with_zoom() {
        let config = EngineConfig::default();
        let mut store = DiagramStore::new();
        store.add_territory(Territory::path(
            TerritoryId::intern("sq"),
            Point::new(50.0, 50.0),
            "M 0 0 L 100 0 L 100 100 L 0 100 Z",
        ));
        store.apply(StoreCommand::ToggleSnapping);
        store.apply(StoreCommand::StartEditingTerritory(TerritoryId::intern("sq")));
        store.apply(StoreCommand::SetZoom(4.0));
        let snapping = SnappingEngine::new(&config);
        let viewport = ViewportController::new(&config);
        let mut editor = VertexEditor::new();

        // (96, 4) in content space: 4 units from both edges, beyond the
        // 10px / 4 = 2.5 unit edge distance.
        let miss = PointerInput::at(384.0, 16.0);
        let ctx = ToolContext {
            store: &store,
            config: &config,
            snapping: &snapping,
            viewport: &viewport,
            container: ContainerSize::default(),
        };
        assert!(editor.handle(&InputEvent::PointerDown(miss), &ctx).is_empty());

        // (99, 1): within 8px / 4 = 2 units of vertex 1.
        let hit = PointerInput::at(396.0, 4.0).with_modifiers(Modifiers::NONE);
        assert_eq!(
            editor.handle(&InputEvent::PointerDown(hit), &ctx),
            vec![
                StoreCommand::SelectVertex {
                    index: 1,
                    additive: false
                },
                StoreCommand::StartDraggingVertex(1),
            ]
        );
    }

    #[test]
    fn delete_runs_in_descending_order() {
        let selection = SelectionState {
            territories: vec![],
            vertices: vec![1, 4, 2],
        };
        assert_eq!(
            VertexEditor::delete_selected(&selection),
            vec![
                StoreCommand::DeleteVertex(4),
                StoreCommand::DeleteVertex(2),
                StoreCommand::DeleteVertex(1),
            ]
        );
    }

    #[test]
    fn descending_delete_removes_the_right_vertices() {
        let mut store = DiagramStore::new();
        store.add_territory(Territory::path(
            TerritoryId::intern("hex"),
            Point::ZERO,
            "M 0 0 L 10 0 L 20 0 L 20 10 L 10 10 L 0 10 Z",
        ));
        store.apply(StoreCommand::StartEditingTerritory(TerritoryId::intern("hex")));
        store.apply(StoreCommand::SelectVertex {
            index: 1,
            additive: false,
        });
        store.apply(StoreCommand::SelectVertex {
            index: 4,
            additive: true,
        });
        for cmd in VertexEditor::delete_selected(store.selection()) {
            store.apply(cmd);
        }
        let remaining: Vec<Point> = store.editing().vertices.iter().map(|v| v.point()).collect();
        assert_eq!(
            remaining,
            vec![
                Point::new(0.0, 0.0),
                Point::new(20.0, 0.0),
                Point::new(20.0, 10.0),
                Point::new(0.0, 10.0),
            ]
        );
    }

    #[test]
    fn space_toggles_each_selected_vertex() {
        let selection = SelectionState {
            territories: vec![],
            vertices: vec![0, 2],
        };
        assert_eq!(
            VertexEditor::toggle_bezier(&selection),
            vec![
                StoreCommand::ToggleVertexBezier(0),
                StoreCommand::ToggleVertexBezier(2),
            ]
        );
    }
}
