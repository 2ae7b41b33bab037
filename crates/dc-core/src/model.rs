//! Core data model for diagram documents.
//!
//! A diagram is a flat set of territories (freeform path shapes or
//! database-table blocks) plus relationships wiring table rows together.
//! Everything here lives in content space; zoom and pan only matter to the
//! editor when converting pointer positions.

use crate::id::{RelationshipId, TerritoryId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::ops::{Add, Div, Mul, Neg, Sub};

// ─── Points & bounds ─────────────────────────────────────────────────────

/// A position in content space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean length when read as a vector.
    pub fn length(self) -> f64 {
        self.x.hypot(self.y)
    }

    pub fn distance(self, other: Point) -> f64 {
        (self - other).length()
    }
}

impl Add for Point {
    type Output = Point;
    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;
    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Point {
    type Output = Point;
    fn mul(self, rhs: f64) -> Point {
        Point::new(self.x * rhs, self.y * rhs)
    }
}

impl Div<f64> for Point {
    type Output = Point;
    fn div(self, rhs: f64) -> Point {
        Point::new(self.x / rhs, self.y / rhs)
    }
}

impl Neg for Point {
    type Output = Point;
    fn neg(self) -> Point {
        Point::new(-self.x, -self.y)
    }
}

/// Axis-aligned rectangle, always stored normalized (`min <= max`).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    /// Build from two arbitrary corners (drag start + current, in any order).
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self {
            min_x: a.x.min(b.x),
            min_y: a.y.min(b.y),
            max_x: a.x.max(b.x),
            max_y: a.y.max(b.y),
        }
    }

    pub fn from_center(center: Point, width: f64, height: f64) -> Self {
        Self {
            min_x: center.x - width / 2.0,
            min_y: center.y - height / 2.0,
            max_x: center.x + width / 2.0,
            max_y: center.y + height / 2.0,
        }
    }

    /// Smallest bounds enclosing every point. `None` for an empty slice.
    pub fn enclosing(points: &[Point]) -> Option<Self> {
        let first = points.first()?;
        let mut b = Bounds::from_corners(*first, *first);
        for p in &points[1..] {
            b.min_x = b.min_x.min(p.x);
            b.min_y = b.min_y.min(p.y);
            b.max_x = b.max_x.max(p.x);
            b.max_y = b.max_y.max(p.y);
        }
        Some(b)
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.min_x && p.x <= self.max_x && p.y >= self.min_y && p.y <= self.max_y
    }

    pub fn center(&self) -> Point {
        Point::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Corners in clockwise order starting top-left.
    pub fn corners(&self) -> [Point; 4] {
        [
            Point::new(self.min_x, self.min_y),
            Point::new(self.max_x, self.min_y),
            Point::new(self.max_x, self.max_y),
            Point::new(self.min_x, self.max_y),
        ]
    }
}

// ─── Territories ─────────────────────────────────────────────────────────

/// Layout of a database-table territory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableMetadata {
    pub width: f64,
    pub name_height: f64,
    pub header_height: f64,
    pub row_height: f64,
    pub columns: Vec<String>,
    pub rows: Vec<HashMap<String, String>>,
    pub table_name: String,
}

impl TableMetadata {
    /// Total block height: name band + header + one band per row.
    pub fn height(&self) -> f64 {
        self.name_height + self.header_height + self.row_height * self.rows.len() as f64
    }
}

/// The single active geometry of a territory. Path and table layouts are
/// mutually exclusive by construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TerritoryShape {
    Table {
        metadata: TableMetadata,
    },
    Path {
        #[serde(rename = "fillPath")]
        fill_path: String,
    },
}

/// A placed diagram entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Territory {
    pub id: TerritoryId,
    #[serde(default)]
    pub name: String,
    pub center: Point,
    #[serde(flatten)]
    pub shape: TerritoryShape,
    #[serde(default)]
    pub z_index: i32,
}

impl Territory {
    pub fn path(id: TerritoryId, center: Point, fill_path: impl Into<String>) -> Self {
        Self {
            id,
            name: String::new(),
            center,
            shape: TerritoryShape::Path {
                fill_path: fill_path.into(),
            },
            z_index: 0,
        }
    }

    pub fn table(id: TerritoryId, center: Point, metadata: TableMetadata) -> Self {
        Self {
            id,
            name: String::new(),
            center,
            shape: TerritoryShape::Table { metadata },
            z_index: 0,
        }
    }

    pub fn with_z_index(mut self, z_index: i32) -> Self {
        self.z_index = z_index;
        self
    }

    pub fn table_metadata(&self) -> Option<&TableMetadata> {
        match &self.shape {
            TerritoryShape::Table { metadata } => Some(metadata),
            TerritoryShape::Path { .. } => None,
        }
    }

    pub fn fill_path(&self) -> Option<&str> {
        match &self.shape {
            TerritoryShape::Path { fill_path } => Some(fill_path),
            TerritoryShape::Table { .. } => None,
        }
    }

    pub fn is_table(&self) -> bool {
        matches!(self.shape, TerritoryShape::Table { .. })
    }
}

// ─── Vertices ────────────────────────────────────────────────────────────

/// Which bezier handle of a vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HandleKind {
    In,
    Out,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ControlPoints {
    #[serde(rename = "in", default, skip_serializing_if = "Option::is_none")]
    pub handle_in: Option<Point>,
    #[serde(rename = "out", default, skip_serializing_if = "Option::is_none")]
    pub handle_out: Option<Point>,
}

/// A vertex of a territory under edit (or of the in-progress pen path).
/// Control points are present only when the vertex is a bezier anchor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vertex {
    pub x: f64,
    pub y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub control_points: Option<ControlPoints>,
}

impl Vertex {
    pub const fn corner(p: Point) -> Self {
        Self {
            x: p.x,
            y: p.y,
            control_points: None,
        }
    }

    pub fn point(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn handle(&self, kind: HandleKind) -> Option<Point> {
        let cp = self.control_points?;
        match kind {
            HandleKind::In => cp.handle_in,
            HandleKind::Out => cp.handle_out,
        }
    }

    pub fn is_bezier(&self) -> bool {
        self.control_points.is_some()
    }

    /// Translate the anchor together with its handles.
    pub fn translate(&mut self, delta: Point) {
        self.x += delta.x;
        self.y += delta.y;
        if let Some(cp) = &mut self.control_points {
            cp.handle_in = cp.handle_in.map(|h| h + delta);
            cp.handle_out = cp.handle_out.map(|h| h + delta);
        }
    }
}

// ─── Relationships ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RelationshipType {
    OneToOne,
    #[default]
    OneToMany,
    ManyToMany,
}

/// A row-level connection point on a table territory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AnchorRef {
    pub table: TerritoryId,
    pub row: usize,
    pub side: Side,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relationship {
    pub id: RelationshipId,
    pub from_table: TerritoryId,
    pub from_row: usize,
    pub from_side: Side,
    pub to_table: TerritoryId,
    pub to_row: usize,
    pub to_side: Side,
    pub relationship_type: RelationshipType,
}

impl Relationship {
    /// Wire two anchors with a freshly generated id.
    pub fn between(from: AnchorRef, to: AnchorRef, relationship_type: RelationshipType) -> Self {
        Self {
            id: RelationshipId::with_prefix("rel"),
            from_table: from.table,
            from_row: from.row,
            from_side: from.side,
            to_table: to.table,
            to_row: to.row,
            to_side: to.side,
            relationship_type,
        }
    }

    pub fn from_anchor(&self) -> AnchorRef {
        AnchorRef {
            table: self.from_table,
            row: self.from_row,
            side: self.from_side,
        }
    }

    pub fn to_anchor(&self) -> AnchorRef {
        AnchorRef {
            table: self.to_table,
            row: self.to_row,
            side: self.to_side,
        }
    }

    pub fn is_self_loop(&self) -> bool {
        self.from_anchor() == self.to_anchor()
    }

    pub fn touches(&self, table: TerritoryId) -> bool {
        self.from_table == table || self.to_table == table
    }
}

// ─── View / editor state owned by the store ──────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GridType {
    #[default]
    Lines,
    Dots,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ViewState {
    pub pan: Point,
    pub zoom: f64,
    pub grid_size: f64,
    pub show_grid: bool,
    pub grid_type: GridType,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            pan: Point::ZERO,
            zoom: 1.0,
            grid_size: 20.0,
            show_grid: true,
            grid_type: GridType::Lines,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapSettings {
    pub enabled: bool,
    /// Held-Alt suspension. Does not change `enabled`.
    pub temporarily_disabled: bool,
}

impl SnapSettings {
    pub fn is_active(&self) -> bool {
        self.enabled && !self.temporarily_disabled
    }
}

impl Default for SnapSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            temporarily_disabled: false,
        }
    }
}

/// In-progress pen path.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DrawingState {
    pub is_drawing: bool,
    pub bezier_path: Vec<Vertex>,
    pub is_dragging_handle: bool,
    pub drag_start_point: Option<Point>,
}

/// Selected territories and, during vertex editing, selected vertex indices.
/// Both lists keep set semantics and insertion order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SelectionState {
    pub territories: Vec<TerritoryId>,
    pub vertices: Vec<usize>,
}

impl SelectionState {
    pub fn contains(&self, id: TerritoryId) -> bool {
        self.territories.contains(&id)
    }

    pub fn insert(&mut self, id: TerritoryId) {
        if !self.territories.contains(&id) {
            self.territories.push(id);
        }
    }

    pub fn remove(&mut self, id: TerritoryId) {
        self.territories.retain(|t| *t != id);
    }

    pub fn insert_vertex(&mut self, index: usize) {
        if !self.vertices.contains(&index) {
            self.vertices.push(index);
        }
    }

    pub fn clear(&mut self) {
        self.territories.clear();
        self.vertices.clear();
    }
}

/// What is currently being dragged inside vertex-edit mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VertexDrag {
    Vertex(usize),
    Handle(usize, HandleKind),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct EditingState {
    pub is_editing: bool,
    pub territory: Option<TerritoryId>,
    pub vertices: Vec<Vertex>,
    pub dragging: Option<VertexDrag>,
}

/// A cell addressed by inline (double-click) editing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableCell {
    Name,
    Header { column: usize },
    Cell { row: usize, column: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InlineEditTarget {
    pub table: TerritoryId,
    pub cell: TableCell,
}

// ─── Snap feedback ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapIndicatorKind {
    Point,
    Line,
    Guide,
    Measurement,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IndicatorGeometry {
    Point { at: Point },
    Line { from: Point, to: Point },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndicatorStyle {
    #[default]
    Normal,
    /// Larger, highlighted marker (e.g. a gravity-snapped anchor).
    Highlight,
}

/// Transient visual feedback for a snap. Never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapIndicator {
    pub id: String,
    pub kind: SnapIndicatorKind,
    pub geometry: IndicatorGeometry,
    pub style: IndicatorStyle,
    /// Measurement text (distance readout), if any.
    pub label: Option<String>,
}

// ─── Document ────────────────────────────────────────────────────────────

/// Serialized diagram: what a host persists and loads.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Diagram {
    pub territories: Vec<Territory>,
    pub relationships: Vec<Relationship>,
    pub view: ViewState,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn bounds_normalize_corners() {
        let b = Bounds::from_corners(Point::new(10.0, 2.0), Point::new(-4.0, 8.0));
        assert_eq!(b.min_x, -4.0);
        assert_eq!(b.max_x, 10.0);
        assert_eq!(b.min_y, 2.0);
        assert_eq!(b.max_y, 8.0);
        assert!(b.contains(Point::new(0.0, 5.0)));
        assert_eq!(b.center(), Point::new(3.0, 5.0));
    }

    #[test]
    fn territory_shape_is_path_xor_table() {
        let json = r#"{"id":"t1","center":{"x":0,"y":0},"fillPath":"M 0 0 L 1 0 L 1 1 Z"}"#;
        let t: Territory = serde_json::from_str(json).unwrap();
        assert!(!t.is_table());
        assert_eq!(t.fill_path(), Some("M 0 0 L 1 0 L 1 1 Z"));
        assert!(t.table_metadata().is_none());
    }

    #[test]
    fn table_metadata_uses_camel_case() {
        let json = r#"{
            "id": "users",
            "center": {"x": 100, "y": 50},
            "zIndex": 2,
            "metadata": {
                "width": 240, "nameHeight": 30, "headerHeight": 24, "rowHeight": 20,
                "columns": ["name", "type", "key"],
                "rows": [{"name": "id", "type": "int", "key": "pk"}],
                "tableName": "users"
            }
        }"#;
        let t: Territory = serde_json::from_str(json).unwrap();
        let meta = t.table_metadata().unwrap();
        assert_eq!(meta.table_name, "users");
        assert_eq!(meta.height(), 74.0);
        assert_eq!(t.z_index, 2);
    }

    #[test]
    fn relationship_self_loop_detection() {
        let a = AnchorRef {
            table: TerritoryId::intern("a"),
            row: 0,
            side: Side::Left,
        };
        let rel = Relationship::between(a, a, RelationshipType::OneToOne);
        assert!(rel.is_self_loop());

        let b = AnchorRef {
            side: Side::Right,
            ..a
        };
        assert!(!Relationship::between(a, b, RelationshipType::OneToOne).is_self_loop());
    }

    #[test]
    fn relationship_type_serializes_kebab_case() {
        let json = serde_json::to_string(&RelationshipType::ManyToMany).unwrap();
        assert_eq!(json, "\"many-to-many\"");
    }

    #[test]
    fn vertex_translate_moves_handles() {
        let mut v = Vertex {
            x: 1.0,
            y: 1.0,
            control_points: Some(ControlPoints {
                handle_in: Some(Point::new(0.0, 1.0)),
                handle_out: None,
            }),
        };
        v.translate(Point::new(2.0, 3.0));
        assert_eq!(v.point(), Point::new(3.0, 4.0));
        assert_eq!(v.handle(HandleKind::In), Some(Point::new(2.0, 4.0)));
        assert_eq!(v.handle(HandleKind::Out), None);
    }
}
