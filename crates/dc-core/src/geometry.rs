//! Geometry kernel: pure, allocation-light functions called on every
//! relevant pointer event.
//!
//! Nothing here panics or returns errors. Bad input (empty paths, degenerate
//! polygons, zero-length segments) degrades to a safe default so hit-testing
//! and snapping never break the interaction loop.

use crate::model::{
    Bounds, Point, Side, TableCell, TableMetadata, Territory, TerritoryShape,
};
use crate::path::path_to_polygon;

/// Tables are laid out as three equal-width columns regardless of
/// `columns.len()`.
pub const TABLE_COLUMN_COUNT: usize = 3;

/// Result of projecting a point onto a segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentProjection {
    pub point: Point,
    pub distance: f64,
    /// Parametric position along the segment, clamped to `[0, 1]`.
    pub t: f64,
}

/// Ray-casting parity test. Polygons with fewer than 3 points contain nothing.
pub fn point_in_polygon(p: Point, polygon: &[Point]) -> bool {
    if polygon.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = polygon.len() - 1;
    for i in 0..polygon.len() {
        let (a, b) = (polygon[i], polygon[j]);
        if (a.y > p.y) != (b.y > p.y) && p.x < (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Hit-test a territory. Tables test their bounding block, paths their
/// polygon approximation.
pub fn point_in_territory(p: Point, territory: &Territory) -> bool {
    match &territory.shape {
        TerritoryShape::Table { metadata } => table_bounds(territory.center, metadata).contains(p),
        TerritoryShape::Path { fill_path } => point_in_polygon(p, &path_to_polygon(fill_path)),
    }
}

/// Project `p` onto segment `[a, b]`. A degenerate segment projects onto `a`.
pub fn closest_point_on_segment(p: Point, a: Point, b: Point) -> SegmentProjection {
    let ab = b - a;
    let len_sq = ab.x * ab.x + ab.y * ab.y;
    if len_sq == 0.0 {
        return SegmentProjection {
            point: a,
            distance: p.distance(a),
            t: 0.0,
        };
    }
    let ap = p - a;
    let t = ((ap.x * ab.x + ap.y * ab.y) / len_sq).clamp(0.0, 1.0);
    let point = a + ab * t;
    SegmentProjection {
        point,
        distance: p.distance(point),
        t,
    }
}

/// Clamp each axis independently into `bounds`.
pub fn clamp_to_bounds(p: Point, bounds: &Bounds) -> Point {
    Point::new(
        p.x.clamp(bounds.min_x, bounds.max_x),
        p.y.clamp(bounds.min_y, bounds.max_y),
    )
}

// ─── Territory shapes ────────────────────────────────────────────────────

/// Block of a table centered at `center`.
pub fn table_bounds(center: Point, metadata: &TableMetadata) -> Bounds {
    Bounds::from_center(center, metadata.width, metadata.height())
}

/// Axis-aligned bounds of any territory. `None` for an unparseable path.
pub fn territory_bounds(territory: &Territory) -> Option<Bounds> {
    match &territory.shape {
        TerritoryShape::Table { metadata } => Some(table_bounds(territory.center, metadata)),
        TerritoryShape::Path { fill_path } => Bounds::enclosing(&path_to_polygon(fill_path)),
    }
}

/// Closed outline of a territory as a list of edges.
pub fn territory_edges(territory: &Territory) -> Vec<(Point, Point)> {
    let outline: Vec<Point> = match &territory.shape {
        TerritoryShape::Table { metadata } => {
            table_bounds(territory.center, metadata).corners().to_vec()
        }
        TerritoryShape::Path { fill_path } => path_to_polygon(fill_path),
    };
    polygon_edges(&outline)
}

/// Edges of a closed polygon, including the closing edge.
pub fn polygon_edges(polygon: &[Point]) -> Vec<(Point, Point)> {
    if polygon.len() < 2 {
        return Vec::new();
    }
    let n = polygon.len();
    (0..n)
        .map(|i| (polygon[i], polygon[(i + 1) % n]))
        .filter(|(a, b)| a != b)
        .collect()
}

// ─── Table layout ────────────────────────────────────────────────────────

/// Vertical center of a data row, in content space.
pub fn row_center_y(center: Point, metadata: &TableMetadata, row: usize) -> f64 {
    let top = center.y - metadata.height() / 2.0;
    top + metadata.name_height + metadata.header_height + metadata.row_height * (row as f64 + 0.5)
}

/// Connection anchor of a row: just outside the left or right edge.
/// `None` if the territory is not a table or the row doesn't exist.
pub fn row_anchor(territory: &Territory, row: usize, side: Side, offset: f64) -> Option<Point> {
    let metadata = territory.table_metadata()?;
    if row >= metadata.rows.len() {
        return None;
    }
    let b = table_bounds(territory.center, metadata);
    let x = match side {
        Side::Left => b.min_x - offset,
        Side::Right => b.max_x + offset,
    };
    Some(Point::new(x, row_center_y(territory.center, metadata, row)))
}

/// Which cell of a table lies under `p`.
pub fn cell_at(territory: &Territory, p: Point) -> Option<TableCell> {
    let metadata = territory.table_metadata()?;
    let b = table_bounds(territory.center, metadata);
    if !b.contains(p) {
        return None;
    }
    let local_y = p.y - b.min_y;
    if local_y < metadata.name_height {
        return Some(TableCell::Name);
    }
    let column_width = metadata.width / TABLE_COLUMN_COUNT as f64;
    let column = (((p.x - b.min_x) / column_width) as usize).min(TABLE_COLUMN_COUNT - 1);
    let below_name = local_y - metadata.name_height;
    if below_name < metadata.header_height {
        return Some(TableCell::Header { column });
    }
    if metadata.row_height <= 0.0 {
        return None;
    }
    let row = ((below_name - metadata.header_height) / metadata.row_height) as usize;
    (row < metadata.rows.len()).then_some(TableCell::Cell { row, column })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::TerritoryId;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn square() -> Vec<Point> {
        vec![
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(0.0, 10.0),
        ]
    }

    fn table(columns: &[&str], rows: usize) -> Territory {
        Territory::table(
            TerritoryId::intern("tbl"),
            Point::new(0.0, 0.0),
            TableMetadata {
                width: 300.0,
                name_height: 30.0,
                header_height: 20.0,
                row_height: 25.0,
                columns: columns.iter().map(|c| c.to_string()).collect(),
                rows: vec![HashMap::new(); rows],
                table_name: "tbl".into(),
            },
        )
    }

    #[test]
    fn point_in_unit_square() {
        assert!(point_in_polygon(Point::new(5.0, 5.0), &square()));
        assert!(!point_in_polygon(Point::new(15.0, 5.0), &square()));
    }

    #[test]
    fn degenerate_polygon_contains_nothing() {
        let line = [Point::new(0.0, 0.0), Point::new(10.0, 10.0)];
        assert!(!point_in_polygon(Point::new(5.0, 5.0), &line));
        assert!(!point_in_polygon(Point::new(0.0, 0.0), &[]));
    }

    #[test]
    fn concave_polygon() {
        // U shape: notch between x=4..6 above y=4
        let u = [
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(6.0, 10.0),
            Point::new(6.0, 4.0),
            Point::new(4.0, 4.0),
            Point::new(4.0, 10.0),
            Point::new(0.0, 10.0),
        ];
        assert!(!point_in_polygon(Point::new(5.0, 8.0), &u));
        assert!(point_in_polygon(Point::new(2.0, 8.0), &u));
    }

    #[test]
    fn closest_point_projects_onto_segment() {
        let r = closest_point_on_segment(
            Point::new(5.0, 5.0),
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
        );
        assert_eq!(r.point, Point::new(5.0, 0.0));
        assert_eq!(r.distance, 5.0);
    }

    #[test]
    fn closest_point_clamps_to_endpoints() {
        let r = closest_point_on_segment(
            Point::new(-4.0, 3.0),
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
        );
        assert_eq!(r.point, Point::new(0.0, 0.0));
        assert_eq!(r.distance, 5.0);
        assert_eq!(r.t, 0.0);
    }

    #[test]
    fn degenerate_segment_returns_start() {
        let r = closest_point_on_segment(
            Point::new(0.0, 0.0),
            Point::new(3.0, 3.0),
            Point::new(3.0, 3.0),
        );
        assert_eq!(r.point, Point::new(3.0, 3.0));
        assert!((r.distance - 18f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn clamp_is_per_axis() {
        let b = Bounds::from_corners(Point::new(0.0, 0.0), Point::new(100.0, 50.0));
        assert_eq!(
            clamp_to_bounds(Point::new(150.0, 20.0), &b),
            Point::new(100.0, 20.0)
        );
        assert_eq!(
            clamp_to_bounds(Point::new(-5.0, 80.0), &b),
            Point::new(0.0, 50.0)
        );
    }

    #[test]
    fn path_territory_hit_test() {
        let t = Territory::path(
            TerritoryId::intern("tri"),
            Point::new(5.0, 3.0),
            "M 0 0 L 10 0 L 5 8 Z",
        );
        assert!(point_in_territory(Point::new(5.0, 2.0), &t));
        assert!(!point_in_territory(Point::new(9.0, 7.0), &t));

        let broken = Territory::path(TerritoryId::intern("broken"), Point::ZERO, "M 0 0 L");
        assert!(!point_in_territory(Point::new(0.0, 0.0), &broken));
    }

    #[test]
    fn table_hit_test_uses_row_count() {
        // height = 30 + 20 + 25 * 2 = 100, centered on origin
        let t = table(&["a", "b", "c"], 2);
        assert!(point_in_territory(Point::new(149.0, 49.0), &t));
        assert!(!point_in_territory(Point::new(0.0, 51.0), &t));
        assert!(!point_in_territory(Point::new(151.0, 0.0), &t));
    }

    #[test]
    fn row_anchors_sit_outside_edges() {
        let t = table(&["a", "b", "c"], 2);
        // top = -50; row 1 center = -50 + 30 + 20 + 37.5
        assert_eq!(
            row_anchor(&t, 1, Side::Left, 5.0),
            Some(Point::new(-155.0, 37.5))
        );
        assert_eq!(
            row_anchor(&t, 0, Side::Right, 5.0),
            Some(Point::new(155.0, 12.5))
        );
        assert_eq!(row_anchor(&t, 2, Side::Left, 5.0), None);
    }

    #[test]
    fn cells_divide_width_into_thirds_regardless_of_columns() {
        // Only two named columns, yet the layout still has three 100-wide cells.
        let t = table(&["a", "b"], 2);
        assert_eq!(cell_at(&t, Point::new(-140.0, -40.0)), Some(TableCell::Name));
        assert_eq!(
            cell_at(&t, Point::new(60.0, -15.0)),
            Some(TableCell::Header { column: 2 })
        );
        assert_eq!(
            cell_at(&t, Point::new(-10.0, 30.0)),
            Some(TableCell::Cell { row: 1, column: 1 })
        );
        assert_eq!(cell_at(&t, Point::new(400.0, 0.0)), None);
    }

    #[test]
    fn table_edges_form_closed_rectangle() {
        let t = table(&["a", "b", "c"], 0);
        let edges = territory_edges(&t);
        assert_eq!(edges.len(), 4);
        assert_eq!(edges[3].1, edges[0].0);
    }
}
