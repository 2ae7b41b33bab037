//! Hit testing: point → territory lookup.
//!
//! Territories are tested front-to-back: highest `z_index` first, and for
//! equal z-index the later (last painted) territory wins.

use crate::geometry::point_in_territory;
use crate::id::TerritoryId;
use crate::model::{Bounds, Point, Territory};

/// Indices of `territories` in front-to-back order.
pub fn front_to_back(territories: &[Territory]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..territories.len()).collect();
    order.sort_by(|&a, &b| {
        territories[b]
            .z_index
            .cmp(&territories[a].z_index)
            .then(b.cmp(&a))
    });
    order
}

/// Find the topmost territory at `p`. Returns `None` for background.
pub fn hit_test(territories: &[Territory], p: Point) -> Option<TerritoryId> {
    front_to_back(territories)
        .into_iter()
        .map(|i| &territories[i])
        .find(|t| point_in_territory(p, t))
        .map(|t| t.id)
}

/// All territories whose center lies inside `area`. Used for area selection.
pub fn territories_in_area(territories: &[Territory], area: &Bounds) -> Vec<TerritoryId> {
    territories
        .iter()
        .filter(|t| area.contains(t.center))
        .map(|t| t.id)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn square(id: &str, x: f64, y: f64, z: i32) -> Territory {
        Territory::path(
            TerritoryId::intern(id),
            Point::new(x + 5.0, y + 5.0),
            format!(
                "M {x} {y} L {} {y} L {} {} L {x} {} Z",
                x + 10.0,
                x + 10.0,
                y + 10.0,
                y + 10.0
            ),
        )
        .with_z_index(z)
    }

    #[test]
    fn topmost_z_index_wins() {
        let territories = vec![square("high", 0.0, 0.0, 5), square("low", 2.0, 2.0, 1)];
        assert_eq!(
            hit_test(&territories, Point::new(6.0, 6.0)),
            Some(TerritoryId::intern("high"))
        );
    }

    #[test]
    fn later_territory_wins_on_equal_z() {
        let territories = vec![square("first", 0.0, 0.0, 0), square("second", 2.0, 2.0, 0)];
        assert_eq!(
            hit_test(&territories, Point::new(6.0, 6.0)),
            Some(TerritoryId::intern("second"))
        );
    }

    #[test]
    fn background_miss() {
        let territories = vec![square("only", 0.0, 0.0, 0)];
        assert_eq!(hit_test(&territories, Point::new(50.0, 50.0)), None);
    }

    #[test]
    fn area_selects_by_center() {
        let territories = vec![square("in", 0.0, 0.0, 0), square("out", 30.0, 30.0, 0)];
        // Covers only part of "in", but includes its center (5, 5).
        let area = Bounds::from_corners(Point::new(20.0, 20.0), Point::new(4.0, 4.0));
        assert_eq!(
            territories_in_area(&territories, &area),
            vec![TerritoryId::intern("in")]
        );
    }
}
