//! Snap engine: pulls a content-space point onto nearby geometry.
//!
//! Sources, in insertion order:
//! 1. Centers of non-excluded territories
//! 2. Closest points on their edges
//! 3. Alignment guides against unselected territory centers (opt-in)
//! 4. The nearest grid node (when the grid is visible)
//! 5. Axis / 45° guides from the previous pen point (drawing only)
//!
//! Object and guide sources only count within `snap_tolerance / zoom`; the
//! grid node always counts. The nearest candidate wins and exact ties go to
//! the earlier source.

use crate::config::EngineConfig;
use dc_core::geometry::{closest_point_on_segment, territory_edges};
use dc_core::id::TerritoryId;
use dc_core::model::{
    IndicatorGeometry, IndicatorStyle, Point, SnapIndicator, SnapIndicatorKind,
};
use dc_core::store::CanvasStore;
use smallvec::SmallVec;

/// Snapped position plus what to draw for it. `indicators` is empty when
/// nothing snapped.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapResult {
    pub point: Point,
    pub indicators: Vec<SnapIndicator>,
}

impl SnapResult {
    fn unsnapped(point: Point) -> Self {
        Self {
            point,
            indicators: Vec::new(),
        }
    }

    pub fn is_snapped(&self) -> bool {
        !self.indicators.is_empty()
    }
}

struct Candidate {
    point: Point,
    distance: f64,
    indicator: SnapIndicator,
}

type Candidates = SmallVec<[Candidate; 8]>;

fn indicator(id: String, kind: SnapIndicatorKind, geometry: IndicatorGeometry) -> SnapIndicator {
    SnapIndicator {
        id,
        kind,
        geometry,
        style: IndicatorStyle::Normal,
        label: None,
    }
}

pub struct SnappingEngine {
    base_tolerance: f64,
}

impl SnappingEngine {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            base_tolerance: config.snap_tolerance,
        }
    }

    /// Content-space tolerance: constant on screen at every zoom level.
    pub fn tolerance(&self, zoom: f64) -> f64 {
        self.base_tolerance / zoom
    }

    /// Snap `raw` against every territory not in `excluded`.
    /// `with_alignment` adds center-alignment guides against unselected
    /// territories (used while moving a selection).
    pub fn snap_point(
        &self,
        raw: Point,
        excluded: &[TerritoryId],
        with_alignment: bool,
        store: &dyn CanvasStore,
    ) -> SnapResult {
        if !store.snap_settings().is_active() {
            return SnapResult::unsnapped(raw);
        }
        let mut candidates = Candidates::new();
        self.collect(raw, excluded, with_alignment, store, &mut candidates);
        pick(raw, candidates)
    }

    /// Pen-tool snapping: object and grid sources plus horizontal, vertical
    /// and 45° guides through the previous path point.
    pub fn snapped_drawing_point(&self, raw: Point, store: &dyn CanvasStore) -> SnapResult {
        if !store.snap_settings().is_active() {
            return SnapResult::unsnapped(raw);
        }
        let tolerance = self.tolerance(store.view().zoom);
        let mut candidates = Candidates::new();
        self.collect(raw, &[], false, store, &mut candidates);

        let previous = store.drawing().bezier_path.last().map(|v| v.point());
        if let Some(prev) = previous {
            let diagonal = std::f64::consts::FRAC_1_SQRT_2;
            let guides = [
                ("axis-h", Point::new(raw.x, prev.y)),
                ("axis-v", Point::new(prev.x, raw.y)),
                ("axis-45", project_on_line(raw, prev, Point::new(diagonal, diagonal))),
                ("axis-135", project_on_line(raw, prev, Point::new(diagonal, -diagonal))),
            ];
            for (id, point) in guides {
                let distance = raw.distance(point);
                if distance <= tolerance {
                    candidates.push(Candidate {
                        point,
                        distance,
                        indicator: indicator(
                            id.to_string(),
                            SnapIndicatorKind::Guide,
                            IndicatorGeometry::Line { from: prev, to: point },
                        ),
                    });
                }
            }
        }

        let mut result = pick(raw, candidates);
        if let (Some(prev), true) = (previous, result.is_snapped()) {
            result.indicators.push(SnapIndicator {
                label: Some(format!("{:.0}", prev.distance(result.point))),
                ..indicator(
                    "measure".to_string(),
                    SnapIndicatorKind::Measurement,
                    IndicatorGeometry::Line {
                        from: prev,
                        to: result.point,
                    },
                )
            });
        }
        result
    }

    fn collect(
        &self,
        raw: Point,
        excluded: &[TerritoryId],
        with_alignment: bool,
        store: &dyn CanvasStore,
        out: &mut Candidates,
    ) {
        let view = store.view();
        let tolerance = self.tolerance(view.zoom);
        let targets = || {
            store
                .territories()
                .iter()
                .filter(|t| !excluded.contains(&t.id))
        };

        for t in targets() {
            let distance = raw.distance(t.center);
            if distance <= tolerance {
                out.push(Candidate {
                    point: t.center,
                    distance,
                    indicator: indicator(
                        format!("center-{}", t.id),
                        SnapIndicatorKind::Point,
                        IndicatorGeometry::Point { at: t.center },
                    ),
                });
            }
        }

        for t in targets() {
            for (i, (a, b)) in territory_edges(t).into_iter().enumerate() {
                let projection = closest_point_on_segment(raw, a, b);
                if projection.distance <= tolerance {
                    out.push(Candidate {
                        point: projection.point,
                        distance: projection.distance,
                        indicator: indicator(
                            format!("edge-{}-{i}", t.id),
                            SnapIndicatorKind::Line,
                            IndicatorGeometry::Line { from: a, to: b },
                        ),
                    });
                }
            }
        }

        if with_alignment {
            let selection = store.selection();
            for t in targets().filter(|t| !selection.contains(t.id)) {
                let c = t.center;
                let dx = (raw.x - c.x).abs();
                if dx <= tolerance {
                    let point = Point::new(c.x, raw.y);
                    out.push(Candidate {
                        point,
                        distance: dx,
                        indicator: indicator(
                            format!("align-x-{}", t.id),
                            SnapIndicatorKind::Guide,
                            IndicatorGeometry::Line { from: c, to: point },
                        ),
                    });
                }
                let dy = (raw.y - c.y).abs();
                if dy <= tolerance {
                    let point = Point::new(raw.x, c.y);
                    out.push(Candidate {
                        point,
                        distance: dy,
                        indicator: indicator(
                            format!("align-y-{}", t.id),
                            SnapIndicatorKind::Guide,
                            IndicatorGeometry::Line { from: c, to: point },
                        ),
                    });
                }
            }
        }

        if view.show_grid && view.grid_size > 0.0 {
            let g = view.grid_size;
            let point = Point::new((raw.x / g).round() * g, (raw.y / g).round() * g);
            // Unbounded: a visible grid always snaps, and only object
            // snaps nearer than the grid node beat it.
            out.push(Candidate {
                point,
                distance: raw.distance(point),
                indicator: indicator(
                    "grid".to_string(),
                    SnapIndicatorKind::Point,
                    IndicatorGeometry::Point { at: point },
                ),
            });
        }
    }
}

/// Nearest candidate; strict `<` keeps the first of equal distances.
fn pick(raw: Point, candidates: Candidates) -> SnapResult {
    let mut best: Option<Candidate> = None;
    for c in candidates {
        if best.as_ref().is_none_or(|b| c.distance < b.distance) {
            best = Some(c);
        }
    }
    match best {
        Some(c) => SnapResult {
            point: c.point,
            indicators: vec![c.indicator],
        },
        None => SnapResult::unsnapped(raw),
    }
}

/// Project `p` onto the infinite line through `origin` with unit `dir`.
fn project_on_line(p: Point, origin: Point, dir: Point) -> Point {
    let v = p - origin;
    origin + dir * (v.x * dir.x + v.y * dir.y)
}
