//! Relationship drawing between table rows.
//!
//! Every data row of a table exposes a connection anchor just outside its
//! left and right edges. Dragging from one anchor to another creates a
//! `Relationship`; while dragging, the free end is pulled onto the nearest
//! anchor within the gravity radius.

use crate::input::{InputEvent, PointerInput};
use crate::tools::{Tool, ToolContext};
use dc_core::geometry::{closest_point_on_segment, row_anchor};
use dc_core::id::{RelationshipId, TerritoryId};
use dc_core::model::{
    AnchorRef, IndicatorGeometry, IndicatorStyle, Point, Relationship, RelationshipType, Side,
    SnapIndicator, SnapIndicatorKind, Territory,
};
use dc_core::store::{CanvasStore, StoreCommand};

/// Every row anchor of every table, in territory order.
pub fn all_anchors(territories: &[Territory], offset: f64) -> Vec<(AnchorRef, Point)> {
    let mut anchors = Vec::new();
    for t in territories {
        let Some(metadata) = t.table_metadata() else {
            continue;
        };
        for row in 0..metadata.rows.len() {
            for side in [Side::Left, Side::Right] {
                if let Some(p) = row_anchor(t, row, side, offset) {
                    anchors.push((
                        AnchorRef {
                            table: t.id,
                            row,
                            side,
                        },
                        p,
                    ));
                }
            }
        }
    }
    anchors
}

/// Nearest anchor to `p` within `radius`.
pub fn nearest_anchor(
    territories: &[Territory],
    p: Point,
    radius: f64,
    offset: f64,
) -> Option<(AnchorRef, Point)> {
    all_anchors(territories, offset)
        .into_iter()
        .map(|(anchor, at)| (anchor, at, p.distance(at)))
        .filter(|&(_, _, d)| d <= radius)
        .min_by(|a, b| a.2.total_cmp(&b.2))
        .map(|(anchor, at, _)| (anchor, at))
}

/// Position of an anchor, optionally shifted when its table is part of an
/// in-flight move.
fn anchor_position(
    store: &dyn CanvasStore,
    anchor: AnchorRef,
    offset: f64,
    moving: Option<(&[TerritoryId], Point)>,
) -> Option<Point> {
    let table = store.territory(anchor.table)?;
    let p = row_anchor(table, anchor.row, anchor.side, offset)?;
    Some(match moving {
        Some((ids, delta)) if ids.contains(&anchor.table) => p + delta,
        _ => p,
    })
}

/// A relationship resolved to screen-ready content coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RelationshipLine {
    pub id: RelationshipId,
    pub from: Point,
    pub to: Point,
    pub relationship_type: RelationshipType,
    pub selected: bool,
}

/// Resolve every relationship's endpoints. Tables listed in `moving` are
/// drawn shifted by the move delta so lines follow a drag frame-for-frame.
/// Relationships whose endpoints no longer resolve are skipped.
pub fn relationship_lines(
    store: &dyn CanvasStore,
    offset: f64,
    moving: Option<(&[TerritoryId], Point)>,
) -> Vec<RelationshipLine> {
    let selected = store.selected_relationship();
    store
        .relationships()
        .iter()
        .filter_map(|r| {
            Some(RelationshipLine {
                id: r.id,
                from: anchor_position(store, r.from_anchor(), offset, moving)?,
                to: anchor_position(store, r.to_anchor(), offset, moving)?,
                relationship_type: r.relationship_type,
                selected: selected == Some(r.id),
            })
        })
        .collect()
}

/// Relationship whose line passes within `tolerance` of `p`.
pub fn relationship_at(
    store: &dyn CanvasStore,
    p: Point,
    offset: f64,
    tolerance: f64,
) -> Option<RelationshipId> {
    relationship_lines(store, offset, None)
        .into_iter()
        .map(|line| (line.id, closest_point_on_segment(p, line.from, line.to).distance))
        .filter(|&(_, d)| d <= tolerance)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(id, _)| id)
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct LinkDrag {
    origin: AnchorRef,
    origin_point: Point,
    cursor: Point,
    target: Option<(AnchorRef, Point)>,
}

/// Rubber-band line shown while dragging a relationship.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinkPreview {
    pub from: Point,
    pub to: Point,
    /// The free end is snapped onto an anchor.
    pub snapped: bool,
}

#[derive(Default)]
pub struct RelationshipLinker {
    connection_type: RelationshipType,
    drag: Option<LinkDrag>,
}

impl RelationshipLinker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connection_type(&self) -> RelationshipType {
        self.connection_type
    }

    /// Relationship kind used for the next completed drag.
    pub fn set_connection_type(&mut self, relationship_type: RelationshipType) {
        self.connection_type = relationship_type;
    }

    /// Anchor under a screen position, if any. The engine asks this before
    /// routing a press to the active tool.
    pub fn anchor_under(&self, screen: Point, ctx: &ToolContext) -> Option<(AnchorRef, Point)> {
        nearest_anchor(
            ctx.store.territories(),
            ctx.to_content(screen),
            ctx.screen_radius(ctx.config.anchor_hit_radius),
            ctx.config.anchor_offset,
        )
    }

    pub fn preview(&self) -> Option<LinkPreview> {
        self.drag.map(|d| LinkPreview {
            from: d.origin_point,
            to: d.target.map_or(d.cursor, |(_, at)| at),
            snapped: d.target.is_some(),
        })
    }

    /// Highlighted marker on the gravity-snapped target anchor.
    pub fn indicators(&self) -> Vec<SnapIndicator> {
        self.drag
            .and_then(|d| d.target)
            .map(|(anchor, at)| SnapIndicator {
                id: format!("anchor-{}-{}", anchor.table, anchor.row),
                kind: SnapIndicatorKind::Point,
                geometry: IndicatorGeometry::Point { at },
                style: IndicatorStyle::Highlight,
                label: None,
            })
            .into_iter()
            .collect()
    }

    fn pointer_down(&mut self, input: &PointerInput, ctx: &ToolContext) -> Vec<StoreCommand> {
        if let Some((origin, origin_point)) = self.anchor_under(input.position, ctx) {
            log::debug!("link: start at {} row {}", origin.table, origin.row);
            self.drag = Some(LinkDrag {
                origin,
                origin_point,
                cursor: origin_point,
                target: None,
            });
        }
        vec![]
    }

    fn pointer_move(&mut self, input: &PointerInput, ctx: &ToolContext) -> Vec<StoreCommand> {
        if let Some(drag) = self.drag.as_mut() {
            let p = ctx.to_content(input.position);
            drag.cursor = p;
            drag.target = nearest_anchor(
                ctx.store.territories(),
                p,
                ctx.screen_radius(ctx.config.anchor_snap_radius),
                ctx.config.anchor_offset,
            );
        }
        vec![]
    }

    fn pointer_up(&mut self, input: &PointerInput) -> Vec<StoreCommand> {
        let Some(drag) = self.drag.take() else {
            return vec![];
        };
        // The dot under the pointer only stands in when gravity found nothing.
        let target = match drag.target {
            Some((anchor, _)) => Some(anchor),
            None => input.over_anchor,
        }
        .filter(|&anchor| anchor != drag.origin);
        match target {
            Some(to) => {
                log::debug!("link: {} → {}", drag.origin.table, to.table);
                vec![StoreCommand::AddRelationship(Relationship::between(
                    drag.origin,
                    to,
                    self.connection_type,
                ))]
            }
            None => {
                log::debug!("link: discarded");
                vec![]
            }
        }
    }
}

impl Tool for RelationshipLinker {
    fn handle(&mut self, event: &InputEvent, ctx: &ToolContext) -> Vec<StoreCommand> {
        match event {
            InputEvent::PointerDown(input) => self.pointer_down(input, ctx),
            InputEvent::PointerMove(input) => self.pointer_move(input, ctx),
            InputEvent::PointerUp(input) => self.pointer_up(input),
            _ => vec![],
        }
    }

    fn is_active(&self) -> bool {
        self.drag.is_some()
    }

    fn cancel(&mut self) {
        self.drag = None;
    }
}
