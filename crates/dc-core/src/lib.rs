pub mod geometry;
pub mod hit;
pub mod id;
pub mod model;
pub mod path;
pub mod store;

pub use geometry::{
    SegmentProjection, clamp_to_bounds, closest_point_on_segment, point_in_polygon,
    point_in_territory,
};
pub use hit::{hit_test, territories_in_area};
pub use id::{RelationshipId, TerritoryId};
pub use model::*;
pub use path::{parse_path, path_to_polygon};
pub use store::{CanvasStore, DiagramStore, PlacementTemplate, StoreCommand, TerritoryPatch};
