//! Geometry support for spatial predicates and distance sorting

mod errors;
mod geometry;
mod wkt;

pub use errors::{GeoError, GeoResult};
pub use geometry::{
    central_angle_degrees, degrees_to_meters, meters_to_degrees, BoundingBox, Coord, Geometry,
    EARTH_MEAN_RADIUS_METERS,
};
pub use wkt::parse_wkt;
