//! Planar geometry predicates and great-circle distance
//!
//! Coordinates are WGS84 longitude/latitude in degrees. Spatial relations
//! are evaluated in the plane (as the index does for non-geodetic
//! shapes); distances use the haversine formula on a sphere.

use std::fmt;

/// Mean Earth radius (IUGG), used to convert angular distance to meters.
pub const EARTH_MEAN_RADIUS_METERS: f64 = 6_371_008.8;

const EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coord {
    pub lon: f64,
    pub lat: f64,
}

impl Coord {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    fn of(coords: &[Coord]) -> Self {
        let mut bbox = BoundingBox {
            min_lon: f64::INFINITY,
            min_lat: f64::INFINITY,
            max_lon: f64::NEG_INFINITY,
            max_lat: f64::NEG_INFINITY,
        };
        for c in coords {
            bbox.min_lon = bbox.min_lon.min(c.lon);
            bbox.min_lat = bbox.min_lat.min(c.lat);
            bbox.max_lon = bbox.max_lon.max(c.lon);
            bbox.max_lat = bbox.max_lat.max(c.lat);
        }
        bbox
    }

    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.min_lon <= other.max_lon + EPSILON
            && other.min_lon <= self.max_lon + EPSILON
            && self.min_lat <= other.max_lat + EPSILON
            && other.min_lat <= self.max_lat + EPSILON
    }

    fn ring(&self) -> Vec<Coord> {
        vec![
            Coord::new(self.min_lon, self.min_lat),
            Coord::new(self.max_lon, self.min_lat),
            Coord::new(self.max_lon, self.max_lat),
            Coord::new(self.min_lon, self.max_lat),
            Coord::new(self.min_lon, self.min_lat),
        ]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Point(Coord),
    MultiPoint(Vec<Coord>),
    LineString(Vec<Coord>),
    /// Exterior ring first, then holes. Rings are closed.
    Polygon(Vec<Vec<Coord>>),
    Envelope(BoundingBox),
}

impl Geometry {
    /// All vertices, exterior first.
    pub fn vertices(&self) -> Vec<Coord> {
        match self {
            Geometry::Point(c) => vec![*c],
            Geometry::MultiPoint(cs) | Geometry::LineString(cs) => cs.clone(),
            Geometry::Polygon(rings) => rings.iter().flatten().copied().collect(),
            Geometry::Envelope(bbox) => bbox.ring(),
        }
    }

    pub fn bbox(&self) -> BoundingBox {
        BoundingBox::of(&self.vertices())
    }

    pub fn as_point(&self) -> Option<Coord> {
        match self {
            Geometry::Point(c) => Some(*c),
            _ => None,
        }
    }

    /// Line segments forming the boundary (or path) of this geometry.
    fn segments(&self) -> Vec<(Coord, Coord)> {
        let pairs = |cs: &[Coord]| cs.windows(2).map(|w| (w[0], w[1])).collect::<Vec<_>>();
        match self {
            Geometry::Point(_) | Geometry::MultiPoint(_) => Vec::new(),
            Geometry::LineString(cs) => pairs(cs.as_slice()),
            Geometry::Polygon(rings) => rings.iter().flat_map(|r| pairs(r.as_slice())).collect(),
            Geometry::Envelope(bbox) => pairs(bbox.ring().as_slice()),
        }
    }

    /// Whether `c` lies inside or on this geometry.
    pub fn covers_coord(&self, c: Coord) -> bool {
        match self {
            Geometry::Point(p) => same(*p, c),
            Geometry::MultiPoint(ps) => ps.iter().any(|p| same(*p, c)),
            Geometry::LineString(_) => self.segments().iter().any(|(a, b)| on_segment(*a, *b, c)),
            Geometry::Polygon(rings) => {
                if self.segments().iter().any(|(a, b)| on_segment(*a, *b, c)) {
                    return true;
                }
                let Some((exterior, holes)) = rings.split_first() else {
                    return false;
                };
                ring_contains(exterior, c) && !holes.iter().any(|h| ring_contains(h, c))
            }
            Geometry::Envelope(bbox) => {
                c.lon >= bbox.min_lon - EPSILON
                    && c.lon <= bbox.max_lon + EPSILON
                    && c.lat >= bbox.min_lat - EPSILON
                    && c.lat <= bbox.max_lat + EPSILON
            }
        }
    }

    pub fn intersects(&self, other: &Geometry) -> bool {
        if !self.bbox().intersects(&other.bbox()) {
            return false;
        }
        if self.vertices().iter().any(|c| other.covers_coord(*c))
            || other.vertices().iter().any(|c| self.covers_coord(*c))
        {
            return true;
        }
        let theirs = other.segments();
        self.segments()
            .iter()
            .any(|(a, b)| theirs.iter().any(|(c, d)| segments_cross(*a, *b, *c, *d)))
    }

    /// Whether every part of this geometry lies inside `other`.
    ///
    /// Vertex containment plus no boundary crossing; sufficient for the
    /// simple shapes catalog records carry.
    pub fn is_within(&self, other: &Geometry) -> bool {
        if !self.vertices().iter().all(|c| other.covers_coord(*c)) {
            return false;
        }
        let theirs = other.segments();
        !self.segments().iter().any(|(a, b)| {
            theirs
                .iter()
                .any(|(c, d)| segments_cross_properly(*a, *b, *c, *d))
        })
    }

    pub fn contains(&self, other: &Geometry) -> bool {
        other.is_within(self)
    }

    /// Smallest great-circle angle in degrees from `from` to this geometry.
    pub fn distance_degrees(&self, from: Coord) -> f64 {
        if matches!(self, Geometry::Polygon(_) | Geometry::Envelope(_)) && self.covers_coord(from) {
            return 0.0;
        }
        let to_vertex = self
            .vertices()
            .into_iter()
            .map(|c| central_angle_degrees(from, c));
        let to_segment = self
            .segments()
            .into_iter()
            .map(|(a, b)| central_angle_degrees(from, closest_on_segment(from, a, b)));
        to_vertex.chain(to_segment).fold(f64::INFINITY, f64::min)
    }

    /// Canonical well-known text.
    pub fn to_wkt(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Geometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let list = |cs: &[Coord]| {
            cs.iter()
                .map(|c| format!("{} {}", c.lon, c.lat))
                .collect::<Vec<_>>()
                .join(", ")
        };
        match self {
            Geometry::Point(c) => write!(f, "POINT ({} {})", c.lon, c.lat),
            Geometry::MultiPoint(cs) => write!(f, "MULTIPOINT ({})", list(cs.as_slice())),
            Geometry::LineString(cs) => write!(f, "LINESTRING ({})", list(cs.as_slice())),
            Geometry::Polygon(rings) => {
                let rings: Vec<String> = rings.iter().map(|r| format!("({})", list(r.as_slice()))).collect();
                write!(f, "POLYGON ({})", rings.join(", "))
            }
            Geometry::Envelope(b) => write!(
                f,
                "ENVELOPE ({}, {}, {}, {})",
                b.min_lon, b.max_lon, b.max_lat, b.min_lat
            ),
        }
    }
}

/// Haversine central angle between two coordinates, in degrees.
pub fn central_angle_degrees(a: Coord, b: Coord) -> f64 {
    let (lat1, lat2) = (a.lat.to_radians(), b.lat.to_radians());
    let dlat = lat2 - lat1;
    let dlon = (b.lon - a.lon).to_radians();
    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    (2.0 * h.sqrt().min(1.0).asin()).to_degrees()
}

pub fn degrees_to_meters(degrees: f64) -> f64 {
    degrees.to_radians() * EARTH_MEAN_RADIUS_METERS
}

pub fn meters_to_degrees(meters: f64) -> f64 {
    (meters / EARTH_MEAN_RADIUS_METERS).to_degrees()
}

/// Point of segment `a`-`b` nearest to `p`, in a plane with longitude
/// scaled by the cosine of `p`'s latitude.
fn closest_on_segment(p: Coord, a: Coord, b: Coord) -> Coord {
    let k = p.lat.to_radians().cos();
    let (ax, ay) = ((a.lon - p.lon) * k, a.lat - p.lat);
    let (dx, dy) = ((b.lon - a.lon) * k, b.lat - a.lat);
    let len2 = dx * dx + dy * dy;
    if len2 < EPSILON * EPSILON {
        return a;
    }
    let t = (-(ax * dx + ay * dy) / len2).clamp(0.0, 1.0);
    Coord::new(a.lon + t * (b.lon - a.lon), a.lat + t * (b.lat - a.lat))
}

fn same(a: Coord, b: Coord) -> bool {
    (a.lon - b.lon).abs() < EPSILON && (a.lat - b.lat).abs() < EPSILON
}

fn cross(o: Coord, a: Coord, b: Coord) -> f64 {
    (a.lon - o.lon) * (b.lat - o.lat) - (a.lat - o.lat) * (b.lon - o.lon)
}

fn on_segment(a: Coord, b: Coord, c: Coord) -> bool {
    cross(a, b, c).abs() < EPSILON
        && c.lon >= a.lon.min(b.lon) - EPSILON
        && c.lon <= a.lon.max(b.lon) + EPSILON
        && c.lat >= a.lat.min(b.lat) - EPSILON
        && c.lat <= a.lat.max(b.lat) + EPSILON
}

fn segments_cross(a: Coord, b: Coord, c: Coord, d: Coord) -> bool {
    segments_cross_properly(a, b, c, d)
        || on_segment(a, b, c)
        || on_segment(a, b, d)
        || on_segment(c, d, a)
        || on_segment(c, d, b)
}

fn segments_cross_properly(a: Coord, b: Coord, c: Coord, d: Coord) -> bool {
    let d1 = cross(c, d, a);
    let d2 = cross(c, d, b);
    let d3 = cross(a, b, c);
    let d4 = cross(a, b, d);
    ((d1 > EPSILON && d2 < -EPSILON) || (d1 < -EPSILON && d2 > EPSILON))
        && ((d3 > EPSILON && d4 < -EPSILON) || (d3 < -EPSILON && d4 > EPSILON))
}

/// Even-odd ray casting.
fn ring_contains(ring: &[Coord], c: Coord) -> bool {
    let mut inside = false;
    for w in ring.windows(2) {
        let (a, b) = (w[0], w[1]);
        if (a.lat > c.lat) != (b.lat > c.lat) {
            let lon_at = a.lon + (c.lat - a.lat) / (b.lat - a.lat) * (b.lon - a.lon);
            if c.lon < lon_at {
                inside = !inside;
            }
        }
    }
    inside
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(min: f64, max: f64) -> Geometry {
        Geometry::Polygon(vec![vec![
            Coord::new(min, min),
            Coord::new(max, min),
            Coord::new(max, max),
            Coord::new(min, max),
            Coord::new(min, min),
        ]])
    }

    #[test]
    fn test_point_in_polygon() {
        let poly = square(0.0, 10.0);
        assert!(poly.covers_coord(Coord::new(5.0, 5.0)));
        assert!(poly.covers_coord(Coord::new(0.0, 5.0)));
        assert!(!poly.covers_coord(Coord::new(11.0, 5.0)));
    }

    #[test]
    fn test_polygon_hole_excludes() {
        let mut rings = match square(0.0, 10.0) {
            Geometry::Polygon(r) => r,
            _ => unreachable!(),
        };
        if let Geometry::Polygon(hole) = square(4.0, 6.0) {
            rings.extend(hole);
        }
        let donut = Geometry::Polygon(rings);
        assert!(!donut.covers_coord(Coord::new(5.0, 5.0)));
        assert!(donut.covers_coord(Coord::new(2.0, 2.0)));
    }

    #[test]
    fn test_crossing_lines_intersect() {
        let a = Geometry::LineString(vec![Coord::new(0.0, 0.0), Coord::new(10.0, 10.0)]);
        let b = Geometry::LineString(vec![Coord::new(0.0, 10.0), Coord::new(10.0, 0.0)]);
        assert!(a.intersects(&b));
        let c = Geometry::LineString(vec![Coord::new(20.0, 20.0), Coord::new(30.0, 30.0)]);
        assert!(!a.intersects(&c));
    }

    #[test]
    fn test_within_and_contains() {
        let small = square(2.0, 3.0);
        let big = square(0.0, 10.0);
        assert!(small.is_within(&big));
        assert!(big.contains(&small));
        assert!(!big.is_within(&small));
        let straddling = square(8.0, 12.0);
        assert!(!straddling.is_within(&big));
        assert!(straddling.intersects(&big));
    }

    #[test]
    fn test_one_degree_of_arc_in_meters() {
        let d = central_angle_degrees(Coord::new(0.0, 0.0), Coord::new(1.0, 0.0));
        assert!((d - 1.0).abs() < 1e-9);
        assert!((degrees_to_meters(d) - 111_195.08).abs() < 1.0);
        assert!((meters_to_degrees(degrees_to_meters(2.5)) - 2.5).abs() < 1e-9);
    }

    #[test]
    fn test_distance_to_polygon_is_zero_inside() {
        let poly = square(0.0, 10.0);
        assert_eq!(poly.distance_degrees(Coord::new(5.0, 5.0)), 0.0);
        assert!(poly.distance_degrees(Coord::new(-1.0, 0.0)) > 0.9);
    }

    #[test]
    fn test_distance_to_line_measures_between_vertices() {
        let line = Geometry::LineString(vec![Coord::new(-10.0, 0.0), Coord::new(10.0, 0.0)]);
        assert!(line.distance_degrees(Coord::new(0.0, 0.0)) < 1e-9);
        assert!((line.distance_degrees(Coord::new(0.0, 1.0)) - 1.0).abs() < 1e-6);
        assert!((line.distance_degrees(Coord::new(12.0, 0.0)) - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_distance_to_polygon_edge_from_outside() {
        let poly = square(0.0, 10.0);
        let d = poly.distance_degrees(Coord::new(5.0, -1.0));
        assert!((d - 1.0).abs() < 1e-6, "distance was {}", d);
    }
}
