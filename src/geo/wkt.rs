//! Well-known text parsing
//!
//! Supports POINT, MULTIPOINT, LINESTRING, POLYGON and the index's
//! ENVELOPE (minX, maxX, maxY, minY) rectangle syntax.

use super::errors::{GeoError, GeoResult};
use super::geometry::{BoundingBox, Coord, Geometry};

/// Parses a WKT string into a geometry.
pub fn parse_wkt(input: &str) -> GeoResult<Geometry> {
    let mut parser = Parser::new(input);
    let geometry = parser.geometry()?;
    parser.skip_ws();
    if !parser.at_end() {
        return Err(GeoError::malformed(input, "trailing characters"));
    }
    Ok(geometry)
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn skip_ws(&mut self) {
        let trimmed = self.rest().trim_start();
        self.pos = self.input.len() - trimmed.len();
    }

    fn error(&self, reason: impl Into<String>) -> GeoError {
        GeoError::malformed(self.input, reason)
    }

    fn keyword(&mut self) -> String {
        self.skip_ws();
        let len = self
            .rest()
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(self.rest().len());
        let word = self.rest()[..len].to_ascii_uppercase();
        self.pos += len;
        word
    }

    fn expect(&mut self, ch: char) -> GeoResult<()> {
        self.skip_ws();
        if self.rest().starts_with(ch) {
            self.pos += ch.len_utf8();
            Ok(())
        } else {
            Err(self.error(format!("expected '{}' at offset {}", ch, self.pos)))
        }
    }

    fn try_consume(&mut self, ch: char) -> bool {
        self.skip_ws();
        if self.rest().starts_with(ch) {
            self.pos += ch.len_utf8();
            true
        } else {
            false
        }
    }

    fn peek(&mut self, ch: char) -> bool {
        self.skip_ws();
        self.rest().starts_with(ch)
    }

    fn number(&mut self) -> GeoResult<f64> {
        self.skip_ws();
        let len = self
            .rest()
            .find(|c: char| !(c.is_ascii_digit() || matches!(c, '-' | '+' | '.' | 'e' | 'E')))
            .unwrap_or(self.rest().len());
        let token = &self.rest()[..len];
        let value = token
            .parse::<f64>()
            .map_err(|_| self.error(format!("invalid number '{}'", token)))?;
        if !value.is_finite() {
            return Err(self.error("non-finite coordinate"));
        }
        self.pos += len;
        Ok(value)
    }

    fn coord(&mut self) -> GeoResult<Coord> {
        let lon = self.number()?;
        let lat = self.number()?;
        if !(-180.0..=180.0).contains(&lon) || !(-90.0..=90.0).contains(&lat) {
            return Err(self.error(format!("coordinate ({} {}) out of range", lon, lat)));
        }
        Ok(Coord::new(lon, lat))
    }

    /// `(x y, x y, ...)`
    fn coord_list(&mut self) -> GeoResult<Vec<Coord>> {
        self.expect('(')?;
        let mut coords = vec![self.coord()?];
        while self.try_consume(',') {
            coords.push(self.coord()?);
        }
        self.expect(')')?;
        Ok(coords)
    }

    fn ring(&mut self) -> GeoResult<Vec<Coord>> {
        let ring = self.coord_list()?;
        if ring.len() < 4 {
            return Err(self.error("polygon ring needs at least four coordinates"));
        }
        if ring.first() != ring.last() {
            return Err(self.error("polygon ring is not closed"));
        }
        Ok(ring)
    }

    fn geometry(&mut self) -> GeoResult<Geometry> {
        let kind = self.keyword();
        match kind.as_str() {
            "POINT" => {
                self.expect('(')?;
                let c = self.coord()?;
                self.expect(')')?;
                Ok(Geometry::Point(c))
            }
            "MULTIPOINT" => {
                self.expect('(')?;
                let mut points = Vec::new();
                loop {
                    // Both `MULTIPOINT ((1 2), (3 4))` and `MULTIPOINT (1 2, 3 4)`
                    if self.peek('(') {
                        self.expect('(')?;
                        points.push(self.coord()?);
                        self.expect(')')?;
                    } else {
                        points.push(self.coord()?);
                    }
                    if !self.try_consume(',') {
                        break;
                    }
                }
                self.expect(')')?;
                Ok(Geometry::MultiPoint(points))
            }
            "LINESTRING" => {
                let coords = self.coord_list()?;
                if coords.len() < 2 {
                    return Err(self.error("linestring needs at least two coordinates"));
                }
                Ok(Geometry::LineString(coords))
            }
            "POLYGON" => {
                self.expect('(')?;
                let mut rings = vec![self.ring()?];
                while self.try_consume(',') {
                    rings.push(self.ring()?);
                }
                self.expect(')')?;
                Ok(Geometry::Polygon(rings))
            }
            "ENVELOPE" => {
                self.expect('(')?;
                let min_lon = self.number()?;
                self.expect(',')?;
                let max_lon = self.number()?;
                self.expect(',')?;
                let max_lat = self.number()?;
                self.expect(',')?;
                let min_lat = self.number()?;
                self.expect(')')?;
                if min_lon > max_lon || min_lat > max_lat {
                    return Err(self.error("envelope minimum exceeds maximum"));
                }
                Ok(Geometry::Envelope(BoundingBox {
                    min_lon,
                    min_lat,
                    max_lon,
                    max_lat,
                }))
            }
            "" => Err(self.error("missing geometry type")),
            other => Err(GeoError::unsupported(other)),
        }
    }
}
