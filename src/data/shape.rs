use std::str;

use geojson::{GeoJson, Geometry, Value};

use crate::errors::{Error, Result};

use super::geo::{Coordinate, CoordinateBounds};

/// Drawable piece of a shape. Polygons keep their exterior ring first.
#[derive(Debug, Clone, PartialEq)]
pub enum ShapePart {
    Polygon(Vec<Vec<Coordinate>>),
    Line(Vec<Coordinate>),
}

impl ShapePart {
    pub fn coordinates(&self) -> Box<dyn Iterator<Item = &Coordinate> + '_> {
        match self {
            ShapePart::Polygon(rings) => Box::new(rings.iter().flatten()),
            ShapePart::Line(line) => Box::new(line.iter()),
        }
    }
}

/// Polygons and lines decoded from one GeoJSON document.
#[derive(Debug, Clone)]
pub struct GeometryShape {
    parts: Vec<ShapePart>,
    bounds: CoordinateBounds,
    document: GeoJson,
}

impl GeometryShape {
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let text = str::from_utf8(bytes)
            .map_err(|err| Error::resource_load(format!("geometry is not UTF-8: {}", err)))?;
        let document: GeoJson = text.parse()?;
        Self::from_geojson(document)
    }

    pub fn from_geojson(document: GeoJson) -> Result<Self> {
        let mut parts = Vec::new();
        match &document {
            GeoJson::Geometry(geometry) => collect_parts(geometry, &mut parts)?,
            GeoJson::Feature(feature) => {
                if let Some(geometry) = &feature.geometry {
                    collect_parts(geometry, &mut parts)?;
                }
            },
            GeoJson::FeatureCollection(collection) => {
                for geometry in collection.features.iter().filter_map(|f| f.geometry.as_ref()) {
                    collect_parts(geometry, &mut parts)?;
                }
            },
        }

        let bounds = CoordinateBounds::from_coordinates(parts.iter().flat_map(|p| p.coordinates()))
            .ok_or_else(|| Error::resource_load("geometry has no polygon or line coordinates"))?;

        Ok(GeometryShape { parts, bounds, document })
    }

    pub fn parts(&self) -> &[ShapePart] {
        &self.parts
    }

    pub fn bounds(&self) -> CoordinateBounds {
        self.bounds
    }

    /// The document as it was parsed, for re-export into style JSON.
    pub fn document(&self) -> &GeoJson {
        &self.document
    }

    pub fn coordinates(&self) -> impl Iterator<Item = &Coordinate> {
        self.parts.iter().flat_map(|part| part.coordinates())
    }
}

fn collect_parts(geometry: &Geometry, parts: &mut Vec<ShapePart>) -> Result<()> {
    match &geometry.value {
        Value::Polygon(rings) => parts.push(ShapePart::Polygon(convert_rings(rings)?)),
        Value::MultiPolygon(polygons) => {
            for rings in polygons {
                parts.push(ShapePart::Polygon(convert_rings(rings)?));
            }
        },
        Value::LineString(line) => parts.push(ShapePart::Line(convert_line(line)?)),
        Value::MultiLineString(lines) => {
            for line in lines {
                parts.push(ShapePart::Line(convert_line(line)?));
            }
        },
        Value::GeometryCollection(geometries) => {
            for geometry in geometries {
                collect_parts(geometry, parts)?;
            }
        },
        // Points carry no area to frame; the marker comes from the landmark itself.
        Value::Point(_) | Value::MultiPoint(_) => (),
    }
    Ok(())
}

fn convert_rings(rings: &[Vec<Vec<f64>>]) -> Result<Vec<Vec<Coordinate>>> {
    rings.iter().map(|ring| convert_line(ring)).collect()
}

fn convert_line(line: &[Vec<f64>]) -> Result<Vec<Coordinate>> {
    if line.is_empty() {
        return Err(Error::resource_load("geometry contains an empty ring or line"));
    }
    line.iter()
        .map(|position| {
            Coordinate::from_position(position).ok_or_else(|| {
                Error::resource_load(format!("invalid position {:?}", position))
            })
        })
        .collect()
}
