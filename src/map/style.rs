use std::collections::HashMap;

use serde_json::{json, Value};

use crate::color::Color;
use crate::data::{Coordinate, GeometryShape};
use crate::errors::{Error, Result};
use crate::icon::Icon;

/// Geometry fed to one or more layers.
#[derive(Debug, Clone)]
pub enum SourceData {
    Shape(GeometryShape),
    Point(Coordinate),
}

#[derive(Debug, Clone)]
pub struct ShapeSource {
    pub id: String,
    pub data: SourceData,
}

impl ShapeSource {
    pub fn new(id: impl Into<String>, data: SourceData) -> Self {
        ShapeSource { id: id.into(), data }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FillLayer {
    pub id: String,
    pub source: String,
    pub fill_color: Color,
    pub outline_color: Option<Color>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SymbolLayer {
    pub id: String,
    pub source: String,
    pub icon_image: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Layer {
    Fill(FillLayer),
    Symbol(SymbolLayer),
}

impl Layer {
    pub fn id(&self) -> &str {
        match self {
            Layer::Fill(layer) => &layer.id,
            Layer::Symbol(layer) => &layer.id,
        }
    }

    pub fn source(&self) -> &str {
        match self {
            Layer::Fill(layer) => &layer.source,
            Layer::Symbol(layer) => &layer.source,
        }
    }
}

/// Sources, ordered layers and sprite images rendered by a map surface.
#[derive(Debug, Clone, Default)]
pub struct Style {
    name: String,
    sources: Vec<ShapeSource>,
    layers: Vec<Layer>,
    images: HashMap<String, Icon>,
}

impl Style {
    pub fn new(name: impl Into<String>) -> Self {
        Style {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn add_source(&mut self, source: ShapeSource) -> Result<()> {
        if self.source(&source.id).is_some() {
            return Err(Error::style(format!("source '{}' already exists", source.id)));
        }
        self.sources.push(source);
        Ok(())
    }

    /// Appends a layer on top of the existing ones.
    pub fn add_layer(&mut self, layer: Layer) -> Result<()> {
        if self.layer(layer.id()).is_some() {
            return Err(Error::style(format!("layer '{}' already exists", layer.id())));
        }
        if self.source(layer.source()).is_none() {
            return Err(Error::style(format!(
                "layer '{}' refers to unknown source '{}'",
                layer.id(),
                layer.source()
            )));
        }
        self.layers.push(layer);
        Ok(())
    }

    pub fn remove_layer(&mut self, id: &str) -> Option<Layer> {
        let index = self.layers.iter().position(|layer| layer.id() == id)?;
        Some(self.layers.remove(index))
    }

    /// Fails while any layer still draws from the source.
    pub fn remove_source(&mut self, id: &str) -> Result<Option<ShapeSource>> {
        if let Some(layer) = self.layers.iter().find(|layer| layer.source() == id) {
            return Err(Error::style(format!(
                "source '{}' is still used by layer '{}'",
                id,
                layer.id()
            )));
        }
        Ok(self
            .sources
            .iter()
            .position(|source| source.id == id)
            .map(|index| self.sources.remove(index)))
    }

    pub fn set_image(&mut self, name: impl Into<String>, icon: Icon) {
        self.images.insert(name.into(), icon);
    }

    pub fn remove_image(&mut self, name: &str) -> Option<Icon> {
        self.images.remove(name)
    }

    pub fn image(&self, name: &str) -> Option<&Icon> {
        self.images.get(name)
    }

    pub fn source(&self, id: &str) -> Option<&ShapeSource> {
        self.sources.iter().find(|source| source.id == id)
    }

    pub fn layer(&self, id: &str) -> Option<&Layer> {
        self.layers.iter().find(|layer| layer.id() == id)
    }

    /// Layers bottom to top.
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn sources(&self) -> &[ShapeSource] {
        &self.sources
    }

    /// Exports the style in MapLibre style-spec form with inline GeoJSON sources.
    pub fn to_json(&self) -> Result<Value> {
        let mut sources = serde_json::Map::new();
        for source in &self.sources {
            let data = match &source.data {
                SourceData::Shape(shape) => serde_json::to_value(shape.document())?,
                SourceData::Point(coordinate) => json!({
                    "type": "Feature",
                    "properties": {},
                    "geometry": { "type": "Point", "coordinates": coordinate.to_position() },
                }),
            };
            sources.insert(source.id.clone(), json!({ "type": "geojson", "data": data }));
        }

        let layers: Vec<Value> = self.layers.iter().map(|layer| match layer {
            Layer::Fill(fill) => {
                let mut paint = json!({ "fill-color": fill.fill_color.to_css() });
                if let Some(outline) = &fill.outline_color {
                    paint["fill-outline-color"] = json!(outline.to_css());
                }
                json!({ "id": fill.id, "type": "fill", "source": fill.source, "paint": paint })
            },
            Layer::Symbol(symbol) => json!({
                "id": symbol.id,
                "type": "symbol",
                "source": symbol.source,
                "layout": { "icon-image": symbol.icon_image },
            }),
        }).collect();

        Ok(json!({
            "version": 8,
            "name": self.name,
            "sources": sources,
            "layers": layers,
        }))
    }
}
