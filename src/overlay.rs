//! Loads a landmark's outline onto a map surface.
//!
//! The loader moves through `Uninitialized -> StyleReady -> OverlayAttached`.
//! Each transition consumes the loader, and the first one consumes the map's
//! [`StyleLoaded`] event, so attaching before the style exists (or twice) does
//! not type-check.
//!
//! ```compile_fail
//! use landmarks::data::GeometryShape;
//! use landmarks::map::MapSurface;
//! use landmarks::overlay::{OverlayLoader, Uninitialized};
//!
//! fn attach_early(loader: OverlayLoader<Uninitialized>, map: &mut MapSurface, shape: GeometryShape) {
//!     let _ = loader.attach_overlay(map, shape);
//! }
//! ```
//!
//! The map surface itself stays on its owning thread:
//!
//! ```compile_fail
//! use landmarks::map::MapSurface;
//!
//! fn send_to_worker(map: MapSurface) {
//!     std::thread::spawn(move || drop(map));
//! }
//! ```

use std::time::Duration;

use log::{error, info, warn};

use crate::bundle::{ResourceBundle, GEOJSON_EXTENSION};
use crate::color::Color;
use crate::data::{Coordinate, CoordinateBounds, GeometryShape, LandmarkRecord};
use crate::dispatch::{Completion, Dispatcher};
use crate::errors::{Error, Result};
use crate::icon::Icon;
use crate::map::camera::EdgePadding;
use crate::map::style::{FillLayer, Layer, ShapeSource, SourceData, SymbolLayer};
use crate::map::{MapId, MapSurface, StyleLoaded};

pub const POLYGON_SOURCE_ID: &str = "polygon";
pub const POLYGON_LAYER_ID: &str = "polygon";
pub const MARKER_SOURCE_ID: &str = "marker-source";
pub const MARKER_LAYER_ID: &str = "marker-style";
pub const MARKER_IMAGE_NAME: &str = "landmark-symbol";
pub const MARKER_ICON_ASSET: &str = "landmark-icon";

pub const PARK_FILL_COLOR: Color = Color::from_rgb(0x801A86, 0.3);
pub const PARK_OUTLINE_COLOR: Color = Color::from_rgb(0x4E0250, 0.8);

pub const CAMERA_EDGE_PADDING: EdgePadding = EdgePadding::uniform(10.0);
pub const CAMERA_FLY_DURATION: Duration = Duration::from_millis(250);
pub const CAMERA_DIRECTION: f64 = 0.0;

/// What one loader draws: a shape file from the bundle and a marker position.
#[derive(Debug, Clone)]
pub struct OverlayBinding {
    pub bundle: ResourceBundle,
    pub shape_name: String,
    pub coordinate: Coordinate,
}

impl OverlayBinding {
    pub fn for_landmark(record: &LandmarkRecord, bundle: ResourceBundle) -> Self {
        OverlayBinding {
            bundle,
            shape_name: record.shape_name.clone(),
            coordinate: record.coordinate,
        }
    }
}

/// Reads `<shape_reference>.geojson` from the bundle and parses it.
pub fn load_geometry(bundle: &ResourceBundle, shape_reference: &str) -> Result<GeometryShape> {
    let bytes = bundle.read_resource(shape_reference, GEOJSON_EXTENSION)?;
    GeometryShape::from_slice(&bytes).map_err(|err| {
        Error::new(err.kind, format!("{}.{}: {}", shape_reference, GEOJSON_EXTENSION, err.message))
    })
}

/// Ids of everything one overlay added to a style.
#[derive(Debug, Clone, PartialEq)]
pub struct MapOverlay {
    pub polygon_source: String,
    pub fill_layer: String,
    pub marker_source: String,
    pub marker_layer: String,
    pub marker_image: Option<String>,
    pub bounds: CoordinateBounds,
}

pub struct Uninitialized;

pub struct StyleReady {
    map_id: MapId,
    pending: Completion<Result<GeometryShape>>,
}

pub struct OverlayAttached {
    map_id: MapId,
    overlay: MapOverlay,
}

pub struct OverlayLoader<S> {
    binding: OverlayBinding,
    state: S,
}

/// Outcome of polling a loader that is waiting for its geometry.
pub enum Progress {
    Pending(OverlayLoader<StyleReady>),
    Attached(OverlayLoader<OverlayAttached>),
}

impl<S> OverlayLoader<S> {
    pub fn binding(&self) -> &OverlayBinding {
        &self.binding
    }
}

impl OverlayLoader<Uninitialized> {
    pub fn new(binding: OverlayBinding) -> Self {
        OverlayLoader {
            binding,
            state: Uninitialized,
        }
    }

    /// Starts reading the shape file on the worker pool.
    pub fn on_style_ready(self, event: StyleLoaded, dispatcher: &Dispatcher) -> OverlayLoader<StyleReady> {
        info!(map_id = event.map_id().as_u64(), shape = self.binding.shape_name.as_str(); "Style ready, loading geometry");

        let bundle = self.binding.bundle.clone();
        let shape_name = self.binding.shape_name.clone();
        let pending = dispatcher.submit(move || load_geometry(&bundle, &shape_name));

        OverlayLoader {
            binding: self.binding,
            state: StyleReady {
                map_id: event.map_id(),
                pending,
            },
        }
    }
}

impl OverlayLoader<StyleReady> {
    /// Blocks the owning thread until the geometry arrives, then attaches it.
    pub fn finish(self, map: &mut MapSurface) -> Result<OverlayLoader<OverlayAttached>> {
        let shape = self.state.pending.wait().and_then(|loaded| loaded);
        match shape {
            Ok(shape) => self.attach_overlay(map, shape),
            Err(err) => {
                error!(shape = self.binding.shape_name.as_str(), err = err.message.as_str(); "Geometry load failed with error");
                Err(err)
            },
        }
    }

    /// Attaches the geometry if it has arrived, without blocking.
    pub fn try_finish(self, map: &mut MapSurface) -> Result<Progress> {
        match self.state.pending.try_take() {
            None => Ok(Progress::Pending(self)),
            Some(loaded) => {
                let shape = loaded.and_then(|shape| shape).map_err(|err| {
                    error!(shape = self.binding.shape_name.as_str(), err = err.message.as_str(); "Geometry load failed with error");
                    err
                })?;
                Ok(Progress::Attached(self.attach_overlay(map, shape)?))
            },
        }
    }

    /// Adds the fill layer, then the marker layer, then flies the camera to
    /// frame the shape. Must run on the thread that owns `map`.
    pub fn attach_overlay(self, map: &mut MapSurface, shape: GeometryShape) -> Result<OverlayLoader<OverlayAttached>> {
        if map.id() != self.state.map_id {
            return Err(Error::style("overlay belongs to a different map surface"));
        }
        let bounds = shape.bounds();
        let camera = map.camera_that_fits_bounds(&bounds, CAMERA_DIRECTION, &CAMERA_EDGE_PADDING)?;
        let marker_image = load_marker_icon(&self.binding.bundle);

        let style = map.style_mut().ok_or_else(|| Error::style("map has no loaded style"))?;
        // Nothing is added unless every id is free.
        for id in [POLYGON_SOURCE_ID, MARKER_SOURCE_ID] {
            if style.source(id).is_some() {
                return Err(Error::style(format!("source '{}' already exists", id)));
            }
        }
        for id in [POLYGON_LAYER_ID, MARKER_LAYER_ID] {
            if style.layer(id).is_some() {
                return Err(Error::style(format!("layer '{}' already exists", id)));
            }
        }

        style.add_source(ShapeSource::new(POLYGON_SOURCE_ID, SourceData::Shape(shape)))?;
        style.add_layer(Layer::Fill(FillLayer {
            id: POLYGON_LAYER_ID.to_string(),
            source: POLYGON_SOURCE_ID.to_string(),
            fill_color: PARK_FILL_COLOR,
            outline_color: Some(PARK_OUTLINE_COLOR),
        }))?;

        let marker_image = marker_image.map(|icon| {
            style.set_image(MARKER_IMAGE_NAME, icon);
            MARKER_IMAGE_NAME.to_string()
        });
        style.add_source(ShapeSource::new(MARKER_SOURCE_ID, SourceData::Point(self.binding.coordinate)))?;
        style.add_layer(Layer::Symbol(SymbolLayer {
            id: MARKER_LAYER_ID.to_string(),
            source: MARKER_SOURCE_ID.to_string(),
            icon_image: MARKER_IMAGE_NAME.to_string(),
        }))?;

        map.fly_to(camera, CAMERA_FLY_DURATION);

        info!(
            shape = self.binding.shape_name.as_str(),
            zoom = camera.zoom,
            latitude = camera.center.latitude,
            longitude = camera.center.longitude;
            "Overlay attached"
        );

        Ok(OverlayLoader {
            binding: self.binding,
            state: OverlayAttached {
                map_id: self.state.map_id,
                overlay: MapOverlay {
                    polygon_source: POLYGON_SOURCE_ID.to_string(),
                    fill_layer: POLYGON_LAYER_ID.to_string(),
                    marker_source: MARKER_SOURCE_ID.to_string(),
                    marker_layer: MARKER_LAYER_ID.to_string(),
                    marker_image,
                    bounds,
                },
            },
        })
    }
}

impl OverlayLoader<OverlayAttached> {
    pub fn overlay(&self) -> &MapOverlay {
        &self.state.overlay
    }

    /// Removes the overlay's layers, sources and icon from the map.
    pub fn tear_down(self, map: &mut MapSurface) -> Result<()> {
        if map.id() != self.state.map_id {
            return Err(Error::style("overlay belongs to a different map surface"));
        }
        let overlay = self.state.overlay;
        let style = map.style_mut().ok_or_else(|| Error::style("map has no loaded style"))?;

        let own_layers = [overlay.marker_layer.as_str(), overlay.fill_layer.as_str()];
        let own_sources = [overlay.marker_source.as_str(), overlay.polygon_source.as_str()];
        if let Some(layer) = style
            .layers()
            .iter()
            .find(|layer| !own_layers.contains(&layer.id()) && own_sources.contains(&layer.source()))
        {
            return Err(Error::style(format!(
                "source '{}' is still used by layer '{}'",
                layer.source(),
                layer.id()
            )));
        }

        style.remove_layer(&overlay.marker_layer);
        style.remove_layer(&overlay.fill_layer);
        style.remove_source(&overlay.marker_source)?;
        style.remove_source(&overlay.polygon_source)?;
        if let Some(image) = &overlay.marker_image {
            style.remove_image(image);
        }
        info!(shape = self.binding.shape_name.as_str(); "Overlay removed");
        Ok(())
    }
}

/// A missing or unreadable icon leaves the marker layer without an image.
fn load_marker_icon(bundle: &ResourceBundle) -> Option<Icon> {
    let Some(path) = bundle.image_path(MARKER_ICON_ASSET) else {
        warn!(asset = MARKER_ICON_ASSET; "Marker icon not found in bundle");
        return None;
    };
    match Icon::load(&path) {
        Ok(icon) => Some(icon),
        Err(err) => {
            warn!(asset = MARKER_ICON_ASSET, err = err.message.as_str(); "Marker icon could not be decoded");
            None
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use crate::map::camera::Viewport;
    use crate::map::style::Style;
    use crate::map::{MapOptions, DEFAULT_STYLE_URL_TEMPLATE};
    use std::fs;

    const SQUARE: &str = r#"{"type": "Feature", "properties": {}, "geometry": {
        "type": "Polygon",
        "coordinates": [[[10.0, 45.0], [10.2, 45.0], [10.2, 45.2], [10.0, 45.2], [10.0, 45.0]]]
    }}"#;

    fn bundle_with(files: &[(&str, &str)]) -> (tempfile::TempDir, ResourceBundle) {
        let dir = tempfile::tempdir().unwrap();
        for (name, contents) in files {
            fs::write(dir.path().join(name), contents).unwrap();
        }
        let bundle = ResourceBundle::open(dir.path()).unwrap();
        (dir, bundle)
    }

    fn map() -> MapSurface {
        MapSurface::new(&MapOptions {
            api_key: Some("test-key".into()),
            style_url_template: DEFAULT_STYLE_URL_TEMPLATE.into(),
            viewport: Viewport::new(320.0, 240.0),
        }).unwrap()
    }

    #[test]
    fn overlay_constants_are_fixed() {
        assert_eq!(PARK_FILL_COLOR, Color { red: 0x80, green: 0x1A, blue: 0x86, alpha: 0.3 });
        assert_eq!(PARK_OUTLINE_COLOR, Color { red: 0x4E, green: 0x02, blue: 0x50, alpha: 0.8 });
        assert_eq!(CAMERA_FLY_DURATION.as_secs_f64(), 0.25);
        assert_eq!(CAMERA_EDGE_PADDING, EdgePadding::uniform(10.0));
    }

    #[test]
    fn load_geometry_reads_bundled_shape() {
        let (_dir, bundle) = bundle_with(&[("square.geojson", SQUARE)]);
        let shape = load_geometry(&bundle, "square").unwrap();
        assert!(!shape.bounds().is_empty());
    }

    #[test]
    fn load_geometry_reports_missing_shape() {
        let (_dir, bundle) = bundle_with(&[]);
        let err = load_geometry(&bundle, "nowhere").unwrap_err();
        assert_eq!(err.kind, ErrorKind::ResourceNotFound);
    }

    #[test]
    fn load_geometry_reports_malformed_shape() {
        let (_dir, bundle) = bundle_with(&[("broken.geojson", "{\"type\": \"Polygon\"")]);
        let err = load_geometry(&bundle, "broken").unwrap_err();
        assert_eq!(err.kind, ErrorKind::ResourceLoad);
        assert!(err.message.starts_with("broken.geojson"));
    }

    #[test]
    fn attaches_fill_then_marker_and_flies() {
        let (_dir, bundle) = bundle_with(&[("square.geojson", SQUARE)]);
        let dispatcher = Dispatcher::new(1).unwrap();
        let mut map = map();

        let loader = OverlayLoader::new(OverlayBinding {
            bundle,
            shape_name: "square".into(),
            coordinate: Coordinate::new(45.1, 10.1),
        });
        let ready = map.load_base_style().unwrap();
        let loader = loader.on_style_ready(ready, &dispatcher).finish(&mut map).unwrap();

        let style = map.style().unwrap();
        let ids: Vec<&str> = style.layers().iter().map(|layer| layer.id()).collect();
        assert_eq!(ids, vec![POLYGON_LAYER_ID, MARKER_LAYER_ID]);
        assert!(matches!(style.layers()[0], Layer::Fill(ref fill) if fill.fill_color == PARK_FILL_COLOR));
        // No icon in this bundle; the layer is still added.
        assert_eq!(loader.overlay().marker_image, None);

        assert!(map.is_flying());
        assert!(map.target_camera().zoom > 0.0);
    }

    #[test]
    fn missing_geometry_fails_finish() {
        let (_dir, bundle) = bundle_with(&[]);
        let dispatcher = Dispatcher::new(1).unwrap();
        let mut map = map();

        let loader = OverlayLoader::new(OverlayBinding {
            bundle,
            shape_name: "nowhere".into(),
            coordinate: Coordinate::new(0.0, 0.0),
        });
        let ready = map.load_base_style().unwrap();
        let err = loader.on_style_ready(ready, &dispatcher).finish(&mut map).err().unwrap();

        assert_eq!(err.kind, ErrorKind::ResourceNotFound);
        assert!(map.style().unwrap().layers().is_empty());
    }

    #[test]
    fn event_from_another_map_is_rejected() {
        let (_dir, bundle) = bundle_with(&[("square.geojson", SQUARE)]);
        let dispatcher = Dispatcher::new(1).unwrap();
        let mut first = map();
        let mut second = map();

        let ready = first.load_base_style().unwrap();
        second.finish_loading_style(Style::new("outdoor")).unwrap();

        let loader = OverlayLoader::new(OverlayBinding {
            bundle,
            shape_name: "square".into(),
            coordinate: Coordinate::new(45.1, 10.1),
        });
        let err = loader.on_style_ready(ready, &dispatcher).finish(&mut second).err().unwrap();
        assert_eq!(err.kind, ErrorKind::Style);
    }

    #[test]
    fn try_finish_polls_until_attached() {
        let (_dir, bundle) = bundle_with(&[("square.geojson", SQUARE)]);
        let dispatcher = Dispatcher::new(1).unwrap();
        let mut map = map();

        let ready = map.load_base_style().unwrap();
        let mut loader = OverlayLoader::new(OverlayBinding {
            bundle,
            shape_name: "square".into(),
            coordinate: Coordinate::new(45.1, 10.1),
        }).on_style_ready(ready, &dispatcher);

        let attached = loop {
            match loader.try_finish(&mut map).unwrap() {
                Progress::Pending(waiting) => {
                    loader = waiting;
                    std::thread::yield_now();
                },
                Progress::Attached(attached) => break attached,
            }
        };
        assert_eq!(map.style().unwrap().layers().len(), 2);

        attached.tear_down(&mut map).unwrap();
        let style = map.style().unwrap();
        assert!(style.layers().is_empty());
        assert!(style.sources().is_empty());
    }

    #[test]
    fn taken_marker_source_rejects_attach_without_changes() {
        let (_dir, bundle) = bundle_with(&[("square.geojson", SQUARE)]);
        let dispatcher = Dispatcher::new(1).unwrap();
        let mut map = map();

        let ready = map.load_base_style().unwrap();
        map.style_mut()
            .unwrap()
            .add_source(ShapeSource::new(MARKER_SOURCE_ID, SourceData::Point(Coordinate::new(0.0, 0.0))))
            .unwrap();

        let err = OverlayLoader::new(OverlayBinding {
            bundle,
            shape_name: "square".into(),
            coordinate: Coordinate::new(45.1, 10.1),
        })
        .on_style_ready(ready, &dispatcher)
        .finish(&mut map)
        .err()
        .unwrap();

        assert_eq!(err.kind, ErrorKind::Style);
        let style = map.style().unwrap();
        assert!(style.layers().is_empty());
        assert_eq!(style.sources().len(), 1);
        assert!(!map.is_flying());
    }

    #[test]
    fn tear_down_refuses_while_another_layer_uses_overlay_source() {
        let (_dir, bundle) = bundle_with(&[("square.geojson", SQUARE)]);
        let dispatcher = Dispatcher::new(1).unwrap();
        let mut map = map();

        let ready = map.load_base_style().unwrap();
        let attached = OverlayLoader::new(OverlayBinding {
            bundle,
            shape_name: "square".into(),
            coordinate: Coordinate::new(45.1, 10.1),
        })
        .on_style_ready(ready, &dispatcher)
        .finish(&mut map)
        .unwrap();
        map.style_mut()
            .unwrap()
            .add_layer(Layer::Symbol(SymbolLayer {
                id: "labels".into(),
                source: MARKER_SOURCE_ID.into(),
                icon_image: "dot".into(),
            }))
            .unwrap();

        let err = attached.tear_down(&mut map).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Style);

        let style = map.style().unwrap();
        let ids: Vec<&str> = style.layers().iter().map(|layer| layer.id()).collect();
        assert_eq!(ids, vec![POLYGON_LAYER_ID, MARKER_LAYER_ID, "labels"]);
        assert_eq!(style.sources().len(), 2);
    }
}
