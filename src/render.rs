use std::path::Path;

use log::{info, warn};
use raqote::{BlendMode, DrawOptions, DrawTarget, Image, LineCap, LineJoin, PathBuilder, StrokeStyle, Winding};

use crate::color::Color;
use crate::data::{Coordinate, ShapePart};
use crate::errors::{Error, Result};
use crate::map::camera::{Camera, Viewport};
use crate::map::style::{FillLayer, Layer, SourceData, Style, SymbolLayer};
use crate::map::MapSurface;

const OUTLINE_WIDTH: f32 = 1.5;
const LINE_WIDTH: f32 = 3.0;
const ICON_SIZE: f32 = 32.0;

/// Rasterizes a map surface's style at its current camera. Base tiles are not
/// fetched; the background is a flat color.
pub struct MapRenderer {
    background: Color,
}

impl MapRenderer {
    pub fn new(background: Color) -> Self {
        MapRenderer { background }
    }

    fn stroke(width: f32) -> StrokeStyle {
        StrokeStyle {
            cap: LineCap::Round,
            join: LineJoin::Round,
            width,
            miter_limit: 2.0,
            dash_array: Vec::new(),
            dash_offset: 0.0,
        }
    }

    fn project(camera: &Camera, viewport: &Viewport, coordinate: &Coordinate) -> (f32, f32) {
        let point = camera.project(coordinate, viewport);
        (point.x as f32, point.y as f32)
    }

    fn trace(pb: &mut PathBuilder, camera: &Camera, viewport: &Viewport, coordinates: &[Coordinate]) {
        let Some((first, rest)) = coordinates.split_first() else {
            return;
        };
        let (x0, y0) = Self::project(camera, viewport, first);
        pb.move_to(x0, y0);
        for coordinate in rest {
            let (x, y) = Self::project(camera, viewport, coordinate);
            pb.line_to(x, y);
        }
    }

    fn draw_fill_layer(&self, dt: &mut DrawTarget, map: &MapSurface, style: &Style, layer: &FillLayer) {
        let Some(source) = style.source(&layer.source) else {
            return;
        };
        let SourceData::Shape(shape) = &source.data else {
            return;
        };
        let camera = map.camera();
        let viewport = map.viewport();
        let draw_options = DrawOptions::new();

        for part in shape.parts() {
            match part {
                ShapePart::Polygon(rings) => {
                    let mut pb = PathBuilder::new();
                    for ring in rings {
                        Self::trace(&mut pb, &camera, &viewport, ring);
                        pb.close();
                    }
                    let mut path = pb.finish();
                    path.winding = Winding::EvenOdd;

                    dt.fill(&path, &layer.fill_color.to_source(), &draw_options);
                    if let Some(outline) = &layer.outline_color {
                        dt.stroke(&path, &outline.to_source(), &Self::stroke(OUTLINE_WIDTH), &draw_options);
                    }
                },
                ShapePart::Line(line) => {
                    if line.len() < 2 {
                        continue;
                    }
                    let mut pb = PathBuilder::new();
                    Self::trace(&mut pb, &camera, &viewport, line);
                    let path = pb.finish();
                    let color = layer.outline_color.unwrap_or(layer.fill_color);
                    dt.stroke(&path, &color.to_source(), &Self::stroke(LINE_WIDTH), &draw_options);
                },
            }
        }
    }

    fn draw_symbol_layer(&self, dt: &mut DrawTarget, map: &MapSurface, style: &Style, layer: &SymbolLayer) {
        let Some(source) = style.source(&layer.source) else {
            return;
        };
        let SourceData::Point(coordinate) = &source.data else {
            return;
        };
        let Some(icon) = style.image(&layer.icon_image) else {
            warn!(layer = layer.id.as_str(), image = layer.icon_image.as_str(); "Symbol image missing from style");
            return;
        };

        let (x_center, y_center) = Self::project(&map.camera(), &map.viewport(), coordinate);

        let img = Image {
            width: icon.width,
            height: icon.height,
            data: &icon.data,
        };

        let mut draw_options = DrawOptions::new();
        draw_options.blend_mode = BlendMode::SrcOver;

        dt.draw_image_with_size_at(
            ICON_SIZE,
            ICON_SIZE,
            x_center - ICON_SIZE / 2.0,
            y_center - ICON_SIZE / 2.0,
            &img,
            &draw_options,
        );
    }

    pub fn render(&self, map: &MapSurface) -> Result<DrawTarget> {
        let viewport = map.viewport();
        let mut dt = DrawTarget::new(
            viewport.width.round() as i32,
            viewport.height.round() as i32,
        );
        dt.clear(self.background.to_solid_source());

        let Some(style) = map.style() else {
            return Ok(dt);
        };
        for layer in style.layers() {
            match layer {
                Layer::Fill(fill) => self.draw_fill_layer(&mut dt, map, style, fill),
                Layer::Symbol(symbol) => self.draw_symbol_layer(&mut dt, map, style, symbol),
            }
        }
        Ok(dt)
    }

    pub fn write_png(&self, map: &MapSurface, path: &Path) -> Result<()> {
        let dt = self.render(map)?;
        dt.write_png(path).map_err(|err| {
            Error::render(format!("couldn't write {}: {}", path.display(), err))
        })?;
        let written = path.display().to_string();
        info!(path = written.as_str(); "Map image written");
        Ok(())
    }
}
