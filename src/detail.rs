use std::fs::{create_dir_all, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use log::info;

use crate::bundle::ResourceBundle;
use crate::data::LandmarkRecord;
use crate::dispatch::Dispatcher;
use crate::errors::{Error, Result};
use crate::map::{MapOptions, MapSurface};
use crate::overlay::{OverlayAttached, OverlayBinding, OverlayLoader};
use crate::render::MapRenderer;

/// Detail screen for one landmark: its own map surface with the landmark's
/// overlay attached.
pub struct LandmarkDetail {
    record: LandmarkRecord,
    map: MapSurface,
    loader: OverlayLoader<OverlayAttached>,
}

impl LandmarkDetail {
    /// Builds the map, waits for the overlay and lets the camera flight finish.
    pub fn open(
        record: &LandmarkRecord,
        options: &MapOptions,
        bundle: &ResourceBundle,
        dispatcher: &Dispatcher,
    ) -> Result<Self> {
        info!(landmark = record.id, name = record.name.as_str(); "Opening landmark detail");

        let mut map = MapSurface::new(options)?;
        let loader = OverlayLoader::new(OverlayBinding::for_landmark(record, bundle.clone()));

        let style_loaded = map
            .load_base_style()
            .ok_or_else(|| Error::style("new map surface already had a style"))?;
        let loader = loader
            .on_style_ready(style_loaded, dispatcher)
            .finish(&mut map)?;
        map.settle();

        Ok(LandmarkDetail {
            record: record.clone(),
            map,
            loader,
        })
    }

    pub fn record(&self) -> &LandmarkRecord {
        &self.record
    }

    pub fn map(&self) -> &MapSurface {
        &self.map
    }

    pub fn loader(&self) -> &OverlayLoader<OverlayAttached> {
        &self.loader
    }

    fn file_stem(&self) -> String {
        format!("{}-{}", self.record.id, self.record.shape_name)
    }

    /// Writes `<id>-<shape>.png` and `<id>-<shape>.style.json` into `dir` and
    /// returns the image path.
    pub fn export(&self, renderer: &MapRenderer, dir: &Path) -> Result<PathBuf> {
        create_dir_all(dir).map_err(|err| {
            Error::render(format!("could not create {}: {}", dir.display(), err))
        })?;

        let image_path = dir.join(format!("{}.png", self.file_stem()));
        renderer.write_png(&self.map, &image_path)?;

        let style_path = dir.join(format!("{}.style.json", self.file_stem()));
        let style = self.map.style().ok_or_else(|| Error::style("map has no loaded style"))?;
        let file = File::create(&style_path).map_err(|err| {
            Error::render(format!("could not create {}: {}", style_path.display(), err))
        })?;
        serde_json::to_writer_pretty(BufWriter::new(file), &style.to_json()?)
            .map_err(|err| Error::render(err.to_string()))?;

        Ok(image_path)
    }

    /// Removes the overlay from the map as the view goes away.
    pub fn close(mut self) -> Result<()> {
        info!(landmark = self.record.id; "Closing landmark detail");
        self.loader.tear_down(&mut self.map)
    }
}
