use std::{fs::File, io::BufReader, path::{Path, PathBuf}};

use serde::Deserialize;

use crate::color::Color;
use crate::errors::{Error, Result};
use crate::map::camera::Viewport;
use crate::map::{MapOptions, DEFAULT_STYLE_URL_TEMPLATE};

fn default_style_url_template() -> String {
    DEFAULT_STYLE_URL_TEMPLATE.to_string()
}

fn default_width_px() -> u32 {
    750
}

fn default_height_px() -> u32 {
    600
}

fn default_background_color() -> Color {
    Color::from_rgb(0xF2EFE9, 1.0)
}

/// Application settings, read from a JSON file at startup.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub bundle_path: PathBuf,
    pub output_path: PathBuf,
    #[serde(default)]
    pub map_tiler_key: Option<String>,
    #[serde(default = "default_style_url_template")]
    pub style_url_template: String,
    #[serde(default = "default_width_px")]
    pub width_px: u32,
    #[serde(default = "default_height_px")]
    pub height_px: u32,
    #[serde(default = "default_background_color")]
    pub background_color: Color,
    /// 0 means one worker per core.
    #[serde(default)]
    pub worker_threads: usize,
}

impl AppConfig {
    /// Relative paths in the file are resolved against the file's directory.
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|err| {
            Error::configuration(format!("could not open config {}: {}", path.display(), err))
        })?;
        let mut config: AppConfig = serde_json::from_reader(BufReader::new(file)).map_err(|err| {
            Error::configuration(format!("could not parse config {}: {}", path.display(), err))
        })?;

        if let Some(base) = path.parent() {
            config.bundle_path = base.join(&config.bundle_path);
            config.output_path = base.join(&config.output_path);
        }
        Ok(config)
    }

    pub fn viewport(&self) -> Viewport {
        Viewport::new(f64::from(self.width_px), f64::from(self.height_px))
    }

    pub fn map_options(&self) -> MapOptions {
        MapOptions {
            api_key: self.map_tiler_key.clone(),
            style_url_template: self.style_url_template.clone(),
            viewport: self.viewport(),
        }
    }
}
