use std::{fs, path::{Path, PathBuf}};

use crate::errors::{Error, Result};

pub const GEOJSON_EXTENSION: &str = "geojson";
pub const IMAGE_EXTENSION: &str = "png";
const IMAGES_DIR: &str = "images";

/// Read-only directory of resources shipped with the application: landmark
/// data, geometry files and images, all addressed by name.
#[derive(Debug, Clone)]
pub struct ResourceBundle {
    root: PathBuf,
}

impl ResourceBundle {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(Error::configuration(format!(
                "resource bundle {} is not a directory",
                root.display()
            )));
        }
        Ok(ResourceBundle { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of `<name>.<extension>` if such a file exists in the bundle.
    pub fn resource_path(&self, name: &str, extension: &str) -> Option<PathBuf> {
        Self::path_in(&self.root, name, extension).filter(|path| path.is_file())
    }

    pub fn read_resource(&self, name: &str, extension: &str) -> Result<Vec<u8>> {
        let path = self.resource_path(name, extension).ok_or_else(|| {
            Error::resource_not_found(format!(
                "no resource named {}.{} in {}",
                name,
                extension,
                self.root.display()
            ))
        })?;
        let bytes = fs::read(&path).map_err(|err| {
            Error::resource_load(format!("could not read {}: {}", path.display(), err))
        })?;
        Ok(bytes)
    }

    pub fn image_path(&self, name: &str) -> Option<PathBuf> {
        Self::path_in(&self.root.join(IMAGES_DIR), name, IMAGE_EXTENSION)
            .filter(|path| path.is_file())
    }

    fn path_in(dir: &Path, name: &str, extension: &str) -> Option<PathBuf> {
        // Names are plain keys, never paths.
        if name.is_empty() || name.contains(['/', '\\']) || name == ".." {
            return None;
        }
        Some(dir.join(format!("{}.{}", name, extension)))
    }
}
