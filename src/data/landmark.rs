use log::info;
use serde::Deserialize;

use crate::bundle::ResourceBundle;
use crate::errors::{Error, Result};

use super::geo::Coordinate;

pub const LANDMARK_DATA_NAME: &str = "landmarkData";
const LANDMARK_DATA_EXTENSION: &str = "json";

pub type LandmarkId = u64;

/// One entry of the bundled landmark data. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LandmarkRecord {
    pub id: LandmarkId,
    pub name: String,
    pub park: String,
    pub state: String,
    #[serde(rename = "coordinates")]
    pub coordinate: Coordinate,
    pub image_name: String,
    pub shape_name: String,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_featured: bool,
}

/// Read-only collection of every landmark, loaded once from the bundle.
#[derive(Debug, Clone)]
pub struct LandmarkStore {
    records: Vec<LandmarkRecord>,
}

impl LandmarkStore {
    pub fn load(bundle: &ResourceBundle) -> Result<Self> {
        let bytes = bundle.read_resource(LANDMARK_DATA_NAME, LANDMARK_DATA_EXTENSION)?;
        let store = Self::from_slice(&bytes)?;
        info!(count = store.records.len(); "Loaded landmark data");
        Ok(store)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let records: Vec<LandmarkRecord> = serde_json::from_slice(bytes).map_err(|err| {
            Error::resource_load(format!("malformed landmark data: {}", err))
        })?;

        let mut ids: Vec<LandmarkId> = records.iter().map(|record| record.id).collect();
        ids.sort_unstable();
        if let Some(pair) = ids.windows(2).find(|pair| pair[0] == pair[1]) {
            return Err(Error::resource_load(format!("duplicate landmark id {}", pair[0])));
        }

        Ok(LandmarkStore { records })
    }

    /// All records in the order they appear in the data file.
    pub fn all(&self) -> &[LandmarkRecord] {
        &self.records
    }

    pub fn get(&self, id: LandmarkId) -> Option<&LandmarkRecord> {
        self.records.iter().find(|record| record.id == id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
