//! Exhibit catalog loaded from RON

use std::path::Path;

use exhibit_engine::prelude::*;
use serde::Deserialize;

use crate::TourError;

/// One exhibit in the tour
#[derive(Debug, Clone, Deserialize)]
pub struct ExhibitEntry {
    pub name: String,
    /// Model asset id; `None` shows the placeholder
    #[serde(default)]
    pub asset: Option<AssetId>,
    #[serde(default)]
    pub hotspots: Vec<MarkerSpec>,
    #[serde(default)]
    pub waypoints: Vec<MarkerSpec>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Catalog {
    pub exhibits: Vec<ExhibitEntry>,
}

impl Catalog {
    pub fn load(path: &Path) -> Result<Self, TourError> {
        let contents = std::fs::read_to_string(path)?;
        ron::from_str(&contents).map_err(|e| TourError::Catalog(e.to_string()))
    }

    /// Asset ids referenced by the catalog, in exhibit order
    pub fn asset_ids(&self) -> Vec<AssetId> {
        self.exhibits.iter().filter_map(|exhibit| exhibit.asset.clone()).collect()
    }
}
