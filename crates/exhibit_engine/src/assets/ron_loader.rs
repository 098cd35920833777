//! RON model loader
//!
//! Resolves `<id>.ron` against an ordered list of search paths and parses
//! it into a [`Model`].

use std::fs;
use std::path::{Path, PathBuf};

use crate::assets::{AssetError, AssetId, Model, PrototypeLoader};

/// Loads [`Model`] prototypes from RON files
#[derive(Debug, Clone, Default)]
pub struct RonModelLoader {
    search_paths: Vec<PathBuf>,
}

impl RonModelLoader {
    /// File extension of model files
    pub const EXTENSION: &'static str = "ron";

    /// Create a loader searching the given directories in order
    pub fn new<I, P>(search_paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            search_paths: search_paths.into_iter().map(Into::into).collect(),
        }
    }

    /// Append a search directory
    pub fn add_search_path(&mut self, path: impl Into<PathBuf>) {
        self.search_paths.push(path.into());
    }

    /// Search directories in lookup order
    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    /// First existing file for `id`
    pub fn resolve(&self, id: &AssetId) -> Option<PathBuf> {
        let file_name = format!("{}.{}", id.as_str(), Self::EXTENSION);
        self.search_paths
            .iter()
            .map(|dir| dir.join(&file_name))
            .find(|candidate| candidate.is_file())
    }

    /// Parse a model file at an explicit path
    pub fn load_file(path: &Path, id: &AssetId) -> Result<Model, AssetError> {
        let contents = fs::read_to_string(path)?;
        ron::from_str(&contents).map_err(|e| AssetError::InvalidData {
            id: id.clone(),
            reason: e.to_string(),
        })
    }
}

impl PrototypeLoader for RonModelLoader {
    type Prototype = Model;

    fn load_prototype(&self, id: &AssetId) -> Result<Model, AssetError> {
        let path = self
            .resolve(id)
            .ok_or_else(|| AssetError::NotFound(id.clone()))?;
        let model = Self::load_file(&path, id)?;
        log::debug!("Loaded model '{}' ({} nodes) from {}", id, model.node_count(), path.display());
        Ok(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HULL_RON: &str = r#"(
        name: "hull",
        root: (
            name: "hull",
            bounds: Some((min: (-1.0, -0.5, -4.0), max: (1.0, 0.5, 4.0))),
            children: [
                (name: "sail", transform: (position: (0.0, 1.0, 1.0), rotation: (0.0, 0.0, 0.0, 1.0), scale: (1.0, 1.0, 1.0))),
            ],
        ),
    )"#;

    #[test]
    fn test_loads_from_first_matching_search_path() {
        let empty = tempfile::tempdir().unwrap();
        let assets = tempfile::tempdir().unwrap();
        fs::write(assets.path().join("hull.ron"), HULL_RON).unwrap();

        let loader = RonModelLoader::new([empty.path(), assets.path()]);
        let model = loader.load_prototype(&AssetId::from("hull")).unwrap();

        assert_eq!(model.name, "hull");
        assert_eq!(model.node_count(), 2);
        assert_eq!(model.root.children[0].transform.position.y, 1.0);
    }

    #[test]
    fn test_added_search_path_is_searched_last() {
        let first = tempfile::tempdir().unwrap();
        let extra = tempfile::tempdir().unwrap();
        fs::write(extra.path().join("hull.ron"), HULL_RON).unwrap();

        let mut loader = RonModelLoader::new([first.path()]);
        assert!(loader.resolve(&AssetId::from("hull")).is_none());

        loader.add_search_path(extra.path());
        assert_eq!(loader.search_paths(), &[first.path().to_path_buf(), extra.path().to_path_buf()]);
        let model = loader.load_prototype(&AssetId::from("hull")).unwrap();
        assert_eq!(model.node_count(), 2);
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let loader = RonModelLoader::new([dir.path()]);
        let result = loader.load_prototype(&AssetId::from("missing"));
        assert!(matches!(result, Err(AssetError::NotFound(id)) if id.as_str() == "missing"));
    }

    #[test]
    fn test_malformed_file_is_invalid_data() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("broken.ron"), "(name: ").unwrap();

        let loader = RonModelLoader::new([dir.path()]);
        let result = loader.load_prototype(&AssetId::from("broken"));
        assert!(matches!(result, Err(AssetError::InvalidData { .. })));
    }
}
