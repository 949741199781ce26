use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::model::DEFAULT_CONFIDENCE;

/// Sample images offered by the form front-end when present on disk.
pub const PRESET_FILES: [&str; 2] = ["test.jpg", "test2.jpg"];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Preset {
    pub name: String,
    pub confidence: f32,
}

/// Presets found at start-up; the set does not change afterwards.
#[derive(Debug, Clone, Default)]
pub struct PresetCatalog {
    dir: PathBuf,
    presets: Vec<Preset>,
}

impl PresetCatalog {
    pub fn scan(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref().to_path_buf();
        let presets = PRESET_FILES
            .iter()
            .filter(|name| dir.join(name).is_file())
            .map(|name| Preset { name: name.to_string(), confidence: DEFAULT_CONFIDENCE })
            .collect();
        Self { dir, presets }
    }

    pub fn presets(&self) -> &[Preset] {
        &self.presets
    }

    /// Reads a preset image; names outside the scanned set are rejected.
    pub async fn read(&self, name: &str) -> DomainResult<Vec<u8>> {
        if !self.presets.iter().any(|p| p.name == name) {
            return Err(DomainError::NotFound(format!("no example named {name}")));
        }
        tokio::fs::read(self.dir.join(name))
            .await
            .map_err(|e| DomainError::NotFound(format!("example {name}: {e}")))
    }
}
