//! Application settings, read from an optional JSON file.
//!
//! Every key is optional; a missing file section falls back to the
//! defaults below.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::pagination::PAGE_MARGIN_PT;
use crate::pipeline::{PageOrientation, PipelineConfig};
use crate::stylesheet::{StyleComposer, StyleTable};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Style table to use instead of the builtin one.
    pub styles: Option<PathBuf>,
    /// Quiet period before the download is offered, in milliseconds.
    pub debounce_ms: u64,
    pub page_width: f32,
    pub page_height: f32,
    pub page_margin: f32,
    pub orientation: PageOrientation,
    /// Where exported PDFs are written.
    pub output_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            styles: None,
            debounce_ms: 500,
            page_width: 595.28,
            page_height: 841.89,
            page_margin: PAGE_MARGIN_PT,
            orientation: PageOrientation::Portrait,
            output_dir: PathBuf::from("."),
        }
    }
}

impl AppConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let config = Self::from_json(&std::fs::read_to_string(path)?)?;
        log::debug!("loaded config from {}", path.display());
        Ok(config)
    }

    /// Load `path` when given, defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        path.map_or_else(|| Ok(Self::default()), Self::load)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn style_table(&self) -> Result<StyleTable> {
        match &self.styles {
            Some(path) => StyleTable::load(path),
            None => Ok(StyleTable::builtin()),
        }
    }

    pub fn composer(&self) -> Result<StyleComposer> {
        Ok(StyleComposer::new(self.style_table()?))
    }

    pub fn pipeline(&self, title: impl Into<String>) -> PipelineConfig {
        PipelineConfig {
            title: title.into(),
            page_width: self.page_width,
            page_height: self.page_height,
            page_margin: self.page_margin,
            orientation: self.orientation,
        }
    }
}
