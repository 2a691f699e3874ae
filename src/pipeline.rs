//! Pipeline – ties together styling, layout, pagination, and rendering of a
//! document tree into a single function call.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::fonts::FontManager;
use crate::layout::compute_layout;
use crate::layout_config::LayoutConfig;
use crate::pagination::{paginate, PAGE_MARGIN_PT};
use crate::primitives::DocNode;
use crate::render::render_pdf;
use crate::style::build_styled_tree;

/// Page orientation for the generated PDF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageOrientation {
    /// Portrait mode: height > width (default).
    #[default]
    Portrait,
    /// Landscape mode: width > height.
    Landscape,
}

/// Configuration for the PDF generation pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Document title embedded in the PDF metadata.
    pub title: String,
    /// Page width in points (default: A4 = 595.28).
    pub page_width: f32,
    /// Page height in points (default: A4 = 841.89).
    pub page_height: f32,
    /// Page margin in points (default: 40).
    pub page_margin: f32,
    /// Swaps effective width/height when `Landscape`.
    pub orientation: PageOrientation,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            title: crate::invoice::DEFAULT_FILE_STEM.to_string(),
            page_width: 595.28,
            page_height: 841.89,
            page_margin: PAGE_MARGIN_PT,
            orientation: PageOrientation::Portrait,
        }
    }
}

impl PipelineConfig {
    pub fn effective_width(&self) -> f32 {
        match self.orientation {
            PageOrientation::Portrait => self.page_width,
            PageOrientation::Landscape => self.page_height,
        }
    }

    pub fn effective_height(&self) -> f32 {
        match self.orientation {
            PageOrientation::Portrait => self.page_height,
            PageOrientation::Landscape => self.page_width,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }
}

/// Full pipeline: document tree → PDF bytes, plus the frozen layout.
pub fn generate_pdf(root: &DocNode, config: &PipelineConfig) -> Result<(Vec<u8>, LayoutConfig)> {
    let layout_config = compute_layout_config(root, config)?;
    let pdf_bytes = render_pdf(&layout_config)?;
    Ok((pdf_bytes, layout_config))
}

/// Generate only the layout config (no PDF rendering).
pub fn compute_layout_config(root: &DocNode, config: &PipelineConfig) -> Result<LayoutConfig> {
    let styled = build_styled_tree(std::slice::from_ref(root), None);
    let fonts = FontManager::default();
    let eff_w = config.effective_width();
    let eff_h = config.effective_height();
    let boxes = compute_layout(&styled, eff_w, config.page_margin, &fonts)?;
    let mut layout_config = paginate(&boxes, eff_w, eff_h, config.page_margin, &fonts);
    layout_config.title = config.title.clone();
    Ok(layout_config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stylesheet::StyleBundle;

    fn page(text: &str) -> DocNode {
        DocNode::Page {
            style: StyleBundle::new(),
            children: vec![DocNode::Text {
                style: StyleBundle::new(),
                content: text.into(),
            }],
        }
    }

    #[test]
    fn pipeline_basic() {
        let (bytes, config) = generate_pdf(&page("Hello"), &PipelineConfig::default()).unwrap();
        assert!(!bytes.is_empty());
        assert_eq!(config.pages.len(), 1);
        assert_eq!(&bytes[0..5], b"%PDF-");
        assert_eq!(config.title, "invoice");
    }

    #[test]
    fn landscape_swaps_page_size() {
        let config = PipelineConfig {
            orientation: PageOrientation::Landscape,
            ..PipelineConfig::default()
        }
        .with_title("wide");
        let layout = compute_layout_config(&page("Hello"), &config).unwrap();
        assert!(layout.page_width_pt > layout.page_height_pt);
        assert_eq!(layout.title, "wide");
    }
}
