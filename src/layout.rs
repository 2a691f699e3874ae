//! Layout engine – uses Taffy to compute flexbox layout from a styled
//! document tree, then converts the result into nested positioned boxes.
//!
//! Text has no measure callback: every text leaf is word-wrapped while the
//! Taffy tree is built, against the width its parent is expected to give
//! it, and enters the tree with a fixed height.

use std::collections::HashMap;
use taffy::prelude::*;

use crate::error::Result;
use crate::fonts::{wrap_text, FontManager};
use crate::style::{self, BoxKind, ComputedStyle, StyledNode};

// ---------------------------------------------------------------------------
// Intermediate layout tree (pre-pagination)
// ---------------------------------------------------------------------------

/// A positioned box in document coordinates (before page splitting).
#[derive(Debug, Clone)]
pub struct PositionedBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub style: ComputedStyle,
    pub content: BoxContent,
    pub children: Vec<PositionedBox>,
    pub page_break_before: bool,
    pub page_break_after: bool,
    pub page_break_inside_avoid: bool,
}

#[derive(Debug, Clone)]
pub enum BoxContent {
    None,
    Text { text: String, lines: Vec<String> },
    Image { src: String },
}

// ---------------------------------------------------------------------------
// Build Taffy tree from styled nodes
// ---------------------------------------------------------------------------

struct LayoutBuilder<'a> {
    taffy: TaffyTree<()>,
    fonts: &'a FontManager,
    node_styles: HashMap<NodeId, ComputedStyle>,
    node_content: HashMap<NodeId, BoxContent>,
}

impl<'a> LayoutBuilder<'a> {
    fn new(fonts: &'a FontManager) -> Self {
        Self {
            taffy: TaffyTree::new(),
            fonts,
            node_styles: HashMap::new(),
            node_content: HashMap::new(),
        }
    }

    /// `box_width` is the border-box width the parent expects to give this
    /// node; it only drives text wrapping; Taffy decides the real size.
    fn build_node(&mut self, styled: &StyledNode, box_width: f32) -> Result<NodeId> {
        match styled {
            StyledNode::Text { text, style } => self.build_text_node(text, style, box_width),
            StyledNode::Element {
                kind,
                style,
                children,
            } => self.build_element_node(kind, style, children, box_width),
        }
    }

    fn build_text_node(&mut self, text: &str, style: &ComputedStyle, box_width: f32) -> Result<NodeId> {
        let bold = style.is_bold();
        let italic = style.is_italic();
        let family = &style.font_family;
        let font_size = style.font_size;
        let line_height_px = self.fonts.line_height_px(font_size, style.line_height);

        let content_width = (box_width - style.horizontal_padding()).max(1.0);
        let text = text.trim();
        let lines = wrap_text(text, font_size, bold, italic, family, content_width, self.fonts);

        let text_width = lines
            .iter()
            .map(|l| self.fonts.measure_text_width(l, font_size, bold, italic, family))
            .fold(0.0f32, f32::max);
        let text_height = lines.len() as f32 * line_height_px;

        // An explicit width is kept; otherwise the measured width is a floor
        // and the parent may stretch or grow the box past it.
        let (width, min_width) = match style.width {
            style::Dimension::Auto => (
                taffy::Dimension::Auto,
                taffy::Dimension::Length(text_width + style.horizontal_padding()),
            ),
            explicit => (dim_to_taffy(explicit), taffy::Dimension::Auto),
        };

        let taffy_style = Style {
            display: if style.display == style::Display::None {
                taffy::Display::None
            } else {
                taffy::Display::Block
            },
            size: Size {
                width,
                height: taffy::Dimension::Length(text_height + style.vertical_padding()),
            },
            min_size: Size {
                width: min_width,
                height: taffy::Dimension::Auto,
            },
            flex_grow: style.flex_grow,
            flex_shrink: 0.0,
            margin: margin_rect(style),
            padding: padding_rect(style),
            ..Default::default()
        };

        let node = self.taffy.new_leaf(taffy_style)?;
        self.node_styles.insert(node, style.clone());
        self.node_content.insert(
            node,
            BoxContent::Text {
                text: text.to_string(),
                lines,
            },
        );
        Ok(node)
    }

    fn build_element_node(
        &mut self,
        kind: &BoxKind,
        style: &ComputedStyle,
        children: &[StyledNode],
        box_width: f32,
    ) -> Result<NodeId> {
        if let BoxKind::Image { src } = kind {
            // Without intrinsic dimensions an empty leaf computes to 0×0.
            let resolved = resolve_img_auto_dimensions(src, style, box_width);
            let effective = resolved.as_ref().unwrap_or(style);
            let node = self.taffy.new_leaf(computed_to_taffy(effective))?;
            self.node_styles.insert(node, effective.clone());
            self.node_content
                .insert(node, BoxContent::Image { src: src.clone() });
            return Ok(node);
        }

        let inner_width = box_width - style.horizontal_padding() - 2.0 * style.border_width;
        let widths = child_widths(style, children, inner_width);

        let mut child_nodes = Vec::with_capacity(children.len());
        for (child, width) in children.iter().zip(widths) {
            child_nodes.push(self.build_node(child, width)?);
        }

        let node = self
            .taffy
            .new_with_children(computed_to_taffy(style), &child_nodes)?;
        self.node_styles.insert(node, style.clone());
        Ok(node)
    }

    /// Extract positioned boxes after layout computation.
    fn extract(&self, node: NodeId, offset_x: f32, offset_y: f32) -> Result<PositionedBox> {
        let layout = self.taffy.layout(node)?;
        let style = self.node_styles.get(&node).cloned().unwrap_or_default();
        let content = self
            .node_content
            .get(&node)
            .cloned()
            .unwrap_or(BoxContent::None);

        let x = offset_x + layout.location.x;
        let y = offset_y + layout.location.y;

        let children = self
            .taffy
            .children(node)?
            .into_iter()
            .map(|child| self.extract(child, x, y))
            .collect::<Result<Vec<_>>>()?;

        Ok(PositionedBox {
            x,
            y,
            width: layout.size.width,
            height: layout.size.height,
            page_break_before: style.page_break_before,
            page_break_after: style.page_break_after,
            page_break_inside_avoid: style.page_break_inside_avoid,
            style,
            content,
            children,
        })
    }
}

fn is_row(style: &ComputedStyle) -> bool {
    style.display == style::Display::Flex && style.flex_direction == style::FlexDirection::Row
        || style.display == style::Display::Inline
}

/// Estimated border-box width of each child, used for wrapping text.
///
/// In a row, explicit widths are taken as given and the remainder is shared
/// equally between the auto-width children.
fn child_widths(style: &ComputedStyle, children: &[StyledNode], inner_width: f32) -> Vec<f32> {
    let outer_margin = |s: &ComputedStyle| s.margin_left + s.margin_right;

    if !is_row(style) {
        return children
            .iter()
            .map(|c| {
                let s = c.style();
                s.width
                    .resolve(inner_width)
                    .unwrap_or(inner_width - outer_margin(s))
            })
            .collect();
    }

    let explicit: Vec<Option<f32>> = children
        .iter()
        .map(|c| c.style().width.resolve(inner_width))
        .collect();
    let fixed: f32 = children
        .iter()
        .zip(&explicit)
        .map(|(c, w)| w.unwrap_or(0.0) + outer_margin(c.style()))
        .sum();
    let autos = explicit.iter().filter(|w| w.is_none()).count().max(1);
    let gaps = style.gap * children.len().saturating_sub(1) as f32;
    let share = ((inner_width - fixed - gaps) / autos as f32).max(1.0);

    explicit.into_iter().map(|w| w.unwrap_or(share)).collect()
}

fn computed_to_taffy(s: &ComputedStyle) -> Style {
    let mut ts = Style::default();

    match s.display {
        style::Display::Flex => {
            ts.display = taffy::Display::Flex;
            ts.flex_direction = match s.flex_direction {
                style::FlexDirection::Row => taffy::FlexDirection::Row,
                style::FlexDirection::Column => taffy::FlexDirection::Column,
            };
            ts.flex_wrap = match s.flex_wrap {
                style::FlexWrap::NoWrap => taffy::FlexWrap::NoWrap,
                style::FlexWrap::Wrap => taffy::FlexWrap::Wrap,
            };
            ts.justify_content = Some(match s.justify_content {
                style::JustifyContent::Start => taffy::JustifyContent::Start,
                style::JustifyContent::End => taffy::JustifyContent::End,
                style::JustifyContent::Center => taffy::JustifyContent::Center,
                style::JustifyContent::SpaceBetween => taffy::JustifyContent::SpaceBetween,
                style::JustifyContent::SpaceAround => taffy::JustifyContent::SpaceAround,
                style::JustifyContent::SpaceEvenly => taffy::JustifyContent::SpaceEvenly,
            });
            ts.align_items = Some(match s.align_items {
                style::AlignItems::Start => taffy::AlignItems::Start,
                style::AlignItems::End => taffy::AlignItems::End,
                style::AlignItems::Center => taffy::AlignItems::Center,
                style::AlignItems::Stretch => taffy::AlignItems::Stretch,
            });
        }
        style::Display::Block => {
            // Block-level boxes stack vertically.
            ts.display = taffy::Display::Flex;
            ts.flex_direction = taffy::FlexDirection::Column;
        }
        style::Display::Inline => {
            ts.display = taffy::Display::Flex;
            ts.flex_direction = taffy::FlexDirection::Row;
            ts.flex_wrap = taffy::FlexWrap::Wrap;
        }
        style::Display::None => {
            ts.display = taffy::Display::None;
        }
    }

    ts.size = Size {
        width: dim_to_taffy(s.width),
        height: dim_to_taffy(s.height),
    };
    // Allow flex/shrink items to compress below their natural content size
    ts.min_size = Size {
        width: if s.flex_shrink > 0.0 || s.flex_grow > 0.0 {
            taffy::Dimension::Length(0.0)
        } else {
            dim_to_taffy(s.min_width)
        },
        height: taffy::Dimension::Auto,
    };
    ts.max_size = Size {
        width: dim_to_taffy(s.max_width),
        height: taffy::Dimension::Auto,
    };

    ts.flex_grow = s.flex_grow;
    ts.flex_shrink = s.flex_shrink;
    ts.margin = margin_rect(s);
    ts.padding = padding_rect(s);
    ts.border = Rect {
        top: LengthPercentage::Length(s.border_width),
        right: LengthPercentage::Length(s.border_width),
        bottom: LengthPercentage::Length(s.border_width),
        left: LengthPercentage::Length(s.border_width),
    };
    ts.gap = Size {
        width: LengthPercentage::Length(s.gap),
        height: LengthPercentage::Length(s.gap),
    };

    ts
}

fn margin_rect(s: &ComputedStyle) -> Rect<LengthPercentageAuto> {
    Rect {
        top: LengthPercentageAuto::Length(s.margin_top),
        right: LengthPercentageAuto::Length(s.margin_right),
        bottom: LengthPercentageAuto::Length(s.margin_bottom),
        left: LengthPercentageAuto::Length(s.margin_left),
    }
}

fn padding_rect(s: &ComputedStyle) -> Rect<LengthPercentage> {
    Rect {
        top: LengthPercentage::Length(s.padding_top),
        right: LengthPercentage::Length(s.padding_right),
        bottom: LengthPercentage::Length(s.padding_bottom),
        left: LengthPercentage::Length(s.padding_left),
    }
}

fn dim_to_taffy(d: style::Dimension) -> taffy::Dimension {
    match d {
        style::Dimension::Auto => taffy::Dimension::Auto,
        style::Dimension::Px(v) => taffy::Dimension::Length(v),
        style::Dimension::Percent(v) => taffy::Dimension::Percent(v / 100.0),
    }
}

// ---------------------------------------------------------------------------
// Image intrinsic-size helper
// ---------------------------------------------------------------------------

/// Decode a base64 data-URI image and return a cloned [`ComputedStyle`]
/// with any `Auto` width/height replaced by pixel values derived from the
/// image's intrinsic dimensions.
///
/// `None` when the src is not a decodable data URI, or when both
/// dimensions are already specified.
fn resolve_img_auto_dimensions(src: &str, style: &ComputedStyle, parent_width: f32) -> Option<ComputedStyle> {
    let bytes = crate::render::parse_data_uri(src).ok()?;
    let img = ::image::load_from_memory(&bytes).ok()?;
    let (px_w, px_h) = (img.width() as f32, img.height() as f32);
    if px_w == 0.0 || px_h == 0.0 {
        return None;
    }
    let aspect = px_w / px_h;

    let known_w = style.width.resolve(parent_width);
    let known_h = match style.height {
        style::Dimension::Px(v) => Some(v),
        _ => None,
    };

    let mut s = style.clone();
    match (known_w, known_h) {
        (Some(w), None) => s.height = style::Dimension::Px((w / aspect).max(1.0)),
        (None, Some(h)) => s.width = style::Dimension::Px((h * aspect).max(1.0)),
        // Intrinsic pixel dimensions at 1 px = 1 pt.
        (None, None) => {
            s.width = style::Dimension::Px(px_w);
            s.height = style::Dimension::Px(px_h);
        }
        (Some(_), Some(_)) => return None,
    }
    Some(s)
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Compute layout for a styled tree, returning the top-level positioned
/// boxes in document coordinates. Boxes start at `page_margin` on the x axis
/// and at zero on the y axis.
pub fn compute_layout(
    styled_nodes: &[StyledNode],
    page_width: f32,
    page_margin: f32,
    fonts: &FontManager,
) -> Result<Vec<PositionedBox>> {
    let content_width = page_width - 2.0 * page_margin;
    let mut builder = LayoutBuilder::new(fonts);

    let root_style = ComputedStyle::default();
    let widths = child_widths(&root_style, styled_nodes, content_width);
    let mut child_ids = Vec::with_capacity(styled_nodes.len());
    for (node, width) in styled_nodes.iter().zip(widths) {
        child_ids.push(builder.build_node(node, width)?);
    }

    let root = builder.taffy.new_with_children(
        Style {
            display: taffy::Display::Flex,
            flex_direction: taffy::FlexDirection::Column,
            size: Size {
                width: taffy::Dimension::Length(content_width),
                height: taffy::Dimension::Auto,
            },
            ..Default::default()
        },
        &child_ids,
    )?;

    builder.taffy.compute_layout(
        root,
        Size {
            width: AvailableSpace::Definite(content_width),
            height: AvailableSpace::MaxContent,
        },
    )?;

    Ok(builder.extract(root, page_margin, 0.0)?.children)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::DocNode;
    use crate::style::build_styled_tree;
    use crate::stylesheet::StyleBundle;

    fn bundle(pairs: &[(&str, &str)]) -> StyleBundle {
        pairs.iter().copied().collect()
    }

    fn text(pairs: &[(&str, &str)], content: &str) -> DocNode {
        DocNode::Text {
            style: bundle(pairs),
            content: content.into(),
        }
    }

    fn view(pairs: &[(&str, &str)], children: Vec<DocNode>) -> DocNode {
        DocNode::View {
            style: bundle(pairs),
            children,
        }
    }

    fn layout(nodes: &[DocNode]) -> Vec<PositionedBox> {
        let styled = build_styled_tree(nodes, None);
        compute_layout(&styled, 595.0, 40.0, &FontManager::default()).unwrap()
    }

    #[test]
    fn text_stretches_across_a_column_and_wraps() {
        let long = "word ".repeat(100);
        let boxes = layout(&[view(&[("fontSize", "12px")], vec![text(&[], &long)])]);
        let leaf = &boxes[0].children[0];
        assert!((leaf.width - 515.0).abs() < 0.5);
        assert_eq!(leaf.x, 40.0);
        match &leaf.content {
            BoxContent::Text { lines, .. } => {
                assert!(lines.len() > 1);
                assert!((leaf.height - lines.len() as f32 * 12.0 * 1.3).abs() < 0.1);
            }
            other => panic!("expected text, got {other:?}"),
        }
    }

    #[test]
    fn padding_adds_to_text_height() {
        let boxes = layout(&[text(
            &[("fontSize", "10px"), ("padding", "4px 12px 4px 0px")],
            "Qty",
        )]);
        assert!((boxes[0].height - (13.0 + 8.0)).abs() < 0.1);
    }

    #[test]
    fn percent_widths_split_a_row() {
        let boxes = layout(&[view(
            &[("display", "flex"), ("flexDirection", "row")],
            vec![
                text(&[("width", "50%")], "left"),
                text(&[("width", "50%")], "right"),
            ],
        )]);
        let row = &boxes[0];
        assert!((row.children[0].width - 257.5).abs() < 0.5);
        assert!((row.children[1].x - (40.0 + 257.5)).abs() < 0.5);
    }

    #[test]
    fn flex_grow_takes_remaining_width() {
        let boxes = layout(&[view(
            &[("display", "flex")],
            vec![
                text(&[("flex", "1")], "Item"),
                text(&[("width", "100px")], "9.00"),
            ],
        )]);
        let row = &boxes[0];
        assert!((row.children[0].width - 415.0).abs() < 0.5);
        assert!((row.children[1].x - 455.0).abs() < 0.5);
    }

    #[test]
    fn image_height_follows_aspect_ratio() {
        use base64::{engine::general_purpose::STANDARD, Engine as _};

        let mut png = Vec::new();
        ::image::RgbImage::new(4, 2)
            .write_to(&mut std::io::Cursor::new(&mut png), ::image::ImageFormat::Png)
            .unwrap();
        let src = format!("data:image/png;base64,{}", STANDARD.encode(&png));
        let boxes = layout(&[DocNode::Image {
            style: bundle(&[("width", "100px")]),
            src,
        }]);
        assert!((boxes[0].width - 100.0).abs() < 0.1);
        assert!((boxes[0].height - 50.0).abs() < 0.1);
        assert!(matches!(boxes[0].content, BoxContent::Image { .. }));
    }

    #[test]
    fn undecodable_image_keeps_given_width() {
        let boxes = layout(&[DocNode::Image {
            style: bundle(&[("width", "80px")]),
            src: "not-a-data-uri".into(),
        }]);
        assert!((boxes[0].width - 80.0).abs() < 0.1);
        assert_eq!(boxes[0].height, 0.0);
    }
}
