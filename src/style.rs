//! Style resolver – turns the attribute bundles carried by a [`DocNode`] tree
//! into a flat [`ComputedStyle`] per node, consumed by the layout engine.
//!
//! Bundle attributes are CSS properties, written camelCase (`fontSize`) or
//! kebab-case (`font-size`); unknown properties and unparsable values are
//! ignored.

use crate::primitives::DocNode;
use crate::stylesheet::{kebab_case, StyleBundle};

/// Fully resolved style for a single node.
#[derive(Debug, Clone)]
pub struct ComputedStyle {
    // Display / layout
    pub display: Display,
    pub flex_direction: FlexDirection,
    pub flex_wrap: FlexWrap,
    pub flex_grow: f32,
    pub flex_shrink: f32,
    pub justify_content: JustifyContent,
    pub align_items: AlignItems,
    pub gap: f32,

    // Sizing
    pub width: Dimension,
    pub height: Dimension,
    pub min_width: Dimension,
    pub max_width: Dimension,

    // Spacing (px)
    pub margin_top: f32,
    pub margin_right: f32,
    pub margin_bottom: f32,
    pub margin_left: f32,
    pub padding_top: f32,
    pub padding_right: f32,
    pub padding_bottom: f32,
    pub padding_left: f32,

    // Border
    pub border_width: f32,
    pub border_color: Color,

    // Typography
    pub font_size: f32,
    pub font_weight: FontWeight,
    pub font_family: String,
    pub color: Color,
    pub text_align: TextAlign,
    pub line_height: f32,
    pub text_decoration: TextDecoration,
    pub font_style: FontStyle,

    // Background
    pub background_color: Color,

    // Page break
    pub page_break_before: bool,
    pub page_break_after: bool,
    pub page_break_inside_avoid: bool,
}

impl Default for ComputedStyle {
    fn default() -> Self {
        Self {
            display: Display::Block,
            flex_direction: FlexDirection::Row,
            flex_wrap: FlexWrap::NoWrap,
            flex_grow: 0.0,
            flex_shrink: 1.0,
            justify_content: JustifyContent::Start,
            align_items: AlignItems::Stretch,
            gap: 0.0,
            width: Dimension::Auto,
            height: Dimension::Auto,
            min_width: Dimension::Auto,
            max_width: Dimension::Auto,
            margin_top: 0.0,
            margin_right: 0.0,
            margin_bottom: 0.0,
            margin_left: 0.0,
            padding_top: 0.0,
            padding_right: 0.0,
            padding_bottom: 0.0,
            padding_left: 0.0,
            border_width: 0.0,
            border_color: Color::BLACK,
            font_size: 12.0,
            font_weight: FontWeight::Normal,
            font_family: "Helvetica".to_string(),
            color: Color::BLACK,
            text_align: TextAlign::Left,
            line_height: 1.3,
            text_decoration: TextDecoration::None,
            font_style: FontStyle::Normal,
            background_color: Color::TRANSPARENT,
            page_break_before: false,
            page_break_after: false,
            page_break_inside_avoid: false,
        }
    }
}

impl ComputedStyle {
    pub fn horizontal_padding(&self) -> f32 {
        self.padding_left + self.padding_right
    }

    pub fn vertical_padding(&self) -> f32 {
        self.padding_top + self.padding_bottom
    }

    pub fn is_bold(&self) -> bool {
        self.font_weight == FontWeight::Bold
    }

    pub fn is_italic(&self) -> bool {
        self.font_style == FontStyle::Italic
    }
}

// ---------------------------------------------------------------------------
// Supporting enums
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Display {
    Block,
    Flex,
    Inline,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlexDirection {
    Row,
    Column,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlexWrap {
    NoWrap,
    Wrap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JustifyContent {
    Start,
    End,
    Center,
    SpaceBetween,
    SpaceAround,
    SpaceEvenly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlignItems {
    Start,
    End,
    Center,
    Stretch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontWeight {
    Normal,
    Bold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

impl TextAlign {
    pub fn as_str(self) -> &'static str {
        match self {
            TextAlign::Left => "left",
            TextAlign::Center => "center",
            TextAlign::Right => "right",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextDecoration {
    None,
    Underline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontStyle {
    Normal,
    Italic,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Dimension {
    Auto,
    Px(f32),
    Percent(f32),
}

impl Dimension {
    /// Resolve against the containing width; `None` for `Auto`.
    pub fn resolve(self, parent_width: f32) -> Option<f32> {
        match self {
            Dimension::Auto => None,
            Dimension::Px(v) => Some(v),
            Dimension::Percent(p) => Some(parent_width * p / 100.0),
        }
    }
}

/// RGBA colour (0.0 – 1.0).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const BLACK: Self = Self {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 1.0,
    };
    pub const WHITE: Self = Self {
        r: 1.0,
        g: 1.0,
        b: 1.0,
        a: 1.0,
    };
    pub const TRANSPARENT: Self = Self {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 0.0,
    };

    pub fn is_transparent(&self) -> bool {
        self.a < 0.001
    }

    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// `#rgb`, `#rrggbb`, or one of the few named colours templates use.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "white" => return Some(Self::WHITE),
            "black" => return Some(Self::BLACK),
            "transparent" => return Some(Self::TRANSPARENT),
            _ => {}
        }
        let hex = value.trim().strip_prefix('#')?;
        if !hex.is_ascii() {
            return None;
        }
        let channel = |s: &str| u8::from_str_radix(s, 16).ok().map(|v| v as f32 / 255.0);
        match hex.len() {
            6 => Some(Self {
                r: channel(&hex[0..2])?,
                g: channel(&hex[2..4])?,
                b: channel(&hex[4..6])?,
                a: 1.0,
            }),
            3 => Some(Self {
                r: channel(&hex[0..1].repeat(2))?,
                g: channel(&hex[1..2].repeat(2))?,
                b: channel(&hex[2..3].repeat(2))?,
                a: 1.0,
            }),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Style resolution
// ---------------------------------------------------------------------------

/// Resolve a bundle, inheriting text properties from the parent.
pub fn resolve_style(bundle: &StyleBundle, parent: Option<&ComputedStyle>) -> ComputedStyle {
    let mut style = ComputedStyle::default();

    if let Some(p) = parent {
        style.font_size = p.font_size;
        style.font_weight = p.font_weight;
        style.font_family = p.font_family.clone();
        style.color = p.color;
        style.text_align = p.text_align;
        style.line_height = p.line_height;
        style.font_style = p.font_style;
        style.text_decoration = p.text_decoration;
    }

    for (prop, value) in bundle.iter() {
        apply_css_property(&mut style, &kebab_case(prop), value);
    }
    style
}

fn apply_css_property(s: &mut ComputedStyle, prop: &str, val: &str) {
    let val = val.trim();
    match prop {
        "display" => {
            s.display = match val {
                "flex" => Display::Flex,
                "block" => Display::Block,
                "inline" | "inline-block" => Display::Inline,
                "none" => Display::None,
                _ => s.display,
            }
        }
        "flex-direction" => {
            s.flex_direction = match val {
                "row" => FlexDirection::Row,
                "column" => FlexDirection::Column,
                _ => s.flex_direction,
            }
        }
        "flex-wrap" => {
            s.flex_wrap = match val {
                "wrap" => FlexWrap::Wrap,
                _ => FlexWrap::NoWrap,
            }
        }
        "flex" => {
            if let Ok(v) = val.parse::<f32>() {
                s.flex_grow = v;
                s.flex_shrink = 1.0;
            }
        }
        "flex-grow" => {
            if let Ok(v) = val.parse::<f32>() {
                s.flex_grow = v;
            }
        }
        "flex-shrink" => {
            if let Ok(v) = val.parse::<f32>() {
                s.flex_shrink = v;
            }
        }
        "justify-content" => {
            s.justify_content = match val {
                "flex-start" | "start" => JustifyContent::Start,
                "flex-end" | "end" => JustifyContent::End,
                "center" => JustifyContent::Center,
                "space-between" => JustifyContent::SpaceBetween,
                "space-around" => JustifyContent::SpaceAround,
                "space-evenly" => JustifyContent::SpaceEvenly,
                _ => s.justify_content,
            }
        }
        "align-items" => {
            s.align_items = match val {
                "flex-start" | "start" => AlignItems::Start,
                "flex-end" | "end" => AlignItems::End,
                "center" => AlignItems::Center,
                "stretch" => AlignItems::Stretch,
                _ => s.align_items,
            }
        }
        "font-size" => {
            if let Some(px) = parse_px(val) {
                s.font_size = px;
            }
        }
        "font-weight" => {
            s.font_weight = match val {
                "bold" | "700" | "800" | "900" => FontWeight::Bold,
                _ => FontWeight::Normal,
            }
        }
        "font-style" => {
            s.font_style = match val {
                "italic" => FontStyle::Italic,
                _ => FontStyle::Normal,
            }
        }
        "font-family" => s.font_family = val.trim_matches(|c| c == '"' || c == '\'').to_string(),
        "text-decoration" => {
            s.text_decoration = match val {
                "underline" => TextDecoration::Underline,
                _ => TextDecoration::None,
            }
        }
        "color" => {
            if let Some(c) = Color::parse(val) {
                s.color = c;
            }
        }
        "background-color" | "background" => {
            if let Some(c) = Color::parse(val) {
                s.background_color = c;
            }
        }
        "text-align" => {
            s.text_align = match val {
                "center" => TextAlign::Center,
                "right" => TextAlign::Right,
                _ => TextAlign::Left,
            }
        }
        "width" => s.width = parse_dimension(val),
        "height" => s.height = parse_dimension(val),
        "min-width" => s.min_width = parse_dimension(val),
        "max-width" => s.max_width = parse_dimension(val),
        "margin" => apply_shorthand_spacing(
            val,
            [
                &mut s.margin_top,
                &mut s.margin_right,
                &mut s.margin_bottom,
                &mut s.margin_left,
            ],
        ),
        "margin-top" => set_px(&mut s.margin_top, val),
        "margin-right" => set_px(&mut s.margin_right, val),
        "margin-bottom" => set_px(&mut s.margin_bottom, val),
        "margin-left" => set_px(&mut s.margin_left, val),
        "padding" => apply_shorthand_spacing(
            val,
            [
                &mut s.padding_top,
                &mut s.padding_right,
                &mut s.padding_bottom,
                &mut s.padding_left,
            ],
        ),
        "padding-top" => set_px(&mut s.padding_top, val),
        "padding-right" => set_px(&mut s.padding_right, val),
        "padding-bottom" => set_px(&mut s.padding_bottom, val),
        "padding-left" => set_px(&mut s.padding_left, val),
        "border-width" => set_px(&mut s.border_width, val),
        "border" => {
            // `1px solid #ccc`: width and colour, style ignored.
            for part in val.split_whitespace() {
                if let Some(px) = parse_px(part) {
                    s.border_width = px;
                } else if let Some(c) = Color::parse(part) {
                    s.border_color = c;
                }
            }
        }
        "border-color" => {
            if let Some(c) = Color::parse(val) {
                s.border_color = c;
            }
        }
        "line-height" => {
            if let Ok(v) = val.parse::<f32>() {
                s.line_height = v;
            } else if let Some(px) = parse_px(val) {
                s.line_height = px / s.font_size;
            }
        }
        "gap" => set_px(&mut s.gap, val),
        "break-before" | "page-break-before" => {
            s.page_break_before = val == "always" || val == "page";
        }
        "break-after" | "page-break-after" => {
            s.page_break_after = val == "always" || val == "page";
        }
        "page-break-inside" | "break-inside" => {
            s.page_break_inside_avoid = val == "avoid";
        }
        _ => log::trace!("ignoring style property {prop:?}"),
    }
}

fn set_px(slot: &mut f32, val: &str) {
    if let Some(px) = parse_px(val) {
        *slot = px;
    }
}

fn parse_px(s: &str) -> Option<f32> {
    let s = s.trim();
    let s = s
        .strip_suffix("px")
        .or_else(|| s.strip_suffix("pt"))
        .unwrap_or(s);
    s.parse().ok()
}

fn parse_dimension(s: &str) -> Dimension {
    let s = s.trim();
    if s == "auto" {
        Dimension::Auto
    } else if let Some(pct) = s.strip_suffix('%') {
        pct.parse::<f32>()
            .map(Dimension::Percent)
            .unwrap_or(Dimension::Auto)
    } else {
        parse_px(s).map(Dimension::Px).unwrap_or(Dimension::Auto)
    }
}

/// CSS 1/2/3/4-value shorthand, in top/right/bottom/left order.
fn apply_shorthand_spacing(val: &str, [top, right, bottom, left]: [&mut f32; 4]) {
    let parts: Vec<f32> = val.split_whitespace().filter_map(parse_px).collect();
    let (t, r, b, l) = match parts.as_slice() {
        [a] => (*a, *a, *a, *a),
        [v, h] => (*v, *h, *v, *h),
        [t, h, b] => (*t, *h, *b, *h),
        [t, r, b, l] => (*t, *r, *b, *l),
        _ => return,
    };
    *top = t;
    *right = r;
    *bottom = b;
    *left = l;
}

// ---------------------------------------------------------------------------
// Styled document tree
// ---------------------------------------------------------------------------

/// What kind of box a styled element becomes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoxKind {
    Page,
    View,
    Inline,
    Image { src: String },
}

/// A document node annotated with its computed style.
#[derive(Debug, Clone)]
pub enum StyledNode {
    Element {
        kind: BoxKind,
        style: ComputedStyle,
        children: Vec<StyledNode>,
    },
    Text {
        text: String,
        style: ComputedStyle,
    },
}

impl StyledNode {
    pub fn style(&self) -> &ComputedStyle {
        match self {
            StyledNode::Element { style, .. } | StyledNode::Text { style, .. } => style,
        }
    }
}

/// Build a styled tree from document nodes, resolving styles top-down.
pub fn build_styled_tree(nodes: &[DocNode], parent_style: Option<&ComputedStyle>) -> Vec<StyledNode> {
    nodes
        .iter()
        .map(|node| build_styled_node(node, parent_style))
        .collect()
}

fn build_styled_node(node: &DocNode, parent: Option<&ComputedStyle>) -> StyledNode {
    let mut style = resolve_style(node.style(), parent);
    match node {
        DocNode::Page { children, .. } => {
            style.page_break_after = true;
            element(BoxKind::Page, style, children)
        }
        DocNode::View { children, .. } => element(BoxKind::View, style, children),
        DocNode::Inline { children, .. } => {
            // A run made only of text collapses into one text box so the
            // pieces wrap together.
            if children.iter().all(|c| matches!(c, DocNode::Text { .. })) {
                let text: String = children
                    .iter()
                    .filter_map(|c| match c {
                        DocNode::Text { content, .. } => Some(content.as_str()),
                        _ => None,
                    })
                    .collect();
                StyledNode::Text { text, style }
            } else {
                style.display = Display::Inline;
                element(BoxKind::Inline, style, children)
            }
        }
        DocNode::Text { content, .. } => StyledNode::Text {
            text: content.clone(),
            style,
        },
        DocNode::Image { src, .. } => StyledNode::Element {
            kind: BoxKind::Image { src: src.clone() },
            style,
            children: Vec::new(),
        },
    }
}

fn element(kind: BoxKind, style: ComputedStyle, children: &[DocNode]) -> StyledNode {
    let children = build_styled_tree(children, Some(&style));
    StyledNode::Element {
        kind,
        style,
        children,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bundle(pairs: &[(&str, &str)]) -> StyleBundle {
        pairs.iter().copied().collect()
    }

    #[test]
    fn camel_case_properties_apply() {
        let s = resolve_style(
            &bundle(&[("fontSize", "24px"), ("backgroundColor", "#ff0000"), ("textAlign", "right")]),
            None,
        );
        assert_eq!(s.font_size, 24.0);
        assert!((s.background_color.r - 1.0).abs() < 0.01);
        assert_eq!(s.text_align, TextAlign::Right);
    }

    #[test]
    fn padding_shorthand() {
        let s = resolve_style(&bundle(&[("padding", "4px 8px")]), None);
        assert_eq!((s.padding_top, s.padding_right), (4.0, 8.0));
        assert_eq!((s.padding_bottom, s.padding_left), (4.0, 8.0));

        let s = resolve_style(&bundle(&[("margin", "1px 2px 3px")]), None);
        assert_eq!(
            (s.margin_top, s.margin_right, s.margin_bottom, s.margin_left),
            (1.0, 2.0, 3.0, 2.0)
        );
    }

    #[test]
    fn text_properties_inherit_box_properties_do_not() {
        let parent = resolve_style(
            &bundle(&[("fontSize", "20px"), ("color", "#fff"), ("padding", "10px")]),
            None,
        );
        let child = resolve_style(&StyleBundle::new(), Some(&parent));
        assert_eq!(child.font_size, 20.0);
        assert_eq!(child.color, Color::WHITE);
        assert_eq!(child.padding_left, 0.0);
    }

    #[test]
    fn empty_bundle_gives_defaults() {
        let s = resolve_style(&StyleBundle::new(), None);
        assert_eq!(s.display, Display::Block);
        assert_eq!(s.width, Dimension::Auto);
    }

    #[test]
    fn color_parsing() {
        let c = Color::parse("#ff8800").unwrap();
        assert!((c.r - 1.0).abs() < 0.01);
        assert!((c.g - 0.533).abs() < 0.01);
        assert_eq!(Color::parse("#fff"), Some(Color::WHITE));
        assert_eq!(Color::parse("white"), Some(Color::WHITE));
        assert_eq!(Color::parse("nonsense"), None);
        assert_eq!(Color::parse("#aé"), None);
        assert_eq!(Color::parse("#ééé"), None);
    }

    #[test]
    fn non_ascii_color_falls_back_to_inherited() {
        let s = resolve_style(&bundle(&[("color", "#aé")]), None);
        assert_eq!(s.color, ComputedStyle::default().color);
    }

    #[test]
    fn border_shorthand() {
        let s = resolve_style(&bundle(&[("border", "2px solid #000000")]), None);
        assert_eq!(s.border_width, 2.0);
        assert_eq!(s.border_color, Color::BLACK);
    }

    #[test]
    fn text_only_inline_collapses() {
        let doc = DocNode::Inline {
            style: bundle(&[("fontWeight", "bold")]),
            children: vec![
                DocNode::Text {
                    style: StyleBundle::new(),
                    content: "1".into(),
                },
                DocNode::Text {
                    style: StyleBundle::new(),
                    content: "0%".into(),
                },
            ],
        };
        match &build_styled_tree(&[doc], None)[0] {
            StyledNode::Text { text, style } => {
                assert_eq!(text, "10%");
                assert_eq!(style.font_weight, FontWeight::Bold);
            }
            other => panic!("expected text, got {other:?}"),
        }
    }

    #[test]
    fn pages_break_after() {
        let page = DocNode::Page {
            style: StyleBundle::new(),
            children: vec![],
        };
        match &build_styled_tree(&[page], None)[0] {
            StyledNode::Element { kind, style, .. } => {
                assert_eq!(*kind, BoxKind::Page);
                assert!(style.page_break_after);
            }
            other => panic!("expected element, got {other:?}"),
        }
    }
}
