//! Pagination – splits the positioned box tree into pages.
//!
//! Handles:
//! - page boundaries (content height = page height minus both margins)
//! - page-break-before / page-break-after hints
//! - containers taller than a page, which are opened up so their children
//!   paginate individually
//! - text alignment, resolved here into per-line x offsets

use crate::fonts::FontManager;
use crate::layout::{BoxContent, PositionedBox};
use crate::layout_config::*;
use crate::style::{ComputedStyle, TextAlign};

/// Default page margins in points.
pub const PAGE_MARGIN_PT: f32 = 40.0;

/// A box scheduled for placement, with its effective break-after flag.
struct Placement<'a> {
    pbox: &'a PositionedBox,
    break_after: bool,
}

/// Recursively expand any pure-container box whose height exceeds a single
/// page. A break-after on an expanded container moves to its last child.
fn flatten_for_pagination<'a>(boxes: &'a [PositionedBox], content_height: f32, out: &mut Vec<Placement<'a>>) {
    for pbox in boxes {
        if pbox.height > content_height
            && matches!(pbox.content, BoxContent::None)
            && !pbox.children.is_empty()
        {
            let start = out.len();
            flatten_for_pagination(&pbox.children, content_height, out);
            if pbox.page_break_after && out.len() > start {
                if let Some(last) = out.last_mut() {
                    last.break_after = true;
                }
            }
        } else {
            out.push(Placement {
                pbox,
                break_after: pbox.page_break_after,
            });
        }
    }
}

/// Convert positioned boxes into a paginated [`LayoutConfig`].
pub fn paginate(
    boxes: &[PositionedBox],
    page_width: f32,
    page_height: f32,
    page_margin: f32,
    fonts: &FontManager,
) -> LayoutConfig {
    let mut config = LayoutConfig {
        page_width_pt: page_width,
        page_height_pt: page_height,
        ..LayoutConfig::a4()
    };

    let content_height = page_height - 2.0 * page_margin;
    let mut flat = Vec::new();
    flatten_for_pagination(boxes, content_height, &mut flat);

    let mut current_page = PageLayout::new(0);

    // Document-space y at which the current page begins. PositionedBox.y
    // values are document absolutes, so `pbox.y - page_start_doc_y` is the
    // y-on-page of any box.
    let mut page_start_doc_y = 0.0f32;

    for Placement { pbox, break_after } in flat {
        if pbox.page_break_before && !current_page.boxes.is_empty() {
            config.pages.push(current_page);
            current_page = PageLayout::new(config.pages.len());
            page_start_doc_y = pbox.y;
        }

        // Overflowing boxes move whole to a fresh page; a box taller than a
        // page is placed anyway and clipped by the page edge.
        let y_on_page = (pbox.y - page_start_doc_y).max(0.0);
        if y_on_page + pbox.height > content_height && !current_page.boxes.is_empty() {
            config.pages.push(current_page);
            current_page = PageLayout::new(config.pages.len());
            page_start_doc_y = pbox.y;
        }

        let y_on_page = (pbox.y - page_start_doc_y).max(0.0);
        current_page
            .boxes
            .push(build_layout_box(pbox, pbox.x, page_margin + y_on_page, fonts));

        if break_after {
            config.pages.push(current_page);
            current_page = PageLayout::new(config.pages.len());
            page_start_doc_y = pbox.y + pbox.height;
        }
    }

    if !current_page.boxes.is_empty() {
        config.pages.push(current_page);
    }
    if config.pages.is_empty() {
        config.pages.push(PageLayout::new(0));
    }
    log::debug!("paginated {} boxes into {} page(s)", boxes.len(), config.pages.len());
    config
}

/// Recursively build a LayoutBox tree where every box carries page-absolute
/// x/y coordinates (origin = top-left of the physical page).
///
/// PositionedBox.y values are accumulated document-space absolutes, so
/// `child.y - parent.y` is the child's offset within its parent.
fn build_layout_box(pbox: &PositionedBox, abs_x: f32, abs_y: f32, fonts: &FontManager) -> LayoutBox {
    let style = &pbox.style;
    let mut lb = LayoutBox::new(abs_x, abs_y, pbox.width, pbox.height);

    if !style.background_color.is_transparent() {
        lb.background_color = Some(style.background_color.to_array());
    }

    if style.border_width > 0.5 {
        lb.border = Some(BorderStyle {
            width: style.border_width,
            color: style.border_color.to_array(),
        });
    }

    match &pbox.content {
        BoxContent::Text { lines, .. } => {
            lb.text = Some(text_content(lines, style, pbox.width, fonts));
        }
        BoxContent::Image { src } => {
            lb.image = Some(ImageContent {
                src: src.clone(),
                width: pbox.width,
                height: pbox.height,
            });
        }
        BoxContent::None => {}
    }

    for child in &pbox.children {
        // x is already page-absolute: extraction started at the page margin.
        let child_abs_y = abs_y + (child.y - pbox.y);
        lb.children
            .push(build_layout_box(child, child.x, child_abs_y, fonts));
    }

    lb
}

/// Lay text lines out inside the padding box of a text leaf.
fn text_content(lines: &[String], style: &ComputedStyle, box_width: f32, fonts: &FontManager) -> TextContent {
    let line_height = fonts.line_height_px(style.font_size, style.line_height);
    let inner_width = (box_width - style.horizontal_padding()).max(0.0);

    let text_lines = lines
        .iter()
        .enumerate()
        .map(|(i, line)| {
            let width = fonts.measure_text_width(
                line,
                style.font_size,
                style.is_bold(),
                style.is_italic(),
                &style.font_family,
            );
            let slack = (inner_width - width).max(0.0);
            let align = match style.text_align {
                TextAlign::Left => 0.0,
                TextAlign::Center => slack / 2.0,
                TextAlign::Right => slack,
            };
            TextLine {
                text: line.clone(),
                x_offset: style.padding_left + align,
                y_offset: style.padding_top + i as f32 * line_height,
                width,
            }
        })
        .collect();

    TextContent {
        lines: text_lines,
        font_family: style.font_family.clone(),
        font_size: style.font_size,
        bold: style.is_bold(),
        italic: style.is_italic(),
        color: style.color.to_array(),
        line_height,
        text_align: style.text_align.as_str().to_string(),
        underline: style.text_decoration == crate::style::TextDecoration::Underline,
    }
}
