//! Text measurement for the builtin PDF fonts.
//!
//! Documents are drawn with the standard Helvetica faces, which never need
//! embedding, so measurement uses approximate Helvetica advance widths
//! rather than parsed font files.

use std::collections::HashMap;

/// Vertical metrics and width scale of one face, in 1/1000 em.
#[derive(Debug, Clone, Copy)]
pub struct FontMetrics {
    pub units_per_em: f32,
    pub ascender: f32,
    pub descender: f32,
    /// Multiplier applied to regular advances (bold faces run wider).
    pub width_scale: f32,
}

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct FontKey {
    pub family: String,
    pub bold: bool,
    pub italic: bool,
}

/// Registry of the faces text may be measured in.
pub struct FontManager {
    fonts: HashMap<FontKey, FontMetrics>,
    default_metrics: FontMetrics,
}

const HELVETICA: FontMetrics = FontMetrics {
    units_per_em: 1000.0,
    ascender: 718.0,
    descender: -207.0,
    width_scale: 1.0,
};

impl FontManager {
    pub fn new() -> Self {
        let mut fonts = HashMap::new();
        for bold in [false, true] {
            for italic in [false, true] {
                let metrics = FontMetrics {
                    width_scale: if bold { 1.06 } else { 1.0 },
                    ..HELVETICA
                };
                fonts.insert(
                    FontKey {
                        family: "Helvetica".to_string(),
                        bold,
                        italic,
                    },
                    metrics,
                );
            }
        }
        Self {
            fonts,
            default_metrics: HELVETICA,
        }
    }

    /// Metrics for a face, falling back to regular Helvetica.
    pub fn get(&self, key: &FontKey) -> FontMetrics {
        self.fonts
            .get(key)
            .or_else(|| {
                self.fonts.get(&FontKey {
                    family: "Helvetica".to_string(),
                    ..key.clone()
                })
            })
            .copied()
            .unwrap_or(self.default_metrics)
    }

    /// Width of `text` in px at `font_size`.
    pub fn measure_text_width(&self, text: &str, font_size: f32, bold: bool, italic: bool, family: &str) -> f32 {
        let metrics = self.get(&FontKey {
            family: family.to_string(),
            bold,
            italic,
        });
        let units: f32 = text.chars().map(advance).sum();
        units * metrics.width_scale * font_size / metrics.units_per_em
    }

    pub fn line_height_px(&self, font_size: f32, line_height_factor: f32) -> f32 {
        font_size * line_height_factor
    }

    pub fn ascender_px(&self, font_size: f32, bold: bool, italic: bool, family: &str) -> f32 {
        let metrics = self.get(&FontKey {
            family: family.to_string(),
            bold,
            italic,
        });
        metrics.ascender * font_size / metrics.units_per_em
    }
}

impl Default for FontManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Approximate Helvetica advance for one character, in 1/1000 em.
fn advance(ch: char) -> f32 {
    match ch {
        'i' | 'j' | 'l' | '\'' | '|' => 222.0,
        ' ' | '.' | ',' | ':' | ';' | '!' | 'f' | 't' | 'I' | '/' | '(' | ')' | '[' | ']' => 278.0,
        'r' | '-' => 333.0,
        '"' | '*' => 389.0,
        'm' | 'M' => 833.0,
        'w' | '%' => 722.0,
        'W' => 944.0,
        '@' => 1015.0,
        '0'..='9' | '$' | '#' | '_' | '?' => 556.0,
        'a'..='z' => 556.0,
        'A'..='Z' => 667.0,
        c if c.is_whitespace() => 278.0,
        _ => 600.0,
    }
}

/// Word-wrap text to fit within `max_width` pixels. Returns a vec of lines.
///
/// Explicit newlines always break. A single word wider than the line is
/// split between characters.
pub fn wrap_text(
    text: &str,
    font_size: f32,
    bold: bool,
    italic: bool,
    family: &str,
    max_width: f32,
    fonts: &FontManager,
) -> Vec<String> {
    if max_width <= 0.0 || text.is_empty() {
        return vec![text.to_string()];
    }
    let measure = |s: &str| fonts.measure_text_width(s, font_size, bold, italic, family);

    let mut lines: Vec<String> = Vec::new();
    for paragraph in text.split('\n') {
        let words: Vec<&str> = paragraph.split_whitespace().collect();
        if words.is_empty() {
            lines.push(String::new());
            continue;
        }

        let mut current_line = String::new();
        for word in words {
            let candidate = if current_line.is_empty() {
                word.to_string()
            } else {
                format!("{current_line} {word}")
            };
            if measure(&candidate) <= max_width {
                current_line = candidate;
                continue;
            }
            if !current_line.is_empty() {
                lines.push(std::mem::take(&mut current_line));
            }
            if measure(word) <= max_width {
                current_line = word.to_string();
                continue;
            }
            for ch in word.chars() {
                current_line.push(ch);
                if measure(&current_line) > max_width && current_line.chars().count() > 1 {
                    current_line.pop();
                    lines.push(std::mem::take(&mut current_line));
                    current_line.push(ch);
                }
            }
        }
        if !current_line.is_empty() {
            lines.push(current_line);
        }
    }

    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}
