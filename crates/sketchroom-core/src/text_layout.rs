//! Greedy word wrapping for text shapes.
//!
//! Wrapping, rendering and hit-testing all measure text through the same
//! [`TextMeasure`] implementation, so a line that renders on one row is hit
//! on that row too.

use kurbo::Point;

/// Line height as a multiple of the font size.
pub const LINE_HEIGHT_FACTOR: f64 = 1.2;

/// Measures the advance width of a run of text.
pub trait TextMeasure {
    /// Width in world units of `text` set at `font_size` in `font_family`.
    fn measure(&self, text: &str, font_size: f64, font_family: &str) -> f64;
}

/// Fixed-advance metrics: every character is `advance * font_size` wide.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonospaceMeasure {
    pub advance: f64,
}

impl Default for MonospaceMeasure {
    fn default() -> Self {
        Self { advance: 0.6 }
    }
}

impl TextMeasure for MonospaceMeasure {
    fn measure(&self, text: &str, font_size: f64, _font_family: &str) -> f64 {
        text.chars().count() as f64 * self.advance * font_size
    }
}

/// Font parameters that affect layout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontSpec<'a> {
    pub size: f64,
    pub family: &'a str,
}

impl FontSpec<'_> {
    pub fn line_height(&self) -> f64 {
        self.size * LINE_HEIGHT_FACTOR
    }
}

/// One laid-out line, positioned at its top-left corner.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLine {
    pub text: String,
    pub origin: Point,
}

/// Wrap `text` into lines no wider than `max_width`, starting at `origin`.
///
/// Words are accumulated while the measured line still fits. A word that is
/// wider than `max_width` on its own is split character by character. Blank
/// paragraphs advance by one line height without producing a line.
pub fn wrap_text(
    text: &str,
    max_width: f64,
    font: FontSpec<'_>,
    origin: Point,
    measure: &dyn TextMeasure,
) -> Vec<TextLine> {
    let width_of = |s: &str| measure.measure(s, font.size, font.family);
    let line_height = font.line_height();

    let mut lines = Vec::new();
    let mut y = origin.y;
    let mut push = |text: String, y: f64| {
        lines.push(TextLine {
            text,
            origin: Point::new(origin.x, y),
        })
    };

    for paragraph in text.split('\n') {
        if paragraph.is_empty() {
            y += line_height;
            continue;
        }

        let mut line = String::new();
        for word in paragraph.split(' ') {
            let candidate = if line.is_empty() {
                word.to_string()
            } else {
                format!("{line} {word}")
            };

            if width_of(&candidate) <= max_width {
                line = candidate;
                continue;
            }

            if !line.is_empty() {
                push(std::mem::take(&mut line), y);
                y += line_height;
            }

            if width_of(word) <= max_width {
                line = word.to_string();
                continue;
            }

            // Hard split an oversized word.
            let mut fragment = String::new();
            for ch in word.chars() {
                fragment.push(ch);
                if width_of(&fragment) > max_width {
                    fragment.pop();
                    push(std::mem::take(&mut fragment), y);
                    y += line_height;
                    fragment.push(ch);
                }
            }
            line = fragment;
        }

        if !line.is_empty() {
            push(line, y);
        }
        y += line_height;
    }

    lines
}
