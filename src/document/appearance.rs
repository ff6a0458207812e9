//! Appearance streams for filled text and choice fields.
//!
//! A widget shows its normal appearance stream (/AP /N), not /V, so every
//! new value needs a new stream. Layout is deliberately simple: one line per
//! paragraph for multiline fields, no wrapping, no comb or rich text.

use std::fmt::Write as _;

use crate::error::Result;
use crate::fields::PARAGRAPH_SEPARATOR;

/// Default appearance used when neither field nor form defines /DA.
pub const DEFAULT_APPEARANCE: &str = "/Helv 0 Tf 0 g";

/// Padding between the widget border and the text, in points.
const PADDING: f32 = 2.0;
/// Line height as a multiple of the font size.
const LEADING: f32 = 1.15;
/// Font size used for auto-sized (size 0) fields at most.
const MAX_AUTO_SIZE: f32 = 12.0;
const MIN_AUTO_SIZE: f32 = 4.0;

/// Parsed /DA string: font resource, size and colour operator.
#[derive(Debug, Clone, PartialEq)]
pub struct DefaultAppearance {
    /// Font resource name, without the leading slash
    pub font: String,
    /// Font size; 0 means auto
    pub size: f32,
    /// Colour operator with operands, e.g. `0 g` or `0 0 1 rg`
    pub color: String,
}

impl DefaultAppearance {
    /// Parse a /DA string. Missing parts fall back to `/Helv 0 Tf 0 g`.
    pub fn parse(da: &str) -> Self {
        let tokens: Vec<&str> = da.split_whitespace().collect();
        let mut parsed = Self {
            font: "Helv".to_string(),
            size: 0.0,
            color: "0 g".to_string(),
        };

        for (i, token) in tokens.iter().enumerate() {
            let operands = match *token {
                "Tf" if i >= 2 => {
                    parsed.font = tokens[i - 2].trim_start_matches('/').to_string();
                    parsed.size = tokens[i - 1].parse().unwrap_or(0.0);
                    continue;
                },
                "g" => 1,
                "rg" => 3,
                "k" => 4,
                _ => continue,
            };
            if i >= operands {
                parsed.color = tokens[i - operands..=i].join(" ");
            }
        }

        parsed
    }

    /// Render back to a /DA string.
    pub fn to_da_string(&self) -> String {
        format!("/{} {} Tf {}", self.font, format_number(self.size), self.color)
    }
}

/// Horizontal alignment from /Q.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    /// Q = 0
    Left,
    /// Q = 1
    Center,
    /// Q = 2
    Right,
}

impl Alignment {
    /// Map a /Q value; anything unknown is left-aligned.
    pub fn from_quadding(q: i64) -> Self {
        match q {
            1 => Alignment::Center,
            2 => Alignment::Right,
            _ => Alignment::Left,
        }
    }
}

/// Turns text into string operands for a particular font.
pub trait GlyphEncoder {
    /// Encode one line as a complete string operand (`(...)` or `<...>`)
    /// and return it with its advance width in 1/1000 em.
    fn encode_line(&mut self, line: &str) -> Result<(Vec<u8>, f32)>;
}

/// Encoder for the standard 14 fonts with WinAnsiEncoding.
///
/// Characters without a WinAnsi code are drawn as `?` and counted.
#[derive(Debug, Default)]
pub struct WinAnsiEncoder {
    /// Characters that had to be replaced
    pub missing: usize,
}

/// Average Helvetica advance, used for alignment only.
const WIN_ANSI_AVERAGE_WIDTH: f32 = 556.0;

impl GlyphEncoder for WinAnsiEncoder {
    fn encode_line(&mut self, line: &str) -> Result<(Vec<u8>, f32)> {
        let mut operand = vec![b'('];
        let mut count = 0usize;
        for c in line.chars() {
            let byte = win_ansi_byte(c).unwrap_or_else(|| {
                self.missing += 1;
                b'?'
            });
            match byte {
                b'(' | b')' | b'\\' => operand.extend_from_slice(&[b'\\', byte]),
                0x20..=0x7E => operand.push(byte),
                _ => operand.extend_from_slice(format!("\\{:03o}", byte).as_bytes()),
            }
            count += 1;
        }
        operand.push(b')');
        Ok((operand, count as f32 * WIN_ANSI_AVERAGE_WIDTH))
    }
}

/// WinAnsiEncoding byte for a character.
fn win_ansi_byte(c: char) -> Option<u8> {
    let code = c as u32;
    match code {
        0x20..=0x7E | 0xA0..=0xFF => Some(code as u8),
        _ => {
            let byte = match c {
                '€' => 0x80,
                '‚' => 0x82,
                'ƒ' => 0x83,
                '„' => 0x84,
                '…' => 0x85,
                '†' => 0x86,
                '‡' => 0x87,
                'ˆ' => 0x88,
                '‰' => 0x89,
                'Š' => 0x8A,
                '‹' => 0x8B,
                'Œ' => 0x8C,
                'Ž' => 0x8E,
                '‘' => 0x91,
                '’' => 0x92,
                '“' => 0x93,
                '”' => 0x94,
                '•' => 0x95,
                '–' => 0x96,
                '—' => 0x97,
                '˜' => 0x98,
                '™' => 0x99,
                'š' => 0x9A,
                '›' => 0x9B,
                'œ' => 0x9C,
                'ž' => 0x9E,
                'Ÿ' => 0x9F,
                _ => return None,
            };
            Some(byte)
        },
    }
}

/// What to draw inside one widget.
#[derive(Debug, Clone)]
pub struct TextBox<'a> {
    /// Widget width in points
    pub width: f32,
    /// Widget height in points
    pub height: f32,
    /// Font, size and colour
    pub appearance: &'a DefaultAppearance,
    /// Horizontal alignment
    pub alignment: Alignment,
    /// Lay out one line per paragraph instead of joining them
    pub multiline: bool,
}

impl TextBox<'_> {
    /// Split a value into the lines that will be drawn.
    fn lines<'v>(&self, value: &'v str) -> Vec<std::borrow::Cow<'v, str>> {
        let is_break = |c: char| c == '\n' || c == '\r' || c == PARAGRAPH_SEPARATOR;
        if self.multiline {
            value
                .split("\r\n")
                .flat_map(|chunk| chunk.split(is_break))
                .map(std::borrow::Cow::Borrowed)
                .collect()
        } else if value.contains(is_break) {
            vec![std::borrow::Cow::Owned(value.replace(is_break, " "))]
        } else {
            vec![std::borrow::Cow::Borrowed(value)]
        }
    }

    fn font_size(&self, line_count: usize) -> f32 {
        if self.appearance.size > 0.0 {
            return self.appearance.size;
        }
        let usable = (self.height - 2.0 * PADDING).max(0.0);
        (usable / (line_count.max(1) as f32 * LEADING)).clamp(MIN_AUTO_SIZE, MAX_AUTO_SIZE)
    }

    /// Build the content stream of the normal appearance.
    pub fn render(&self, value: &str, encoder: &mut dyn GlyphEncoder) -> Result<Vec<u8>> {
        let lines = self.lines(value);
        let size = self.font_size(lines.len());
        let leading = size * LEADING;

        let mut content = Vec::new();
        let mut header = String::new();
        let _ = writeln!(header, "/Tx BMC\nq");
        let _ = writeln!(
            header,
            "1 1 {} {} re W n",
            format_number((self.width - 2.0).max(0.0)),
            format_number((self.height - 2.0).max(0.0))
        );
        let _ = writeln!(header, "BT\n{}", self.appearance.color);
        let _ = writeln!(header, "/{} {} Tf", self.appearance.font, format_number(size));
        content.extend_from_slice(header.as_bytes());

        let first_baseline = if self.multiline {
            self.height - PADDING - size * 0.9
        } else {
            (self.height - size) / 2.0 + size * 0.22
        };

        for (index, line) in lines.iter().enumerate() {
            let (operand, width_units) = encoder.encode_line(line)?;
            let text_width = width_units * size / 1000.0;
            let x = match self.alignment {
                Alignment::Left => PADDING,
                Alignment::Center => ((self.width - text_width) / 2.0).max(PADDING),
                Alignment::Right => (self.width - PADDING - text_width).max(PADDING),
            };
            let y = first_baseline - leading * index as f32;
            content.extend_from_slice(
                format!("1 0 0 1 {} {} Tm\n", format_number(x), format_number(y)).as_bytes(),
            );
            content.extend_from_slice(&operand);
            content.extend_from_slice(b" Tj\n");
        }

        content.extend_from_slice(b"ET\nQ\nEMC\n");
        Ok(content)
    }
}

/// Format a coordinate without trailing zeros.
pub(crate) fn format_number(value: f32) -> String {
    let text = format!("{:.2}", value);
    let text = text.trim_end_matches('0').trim_end_matches('.');
    if text.is_empty() || text == "-" || text == "-0" {
        "0".to_string()
    } else {
        text.to_string()
    }
}
