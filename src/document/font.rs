//! Substitution font for values outside Latin-1.
//!
//! The standard 14 fonts only cover WinAnsiEncoding. A TrueType/OpenType
//! font supplied by the user is embedded as a composite font so Cyrillic,
//! Greek, CJK and other scripts render in the filled fields.
//!
//! # Font Embedding in PDF
//!
//! Per ISO 32000-1:2008 Sections 9.6-9.8 the embedded font consists of:
//! - Type0 font with Identity-H encoding (2-byte glyph IDs in strings)
//! - CIDFontType2 descendant with a `W` widths array
//! - FontDescriptor with metrics and the FontFile2 program
//! - ToUnicode CMap so filled text stays extractable

use std::collections::BTreeMap;
use std::path::Path;

use lopdf::{dictionary, Document, Object, ObjectId, Stream};
use ttf_parser::{name_id, Face, GlyphId};

use super::appearance::GlyphEncoder;
use crate::error::{Error, Result};

/// A TrueType/OpenType font to draw field values with.
#[derive(Debug, Clone)]
pub struct SubstitutionFont {
    data: Vec<u8>,
    postscript_name: String,
}

impl SubstitutionFont {
    /// Load and validate a font file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|e| Error::from_open(e, path))?;
        log::debug!("loaded substitution font {} ({} bytes)", path.display(), data.len());
        Self::from_bytes(data)
    }

    /// Validate raw font bytes (first face of a collection).
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        if data.is_empty() {
            return Err(Error::Font("font file is empty".to_string()));
        }
        let face = Face::parse(&data, 0).map_err(|e| Error::Font(e.to_string()))?;
        if face.tables().glyf.is_none() {
            return Err(Error::Font(
                "only TrueType outlines (glyf) can be embedded as FontFile2".to_string(),
            ));
        }
        let postscript_name = face
            .names()
            .into_iter()
            .filter(|name| name.name_id == name_id::POST_SCRIPT_NAME)
            // Mac Roman records do not decode, keep looking for a Unicode one
            .find_map(|name| name.to_string())
            .map(|name| name.chars().filter(|c| c.is_ascii_graphic()).collect::<String>())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| "SubstitutionFont".to_string());
        drop(face);

        Ok(Self {
            data,
            postscript_name,
        })
    }

    /// PostScript name used as /BaseFont.
    pub fn postscript_name(&self) -> &str {
        &self.postscript_name
    }

    fn face(&self) -> Result<Face<'_>> {
        Face::parse(&self.data, 0).map_err(|e| Error::Font(e.to_string()))
    }
}

/// A substitution font bound to a document, recording the glyphs it draws.
#[derive(Debug)]
pub struct EmbeddedFont {
    font: SubstitutionFont,
    /// Object reserved for the Type0 font dictionary
    pub(crate) font_id: ObjectId,
    /// Glyph ID -> (character, width in 1/1000 em)
    used: BTreeMap<u16, (char, u16)>,
    /// Characters the font has no glyph for
    pub(crate) missing: usize,
}

impl EmbeddedFont {
    /// Bind `font` to the object id its Type0 dictionary will occupy.
    pub fn new(font: SubstitutionFont, font_id: ObjectId) -> Self {
        Self {
            font,
            font_id,
            used: BTreeMap::new(),
            missing: 0,
        }
    }

    /// Write the font objects into the document at the reserved id.
    pub fn write(self, doc: &mut Document) -> Result<()> {
        let face = self.font.face()?;
        let scale = 1000.0 / face.units_per_em() as f32;
        let to_pdf_units = |v: i16| (v as f32 * scale).round() as i64;
        let bbox = face.global_bounding_box();
        let base_font = self.font.postscript_name().to_string();

        let program_id = doc.add_object(Stream::new(
            dictionary! { "Length1" => self.font.data.len() as i64 },
            self.font.data.clone(),
        ));

        let mut flags = 32; // Nonsymbolic
        if face.is_italic() {
            flags |= 1 << 6;
        }
        let descriptor_id = doc.add_object(dictionary! {
            "Type" => "FontDescriptor",
            "FontName" => Object::Name(base_font.clone().into_bytes()),
            "Flags" => flags,
            "FontBBox" => vec![
                to_pdf_units(bbox.x_min).into(),
                to_pdf_units(bbox.y_min).into(),
                to_pdf_units(bbox.x_max).into(),
                to_pdf_units(bbox.y_max).into(),
            ],
            "ItalicAngle" => face.italic_angle().unwrap_or(0.0),
            "Ascent" => to_pdf_units(face.ascender()),
            "Descent" => to_pdf_units(face.descender()),
            "CapHeight" => to_pdf_units(face.capital_height().unwrap_or(face.ascender())),
            "StemV" => if face.is_bold() { 140 } else { 80 },
            "FontFile2" => program_id,
        });

        let cid_font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "CIDFontType2",
            "BaseFont" => Object::Name(base_font.clone().into_bytes()),
            "CIDSystemInfo" => dictionary! {
                "Registry" => Object::string_literal("Adobe"),
                "Ordering" => Object::string_literal("Identity"),
                "Supplement" => 0,
            },
            "FontDescriptor" => descriptor_id,
            "DW" => 1000,
            "W" => self.widths_array(),
            "CIDToGIDMap" => "Identity",
        });

        let to_unicode_id = doc.add_object(Stream::new(
            dictionary! {},
            self.to_unicode_cmap().into_bytes(),
        ));

        doc.objects.insert(
            self.font_id,
            Object::Dictionary(dictionary! {
                "Type" => "Font",
                "Subtype" => "Type0",
                "BaseFont" => Object::Name(base_font.into_bytes()),
                "Encoding" => "Identity-H",
                "DescendantFonts" => vec![cid_font_id.into()],
                "ToUnicode" => to_unicode_id,
            }),
        );

        log::debug!(
            "embedded substitution font {} with {} glyphs",
            self.font.postscript_name(),
            self.used.len()
        );
        Ok(())
    }

    /// CID widths array for the W entry, consecutive glyphs grouped.
    fn widths_array(&self) -> Vec<Object> {
        let mut result = Vec::new();
        let mut run: Option<(u16, Vec<Object>)> = None;
        let mut previous: Option<u16> = None;

        for (&gid, &(_, width)) in &self.used {
            let continues = previous.is_some_and(|p| p + 1 == gid);
            if !continues {
                if let Some((start, widths)) = run.take() {
                    result.push(Object::Integer(start as i64));
                    result.push(Object::Array(widths));
                }
                run = Some((gid, Vec::new()));
            }
            if let Some((_, widths)) = run.as_mut() {
                widths.push(Object::Integer(width as i64));
            }
            previous = Some(gid);
        }
        if let Some((start, widths)) = run {
            result.push(Object::Integer(start as i64));
            result.push(Object::Array(widths));
        }
        result
    }

    /// ToUnicode CMap mapping the glyph IDs used back to characters.
    fn to_unicode_cmap(&self) -> String {
        let mut cmap = String::new();
        cmap.push_str("/CIDInit /ProcSet findresource begin\n");
        cmap.push_str("12 dict begin\n");
        cmap.push_str("begincmap\n");
        cmap.push_str("/CIDSystemInfo << /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def\n");
        cmap.push_str("/CMapName /Adobe-Identity-UCS def\n");
        cmap.push_str("/CMapType 2 def\n");
        cmap.push_str("1 begincodespacerange\n<0000> <FFFF>\nendcodespacerange\n");

        let mappings: Vec<(u16, char)> = self.used.iter().map(|(&gid, &(c, _))| (gid, c)).collect();
        for chunk in mappings.chunks(100) {
            cmap.push_str(&format!("{} beginbfchar\n", chunk.len()));
            for &(gid, c) in chunk {
                let mut units = [0u16; 2];
                let hex: String = c
                    .encode_utf16(&mut units)
                    .iter()
                    .map(|u| format!("{:04X}", u))
                    .collect();
                cmap.push_str(&format!("<{:04X}> <{}>\n", gid, hex));
            }
            cmap.push_str("endbfchar\n");
        }

        cmap.push_str("endcmap\n");
        cmap.push_str("CMapName currentdict /CMap defineresource pop\n");
        cmap.push_str("end\nend\n");
        cmap
    }
}

impl GlyphEncoder for EmbeddedFont {
    fn encode_line(&mut self, line: &str) -> Result<(Vec<u8>, f32)> {
        let face = self.font.face()?;
        let scale = 1000.0 / face.units_per_em() as f32;

        let mut operand = String::with_capacity(line.len() * 4 + 2);
        operand.push('<');
        let mut width = 0.0;
        for c in line.chars() {
            let glyph = match face.glyph_index(c) {
                Some(glyph) => glyph,
                None => {
                    self.missing += 1;
                    GlyphId(0)
                },
            };
            let advance = face.glyph_hor_advance(glyph).unwrap_or(0) as f32 * scale;
            width += advance;
            if glyph.0 != 0 {
                self.used.insert(glyph.0, (c, advance.round() as u16));
            }
            operand.push_str(&format!("{:04X}", glyph.0));
        }
        operand.push('>');
        Ok((operand.into_bytes(), width))
    }
}

/// Helvetica with WinAnsiEncoding, the fallback /Helv resource.
pub(crate) fn helvetica() -> Object {
    Object::Dictionary(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    })
}
