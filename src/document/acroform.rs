//! AcroForm field catalog.
//!
//! Walks the interactive form field tree (ISO 32000-1:2008, Section 12.7)
//! and records every terminal field with its fully qualified name and the
//! widget annotations that display it.

use std::collections::HashSet;

use lopdf::{Dictionary, Document, Object, ObjectId, StringFormat};

use crate::error::{Error, Result};

/// Field flag bits (PDF Tables 221, 226, 228).
pub mod field_flags {
    /// Field is read-only (bit 1)
    pub const READ_ONLY: u32 = 1;
    /// Text field allows multiple lines (bit 13)
    pub const MULTILINE: u32 = 1 << 12;
    /// Radio button (bit 16)
    pub const RADIO: u32 = 1 << 15;
    /// Button is a push button (bit 17)
    pub const PUSH_BUTTON: u32 = 1 << 16;
    /// Choice is a combo box (bit 18)
    pub const COMBO: u32 = 1 << 17;
}

/// Field type from the /FT key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// /Tx
    Text,
    /// /Btn: checkbox, radio button or push button
    Button,
    /// /Ch: list box or combo box
    Choice,
    /// /Sig
    Signature,
}

impl FieldKind {
    fn from_name(name: &[u8]) -> Option<Self> {
        match name {
            b"Tx" => Some(FieldKind::Text),
            b"Btn" => Some(FieldKind::Button),
            b"Ch" => Some(FieldKind::Choice),
            b"Sig" => Some(FieldKind::Signature),
            _ => None,
        }
    }
}

/// A terminal form field.
#[derive(Debug, Clone)]
pub struct FormField {
    /// Fully qualified name, partial names joined with `.`
    pub name: String,
    /// Field dictionary
    pub id: ObjectId,
    /// Field type, possibly inherited
    pub kind: FieldKind,
    /// /Ff flags, possibly inherited
    pub flags: u32,
    /// /DA string, inherited from ancestors or the AcroForm
    pub default_appearance: Option<String>,
    /// /Q quadding, inherited from ancestors or the AcroForm
    pub quadding: i64,
    /// Widget annotations; the field itself when field and widget are merged
    pub widgets: Vec<ObjectId>,
}

impl FormField {
    /// Whether the field refuses edits.
    pub fn is_read_only(&self) -> bool {
        self.flags & field_flags::READ_ONLY != 0
    }

    /// Whether a text field wraps onto several lines.
    pub fn is_multiline(&self) -> bool {
        self.kind == FieldKind::Text && self.flags & field_flags::MULTILINE != 0
    }

    /// Whether a button field is a push button (no value).
    pub fn is_push_button(&self) -> bool {
        self.kind == FieldKind::Button && self.flags & field_flags::PUSH_BUTTON != 0
    }
}

/// Attributes a field inherits from its ancestors.
#[derive(Debug, Clone, Default)]
struct Inherited {
    kind: Option<FieldKind>,
    flags: u32,
    default_appearance: Option<String>,
    quadding: i64,
}

impl Inherited {
    fn merge(&self, doc: &Document, dict: &Dictionary) -> Self {
        let mut merged = self.clone();
        if let Ok(Object::Name(ft)) = dict.get(b"FT").and_then(|o| resolve(doc, o)) {
            merged.kind = FieldKind::from_name(ft);
        }
        if let Ok(Object::Integer(ff)) = dict.get(b"Ff").and_then(|o| resolve(doc, o)) {
            merged.flags = *ff as u32;
        }
        if let Some(da) = dict.get(b"DA").ok().and_then(|o| text_string(doc, o)) {
            merged.default_appearance = Some(da);
        }
        if let Ok(Object::Integer(q)) = dict.get(b"Q").and_then(|o| resolve(doc, o)) {
            merged.quadding = *q;
        }
        merged
    }
}

/// Follow one level of indirection.
pub(crate) fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> lopdf::Result<&'a Object> {
    match obj {
        Object::Reference(id) => doc.get_object(*id),
        other => Ok(other),
    }
}

/// Read a number that may be stored as an integer or a real.
pub(crate) fn number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r as f32),
        _ => None,
    }
}

/// Read a `[x1 y1 x2 y2]` rectangle, normalised so that x1 <= x2 and y1 <= y2.
pub(crate) fn rectangle(doc: &Document, obj: &Object) -> Option<[f32; 4]> {
    let array = resolve(doc, obj).ok()?.as_array().ok()?;
    if array.len() != 4 {
        return None;
    }
    let mut coords = [0.0f32; 4];
    for (slot, item) in coords.iter_mut().zip(array) {
        *slot = number(resolve(doc, item).ok()?)?;
    }
    Some([
        coords[0].min(coords[2]),
        coords[1].min(coords[3]),
        coords[0].max(coords[2]),
        coords[1].max(coords[3]),
    ])
}

/// PDFDocEncoding code points 0x18-0x1F.
const PDF_DOC_LOW: [char; 8] = ['˘', 'ˇ', 'ˆ', '˙', '˝', '˛', '˚', '˜'];

/// PDFDocEncoding code points 0x80-0xA0 (0x9F is undefined).
const PDF_DOC_HIGH: [char; 33] = [
    '•', '†', '‡', '…', '—', '–', 'ƒ', '⁄', '‹', '›', '−', '‰', '„', '“', '”', '‘', '’', '‚', '™',
    'ﬁ', 'ﬂ', 'Ł', 'Œ', 'Š', 'Ÿ', 'Ž', 'ı', 'ł', 'œ', 'š', 'ž', '\u{FFFD}', '€',
];

/// Decode a PDF text string: UTF-16BE with BOM, UTF-8 with BOM, or PDFDocEncoding.
pub(crate) fn decode_text_string(bytes: &[u8]) -> String {
    if let Some(utf16) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = utf16
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    if let Some(utf8) = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]) {
        return String::from_utf8_lossy(utf8).into_owned();
    }
    bytes
        .iter()
        .map(|&b| match b {
            0x18..=0x1F => PDF_DOC_LOW[(b - 0x18) as usize],
            0x80..=0xA0 => PDF_DOC_HIGH[(b - 0x80) as usize],
            _ => b as char,
        })
        .collect()
}

/// Encode a text string object: PDFDocEncoding when every character maps to
/// the same Latin-1 byte, UTF-16BE with BOM otherwise.
pub(crate) fn encode_text_string(text: &str) -> Object {
    let latin = |c: char| {
        matches!(c, '\t' | '\n' | '\r' | ' '..='~') || matches!(c as u32, 0xA1..=0xFF if c != '\u{AD}')
    };
    if text.chars().all(latin) {
        return Object::String(text.chars().map(|c| c as u8).collect(), StringFormat::Literal);
    }
    let mut bytes = vec![0xFE, 0xFF];
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    Object::String(bytes, StringFormat::Hexadecimal)
}

/// Read a text string, following a reference if needed.
pub(crate) fn text_string(doc: &Document, obj: &Object) -> Option<String> {
    match resolve(doc, obj).ok()? {
        Object::String(bytes, _) => Some(decode_text_string(bytes)),
        _ => None,
    }
}

/// Object id of the document catalog.
pub(crate) fn catalog_id(doc: &Document) -> Result<ObjectId> {
    doc.trailer
        .get(b"Root")
        .and_then(Object::as_reference)
        .map_err(|_| Error::Document("trailer has no /Root catalog".to_string()))
}

/// The /AcroForm dictionary, if the document has one.
pub(crate) fn acroform(doc: &Document) -> Result<Option<&Dictionary>> {
    let catalog = doc.get_dictionary(catalog_id(doc)?)?;
    match catalog.get(b"AcroForm") {
        Ok(obj) => Ok(Some(resolve(doc, obj)?.as_dict()?)),
        Err(_) => Ok(None),
    }
}

/// Mutable /AcroForm dictionary, wherever it is stored.
pub(crate) fn acroform_mut(doc: &mut Document) -> Result<&mut Dictionary> {
    let catalog_id = catalog_id(doc)?;
    let reference = match doc.get_dictionary(catalog_id)?.get(b"AcroForm") {
        Ok(Object::Reference(id)) => Some(*id),
        Ok(_) => None,
        Err(_) => return Err(Error::Document("document has no AcroForm".to_string())),
    };
    match reference {
        Some(id) => Ok(doc.get_dictionary_mut(id)?),
        None => Ok(doc
            .get_dictionary_mut(catalog_id)?
            .get_mut(b"AcroForm")?
            .as_dict_mut()?),
    }
}

/// Look up a font resource by name in the AcroForm default resources (/DR).
pub(crate) fn resource_font(doc: &Document, name: &str) -> Result<Option<Object>> {
    let Some(form) = acroform(doc)? else {
        return Ok(None);
    };
    let fonts = form
        .get(b"DR")
        .and_then(|dr| resolve(doc, dr))
        .and_then(Object::as_dict)
        .and_then(|dr| dr.get(b"Font"))
        .and_then(|fonts| resolve(doc, fonts))
        .and_then(Object::as_dict);
    Ok(fonts.ok().and_then(|f| f.get(name.as_bytes()).ok()).cloned())
}

/// Register a font under `name` in the AcroForm default resources (/DR /Font).
pub(crate) fn add_resource_font(doc: &mut Document, name: &str, font: ObjectId) -> Result<()> {
    let (dr_ref, font_ref) = {
        let form = acroform(doc)?
            .ok_or_else(|| Error::Document("document has no AcroForm".to_string()))?;
        let dr_ref = match form.get(b"DR") {
            Ok(Object::Reference(id)) => Some(*id),
            _ => None,
        };
        let dr = match form.get(b"DR") {
            Ok(obj) => resolve(doc, obj).ok().and_then(|o| o.as_dict().ok()),
            Err(_) => None,
        };
        let font_ref = match dr.map(|d| d.get(b"Font")) {
            Some(Ok(Object::Reference(id))) => Some(*id),
            _ => None,
        };
        (dr_ref, font_ref)
    };

    if let Some(id) = font_ref {
        doc.get_dictionary_mut(id)?.set(name, font);
        return Ok(());
    }

    let dr = match dr_ref {
        Some(id) => doc.get_dictionary_mut(id)?,
        None => {
            let form = acroform_mut(doc)?;
            if !form.has(b"DR") {
                form.set("DR", Dictionary::new());
            }
            form.get_mut(b"DR")?.as_dict_mut()?
        },
    };
    if !dr.has(b"Font") {
        dr.set("Font", Dictionary::new());
    }
    dr.get_mut(b"Font")?.as_dict_mut()?.set(name, font);
    Ok(())
}

/// Collect all terminal fields of the document, in field tree order.
///
/// Documents without an AcroForm have no fields.
pub fn collect_fields(doc: &Document) -> Result<Vec<FormField>> {
    let Some(form) = acroform(doc)? else {
        return Ok(Vec::new());
    };

    let roots = match form.get(b"Fields") {
        Ok(obj) => resolve(doc, obj)?
            .as_array()
            .map_err(|_| Error::Document("AcroForm /Fields is not an array".to_string()))?,
        Err(_) => return Ok(Vec::new()),
    };

    let defaults = Inherited {
        default_appearance: form.get(b"DA").ok().and_then(|o| text_string(doc, o)),
        quadding: match form.get(b"Q") {
            Ok(Object::Integer(q)) => *q,
            _ => 0,
        },
        ..Inherited::default()
    };

    let mut visited = HashSet::new();
    let mut result = Vec::new();
    for root in roots {
        match root {
            Object::Reference(id) => {
                walk(doc, *id, "", &defaults, &mut visited, &mut result);
            },
            _ => log::debug!("skipping direct field object in /Fields"),
        }
    }

    log::debug!("form has {} terminal fields", result.len());
    Ok(result)
}

fn walk(
    doc: &Document,
    id: ObjectId,
    parent_name: &str,
    inherited: &Inherited,
    visited: &mut HashSet<ObjectId>,
    result: &mut Vec<FormField>,
) {
    if !visited.insert(id) {
        log::warn!("field tree revisits object {} {} R, ignoring", id.0, id.1);
        return;
    }
    let dict = match doc.get_dictionary(id) {
        Ok(dict) => dict,
        Err(e) => {
            log::warn!("field {} {} R is unreadable: {}", id.0, id.1, e);
            return;
        },
    };

    let partial_name = dict.get(b"T").ok().and_then(|o| text_string(doc, o));
    let name = match partial_name {
        Some(partial) if parent_name.is_empty() => partial,
        Some(partial) => format!("{}.{}", parent_name, partial),
        None => parent_name.to_string(),
    };
    let inherited = inherited.merge(doc, dict);

    let mut widgets = Vec::new();
    let mut has_child_fields = false;
    let kids = dict
        .get(b"Kids")
        .and_then(|k| resolve(doc, k))
        .and_then(Object::as_array);

    match kids {
        Ok(kids) => {
            for kid in kids {
                let Object::Reference(kid_id) = kid else {
                    continue;
                };
                let is_field = doc
                    .get_dictionary(*kid_id)
                    .map(|kid_dict| kid_dict.has(b"T"))
                    .unwrap_or(false);
                if is_field {
                    has_child_fields = true;
                    walk(doc, *kid_id, &name, &inherited, visited, result);
                } else {
                    widgets.push(*kid_id);
                }
            }
        },
        Err(_) => widgets.push(id),
    }

    if has_child_fields || name.is_empty() {
        return;
    }
    if let Some(kind) = inherited.kind {
        result.push(FormField {
            name,
            id,
            kind,
            flags: inherited.flags,
            default_appearance: inherited.default_appearance,
            quadding: inherited.quadding,
            widgets,
        });
    }
}
