//! The form document: field catalog, value assignment and serialization.
//!
//! [`FormDocument`] is what the fill step needs from a document. [`PdfForm`]
//! implements it on top of `lopdf`:
//!
//! - text and choice values get a fresh appearance stream per widget
//! - button values select an appearance state
//! - an optional [`SubstitutionFont`] is embedded for non-Latin values
//! - finalization either marks appearances for regeneration or flattens

mod acroform;
mod appearance;
mod flatten;
mod font;

use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::Path;

use indexmap::IndexSet;
use lopdf::{dictionary, Document, Object, ObjectId, Stream};

pub use acroform::{collect_fields, field_flags, FieldKind, FormField};
pub use appearance::{Alignment, DefaultAppearance, GlyphEncoder, TextBox, WinAnsiEncoder};
pub use flatten::flatten_form;
pub use font::{EmbeddedFont, SubstitutionFont};

use crate::error::{Error, Result};
use acroform::{
    acroform, acroform_mut, add_resource_font, encode_text_string, rectangle, resolve,
    resource_font,
};
use appearance::DEFAULT_APPEARANCE;

/// Resource name the substitution font is registered under in /DR /Font.
pub const SUBSTITUTION_FONT_NAME: &str = "SubF";

/// Resource name of the Helvetica fallback.
const HELVETICA_NAME: &str = "Helv";

/// What happened to one assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOutcome {
    /// The value was stored and its appearance updated
    Filled,
    /// No field has this name
    UnknownField,
    /// The field is read-only
    ReadOnly,
    /// Signature fields and push buttons take no value
    Unsupported,
}

impl SetOutcome {
    /// Human readable reason for a skipped assignment.
    pub fn describe(&self) -> &'static str {
        match self {
            SetOutcome::Filled => "filled",
            SetOutcome::UnknownField => "no such field in the document",
            SetOutcome::ReadOnly => "field is read-only",
            SetOutcome::Unsupported => "field type takes no value",
        }
    }
}

/// A document with an interactive form.
pub trait FormDocument {
    /// Fully qualified names of all terminal fields, in field tree order.
    fn field_names(&self) -> Vec<String>;

    /// Assign `value` to every field named `name`.
    fn set_field(&mut self, name: &str, value: &str) -> Result<SetOutcome>;

    /// Draw subsequently set values with `font`.
    fn substitute_font(&mut self, font: SubstitutionFont) -> Result<()>;

    /// Serialize the document into `sink`, flattening the form if asked.
    fn finalize<W: Write>(self, flatten: bool, sink: W) -> Result<()>
    where
        Self: Sized;
}

/// A PDF form backed by a `lopdf` document.
#[derive(Debug)]
pub struct PdfForm {
    doc: Document,
    fields: Vec<FormField>,
    font: Option<EmbeddedFont>,
}

impl PdfForm {
    /// Open a PDF file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| Error::from_open(e, path))?;
        log::debug!("opening {}", path.display());
        Self::from_reader(BufReader::new(file))
    }

    /// Parse a PDF from any reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let doc = Document::load_from(reader).map_err(|e| Error::Document(e.to_string()))?;
        Self::from_document(doc)
    }

    /// Wrap an already loaded document.
    pub fn from_document(doc: Document) -> Result<Self> {
        if doc.is_encrypted() {
            return Err(Error::Document("encrypted documents are not supported".to_string()));
        }
        let fields = collect_fields(&doc)?;
        Ok(Self {
            doc,
            fields,
            font: None,
        })
    }

    /// Terminal fields of the form.
    pub fn fields(&self) -> &[FormField] {
        &self.fields
    }

    /// The underlying document.
    pub fn document(&self) -> &Document {
        &self.doc
    }

    fn set_one(&mut self, field: &FormField, value: &str) -> Result<SetOutcome> {
        if field.is_read_only() {
            return Ok(SetOutcome::ReadOnly);
        }
        match field.kind {
            FieldKind::Signature => Ok(SetOutcome::Unsupported),
            FieldKind::Button if field.is_push_button() => Ok(SetOutcome::Unsupported),
            FieldKind::Button => {
                self.set_button(field, value)?;
                Ok(SetOutcome::Filled)
            },
            FieldKind::Text | FieldKind::Choice => {
                self.set_text(field, value)?;
                Ok(SetOutcome::Filled)
            },
        }
    }

    /// Select the appearance state named `value` on every widget.
    fn set_button(&mut self, field: &FormField, value: &str) -> Result<()> {
        let state = value.as_bytes().to_vec();
        for &widget in &field.widgets {
            let on = self.widget_has_state(widget, &state);
            let shown = if on { state.clone() } else { b"Off".to_vec() };
            self.doc.get_dictionary_mut(widget)?.set("AS", Object::Name(shown));
        }
        if !field.widgets.iter().any(|&w| self.widget_has_state(w, &state)) && value != "Off" {
            log::warn!("field '{}' has no appearance state '{}'", field.name, value);
        }
        self.doc.get_dictionary_mut(field.id)?.set("V", Object::Name(state));
        Ok(())
    }

    fn widget_has_state(&self, widget: ObjectId, state: &[u8]) -> bool {
        self.doc
            .get_dictionary(widget)
            .and_then(|w| w.get(b"AP"))
            .and_then(|ap| resolve(&self.doc, ap))
            .and_then(Object::as_dict)
            .and_then(|ap| ap.get(b"N"))
            .and_then(|n| resolve(&self.doc, n))
            .and_then(Object::as_dict)
            .map(|states| states.has(state))
            .unwrap_or(false)
    }

    /// Store a text value and regenerate the widgets' normal appearances.
    fn set_text(&mut self, field: &FormField, value: &str) -> Result<()> {
        let mut appearance =
            DefaultAppearance::parse(field.default_appearance.as_deref().unwrap_or(DEFAULT_APPEARANCE));

        let font_resource = match self.font.as_ref().map(|font| font.font_id) {
            Some(font_id) => {
                appearance.font = SUBSTITUTION_FONT_NAME.to_string();
                Object::Reference(font_id)
            },
            None => match resource_font(&self.doc, &appearance.font)? {
                Some(font) => font,
                None => {
                    log::debug!(
                        "font /{} of field '{}' is not in /DR, using Helvetica",
                        appearance.font,
                        field.name
                    );
                    appearance.font = HELVETICA_NAME.to_string();
                    self.helvetica_resource()?
                },
            },
        };

        let field_dict = self.doc.get_dictionary_mut(field.id)?;
        field_dict.set("V", encode_text_string(value));
        if self.font.is_some() {
            field_dict.set("DA", Object::string_literal(appearance.to_da_string()));
            // Widgets may carry their own /DA, which viewers prefer over the field's
            for &widget in &field.widgets {
                let widget_dict = self.doc.get_dictionary_mut(widget)?;
                let own = match widget_dict.get(b"DA") {
                    Ok(Object::String(da, _)) => DefaultAppearance::parse(&String::from_utf8_lossy(da)),
                    _ => continue,
                };
                let substituted = DefaultAppearance {
                    font: SUBSTITUTION_FONT_NAME.to_string(),
                    ..own
                };
                widget_dict.set("DA", Object::string_literal(substituted.to_da_string()));
            }
        }

        let mut win_ansi = WinAnsiEncoder::default();
        for &widget in &field.widgets {
            let rect = self
                .doc
                .get_dictionary(widget)?
                .get(b"Rect")
                .ok()
                .and_then(|r| rectangle(&self.doc, r));
            let Some(rect) = rect else {
                log::warn!("widget of field '{}' has no usable /Rect", field.name);
                continue;
            };
            let (width, height) = (rect[2] - rect[0], rect[3] - rect[1]);

            let text_box = TextBox {
                width,
                height,
                appearance: &appearance,
                alignment: Alignment::from_quadding(field.quadding),
                multiline: field.is_multiline(),
            };
            let content = match self.font.as_mut() {
                Some(font) => text_box.render(value, font)?,
                None => text_box.render(value, &mut win_ansi)?,
            };

            let stream = Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Form",
                    "BBox" => vec![0.into(), 0.into(), Object::Real(width), Object::Real(height)],
                    "Resources" => dictionary! {
                        "Font" => dictionary! {
                            appearance.font.as_str() => font_resource.clone(),
                        },
                    },
                },
                content,
            );
            let stream_id = self.doc.add_object(stream);
            self.doc
                .get_dictionary_mut(widget)?
                .set("AP", dictionary! { "N" => stream_id });
        }

        if win_ansi.missing > 0 {
            log::warn!(
                "field '{}': {} characters have no glyph in /{}; use a substitution font",
                field.name,
                win_ansi.missing,
                appearance.font
            );
        }
        if let Some(font) = &self.font {
            if font.missing > 0 {
                log::warn!("substitution font lacks {} glyphs used so far", font.missing);
            }
        }
        Ok(())
    }

    /// The /Helv resource, added to /DR when the form has none.
    fn helvetica_resource(&mut self) -> Result<Object> {
        if let Some(font) = resource_font(&self.doc, HELVETICA_NAME)? {
            return Ok(font);
        }
        let id = self.doc.add_object(font::helvetica());
        add_resource_font(&mut self.doc, HELVETICA_NAME, id)?;
        Ok(Object::Reference(id))
    }
}

impl FormDocument for PdfForm {
    fn field_names(&self) -> Vec<String> {
        self.fields
            .iter()
            .map(|f| f.name.clone())
            .collect::<IndexSet<_>>()
            .into_iter()
            .collect()
    }

    fn set_field(&mut self, name: &str, value: &str) -> Result<SetOutcome> {
        let matching: Vec<FormField> = self.fields.iter().filter(|f| f.name == name).cloned().collect();
        let mut outcome = SetOutcome::UnknownField;
        for field in &matching {
            let result = self.set_one(field, value)?;
            // One written field is enough to call the assignment filled
            if outcome != SetOutcome::Filled {
                outcome = result;
            }
        }
        Ok(outcome)
    }

    fn substitute_font(&mut self, font: SubstitutionFont) -> Result<()> {
        let font_id = self.doc.new_object_id();
        if acroform(&self.doc)?.is_some() {
            add_resource_font(&mut self.doc, SUBSTITUTION_FONT_NAME, font_id)?;
        }
        log::debug!(
            "substitution font {} reserved as {} {} R",
            font.postscript_name(),
            font_id.0,
            font_id.1
        );
        self.font = Some(EmbeddedFont::new(font, font_id));
        Ok(())
    }

    fn finalize<W: Write>(mut self, flatten: bool, mut sink: W) -> Result<()> {
        let has_form = acroform(&self.doc)?.is_some();
        if let Some(font) = self.font.take() {
            if has_form {
                font.write(&mut self.doc)?;
            }
        }

        if flatten {
            flatten_form(&mut self.doc)?;
        } else if has_form {
            acroform_mut(&mut self.doc)?.set("NeedAppearances", true);
        }

        self.doc.save_to(&mut sink)?;
        sink.flush()?;
        Ok(())
    }
}
