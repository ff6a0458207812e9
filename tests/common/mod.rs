//! Small AcroForm documents built in memory for the integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};

/// DejaVu Sans, a TrueType font with Cyrillic coverage.
pub const FIXTURE_FONT: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/DejaVuSans.ttf");

fn rect(x: i64, y: i64, w: i64, h: i64) -> Object {
    Object::Array(vec![x.into(), y.into(), (x + w).into(), (y + h).into()])
}

fn state_appearance(doc: &mut Document, drawing: &[u8]) -> ObjectId {
    doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Form",
            "BBox" => vec![0.into(), 0.into(), 12.into(), 12.into()],
        },
        drawing.to_vec(),
    ))
}

fn widget(page: ObjectId, rect: Object) -> Dictionary {
    dictionary! {
        "Type" => "Annot",
        "Subtype" => "Widget",
        "Rect" => rect,
        "P" => page,
        "F" => 4,
    }
}

/// A one page form with these fields:
///
/// - `name`: text
/// - `given name`: text, name contains a space
/// - `address`: multiline text
/// - `employer.city`: text below a non-terminal parent
/// - `country`: combo box
/// - `agree`: checkbox with states `Yes`/`Off`
/// - `color`: radio group with `red` and `blue` widgets
/// - `id`: read-only text
pub fn sample_form() -> Document {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();
    let page_id = doc.new_object_id();
    let mut annots: Vec<Object> = Vec::new();
    let mut fields: Vec<Object> = Vec::new();

    let helv = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });

    let mut add_text = |doc: &mut Document, name: &str, y: i64, extra: Dictionary| {
        let mut dict = widget(page_id, rect(50, y, 200, 20));
        dict.set("FT", "Tx");
        dict.set("T", Object::string_literal(name));
        for (key, value) in extra.iter() {
            dict.set(key.clone(), value.clone());
        }
        let id = doc.add_object(dict);
        annots.push(id.into());
        fields.push(id.into());
    };
    add_text(&mut doc, "name", 740, Dictionary::new());
    add_text(&mut doc, "given name", 710, Dictionary::new());
    add_text(
        &mut doc,
        "address",
        640,
        dictionary! { "Ff" => 1 << 12, "DA" => Object::string_literal("/Helv 10 Tf 0 g") },
    );
    add_text(&mut doc, "id", 610, dictionary! { "Ff" => 1 });
    add_text(
        &mut doc,
        "country",
        580,
        dictionary! { "FT" => "Ch", "Ff" => 1 << 17, "Opt" => vec![
            Object::string_literal("Canada"),
            Object::string_literal("Norway"),
        ] },
    );

    // employer.city
    let employer = doc.new_object_id();
    let mut city = widget(page_id, rect(50, 550, 200, 20));
    city.set("FT", "Tx");
    city.set("T", Object::string_literal("city"));
    city.set("Parent", employer);
    let city = doc.add_object(city);
    doc.objects.insert(
        employer,
        Object::Dictionary(dictionary! {
            "T" => Object::string_literal("employer"),
            "Kids" => vec![city.into()],
        }),
    );
    annots.push(city.into());
    fields.push(employer.into());

    // agree
    let yes = state_appearance(&mut doc, b"0 g 2 2 8 8 re f");
    let off = state_appearance(&mut doc, b"");
    let mut agree = widget(page_id, rect(50, 520, 12, 12));
    agree.set("FT", "Btn");
    agree.set("T", Object::string_literal("agree"));
    agree.set("AS", "Off");
    agree.set("AP", dictionary! { "N" => dictionary! { "Yes" => yes, "Off" => off } });
    let agree = doc.add_object(agree);
    annots.push(agree.into());
    fields.push(agree.into());

    // color
    let color = doc.new_object_id();
    let mut kids = Vec::new();
    for (i, state) in ["red", "blue"].iter().enumerate() {
        let on = state_appearance(&mut doc, b"0 g 6 6 3 0 360 re f");
        let off = state_appearance(&mut doc, b"");
        let mut kid = widget(page_id, rect(50 + 30 * i as i64, 490, 12, 12));
        kid.set("Parent", color);
        kid.set("AS", "Off");
        kid.set(
            "AP",
            dictionary! { "N" => dictionary! { state.as_bytes().to_vec() => on, "Off" => off } },
        );
        let kid = doc.add_object(kid);
        annots.push(kid.into());
        kids.push(Object::from(kid));
    }
    doc.objects.insert(
        color,
        Object::Dictionary(dictionary! {
            "FT" => "Btn",
            "Ff" => 1 << 15,
            "T" => Object::string_literal("color"),
            "Kids" => kids,
        }),
    );
    fields.push(color.into());

    let content = doc.add_object(Stream::new(
        dictionary! {},
        b"BT /F1 12 Tf 50 770 Td (Application) Tj ET".to_vec(),
    ));
    doc.objects.insert(
        page_id,
        Object::Dictionary(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Contents" => content,
            "Resources" => dictionary! { "Font" => dictionary! { "F1" => helv } },
            "Annots" => annots,
        }),
    );
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        }),
    );

    let catalog = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
        "AcroForm" => dictionary! {
            "Fields" => fields,
            "DA" => Object::string_literal("/Helv 0 Tf 0 g"),
            "DR" => dictionary! { "Font" => dictionary! { "Helv" => helv } },
        },
    });
    doc.trailer.set("Root", catalog);
    doc
}

/// A document with one blank page and no form.
pub fn plain_document() -> Document {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        }),
    );
    let catalog = doc.add_object(dictionary! { "Type" => "Catalog", "Pages" => pages_id });
    doc.trailer.set("Root", catalog);
    doc
}

/// Save `doc` as `file_name` inside `dir`.
pub fn save(mut doc: Document, dir: &Path, file_name: &str) -> PathBuf {
    let path = dir.join(file_name);
    doc.save(&path).unwrap();
    path
}

/// Find a field dictionary by fully qualified name in a saved document.
pub fn field<'a>(doc: &'a Document, name: &str) -> &'a Dictionary {
    use pdf_form_fill::document::collect_fields;

    let fields = collect_fields(doc).unwrap();
    let field = fields.iter().find(|f| f.name == name).unwrap();
    doc.get_dictionary(field.id).unwrap()
}

/// The /AS state of each widget of a field.
pub fn widget_states(doc: &Document, name: &str) -> Vec<String> {
    use pdf_form_fill::document::collect_fields;

    let fields = collect_fields(doc).unwrap();
    let field = fields.iter().find(|f| f.name == name).unwrap();
    field
        .widgets
        .iter()
        .map(|&w| {
            let dict = doc.get_dictionary(w).unwrap();
            String::from_utf8(dict.get(b"AS").unwrap().as_name().unwrap().to_vec()).unwrap()
        })
        .collect()
}
