//! Form flattening.
//!
//! Each visible widget's normal appearance becomes a form XObject drawn in
//! the page content. The widget annotations and the /AcroForm dictionary are
//! then removed, so the values can no longer be edited.

use lopdf::{Dictionary, Document, Object, ObjectId, Stream};

use super::acroform::{catalog_id, rectangle, resolve};
use super::appearance::format_number;
use crate::error::Result;

/// Annotation flag: do not display (PDF Table 165, bit 2).
const HIDDEN: i64 = 1 << 1;

/// A widget appearance to stamp into the page.
#[derive(Debug)]
struct WidgetAppearance {
    xobject: ObjectId,
    rect: [f32; 4],
    bbox: [f32; 4],
    matrix: Option<[f32; 6]>,
}

/// Flatten every widget on every page and drop the interactive form.
///
/// Returns the number of widgets stamped into page content.
pub fn flatten_form(doc: &mut Document) -> Result<usize> {
    let mut stamped = 0;
    let pages: Vec<ObjectId> = doc.get_pages().into_values().collect();

    for page_id in pages {
        stamped += flatten_page(doc, page_id)?;
    }

    let catalog = catalog_id(doc)?;
    doc.get_dictionary_mut(catalog)?.remove(b"AcroForm");
    let pruned = doc.prune_objects();
    log::debug!(
        "flattened {} widgets, pruned {} unreferenced objects",
        stamped,
        pruned.len()
    );
    Ok(stamped)
}

fn flatten_page(doc: &mut Document, page_id: ObjectId) -> Result<usize> {
    let page = doc.get_dictionary(page_id)?;
    let annots: Vec<Object> = match page.get(b"Annots") {
        Ok(obj) => resolve(doc, obj)?.as_array().cloned().unwrap_or_default(),
        Err(_) => return Ok(0),
    };

    let mut kept = Vec::new();
    let mut appearances = Vec::new();
    for annot in annots {
        let dict = match resolve(doc, &annot).and_then(Object::as_dict) {
            Ok(dict) if matches!(dict.get(b"Subtype"), Ok(Object::Name(n)) if n == b"Widget") => {
                dict
            },
            _ => {
                kept.push(annot.clone());
                continue;
            },
        };
        if matches!(dict.get(b"F"), Ok(Object::Integer(f)) if f & HIDDEN != 0) {
            continue;
        }
        if let Some(appearance) = widget_appearance(doc, dict) {
            appearances.push(appearance);
        }
    }

    let removed_widgets = appearances.len();
    let page = doc.get_dictionary_mut(page_id)?;
    if kept.is_empty() {
        page.remove(b"Annots");
    } else {
        page.set("Annots", kept);
    }
    if appearances.is_empty() {
        return Ok(0);
    }

    let mut resources = page_resources(doc, page_id)?;
    let mut xobjects = match resources.get(b"XObject") {
        Ok(obj) => resolve(doc, obj)?.as_dict()?.clone(),
        Err(_) => Dictionary::new(),
    };
    let mut names = Vec::with_capacity(appearances.len());
    let mut counter = 0;
    for appearance in &appearances {
        let name = unused_xobject_name(&xobjects, &mut counter);
        xobjects.set(name.as_str(), appearance.xobject);
        names.push(name);
    }
    resources.set("XObject", xobjects);

    let save_id = doc.add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
    let overlay_id = doc.add_object(Stream::new(
        Dictionary::new(),
        generate_flatten_overlay(&appearances, &names),
    ));

    let page = doc.get_dictionary_mut(page_id)?;
    let mut contents = vec![Object::Reference(save_id)];
    match page.get(b"Contents") {
        Ok(Object::Array(existing)) => contents.extend(existing.iter().cloned()),
        Ok(existing) => contents.push(existing.clone()),
        Err(_) => {},
    }
    contents.push(Object::Reference(overlay_id));
    page.set("Contents", contents);
    page.set("Resources", resources);

    Ok(removed_widgets)
}

/// Next `FlatFld{n}` name the page's /XObject resources do not use yet.
fn unused_xobject_name(xobjects: &Dictionary, counter: &mut usize) -> String {
    loop {
        let name = format!("FlatFld{}", counter);
        *counter += 1;
        if !xobjects.has(name.as_bytes()) {
            return name;
        }
    }
}

/// The XObject a widget currently displays, with its placement.
fn widget_appearance(doc: &Document, widget: &Dictionary) -> Option<WidgetAppearance> {
    let rect = rectangle(doc, widget.get(b"Rect").ok()?)?;
    let normal = widget
        .get(b"AP")
        .and_then(|ap| resolve(doc, ap))
        .and_then(Object::as_dict)
        .and_then(|ap| ap.get(b"N"))
        .ok()?;

    // /N is either a stream, or a dictionary of streams keyed by /AS state.
    let xobject = match normal {
        Object::Reference(id) if doc.get_object(*id).and_then(Object::as_stream).is_ok() => *id,
        other => {
            let states = resolve(doc, other).and_then(Object::as_dict).ok()?;
            let state = match widget.get(b"AS") {
                Ok(Object::Name(state)) => state.as_slice(),
                _ => return None,
            };
            match states.get(state) {
                Ok(Object::Reference(id)) => *id,
                _ => return None,
            }
        },
    };

    let stream = doc.get_object(xobject).and_then(Object::as_stream).ok()?;
    let bbox = stream
        .dict
        .get(b"BBox")
        .ok()
        .and_then(|b| rectangle(doc, b))
        .unwrap_or([0.0, 0.0, rect[2] - rect[0], rect[3] - rect[1]]);
    let matrix = stream
        .dict
        .get(b"Matrix")
        .and_then(Object::as_array)
        .ok()
        .and_then(|m| {
            let values: Vec<f32> = m.iter().filter_map(super::acroform::number).collect();
            <[f32; 6]>::try_from(values).ok()
        });

    Some(WidgetAppearance {
        xobject,
        rect,
        bbox,
        matrix,
    })
}

/// The page's resource dictionary, following inheritance from the page tree.
fn page_resources(doc: &Document, page_id: ObjectId) -> Result<Dictionary> {
    let mut node = Some(page_id);
    let mut depth = 0;
    while let Some(id) = node {
        let dict = doc.get_dictionary(id)?;
        if let Ok(resources) = dict.get(b"Resources") {
            return Ok(resolve(doc, resources)?.as_dict()?.clone());
        }
        depth += 1;
        if depth > 64 {
            break;
        }
        node = dict.get(b"Parent").and_then(Object::as_reference).ok();
    }
    Ok(Dictionary::new())
}

/// Content that places each appearance XObject at its widget rectangle.
fn generate_flatten_overlay(appearances: &[WidgetAppearance], xobject_names: &[String]) -> Vec<u8> {
    let mut content = b"Q\n".to_vec();

    for (appearance, xobj_name) in appearances.iter().zip(xobject_names) {
        content.extend_from_slice(b"q\n");

        // Map the appearance BBox onto the widget Rect.
        let bbox = appearance.bbox;
        let rect = appearance.rect;
        let bbox_width = bbox[2] - bbox[0];
        let bbox_height = bbox[3] - bbox[1];
        let sx = if bbox_width != 0.0 {
            (rect[2] - rect[0]) / bbox_width
        } else {
            1.0
        };
        let sy = if bbox_height != 0.0 {
            (rect[3] - rect[1]) / bbox_height
        } else {
            1.0
        };
        let tx = rect[0] - bbox[0] * sx;
        let ty = rect[1] - bbox[1] * sy;

        content.extend_from_slice(
            format!(
                "{} 0 0 {} {} {} cm\n",
                format_number(sx),
                format_number(sy),
                format_number(tx),
                format_number(ty)
            )
            .as_bytes(),
        );
        if let Some(m) = appearance.matrix {
            let m: Vec<String> = m.iter().map(|v| format_number(*v)).collect();
            content.extend_from_slice(format!("{} cm\n", m.join(" ")).as_bytes());
        }
        content.extend_from_slice(format!("/{} Do\nQ\n", xobj_name).as_bytes());
    }

    content
}

#[cfg(test)]
mod tests {
    use super::*;

    use lopdf::dictionary;

    #[test]
    fn test_unused_xobject_name_skips_taken_names() {
        let xobjects = dictionary! {
            "FlatFld0" => Object::Reference((3, 0)),
            "FlatFld2" => Object::Reference((4, 0)),
        };
        let mut counter = 0;
        assert_eq!(unused_xobject_name(&xobjects, &mut counter), "FlatFld1");
        assert_eq!(unused_xobject_name(&xobjects, &mut counter), "FlatFld3");
    }

    /// A page drawing its own `/FlatFld0` image plus one text widget.
    fn page_with_own_flat_name() -> (Document, ObjectId, ObjectId, ObjectId) {
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();
        let page_id = doc.new_object_id();

        let bbox = || vec![0.into(), 0.into(), 10.into(), 10.into()];
        let own = doc.add_object(Stream::new(
            dictionary! { "Type" => "XObject", "Subtype" => "Form", "BBox" => bbox() },
            b"0 g 0 0 10 10 re f".to_vec(),
        ));
        let field_ap = doc.add_object(Stream::new(
            dictionary! { "Type" => "XObject", "Subtype" => "Form", "BBox" => bbox() },
            b"/Tx BMC EMC".to_vec(),
        ));
        let widget = doc.add_object(dictionary! {
            "Type" => "Annot",
            "Subtype" => "Widget",
            "FT" => "Tx",
            "T" => Object::string_literal("name"),
            "Rect" => vec![50.into(), 700.into(), 60.into(), 710.into()],
            "AP" => dictionary! { "N" => field_ap },
        });
        let content = doc.add_object(Stream::new(dictionary! {}, b"/FlatFld0 Do".to_vec()));

        doc.objects.insert(
            page_id,
            Object::Dictionary(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
                "Contents" => content,
                "Resources" => dictionary! { "XObject" => dictionary! { "FlatFld0" => own } },
                "Annots" => vec![widget.into()],
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
            "AcroForm" => dictionary! { "Fields" => vec![widget.into()] },
        });
        doc.trailer.set("Root", catalog);
        (doc, page_id, own, field_ap)
    }

    #[test]
    fn test_flatten_keeps_existing_xobject_names() {
        let (mut doc, page_id, own, field_ap) = page_with_own_flat_name();
        assert_eq!(flatten_form(&mut doc).unwrap(), 1);

        let page = doc.get_dictionary(page_id).unwrap();
        let resources = page.get(b"Resources").unwrap().as_dict().unwrap();
        let xobjects = resources.get(b"XObject").unwrap().as_dict().unwrap();
        assert_eq!(xobjects.get(b"FlatFld0").unwrap(), &Object::Reference(own));
        assert_eq!(xobjects.get(b"FlatFld1").unwrap(), &Object::Reference(field_ap));

        let content = String::from_utf8(doc.get_page_content(page_id).unwrap()).unwrap();
        assert!(content.contains("/FlatFld1 Do"));
        assert_eq!(content.matches("/FlatFld0 Do").count(), 1);
    }

    #[test]
    fn test_overlay_places_xobject_at_rect() {
        let appearances = [WidgetAppearance {
            xobject: (5, 0),
            rect: [100.0, 700.0, 300.0, 720.0],
            bbox: [0.0, 0.0, 200.0, 20.0],
            matrix: None,
        }];
        let content = generate_flatten_overlay(&appearances, &["FlatFld0".to_string()]);
        let content = String::from_utf8(content).unwrap();
        assert_eq!(content, "Q\nq\n1 0 0 1 100 700 cm\n/FlatFld0 Do\nQ\n");
    }

    #[test]
    fn test_overlay_scales_mismatched_bbox() {
        let appearances = [WidgetAppearance {
            xobject: (5, 0),
            rect: [0.0, 0.0, 100.0, 40.0],
            bbox: [0.0, 0.0, 50.0, 20.0],
            matrix: Some([1.0, 0.0, 0.0, 1.0, 0.0, 0.0]),
        }];
        let content = generate_flatten_overlay(&appearances, &["X".to_string()]);
        let content = String::from_utf8(content).unwrap();
        assert!(content.contains("2 0 0 2 0 0 cm\n1 0 0 1 0 0 cm\n/X Do"));
    }
}
