// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Small lopdf helpers shared by the reader and the editor: reference
// resolution, inherited page attributes, rectangles and numbers.

use lopdf::{Dictionary, Document, Object, ObjectId};
use pressproof_core::Rect;

/// Page-tree depth after which inherited lookups give up.
const MAX_TREE_DEPTH: usize = 32;

/// Follow a chain of references to the object it points at.
pub(crate) fn resolve<'a>(doc: &'a Document, object: &'a Object) -> Option<&'a Object> {
    doc.dereference(object).ok().map(|(_, resolved)| resolved)
}

/// Resolve to a dictionary; a stream resolves to its dictionary.
pub(crate) fn resolve_dict<'a>(doc: &'a Document, object: &'a Object) -> Option<&'a Dictionary> {
    match resolve(doc, object)? {
        Object::Dictionary(dict) => Some(dict),
        Object::Stream(stream) => Some(&stream.dict),
        _ => None,
    }
}

/// Dictionary entry resolved through references.
pub(crate) fn dict_get<'a>(doc: &'a Document, dict: &'a Dictionary, key: &[u8]) -> Option<&'a Object> {
    resolve(doc, dict.get(key).ok()?)
}

/// Name value of a dictionary entry.
pub(crate) fn dict_name(doc: &Document, dict: &Dictionary, key: &[u8]) -> Option<String> {
    name_of(dict_get(doc, dict, key)?)
}

/// Numeric value of a dictionary entry.
pub(crate) fn dict_number(doc: &Document, dict: &Dictionary, key: &[u8]) -> Option<f32> {
    dict_get(doc, dict, key)?.as_float().ok()
}

pub(crate) fn name_of(object: &Object) -> Option<String> {
    object
        .as_name()
        .ok()
        .map(|name| String::from_utf8_lossy(name).into_owned())
}

/// Text of a string or name object.
pub(crate) fn text_of(object: &Object) -> Option<String> {
    match object {
        Object::String(bytes, _) => Some(decode_text_string(bytes)),
        Object::Name(name) => Some(String::from_utf8_lossy(name).into_owned()),
        _ => None,
    }
}

/// Decode a PDF text string (UTF-16BE with BOM, otherwise byte-per-char).
fn decode_text_string(bytes: &[u8]) -> String {
    if let Some(utf16) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = utf16
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    bytes.iter().map(|&b| b as char).collect()
}

/// Look up a page attribute, walking `/Parent` links for inheritable keys.
pub(crate) fn resolve_inherited<'a>(
    doc: &'a Document,
    page_id: ObjectId,
    key: &[u8],
) -> Option<&'a Object> {
    let mut current = doc.get_object(page_id).ok()?.as_dict().ok()?;
    for _ in 0..MAX_TREE_DEPTH {
        if let Ok(value) = current.get(key) {
            return resolve(doc, value);
        }
        let parent = current.get(b"Parent").ok()?.as_reference().ok()?;
        current = doc.get_object(parent).ok()?.as_dict().ok()?;
    }
    None
}

/// Parse a four-number array into a normalised rectangle.
pub(crate) fn rect_of(doc: &Document, object: &Object) -> Option<Rect> {
    let values = resolve(doc, object)?.as_array().ok()?;
    if values.len() != 4 {
        return None;
    }
    let mut n = [0f32; 4];
    for (slot, value) in n.iter_mut().zip(values) {
        *slot = resolve(doc, value)?.as_float().ok()?;
    }
    if n.iter().any(|v| !v.is_finite()) {
        return None;
    }
    Some(Rect::new(n[0], n[1], n[2], n[3]))
}

/// Rectangle as a PDF array object.
pub(crate) fn rect_object(rect: &Rect) -> Object {
    Object::Array(vec![
        Object::Real(rect.x0),
        Object::Real(rect.y0),
        Object::Real(rect.x1),
        Object::Real(rect.y1),
    ])
}

/// Effective `/Resources` dictionary of a page.
pub(crate) fn page_resources(doc: &Document, page_id: ObjectId) -> Option<&Dictionary> {
    match resolve_inherited(doc, page_id, b"Resources")? {
        Object::Dictionary(dict) => Some(dict),
        _ => None,
    }
}

/// Entry `name` of the resource category `category` (e.g. `/Font /F1`).
pub(crate) fn resource_entry<'a>(
    doc: &'a Document,
    resources: &'a Dictionary,
    category: &[u8],
    name: &[u8],
) -> Option<&'a Object> {
    let group = resolve_dict(doc, resources.get(category).ok()?)?;
    resolve(doc, group.get(name).ok()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::dictionary;

    #[test]
    fn inherited_media_box_found_on_parent() {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1i64,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            }),
        );

        let media = resolve_inherited(&doc, page_id, b"MediaBox")
            .and_then(|obj| rect_of(&doc, obj))
            .unwrap();
        assert_eq!(media, Rect::new(0.0, 0.0, 595.0, 842.0));
    }

    #[test]
    fn rect_rejects_short_arrays() {
        let doc = Document::with_version("1.5");
        let short = Object::Array(vec![0.into(), 0.into(), 10.into()]);
        assert!(rect_of(&doc, &short).is_none());
    }

    #[test]
    fn utf16_text_strings_decode() {
        let obj = Object::String(vec![0xFE, 0xFF, 0x00, b'L', 0x00, b'1'], lopdf::StringFormat::Literal);
        assert_eq!(text_of(&obj).as_deref(), Some("L1"));
    }
}
