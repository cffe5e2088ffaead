//! Page metadata: page geometry

use lopdf::{Dictionary, Document, Object, ObjectId};
use crate::error::Result;
use crate::layout::Rect;

/// Guards against `/Parent` cycles in malformed page trees
const MAX_TREE_DEPTH: usize = 64;

/// Look up a page's media box, following `/Parent` links for inherited values
///
/// Falls back to US Letter when neither the page nor any ancestor carries one.
pub fn page_media_box(doc: &Document, page_id: ObjectId) -> Result<Rect> {
    let mut current = Some(page_id);
    let mut depth = 0;

    while let Some(id) = current {
        if depth > MAX_TREE_DEPTH {
            break;
        }
        depth += 1;

        let dict = doc.get_object(id)?.as_dict()?;
        if let Some(rect) = read_rect(doc, dict, b"MediaBox") {
            return Ok(rect);
        }
        current = dict.get(b"Parent").and_then(Object::as_reference).ok();
    }

    log::debug!("No MediaBox for page {:?}, assuming US Letter", page_id);
    Ok(Rect::letter())
}

/// Read a rectangle entry, dereferencing both the array and its elements
fn read_rect(doc: &Document, dict: &Dictionary, key: &[u8]) -> Option<Rect> {
    let array = match dict.get(key).ok()? {
        Object::Reference(id) => doc.get_object(*id).ok()?.as_array().ok()?,
        Object::Array(array) => array,
        _ => return None,
    };

    if array.len() != 4 {
        return None;
    }

    let mut values = [0.0f32; 4];
    for (slot, item) in values.iter_mut().zip(array) {
        let item = match item {
            Object::Reference(id) => doc.get_object(*id).ok()?,
            other => other,
        };
        *slot = item.as_float().ok()?;
    }

    Some(Rect::from_corners(values))
}

/// Write a rectangle as a PDF array object
pub fn rect_object(rect: &Rect) -> Object {
    Object::Array(rect.to_array().iter().map(|&v| Object::Real(v)).collect())
}
