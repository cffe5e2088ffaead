//! Flattening an overlay page onto a page of another document using lopdf

use std::collections::{BTreeSet, HashMap};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use crate::error::{Error, Result};
use crate::pdf::metadata::{page_media_box, rect_object};

/// Prefix for the Form XObject name registered on the target page
const OVERLAY_NAME_PREFIX: &str = "SigOverlay";

/// Merge the first page of `overlay` on top of `page_id` in `target`
///
/// The overlay page becomes a Form XObject drawn after the page's own content.
/// The original content is wrapped in `q`/`Q` first, so any transformation it
/// leaves behind does not move the overlay.
pub fn merge_overlay_page(target: &mut Document, page_id: ObjectId, overlay: Document) -> Result<()> {
    let overlay_page_id = *overlay
        .get_pages()
        .values()
        .next()
        .ok_or_else(|| Error::General("Overlay document has no pages".to_string()))?;

    let bbox = page_media_box(&overlay, overlay_page_id)?;
    let page = overlay.get_object(overlay_page_id)?.as_dict()?;
    let content = overlay.get_page_content(overlay_page_id)?;

    // Only what the overlay page's resources reach is carried over
    let resources = match page.get(b"Resources") {
        Ok(res) => {
            let id_map = import_objects(target, &overlay, res);
            renumber_object_references(res, &id_map)
        }
        Err(_) => Object::Dictionary(Dictionary::new()),
    };

    let form = Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Form",
            "FormType" => 1,
            "BBox" => rect_object(&bbox),
            "Matrix" => vec![
                Object::Integer(1),
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(1),
                Object::Integer(0),
                Object::Integer(0),
            ],
            "Resources" => resources,
        },
        content,
    );
    let form_id = target.add_object(form);

    wrap_page_content_in_graphics_state(target, page_id)?;
    let name = add_xobject_to_page_resources(target, page_id, form_id)?;

    let invoke = format!("q\n/{} Do\nQ\n", name);
    let invoke_id = target.add_object(Stream::new(Dictionary::new(), invoke.into_bytes()));
    append_content_to_page(target, page_id, invoke_id)?;

    log::debug!("Merged overlay onto page {:?} as /{}", page_id, name);
    Ok(())
}

/// Copy the objects reachable from `root` into `target` under fresh ids
fn import_objects(target: &mut Document, overlay: &Document, root: &Object) -> HashMap<ObjectId, ObjectId> {
    let mut reachable = BTreeSet::new();
    collect_references(overlay, root, &mut reachable);

    let id_map: HashMap<ObjectId, ObjectId> = reachable
        .iter()
        .map(|old_id| (*old_id, target.new_object_id()))
        .collect();

    for old_id in &reachable {
        if let Ok(object) = overlay.get_object(*old_id) {
            target
                .objects
                .insert(id_map[old_id], renumber_object_references(object, &id_map));
        }
    }

    id_map
}

/// Gather every object id referenced, directly or not, from `object`
fn collect_references(doc: &Document, object: &Object, seen: &mut BTreeSet<ObjectId>) {
    match object {
        Object::Reference(id) => {
            if seen.insert(*id) {
                if let Ok(target) = doc.get_object(*id) {
                    collect_references(doc, target, seen);
                }
            }
        }
        Object::Array(arr) => {
            for item in arr {
                collect_references(doc, item, seen);
            }
        }
        Object::Dictionary(dict) => {
            for (_, value) in dict.iter() {
                collect_references(doc, value, seen);
            }
        }
        Object::Stream(stream) => {
            for (_, value) in stream.dict.iter() {
                collect_references(doc, value, seen);
            }
        }
        _ => {}
    }
}

/// Renumber all object references in an object
fn renumber_object_references(object: &Object, id_map: &HashMap<ObjectId, ObjectId>) -> Object {
    match object {
        Object::Reference(old_id) => {
            Object::Reference(id_map.get(old_id).copied().unwrap_or(*old_id))
        }
        Object::Array(arr) => {
            Object::Array(arr.iter().map(|obj| renumber_object_references(obj, id_map)).collect())
        }
        Object::Dictionary(dict) => Object::Dictionary(renumber_dictionary(dict, id_map)),
        Object::Stream(stream) => {
            let mut new_stream = stream.clone();
            new_stream.dict = renumber_dictionary(&stream.dict, id_map);
            Object::Stream(new_stream)
        }
        _ => object.clone(),
    }
}

fn renumber_dictionary(dict: &Dictionary, id_map: &HashMap<ObjectId, ObjectId>) -> Dictionary {
    let mut new_dict = Dictionary::new();
    for (key, value) in dict.iter() {
        new_dict.set(key.clone(), renumber_object_references(value, id_map));
    }
    new_dict
}

/// Content stream references of a page, in drawing order
fn page_content_refs(doc: &Document, page_id: ObjectId) -> Result<Vec<Object>> {
    let page = doc.get_object(page_id)?.as_dict()?;
    let refs = match page.get(b"Contents") {
        Ok(Object::Reference(id)) => match doc.get_object(*id)? {
            // An indirect array of streams
            Object::Array(arr) => arr.clone(),
            _ => vec![Object::Reference(*id)],
        },
        Ok(Object::Array(arr)) => arr.clone(),
        _ => Vec::new(),
    };
    Ok(refs)
}

/// Wrap page content streams in q/Q to isolate transformations
///
/// Adds a `q` stream before and a `Q` stream after the existing ones, leaving
/// the original streams untouched.
fn wrap_page_content_in_graphics_state(doc: &mut Document, page_id: ObjectId) -> Result<()> {
    let existing = page_content_refs(doc, page_id)?;
    if existing.is_empty() {
        return Ok(());
    }

    let save_id = doc.add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
    let restore_id = doc.add_object(Stream::new(Dictionary::new(), b"\nQ\n".to_vec()));

    let mut contents = Vec::with_capacity(existing.len() + 2);
    contents.push(Object::Reference(save_id));
    contents.extend(existing);
    contents.push(Object::Reference(restore_id));

    doc.get_object_mut(page_id)?
        .as_dict_mut()?
        .set("Contents", Object::Array(contents));

    Ok(())
}

/// Append a content stream to a page's Contents
///
/// Appended content is drawn on top of what is already there.
fn append_content_to_page(doc: &mut Document, page_id: ObjectId, new_content_id: ObjectId) -> Result<()> {
    let mut contents = page_content_refs(doc, page_id)?;
    contents.push(Object::Reference(new_content_id));

    doc.get_object_mut(page_id)?
        .as_dict_mut()?
        .set("Contents", Object::Array(contents));

    Ok(())
}

/// Find the resources in effect for a page, following `/Parent` for inherited ones
fn effective_resources(doc: &Document, page_id: ObjectId) -> Result<Dictionary> {
    let mut current = Some(page_id);

    while let Some(id) = current {
        let dict = doc.get_object(id)?.as_dict()?;
        match dict.get(b"Resources") {
            Ok(Object::Dictionary(res)) => return Ok(res.clone()),
            Ok(Object::Reference(res_id)) => {
                return Ok(doc.get_object(*res_id)?.as_dict()?.clone());
            }
            _ => {}
        }
        current = dict.get(b"Parent").and_then(Object::as_reference).ok();
    }

    Ok(Dictionary::new())
}

/// Add an XObject to a page's own Resources under a name the page does not use yet
///
/// The page gets a private copy of its resources (inherited or shared ones
/// included), so other pages that share the dictionary stay unchanged.
fn add_xobject_to_page_resources(doc: &mut Document, page_id: ObjectId, xobject_id: ObjectId) -> Result<String> {
    let mut resources = effective_resources(doc, page_id)?;

    let mut xobjects = match resources.get(b"XObject") {
        Ok(Object::Dictionary(xo)) => xo.clone(),
        Ok(Object::Reference(xo_id)) => doc.get_object(*xo_id)?.as_dict()?.clone(),
        _ => Dictionary::new(),
    };

    let name = (0..)
        .map(|i| format!("{}{}", OVERLAY_NAME_PREFIX, i))
        .find(|candidate| !xobjects.has(candidate.as_bytes()))
        .unwrap_or_else(|| OVERLAY_NAME_PREFIX.to_string());

    xobjects.set(name.as_str(), Object::Reference(xobject_id));
    resources.set("XObject", Object::Dictionary(xobjects));

    doc.get_object_mut(page_id)?
        .as_dict_mut()?
        .set("Resources", Object::Dictionary(resources));

    Ok(name)
}
