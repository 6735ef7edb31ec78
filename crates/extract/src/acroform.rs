use lopdf::{Dictionary, Document, Object, ObjectId};

use formflow_core::{new_id, Field, FieldType, Position, Role, Template};

use crate::error::ExtractError;

/// Acrobat field flag bit for pushbuttons (`/Ff` bit 17).
const FLAG_PUSHBUTTON: i64 = 1 << 16;

/// Field-tree recursion cap; malformed documents can contain cycles.
const MAX_TREE_DEPTH: usize = 8;

/// Extract a [`Template`] from raw document bytes.
///
/// Every interactive form field becomes one [`Field`] carrying a fresh
/// id, the configured `default_role`, and the widget's page and
/// lower-left position. The page count comes from the document's page
/// tree, independent of which pages carry fields. A document without an
/// AcroForm yields a template with an empty field list.
pub fn extract_template(
    bytes: &[u8],
    filename: &str,
    default_role: Role,
) -> Result<Template, ExtractError> {
    let doc = Document::load_mem(bytes)?;

    let pages: Vec<(u32, ObjectId)> = doc.get_pages().into_iter().collect();
    if pages.is_empty() {
        return Err(ExtractError::NoPages);
    }

    let mut fields = Vec::new();
    for field_id in terminal_field_ids(&doc) {
        if let Ok(dict) = doc.get_dictionary(field_id) {
            fields.push(build_field(&doc, field_id, dict, &pages, default_role));
        }
    }

    Ok(Template {
        id: new_id(),
        filename: filename.to_string(),
        pages: pages.len() as u32,
        fields,
        version: 0,
    })
}

/// Ids of all terminal fields reachable from the AcroForm `/Fields`
/// array. A node with `/FT` is terminal; a bare container recurses into
/// its `/Kids`.
fn terminal_field_ids(doc: &Document) -> Vec<ObjectId> {
    let mut out = Vec::new();
    let Ok(catalog) = doc.catalog() else {
        return out;
    };
    let Some(acro_form) = catalog.get(b"AcroForm").ok().and_then(|o| resolve_dict(doc, o)) else {
        return out;
    };
    let Some(roots) = acro_form.get(b"Fields").ok().and_then(|o| resolve_array(doc, o)) else {
        return out;
    };
    for root in roots {
        collect_terminal_fields(doc, root, &mut out, 0);
    }
    out
}

fn collect_terminal_fields(doc: &Document, node: &Object, out: &mut Vec<ObjectId>, depth: usize) {
    if depth > MAX_TREE_DEPTH {
        return;
    }
    let Ok(id) = node.as_reference() else {
        return;
    };
    let Ok(dict) = doc.get_dictionary(id) else {
        return;
    };
    if dict.has(b"FT") {
        out.push(id);
    } else if let Some(kids) = dict.get(b"Kids").ok().and_then(|o| resolve_array(doc, o)) {
        for kid in kids {
            collect_terminal_fields(doc, kid, out, depth + 1);
        }
    }
}

fn build_field(
    doc: &Document,
    field_id: ObjectId,
    field: &Dictionary,
    pages: &[(u32, ObjectId)],
    default_role: Role,
) -> Field {
    let (widget_id, widget) = first_widget(doc, field_id, field);
    let (x, y) = widget_origin(doc, widget);
    let page = widget_page(doc, widget_id, widget, pages);

    Field {
        id: new_id(),
        label: field_label(doc, field),
        field_type: classify(doc, field),
        role: default_role,
        position: Position { x, y, page },
        value: None,
    }
}

/// Classify a field by its native kind. Unrecognized kinds (choice
/// widgets, vendor extensions) fall back to text.
fn classify(doc: &Document, field: &Dictionary) -> FieldType {
    let kind = field
        .get(b"FT")
        .ok()
        .map(|o| resolve(doc, o))
        .and_then(|o| o.as_name().ok());
    match kind {
        Some(b"Tx") => FieldType::Text,
        Some(b"Btn") => {
            if field_flags(field) & FLAG_PUSHBUTTON != 0 {
                FieldType::Signature
            } else {
                FieldType::Checkbox
            }
        }
        Some(b"Sig") => FieldType::Signature,
        _ => FieldType::Text,
    }
}

fn field_flags(field: &Dictionary) -> i64 {
    field
        .get(b"Ff")
        .ok()
        .and_then(|o| o.as_i64().ok())
        .unwrap_or(0)
}

/// Partial field name (`/T`), lossily decoded. Empty when absent.
fn field_label(doc: &Document, field: &Dictionary) -> String {
    match field.get(b"T").map(|o| resolve(doc, o)) {
        Ok(Object::String(bytes, _)) => String::from_utf8_lossy(bytes).into_owned(),
        _ => String::new(),
    }
}

/// The field's first widget annotation. Fields with `/Kids` keep widgets
/// as children; otherwise the field dictionary is itself the merged
/// widget.
fn first_widget<'a>(
    doc: &'a Document,
    field_id: ObjectId,
    field: &'a Dictionary,
) -> (ObjectId, &'a Dictionary) {
    if let Some(kids) = field.get(b"Kids").ok().and_then(|o| resolve_array(doc, o)) {
        for kid in kids {
            if let Ok(id) = kid.as_reference() {
                if let Ok(dict) = doc.get_dictionary(id) {
                    return (id, dict);
                }
            }
        }
    }
    (field_id, field)
}

/// Resolve the widget's page: its `/P` reference first, then a scan of
/// each page's `/Annots` list. First match wins; no match defaults to
/// page 1.
fn widget_page(
    doc: &Document,
    widget_id: ObjectId,
    widget: &Dictionary,
    pages: &[(u32, ObjectId)],
) -> u32 {
    if let Ok(page_ref) = widget.get(b"P").and_then(|o| o.as_reference()) {
        if let Some((number, _)) = pages.iter().find(|(_, id)| *id == page_ref) {
            return *number;
        }
    }

    for (number, page_id) in pages {
        if let Ok(page) = doc.get_dictionary(*page_id) {
            if let Some(annots) = page.get(b"Annots").ok().and_then(|o| resolve_array(doc, o)) {
                let listed = annots
                    .iter()
                    .any(|a| a.as_reference().map(|id| id == widget_id).unwrap_or(false));
                if listed {
                    return *number;
                }
            }
        }
    }

    1
}

/// Lower-left corner of the widget's `/Rect`, or the origin if absent.
fn widget_origin(doc: &Document, widget: &Dictionary) -> (f32, f32) {
    let Some(rect) = widget.get(b"Rect").ok().and_then(|o| resolve_array(doc, o)) else {
        return (0.0, 0.0);
    };
    let x = rect.first().and_then(as_number).unwrap_or(0.0);
    let y = rect.get(1).and_then(as_number).unwrap_or(0.0);
    (x, y)
}

fn as_number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    match obj {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        _ => obj,
    }
}

fn resolve_dict<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Dictionary> {
    resolve(doc, obj).as_dict().ok()
}

fn resolve_array<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Vec<Object>> {
    resolve(doc, obj).as_array().ok()
}
