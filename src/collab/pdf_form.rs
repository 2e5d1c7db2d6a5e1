//! AcroForm field reader for fillable PDFs.

use std::collections::HashMap;

use anyhow::{Context, Result};
use lopdf::{Dictionary, Document, Object};
use tracing::debug;

use super::FormFieldReader;

/// Reads filled-in AcroForm field values with lopdf. Returns an empty map
/// for flat (scanned) PDFs, which callers treat as "no structured source".
#[derive(Debug, Default, Clone)]
pub struct AcroFormReader;

impl AcroFormReader {
    pub fn new() -> Self {
        Self
    }
}

impl FormFieldReader for AcroFormReader {
    fn read_fields(&self, data: &[u8]) -> Result<HashMap<String, String>> {
        let doc = Document::load_mem(data).context("Failed to load PDF")?;
        let mut fields = HashMap::new();

        let catalog = doc.catalog().context("PDF has no catalog")?;
        let acro_form = match catalog.get(b"AcroForm") {
            Ok(obj) => obj,
            Err(_) => return Ok(fields), // flat PDF
        };
        let acro_form = resolve(&doc, acro_form)
            .as_dict()
            .context("AcroForm is not a dictionary")?;

        if let Ok(roots) = acro_form.get(b"Fields") {
            if let Ok(roots) = resolve(&doc, roots).as_array() {
                for root in roots {
                    collect_fields(&doc, root, &mut fields);
                }
            }
        }

        debug!("AcroFormReader: read {} filled fields", fields.len());
        Ok(fields)
    }
}

/// Walk a field tree node, recording every terminal field that carries both
/// a partial name (`T`) and a textual value (`V`). The partial name is what
/// the source form revision fixes, so that is the lookup key.
fn collect_fields(doc: &Document, node: &Object, out: &mut HashMap<String, String>) {
    let Ok(dict) = resolve(doc, node).as_dict() else {
        return;
    };

    if let (Some(name), Some(value)) = (field_name(doc, dict), field_value(doc, dict)) {
        out.insert(name, value);
    }

    if let Ok(kids) = dict.get(b"Kids") {
        if let Ok(kids) = resolve(doc, kids).as_array() {
            for kid in kids {
                collect_fields(doc, kid, out);
            }
        }
    }
}

fn field_name(doc: &Document, dict: &Dictionary) -> Option<String> {
    let obj = resolve(doc, dict.get(b"T").ok()?);
    Some(decode_pdf_string(obj.as_str().ok()?))
}

fn field_value(doc: &Document, dict: &Dictionary) -> Option<String> {
    match resolve(doc, dict.get(b"V").ok()?) {
        Object::String(bytes, _) => Some(decode_pdf_string(bytes)),
        _ => None, // checkbox/radio names are not field text
    }
}

fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    match obj {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        other => other,
    }
}

/// PDF text strings are either UTF-16BE with a BOM or byte-encoded.
fn decode_pdf_string(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let utf16: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        String::from_utf16_lossy(&utf16)
    } else {
        String::from_utf8_lossy(bytes).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::dictionary;

    #[test]
    fn decodes_utf16be_and_plain_strings() {
        let plain = b"Pt1Line2a_FamilyName[0]";
        assert_eq!(decode_pdf_string(plain), "Pt1Line2a_FamilyName[0]");

        let mut utf16 = vec![0xFE, 0xFF];
        for c in "Silva".encode_utf16() {
            utf16.extend_from_slice(&c.to_be_bytes());
        }
        assert_eq!(decode_pdf_string(&utf16), "Silva");
    }

    #[test]
    fn flat_pdf_yields_empty_map() {
        // Minimal single-page PDF with no AcroForm.
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();

        let fields = AcroFormReader::new().read_fields(&bytes).unwrap();
        assert!(fields.is_empty());
    }
}
