//! Descriptive metadata field extraction
//!
//! Turns arbitrary metadata markup into a flat `field -> value` map used for
//! human-readable reports. Extraction is total: when the input cannot be read
//! as XML the whole text becomes a single [`FALLBACK_FIELD`] entry.
//!
//! Field names are the element path from the document root, each step
//! prefixed with `.` (`.simpledc.title`, `.ead.archdesc.did.unittitle`).
//! Attributes of non-root elements are named `path@attribute`. Repeated
//! fields are joined with `"; "`. All line breaks, including the indentation
//! around them, collapse to a single space.

pub mod report;

pub use report::render_report;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;
use thiserror::Error;

/// Field name used when the metadata cannot be transformed
pub const FALLBACK_FIELD: &str = "metadata";

/// Separator between values of a repeated field
const VALUE_SEPARATOR: &str = "; ";

static LINE_BREAKS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:[ \t]*(?:\r\n|\r|\n)[ \t]*)+").expect("line break pattern is valid")
});

#[derive(Debug, Error)]
enum TransformError {
    #[error("malformed XML: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("malformed attribute: {0}")]
    Attr(#[from] quick_xml::events::attributes::AttrError),

    #[error("invalid escape: {0}")]
    Escape(#[from] quick_xml::escape::EscapeError),

    #[error("invalid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("{0}")]
    Structure(String),
}

struct Frame {
    name: String,
    text: String,
}

/// Extracts a flat field map from raw descriptive metadata
///
/// Never fails and never returns an empty map.
///
/// # Examples
///
/// ```
/// use sipkit::core::metadata::extract_fields;
///
/// let fields = extract_fields("<dc><title>Minutes</title><creator>Board</creator></dc>");
/// assert_eq!(fields[".dc.title"], "Minutes");
/// assert_eq!(fields[".dc.creator"], "Board");
///
/// let fallback = extract_fields("not\nmarkup");
/// assert_eq!(fallback["metadata"], "not markup");
/// ```
pub fn extract_fields(raw: &str) -> BTreeMap<String, String> {
    match transform(raw) {
        Ok(fields) if !fields.is_empty() => fields,
        Ok(_) => {
            tracing::info!("Metadata has no text fields, using raw text");
            fallback(raw)
        }
        Err(e) => {
            tracing::info!(error = %e, "Metadata transform failed, using raw text");
            fallback(raw)
        }
    }
}

/// Collapses every run of line breaks to a single space
pub fn normalize_line_breaks(text: &str) -> String {
    LINE_BREAKS.replace_all(text, " ").into_owned()
}

fn fallback(raw: &str) -> BTreeMap<String, String> {
    let mut fields = BTreeMap::new();
    fields.insert(FALLBACK_FIELD.to_string(), normalize_line_breaks(raw));
    fields
}

fn transform(raw: &str) -> Result<BTreeMap<String, String>, TransformError> {
    let mut reader = Reader::from_str(raw);
    let mut stack: Vec<Frame> = Vec::new();
    let mut fields = BTreeMap::new();
    let mut seen_root = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                open_element(&mut stack, &mut seen_root, &e, &mut fields)?;
            }
            Event::Empty(e) => {
                open_element(&mut stack, &mut seen_root, &e, &mut fields)?;
                stack.pop();
            }
            Event::End(_) => {
                let frame = stack
                    .pop()
                    .ok_or_else(|| TransformError::Structure("unexpected end tag".to_string()))?;
                let value = normalize_line_breaks(frame.text.trim());
                if !value.is_empty() {
                    add_field(&mut fields, field_key(&stack, &frame.name), value);
                }
            }
            Event::Text(e) => {
                let text = std::str::from_utf8(e.as_ref())?;
                match stack.last_mut() {
                    Some(top) => top.text.push_str(text),
                    None if text.trim().is_empty() => {}
                    None => {
                        return Err(TransformError::Structure(
                            "text outside the root element".to_string(),
                        ))
                    }
                }
            }
            Event::CData(e) => {
                let text = std::str::from_utf8(e.as_ref())?;
                let top = stack.last_mut().ok_or_else(|| {
                    TransformError::Structure("CDATA outside the root element".to_string())
                })?;
                top.text.push_str(text);
            }
            Event::GeneralRef(e) => {
                let entity = std::str::from_utf8(e.as_ref())?;
                let resolved = resolve_entity(entity).ok_or_else(|| {
                    TransformError::Structure(format!("unknown entity &{entity};"))
                })?;
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&resolved);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(TransformError::Structure("unclosed element".to_string()));
    }
    if !seen_root {
        return Err(TransformError::Structure("no root element".to_string()));
    }

    Ok(fields)
}

fn open_element(
    stack: &mut Vec<Frame>,
    seen_root: &mut bool,
    element: &BytesStart<'_>,
    fields: &mut BTreeMap<String, String>,
) -> Result<(), TransformError> {
    if stack.is_empty() {
        if *seen_root {
            return Err(TransformError::Structure(
                "more than one root element".to_string(),
            ));
        }
        *seen_root = true;
    }

    let qname = element.name();
    let name = std::str::from_utf8(local_name(qname.as_ref()))?.to_string();

    if !stack.is_empty() {
        let path = field_key(stack, &name);
        for attr in element.attributes() {
            let attr = attr?;
            let key = std::str::from_utf8(attr.key.as_ref())?;
            if key == "xmlns" || key.starts_with("xmlns:") || key.starts_with("xsi:") {
                continue;
            }
            let raw_value = std::str::from_utf8(&attr.value)?;
            let value = quick_xml::escape::unescape(raw_value)?;
            let value = normalize_line_breaks(value.trim());
            if !value.is_empty() {
                let attr_name = std::str::from_utf8(local_name(key.as_bytes()))?;
                add_field(fields, format!("{path}@{attr_name}"), value);
            }
        }
    }

    stack.push(Frame {
        name,
        text: String::new(),
    });
    Ok(())
}

/// Dotted path of `name`, given its open ancestors
fn field_key(ancestors: &[Frame], name: &str) -> String {
    let mut key = String::new();
    for frame in ancestors {
        key.push('.');
        key.push_str(&frame.name);
    }
    key.push('.');
    key.push_str(name);
    key
}

fn add_field(fields: &mut BTreeMap<String, String>, key: String, value: String) {
    fields
        .entry(key)
        .and_modify(|existing| {
            existing.push_str(VALUE_SEPARATOR);
            existing.push_str(&value);
        })
        .or_insert(value);
}

fn local_name(name: &[u8]) -> &[u8] {
    name.iter()
        .rposition(|&b| b == b':')
        .map(|i| &name[i + 1..])
        .unwrap_or(name)
}

fn resolve_entity(entity: &str) -> Option<String> {
    match entity {
        "apos" => return Some("'".to_string()),
        "quot" => return Some("\"".to_string()),
        "lt" => return Some("<".to_string()),
        "gt" => return Some(">".to_string()),
        "amp" => return Some("&".to_string()),
        _ => {}
    }

    let code = if let Some(hex) = entity.strip_prefix("#x") {
        u32::from_str_radix(hex, 16).ok()?
    } else if let Some(dec) = entity.strip_prefix('#') {
        dec.parse::<u32>().ok()?
    } else {
        return None;
    };
    char::from_u32(code).map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    const SIMPLE_DC: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<simpledc xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
  <dc:title>Board
      minutes</dc:title>
  <dc:creator>Finance</dc:creator>
  <dc:creator>Legal</dc:creator>
  <dc:date>2019</dc:date>
</simpledc>"#;

    #[test]
    fn test_extracts_dc_fields() {
        let fields = extract_fields(SIMPLE_DC);
        assert_eq!(fields[".simpledc.title"], "Board minutes");
        assert_eq!(fields[".simpledc.creator"], "Finance; Legal");
        assert_eq!(fields[".simpledc.date"], "2019");
        assert!(!fields.contains_key(FALLBACK_FIELD));
    }

    #[test]
    fn test_nested_paths_and_attributes() {
        let fields = extract_fields(
            r#"<ead><archdesc level="fonds"><did><unittitle>Letters</unittitle></did></archdesc></ead>"#,
        );
        assert_eq!(fields[".ead.archdesc.did.unittitle"], "Letters");
        assert_eq!(fields[".ead.archdesc@level"], "fonds");
    }

    #[test]
    fn test_entities_and_cdata() {
        let fields = extract_fields("<r><a>Tom &amp; Jerry &#x41;</a><b><![CDATA[<raw>]]></b></r>");
        assert_eq!(fields[".r.a"], "Tom & Jerry A");
        assert_eq!(fields[".r.b"], "<raw>");
    }

    #[test]
    fn test_root_text_only() {
        let fields = extract_fields("<note>hello</note>");
        assert_eq!(fields[".note"], "hello");
    }

    #[test_case("" ; "empty input")]
    #[test_case("plain text\r\nwith lines" ; "plain text")]
    #[test_case("<open><never>" ; "unclosed elements")]
    #[test_case("<a></b>" ; "mismatched end")]
    #[test_case("<a>&bogus;</a>" ; "unknown entity")]
    #[test_case("<a/><b/>" ; "two roots")]
    #[test_case("<empty/>" ; "no text fields")]
    #[test_case("\u{0}\u{1}\u{fffd}garbage<<>>" ; "binary garbage")]
    fn test_falls_back_to_single_field(input: &str) {
        let fields = extract_fields(input);
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[FALLBACK_FIELD], normalize_line_breaks(input));
    }

    #[test]
    fn test_fallback_collapses_line_breaks() {
        let fields = extract_fields("line one\r\nline two\rline three\n\nline four");
        assert_eq!(fields[FALLBACK_FIELD], "line one line two line three line four");
    }

    #[test]
    fn test_normalize_line_breaks_keeps_inline_spacing() {
        assert_eq!(normalize_line_breaks("a  b"), "a  b");
        assert_eq!(normalize_line_breaks("a\n   b"), "a b");
    }
}
