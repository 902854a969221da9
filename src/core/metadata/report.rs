//! Human-readable SIP report

use super::normalize_line_breaks;
use crate::domain::SipDefinition;
use std::collections::BTreeMap;
use std::fmt::Write;

/// Renders the plain-text summary written next to a bag's payload
///
/// The report names the SIP and lists one `field: value` line per extracted
/// metadata field, in field name order. Line breaks inside the SIP name are
/// folded to spaces so the title stays on one line.
pub fn render_report(sip: &SipDefinition, fields: &BTreeMap<String, String>) -> String {
    let mut out = String::new();
    let title = format!("SIP report: {}", normalize_line_breaks(sip.name.trim()));
    let _ = writeln!(out, "{title}");
    let _ = writeln!(out, "{}", "=".repeat(title.chars().count()));
    let _ = writeln!(out, "Identifier: {}", sip.id);
    if let Some(parent) = &sip.parent {
        let _ = writeln!(out, "Classification parent: {parent}");
    }
    let _ = writeln!(out, "Files: {}", sip.leaf_count());
    let _ = writeln!(out);
    let _ = writeln!(out, "Descriptive metadata");
    let _ = writeln!(out, "--------------------");
    for (field, value) in fields {
        let _ = writeln!(out, "{field}: {value}");
    }
    out
}
