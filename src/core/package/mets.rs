//! METS manifest for container packages

use chrono::{DateTime, SecondsFormat, Utc};
use quick_xml::escape::escape;
use std::fmt::Write as _;

const METS_NS: &str = "http://www.loc.gov/METS/";
const XLINK_NS: &str = "http://www.w3.org/1999/xlink";
const XSI_NS: &str = "http://www.w3.org/2001/XMLSchema-instance";
const EARK_PROFILE: &str = "http://www.eark-project.com/METS/IP.xml";

/// A file referenced from the manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetsFile {
    /// Path inside the package, `/`-separated
    pub href: String,
    pub size: u64,
    pub sha256: String,
}

/// Descriptive metadata reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetsDescriptive {
    pub file: MetsFile,
    /// `DC`, `EAD` or `OTHER`
    pub mdtype: &'static str,
    pub version: Option<String>,
}

/// A named group of payload files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetsRepresentation {
    pub id: String,
    pub files: Vec<MetsFile>,
}

/// Root METS document of a container package
#[derive(Debug, Clone)]
pub struct MetsDocument {
    pub object_id: String,
    pub label: String,
    pub created: DateTime<Utc>,
    pub parent: Option<String>,
    pub descriptive: Vec<MetsDescriptive>,
    pub representations: Vec<MetsRepresentation>,
}

impl MetsDocument {
    /// Serializes the document
    ///
    /// Element identifiers are derived from positions, so two documents with
    /// the same content differ only in the document `ID` and creation date.
    pub fn to_xml(&self) -> String {
        let created = self.created.to_rfc3339_opts(SecondsFormat::Secs, true);
        let mut out = String::new();

        out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        let _ = writeln!(
            out,
            "<mets:mets xmlns:mets=\"{METS_NS}\" xmlns:xlink=\"{XLINK_NS}\" xmlns:xsi=\"{XSI_NS}\" \
             ID=\"uuid-{}\" OBJID=\"{}\" LABEL=\"{}\" TYPE=\"Mixed\" PROFILE=\"{EARK_PROFILE}\">",
            uuid::Uuid::new_v4(),
            escape(self.object_id.as_str()),
            escape(self.label.as_str()),
        );

        let _ = writeln!(
            out,
            "  <mets:metsHdr CREATEDATE=\"{created}\" RECORDSTATUS=\"NEW\">"
        );
        out.push_str("    <mets:agent ROLE=\"CREATOR\" TYPE=\"OTHER\" OTHERTYPE=\"SOFTWARE\">\n");
        out.push_str("      <mets:name>sipkit</mets:name>\n");
        let _ = writeln!(
            out,
            "      <mets:note>{}</mets:note>",
            env!("CARGO_PKG_VERSION")
        );
        out.push_str("    </mets:agent>\n");
        out.push_str("  </mets:metsHdr>\n");

        for (index, dmd) in self.descriptive.iter().enumerate() {
            self.write_dmd_sec(&mut out, index, dmd, &created);
        }

        out.push_str("  <mets:fileSec ID=\"filesec-1\">\n");
        for rep in &self.representations {
            let rep_id = escape(rep.id.as_str());
            let _ = writeln!(
                out,
                "    <mets:fileGrp ID=\"filegrp-{rep_id}\" USE=\"representations/{rep_id}\">"
            );
            for (index, file) in rep.files.iter().enumerate() {
                let _ = writeln!(
                    out,
                    "      <mets:file ID=\"{}\" SIZE=\"{}\" CHECKSUM=\"{}\" CHECKSUMTYPE=\"SHA-256\">",
                    file_id(&rep.id, index),
                    file.size,
                    file.sha256
                );
                let _ = writeln!(
                    out,
                    "        <mets:FLocat LOCTYPE=\"URL\" xlink:type=\"simple\" xlink:href=\"{}\"/>",
                    escape(file.href.as_str())
                );
                out.push_str("      </mets:file>\n");
            }
            out.push_str("    </mets:fileGrp>\n");
        }
        out.push_str("  </mets:fileSec>\n");

        self.write_physical_struct_map(&mut out);
        if let Some(parent) = &self.parent {
            let parent = escape(parent.as_str());
            out.push_str("  <mets:structMap ID=\"structmap-parent\" LABEL=\"parent\">\n");
            out.push_str("    <mets:div LABEL=\"parent\">\n");
            let _ = writeln!(
                out,
                "      <mets:mptr LOCTYPE=\"OTHER\" OTHERLOCTYPE=\"SIP\" xlink:type=\"simple\" \
                 xlink:href=\"{parent}\" xlink:title=\"{parent}\"/>"
            );
            out.push_str("    </mets:div>\n");
            out.push_str("  </mets:structMap>\n");
        }

        out.push_str("</mets:mets>\n");
        out
    }

    fn write_dmd_sec(&self, out: &mut String, index: usize, dmd: &MetsDescriptive, created: &str) {
        let _ = writeln!(
            out,
            "  <mets:dmdSec ID=\"{}\" CREATED=\"{created}\">",
            dmd_id(index)
        );
        let _ = write!(
            out,
            "    <mets:mdRef LOCTYPE=\"URL\" xlink:type=\"simple\" xlink:href=\"{}\" MDTYPE=\"{}\"",
            escape(dmd.file.href.as_str()),
            dmd.mdtype
        );
        if dmd.mdtype == "OTHER" {
            out.push_str(" OTHERMDTYPE=\"custom\"");
        }
        if let Some(version) = &dmd.version {
            let _ = write!(out, " MDTYPEVERSION=\"{}\"", escape(version.as_str()));
        }
        let _ = writeln!(
            out,
            " MIMETYPE=\"text/xml\" SIZE=\"{}\" CHECKSUM=\"{}\" CHECKSUMTYPE=\"SHA-256\"/>",
            dmd.file.size, dmd.file.sha256
        );
        out.push_str("  </mets:dmdSec>\n");
    }

    fn write_physical_struct_map(&self, out: &mut String) {
        let dmd_ids: Vec<String> = (0..self.descriptive.len()).map(dmd_id).collect();

        out.push_str("  <mets:structMap ID=\"structmap-1\" TYPE=\"PHYSICAL\" LABEL=\"E-ARK structural map\">\n");
        let _ = write!(
            out,
            "    <mets:div ID=\"div-root\" LABEL=\"{}\"",
            escape(self.object_id.as_str())
        );
        if !dmd_ids.is_empty() {
            let _ = write!(out, " DMDID=\"{}\"", dmd_ids.join(" "));
        }
        out.push_str(">\n");
        for rep in &self.representations {
            let rep_id = escape(rep.id.as_str());
            let _ = writeln!(
                out,
                "      <mets:div ID=\"div-{rep_id}\" LABEL=\"representations/{rep_id}\">"
            );
            for index in 0..rep.files.len() {
                let _ = writeln!(
                    out,
                    "        <mets:fptr FILEID=\"{}\"/>",
                    file_id(&rep.id, index)
                );
            }
            out.push_str("      </mets:div>\n");
        }
        out.push_str("    </mets:div>\n");
        out.push_str("  </mets:structMap>\n");
    }
}

fn dmd_id(index: usize) -> String {
    format!("dmd-{}", index + 1)
}

fn file_id(rep_id: &str, index: usize) -> String {
    let safe: String = rep_id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect();
    format!("file-{safe}-{}", index + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use quick_xml::events::Event;
    use quick_xml::Reader;

    fn sample(parent: Option<&str>, version: Option<&str>, mdtype: &'static str) -> MetsDocument {
        MetsDocument {
            object_id: "sip-1".to_string(),
            label: "Letters & Notes".to_string(),
            created: Utc::now(),
            parent: parent.map(str::to_string),
            descriptive: vec![MetsDescriptive {
                file: MetsFile {
                    href: "metadata/descriptive/dc.xml".to_string(),
                    size: 10,
                    sha256: "ab".repeat(32),
                },
                mdtype,
                version: version.map(str::to_string),
            }],
            representations: vec![MetsRepresentation {
                id: "rep1".to_string(),
                files: vec![
                    MetsFile {
                        href: "representations/rep1/data/a.txt".to_string(),
                        size: 5,
                        sha256: "cd".repeat(32),
                    },
                    MetsFile {
                        href: "representations/rep1/data/sub/b <1>.txt".to_string(),
                        size: 4,
                        sha256: "ef".repeat(32),
                    },
                ],
            }],
        }
    }

    fn element_names(xml: &str) -> Vec<String> {
        let mut reader = Reader::from_str(xml);
        let mut names = Vec::new();
        loop {
            match reader.read_event().unwrap() {
                Event::Start(e) | Event::Empty(e) => {
                    names.push(String::from_utf8(e.name().as_ref().to_vec()).unwrap())
                }
                Event::Eof => break,
                _ => {}
            }
        }
        names
    }

    #[test]
    fn test_mets_is_well_formed() {
        let xml = sample(Some("fonds-1"), Some("2002"), "DC").to_xml();
        let names = element_names(&xml);
        assert_eq!(names.iter().filter(|n| *n == "mets:file").count(), 2);
        assert_eq!(names.iter().filter(|n| *n == "mets:fptr").count(), 2);
        assert_eq!(names.iter().filter(|n| *n == "mets:dmdSec").count(), 1);
        assert_eq!(names.iter().filter(|n| *n == "mets:mptr").count(), 1);
    }

    #[test]
    fn test_mets_attributes() {
        let xml = sample(Some("fonds-1"), Some("2002"), "DC").to_xml();
        assert!(xml.contains("OBJID=\"sip-1\""));
        assert!(xml.contains("LABEL=\"Letters &amp; Notes\""));
        assert!(xml.contains("MDTYPE=\"DC\""));
        assert!(xml.contains("MDTYPEVERSION=\"2002\""));
        assert!(xml.contains("USE=\"representations/rep1\""));
        assert!(xml.contains("xlink:href=\"representations/rep1/data/sub/b &lt;1&gt;.txt\""));
        assert!(xml.contains("xlink:href=\"fonds-1\""));
        assert!(xml.contains("DMDID=\"dmd-1\""));
    }

    #[test]
    fn test_mets_without_parent_or_version() {
        let xml = sample(None, None, "OTHER").to_xml();
        assert!(!xml.contains("structmap-parent"));
        assert!(!xml.contains("MDTYPEVERSION"));
        assert!(xml.contains("MDTYPE=\"OTHER\" OTHERMDTYPE=\"custom\""));
    }
}
