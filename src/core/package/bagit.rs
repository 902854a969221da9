//! BagIt package builder
//!
//! Produces a BagIt 1.0 bag per SIP:
//!
//! ```text
//! <output>/<name>/
//!   bagit.txt
//!   bag-info.txt
//!   <dc.xml | ead.xml | custom.xml>
//!   manifest-sha256.txt
//!   tagmanifest-sha256.txt
//!   report.txt                  (only when reports are requested)
//!   data/<root>/...
//! ```
//!
//! The bag is assembled in a hidden staging directory inside the output root
//! and renamed into place once complete.

use super::{ensure_absent, BuildObserver, DescriptiveMetadataKind, PackageNaming};
use crate::core::export::progress::ExportPhase;
use crate::core::metadata::{extract_fields, normalize_line_breaks, render_report};
use crate::core::tree::{copy_tree, sha256_hex, CopiedFile};
use crate::domain::{PackageError, Result, SipDefinition};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

const BAGIT_TXT: &str = "BagIt-Version: 1.0\nTag-File-Character-Encoding: UTF-8\n";
const PAYLOAD_DIR: &str = "data";

/// Writes one BagIt directory per SIP
#[derive(Debug, Clone)]
pub struct BagitBuilder {
    output_root: PathBuf,
    naming: PackageNaming,
    create_report: bool,
}

impl BagitBuilder {
    pub fn new(output_root: impl Into<PathBuf>, naming: PackageNaming, create_report: bool) -> Self {
        Self {
            output_root: output_root.into(),
            naming,
            create_report,
        }
    }

    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    /// Builds the bag for `sip` and returns its directory
    pub fn create(&self, sip: &SipDefinition, observer: &dyn BuildObserver) -> Result<PathBuf> {
        let target = self.output_root.join(self.naming.package_name(sip));
        ensure_absent(&target)?;

        observer.phase_changed(ExportPhase::CreatingStructure);
        let staging = tempfile::Builder::new()
            .prefix(".sipkit-bag-")
            .tempdir_in(&self.output_root)
            .map_err(|e| PackageError::destination_unwritable(&self.output_root, e))?;
        let bag = staging.path();
        let data_dir = bag.join(PAYLOAD_DIR);
        fs::create_dir(&data_dir).map_err(|e| PackageError::destination_unwritable(&data_dir, e))?;

        let mut tags = TagFiles::new(bag);
        tags.write("bagit.txt", BAGIT_TXT.as_bytes())?;

        observer.phase_changed(ExportPhase::CopyingMetadata);
        let kind = DescriptiveMetadataKind::from_format(sip.metadata_format);
        tags.write(kind.file_name(), sip.metadata_content.as_bytes())?;

        observer.phase_changed(ExportPhase::CopyingData);
        let total = sip.leaf_count();
        let mut done = 0;
        let mut on_file = |_: &CopiedFile| {
            done += 1;
            observer.files_done(done, total);
        };
        let mut payload = Vec::with_capacity(total);
        for root in &sip.files {
            payload.extend(copy_tree(root, &data_dir, &mut on_file)?);
        }

        observer.phase_changed(ExportPhase::Finalizing);
        tags.write("bag-info.txt", bag_info(sip, kind, &payload).as_bytes())?;
        tags.write("manifest-sha256.txt", payload_manifest(&payload).as_bytes())?;
        if self.create_report {
            let fields = extract_fields(&sip.metadata_content);
            tags.write("report.txt", render_report(sip, &fields).as_bytes())?;
        }
        let tag_manifest = bag.join("tagmanifest-sha256.txt");
        fs::write(&tag_manifest, tags.manifest())
            .map_err(|e| PackageError::destination_unwritable(&tag_manifest, e))?;

        ensure_absent(&target)?;
        fs::rename(bag, &target).map_err(|e| PackageError::destination_unwritable(&target, e))?;
        // The staging path was moved, so dropping the guard finds nothing to remove.
        drop(staging);

        tracing::debug!(
            sip_id = %sip.id,
            path = %target.display(),
            files = payload.len(),
            "Bag written"
        );
        Ok(target)
    }
}

/// Tag files written at the bag root, remembered for the tag manifest
struct TagFiles<'a> {
    bag: &'a Path,
    written: Vec<(String, String)>,
}

impl<'a> TagFiles<'a> {
    fn new(bag: &'a Path) -> Self {
        Self {
            bag,
            written: Vec::new(),
        }
    }

    fn write(&mut self, name: &str, contents: &[u8]) -> Result<()> {
        let path = self.bag.join(name);
        fs::write(&path, contents).map_err(|e| PackageError::destination_unwritable(&path, e))?;
        self.written.push((name.to_string(), sha256_hex(contents)));
        Ok(())
    }

    fn manifest(&self) -> String {
        let mut out = String::new();
        for (name, digest) in &self.written {
            let _ = writeln!(out, "{digest}  {}", encode_manifest_path(name));
        }
        out
    }
}

fn bag_info(sip: &SipDefinition, kind: DescriptiveMetadataKind, payload: &[CopiedFile]) -> String {
    let octets: u64 = payload.iter().map(|f| f.size).sum();
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Bag-Software-Agent: sipkit {}",
        env!("CARGO_PKG_VERSION")
    );
    let _ = writeln!(out, "Bagging-Date: {}", chrono::Local::now().format("%Y-%m-%d"));
    let _ = writeln!(out, "Payload-Oxum: {octets}.{}", payload.len());
    let _ = writeln!(out, "External-Identifier: {}", tag_value(sip.id.as_str()));
    let _ = writeln!(out, "External-Description: {}", tag_value(&sip.name));
    if let Some(parent) = &sip.parent {
        let _ = writeln!(out, "Classification-Parent: {}", tag_value(parent.as_str()));
    }
    let _ = writeln!(out, "Metadata-Type: {}", kind.mets_type());
    if let Some(version) = &sip.metadata_version {
        let _ = writeln!(out, "Metadata-Version: {}", tag_value(version));
    }
    out
}

fn payload_manifest(payload: &[CopiedFile]) -> String {
    let mut out = String::new();
    for file in payload {
        let path = format!("{PAYLOAD_DIR}/{}", file.relative_path);
        let _ = writeln!(out, "{}  {}", file.sha256, encode_manifest_path(&path));
    }
    out
}

/// Tag values are single-line
fn tag_value(value: &str) -> String {
    normalize_line_breaks(value.trim())
}

/// Percent-encodes the characters BagIt reserves in manifest paths
fn encode_manifest_path(path: &str) -> String {
    path.replace('%', "%25")
        .replace('\n', "%0A")
        .replace('\r', "%0D")
}
