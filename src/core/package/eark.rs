//! E-ARK-style container builder
//!
//! Each SIP becomes `<output>/<name>.zip`:
//!
//! ```text
//! <sip id>/
//!   METS.xml
//!   metadata/descriptive/<dc.xml | ead.xml | custom.xml>
//!   representations/rep1/data/<relative path>
//! ```
//!
//! The package is modelled in memory first (descriptive metadata staged in a
//! temporary file, payload registered by relative path) and serialized in the
//! finalizing phase. Source files are read exactly once, while being
//! compressed, and their digests are taken on the way.

use super::mets::{MetsDescriptive, MetsDocument, MetsFile, MetsRepresentation};
use super::{ensure_absent, sanitize_file_name, BuildObserver, DescriptiveMetadataKind, PackageNaming};
use crate::core::export::progress::ExportPhase;
use crate::core::tree::copy::regular_file_metadata;
use crate::core::tree::{node_name, relative_path, walk, HashingReader, TreeVisitor};
use crate::domain::{ClassificationId, FileTreeNode, PackageError, Result, SipDefinition, SipId};
use chrono::Utc;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Seek, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Identifier of the single content representation
pub const REPRESENTATION_ID: &str = "rep1";

const METS_FILE: &str = "METS.xml";
const DESCRIPTIVE_DIR: &str = "metadata/descriptive";
const LARGE_FILE_THRESHOLD: u64 = u32::MAX as u64;

/// Writes one zipped container per SIP
#[derive(Debug, Clone)]
pub struct EarkBuilder {
    output_root: PathBuf,
    naming: PackageNaming,
}

impl EarkBuilder {
    pub fn new(output_root: impl Into<PathBuf>, naming: PackageNaming) -> Self {
        Self {
            output_root: output_root.into(),
            naming,
        }
    }

    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    /// Builds the container for `sip` and returns the archive path
    pub fn create(&self, sip: &SipDefinition, observer: &dyn BuildObserver) -> Result<PathBuf> {
        let target = self
            .output_root
            .join(format!("{}.zip", self.naming.package_name(sip)));
        ensure_absent(&target)?;

        observer.phase_changed(ExportPhase::CreatingStructure);
        let mut package = EarkPackage::new(sip.id.clone(), sip.name.clone(), sip.parent.clone());

        observer.phase_changed(ExportPhase::CopyingMetadata);
        let kind = DescriptiveMetadataKind::from_format(sip.metadata_format);
        let staged = stage_metadata(&self.output_root, &sip.metadata_content)?;
        package.add_descriptive_metadata(staged, kind, sip.metadata_version.clone());

        observer.phase_changed(ExportPhase::CopyingData);
        let mut representation = Representation::new(REPRESENTATION_ID);
        for root in &sip.files {
            walk(root, &mut Vec::new(), &mut representation)?;
        }
        package.add_representation(representation);

        observer.phase_changed(ExportPhase::Finalizing);
        package.build(&self.output_root, &target, observer)?;

        tracing::debug!(
            sip_id = %sip.id,
            path = %target.display(),
            "Container written"
        );
        Ok(target)
    }
}

/// Writes raw metadata text to a temporary file in the output root
fn stage_metadata(output_root: &Path, content: &str) -> Result<NamedTempFile> {
    let mut staged = tempfile::Builder::new()
        .prefix(".sipkit-md-")
        .tempfile_in(output_root)
        .map_err(|e| PackageError::destination_unwritable(output_root, e))?;
    staged
        .write_all(content.as_bytes())
        .and_then(|_| staged.flush())
        .map_err(|e| PackageError::destination_unwritable(staged.path(), e))?;
    Ok(staged)
}

struct DescriptiveMetadata {
    staged: NamedTempFile,
    kind: DescriptiveMetadataKind,
    version: Option<String>,
}

/// A payload file registered at a relative path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepresentationFile {
    pub source: PathBuf,
    /// Path below the representation's `data/` folder, `/`-separated
    pub relative_path: String,
}

/// A named group of payload files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Representation {
    id: String,
    files: Vec<RepresentationFile>,
}

impl Representation {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            files: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Registers `node` under `segments`/`<leaf name>`
    ///
    /// # Errors
    ///
    /// Fails when the node's path has no final component.
    pub fn add_data(&mut self, node: &FileTreeNode, segments: &[String]) -> Result<()> {
        let name = node_name(node)?;
        self.files.push(RepresentationFile {
            source: node.path().to_path_buf(),
            relative_path: relative_path(segments, &name),
        });
        Ok(())
    }

    pub fn files(&self) -> &[RepresentationFile] {
        &self.files
    }
}

impl TreeVisitor for Representation {
    fn visit_file(&mut self, node: &FileTreeNode, segments: &[String]) -> Result<()> {
        self.add_data(node, segments)
    }
}

/// In-memory model of one container
struct EarkPackage {
    id: SipId,
    label: String,
    parent: Option<ClassificationId>,
    descriptive: Vec<DescriptiveMetadata>,
    representations: Vec<Representation>,
}

impl EarkPackage {
    fn new(id: SipId, label: String, parent: Option<ClassificationId>) -> Self {
        Self {
            id,
            label,
            parent,
            descriptive: Vec::new(),
            representations: Vec::new(),
        }
    }

    fn add_descriptive_metadata(
        &mut self,
        staged: NamedTempFile,
        kind: DescriptiveMetadataKind,
        version: Option<String>,
    ) {
        self.descriptive.push(DescriptiveMetadata {
            staged,
            kind,
            version,
        });
    }

    fn add_representation(&mut self, representation: Representation) {
        self.representations.push(representation);
    }

    /// Serializes the package to `target` through a temporary archive
    fn build(&self, output_root: &Path, target: &Path, observer: &dyn BuildObserver) -> Result<()> {
        let mut archive = tempfile::Builder::new()
            .prefix(".sipkit-zip-")
            .suffix(".zip")
            .tempfile_in(output_root)
            .map_err(|e| PackageError::destination_unwritable(output_root, e))?;

        {
            let writer = BufWriter::new(archive.as_file_mut());
            let mut zip = ZipWriter::new(writer);
            self.write_entries(&mut zip, observer)?;
            let mut writer = zip.finish()?;
            writer
                .flush()
                .map_err(|e| PackageError::destination_unwritable(target, e))?;
        }

        archive
            .as_file()
            .sync_all()
            .map_err(|e| PackageError::destination_unwritable(target, e))?;
        archive.persist_noclobber(target).map_err(|e| {
            if e.error.kind() == io::ErrorKind::AlreadyExists {
                PackageError::AlreadyExists(target.to_path_buf())
            } else {
                PackageError::destination_unwritable(target, e.error)
            }
        })?;
        Ok(())
    }

    fn write_entries<W: Write + Seek>(
        &self,
        zip: &mut ZipWriter<W>,
        observer: &dyn BuildObserver,
    ) -> Result<()> {
        let root = sanitize_file_name(self.id.as_str());
        let deflated = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        let mut descriptive = Vec::with_capacity(self.descriptive.len());
        for dmd in &self.descriptive {
            let href = format!("{DESCRIPTIVE_DIR}/{}", dmd.kind.file_name());
            let (size, sha256) =
                add_file(zip, &format!("{root}/{href}"), dmd.staged.path(), deflated)?;
            descriptive.push(MetsDescriptive {
                file: MetsFile { href, size, sha256 },
                mdtype: dmd.kind.mets_type(),
                version: dmd.version.clone(),
            });
        }

        let total: usize = self.representations.iter().map(|r| r.files.len()).sum();
        let mut done = 0;
        let mut representations = Vec::with_capacity(self.representations.len());
        for rep in &self.representations {
            let mut files = Vec::with_capacity(rep.files.len());
            for file in &rep.files {
                let href = format!("representations/{}/data/{}", rep.id, file.relative_path);
                let (size, sha256) =
                    add_file(zip, &format!("{root}/{href}"), &file.source, deflated)?;
                files.push(MetsFile { href, size, sha256 });
                done += 1;
                observer.files_done(done, total);
            }
            representations.push(MetsRepresentation {
                id: rep.id.clone(),
                files,
            });
        }

        let mets = MetsDocument {
            object_id: self.id.to_string(),
            label: self.label.clone(),
            created: Utc::now(),
            parent: self.parent.as_ref().map(ToString::to_string),
            descriptive,
            representations,
        };
        zip.start_file(format!("{root}/{METS_FILE}"), deflated)?;
        zip.write_all(mets.to_xml().as_bytes())
            .map_err(|e| PackageError::Archive(e.to_string()))?;
        Ok(())
    }
}

/// Streams `source` into a new archive entry, returning size and digest
fn add_file<W: Write + Seek>(
    zip: &mut ZipWriter<W>,
    entry: &str,
    source: &Path,
    options: SimpleFileOptions,
) -> Result<(u64, String)> {
    let len = regular_file_metadata(source)?.len();
    let file = File::open(source).map_err(|e| PackageError::source_unreadable(source, e))?;

    zip.start_file(entry, options.large_file(len >= LARGE_FILE_THRESHOLD))?;
    let mut reader = HashingReader::new(BufReader::new(file));
    io::copy(&mut reader, zip).map_err(|e| PackageError::source_unreadable(source, e))?;
    Ok(reader.finish())
}
