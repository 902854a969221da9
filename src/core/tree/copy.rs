//! Recursive copy of a file tree into a plain directory

use super::digest::HashingReader;
use super::{node_name, relative_path, walk, TreeVisitor};
use crate::domain::{FileTreeNode, PackageError, Result};
use std::fs::{self, File, FileTimes, OpenOptions};
use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};

/// A file written by [`copy_tree`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopiedFile {
    /// Path relative to the copy destination, `/`-separated
    pub relative_path: String,
    /// Number of bytes copied
    pub size: u64,
    /// Hex SHA-256 of the copied bytes
    pub sha256: String,
}

/// Visitor that mirrors a tree below a destination directory
///
/// Directories are created under their source leaf name. File bytes are
/// streamed once, hashed on the way, and the source timestamps and
/// permissions are applied to the copy. `on_file` runs after each file.
struct CopyVisitor<F> {
    destination: PathBuf,
    copied: Vec<CopiedFile>,
    on_file: F,
}

impl<F: FnMut(&CopiedFile)> CopyVisitor<F> {
    fn new(destination: impl Into<PathBuf>, on_file: F) -> Self {
        Self {
            destination: destination.into(),
            copied: Vec::new(),
            on_file,
        }
    }

    /// Files copied so far, in visit order
    fn into_copied(self) -> Vec<CopiedFile> {
        self.copied
    }

    fn target(&self, segments: &[String]) -> PathBuf {
        let mut target = self.destination.clone();
        target.extend(segments);
        target
    }
}

impl<F: FnMut(&CopiedFile)> TreeVisitor for CopyVisitor<F> {
    fn enter_directory(&mut self, _node: &FileTreeNode, segments: &[String]) -> Result<()> {
        let target = self.target(segments);
        fs::create_dir_all(&target).map_err(|e| PackageError::destination_unwritable(&target, e))?;
        Ok(())
    }

    fn visit_file(&mut self, node: &FileTreeNode, segments: &[String]) -> Result<()> {
        let name = node_name(node)?;
        let target = self.target(segments).join(&name);
        let (size, sha256) = copy_file(node.path(), &target)?;

        let copied = CopiedFile {
            relative_path: relative_path(segments, &name),
            size,
            sha256,
        };
        (self.on_file)(&copied);
        self.copied.push(copied);
        Ok(())
    }
}

/// Copies `root` into `destination` and returns every copied file
///
/// A directory root becomes `destination/<root name>/...`, a file root
/// becomes `destination/<file name>`. `on_file` runs after each file.
pub fn copy_tree<F: FnMut(&CopiedFile)>(
    root: &FileTreeNode,
    destination: &Path,
    on_file: F,
) -> Result<Vec<CopiedFile>> {
    let mut visitor = CopyVisitor::new(destination, on_file);
    walk(root, &mut Vec::new(), &mut visitor)?;
    Ok(visitor.into_copied())
}

/// Streams one file, returning its size and digest
///
/// Never overwrites: an existing target is reported as unwritable.
fn copy_file(source: &Path, target: &Path) -> Result<(u64, String)> {
    let metadata = regular_file_metadata(source)?;
    let input = File::open(source).map_err(|e| PackageError::source_unreadable(source, e))?;

    let output = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(target)
        .map_err(|e| PackageError::destination_unwritable(target, e))?;

    let mut reader = HashingReader::new(BufReader::new(input));
    let mut writer = BufWriter::new(output);
    io::copy(&mut reader, &mut writer).map_err(|e| classify_copy_error(source, target, e))?;
    let output = writer
        .into_inner()
        .map_err(|e| PackageError::destination_unwritable(target, e.into_error()))?;
    output
        .sync_all()
        .map_err(|e| PackageError::destination_unwritable(target, e))?;

    preserve_attributes(&metadata, &output, target)?;
    Ok(reader.finish())
}

/// Metadata of `source`, failing unless it is a regular file
///
/// Checked before opening, since opening a FIFO blocks until a writer
/// appears.
pub(crate) fn regular_file_metadata(source: &Path) -> Result<fs::Metadata> {
    let metadata =
        fs::metadata(source).map_err(|e| PackageError::source_unreadable(source, e))?;
    if !metadata.is_file() {
        return Err(PackageError::source_unreadable(
            source,
            io::Error::new(io::ErrorKind::InvalidInput, "not a regular file"),
        )
        .into());
    }
    Ok(metadata)
}

fn preserve_attributes(metadata: &fs::Metadata, output: &File, target: &Path) -> Result<()> {
    let mut times = FileTimes::new();
    if let Ok(modified) = metadata.modified() {
        times = times.set_modified(modified);
    }
    if let Ok(accessed) = metadata.accessed() {
        times = times.set_accessed(accessed);
    }
    output
        .set_times(times)
        .map_err(|e| PackageError::destination_unwritable(target, e))?;
    output
        .set_permissions(metadata.permissions())
        .map_err(|e| PackageError::destination_unwritable(target, e))?;
    Ok(())
}

/// Attributes an `io::copy` failure to whichever side caused it
fn classify_copy_error(source: &Path, target: &Path, err: io::Error) -> PackageError {
    match err.kind() {
        io::ErrorKind::StorageFull
        | io::ErrorKind::WriteZero
        | io::ErrorKind::PermissionDenied
        | io::ErrorKind::ReadOnlyFilesystem => PackageError::destination_unwritable(target, err),
        _ => PackageError::source_unreadable(source, err),
    }
}
