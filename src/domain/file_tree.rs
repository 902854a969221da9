//! Source file tree model
//!
//! A [`FileTreeNode`] is either a regular file or a directory whose children
//! are keyed by name. Children live in a `BTreeMap`, so every traversal visits
//! them in lexicographic name order and two identical trees always package
//! identically.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Kind of a file tree node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// A directory; contributes a path segment only
    Directory,
    /// A regular file; the only kind copied as payload
    File,
}

/// A directory or file taken from the source filesystem
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileTreeNode {
    path: PathBuf,
    kind: NodeKind,
    children: BTreeMap<String, FileTreeNode>,
}

impl FileTreeNode {
    /// Creates a file node for `path`
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            kind: NodeKind::File,
            children: BTreeMap::new(),
        }
    }

    /// Creates an empty directory node for `path`
    pub fn directory(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            kind: NodeKind::Directory,
            children: BTreeMap::new(),
        }
    }

    /// Builds the tree rooted at `path` from the filesystem
    ///
    /// A root without a final component, such as `docs/sub/..`, is resolved
    /// to its canonical path first. Only directories and regular files enter
    /// the tree; FIFOs, sockets and device nodes are skipped. Symbolic links
    /// are followed when they point at regular files. Links to directories
    /// are skipped so that link cycles cannot recurse forever.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error if `path` or one of its descendants
    /// cannot be inspected, and `InvalidInput` if `path` itself is neither a
    /// directory nor a regular file.
    pub fn scan(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let path = if path.file_name().is_none() {
            fs::canonicalize(path)?
        } else {
            path.to_path_buf()
        };
        let metadata = fs::metadata(&path)?;

        if metadata.is_file() {
            return Ok(Self::file(path));
        }
        if !metadata.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is neither a directory nor a regular file", path.display()),
            ));
        }

        let mut node = Self::directory(&path);
        node.scan_children()?;
        Ok(node)
    }

    fn scan_children(&mut self) -> io::Result<()> {
        for entry in fs::read_dir(&self.path)? {
            let entry = entry?;
            let child_path = entry.path();
            let file_type = entry.file_type()?;

            let target_type = if file_type.is_symlink() {
                match fs::metadata(&child_path) {
                    Ok(target) if target.is_dir() => {
                        tracing::debug!(
                            path = %child_path.display(),
                            "Skipping symbolic link to directory"
                        );
                        continue;
                    }
                    Ok(target) => target.file_type(),
                    // Dangling links stay in the tree so the SIP fails visibly
                    Err(_) => {
                        self.insert_child(Self::file(child_path));
                        continue;
                    }
                }
            } else {
                file_type
            };

            if target_type.is_dir() {
                let mut child = Self::directory(child_path);
                child.scan_children()?;
                self.insert_child(child);
            } else if target_type.is_file() {
                self.insert_child(Self::file(child_path));
            } else {
                tracing::debug!(
                    path = %child_path.display(),
                    "Skipping entry that is not a regular file"
                );
            }
        }
        Ok(())
    }

    /// Adds a child node, keyed by its name, and returns self
    pub fn with_child(mut self, child: FileTreeNode) -> Self {
        self.insert_child(child);
        self
    }

    /// Adds a child node, keyed by its name
    ///
    /// A node that receives children is a directory, so a file node is
    /// turned into a directory node. Returns the child previously stored
    /// under the same name, if any.
    pub fn insert_child(&mut self, child: FileTreeNode) -> Option<FileTreeNode> {
        self.kind = NodeKind::Directory;
        self.children.insert(child.name().unwrap_or_default(), child)
    }

    /// Absolute source path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Node kind
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Whether this node is a directory
    pub fn is_directory(&self) -> bool {
        self.kind == NodeKind::Directory
    }

    /// Whether this node is a regular file
    pub fn is_file(&self) -> bool {
        self.kind == NodeKind::File
    }

    /// Leaf name of the source path
    ///
    /// `None` for paths such as `/` or `a/..` that have no final component.
    pub fn name(&self) -> Option<String> {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
    }

    /// Children in name order
    pub fn children(&self) -> impl Iterator<Item = &FileTreeNode> {
        self.children.values()
    }

    /// Looks up a direct child by name
    pub fn child(&self, name: &str) -> Option<&FileTreeNode> {
        self.children.get(name)
    }

    /// Number of file leaves reachable from this node
    pub fn leaf_count(&self) -> usize {
        match self.kind {
            NodeKind::File => 1,
            NodeKind::Directory => self.children.values().map(FileTreeNode::leaf_count).sum(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_children_are_name_ordered() {
        let dir = FileTreeNode::directory("/src/root")
            .with_child(FileTreeNode::file("/src/root/zeta.txt"))
            .with_child(FileTreeNode::file("/src/root/alpha.txt"))
            .with_child(FileTreeNode::directory("/src/root/mid"));

        let names: Vec<String> = dir.children().filter_map(FileTreeNode::name).collect();
        assert_eq!(names, vec!["alpha.txt", "mid", "zeta.txt"]);
    }

    #[test]
    fn test_insert_child_replaces_same_name() {
        let mut dir = FileTreeNode::directory("/a");
        assert!(dir.insert_child(FileTreeNode::file("/a/x")).is_none());
        let previous = dir.insert_child(FileTreeNode::file("/b/x"));
        assert_eq!(previous.unwrap().path(), Path::new("/a/x"));
        assert_eq!(dir.child("x").unwrap().path(), Path::new("/b/x"));
    }

    #[test]
    fn test_insert_child_promotes_file_to_directory() {
        let mut node = FileTreeNode::file("/a");
        node.insert_child(FileTreeNode::file("/a/b"));
        assert!(node.is_directory());
    }

    #[test]
    fn test_leaf_count() {
        let tree = FileTreeNode::directory("/r")
            .with_child(FileTreeNode::file("/r/a.txt"))
            .with_child(FileTreeNode::directory("/r/sub").with_child(FileTreeNode::file("/r/sub/b.txt")))
            .with_child(FileTreeNode::directory("/r/empty"));
        assert_eq!(tree.leaf_count(), 2);
        assert_eq!(FileTreeNode::file("/r/a.txt").leaf_count(), 1);
    }

    #[test]
    fn test_name_of_root_path() {
        assert_eq!(FileTreeNode::directory("/").name(), None);
        assert_eq!(FileTreeNode::directory("/data/sub/..").name(), None);
        assert_eq!(
            FileTreeNode::file("/data/report.pdf").name().as_deref(),
            Some("report.pdf")
        );
    }

    #[test]
    fn test_scan_builds_tree() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("root");
        fs::create_dir_all(root.join("sub")).unwrap();
        fs::write(root.join("a.txt"), b"a").unwrap();
        fs::write(root.join("sub").join("b.txt"), b"b").unwrap();

        let tree = FileTreeNode::scan(&root).unwrap();
        assert!(tree.is_directory());
        assert_eq!(tree.leaf_count(), 2);
        assert!(tree.child("a.txt").unwrap().is_file());
        let sub = tree.child("sub").unwrap();
        assert!(sub.is_directory());
        assert!(sub.child("b.txt").is_some());
    }

    #[test]
    fn test_scan_resolves_root_without_final_component() {
        let temp = TempDir::new().unwrap();
        let docs = temp.path().join("docs");
        fs::create_dir_all(docs.join("sub")).unwrap();
        fs::write(docs.join("a.txt"), b"a").unwrap();

        let tree = FileTreeNode::scan(docs.join("sub").join("..")).unwrap();

        assert_eq!(tree.name().as_deref(), Some("docs"));
        assert_eq!(tree.path(), fs::canonicalize(&docs).unwrap());
        assert!(tree.child("a.txt").unwrap().is_file());
    }

    #[cfg(unix)]
    #[test]
    fn test_scan_skips_special_files() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("root");
        fs::create_dir_all(&root).unwrap();
        fs::write(root.join("a.txt"), b"a").unwrap();
        let fifo = root.join("pipe");
        let status = std::process::Command::new("mkfifo")
            .arg(&fifo)
            .status()
            .unwrap();
        assert!(status.success());
        std::os::unix::fs::symlink(&fifo, root.join("pipe-link")).unwrap();

        let tree = FileTreeNode::scan(&root).unwrap();

        assert_eq!(tree.leaf_count(), 1);
        assert!(tree.child("pipe").is_none());
        assert!(tree.child("pipe-link").is_none());
        let err = FileTreeNode::scan(&fifo).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn test_scan_missing_path() {
        let temp = TempDir::new().unwrap();
        assert!(FileTreeNode::scan(temp.path().join("missing")).is_err());
    }
}
