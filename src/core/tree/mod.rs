//! Filesystem tree walker
//!
//! [`walk`] descends a [`FileTreeNode`] depth-first, children in name order,
//! and hands every directory and file to a [`TreeVisitor`] together with the
//! relative path segments accumulated so far. The same walk drives both the
//! physical copy into a bag and the registration of payload files in a
//! container representation, so the two always agree on relative paths.

pub mod copy;
pub mod digest;

pub use copy::{copy_tree, CopiedFile};
pub use digest::{sha256_hex, HashingReader};

use crate::domain::{FileTreeNode, NodeKind, PackageError, Result};

/// Callbacks invoked by [`walk`]
pub trait TreeVisitor {
    /// Called when a directory is entered
    ///
    /// `segments` already ends with the directory's own name.
    fn enter_directory(&mut self, _node: &FileTreeNode, _segments: &[String]) -> Result<()> {
        Ok(())
    }

    /// Called for every file leaf
    ///
    /// `segments` holds the names of the file's ancestor directories, root
    /// first, not including the file itself.
    fn visit_file(&mut self, node: &FileTreeNode, segments: &[String]) -> Result<()>;
}

/// Walks `node`, pushing directory names onto `segments`
///
/// `segments` is restored to its original contents when the walk succeeds.
/// The first visitor error stops the walk and is returned. A node whose path
/// has no final component fails with [`PackageError::UnnamedSource`] before
/// any visitor runs for it.
pub fn walk<V: TreeVisitor + ?Sized>(
    node: &FileTreeNode,
    segments: &mut Vec<String>,
    visitor: &mut V,
) -> Result<()> {
    let name = node_name(node)?;
    match node.kind() {
        NodeKind::File => visitor.visit_file(node, segments),
        NodeKind::Directory => {
            segments.push(name);
            let result = walk_directory(node, segments, visitor);
            segments.pop();
            result
        }
    }
}

fn walk_directory<V: TreeVisitor + ?Sized>(
    node: &FileTreeNode,
    segments: &mut Vec<String>,
    visitor: &mut V,
) -> Result<()> {
    visitor.enter_directory(node, segments)?;
    for child in node.children() {
        walk(child, segments, visitor)?;
    }
    Ok(())
}

/// Leaf name of `node`, the only form in which it enters a package path
pub fn node_name(node: &FileTreeNode) -> Result<String> {
    node.name()
        .ok_or_else(|| PackageError::UnnamedSource(node.path().to_path_buf()).into())
}

/// Joins relative path segments and a leaf name with `/`
pub fn relative_path(segments: &[String], name: &str) -> String {
    let mut path = String::new();
    for segment in segments {
        path.push_str(segment);
        path.push('/');
    }
    path.push_str(name);
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SipkitError;

    #[derive(Default)]
    struct Recorder {
        directories: Vec<String>,
        files: Vec<String>,
    }

    impl TreeVisitor for Recorder {
        fn enter_directory(&mut self, _node: &FileTreeNode, segments: &[String]) -> Result<()> {
            self.directories.push(segments.join("/"));
            Ok(())
        }

        fn visit_file(&mut self, node: &FileTreeNode, segments: &[String]) -> Result<()> {
            self.files.push(relative_path(segments, &node_name(node)?));
            Ok(())
        }
    }

    fn sample_tree() -> FileTreeNode {
        FileTreeNode::directory("/src/root")
            .with_child(FileTreeNode::file("/src/root/b.txt"))
            .with_child(
                FileTreeNode::directory("/src/root/sub")
                    .with_child(FileTreeNode::file("/src/root/sub/z.txt"))
                    .with_child(FileTreeNode::file("/src/root/sub/c.txt")),
            )
            .with_child(FileTreeNode::file("/src/root/a.txt"))
    }

    #[test]
    fn test_walk_visits_in_name_order_with_paths() {
        let mut recorder = Recorder::default();
        let mut segments = Vec::new();
        walk(&sample_tree(), &mut segments, &mut recorder).unwrap();

        assert_eq!(recorder.directories, vec!["root", "root/sub"]);
        assert_eq!(
            recorder.files,
            vec!["root/a.txt", "root/b.txt", "root/sub/c.txt", "root/sub/z.txt"]
        );
        assert!(segments.is_empty());
    }

    #[test]
    fn test_walk_single_file_root() {
        let mut recorder = Recorder::default();
        walk(&FileTreeNode::file("/x/a.txt"), &mut Vec::new(), &mut recorder).unwrap();
        assert_eq!(recorder.files, vec!["a.txt"]);
        assert!(recorder.directories.is_empty());
    }

    #[test]
    fn test_walk_stops_on_error() {
        struct Failing(usize);
        impl TreeVisitor for Failing {
            fn visit_file(&mut self, _node: &FileTreeNode, _segments: &[String]) -> Result<()> {
                self.0 += 1;
                Err(SipkitError::Other("boom".to_string()))
            }
        }

        let mut visitor = Failing(0);
        let mut segments = vec!["prefix".to_string()];
        assert!(walk(&sample_tree(), &mut segments, &mut visitor).is_err());
        assert_eq!(visitor.0, 1);
        assert_eq!(segments, vec!["prefix".to_string()]);
    }

    #[test]
    fn test_walk_rejects_nameless_nodes() {
        for root in [
            FileTreeNode::directory("/").with_child(FileTreeNode::file("/a.txt")),
            FileTreeNode::file("/src/root/.."),
        ] {
            let mut recorder = Recorder::default();
            let err = walk(&root, &mut Vec::new(), &mut recorder).unwrap_err();
            assert!(matches!(
                err,
                SipkitError::Package(PackageError::UnnamedSource(_))
            ));
            assert!(recorder.files.is_empty());
            assert!(recorder.directories.is_empty());
        }
    }

    #[test]
    fn test_relative_path() {
        assert_eq!(relative_path(&[], "a.txt"), "a.txt");
        assert_eq!(
            relative_path(&["x".to_string(), "y".to_string()], "a.txt"),
            "x/y/a.txt"
        );
    }
}
