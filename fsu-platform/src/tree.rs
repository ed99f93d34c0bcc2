//! Recursive directory operations built on the single-level primitives

use fsu_core::{EntryKind, ErrorKind, FileSystem, FsError, FsPath, FsResult};
use tracing::{debug, warn};

/// Create `path` and any missing ancestors. Succeeds if `path` already is a
/// directory.
pub(crate) fn create_all<F: FileSystem>(fs: &F, path: &FsPath) -> FsResult<()> {
    if path.segments().is_empty() {
        return ensure_dir(fs, path, FsError::NotFound(path.to_string()));
    }
    match fs.mkdir(path, false) {
        Ok(()) => return Ok(()),
        Err(e) if e.kind() == ErrorKind::AlreadyExists => return ensure_dir(fs, path, e),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }

    let parent = path
        .parent()
        .ok_or_else(|| FsError::NotFound(path.to_string()))?;
    create_all(fs, &parent)?;

    // Someone else may have created it in the meantime
    match fs.mkdir(path, false) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::AlreadyExists => ensure_dir(fs, path, e),
        Err(e) => Err(e),
    }
}

fn ensure_dir<F: FileSystem>(fs: &F, path: &FsPath, err: FsError) -> FsResult<()> {
    match fs.stat(path) {
        Ok(meta) if meta.is_dir() => Ok(()),
        _ => Err(err),
    }
}

/// Child found while walking a tree
pub(crate) struct RawChild<L> {
    pub loc: L,
    /// Kind from the enumeration call, if it reported one
    pub kind: Option<EntryKind>,
}

/// Native view of a backend used by [`remove_all`].
///
/// Locations stay in native form (bytes on POSIX, UTF-16 on Windows) so an
/// entry whose name has no `String` form is removed like any other.
pub(crate) trait RawTree {
    type Loc;

    fn locate(&self, path: &FsPath) -> FsResult<Self::Loc>;

    /// Lossy rendering for error subjects and logs
    fn display(&self, loc: &Self::Loc) -> String;

    /// Kind of the object itself, not following a final symlink
    fn raw_kind(&self, loc: &Self::Loc) -> FsResult<EntryKind>;

    /// Every child of `dir`. Per-entry enumeration failures are inner errors.
    fn raw_children(&self, dir: &Self::Loc) -> FsResult<Vec<FsResult<RawChild<Self::Loc>>>>;

    /// Remove a single file, symlink or empty directory.
    fn raw_remove(&self, loc: &Self::Loc, kind: EntryKind) -> FsResult<()>;
}

/// Remove `path` and everything below it without following symlinks.
///
/// Best effort: a failing entry does not stop its siblings from being
/// removed. The first failure is returned unless `path` is gone at the end.
pub(crate) fn remove_all<T: RawTree>(fs: &T, path: &FsPath) -> FsResult<()> {
    let root = fs.locate(path)?;
    let kind = fs.raw_kind(&root)?;
    if kind != EntryKind::Directory {
        return fs.raw_remove(&root, kind);
    }

    let mut first_failure = None;
    remove_children(fs, &root, &mut first_failure);
    match fs.raw_remove(&root, EntryKind::Directory) {
        Ok(()) => {
            debug!(path = %path, "removed tree");
            return Ok(());
        }
        Err(e) if e.is_not_found() => return Ok(()),
        Err(e) => note_failure(&mut first_failure, fs.display(&root), e),
    }
    match fs.raw_kind(&root) {
        Err(e) if e.is_not_found() => Ok(()),
        _ => first_failure.map_or(Ok(()), Err),
    }
}

fn remove_children<T: RawTree>(fs: &T, dir: &T::Loc, first_failure: &mut Option<FsError>) {
    // Finish enumerating before deleting anything
    let children = match fs.raw_children(dir) {
        Ok(children) => children,
        Err(e) if e.is_not_found() => return,
        Err(e) => return note_failure(first_failure, fs.display(dir), e),
    };

    for child in children {
        let child = match child {
            Ok(child) => child,
            Err(e) => {
                note_failure(first_failure, fs.display(dir), e);
                continue;
            }
        };
        let kind = match child.kind {
            Some(kind) => kind,
            None => match fs.raw_kind(&child.loc) {
                Ok(kind) => kind,
                Err(e) if e.is_not_found() => continue,
                Err(e) => {
                    note_failure(first_failure, fs.display(&child.loc), e);
                    continue;
                }
            },
        };
        if kind == EntryKind::Directory {
            remove_children(fs, &child.loc, first_failure);
        }
        match fs.raw_remove(&child.loc, kind) {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {}
            Err(e) => note_failure(first_failure, fs.display(&child.loc), e),
        }
    }
}

fn note_failure(first_failure: &mut Option<FsError>, subject: String, err: FsError) {
    warn!(path = %subject, error = %err, "could not remove entry");
    if first_failure.is_none() {
        *first_failure = Some(err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::{BTreeMap, BTreeSet};

    /// Tree keyed by byte paths. Directories listed in `locked` cannot be
    /// enumerated.
    #[derive(Default)]
    struct ByteTree {
        nodes: RefCell<BTreeMap<Vec<u8>, EntryKind>>,
        locked: BTreeSet<Vec<u8>>,
    }

    impl ByteTree {
        fn add(&self, path: &[u8], kind: EntryKind) {
            self.nodes.borrow_mut().insert(path.to_vec(), kind);
        }

        fn contains(&self, path: &[u8]) -> bool {
            self.nodes.borrow().contains_key(path)
        }

        fn is_child(parent: &[u8], path: &[u8]) -> bool {
            path.len() > parent.len() + 1
                && path.starts_with(parent)
                && path[parent.len()] == b'/'
                && !path[parent.len() + 1..].contains(&b'/')
        }
    }

    impl RawTree for ByteTree {
        type Loc = Vec<u8>;

        fn locate(&self, path: &FsPath) -> FsResult<Vec<u8>> {
            Ok(path.to_string().into_bytes())
        }

        fn display(&self, loc: &Vec<u8>) -> String {
            String::from_utf8_lossy(loc).into_owned()
        }

        fn raw_kind(&self, loc: &Vec<u8>) -> FsResult<EntryKind> {
            self.nodes
                .borrow()
                .get(loc)
                .copied()
                .ok_or_else(|| FsError::NotFound(self.display(loc)))
        }

        fn raw_children(&self, dir: &Vec<u8>) -> FsResult<Vec<FsResult<RawChild<Vec<u8>>>>> {
            if self.locked.contains(dir) {
                return Err(FsError::PermissionDenied(self.display(dir)));
            }
            Ok(self
                .nodes
                .borrow()
                .iter()
                .filter(|(path, _)| Self::is_child(dir, path))
                .map(|(path, _)| {
                    Ok(RawChild {
                        loc: path.clone(),
                        kind: None,
                    })
                })
                .collect())
        }

        fn raw_remove(&self, loc: &Vec<u8>, kind: EntryKind) -> FsResult<()> {
            let mut nodes = self.nodes.borrow_mut();
            if kind == EntryKind::Directory && nodes.keys().any(|p| Self::is_child(loc, p)) {
                return Err(FsError::NotEmpty(self.display(loc)));
            }
            nodes
                .remove(loc)
                .map(drop)
                .ok_or_else(|| FsError::NotFound(self.display(loc)))
        }
    }

    fn path(s: &str) -> FsPath {
        FsPath::normalize_with(s, fsu_core::PathStyle::Posix).unwrap()
    }

    #[test]
    fn test_removes_names_without_string_form() {
        let tree = ByteTree::default();
        tree.add(b"/t", EntryKind::Directory);
        tree.add(b"/t/ok", EntryKind::File);
        tree.add(b"/t/bad\xff", EntryKind::File);
        tree.add(b"/t/sub\xfe", EntryKind::Directory);
        tree.add(b"/t/sub\xfe/leaf", EntryKind::File);

        remove_all(&tree, &path("/t")).unwrap();
        assert!(tree.nodes.borrow().is_empty());
    }

    #[test]
    fn test_best_effort_keeps_first_failure() {
        let mut tree = ByteTree::default();
        tree.locked.insert(b"/t/locked".to_vec());
        tree.add(b"/t", EntryKind::Directory);
        tree.add(b"/t/a", EntryKind::File);
        tree.add(b"/t/locked", EntryKind::Directory);
        tree.add(b"/t/locked/inner", EntryKind::File);
        tree.add(b"/t/z", EntryKind::File);

        let err = remove_all(&tree, &path("/t")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PermissionDenied);
        assert!(!tree.contains(b"/t/a"));
        assert!(!tree.contains(b"/t/z"));
        assert!(tree.contains(b"/t/locked/inner"));
    }

    #[test]
    fn test_single_file_and_missing_target() {
        let tree = ByteTree::default();
        tree.add(b"/f", EntryKind::File);
        remove_all(&tree, &path("/f")).unwrap();
        assert!(!tree.contains(b"/f"));

        let err = remove_all(&tree, &path("/f")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
