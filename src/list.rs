//! Lazy listing of regular files under a root directory.

use std::path::{Path, PathBuf};

use log::debug;
use walkdir::WalkDir;

use crate::error::{Result, StreamError};
use crate::mask::Mask;

/// Lazily lists regular files under a root directory.
///
/// Yields one path per regular file whose *file name* matches the mask, in
/// filesystem-traversal order (not sorted). Paths are the root joined with
/// the entry's relative location, so they are absolute whenever the root is.
///
/// Directory entries are read on demand as the iterator advances; no listing
/// is materialized up front. The sequence is single-pass: composing it into a
/// downstream stage consumes it, and another pass requires a fresh
/// `DirLister`.
#[derive(Debug)]
pub struct DirLister {
    walker: walkdir::IntoIter,
    mask: Mask,
}

impl DirLister {
    /// List files recursively under `root`. An empty mask matches every file
    /// name.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::RootNotFound`] if `root` does not exist or is
    /// not a directory, and [`StreamError::InvalidMask`] if the mask fails to
    /// compile. Traversal failures on individual entries surface as `Err`
    /// items during iteration.
    pub fn new(root: impl AsRef<Path>, mask: &str) -> Result<Self> {
        Self::with_depth(root.as_ref(), mask, usize::MAX)
    }

    /// List only the direct children of `root`, without recursing.
    pub fn top_level(root: impl AsRef<Path>, mask: &str) -> Result<Self> {
        Self::with_depth(root.as_ref(), mask, 1)
    }

    fn with_depth(root: &Path, mask: &str, max_depth: usize) -> Result<Self> {
        if !root.is_dir() {
            return Err(StreamError::RootNotFound(root.to_owned()));
        }
        debug!("listing {} with mask {:?}", root.display(), mask);
        Ok(DirLister {
            walker: WalkDir::new(root).max_depth(max_depth).into_iter(),
            mask: Mask::new(mask)?,
        })
    }
}

impl Iterator for DirLister {
    type Item = Result<PathBuf>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = match self.walker.next()? {
                Ok(entry) => entry,
                Err(err) => return Some(Err(err.into())),
            };
            if !entry.file_type().is_file() {
                continue;
            }
            if self.mask.matches_os(entry.file_name()) {
                return Some(Ok(entry.into_path()));
            }
        }
    }
}
