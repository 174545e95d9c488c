//! Lazy opening of files from a stream of paths.

use std::fs::File;
use std::path::PathBuf;

use log::warn;

use crate::error::{ErrorPolicy, Result, StreamError};

/// Opens files lazily, one per pulled record.
///
/// Consumes any iterator of `Result<PathBuf>` (typically a
/// [`DirLister`](crate::DirLister)) and yields `(path, file)` pairs. Each
/// file is opened read-only at the moment it is pulled, never eagerly for the
/// whole input, and its offset is 0 when yielded.
///
/// Ownership of the handle transfers to the consumer at yield time: the
/// opener keeps no reference, and the descriptor is released when the
/// consumer drops the `File`.
pub struct FileOpener<I> {
    paths: I,
    policy: ErrorPolicy,
    done: bool,
}

impl<I> FileOpener<I>
where
    I: Iterator<Item = Result<PathBuf>>,
{
    /// Open every path produced by `paths`, aborting on the first failure.
    pub fn new(paths: I) -> Self {
        Self::with_policy(paths, ErrorPolicy::Abort)
    }

    /// Open every path produced by `paths` with an explicit failure policy.
    ///
    /// With [`ErrorPolicy::Skip`], an unopenable file is logged and the
    /// sequence continues with the next path. Errors from the upstream
    /// iterator itself always terminate the sequence.
    pub fn with_policy(paths: I, policy: ErrorPolicy) -> Self {
        FileOpener {
            paths,
            policy,
            done: false,
        }
    }
}

impl<I> Iterator for FileOpener<I>
where
    I: Iterator<Item = Result<PathBuf>>,
{
    type Item = Result<(PathBuf, File)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            let path = match self.paths.next()? {
                Ok(path) => path,
                Err(err) => {
                    self.done = true;
                    return Some(Err(err));
                }
            };
            match File::open(&path) {
                Ok(file) => return Some(Ok((path, file))),
                Err(source) => {
                    let err = StreamError::FileAccess { path, source };
                    match self.policy {
                        ErrorPolicy::Abort => {
                            self.done = true;
                            return Some(Err(err));
                        }
                        ErrorPolicy::Skip => {
                            warn!("{err}, skipping");
                        }
                    }
                }
            }
        }
    }
}
