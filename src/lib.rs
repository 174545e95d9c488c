//! Lazy streaming of training samples from directories and tar shards.
//!
//! This library is the data-loading front end of a training pipeline: three
//! small, composable, pull-based producers that list files, open them, and
//! unpack tar shards into individual samples. Nothing is read until the
//! consumer asks for the next record and no collection is materialized up
//! front, so arbitrarily large directory trees and shard sets stream in
//! bounded memory.
//!
//! # Overview
//!
//! - [`DirLister`] walks a root directory and yields paths matching a
//!   glob-style file-name mask.
//! - [`FileOpener`] opens each incoming path and yields `(path, File)` pairs.
//! - [`TarExtractor`] unpacks each incoming `(path, stream)` pair as a tar
//!   archive — gzip-compressed or not, detected from content — and yields one
//!   `(member name, payload)` record per regular-file member.
//!
//! Each stage consumes the previous one by value, so a pipeline is
//! single-pass by construction. Yielded streams are owned by the consumer;
//! the producers keep no reference to them and never close them.
//!
//! # Example
//!
//! ```no_run
//! use shardstream::{DirLister, FileOpener, TarExtractor};
//!
//! let shards = DirLister::new("/data/train", "*.tar")?;
//! let archives = FileOpener::new(shards);
//! for record in TarExtractor::new(archives) {
//!     let (name, payload) = record?;
//!     println!("{}: {} bytes", name.display(), payload.get_ref().len());
//! }
//! # Ok::<(), shardstream::StreamError>(())
//! ```
//!
//! # Error handling
//!
//! Fallible items are `Result`s pulled by the consumer; see [`StreamError`]
//! for the taxonomy. The per-item skip-vs-abort choice on [`FileOpener`] and
//! [`TarExtractor`] is an explicit [`ErrorPolicy`], never implicit behavior.

pub mod error;
pub mod list;
pub mod load;
pub mod mask;
pub mod tar_shard;

mod util;

// Re-export commonly used types
pub use error::{ErrorPolicy, Result, StreamError};
pub use list::DirLister;
pub use load::FileOpener;
pub use mask::Mask;
pub use tar_shard::{source_path, TarExtractor};
