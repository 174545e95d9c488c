//! Streaming extraction of regular-file members from tar archives.
//!
//! Archives arrive as `(path, stream)` pairs, typically from a
//! [`FileOpener`](crate::FileOpener). Each stream may hold a plain tar
//! archive or a gzip-compressed one; compression is detected from the first
//! two bytes of content, never from the path.
//!
//! # Member names
//!
//! A member is named by joining the archive's path with the member's internal
//! path. Tar members archived from absolute paths are stored without the
//! leading slash, so for an archive named with a `.tar` extension the
//! original on-disk path of a member is the substring after the ".tar"
//! marker; [`source_path`] implements that recovery.

use std::io::{self, Chain, Cursor, Read};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use log::{debug, warn};
use tar::{EntryType, Header};

use crate::error::{ErrorPolicy, Result, StreamError};
use crate::util::{read_at_most, read_full};

const TAR_BLOCK_SIZE: usize = 512;
const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// A tar stream with compression undone, if there was any.
enum MaybeGzip<R> {
    Plain(Chain<Cursor<Vec<u8>>, R>),
    Gzip(GzDecoder<Chain<Cursor<Vec<u8>>, R>>),
}

impl<R: Read> MaybeGzip<R> {
    /// Sniff the first two bytes of `stream` and wrap it accordingly. The
    /// sniffed bytes are chained back in front, so the result reads from the
    /// start of the stream either way.
    fn sniff(mut stream: R) -> io::Result<Self> {
        let mut magic = [0u8; 2];
        let n = read_at_most(&mut stream, &mut magic)?;
        let rewound = Cursor::new(magic[..n].to_vec()).chain(stream);
        if magic[..n] == GZIP_MAGIC {
            Ok(MaybeGzip::Gzip(GzDecoder::new(rewound)))
        } else {
            Ok(MaybeGzip::Plain(rewound))
        }
    }
}

impl<R: Read> Read for MaybeGzip<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            MaybeGzip::Plain(reader) => reader.read(buf),
            MaybeGzip::Gzip(reader) => reader.read(buf),
        }
    }
}

/// Cursor into one open archive.
struct ArchiveState<R> {
    path: PathBuf,
    reader: MaybeGzip<R>,
}

impl<R: Read> ArchiveState<R> {
    fn malformed(&self, source: io::Error) -> StreamError {
        StreamError::MalformedArchive {
            archive: self.path.clone(),
            source,
        }
    }

    /// Advance past headers until the next regular-file member, buffer its
    /// payload, and derive its name. `Ok(None)` means the archive is
    /// exhausted.
    fn next_member(&mut self) -> Result<Option<(PathBuf, Cursor<Vec<u8>>)>> {
        // set by a GNU long-name pseudo-entry for the entry that follows it
        let mut long_name: Option<PathBuf> = None;

        loop {
            let mut header = Header::new_gnu();
            match read_full(&mut self.reader, header.as_mut_bytes()) {
                Ok(true) => {}
                // archives written without the trailing zero blocks just end
                Ok(false) => return Ok(None),
                Err(source) => return Err(self.malformed(source)),
            }

            // two zero blocks terminate the archive; the first is enough for
            // us, the rest of the stream is discarded with the reader
            if header.as_bytes().iter().all(|&b| b == 0) {
                return Ok(None);
            }

            let size = header.entry_size().map_err(|e| self.malformed(e))? as usize;
            let padded = (size + TAR_BLOCK_SIZE - 1) & !(TAR_BLOCK_SIZE - 1);

            match header.entry_type() {
                EntryType::Regular | EntryType::Continuous => {
                    let mut payload = vec![0u8; padded];
                    self.reader
                        .read_exact(&mut payload)
                        .map_err(|e| self.malformed(e))?;
                    payload.truncate(size);

                    let member = match long_name.take() {
                        Some(path) => path,
                        None => header.path().map_err(|e| self.malformed(e))?.into_owned(),
                    };
                    let name = derive_name(&self.path, &member);
                    return Ok(Some((name, Cursor::new(payload))));
                }
                EntryType::GNULongName => {
                    let mut raw = vec![0u8; padded];
                    self.reader
                        .read_exact(&mut raw)
                        .map_err(|e| self.malformed(e))?;
                    raw.truncate(size);
                    while raw.last() == Some(&0) {
                        raw.pop();
                    }
                    long_name = Some(PathBuf::from(String::from_utf8_lossy(&raw).into_owned()));
                }
                other => {
                    // directories, links, devices, pax headers: no record,
                    // and any payload they carry is dropped
                    debug!("skipping {:?} member in {}", other, self.path.display());
                    long_name = None;
                    self.discard(padded)?;
                }
            }
        }
    }

    fn discard(&mut self, count: usize) -> Result<()> {
        let copied = io::copy(&mut (&mut self.reader).take(count as u64), &mut io::sink());
        match copied {
            Ok(n) if n == count as u64 => Ok(()),
            Ok(_) => Err(self.malformed(io::ErrorKind::UnexpectedEof.into())),
            Err(e) => Err(self.malformed(e)),
        }
    }
}

/// Flattens tar archives into a lazy stream of regular-file members.
///
/// Consumes any iterator of `Result<(PathBuf, R)>` where each `R: Read`
/// yields the bytes of a tar archive, plain or gzip-compressed, and produces
/// one `(member name, payload)` record per regular-file member, in archive
/// order, across all archives in input order. Non-regular members
/// (directories, symlinks, hard links, devices) produce no record.
///
/// Each member's payload is buffered at yield time, so records stay valid
/// after the extractor advances and may be consumed out of order; only one
/// member payload is resident at a time. The parent archive stream is held
/// open while its members are being yielded and dropped once exhausted.
pub struct TarExtractor<I, R> {
    archives: I,
    current: Option<ArchiveState<R>>,
    policy: ErrorPolicy,
    done: bool,
}

impl<I, R> TarExtractor<I, R>
where
    I: Iterator<Item = Result<(PathBuf, R)>>,
    R: Read,
{
    /// Extract every archive produced by `archives`, aborting on the first
    /// malformed one.
    pub fn new(archives: I) -> Self {
        Self::with_policy(archives, ErrorPolicy::Abort)
    }

    /// Extract with an explicit failure policy.
    ///
    /// With [`ErrorPolicy::Skip`], a malformed archive is abandoned with a
    /// warning and extraction moves on to the next one; either way, no
    /// further members of a failed archive are yielded. Errors from the
    /// upstream iterator itself always terminate the sequence.
    pub fn with_policy(archives: I, policy: ErrorPolicy) -> Self {
        TarExtractor {
            archives,
            current: None,
            policy,
            done: false,
        }
    }
}

impl<I, R> Iterator for TarExtractor<I, R>
where
    I: Iterator<Item = Result<(PathBuf, R)>>,
    R: Read,
{
    type Item = Result<(PathBuf, Cursor<Vec<u8>>)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            if let Some(state) = &mut self.current {
                match state.next_member() {
                    Ok(Some(record)) => return Some(Ok(record)),
                    Ok(None) => {
                        self.current = None;
                    }
                    Err(err) => {
                        self.current = None;
                        match self.policy {
                            ErrorPolicy::Abort => {
                                self.done = true;
                                return Some(Err(err));
                            }
                            ErrorPolicy::Skip => {
                                warn!("{err}, skipping rest of archive");
                            }
                        }
                    }
                }
                continue;
            }

            let (path, stream) = match self.archives.next()? {
                Ok(pair) => pair,
                Err(err) => {
                    self.done = true;
                    return Some(Err(err));
                }
            };
            debug!("opening archive {}", path.display());
            match MaybeGzip::sniff(stream) {
                Ok(reader) => self.current = Some(ArchiveState { path, reader }),
                Err(source) => {
                    let err = StreamError::FileAccess { path, source };
                    match self.policy {
                        ErrorPolicy::Abort => {
                            self.done = true;
                            return Some(Err(err));
                        }
                        ErrorPolicy::Skip => {
                            warn!("{err}, skipping archive");
                        }
                    }
                }
            }
        }
    }
}

/// Join an archive path with a member's internal path to form the member's
/// public name.
fn derive_name(archive: &Path, member: &Path) -> PathBuf {
    // members are normally stored without a leading slash; strip one anyway
    // so that join() appends instead of replacing
    let member = member.strip_prefix("/").unwrap_or(member);
    archive.join(member)
}

/// Recover the on-disk source path from a member name produced by
/// [`TarExtractor`].
///
/// Member names have the form `<archive path>/<member path>`. For archives
/// named with a `.tar` or `.tar.gz` extension whose members were archived
/// from absolute paths, everything after the first literal ".tar" is the
/// member's original path. Returns `None` when the name contains no ".tar"
/// or is not valid UTF-8.
///
/// The marker search is purely textual: an archive path that contains ".tar"
/// before its extension (say `data.tarballs/x.tar`) recovers the wrong
/// suffix.
pub fn source_path(member_name: &Path) -> Option<&Path> {
    let name = member_name.to_str()?;
    let rest = &name[name.find(".tar")? + ".tar".len()..];
    Some(Path::new(rest))
}
