//! Low-level read helpers shared by the pipeline stages.

use std::io::{Error, ErrorKind, Read, Result};

/// Read until `buf` is full, possibly performing multiple reads to do so (and
/// retrying if required to deal with EINTR).
///
/// Unlike the standard `Read::read_exact()` method, a stream that ends
/// cleanly before the first byte is distinguishable from one that ends
/// mid-buffer, which is what lets an archive reader tell "no more headers"
/// from "truncated header".
///
/// # Return value
///
///  - `Ok(true)`: the buffer was filled completely
///  - `Ok(false)`: a "clean" EOF occurred immediately with no data read
///  - `Err(UnexpectedEof)`: the stream ended after a partial read
///  - underlying errors from the `Read` implementation are returned directly
pub(crate) fn read_full(reader: &mut impl Read, buf: &mut [u8]) -> Result<bool> {
    let buflen = buf.len();
    let mut todo: &mut [u8] = buf;

    while !todo.is_empty() {
        match reader.read(todo) {
            Ok(0) => {
                return match todo.len() {
                    s if s == buflen => Ok(false), // clean EOF
                    _ => Err(Error::from(ErrorKind::UnexpectedEof)),
                };
            }
            Ok(n) => todo = &mut todo[n..],
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }

    Ok(true)
}

/// Read up to `buf.len()` bytes, stopping early only at end of stream, and
/// return how many bytes were read. Lets the compression sniffer peek at
/// streams that may be shorter than the magic number itself.
pub(crate) fn read_at_most(reader: &mut impl Read, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
