use std::io;

use crate::buffer::RecvBuffer;
use crate::error::is_timeout;
use crate::parser::find_headers_end;
use crate::req::{Head, Request};
use crate::{Error, Result};

/// Read one request from `stream` into `buf`.
///
/// The buffer is reset first. Bytes are read until the header terminator shows
/// up, then until `Content-Length` body bytes have arrived. The whole request
/// must fit in the buffer.
///
/// `Ok(None)` means the peer sent nothing before timing out or closing, which
/// is the normal idle outcome. Closing or failing after some bytes arrived is
/// an error.
pub fn read_request<'b, R: io::Read + ?Sized>(
    stream: &mut R,
    buf: &'b mut RecvBuffer,
) -> Result<Option<Request<'b>>> {
    buf.reset();

    let header_end = loop {
        if let Some(end) = find_headers_end(buf.filled()) {
            break end;
        }

        if buf.is_full() {
            return Err(Error::HeadersTooLarge);
        }

        match buf.fill_from(stream, usize::MAX) {
            Ok(0) if buf.is_empty() => {
                debug!("Closed before any request bytes");
                return Ok(None);
            }
            Ok(0) => return Err(Error::UnexpectedClose),
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) if is_timeout(&e) && buf.is_empty() => {
                debug!("No request");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        }
    };

    let head = Head::parse(buf.filled(), header_end)?;

    debug!(
        "{} {}{}{} HTTP/{}.{} ({} body bytes)",
        head.line.method,
        head.line.path,
        if head.line.query.is_empty() { "" } else { "?" },
        head.line.query,
        head.line.major,
        head.line.minor,
        head.content_length
    );

    let needed = head.total_len();
    if needed > buf.capacity() {
        return Err(Error::BodyTooLarge {
            needed,
            capacity: buf.capacity(),
        });
    }

    while buf.len() < needed {
        match buf.fill_from(stream, needed - buf.len()) {
            Ok(0) => return Err(Error::UnexpectedClose),
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e.into()),
        }
    }

    Ok(Some(Request::new(buf.filled(), head)))
}
