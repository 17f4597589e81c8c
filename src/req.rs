use core::fmt;
use core::ops::Range;

use httparse::Header;

use crate::parser::{find_header, find_headers_end, parse_content_length};
use crate::parser::{parse_headers, parse_request_line, RequestLine};
use crate::util::find_crlf;
use crate::{Error, Result};

/// A parsed request, borrowing the receive buffer it was read into.
///
/// Nothing is copied out of the buffer except the request line fields. The
/// header block and body are views into `'b` and the borrow checker keeps the
/// buffer from being reset while a `Request` is alive.
pub struct Request<'b> {
    buf: &'b [u8],
    line: RequestLine,
    headers: Range<usize>,
    body: Range<usize>,
    content_length: usize,
}

/// Everything known about a request once the header terminator arrived.
pub(crate) struct Head {
    pub line: RequestLine,
    pub line_end: usize,
    pub header_end: usize,
    pub content_length: usize,
}

impl Head {
    /// Parse the head of `buf`, `header_end` being the index right after the
    /// CRLFCRLF terminator.
    pub fn parse(buf: &[u8], header_end: usize) -> Result<Head> {
        let head = &buf[..header_end];

        // The terminator contains a CRLF, so there is always one.
        let line_end = find_crlf(head).ok_or(Error::RequestLine)?;

        let line = parse_request_line(&head[..line_end])?;

        let content_length = find_header(&head[line_end + 2..], "content-length")
            .map(parse_content_length)
            .unwrap_or(0);

        Ok(Head {
            line,
            line_end,
            header_end,
            content_length,
        })
    }

    /// Bytes the buffer must hold for the request to be complete.
    pub fn total_len(&self) -> usize {
        self.header_end.saturating_add(self.content_length)
    }
}

impl<'b> Request<'b> {
    pub(crate) fn new(buf: &'b [u8], head: Head) -> Self {
        let body_end = if head.content_length > 0 {
            buf.len().min(head.total_len())
        } else {
            buf.len()
        };

        Request {
            buf,
            line: head.line,
            headers: (head.line_end + 2)..head.header_end,
            body: head.header_end..body_end,
            content_length: head.content_length,
        }
    }

    /// Parse a request that is already completely in memory.
    ///
    /// Fails with [`Error::Incomplete`] if the header terminator is missing or
    /// fewer body bytes than `Content-Length` are present.
    ///
    /// ```
    /// let req = wisp::Request::from_bytes(b"GET /a?b=1 HTTP/1.1\r\nHost: x\r\n\r\n")?;
    /// assert_eq!(req.path(), "/a");
    /// assert_eq!(req.query(), "b=1");
    /// assert_eq!(req.header("host"), Some("x"));
    /// # Ok::<_, wisp::Error>(())
    /// ```
    pub fn from_bytes(buf: &'b [u8]) -> Result<Self> {
        let header_end = find_headers_end(buf).ok_or(Error::Incomplete)?;
        let head = Head::parse(buf, header_end)?;

        if buf.len() < head.total_len() {
            return Err(Error::Incomplete);
        }

        Ok(Request::new(buf, head))
    }

    pub fn method(&self) -> &str {
        &self.line.method
    }

    /// Path without the query.
    pub fn path(&self) -> &str {
        &self.line.path
    }

    /// Raw, undecoded query. Empty when the URI had no `?`.
    pub fn query(&self) -> &str {
        &self.line.query
    }

    /// `(major, minor)`
    pub fn version(&self) -> (u32, u32) {
        (self.line.major, self.line.minor)
    }

    pub fn request_line(&self) -> &RequestLine {
        &self.line
    }

    /// The header lines following the request line, up to and including the
    /// blank line that ends them.
    pub fn header_block(&self) -> &'b [u8] {
        &self.buf[self.headers.clone()]
    }

    pub fn body(&self) -> &'b [u8] {
        &self.buf[self.body.clone()]
    }

    /// Declared `Content-Length`, 0 if absent.
    pub fn content_length(&self) -> usize {
        self.content_length
    }

    /// All bytes the request was parsed from.
    pub fn as_bytes(&self) -> &'b [u8] {
        self.buf
    }

    /// Value of the first header named `name` (any case).
    ///
    /// `None` if it is missing or not valid utf-8.
    pub fn header(&self, name: &str) -> Option<&'b str> {
        let v = find_header(self.header_block(), name)?;
        core::str::from_utf8(v).ok()
    }

    pub fn content_type(&self) -> Option<&'b str> {
        self.header("content-type")
    }

    /// Strictly parse every header into `dst`.
    ///
    /// Unlike [`Request::header`] this rejects malformed lines and fails when
    /// `dst` is too small.
    pub fn headers<'h>(&self, dst: &'h mut [Header<'b>]) -> Result<&'h [Header<'b>]> {
        parse_headers(self.header_block(), dst)
    }
}

impl<'b> fmt::Debug for Request<'b> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("method", &self.line.method)
            .field("path", &self.line.path)
            .field("query", &self.line.query)
            .field("version", &self.version())
            .field("content_length", &self.content_length)
            .field("body_len", &self.body.len())
            .finish()
    }
}
