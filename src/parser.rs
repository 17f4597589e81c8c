use httparse::Header;

use crate::util::{find, lines, strip_prefix_ignore_case, trim_leading_ws, Bounded};
use crate::{Error, Result};

pub type Method = Bounded<7>;
pub type Path = Bounded<127>;
pub type Query = Bounded<127>;

/// Index right after the first CRLFCRLF, if there is one.
pub fn find_headers_end(buf: &[u8]) -> Option<usize> {
    find(buf, b"\r\n\r\n").map(|i| i + 4)
}

/// The parsed first line of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLine {
    pub method: Method,
    pub path: Path,
    pub query: Query,
    pub major: u32,
    pub minor: u32,
}

/// Parse `METHOD URI HTTP/x.y` (without the trailing CRLF).
///
/// Tokens are separated by one or more spaces, anything after the version token
/// is ignored. The URI splits on the first `?` into path and raw query. Fields
/// longer than their capacity are truncated.
pub fn parse_request_line(line: &[u8]) -> Result<RequestLine> {
    let line = core::str::from_utf8(line).map_err(|_| Error::NotUtf8)?;

    let mut tokens = line.split(' ').filter(|t| !t.is_empty());

    let (Some(method), Some(uri), Some(version)) = (tokens.next(), tokens.next(), tokens.next())
    else {
        return Err(Error::RequestLine);
    };

    let (path, query) = uri.split_once('?').unwrap_or((uri, ""));
    let (major, minor) = parse_version(version)?;

    let line = RequestLine {
        method: Method::copy_from(method),
        path: Path::copy_from(path),
        query: Query::copy_from(query),
        major,
        minor,
    };

    if line.method.is_truncated() || line.path.is_truncated() || line.query.is_truncated() {
        warn!("Request line field truncated: {:?}", line);
    }

    Ok(line)
}

fn parse_version(v: &str) -> Result<(u32, u32)> {
    let rest = v.strip_prefix("HTTP/").ok_or(Error::Version)?;
    let (major, minor) = rest.split_once('.').ok_or(Error::Version)?;

    let major = major.parse().map_err(|_| Error::Version)?;
    let minor = minor.parse().map_err(|_| Error::Version)?;

    Ok((major, minor))
}

/// First header in `block` whose name matches case-insensitively. The value has
/// leading spaces and tabs removed.
pub fn find_header<'a>(block: &'a [u8], name: &str) -> Option<&'a [u8]> {
    lines(block).find_map(|line| {
        let rest = strip_prefix_ignore_case(line, name.as_bytes())?;
        let value = rest.strip_prefix(b":")?;
        Some(trim_leading_ws(value))
    })
}

/// Leading decimal digits of `value`. No digits reads as 0, overlong values
/// saturate.
pub fn parse_content_length(value: &[u8]) -> usize {
    trim_leading_ws(value)
        .iter()
        .take_while(|c| c.is_ascii_digit())
        .fold(0_usize, |acc, c| {
            acc.saturating_mul(10).saturating_add((c - b'0') as usize)
        })
}

/// Strict parse of a header block into `dst`.
///
/// `src` must include the blank line that ends the block. Fails if a name or
/// value is malformed or there are more headers than `dst` can hold.
pub(crate) fn parse_headers<'a, 'h>(
    src: &'a [u8],
    dst: &'h mut [Header<'a>],
) -> Result<&'h [Header<'a>]> {
    match httparse::parse_headers(src, dst)? {
        httparse::Status::Complete((_, headers)) => Ok(headers),
        httparse::Status::Partial => Err(Error::Incomplete),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_find_headers_end() {
        assert_eq!(find_headers_end(b""), None);
        assert_eq!(find_headers_end(b"\r\n\r"), None);
        assert_eq!(find_headers_end(b"\r\n\r\n"), Some(4));
        assert_eq!(find_headers_end(b"GET / HTTP/1.1\r\n"), None);
        assert_eq!(find_headers_end(b"GET / HTTP/1.1\r\n\r\nbody"), Some(18));
        // terminator right at the end of the buffer
        assert_eq!(find_headers_end(b"x\r\r\n\r\n"), Some(6));
    }

    #[test]
    fn request_line() -> Result<()> {
        let l = parse_request_line(b"GET /status?a=1&b=2 HTTP/1.1")?;
        assert_eq!(l.method, "GET");
        assert_eq!(l.path, "/status");
        assert_eq!(l.query, "a=1&b=2");
        assert_eq!((l.major, l.minor), (1, 1));

        let l = parse_request_line(b"POST  /wifi  HTTP/1.0 trailing")?;
        assert_eq!(l.method, "POST");
        assert_eq!(l.path, "/wifi");
        assert_eq!(l.query, "");
        assert_eq!((l.major, l.minor), (1, 0));

        // only the first ? splits
        let l = parse_request_line(b"GET /a?b?c HTTP/1.1")?;
        assert_eq!(l.path, "/a");
        assert_eq!(l.query, "b?c");
        Ok(())
    }

    #[test]
    fn request_line_errors() {
        assert!(matches!(
            parse_request_line(b"GET /"),
            Err(Error::RequestLine)
        ));
        assert!(matches!(parse_request_line(b""), Err(Error::RequestLine)));
        assert!(matches!(
            parse_request_line(b"GET / HTTX/1.1"),
            Err(Error::Version)
        ));
        assert!(matches!(
            parse_request_line(b"GET / HTTP/1"),
            Err(Error::Version)
        ));
        assert!(matches!(
            parse_request_line(b"GET / HTTP/a.b"),
            Err(Error::Version)
        ));
        assert!(matches!(
            parse_request_line(b"GET /\xff HTTP/1.1"),
            Err(Error::NotUtf8)
        ));
    }

    #[test]
    fn request_line_truncates() -> Result<()> {
        let long = format!("GET /{} HTTP/1.1", "p".repeat(200));
        let l = parse_request_line(long.as_bytes())?;
        assert_eq!(l.path.len(), Path::CAPACITY);
        assert!(l.path.is_truncated());

        let l = parse_request_line(b"MKCALENDAR / HTTP/1.1")?;
        assert_eq!(l.method, "MKCALEN");
        assert!(l.method.is_truncated());
        Ok(())
    }

    #[test]
    fn test_find_header() {
        let block = b"Host: x\r\ncontent-length:\t 42\r\nContent-Type: text/plain\r\n\r\n";
        assert_eq!(find_header(block, "Content-Length"), Some(&b"42"[..]));
        assert_eq!(find_header(block, "CONTENT-TYPE"), Some(&b"text/plain"[..]));
        assert_eq!(find_header(block, "Host"), Some(&b"x"[..]));
        assert_eq!(find_header(block, "Accept"), None);
        // name must be followed by a colon
        assert_eq!(find_header(b"Hostname: y\r\n\r\n", "Host"), None);
    }

    #[test]
    fn test_parse_content_length() {
        assert_eq!(parse_content_length(b"42"), 42);
        assert_eq!(parse_content_length(b" 17abc"), 17);
        assert_eq!(parse_content_length(b"abc"), 0);
        assert_eq!(parse_content_length(b""), 0);
        assert_eq!(
            parse_content_length(b"999999999999999999999999999"),
            usize::MAX
        );
    }

    #[test]
    fn strict_headers() -> Result<()> {
        let mut dst = [httparse::EMPTY_HEADER; 4];
        let h = parse_headers(b"Host: a\r\nX-Y: b\r\n\r\n", &mut dst)?;
        assert_eq!(h.len(), 2);
        assert_eq!(h[1].name, "X-Y");
        assert_eq!(h[1].value, b"b");

        let mut dst = [httparse::EMPTY_HEADER; 1];
        assert!(matches!(
            parse_headers(b"A: 1\r\nB: 2\r\n\r\n", &mut dst),
            Err(Error::HeaderParse(httparse::Error::TooManyHeaders))
        ));

        let mut dst = [httparse::EMPTY_HEADER; 4];
        assert!(matches!(
            parse_headers(b"A: 1\r\n", &mut dst),
            Err(Error::Incomplete)
        ));
        Ok(())
    }
}
