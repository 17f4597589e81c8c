//! `multipart/form-data` bodies.
//!
//! Parts are found by scanning the body for the boundary delimiter. Part data
//! is never copied, [`FilePart::data`] points straight into the request body.
//!
//! A delimiter after the first one is only recognized at the start of a line,
//! i.e. `CRLF--boundary`. Trailing CR and LF bytes are trimmed off the data in
//! front of it, so file contents ending in line breaks lose them. File
//! contents that happen to contain the delimiter still end the part early, as
//! in any boundary based format.

use heapless::Vec;

use crate::util::{find, lines, strip_prefix_ignore_case, Bounded};
use crate::Request;

/// Longest boundary allowed by RFC 2046.
pub const MAX_BOUNDARY: usize = 70;

pub type Filename = Bounded<63>;
pub type ContentType = Bounded<63>;

/// One part of a multipart body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePart<'b> {
    /// `name` from `Content-Disposition`, empty if absent.
    pub name: &'b str,
    /// `filename` from `Content-Disposition`, empty for plain form fields.
    pub filename: Filename,
    /// The part's own `Content-Type`, if sent.
    pub content_type: Option<ContentType>,
    /// Part payload, a view into the request body.
    pub data: &'b [u8],
}

/// Find the part named `field_name`.
///
/// `None` if the request is not `multipart/form-data`, has no usable boundary,
/// or no part carries that name.
pub fn get_file<'b>(req: &Request<'b>, field_name: &str) -> Option<FilePart<'b>> {
    if field_name.is_empty() {
        return None;
    }

    let found = parts(req).find(|p| p.name == field_name);

    if found.is_none() {
        debug!("No multipart field named {:?}", field_name);
    }

    found
}

/// Iterate every part of a multipart request body. Empty if the request is not
/// `multipart/form-data` with a boundary.
pub fn parts<'b>(req: &Request<'b>) -> Parts<'b> {
    let body = req.body();

    let Some(boundary) = req.content_type().and_then(boundary) else {
        return Parts::empty(body);
    };

    Parts::new(body, boundary)
}

/// The `boundary` parameter of a `multipart/form-data` content type.
///
/// ```
/// use wisp::multipart::boundary;
///
/// assert_eq!(boundary("multipart/form-data; boundary=abc"), Some("abc"));
/// assert_eq!(boundary("multipart/form-data; boundary=\"abc\""), Some("abc"));
/// assert_eq!(boundary("text/plain; boundary=abc"), None);
/// ```
pub fn boundary(content_type: &str) -> Option<&str> {
    let mut params = content_type.split(';');

    let mime = params.next()?.trim();
    if !mime.eq_ignore_ascii_case("multipart/form-data") {
        return None;
    }

    let value = params.find_map(|p| {
        let (k, v) = p.split_once('=')?;
        k.trim().eq_ignore_ascii_case("boundary").then_some(v)
    })?;

    let value = value.trim_start().trim_start_matches('"');
    let end = value
        .find(|c: char| c.is_ascii_whitespace() || c == '"')
        .unwrap_or(value.len());
    let value = &value[..end];

    (!value.is_empty() && value.len() <= MAX_BOUNDARY).then_some(value)
}

/// Iterator over the parts of a multipart body.
pub struct Parts<'b> {
    body: &'b [u8],
    /// `CRLF--boundary`
    delimiter: Vec<u8, { MAX_BOUNDARY + 4 }>,
    /// Position right after the last delimiter seen.
    next: Option<usize>,
}

impl<'b> Parts<'b> {
    fn empty(body: &'b [u8]) -> Self {
        Parts {
            body,
            delimiter: Vec::new(),
            next: None,
        }
    }

    fn new(body: &'b [u8], boundary: &str) -> Self {
        let mut delimiter = Vec::new();
        // boundary() caps the length, this always fits.
        let _ = delimiter.extend_from_slice(b"\r\n--");
        let _ = delimiter.extend_from_slice(boundary.as_bytes());

        // The first delimiter may start the body without a leading CRLF.
        let next = find(body, &delimiter[2..]).map(|i| i + delimiter.len() - 2);

        Parts {
            body,
            delimiter,
            next,
        }
    }
}

impl<'b> Iterator for Parts<'b> {
    type Item = FilePart<'b>;

    fn next(&mut self) -> Option<Self::Item> {
        let body = self.body;
        let start = self.next.take()?;
        let rest = &body[start..];

        // "--boundary--" closes the body.
        if rest.starts_with(b"--") {
            return None;
        }

        let rest = rest.strip_prefix(b"\r\n").unwrap_or(rest);
        let offset = body.len() - rest.len();

        let (headers, data_start) = if rest.starts_with(b"\r\n") {
            (&rest[..0], offset + 2)
        } else {
            let end = find(rest, b"\r\n\r\n")?;
            (&rest[..end], offset + end + 4)
        };

        let tail = &body[data_start..];
        let data = match find(tail, &self.delimiter) {
            Some(i) => {
                self.next = Some(data_start + i + self.delimiter.len());
                &tail[..i]
            }
            None => tail,
        };
        let data = trim_trailing_newlines(data);

        let mut part = FilePart {
            name: "",
            filename: Filename::new(),
            content_type: None,
            data,
        };

        for line in lines(headers) {
            if let Some(v) = strip_prefix_ignore_case(line, b"content-disposition:") {
                if let Ok(v) = core::str::from_utf8(v) {
                    read_disposition(v, &mut part);
                }
            } else if let Some(v) = strip_prefix_ignore_case(line, b"content-type:") {
                if let Ok(v) = core::str::from_utf8(v) {
                    part.content_type = Some(ContentType::copy_from(v.trim()));
                }
            }
        }

        if part.filename.is_truncated() {
            warn!("Multipart filename truncated: {:?}", part.filename);
        }

        Some(part)
    }
}

/// `form-data; name="fw"; filename="fw.bin"`
fn read_disposition<'b>(value: &'b str, part: &mut FilePart<'b>) {
    for param in split_params(value).skip(1) {
        let Some((k, v)) = param.split_once('=') else {
            continue;
        };

        let v = unquote(v.trim());

        match k.trim() {
            k if k.eq_ignore_ascii_case("name") => part.name = v,
            k if k.eq_ignore_ascii_case("filename") => part.filename = Filename::copy_from(v),
            _ => {}
        }
    }
}

/// Split on `;` outside double quotes.
fn split_params(value: &str) -> impl Iterator<Item = &str> {
    let mut rest = Some(value);

    core::iter::from_fn(move || {
        let v = rest?;
        let mut quoted = false;

        for (i, c) in v.char_indices() {
            match c {
                '"' => quoted = !quoted,
                ';' if !quoted => {
                    rest = Some(&v[i + 1..]);
                    return Some(&v[..i]);
                }
                _ => {}
            }
        }

        rest = None;
        Some(v)
    })
}

fn trim_trailing_newlines(mut data: &[u8]) -> &[u8] {
    while let [head @ .., b'\r' | b'\n'] = data {
        data = head;
    }
    data
}

fn unquote(v: &str) -> &str {
    v.strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(v)
}
