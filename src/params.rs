//! Request parameter lookup.
//!
//! A key is looked up in the query string, then in a urlencoded form body,
//! then in a JSON object body. The first source that has the key wins.
//!
//! Decoded values land in a fixed scratch area owned by [`Params`]. The value
//! returned by a lookup borrows that scratch, so it must be used (or copied)
//! before the next lookup.
//!
//! ```
//! use wisp::{Params, Request, Source};
//!
//! let req = Request::from_bytes(b"GET /set?name=hello%20world&n=3 HTTP/1.1\r\n\r\n")?;
//! let mut params = Params::new();
//!
//! let name = params.get(&req, "name").unwrap();
//! assert_eq!(name.as_str(), Some("hello world"));
//! assert_eq!(name.source(), Source::Query);
//!
//! assert!(params.get(&req, "missing").is_none());
//! # Ok::<_, wisp::Error>(())
//! ```

use core::fmt;

use heapless::Vec;

use crate::util::starts_with_ignore_case;
use crate::Request;

/// Capacity of the decode scratch. Longer values are truncated.
pub const SCRATCH: usize = 127;

const FORM: &str = "application/x-www-form-urlencoded";
#[cfg(feature = "json")]
const JSON: &str = "application/json";

/// Where a parameter value was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Query,
    Form,
    Json,
}

/// A resolved parameter value.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Param<'p> {
    value: &'p [u8],
    source: Source,
    truncated: bool,
}

impl<'p> Param<'p> {
    /// Decoded bytes. Percent escapes can produce any byte, so this is not
    /// necessarily utf-8.
    pub fn as_bytes(&self) -> &'p [u8] {
        self.value
    }

    pub fn as_str(&self) -> Option<&'p str> {
        core::str::from_utf8(self.value).ok()
    }

    pub fn source(&self) -> Source {
        self.source
    }

    /// Whether the decoded value was longer than [`SCRATCH`] and got cut.
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }
}

impl<'p> fmt::Debug for Param<'p> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Param")
            .field("value", &String::from_utf8_lossy(self.value))
            .field("source", &self.source)
            .field("truncated", &self.truncated)
            .finish()
    }
}

/// Decode scratch for parameter lookups. Create one per worker and reuse it.
#[derive(Default)]
pub struct Params {
    scratch: Vec<u8, SCRATCH>,
    truncated: bool,
}

impl Params {
    pub fn new() -> Self {
        Params::default()
    }

    /// Resolve `key` from the query, a urlencoded body or a JSON body, in that
    /// order.
    ///
    /// Keys match exactly (case-sensitive). An empty key never matches.
    pub fn get(&mut self, req: &Request<'_>, key: &str) -> Option<Param<'_>> {
        let source = if self.fill_query(req, key) {
            Source::Query
        } else if self.fill_form(req, key) {
            Source::Form
        } else if self.fill_json(req, key) {
            Source::Json
        } else {
            return None;
        };

        Some(self.param(source))
    }

    /// Look only in the query string.
    pub fn query(&mut self, req: &Request<'_>, key: &str) -> Option<Param<'_>> {
        if self.fill_query(req, key) {
            Some(self.param(Source::Query))
        } else {
            None
        }
    }

    /// Look only in a `application/x-www-form-urlencoded` body.
    pub fn form(&mut self, req: &Request<'_>, key: &str) -> Option<Param<'_>> {
        if self.fill_form(req, key) {
            Some(self.param(Source::Form))
        } else {
            None
        }
    }

    /// Look only at the top level of a `application/json` object body.
    ///
    /// Strings are returned verbatim, numbers in their shortest round-trip
    /// form (`6`, `-1.5`, `6.0`) and booleans as `true`/`false`. Other value
    /// types do not match.
    #[cfg(feature = "json")]
    pub fn json(&mut self, req: &Request<'_>, key: &str) -> Option<Param<'_>> {
        if self.fill_json(req, key) {
            Some(self.param(Source::Json))
        } else {
            None
        }
    }

    fn param(&self, source: Source) -> Param<'_> {
        Param {
            value: &self.scratch,
            source,
            truncated: self.truncated,
        }
    }

    fn clear(&mut self) {
        self.scratch.clear();
        self.truncated = false;
    }

    /// Append, truncating at capacity.
    fn push(&mut self, bytes: &[u8]) {
        let room = SCRATCH - self.scratch.len();
        let n = bytes.len().min(room);
        // n fits in the remaining capacity
        let _ = self.scratch.extend_from_slice(&bytes[..n]);
        if n < bytes.len() {
            self.truncated = true;
        }
    }

    fn fill_query(&mut self, req: &Request<'_>, key: &str) -> bool {
        let query = req.query();
        !query.is_empty() && self.find_pair(query.as_bytes(), key)
    }

    fn fill_form(&mut self, req: &Request<'_>, key: &str) -> bool {
        let is_form = req
            .content_type()
            .map(|t| starts_with_ignore_case(t, FORM))
            .unwrap_or(false);

        let body = req.body();
        is_form && !body.is_empty() && self.find_pair(body, key)
    }

    /// Search `&` separated `key=value` pairs and decode the first match.
    fn find_pair(&mut self, data: &[u8], key: &str) -> bool {
        if key.is_empty() {
            return false;
        }

        for segment in data.split(|c| *c == b'&') {
            // Segments without '=' are skipped.
            let Some(eq) = segment.iter().position(|c| *c == b'=') else {
                continue;
            };

            if &segment[..eq] == key.as_bytes() {
                self.url_decode(&segment[eq + 1..]);
                return true;
            }
        }

        false
    }

    fn url_decode(&mut self, raw: &[u8]) {
        self.clear();

        let mut i = 0;
        while i < raw.len() {
            let b = match raw[i] {
                b'+' => b' ',
                b'%' => match (raw.get(i + 1), raw.get(i + 2)) {
                    (Some(h), Some(l)) if h.is_ascii_hexdigit() && l.is_ascii_hexdigit() => {
                        i += 2;
                        (hex(*h) << 4) | hex(*l)
                    }
                    _ => b'%',
                },
                b => b,
            };

            if self.scratch.push(b).is_err() {
                self.truncated = true;
                break;
            }
            i += 1;
        }

        if self.truncated {
            warn!("Parameter value truncated to {} bytes", SCRATCH);
        }
    }

    #[cfg(feature = "json")]
    fn fill_json(&mut self, req: &Request<'_>, key: &str) -> bool {
        use serde_json::Value;

        let is_json = req
            .content_type()
            .map(|t| starts_with_ignore_case(t, JSON))
            .unwrap_or(false);

        if !is_json {
            return false;
        }

        let root: Value = match serde_json::from_slice(req.body()) {
            Ok(v) => v,
            Err(e) => {
                debug!("JSON body does not parse: {}", e);
                return false;
            }
        };

        let Some(value) = root.get(key) else {
            return false;
        };

        self.clear();

        match value {
            Value::String(s) => {
                let mut end = s.len().min(SCRATCH);
                while !s.is_char_boundary(end) {
                    end -= 1;
                }
                self.push(&s.as_bytes()[..end]);
                self.truncated = end < s.len();
            }
            Value::Number(n) => {
                let mut w = ScratchWriter(self);
                if fmt::Write::write_fmt(&mut w, format_args!("{}", n)).is_err() {
                    return false;
                }
            }
            Value::Bool(b) => self.push(if *b { b"true" } else { b"false" }),
            _ => return false,
        }

        true
    }

    #[cfg(not(feature = "json"))]
    fn fill_json(&mut self, _req: &Request<'_>, _key: &str) -> bool {
        false
    }
}

#[cfg(feature = "json")]
struct ScratchWriter<'a>(&'a mut Params);

#[cfg(feature = "json")]
impl<'a> fmt::Write for ScratchWriter<'a> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.0.push(s.as_bytes());
        Ok(())
    }
}

fn hex(c: u8) -> u8 {
    match c {
        b'0'..=b'9' => c - b'0',
        b'a'..=b'f' => c - b'a' + 10,
        b'A'..=b'F' => c - b'A' + 10,
        _ => 0,
    }
}
