use core::fmt;
use core::ops::Deref;

use heapless::String;

/// Fixed capacity string that truncates instead of overflowing.
///
/// Copies longer than `N` bytes are cut at the last char boundary that fits and
/// remember that they were cut, see [`Bounded::is_truncated`].
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Bounded<const N: usize> {
    value: String<N>,
    truncated: bool,
}

impl<const N: usize> Bounded<N> {
    pub const CAPACITY: usize = N;

    pub fn new() -> Self {
        Bounded {
            value: String::new(),
            truncated: false,
        }
    }

    pub fn copy_from(s: &str) -> Self {
        let mut end = s.len().min(N);
        while !s.is_char_boundary(end) {
            end -= 1;
        }

        let mut value = String::new();
        // end <= N, this always fits.
        let _ = value.push_str(&s[..end]);

        Bounded {
            value,
            truncated: end < s.len(),
        }
    }

    pub fn as_str(&self) -> &str {
        self.value.as_str()
    }

    pub fn is_truncated(&self) -> bool {
        self.truncated
    }
}

impl<const N: usize> Deref for Bounded<N> {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        self.as_str()
    }
}

impl<const N: usize> PartialEq<str> for Bounded<N> {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl<const N: usize> PartialEq<&str> for Bounded<N> {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

impl<const N: usize> fmt::Debug for Bounded<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.as_str())?;
        if self.truncated {
            write!(f, " (truncated)")?;
        }
        Ok(())
    }
}

impl<const N: usize> fmt::Display for Bounded<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub(crate) fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

pub(crate) fn find_crlf(b: &[u8]) -> Option<usize> {
    find(b, b"\r\n")
}

pub(crate) fn strip_prefix_ignore_case<'a>(b: &'a [u8], prefix: &[u8]) -> Option<&'a [u8]> {
    if b.len() < prefix.len() {
        return None;
    }
    let (head, rest) = b.split_at(prefix.len());
    head.eq_ignore_ascii_case(prefix).then_some(rest)
}

pub(crate) fn starts_with_ignore_case(s: &str, prefix: &str) -> bool {
    strip_prefix_ignore_case(s.as_bytes(), prefix.as_bytes()).is_some()
}

pub(crate) fn trim_leading_ws(b: &[u8]) -> &[u8] {
    let n = b.iter().take_while(|c| **c == b' ' || **c == b'\t').count();
    &b[n..]
}

/// Split on CRLF. A block ending in CRLF yields a final empty line.
pub(crate) fn lines(block: &[u8]) -> Lines<'_> {
    Lines { rest: Some(block) }
}

pub(crate) struct Lines<'a> {
    rest: Option<&'a [u8]>,
}

impl<'a> Iterator for Lines<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<Self::Item> {
        let rest = self.rest?;
        match find_crlf(rest) {
            Some(n) => {
                self.rest = Some(&rest[n + 2..]);
                Some(&rest[..n])
            }
            None => {
                self.rest = None;
                Some(rest)
            }
        }
    }
}
