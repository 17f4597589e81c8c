use core::fmt;

use crate::{Error, Result};

/// Bounded writer over a borrowed byte buffer.
///
/// A write that does not fit leaves the buffer untouched and fails. Nothing is
/// ever written past the end of `buf`.
pub(crate) struct Out<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> Out<'a> {
    pub fn wrap(buf: &'a mut [u8]) -> Self {
        Out { buf, pos: 0 }
    }

    pub fn write(&mut self, bytes: &[u8]) -> Result<usize> {
        if bytes.len() > self.buf.len() - self.pos {
            return Err(Error::OutputOverflow);
        }

        self.buf[self.pos..(self.pos + bytes.len())].copy_from_slice(bytes);
        self.pos += bytes.len();

        Ok(bytes.len())
    }

    pub fn flush(self) -> &'a [u8] {
        &self.buf[..self.pos]
    }
}

impl<'a> fmt::Write for Out<'a> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.write(s.as_bytes()).and(Ok(())).or(Err(fmt::Error))
    }
}

#[cfg(test)]
mod test {
    use core::fmt::Write;

    use super::*;

    #[test]
    fn write_within_bounds() {
        let mut buf = [0; 8];
        let mut out = Out::wrap(&mut buf);
        write!(out, "{}-{}", 12, 34).unwrap();
        out.write(b"abc").unwrap();
        assert_eq!(out.flush(), b"12-34abc");
    }

    #[test]
    fn overflow_keeps_prior_output() {
        let mut buf = [0; 4];
        let mut out = Out::wrap(&mut buf);
        out.write(b"ab").unwrap();
        assert!(matches!(out.write(b"cde"), Err(Error::OutputOverflow)));
        assert_eq!(out.flush(), b"ab");
    }
}
