use std::io;

/// Fixed capacity receive buffer, reused for every request.
///
/// Allocated once, never grows. [`RecvBuffer::reset`] clears it before each
/// receive cycle so nothing from a previous connection is visible to the next
/// request's parse.
pub struct RecvBuffer {
    buf: Box<[u8]>,
    len: usize,
}

impl RecvBuffer {
    pub fn new(capacity: usize) -> Self {
        RecvBuffer {
            buf: vec![0; capacity].into_boxed_slice(),
            len: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == self.buf.len()
    }

    /// The bytes received since the last reset.
    pub fn filled(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    pub fn reset(&mut self) {
        self.buf.fill(0);
        self.len = 0;
    }

    /// One read of at most `max` bytes into the unfilled tail.
    pub(crate) fn fill_from<R: io::Read + ?Sized>(
        &mut self,
        reader: &mut R,
        max: usize,
    ) -> io::Result<usize> {
        let end = self.len.saturating_add(max).min(self.buf.len());
        let n = reader.read(&mut self.buf[self.len..end])?;
        let n = n.min(end - self.len);
        self.len += n;

        trace!("recv {} bytes ({}/{})", n, self.len, self.buf.len());

        Ok(n)
    }
}
