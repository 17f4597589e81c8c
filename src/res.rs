use core::fmt::Write as _;
use std::io::{self, Write};

use http::StatusCode;

use crate::out::Out;
use crate::{Error, Result};

/// Writes the single response for a request.
///
/// The status line and headers are formatted into a fixed header buffer, then
/// header and body are written fully to the connection. Every response carries
/// `Connection: close`.
pub struct Responder<'c> {
    writer: &'c mut dyn Write,
    header_buf: &'c mut [u8],
    responded: bool,
}

impl<'c> Responder<'c> {
    pub fn new(writer: &'c mut dyn Write, header_buf: &'c mut [u8]) -> Self {
        Responder {
            writer,
            header_buf,
            responded: false,
        }
    }

    /// Send a response.
    ///
    /// `extra_headers` is inserted verbatim before `Connection: close`. It is
    /// either empty or complete header lines, each ending in CRLF.
    ///
    /// Only one response can be sent, a second call fails with
    /// [`Error::AlreadyResponded`]. If the header does not fit the header
    /// buffer nothing is written and the call fails with
    /// [`Error::OutputOverflow`].
    pub fn send(
        &mut self,
        status: u16,
        reason: &str,
        content_type: &str,
        body: &[u8],
        extra_headers: &str,
    ) -> Result<()> {
        if self.responded {
            return Err(Error::AlreadyResponded);
        }

        if !extra_headers.is_empty() && !extra_headers.ends_with("\r\n") {
            return Err(Error::BadExtraHeaders);
        }

        self.responded = true;

        let mut out = Out::wrap(self.header_buf);
        write!(
            out,
            "HTTP/1.1 {} {}\r\n\
            Content-Type: {}\r\n\
            Content-Length: {}\r\n\
            {}\
            Connection: close\r\n\r\n",
            status,
            reason,
            content_type,
            body.len(),
            extra_headers
        )
        .or(Err(Error::OutputOverflow))?;
        let header = out.flush();

        write_fully(self.writer, header)?;
        if !body.is_empty() {
            write_fully(self.writer, body)?;
        }
        self.writer.flush()?;

        debug!("Sent {} {} ({} body bytes)", status, reason, body.len());

        Ok(())
    }

    /// Like [`Responder::send`] with the canonical reason phrase for `status`.
    pub fn respond(
        &mut self,
        status: StatusCode,
        content_type: &str,
        body: &[u8],
        extra_headers: &str,
    ) -> Result<()> {
        let reason = status.canonical_reason().unwrap_or("");
        self.send(status.as_u16(), reason, content_type, body, extra_headers)
    }

    pub fn ok(&mut self, content_type: &str, body: &[u8]) -> Result<()> {
        self.send(200, "OK", content_type, body, "")
    }

    pub fn not_found(&mut self) -> Result<()> {
        self.send(404, "Not Found", "text/plain", b"404 Not Found\r\n", "")
    }

    pub fn has_responded(&self) -> bool {
        self.responded
    }
}

fn write_fully(w: &mut dyn Write, mut buf: &[u8]) -> io::Result<()> {
    while !buf.is_empty() {
        match w.write(buf) {
            Ok(0) => return Err(io::ErrorKind::WriteZero.into()),
            Ok(n) => {
                trace!("sent {} bytes", n);
                buf = &buf[n..];
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(())
}
