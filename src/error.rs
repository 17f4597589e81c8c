use std::io;

use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("malformed request line")]
    RequestLine,

    #[error("request line is not valid utf-8")]
    NotUtf8,

    #[error("unparseable http version")]
    Version,

    #[error("headers too big or no terminator")]
    HeadersTooLarge,

    #[error("body needs {needed} bytes, receive buffer holds {capacity}")]
    BodyTooLarge { needed: usize, capacity: usize },

    #[error("request is not complete")]
    Incomplete,

    #[error("connection closed mid-request")]
    UnexpectedClose,

    #[error("http parse fail: {0}")]
    HeaderParse(httparse::Error),

    #[error("output too small to write response header")]
    OutputOverflow,

    #[error("extra header lines must end with crlf")]
    BadExtraHeaders,

    #[error("response already sent for this request")]
    AlreadyResponded,

    #[error("handler returned without sending a response")]
    NoResponse,

    #[error("handler failed: {0}")]
    Handler(&'static str),

    #[error("{0}")]
    Io(#[from] io::Error),

    #[error("server restart failed: {0}")]
    Restart(io::Error),
}

impl Error {
    /// The request could not be understood or does not fit the receive buffer.
    pub fn is_parse(&self) -> bool {
        matches!(
            self,
            Error::RequestLine
                | Error::NotUtf8
                | Error::Version
                | Error::HeadersTooLarge
                | Error::BodyTooLarge { .. }
                | Error::Incomplete
                | Error::HeaderParse(_)
        )
    }

    /// The peer went away or the socket failed underneath us.
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::UnexpectedClose | Error::Io(_))
    }
}

impl From<httparse::Error> for Error {
    fn from(value: httparse::Error) -> Self {
        Error::HeaderParse(value)
    }
}

pub(crate) fn is_timeout(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
    )
}
