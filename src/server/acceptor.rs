use std::io;

/// Source of connections, one at a time.
///
/// `accept` failing with [`io::ErrorKind::WouldBlock`] or
/// [`io::ErrorKind::TimedOut`] means nobody connected yet.
pub trait Acceptor {
    type Stream: io::Read + io::Write + Breaker;

    /// Start listening. Called again after [`Acceptor::close`] on restart.
    fn bind(&mut self) -> io::Result<()>;

    fn accept(&mut self) -> io::Result<Self::Stream>;

    /// Stop listening.
    fn close(&mut self) -> io::Result<()>;
}

/// Ends a connection.
pub trait Breaker {
    fn disconnect(self) -> io::Result<()>;
}

pub mod tcp {
    use std::io;
    use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
    use std::time::Duration;

    use super::{Acceptor, Breaker};

    /// [`Acceptor`] over a std [`TcpListener`].
    ///
    /// The listener is non-blocking, so an idle `accept` returns right away
    /// with `WouldBlock`. Accepted streams block with read and write timeouts.
    pub struct TcpAcceptor {
        addr: SocketAddr,
        timeout: Duration,
        listener: Option<TcpListener>,
    }

    impl TcpAcceptor {
        pub fn new(addr: impl ToSocketAddrs) -> io::Result<Self> {
            let addr = addr
                .to_socket_addrs()?
                .next()
                .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "no address"))?;

            Ok(TcpAcceptor {
                addr,
                timeout: Duration::from_millis(2000),
                listener: None,
            })
        }

        /// Read and write timeout for accepted connections. Default 2s.
        pub fn with_timeout(mut self, timeout: Duration) -> Self {
            self.timeout = timeout;
            self
        }

        /// Address actually bound, if listening.
        pub fn local_addr(&self) -> Option<SocketAddr> {
            self.listener.as_ref().and_then(|l| l.local_addr().ok())
        }
    }

    impl Acceptor for TcpAcceptor {
        type Stream = TcpStream;

        fn bind(&mut self) -> io::Result<()> {
            let listener = TcpListener::bind(self.addr)?;
            listener.set_nonblocking(true)?;

            info!("Listening on {}", listener.local_addr()?);

            self.listener = Some(listener);
            Ok(())
        }

        fn accept(&mut self) -> io::Result<TcpStream> {
            let Some(listener) = &self.listener else {
                return Err(io::Error::new(io::ErrorKind::NotConnected, "not bound"));
            };

            let (stream, peer) = listener.accept()?;

            stream.set_nonblocking(false)?;
            stream.set_read_timeout(Some(self.timeout))?;
            stream.set_write_timeout(Some(self.timeout))?;

            debug!("Accepted {}", peer);

            Ok(stream)
        }

        fn close(&mut self) -> io::Result<()> {
            if self.listener.take().is_some() {
                debug!("Listener closed");
            }
            Ok(())
        }
    }

    impl Breaker for TcpStream {
        fn disconnect(self) -> io::Result<()> {
            match self.shutdown(Shutdown::Both) {
                // Peer already gone.
                Err(e) if e.kind() == io::ErrorKind::NotConnected => Ok(()),
                r => r,
            }
        }
    }
}
