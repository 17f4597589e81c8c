//! Single connection http 1.1 server for small devices.
//!
//! One connection is served at a time. Each request is read whole into a fixed
//! receive buffer, parsed in place, routed to a handler and answered with a
//! single `Connection: close` response. Handlers pull parameters from the
//! query, a urlencoded form or a JSON body with [`Params`], and uploaded files
//! from multipart bodies with [`multipart::get_file`], without copying the
//! payload out of the buffer.
//!
//! Buffers are allocated once when the server is built. Reading and parsing a
//! request allocates nothing; the route table, page building and JSON lookup
//! do use the heap.
//!
//! The [`Server`] keeps itself alive: repeated failed requests or a network
//! link that stays down restart it, and a restart that fails resets the
//! device through the [`Platform`](server::Platform).
//!
//! ```no_run
//! use wisp::server::{tcp::TcpAcceptor, Host};
//! use wisp::{Config, Params, Request, Responder, Result, Router, Server};
//!
//! fn hello(res: &mut Responder<'_>, req: &Request<'_>) -> Result<()> {
//!     let mut params = Params::new();
//!     let name = params
//!         .get(req, "name")
//!         .and_then(|p| p.as_str())
//!         .unwrap_or("world")
//!         .to_string();
//!     res.ok("text/plain", format!("hello {}", name).as_bytes())
//! }
//!
//! let router = Router::new().get("/hello", hello);
//! let acceptor = TcpAcceptor::new("0.0.0.0:80")?;
//! let mut server = Server::bind(acceptor, Host, router, Config::default())?;
//! server.run();
//! # Ok::<_, wisp::Error>(())
//! ```

#[macro_use]
extern crate log;

mod buffer;
pub use buffer::RecvBuffer;

mod config;
pub use config::Config;

mod error;
pub use error::{Error, Result};

mod out;

mod util;
pub use util::Bounded;

pub mod parser;
pub use parser::RequestLine;

mod req;
pub use req::Request;

mod recv;
pub use recv::read_request;

pub mod params;
pub use params::{Param, Params, Source};

pub mod multipart;
pub use multipart::FilePart;

mod res;
pub use res::Responder;

pub mod router;
pub use router::{Dispatch, Handler, Route, Router};

pub mod page;
pub use page::Page;

pub mod server;
pub use server::{Cycle, Server, Shutdown, State};

// Re-export this
pub use httparse::Header;
pub use http;

#[cfg(test)]
mod test {
    use std::io::{Read, Write};
    use std::net::TcpStream;
    use std::sync::mpsc;
    use std::thread;

    use super::server::tcp::TcpAcceptor;
    use super::server::Host;
    use super::*;

    fn apply(res: &mut Responder<'_>, req: &Request<'_>) -> Result<()> {
        let mut params = Params::new();
        let ssid = params
            .get(req, "ssid")
            .and_then(|p| p.as_str())
            .ok_or(Error::Handler("missing ssid"))?
            .to_string();

        let channel = params
            .get(req, "ch")
            .and_then(|p| p.as_str())
            .unwrap_or("auto")
            .to_string();

        let body = format!("{} on {}", ssid, channel);
        res.ok("text/plain", body.as_bytes())
    }

    fn roundtrip(addr: std::net::SocketAddr, input: &[u8]) -> Vec<u8> {
        let mut conn = TcpStream::connect(addr).unwrap();
        conn.write_all(input).unwrap();
        let mut out = Vec::new();
        conn.read_to_end(&mut out).unwrap();
        out
    }

    #[test]
    fn serve_over_tcp() {
        let (tx, rx) = mpsc::channel();

        let worker = thread::spawn(move || {
            let acceptor = TcpAcceptor::new("127.0.0.1:0").unwrap();
            let router = Router::new().post("/wifi/apply", apply);
            let mut server = Server::bind(acceptor, Host, router, Config::default()).unwrap();

            let addr = server.acceptor().local_addr().unwrap();
            tx.send((addr, server.shutdown_handle())).unwrap();

            server.run();
            server.restarts()
        });

        let (addr, shutdown) = rx.recv().unwrap();

        let out = roundtrip(
            addr,
            b"POST /wifi/apply?ch=6 HTTP/1.1\r\n\
            Content-Type: application/x-www-form-urlencoded\r\n\
            Content-Length: 14\r\n\
            \r\n\
            ssid=Home+Net&",
        );
        let out = String::from_utf8(out).unwrap();
        assert!(out.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(out.contains("Connection: close\r\n"));
        assert!(out.ends_with("\r\n\r\nHome Net on 6"));

        let out = roundtrip(addr, b"GET /other HTTP/1.1\r\n\r\n");
        assert!(out.starts_with(b"HTTP/1.1 404 Not Found\r\n"));

        shutdown.request();
        assert_eq!(worker.join().unwrap(), 0);
    }
}
