//! The serving loop.
//!
//! One connection is handled per cycle: accept, read one request, route it,
//! respond, close. Consecutive failed cycles and consecutive link-down checks
//! are counted. Either counter reaching its limit restarts the server (close,
//! pause, bind again). If the server cannot be bound again the device is reset.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::buffer::RecvBuffer;
use crate::error::is_timeout;
use crate::recv::read_request;
use crate::router::{Dispatch, Router};
use crate::{Config, Error, Responder, Result};

mod acceptor;
pub use acceptor::{tcp, Acceptor, Breaker};

mod platform;
pub use platform::{Host, Platform};

#[cfg(test)]
pub(crate) mod test_support;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Running,
    /// Shutdown requested, finishing the current cycle.
    Draining,
    Stopped,
}

/// What one [`Server::step`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cycle {
    /// A route handled the request.
    Served,
    /// No route matched, a 404 was sent.
    NotFound,
    /// The peer connected but sent nothing.
    NoRequest,
    /// Nobody connected.
    Idle,
    /// The request was abandoned, counted toward the error limit.
    Failed,
    /// The link was down, no request was attempted.
    LinkDown,
    /// A limit was reached and the server was restarted.
    Restarted,
}

/// Asks a running server to stop after its current cycle.
#[derive(Debug, Clone, Default)]
pub struct Shutdown(Arc<AtomicBool>);

impl Shutdown {
    pub fn request(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

pub struct Server<A: Acceptor, P: Platform> {
    acceptor: A,
    platform: P,
    router: Router,
    config: Config,
    recv: RecvBuffer,
    header_buf: Box<[u8]>,
    state: State,
    errors: u32,
    link_down: u32,
    restarts: u32,
    shutdown: Shutdown,
}

impl<A: Acceptor, P: Platform> Server<A, P> {
    /// Allocate the buffers and bind the acceptor.
    pub fn bind(mut acceptor: A, platform: P, router: Router, config: Config) -> Result<Self> {
        acceptor.bind()?;

        info!(
            "Server bound, {} routes, {} byte receive buffer",
            router.len(),
            config.recv_buffer
        );

        Ok(Server {
            acceptor,
            platform,
            router,
            recv: RecvBuffer::new(config.recv_buffer),
            header_buf: vec![0; config.header_buffer].into_boxed_slice(),
            config,
            state: State::Running,
            errors: 0,
            link_down: 0,
            restarts: 0,
            shutdown: Shutdown::default(),
        })
    }

    /// Handle that stops [`Server::run`].
    pub fn shutdown_handle(&self) -> Shutdown {
        self.shutdown.clone()
    }

    /// Serve until shut down.
    ///
    /// Does not return if a restart fails: the platform is reset.
    pub fn run(&mut self) {
        while self.state == State::Running {
            if self.shutdown.is_requested() {
                info!("Shutdown requested");
                self.state = State::Draining;
                break;
            }

            if let Err(e) = self.step() {
                error!("{}, resetting device", e);
                self.platform.reset();
            }
        }

        self.stop();
    }

    /// One iteration of the serving loop.
    ///
    /// Only a failed restart is an `Err`. Everything else is folded into the
    /// returned [`Cycle`] and the counters.
    pub fn step(&mut self) -> Result<Cycle> {
        if !self.platform.link_up() {
            self.link_down += 1;
            warn!(
                "Link down ({}/{})",
                self.link_down, self.config.link_down_limit
            );

            let cycle = if self.link_down >= self.config.link_down_limit {
                error!("Link down {} times, restarting server", self.link_down);
                self.restart()?;
                Cycle::Restarted
            } else {
                Cycle::LinkDown
            };

            self.platform.delay(self.config.link_poll_delay);
            return Ok(cycle);
        }

        self.link_down = 0;

        let cycle = match self.serve_one() {
            Ok(Cycle::Idle) => Cycle::Idle,
            Ok(cycle) => {
                self.errors = 0;
                cycle
            }
            Err(e) => {
                self.errors += 1;
                warn!(
                    "Request failed ({}/{}): {}",
                    self.errors, self.config.error_limit, e
                );

                if self.errors >= self.config.error_limit {
                    error!("{} failed requests in a row, restarting server", self.errors);
                    self.restart()?;
                    Cycle::Restarted
                } else {
                    Cycle::Failed
                }
            }
        };

        self.platform.tick();
        self.platform.delay(self.config.idle_delay);

        Ok(cycle)
    }

    /// Close the acceptor, pause, and bind it again. Resets both counters.
    ///
    /// Fails with [`Error::Restart`] if binding fails.
    pub fn restart(&mut self) -> Result<()> {
        self.state = State::Stopped;

        if let Err(e) = self.acceptor.close() {
            warn!("Close failed during restart: {}", e);
        }

        self.platform.delay(self.config.restart_delay);

        self.acceptor.bind().map_err(Error::Restart)?;

        self.state = State::Running;
        self.errors = 0;
        self.link_down = 0;
        self.restarts += 1;

        info!("Server restarted ({} total)", self.restarts);

        Ok(())
    }

    fn serve_one(&mut self) -> Result<Cycle> {
        let mut stream = match self.acceptor.accept() {
            Ok(s) => s,
            Err(e) if is_timeout(&e) => return Ok(Cycle::Idle),
            Err(e) => return Err(e.into()),
        };

        let result = handle(&mut stream, &mut self.recv, &mut self.header_buf, &self.router);

        match stream.disconnect() {
            Ok(()) => debug!("Connection closed"),
            Err(e) => warn!("Close failed: {}", e),
        }

        result
    }

    fn stop(&mut self) {
        if let Err(e) = self.acceptor.close() {
            warn!("Close failed: {}", e);
        }
        self.state = State::Stopped;
        info!("Server stopped");
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// Consecutive failed cycles.
    pub fn errors(&self) -> u32 {
        self.errors
    }

    /// Consecutive link-down checks.
    pub fn link_down(&self) -> u32 {
        self.link_down
    }

    pub fn restarts(&self) -> u32 {
        self.restarts
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn acceptor(&self) -> &A {
        &self.acceptor
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }
}

fn handle<S: io::Read + io::Write>(
    stream: &mut S,
    recv: &mut RecvBuffer,
    header_buf: &mut [u8],
    router: &Router,
) -> Result<Cycle> {
    let Some(req) = read_request(stream, recv)? else {
        return Ok(Cycle::NoRequest);
    };

    let mut res = Responder::new(stream, header_buf);

    let cycle = match router.dispatch(&mut res, &req)? {
        Dispatch::Handled => Cycle::Served,
        Dispatch::NotFound => Cycle::NotFound,
    };

    Ok(cycle)
}
