//! Scripted transport and platform for exercising the server without sockets.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io;
use std::rc::Rc;
use std::time::Duration;

use super::{Acceptor, Breaker, Platform};

/// What the next `read` on a [`ScriptedStream`] does.
pub(crate) enum Step {
    Data(Vec<u8>),
    Timeout,
    Close,
    Fail(io::ErrorKind),
}

impl Step {
    pub fn data(bytes: &[u8]) -> Step {
        Step::Data(bytes.to_vec())
    }
}

#[derive(Default)]
pub(crate) struct StreamLog {
    pub written: Vec<u8>,
    pub disconnects: usize,
}

pub(crate) struct ScriptedStream {
    steps: VecDeque<Step>,
    max_write: usize,
    fail_writes: bool,
    log: Rc<RefCell<StreamLog>>,
}

impl ScriptedStream {
    pub fn new(steps: Vec<Step>) -> Self {
        ScriptedStream {
            steps: steps.into(),
            max_write: usize::MAX,
            fail_writes: false,
            log: Rc::default(),
        }
    }

    /// A stream that sends `input` in one go, then closes.
    pub fn request(input: &[u8]) -> Self {
        ScriptedStream::new(vec![Step::data(input)])
    }

    /// Accept at most `n` bytes per write.
    pub fn max_write(mut self, n: usize) -> Self {
        self.max_write = n;
        self
    }

    pub fn fail_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }

    pub fn log(&self) -> Rc<RefCell<StreamLog>> {
        self.log.clone()
    }
}

impl io::Read for ScriptedStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.steps.pop_front() {
            None | Some(Step::Close) => Ok(0),
            Some(Step::Timeout) => Err(io::ErrorKind::WouldBlock.into()),
            Some(Step::Fail(kind)) => Err(kind.into()),
            Some(Step::Data(mut data)) => {
                let n = data.len().min(buf.len());
                buf[..n].copy_from_slice(&data[..n]);
                if n < data.len() {
                    self.steps.push_front(Step::Data(data.split_off(n)));
                }
                Ok(n)
            }
        }
    }
}

impl io::Write for ScriptedStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.fail_writes {
            return Err(io::ErrorKind::BrokenPipe.into());
        }
        let n = buf.len().min(self.max_write);
        self.log.borrow_mut().written.extend_from_slice(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Breaker for ScriptedStream {
    fn disconnect(self) -> io::Result<()> {
        self.log.borrow_mut().disconnects += 1;
        Ok(())
    }
}

pub(crate) enum Accept {
    Conn(ScriptedStream),
    Fail(io::ErrorKind),
}

/// Hands out queued connections, then times out forever.
#[derive(Default)]
pub(crate) struct ScriptedAcceptor {
    accepts: VecDeque<Accept>,
    /// Binds beyond this many fail.
    bind_limit: Option<usize>,
    pub binds: usize,
    pub closes: usize,
}

impl ScriptedAcceptor {
    pub fn new() -> Self {
        ScriptedAcceptor::default()
    }

    pub fn conn(mut self, stream: ScriptedStream) -> Self {
        self.accepts.push_back(Accept::Conn(stream));
        self
    }

    pub fn fail(mut self, kind: io::ErrorKind) -> Self {
        self.accepts.push_back(Accept::Fail(kind));
        self
    }

    pub fn bind_limit(mut self, limit: usize) -> Self {
        self.bind_limit = Some(limit);
        self
    }
}

impl Acceptor for ScriptedAcceptor {
    type Stream = ScriptedStream;

    fn bind(&mut self) -> io::Result<()> {
        if self.bind_limit.map(|l| self.binds >= l).unwrap_or(false) {
            return Err(io::ErrorKind::AddrInUse.into());
        }
        self.binds += 1;
        Ok(())
    }

    fn accept(&mut self) -> io::Result<ScriptedStream> {
        match self.accepts.pop_front() {
            Some(Accept::Conn(s)) => Ok(s),
            Some(Accept::Fail(kind)) => Err(kind.into()),
            None => Err(io::ErrorKind::WouldBlock.into()),
        }
    }

    fn close(&mut self) -> io::Result<()> {
        self.closes += 1;
        Ok(())
    }
}

/// Answers link checks from a script (up once it runs out) and records
/// delays and ticks. A device reset panics.
#[derive(Default)]
pub(crate) struct ScriptedPlatform {
    links: VecDeque<bool>,
    pub delays: Vec<Duration>,
    pub ticks: usize,
}

impl ScriptedPlatform {
    pub fn new() -> Self {
        ScriptedPlatform::default()
    }

    pub fn links(mut self, links: &[bool]) -> Self {
        self.links.extend(links);
        self
    }
}

impl Platform for ScriptedPlatform {
    fn link_up(&mut self) -> bool {
        self.links.pop_front().unwrap_or(true)
    }

    fn tick(&mut self) {
        self.ticks += 1;
    }

    fn delay(&mut self, duration: Duration) {
        self.delays.push(duration);
    }

    fn reset(&mut self) -> ! {
        panic!("device reset")
    }
}
