//! Server tunables.

use std::time::Duration;

/// Sizes and thresholds for a [`Server`](crate::server::Server).
///
/// Buffers are allocated once when the server is built and reused for every
/// request.
///
/// ```
/// use std::time::Duration;
/// use wisp::Config;
///
/// let config = Config {
///     recv_buffer: 4096,
///     restart_delay: Duration::from_millis(200),
///     ..Config::default()
/// };
/// assert_eq!(config.error_limit, 5);
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Receive buffer capacity in bytes. The request line, headers and body
    /// must all fit; a larger request is abandoned.
    pub recv_buffer: usize,

    /// Capacity of the buffer the response status line and headers are
    /// formatted into.
    pub header_buffer: usize,

    /// Consecutive failed request cycles before the server restarts.
    pub error_limit: u32,

    /// Consecutive link-down checks before the server restarts.
    pub link_down_limit: u32,

    /// Pause between closing the listener and binding it again.
    pub restart_delay: Duration,

    /// Pause after a failed link check.
    pub link_poll_delay: Duration,

    /// Pause after every served cycle.
    pub idle_delay: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            recv_buffer: 1400,
            header_buffer: 256,
            error_limit: 5,
            link_down_limit: 3,
            restart_delay: Duration::from_millis(50),
            link_poll_delay: Duration::from_millis(10),
            idle_delay: Duration::from_millis(1),
        }
    }
}
