use std::time::Duration;

/// The device around the server: network link, watchdog, timing and reset.
pub trait Platform {
    /// Whether the network link is usable right now.
    fn link_up(&mut self) -> bool;

    /// Called once per served cycle. Kick a watchdog here.
    fn tick(&mut self) {}

    fn delay(&mut self, duration: Duration);

    /// Reinitialize the whole device. Used when the server cannot be brought
    /// back in software.
    fn reset(&mut self) -> !;
}

/// [`Platform`] for a regular OS process.
///
/// The link is always up and a device reset aborts the process, leaving
/// restart to whatever supervises it.
#[derive(Debug, Default, Clone, Copy)]
pub struct Host;

impl Platform for Host {
    fn link_up(&mut self) -> bool {
        true
    }

    fn delay(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }

    fn reset(&mut self) -> ! {
        error!("Device reset requested, aborting");
        std::process::abort()
    }
}
