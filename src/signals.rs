//! Termination signals.
//!
//! Handlers never touch monitor state; each delivery becomes an
//! [`Event::Shutdown`] on the main loop's channel.

use std::io;
use std::sync::mpsc::Sender;

use signal_hook::consts::SIGTSTP;
use signal_hook::iterator::Signals;
use thiserror::Error;
use tracing::debug;

use crate::scheduler::Event;

#[derive(Debug, Error)]
pub enum SignalError {
    #[error("set termination handler failed: {0}")]
    Termination(#[from] ctrlc::Error),
    #[error("set cntl-Z handler failed: {0}")]
    Suspend(#[source] io::Error),
}

/// SIGINT, SIGTERM and SIGHUP.
///
/// Can be installed once per process.
pub fn on_termination(events: Sender<Event>) -> Result<(), SignalError> {
    ctrlc::set_handler(move || {
        let _ = events.send(Event::Shutdown);
    })?;
    Ok(())
}

/// SIGTSTP (cntl-Z) ends the monitor instead of stopping it.
pub fn on_suspend(events: Sender<Event>) -> Result<(), SignalError> {
    let mut signals = Signals::new([SIGTSTP]).map_err(SignalError::Suspend)?;
    std::thread::Builder::new()
        .name("sigtstp".to_string())
        .spawn(move || {
            for signal in signals.forever() {
                debug!("signal {} received", signal);
                if events.send(Event::Shutdown).is_err() {
                    break;
                }
            }
        })
        .map_err(SignalError::Suspend)?;
    Ok(())
}
