use std::io;

use tokio::signal::unix::Signal;
use tokio::signal::unix::SignalKind;
use tokio::signal::unix::signal;
use tracing::debug;
use tracing::warn;

/// Signals the orchestrator reacts to while a child is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlSignal {
    /// SIGWINCH: the real terminal changed size.
    Resize,
    /// SIGINT
    Interrupt,
    /// SIGTERM
    Terminate,
}

/// Whatever the control signals are relayed to. Implemented by the running
/// child's pty; tests use a recorder.
pub trait SignalTarget {
    fn forward_interrupt(&mut self) -> io::Result<()>;
    fn forward_terminate(&mut self) -> io::Result<()>;
    /// Recompute and apply the pty size.
    fn notify_resize(&mut self) -> anyhow::Result<()>;
}

/// Relay one signal. Failures are logged and never stop the relay.
pub fn handle_control_signal<T: SignalTarget + ?Sized>(target: &mut T, signal: ControlSignal) {
    match signal {
        ControlSignal::Resize => {
            if let Err(err) = target.notify_resize() {
                warn!("error resizing pty: {err:#}");
            }
        }
        ControlSignal::Interrupt => {
            if let Err(err) = target.forward_interrupt() {
                debug!("failed to forward SIGINT: {err}");
            }
        }
        ControlSignal::Terminate => {
            if let Err(err) = target.forward_terminate() {
                debug!("failed to forward SIGTERM: {err}");
            }
        }
    }
}

/// OS signal listeners for SIGWINCH, SIGINT and SIGTERM.
///
/// While registered, SIGINT and SIGTERM no longer terminate this process.
#[derive(Debug)]
pub struct ControlSignals {
    resize: Signal,
    interrupt: Signal,
    terminate: Signal,
}

impl ControlSignals {
    pub fn register() -> io::Result<Self> {
        Ok(Self {
            resize: signal(SignalKind::window_change())?,
            interrupt: signal(SignalKind::interrupt())?,
            terminate: signal(SignalKind::terminate())?,
        })
    }

    /// Wait for the next signal. Returns `None` once every listener is closed.
    pub async fn recv(&mut self) -> Option<ControlSignal> {
        tokio::select! {
            Some(()) = self.resize.recv() => Some(ControlSignal::Resize),
            Some(()) = self.interrupt.recv() => Some(ControlSignal::Interrupt),
            Some(()) = self.terminate.recv() => Some(ControlSignal::Terminate),
            else => None,
        }
    }
}

/// Relay signals to `target` until the listeners close. An initial resize is
/// applied before waiting.
pub async fn relay_signals<T: SignalTarget>(mut signals: ControlSignals, mut target: T) {
    handle_control_signal(&mut target, ControlSignal::Resize);
    while let Some(signal) = signals.recv().await {
        debug!(?signal, "relaying control signal");
        handle_control_signal(&mut target, signal);
    }
}
