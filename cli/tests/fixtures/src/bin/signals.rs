//! Busy-waits, printing a heartbeat. SIGINT is reported and ignored; SIGTERM
//! is reported and ends the program.

use std::io::Write;
use std::time::Duration;

use tokio::signal::unix::SignalKind;
use tokio::signal::unix::signal;

#[tokio::main(flavor = "current_thread")]
async fn main() -> std::io::Result<()> {
    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;
    let mut stdout = std::io::stdout();
    loop {
        tokio::select! {
            _ = interrupt.recv() => {
                writeln!(stdout, "ignored SIGINT")?;
            }
            _ = terminate.recv() => {
                writeln!(stdout, "shutting down after receiving SIGTERM")?;
                stdout.flush()?;
                return Ok(());
            }
            _ = tokio::time::sleep(Duration::from_millis(200)) => {
                writeln!(stdout, "busy waiting")?;
            }
        }
        stdout.flush()?;
    }
}
