//! Runs a child command on a pty and timestamps everything it prints.

use std::io;
use std::io::Read;
use std::io::Write;
use std::sync::mpsc;
use std::thread;

use portable_pty::Child;
use portable_pty::CommandBuilder;
use portable_pty::MasterPty;
use portable_pty::native_pty_system;
use tracing::debug;

use crate::config::Config;
use crate::error::EtsErr;
use crate::error::Result;
use crate::printer::print_stream;
use crate::pty_size::PtySizer;
use crate::pty_size::UNKNOWN_SIZE;
use crate::signals::ControlSignals;
use crate::signals::SignalTarget;
use crate::signals::relay_signals;
use crate::timestamper::SystemClock;

/// Run `argv` attached to a new pty, printing its timestamped output to
/// stdout. Resolves to the child's exit code once it has exited and its output
/// has been drained.
pub async fn run_command(argv: &[String], config: &Config) -> Result<i32> {
    let Some((program, args)) = argv.split_first() else {
        return Err(EtsErr::spawn("", anyhow::anyhow!("empty command")));
    };

    let mut timestamper = config.timestamper()?;
    let mut sizer = PtySizer::new(config.timestamper()?);
    let initial_size = sizer.current().unwrap_or(UNKNOWN_SIZE);
    debug!(?initial_size, "allocating pty");

    let signals = ControlSignals::register()?;

    let pair = native_pty_system()
        .openpty(initial_size)
        .map_err(|err| EtsErr::spawn(program.as_str(), err))?;

    let mut command = CommandBuilder::new(program);
    command.args(args);
    if let Ok(cwd) = std::env::current_dir() {
        command.cwd(cwd);
    }
    let child = pair
        .slave
        .spawn_command(command)
        .map_err(|err| EtsErr::spawn(program.as_str(), err))?;
    // Keep no slave handle in this process, otherwise the master never sees
    // end-of-stream after the child exits.
    drop(pair.slave);

    let master = pair.master;
    let reader = master
        .try_clone_reader()
        .map_err(|err| EtsErr::spawn(program.as_str(), err))?;
    let writer = master
        .take_writer()
        .map_err(|err| EtsErr::spawn(program.as_str(), err))?;

    let relay = tokio::spawn(relay_signals(
        signals,
        ChildPty {
            master,
            pid: child.process_id(),
            sizer,
        },
    ));

    let _stdin_writer = forward_stdin(writer);

    let delimiter = config.delimiter.clone();
    let printed = tokio::task::spawn_blocking(move || {
        let mut stdout = io::stdout().lock();
        print_stream(PtyOutput(reader), &mut timestamper, &delimiter, &mut stdout)
    })
    .await
    .map_err(io::Error::other)?;
    if let Err(err) = printed {
        relay.abort();
        return Err(err.into());
    }

    let code = tokio::task::spawn_blocking(move || wait_for_exit(child))
        .await
        .map_err(io::Error::other)??;
    relay.abort();
    debug!(code, "child exited");
    Ok(code)
}

/// Shell convention for a child killed by a signal: 128 + signal number.
const EXIT_CODE_SIGNAL_BASE: i32 = 128;

/// Reap the child and return its exit code. Termination by a signal is
/// reported as [`EXIT_CODE_SIGNAL_BASE`] plus the signal number, which
/// portable-pty's own status cannot express.
fn wait_for_exit(mut child: Box<dyn Child + Send + Sync>) -> io::Result<i32> {
    let Some(pid) = child
        .process_id()
        .and_then(|pid| libc::pid_t::try_from(pid).ok())
    else {
        return Ok(child.wait()?.exit_code() as i32);
    };
    let mut status: libc::c_int = 0;
    loop {
        // SAFETY: waitpid only writes the status of our own child into `status`.
        let rc = unsafe { libc::waitpid(pid, &mut status, 0) };
        if rc == pid {
            return Ok(exit_code_from_wait_status(status));
        }
        let err = io::Error::last_os_error();
        if err.kind() != io::ErrorKind::Interrupted {
            return Err(err);
        }
    }
}

fn exit_code_from_wait_status(status: libc::c_int) -> i32 {
    if libc::WIFEXITED(status) {
        libc::WEXITSTATUS(status)
    } else if libc::WIFSIGNALED(status) {
        EXIT_CODE_SIGNAL_BASE + libc::WTERMSIG(status)
    } else {
        -1
    }
}

/// Copy our stdin into the child until either side closes. The thread is
/// detached: it may still be blocked reading stdin when the process exits.
///
/// Dropping the pty writer types a newline and EOF into the child, so once
/// our stdin ends the writer is handed back through the returned channel and
/// the caller keeps it until the child is gone.
fn forward_stdin(mut writer: Box<dyn Write + Send>) -> mpsc::Receiver<Box<dyn Write + Send>> {
    let (tx, rx) = mpsc::channel();
    let spawned = thread::Builder::new()
        .name("ets-stdin".to_string())
        .spawn(move || {
            let mut stdin = io::stdin();
            if let Err(err) = io::copy(&mut stdin, &mut writer) {
                debug!("stdin forwarding stopped: {err}");
            }
            let _ = tx.send(writer);
        });
    if let Err(err) = spawned {
        debug!("failed to start stdin forwarder: {err}");
    }
    rx
}

/// The running child as seen by the signal relay.
struct ChildPty {
    master: Box<dyn MasterPty + Send>,
    pid: Option<u32>,
    sizer: PtySizer<SystemClock>,
}

impl ChildPty {
    fn signal_group(&self, signal: libc::c_int) -> io::Result<()> {
        let pid = self
            .pid
            .and_then(|pid| libc::pid_t::try_from(pid).ok())
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "child has no pid"))?;
        // The child leads its own session and process group, so -pid reaches
        // it and everything it started.
        let rc = unsafe { libc::kill(-pid, signal) };
        if rc == 0 {
            Ok(())
        } else {
            Err(io::Error::last_os_error())
        }
    }
}

impl SignalTarget for ChildPty {
    fn forward_interrupt(&mut self) -> io::Result<()> {
        self.signal_group(libc::SIGINT)
    }

    fn forward_terminate(&mut self) -> io::Result<()> {
        self.signal_group(libc::SIGTERM)
    }

    fn notify_resize(&mut self) -> anyhow::Result<()> {
        let Some(size) = self.sizer.current() else {
            return Ok(());
        };
        debug!(?size, "resizing pty");
        self.master.resize(size)
    }
}

/// Reader over the pty master. Linux reports EIO once the slave side is gone;
/// that is the normal end of the child's output.
struct PtyOutput<R>(R);

impl<R: Read> Read for PtyOutput<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.0.read(buf) {
            Err(err) if err.raw_os_error() == Some(libc::EIO) => Ok(0),
            other => other,
        }
    }
}
