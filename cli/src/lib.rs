use std::ffi::CStr;

use clap::Parser;
use ets_core::ConfigOverrides;

const DEFAULT_SHELL: &str = "sh";

/// ets -- command output timestamper
///
/// ets prefixes each line of a command's output with a timestamp. Lines are
/// delimited by CR, LF, or CRLF.
#[derive(Debug, Parser)]
#[command(
    name = "ets",
    version,
    override_usage = "ets [-s | -i] [-f format] [-d delim] [-u | -z timezone] command [arg ...]\n       \
                      ets [options] shell_command\n       \
                      ets [options]",
    after_long_help = AFTER_LONG_HELP
)]
pub struct Cli {
    /// Show elapsed timestamps.
    #[arg(short = 's', long = "elapsed")]
    pub elapsed: bool,

    /// Show incremental timestamps.
    #[arg(short = 'i', long = "incremental")]
    pub incremental: bool,

    /// Show timestamps in this format.
    #[arg(short = 'f', long = "format", value_name = "FORMAT")]
    pub format: Option<String>,

    /// Delimiter after timestamp (default is space). Backslash escapes are
    /// interpreted.
    #[arg(short = 'd', long = "delim", value_name = "DELIM")]
    pub delimiter: Option<String>,

    /// Show absolute timestamps in UTC.
    #[arg(short = 'u', long = "utc")]
    pub utc: bool,

    /// Show absolute timestamps in this timezone, e.g. America/New_York.
    #[arg(short = 'z', long = "timezone", value_name = "TIMEZONE")]
    pub timezone: Option<String>,

    /// Show timestamps in color.
    #[arg(short = 'c', long = "color")]
    pub color: bool,

    /// Print version and exit (same as --version).
    #[arg(short = 'v', hide = true)]
    pub print_version: bool,

    /// Command to run, followed by its arguments. Reads stdin when omitted.
    #[arg(
        value_name = "COMMAND",
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    pub command: Vec<String>,
}

const AFTER_LONG_HELP: &str = "\
The three usage strings correspond to three command execution modes:

* If given a single command without whitespace(s), or a command and its
  arguments, execute the command with exec in a pty;

* If given a single command with whitespace(s), the command is treated as
  a shell command and executed as SHELL -c shell_command, where SHELL is
  the current user's login shell, or sh if login shell cannot be determined;

* If given no command, output is read from stdin, and the user is
  responsible for piping in a command's output.

There are three mutually exclusive timestamp modes:

* The default is absolute time mode, where timestamps from the wall clock
  are shown;

* -s, --elapsed turns on elapsed time mode, where every timestamp is the
  time elapsed from the start of the command (using a monotonic clock);

* -i, --incremental turns on incremental time mode, where every timestamp is
  the time elapsed since the last timestamp (using a monotonic clock).

The default format of the prefixed timestamps depends on the timestamp mode
active. Users may supply a custom format string with the -f, --format option.
The format string is a strftime(3) format string, extended with %f
(microseconds), %L (milliseconds) and %s (Unix seconds, or whole seconds of
an elapsed/incremental duration).

The timezone for absolute timestamps can be controlled via the -u, --utc
and -z, --timezone options. --timezone accepts IANA time zone names, e.g.,
America/Los_Angeles. Local time is used by default.";

impl Cli {
    pub fn config_overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            elapsed: self.elapsed,
            incremental: self.incremental,
            format: self.format.clone(),
            delimiter: self.delimiter.clone(),
            utc: self.utc,
            timezone: self.timezone.clone(),
            color: self.color,
        }
    }
}

/// How the positional arguments are to be run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    /// Timestamp our own stdin.
    Stdin,
    /// Execute this argv on a pty.
    Command(Vec<String>),
}

/// A lone argument containing whitespace is a shell command line; anything
/// else is an argv to exec directly.
pub fn resolve_invocation(command: Vec<String>, shell: impl FnOnce() -> String) -> Invocation {
    match command.as_slice() {
        [] => Invocation::Stdin,
        [line] if line.chars().any(char::is_whitespace) => {
            Invocation::Command(vec![shell(), "-c".to_string(), line.clone()])
        }
        _ => Invocation::Command(command),
    }
}

/// The user's login shell: `$SHELL`, then the passwd entry, then `sh`.
pub fn login_shell() -> String {
    if let Some(shell) = std::env::var("SHELL").ok().filter(|s| !s.is_empty()) {
        return shell;
    }
    passwd_shell().unwrap_or_else(|| DEFAULT_SHELL.to_string())
}

fn passwd_shell() -> Option<String> {
    // SAFETY: getpwuid returns a pointer into static storage or null; the
    // shell string is copied out before any other passwd call can run.
    unsafe {
        let entry = libc::getpwuid(libc::getuid());
        if entry.is_null() || (*entry).pw_shell.is_null() {
            return None;
        }
        let shell = CStr::from_ptr((*entry).pw_shell).to_string_lossy().into_owned();
        (!shell.is_empty()).then_some(shell)
    }
}
