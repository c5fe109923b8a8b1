//! Core of `ets`: splits output into lines and prefixes each one with an
//! absolute, elapsed, or incremental timestamp, optionally running the
//! producing command on a pty.

pub mod config;
pub mod error;
pub mod line_splitter;
#[cfg(unix)]
mod orchestrator;
pub mod printer;
#[cfg(unix)]
pub mod pty_size;
#[cfg(unix)]
pub mod signals;
pub mod strftime;
mod timestamper;

pub use config::Config;
pub use config::ConfigOverrides;
pub use config::TimeZoneSpec;
pub use error::ConfigError;
pub use error::EtsErr;
pub use error::FormatError;
pub use line_splitter::LineSplitter;
#[cfg(unix)]
pub use orchestrator::run_command;
pub use printer::print_stdin;
pub use printer::print_stream;
pub use timestamper::Clock;
pub use timestamper::SystemClock;
pub use timestamper::TimestampMode;
pub use timestamper::Timestamper;
