use std::time::Duration;
use std::time::Instant;

use chrono::DateTime;
use chrono::Local;
use chrono::Utc;

use crate::config::TimeZoneSpec;
use crate::error::ConfigError;
use crate::strftime::Strftime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimestampMode {
    /// Wall clock time in the configured time zone.
    #[default]
    Absolute,
    /// Time since the timestamper was created.
    Elapsed,
    /// Time since the previous timestamp.
    Incremental,
}

/// Source of time for a [`Timestamper`].
pub trait Clock: Send {
    /// Monotonic reading used for elapsed/incremental durations.
    fn now(&self) -> Instant;

    /// Wall clock reading used for absolute timestamps.
    fn wall_now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn wall_now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Produces timestamp strings for successive output lines.
#[derive(Debug)]
pub struct Timestamper<C = SystemClock> {
    mode: TimestampMode,
    timezone: TimeZoneSpec,
    formatter: Strftime,
    start_time: Instant,
    last_time: Instant,
    clock: C,
}

impl Timestamper<SystemClock> {
    pub fn new(
        format: &str,
        mode: TimestampMode,
        timezone: TimeZoneSpec,
    ) -> Result<Self, ConfigError> {
        Self::with_clock(format, mode, timezone, SystemClock)
    }
}

impl<C: Clock> Timestamper<C> {
    pub fn with_clock(
        format: &str,
        mode: TimestampMode,
        timezone: TimeZoneSpec,
        clock: C,
    ) -> Result<Self, ConfigError> {
        let formatter = Strftime::new(format)?;
        let now = clock.now();
        Ok(Self {
            mode,
            timezone,
            formatter,
            start_time: now,
            last_time: now,
            clock,
        })
    }

    /// Render the timestamp for "now" and record it as the latest emission.
    pub fn current_timestamp_string(&mut self) -> String {
        let now = self.clock.now();
        let rendered = match self.mode {
            TimestampMode::Absolute => {
                let wall = self.clock.wall_now();
                match self.timezone {
                    TimeZoneSpec::Local => self.formatter.format(&wall.with_timezone(&Local)),
                    TimeZoneSpec::Utc => self.formatter.format(&wall),
                    TimeZoneSpec::Named(tz) => self.formatter.format(&wall.with_timezone(&tz)),
                }
            }
            TimestampMode::Elapsed => {
                self.format_duration(now.saturating_duration_since(self.start_time))
            }
            TimestampMode::Incremental => {
                self.format_duration(now.saturating_duration_since(self.last_time))
            }
        };
        self.last_time = now;
        rendered
    }

    fn format_duration(&self, duration: Duration) -> String {
        self.formatter.format(&duration_to_synthetic_instant(duration))
    }
}

/// Reinterpret a duration as the UTC instant that same distance past the Unix
/// epoch, so that `%H:%M:%S`, `%f`, `%s` etc. render duration components.
///
/// The result is a formatting device only and must not be treated as a real
/// point in time.
pub(crate) fn duration_to_synthetic_instant(duration: Duration) -> DateTime<Utc> {
    i64::try_from(duration.as_secs())
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, duration.subsec_nanos()))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}
