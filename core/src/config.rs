use chrono_tz::Tz;

use crate::error::ConfigError;
use crate::strftime::Strftime;
use crate::timestamper::TimestampMode;
use crate::timestamper::Timestamper;

pub const DEFAULT_ABSOLUTE_FORMAT: &str = "[%F %T]";
pub const DEFAULT_DURATION_FORMAT: &str = "[%T]";
pub const DEFAULT_DELIMITER: &str = " ";

const COLOR_START: &str = "\x1b[32m";
const COLOR_RESET: &str = "\x1b[0m";

/// Time zone used for absolute timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeZoneSpec {
    /// The system offset, used only when the local zone has no IANA name.
    #[default]
    Local,
    Utc,
    Named(Tz),
}

impl TimeZoneSpec {
    /// Parse an IANA zone name such as `America/New_York`.
    pub fn parse(name: &str) -> Result<Self, ConfigError> {
        name.parse::<Tz>()
            .map(TimeZoneSpec::Named)
            .map_err(|_| ConfigError::UnknownTimeZone {
                name: name.to_string(),
            })
    }

    /// The local zone by IANA name, so that `%Z` renders an abbreviation.
    /// `$TZ` wins over the system setting, as it does for libc.
    pub fn local() -> Self {
        Self::resolve_local(std::env::var("TZ").ok(), || {
            iana_time_zone::get_timezone().ok()
        })
    }

    fn resolve_local(tz_env: Option<String>, system: impl FnOnce() -> Option<String>) -> Self {
        let name = match tz_env {
            Some(value) if value.is_empty() => return TimeZoneSpec::Utc,
            Some(value) => Some(value.strip_prefix(':').unwrap_or(&value).to_string()),
            None => system(),
        };
        name.and_then(|name| name.parse::<Tz>().ok())
            .map_or(TimeZoneSpec::Local, TimeZoneSpec::Named)
    }
}

/// Raw user options, typically straight from the command line.
#[derive(Debug, Default, Clone)]
pub struct ConfigOverrides {
    pub elapsed: bool,
    pub incremental: bool,
    pub format: Option<String>,
    pub delimiter: Option<String>,
    pub utc: bool,
    pub timezone: Option<String>,
    pub color: bool,
}

/// Validated configuration for one run.
#[derive(Debug, Clone)]
pub struct Config {
    pub mode: TimestampMode,
    /// Final format string, including color codes when enabled.
    pub format: String,
    /// Raw bytes written between the timestamp and each line.
    pub delimiter: Vec<u8>,
    pub timezone: TimeZoneSpec,
}

impl Config {
    /// Resolve and validate `overrides`. Every configuration error surfaces
    /// here, before a child is started or a line is printed.
    pub fn load_with_overrides(overrides: ConfigOverrides) -> Result<Self, ConfigError> {
        let ConfigOverrides {
            elapsed,
            incremental,
            format,
            delimiter,
            utc,
            timezone,
            color,
        } = overrides;

        let mode = match (elapsed, incremental) {
            (true, true) => return Err(ConfigError::ConflictingModes),
            (true, false) => TimestampMode::Elapsed,
            (false, true) => TimestampMode::Incremental,
            (false, false) => TimestampMode::Absolute,
        };

        let mut format = match format.filter(|f| !f.is_empty()) {
            Some(format) => format,
            None if mode == TimestampMode::Absolute => DEFAULT_ABSOLUTE_FORMAT.to_string(),
            None => DEFAULT_DURATION_FORMAT.to_string(),
        };
        if color {
            format = format!("{COLOR_START}{format}{COLOR_RESET}");
        }
        Strftime::new(&format)?;

        let delimiter = match delimiter {
            Some(raw) => unescape_delimiter(&raw)?,
            None => DEFAULT_DELIMITER.as_bytes().to_vec(),
        };

        let timezone = match (utc, timezone.filter(|tz| !tz.is_empty())) {
            (true, Some(_)) => return Err(ConfigError::ConflictingTimeZones),
            (true, None) => TimeZoneSpec::Utc,
            (false, Some(name)) => TimeZoneSpec::parse(&name)?,
            (false, None) => TimeZoneSpec::local(),
        };

        Ok(Self {
            mode,
            format,
            delimiter,
            timezone,
        })
    }

    pub fn timestamper(&self) -> Result<Timestamper, ConfigError> {
        Timestamper::new(&self.format, self.mode, self.timezone)
    }
}

/// Interpret the escapes of a double-quoted string literal (`\t`, `\x1b`,
/// `\u00a0`, `\101`, ...) in a delimiter given on the command line.
///
/// `\x` and octal escapes produce the raw byte, so a delimiter need not be
/// valid UTF-8. A bare `"`, `\'` and a literal newline are rejected.
pub fn unescape_delimiter(raw: &str) -> Result<Vec<u8>, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidDelimiter { reason };

    let mut out = Vec::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {}
            '"' => return Err(invalid("unescaped double quote".to_string())),
            '\n' => return Err(invalid("newline in delimiter".to_string())),
            _ => {
                push_char(&mut out, c);
                continue;
            }
        }
        let escape = chars
            .next()
            .ok_or_else(|| invalid("trailing backslash".to_string()))?;
        match escape {
            'a' => out.push(0x07),
            'b' => out.push(0x08),
            'f' => out.push(0x0c),
            'n' => out.push(b'\n'),
            'r' => out.push(b'\r'),
            't' => out.push(b'\t'),
            'v' => out.push(0x0b),
            '\\' => out.push(b'\\'),
            '"' => out.push(b'"'),
            'x' => {
                let byte = take_hex(&mut chars, 2)
                    .and_then(|value| u8::try_from(value).ok())
                    .ok_or_else(|| invalid("bad \\x escape".to_string()))?;
                out.push(byte);
            }
            'u' | 'U' => {
                let len = if escape == 'u' { 4 } else { 8 };
                let decoded = take_hex(&mut chars, len)
                    .and_then(char::from_u32)
                    .ok_or_else(|| invalid(format!("bad \\{escape} escape")))?;
                push_char(&mut out, decoded);
            }
            '0'..='7' => {
                let mut digits = String::from(escape);
                digits.extend(chars.by_ref().take(2));
                let byte = u8::from_str_radix(&digits, 8)
                    .ok()
                    .filter(|_| digits.len() == 3)
                    .ok_or_else(|| invalid("bad octal escape".to_string()))?;
                out.push(byte);
            }
            other => return Err(invalid(format!("unknown escape \\{other}"))),
        }
    }
    Ok(out)
}

fn push_char(out: &mut Vec<u8>, c: char) {
    let mut buf = [0u8; 4];
    out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
}

fn take_hex(chars: &mut std::str::Chars<'_>, len: usize) -> Option<u32> {
    let digits: String = chars.by_ref().take(len).collect();
    if digits.len() != len || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    u32::from_str_radix(&digits, 16).ok()
}
