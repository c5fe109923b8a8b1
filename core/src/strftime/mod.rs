//! strftime-style format strings compiled once and rendered many times.
//!
//! Standard directives are delegated to chrono. Characters registered in a
//! [`DirectiveRegistry`] are rendered by their own [`Directive`] instead, which
//! is how `%f`, `%L` and `%s` get their fixed-width / epoch semantics.

mod directives;

use std::fmt;
use std::fmt::Display;
use std::fmt::Write as _;
use std::sync::Arc;

use chrono::DateTime;
use chrono::TimeZone;
use chrono::format::Item;
use chrono::format::StrftimeItems;

use crate::error::FormatError;

pub use directives::Directive;
pub use directives::DirectiveRegistry;

const PADDING_FLAGS: [char; 3] = ['-', '_', '0'];

#[derive(Clone)]
enum Segment {
    Literal(String),
    Standard(Vec<Item<'static>>),
    Custom(Arc<dyn Directive>),
}

/// A compiled format string.
#[derive(Clone)]
pub struct Strftime {
    pattern: String,
    segments: Vec<Segment>,
}

impl Strftime {
    /// Compile `pattern` with the default custom directives.
    pub fn new(pattern: &str) -> Result<Self, FormatError> {
        Self::with_registry(pattern, &DirectiveRegistry::with_defaults())
    }

    pub fn with_registry(pattern: &str, registry: &DirectiveRegistry) -> Result<Self, FormatError> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = pattern.chars().peekable();

        while let Some(c) = chars.next() {
            if c != '%' {
                literal.push(c);
                continue;
            }
            let flag = chars.next_if(|c| PADDING_FLAGS.contains(c));
            let directive = chars.next().ok_or(FormatError::TrailingPercent)?;

            if !literal.is_empty() {
                segments.push(Segment::Literal(std::mem::take(&mut literal)));
            }
            let custom = match flag {
                None => registry.get(directive),
                Some(_) => None,
            };
            if let Some(renderer) = custom {
                segments.push(Segment::Custom(renderer));
                continue;
            }

            let mut spec = String::from('%');
            spec.extend(flag);
            spec.push(directive);
            let items = StrftimeItems::new(&spec)
                .parse_to_owned()
                .map_err(|_| FormatError::UnknownDirective { directive })?;
            segments.push(Segment::Standard(items));
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self {
            pattern: pattern.to_string(),
            segments,
        })
    }

    /// Render against `instant` in its own time zone.
    pub fn format<Tz>(&self, instant: &DateTime<Tz>) -> String
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let mut out = String::with_capacity(self.pattern.len() + 16);
        self.append(&mut out, instant);
        out
    }

    pub fn append<Tz>(&self, out: &mut String, instant: &DateTime<Tz>)
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let fixed = instant.fixed_offset();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Standard(items) => {
                    let _ = write!(out, "{}", instant.format_with_items(items.iter()));
                }
                Segment::Custom(renderer) => renderer.append(out, &fixed),
            }
        }
    }
}

impl fmt::Debug for Strftime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Strftime")
            .field("pattern", &self.pattern)
            .finish_non_exhaustive()
    }
}
