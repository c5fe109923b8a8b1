use std::collections::HashMap;
use std::fmt::Write as _;
use std::sync::Arc;

use chrono::DateTime;
use chrono::FixedOffset;

/// Renders one custom `%` directive.
///
/// The instant has already been resolved to its display offset, so
/// implementations can read calendar fields directly.
pub trait Directive: Send + Sync {
    fn append(&self, out: &mut String, instant: &DateTime<FixedOffset>);
}

impl<F> Directive for F
where
    F: Fn(&mut String, &DateTime<FixedOffset>) + Send + Sync,
{
    fn append(&self, out: &mut String, instant: &DateTime<FixedOffset>) {
        self(out, instant)
    }
}

/// Maps a directive character to its renderer. Entries here take precedence
/// over the standard strftime grammar.
#[derive(Clone, Default)]
pub struct DirectiveRegistry {
    directives: HashMap<char, Arc<dyn Directive>>,
}

impl DirectiveRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// `%f` (microseconds), `%L` (milliseconds) and `%s` (Unix seconds).
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register('f', microseconds);
        registry.register('L', milliseconds);
        registry.register('s', unix_seconds);
        registry
    }

    pub fn register(&mut self, directive: char, renderer: impl Directive + 'static) {
        self.directives.insert(directive, Arc::new(renderer));
    }

    pub(crate) fn get(&self, directive: char) -> Option<Arc<dyn Directive>> {
        self.directives.get(&directive).cloned()
    }
}

impl std::fmt::Debug for DirectiveRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut keys: Vec<&char> = self.directives.keys().collect();
        keys.sort();
        f.debug_struct("DirectiveRegistry")
            .field("directives", &keys)
            .finish()
    }
}

/// Sub-second part as exactly six digits.
fn microseconds(out: &mut String, instant: &DateTime<FixedOffset>) {
    let _ = write!(out, "{:06}", instant.timestamp_subsec_micros());
}

/// Sub-second part as exactly three digits.
fn milliseconds(out: &mut String, instant: &DateTime<FixedOffset>) {
    let _ = write!(out, "{:03}", instant.timestamp_subsec_millis());
}

/// Whole seconds since the Unix epoch, independent of the display offset.
fn unix_seconds(out: &mut String, instant: &DateTime<FixedOffset>) {
    let _ = write!(out, "{}", instant.timestamp());
}
