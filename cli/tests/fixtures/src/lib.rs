//! Child programs driven by the `ets` integration tests.
//!
//! Each binary under `src/bin/` reproduces one behaviour the timestamper has
//! to cope with: interleaved stdout/stderr, timed output, signal handling, and
//! terminal-size queries.
