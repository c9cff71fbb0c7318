//! User-facing stderr messages.
//!
//! Progress, warnings, and failures are written to an injected writer so the
//! binary can pass `stderr` while tests capture a `Vec<u8>`. Writes are
//! best-effort: a closed stderr never aborts the bootstrap.

use std::fmt::Display;
use std::io::Write;

/// Write `message` followed by a newline, ignoring write failures.
pub fn write_stderr_line(stderr: &mut dyn Write, message: impl Display) {
    if writeln!(stderr, "{message}").is_err() {
        // Best-effort logging; ignore write failures.
    }
}

/// Write a warning line.
pub fn write_warning(stderr: &mut dyn Write, message: impl Display) {
    write_stderr_line(stderr, format!("warning: {message}"));
}

/// Write a success line.
pub fn write_success(stderr: &mut dyn Write, message: impl Display) {
    write_stderr_line(stderr, format!("✓ {message}"));
}

/// Write an error line.
pub fn write_error(stderr: &mut dyn Write, message: impl Display) {
    write_stderr_line(stderr, format!("error: {message}"));
}
