//! Terminal geometry for the child's pty, leaving room for the timestamp
//! prefix on every line.

use std::io;
use std::os::fd::AsFd;
use std::os::fd::AsRawFd;

use ets_utils_string::rendered_width;
use portable_pty::PtySize;

use crate::timestamper::Clock;
use crate::timestamper::Timestamper;

/// Size used when the real terminal size is unknown.
pub const UNKNOWN_SIZE: PtySize = PtySize {
    rows: 0,
    cols: 0,
    pixel_width: 0,
    pixel_height: 0,
};

/// Size of the terminal behind `fd`, or `None` if it is not a terminal.
pub fn query_terminal_size(fd: impl AsFd) -> Option<PtySize> {
    let raw_fd = fd.as_fd().as_raw_fd();
    // SAFETY: `winsize` is plain old data and TIOCGWINSZ only writes into it.
    let mut winsize: libc::winsize = unsafe { std::mem::zeroed() };
    let rc = unsafe { libc::ioctl(raw_fd, libc::TIOCGWINSZ, &mut winsize) };
    if rc != 0 {
        return None;
    }
    Some(PtySize {
        rows: winsize.ws_row,
        cols: winsize.ws_col,
        pixel_width: winsize.ws_xpixel,
        pixel_height: winsize.ws_ypixel,
    })
}

/// Shrink `real` by the rendered width of `timestamp` plus one delimiter
/// column. Rows and pixel height are unchanged; pixel width is scaled by the
/// same ratio as the columns.
pub fn pty_size_for(real: PtySize, timestamp: &str) -> PtySize {
    let occupied = rendered_width(timestamp).saturating_add(1);
    let occupied = u16::try_from(occupied).unwrap_or(u16::MAX);
    let cols = real.cols.saturating_sub(occupied);
    let pixel_width = if real.cols > 0 {
        let scaled = u32::from(real.pixel_width) * u32::from(cols) / u32::from(real.cols);
        u16::try_from(scaled).unwrap_or(real.pixel_width)
    } else {
        real.pixel_width
    };
    PtySize {
        rows: real.rows,
        cols,
        pixel_width,
        pixel_height: real.pixel_height,
    }
}

/// Recomputes the child's pty size on demand.
///
/// Owns its own [`Timestamper`] so that sampling a timestamp for its width
/// never disturbs the one used for printed lines.
pub struct PtySizer<C: Clock> {
    timestamper: Timestamper<C>,
    terminal: Box<dyn AsFd + Send>,
}

impl<C: Clock> PtySizer<C> {
    /// Size against the terminal on our stdin.
    pub fn new(timestamper: Timestamper<C>) -> Self {
        Self::with_terminal(timestamper, io::stdin())
    }

    pub fn with_terminal(timestamper: Timestamper<C>, terminal: impl AsFd + Send + 'static) -> Self {
        Self {
            timestamper,
            terminal: Box::new(terminal),
        }
    }

    /// Desired pty size given the current size of the real terminal, if
    /// there is one.
    pub fn current(&mut self) -> Option<PtySize> {
        let real = query_terminal_size(&*self.terminal)?;
        Some(self.size_for(real))
    }

    pub fn size_for(&mut self, real: PtySize) -> PtySize {
        pty_size_for(real, &self.timestamper.current_timestamp_string())
    }
}
