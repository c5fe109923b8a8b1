//! Splits a byte stream into lines terminated by CR, LF, or CRLF.
//!
//! Terminators are kept as part of each line. A lone `\r` or `\n` passes
//! through unchanged; a `\r\n` pair is collapsed into a single `\n`. The final
//! fragment of a stream is emitted without a terminator if it lacks one.

use std::io;
use std::io::ErrorKind;
use std::io::Read;

const READ_CHUNK_SIZE: usize = 8192;

/// One step of the tokenizer over the buffered, not yet consumed bytes.
///
/// Returns `None` when more input is required (or, at EOF, when `data` is
/// empty). Otherwise returns the number of bytes consumed from `data` together
/// with the emitted line.
pub fn split_line(data: &[u8], at_eof: bool) -> Option<(usize, Vec<u8>)> {
    if at_eof && data.is_empty() {
        return None;
    }
    let lf_pos = data.iter().position(|&b| b == b'\n');
    let cr_pos = data.iter().position(|&b| b == b'\r');
    if let Some(cr) = cr_pos {
        match lf_pos {
            None => return Some((cr + 1, data[..=cr].to_vec())),
            Some(lf) if lf > cr + 1 => return Some((cr + 1, data[..=cr].to_vec())),
            Some(lf) if lf == cr + 1 => {
                let mut line = Vec::with_capacity(cr + 1);
                line.extend_from_slice(&data[..cr]);
                line.push(b'\n');
                return Some((lf + 1, line));
            }
            // LF precedes the CR; handled below.
            Some(_) => {}
        }
    }
    if let Some(lf) = lf_pos {
        return Some((lf + 1, data[..=lf].to_vec()));
    }
    if at_eof {
        return Some((data.len(), data.to_vec()));
    }
    None
}

/// Lazily yields the lines of `reader`, reading more input only when the
/// buffered bytes hold no complete line.
///
/// The iterator is fused: after end-of-stream or the first read error it only
/// returns `None`.
pub struct LineSplitter<R> {
    reader: R,
    buf: Vec<u8>,
    start: usize,
    at_eof: bool,
    done: bool,
}

impl<R: Read> LineSplitter<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::with_capacity(READ_CHUNK_SIZE),
            start: 0,
            at_eof: false,
            done: false,
        }
    }

    fn fill(&mut self) -> io::Result<()> {
        if self.start > 0 {
            self.buf.drain(..self.start);
            self.start = 0;
        }
        let mut chunk = [0u8; READ_CHUNK_SIZE];
        loop {
            match self.reader.read(&mut chunk) {
                Ok(0) => {
                    self.at_eof = true;
                    return Ok(());
                }
                Ok(n) => {
                    self.buf.extend_from_slice(&chunk[..n]);
                    return Ok(());
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(err),
            }
        }
    }
}

impl<R: Read> Iterator for LineSplitter<R> {
    type Item = io::Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            if let Some((advance, line)) = split_line(&self.buf[self.start..], self.at_eof) {
                self.start += advance;
                return Some(Ok(line));
            }
            if self.at_eof {
                self.done = true;
                break;
            }
            if let Err(err) = self.fill() {
                self.done = true;
                return Some(Err(err));
            }
        }
        None
    }
}
