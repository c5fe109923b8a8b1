use std::io;
use std::io::Read;
use std::io::Write;

use crate::line_splitter::LineSplitter;
use crate::timestamper::Clock;
use crate::timestamper::Timestamper;

/// Copy `source` to `out`, prefixing every line with a timestamp and
/// `delimiter`.
///
/// Each line is timestamped when it is read, then written and flushed before
/// the next line is requested. Returns once `source` is exhausted.
pub fn print_stream<R, W, C>(
    source: R,
    timestamper: &mut Timestamper<C>,
    delimiter: &[u8],
    out: &mut W,
) -> io::Result<()>
where
    R: Read,
    W: Write,
    C: Clock,
{
    for line in LineSplitter::new(source) {
        let line = line?;
        let timestamp = timestamper.current_timestamp_string();
        out.write_all(timestamp.as_bytes())?;
        out.write_all(delimiter)?;
        out.write_all(&line)?;
        out.flush()?;
    }
    Ok(())
}

/// Timestamp the current process's stdin onto stdout.
pub fn print_stdin<C: Clock>(timestamper: &mut Timestamper<C>, delimiter: &[u8]) -> io::Result<()> {
    let stdin = io::stdin().lock();
    let mut stdout = io::stdout().lock();
    print_stream(stdin, timestamper, delimiter, &mut stdout)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TimeZoneSpec;
    use crate::timestamper::TimestampMode;
    use pretty_assertions::assert_eq;

    fn fixed_timestamper(format: &str) -> Timestamper {
        match Timestamper::new(format, TimestampMode::Absolute, TimeZoneSpec::Utc) {
            Ok(timestamper) => timestamper,
            Err(err) => panic!("failed to build timestamper: {err}"),
        }
    }

    fn run(input: &[u8], format: &str, delimiter: &[u8]) -> Vec<u8> {
        let mut timestamper = fixed_timestamper(format);
        let mut out = Vec::new();
        if let Err(err) = print_stream(input, &mut timestamper, delimiter, &mut out) {
            panic!("print_stream failed: {err}");
        }
        out
    }

    #[test]
    fn prefixes_every_line_in_order() {
        let out = run(b"out1\nout2\nout3\n", "[%F %T]", b" ");
        let text = String::from_utf8_lossy(&out);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        for (line, expected) in lines.iter().zip(["out1", "out2", "out3"]) {
            let Some((prefix, tail)) = line.split_once("] ") else {
                panic!("line without timestamp: {line:?}");
            };
            assert!(prefix.starts_with('['), "bad prefix {prefix:?}");
            assert_eq!(tail, expected);
        }
    }

    #[test]
    fn carriage_returns_start_new_timestamped_lines() {
        assert_eq!(run(b"1\r2\n", "[timestamp]", b" "), b"[timestamp] 1\r[timestamp] 2\n");
    }

    #[test]
    fn unterminated_tail_is_printed_as_is() {
        assert_eq!(run(b"a\r\nb", "T", b"\t"), b"T\ta\nT\tb");
    }

    #[test]
    fn empty_input_prints_nothing() {
        assert!(run(b"", "T", b" ").is_empty());
    }

    #[test]
    fn non_utf8_bytes_pass_through() {
        assert_eq!(run(b"\xff\xfe\n", "T", b":"), b"T:\xff\xfe\n");
    }

    #[test]
    fn delimiter_is_written_byte_for_byte() {
        assert_eq!(run(b"x\n", "T", b"\xff|"), b"T\xff|x\n");
    }

    #[test]
    fn write_errors_propagate() {
        struct Closed;
        impl Write for Closed {
            fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
                Err(io::Error::from(io::ErrorKind::BrokenPipe))
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let mut timestamper = fixed_timestamper("T");
        let result = print_stream(&b"line\n"[..], &mut timestamper, b" ", &mut Closed);
        assert!(matches!(result, Err(err) if err.kind() == io::ErrorKind::BrokenPipe));
    }
}
