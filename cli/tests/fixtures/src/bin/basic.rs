//! Writes three lines to stdout interleaved with three to stderr, then exits
//! with `-exitcode N` (default 0).

use std::io::Write;

fn main() {
    let mut args = std::env::args().skip(1);
    let mut exit_code = 0;
    while let Some(arg) = args.next() {
        if arg == "-exitcode" {
            exit_code = args.next().and_then(|code| code.parse().ok()).unwrap_or(0);
        }
    }

    let mut stdout = std::io::stdout();
    let mut stderr = std::io::stderr();
    for i in 1..=3 {
        let _ = writeln!(stdout, "out{i}");
        let _ = stdout.flush();
        let _ = writeln!(stderr, "err{i}");
    }
    std::process::exit(exit_code);
}
