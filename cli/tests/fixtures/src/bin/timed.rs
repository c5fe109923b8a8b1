//! Prints one line per second, three times.

use std::io::Write;
use std::thread::sleep;
use std::time::Duration;

fn main() {
    let mut stdout = std::io::stdout();
    for i in 1..=3 {
        sleep(Duration::from_secs(1));
        let _ = writeln!(stdout, "out{i}");
        let _ = stdout.flush();
    }
}
