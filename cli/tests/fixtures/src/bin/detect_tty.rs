//! Reports whether stdout is a terminal.

use std::io::IsTerminal;

fn main() {
    if std::io::stdout().is_terminal() {
        println!("tty");
    } else {
        println!("pipe");
    }
}
