//! Prints the terminal size seen on stdin as `COLSxROWS`.

fn main() {
    // SAFETY: TIOCGWINSZ only writes into the zeroed `winsize`.
    let mut winsize: libc::winsize = unsafe { std::mem::zeroed() };
    let rc = unsafe { libc::ioctl(libc::STDIN_FILENO, libc::TIOCGWINSZ, &mut winsize) };
    if rc != 0 {
        eprintln!("not a tty");
        return;
    }
    println!("{}x{}", winsize.ws_col, winsize.ws_row);
}
