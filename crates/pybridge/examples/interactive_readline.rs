//! Exercise the raw-mode terminal bridge directly: capture lines the way a
//! runtime-side `input()` call would, until an empty line or Ctrl-C.
//!
//! ```bash
//! cargo run --example interactive_readline
//! ```

use pybridge::{HostIo, TerminalIo};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let io = TerminalIo::new();
    io.write_line("type lines; backspace edits, Ctrl-C cancels the line, empty line quits");

    loop {
        io.write_line("> ");
        let line = io.read_line("").await?;
        if line.is_empty() {
            break;
        }
        io.write_line(&format!("captured: {line:?}"));
    }

    io.write_line("bye");
    Ok(())
}
