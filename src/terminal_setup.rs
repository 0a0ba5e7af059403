use crossterm::{cursor, execute, style::ResetColor};
use std::io::{self, Write};
use std::panic;

use crate::app::AppResult;

pub fn install_panic_hook() {
    let default_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let mut stdout = io::stdout();
        if execute!(stdout, ResetColor, cursor::Show).is_err() {
            let mut stderr = io::stderr();
            let _ = stderr.write_all(b"\x1b[?25h\x1b[0m");
            let _ = stderr.flush();
        }
        default_hook(panic_info);
    }));
}

pub fn prepare_status_line(stdout: &mut impl Write) -> AppResult<()> {
    execute!(stdout, cursor::Hide)?;
    Ok(())
}

pub fn cleanup_terminal(stdout: &mut impl Write) -> AppResult<()> {
    execute!(stdout, ResetColor, cursor::Show)?;
    writeln!(stdout)?;
    stdout.flush()?;
    Ok(())
}
