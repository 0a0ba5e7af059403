use crossterm::{
    cursor, queue,
    style::Print,
    terminal::{self, ClearType},
};
use std::fmt::Write as _;
use std::io::{self, Write};

use crate::app::AppState;

fn truncate_and_pad_in_place(text: &mut String, width: usize) {
    if width == 0 {
        text.clear();
        return;
    }

    let mut seen_chars = 0usize;
    let mut truncate_byte = None;
    for (idx, _) in text.char_indices() {
        if seen_chars == width {
            truncate_byte = Some(idx);
            break;
        }
        seen_chars += 1;
    }

    if let Some(idx) = truncate_byte {
        text.truncate(idx);
    } else {
        for _ in seen_chars..width {
            text.push(' ');
        }
    }
}

pub fn draw_status_line(
    app_state: &mut AppState,
    sorts_run: u64,
    cols: u16,
    stdout: &mut impl Write,
) -> io::Result<()> {
    let shown_age = app_state
        .cloud
        .indexed_distances()
        .parameters
        .time
        .elapsed()
        .as_secs_f32()
        * 1000.0;
    let hud = &mut app_state.hud_string_buf;
    hud.clear();
    write!(
        hud,
        "Frame:{:>5}/{}  FPS:{:>5.1}  Splats:{}  Requests:{}  Sorts:{}  Applied:{}  Stale:{}  Order age:{:>6.1}ms  Cores:{}",
        app_state.frame_count,
        app_state.frames,
        app_state.fps,
        app_state.cloud.len(),
        app_state.stats.requests,
        sorts_run,
        app_state.stats.accepted,
        app_state.stats.stale,
        shown_age,
        rayon::current_num_threads()
    )
    .map_err(|_| io::Error::other("failed to format HUD"))?;
    // Leave the last column free so the terminal does not wrap.
    truncate_and_pad_in_place(hud, (cols as usize).saturating_sub(1));

    queue!(
        stdout,
        cursor::MoveToColumn(0),
        terminal::Clear(ClearType::CurrentLine),
        Print(hud.as_str())
    )?;
    stdout.flush()
}

#[cfg(test)]
mod tests {
    use super::truncate_and_pad_in_place;

    #[test]
    fn pads_and_truncates_by_chars() {
        let mut text = String::from("abc");
        truncate_and_pad_in_place(&mut text, 5);
        assert_eq!(text, "abc  ");

        let mut text = String::from("héllo");
        truncate_and_pad_in_place(&mut text, 2);
        assert_eq!(text, "hé");

        truncate_and_pad_in_place(&mut text, 0);
        assert!(text.is_empty());
    }
}
