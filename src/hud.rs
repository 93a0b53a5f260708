// Copyright (c) 2026 rezky_nightky

use crate::cell::Cell;
use crate::frame::Frame;
use crate::palette::{accent, quantize};
use crate::runtime::ColorMode;
use crate::sky::SkyMode;
use crate::soundscape::SoundState;

const PAD_X: u16 = 1;
const MARGIN: u16 = 1;
const BADGE_BG: (u8, u8, u8) = (0x02, 0x06, 0x17);

pub const KEY_HINTS: &str = "q quit  m mute  1-5 presets  c cycle  p pause  space regen";

pub struct Status<'a> {
    pub condition: &'a str,
    pub mode: SkyMode,
    pub sound: SoundState,
    pub paused: bool,
}

pub fn badge_lines(status: &Status<'_>) -> Vec<String> {
    let condition = if status.condition.is_empty() {
        "(no condition)"
    } else {
        status.condition
    };
    let mut head = format!(
        "{} | {} | sound: {}",
        condition,
        status.mode.label(),
        status.sound.label()
    );
    if status.paused {
        head.push_str(" | paused");
    }
    vec![head, KEY_HINTS.to_string()]
}

pub fn draw_badge(frame: &mut Frame, lines: &[String], mode: SkyMode, color_mode: ColorMode) {
    let min_w = MARGIN + 2 + 2 * PAD_X + 1;
    let min_h = MARGIN + 2 + 1;
    if frame.width < min_w || frame.height < min_h || lines.is_empty() {
        return;
    }

    let max_content_w = frame.width - MARGIN * 2 - 2 - 2 * PAD_X;
    let max_lines = (frame.height - MARGIN - 2) as usize;
    let content: Vec<Vec<char>> = lines
        .iter()
        .take(max_lines)
        .map(|l| l.chars().take(max_content_w as usize).collect())
        .collect();
    let content_w = content.iter().map(|l| l.len()).max().unwrap_or(0) as u16;

    let box_w = content_w + 2 + 2 * PAD_X;
    let box_h = content.len() as u16 + 2;

    let fg = quantize(accent(mode), color_mode);
    let bg = quantize(BADGE_BG, color_mode);

    for y in 0..box_h {
        for x in 0..box_w {
            let is_top = y == 0;
            let is_bottom = y + 1 == box_h;
            let is_left = x == 0;
            let is_right = x + 1 == box_w;
            let ch = if (is_top || is_bottom) && (is_left || is_right) {
                '+'
            } else if is_top || is_bottom {
                '-'
            } else if is_left || is_right {
                '|'
            } else {
                let ix = (x - 1) as usize;
                content[(y - 1) as usize]
                    .get(ix.wrapping_sub(PAD_X as usize))
                    .copied()
                    .unwrap_or(' ')
            };
            let bold = y == 1 && ch != ' ' && !(is_left || is_right);
            frame.set(MARGIN + x, MARGIN + y, Cell::glyph(ch, fg, bg, bold));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::Track;

    fn status(paused: bool) -> Status<'static> {
        Status {
            condition: "light snow",
            mode: SkyMode::Snow,
            sound: SoundState::Loop(Track::Snow),
            paused,
        }
    }

    #[test]
    fn badge_text_names_condition_mode_and_sound() {
        let lines = badge_lines(&status(false));
        assert_eq!(lines[0], "light snow | snow | sound: snow");
        assert_eq!(lines[1], KEY_HINTS);
        assert!(badge_lines(&status(true))[0].ends_with("| paused"));
    }

    #[test]
    fn badge_is_boxed_in_the_corner() {
        let mut frame = Frame::new(40, 6);
        let lines = vec!["rain".to_string()];
        draw_badge(&mut frame, &lines, SkyMode::Rain, ColorMode::Mono);

        let row = |y: u16| -> String { (0..10).filter_map(|x| frame.get(x, y)).map(|c| c.ch).collect() };
        assert_eq!(row(1), " +------+ ");
        assert_eq!(row(2), " | rain | ");
        assert_eq!(row(3), " +------+ ");
        assert!(frame.get(3, 2).unwrap().bold);
    }

    #[test]
    fn long_lines_are_clipped_and_tiny_frames_skipped() {
        let mut frame = Frame::new(12, 4);
        draw_badge(&mut frame, &[KEY_HINTS.to_string()], SkyMode::Clear, ColorMode::Mono);
        assert_eq!(frame.get(11, 1).map(|c| c.ch), Some(' '));
        assert_eq!(frame.get(10, 1).map(|c| c.ch), Some('+'));

        let mut tiny = Frame::new(3, 2);
        draw_badge(&mut tiny, &[KEY_HINTS.to_string()], SkyMode::Clear, ColorMode::Mono);
        assert!(tiny.get(1, 1).map(|c| c.ch) == Some(' '));
    }
}
