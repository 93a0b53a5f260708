// Copyright (c) 2026 rezky_nightky

use std::io::{stdout, Result, Stdout, Write};
use std::time::Duration;

use crossterm::{
    cursor, event,
    style::{
        Attribute, Color, Print, ResetColor, SetAttribute, SetBackgroundColor, SetForegroundColor,
    },
    terminal, ExecutableCommand, QueueableCommand,
};

use crate::cell::Cell;
use crate::frame::Frame;

#[derive(Default)]
struct Pen {
    fg: Option<Option<Color>>,
    bg: Option<Option<Color>>,
    bold: Option<bool>,
}

impl Pen {
    fn apply(&mut self, out: &mut Stdout, cell: &Cell) -> Result<()> {
        if self.fg != Some(cell.fg) {
            out.queue(SetForegroundColor(cell.fg.unwrap_or(Color::Reset)))?;
            self.fg = Some(cell.fg);
        }
        if self.bg != Some(cell.bg) {
            out.queue(SetBackgroundColor(cell.bg.unwrap_or(Color::Reset)))?;
            self.bg = Some(cell.bg);
        }
        if self.bold != Some(cell.bold) {
            out.queue(SetAttribute(if cell.bold {
                Attribute::Bold
            } else {
                Attribute::NormalIntensity
            }))?;
            self.bold = Some(cell.bold);
        }
        Ok(())
    }
}

/// Raw-mode alternate screen that writes only what changed between frames.
/// Dropping it restores the terminal.
pub struct Terminal {
    stdout: Stdout,
    shown: Vec<Cell>,
    shown_size: (u16, u16),
    run: String,
}

impl Terminal {
    pub fn new() -> Result<Self> {
        let mut out = stdout();
        terminal::enable_raw_mode()?;
        let init: Result<()> = (|| {
            out.execute(terminal::EnterAlternateScreen)?;
            out.execute(cursor::Hide)?;
            let _ = out.execute(terminal::DisableLineWrap);
            out.execute(SetAttribute(Attribute::Reset))?;
            out.execute(ResetColor)?;
            out.execute(terminal::Clear(terminal::ClearType::All))?;
            out.flush()
        })();
        if let Err(e) = init {
            restore(&mut out);
            return Err(e);
        }
        Ok(Self {
            stdout: out,
            shown: Vec::new(),
            shown_size: (0, 0),
            run: String::with_capacity(64),
        })
    }

    pub fn size(&self) -> Result<(u16, u16)> {
        terminal::size()
    }

    pub fn poll_event(timeout: Duration) -> Result<bool> {
        event::poll(timeout)
    }

    pub fn read_event() -> Result<event::Event> {
        event::read()
    }

    pub fn draw(&mut self, frame: &mut Frame) -> Result<bool> {
        let size = (frame.width, frame.height);
        let resized = size != self.shown_size;
        let total = frame.width as usize * frame.height as usize;

        if resized {
            self.stdout.queue(terminal::Clear(terminal::ClearType::All))?;
            self.shown = vec![Cell::default(); total];
            self.shown_size = size;
        } else if !frame.has_changes() {
            return Ok(false);
        }

        let mut pen = Pen::default();
        if resized || frame.is_dirty_all() {
            let all: Vec<usize> = (0..total).collect();
            self.write_runs(frame, &mut pen, &all, true)?;
        } else {
            let mut dirty = frame.dirty_indices().to_vec();
            dirty.sort_unstable();
            self.write_runs(frame, &mut pen, &dirty, false)?;
        }

        self.stdout.queue(SetAttribute(Attribute::Reset))?;
        self.stdout.queue(ResetColor)?;
        self.stdout.flush()?;
        frame.clear_dirty();
        Ok(true)
    }

    fn write_runs(
        &mut self,
        frame: &Frame,
        pen: &mut Pen,
        indices: &[usize],
        force: bool,
    ) -> Result<()> {
        let width = frame.width as usize;
        let mut i = 0;
        while i < indices.len() {
            let start = indices[i];
            let cell = frame.cell_at_index(start);
            if !force && self.shown[start] == cell {
                i += 1;
                continue;
            }
            self.shown[start] = cell;
            self.run.clear();
            self.run.push(cell.ch);

            let row_end = (start / width + 1) * width;
            let mut prev = start;
            let mut j = i + 1;
            while j < indices.len() {
                let idx = indices[j];
                if idx != prev + 1 || idx >= row_end {
                    break;
                }
                let next = frame.cell_at_index(idx);
                if next.fg != cell.fg || next.bg != cell.bg || next.bold != cell.bold {
                    break;
                }
                if !force && self.shown[idx] == next {
                    break;
                }
                self.shown[idx] = next;
                self.run.push(next.ch);
                prev = idx;
                j += 1;
            }

            let x = (start % width) as u16;
            let y = (start / width) as u16;
            self.stdout.queue(cursor::MoveTo(x, y))?;
            pen.apply(&mut self.stdout, &cell)?;
            self.stdout.queue(Print(self.run.as_str()))?;
            i = j;
        }
        Ok(())
    }
}

impl Drop for Terminal {
    fn drop(&mut self) {
        restore(&mut self.stdout);
    }
}

fn restore(out: &mut Stdout) {
    let _ = out.execute(SetAttribute(Attribute::Reset));
    let _ = out.execute(ResetColor);
    let _ = out.execute(cursor::Show);
    let _ = out.execute(terminal::EnableLineWrap);
    let _ = out.execute(terminal::LeaveAlternateScreen);
    let _ = terminal::disable_raw_mode();
    let _ = out.flush();
}

pub fn restore_terminal_best_effort() {
    restore(&mut stdout());
}
