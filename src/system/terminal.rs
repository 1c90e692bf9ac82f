// src/system/terminal.rs

//! Renders console output events on an ANSI terminal.
//!
//! Markup entities are decoded back to plain characters here, and segment
//! styles are re-applied with `colored`. The most recently printed group can be
//! redrawn in place, which is what progress bars rely on.

use crate::core::color::to_terminal_color;
use crate::core::commons::unescape_markup;
use crate::core::render::{OutputChange, OutputEvent, RenderedLine, Segment};
use crate::models::{GroupId, SessionId};
use colored::Colorize;
use std::io::{self, Write};

const CLEAR_TO_END: &str = "\x1b[J";
const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

/// Writes one session's output events to a terminal.
#[derive(Debug)]
pub struct Terminal {
    session: SessionId,
    /// Color and cursor movement. Off, every change is appended as new lines.
    ansi: bool,
    /// The last group written and how many lines it occupies.
    last: Option<(GroupId, usize)>,
}

impl Terminal {
    /// A terminal for `session`, with or without ANSI styling.
    pub fn new(session: SessionId, ansi: bool) -> Self {
        Self {
            session,
            ansi,
            last: None,
        }
    }

    /// Writes one output event. Events of other sessions are ignored.
    pub fn apply(&mut self, event: &OutputEvent, out: &mut impl Write) -> io::Result<()> {
        if event.session != self.session {
            return Ok(());
        }
        match &event.change {
            OutputChange::Appended { group, lines, .. } => {
                self.write_lines(lines, out)?;
                self.last = Some((*group, lines.len()));
            }
            OutputChange::Updated { group, lines } => {
                if let Some(height) = self.redrawable(*group) {
                    self.erase(height, out)?;
                }
                self.write_lines(lines, out)?;
                self.last = Some((*group, lines.len()));
            }
            OutputChange::Deleted { group } => {
                if let Some(height) = self.redrawable(*group) {
                    self.erase(height, out)?;
                    self.last = None;
                }
            }
            OutputChange::Cleared => {
                if self.ansi {
                    write!(out, "{}", CLEAR_SCREEN)?;
                }
                self.last = None;
            }
        }
        out.flush()
    }

    /// Forgets the last group, e.g. after the prompt was printed below it.
    pub fn detach(&mut self) {
        self.last = None;
    }

    fn redrawable(&self, group: GroupId) -> Option<usize> {
        match self.last {
            Some((last, height)) if self.ansi && last == group => Some(height),
            _ => None,
        }
    }

    fn erase(&self, height: usize, out: &mut impl Write) -> io::Result<()> {
        if height > 0 {
            write!(out, "\x1b[{}A", height)?;
        }
        write!(out, "\r{}", CLEAR_TO_END)
    }

    fn write_lines(&self, lines: &[RenderedLine], out: &mut impl Write) -> io::Result<()> {
        for line in lines {
            writeln!(out, "{}", self.format_line(line))?;
        }
        Ok(())
    }

    /// One line as terminal text: styled with ANSI, or plain with entities decoded.
    pub fn format_line(&self, line: &RenderedLine) -> String {
        if self.ansi {
            line.segments.iter().map(style_segment).collect()
        } else {
            unescape_markup(&line.plain())
        }
    }
}

fn style_segment(segment: &Segment) -> String {
    let text = unescape_markup(&segment.text);
    let style = segment.style;
    let mut styled = text.normal();
    if let Some((color, bright)) = style.fg {
        styled = styled.color(to_terminal_color(color, bright));
    }
    if let Some((color, bright)) = style.bg {
        styled = styled.on_color(to_terminal_color(color, bright));
    }
    if style.bold {
        styled = styled.bold();
    }
    if style.dim {
        styled = styled.dimmed();
    }
    if style.italic {
        styled = styled.italic();
    }
    if style.underline {
        styled = styled.underline();
    }
    styled.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::render::render_text;
    use crate::models::OutputKind;

    fn appended(session: SessionId, group: u64, text: &str) -> OutputEvent {
        OutputEvent {
            session,
            change: OutputChange::Appended {
                group: GroupId(group),
                kind: OutputKind::Output,
                lines: render_text(text, OutputKind::Output),
            },
        }
    }

    fn updated(session: SessionId, group: u64, text: &str) -> OutputEvent {
        OutputEvent {
            session,
            change: OutputChange::Updated {
                group: GroupId(group),
                lines: render_text(text, OutputKind::Output),
            },
        }
    }

    #[test]
    fn test_plain_mode_unescapes_and_appends() {
        let session = SessionId::new();
        let mut terminal = Terminal::new(session, false);
        let mut out = Vec::new();

        terminal
            .apply(&appended(session, 1, "a &lt;b&gt; \x1b[1mc"), &mut out)
            .unwrap();
        terminal.apply(&updated(session, 1, "d"), &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "a <b> c\nd\n");
    }

    #[test]
    fn test_ansi_mode_redraws_last_group_in_place() {
        let session = SessionId::new();
        let mut terminal = Terminal::new(session, true);
        let mut out = Vec::new();

        terminal.apply(&appended(session, 1, "10%"), &mut out).unwrap();
        out.clear();
        terminal.apply(&updated(session, 1, "20%"), &mut out).unwrap();
        let written = String::from_utf8(out).unwrap();
        assert!(written.starts_with("\x1b[1A\r\x1b[J"));
        assert!(written.contains("20%"));
    }

    #[test]
    fn test_other_sessions_are_ignored() {
        let mut terminal = Terminal::new(SessionId::new(), false);
        let mut out = Vec::new();
        terminal
            .apply(&appended(SessionId::new(), 1, "elsewhere"), &mut out)
            .unwrap();
        assert!(out.is_empty());
    }
}
