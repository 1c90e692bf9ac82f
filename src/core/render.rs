//! # Output Renderer
//!
//! Converts command text carrying ANSI SGR escape sequences into styled lines
//! and keeps them in addressable, mutable output groups.
//!
//! Text handed to `print` is expected to be markup-safe already: arguments are
//! escaped by the parser, and commands that print literal `<`, `>` or `&` pass
//! them through `escape_markup` first. The renderer only translates styles.

use crate::{
    constants::{ERROR_STYLE, RESET_STYLE},
    core::color::{color_from_sgr_digit, color_name},
    models::{AnsiColor, GroupId, OutputKind, SessionId},
};
use std::collections::HashMap;
use tokio::sync::mpsc;

// --- STYLED LINES ---

/// The SGR attributes in effect for a run of text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Style {
    /// Foreground color and whether it is the bright variant.
    pub fg: Option<(AnsiColor, bool)>,
    /// Background color and whether it is the bright variant.
    pub bg: Option<(AnsiColor, bool)>,
    /// SGR 1.
    pub bold: bool,
    /// SGR 2.
    pub dim: bool,
    /// SGR 3.
    pub italic: bool,
    /// SGR 4.
    pub underline: bool,
}

impl Style {
    fn is_plain(&self) -> bool {
        *self == Self::default()
    }

    fn classes(&self) -> Vec<String> {
        let mut classes = Vec::new();
        if self.bold {
            classes.push("ansi-bold".to_string());
        }
        if self.dim {
            classes.push("ansi-dim".to_string());
        }
        if self.italic {
            classes.push("ansi-italic".to_string());
        }
        if self.underline {
            classes.push("ansi-underline".to_string());
        }
        if let Some((color, bright)) = self.fg {
            let prefix = if bright { "ansi-bright-" } else { "ansi-" };
            classes.push(format!("{}{}", prefix, color_name(color)));
        }
        if let Some((color, bright)) = self.bg {
            let prefix = if bright { "ansi-bg-bright-" } else { "ansi-bg-" };
            classes.push(format!("{}{}", prefix, color_name(color)));
        }
        classes
    }

    /// Applies the parameters of one `ESC[...m` sequence.
    fn apply_sgr(&mut self, params: &[u16]) {
        // `ESC[m` is a reset.
        if params.is_empty() {
            *self = Self::default();
            return;
        }
        let mut iter = params.iter().copied();
        while let Some(code) = iter.next() {
            match code {
                0 => *self = Self::default(),
                1 => self.bold = true,
                2 => self.dim = true,
                3 => self.italic = true,
                4 => self.underline = true,
                22 => {
                    self.bold = false;
                    self.dim = false;
                }
                23 => self.italic = false,
                24 => self.underline = false,
                30..=37 => self.fg = color_from_sgr_digit(code - 30).map(|c| (c, false)),
                39 => self.fg = None,
                40..=47 => self.bg = color_from_sgr_digit(code - 40).map(|c| (c, false)),
                49 => self.bg = None,
                90..=97 => self.fg = color_from_sgr_digit(code - 90).map(|c| (c, true)),
                100..=107 => self.bg = color_from_sgr_digit(code - 100).map(|c| (c, true)),
                // Extended colors are not representable; skip their arguments.
                38 | 48 => match iter.next() {
                    Some(5) => {
                        iter.next();
                    }
                    Some(2) => {
                        iter.nth(2);
                    }
                    _ => {}
                },
                _ => log::trace!("Ignoring unsupported SGR code {}", code),
            }
        }
    }
}

/// A run of text with one style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// Markup-safe text, without escape sequences.
    pub text: String,
    /// The style of the whole run.
    pub style: Style,
}

/// One rendered console line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedLine {
    /// Styled runs, in order. Adjacent runs differ in style.
    pub segments: Vec<Segment>,
}

impl RenderedLine {
    /// The line as console markup: styled runs become `<span class="...">`.
    pub fn markup(&self) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            if segment.style.is_plain() {
                out.push_str(&segment.text);
            } else {
                out.push_str(&format!(
                    "<span class=\"{}\">{}</span>",
                    segment.style.classes().join(" "),
                    segment.text
                ));
            }
        }
        out
    }

    /// The line's text without any styling.
    pub fn plain(&self) -> String {
        self.segments.iter().map(|s| s.text.as_str()).collect()
    }
}

/// Converts one line of text with embedded SGR sequences into styled segments.
/// Escape sequences other than SGR are dropped.
pub fn render_line(text: &str) -> RenderedLine {
    let mut segments: Vec<Segment> = Vec::new();
    let mut style = Style::default();
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\x1b' {
            push_char(&mut segments, style, c);
            continue;
        }
        if chars.next_if_eq(&'[').is_none() {
            // A lone ESC, or a non-CSI escape: drop the ESC and its selector.
            chars.next();
            continue;
        }
        let mut body = String::new();
        let mut final_byte = None;
        for next in chars.by_ref() {
            if ('\x40'..='\x7e').contains(&next) {
                final_byte = Some(next);
                break;
            }
            body.push(next);
        }
        if final_byte == Some('m') {
            let params: Vec<u16> = body
                .split(';')
                .filter(|p| !p.is_empty())
                .map(|p| p.parse().unwrap_or(0))
                .collect();
            style.apply_sgr(&params);
        }
    }

    RenderedLine { segments }
}

fn push_char(segments: &mut Vec<Segment>, style: Style, c: char) {
    match segments.last_mut() {
        Some(last) if last.style == style => last.text.push(c),
        _ => segments.push(Segment {
            text: c.to_string(),
            style,
        }),
    }
}

/// Splits text on newlines and renders each line. Error text gets the error
/// color on every line, so each line stays styled on its own.
pub fn render_text(text: &str, kind: OutputKind) -> Vec<RenderedLine> {
    let body = text.strip_suffix('\n').unwrap_or(text);
    body.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .map(|line| match kind {
            OutputKind::Output => render_line(line),
            OutputKind::Error => render_line(&format!("{}{}{}", ERROR_STYLE, line, RESET_STYLE)),
        })
        .collect()
}

// --- OUTPUT GROUPS ---

/// One addressable print: the lines it produced and how they render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputGroup {
    /// Unique within its buffer.
    pub id: GroupId,
    /// Output or error.
    pub kind: OutputKind,
    /// The rendered lines.
    pub lines: Vec<RenderedLine>,
}

/// What `OutputBuffer::update` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The group was re-rendered with new content.
    Changed,
    /// The new content equals the old; nothing happened.
    Unchanged,
    /// No group has that id.
    Missing,
}

/// An ordered list of output groups with its own id allocator.
#[derive(Debug, Default)]
pub struct OutputBuffer {
    groups: Vec<OutputGroup>,
    next_id: u64,
}

impl OutputBuffer {
    /// An empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Renders `text` into a new group and returns its id.
    pub fn print(&mut self, text: &str, kind: OutputKind) -> GroupId {
        self.push_lines(kind, render_text(text, kind))
    }

    /// Appends already rendered lines as a new group.
    pub fn push_lines(&mut self, kind: OutputKind, lines: Vec<RenderedLine>) -> GroupId {
        self.next_id += 1;
        let id = GroupId(self.next_id);
        self.groups.push(OutputGroup { id, kind, lines });
        id
    }

    /// Re-renders a group in place. Repeating the same content is a no-op.
    pub fn update(&mut self, id: GroupId, text: &str) -> UpdateOutcome {
        let Some(group) = self.groups.iter_mut().find(|g| g.id == id) else {
            return UpdateOutcome::Missing;
        };
        let lines = render_text(text, group.kind);
        if group.lines == lines {
            return UpdateOutcome::Unchanged;
        }
        group.lines = lines;
        UpdateOutcome::Changed
    }

    /// Removes a group. Returns whether it existed.
    pub fn delete(&mut self, id: GroupId) -> bool {
        let before = self.groups.len();
        self.groups.retain(|g| g.id != id);
        self.groups.len() != before
    }

    /// Removes every group. Ids keep counting.
    pub fn clear(&mut self) {
        self.groups.clear();
    }

    /// Looks a group up by id.
    pub fn group(&self, id: GroupId) -> Option<&OutputGroup> {
        self.groups.iter().find(|g| g.id == id)
    }

    /// Groups in print order.
    pub fn groups(&self) -> &[OutputGroup] {
        &self.groups
    }

    /// Every line as markup.
    pub fn markup_lines(&self) -> Vec<String> {
        self.lines().map(RenderedLine::markup).collect()
    }

    /// Every line as plain text.
    pub fn plain_lines(&self) -> Vec<String> {
        self.lines().map(RenderedLine::plain).collect()
    }

    fn lines(&self) -> impl Iterator<Item = &RenderedLine> {
        self.groups.iter().flat_map(|g| g.lines.iter())
    }
}

// --- CONSOLE ---

/// A change to a session's console, published for frontends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputChange {
    /// A new group was printed.
    Appended {
        /// The new group.
        group: GroupId,
        /// Output or error.
        kind: OutputKind,
        /// Its rendered lines.
        lines: Vec<RenderedLine>,
    },
    /// A group was re-rendered in place.
    Updated {
        /// The changed group.
        group: GroupId,
        /// Its new lines.
        lines: Vec<RenderedLine>,
    },
    /// A group was removed.
    Deleted {
        /// The removed group.
        group: GroupId,
    },
    /// The whole console was emptied.
    Cleared,
}

/// A change to one session's console.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputEvent {
    /// The session whose console changed.
    pub session: SessionId,
    /// What changed.
    pub change: OutputChange,
}

/// The live console output of every session.
#[derive(Debug, Default)]
pub struct ConsoleOutput {
    buffers: HashMap<SessionId, OutputBuffer>,
    events: Option<mpsc::UnboundedSender<OutputEvent>>,
}

impl ConsoleOutput {
    /// A console with no sessions and no subscriber.
    pub fn new() -> Self {
        Self::default()
    }

    /// Routes future changes to a new receiver, replacing any previous one.
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<OutputEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.events = Some(tx);
        rx
    }

    /// Starts an empty buffer for a session. Output for sessions that were never
    /// opened, or were closed since, is dropped.
    pub fn open(&mut self, session: SessionId) {
        self.buffers.entry(session).or_default();
    }

    /// Prints `text` as a new group. `None` when the session is not open.
    pub fn print(&mut self, text: &str, session: SessionId) -> Option<GroupId> {
        self.append(text, OutputKind::Output, session)
    }

    /// Like `print`, styled as an error.
    pub fn print_error(&mut self, text: &str, session: SessionId) -> Option<GroupId> {
        self.append(text, OutputKind::Error, session)
    }

    /// Re-renders a group and publishes the change if there is one.
    pub fn update_message(&mut self, group: GroupId, text: &str, session: SessionId) -> bool {
        let Some(buffer) = self.buffers.get_mut(&session) else {
            return false;
        };
        match buffer.update(group, text) {
            UpdateOutcome::Changed => {
                let lines = buffer
                    .group(group)
                    .map(|g| g.lines.clone())
                    .unwrap_or_default();
                self.publish(session, OutputChange::Updated { group, lines });
                true
            }
            UpdateOutcome::Unchanged => true,
            UpdateOutcome::Missing => false,
        }
    }

    /// Removes a group. Returns whether it existed.
    pub fn delete_message(&mut self, group: GroupId, session: SessionId) -> bool {
        let deleted = self
            .buffers
            .get_mut(&session)
            .is_some_and(|buffer| buffer.delete(group));
        if deleted {
            self.publish(session, OutputChange::Deleted { group });
        }
        deleted
    }

    /// Empties the session's console.
    pub fn clear(&mut self, session: SessionId) {
        if let Some(buffer) = self.buffers.get_mut(&session) {
            buffer.clear();
            self.publish(session, OutputChange::Cleared);
        }
    }

    /// The session's buffer, if it is open.
    pub fn buffer(&self, session: SessionId) -> Option<&OutputBuffer> {
        self.buffers.get(&session)
    }

    /// Re-emits a group captured elsewhere (a job buffer) under a fresh id.
    pub fn replay(&mut self, group: &OutputGroup, session: SessionId) -> Option<GroupId> {
        let buffer = self.buffers.get_mut(&session)?;
        let id = buffer.push_lines(group.kind, group.lines.clone());
        self.publish(
            session,
            OutputChange::Appended {
                group: id,
                kind: group.kind,
                lines: group.lines.clone(),
            },
        );
        Some(id)
    }

    /// Drops a session's history entirely.
    pub fn close(&mut self, session: SessionId) {
        self.buffers.remove(&session);
    }

    fn append(&mut self, text: &str, kind: OutputKind, session: SessionId) -> Option<GroupId> {
        let Some(buffer) = self.buffers.get_mut(&session) else {
            log::debug!("Dropping output for closed session {}", session);
            return None;
        };
        let group = buffer.print(text, kind);
        let lines = buffer
            .group(group)
            .map(|g| g.lines.clone())
            .unwrap_or_default();
        self.publish(session, OutputChange::Appended { group, kind, lines });
        Some(group)
    }

    fn publish(&mut self, session: SessionId, change: OutputChange) {
        let Some(tx) = &self.events else {
            return;
        };
        if tx.send(OutputEvent { session, change }).is_err() {
            log::debug!("Output subscriber went away; dropping further events.");
            self.events = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_renders_without_spans() {
        let line = render_line("hello world");
        assert_eq!(line.markup(), "hello world");
        assert_eq!(line.segments.len(), 1);
    }

    #[test]
    fn test_sgr_sequences_become_spans() {
        let line = render_line("ok \x1b[1;32mPASS\x1b[0m done");
        assert_eq!(
            line.markup(),
            "ok <span class=\"ansi-bold ansi-green\">PASS</span> done"
        );
        assert_eq!(line.plain(), "ok PASS done");
    }

    #[test]
    fn test_bright_and_background_colors() {
        let line = render_line("\x1b[91;44mX");
        assert_eq!(
            line.markup(),
            "<span class=\"ansi-bright-red ansi-bg-blue\">X</span>"
        );
    }

    #[test]
    fn test_non_sgr_escapes_are_dropped() {
        let line = render_line("a\x1b[2Kb\x1b[38;5;200mc\x1b[39md");
        assert_eq!(line.plain(), "abcd");
        assert_eq!(line.markup(), "abcd");
    }

    #[test]
    fn test_render_text_splits_lines_and_styles_errors() {
        let lines = render_text("one\ntwo\n", OutputKind::Output);
        assert_eq!(lines.len(), 2);

        let errors = render_text("bad\nworse", OutputKind::Error);
        assert_eq!(errors.len(), 2);
        for line in &errors {
            assert!(line.markup().starts_with("<span class=\"ansi-red\">"));
        }
    }

    #[test]
    fn test_buffer_update_is_idempotent() {
        let mut buffer = OutputBuffer::new();
        let id = buffer.print("[          ] 0%", OutputKind::Output);
        assert_eq!(buffer.update(id, "[#####     ] 50%"), UpdateOutcome::Changed);
        assert_eq!(buffer.update(id, "[#####     ] 50%"), UpdateOutcome::Unchanged);
        assert_eq!(buffer.plain_lines(), vec!["[#####     ] 50%"]);
        assert_eq!(buffer.update(GroupId(99), "x"), UpdateOutcome::Missing);
    }

    #[test]
    fn test_buffer_delete_and_clear() {
        let mut buffer = OutputBuffer::new();
        let first = buffer.print("first", OutputKind::Output);
        let second = buffer.print("second\nthird", OutputKind::Output);
        assert_ne!(first, second);
        assert_eq!(buffer.plain_lines().len(), 3);

        assert!(buffer.delete(first));
        assert!(!buffer.delete(first));
        assert_eq!(buffer.plain_lines(), vec!["second", "third"]);

        buffer.clear();
        assert!(buffer.groups().is_empty());
    }

    #[test]
    fn test_console_publishes_only_real_changes() {
        let mut console = ConsoleOutput::new();
        let mut events = console.subscribe();
        let session = SessionId::new();
        console.open(session);

        let id = console.print("50%", session).unwrap();
        assert!(console.update_message(id, "50%", session));
        assert!(console.update_message(id, "60%", session));
        assert!(console.delete_message(id, session));
        console.clear(session);

        let mut kinds = Vec::new();
        while let Ok(event) = events.try_recv() {
            kinds.push(match event.change {
                OutputChange::Appended { .. } => "appended",
                OutputChange::Updated { .. } => "updated",
                OutputChange::Deleted { .. } => "deleted",
                OutputChange::Cleared => "cleared",
            });
        }
        assert_eq!(kinds, vec!["appended", "updated", "deleted", "cleared"]);
    }

    #[test]
    fn test_closed_sessions_keep_no_buffer() {
        let mut console = ConsoleOutput::new();
        let mut events = console.subscribe();
        let session = SessionId::new();
        console.open(session);
        console.print("hello", session);
        console.close(session);

        assert_eq!(console.print_error("late", session), None);
        let group = OutputGroup {
            id: GroupId(1),
            kind: OutputKind::Output,
            lines: vec![render_line("replayed")],
        };
        assert_eq!(console.replay(&group, session), None);
        console.clear(session);

        assert!(console.buffer(session).is_none());
        assert!(matches!(
            events.try_recv().map(|e| e.change),
            Ok(OutputChange::Appended { .. })
        ));
        assert!(events.try_recv().is_err());
    }
}
