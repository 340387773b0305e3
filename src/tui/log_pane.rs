//! In-TUI log pane.
//!
//! While the terminal is in raw mode, tracing output goes into a shared
//! ring of lines instead of stderr. The pane drains that ring every tick
//! and is toggled with Ctrl+D.

use std::collections::VecDeque;
use std::io::Write;
use std::sync::{Arc, Mutex};

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};
use tracing_subscriber::fmt::MakeWriter;

/// Lines held by the shared ring before the oldest are dropped.
const RING_CAPACITY: usize = 256;

/// Lines kept in the pane for scrolling.
const HISTORY_LIMIT: usize = 800;

/// Shared line sink handed to `tracing_subscriber::fmt().with_writer(..)`.
#[derive(Clone, Default)]
pub struct LogBuffer {
    lines: Arc<Mutex<VecDeque<String>>>,
}

impl LogBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, line: String) {
        let mut lines = self.lines.lock().unwrap_or_else(|e| e.into_inner());
        while lines.len() >= RING_CAPACITY {
            lines.pop_front();
        }
        lines.push_back(line);
    }

    fn take_all(&self) -> Vec<String> {
        let mut lines = self.lines.lock().unwrap_or_else(|e| e.into_inner());
        lines.drain(..).collect()
    }
}

/// Accumulates bytes and pushes each completed line into the buffer.
pub struct LineWriter {
    sink: LogBuffer,
    partial: Vec<u8>,
}

impl Write for LineWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.partial.extend_from_slice(buf);
        while let Some(pos) = self.partial.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.partial.drain(..=pos).collect();
            let text = String::from_utf8_lossy(&line[..pos]).trim_end().to_string();
            self.sink.push(text);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        if !self.partial.is_empty() {
            let text = String::from_utf8_lossy(&self.partial).into_owned();
            self.partial.clear();
            self.sink.push(text);
        }
        Ok(())
    }
}

impl Drop for LineWriter {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}

impl<'a> MakeWriter<'a> for LogBuffer {
    type Writer = LineWriter;

    fn make_writer(&'a self) -> Self::Writer {
        LineWriter {
            sink: self.clone(),
            partial: Vec::new(),
        }
    }
}

/// Pane state: history pulled from the buffer, visibility and scroll.
pub struct LogPane {
    source: LogBuffer,
    history: Vec<String>,
    pub visible: bool,
    /// Lines scrolled back from the newest (0 = follow tail).
    offset: usize,
}

impl LogPane {
    pub fn new(source: LogBuffer) -> Self {
        Self {
            source,
            history: Vec::new(),
            visible: false,
            offset: 0,
        }
    }

    /// Pull pending lines out of the shared buffer.
    pub fn refresh(&mut self) {
        self.history.extend(self.source.take_all());
        if self.history.len() > HISTORY_LIMIT {
            let excess = self.history.len() - HISTORY_LIMIT;
            self.history.drain(..excess);
            self.offset = self.offset.saturating_sub(excess);
        }
    }

    pub fn toggle(&mut self) {
        self.visible = !self.visible;
        self.offset = 0;
    }

    pub fn scroll_back(&mut self, n: usize) {
        let max = self.history.len().saturating_sub(1);
        self.offset = (self.offset + n).min(max);
    }

    pub fn scroll_forward(&mut self, n: usize) {
        self.offset = self.offset.saturating_sub(n);
    }
}

pub fn render(area: Rect, buf: &mut Buffer, pane: &LogPane) {
    let title = if pane.offset > 0 {
        format!(" Log (-{}) ", pane.offset)
    } else {
        " Log ".to_string()
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            title,
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ));
    let inner = block.inner(area);
    block.render(area, buf);
    if inner.height == 0 {
        return;
    }

    let end = pane.history.len().saturating_sub(pane.offset);
    let start = end.saturating_sub(inner.height as usize);
    let lines: Vec<Line> = pane.history[start..end]
        .iter()
        .map(|l| Line::from(Span::styled(l.clone(), level_style(l))))
        .collect();
    Paragraph::new(lines).render(inner, buf);
}

fn level_style(line: &str) -> Style {
    let color = if line.contains("ERROR") {
        Color::Red
    } else if line.contains("WARN") {
        Color::Yellow
    } else if line.contains("DEBUG") || line.contains("TRACE") {
        Color::DarkGray
    } else {
        Color::Gray
    };
    Style::default().fg(color)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tracing_subscriber::fmt::MakeWriter;

    #[test]
    fn test_writer_splits_lines() {
        let buffer = LogBuffer::new();
        {
            let mut w = buffer.make_writer();
            write!(w, " WARN malformed frame\n INFO conn").unwrap();
            assert_eq!(buffer.take_all(), vec![" WARN malformed frame"]);
        }
        // Dropping the writer flushes the unterminated tail.
        assert_eq!(buffer.take_all(), vec![" INFO conn"]);
    }

    #[test]
    fn test_ring_drops_oldest() {
        let buffer = LogBuffer::new();
        for i in 0..RING_CAPACITY + 4 {
            buffer.push(format!("{i}"));
        }
        let lines = buffer.take_all();
        assert_eq!(lines.len(), RING_CAPACITY);
        assert_eq!(lines[0], "4");
    }

    #[test]
    fn test_pane_refresh_and_scroll() {
        let buffer = LogBuffer::new();
        let mut pane = LogPane::new(buffer.clone());
        for i in 0..10 {
            buffer.push(format!("line {i}"));
        }
        pane.refresh();
        assert_eq!(pane.history.len(), 10);

        pane.scroll_back(50);
        assert_eq!(pane.offset, 9);
        pane.scroll_forward(4);
        assert_eq!(pane.offset, 5);

        pane.toggle();
        assert!(pane.visible);
        assert_eq!(pane.offset, 0);
    }
}
