//! Transcript renderer.
//!
//! Maps the ordered message sequence to display rows. Rendering is a pure
//! function of the messages and the available width: the same input always
//! produces the same rows, and each row is keyed by its message's position.

use chatbot_engine::{Message, Role};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Paragraph, Widget},
};

use crate::ui::theme::Styles;

/// Prefix in front of user messages. Bot messages have none.
pub const USER_PREFIX: &str = "You: ";

/// Shown in an empty transcript.
const EMPTY_HINT: &str = "Say something to start the conversation.";

/// One rendered message.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptRow {
    /// Position of the message in the transcript.
    pub key: usize,
    pub role: Role,
    /// Wrapped, styled lines of the row.
    pub lines: Vec<Line<'static>>,
}

/// Render every message into a row, in order.
pub fn transcript_rows(messages: &[Message], width: usize) -> Vec<TranscriptRow> {
    messages
        .iter()
        .enumerate()
        .map(|(key, message)| TranscriptRow {
            key,
            role: message.role(),
            lines: message_lines(message, width),
        })
        .collect()
}

/// Flatten rows into lines with a blank spacer between consecutive rows.
pub fn transcript_lines(messages: &[Message], width: usize) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    for row in transcript_rows(messages, width) {
        if row.key > 0 {
            lines.push(Line::default());
        }
        lines.extend(row.lines);
    }
    lines
}

fn message_lines(message: &Message, width: usize) -> Vec<Line<'static>> {
    match message.role() {
        Role::Bot => wrap(message.text(), width)
            .into_iter()
            .map(|text| Line::from(Span::styled(text, Styles::bot())))
            .collect(),
        Role::User => {
            let labelled = format!("{USER_PREFIX}{}", message.text());
            let mut lines: Vec<Line<'static>> = Vec::new();
            for (i, text) in wrap(&labelled, width).into_iter().enumerate() {
                let line = match text.strip_prefix(USER_PREFIX) {
                    Some(rest) if i == 0 => Line::from(vec![
                        Span::styled(USER_PREFIX, Styles::user_label()),
                        Span::styled(rest.to_string(), Styles::user()),
                    ]),
                    _ => Line::from(Span::styled(text, Styles::user())),
                };
                lines.push(line);
            }
            lines
        }
    }
}

fn wrap(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![text.to_string()];
    }
    textwrap::wrap(text, width)
        .into_iter()
        .map(std::borrow::Cow::into_owned)
        .collect()
}

/// Scrollable view over the transcript, anchored to the latest message.
pub struct TranscriptView<'a> {
    messages: &'a [Message],
    /// Lines scrolled up from the bottom.
    scroll: usize,
    block: Option<Block<'a>>,
}

impl<'a> TranscriptView<'a> {
    pub fn new(messages: &'a [Message]) -> Self {
        Self {
            messages,
            scroll: 0,
            block: None,
        }
    }

    /// Scroll up by `lines` from the latest message.
    #[must_use]
    pub fn scroll(mut self, lines: usize) -> Self {
        self.scroll = lines;
        self
    }

    #[must_use]
    pub fn block(mut self, block: Block<'a>) -> Self {
        self.block = Some(block);
        self
    }
}

/// Largest useful scroll offset for `messages` in a viewport.
pub fn max_scroll(messages: &[Message], width: u16, height: u16) -> usize {
    transcript_lines(messages, usize::from(width)).len().saturating_sub(usize::from(height))
}

impl Widget for TranscriptView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let inner = match &self.block {
            Some(block) => {
                let inner = block.inner(area);
                block.clone().render(area, buf);
                inner
            }
            None => area,
        };
        if inner.width == 0 || inner.height == 0 {
            return;
        }

        if self.messages.is_empty() {
            Paragraph::new(Line::from(Span::styled(EMPTY_HINT, Styles::dim()))).render(inner, buf);
            return;
        }

        let lines = transcript_lines(self.messages, usize::from(inner.width));
        let height = usize::from(inner.height);
        let scroll = self.scroll.min(lines.len().saturating_sub(height));
        let end = lines.len() - scroll;
        let start = end.saturating_sub(height);

        Paragraph::new(lines[start..end].to_vec()).render(inner, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::buffer_to_string;

    fn sample() -> Vec<Message> {
        vec![
            Message::user("hello"),
            Message::bot("hi there, how can I help you today?"),
        ]
    }

    fn render(messages: &[Message], scroll: usize, width: u16, height: u16) -> String {
        let area = Rect::new(0, 0, width, height);
        let mut buf = Buffer::empty(area);
        TranscriptView::new(messages).scroll(scroll).render(area, &mut buf);
        buffer_to_string(&buf)
    }

    #[test]
    fn test_rows_keyed_by_position() {
        let messages = vec![
            Message::user("same"),
            Message::bot("same"),
            Message::user("same"),
        ];
        let rows = transcript_rows(&messages, 40);

        let keys: Vec<usize> = rows.iter().map(|r| r.key).collect();
        assert_eq!(keys, vec![0, 1, 2]);
        assert_eq!(rows[1].role, Role::Bot);
    }

    #[test]
    fn test_only_user_rows_are_prefixed() {
        let rows = transcript_rows(&sample(), 80);

        assert_eq!(rows[0].lines[0].to_string(), "You: hello");
        assert_eq!(rows[1].lines[0].to_string(), "hi there, how can I help you today?");
        assert_eq!(rows[0].lines[0].spans[0].style, Styles::user_label());
        assert_eq!(rows[1].lines[0].spans[0].style, Styles::bot());
    }

    #[test]
    fn test_rendering_is_idempotent() {
        let messages = sample();
        assert_eq!(transcript_rows(&messages, 24), transcript_rows(&messages, 24));
        assert_eq!(render(&messages, 0, 24, 4), render(&messages, 0, 24, 4));
    }

    #[test]
    fn test_empty_transcript_renders_no_rows() {
        assert!(transcript_rows(&[], 40).is_empty());
        assert!(transcript_lines(&[], 40).is_empty());
        assert_eq!(render(&[], 0, 50, 1), EMPTY_HINT);
    }

    #[test]
    fn test_long_user_message_wraps_under_label() {
        let messages = vec![Message::user("one two three four")];
        let lines = transcript_lines(&messages, 12);

        let text: Vec<String> = lines.iter().map(ToString::to_string).collect();
        assert_eq!(text, vec!["You: one two", "three four"]);
    }

    #[test]
    fn test_view_shows_latest_lines() {
        let messages = sample();
        // 4 lines total; a 2-line viewport shows the end of the bot reply.
        assert_eq!(render(&messages, 0, 24, 2), "hi there, how can I help\nyou today?");
        assert_eq!(render(&messages, 2, 24, 2), "You: hello\n");
        // Scrolling past the top clamps.
        assert_eq!(render(&messages, 99, 24, 2), "You: hello\n");
        assert_eq!(max_scroll(&messages, 24, 2), 2);
    }

    #[test]
    fn test_transcript_snapshot() {
        let result = render(&sample(), 0, 24, 4);
        insta::assert_snapshot!(result);
    }
}
