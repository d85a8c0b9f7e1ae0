//! Screen layout for the chatbot TUI.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    text::Span,
    widgets::{Block, Borders},
    Frame,
};

use crate::app::App;
use crate::loading::LoadingIndicator;
use crate::transcript::{max_scroll, TranscriptView};
use crate::ui::theme::Styles;
use crate::ui::widgets::{KeyHint, StatusBar};

const INPUT_PLACEHOLDER: &str = "Type your message...";

/// Areas of the chat screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChatLayout {
    pub pane: Rect,
    pub transcript: Rect,
    pub loading: Rect,
    pub input: Rect,
    pub status: Rect,
}

/// Split the screen: bordered transcript pane, loading line, input box,
/// status bar at the bottom.
pub fn chat_layout(area: Rect) -> (Block<'static>, ChatLayout) {
    let [main, status] = Layout::vertical([Constraint::Min(3), Constraint::Length(1)]).areas(area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Styles::border())
        .title(Span::styled(" Chatbot ", Styles::title()));
    let inner = block.inner(main);

    let [transcript, loading, input] = Layout::vertical([
        Constraint::Min(1),
        Constraint::Length(1),
        Constraint::Length(3),
    ])
    .areas(inner);

    (
        block,
        ChatLayout {
            pane: main,
            transcript,
            loading,
            input,
            status,
        },
    )
}

/// Draw the whole app.
///
/// Clamps `app.scroll` to the transcript that is actually on screen.
pub fn render_app(frame: &mut Frame<'_>, app: &mut App) {
    let (block, areas) = chat_layout(frame.area());
    frame.render_widget(block, areas.pane);

    let messages = app.controller.messages();
    app.scroll = app.scroll.min(max_scroll(
        messages,
        areas.transcript.width,
        areas.transcript.height,
    ));
    frame.render_widget(
        TranscriptView::new(messages).scroll(app.scroll),
        areas.transcript,
    );

    frame.render_widget(
        LoadingIndicator::new(app.controller.is_busy(), app.tick),
        areas.loading,
    );

    let busy = app.controller.is_busy();
    let input_block = Block::default().borders(Borders::ALL).border_style(if busy {
        Styles::border()
    } else {
        Styles::border_active()
    });
    frame.render_widget(
        app.input
            .widget()
            .block(input_block)
            .focused(!busy)
            .placeholder(INPUT_PLACEHOLDER),
        areas.input,
    );

    let right = match (&app.notification, app.controller.generator_name()) {
        (Some(note), _) => note.as_str(),
        (None, Some(name)) => name,
        (None, None) => "model unavailable",
    };
    frame.render_widget(
        StatusBar::new("CHAT")
            .hints(vec![
                KeyHint::new("Enter", "send"),
                KeyHint::new("^L", "clear"),
                KeyHint::new("PgUp", "scroll"),
                KeyHint::new("Esc", "quit"),
            ])
            .right(right),
        areas.status,
    );
}
