//! Test utilities for chatbot-tui snapshot and integration testing.

use crate::app::App;
use async_trait::async_trait;
use chatbot_engine::{
    Controller, GenerateError, GenerateResult, MemorySessionStore, Message, SessionStore,
    TextGenerator, Transcript, DEFAULT_STORAGE_KEY,
};
use ratatui::{backend::TestBackend, buffer::Buffer, Terminal};
use std::sync::Arc;

/// Default terminal width for tests.
pub const TEST_WIDTH: u16 = 60;

/// Default terminal height for tests.
pub const TEST_HEIGHT: u16 = 16;

/// Generator that echoes the prompt back.
pub struct EchoGenerator;

#[async_trait]
impl TextGenerator for EchoGenerator {
    fn name(&self) -> &str {
        "echo-model"
    }

    async fn generate(&self, prompt: &str) -> Result<Option<GenerateResult>, GenerateError> {
        Ok(Some(GenerateResult::Text(format!("echo: {prompt}"))))
    }
}

/// Create a test terminal with the default dimensions.
pub fn create_test_terminal() -> Terminal<TestBackend> {
    create_test_terminal_sized(TEST_WIDTH, TEST_HEIGHT)
}

/// Create a test terminal with custom dimensions.
pub fn create_test_terminal_sized(width: u16, height: u16) -> Terminal<TestBackend> {
    let backend = TestBackend::new(width, height);
    Terminal::new(backend).expect("Failed to create test terminal")
}

/// Create a test app backed by [`EchoGenerator`] and an in-memory store.
pub fn create_test_app() -> App {
    let controller = Controller::new(
        Some(Arc::new(EchoGenerator)),
        Box::new(MemorySessionStore::new()),
    );
    App::new(controller)
}

/// Create a test app without a generation client.
pub fn create_offline_test_app() -> App {
    App::new(Controller::new(None, Box::new(MemorySessionStore::new())))
}

/// Create a test app whose transcript was restored from `messages`.
pub fn create_test_app_with_history(messages: &[Message]) -> App {
    let store = MemorySessionStore::new();
    let json = Transcript::from(messages.to_vec())
        .to_json()
        .expect("serialize history");
    store.set(DEFAULT_STORAGE_KEY, &json).expect("seed store");

    let mut controller = Controller::new(Some(Arc::new(EchoGenerator)), Box::new(store));
    controller.restore();
    App::new(controller)
}

/// Convert a buffer to a string representation for snapshot testing.
///
/// Trailing spaces are trimmed from each line.
pub fn buffer_to_string(buffer: &Buffer) -> String {
    let area = buffer.area;
    let mut result = String::new();

    for y in area.y..area.y + area.height {
        for x in area.x..area.x + area.width {
            let cell = buffer.cell((x, y)).unwrap();
            result.push_str(cell.symbol());
        }
        while result.ends_with(' ') {
            result.pop();
        }
        result.push('\n');
    }

    if result.ends_with('\n') {
        result.pop();
    }

    result
}

/// Draw the whole app into a test terminal and return the screen text.
pub fn render_app_to_string(app: &mut App, width: u16, height: u16) -> String {
    let mut terminal = create_test_terminal_sized(width, height);
    terminal
        .draw(|frame| crate::ui::render_app(frame, app))
        .expect("draw");
    buffer_to_string(terminal.backend().buffer())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::layout::Rect;

    #[test]
    fn test_create_test_terminal() {
        let terminal = create_test_terminal();
        let size = terminal.size().unwrap();
        assert_eq!(size.width, TEST_WIDTH);
        assert_eq!(size.height, TEST_HEIGHT);
    }

    #[test]
    fn test_create_test_app_with_history() {
        let app = create_test_app_with_history(&[Message::user("a"), Message::bot("b")]);
        assert_eq!(app.controller.messages().len(), 2);
        assert!(app.controller.has_generator());
    }

    #[test]
    fn test_buffer_to_string() {
        let area = Rect::new(0, 0, 10, 3);
        let mut buffer = Buffer::empty(area);
        buffer.set_string(0, 0, "Hello", ratatui::style::Style::default());
        buffer.set_string(0, 1, "World", ratatui::style::Style::default());

        assert_eq!(buffer_to_string(&buffer), "Hello\nWorld\n");
    }
}
