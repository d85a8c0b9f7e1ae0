//! Loading indicator shown while a reply is in flight.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

use crate::ui::theme::{spinner_frame, Styles};

const LABEL: &str = "Thinking...";

/// Spinner line visible only while busy.
#[derive(Debug, Clone, Copy)]
pub struct LoadingIndicator {
    busy: bool,
    tick: usize,
}

impl LoadingIndicator {
    pub fn new(busy: bool, tick: usize) -> Self {
        Self { busy, tick }
    }
}

impl Widget for LoadingIndicator {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if !self.busy || area.height == 0 {
            return;
        }
        let line = Line::from(vec![
            Span::styled(spinner_frame(self.tick), Styles::active()),
            Span::styled(format!(" {LABEL}"), Styles::dim()),
        ]);
        Paragraph::new(line).render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::buffer_to_string;

    fn render(indicator: LoadingIndicator) -> String {
        let area = Rect::new(0, 0, 20, 1);
        let mut buf = Buffer::empty(area);
        indicator.render(area, &mut buf);
        buffer_to_string(&buf)
    }

    #[test]
    fn test_hidden_when_idle() {
        assert_eq!(render(LoadingIndicator::new(false, 3)), "");
    }

    #[test]
    fn test_spinner_advances_with_tick() {
        assert_eq!(render(LoadingIndicator::new(true, 0)), "| Thinking...");
        assert_eq!(render(LoadingIndicator::new(true, 1)), "/ Thinking...");
    }
}
