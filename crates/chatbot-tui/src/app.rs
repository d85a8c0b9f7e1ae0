//! Application state and update logic for the chatbot TUI.

use crate::event::Action;
use crate::ui::widgets::TextInputState;
use chatbot_engine::{Controller, PendingSend, SendOutcome};

/// Lines moved by one PageUp/PageDown.
const SCROLL_STEP: usize = 5;

/// Ticks a notification stays visible (~2s at the default tick rate).
const NOTIFICATION_TICKS: usize = 20;

/// Application state.
pub struct App {
    /// Whether the app should quit.
    pub should_quit: bool,

    /// Conversation state and the generation service.
    pub controller: Controller,

    /// Text being typed.
    pub input: TextInputState,

    /// Transcript lines scrolled up from the latest message.
    pub scroll: usize,

    /// Animation tick counter.
    pub tick: usize,

    /// Transient message shown in the status bar.
    pub notification: Option<String>,
    notification_ttl: usize,
}

impl App {
    /// Create a new app around a controller.
    pub fn new(controller: Controller) -> Self {
        let mut input = TextInputState::new();
        input.insert_str(controller.pending_input());
        Self {
            should_quit: false,
            controller,
            input,
            scroll: 0,
            tick: 0,
            notification: None,
            notification_ttl: 0,
        }
    }

    /// Apply an action.
    ///
    /// Returns the accepted send, if the action started one. The caller
    /// resolves it and hands the outcome back to [`App::apply_outcome`].
    pub fn handle_action(&mut self, action: Action) -> Option<PendingSend> {
        match action {
            Action::Quit => {
                self.should_quit = true;
                None
            }
            Action::Send => self.send(),
            Action::Clear => {
                self.controller.clear_transcript();
                self.scroll = 0;
                self.notify("Transcript cleared");
                None
            }
            Action::ScrollUp => {
                self.scroll = self.scroll.saturating_add(SCROLL_STEP);
                None
            }
            Action::ScrollDown => {
                self.scroll = self.scroll.saturating_sub(SCROLL_STEP);
                None
            }
            Action::None => None,
            edit => {
                // The input mirrors the request while it is in flight.
                if !self.controller.is_busy() {
                    self.edit(edit);
                    self.controller.set_pending_input(self.input.content());
                }
                None
            }
        }
    }

    fn send(&mut self) -> Option<PendingSend> {
        self.controller.set_pending_input(self.input.content());
        let pending = self.controller.begin_send()?;
        self.input.remember();
        self.scroll = 0;
        Some(pending)
    }

    fn edit(&mut self, action: Action) {
        match action {
            Action::Insert(c) => self.input.insert(c),
            Action::Backspace => self.input.backspace(),
            Action::Delete => self.input.delete(),
            Action::Left => self.input.move_left(),
            Action::Right => self.input.move_right(),
            Action::Home => self.input.move_home(),
            Action::End => self.input.move_end(),
            Action::HistoryPrev => self.input.history_prev(),
            Action::HistoryNext => self.input.history_next(),
            _ => {}
        }
    }

    /// Apply a resolved send.
    pub fn apply_outcome(&mut self, outcome: SendOutcome) {
        self.controller.finish_send(outcome);
        self.input.clear();
        self.scroll = 0;
    }

    /// The task resolving a send died without an outcome.
    pub fn handle_send_failure(&mut self) {
        self.controller.fail_send();
        self.input.clear();
        self.scroll = 0;
    }

    /// Show a transient notification.
    pub fn notify(&mut self, message: impl Into<String>) {
        self.notification = Some(message.into());
        self.notification_ttl = NOTIFICATION_TICKS;
    }

    /// Advance the tick counter (for animations).
    pub fn tick(&mut self) {
        self.tick = self.tick.wrapping_add(1);

        if self.notification_ttl > 0 {
            self.notification_ttl -= 1;
            if self.notification_ttl == 0 {
                self.notification = None;
            }
        }
    }
}
