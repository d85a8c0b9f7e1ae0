//! Conversation controller.
//!
//! Owns the transcript and the pending input, sends user text to the
//! generation service and appends the normalized reply. Sending is split in
//! three steps so a UI can run the network call on a background task:
//!
//! 1. [`Controller::begin_send`] marks the controller busy and appends the
//!    user message right away;
//! 2. [`PendingSend::resolve`] calls the service and normalizes the result;
//! 3. [`Controller::finish_send`] appends the bot reply and clears the input.
//!
//! [`Controller::send_message`] runs all three in order.
//!
//! Clearing the transcript while a send is in flight wins: the late reply is
//! dropped when it arrives.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::client::TextGenerator;
use crate::message::{Message, Transcript};
use crate::normalize::normalize;
use crate::session::SessionStore;

/// Reply shown when there is no generation client.
pub const MODEL_UNAVAILABLE: &str = "(model not initialized - check API key and network)";

/// Reply shown when reading the reply text failed after the call succeeded.
pub const SEND_FAILED: &str = "(error sending message)";

/// Default key for the persisted transcript.
pub const DEFAULT_STORAGE_KEY: &str = "chatHistory";

/// Mediates between user input and the generation service.
pub struct Controller {
    transcript: Transcript,
    pending_input: String,
    busy: bool,
    /// Bumped by every clear; replies from an older epoch are dropped.
    epoch: u64,
    /// Epoch the in-flight send started in.
    send_epoch: u64,
    generator: Option<Arc<dyn TextGenerator>>,
    store: Box<dyn SessionStore>,
    storage_key: String,
}

/// A send that has been accepted and is waiting for the service.
pub struct PendingSend {
    prompt: String,
    generator: Option<Arc<dyn TextGenerator>>,
    epoch: u64,
}

/// Result of a resolved send, ready to be applied to the controller.
#[derive(Debug)]
pub struct SendOutcome {
    epoch: u64,
    reply: BotReply,
}

/// What the bot message of a send will say.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BotReply {
    /// Normalized reply text.
    Text(String),
    /// No generation client was available; no call was made.
    Unavailable,
    /// The call itself failed.
    CallFailed(String),
    /// The call succeeded but its text could not be produced.
    SendFailed,
}

impl BotReply {
    /// Text of the bot message for this reply.
    pub fn into_text(self) -> String {
        match self {
            BotReply::Text(text) => text,
            BotReply::Unavailable => MODEL_UNAVAILABLE.to_string(),
            BotReply::CallFailed(reason) => format!("(error calling model): {reason}"),
            BotReply::SendFailed => SEND_FAILED.to_string(),
        }
    }
}

impl SendOutcome {
    pub fn reply(&self) -> &BotReply {
        &self.reply
    }
}

impl PendingSend {
    /// The raw text sent to the service.
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Call the service and normalize its result.
    pub async fn resolve(self) -> SendOutcome {
        let reply = match &self.generator {
            None => BotReply::Unavailable,
            Some(generator) => match generator.generate(&self.prompt).await {
                Err(e) => {
                    warn!("error calling model: {e}");
                    BotReply::CallFailed(e.to_string())
                }
                Ok(result) => match normalize(result).await {
                    Ok(text) => BotReply::Text(text),
                    Err(e) => {
                        warn!("error reading model reply: {e}");
                        BotReply::SendFailed
                    }
                },
            },
        };
        SendOutcome {
            epoch: self.epoch,
            reply,
        }
    }
}

impl Controller {
    /// Create a controller with an empty transcript.
    ///
    /// `generator` is `None` when the client could not be initialized; sends
    /// then answer with [`MODEL_UNAVAILABLE`].
    pub fn new(generator: Option<Arc<dyn TextGenerator>>, store: Box<dyn SessionStore>) -> Self {
        Self {
            transcript: Transcript::new(),
            pending_input: String::new(),
            busy: false,
            epoch: 0,
            send_epoch: 0,
            generator,
            store,
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
        }
    }

    /// Use a different key for the persisted transcript.
    #[must_use]
    pub fn with_storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = key.into();
        self
    }

    /// Replace the transcript with the persisted one, if any.
    ///
    /// Unreadable or corrupt data is logged and leaves the transcript empty.
    /// Returns the number of restored messages.
    pub fn restore(&mut self) -> usize {
        let saved = match self.store.get(&self.storage_key) {
            Ok(Some(saved)) => saved,
            Ok(None) => return 0,
            Err(e) => {
                warn!("could not load chat history from session store: {e}");
                return 0;
            }
        };
        match Transcript::from_json(&saved) {
            Ok(transcript) => {
                self.transcript = transcript;
                debug!(messages = self.transcript.len(), "restored chat history");
                self.transcript.len()
            }
            Err(e) => {
                warn!("ignoring unreadable chat history: {e}");
                0
            }
        }
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn messages(&self) -> &[Message] {
        self.transcript.messages()
    }

    /// Whether a send is in flight.
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Whether a generation client is available.
    pub fn has_generator(&self) -> bool {
        self.generator.is_some()
    }

    /// Name of the generation client, if any.
    pub fn generator_name(&self) -> Option<&str> {
        self.generator.as_deref().map(|g| g.name())
    }

    pub fn pending_input(&self) -> &str {
        &self.pending_input
    }

    /// Replace the pending input.
    pub fn set_pending_input(&mut self, text: impl Into<String>) {
        self.pending_input = text.into();
    }

    /// Start sending the pending input.
    ///
    /// Returns `None` without touching anything when the input is blank or a
    /// send is already in flight. Otherwise marks the controller busy and
    /// appends the user message before the service is contacted.
    pub fn begin_send(&mut self) -> Option<PendingSend> {
        if self.pending_input.trim().is_empty() {
            return None;
        }
        if self.busy {
            debug!("send ignored while a request is in flight");
            return None;
        }

        self.busy = true;
        self.send_epoch = self.epoch;
        let prompt = self.pending_input.clone();
        self.append(Message::user(prompt.clone()));

        Some(PendingSend {
            prompt,
            generator: self.generator.clone(),
            epoch: self.epoch,
        })
    }

    /// Apply a resolved send.
    ///
    /// Appends the bot message unless the transcript was cleared after the
    /// send began. Always clears the pending input and the busy flag.
    /// Returns whether the bot message was appended.
    pub fn finish_send(&mut self, outcome: SendOutcome) -> bool {
        let appended = if outcome.epoch == self.epoch {
            self.append(Message::bot(outcome.reply.into_text()));
            true
        } else {
            debug!("dropping reply for a cleared transcript");
            false
        };

        self.pending_input.clear();
        self.busy = false;
        appended
    }

    /// Give up on the in-flight send when its task died without an outcome.
    ///
    /// Appends [`SEND_FAILED`] (unless the transcript was cleared since) and
    /// resets the pending input and busy flag. No-op when nothing is in flight.
    pub fn fail_send(&mut self) {
        if !self.busy {
            return;
        }
        if self.send_epoch == self.epoch {
            self.append(Message::bot(SEND_FAILED));
        }
        self.pending_input.clear();
        self.busy = false;
    }

    /// Send the pending input and wait for the reply.
    pub async fn send_message(&mut self) {
        if let Some(pending) = self.begin_send() {
            let outcome = pending.resolve().await;
            self.finish_send(outcome);
        }
    }

    /// Set the pending input to `text` and send it.
    pub async fn send_text(&mut self, text: impl Into<String>) {
        self.set_pending_input(text);
        self.send_message().await;
    }

    /// Empty the transcript and purge the persisted copy.
    pub fn clear_transcript(&mut self) {
        self.transcript.clear();
        self.epoch += 1;
        self.purge();
    }

    /// Purge the persisted transcript at the end of the session.
    pub fn teardown(&mut self) {
        self.purge();
    }

    fn append(&mut self, message: Message) {
        self.transcript.push(message);
        self.persist();
    }

    fn persist(&self) {
        let json = match self.transcript.to_json() {
            Ok(json) => json,
            Err(e) => {
                warn!("could not serialize chat history: {e}");
                return;
            }
        };
        if let Err(e) = self.store.set(&self.storage_key, &json) {
            warn!("could not save chat history to session store: {e}");
        }
    }

    fn purge(&self) {
        if let Err(e) = self.store.remove(&self.storage_key) {
            warn!("could not remove chat history from session store: {e}");
        }
    }
}
