//! Binds a command chain to a live composer buffer.
//!
//! The session owns the text, the pending command, and at most one in-flight
//! suggestion task. Every request bumps a generation counter; a response is
//! delivered only if its command still describes the live typing session.

use std::sync::Arc;
use std::time::Duration;

use chat_client::{ChannelId, ChatClient};
use tokio::task::JoinHandle;

use crate::commands::factory::{CommandsConfig, DefaultCommandsConfig};
use crate::config::ComposerConfig;
use crate::core::command::{
    CommandHandler, CommandSelection, ComposerCommand, SuggestionInfo, TextBuffer,
};
use crate::core::error::CommandError;
use crate::core::graphemes::slice;
use crate::core::typing_suggester::TypingSuggestion;
use crate::logging::{
    log_command_cleared, log_command_executed, log_command_failed, log_suggestions_discarded,
    log_suggestions_failed, log_suggestions_ready,
};

/// A suggestion response that is still current.
#[derive(Debug, Clone)]
pub struct Suggestions {
    pub command: ComposerCommand,
    pub info: SuggestionInfo,
    pub generation: u64,
}

/// Result of [`ComposerSession::send`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// Text the host should post as a message.
    Message { text: String },
    /// The command ran in place of a message.
    CommandExecuted { id: String },
}

struct InFlight {
    generation: u64,
    command: ComposerCommand,
    task: JoinHandle<Result<SuggestionInfo, CommandError>>,
}

pub struct ComposerSession {
    handler: Arc<dyn CommandHandler>,
    debounce: Duration,
    buffer: TextBuffer,
    command: Option<ComposerCommand>,
    in_flight: Option<InFlight>,
    generation: u64,
}

impl ComposerSession {
    #[must_use]
    pub fn new(handler: Arc<dyn CommandHandler>, debounce: Duration) -> Self {
        Self {
            handler,
            debounce,
            buffer: TextBuffer::default(),
            command: None,
            in_flight: None,
            generation: 0,
        }
    }

    /// Session over the default command chain of `cid`.
    #[must_use]
    pub fn for_channel(
        client: Arc<dyn ChatClient>,
        cid: ChannelId,
        config: &ComposerConfig,
    ) -> Self {
        let handler = DefaultCommandsConfig::from(config).make_commands_handler(client, cid);
        Self::new(Arc::new(handler), config.suggestion_debounce)
    }

    #[must_use]
    pub fn buffer(&self) -> &TextBuffer {
        &self.buffer
    }

    #[must_use]
    pub fn command(&self) -> Option<&ComposerCommand> {
        self.command.as_ref()
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Feeds an edit from the host. `caret` is clamped to the text.
    pub fn update_text(&mut self, text: impl Into<String>, caret: usize) {
        let mut buffer = TextBuffer::new(text, 0);
        buffer.caret = caret.min(buffer.len());
        self.buffer = buffer;

        let previous = self.command.take();
        self.command = match previous.clone() {
            Some(pending) if pending.is_instant() => self.retype_instant(pending),
            _ => {
                let detected = self
                    .handler
                    .can_handle_command(&self.buffer.text, self.buffer.caret);
                if detected.as_ref().is_some_and(ComposerCommand::is_instant) {
                    self.buffer.clear();
                }
                detected
            }
        };

        if let (Some(previous), None) = (&previous, &self.command) {
            log_command_cleared(&previous.id, "no_longer_typed");
        }
        let same = match (&previous, &self.command) {
            (Some(previous), Some(current)) => previous.same_session(current),
            (None, None) => true,
            _ => false,
        };
        if !same {
            self.abort_in_flight();
        }
    }

    /// With an instant command pending, the whole buffer up to the caret is
    /// its argument. The owner gets a chance to invalidate its own state.
    fn retype_instant(&self, pending: ComposerCommand) -> Option<ComposerCommand> {
        let range = self.buffer.range_to_caret();
        let typed = slice(&self.buffer.text, range).unwrap_or(&self.buffer.text);
        let updated =
            pending.with_typing_suggestion(TypingSuggestion::new(typed.to_string(), range));
        self.handler.command_handler(&updated)?;
        Some(updated)
    }

    /// Schedules a debounced suggestion fetch for the pending command,
    /// replacing any earlier one. Returns the request's generation.
    pub fn request_suggestions(&mut self) -> Option<u64> {
        self.abort_in_flight();
        let command = self.command.clone()?;

        self.generation += 1;
        let generation = self.generation;
        let handler = Arc::clone(&self.handler);
        let debounce = self.debounce;
        let task_command = command.clone();
        let task = tokio::spawn(async move {
            if !debounce.is_zero() {
                tokio::time::sleep(debounce).await;
            }
            handler.show_suggestions(&task_command).await
        });

        self.in_flight = Some(InFlight {
            generation,
            command,
            task,
        });
        Some(generation)
    }

    /// Waits for the in-flight request. Cancelled or stale responses and
    /// "nothing to show" outcomes resolve to `Ok(None)`.
    pub async fn next_suggestions(&mut self) -> Result<Option<Suggestions>, CommandError> {
        let Some(InFlight {
            generation,
            command,
            task,
        }) = self.in_flight.take()
        else {
            return Ok(None);
        };

        let Ok(result) = task.await else {
            log_suggestions_discarded(&command.id, generation);
            return Ok(None);
        };

        let current = generation == self.generation
            && self
                .command
                .as_ref()
                .is_some_and(|live| live.same_session(&command));
        if !current {
            log_suggestions_discarded(&command.id, generation);
            return Ok(None);
        }

        match result {
            Ok(info) => {
                log_suggestions_ready(&command.id, &info.key, info.value.len(), generation);
                Ok(Some(Suggestions {
                    command,
                    info,
                    generation,
                }))
            }
            Err(error) => {
                log_suggestions_failed(&command.id, &error);
                if error.is_benign() {
                    Ok(None)
                } else {
                    Err(error)
                }
            }
        }
    }

    /// Applies a picked suggestion. Adopting an instant command empties the
    /// buffer; the host shows the command as a chip instead.
    pub fn select(&mut self, selection: &CommandSelection) {
        self.abort_in_flight();
        self.handler
            .handle_command(&mut self.buffer, &mut self.command, selection);
        if matches!(selection, CommandSelection::InstantCommand(_)) && self.command.is_some() {
            self.buffer.clear();
        }
    }

    /// Drops the pending command, leaving the text alone.
    pub fn clear_command(&mut self) {
        self.abort_in_flight();
        if let Some(command) = self.command.take() {
            log_command_cleared(&command.id, "cancelled");
        }
    }

    #[must_use]
    pub fn can_send(&self) -> bool {
        match &self.command {
            Some(command) => self.handler.can_be_executed(command),
            None => !self.buffer.text.trim().is_empty(),
        }
    }

    /// Runs the pending command's send-time effect and reports what the host
    /// should post. Callers gate this on [`Self::can_send`].
    pub async fn send(&mut self) -> Result<SendOutcome, CommandError> {
        self.abort_in_flight();
        let Some(command) = self.command.clone() else {
            let text = std::mem::take(&mut self.buffer).text;
            return Ok(SendOutcome::Message { text });
        };

        if let Err(error) = self.handler.execute_on_message_sent(&command).await {
            log_command_failed(&command.id, &error);
            self.command = None;
            return Err(error);
        }

        let outcome = if command.replaces_message_sent {
            log_command_executed(&command.id);
            SendOutcome::CommandExecuted { id: command.id }
        } else if command.is_instant() {
            SendOutcome::Message {
                text: format!("{} {}", command.id, self.buffer.text),
            }
        } else {
            SendOutcome::Message {
                text: self.buffer.text.clone(),
            }
        };
        self.buffer.clear();
        self.command = None;
        Ok(outcome)
    }

    fn abort_in_flight(&mut self) {
        if let Some(in_flight) = &self.in_flight {
            in_flight.task.abort();
        }
    }
}

impl Drop for ComposerSession {
    fn drop(&mut self) {
        self.abort_in_flight();
    }
}
