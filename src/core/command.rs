//! Command values and the [`CommandHandler`] contract shared by every handler
//! and composite in a dispatch chain.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chat_client::User;

use crate::core::error::CommandError;
use crate::core::graphemes::{grapheme_len, TextRange};
use crate::core::typing_suggester::TypingSuggestion;

/// Suggestion key for user lists.
pub const MENTIONS_KEY: &str = "mentions";
/// Suggestion key for the instant-command menu.
pub const INSTANT_COMMANDS_KEY: &str = "instantCommands";

/// Presentation metadata of a slash command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandDisplayInfo {
    pub display_name: String,
    pub icon: String,
    /// Usage hint, e.g. `/mute [@username]`.
    pub format: String,
    /// Whether picking the command fires it without a typed sub-command.
    pub is_instant: bool,
}

/// One in-flight command. Identity is the `id`, never the value itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComposerCommand {
    pub id: String,
    pub typing_suggestion: TypingSuggestion,
    pub display_info: Option<CommandDisplayInfo>,
    pub replaces_message_sent: bool,
}

impl ComposerCommand {
    #[must_use]
    pub fn new(id: impl Into<String>, typing_suggestion: TypingSuggestion) -> Self {
        Self {
            id: id.into(),
            typing_suggestion,
            display_info: None,
            replaces_message_sent: false,
        }
    }

    #[must_use]
    pub fn with_display_info(mut self, display_info: Option<CommandDisplayInfo>) -> Self {
        self.display_info = display_info;
        self
    }

    #[must_use]
    pub fn replacing_message_sent(mut self, replaces: bool) -> Self {
        self.replaces_message_sent = replaces;
        self
    }

    #[must_use]
    pub fn with_typing_suggestion(mut self, typing_suggestion: TypingSuggestion) -> Self {
        self.typing_suggestion = typing_suggestion;
        self
    }

    /// The command a host adopts when the user picks `handler` from the
    /// instant-command menu.
    #[must_use]
    pub fn instant(handler: &dyn CommandHandler) -> Self {
        Self {
            id: handler.id().to_string(),
            typing_suggestion: TypingSuggestion::empty(),
            display_info: handler.display_info().cloned(),
            replaces_message_sent: handler.replaces_message_sent(),
        }
    }

    #[must_use]
    pub fn is_instant(&self) -> bool {
        self.display_info
            .as_ref()
            .is_some_and(|info| info.is_instant)
    }

    /// Whether `other` describes the same typing session (same owner, same
    /// typed text at the same range), so a response computed for one still
    /// applies to the other.
    #[must_use]
    pub fn same_session(&self, other: &ComposerCommand) -> bool {
        self.id == other.id && self.typing_suggestion == other.typing_suggestion
    }
}

/// Payload of a suggestion response.
#[derive(Clone)]
pub enum SuggestionPayload {
    Users(Vec<User>),
    InstantCommands(Vec<Arc<dyn CommandHandler>>),
}

impl SuggestionPayload {
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Users(users) => users.len(),
            Self::InstantCommands(commands) => commands.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for SuggestionPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Users(users) => f.debug_tuple("Users").field(users).finish(),
            Self::InstantCommands(commands) => f
                .debug_tuple("InstantCommands")
                .field(&commands.iter().map(|c| c.id()).collect::<Vec<_>>())
                .finish(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SuggestionInfo {
    pub key: String,
    pub value: SuggestionPayload,
}

impl SuggestionInfo {
    #[must_use]
    pub fn users(users: Vec<User>) -> Self {
        Self {
            key: MENTIONS_KEY.to_string(),
            value: SuggestionPayload::Users(users),
        }
    }

    #[must_use]
    pub fn instant_commands(commands: Vec<Arc<dyn CommandHandler>>) -> Self {
        Self {
            key: INSTANT_COMMANDS_KEY.to_string(),
            value: SuggestionPayload::InstantCommands(commands),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MentionSelection {
    pub user: User,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstantCommandSelection {
    pub command: ComposerCommand,
}

/// What the user picked from a suggestion popover.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandSelection {
    Mention(MentionSelection),
    InstantCommand(InstantCommandSelection),
}

impl CommandSelection {
    #[must_use]
    pub fn mention(user: User) -> Self {
        Self::Mention(MentionSelection { user })
    }

    #[must_use]
    pub fn instant_command(command: ComposerCommand) -> Self {
        Self::InstantCommand(InstantCommandSelection { command })
    }
}

/// Composer text and caret, caret counted in graphemes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TextBuffer {
    pub text: String,
    pub caret: usize,
}

impl TextBuffer {
    #[must_use]
    pub fn new(text: impl Into<String>, caret: usize) -> Self {
        Self {
            text: text.into(),
            caret,
        }
    }

    /// Buffer with the caret after the last character.
    #[must_use]
    pub fn with_caret_at_end(text: impl Into<String>) -> Self {
        let text = text.into();
        let caret = grapheme_len(&text);
        Self { text, caret }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        grapheme_len(&self.text)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.caret = 0;
    }

    /// Range from the buffer start to the caret.
    #[must_use]
    pub fn range_to_caret(&self) -> TextRange {
        TextRange::new(0, self.caret)
    }
}

/// One link of a command dispatch chain.
///
/// Detection (`can_handle_command`) and selection (`handle_command`) are
/// synchronous and infallible; only suggestion fetching and send-time side
/// effects are asynchronous and may fail.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    /// Static identity; commands produced by this handler carry it.
    fn id(&self) -> &str;

    fn display_info(&self) -> Option<&CommandDisplayInfo> {
        None
    }

    fn replaces_message_sent(&self) -> bool {
        false
    }

    /// Returns a command when the text under the caret starts one of ours.
    fn can_handle_command(&self, text: &str, caret_location: usize) -> Option<ComposerCommand>;

    /// Returns the handler owning `command`, if it is this one or one nested
    /// in it.
    fn command_handler(&self, command: &ComposerCommand) -> Option<&dyn CommandHandler>;

    /// Same resolution as [`Self::command_handler`] without touching handler
    /// state. Used from suggestion tasks, which may run behind the host.
    fn owner(&self, command: &ComposerCommand) -> Option<&dyn CommandHandler> {
        self.command_handler(command)
    }

    async fn show_suggestions(
        &self,
        command: &ComposerCommand,
    ) -> Result<SuggestionInfo, CommandError>;

    /// Applies a picked suggestion to the buffer and the pending command.
    fn handle_command(
        &self,
        buffer: &mut TextBuffer,
        command: &mut Option<ComposerCommand>,
        selection: &CommandSelection,
    );

    fn can_be_executed(&self, command: &ComposerCommand) -> bool {
        !command.typing_suggestion.text.is_empty()
    }

    /// Send-time side effect. No-op unless the command acts on its own.
    async fn execute_on_message_sent(
        &self,
        _command: &ComposerCommand,
    ) -> Result<(), CommandError> {
        Ok(())
    }
}
