use std::sync::Arc;

use async_trait::async_trait;
use chat_client::CommandSpec;

use crate::commands::slash_display_info;
use crate::core::command::{
    CommandDisplayInfo, CommandHandler, CommandSelection, ComposerCommand,
    InstantCommandSelection, SuggestionInfo, TextBuffer,
};
use crate::core::error::CommandError;
use crate::core::graphemes::TextRange;
use crate::core::typing_suggester::{TypingSuggester, TypingSuggestionOptions};
use crate::logging::log_command_detected;

pub const GIPHY_COMMAND_NAME: &str = "giphy";
pub const INSTANT_COMMANDS_ID: &str = "instantCommands";

/// `/giphy [text]`: fires on the bare command; the typed query travels with
/// the sent message.
pub struct GiphyCommandHandler {
    id: String,
    display_info: CommandDisplayInfo,
}

impl GiphyCommandHandler {
    #[must_use]
    pub fn new(command_symbol: &str, spec: Option<&CommandSpec>) -> Self {
        Self {
            id: format!("{command_symbol}{GIPHY_COMMAND_NAME}"),
            display_info: slash_display_info(
                command_symbol,
                GIPHY_COMMAND_NAME,
                "Giphy",
                "[text]",
                spec,
            ),
        }
    }
}

#[async_trait]
impl CommandHandler for GiphyCommandHandler {
    fn id(&self) -> &str {
        &self.id
    }

    fn display_info(&self) -> Option<&CommandDisplayInfo> {
        Some(&self.display_info)
    }

    fn can_handle_command(&self, text: &str, _caret_location: usize) -> Option<ComposerCommand> {
        if text != self.id {
            return None;
        }
        log_command_detected(&self.id, TextRange::default());
        Some(ComposerCommand::instant(self))
    }

    fn command_handler(&self, command: &ComposerCommand) -> Option<&dyn CommandHandler> {
        (command.id == self.id).then_some(self as &dyn CommandHandler)
    }

    async fn show_suggestions(
        &self,
        _command: &ComposerCommand,
    ) -> Result<SuggestionInfo, CommandError> {
        Err(CommandError::NoSuggestionsAvailable)
    }

    fn handle_command(
        &self,
        _buffer: &mut TextBuffer,
        _command: &mut Option<ComposerCommand>,
        _selection: &CommandSelection,
    ) {
    }
}

/// Groups the channel's instant commands. Each child is tried first; a bare
/// trigger at the start of a line falls through to this handler's own menu.
pub struct InstantCommandsHandler {
    typing_suggester: TypingSuggester,
    commands: Vec<Arc<dyn CommandHandler>>,
}

impl InstantCommandsHandler {
    #[must_use]
    pub fn new(command_symbol: &str, commands: Vec<Arc<dyn CommandHandler>>) -> Self {
        Self {
            typing_suggester: TypingSuggester::new(
                TypingSuggestionOptions::new(command_symbol).trigger_only_at_start(true),
            ),
            commands,
        }
    }

    #[must_use]
    pub fn commands(&self) -> &[Arc<dyn CommandHandler>] {
        &self.commands
    }

    /// Children whose name starts with `typed`, case-insensitively.
    fn matching_commands(&self, typed: &str) -> Vec<Arc<dyn CommandHandler>> {
        let symbol = self.typing_suggester.options().symbol.as_str();
        let typed = typed.to_lowercase();
        self.commands
            .iter()
            .filter(|handler| {
                let id = handler.id();
                let name = id.strip_prefix(symbol).unwrap_or(id);
                name.to_lowercase().starts_with(&typed)
            })
            .cloned()
            .collect()
    }
}

#[async_trait]
impl CommandHandler for InstantCommandsHandler {
    fn id(&self) -> &str {
        INSTANT_COMMANDS_ID
    }

    fn can_handle_command(&self, text: &str, caret_location: usize) -> Option<ComposerCommand> {
        if let Some(command) = self
            .commands
            .iter()
            .find_map(|handler| handler.can_handle_command(text, caret_location))
        {
            return Some(command);
        }

        let suggestion = self.typing_suggester.typing_suggestion(text, caret_location)?;
        log_command_detected(INSTANT_COMMANDS_ID, suggestion.location_range);
        Some(ComposerCommand::new(INSTANT_COMMANDS_ID, suggestion))
    }

    fn command_handler(&self, command: &ComposerCommand) -> Option<&dyn CommandHandler> {
        if command.id == INSTANT_COMMANDS_ID {
            return Some(self);
        }
        self.commands
            .iter()
            .find_map(|handler| handler.command_handler(command))
    }

    fn owner(&self, command: &ComposerCommand) -> Option<&dyn CommandHandler> {
        if command.id == INSTANT_COMMANDS_ID {
            return Some(self);
        }
        self.commands.iter().find_map(|handler| handler.owner(command))
    }

    async fn show_suggestions(
        &self,
        command: &ComposerCommand,
    ) -> Result<SuggestionInfo, CommandError> {
        if command.id == INSTANT_COMMANDS_ID {
            let typed = &command.typing_suggestion.text;
            return Ok(SuggestionInfo::instant_commands(self.matching_commands(typed)));
        }
        match self.owner(command) {
            Some(owner) => owner.show_suggestions(command).await,
            None => Err(CommandError::NoSuggestionsAvailable),
        }
    }

    fn handle_command(
        &self,
        buffer: &mut TextBuffer,
        command: &mut Option<ComposerCommand>,
        selection: &CommandSelection,
    ) {
        if let CommandSelection::InstantCommand(InstantCommandSelection { command: picked }) =
            selection
        {
            *command = Some(picked.clone());
            return;
        }

        let owner = command
            .as_ref()
            .filter(|pending| pending.id != INSTANT_COMMANDS_ID)
            .and_then(|pending| self.command_handler(pending));
        if let Some(owner) = owner {
            owner.handle_command(buffer, command, selection);
        }
    }

    fn can_be_executed(&self, command: &ComposerCommand) -> bool {
        if command.id == INSTANT_COMMANDS_ID {
            return false;
        }
        self.command_handler(command)
            .is_some_and(|owner| owner.can_be_executed(command))
    }

    async fn execute_on_message_sent(
        &self,
        command: &ComposerCommand,
    ) -> Result<(), CommandError> {
        if command.id == INSTANT_COMMANDS_ID {
            return Ok(());
        }
        match self.command_handler(command) {
            Some(owner) => owner.execute_on_message_sent(command).await,
            None => Ok(()),
        }
    }
}
