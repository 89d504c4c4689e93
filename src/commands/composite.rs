use std::sync::Arc;

use async_trait::async_trait;

use crate::core::command::{
    CommandHandler, CommandSelection, ComposerCommand, SuggestionInfo, TextBuffer,
};
use crate::core::error::CommandError;

pub const MAIN_COMMANDS_ID: &str = "main";

/// Top of the dispatch chain. Children are consulted in order and the first
/// one that recognizes the text wins.
pub struct CommandsHandler {
    handlers: Vec<Arc<dyn CommandHandler>>,
}

impl CommandsHandler {
    #[must_use]
    pub fn new(handlers: Vec<Arc<dyn CommandHandler>>) -> Self {
        Self { handlers }
    }

    #[must_use]
    pub fn handlers(&self) -> &[Arc<dyn CommandHandler>] {
        &self.handlers
    }
}

#[async_trait]
impl CommandHandler for CommandsHandler {
    fn id(&self) -> &str {
        MAIN_COMMANDS_ID
    }

    fn can_handle_command(&self, text: &str, caret_location: usize) -> Option<ComposerCommand> {
        self.handlers
            .iter()
            .find_map(|handler| handler.can_handle_command(text, caret_location))
    }

    fn command_handler(&self, command: &ComposerCommand) -> Option<&dyn CommandHandler> {
        self.handlers
            .iter()
            .find_map(|handler| handler.command_handler(command))
    }

    fn owner(&self, command: &ComposerCommand) -> Option<&dyn CommandHandler> {
        self.handlers.iter().find_map(|handler| handler.owner(command))
    }

    async fn show_suggestions(
        &self,
        command: &ComposerCommand,
    ) -> Result<SuggestionInfo, CommandError> {
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
        let owner = command
            .as_ref()
            .and_then(|pending| self.command_handler(pending));
        match owner {
            Some(owner) => owner.handle_command(buffer, command, selection),
            // Menu picks arrive with no pending command of their own.
            None if matches!(selection, CommandSelection::InstantCommand(_)) => {
                for handler in &self.handlers {
                    handler.handle_command(buffer, command, selection);
                    if command.is_some() {
                        break;
                    }
                }
            }
            None => {}
        }
    }

    fn can_be_executed(&self, command: &ComposerCommand) -> bool {
        self.command_handler(command)
            .is_some_and(|owner| owner.can_be_executed(command))
    }

    async fn execute_on_message_sent(
        &self,
        command: &ComposerCommand,
    ) -> Result<(), CommandError> {
        match self.command_handler(command) {
            Some(owner) => owner.execute_on_message_sent(command).await,
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chat_client::{ChannelId, User};
    use chat_client_mock::{MockChatClient, DEMO_CHANNEL_ID};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::commands::instant::{
        GiphyCommandHandler, InstantCommandsHandler, INSTANT_COMMANDS_ID,
    };
    use crate::commands::mentions::{MentionsCommandHandler, MENTIONS_COMMAND_ID};
    use crate::core::typing_suggester::TypingSuggestion;

    fn chain() -> CommandsHandler {
        let client = Arc::new(MockChatClient::with_demo_channel());
        let mentions = MentionsCommandHandler::new(
            client,
            ChannelId::new(DEMO_CHANNEL_ID),
            "@",
            false,
        );
        let giphy: Arc<dyn CommandHandler> = Arc::new(GiphyCommandHandler::new("/", None));
        CommandsHandler::new(vec![
            Arc::new(mentions),
            Arc::new(InstantCommandsHandler::new("/", vec![giphy])),
        ])
    }

    #[test]
    fn earlier_handlers_take_precedence() {
        let handler = chain();
        assert_eq!(
            handler.can_handle_command("@mar", 4).map(|c| c.id),
            Some(MENTIONS_COMMAND_ID.to_string())
        );
        assert_eq!(
            handler.can_handle_command("/giphy", 6).map(|c| c.id),
            Some("/giphy".to_string())
        );
        assert_eq!(
            handler.can_handle_command("/gi", 3).map(|c| c.id),
            Some(INSTANT_COMMANDS_ID.to_string())
        );
        assert!(handler.can_handle_command("hello", 5).is_none());
    }

    #[tokio::test]
    async fn unknown_commands_are_inert() {
        let handler = chain();
        let unknown = ComposerCommand::new("/nope", TypingSuggestion::empty());

        assert!(handler.command_handler(&unknown).is_none());
        assert!(!handler.can_be_executed(&unknown));
        assert_matches!(
            handler.show_suggestions(&unknown).await,
            Err(CommandError::NoSuggestionsAvailable)
        );
        assert!(handler.execute_on_message_sent(&unknown).await.is_ok());

        let mut buffer = TextBuffer::new("text", 4);
        let mut command = Some(unknown.clone());
        handler.handle_command(
            &mut buffer,
            &mut command,
            &CommandSelection::mention(User::new("u1", None)),
        );
        assert_eq!(buffer, TextBuffer::new("text", 4));
        assert_eq!(command, Some(unknown));
    }

    #[test]
    fn selections_route_to_the_owner() {
        let handler = chain();
        let mut buffer = TextBuffer::with_caret_at_end("ping @ste");
        let mut command = handler.can_handle_command(&buffer.text, buffer.caret);

        handler.handle_command(
            &mut buffer,
            &mut command,
            &CommandSelection::mention(User::new("StefanB", Some("Stefan"))),
        );

        assert_eq!(buffer.text, "ping @Stefan");
        assert!(command.is_none());
    }

    #[test]
    fn menu_pick_without_pending_command_is_adopted() {
        let handler = chain();
        let giphy = GiphyCommandHandler::new("/", None);
        let picked = ComposerCommand::instant(&giphy);
        let mut buffer = TextBuffer::default();
        let mut command = None;

        handler.handle_command(
            &mut buffer,
            &mut command,
            &CommandSelection::instant_command(picked.clone()),
        );

        assert_eq!(command, Some(picked));
        assert!(buffer.is_empty());
    }
}
