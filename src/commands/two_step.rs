//! Slash commands that need a user argument before they can run (`/mute @user`).

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chat_client::{ChannelId, ChatClient, ClientError, CommandSpec, User};
use unicode_segmentation::UnicodeSegmentation;

use crate::commands::mentions::MentionsCommandHandler;
use crate::commands::slash_display_info;
use crate::core::command::{
    CommandDisplayInfo, CommandHandler, CommandSelection, ComposerCommand, MentionSelection,
    SuggestionInfo, TextBuffer,
};
use crate::core::error::CommandError;
use crate::core::graphemes::{grapheme_len, is_whitespace, replace_range, TextRange};
use crate::core::typing_suggester::TypingSuggestion;
use crate::logging::{log_command_detected, log_selected_user_cleared};

pub const MUTE_COMMAND_NAME: &str = "mute";
pub const UNMUTE_COMMAND_NAME: &str = "unmute";

/// The API call a two-step command performs once a user is picked.
#[async_trait]
pub trait TwoStepAction: Send + Sync + 'static {
    async fn perform(&self, client: &dyn ChatClient, user: &User) -> Result<(), ClientError>;
}

pub struct MuteAction;

#[async_trait]
impl TwoStepAction for MuteAction {
    async fn perform(&self, client: &dyn ChatClient, user: &User) -> Result<(), ClientError> {
        client.mute_user(&user.id).await
    }
}

pub struct UnmuteAction;

#[async_trait]
impl TwoStepAction for UnmuteAction {
    async fn perform(&self, client: &dyn ChatClient, user: &User) -> Result<(), ClientError> {
        client.unmute_user(&user.id).await
    }
}

/// Shared machinery of commands that take one mentioned user.
///
/// The command fires on its exact name, then reuses an embedded mentions
/// handler to suggest users. Picking one fills `selected_user`, which makes
/// the command executable until the mention text is edited away.
pub struct TwoStepMentionCommand<A> {
    id: String,
    display_info: CommandDisplayInfo,
    mention_symbol: String,
    client: Arc<dyn ChatClient>,
    mentions: MentionsCommandHandler,
    selected_user: Mutex<Option<User>>,
    action: A,
}

pub type MuteCommandHandler = TwoStepMentionCommand<MuteAction>;
pub type UnmuteCommandHandler = TwoStepMentionCommand<UnmuteAction>;

impl MuteCommandHandler {
    #[must_use]
    pub fn new(
        client: Arc<dyn ChatClient>,
        cid: ChannelId,
        command_symbol: &str,
        mention_symbol: &str,
        spec: Option<&CommandSpec>,
    ) -> Self {
        let display_info =
            slash_display_info(command_symbol, MUTE_COMMAND_NAME, "Mute", "[@username]", spec);
        TwoStepMentionCommand::with_action(
            client,
            cid,
            format!("{command_symbol}{MUTE_COMMAND_NAME}"),
            display_info,
            mention_symbol,
            MuteAction,
        )
    }
}

impl UnmuteCommandHandler {
    #[must_use]
    pub fn new(
        client: Arc<dyn ChatClient>,
        cid: ChannelId,
        command_symbol: &str,
        mention_symbol: &str,
        spec: Option<&CommandSpec>,
    ) -> Self {
        let display_info = slash_display_info(
            command_symbol,
            UNMUTE_COMMAND_NAME,
            "Unmute",
            "[@username]",
            spec,
        );
        TwoStepMentionCommand::with_action(
            client,
            cid,
            format!("{command_symbol}{UNMUTE_COMMAND_NAME}"),
            display_info,
            mention_symbol,
            UnmuteAction,
        )
    }
}

impl<A: TwoStepAction> TwoStepMentionCommand<A> {
    #[must_use]
    pub fn with_action(
        client: Arc<dyn ChatClient>,
        cid: ChannelId,
        id: String,
        display_info: CommandDisplayInfo,
        mention_symbol: &str,
        action: A,
    ) -> Self {
        Self {
            id,
            display_info,
            mention_symbol: mention_symbol.to_string(),
            mentions: MentionsCommandHandler::new(client.clone(), cid, mention_symbol, false),
            client,
            selected_user: Mutex::new(None),
            action,
        }
    }

    fn selected(&self) -> MutexGuard<'_, Option<User>> {
        self.selected_user
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    #[must_use]
    pub fn selected_user(&self) -> Option<User> {
        self.selected().clone()
    }

    fn mention_for(&self, user: &User) -> String {
        format!("{}{}", self.mention_symbol, user.mention_text())
    }

    /// The command's typed text with the mention symbol and surrounding
    /// whitespace removed, as the embedded mentions handler expects it.
    fn mention_query(&self, suggestion: &TypingSuggestion) -> TypingSuggestion {
        let graphemes: Vec<&str> = suggestion.text.graphemes(true).collect();
        let leading = graphemes
            .iter()
            .take_while(|g| is_whitespace(g) || **g == self.mention_symbol)
            .count();
        let query = graphemes[leading..].concat().trim_end().to_string();
        let location = suggestion.location_range.location + leading;
        let length = grapheme_len(&query);
        TypingSuggestion::new(query, TextRange::new(location, length))
    }
}

#[async_trait]
impl<A: TwoStepAction> CommandHandler for TwoStepMentionCommand<A> {
    fn id(&self) -> &str {
        &self.id
    }

    fn display_info(&self) -> Option<&CommandDisplayInfo> {
        Some(&self.display_info)
    }

    fn replaces_message_sent(&self) -> bool {
        true
    }

    fn can_handle_command(&self, text: &str, _caret_location: usize) -> Option<ComposerCommand> {
        if text != self.id {
            return None;
        }
        // A freshly typed command starts a new session.
        self.selected().take();
        log_command_detected(&self.id, TextRange::default());
        Some(ComposerCommand::instant(self))
    }

    fn command_handler(&self, command: &ComposerCommand) -> Option<&dyn CommandHandler> {
        if command.id != self.id {
            return None;
        }
        let mut selected = self.selected();
        let edited = selected
            .as_ref()
            .is_some_and(|user| command.typing_suggestion.text != self.mention_for(user));
        if edited {
            *selected = None;
            log_selected_user_cleared(&self.id);
        }
        Some(self)
    }

    fn owner(&self, command: &ComposerCommand) -> Option<&dyn CommandHandler> {
        (command.id == self.id).then_some(self as &dyn CommandHandler)
    }

    async fn show_suggestions(
        &self,
        command: &ComposerCommand,
    ) -> Result<SuggestionInfo, CommandError> {
        if self.selected().is_some() {
            return Ok(SuggestionInfo::users(Vec::new()));
        }
        let query = command
            .clone()
            .with_typing_suggestion(self.mention_query(&command.typing_suggestion));
        self.mentions.show_suggestions(&query).await
    }

    fn handle_command(
        &self,
        buffer: &mut TextBuffer,
        command: &mut Option<ComposerCommand>,
        selection: &CommandSelection,
    ) {
        let CommandSelection::Mention(MentionSelection { user }) = selection else {
            return;
        };
        let Some(pending) = command.as_mut() else {
            return;
        };

        let len = buffer.len();
        let stored = pending.typing_suggestion.location_range;
        let location = stored.location.min(len);
        let range = TextRange::new(location, stored.length.min(len - location));

        let mention = self.mention_for(user);
        let Some(text) = replace_range(&buffer.text, range, &mention) else {
            return;
        };
        let mention_len = grapheme_len(&mention);

        buffer.text = text;
        buffer.caret = (buffer.caret + mention_len)
            .saturating_sub(range.length)
            .min(buffer.len());
        pending.typing_suggestion =
            TypingSuggestion::new(mention, TextRange::new(range.location, mention_len));
        *self.selected() = Some(user.clone());
    }

    fn can_be_executed(&self, _command: &ComposerCommand) -> bool {
        self.selected().is_some()
    }

    async fn execute_on_message_sent(
        &self,
        _command: &ComposerCommand,
    ) -> Result<(), CommandError> {
        // Cleared up front so a failed call cannot leave a stuck selection.
        let user = self.selected().take();
        let Some(user) = user else {
            return Err(CommandError::NoUserSelected {
                command: self.id.clone(),
            });
        };
        self.action
            .perform(self.client.as_ref(), &user)
            .await
            .map_err(|error| CommandError::execution(&self.id, error))
    }
}
