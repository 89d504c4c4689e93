use std::sync::Arc;

use async_trait::async_trait;
use chat_client::{ChannelId, ChatClient, User};

use crate::core::command::{
    CommandHandler, CommandSelection, ComposerCommand, MentionSelection, SuggestionInfo,
    TextBuffer,
};
use crate::core::error::CommandError;
use crate::core::graphemes::{grapheme_len, replace_range, slice, TextRange};
use crate::core::typing_suggester::{TypingSuggester, TypingSuggestionOptions};
use crate::core::user_search::search_users;
use crate::logging::log_command_detected;

pub const MENTIONS_COMMAND_ID: &str = "mentions";

/// Resolves `@name` tokens to ranked users and splices the picked user's
/// mention text back into the buffer.
pub struct MentionsCommandHandler {
    client: Arc<dyn ChatClient>,
    cid: ChannelId,
    typing_suggester: TypingSuggester,
    mention_all_app_users: bool,
}

impl MentionsCommandHandler {
    #[must_use]
    pub fn new(
        client: Arc<dyn ChatClient>,
        cid: ChannelId,
        command_symbol: &str,
        mention_all_app_users: bool,
    ) -> Self {
        Self {
            client,
            cid,
            typing_suggester: TypingSuggester::new(TypingSuggestionOptions::new(command_symbol)),
            mention_all_app_users,
        }
    }

    #[must_use]
    pub fn symbol(&self) -> &str {
        &self.typing_suggester.options().symbol
    }

    /// Ranked candidates for `query`, never including the signed-in user.
    pub async fn mention_candidates(&self, query: &str) -> Result<Vec<User>, CommandError> {
        let current_user_id = self
            .client
            .current_user_id()
            .ok_or_else(|| CommandError::missing("current user id"))?;

        let candidates = if self.mention_all_app_users {
            let term = (!query.is_empty()).then_some(query);
            self.client
                .search_users(term)
                .await
                .map_err(CommandError::Search)?
        } else {
            self.client
                .channel(&self.cid)
                .ok_or_else(|| CommandError::missing("channel"))?
                .known_users()
        };

        Ok(search_users(&candidates, query, Some(&current_user_id)))
    }

    /// Range to overwrite and the typed text it holds. A stored range that no
    /// longer matches the live buffer is re-derived at the current caret.
    fn live_range(
        &self,
        buffer: &TextBuffer,
        command: &ComposerCommand,
    ) -> Option<(TextRange, usize)> {
        let suggestion = &command.typing_suggestion;
        let range = suggestion.location_range;
        if slice(&buffer.text, range) == Some(suggestion.text.as_str()) {
            return Some((range, grapheme_len(&suggestion.text)));
        }

        let fresh = self
            .typing_suggester
            .typing_suggestion(&buffer.text, buffer.caret)?;
        Some((fresh.location_range, fresh.location_range.length))
    }
}

#[async_trait]
impl CommandHandler for MentionsCommandHandler {
    fn id(&self) -> &str {
        MENTIONS_COMMAND_ID
    }

    fn can_handle_command(&self, text: &str, caret_location: usize) -> Option<ComposerCommand> {
        let suggestion = self.typing_suggester.typing_suggestion(text, caret_location)?;
        log_command_detected(MENTIONS_COMMAND_ID, suggestion.location_range);
        Some(ComposerCommand::new(MENTIONS_COMMAND_ID, suggestion))
    }

    fn command_handler(&self, command: &ComposerCommand) -> Option<&dyn CommandHandler> {
        (command.id == MENTIONS_COMMAND_ID).then_some(self as &dyn CommandHandler)
    }

    async fn show_suggestions(
        &self,
        command: &ComposerCommand,
    ) -> Result<SuggestionInfo, CommandError> {
        let users = self
            .mention_candidates(&command.typing_suggestion.text)
            .await?;
        Ok(SuggestionInfo::users(users))
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
        let Some(pending) = command.as_ref() else {
            return;
        };
        let Some((range, typed_len)) = self.live_range(buffer, pending) else {
            return;
        };

        // Only the range after the trigger is replaced; the `@` stays.
        let mention_text = user.mention_text();
        let Some(text) = replace_range(&buffer.text, range, mention_text) else {
            return;
        };

        buffer.text = text;
        buffer.caret = (buffer.caret + grapheme_len(mention_text))
            .saturating_sub(typed_len)
            .min(buffer.len());
        *command = None;
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chat_client::ChannelSnapshot;
    use chat_client_mock::{MockCall, MockChatClient, DEMO_CHANNEL_ID};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::core::command::SuggestionPayload;
    use crate::core::typing_suggester::TypingSuggestion;

    fn handler(client: Arc<MockChatClient>, all_users: bool) -> MentionsCommandHandler {
        MentionsCommandHandler::new(client, ChannelId::new(DEMO_CHANNEL_ID), "@", all_users)
    }

    fn user_ids(info: &SuggestionInfo) -> Vec<String> {
        match &info.value {
            SuggestionPayload::Users(users) => users.iter().map(|u| u.id.clone()).collect(),
            other => panic!("expected users, got {other:?}"),
        }
    }

    #[test]
    fn detects_mentions_anywhere_after_whitespace() {
        let handler = handler(Arc::new(MockChatClient::with_demo_channel()), false);
        let command = handler
            .can_handle_command("Hey @Mar", 8)
            .expect("mention command");
        assert_eq!(command.id, MENTIONS_COMMAND_ID);
        assert_eq!(command.typing_suggestion.text, "Mar");
        assert!(!command.replaces_message_sent);
        assert!(command.display_info.is_none());
        assert!(handler.can_handle_command("Hey Mar", 7).is_none());
    }

    #[tokio::test]
    async fn local_suggestions_rank_members_and_skip_current_user() {
        let client = Arc::new(MockChatClient::with_demo_channel());
        let handler = handler(client.clone(), false);
        let command = handler.can_handle_command("@mar", 4).expect("command");

        let info = handler.show_suggestions(&command).await.expect("suggestions");
        assert_eq!(info.key, "mentions");
        assert_eq!(user_ids(&info), vec!["MarMit", "MartinM"]);

        let command = handler.can_handle_command("@", 1).expect("command");
        let info = handler.show_suggestions(&command).await.expect("suggestions");
        assert!(!user_ids(&info).contains(&"current".to_string()));
        assert_eq!(info.value.len(), 5);
        assert!(client.calls().is_empty(), "local mode must not search remotely");
    }

    #[tokio::test]
    async fn app_wide_mode_searches_the_directory() {
        let client = Arc::new(MockChatClient::with_demo_channel());
        let handler = handler(client.clone(), true);
        let command = handler.can_handle_command("@ste", 4).expect("command");

        let info = handler.show_suggestions(&command).await.expect("suggestions");
        assert_eq!(user_ids(&info), vec!["StefanB"]);
        assert_eq!(
            client.calls(),
            vec![MockCall::SearchUsers {
                term: Some("ste".to_string())
            }]
        );
    }

    #[tokio::test]
    async fn missing_context_and_search_failures_are_reported() {
        let client = Arc::new(MockChatClient::with_demo_channel());
        client.set_current_user_id(None);
        let local = handler(client.clone(), false);
        let command = local.can_handle_command("@a", 2).expect("command");
        assert_matches!(
            local.show_suggestions(&command).await,
            Err(CommandError::MissingData { what: "current user id" })
        );

        client.set_current_user_id(Some("current"));
        let unknown_channel = MentionsCommandHandler::new(
            client.clone(),
            ChannelId::new("messaging:missing"),
            "@",
            false,
        );
        assert_matches!(
            unknown_channel.show_suggestions(&command).await,
            Err(CommandError::MissingData { what: "channel" })
        );

        client.fail_searches(Some("offline"));
        let remote = handler(client, true);
        assert_matches!(
            remote.show_suggestions(&command).await,
            Err(CommandError::Search(error)) if error.message() == "offline"
        );
    }

    #[test]
    fn selection_keeps_the_trigger_and_advances_caret() {
        let handler = handler(Arc::new(MockChatClient::with_demo_channel()), false);
        let mut buffer = TextBuffer::new("Hey @Mar", 8);
        let mut command = handler.can_handle_command(&buffer.text, buffer.caret);

        handler.handle_command(
            &mut buffer,
            &mut command,
            &CommandSelection::mention(User::new("u1", Some("Marco"))),
        );

        assert_eq!(buffer.text, "Hey @Marco");
        assert_eq!(buffer.caret, 10);
        assert!(command.is_none());
    }

    #[test]
    fn selection_falls_back_to_id_and_keeps_trailing_text() {
        let handler = handler(Arc::new(MockChatClient::with_demo_channel()), false);
        let mut buffer = TextBuffer::new("@b see you", 2);
        let mut command = handler.can_handle_command(&buffer.text, buffer.caret);

        handler.handle_command(
            &mut buffer,
            &mut command,
            &CommandSelection::mention(User::new("bot-7", None)),
        );

        assert_eq!(buffer.text, "@bot-7 see you");
        assert_eq!(buffer.caret, 6);
    }

    #[test]
    fn stale_range_is_rederived_from_the_live_buffer() {
        let handler = handler(Arc::new(MockChatClient::with_demo_channel()), false);
        let stale = ComposerCommand::new(
            MENTIONS_COMMAND_ID,
            TypingSuggestion::new("Ma", TextRange::new(5, 2)),
        );
        let mut command = Some(stale);
        let mut buffer = TextBuffer::new("Hi @Mart", 8);

        handler.handle_command(
            &mut buffer,
            &mut command,
            &CommandSelection::mention(User::new("MartinM", Some("Martin"))),
        );

        assert_eq!(buffer.text, "Hi @Martin");
        assert_eq!(buffer.caret, 10);
    }

    #[test]
    fn selection_without_active_mention_is_a_no_op() {
        let handler = handler(Arc::new(MockChatClient::with_demo_channel()), false);
        let stale = ComposerCommand::new(
            MENTIONS_COMMAND_ID,
            TypingSuggestion::new("Ma", TextRange::new(9, 2)),
        );
        let mut command = Some(stale);
        let mut buffer = TextBuffer::new("plain", 5);

        handler.handle_command(
            &mut buffer,
            &mut command,
            &CommandSelection::mention(User::new("u1", None)),
        );

        assert_eq!(buffer, TextBuffer::new("plain", 5));
        assert!(command.is_some());
    }

    #[test]
    fn ownership_is_by_id() {
        let handler = handler(Arc::new(MockChatClient::new(Some("me"))), false);
        let ours = ComposerCommand::new(MENTIONS_COMMAND_ID, TypingSuggestion::empty());
        let theirs = ComposerCommand::new("/mute", TypingSuggestion::empty());
        assert!(handler.command_handler(&ours).is_some());
        assert!(handler.command_handler(&theirs).is_none());
        assert!(!handler.can_be_executed(&ours));
    }

    #[tokio::test]
    async fn watchers_join_members_without_duplicates() {
        let client = Arc::new(MockChatClient::new(Some("me")));
        let cid = ChannelId::new("messaging:dupes");
        client.insert_channel(
            cid.clone(),
            ChannelSnapshot {
                cid: Some(cid.clone()),
                members: vec![User::new("ana", Some("Ana")), User::new("me", Some("Me"))],
                watchers: vec![User::new("ana", Some("Ana")), User::new("anabel", None)],
                ..ChannelSnapshot::default()
            },
        );
        let handler = MentionsCommandHandler::new(client, cid, "@", false);
        let users = handler.mention_candidates("ana").await.expect("candidates");
        let ids: Vec<&str> = users.iter().map(|u| u.id.as_str()).collect();
        assert_eq!(ids, vec!["ana", "anabel"]);
    }
}
