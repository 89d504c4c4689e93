use std::sync::Arc;

use chat_client::{ChannelId, ChatClient};

use crate::commands::composite::CommandsHandler;
use crate::commands::instant::{GiphyCommandHandler, InstantCommandsHandler, GIPHY_COMMAND_NAME};
use crate::commands::mentions::MentionsCommandHandler;
use crate::commands::two_step::{
    MuteCommandHandler, UnmuteCommandHandler, MUTE_COMMAND_NAME, UNMUTE_COMMAND_NAME,
};
use crate::config::{ComposerConfig, DEFAULT_INSTANT_COMMANDS_SYMBOL, DEFAULT_MENTIONS_SYMBOL};
use crate::core::command::CommandHandler;

/// Builds the dispatch chain for one channel.
pub trait CommandsConfig: Send + Sync {
    fn make_commands_handler(&self, client: Arc<dyn ChatClient>, cid: ChannelId)
        -> CommandsHandler;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultCommandsConfig {
    pub mentions_symbol: String,
    pub instant_commands_symbol: String,
    pub mention_all_app_users: bool,
}

impl Default for DefaultCommandsConfig {
    fn default() -> Self {
        Self {
            mentions_symbol: DEFAULT_MENTIONS_SYMBOL.to_string(),
            instant_commands_symbol: DEFAULT_INSTANT_COMMANDS_SYMBOL.to_string(),
            mention_all_app_users: false,
        }
    }
}

impl From<&ComposerConfig> for DefaultCommandsConfig {
    fn from(config: &ComposerConfig) -> Self {
        Self {
            mentions_symbol: config.mentions_symbol.clone(),
            instant_commands_symbol: config.instant_commands_symbol.clone(),
            mention_all_app_users: config.mention_all_app_users,
        }
    }
}

impl CommandsConfig for DefaultCommandsConfig {
    fn make_commands_handler(
        &self,
        client: Arc<dyn ChatClient>,
        cid: ChannelId,
    ) -> CommandsHandler {
        let mentions = MentionsCommandHandler::new(
            client.clone(),
            cid.clone(),
            &self.mentions_symbol,
            self.mention_all_app_users,
        );

        let config = client
            .channel(&cid)
            .map(|snapshot| snapshot.config)
            .unwrap_or_default();
        let enabled: Vec<&str> = config.enabled_command_names().collect();
        let symbol = self.instant_commands_symbol.as_str();

        let mut instant: Vec<Arc<dyn CommandHandler>> = Vec::new();
        if enabled.contains(&GIPHY_COMMAND_NAME) {
            instant.push(Arc::new(GiphyCommandHandler::new(
                symbol,
                config.command(GIPHY_COMMAND_NAME),
            )));
        }
        if enabled.contains(&MUTE_COMMAND_NAME) {
            instant.push(Arc::new(MuteCommandHandler::new(
                client.clone(),
                cid.clone(),
                symbol,
                &self.mentions_symbol,
                config.command(MUTE_COMMAND_NAME),
            )));
        }
        if enabled.contains(&UNMUTE_COMMAND_NAME) {
            instant.push(Arc::new(UnmuteCommandHandler::new(
                client.clone(),
                cid.clone(),
                symbol,
                &self.mentions_symbol,
                config.command(UNMUTE_COMMAND_NAME),
            )));
        }

        CommandsHandler::new(vec![
            Arc::new(mentions),
            Arc::new(InstantCommandsHandler::new(symbol, instant)),
        ])
    }
}
