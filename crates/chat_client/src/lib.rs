//! Minimal chat-client contract consumed by the composer command engine.
//!
//! This crate defines only the data the composer reads (users, channel
//! membership, channel command configuration) and the few asynchronous
//! operations it triggers (user search, mute, unmute). Transport, persistence
//! and sync concerns live behind implementations of [`ChatClient`].

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Error returned by a chat client operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientError {
    message: String,
}

impl ClientError {
    /// Creates a new client error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the underlying error message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ClientError {}

impl From<String> for ClientError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for ClientError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

/// A chat user as seen by the composer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl User {
    #[must_use]
    pub fn new(id: impl Into<String>, name: Option<&str>) -> Self {
        Self {
            id: id.into(),
            name: name.map(str::to_string),
        }
    }

    /// Text spliced into a message when this user is mentioned: the name when
    /// present and non-empty, otherwise the id.
    #[must_use]
    pub fn mention_text(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => &self.id,
        }
    }
}

/// Channel identifier in `type:id` form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelId(String);

impl ChannelId {
    #[must_use]
    pub fn new(cid: impl Into<String>) -> Self {
        Self(cid.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One slash command enabled on a channel type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub args: String,
    #[serde(default)]
    pub set: String,
}

impl CommandSpec {
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            args: String::new(),
            set: String::new(),
        }
    }
}

/// Channel configuration flags relevant to the composer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelConfig {
    #[serde(default)]
    pub commands: Vec<CommandSpec>,
}

impl ChannelConfig {
    /// Builds a config enabling the given command names with empty metadata.
    #[must_use]
    pub fn with_commands<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            commands: names.into_iter().map(CommandSpec::named).collect(),
        }
    }

    /// Parses the backend JSON representation of a channel config.
    pub fn from_json(raw: &str) -> Result<Self, ClientError> {
        serde_json::from_str(raw)
            .map_err(|error| ClientError::new(format!("invalid channel config: {error}")))
    }

    pub fn enabled_command_names(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().map(|command| command.name.as_str())
    }

    #[must_use]
    pub fn command(&self, name: &str) -> Option<&CommandSpec> {
        self.commands.iter().find(|command| command.name == name)
    }
}

/// Locally loaded state of one channel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelSnapshot {
    pub cid: Option<ChannelId>,
    pub config: ChannelConfig,
    /// Recently active members, already loaded by the sync layer.
    pub members: Vec<User>,
    /// Recently active watchers, already loaded by the sync layer.
    pub watchers: Vec<User>,
}

impl ChannelSnapshot {
    /// Members followed by watchers. May contain duplicates.
    #[must_use]
    pub fn known_users(&self) -> Vec<User> {
        self.members
            .iter()
            .chain(self.watchers.iter())
            .cloned()
            .collect()
    }
}

/// Chat client surface used by composer commands.
#[async_trait]
pub trait ChatClient: Send + Sync + 'static {
    /// Returns the id of the signed-in user, if any.
    fn current_user_id(&self) -> Option<String>;

    /// Returns the locally loaded state of a channel.
    fn channel(&self, cid: &ChannelId) -> Option<ChannelSnapshot>;

    /// Searches the whole app's user base. `None` lists users without a filter.
    async fn search_users(&self, term: Option<&str>) -> Result<Vec<User>, ClientError>;

    async fn mute_user(&self, user_id: &str) -> Result<(), ClientError>;

    async fn unmute_user(&self, user_id: &str) -> Result<(), ClientError>;
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    struct EmptyClient;

    #[async_trait]
    impl ChatClient for EmptyClient {
        fn current_user_id(&self) -> Option<String> {
            None
        }

        fn channel(&self, _cid: &ChannelId) -> Option<ChannelSnapshot> {
            None
        }

        async fn search_users(&self, _term: Option<&str>) -> Result<Vec<User>, ClientError> {
            Ok(Vec::new())
        }

        async fn mute_user(&self, user_id: &str) -> Result<(), ClientError> {
            Err(ClientError::new(format!("cannot mute {user_id}")))
        }

        async fn unmute_user(&self, _user_id: &str) -> Result<(), ClientError> {
            Ok(())
        }
    }

    #[test]
    fn mention_text_prefers_non_empty_name() {
        assert_eq!(User::new("u1", Some("Marco")).mention_text(), "Marco");
        assert_eq!(User::new("u1", Some("")).mention_text(), "u1");
        assert_eq!(User::new("u1", None).mention_text(), "u1");
    }

    #[test]
    fn client_error_preserves_message() {
        let error = ClientError::from("network down");
        assert_eq!(error.message(), "network down");
        assert_eq!(error.to_string(), "network down");
    }

    #[test]
    fn channel_config_parses_backend_shape() {
        let config = ChannelConfig::from_json(
            r#"{
                "commands": [
                    {"name": "giphy", "description": "Post a random gif", "args": "[text]", "set": "fun_set"},
                    {"name": "mute", "args": "[@username]"}
                ],
                "typing_events": true
            }"#,
        )
        .expect("config should parse");

        let names: Vec<&str> = config.enabled_command_names().collect();
        assert_eq!(names, vec!["giphy", "mute"]);
        assert_eq!(config.command("giphy").map(|c| c.args.as_str()), Some("[text]"));
        assert_eq!(config.command("mute").map(|c| c.set.as_str()), Some(""));
    }

    #[test]
    fn channel_config_rejects_malformed_json() {
        let error = ChannelConfig::from_json("{\"commands\": 3}").expect_err("must fail");
        assert!(error.message().starts_with("invalid channel config"));
    }

    #[test]
    fn known_users_keeps_members_before_watchers() {
        let snapshot = ChannelSnapshot {
            members: vec![User::new("a", None)],
            watchers: vec![User::new("b", None), User::new("a", None)],
            ..ChannelSnapshot::default()
        };
        let ids: Vec<String> = snapshot.known_users().into_iter().map(|u| u.id).collect();
        assert_eq!(ids, vec!["a", "b", "a"]);
    }

    #[tokio::test]
    async fn trait_objects_are_usable_across_tasks() {
        let client: Arc<dyn ChatClient> = Arc::new(EmptyClient);
        assert!(client.search_users(Some("x")).await.expect("search").is_empty());
        let error = client.mute_user("u9").await.expect_err("mute fails");
        assert_eq!(error.message(), "cannot mute u9");
        assert!(client.channel(&ChannelId::new("messaging:1")).is_none());
    }
}
