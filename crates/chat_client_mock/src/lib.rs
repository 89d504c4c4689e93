//! Deterministic in-memory implementation of the `chat_client` contract.
//!
//! This crate contains no transport logic and is intended for local
//! development and contract-level integration testing of composer commands.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chat_client::{ChannelConfig, ChannelId, ChannelSnapshot, ChatClient, ClientError, User};

/// Channel id used by [`MockChatClient::with_demo_channel`].
pub const DEMO_CHANNEL_ID: &str = "messaging:general";

/// One recorded call against the mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    SearchUsers { term: Option<String> },
    MuteUser { user_id: String },
    UnmuteUser { user_id: String },
}

#[derive(Debug, Default)]
struct MockState {
    current_user_id: Option<String>,
    channels: HashMap<ChannelId, ChannelSnapshot>,
    directory: Vec<User>,
    calls: Vec<MockCall>,
    search_failure: Option<String>,
    moderation_failure: Option<String>,
    latency: Duration,
}

/// In-memory chat client with call recording and failure injection.
#[derive(Debug, Default)]
pub struct MockChatClient {
    state: Mutex<MockState>,
}

impl MockChatClient {
    #[must_use]
    pub fn new(current_user_id: Option<&str>) -> Self {
        Self {
            state: Mutex::new(MockState {
                current_user_id: current_user_id.map(str::to_string),
                ..MockState::default()
            }),
        }
    }

    /// A client signed in as `current` with one channel whose members are the
    /// demo users and whose config enables giphy, mute and unmute.
    #[must_use]
    pub fn with_demo_channel() -> Self {
        let client = Self::new(Some("current"));
        let members = demo_users();
        client.set_directory(members.clone());
        client.insert_channel(
            ChannelId::new(DEMO_CHANNEL_ID),
            ChannelSnapshot {
                cid: Some(ChannelId::new(DEMO_CHANNEL_ID)),
                config: ChannelConfig::with_commands(["giphy", "mute", "unmute"]),
                members,
                watchers: vec![User::new("current", Some("Current User"))],
            },
        );
        client
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn set_current_user_id(&self, user_id: Option<&str>) {
        self.lock().current_user_id = user_id.map(str::to_string);
    }

    pub fn insert_channel(&self, cid: ChannelId, snapshot: ChannelSnapshot) {
        self.lock().channels.insert(cid, snapshot);
    }

    /// Replaces the app-wide user base returned by `search_users`.
    pub fn set_directory(&self, users: Vec<User>) {
        self.lock().directory = users;
    }

    /// Makes every following `search_users` call fail with `message`.
    pub fn fail_searches(&self, message: Option<&str>) {
        self.lock().search_failure = message.map(str::to_string);
    }

    /// Makes every following mute/unmute call fail with `message`.
    pub fn fail_moderation(&self, message: Option<&str>) {
        self.lock().moderation_failure = message.map(str::to_string);
    }

    /// Delay applied before every asynchronous call resolves.
    pub fn set_latency(&self, latency: Duration) {
        self.lock().latency = latency;
    }

    #[must_use]
    pub fn calls(&self) -> Vec<MockCall> {
        self.lock().calls.clone()
    }

    async fn simulate_latency(&self) {
        let latency = self.lock().latency;
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
    }

    fn moderate(&self, call: MockCall) -> Result<(), ClientError> {
        let mut state = self.lock();
        state.calls.push(call);
        match &state.moderation_failure {
            Some(message) => Err(ClientError::new(message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ChatClient for MockChatClient {
    fn current_user_id(&self) -> Option<String> {
        self.lock().current_user_id.clone()
    }

    fn channel(&self, cid: &ChannelId) -> Option<ChannelSnapshot> {
        self.lock().channels.get(cid).cloned()
    }

    async fn search_users(&self, term: Option<&str>) -> Result<Vec<User>, ClientError> {
        {
            let mut state = self.lock();
            state.calls.push(MockCall::SearchUsers {
                term: term.map(str::to_string),
            });
        }
        self.simulate_latency().await;

        let state = self.lock();
        if let Some(message) = &state.search_failure {
            return Err(ClientError::new(message.clone()));
        }
        let needle = term.unwrap_or("").to_lowercase();
        Ok(state
            .directory
            .iter()
            .filter(|user| {
                needle.is_empty()
                    || user.id.to_lowercase().contains(&needle)
                    || user
                        .name
                        .as_deref()
                        .is_some_and(|name| name.to_lowercase().contains(&needle))
            })
            .cloned()
            .collect())
    }

    async fn mute_user(&self, user_id: &str) -> Result<(), ClientError> {
        self.simulate_latency().await;
        self.moderate(MockCall::MuteUser {
            user_id: user_id.to_string(),
        })
    }

    async fn unmute_user(&self, user_id: &str) -> Result<(), ClientError> {
        self.simulate_latency().await;
        self.moderate(MockCall::UnmuteUser {
            user_id: user_id.to_string(),
        })
    }
}

/// Stable user fixtures shared by tests and local runs.
#[must_use]
pub fn demo_users() -> Vec<User> {
    vec![
        User::new("MartinM", Some("Martin Mitrevski")),
        User::new("StefanB", Some("Stefan Blos")),
        User::new("MarMit", Some("Marko Mitić")),
        User::new("Amelie", Some("Amélie Poulain")),
        User::new("bot-7", None),
    ]
}
