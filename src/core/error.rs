use chat_client::ClientError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CommandError {
    /// The handler has nothing to offer for this command. Callers show nothing.
    #[error("no suggestions available for this command")]
    NoSuggestionsAvailable,

    /// Context needed to answer (current user, channel) is not loaded yet.
    #[error("missing {what} while resolving command suggestions")]
    MissingData { what: &'static str },

    #[error("command {command} cannot run without a selected user")]
    NoUserSelected { command: String },

    #[error("user search failed: {0}")]
    Search(#[source] ClientError),

    #[error("command {command} failed: {source}")]
    Execution {
        command: String,
        #[source]
        source: ClientError,
    },
}

impl CommandError {
    #[must_use]
    pub fn missing(what: &'static str) -> Self {
        Self::MissingData { what }
    }

    #[must_use]
    pub fn execution(command: impl Into<String>, source: ClientError) -> Self {
        Self::Execution {
            command: command.into(),
            source,
        }
    }

    /// Errors that mean "show no suggestions" rather than something the user
    /// should see.
    #[must_use]
    pub fn is_benign(&self) -> bool {
        matches!(self, Self::NoSuggestionsAvailable | Self::MissingData { .. })
    }
}
