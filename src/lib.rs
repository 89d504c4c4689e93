//! Command suggestions for a chat message composer.
//!
//! A dispatch chain of [`CommandHandler`]s watches the text under the caret,
//! recognizes `@mentions` and `/commands`, fetches suggestions, splices picks
//! back into the buffer, and runs send-time side effects such as `/mute`.
//!
//! # Public API Overview
//! - Detect trigger tokens with [`TypingSuggester`].
//! - Rank users with [`search_users`].
//! - Build a channel's chain with [`DefaultCommandsConfig`] or compose handlers
//!   by hand through [`CommandsHandler`] and [`InstantCommandsHandler`].
//! - Drive a composer from a host through [`ComposerSession`].
//!
//! Positions (carets, ranges) count grapheme clusters.

pub mod config;
pub mod logging;

pub mod commands;
pub mod core;
pub mod runtime;

/// Command contract and value types.
pub use crate::core::command::{
    CommandDisplayInfo, CommandHandler, CommandSelection, ComposerCommand,
    InstantCommandSelection, MentionSelection, SuggestionInfo, SuggestionPayload, TextBuffer,
    INSTANT_COMMANDS_KEY, MENTIONS_KEY,
};
pub use crate::core::error::CommandError;
/// Grapheme-indexed text helpers.
pub use crate::core::graphemes::{grapheme_len, replace_range, slice, TextRange};
/// Trigger detection.
pub use crate::core::typing_suggester::{
    TypingSuggester, TypingSuggestion, TypingSuggestionOptions,
};
/// User ranking.
pub use crate::core::user_search::{levenshtein, normalize, search_users};

/// Concrete handlers and composites.
pub use crate::commands::composite::{CommandsHandler, MAIN_COMMANDS_ID};
pub use crate::commands::factory::{CommandsConfig, DefaultCommandsConfig};
pub use crate::commands::instant::{
    GiphyCommandHandler, InstantCommandsHandler, GIPHY_COMMAND_NAME, INSTANT_COMMANDS_ID,
};
pub use crate::commands::mentions::{MentionsCommandHandler, MENTIONS_COMMAND_ID};
pub use crate::commands::two_step::{
    MuteAction, MuteCommandHandler, TwoStepAction, TwoStepMentionCommand, UnmuteAction,
    UnmuteCommandHandler, MUTE_COMMAND_NAME, UNMUTE_COMMAND_NAME,
};

pub use crate::config::ComposerConfig;
/// Host binding.
pub use crate::runtime::{ComposerSession, SendOutcome, Suggestions};
