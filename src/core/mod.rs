//! Core types: text positions, trigger detection, user ranking, and the
//! command contract.

pub mod command;
pub mod error;
pub mod graphemes;
pub mod typing_suggester;
pub mod user_search;
