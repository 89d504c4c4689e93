//! Structured log events for the command pipeline.
//!
//! Events carry metadata only (command ids, ranges, counts, error strings).
//! Typed text and user names never reach the log.

use tracing::{debug, trace, warn};

use crate::core::error::CommandError;
use crate::core::graphemes::TextRange;

pub fn log_command_detected(command_id: &str, range: TextRange) {
    trace!(
        command_id,
        location = range.location,
        length = range.length,
        "composer.command_detected"
    );
}

pub fn log_command_cleared(command_id: &str, reason: &'static str) {
    debug!(command_id, reason, "composer.command_cleared");
}

pub fn log_selected_user_cleared(command_id: &str) {
    debug!(command_id, "composer.selected_user_cleared");
}

pub fn log_suggestions_ready(command_id: &str, key: &str, count: usize, generation: u64) {
    debug!(
        command_id,
        key,
        count,
        generation,
        "composer.suggestions_ready"
    );
}

pub fn log_suggestions_discarded(command_id: &str, generation: u64) {
    debug!(command_id, generation, "composer.suggestions_discarded");
}

pub fn log_suggestions_failed(command_id: &str, error: &CommandError) {
    if error.is_benign() {
        trace!(command_id, reason = %error, "composer.suggestions_unavailable");
    } else {
        warn!(command_id, error = %error, "composer.suggestions_failed");
    }
}

pub fn log_command_executed(command_id: &str) {
    debug!(command_id, "composer.command_executed");
}

pub fn log_command_failed(command_id: &str, error: &CommandError) {
    warn!(command_id, error = %error, "composer.command_failed");
}
