//! Concrete command handlers, the dispatch composites, and the factory that
//! assembles them for a channel.

pub mod composite;
pub mod factory;
pub mod instant;
pub mod mentions;
pub mod two_step;

use chat_client::CommandSpec;

use crate::core::command::CommandDisplayInfo;

/// Display info for `/name`, preferring the channel's own argument hint.
pub(crate) fn slash_display_info(
    command_symbol: &str,
    name: &str,
    display_name: &str,
    default_args: &str,
    spec: Option<&CommandSpec>,
) -> CommandDisplayInfo {
    let args = spec
        .map(|spec| spec.args.trim())
        .filter(|args| !args.is_empty())
        .unwrap_or(default_args);
    CommandDisplayInfo {
        display_name: display_name.to_string(),
        icon: name.to_string(),
        format: format!("{command_symbol}{name} {args}"),
        is_instant: true,
    }
}
