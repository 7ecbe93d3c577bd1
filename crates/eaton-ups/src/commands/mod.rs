//! Command dispatch: bridges CLI args -> UPS client -> output formatting.

pub mod capture;
pub mod config_cmd;
pub mod control;
pub mod entities;
pub mod status;
pub mod topics;
pub mod util;

use eaton_ups_core::UpsClient;

use crate::cli::{Command, GlobalOpts};
use crate::config::Target;
use crate::error::CliError;

/// Dispatch a card-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    client: &UpsClient,
    target: &Target,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Status => status::handle(client, target, global).await,
        Command::Sensors { all } => entities::sensors(client, target, global, all).await,
        Command::BinarySensors => entities::binary_sensors(client, target, global).await,
        Command::Switches => entities::switches(client, target, global).await,
        Command::Topics { prefix, values } => {
            topics::list(client, target, global, prefix.as_deref(), values).await
        }
        Command::Get { path } => topics::get(client, target, global, &path).await,
        Command::Watch { count } => capture::watch(client, global, count).await,
        Command::Dump { duration, file } => {
            capture::dump(client, target, global, duration, file.as_deref()).await
        }
        Command::Switch { name, state } => control::switch(client, global, &name, state).await,
        Command::Command { value } => control::command(client, global, &value).await,
        Command::Diagnostics => status::diagnostics(client, target, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}
