//! `switch` and `command`: publish to the card's command topic.

use eaton_ups_core::UpsClient;
use eaton_ups_core::entity::{SWITCHES, find_switch};

use crate::cli::{GlobalOpts, SwitchState};
use crate::error::CliError;

use super::util;

pub async fn switch(
    client: &UpsClient,
    global: &GlobalOpts,
    name: &str,
    state: SwitchState,
) -> Result<(), CliError> {
    let desc = find_switch(name).ok_or_else(|| CliError::NotFound {
        resource_type: "switch".into(),
        identifier: name.into(),
        list_command: "switches".into(),
    })?;

    let on = state == SwitchState::On;
    let command = desc.command(on);

    // Cutting an outlet drops whatever is plugged into it.
    if !on && desc.id().starts_with("outlet") {
        let prompt = format!("Turn off {}? Connected equipment loses power", desc.name);
        if !util::confirm(&prompt, &command, global.yes)? {
            return Ok(());
        }
    }

    util::connect(client, global).await?;
    client.send_command(&command).await?;
    tracing::info!(switch = desc.key, %command, "command published");

    if !global.quiet {
        eprintln!("✓ Sent {command}");
    }
    Ok(())
}

pub async fn command(client: &UpsClient, global: &GlobalOpts, value: &str) -> Result<(), CliError> {
    if value.trim().is_empty() {
        return Err(CliError::Validation {
            field: "command".into(),
            reason: "must not be empty".into(),
        });
    }

    let known = SWITCHES
        .iter()
        .any(|s| s.turn_on_command() == value || s.turn_off_command() == value);
    if !known {
        tracing::warn!(value, "publishing a command no switch uses");
    }

    util::connect(client, global).await?;
    client.send_command(value).await?;

    if !global.quiet {
        eprintln!("✓ Sent {value}");
    }
    Ok(())
}
