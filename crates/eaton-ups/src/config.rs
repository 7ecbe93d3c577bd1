//! CLI configuration -- thin wrapper around `eaton_ups_config` shared types.
//!
//! Re-exports the shared types and adds CLI-specific resolution that
//! respects `GlobalOpts` flag overrides (--host, --client-key, etc.).

use std::path::Path;
use std::time::Duration;

use secrecy::SecretString;

use eaton_ups_core::{ClientOptions, ConnectionConfig};

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use eaton_ups_config::{
    Config, Profile, config_path, load_config_or_default, save_config,
};

/// Everything a connected command needs.
#[derive(Debug, Clone)]
pub struct Target {
    pub profile_name: String,
    pub connection: ConnectionConfig,
    pub options: ClientOptions,
    /// How long to wait for telemetry once connected.
    pub timeout: Duration,
}

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Names of all profiles, sorted, for error help text.
pub fn available_profiles(config: &Config) -> String {
    let mut names: Vec<_> = config.profiles.keys().cloned().collect();
    names.sort();
    if names.is_empty() {
        "(none)".into()
    } else {
        names.join(", ")
    }
}

/// Profile for this invocation. An unknown profile is only an error when
/// it was asked for by name; otherwise flags alone must suffice.
fn base_profile(global: &GlobalOpts, config: &Config, name: &str) -> Result<Profile, CliError> {
    match config.profiles.get(name) {
        Some(profile) => Ok(profile.clone()),
        None if global.profile.is_some() => Err(CliError::ProfileNotFound {
            name: name.into(),
            available: available_profiles(config),
        }),
        None => Ok(Profile {
            port: eaton_ups_core::DEFAULT_PORT,
            ..Profile::default()
        }),
    }
}

fn read_pem(path: &Path) -> Result<String, CliError> {
    std::fs::read_to_string(path).map_err(|e| CliError::Validation {
        field: path.display().to_string(),
        reason: format!("cannot read PEM file: {e}"),
    })
}

/// Translate a profile + global flags into a `ConnectionConfig`.
///
/// Flag overrides take priority over profile values; PEM flags are file
/// paths and replace both the inline and path forms in the profile.
pub fn resolve_connection(
    profile: &Profile,
    profile_name: &str,
    global: &GlobalOpts,
) -> Result<ConnectionConfig, CliError> {
    // 1. Host and port (flag > env > profile)
    let host = global.host.as_deref().unwrap_or(&profile.host).trim();
    if host.is_empty() {
        return Err(CliError::Validation {
            field: "host".into(),
            reason: "no host configured; pass --host or run: eaton-ups config init".into(),
        });
    }
    let port = global.port.unwrap_or(profile.port);

    // 2. Certificates
    let server_cert = match global.server_cert {
        Some(ref path) => read_pem(path)?,
        None => eaton_ups_config::resolve_server_cert(profile, profile_name)?,
    };
    let client_cert = match global.client_cert {
        Some(ref path) => read_pem(path)?,
        None => eaton_ups_config::resolve_client_cert(profile, profile_name)?,
    };

    // 3. Client key
    let client_key = match global.client_key {
        Some(ref path) => SecretString::from(read_pem(path)?),
        None => eaton_ups_config::resolve_client_key(profile, profile_name)?,
    };

    let connection = ConnectionConfig::new(host, port, server_cert, client_cert, client_key);
    eaton_ups_config::validate_connection(&connection)?;
    Ok(connection)
}

/// Resolve the full connection target for a card-bound command.
pub fn resolve_target(global: &GlobalOpts, config: &Config) -> Result<Target, CliError> {
    let profile_name = active_profile_name(global, config);
    let profile = base_profile(global, config, &profile_name)?;
    let connection = resolve_connection(&profile, &profile_name, global)?;

    let options = ClientOptions {
        connect_attempts: global
            .connect_attempts
            .unwrap_or(config.defaults.connect_attempts),
        ..ClientOptions::default()
    };
    if options.connect_attempts == 0 {
        return Err(CliError::Validation {
            field: "connect-attempts".into(),
            reason: "must be at least 1".into(),
        });
    }

    let timeout = Duration::from_secs(global.timeout.unwrap_or(config.defaults.timeout));

    Ok(Target {
        profile_name,
        connection,
        options,
        timeout,
    })
}
