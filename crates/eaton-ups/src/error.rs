//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use eaton_ups_config::ConfigError;
use eaton_ups_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
#[allow(unused_assignments)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────

    #[error("Could not connect to the UPS broker at {address}")]
    #[diagnostic(
        code(eaton_ups::connection_failed),
        help(
            "{reason}\n\
             Check that the card is reachable, MQTT is enabled on it,\n\
             and the client certificate is registered as trusted.\n\
             Try: eaton-ups config test"
        )
    )]
    ConnectionFailed { address: String, reason: String },

    // ── Authentication ───────────────────────────────────────────────

    #[error("The broker rejected the client credentials")]
    #[diagnostic(
        code(eaton_ups::auth_failed),
        help(
            "{message}\n\
             Verify the client certificate and key match, and that the CA\n\
             certificate is the one the card's broker presents."
        )
    )]
    AuthFailed { message: String },

    #[error("No {what} configured for profile '{profile}'")]
    #[diagnostic(
        code(eaton_ups::missing_material),
        help(
            "Configure it with: eaton-ups config init\n\
             Or pass --server-cert / --client-cert / --client-key."
        )
    )]
    MissingMaterial { profile: String, what: String },

    // ── Resources ────────────────────────────────────────────────────

    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(eaton_ups::not_found),
        help("Run: eaton-ups {list_command} to see available {resource_type}s")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    // ── Client ───────────────────────────────────────────────────────

    #[error("MQTT client error: {message}")]
    #[diagnostic(code(eaton_ups::client))]
    Client { message: String },

    #[error("Connection test failed ({outcome}): {message}")]
    #[diagnostic(
        code(eaton_ups::probe_failed),
        help("Rerun with -v for connection details.")
    )]
    ProbeFailed { outcome: String, message: String },

    // ── Validation ───────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(eaton_ups::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────

    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(eaton_ups::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: eaton-ups config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error(transparent)]
    #[diagnostic(code(eaton_ups::config))]
    Config(Box<figment::Error>),

    #[error("Keyring error: {message}")]
    #[diagnostic(
        code(eaton_ups::keyring),
        help("Store the key in a file and set client_key_path instead.")
    )]
    Keyring { message: String },

    // ── Interactive ──────────────────────────────────────────────────

    #[error("Operation '{action}' requires confirmation")]
    #[diagnostic(
        code(eaton_ups::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── Timeout ──────────────────────────────────────────────────────

    #[error("Timed out after {seconds}s waiting for {what}")]
    #[diagnostic(
        code(eaton_ups::timeout),
        help("Increase the wait with --timeout, or check the card is publishing.")
    )]
    Timeout { what: String, seconds: u64 },

    // ── IO / Serialization ────────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Could not encode output: {0}")]
    #[diagnostic(code(eaton_ups::json))]
    Json(#[from] serde_json::Error),
}

impl From<figment::Error> for CliError {
    fn from(err: figment::Error) -> Self {
        Self::Config(Box::new(err))
    }
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::MissingMaterial { .. } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Validation { .. } | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            Self::ProbeFailed { outcome, .. } => match outcome.as_str() {
                "auth" => exit_code::AUTH,
                "connection" => exit_code::CONNECTION,
                "cannot_connect" => exit_code::TIMEOUT,
                _ => exit_code::GENERAL,
            },
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Communication { host, port, reason } => CliError::ConnectionFailed {
                address: format!("{host}:{port}"),
                reason,
            },

            CoreError::Authentication { message } => CliError::AuthFailed { message },

            CoreError::Validation { field, reason } => CliError::Validation { field, reason },

            CoreError::Timeout { what, timeout_secs } => CliError::Timeout {
                what,
                seconds: timeout_secs,
            },

            CoreError::Client { message } | CoreError::Internal(message) => {
                CliError::Client { message }
            }
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::MissingMaterial { profile, what } => {
                CliError::MissingMaterial { profile, what }
            }
            ConfigError::ProfileNotFound(name) => CliError::ProfileNotFound {
                name,
                available: "(see: eaton-ups config profiles)".into(),
            },
            ConfigError::Figment(err) => CliError::Config(err),
            ConfigError::Keyring(message) => CliError::Keyring { message },
            ConfigError::Io(err) => CliError::Io(err),
            ConfigError::Serialization(err) => CliError::Io(std::io::Error::other(err)),
        }
    }
}
