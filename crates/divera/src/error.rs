//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and distinct exit codes.

use miette::Diagnostic;
use thiserror::Error;

use divera_config::ConfigError;
use divera_core::CoreError;

pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const UNSUPPORTED: i32 = 5;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach DIVERA: {reason}")]
    #[diagnostic(
        code(divera::connection_failed),
        help(
            "Check your network connection and the base URL.\n\
             Self-hosted instances: configure base_url and ca_cert in your profile."
        )
    )]
    ConnectionFailed { reason: String },

    #[error("Request timed out: {reason}")]
    #[diagnostic(
        code(divera::timeout),
        help("Increase the timeout with --timeout or try again later.")
    )]
    Timeout { reason: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Access key rejected: {reason}")]
    #[diagnostic(
        code(divera::auth_failed),
        help(
            "The access key is shown in the DIVERA web app under\n\
             Profile > Settings > Debug.\n\
             Store a new one with: divera config set-key"
        )
    )]
    AuthFailed { reason: String },

    #[error("No access key configured for profile '{profile}'")]
    #[diagnostic(
        code(divera::no_credentials),
        help(
            "Set one up with: divera onboard\n\
             Or set the DIVERA_ACCESSKEY environment variable."
        )
    )]
    NoCredentials { profile: String },

    #[error("This account is a monitor account and cannot be used")]
    #[diagnostic(
        code(divera::unsupported_account),
        help("Use the access key of a personal user account instead.")
    )]
    UnsupportedAccount,

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(divera::not_found),
        help("Run: divera {list_command} to see what is available")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    #[error("Unknown status '{name}'")]
    #[diagnostic(code(divera::status_not_found), help("Available statuses: {available}"))]
    StatusNotFound { name: String, available: String },

    // ── API ──────────────────────────────────────────────────────────
    #[error("DIVERA rejected the request{}: {message}", .status.map(|s| format!(" ({s})")).unwrap_or_default())]
    #[diagnostic(code(divera::api_error))]
    ApiError { status: Option<u16>, message: String },

    #[error("{message}")]
    #[diagnostic(code(divera::internal))]
    Internal { message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(divera::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(divera::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: divera onboard"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No configuration found")]
    #[diagnostic(
        code(divera::no_config),
        help(
            "Create a profile with: divera onboard\n\
             Expected at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error("Configuration error: {message}")]
    #[diagnostic(code(divera::config))]
    Config { message: String },

    // ── Interactive ──────────────────────────────────────────────────
    #[error("'{action}' requires confirmation")]
    #[diagnostic(
        code(divera::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render output: {0}")]
    Render(String),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NotFound { .. } | Self::StatusNotFound { .. } => exit_code::NOT_FOUND,
            Self::UnsupportedAccount => exit_code::UNSUPPORTED,
            Self::Validation { .. } | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        Self::Render(err.to_string())
    }
}

impl From<serde_yaml::Error> for CliError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Render(err.to_string())
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Auth { message } => Self::AuthFailed { reason: message },
            CoreError::Connection { message } => Self::ConnectionFailed { reason: message },
            CoreError::Timeout { message } => Self::Timeout { reason: message },
            CoreError::Api {
                message, status, ..
            } => Self::ApiError { status, message },
            CoreError::NotFound {
                entity_type,
                identifier,
            } => Self::NotFound {
                resource_type: entity_type.into(),
                identifier,
                list_command: "show".into(),
            },
            CoreError::StatusNotFound { name, available } => Self::StatusNotFound {
                name,
                available: available.join(", "),
            },
            CoreError::Validation { field, reason } => Self::Validation {
                field: field.into(),
                reason,
            },
            CoreError::Config { message } => Self::Config { message },
            err @ (CoreError::NotReady { .. }
            | CoreError::InvalidState { .. }
            | CoreError::Internal(_)) => Self::Internal {
                message: err.to_string(),
            },
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            ConfigError::NoCredentials { profile } => Self::NoCredentials { profile },
            ConfigError::UnknownProfile(name) => Self::ProfileNotFound {
                name,
                available: String::new(),
            },
            ConfigError::Io(e) => Self::Io(e),
            other => Self::Config {
                message: other.to_string(),
            },
        }
    }
}
