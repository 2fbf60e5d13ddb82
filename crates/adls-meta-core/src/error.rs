use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum ViewerError {
    // ========================================================================
    // Input Errors
    // ========================================================================
    #[error("Please provide all required inputs")]
    #[diagnostic(
        code(adls_meta::input::missing),
        help("Missing: {}", missing.join(", "))
    )]
    MissingInputs { missing: Vec<String> },

    // ========================================================================
    // Configuration Errors
    // ========================================================================
    #[error("Configuration file not found: {}", path.display())]
    #[diagnostic(
        code(adls_meta::config::not_found),
        help("Check the --config path, or omit it to search for adls-meta.toml")
    )]
    ConfigFileNotFound { path: std::path::PathBuf },

    #[error("Failed to read configuration file: {}", path.display())]
    #[diagnostic(
        code(adls_meta::config::read_failed),
        help("Ensure the config file exists and you have read permissions")
    )]
    ConfigReadFailed {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid TOML in configuration file")]
    #[diagnostic(
        code(adls_meta::config::invalid_toml),
        help("Check the TOML syntax in your adls-meta.toml file")
    )]
    ConfigParseError {
        #[source]
        source: toml_edit::de::Error,
    },

    #[error("Profile '{profile}' is not defined in the configuration file")]
    #[diagnostic(
        code(adls_meta::config::unknown_profile),
        help("Add a [profiles.{profile}] table or pick one of: {available}")
    )]
    UnknownProfile { profile: String, available: String },

    // ========================================================================
    // Key Vault Errors
    // ========================================================================
    #[error("{provider}: authentication failed")]
    #[diagnostic(code(adls_meta::vault::auth_failed), help("{hint}"))]
    VaultAuthFailed {
        provider: String,
        details: String,
        hint: String,
    },

    #[error("{provider}: secret '{secret}' not found")]
    #[diagnostic(code(adls_meta::vault::secret_not_found), help("{hint}"))]
    VaultSecretNotFound {
        provider: String,
        secret: String,
        hint: String,
    },

    #[error("{provider}: {details}")]
    #[diagnostic(code(adls_meta::vault::api_error), help("{hint}"))]
    VaultApiError {
        provider: String,
        details: String,
        hint: String,
    },

    #[error("{provider}: invalid response: {details}")]
    #[diagnostic(code(adls_meta::vault::invalid_response), help("{hint}"))]
    VaultInvalidResponse {
        provider: String,
        details: String,
        hint: String,
    },

    // ========================================================================
    // Storage Errors
    // ========================================================================
    #[error("Error initializing storage account: {details}")]
    #[diagnostic(code(adls_meta::storage::init_failed), help("{hint}"))]
    StorageInit { details: String, hint: String },

    #[error("Error listing files and metadata: {details}")]
    #[diagnostic(code(adls_meta::storage::list_failed), help("{hint}"))]
    StorageList { details: String, hint: String },

    #[error("Storage request failed (HTTP {status}): {details}")]
    #[diagnostic(code(adls_meta::storage::http_status))]
    StorageStatus { status: u16, details: String },

    #[error("Storage request failed: {details}")]
    #[diagnostic(code(adls_meta::storage::request_failed))]
    StorageRequest { details: String },

    #[error("Unexpected storage response: {details}")]
    #[diagnostic(code(adls_meta::storage::invalid_response))]
    StorageInvalidResponse { details: String },

    // ========================================================================
    // Generic Errors
    // ========================================================================
    #[error("I/O error: {0}")]
    #[diagnostic(code(adls_meta::io::error))]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    #[diagnostic(code(adls_meta::json::error))]
    Json(String),
}

impl From<serde_json::Error> for ViewerError {
    fn from(err: serde_json::Error) -> Self {
        ViewerError::Json(err.to_string())
    }
}

impl From<toml_edit::de::Error> for ViewerError {
    fn from(source: toml_edit::de::Error) -> Self {
        ViewerError::ConfigParseError { source }
    }
}

pub type Result<T> = std::result::Result<T, ViewerError>;
