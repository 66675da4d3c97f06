use std::path::PathBuf;

/// Errors raised while registering extra filter options.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("search options are sealed; register them before the first session is created")]
    Sealed,

    #[error("invalid {list} option value {value:?}: values must be non-empty and contain no whitespace")]
    InvalidValue { list: &'static str, value: String },
}

/// Errors raised while building a session or loading its configuration.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid option pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}
