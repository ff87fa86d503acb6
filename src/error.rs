use thiserror::Error;

#[derive(Error, Debug)]
pub enum PolicyError {
    #[error("Malformed policy document: {0}")]
    MalformedDocument(String),

    #[error("Malformed principal: '{0}' (expected <type>:<id>, type one of user, group, domain, serviceAccount)")]
    MalformedPrincipal(String),

    #[error("Unknown principal type: '{0}' (must be one of user, serviceAccount, domain, or group)")]
    UnknownPrincipalType(String),

    #[error("{0}")]
    Authentication(String),

    #[error("Role lookup failed: {0}")]
    RoleLookup(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, PolicyError>;
