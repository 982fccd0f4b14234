use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProfileError {
    #[error("frame `{key}` is not part of this profile")]
    FrameNotFound { key: String },
    #[error("sample weight must be finite and non-negative, got {weight}")]
    InvalidWeight { weight: f64 },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid value: {0}")]
    Invalid(String),
}
