#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    #[error("platform '{requested}' not available. Available: [{}]", available.join(", "))]
    PlatformUnavailable {
        requested: String,
        available: Vec<String>,
    },

    #[error("repository creation failed: {0}")]
    RepoHost(String),

    #[error("secret injection failed: {0}")]
    SecretInjection(String),

    #[error("source push failed: {0}")]
    SourceSync(String),

    #[error("git operation failed: {0}")]
    Git(String),

    #[error("{platform} deployment failed: {message}")]
    Platform { platform: String, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, DeployError>;
