use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// One deployment attempt. Constructed by the caller, immutable afterward.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentRequest {
    /// Local path of the application bundle to deploy.
    pub source_path: PathBuf,
    /// Which registered platform adapter to deploy with.
    pub platform_id: String,
    /// Prefix for the generated, per-attempt-unique repository name.
    pub app_name: String,
    /// Optional custom domain to bind after the deployment succeeds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_domain: Option<String>,
}

impl DeploymentRequest {
    pub fn new(
        source_path: impl Into<PathBuf>,
        platform_id: impl Into<String>,
        app_name: impl Into<String>,
    ) -> Self {
        Self {
            source_path: source_path.into(),
            platform_id: platform_id.into(),
            app_name: app_name.into(),
            custom_domain: None,
        }
    }

    pub fn with_custom_domain(mut self, domain: impl Into<String>) -> Self {
        self.custom_domain = Some(domain.into());
        self
    }
}
