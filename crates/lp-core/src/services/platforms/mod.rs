pub mod railway;
pub mod render;
pub mod vercel;

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::Result;
use crate::models::{Credentials, Endpoints};

pub use railway::RailwayAdapter;
pub use render::RenderAdapter;
pub use vercel::VercelAdapter;

/// A running service provisioned on one hosting platform.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Provisioned {
    pub service_url: String,
    pub service_id: String,
}

/// One hosting platform behind a uniform provisioning call. Provisioning may
/// create billable resources and is not idempotent; callers retry only with a
/// freshly generated deployment name.
#[async_trait]
pub trait PlatformAdapter: Send + Sync {
    fn id(&self) -> &'static str;

    /// Provision one deployment of `repo_url` with the given environment.
    /// Errors carry the platform's status/response summary, including the
    /// identifier of any partially created resource.
    async fn provision(
        &self,
        repo_url: &str,
        env: &BTreeMap<String, String>,
    ) -> Result<Provisioned>;
}

/// Build the adapter registry from whichever platform credentials are
/// present. Selecting a platform is a registry lookup, never a branch in the
/// orchestrator.
pub fn build_registry(
    credentials: &Credentials,
    endpoints: &Endpoints,
    client: &reqwest::Client,
) -> HashMap<String, Arc<dyn PlatformAdapter>> {
    let mut registry: HashMap<String, Arc<dyn PlatformAdapter>> = HashMap::new();
    if let Some(key) = credentials.get("RENDER_API_KEY") {
        registry.insert(
            "render".into(),
            Arc::new(RenderAdapter::new(
                client.clone(),
                endpoints.render.clone(),
                key.to_string(),
            )),
        );
    }
    if let Some(token) = credentials.get("RAILWAY_TOKEN") {
        registry.insert(
            "railway".into(),
            Arc::new(RailwayAdapter::new(
                client.clone(),
                endpoints.railway.clone(),
                token.to_string(),
            )),
        );
    }
    if let Some(token) = credentials.get("VERCEL_TOKEN") {
        registry.insert(
            "vercel".into(),
            Arc::new(VercelAdapter::new(
                client.clone(),
                endpoints.vercel.clone(),
                token.to_string(),
            )),
        );
    }
    registry
}

/// Last path segment of a repository URL, without a `.git` suffix. Used as
/// the platform-side deployment name; the repo name is already unique per
/// attempt, so the service name inherits that uniqueness.
pub(crate) fn repo_name_from_url(repo_url: &str) -> String {
    repo_url
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(repo_url)
        .trim_end_matches(".git")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_contains_only_credentialed_platforms() {
        let creds = Credentials::from_map([("RAILWAY_TOKEN", "t")]);
        let registry = build_registry(&creds, &Endpoints::default(), &reqwest::Client::new());
        assert!(registry.contains_key("railway"));
        assert!(!registry.contains_key("render"));
        assert!(!registry.contains_key("vercel"));
    }

    #[test]
    fn repo_name_extraction() {
        assert_eq!(
            repo_name_from_url("https://github.test/me/demo-123.git"),
            "demo-123"
        );
        assert_eq!(repo_name_from_url("https://github.test/me/demo"), "demo");
        assert_eq!(repo_name_from_url("/tmp/remotes/demo.git"), "demo");
    }
}
