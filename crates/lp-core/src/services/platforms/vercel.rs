use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use super::{repo_name_from_url, PlatformAdapter, Provisioned};
use crate::error::{DeployError, Result};

pub struct VercelAdapter {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

#[derive(Deserialize)]
struct Deployment {
    id: String,
    url: String,
}

impl VercelAdapter {
    pub fn new(client: reqwest::Client, base_url: String, token: String) -> Self {
        Self {
            client,
            base_url,
            token,
        }
    }

    fn error(&self, message: impl Into<String>) -> DeployError {
        DeployError::Platform {
            platform: "vercel".into(),
            message: message.into(),
        }
    }

    /// `owner/repo` slug from an https clone URL.
    fn git_slug(&self, repo_url: &str) -> Result<String> {
        let trimmed = repo_url
            .trim_end_matches('/')
            .trim_end_matches(".git");
        let mut segments = trimmed.rsplit('/');
        let repo = segments.next();
        let owner = segments.next();
        match (owner, repo) {
            (Some(owner), Some(repo)) if !owner.contains(':') && !owner.is_empty() => {
                Ok(format!("{owner}/{repo}"))
            }
            _ => Err(self.error(format!("cannot derive owner/repo from '{repo_url}'"))),
        }
    }
}

#[async_trait]
impl PlatformAdapter for VercelAdapter {
    fn id(&self) -> &'static str {
        "vercel"
    }

    async fn provision(
        &self,
        repo_url: &str,
        env: &BTreeMap<String, String>,
    ) -> Result<Provisioned> {
        let slug = self.git_slug(repo_url)?;
        let env_entries: Vec<_> = env
            .iter()
            .map(|(k, v)| json!({"key": k, "value": v, "type": "encrypted"}))
            .collect();
        let body = json!({
            "name": repo_name_from_url(repo_url),
            "gitSource": {"type": "github", "repo": slug, "ref": "main"},
            "env": env_entries,
            "framework": null,
        });

        let response = self
            .client
            .post(format!("{}/deployments", self.base_url))
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.error(format!("request failed: {e}")))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(self.error(format!(
                "deployment returned {status}: {}",
                body.chars().take(200).collect::<String>().trim()
            )));
        }
        let deployment: Deployment = response
            .json()
            .await
            .map_err(|e| self.error(format!("bad deployment body: {e}")))?;

        Ok(Provisioned {
            service_url: format!("https://{}", deployment.url),
            service_id: deployment.id,
        })
    }
}
