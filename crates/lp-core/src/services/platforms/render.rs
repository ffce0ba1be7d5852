use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use super::{repo_name_from_url, PlatformAdapter, Provisioned};
use crate::error::{DeployError, Result};

pub struct RenderAdapter {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Deserialize)]
struct Owner {
    id: String,
}

#[derive(Deserialize)]
struct ServiceEnvelope {
    service: Service,
}

#[derive(Deserialize)]
struct Service {
    id: String,
    #[serde(rename = "serviceDetails")]
    service_details: ServiceDetails,
}

#[derive(Deserialize)]
struct ServiceDetails {
    url: String,
}

impl RenderAdapter {
    pub fn new(client: reqwest::Client, base_url: String, api_key: String) -> Self {
        Self {
            client,
            base_url,
            api_key,
        }
    }

    fn error(&self, message: impl Into<String>) -> DeployError {
        DeployError::Platform {
            platform: "render".into(),
            message: message.into(),
        }
    }
}

#[async_trait]
impl PlatformAdapter for RenderAdapter {
    fn id(&self) -> &'static str {
        "render"
    }

    async fn provision(
        &self,
        repo_url: &str,
        env: &BTreeMap<String, String>,
    ) -> Result<Provisioned> {
        let response = self
            .client
            .get(format!("{}/users/me", self.base_url))
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| self.error(format!("owner lookup failed: {e}")))?;
        if !response.status().is_success() {
            return Err(self.error(format!("owner lookup returned {}", response.status())));
        }
        let owner: Owner = response
            .json()
            .await
            .map_err(|e| self.error(format!("bad owner body: {e}")))?;

        let env_vars: Vec<_> = env
            .iter()
            .map(|(k, v)| json!({"key": k, "value": v}))
            .collect();
        let body = json!({
            "type": "web_service",
            "name": repo_name_from_url(repo_url),
            "ownerId": owner.id,
            "repo": repo_url,
            "branch": "main",
            "envVars": env_vars,
            "serviceDetails": {
                "plan": "free",
                "region": "oregon",
            },
        });

        let response = self
            .client
            .post(format!("{}/services", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.error(format!("service creation failed: {e}")))?;
        let status = response.status();
        if status != reqwest::StatusCode::CREATED {
            let body = response.text().await.unwrap_or_default();
            return Err(self.error(format!(
                "service creation returned {status}: {}",
                body.chars().take(200).collect::<String>().trim()
            )));
        }
        let envelope: ServiceEnvelope = response
            .json()
            .await
            .map_err(|e| self.error(format!("bad service body: {e}")))?;

        Ok(Provisioned {
            service_url: envelope.service.service_details.url,
            service_id: envelope.service.id,
        })
    }
}
