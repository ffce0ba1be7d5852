use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::{json, Value};

use super::{repo_name_from_url, PlatformAdapter, Provisioned};
use crate::error::{DeployError, Result};

const PROJECT_CREATE: &str = "mutation projectCreate($input: ProjectCreateInput!) { projectCreate(input: $input) { id name } }";
const SERVICE_CREATE: &str = "mutation serviceCreate($input: ServiceCreateInput!) { serviceCreate(input: $input) { id name } }";
const VARIABLE_UPSERT: &str = "mutation variableUpsert($input: VariableUpsertInput!) { variableUpsert(input: $input) { id name } }";

/// Railway exposes one GraphQL endpoint; provisioning is a project-create,
/// service-create, variable-upsert sequence against it.
pub struct RailwayAdapter {
    client: reqwest::Client,
    endpoint: String,
    token: String,
}

impl RailwayAdapter {
    pub fn new(client: reqwest::Client, endpoint: String, token: String) -> Self {
        Self {
            client,
            endpoint,
            token,
        }
    }

    fn error(&self, message: impl Into<String>) -> DeployError {
        DeployError::Platform {
            platform: "railway".into(),
            message: message.into(),
        }
    }

    async fn graphql(&self, query: &str, variables: Value) -> Result<Value> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.token)
            .json(&json!({"query": query, "variables": variables}))
            .send()
            .await
            .map_err(|e| self.error(format!("request failed: {e}")))?;
        let status = response.status();
        if !status.is_success() {
            return Err(self.error(format!("API returned {status}")));
        }
        let body: Value = response
            .json()
            .await
            .map_err(|e| self.error(format!("bad response body: {e}")))?;
        if let Some(errors) = body.get("errors").and_then(Value::as_array) {
            let message = errors
                .first()
                .and_then(|e| e.get("message"))
                .and_then(Value::as_str)
                .unwrap_or("unknown GraphQL error");
            return Err(self.error(message.to_string()));
        }
        Ok(body)
    }
}

#[async_trait]
impl PlatformAdapter for RailwayAdapter {
    fn id(&self) -> &'static str {
        "railway"
    }

    async fn provision(
        &self,
        repo_url: &str,
        env: &BTreeMap<String, String>,
    ) -> Result<Provisioned> {
        let project_name = repo_name_from_url(repo_url);

        let body = self
            .graphql(
                PROJECT_CREATE,
                json!({"input": {"name": project_name, "isPublic": false}}),
            )
            .await?;
        let project_id = body
            .pointer("/data/projectCreate/id")
            .and_then(Value::as_str)
            .ok_or_else(|| self.error("project creation returned no id"))?
            .to_string();

        let body = self
            .graphql(
                SERVICE_CREATE,
                json!({"input": {
                    "projectId": project_id,
                    "name": "web",
                    "source": {"repo": repo_url, "branch": "main"},
                }}),
            )
            .await
            // The project already exists at this point; surface its id so
            // the caller can clean it up.
            .map_err(|e| self.error(format!("{e} (orphaned project: {project_id})")))?;
        let service_id = body
            .pointer("/data/serviceCreate/id")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                self.error(format!(
                    "service creation returned no id (orphaned project: {project_id})"
                ))
            })?
            .to_string();

        for (name, value) in env {
            let variables = json!({"input": {
                "projectId": project_id,
                "serviceId": service_id,
                "name": name,
                "value": value,
            }});
            if let Err(e) = self.graphql(VARIABLE_UPSERT, variables).await {
                // The service exists; repo-level secret injection is the
                // fallback channel for variables.
                tracing::warn!(variable = %name, error = %e, "railway variable upsert failed");
            }
        }

        Ok(Provisioned {
            service_url: format!("https://{project_name}.up.railway.app"),
            service_id,
        })
    }
}
