use std::time::Duration;

use serde::Serialize;
use serde_json::json;

use crate::models::ConfigureReport;

const PROBE_TIMEOUT: Duration = Duration::from_secs(30);

/// Monitoring setup: error tracking, a metrics dashboard when a provider key
/// is present, and two direct probes. Succeeds when at least one sub-setup
/// succeeded; the individual results ride along in the report detail.
pub struct MonitoringConfigurator {
    client: reqwest::Client,
    datadog_base_url: String,
    sentry_dsn: Option<String>,
    datadog_api_key: Option<String>,
    datadog_app_key: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SubResult {
    service: &'static str,
    success: bool,
    message: String,
}

impl SubResult {
    fn ok(service: &'static str, message: impl Into<String>) -> Self {
        Self {
            service,
            success: true,
            message: message.into(),
        }
    }

    fn failed(service: &'static str, message: impl Into<String>) -> Self {
        Self {
            service,
            success: false,
            message: message.into(),
        }
    }
}

impl MonitoringConfigurator {
    pub fn new(
        client: reqwest::Client,
        datadog_base_url: String,
        sentry_dsn: Option<String>,
        datadog_api_key: Option<String>,
        datadog_app_key: Option<String>,
    ) -> Self {
        Self {
            client,
            datadog_base_url,
            sentry_dsn,
            datadog_api_key,
            datadog_app_key,
        }
    }

    pub async fn configure(&self, app_url: &str, repo_name: &str) -> ConfigureReport {
        let mut results = Vec::new();

        if self.sentry_dsn.is_some() {
            // The DSN is baked into the deployed environment; nothing to
            // provision on the provider side.
            results.push(SubResult::ok("sentry", "error tracking configured"));
        }

        if self.datadog_api_key.is_some() {
            results.push(self.create_datadog_dashboard(app_url, repo_name).await);
        }

        results.push(self.probe("health_check", &format!("{app_url}/api/health")).await);
        results.push(self.probe("uptime", app_url).await);

        let configured = results.iter().filter(|r| r.success).count();
        let total = results.len();
        let detail = json!({ "services": results });
        if configured > 0 {
            ConfigureReport::success(format!(
                "monitoring configured: {configured}/{total} services"
            ))
            .with_detail(detail)
        } else {
            ConfigureReport::failure("no monitoring service could be configured").with_detail(detail)
        }
    }

    async fn create_datadog_dashboard(&self, app_url: &str, repo_name: &str) -> SubResult {
        let api_key = self.datadog_api_key.as_deref().unwrap_or_default();
        let body = json!({
            "title": format!("{repo_name} - Application Monitoring"),
            "description": format!("Monitoring dashboard for {app_url}"),
            "layout_type": "ordered",
            "widgets": [
                {"definition": {
                    "type": "timeseries",
                    "title": "CPU Usage",
                    "requests": [{"q": format!("avg:system.cpu.user{{app:{repo_name}}}"), "display_type": "line"}],
                }},
                {"definition": {
                    "type": "timeseries",
                    "title": "Memory Usage",
                    "requests": [{"q": format!("avg:system.mem.used{{app:{repo_name}}}"), "display_type": "line"}],
                }},
            ],
        });

        let result = self
            .client
            .post(format!("{}/dashboard", self.datadog_base_url))
            .header("DD-API-KEY", api_key)
            .header(
                "DD-APPLICATION-KEY",
                self.datadog_app_key.as_deref().unwrap_or_default(),
            )
            .json(&body)
            .send()
            .await;
        match result {
            Ok(response) if response.status().is_success() => {
                SubResult::ok("datadog", "monitoring dashboard created")
            }
            Ok(response) => SubResult::failed(
                "datadog",
                format!("dashboard creation returned {}", response.status()),
            ),
            Err(e) => SubResult::failed("datadog", format!("dashboard creation failed: {e}")),
        }
    }

    async fn probe(&self, service: &'static str, url: &str) -> SubResult {
        let result = self.client.get(url).timeout(PROBE_TIMEOUT).send().await;
        match result {
            Ok(response) if response.status().is_success() => {
                SubResult::ok(service, format!("{url} responding"))
            }
            Ok(response) => {
                SubResult::failed(service, format!("{url} returned {}", response.status()))
            }
            Err(e) => SubResult::failed(service, format!("{url} unreachable: {e}")),
        }
    }
}
