use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};

use crate::error::{DeployError, Result};
use crate::models::{
    ConfigureReport, Credentials, DeploymentRequest, DeploymentResult, Endpoints, Readiness,
    Stage, StageOutcome,
};
use crate::services::configurators::{
    BusinessOpsConfigurator, CicdConfigurator, DomainConfigurator, EmailConfigurator,
    MonitoringConfigurator,
};
use crate::services::platforms::{build_registry, PlatformAdapter};
use crate::services::repo_host::RepoHost;
use crate::services::verifier::Verifier;
use crate::services::source_sync;

const HTTP_TIMEOUT: Duration = Duration::from_secs(120);

// Upper bound for each best-effort configurator. A hung provider turns into
// a degraded outcome, never a hung pipeline.
const CONFIGURE_TIMEOUT: Duration = Duration::from_secs(60);

/// Snapshot of what the current credential set can do, for operator-facing
/// status output. Never includes secret values.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilityReport {
    pub platforms: Vec<String>,
    pub email_backend: Option<String>,
    pub domain_management: bool,
    pub monitoring: bool,
    pub cicd: bool,
    pub readiness: Readiness,
}

/// The deployment pipeline. Owns one configured instance of every service
/// and runs them in a fixed stage order; construction is side-effect free.
pub struct Deployer {
    credentials: Credentials,
    repo_host: RepoHost,
    platforms: HashMap<String, Arc<dyn PlatformAdapter>>,
    domain: DomainConfigurator,
    monitoring: MonitoringConfigurator,
    cicd: CicdConfigurator,
    email: EmailConfigurator,
    business: BusinessOpsConfigurator,
    verifier: Verifier,
}

impl Deployer {
    pub fn new(credentials: Credentials) -> Self {
        Self::with_endpoints(credentials, Endpoints::default())
    }

    pub fn with_endpoints(credentials: Credentials, endpoints: Endpoints) -> Self {
        let client = reqwest::Client::builder()
            .user_agent("launchpad")
            .timeout(HTTP_TIMEOUT)
            .build()
            .expect("reqwest client with static configuration");

        let repo_host = RepoHost::new(
            client.clone(),
            endpoints.repo_host.clone(),
            credentials.get("GITHUB_TOKEN").map(String::from),
        );
        let platforms = build_registry(&credentials, &endpoints, &client);
        let domain = DomainConfigurator::new(
            client.clone(),
            endpoints.godaddy.clone(),
            credentials.get("GODADDY_API_KEY").map(String::from),
            credentials.get("GODADDY_SECRET").map(String::from),
        );
        let monitoring = MonitoringConfigurator::new(
            client.clone(),
            endpoints.datadog.clone(),
            credentials.get("SENTRY_DSN").map(String::from),
            credentials.get("DATADOG_API_KEY").map(String::from),
            credentials.get("DATADOG_APP_KEY").map(String::from),
        );
        let cicd = CicdConfigurator::new(
            client.clone(),
            endpoints.repo_host.clone(),
            credentials.get("GITHUB_TOKEN").map(String::from),
        );
        let email = EmailConfigurator::new(client.clone(), &endpoints, &credentials);
        let business = BusinessOpsConfigurator::new(&credentials);
        let verifier = Verifier::new(client);

        Self {
            credentials,
            repo_host,
            platforms,
            domain,
            monitoring,
            cicd,
            email,
            business,
            verifier,
        }
    }

    /// Platform identifiers with a usable adapter, sorted for stable output.
    pub fn registered_platforms(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.platforms.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn capability_report(&self) -> CapabilityReport {
        CapabilityReport {
            platforms: self.registered_platforms(),
            email_backend: self
                .email
                .active_backend()
                .map(|b| format!("{b:?}").to_lowercase()),
            domain_management: self.credentials.has("GODADDY_API_KEY")
                && self.credentials.has("GODADDY_SECRET"),
            monitoring: self.credentials.has("SENTRY_DSN")
                || self.credentials.has("DATADOG_API_KEY"),
            cicd: self.credentials.has("GITHUB_TOKEN"),
            readiness: self.credentials.readiness(),
        }
    }

    pub fn repo_host(&self) -> &RepoHost {
        &self.repo_host
    }

    /// Run the full pipeline. Never returns an error: fatal failures are the
    /// last entry of the stage log with `success: false` on the result.
    pub async fn deploy(&self, request: &DeploymentRequest) -> DeploymentResult {
        let mut result = DeploymentResult {
            success: false,
            app_url: None,
            repo_url: None,
            platform: None,
            deployment_id: None,
            verification: None,
            error: None,
            stages: Vec::new(),
            timestamp: Utc::now(),
        };

        match self.run(request, &mut result).await {
            Ok(()) => {
                result.success = true;
                info!(
                    app = %request.app_name,
                    platform = %request.platform_id,
                    url = result.app_url.as_deref().unwrap_or_default(),
                    "deployment complete"
                );
            }
            Err(e) => {
                result.error = Some(e.to_string());
                warn!(app = %request.app_name, error = %e, "deployment failed");
            }
        }
        result
    }

    async fn run(
        &self,
        request: &DeploymentRequest,
        result: &mut DeploymentResult,
    ) -> Result<()> {
        // Platform membership is checked before anything is created, so an
        // unknown identifier leaves no repository behind.
        let Some(adapter) = self.platforms.get(&request.platform_id) else {
            let err = DeployError::PlatformUnavailable {
                requested: request.platform_id.clone(),
                available: self.registered_platforms(),
            };
            result
                .stages
                .push(StageOutcome::fatal(Stage::SelectPlatform, err.to_string()));
            return Err(err);
        };
        result.platform = Some(request.platform_id.clone());

        // The generated name is unique per attempt; retries never collide
        // with a half-created earlier run.
        let repo_name = format!("{}-{}", request.app_name, Utc::now().timestamp_millis());
        info!(repo = %repo_name, "creating source repository");
        let repo = match self
            .repo_host
            .create_repository(&repo_name, "Deployed by launchpad", false)
            .await
        {
            Ok(repo) => repo,
            Err(e) => {
                result
                    .stages
                    .push(StageOutcome::fatal(Stage::CreateRepo, e.to_string()));
                return Err(e);
            }
        };
        result.repo_url = Some(repo.html_url.clone());
        result.stages.push(
            StageOutcome::ok(Stage::CreateRepo, format!("repository {} created", repo.full_name))
                .with_detail(json!({"repoUrl": repo.html_url, "fullName": repo.full_name})),
        );

        let push_url = self.repo_host.authenticated_clone_url(&repo.clone_url);
        if let Err(e) = source_sync::push(&request.source_path, &push_url).await {
            result
                .stages
                .push(StageOutcome::fatal(Stage::PushSource, e.to_string()));
            return Err(e);
        }
        result
            .stages
            .push(StageOutcome::ok(Stage::PushSource, "source pushed to main"));

        let env = self.credentials.deployment_env(&request.platform_id);
        match self.repo_host.set_secrets(&repo.full_name, &env).await {
            Ok(stored) => result.stages.push(StageOutcome::ok(
                Stage::InjectSecrets,
                format!("{stored} secrets configured"),
            )),
            Err(e) => {
                warn!(error = %e, "secret injection degraded");
                result
                    .stages
                    .push(StageOutcome::degraded(Stage::InjectSecrets, e.to_string()));
            }
        }

        result.stages.push(StageOutcome::ok(
            Stage::SelectPlatform,
            format!("platform '{}' selected", adapter.id()),
        ));

        info!(platform = %request.platform_id, "provisioning deployment");
        let provisioned = match adapter.provision(&repo.html_url, &env).await {
            Ok(p) => p,
            Err(e) => {
                result
                    .stages
                    .push(StageOutcome::fatal(Stage::Deploy, e.to_string()));
                return Err(e);
            }
        };
        result.app_url = Some(provisioned.service_url.clone());
        result.deployment_id = Some(provisioned.service_id.clone());
        result.stages.push(
            StageOutcome::ok(
                Stage::Deploy,
                format!("deployed to {}", provisioned.service_url),
            )
            .with_detail(json!({
                "serviceUrl": provisioned.service_url,
                "serviceId": provisioned.service_id,
            })),
        );

        if let Some(domain) = &request.custom_domain {
            let report = self.domain.configure(domain, &provisioned.service_url).await;
            if report.success {
                // The custom domain becomes the canonical URL only once the
                // registrar accepted it.
                result.app_url = Some(format!("https://{domain}"));
            }
            result
                .stages
                .push(report_outcome(Stage::BindDomain, Ok(report)));
        }

        let app_url = result
            .app_url
            .clone()
            .unwrap_or_else(|| provisioned.service_url.clone());
        let (monitoring, cicd, email, business) = tokio::join!(
            tokio::time::timeout(
                CONFIGURE_TIMEOUT,
                self.monitoring.configure(&app_url, &repo_name),
            ),
            tokio::time::timeout(
                CONFIGURE_TIMEOUT,
                self.cicd.configure(&repo.full_name, &request.platform_id),
            ),
            tokio::time::timeout(CONFIGURE_TIMEOUT, self.email.configure(&app_url, &repo_name)),
            tokio::time::timeout(
                CONFIGURE_TIMEOUT,
                self.business.configure(&app_url, &repo_name),
            ),
        );
        for (stage, report) in [
            (Stage::Monitoring, monitoring),
            (Stage::Cicd, cicd),
            (Stage::Email, email),
            (Stage::BusinessOps, business),
        ] {
            result.stages.push(report_outcome(stage, report.map_err(|_| ())));
        }

        let verification = self.verifier.verify(&app_url).await;
        let outcome = if verification.overall_status {
            StageOutcome::ok(Stage::Verify, "health and main page responding")
        } else {
            let message = verification
                .error
                .clone()
                .unwrap_or_else(|| "verification probes returned non-success".to_string());
            warn!(%message, "verification degraded");
            StageOutcome::degraded(Stage::Verify, message)
        };
        let outcome = match serde_json::to_value(&verification) {
            Ok(detail) => outcome.with_detail(detail),
            Err(_) => outcome,
        };
        result.stages.push(outcome);
        result.verification = Some(verification);

        Ok(())
    }
}

fn report_outcome(
    stage: Stage,
    report: std::result::Result<ConfigureReport, ()>,
) -> StageOutcome {
    match report {
        Ok(report) if report.success => {
            let outcome = StageOutcome::ok(stage, report.message);
            match report.detail {
                Some(detail) => outcome.with_detail(detail),
                None => outcome,
            }
        }
        Ok(report) => {
            warn!(stage = stage.as_str(), message = %report.message, "configurator degraded");
            let outcome = StageOutcome::degraded(stage, report.message);
            match report.detail {
                Some(detail) => outcome.with_detail(detail),
                None => outcome,
            }
        }
        Err(()) => {
            warn!(stage = stage.as_str(), "configurator timed out");
            StageOutcome::degraded(stage, "configuration timed out")
        }
    }
}
