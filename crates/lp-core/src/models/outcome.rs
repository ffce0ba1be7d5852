use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Pipeline stages, in declared order. The stage log always lists outcomes
/// in this order regardless of how the underlying work was scheduled.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    SelectPlatform,
    CreateRepo,
    PushSource,
    InjectSecrets,
    Deploy,
    BindDomain,
    Monitoring,
    Cicd,
    Email,
    BusinessOps,
    Verify,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::SelectPlatform => "select_platform",
            Stage::CreateRepo => "create_repo",
            Stage::PushSource => "push_source",
            Stage::InjectSecrets => "inject_secrets",
            Stage::Deploy => "deploy",
            Stage::BindDomain => "bind_domain",
            Stage::Monitoring => "monitoring",
            Stage::Cicd => "cicd",
            Stage::Email => "email",
            Stage::BusinessOps => "business_ops",
            Stage::Verify => "verify",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum StageStatus {
    Ok,
    Degraded,
    Fatal,
}

/// One entry of the ordered stage log. Never mutated after append.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageOutcome {
    pub stage: Stage,
    pub status: StageStatus,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<Value>,
}

impl StageOutcome {
    pub fn ok(stage: Stage, message: impl Into<String>) -> Self {
        Self {
            stage,
            status: StageStatus::Ok,
            message: message.into(),
            detail: None,
        }
    }

    pub fn degraded(stage: Stage, message: impl Into<String>) -> Self {
        Self {
            stage,
            status: StageStatus::Degraded,
            message: message.into(),
            detail: None,
        }
    }

    pub fn fatal(stage: Stage, message: impl Into<String>) -> Self {
        Self {
            stage,
            status: StageStatus::Fatal,
            message: message.into(),
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: Value) -> Self {
        self.detail = Some(detail);
        self
    }
}

/// Normalized result of one best-effort post-deploy configurator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigureReport {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<Value>,
}

impl ConfigureReport {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            error: None,
            detail: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        let error = error.into();
        Self {
            success: false,
            message: error.clone(),
            error: Some(error),
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: Value) -> Self {
        self.detail = Some(detail);
        self
    }
}

/// Post-deploy probe evidence. Informational only: a failed verification
/// never flips `DeploymentResult::success`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationResult {
    pub health_check_ok: bool,
    pub main_page_ok: bool,
    pub overall_status: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// The single structured result of one `deploy` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repo_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deployment_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification: Option<VerificationResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub stages: Vec<StageOutcome>,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_serializes_snake_case() {
        let json = serde_json::to_string(&Stage::BusinessOps).unwrap();
        assert_eq!(json, "\"business_ops\"");
    }

    #[test]
    fn outcome_detail_is_omitted_when_absent() {
        let outcome = StageOutcome::ok(Stage::CreateRepo, "created");
        let json = serde_json::to_string(&outcome).unwrap();
        assert!(json.contains("\"stage\":\"create_repo\""));
        assert!(!json.contains("detail"));
    }

    #[test]
    fn failure_report_mirrors_error_into_message() {
        let report = ConfigureReport::failure("registrar unreachable");
        assert!(!report.success);
        assert_eq!(report.message, "registrar unreachable");
        assert_eq!(report.error.as_deref(), Some("registrar unreachable"));
    }
}
