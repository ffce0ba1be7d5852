use serde_json::json;

use crate::models::{ConfigureReport, Credentials, Endpoints};

/// Which email provider an `EmailConfigurator` call will talk to. Picked
/// deterministically from the present credentials in a fixed priority order;
/// at most one backend is attempted per call, with no fallback cascading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailBackend {
    Mailchimp,
    Sendgrid,
    Mailgun,
}

pub struct EmailConfigurator {
    client: reqwest::Client,
    mailchimp_base_url: String,
    sendgrid_base_url: String,
    mailgun_base_url: String,
    mailchimp_api_key: Option<String>,
    sendgrid_api_key: Option<String>,
    mailgun_api_key: Option<String>,
    mailgun_domain: String,
}

impl EmailConfigurator {
    pub fn new(client: reqwest::Client, endpoints: &Endpoints, credentials: &Credentials) -> Self {
        // Every Mailchimp key is bound to a server prefix; honor it unless
        // an explicit endpoint override is in effect.
        let mailchimp_base_url = match credentials.get("MAILCHIMP_SERVER") {
            Some(server) if endpoints.mailchimp == Endpoints::default().mailchimp => {
                Endpoints::mailchimp_for_server(server)
            }
            _ => endpoints.mailchimp.clone(),
        };
        Self {
            client,
            mailchimp_base_url,
            sendgrid_base_url: endpoints.sendgrid.clone(),
            mailgun_base_url: endpoints.mailgun.clone(),
            mailchimp_api_key: credentials.get("MAILCHIMP_API_KEY").map(String::from),
            sendgrid_api_key: credentials.get("SENDGRID_API_KEY").map(String::from),
            mailgun_api_key: credentials.get("MAILGUN_API_KEY").map(String::from),
            mailgun_domain: credentials
                .get("MAILGUN_DOMAIN")
                .unwrap_or("sandbox.mailgun.org")
                .to_string(),
        }
    }

    pub fn active_backend(&self) -> Option<EmailBackend> {
        if self.mailchimp_api_key.is_some() {
            Some(EmailBackend::Mailchimp)
        } else if self.sendgrid_api_key.is_some() {
            Some(EmailBackend::Sendgrid)
        } else if self.mailgun_api_key.is_some() {
            Some(EmailBackend::Mailgun)
        } else {
            None
        }
    }

    pub async fn configure(&self, app_url: &str, repo_name: &str) -> ConfigureReport {
        match self.active_backend() {
            Some(EmailBackend::Mailchimp) => self.setup_mailchimp(app_url, repo_name).await,
            Some(EmailBackend::Sendgrid) => self.setup_sendgrid(app_url, repo_name).await,
            Some(EmailBackend::Mailgun) => self.setup_mailgun().await,
            None => ConfigureReport::failure("no email service credentials available"),
        }
    }

    async fn setup_mailchimp(&self, _app_url: &str, repo_name: &str) -> ConfigureReport {
        let key = self.mailchimp_api_key.as_deref().unwrap_or_default();
        let body = json!({
            "type": "regular",
            "settings": {
                "subject_line": "Your application has been deployed",
                "title": format!("{repo_name} deployment notification"),
                "from_name": "Launchpad",
            },
        });
        let result = self
            .client
            .post(format!("{}/campaigns", self.mailchimp_base_url))
            .bearer_auth(key)
            .json(&body)
            .send()
            .await;
        match result {
            Ok(response) if response.status().is_success() => {
                ConfigureReport::success("mailchimp notifications configured")
                    .with_detail(json!({"backend": "mailchimp"}))
            }
            Ok(response) => ConfigureReport::failure(format!(
                "mailchimp setup returned {}",
                response.status()
            )),
            Err(e) => ConfigureReport::failure(format!("mailchimp setup failed: {e}")),
        }
    }

    async fn setup_sendgrid(&self, app_url: &str, repo_name: &str) -> ConfigureReport {
        let key = self.sendgrid_api_key.as_deref().unwrap_or_default();
        let body = json!({
            "name": format!("{repo_name}-deployment-notification"),
            "generation": "dynamic",
        });
        let result = self
            .client
            .post(format!("{}/templates", self.sendgrid_base_url))
            .bearer_auth(key)
            .json(&body)
            .send()
            .await;
        match result {
            Ok(response) if response.status().is_success() => {
                ConfigureReport::success("sendgrid notifications configured")
                    .with_detail(json!({"backend": "sendgrid", "appUrl": app_url}))
            }
            Ok(response) => ConfigureReport::failure(format!(
                "sendgrid setup returned {}",
                response.status()
            )),
            Err(e) => ConfigureReport::failure(format!("sendgrid setup failed: {e}")),
        }
    }

    async fn setup_mailgun(&self) -> ConfigureReport {
        let key = self.mailgun_api_key.as_deref().unwrap_or_default();
        let result = self
            .client
            .get(format!(
                "{}/{}/stats/total",
                self.mailgun_base_url, self.mailgun_domain
            ))
            .basic_auth("api", Some(key))
            .send()
            .await;
        match result {
            Ok(response) if response.status().is_success() => {
                ConfigureReport::success("mailgun notifications configured").with_detail(
                    json!({"backend": "mailgun", "domain": self.mailgun_domain}),
                )
            }
            Ok(response) => ConfigureReport::failure(format!(
                "mailgun connection returned {}",
                response.status()
            )),
            Err(e) => ConfigureReport::failure(format!("mailgun connection failed: {e}")),
        }
    }
}
