use serde::Deserialize;
use serde_json::json;

use super::host_of;
use crate::models::ConfigureReport;

/// Custom-domain binding against a GoDaddy-style registrar: availability
/// check, conditional registration, DNS record configuration. Any of the
/// three steps failing aborts just this configurator's attempt; the
/// platform-provided URL stays canonical.
pub struct DomainConfigurator {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    secret: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Availability {
    #[serde(default)]
    available: bool,
    #[serde(default)]
    price: u64,
    #[serde(default)]
    currency: Option<String>,
}

impl DomainConfigurator {
    pub fn new(
        client: reqwest::Client,
        base_url: String,
        api_key: Option<String>,
        secret: Option<String>,
    ) -> Self {
        Self {
            client,
            base_url,
            api_key,
            secret,
        }
    }

    fn auth_header(&self) -> Option<String> {
        match (&self.api_key, &self.secret) {
            (Some(key), Some(secret)) => Some(format!("sso-key {key}:{secret}")),
            _ => None,
        }
    }

    pub async fn configure(&self, domain: &str, app_url: &str) -> ConfigureReport {
        let Some(auth) = self.auth_header() else {
            return ConfigureReport::failure("registrar credentials not available");
        };

        let availability = match self.check_availability(domain, &auth).await {
            Ok(a) => a,
            Err(e) => return ConfigureReport::failure(e),
        };

        if availability.available {
            if let Err(e) = self.register(domain, &auth).await {
                return ConfigureReport::failure(e);
            }
        }

        if let Err(e) = self.configure_dns(domain, app_url, &auth).await {
            return ConfigureReport::failure(e);
        }

        ConfigureReport::success(format!("domain {domain} configured")).with_detail(json!({
            "registered": availability.available,
            "price": availability.price,
            "currency": availability.currency,
        }))
    }

    async fn check_availability(&self, domain: &str, auth: &str) -> Result<Availability, String> {
        let response = self
            .client
            .get(format!("{}/domains/available", self.base_url))
            .query(&[("domain", domain)])
            .header("Authorization", auth)
            .send()
            .await
            .map_err(|e| format!("availability check failed: {e}"))?;
        if !response.status().is_success() {
            return Err(format!(
                "availability check returned {}",
                response.status()
            ));
        }
        response
            .json::<Availability>()
            .await
            .map_err(|e| format!("bad availability body: {e}"))
    }

    async fn register(&self, domain: &str, auth: &str) -> Result<(), String> {
        let response = self
            .client
            .post(format!("{}/domains/purchase", self.base_url))
            .header("Authorization", auth)
            .json(&json!({
                "domain": domain,
                "period": 1,
                "renewAuto": true,
                "privacy": true,
            }))
            .send()
            .await
            .map_err(|e| format!("registration failed: {e}"))?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(format!("registration returned {status}"))
        }
    }

    async fn configure_dns(&self, domain: &str, app_url: &str, auth: &str) -> Result<(), String> {
        let target_host = host_of(app_url);
        let records = json!([
            {"type": "A", "name": "@", "data": target_host, "ttl": 3600},
            {"type": "CNAME", "name": "www", "data": domain, "ttl": 3600},
        ]);
        let response = self
            .client
            .put(format!("{}/domains/{domain}/records", self.base_url))
            .header("Authorization", auth)
            .json(&records)
            .send()
            .await
            .map_err(|e| format!("DNS configuration failed: {e}"))?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(format!("DNS configuration returned {status}"))
        }
    }
}
