use std::time::Duration;

use crate::models::VerificationResult;

const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(30);

/// Post-deploy smoke check. Probes the health endpoint and the main page of
/// the deployed application; a slow or unreachable app never raises, the
/// failure is captured on the [`VerificationResult`] instead.
pub struct Verifier {
    client: reqwest::Client,
    timeout: Duration,
}

impl Verifier {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            timeout: DEFAULT_PROBE_TIMEOUT,
        }
    }

    pub fn with_timeout(client: reqwest::Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    pub async fn verify(&self, app_url: &str) -> VerificationResult {
        let base = app_url.trim_end_matches('/');
        let mut result = VerificationResult::default();

        match self.probe(&format!("{base}/api/health")).await {
            Ok(ok) => result.health_check_ok = ok,
            Err(e) => result.error = Some(format!("health check failed: {e}")),
        }
        match self.probe(base).await {
            Ok(ok) => result.main_page_ok = ok,
            Err(e) => {
                if result.error.is_none() {
                    result.error = Some(format!("main page check failed: {e}"));
                }
            }
        }

        result.overall_status = result.health_check_ok && result.main_page_ok;
        result
    }

    async fn probe(&self, url: &str) -> std::result::Result<bool, reqwest::Error> {
        let response = self.client.get(url).timeout(self.timeout).send().await?;
        Ok(response.status().is_success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn healthy_app_passes_both_probes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/health"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let result = Verifier::new(reqwest::Client::new()).verify(&server.uri()).await;
        assert!(result.health_check_ok);
        assert!(result.main_page_ok);
        assert!(result.overall_status);
        assert!(result.error.is_none());
    }

    #[tokio::test]
    async fn missing_health_endpoint_fails_overall() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/health"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let result = Verifier::new(reqwest::Client::new()).verify(&server.uri()).await;
        assert!(!result.health_check_ok);
        assert!(result.main_page_ok);
        assert!(!result.overall_status);
    }

    #[tokio::test]
    async fn slow_app_times_out_without_panicking() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
            .mount(&server)
            .await;

        let verifier =
            Verifier::with_timeout(reqwest::Client::new(), Duration::from_millis(100));
        let result = verifier.verify(&server.uri()).await;
        assert!(!result.overall_status);
        assert!(result.error.is_some());
    }

    #[tokio::test]
    async fn unreachable_app_records_error() {
        let verifier =
            Verifier::with_timeout(reqwest::Client::new(), Duration::from_millis(200));
        let result = verifier.verify("http://127.0.0.1:9").await;
        assert!(!result.health_check_ok);
        assert!(!result.main_page_ok);
        assert!(!result.overall_status);
        assert!(result.error.is_some());
    }
}
