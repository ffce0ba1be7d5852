//! Best-effort post-deploy setup steps. Every configurator normalizes its
//! provider calls to a [`ConfigureReport`](crate::models::ConfigureReport);
//! none of them can fail the pipeline.

pub mod business;
pub mod cicd;
pub mod domain;
pub mod email;
pub mod monitoring;

pub use business::BusinessOpsConfigurator;
pub use cicd::CicdConfigurator;
pub use domain::DomainConfigurator;
pub use email::EmailConfigurator;
pub use monitoring::MonitoringConfigurator;

/// Bare host of a service URL: scheme and path stripped.
pub(crate) fn host_of(url: &str) -> &str {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .unwrap_or(url);
    rest.split('/').next().unwrap_or(rest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_extraction() {
        assert_eq!(host_of("https://demo.up.railway.app/path"), "demo.up.railway.app");
        assert_eq!(host_of("http://demo.test"), "demo.test");
        assert_eq!(host_of("demo.test/x"), "demo.test");
    }
}
