//! End-to-end pipeline tests. External providers are wiremock servers; the
//! source push goes to a local bare git repository.

use std::path::PathBuf;
use std::process::Command;

use tempfile::TempDir;
use wiremock::matchers::{any, method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

use lp_core::models::{Credentials, Endpoints, Stage, StageStatus};
use lp_core::services::Deployer;
use lp_core::DeploymentRequest;

fn git(args: &[&str], cwd: &std::path::Path) {
    let status = Command::new("git")
        .args(args)
        .current_dir(cwd)
        .status()
        .expect("git available");
    assert!(status.success(), "git {args:?} failed");
}

/// A source directory with one file, plus a bare repository to push to.
fn source_and_remote() -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("tempdir");
    let source = dir.path().join("app");
    std::fs::create_dir(&source).expect("source dir");
    std::fs::write(source.join("main.py"), "print('hello')\n").expect("source file");

    let remote = dir.path().join("remote.git");
    std::fs::create_dir(&remote).expect("remote dir");
    git(&["init", "--bare", "--initial-branch=main", "."], &remote);
    (dir, remote)
}

async fn mount_repo_host(server: &MockServer, clone_url: &str) {
    Mock::given(method("POST"))
        .and(path("/user/repos"))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
            "html_url": "https://github.test/me/demo-app",
            "clone_url": clone_url,
            "full_name": "me/demo-app",
        })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/me/demo-app/actions/secrets/public-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "key_id": "key-1", "key": "cGs=",
        })))
        .mount(server)
        .await;
    Mock::given(method("PUT"))
        .and(path_regex(r"^/repos/me/demo-app/actions/secrets/.+$"))
        .respond_with(ResponseTemplate::new(201))
        .mount(server)
        .await;
}

async fn mount_render(server: &MockServer, service_url: &str) {
    Mock::given(method("GET"))
        .and(path("/users/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "own-1"})))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/services"))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
            "service": {
                "id": "srv-1",
                "serviceDetails": {"url": service_url},
            }
        })))
        .mount(server)
        .await;
}

async fn mount_configurators(server: &MockServer) {
    // cicd
    Mock::given(method("PUT"))
        .and(path("/repos/me/demo-app/contents/.github/workflows/deploy.yml"))
        .respond_with(ResponseTemplate::new(201))
        .mount(server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/repos/me/demo-app/branches/main/protection"))
        .respond_with(ResponseTemplate::new(200))
        .mount(server)
        .await;
    Mock::given(method("PUT"))
        .and(path_regex(r"^/repos/me/demo-app/environments/.+$"))
        .respond_with(ResponseTemplate::new(200))
        .mount(server)
        .await;
    // email (sendgrid)
    Mock::given(method("POST"))
        .and(path("/templates"))
        .respond_with(ResponseTemplate::new(201))
        .mount(server)
        .await;
    // monitoring probes and verification share these endpoints
    Mock::given(method("GET"))
        .and(path("/api/health"))
        .respond_with(ResponseTemplate::new(200))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200))
        .mount(server)
        .await;
}

fn full_credentials() -> Credentials {
    Credentials::from_map([
        ("GITHUB_TOKEN", "gh"),
        ("RENDER_API_KEY", "rnd"),
        ("SENDGRID_API_KEY", "sg"),
        ("SENTRY_DSN", "https://x@sentry.test/1"),
        ("GODADDY_API_KEY", "gd"),
        ("GODADDY_SECRET", "gds"),
        ("STRIPE_SECRET_KEY", "sk"),
    ])
}

fn stage_names(result: &lp_core::DeploymentResult) -> Vec<&'static str> {
    result.stages.iter().map(|s| s.stage.as_str()).collect()
}

#[tokio::test]
async fn full_pipeline_logs_every_stage_in_order() {
    let server = MockServer::start().await;
    let (dir, remote) = source_and_remote();
    mount_repo_host(&server, remote.to_str().unwrap()).await;
    mount_render(&server, &server.uri()).await;
    mount_configurators(&server).await;

    let deployer = Deployer::with_endpoints(full_credentials(), Endpoints::all(&server.uri()));
    let request = DeploymentRequest::new(dir.path().join("app"), "render", "demo");
    let result = deployer.deploy(&request).await;

    assert!(result.success, "error: {:?}", result.error);
    assert_eq!(
        stage_names(&result),
        vec![
            "create_repo",
            "push_source",
            "inject_secrets",
            "select_platform",
            "deploy",
            "monitoring",
            "cicd",
            "email",
            "business_ops",
            "verify",
        ]
    );
    assert!(result
        .stages
        .iter()
        .all(|s| s.status == StageStatus::Ok));
    assert_eq!(result.app_url.as_deref(), Some(server.uri().as_str()));
    assert_eq!(result.deployment_id.as_deref(), Some("srv-1"));
    assert!(result.verification.as_ref().is_some_and(|v| v.overall_status));
}

#[tokio::test]
async fn unknown_platform_touches_nothing() {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let creds = Credentials::from_map([("GITHUB_TOKEN", "gh"), ("RENDER_API_KEY", "rnd")]);
    let deployer = Deployer::with_endpoints(creds, Endpoints::all(&server.uri()));
    let request = DeploymentRequest::new("/tmp/nonexistent", "fly", "demo");
    let result = deployer.deploy(&request).await;

    assert!(!result.success);
    assert_eq!(result.stages.len(), 1);
    assert_eq!(result.stages[0].stage, Stage::SelectPlatform);
    assert_eq!(result.stages[0].status, StageStatus::Fatal);
    let error = result.error.expect("error populated");
    assert!(error.contains("fly"));
    assert!(error.contains("render"));
}

#[tokio::test]
async fn repo_creation_failure_halts_before_push() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/user/repos"))
        .respond_with(ResponseTemplate::new(422).set_body_string("name taken"))
        .mount(&server)
        .await;

    let creds = Credentials::from_map([("GITHUB_TOKEN", "gh"), ("RENDER_API_KEY", "rnd")]);
    let deployer = Deployer::with_endpoints(creds, Endpoints::all(&server.uri()));
    let request = DeploymentRequest::new("/tmp/nonexistent", "render", "demo");
    let result = deployer.deploy(&request).await;

    assert!(!result.success);
    assert_eq!(stage_names(&result), vec!["create_repo"]);
    assert_eq!(result.stages[0].status, StageStatus::Fatal);
    assert!(result.repo_url.is_none());
    assert!(result.app_url.is_none());
}

#[tokio::test]
async fn degraded_configurators_do_not_fail_the_deployment() {
    let server = MockServer::start().await;
    let (dir, remote) = source_and_remote();
    mount_repo_host(&server, remote.to_str().unwrap()).await;
    mount_render(&server, &server.uri()).await;
    // No configurator endpoints mounted: cicd, email and monitoring all
    // degrade, and so does verification.

    let creds = Credentials::from_map([("GITHUB_TOKEN", "gh"), ("RENDER_API_KEY", "rnd")]);
    let deployer = Deployer::with_endpoints(creds, Endpoints::all(&server.uri()));
    let request = DeploymentRequest::new(dir.path().join("app"), "render", "demo");
    let result = deployer.deploy(&request).await;

    assert!(result.success);
    let status_of = |stage: Stage| {
        result
            .stages
            .iter()
            .find(|s| s.stage == stage)
            .map(|s| s.status)
    };
    assert_eq!(status_of(Stage::Monitoring), Some(StageStatus::Degraded));
    assert_eq!(status_of(Stage::Cicd), Some(StageStatus::Degraded));
    assert_eq!(status_of(Stage::Email), Some(StageStatus::Degraded));
    assert_eq!(status_of(Stage::BusinessOps), Some(StageStatus::Ok));
    assert_eq!(status_of(Stage::Verify), Some(StageStatus::Degraded));
    assert_eq!(result.app_url.as_deref(), Some(server.uri().as_str()));
}

#[tokio::test]
async fn domain_failure_keeps_the_platform_url() {
    let server = MockServer::start().await;
    let (dir, remote) = source_and_remote();
    mount_repo_host(&server, remote.to_str().unwrap()).await;
    mount_render(&server, &server.uri()).await;
    mount_configurators(&server).await;
    Mock::given(method("GET"))
        .and(path("/domains/available"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "available": true, "price": 11990000, "currency": "USD",
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/domains/purchase"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    // DNS must never be touched after a failed registration.
    Mock::given(method("PUT"))
        .and(path("/domains/demo.test/records"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let deployer = Deployer::with_endpoints(full_credentials(), Endpoints::all(&server.uri()));
    let request =
        DeploymentRequest::new(dir.path().join("app"), "render", "demo").with_custom_domain("demo.test");
    let result = deployer.deploy(&request).await;

    assert!(result.success);
    let bind = result
        .stages
        .iter()
        .find(|s| s.stage == Stage::BindDomain)
        .expect("bind_domain logged");
    assert_eq!(bind.status, StageStatus::Degraded);
    assert_eq!(result.app_url.as_deref(), Some(server.uri().as_str()));
}

#[tokio::test]
async fn repeated_deploys_generate_distinct_repo_names() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/user/repos"))
        .respond_with(ResponseTemplate::new(422))
        .expect(2)
        .mount(&server)
        .await;

    let creds = Credentials::from_map([("GITHUB_TOKEN", "gh"), ("RENDER_API_KEY", "rnd")]);
    let deployer = Deployer::with_endpoints(creds, Endpoints::all(&server.uri()));
    let request = DeploymentRequest::new("/tmp/nonexistent", "render", "demo");

    deployer.deploy(&request).await;
    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    deployer.deploy(&request).await;

    let names: Vec<String> = server
        .received_requests()
        .await
        .expect("request recording enabled")
        .iter()
        .filter(|r| r.url.path() == "/user/repos")
        .map(|r| {
            let body: serde_json::Value = serde_json::from_slice(&r.body).expect("json body");
            body["name"].as_str().expect("name field").to_string()
        })
        .collect();
    assert_eq!(names.len(), 2);
    assert!(names[0].starts_with("demo-"));
    assert!(names[1].starts_with("demo-"));
    assert_ne!(names[0], names[1]);
}
