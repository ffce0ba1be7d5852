use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use lp_core::models::{Credentials, StageStatus};
use lp_core::services::Deployer;
use lp_core::DeploymentRequest;

#[derive(Parser)]
#[command(name = "lp")]
#[command(about = "Deploy a local application bundle to a hosting platform", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full deployment pipeline
    Deploy {
        /// Local path of the application bundle
        #[arg(short, long)]
        source: PathBuf,

        /// Target platform (railway, vercel, render)
        #[arg(short, long)]
        platform: String,

        /// Application name, used as the repository name prefix
        #[arg(short, long)]
        name: String,

        /// Custom domain to register and bind after deployment
        #[arg(short, long)]
        domain: Option<String>,

        /// Emit the structured result as JSON instead of the stage log
        #[arg(long)]
        json: bool,
    },

    /// Show which platforms and services the current credentials enable
    Status {
        /// Also probe the repository host with the configured token
        #[arg(long)]
        probe: bool,

        /// Emit the capability report as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> color_eyre::Result<ExitCode> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let credentials = Credentials::from_env();
    let deployer = Deployer::new(credentials);

    match cli.command {
        Commands::Deploy {
            source,
            platform,
            name,
            domain,
            json,
        } => {
            let mut request = DeploymentRequest::new(source, platform, name);
            if let Some(domain) = domain {
                request = request.with_custom_domain(domain);
            }
            let result = deployer.deploy(&request).await;

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print_stage_log(&result);
            }
            Ok(if result.success {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Commands::Status { probe, json } => {
            let report = deployer.capability_report();
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_status(&report);
            }
            if probe {
                match deployer.repo_host().test_connection().await {
                    Ok(login) => println!("repository host: authenticated as {login}"),
                    Err(e) => {
                        println!("repository host: {e}");
                        return Ok(ExitCode::FAILURE);
                    }
                }
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn print_stage_log(result: &lp_core::DeploymentResult) {
    for outcome in &result.stages {
        let glyph = match outcome.status {
            StageStatus::Ok => "ok",
            StageStatus::Degraded => "degraded",
            StageStatus::Fatal => "FATAL",
        };
        println!("{:<16} [{glyph}] {}", outcome.stage.as_str(), outcome.message);
    }
    println!();
    if result.success {
        if let Some(url) = &result.app_url {
            println!("deployed: {url}");
        }
        if let Some(repo) = &result.repo_url {
            println!("source:   {repo}");
        }
        if let Some(v) = &result.verification {
            let status = if v.overall_status { "passing" } else { "not yet passing" };
            println!("checks:   {status}");
        }
    } else if let Some(error) = &result.error {
        println!("deployment failed: {error}");
    }
}

fn print_status(report: &lp_core::services::CapabilityReport) {
    if report.platforms.is_empty() {
        println!("platforms: none (no platform credentials found)");
    } else {
        println!("platforms: {}", report.platforms.join(", "));
    }
    println!(
        "email:     {}",
        report.email_backend.as_deref().unwrap_or("none")
    );
    println!("domains:   {}", enabled(report.domain_management));
    println!("monitor:   {}", enabled(report.monitoring));
    println!("ci/cd:     {}", enabled(report.cicd));
    println!(
        "readiness: {}/{} ({}%)",
        report.readiness.passed,
        report.readiness.total,
        report.readiness.percentage()
    );
}

fn enabled(flag: bool) -> &'static str {
    if flag {
        "enabled"
    } else {
        "not configured"
    }
}
