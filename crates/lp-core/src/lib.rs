//! Core library for launchpad: a pipeline that takes a local application
//! bundle from source directory to a verified, publicly reachable deployment
//! on one of the registered hosting platforms.

pub mod error;
pub mod models;
pub mod services;

pub use error::{DeployError, Result};
pub use models::{Credentials, DeploymentRequest, DeploymentResult};
pub use services::Deployer;
