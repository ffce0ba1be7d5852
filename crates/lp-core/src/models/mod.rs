pub mod credentials;
pub mod endpoints;
pub mod outcome;
pub mod request;

pub use credentials::{Credentials, Readiness, SECRET_NAMES};
pub use endpoints::Endpoints;
pub use outcome::{
    ConfigureReport, DeploymentResult, Stage, StageOutcome, StageStatus, VerificationResult,
};
pub use request::DeploymentRequest;
