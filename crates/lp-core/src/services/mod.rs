pub mod configurators;
pub mod deployer;
pub mod platforms;
pub mod repo_host;
pub mod source_sync;
pub mod verifier;

pub use deployer::{CapabilityReport, Deployer};
pub use platforms::{PlatformAdapter, Provisioned};
pub use repo_host::{CreatedRepo, RepoHost};
pub use verifier::Verifier;
