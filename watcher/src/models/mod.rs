//! Domain models

pub mod deployment;
pub mod outcome;
pub mod pull_request;

pub use deployment::{BuildRecord, DeployRecord, DeployState};
pub use outcome::PollOutcome;
pub use pull_request::CorrelationKey;
