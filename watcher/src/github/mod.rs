//! GitHub Actions integration

pub mod event;
pub mod output;

pub use event::PullRequestEvent;
pub use output::Reporter;
