//! Deployment watch module

pub mod clock;
pub mod fsm;
pub mod source;
pub mod watcher;

pub use clock::{Clock, SystemClock};
pub use source::BuildSource;
pub use watcher::{DeploymentWatcher, Options, ProviderErrorPolicy};
