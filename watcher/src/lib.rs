//! Netlify Deploy Watch Library
//!
//! Waits for the Netlify deploy of a pull request to become ready and
//! reports the result to GitHub Actions.

pub mod app;
pub mod errors;
pub mod fakes;
pub mod github;
pub mod http;
pub mod logs;
pub mod models;
pub mod utils;
pub mod watch;
