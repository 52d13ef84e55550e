//! Netlify HTTP API

pub mod builds;
pub mod client;

pub use client::HttpClient;
