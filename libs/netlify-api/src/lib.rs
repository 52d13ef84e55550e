//! Netlify API models
//!
//! Serde representations of the Netlify REST API payloads used by the
//! deploy watcher. Only the fields the watcher reads are modelled; everything
//! else in a response is ignored.

pub mod models;
