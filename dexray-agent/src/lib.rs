#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! The dexray posting agent.
//!
//! Thin application layer over the dexray client stack: a typed facade
//! for the gated analytics API, a static catalog of post templates with
//! weighted category selection, a fire-and-forget social posting sink,
//! and environment-driven configuration. The payment flow itself lives
//! in `dexray-http`; everything here is request shaping and I/O glue.

pub mod api;
pub mod config;
pub mod social;
pub mod templates;

pub use api::{ApiClient, ApiError};
pub use config::AgentConfig;
pub use social::{HttpSocialSink, SocialError, SocialSink};
