//! subforge - convert proxy subscriptions between client dialects.
//!
//! The pipeline: fetch each source, auto-detect its container format,
//! explode it into canonical [`Proxy`] nodes, filter and rename them, then
//! render the requested target dialect with the configured rulesets and
//! proxy groups merged in.

pub mod api;
pub mod generator;
pub mod models;
pub mod parser;
pub mod rulesets;
pub mod settings;
pub mod upload;
pub mod utils;
pub mod web_handlers;

pub use models::{Proxy, ProxyType};
pub use settings::Settings;
