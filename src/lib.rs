//! sitescore: SEO audit and scoring
//!
//! Fetches a page, runs on-page checks, optionally enriches the result with
//! PageSpeed, crawl, backlink and SERP data, derives E-E-A-T proxy scores and
//! persists one audit row per run. Exposed through a CLI, an HTTP API and an
//! MCP server.

pub mod adapters;
pub mod audit;
pub mod commands;
pub mod config;
pub mod error;
pub mod fetch;
pub mod mcp;
pub mod models;
pub mod parse;
pub mod progress;
pub mod server;
pub mod store;

pub use config::Config;
pub use error::{Error, Result};
