//! # mcp-servicenow
//!
//! An MCP server exposing ServiceNow record operations as tools.
//!
//! Structured tools map one request onto one (or, for catalog items, a short
//! ordered sequence of) ServiceNow Table API calls. Two "smart" tools first ask
//! Gemini to turn free text into record fields, then submit the result the same
//! way.
//!
//! ## Architecture
//!
//! 1. **[`mcp::ServiceNowServer`]** is the rmcp handler. It decodes arguments and
//!    renders outcomes as tool results.
//! 2. **[`dispatch::Dispatcher`]** implements [`tools::ToolService`] over a
//!    [`client::PlatformClient`] and an optional [`extract::TextGenerator`].
//! 3. **[`api::ServiceNowClient`]** and **[`api::GeminiClient`]** are the HTTP
//!    implementations of those two traits.
//!
//! ## Example
//! ```no_run
//! use std::sync::Arc;
//! use mcp_servicenow::api::{GeminiClient, ServiceNowClient};
//! use mcp_servicenow::config::Config;
//! use mcp_servicenow::dispatch::Dispatcher;
//! use mcp_servicenow::tools::ToolService;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env()?;
//!     let platform = ServiceNowClient::from_config(&config)?;
//!     let dispatcher = Dispatcher::<_, GeminiClient>::new(platform, None);
//!
//!     let output = dispatcher
//!         .call_tool(
//!             "create_incident",
//!             serde_json::json!({ "short_description": "DB down", "priority": "1 - Critical" }),
//!         )
//!         .await?;
//!     println!("{}", output.summary);
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod client;
pub mod config;
pub mod dispatch;
pub mod extract;
pub mod http;
pub mod manifest;
pub mod mcp;
pub mod model;
pub mod options;
pub mod summary;
pub mod tools;

pub use client::{ClientError, PlatformClient};
pub use config::Config;
pub use dispatch::Dispatcher;
pub use extract::{ExtractionError, TextGenerator};
pub use mcp::ServiceNowServer;
pub use tools::{ToolError, ToolKind, ToolOutput, ToolRequest, ToolService};

// Re-export rmcp for convenience
pub use rmcp;
