//! HTTP clients for the remote services this server talks to.

pub mod gemini;
pub mod servicenow;

pub use gemini::GeminiClient;
pub use servicenow::ServiceNowClient;
