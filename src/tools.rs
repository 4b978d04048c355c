//! The tool catalog: names, typed requests, outputs and errors.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Value};

use crate::client::ClientError;
use crate::extract::ExtractionError;
use crate::manifest::{CreatedRecord, ManifestError};
use crate::model::{
    BusinessRuleArgs, ClientScriptArgs, GetIncidentArgs, IncidentArgs, KbArticleArgs,
    ListIncidentsArgs, RecordProducerArgs, SlaDefinitionArgs, SmartIncidentArgs, SmartKbArgs,
    UpdateIncidentArgs, VariableSetArgs,
};

/// Every tool this server exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    CreateIncident,
    CreateKbArticle,
    CreateClientScript,
    CreateBusinessRule,
    CreateSlaDefinition,
    CreateRecordProducer,
    CreateVariableSet,
    GetIncident,
    ListIncidents,
    UpdateIncident,
    SmartIncident,
    SmartKbGenerator,
}

impl ToolKind {
    pub const ALL: [ToolKind; 12] = [
        ToolKind::CreateIncident,
        ToolKind::CreateKbArticle,
        ToolKind::CreateClientScript,
        ToolKind::CreateBusinessRule,
        ToolKind::CreateSlaDefinition,
        ToolKind::CreateRecordProducer,
        ToolKind::CreateVariableSet,
        ToolKind::GetIncident,
        ToolKind::ListIncidents,
        ToolKind::UpdateIncident,
        ToolKind::SmartIncident,
        ToolKind::SmartKbGenerator,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ToolKind::CreateIncident => "create_incident",
            ToolKind::CreateKbArticle => "create_kb_article",
            ToolKind::CreateClientScript => "create_client_script",
            ToolKind::CreateBusinessRule => "create_business_rule",
            ToolKind::CreateSlaDefinition => "create_sla_definition",
            ToolKind::CreateRecordProducer => "create_record_producer",
            ToolKind::CreateVariableSet => "create_variable_set",
            ToolKind::GetIncident => "get_incident",
            ToolKind::ListIncidents => "list_incidents",
            ToolKind::UpdateIncident => "update_incident",
            ToolKind::SmartIncident => "smart_incident",
            ToolKind::SmartKbGenerator => "smart_kb_generator",
        }
    }

    /// Whether the tool goes through the extraction service first.
    pub fn is_smart(self) -> bool {
        matches!(self, ToolKind::SmartIncident | ToolKind::SmartKbGenerator)
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ToolKind {
    type Err = ToolError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        ToolKind::ALL
            .into_iter()
            .find(|kind| kind.name() == name)
            .ok_or_else(|| ToolError::UnsupportedTool(name.to_string()))
    }
}

/// A tool invocation with typed arguments.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolRequest {
    CreateIncident(IncidentArgs),
    CreateKbArticle(KbArticleArgs),
    CreateClientScript(ClientScriptArgs),
    CreateBusinessRule(BusinessRuleArgs),
    CreateSlaDefinition(SlaDefinitionArgs),
    CreateRecordProducer(RecordProducerArgs),
    CreateVariableSet(VariableSetArgs),
    GetIncident(GetIncidentArgs),
    ListIncidents(ListIncidentsArgs),
    UpdateIncident(UpdateIncidentArgs),
    SmartIncident(SmartIncidentArgs),
    SmartKbGenerator(SmartKbArgs),
}

impl ToolRequest {
    /// Resolve a tool name and decode its JSON arguments.
    ///
    /// `null` arguments are treated as an empty object.
    pub fn parse(name: &str, args: Value) -> Result<Self, ToolError> {
        let kind: ToolKind = name.parse()?;
        let args = if args.is_null() { json!({}) } else { args };

        fn decode<T: serde::de::DeserializeOwned>(kind: ToolKind, args: Value) -> Result<T, ToolError> {
            serde_json::from_value(args).map_err(|e| ToolError::InvalidArguments {
                tool: kind.name(),
                reason: e.to_string(),
            })
        }

        Ok(match kind {
            ToolKind::CreateIncident => ToolRequest::CreateIncident(decode(kind, args)?),
            ToolKind::CreateKbArticle => ToolRequest::CreateKbArticle(decode(kind, args)?),
            ToolKind::CreateClientScript => ToolRequest::CreateClientScript(decode(kind, args)?),
            ToolKind::CreateBusinessRule => ToolRequest::CreateBusinessRule(decode(kind, args)?),
            ToolKind::CreateSlaDefinition => ToolRequest::CreateSlaDefinition(decode(kind, args)?),
            ToolKind::CreateRecordProducer => {
                ToolRequest::CreateRecordProducer(decode(kind, args)?)
            }
            ToolKind::CreateVariableSet => ToolRequest::CreateVariableSet(decode(kind, args)?),
            ToolKind::GetIncident => ToolRequest::GetIncident(decode(kind, args)?),
            ToolKind::ListIncidents => ToolRequest::ListIncidents(decode(kind, args)?),
            ToolKind::UpdateIncident => ToolRequest::UpdateIncident(decode(kind, args)?),
            ToolKind::SmartIncident => ToolRequest::SmartIncident(decode(kind, args)?),
            ToolKind::SmartKbGenerator => ToolRequest::SmartKbGenerator(decode(kind, args)?),
        })
    }

    pub fn kind(&self) -> ToolKind {
        match self {
            ToolRequest::CreateIncident(_) => ToolKind::CreateIncident,
            ToolRequest::CreateKbArticle(_) => ToolKind::CreateKbArticle,
            ToolRequest::CreateClientScript(_) => ToolKind::CreateClientScript,
            ToolRequest::CreateBusinessRule(_) => ToolKind::CreateBusinessRule,
            ToolRequest::CreateSlaDefinition(_) => ToolKind::CreateSlaDefinition,
            ToolRequest::CreateRecordProducer(_) => ToolKind::CreateRecordProducer,
            ToolRequest::CreateVariableSet(_) => ToolKind::CreateVariableSet,
            ToolRequest::GetIncident(_) => ToolKind::GetIncident,
            ToolRequest::ListIncidents(_) => ToolKind::ListIncidents,
            ToolRequest::UpdateIncident(_) => ToolKind::UpdateIncident,
            ToolRequest::SmartIncident(_) => ToolKind::SmartIncident,
            ToolRequest::SmartKbGenerator(_) => ToolKind::SmartKbGenerator,
        }
    }
}

/// Successful tool result: a human-readable summary and the platform data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolOutput {
    pub summary: String,
    pub data: Value,
}

impl ToolOutput {
    pub fn new(summary: impl Into<String>, data: Value) -> Self {
        Self {
            summary: summary.into(),
            data,
        }
    }
}

/// Error kinds reported to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    ConnectivityError,
    RemoteError,
    NotFoundError,
    ExtractionError,
    InvalidArguments,
    UnsupportedTool,
    ConfigurationError,
}

/// Which part of the invocation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Validation,
    Extraction,
    Submission,
}

#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("unsupported tool: {0}")]
    UnsupportedTool(String),

    #[error("invalid arguments for {tool}: {reason}")]
    InvalidArguments { tool: &'static str, reason: String },

    #[error("extraction failed: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("submission failed: {0}")]
    Platform(#[from] ClientError),

    #[error("submission failed at {failed_step} after creating {} record(s): {source}", .completed.len())]
    PartialFailure {
        completed: Vec<CreatedRecord>,
        failed_step: String,
        #[source]
        source: ClientError,
    },
}

impl From<ManifestError> for ToolError {
    fn from(err: ManifestError) -> Self {
        if err.completed.is_empty() {
            ToolError::Platform(err.source)
        } else {
            ToolError::PartialFailure {
                completed: err.completed,
                failed_step: err.failed_step,
                source: err.source,
            }
        }
    }
}

fn client_error_kind(err: &ClientError) -> ErrorKind {
    match err {
        ClientError::Connectivity { .. } => ErrorKind::ConnectivityError,
        ClientError::NotFound { .. } | ClientError::NoMatch { .. } => ErrorKind::NotFoundError,
        ClientError::Remote { .. } | ClientError::Decode(_) => ErrorKind::RemoteError,
        ClientError::Config(_) => ErrorKind::ConfigurationError,
    }
}

impl ToolError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ToolError::UnsupportedTool(_) => ErrorKind::UnsupportedTool,
            ToolError::InvalidArguments { .. } => ErrorKind::InvalidArguments,
            ToolError::Extraction(_) => ErrorKind::ExtractionError,
            ToolError::Platform(err) | ToolError::PartialFailure { source: err, .. } => {
                client_error_kind(err)
            }
        }
    }

    pub fn stage(&self) -> Stage {
        match self {
            ToolError::UnsupportedTool(_) | ToolError::InvalidArguments { .. } => Stage::Validation,
            ToolError::Extraction(_) => Stage::Extraction,
            ToolError::Platform(_) | ToolError::PartialFailure { .. } => Stage::Submission,
        }
    }

    /// Structured report returned to the caller alongside the message.
    pub fn payload(&self) -> Value {
        let mut error = json!({
            "kind": self.kind(),
            "stage": self.stage(),
            "message": self.to_string(),
        });
        let status = match self {
            ToolError::Platform(err) | ToolError::PartialFailure { source: err, .. } => err.status(),
            _ => None,
        };
        if let Some(status) = status {
            error["status"] = json!(status);
        }
        if let ToolError::PartialFailure {
            completed,
            failed_step,
            ..
        } = self
        {
            error["failed_step"] = json!(failed_step);
            error["completed"] = json!(completed);
        }
        if let ToolError::Extraction(err) = self {
            if let Some(raw) = err.raw_output() {
                error["raw_output"] = json!(raw);
            }
        }
        json!({ "error": error })
    }
}

/// Something that can execute tool requests.
#[async_trait]
pub trait ToolService: Send + Sync {
    /// Execute a typed request.
    async fn execute(&self, request: ToolRequest) -> Result<ToolOutput, ToolError>;

    /// Execute a tool by name with JSON arguments.
    async fn call_tool(&self, name: &str, args: Value) -> Result<ToolOutput, ToolError> {
        let request = ToolRequest::parse(name, args)?;
        self.execute(request).await
    }
}
