//! Tool dispatch: from a typed request to platform calls.

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::client::{ClientError, ListQuery, PlatformClient, Record};
use crate::extract::{Extractor, TextGenerator};
use crate::manifest::Manifest;
use crate::model::{
    query_term, tables, GetIncidentArgs, IncidentArgs, KbArticleArgs, ListIncidentsArgs, SmartIncidentArgs,
    SmartKbArgs, UpdateIncidentArgs,
};
use crate::summary;
use crate::tools::{ToolError, ToolKind, ToolOutput, ToolRequest, ToolService};

/// Progress of a smart-tool invocation.
///
/// ```text
/// Received -> Extracting -> Extracted -> Submitting -> Submitted
///                       \-> ExtractionFailed       \-> SubmissionFailed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmartStage {
    Received,
    Extracting,
    Extracted,
    ExtractionFailed,
    Submitting,
    Submitted,
    SubmissionFailed,
}

impl SmartStage {
    pub fn can_advance_to(self, next: SmartStage) -> bool {
        use SmartStage::*;
        matches!(
            (self, next),
            (Received, Extracting)
                | (Extracting, Extracted)
                | (Extracting, ExtractionFailed)
                | (Extracted, Submitting)
                | (Submitting, Submitted)
                | (Submitting, SubmissionFailed)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            SmartStage::Submitted | SmartStage::ExtractionFailed | SmartStage::SubmissionFailed
        )
    }
}

/// Tracks one smart invocation through its stages.
#[derive(Debug)]
struct SmartRun {
    tool: ToolKind,
    stage: SmartStage,
}

impl SmartRun {
    fn start(tool: ToolKind) -> Self {
        Self {
            tool,
            stage: SmartStage::Received,
        }
    }

    fn advance(&mut self, next: SmartStage) {
        debug_assert!(
            self.stage.can_advance_to(next),
            "illegal smart-tool transition {:?} -> {:?}",
            self.stage,
            next
        );
        debug!(tool = %self.tool, from = ?self.stage, to = ?next, "smart tool stage");
        self.stage = next;
    }

    /// Record the outcome of the extraction step.
    fn extracted<T, E>(&mut self, result: Result<T, E>) -> Result<T, E> {
        match &result {
            Ok(_) => self.advance(SmartStage::Extracted),
            Err(_) => self.advance(SmartStage::ExtractionFailed),
        }
        result
    }

    /// Record the outcome of the submission step.
    fn submitted<T, E>(&mut self, result: Result<T, E>) -> Result<T, E> {
        match &result {
            Ok(_) => self.advance(SmartStage::Submitted),
            Err(_) => self.advance(SmartStage::SubmissionFailed),
        }
        result
    }
}

/// Executes tool requests against a platform client and an optional
/// extraction backend.
///
/// Every request is handled to completion with strictly sequential outbound
/// calls. Nothing is retried and nothing is rolled back.
pub struct Dispatcher<P, G> {
    platform: P,
    extractor: Extractor<G>,
}

impl<P, G> Dispatcher<P, G>
where
    P: PlatformClient,
    G: TextGenerator,
{
    pub fn new(platform: P, generator: Option<G>) -> Self {
        Self {
            platform,
            extractor: Extractor::new(generator),
        }
    }

    /// Run one request.
    pub async fn dispatch(&self, request: ToolRequest) -> Result<ToolOutput, ToolError> {
        match request {
            ToolRequest::CreateIncident(args) => {
                let record = self.create_incident(&args).await?;
                Ok(output(
                    summary::created("Incident created successfully", &record, "number"),
                    record,
                ))
            }
            ToolRequest::CreateKbArticle(args) => {
                let record = self.create_kb_article(&args).await?;
                Ok(output(
                    summary::created("KB Article created successfully", &record, "number"),
                    record,
                ))
            }
            ToolRequest::CreateClientScript(args) => {
                let record = self.platform.create(tables::CLIENT_SCRIPT, args.to_fields()).await?;
                Ok(output(summary::created("Client Script created", &record, "name"), record))
            }
            ToolRequest::CreateBusinessRule(args) => {
                let record = self.platform.create(tables::BUSINESS_RULE, args.to_fields()).await?;
                Ok(output(summary::created("Business Rule created", &record, "name"), record))
            }
            ToolRequest::CreateSlaDefinition(args) => {
                let record = self.platform.create(tables::SLA_DEFINITION, args.to_fields()).await?;
                Ok(output(summary::created("SLA Definition created", &record, "name"), record))
            }
            ToolRequest::CreateRecordProducer(args) => {
                self.run_manifest("Record Producer created", args.manifest()).await
            }
            ToolRequest::CreateVariableSet(args) => {
                self.run_manifest("Variable Set created", args.manifest()).await
            }
            ToolRequest::GetIncident(args) => self.get_incident(args).await,
            ToolRequest::ListIncidents(args) => self.list_incidents(args).await,
            ToolRequest::UpdateIncident(args) => self.update_incident(args).await,
            ToolRequest::SmartIncident(args) => self.smart_incident(args).await,
            ToolRequest::SmartKbGenerator(args) => self.smart_kb_generator(args).await,
        }
    }

    async fn create_incident(&self, args: &IncidentArgs) -> Result<Record, ClientError> {
        self.platform.create(IncidentArgs::TABLE, args.to_fields()).await
    }

    async fn create_kb_article(&self, args: &KbArticleArgs) -> Result<Record, ClientError> {
        self.platform.create(KbArticleArgs::TABLE, args.to_fields()).await
    }

    async fn run_manifest(&self, what: &str, manifest: Manifest) -> Result<ToolOutput, ToolError> {
        debug!(steps = manifest.len(), "executing manifest");
        let created = manifest.execute(&self.platform).await?;
        Ok(ToolOutput::new(
            summary::created_with_variables(what, &created),
            json!({ "created": created }),
        ))
    }

    /// Look up an incident's record by its number.
    ///
    /// Only a record whose `number` is exactly the requested one counts.
    async fn find_incident(&self, tool: ToolKind, number: &str) -> Result<Record, ToolError> {
        let term = query_term("number", number)
            .map_err(|reason| ToolError::InvalidArguments { tool: tool.name(), reason })?;
        let query = ListQuery::new(term).with_limit(1);
        let record = self
            .platform
            .list(tables::INCIDENT, &query)
            .await?
            .into_iter()
            .next()
            .filter(|record| summary::field_text(record, "number").as_deref() == Some(number))
            .ok_or_else(|| ClientError::NoMatch {
                table: tables::INCIDENT.to_string(),
                field: "number",
                value: number.to_string(),
            })?;
        Ok(record)
    }

    async fn get_incident(&self, args: GetIncidentArgs) -> Result<ToolOutput, ToolError> {
        let record = match (&args.sys_id, &args.number) {
            (Some(sys_id), _) => self.platform.get(tables::INCIDENT, sys_id).await?,
            (None, Some(number)) => self.find_incident(ToolKind::GetIncident, number).await?,
            (None, None) => {
                return Err(ToolError::InvalidArguments {
                    tool: ToolKind::GetIncident.name(),
                    reason: "either `number` or `sys_id` is required".to_string(),
                })
            }
        };
        Ok(output(summary::incident_details(&record), record))
    }

    async fn update_incident(&self, args: UpdateIncidentArgs) -> Result<ToolOutput, ToolError> {
        let fields = args.to_fields();
        if fields.is_empty() {
            return Err(ToolError::InvalidArguments {
                tool: ToolKind::UpdateIncident.name(),
                reason: "no fields to update".to_string(),
            });
        }

        let existing = self.find_incident(ToolKind::UpdateIncident, &args.number).await?;
        let sys_id = existing
            .get("sys_id")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                ClientError::Decode(serde::de::Error::custom(format!(
                    "incident {} has no sys_id",
                    args.number
                )))
            })?;

        let record = self.platform.update(tables::INCIDENT, sys_id, fields).await?;
        Ok(output(
            format!("Incident {} updated successfully.", args.number),
            record,
        ))
    }

    async fn list_incidents(&self, args: ListIncidentsArgs) -> Result<ToolOutput, ToolError> {
        let encoded = args.encoded_query().map_err(|reason| ToolError::InvalidArguments {
            tool: ToolKind::ListIncidents.name(),
            reason,
        })?;
        let query = ListQuery::new(encoded).with_limit(args.limit());
        let records = self.platform.list(tables::INCIDENT, &query).await?;
        let summary = summary::incident_list(&records);
        Ok(ToolOutput::new(summary, Value::Array(records.into_iter().map(Value::Object).collect())))
    }

    async fn smart_incident(&self, args: SmartIncidentArgs) -> Result<ToolOutput, ToolError> {
        let mut run = SmartRun::start(ToolKind::SmartIncident);

        run.advance(SmartStage::Extracting);
        let extracted = run.extracted(
            self.extractor
                .extract_incident(&args.unstructured_text)
                .await
                .and_then(|fields| fields.into_args()),
        )?;
        info!(short_description = %extracted.short_description, "extracted incident fields");

        run.advance(SmartStage::Submitting);
        let record = run.submitted(self.create_incident(&extracted).await)?;

        let extracted_json = serde_json::to_string_pretty(&extracted.to_fields()).unwrap_or_default();
        Ok(output(
            format!(
                "Smart Incident created: {}\nExtracted Data: {}",
                summary::field_text(&record, "number").unwrap_or_else(|| "N/A".to_string()),
                extracted_json
            ),
            record,
        ))
    }

    async fn smart_kb_generator(&self, args: SmartKbArgs) -> Result<ToolOutput, ToolError> {
        let mut run = SmartRun::start(ToolKind::SmartKbGenerator);

        run.advance(SmartStage::Extracting);
        let article = run.extracted(
            self.extractor
                .draft_article(&args.source_content, args.target_audience.as_deref())
                .await
                .and_then(|draft| draft.into_args(args.kb_knowledge_base.clone())),
        )?;

        run.advance(SmartStage::Submitting);
        let record = run.submitted(self.create_kb_article(&article).await)?;

        Ok(output(
            format!(
                "Smart KB Article created as Draft: {}\nTitle: {}",
                summary::field_text(&record, "number").unwrap_or_else(|| "N/A".to_string()),
                article.short_description
            ),
            record,
        ))
    }
}

fn output(summary: String, record: Record) -> ToolOutput {
    ToolOutput::new(summary, Value::Object(record))
}

#[async_trait]
impl<P, G> ToolService for Dispatcher<P, G>
where
    P: PlatformClient,
    G: TextGenerator,
{
    async fn execute(&self, request: ToolRequest) -> Result<ToolOutput, ToolError> {
        let tool = request.kind();
        info!(%tool, smart = tool.is_smart(), "dispatching tool call");
        let result = self.dispatch(request).await;
        match &result {
            Ok(_) => info!(%tool, "tool call succeeded"),
            Err(e) => warn!(%tool, kind = ?e.kind(), stage = ?e.stage(), "tool call failed: {}", e),
        }
        result
    }
}
