//! The MCP surface: one rmcp tool per [`ToolKind`].
//!
//! Argument schemas come from the typed argument structs. Every invocation,
//! including one naming an unknown tool or carrying bad arguments, produces a
//! tool result; failures are marked `is_error` and carry the structured
//! payload from [`ToolError::payload`].

use std::sync::Arc;

use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::tool::ToolCallContext;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    CallToolRequestParam, CallToolResult, Content, Implementation, ListToolsResult,
    PaginatedRequestParam, ServerCapabilities, ServerInfo,
};
use rmcp::service::RequestContext;
use rmcp::{tool, tool_router, ErrorData, RoleServer, ServerHandler};
use serde_json::Value;
use tracing::{info_span, Instrument};
use uuid::Uuid;

use crate::model::{
    BusinessRuleArgs, ClientScriptArgs, GetIncidentArgs, IncidentArgs, KbArticleArgs,
    ListIncidentsArgs, RecordProducerArgs, SlaDefinitionArgs, SmartIncidentArgs, SmartKbArgs,
    UpdateIncidentArgs, VariableSetArgs,
};
use crate::tools::{ToolError, ToolOutput, ToolRequest, ToolService};

pub const SERVER_NAME: &str = "mcp-servicenow";

const INSTRUCTIONS: &str = "ServiceNow record operations. \
    create_* tools write one record (record producers and variable sets also create their variables). \
    get_incident, list_incidents and update_incident work on existing incidents. \
    smart_incident and smart_kb_generator draft the record from free text first.";

#[derive(Clone)]
pub struct ServiceNowServer {
    tools: Arc<dyn ToolService>,
    tool_router: ToolRouter<Self>,
}

impl std::fmt::Debug for ServiceNowServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceNowServer").finish_non_exhaustive()
    }
}

/// Render a tool outcome as an MCP result.
pub fn to_call_result(result: Result<ToolOutput, ToolError>) -> Result<CallToolResult, ErrorData> {
    Ok(match result {
        Ok(output) => CallToolResult::success(vec![
            Content::text(output.summary),
            Content::json(output.data)?,
        ]),
        Err(err) => CallToolResult::error(vec![
            Content::text(format!("Error: {err}")),
            Content::json(err.payload())?,
        ]),
    })
}

#[tool_router]
impl ServiceNowServer {
    pub fn new(tools: Arc<dyn ToolService>) -> Self {
        Self {
            tools,
            tool_router: Self::tool_router(),
        }
    }

    async fn run(&self, request: ToolRequest) -> Result<CallToolResult, ErrorData> {
        let span = info_span!("tool_call", tool = %request.kind(), call_id = %Uuid::new_v4());
        let result = self.tools.execute(request).instrument(span).await;
        to_call_result(result)
    }

    #[tool(description = "Create a new incident. Priority defaults to \"3 - Moderate\" and category to \"inquiry\".")]
    async fn create_incident(
        &self,
        Parameters(args): Parameters<IncidentArgs>,
    ) -> Result<CallToolResult, ErrorData> {
        self.run(ToolRequest::CreateIncident(args)).await
    }

    #[tool(description = "Create a Knowledge Base article. The body may contain HTML; workflow state defaults to draft.")]
    async fn create_kb_article(
        &self,
        Parameters(args): Parameters<KbArticleArgs>,
    ) -> Result<CallToolResult, ErrorData> {
        self.run(ToolRequest::CreateKbArticle(args)).await
    }

    #[tool(description = "Create a client script (onLoad, onChange, onSubmit or onCellEdit) on a table.")]
    async fn create_client_script(
        &self,
        Parameters(args): Parameters<ClientScriptArgs>,
    ) -> Result<CallToolResult, ErrorData> {
        self.run(ToolRequest::CreateClientScript(args)).await
    }

    #[tool(description = "Create a server-side business rule. Runs on insert unless other actions are set.")]
    async fn create_business_rule(
        &self,
        Parameters(args): Parameters<BusinessRuleArgs>,
    ) -> Result<CallToolResult, ErrorData> {
        self.run(ToolRequest::CreateBusinessRule(args)).await
    }

    #[tool(description = "Create an SLA definition with a duration in seconds and encoded start/stop conditions.")]
    async fn create_sla_definition(
        &self,
        Parameters(args): Parameters<SlaDefinitionArgs>,
    ) -> Result<CallToolResult, ErrorData> {
        self.run(ToolRequest::CreateSlaDefinition(args)).await
    }

    #[tool(description = "Create a catalog record producer and its variables. Records are created one by one; a failure leaves earlier records in place and reports them.")]
    async fn create_record_producer(
        &self,
        Parameters(args): Parameters<RecordProducerArgs>,
    ) -> Result<CallToolResult, ErrorData> {
        self.run(ToolRequest::CreateRecordProducer(args)).await
    }

    #[tool(description = "Create a catalog variable set and its variables. Records are created one by one; a failure leaves earlier records in place and reports them.")]
    async fn create_variable_set(
        &self,
        Parameters(args): Parameters<VariableSetArgs>,
    ) -> Result<CallToolResult, ErrorData> {
        self.run(ToolRequest::CreateVariableSet(args)).await
    }

    #[tool(description = "Get an incident by number or sys_id.")]
    async fn get_incident(
        &self,
        Parameters(args): Parameters<GetIncidentArgs>,
    ) -> Result<CallToolResult, ErrorData> {
        self.run(ToolRequest::GetIncident(args)).await
    }

    #[tool(description = "List recent incidents, newest first, optionally filtered by priority and state.")]
    async fn list_incidents(
        &self,
        Parameters(args): Parameters<ListIncidentsArgs>,
    ) -> Result<CallToolResult, ErrorData> {
        self.run(ToolRequest::ListIncidents(args)).await
    }

    #[tool(description = "Update an existing incident identified by its number.")]
    async fn update_incident(
        &self,
        Parameters(args): Parameters<UpdateIncidentArgs>,
    ) -> Result<CallToolResult, ErrorData> {
        self.run(ToolRequest::UpdateIncident(args)).await
    }

    #[tool(description = "Create an incident from a free-text problem report. Fields are extracted by a language model first.")]
    async fn smart_incident(
        &self,
        Parameters(args): Parameters<SmartIncidentArgs>,
    ) -> Result<CallToolResult, ErrorData> {
        self.run(ToolRequest::SmartIncident(args)).await
    }

    #[tool(description = "Draft a KB article from raw notes or logs with a language model and save it as a draft.")]
    async fn smart_kb_generator(
        &self,
        Parameters(args): Parameters<SmartKbArgs>,
    ) -> Result<CallToolResult, ErrorData> {
        self.run(ToolRequest::SmartKbGenerator(args)).await
    }
}

impl ServerHandler for ServiceNowServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: SERVER_NAME.into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            instructions: Some(INSTRUCTIONS.into()),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, ErrorData> {
        Ok(ListToolsResult::with_all_items(self.tool_router.list_all()))
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, ErrorData> {
        // Reject unknown names and malformed arguments as tool results, not
        // protocol errors.
        let arguments = request.arguments.clone().map(Value::Object).unwrap_or(Value::Null);
        if let Err(err) = ToolRequest::parse(&request.name, arguments) {
            tracing::warn!(tool = %request.name, "rejected tool call: {}", err);
            return to_call_result(Err(err));
        }
        let context = ToolCallContext::new(self, request, context);
        self.tool_router.call(context).await
    }
}
