//! Tool argument types and the rules that shape them into record bodies.
//!
//! Each argument type owns its target table and the defaults for omitted
//! optional fields. The smart tools reuse these types so extracted values are
//! shaped exactly like caller-supplied ones.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::client::Fields;
use crate::manifest::Manifest;

/// Platform table names.
pub mod tables {
    pub const INCIDENT: &str = "incident";
    pub const KB_KNOWLEDGE: &str = "kb_knowledge";
    pub const CLIENT_SCRIPT: &str = "sys_script_client";
    pub const BUSINESS_RULE: &str = "sys_script";
    pub const SLA_DEFINITION: &str = "contract_sla";
    pub const RECORD_PRODUCER: &str = "sc_cat_item_producer";
    pub const VARIABLE: &str = "item_option_new";
    pub const VARIABLE_SET: &str = "item_option_new_set";
    pub const QUESTION_CHOICE: &str = "question_choice";
}

pub const DEFAULT_INCIDENT_PRIORITY: &str = "3 - Moderate";
pub const DEFAULT_INCIDENT_CATEGORY: &str = "inquiry";
pub const DEFAULT_LIST_LIMIT: u32 = 10;
pub const DEFAULT_KB_AUDIENCE: &str = "General Users";

/// Insertion helpers for record bodies.
pub(crate) trait FieldsExt {
    fn set(&mut self, key: &str, value: impl Into<Value>);

    /// Insert only when a value is present; absent fields are left to the platform.
    fn set_opt<V: Into<Value>>(&mut self, key: &str, value: Option<V>) {
        if let Some(v) = value {
            self.set(key, v);
        }
    }
}

impl FieldsExt for Fields {
    fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.insert(key.to_string(), value.into());
    }
}

// --- Incidents ---

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct IncidentArgs {
    /// Brief summary of the incident
    pub short_description: String,
    /// Detailed description of the incident
    pub description: Option<String>,
    /// 1=High, 2=Medium, 3=Low
    pub urgency: Option<String>,
    /// 1=High, 2=Medium, 3=Low
    pub impact: Option<String>,
    /// Priority, e.g. "1 - Critical". Defaults to "3 - Moderate"
    pub priority: Option<String>,
    /// Category, e.g. "database" or "network". Defaults to "inquiry"
    pub category: Option<String>,
    /// User sys_id or username for the caller
    pub caller_id: Option<String>,
}

impl IncidentArgs {
    pub const TABLE: &'static str = tables::INCIDENT;

    pub fn to_fields(&self) -> Fields {
        let mut fields = Fields::new();
        fields.set("short_description", self.short_description.clone());
        fields.set_opt("description", self.description.clone());
        fields.set_opt("urgency", self.urgency.clone());
        fields.set_opt("impact", self.impact.clone());
        fields.set(
            "priority",
            self.priority
                .clone()
                .unwrap_or_else(|| DEFAULT_INCIDENT_PRIORITY.to_string()),
        );
        fields.set(
            "category",
            self.category
                .clone()
                .unwrap_or_else(|| DEFAULT_INCIDENT_CATEGORY.to_string()),
        );
        fields.set_opt("caller_id", self.caller_id.clone());
        fields
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct GetIncidentArgs {
    /// Incident number (e.g., INC0000001)
    pub number: Option<String>,
    /// Internal record ID
    pub sys_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct UpdateIncidentArgs {
    /// Incident number (e.g., INC0010014)
    pub number: String,
    pub short_description: Option<String>,
    pub description: Option<String>,
    /// 1=High, 2=Medium, 3=Low
    pub urgency: Option<String>,
    /// 1=High, 2=Medium, 3=Low
    pub impact: Option<String>,
    /// State code (e.g., 2 for In Progress)
    pub state: Option<String>,
    /// Add a comment to the incident
    pub comments: Option<String>,
}

impl UpdateIncidentArgs {
    /// The fields to patch; `number` only locates the record.
    pub fn to_fields(&self) -> Fields {
        let mut fields = Fields::new();
        fields.set_opt("short_description", self.short_description.clone());
        fields.set_opt("description", self.description.clone());
        fields.set_opt("urgency", self.urgency.clone());
        fields.set_opt("impact", self.impact.clone());
        fields.set_opt("state", self.state.clone());
        fields.set_opt("comments", self.comments.clone());
        fields
    }
}

/// One `field=value` clause of an encoded query.
///
/// `^` separates clauses, so a value containing it is refused rather than
/// allowed to add conditions of its own.
pub fn query_term(field: &str, value: &str) -> Result<String, String> {
    if value.contains('^') {
        return Err(format!("`{field}` must not contain `^`"));
    }
    Ok(format!("{field}={value}"))
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ListIncidentsArgs {
    /// Number of records to return (default 10)
    pub limit: Option<u32>,
    /// Priority filter, 1 through 5
    pub priority: Option<String>,
    /// State filter: 1=New, 2=In Progress, 3=On Hold, etc.
    pub state: Option<String>,
}

impl ListIncidentsArgs {
    /// Encoded query: filters joined with `^`, newest first.
    pub fn encoded_query(&self) -> Result<String, String> {
        let mut parts = Vec::new();
        if let Some(priority) = &self.priority {
            parts.push(query_term("priority", priority)?);
        }
        if let Some(state) = &self.state {
            parts.push(query_term("state", state)?);
        }
        parts.push("ORDERBYDESCsys_created_on".to_string());
        Ok(parts.join("^"))
    }

    pub fn limit(&self) -> u32 {
        self.limit.unwrap_or(DEFAULT_LIST_LIMIT)
    }
}

// --- Knowledge base ---

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowState {
    #[default]
    Draft,
    Review,
    Published,
}

impl WorkflowState {
    pub fn as_str(self) -> &'static str {
        match self {
            WorkflowState::Draft => "draft",
            WorkflowState::Review => "review",
            WorkflowState::Published => "published",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct KbArticleArgs {
    /// Title of the KB article
    pub short_description: String,
    /// HTML content of the article
    pub article_body: String,
    /// Workflow state, defaults to draft
    pub workflow_state: Option<WorkflowState>,
    /// Sys_id of the knowledge base
    pub kb_knowledge_base: Option<String>,
}

impl KbArticleArgs {
    pub const TABLE: &'static str = tables::KB_KNOWLEDGE;

    pub fn to_fields(&self) -> Fields {
        let mut fields = Fields::new();
        fields.set("short_description", self.short_description.clone());
        fields.set("text", self.article_body.clone());
        fields.set(
            "workflow_state",
            self.workflow_state.unwrap_or_default().as_str(),
        );
        fields.set_opt("kb_knowledge_base", self.kb_knowledge_base.clone());
        fields
    }
}

// --- Scripting ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum ClientScriptType {
    #[serde(rename = "onLoad")]
    OnLoad,
    #[serde(rename = "onChange")]
    OnChange,
    #[serde(rename = "onSubmit")]
    OnSubmit,
    #[serde(rename = "onCellEdit")]
    OnCellEdit,
}

impl ClientScriptType {
    pub fn as_str(self) -> &'static str {
        match self {
            ClientScriptType::OnLoad => "onLoad",
            ClientScriptType::OnChange => "onChange",
            ClientScriptType::OnSubmit => "onSubmit",
            ClientScriptType::OnCellEdit => "onCellEdit",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ClientScriptArgs {
    /// Name of the script
    pub name: String,
    /// Table name (e.g., incident)
    pub table: String,
    /// JavaScript code
    pub script: String,
    pub script_type: ClientScriptType,
    /// Field for onChange script
    pub field_name: Option<String>,
    /// Defaults to true
    pub active: Option<bool>,
}

impl ClientScriptArgs {
    pub const TABLE: &'static str = tables::CLIENT_SCRIPT;

    pub fn to_fields(&self) -> Fields {
        let mut fields = Fields::new();
        fields.set("name", self.name.clone());
        fields.set("table", self.table.clone());
        fields.set("script", self.script.clone());
        fields.set("type", self.script_type.as_str());
        fields.set_opt("field", self.field_name.clone());
        fields.set("active", self.active.unwrap_or(true));
        fields
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum RuleTiming {
    Before,
    After,
    Async,
    Display,
}

impl RuleTiming {
    pub fn as_str(self) -> &'static str {
        match self {
            RuleTiming::Before => "before",
            RuleTiming::After => "after",
            RuleTiming::Async => "async",
            RuleTiming::Display => "display",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct BusinessRuleArgs {
    /// Name of the rule
    pub name: String,
    /// Table name
    pub table: String,
    /// JavaScript code (server-side)
    pub script: String,
    pub when: RuleTiming,
    /// Defaults to true
    pub action_insert: Option<bool>,
    /// Defaults to false
    pub action_update: Option<bool>,
    /// Defaults to false
    pub action_delete: Option<bool>,
    /// Defaults to false
    pub action_query: Option<bool>,
    /// Defaults to true
    pub active: Option<bool>,
}

impl BusinessRuleArgs {
    pub const TABLE: &'static str = tables::BUSINESS_RULE;

    pub fn to_fields(&self) -> Fields {
        let mut fields = Fields::new();
        fields.set("name", self.name.clone());
        fields.set("collection", self.table.clone());
        fields.set("script", self.script.clone());
        fields.set("when", self.when.as_str());
        fields.set("action_insert", self.action_insert.unwrap_or(true));
        fields.set("action_update", self.action_update.unwrap_or(false));
        fields.set("action_delete", self.action_delete.unwrap_or(false));
        fields.set("action_query", self.action_query.unwrap_or(false));
        fields.set("active", self.active.unwrap_or(true));
        fields
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SlaDefinitionArgs {
    /// Name of the SLA
    pub name: String,
    /// Table name
    pub table: String,
    /// SLA duration in seconds
    pub duration_seconds: u64,
    /// Encoded query for start condition
    pub start_condition: String,
    /// Encoded query for stop condition
    pub stop_condition: String,
    /// Encoded query for pause condition
    pub pause_condition: Option<String>,
}

impl SlaDefinitionArgs {
    pub const TABLE: &'static str = tables::SLA_DEFINITION;

    pub fn to_fields(&self) -> Fields {
        let mut fields = Fields::new();
        fields.set("name", self.name.clone());
        fields.set("collection", self.table.clone());
        fields.set("duration", format!("PT{}S", self.duration_seconds));
        fields.set("start_condition", self.start_condition.clone());
        fields.set("stop_condition", self.stop_condition.clone());
        fields.set_opt("pause_condition", self.pause_condition.clone());
        fields
    }
}

// --- Service catalog ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct VariableSpec {
    pub name: String,
    /// Question text shown to the requester; defaults to the name
    pub label: Option<String>,
    /// e.g., choice, integer, string, boolean
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// Options for choice variables
    #[serde(default)]
    pub choices: Vec<String>,
    pub mandatory: Option<bool>,
}

impl VariableSpec {
    /// Catalog variable type code for the loose type name.
    pub fn type_code(&self) -> u8 {
        variable_type_code(self.kind.as_deref())
    }

    /// Body of the variable record, without its parent link.
    pub fn to_fields(&self) -> Fields {
        let mut fields = Fields::new();
        fields.set("name", self.name.clone());
        fields.set(
            "question_text",
            self.label.clone().unwrap_or_else(|| self.name.clone()),
        );
        fields.set("type", self.type_code());
        fields.set("mandatory", self.mandatory.unwrap_or(false));
        fields
    }
}

/// Map a loose variable type name to the platform's numeric code.
///
/// Unknown or missing names fall back to single line text.
pub fn variable_type_code(kind: Option<&str>) -> u8 {
    let normalized = kind.map(|k| k.trim().to_ascii_lowercase().replace(|c: char| c == ' ' || c == '-', "_"));
    match normalized.as_deref() {
        Some("yes_no") => 1,
        Some("multi_line_text") | Some("text") | Some("textarea") => 2,
        Some("multiple_choice") => 3,
        Some("choice") | Some("select") | Some("select_box") => 5,
        Some("boolean") | Some("checkbox") => 7,
        Some("reference") => 8,
        Some("date") => 9,
        Some("date_time") | Some("datetime") => 10,
        _ => 6,
    }
}

/// Append variable steps (and their choices) linked to `parent` via `link_field`.
fn push_variables(
    manifest: &mut Manifest,
    variables: &[VariableSpec],
    parent: usize,
    link_field: &'static str,
) {
    for var in variables {
        let var_step = manifest.push_linked(
            format!("variable `{}`", var.name),
            tables::VARIABLE,
            var.to_fields(),
            link_field,
            parent,
        );
        for (i, choice) in var.choices.iter().enumerate() {
            let mut fields = Fields::new();
            fields.set("text", choice.clone());
            fields.set("value", choice.clone());
            fields.set("order", (i as u64 + 1) * 100);
            manifest.push_linked(
                format!("choice `{}` of `{}`", choice, var.name),
                tables::QUESTION_CHOICE,
                fields,
                "question",
                var_step,
            );
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RecordProducerArgs {
    /// Display name
    pub name: String,
    /// Table to create record in
    pub table_name: String,
    pub short_description: Option<String>,
    pub category_sys_id: Option<String>,
    /// Post-submission script
    pub script: Option<String>,
    #[serde(default)]
    pub variables: Vec<VariableSpec>,
}

impl RecordProducerArgs {
    pub const TABLE: &'static str = tables::RECORD_PRODUCER;

    pub fn to_fields(&self) -> Fields {
        let mut fields = Fields::new();
        fields.set("name", self.name.clone());
        fields.set("table_name", self.table_name.clone());
        fields.set_opt("short_description", self.short_description.clone());
        fields.set_opt("category", self.category_sys_id.clone());
        fields.set_opt("script", self.script.clone());
        fields
    }

    /// Producer first, then each variable linked through `cat_item`.
    pub fn manifest(&self) -> Manifest {
        let mut manifest = Manifest::new();
        let producer = manifest.push("record producer", Self::TABLE, self.to_fields());
        push_variables(&mut manifest, &self.variables, producer, "cat_item");
        manifest
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct VariableSetArgs {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub variables: Vec<VariableSpec>,
}

impl VariableSetArgs {
    pub const TABLE: &'static str = tables::VARIABLE_SET;

    pub fn to_fields(&self) -> Fields {
        let mut fields = Fields::new();
        fields.set("name", self.name.clone());
        fields.set_opt("description", self.description.clone());
        fields
    }

    /// Set first, then each variable linked through `variable_set`.
    pub fn manifest(&self) -> Manifest {
        let mut manifest = Manifest::new();
        let set = manifest.push("variable set", Self::TABLE, self.to_fields());
        push_variables(&mut manifest, &self.variables, set, "variable_set");
        manifest
    }
}

// --- Smart tools ---

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SmartIncidentArgs {
    /// The user's report or chat log describing the issue
    pub unstructured_text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SmartKbArgs {
    /// Raw notes, incident description, or instructions to turn into a KB article
    pub source_content: String,
    /// e.g., 'End Users', 'IT Staff'
    pub target_audience: Option<String>,
    /// Sys_id of the knowledge base to file the draft under
    pub kb_knowledge_base: Option<String>,
}
