#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

use mcp_servicenow::client::{ClientError, Fields, ListQuery, PlatformClient, Record};
use mcp_servicenow::extract::TextGenerator;

/// One call made against the mock platform.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Create { table: String, fields: Fields },
    Update { table: String, sys_id: String, fields: Fields },
    Get { table: String, sys_id: String },
    List { table: String, query: ListQuery },
}

impl Call {
    pub fn table(&self) -> &str {
        match self {
            Call::Create { table, .. }
            | Call::Update { table, .. }
            | Call::Get { table, .. }
            | Call::List { table, .. } => table,
        }
    }

    pub fn fields(&self) -> Option<&Fields> {
        match self {
            Call::Create { fields, .. } | Call::Update { fields, .. } => Some(fields),
            _ => None,
        }
    }
}

/// Platform double. Scripted responses are consumed in order; once they run
/// out, creates and updates echo their fields with `sys_id` = `sys{call #}`, gets
/// answer 404 and lists come back empty.
#[derive(Clone, Default)]
pub struct MockPlatform {
    pub calls: Arc<Mutex<Vec<Call>>>,
    responses: Arc<Mutex<Vec<Result<Value, ClientError>>>>,
}

impl MockPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_responses(responses: Vec<Result<Value, ClientError>>) -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            responses: Arc::new(Mutex::new(responses)),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) -> (usize, Option<Result<Value, ClientError>>) {
        let mut calls = self.calls.lock().unwrap();
        calls.push(call);
        let mut responses = self.responses.lock().unwrap();
        let next = if responses.is_empty() {
            None
        } else {
            Some(responses.remove(0))
        };
        (calls.len(), next)
    }
}

fn into_record(value: Value) -> Record {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {other}"),
    }
}

/// Numbered tables get a generated `number`, like the real platform.
fn echo(n: usize, table: &str, fields: Fields) -> Record {
    let mut record = fields;
    record.insert("sys_id".to_string(), json!(format!("sys{n}")));
    let prefix = match table {
        "incident" => Some("INC"),
        "kb_knowledge" => Some("KB"),
        _ => None,
    };
    if let Some(prefix) = prefix {
        record
            .entry("number".to_string())
            .or_insert_with(|| json!(format!("{prefix}{n:07}")));
    }
    record
}

#[async_trait]
impl PlatformClient for MockPlatform {
    async fn create(&self, table: &str, fields: Fields) -> Result<Record, ClientError> {
        let (n, scripted) = self.record(Call::Create {
            table: table.to_string(),
            fields: fields.clone(),
        });
        match scripted {
            Some(result) => result.map(into_record),
            None => Ok(echo(n, table, fields)),
        }
    }

    async fn update(&self, table: &str, sys_id: &str, fields: Fields) -> Result<Record, ClientError> {
        let (n, scripted) = self.record(Call::Update {
            table: table.to_string(),
            sys_id: sys_id.to_string(),
            fields: fields.clone(),
        });
        match scripted {
            Some(result) => result.map(into_record),
            None => Ok(echo(n, table, fields)),
        }
    }

    async fn get(&self, table: &str, sys_id: &str) -> Result<Record, ClientError> {
        let (_, scripted) = self.record(Call::Get {
            table: table.to_string(),
            sys_id: sys_id.to_string(),
        });
        match scripted {
            Some(result) => result.map(into_record),
            None => Err(ClientError::NotFound {
                table: table.to_string(),
                id: sys_id.to_string(),
                message: "No Record found".to_string(),
            }),
        }
    }

    async fn list(&self, table: &str, query: &ListQuery) -> Result<Vec<Record>, ClientError> {
        let (_, scripted) = self.record(Call::List {
            table: table.to_string(),
            query: query.clone(),
        });
        match scripted {
            Some(result) => result.map(|value| match value {
                Value::Array(items) => items.into_iter().map(into_record).collect(),
                other => vec![into_record(other)],
            }),
            None => Ok(Vec::new()),
        }
    }
}

/// Language model double replaying canned replies.
#[derive(Clone, Default)]
pub struct MockGenerator {
    pub prompts: Arc<Mutex<Vec<String>>>,
    replies: Arc<Mutex<Vec<Result<String, ClientError>>>>,
}

impl MockGenerator {
    pub fn new(replies: Vec<Result<String, ClientError>>) -> Self {
        Self {
            prompts: Arc::new(Mutex::new(Vec::new())),
            replies: Arc::new(Mutex::new(replies)),
        }
    }

    pub fn replying(reply: &str) -> Self {
        Self::new(vec![Ok(reply.to_string())])
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for MockGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, ClientError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        let mut replies = self.replies.lock().unwrap();
        if !replies.is_empty() {
            replies.remove(0)
        } else {
            Err(ClientError::Remote {
                status: 500,
                message: "No more mock replies".to_string(),
            })
        }
    }
}

pub fn fields(value: Value) -> Fields {
    into_record(value)
}

pub fn server_error() -> ClientError {
    ClientError::Remote {
        status: 500,
        message: "Internal Server Error".to_string(),
    }
}
