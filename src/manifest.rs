//! Ordered, non-atomic record creation plans.
//!
//! A [`Manifest`] lists the records a multi-step tool creates and how later
//! records point at earlier ones. Execution is strictly sequential and stops
//! at the first failure; records already created stay in place and are
//! reported back in the error.

use serde::Serialize;
use serde_json::Value;

use crate::client::{ClientError, Fields, PlatformClient, Record};

/// Sets `field` on a step to the `sys_id` created by step `step`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Link {
    pub field: &'static str,
    pub step: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub label: String,
    pub table: &'static str,
    pub fields: Fields,
    pub link: Option<Link>,
}

/// A record created by one manifest step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreatedRecord {
    pub label: String,
    pub table: String,
    pub sys_id: Option<String>,
    /// `number` or `name` of the record, whichever the platform returned.
    pub display: Option<String>,
    #[serde(skip)]
    pub record: Record,
}

impl CreatedRecord {
    pub fn new(label: impl Into<String>, table: impl Into<String>, record: Record) -> Self {
        let text = |key: &str| record.get(key).and_then(Value::as_str).map(str::to_string);
        Self {
            label: label.into(),
            table: table.into(),
            sys_id: text("sys_id"),
            display: text("number").or_else(|| text("name")),
            record,
        }
    }
}

/// Execution stopped at `failed_step`; `completed` were created before it.
#[derive(Debug)]
pub struct ManifestError {
    pub completed: Vec<CreatedRecord>,
    pub failed_step: String,
    pub source: ClientError,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Manifest {
    steps: Vec<Step>,
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an independent step and return its index.
    pub fn push(&mut self, label: impl Into<String>, table: &'static str, fields: Fields) -> usize {
        self.steps.push(Step {
            label: label.into(),
            table,
            fields,
            link: None,
        });
        self.steps.len() - 1
    }

    /// Append a step whose `field` receives the `sys_id` of step `parent`.
    ///
    /// # Panics
    /// If `parent` is not an earlier step.
    pub fn push_linked(
        &mut self,
        label: impl Into<String>,
        table: &'static str,
        fields: Fields,
        field: &'static str,
        parent: usize,
    ) -> usize {
        assert!(parent < self.steps.len(), "manifest link must point backwards");
        self.steps.push(Step {
            label: label.into(),
            table,
            fields,
            link: Some(Link { field, step: parent }),
        });
        self.steps.len() - 1
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Create every step's record in order.
    pub async fn execute<P>(&self, platform: &P) -> Result<Vec<CreatedRecord>, ManifestError>
    where
        P: PlatformClient + ?Sized,
    {
        let mut completed: Vec<CreatedRecord> = Vec::with_capacity(self.steps.len());

        for (index, step) in self.steps.iter().enumerate() {
            let mut fields = step.fields.clone();

            if let Some(link) = step.link {
                let parent_id = completed.get(link.step).and_then(|r| r.sys_id.clone());
                match parent_id {
                    Some(id) => {
                        fields.insert(link.field.to_string(), Value::String(id));
                    }
                    None => {
                        return Err(ManifestError {
                            failed_step: step.label.clone(),
                            source: ClientError::Decode(serde::de::Error::custom(format!(
                                "{} was created without a sys_id",
                                self.steps[link.step].label
                            ))),
                            completed,
                        });
                    }
                }
            }

            tracing::debug!(step = index, label = %step.label, table = step.table, "creating manifest step");

            match platform.create(step.table, fields).await {
                Ok(record) => completed.push(CreatedRecord::new(&step.label, step.table, record)),
                Err(source) => {
                    tracing::warn!(
                        step = index,
                        label = %step.label,
                        created = completed.len(),
                        "manifest step failed: {}",
                        source
                    );
                    return Err(ManifestError {
                        completed,
                        failed_step: step.label.clone(),
                        source,
                    });
                }
            }
        }

        Ok(completed)
    }
}
